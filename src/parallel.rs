//! Parallel processing strategies over one shared [`Engine`].
//!
//! - Batch-parallel: pages are collected into batches and each batch is
//!   split across threads.
//! - Channel-pipeline: a reader thread feeds worker threads over bounded
//!   channels; the writer restores dump order with a reorder buffer.
//! - Two-phase: read every page into memory, then process them in parallel.
//!
//! Every strategy writes records in dump order.

use std::collections::BTreeMap;
use std::io::{BufRead, BufWriter, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::info;

use crate::dump;
use crate::pipeline::{write_outcome, Engine, PageOutcome, Stats};

/// Configuration for parallel processing
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Number of threads to use
    pub num_threads: usize,
    /// Batch size for batch-parallel processing
    pub batch_size: usize,
    /// Channel buffer size for pipeline processing
    pub channel_buffer: usize,
    /// Number of worker threads for pipeline
    pub num_workers: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        let cpus = thread::available_parallelism().map(|p| p.get()).unwrap_or(4);
        Self {
            num_threads: cpus,
            batch_size: 1000,
            channel_buffer: 10000,
            num_workers: cpus.saturating_sub(1).max(1),
        }
    }
}

impl ParallelConfig {
    /// Use `threads` threads; 0 keeps the detected CPU count.
    pub fn with_threads(mut self, threads: usize) -> Self {
        if threads > 0 {
            self.num_threads = threads;
            self.num_workers = threads.saturating_sub(1).max(1);
        }
        self
    }
}

/// Strategy 1: Batch-Parallel Processing
pub fn process_batch_parallel<W: Write>(
    engine: Arc<Engine>,
    reader: impl BufRead,
    writer: &mut BufWriter<W>,
    config: &ParallelConfig,
    limit: Option<usize>,
) -> std::io::Result<Stats> {
    let start_time = Instant::now();
    let mut stats = Stats::default();
    let mut batch: Vec<String> = Vec::with_capacity(config.batch_size);
    let mut limit_reached = false;
    let mut write_error = None;

    let mut flush_batch = |batch: &mut Vec<String>, stats: &mut Stats| -> std::io::Result<bool> {
        let results = process_batch_threaded(&engine, std::mem::take(batch), config.num_threads);
        for outcome in results {
            if write_outcome(outcome, stats, &mut *writer, limit)? {
                return Ok(true);
            }
        }
        Ok(false)
    };

    dump::scan_pages(reader, |page_xml| {
        batch.push(page_xml);
        if batch.len() < config.batch_size {
            return true;
        }
        match flush_batch(&mut batch, &mut stats) {
            Ok(false) => true,
            Ok(true) => {
                limit_reached = true;
                false
            }
            Err(e) => {
                write_error = Some(e);
                false
            }
        }
    })?;

    if let Some(e) = write_error {
        return Err(e);
    }
    if !limit_reached && !batch.is_empty() {
        flush_batch(&mut batch, &mut stats)?;
    }

    writer.flush()?;
    stats.elapsed = start_time.elapsed();
    Ok(stats)
}

/// Process a batch of pages using multiple threads, keeping batch order.
fn process_batch_threaded(engine: &Arc<Engine>, batch: Vec<String>, num_threads: usize) -> Vec<PageOutcome> {
    if batch.is_empty() {
        return vec![];
    }

    let num_threads = num_threads.min(batch.len()).max(1);
    let chunk_size = (batch.len() + num_threads - 1) / num_threads;
    let total = batch.len();

    let mut chunks: Vec<Vec<String>> = Vec::with_capacity(num_threads);
    let mut pages = batch.into_iter().peekable();
    while pages.peek().is_some() {
        chunks.push(pages.by_ref().take(chunk_size).collect());
    }

    let handles: Vec<JoinHandle<Vec<PageOutcome>>> = chunks
        .into_iter()
        .map(|chunk| {
            let engine = Arc::clone(engine);
            thread::spawn(move || chunk.iter().map(|xml| engine.process_xml(xml)).collect())
        })
        .collect();

    let mut results = Vec::with_capacity(total);
    for handle in handles {
        if let Ok(chunk_results) = handle.join() {
            results.extend(chunk_results);
        }
    }

    results
}

/// Strategy 2: Channel-Pipeline Processing
/// Producer thread reads XML, worker threads process pages, writer collects
/// results in page order.
pub fn process_channel_pipeline<W: Write + Send + 'static>(
    engine: Arc<Engine>,
    reader: impl BufRead + Send + 'static,
    writer: W,
    config: &ParallelConfig,
    limit: Option<usize>,
) -> std::io::Result<Stats> {
    let (page_tx, page_rx): (SyncSender<(usize, String)>, Receiver<(usize, String)>) =
        sync_channel(config.channel_buffer);
    let (result_tx, result_rx): (SyncSender<(usize, PageOutcome)>, Receiver<(usize, PageOutcome)>) =
        sync_channel(config.channel_buffer);

    let limit_reached = Arc::new(AtomicBool::new(false));
    let start_time = Instant::now();

    let reader_limit_flag = Arc::clone(&limit_reached);
    let reader_handle = thread::spawn(move || read_pages_to_channel(reader, page_tx, &reader_limit_flag));

    let page_rx = Arc::new(Mutex::new(page_rx));
    let worker_handles: Vec<JoinHandle<()>> = (0..config.num_workers)
        .map(|_| {
            let rx = Arc::clone(&page_rx);
            let tx = result_tx.clone();
            let limit_flag = Arc::clone(&limit_reached);
            let engine = Arc::clone(&engine);
            thread::spawn(move || process_pages_worker(&engine, rx, tx, &limit_flag))
        })
        .collect();

    // Drop extra sender so channel closes when workers finish
    drop(result_tx);

    let result = write_results_sorted(result_rx, writer, limit, &limit_reached);
    // Unblock the reader and workers if the writer stopped early.
    limit_reached.store(true, Ordering::SeqCst);
    drop(page_rx);

    let read = reader_handle.join().ok();
    for handle in worker_handles {
        handle.join().ok();
    }
    if let Some(Err(e)) = read {
        return Err(e);
    }

    let mut stats = result?;
    stats.elapsed = start_time.elapsed();
    Ok(stats)
}

fn read_pages_to_channel(
    reader: impl BufRead,
    tx: SyncSender<(usize, String)>,
    limit_reached: &AtomicBool,
) -> std::io::Result<usize> {
    let mut page_id: usize = 0;
    dump::scan_pages(reader, |page_xml| {
        if limit_reached.load(Ordering::Relaxed) {
            return false;
        }
        if tx.send((page_id, page_xml)).is_err() {
            return false;
        }
        page_id += 1;
        true
    })?;
    Ok(page_id)
}

fn process_pages_worker(
    engine: &Engine,
    rx: Arc<Mutex<Receiver<(usize, String)>>>,
    tx: SyncSender<(usize, PageOutcome)>,
    limit_reached: &AtomicBool,
) {
    loop {
        if limit_reached.load(Ordering::Relaxed) {
            break;
        }

        let item = {
            let lock = rx.lock().ok();
            lock.and_then(|guard| guard.recv().ok())
        };

        match item {
            Some((page_id, xml)) => {
                let outcome = engine.process_xml(&xml);
                if tx.send((page_id, outcome)).is_err() {
                    break;
                }
            }
            None => break,
        }
    }
}

/// Write results in page order, buffering those that arrive early.
fn write_results_sorted<W: Write>(
    rx: Receiver<(usize, PageOutcome)>,
    writer: W,
    limit: Option<usize>,
    limit_reached: &AtomicBool,
) -> std::io::Result<Stats> {
    let mut writer = BufWriter::with_capacity(256 * 1024, writer);
    let mut stats = Stats::default();
    let mut pending: BTreeMap<usize, PageOutcome> = BTreeMap::new();
    let mut next_expected: usize = 0;

    for (page_id, outcome) in rx {
        pending.insert(page_id, outcome);
        while let Some(ready) = pending.remove(&next_expected) {
            if write_outcome(ready, &mut stats, &mut writer, limit)? {
                limit_reached.store(true, Ordering::SeqCst);
                writer.flush()?;
                return Ok(stats);
            }
            next_expected += 1;
        }
    }

    // Gaps only appear when a worker died; keep whatever arrived.
    for (_, outcome) in std::mem::take(&mut pending) {
        if write_outcome(outcome, &mut stats, &mut writer, limit)? {
            break;
        }
    }

    writer.flush()?;
    Ok(stats)
}

/// Strategy 3: Two-Phase Processing
/// Phase 1: Read all pages into memory
/// Phase 2: Process all pages in parallel with multiple threads
pub fn process_two_phase<W: Write>(
    engine: Arc<Engine>,
    reader: impl BufRead,
    writer: &mut BufWriter<W>,
    config: &ParallelConfig,
    limit: Option<usize>,
) -> std::io::Result<Stats> {
    let start_time = Instant::now();

    info!("phase 1: reading pages");
    let pages = dump::read_all_pages(reader)?;
    info!(pages = pages.len(), elapsed = ?start_time.elapsed(), "pages read");

    info!(threads = config.num_threads, "phase 2: processing in parallel");
    let process_start = Instant::now();
    let results = process_batch_threaded(&engine, pages, config.num_threads);
    info!(results = results.len(), elapsed = ?process_start.elapsed(), "pages processed");

    let mut stats = Stats::default();
    for outcome in results {
        if write_outcome(outcome, &mut stats, writer, limit)? {
            break;
        }
    }

    writer.flush()?;
    stats.elapsed = start_time.elapsed();
    Ok(stats)
}
