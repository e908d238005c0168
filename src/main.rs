use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use wikikb::config::{self, LangMap, Resources, Schema};
use wikikb::dump;
use wikikb::geocode::{Geocoder, NoGeocoder, WikiApiGeocoder};
use wikikb::kb::{self, Stability};
use wikikb::locale;
use wikikb::parallel::{process_batch_parallel, process_channel_pipeline, process_two_phase, ParallelConfig};
use wikikb::pipeline::{self, Engine};

/// Processing strategy for parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Sequential processing (baseline)
    Sequential,
    /// Batch-parallel processing with thread pool
    BatchParallel,
    /// Channel-based pipeline processing
    ChannelPipeline,
    /// Two-phase: load all pages, then process in parallel
    TwoPhase,
}

#[derive(Parser)]
#[command(name = "wikikb")]
#[command(about = "Extract knowledge-base records from a Wikipedia XML dump")]
struct Args {
    /// Input XML dump (.xml or .xml.bz2)
    input: PathBuf,

    /// Wikipedia edition (en, cs)
    #[arg(short, long, default_value = "en")]
    lang: String,

    /// Dump version used in VERSION when the input name carries no date
    #[arg(short, long, default_value = "latest")]
    dump: String,

    /// Directory receiving kb, HEAD-KB and VERSION
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Redirects TSV (from<TAB>to)
    #[arg(long)]
    redirects: Option<PathBuf>,

    /// First sentences TSV (link<TAB>sentence)
    #[arg(long)]
    first_sentences: Option<PathBuf>,

    /// Directory containing patterns_<lang>.yaml and langmap_<lang>.json
    #[arg(long)]
    schema_dir: Option<PathBuf>,

    /// Processing strategy
    #[arg(short, long, value_enum, default_value_t = Strategy::ChannelPipeline)]
    strategy: Strategy,

    /// Number of threads (0 = auto-detect)
    #[arg(short, long, default_value_t = 0)]
    threads: usize,

    /// Batch size for batch-parallel strategy
    #[arg(long, default_value_t = 1000)]
    batch_size: usize,

    /// Channel buffer size for channel-pipeline strategy
    #[arg(long, default_value_t = 10000)]
    channel_buffer: usize,

    /// Limit number of entities to write (for testing)
    #[arg(long)]
    limit: Option<usize>,

    /// Mark the build as a development version
    #[arg(long, conflicts_with = "test")]
    dev: bool,

    /// Mark the build as a test version
    #[arg(long)]
    test: bool,

    /// Never query the Wikipedia API for missing coordinates
    #[arg(long)]
    no_geocode: bool,

    /// Quiet mode - minimal output
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_engine(args: &Args, lang: &str) -> anyhow::Result<Engine> {
    let schema_dir = args.schema_dir.as_deref();
    let schema = Schema::load(&config::find_schema_file(&format!("patterns_{}.yaml", lang), schema_dir)?)?;
    let langmap = LangMap::load(&config::find_schema_file(&format!("langmap_{}.json", lang), schema_dir)?)?;
    let resources = Resources {
        schema,
        langmap,
        redirects: config::load_redirects(args.redirects.as_deref())?,
        first_sentences: config::load_first_sentences(args.first_sentences.as_deref())?,
    };
    let geocoder: Box<dyn Geocoder> = if args.no_geocode {
        Box::new(NoGeocoder)
    } else {
        Box::new(WikiApiGeocoder::new(lang))
    };
    Ok(Engine::new(resources, locale::for_code(lang)?, geocoder))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.quiet);

    if args.limit.is_some() && args.strategy != Strategy::Sequential {
        eprintln!(
            "Error: --limit requires --strategy sequential for efficient early termination.\n\
             Parallel strategies process pages out of order and reorder results,\n\
             which means they cannot stop early when the limit is reached."
        );
        std::process::exit(1);
    }

    let lang = locale::canonical_code(&args.lang).to_string();
    let engine = match load_engine(&args, &lang) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error loading resources: {:#}", e);
            std::process::exit(1);
        }
    };

    let config = ParallelConfig {
        batch_size: args.batch_size,
        channel_buffer: args.channel_buffer,
        ..ParallelConfig::default().with_threads(args.threads)
    };

    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating {}", args.output_dir.display()))?;
    let kb_path = args.output_dir.join("kb");

    if !args.quiet {
        println!("Parsing: {}", args.input.display());
        println!("Output: {}", kb_path.display());
        println!("Language: {}", lang);
        println!("Strategy: {:?}", args.strategy);
        if args.strategy != Strategy::Sequential {
            println!("Threads: {}", config.num_threads);
        }
        if let Some(limit) = args.limit {
            println!("Limit: {} entities", limit);
        }
        println!();
    }

    let reader = dump::open_reader(&args.input)?;
    let output = File::create(&kb_path).with_context(|| format!("creating {}", kb_path.display()))?;

    let stats = match args.strategy {
        Strategy::Sequential => {
            let mut writer = BufWriter::with_capacity(256 * 1024, output);
            pipeline::run_sequential(&engine, reader, &mut writer, args.limit, args.quiet)?
        }
        Strategy::BatchParallel => {
            let mut writer = BufWriter::with_capacity(256 * 1024, output);
            process_batch_parallel(Arc::new(engine), reader, &mut writer, &config, args.limit)?
        }
        Strategy::ChannelPipeline => {
            process_channel_pipeline(Arc::new(engine), reader, output, &config, args.limit)?
        }
        Strategy::TwoPhase => {
            let mut writer = BufWriter::with_capacity(256 * 1024, output);
            process_two_phase(Arc::new(engine), reader, &mut writer, &config, args.limit)?
        }
    };

    kb::write_head_kb(&args.output_dir.join("HEAD-KB"))?;
    let stability = if args.dev {
        Stability::Dev
    } else if args.test {
        Stability::Test
    } else {
        Stability::Release
    };
    let dump_version = kb::dump_date(&args.input, &lang)
        .or_else(|| args.redirects.as_deref().and_then(|p| kb::dump_date(p, &lang)))
        .unwrap_or_else(|| args.dump.clone());
    kb::write_version(&args.output_dir.join("VERSION"), &lang, &dump_version, stability)?;
    info!(entities = stats.entities_written, version = %dump_version, "knowledge base written");

    if !args.quiet {
        pipeline::print_stats(&stats, &format!("{:?}", args.strategy));
    }

    Ok(())
}
