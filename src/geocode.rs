//! Coordinate lookup for pages whose markup carries none.

use std::time::Duration;

use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use serde_json::Value;
use tracing::debug;

use crate::normalize::coords::{self, Coordinates};
use crate::normalize::render_float;

pub trait Geocoder: Send + Sync {
    /// Coordinates of the article `title`; an empty pair when unknown.
    fn lookup(&self, title: &str) -> Coordinates;
}

/// Never finds anything. Used when network lookups are disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGeocoder;

impl Geocoder for NoGeocoder {
    fn lookup(&self, _title: &str) -> Coordinates {
        coords::empty()
    }
}

/// Queries the `prop=coordinates` API of a Wikipedia edition.
///
/// Any transport or decoding failure degrades to an empty pair.
#[derive(Debug)]
pub struct WikiApiGeocoder {
    endpoint: String,
    timeout: Duration,
    client: OnceCell<Client>,
}

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

impl WikiApiGeocoder {
    pub fn new(lang: &str) -> Self {
        Self::with_endpoint(format!("https://{}.wikipedia.org/w/api.php", lang), DEFAULT_TIMEOUT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>, timeout: Duration) -> Self {
        WikiApiGeocoder {
            endpoint: endpoint.into(),
            timeout,
            client: OnceCell::new(),
        }
    }

    fn client(&self) -> reqwest::Result<&Client> {
        self.client.get_or_try_init(|| {
            Client::builder()
                .timeout(self.timeout)
                .user_agent(concat!("wikikb/", env!("CARGO_PKG_VERSION")))
                .build()
        })
    }

    fn query(&self, title: &str) -> reqwest::Result<Value> {
        self.client()?
            .get(&self.endpoint)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("prop", "coordinates"),
                ("titles", title),
            ])
            .send()?
            .error_for_status()?
            .json()
    }
}

/// Coordinates of the first page in an API response.
fn parse_response(response: &Value) -> Option<Coordinates> {
    let pages = response.get("query")?.get("pages")?.as_object()?;
    let (page_id, page) = pages.iter().next()?;
    if page_id == "-1" {
        return None;
    }
    let first = page.get("coordinates")?.get(0)?;
    let lat = first.get("lat")?.as_f64()?;
    let lon = first.get("lon")?.as_f64()?;
    Some((render_float(lat), render_float(lon)))
}

impl Geocoder for WikiApiGeocoder {
    fn lookup(&self, title: &str) -> Coordinates {
        match self.query(title) {
            Ok(response) => parse_response(&response).unwrap_or_else(coords::empty),
            Err(e) => {
                debug!(title = %title, error = %e, "coordinate lookup failed");
                coords::empty()
            }
        }
    }
}
