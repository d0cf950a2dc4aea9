//! Symbol Catalog: loads the list of instruments to subscribe to for a venue
//! from disk and splits it into fixed-size chunks for the Subscription
//! Builder. A missing or malformed catalog file only takes down the venue
//! that owns it — the other five keep running.

use std::path::Path;

use ingest_protocol::Venue;
use tracing::warn;

use crate::error::CollectorError;

/// Reads `{catalog_dir}/{venue_tag}.txt`: one symbol per non-blank line,
/// `#`-prefixed lines ignored. Falls back to `{catalog_dir}/{venue_tag}.json`
/// (a plain JSON array of strings) if the `.txt` form isn't present.
pub fn load(catalog_dir: &str, venue: Venue) -> Result<Vec<String>, CollectorError> {
    let txt_path = Path::new(catalog_dir).join(format!("{}.txt", venue.tag()));
    if txt_path.exists() {
        return load_text(&txt_path, venue);
    }
    let json_path = Path::new(catalog_dir).join(format!("{}.json", venue.tag()));
    load_json(&json_path, venue)
}

fn load_text(path: &Path, venue: Venue) -> Result<Vec<String>, CollectorError> {
    let text = std::fs::read_to_string(path).map_err(|source| CollectorError::CatalogLoad {
        venue: venue.tag(),
        source,
    })?;
    let symbols = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();
    Ok(symbols)
}

fn load_json(path: &Path, venue: Venue) -> Result<Vec<String>, CollectorError> {
    let text = std::fs::read_to_string(path).map_err(|source| CollectorError::CatalogLoad {
        venue: venue.tag(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CollectorError::CatalogParse {
        venue: venue.tag(),
        source,
    })
}

/// Splits `symbols` into chunks of at most `chunk_size`, warning (not
/// erroring) if the list is empty — an empty chunk list just means the venue
/// starts with zero sessions.
pub fn chunk(symbols: &[String], chunk_size: usize) -> Vec<Vec<String>> {
    if symbols.is_empty() {
        return Vec::new();
    }
    let chunk_size = chunk_size.max(1);
    symbols.chunks(chunk_size).map(|c| c.to_vec()).collect()
}

pub fn warn_if_empty(venue: Venue, symbols: &[String]) {
    if symbols.is_empty() {
        warn!("catalog for {} has no symbols — venue will start no sessions", venue);
    }
}
