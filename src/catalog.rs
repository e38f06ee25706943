//! Karaoke catalog loading.
//!
//! The catalog is a JSON array of `{"Artist", "Title", "Brands"}` objects,
//! published gzip-compressed. Plain JSON is read as well; the two are told
//! apart by the gzip magic bytes, not the file name.
//! Fetching a fresh copy is left to whoever maintains the file; we only
//! warn when it looks out of date.

use anyhow::{Context, Result};
use flate2::bufread::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

use crate::models::KaraokeSong;

/// Catalogs older than this are reported as stale
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(3 * 24 * 60 * 60);

/// Maximum catalog age from a day count; huge counts saturate.
pub fn max_age_from_days(days: u64) -> Duration {
    Duration::from_secs(days.saturating_mul(24 * 60 * 60))
}

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub fn load_catalog(path: &Path) -> Result<Vec<KaraokeSong>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open karaoke catalog {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let gzipped = reader
        .fill_buf()
        .with_context(|| format!("Failed to read karaoke catalog {}", path.display()))?
        .starts_with(&GZIP_MAGIC);

    let reader: Box<dyn Read> = if gzipped {
        Box::new(BufReader::new(GzDecoder::new(reader)))
    } else {
        Box::new(reader)
    };
    let songs: Vec<KaraokeSong> = serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse karaoke catalog {}", path.display()))?;

    info!("Loaded {} karaoke songs from {}", songs.len(), path.display());
    Ok(songs)
}

/// True if the file was last modified more than `max_age` ago.
pub fn is_stale(path: &Path, max_age: Duration) -> Result<bool> {
    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .with_context(|| format!("Failed to read modification time of {}", path.display()))?;

    // A timestamp in the future counts as fresh
    let age = SystemTime::now()
        .duration_since(modified)
        .unwrap_or(Duration::ZERO);
    Ok(age > max_age)
}

/// Load the catalog, warning if it is older than `max_age`.
pub fn load_catalog_checked(path: &Path, max_age: Duration) -> Result<Vec<KaraokeSong>> {
    if is_stale(path, max_age)? {
        warn!(
            "Karaoke catalog {} is older than {} days, consider downloading a fresh copy",
            path.display(),
            max_age.as_secs() / 86_400
        );
    }
    load_catalog(path)
}
