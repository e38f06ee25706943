//! Core data models for karaoke ranking.
//!
//! This module contains the catalog entry type, the raw per-provider signal
//! shapes as they come out of provider caches, and the tabular output types.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

// ============================================================================
// Karaoke Catalog
// ============================================================================

/// One song from the karaoke catalog.
///
/// Casing is kept exactly as published; lookups lowercase at query time.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct KaraokeSong {
    #[serde(rename = "Artist")]
    pub artist: String,
    #[serde(rename = "Title")]
    pub title: String,
    /// Comma-separated karaoke brand names, no escaping
    #[serde(rename = "Brands")]
    pub brands: String,
}

impl KaraokeSong {
    pub fn new(artist: &str, title: &str, brands: &str) -> Self {
        Self {
            artist: artist.to_string(),
            title: title.to_string(),
            brands: brands.to_string(),
        }
    }

    /// Number of brands offering this song. A plain split, so "" counts as 1.
    pub fn karaoke_popularity(&self) -> u64 {
        self.brands.split(',').count() as u64
    }
}

// ============================================================================
// Providers
// ============================================================================

/// Music data source. Declaration order is the canonical column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Provider {
    LastFm,
    Spotify,
    AppleMusic,
    YouTube,
}

impl Provider {
    pub const CANONICAL: [Provider; 4] = [
        Provider::LastFm,
        Provider::Spotify,
        Provider::AppleMusic,
        Provider::YouTube,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Provider::LastFm => "Last.fm",
            Provider::Spotify => "Spotify",
            Provider::AppleMusic => "Apple Music",
            Provider::YouTube => "Youtube",
        }
    }

    pub fn artist_label(self) -> &'static str {
        match self {
            Provider::LastFm => "Last.fm Artist Play Count",
            Provider::Spotify => "Spotify Artist Score",
            Provider::AppleMusic => "Apple Music Artist In Library",
            Provider::YouTube => "Youtube Artist Liked",
        }
    }

    pub fn track_label(self) -> &'static str {
        match self {
            Provider::LastFm => "Last.fm Track Play Count",
            Provider::Spotify => "Spotify Track Score",
            Provider::AppleMusic => "Apple Music Track In Library",
            Provider::YouTube => "Youtube Track Liked",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Raw Provider Shapes
// ============================================================================

/// `{name}` reference nested inside other provider objects
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct NamedRef {
    pub name: String,
}

/// Last.fm reports play counts as strings; caches written by other tools use numbers.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PlayCount {
    Number(i64),
    Text(String),
}

impl PlayCount {
    /// Non-negative integer value, or None if it cannot be read as one.
    pub fn value(&self) -> Option<u64> {
        match self {
            PlayCount::Number(n) => u64::try_from(*n).ok(),
            PlayCount::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct LastfmArtist {
    pub name: String,
    #[serde(default)]
    pub playcount: Option<PlayCount>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct LastfmTrack {
    pub name: String,
    #[serde(default)]
    pub artist: Option<NamedRef>,
    #[serde(default)]
    pub playcount: Option<PlayCount>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SpotifyArtist {
    pub name: String,
    #[serde(default)]
    pub popularity: u64, // 0-100
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SpotifyAlbum {
    #[serde(default)]
    pub artists: Vec<NamedRef>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SpotifyTrack {
    pub name: String,
    /// Track attribution comes from the first album artist
    #[serde(default)]
    pub album: Option<SpotifyAlbum>,
    #[serde(default)]
    pub popularity: u64,
}

impl SpotifyTrack {
    pub fn album_artist(&self) -> Option<&str> {
        self.album
            .as_ref()
            .and_then(|album| album.artists.first())
            .map(|artist| artist.name.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppleMusicSong {
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub album: Option<String>,
}

/// `(artist, title)` identified from a liked YouTube video
pub type LikedSong = (String, String);

/// How Spotify artist magnitudes are read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpotifyArtistMode {
    /// Use the 0-100 popularity score
    #[default]
    Popularity,
    /// Followed artists count as 1 regardless of popularity
    FollowedPresence,
}

// ============================================================================
// Per-Provider Signal Sets
// ============================================================================

#[derive(Clone, Debug, Default)]
pub struct LastfmSignals {
    pub artists: Vec<LastfmArtist>,
    pub tracks: Vec<LastfmTrack>,
}

#[derive(Clone, Debug, Default)]
pub struct SpotifySignals {
    pub artists: Vec<SpotifyArtist>,
    pub tracks: Vec<SpotifyTrack>,
    pub artist_mode: SpotifyArtistMode,
}

#[derive(Clone, Debug, Default)]
pub struct AppleMusicSignals {
    pub artists: Vec<String>,
    pub songs: Vec<AppleMusicSong>,
}

#[derive(Clone, Debug, Default)]
pub struct YouTubeSignals {
    pub liked_songs: Vec<LikedSong>,
}

/// Signal sets for every provider the caller fetched data from.
///
/// `None` means the provider is not active. `Some` with empty lists is an
/// active provider that matched nothing, and still gets its columns.
#[derive(Clone, Debug, Default)]
pub struct ActiveSignals {
    pub lastfm: Option<LastfmSignals>,
    pub spotify: Option<SpotifySignals>,
    pub apple_music: Option<AppleMusicSignals>,
    pub youtube: Option<YouTubeSignals>,
    /// Entries dropped while reading provider files, before any indexing
    pub load_skipped: FxHashMap<Provider, usize>,
}

impl ActiveSignals {
    pub fn is_active(&self, provider: Provider) -> bool {
        match provider {
            Provider::LastFm => self.lastfm.is_some(),
            Provider::Spotify => self.spotify.is_some(),
            Provider::AppleMusic => self.apple_music.is_some(),
            Provider::YouTube => self.youtube.is_some(),
        }
    }

    /// `(provider, present)` in canonical order
    pub fn descriptors(&self) -> [(Provider, bool); 4] {
        Provider::CANONICAL.map(|p| (p, self.is_active(p)))
    }

    pub fn active_count(&self) -> usize {
        self.descriptors().iter().filter(|(_, present)| *present).count()
    }

    pub fn record_load_skipped(&mut self, provider: Provider, count: usize) {
        if count > 0 {
            *self.load_skipped.entry(provider).or_insert(0) += count;
        }
    }

    pub fn load_skipped(&self, provider: Provider) -> usize {
        self.load_skipped.get(&provider).copied().unwrap_or(0)
    }
}

// ============================================================================
// Output Models
// ============================================================================

/// A single output cell
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Int(u64),
}

impl Cell {
    /// Integer view used for sorting. Text cells read as 0 unless numeric.
    pub fn as_int(&self) -> u64 {
        match self {
            Cell::Int(n) => *n,
            Cell::Text(s) => s.trim().parse().unwrap_or(0),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Int(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<u64> for Cell {
    fn from(n: u64) -> Self {
        Cell::Int(n)
    }
}

/// Ranked, column-labeled result.
///
/// ## Key Invariants
///
/// 1. Every row has exactly `header.len()` cells.
/// 2. `sort_column == header.len() - 1`, and rows are non-increasing in it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ranking {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    pub sort_column: usize,
}

// ============================================================================
// Statistics (Instrumentation)
// ============================================================================

/// Counters collected while ranking one catalog.
#[derive(Default, Debug, Clone, PartialEq, Serialize)]
pub struct RankingStats {
    pub catalog_songs: usize,
    pub active_providers: usize,
    pub rows_kept: usize,
    pub rows_dropped_zero_score: usize,

    // Malformed signal entries skipped while building lookups
    pub skipped_lastfm: usize,
    pub skipped_spotify: usize,
    pub skipped_apple_music: usize,
    pub skipped_youtube: usize,

    // Timing (filled in by the CLI)
    pub elapsed_seconds: f64,
}

impl RankingStats {
    /// Percentage of catalog songs that made it into the output
    pub fn keep_rate(&self) -> f64 {
        if self.catalog_songs == 0 {
            0.0
        } else {
            100.0 * self.rows_kept as f64 / self.catalog_songs as f64
        }
    }

    pub fn total_skipped(&self) -> usize {
        self.skipped_lastfm + self.skipped_spotify + self.skipped_apple_music + self.skipped_youtube
    }

    pub fn record_skipped(&mut self, provider: Provider, count: usize) {
        match provider {
            Provider::LastFm => self.skipped_lastfm += count,
            Provider::Spotify => self.skipped_spotify += count,
            Provider::AppleMusic => self.skipped_apple_music += count,
            Provider::YouTube => self.skipped_youtube += count,
        }
    }

    /// Log stats as pretty JSON
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            info!("[STATS:{}]\n{}", phase, json);
        }
    }

    /// Write stats to a JSON file
    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
