//! Lookup keys and per-provider signal indexes.
//!
//! Keys are lowercased and nothing else: punctuation, diacritics and
//! "feat." credits are left alone, so a catalog entry only matches a
//! provider entry spelled the same way.

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;
use tracing::warn;

use crate::models::{
    AppleMusicSignals, LastfmSignals, SpotifyArtistMode, SpotifySignals, YouTubeSignals,
};

/// Lowercased artist name
pub type ArtistIndex = FxHashMap<String, u64>;

/// Lowercased (artist, title) pair
pub type TrackIndex = FxHashMap<(String, String), u64>;

// ============================================================================
// Keys
// ============================================================================

pub fn artist_key(artist: &str) -> String {
    artist.to_lowercase()
}

pub fn track_key(artist: &str, title: &str) -> (String, String) {
    (artist.to_lowercase(), title.to_lowercase())
}

// ============================================================================
// Signal Index
// ============================================================================

/// Case-insensitive artist and track magnitudes for one provider.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SignalIndex {
    pub artists: ArtistIndex,
    pub tracks: TrackIndex,
    /// Malformed entries left out while building
    pub skipped: usize,
}

impl SignalIndex {
    pub fn artist(&self, key: &str) -> u64 {
        self.artists.get(key).copied().unwrap_or(0)
    }

    pub fn track(&self, key: &(String, String)) -> u64 {
        self.tracks.get(key).copied().unwrap_or(0)
    }

    /// Last.fm: real play counts. Later duplicates overwrite earlier ones.
    pub fn from_lastfm(signals: &LastfmSignals) -> Self {
        let mut index = SignalIndex::default();

        for artist in &signals.artists {
            match artist.playcount.as_ref().and_then(|p| p.value()) {
                Some(count) => {
                    index.artists.insert(artist_key(&artist.name), count);
                }
                None => {
                    warn!("Failed to add Last.fm artist {} as it had no usable play count", artist.name);
                    index.skipped += 1;
                }
            }
        }

        for track in &signals.tracks {
            let Some(artist) = &track.artist else {
                warn!("Failed to add Last.fm track {} as it had no artist", track.name);
                index.skipped += 1;
                continue;
            };
            let Some(count) = track.playcount.as_ref().and_then(|p| p.value()) else {
                warn!("Failed to add Last.fm track {} as it had no usable play count", track.name);
                index.skipped += 1;
                continue;
            };
            index.tracks.insert(track_key(&artist.name, &track.name), count);
        }

        index
    }

    /// Spotify: 0-100 popularity, or presence-only for followed artists.
    /// Tracks are attributed to their first album artist.
    pub fn from_spotify(signals: &SpotifySignals) -> Self {
        let mut index = SignalIndex::default();

        for artist in &signals.artists {
            let magnitude = match signals.artist_mode {
                SpotifyArtistMode::Popularity => artist.popularity,
                SpotifyArtistMode::FollowedPresence => 1,
            };
            index.artists.insert(artist_key(&artist.name), magnitude);
        }

        for track in &signals.tracks {
            match track.album_artist() {
                Some(artist) => {
                    index.tracks.insert(track_key(artist, &track.name), track.popularity);
                }
                None => {
                    warn!("Failed to add Spotify track {} as it had no album artists", track.name);
                    index.skipped += 1;
                }
            }
        }

        index
    }

    /// Apple Music: library membership, 1 per artist and per song.
    pub fn from_apple_music(signals: &AppleMusicSignals) -> Self {
        let mut index = SignalIndex::default();

        for artist in &signals.artists {
            index.artists.insert(artist_key(artist), 1);
        }
        for song in &signals.songs {
            index.tracks.insert(track_key(&song.artist, &song.title), 1);
        }

        index
    }

    /// YouTube: artists count liked songs, each liked song counts 1.
    pub fn from_youtube(signals: &YouTubeSignals) -> Self {
        let mut index = SignalIndex::default();

        for (artist, title) in &signals.liked_songs {
            let count = index.artists.entry(artist_key(artist)).or_insert(0);
            *count = count.saturating_add(1);
            index.tracks.insert(track_key(artist, title), 1);
        }

        index
    }
}

// ============================================================================
// YouTube Video Titles
// ============================================================================

/// Bracketed decoration removed before splitting a video title.
static VIDEO_DECORATION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // "(Official Video)", "[Official Music Video]", "(Lyric Video)", "(Audio)", "(Visualiser)"
        Regex::new(r"(?i)\s*[\(\[](?:official\s+)?(?:music\s+|lyrics?\s+)?(?:video|audio|visuali[sz]er)(?:\s+\d{4})?[\)\]]").unwrap(),
        // "[Lyrics]", "(HD)", "(Remastered 2011)", "[Explicit]"
        Regex::new(r"(?i)\s*[\(\[](?:lyrics?|hd|hq|4k|explicit|remaster(?:ed)?(?:\s+\d{4})?)[\)\]]").unwrap(),
        // "(feat. Artist)", "[ft. Someone]"
        Regex::new(r"(?i)\s*[\(\[](?:feat\.?|ft\.?|featuring)\s+[^)\]]+[\)\]]").unwrap(),
    ]
});

/// Unbracketed "feat." tail, applied to each side after splitting
static FEAT_TAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+(?:feat\.?|ft\.?|featuring)\s+.*$").unwrap());

/// "Artist - Title" separator; bare hyphens inside names like "Jay-Z" don't count
static ARTIST_TITLE_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+[-–—]\s+").unwrap());

fn strip_feat_tail(s: &str) -> String {
    FEAT_TAIL.replace(s, "").trim().to_string()
}

/// Identify `(artist, title)` from a music video title such as
/// "Queen - Bohemian Rhapsody (Official Video)".
///
/// Returns None when the title has no "Artist - Title" shape.
pub fn identify_song_from_video_title(video_title: &str) -> Option<(String, String)> {
    let mut cleaned = video_title.to_string();
    for pattern in VIDEO_DECORATION_PATTERNS.iter() {
        cleaned = pattern.replace_all(&cleaned, "").to_string();
    }

    let separator = ARTIST_TITLE_SEPARATOR.find(&cleaned)?;
    let artist = strip_feat_tail(&cleaned[..separator.start()]);
    let title = strip_feat_tail(&cleaned[separator.end()..]);
    let title = title.trim_matches(|c: char| c == '"' || c == '\'').trim().to_string();

    if artist.is_empty() || title.is_empty() {
        return None;
    }
    Some((artist, title))
}

// ============================================================================
// TESTS
// ============================================================================
