//! Provider cache loading.
//!
//! Each provider's listening data arrives as JSON files cached from its API.
//! A provider is active when at least one of its files is supplied; files
//! that are not supplied contribute nothing.
//!
//! Accepted shapes:
//! - Last.fm: bare list, or the `user.getTopArtists` / `user.getTopTracks`
//!   response envelope
//! - Spotify: bare list or `{"items": [...]}` page; saved-track items
//!   (`{"track": {...}}`) are unwrapped
//! - Apple Music: list of artist names, list of `{title, artist, album}`
//! - YouTube: `[artist, title]` pairs, or `[video_id, video_title]` pairs
//!   that get run through title identification

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::models::{
    ActiveSignals, AppleMusicSignals, AppleMusicSong, LastfmArtist, LastfmSignals, LastfmTrack,
    LikedSong, Provider, SpotifyArtist, SpotifyArtistMode, SpotifySignals, SpotifyTrack,
    YouTubeSignals,
};
use crate::normalize::identify_song_from_video_title;

// ============================================================================
// File Shapes
// ============================================================================

// Lists are kept as raw JSON values so that one malformed entry is skipped
// on its own instead of failing the whole file.

#[derive(Deserialize)]
#[serde(untagged)]
enum Listing {
    Bare(Vec<Value>),
    Paged { items: Vec<Value> },
}

impl Listing {
    fn into_vec(self) -> Vec<Value> {
        match self {
            Listing::Bare(items) | Listing::Paged { items } => items,
        }
    }
}

#[derive(Deserialize)]
struct LastfmArtistPage {
    artist: Vec<Value>,
}

#[derive(Deserialize)]
struct LastfmTrackPage {
    track: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LastfmArtistsFile {
    Bare(Vec<Value>),
    Envelope { topartists: LastfmArtistPage },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LastfmTracksFile {
    Bare(Vec<Value>),
    Envelope { toptracks: LastfmTrackPage },
}

/// Saved tracks wrap the track object; top tracks don't
#[derive(Deserialize)]
#[serde(untagged)]
enum SpotifyTrackEntry {
    Saved { track: SpotifyTrack },
    Plain(SpotifyTrack),
}

impl From<SpotifyTrackEntry> for SpotifyTrack {
    fn from(entry: SpotifyTrackEntry) -> Self {
        match entry {
            SpotifyTrackEntry::Saved { track } | SpotifyTrackEntry::Plain(track) => track,
        }
    }
}

// ============================================================================
// Readers
// ============================================================================

/// Entries read from one cache file, plus how many were malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entries<T> {
    pub items: Vec<T>,
    pub skipped: usize,
}

impl<T> Default for Entries<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            skipped: 0,
        }
    }
}

impl<T> Entries<T> {
    fn map<U>(self, f: impl FnMut(T) -> U) -> Entries<U> {
        Entries {
            items: self.items.into_iter().map(f).collect(),
            skipped: self.skipped,
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Convert each raw entry on its own; malformed ones are warned about and counted.
fn parse_entries<T: DeserializeOwned>(values: Vec<Value>, path: &Path) -> Entries<T> {
    let mut entries = Entries::default();
    for (position, value) in values.into_iter().enumerate() {
        match serde_json::from_value(value) {
            Ok(item) => entries.items.push(item),
            Err(e) => {
                warn!(
                    "Skipping entry {} of {}: {}",
                    position,
                    path.display(),
                    e
                );
                entries.skipped += 1;
            }
        }
    }
    entries
}

fn read_entries<T: DeserializeOwned>(path: &Path) -> Result<Entries<T>> {
    Ok(parse_entries(read_json::<Vec<Value>>(path)?, path))
}

pub fn read_lastfm_artists(path: &Path) -> Result<Entries<LastfmArtist>> {
    let values = match read_json::<LastfmArtistsFile>(path)? {
        LastfmArtistsFile::Bare(artists) => artists,
        LastfmArtistsFile::Envelope { topartists } => topartists.artist,
    };
    Ok(parse_entries(values, path))
}

pub fn read_lastfm_tracks(path: &Path) -> Result<Entries<LastfmTrack>> {
    let values = match read_json::<LastfmTracksFile>(path)? {
        LastfmTracksFile::Bare(tracks) => tracks,
        LastfmTracksFile::Envelope { toptracks } => toptracks.track,
    };
    Ok(parse_entries(values, path))
}

pub fn read_spotify_artists(path: &Path) -> Result<Entries<SpotifyArtist>> {
    Ok(parse_entries(read_json::<Listing>(path)?.into_vec(), path))
}

pub fn read_spotify_tracks(path: &Path) -> Result<Entries<SpotifyTrack>> {
    let entries: Entries<SpotifyTrackEntry> =
        parse_entries(read_json::<Listing>(path)?.into_vec(), path);
    Ok(entries.map(SpotifyTrack::from))
}

pub fn read_apple_music_artists(path: &Path) -> Result<Entries<String>> {
    read_entries(path)
}

pub fn read_apple_music_songs(path: &Path) -> Result<Entries<AppleMusicSong>> {
    read_entries(path)
}

pub fn read_liked_songs(path: &Path) -> Result<Entries<LikedSong>> {
    read_entries(path)
}

/// `[video_id, video_title]` pairs
pub fn read_liked_videos(path: &Path) -> Result<Entries<(String, String)>> {
    read_entries(path)
}

/// Identify songs from liked video titles; unidentifiable videos are dropped.
pub fn identify_liked_songs(videos: &[(String, String)]) -> Vec<LikedSong> {
    let songs: Vec<LikedSong> = videos
        .iter()
        .filter_map(|(_, title)| identify_song_from_video_title(title))
        .collect();
    info!(
        "Identified {} songs from {} YouTube videos",
        songs.len(),
        videos.len()
    );
    songs
}

// ============================================================================
// Provider Files
// ============================================================================

/// Cache file locations for every provider. Unset means "not fetched".
#[derive(Debug, Default, Clone)]
pub struct ProviderFiles {
    pub lastfm_artists: Option<PathBuf>,
    pub lastfm_tracks: Option<PathBuf>,
    pub spotify_artists: Option<PathBuf>,
    pub spotify_tracks: Option<PathBuf>,
    pub spotify_artist_mode: SpotifyArtistMode,
    pub apple_music_artists: Option<PathBuf>,
    pub apple_music_songs: Option<PathBuf>,
    pub youtube_liked_songs: Option<PathBuf>,
    pub youtube_liked_videos: Option<PathBuf>,
}

/// Read an optional file, treating an unset path as empty.
fn read_optional<T>(
    path: &Option<PathBuf>,
    read: fn(&Path) -> Result<Entries<T>>,
) -> Result<Entries<T>> {
    Ok(path.as_deref().map(read).transpose()?.unwrap_or_default())
}

/// Whether a two-file provider is active; warns when only one half is present.
fn pair_active(provider: Provider, first: &Option<PathBuf>, second: &Option<PathBuf>) -> bool {
    match (first, second) {
        (None, None) => false,
        (Some(_), Some(_)) => true,
        _ => {
            warn!(
                "{} has only one of its two cache files, treating the other as empty",
                provider
            );
            true
        }
    }
}

impl ProviderFiles {
    /// Every supplied input path
    pub fn paths(&self) -> Vec<&Path> {
        [
            &self.lastfm_artists,
            &self.lastfm_tracks,
            &self.spotify_artists,
            &self.spotify_tracks,
            &self.apple_music_artists,
            &self.apple_music_songs,
            &self.youtube_liked_songs,
            &self.youtube_liked_videos,
        ]
        .into_iter()
        .filter_map(|p| p.as_deref())
        .collect()
    }

    /// Read every supplied cache file. Unreadable files are errors; malformed
    /// entries inside a readable file are skipped and counted per provider.
    pub fn load(&self) -> Result<ActiveSignals> {
        let mut signals = ActiveSignals::default();

        if pair_active(Provider::LastFm, &self.lastfm_artists, &self.lastfm_tracks) {
            let artists = read_optional(&self.lastfm_artists, read_lastfm_artists)?;
            let tracks = read_optional(&self.lastfm_tracks, read_lastfm_tracks)?;
            signals.record_load_skipped(Provider::LastFm, artists.skipped + tracks.skipped);
            info!(
                "Last.fm: {} artists, {} tracks",
                artists.items.len(),
                tracks.items.len()
            );
            signals.lastfm = Some(LastfmSignals {
                artists: artists.items,
                tracks: tracks.items,
            });
        }

        if pair_active(Provider::Spotify, &self.spotify_artists, &self.spotify_tracks) {
            let artists = read_optional(&self.spotify_artists, read_spotify_artists)?;
            let tracks = read_optional(&self.spotify_tracks, read_spotify_tracks)?;
            signals.record_load_skipped(Provider::Spotify, artists.skipped + tracks.skipped);
            info!(
                "Spotify: {} artists, {} tracks",
                artists.items.len(),
                tracks.items.len()
            );
            signals.spotify = Some(SpotifySignals {
                artists: artists.items,
                tracks: tracks.items,
                artist_mode: self.spotify_artist_mode,
            });
        }

        if pair_active(
            Provider::AppleMusic,
            &self.apple_music_artists,
            &self.apple_music_songs,
        ) {
            let artists = read_optional(&self.apple_music_artists, read_apple_music_artists)?;
            let songs = read_optional(&self.apple_music_songs, read_apple_music_songs)?;
            signals.record_load_skipped(Provider::AppleMusic, artists.skipped + songs.skipped);
            info!(
                "Apple Music: {} artists, {} songs",
                artists.items.len(),
                songs.items.len()
            );
            signals.apple_music = Some(AppleMusicSignals {
                artists: artists.items,
                songs: songs.items,
            });
        }

        let liked_songs = match (&self.youtube_liked_songs, &self.youtube_liked_videos) {
            (Some(songs), videos) => {
                if videos.is_some() {
                    warn!("Both YouTube liked songs and liked videos given, using liked songs");
                }
                Some(read_liked_songs(songs)?)
            }
            (None, Some(videos)) => {
                let videos = read_liked_videos(videos)?;
                Some(Entries {
                    items: identify_liked_songs(&videos.items),
                    skipped: videos.skipped,
                })
            }
            (None, None) => None,
        };
        if let Some(liked_songs) = liked_songs {
            signals.record_load_skipped(Provider::YouTube, liked_songs.skipped);
            info!("Youtube: {} liked songs", liked_songs.items.len());
            signals.youtube = Some(YouTubeSignals {
                liked_songs: liked_songs.items,
            });
        }

        Ok(signals)
    }
}
