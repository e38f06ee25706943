//! Ranking engine: karaoke catalog x provider signals -> ranked rows.
//!
//! The column schema is fixed from the set of active providers before any
//! row is built:
//! - 4 song columns (artist, title, brands, karaoke popularity)
//! - 4 columns per active provider, in canonical provider order
//! - 2 combined columns, only when more than one provider is active
//!
//! Rows are sorted on the rightmost column, descending.

use std::cmp::Reverse;

use tracing::{debug, info};

use crate::models::{ActiveSignals, Cell, KaraokeSong, Provider, Ranking, RankingStats};
use crate::normalize::{artist_key, track_key, SignalIndex};

// ============================================================================
// Column Schema
// ============================================================================

pub const SONG_COLUMNS: [&str; 4] = ["Artist", "Title", "Karaoke Brands", "Karaoke Popularity"];

pub const COMBINED_COLUMNS: [&str; 2] = [
    "Combined Artist Score x Karaoke Popularity",
    "Combined Track Score x Karaoke Popularity",
];

/// Per-provider columns: artist, track, artist x popularity, track x popularity
pub fn provider_columns(provider: Provider) -> [String; 4] {
    [
        provider.artist_label().to_string(),
        provider.track_label().to_string(),
        format!("{} x Karaoke Popularity", provider.artist_label()),
        format!("{} x Karaoke Popularity", provider.track_label()),
    ]
}

/// Output schema derived from which providers are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub header: Vec<String>,
    /// Active providers in canonical order
    pub providers: Vec<Provider>,
    /// Combined columns present (more than one active provider)
    pub combined: bool,
}

impl Schema {
    pub fn from_descriptors(descriptors: &[(Provider, bool)]) -> Self {
        let providers: Vec<Provider> = descriptors
            .iter()
            .filter(|(_, present)| *present)
            .map(|(provider, _)| *provider)
            .collect();
        let combined = providers.len() > 1;

        let header = SONG_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(providers.iter().flat_map(|p| provider_columns(*p)))
            .chain(
                COMBINED_COLUMNS
                    .iter()
                    .filter(|_| combined)
                    .map(|c| c.to_string()),
            )
            .collect();

        Self {
            header,
            providers,
            combined,
        }
    }

    pub fn for_signals(signals: &ActiveSignals) -> Self {
        Self::from_descriptors(&signals.descriptors())
    }

    pub fn width(&self) -> usize {
        self.header.len()
    }

    /// Sort and rank key: the rightmost column. Combined track score when
    /// present, otherwise the single provider's track x popularity.
    pub fn sort_column(&self) -> usize {
        self.header.len() - 1
    }
}

// ============================================================================
// Signal Indexes
// ============================================================================

/// Build one lookup index per active provider, in canonical order.
pub fn build_indexes(signals: &ActiveSignals) -> Vec<(Provider, SignalIndex)> {
    Provider::CANONICAL
        .iter()
        .filter_map(|&provider| {
            let index = match provider {
                Provider::LastFm => signals.lastfm.as_ref().map(SignalIndex::from_lastfm),
                Provider::Spotify => signals.spotify.as_ref().map(SignalIndex::from_spotify),
                Provider::AppleMusic => {
                    signals.apple_music.as_ref().map(SignalIndex::from_apple_music)
                }
                Provider::YouTube => signals.youtube.as_ref().map(SignalIndex::from_youtube),
            };
            index.map(|index| (provider, index))
        })
        .collect()
}

// ============================================================================
// Ranking
// ============================================================================

/// Score one song against every provider index.
///
/// Returns the row and the combined raw artist score used for filtering.
fn score_song(
    song: &KaraokeSong,
    indexes: &[(Provider, SignalIndex)],
    schema: &Schema,
) -> (Vec<Cell>, u64) {
    let popularity = song.karaoke_popularity();
    let artist = artist_key(&song.artist);
    let track = track_key(&song.artist, &song.title);

    let mut row = Vec::with_capacity(schema.width());
    row.push(Cell::from(song.artist.as_str()));
    row.push(Cell::from(song.title.as_str()));
    row.push(Cell::from(song.brands.as_str()));
    row.push(Cell::Int(popularity));

    let mut combined_artist_score: u64 = 0;
    let mut combined_track_score: u64 = 0;

    for (_, index) in indexes {
        let artist_score = index.artist(&artist);
        let track_score = index.track(&track);
        combined_artist_score = combined_artist_score.saturating_add(artist_score);
        combined_track_score = combined_track_score.saturating_add(track_score);

        row.extend([
            Cell::Int(artist_score),
            Cell::Int(track_score),
            Cell::Int(artist_score.saturating_mul(popularity)),
            Cell::Int(track_score.saturating_mul(popularity)),
        ]);
    }

    if schema.combined {
        row.push(Cell::Int(combined_artist_score.saturating_mul(popularity)));
        row.push(Cell::Int(combined_track_score.saturating_mul(popularity)));
    }

    (row, combined_artist_score)
}

/// Rank the karaoke catalog against every active provider's signals.
///
/// A row is kept when its combined raw artist score is positive, or always
/// when `include_zero_score` is set. The track score plays no part in the
/// filter. Rows are stably sorted descending on `Ranking::sort_column`, so
/// ties keep catalog order.
///
/// Callers must supply at least one active provider; with none, every row
/// has a zero artist score and only the song columns.
pub fn compute_ranking(
    catalog: &[KaraokeSong],
    signals: &ActiveSignals,
    include_zero_score: bool,
) -> (Ranking, RankingStats) {
    let schema = Schema::for_signals(signals);
    let sort_column = schema.sort_column();
    let indexes = build_indexes(signals);

    let mut stats = RankingStats {
        catalog_songs: catalog.len(),
        active_providers: schema.providers.len(),
        ..Default::default()
    };
    for (provider, index) in &indexes {
        debug!(
            "{}: {} artists, {} tracks indexed, {} skipped",
            provider,
            index.artists.len(),
            index.tracks.len(),
            index.skipped
        );
        stats.record_skipped(*provider, index.skipped + signals.load_skipped(*provider));
    }

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for song in catalog {
        let (row, combined_artist_score) = score_song(song, &indexes, &schema);
        debug_assert_eq!(row.len(), schema.width());

        if combined_artist_score > 0 || include_zero_score {
            rows.push(row);
        } else {
            stats.rows_dropped_zero_score += 1;
        }
    }

    rows.sort_by_key(|row| Reverse(row[sort_column].as_int()));
    stats.rows_kept = rows.len();

    info!(
        "Ranked {} of {} karaoke songs across {} provider(s)",
        stats.rows_kept, stats.catalog_songs, stats.active_providers
    );

    (
        Ranking {
            header: schema.header,
            rows,
            sort_column,
        },
        stats,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AppleMusicSignals, AppleMusicSong, LastfmArtist, LastfmSignals, LastfmTrack, NamedRef,
        PlayCount, SpotifyArtist, SpotifyArtistMode, SpotifySignals, YouTubeSignals,
    };

    fn abba_catalog() -> Vec<KaraokeSong> {
        vec![KaraokeSong::new("Abba", "Dancing Queen", "DJ1,DJ2")]
    }

    fn abba_lastfm() -> LastfmSignals {
        LastfmSignals {
            artists: vec![LastfmArtist {
                name: "abba".to_string(),
                playcount: Some(PlayCount::Text("10".to_string())),
            }],
            tracks: vec![LastfmTrack {
                name: "dancing queen".to_string(),
                artist: Some(NamedRef {
                    name: "abba".to_string(),
                }),
                playcount: Some(PlayCount::Text("5".to_string())),
            }],
        }
    }

    fn ints(values: &[u64]) -> Vec<Cell> {
        values.iter().map(|v| Cell::Int(*v)).collect()
    }

    fn song_cells(artist: &str, title: &str, brands: &str, popularity: u64) -> Vec<Cell> {
        vec![
            Cell::from(artist),
            Cell::from(title),
            Cell::from(brands),
            Cell::Int(popularity),
        ]
    }

    fn all_providers() -> ActiveSignals {
        ActiveSignals {
            lastfm: Some(abba_lastfm()),
            spotify: Some(SpotifySignals::default()),
            apple_music: Some(AppleMusicSignals::default()),
            youtube: Some(YouTubeSignals::default()),
            ..Default::default()
        }
    }

    #[test]
    fn test_single_provider_scenario() {
        let signals = ActiveSignals {
            lastfm: Some(abba_lastfm()),
            ..Default::default()
        };
        let (ranking, stats) = compute_ranking(&abba_catalog(), &signals, false);

        assert_eq!(
            ranking.header,
            vec![
                "Artist",
                "Title",
                "Karaoke Brands",
                "Karaoke Popularity",
                "Last.fm Artist Play Count",
                "Last.fm Track Play Count",
                "Last.fm Artist Play Count x Karaoke Popularity",
                "Last.fm Track Play Count x Karaoke Popularity",
            ]
        );
        let mut expected = song_cells("Abba", "Dancing Queen", "DJ1,DJ2", 2);
        expected.extend(ints(&[10, 5, 20, 10]));
        assert_eq!(ranking.rows, vec![expected]);
        assert_eq!(ranking.sort_column, 7);
        assert_eq!(ranking.rows[0][ranking.sort_column], Cell::Int(10));
        assert_eq!(stats.rows_kept, 1);
        assert_eq!(stats.active_providers, 1);
    }

    #[test]
    fn test_two_provider_scenario_adds_combined_columns() {
        let signals = ActiveSignals {
            lastfm: Some(abba_lastfm()),
            spotify: Some(SpotifySignals {
                artists: vec![SpotifyArtist {
                    name: "abba".to_string(),
                    popularity: 30,
                }],
                tracks: vec![],
                artist_mode: SpotifyArtistMode::Popularity,
            }),
            ..Default::default()
        };
        let (ranking, _) = compute_ranking(&abba_catalog(), &signals, false);

        assert_eq!(ranking.header.len(), 14);
        assert_eq!(ranking.header[8], "Spotify Artist Score");
        assert_eq!(ranking.header[12], COMBINED_COLUMNS[0]);
        assert_eq!(ranking.header[13], COMBINED_COLUMNS[1]);
        assert_eq!(ranking.sort_column, 13);

        let mut expected = song_cells("Abba", "Dancing Queen", "DJ1,DJ2", 2);
        expected.extend(ints(&[10, 5, 20, 10, 30, 0, 60, 0, 80, 10]));
        assert_eq!(ranking.rows, vec![expected]);
    }

    #[test]
    fn test_unmatched_song_dropped_without_zero_scores() {
        let catalog = vec![
            KaraokeSong::new("Abba", "Dancing Queen", "DJ1,DJ2"),
            KaraokeSong::new("Nobody Knows", "Obscure Song", "DJ1"),
        ];
        let signals = ActiveSignals {
            lastfm: Some(abba_lastfm()),
            ..Default::default()
        };

        let (ranking, stats) = compute_ranking(&catalog, &signals, false);
        assert_eq!(ranking.rows.len(), 1);
        assert_eq!(ranking.rows[0][0], Cell::from("Abba"));
        assert_eq!(stats.rows_dropped_zero_score, 1);

        let (ranking, stats) = compute_ranking(&catalog, &signals, true);
        assert_eq!(ranking.rows.len(), catalog.len());
        assert_eq!(stats.rows_dropped_zero_score, 0);
    }

    #[test]
    fn test_filter_ignores_track_score() {
        // Positive track signal but no artist signal: still dropped
        let signals = ActiveSignals {
            lastfm: Some(LastfmSignals {
                artists: vec![],
                tracks: abba_lastfm().tracks,
            }),
            ..Default::default()
        };
        let (ranking, _) = compute_ranking(&abba_catalog(), &signals, false);
        assert!(ranking.rows.is_empty());
    }

    #[test]
    fn test_case_insensitive_matching() {
        let catalog = vec![KaraokeSong::new("Queen", "Bohemian Rhapsody", "SF")];
        let signals = ActiveSignals {
            lastfm: Some(LastfmSignals {
                artists: vec![LastfmArtist {
                    name: "queen".to_string(),
                    playcount: Some(PlayCount::Number(3)),
                }],
                tracks: vec![LastfmTrack {
                    name: "bohemian rhapsody".to_string(),
                    artist: Some(NamedRef {
                        name: "queen".to_string(),
                    }),
                    playcount: Some(PlayCount::Number(2)),
                }],
            }),
            ..Default::default()
        };
        let (ranking, _) = compute_ranking(&catalog, &signals, false);
        assert_eq!(ranking.rows[0][4..], ints(&[3, 2, 3, 2])[..]);
    }

    #[test]
    fn test_sorted_descending_with_stable_ties() {
        let catalog = vec![
            KaraokeSong::new("Queen", "Low", "A"),
            KaraokeSong::new("Queen", "Tie One", "A,B"),
            KaraokeSong::new("Queen", "High", "A,B,C"),
            KaraokeSong::new("Queen", "Tie Two", "A,B"),
        ];
        let liked = |title: &str| ("Queen".to_string(), title.to_string());
        let signals = ActiveSignals {
            youtube: Some(YouTubeSignals {
                liked_songs: vec![liked("Low"), liked("Tie One"), liked("High"), liked("Tie Two")],
            }),
            ..Default::default()
        };

        let (ranking, _) = compute_ranking(&catalog, &signals, false);
        let titles: Vec<String> = ranking.rows.iter().map(|r| r[1].to_string()).collect();
        assert_eq!(titles, vec!["High", "Tie One", "Tie Two", "Low"]);

        for pair in ranking.rows.windows(2) {
            assert!(pair[0][ranking.sort_column].as_int() >= pair[1][ranking.sort_column].as_int());
        }
    }

    #[test]
    fn test_all_providers_schema() {
        let signals = all_providers();
        let (ranking, _) = compute_ranking(&abba_catalog(), &signals, true);

        assert_eq!(ranking.header.len(), 4 + 4 * 4 + 2);
        assert_eq!(ranking.sort_column, 21);
        assert_eq!(ranking.header[4], "Last.fm Artist Play Count");
        assert_eq!(ranking.header[8], "Spotify Artist Score");
        assert_eq!(ranking.header[12], "Apple Music Artist In Library");
        assert_eq!(ranking.header[16], "Youtube Artist Liked");
        for row in &ranking.rows {
            assert_eq!(row.len(), ranking.header.len());
        }
    }

    #[test]
    fn test_empty_provider_is_still_active() {
        let signals = ActiveSignals {
            apple_music: Some(AppleMusicSignals::default()),
            ..Default::default()
        };
        let (ranking, _) = compute_ranking(&abba_catalog(), &signals, true);
        assert_eq!(ranking.header.len(), 8);
        assert_eq!(ranking.header[4], "Apple Music Artist In Library");

        let mut expected = song_cells("Abba", "Dancing Queen", "DJ1,DJ2", 2);
        expected.extend(ints(&[0, 0, 0, 0]));
        assert_eq!(ranking.rows, vec![expected]);
    }

    #[test]
    fn test_combined_columns_only_with_multiple_providers() {
        for active in 1..=4 {
            let mut descriptors = Provider::CANONICAL.map(|p| (p, false));
            for descriptor in descriptors.iter_mut().take(active) {
                descriptor.1 = true;
            }
            let schema = Schema::from_descriptors(&descriptors);
            assert_eq!(schema.combined, active > 1);
            let combined_width = if active > 1 { 2 } else { 0 };
            assert_eq!(schema.width(), 4 + 4 * active + combined_width);
            assert_eq!(schema.sort_column(), schema.width() - 1);
        }
    }

    #[test]
    fn test_combined_scores_sum_across_providers() {
        let catalog = vec![KaraokeSong::new("Queen", "Under Pressure", "A,B,C")];
        let signals = ActiveSignals {
            apple_music: Some(AppleMusicSignals {
                artists: vec!["Queen".to_string()],
                songs: vec![AppleMusicSong {
                    title: "Under Pressure".to_string(),
                    artist: "Queen".to_string(),
                    album: None,
                }],
            }),
            youtube: Some(YouTubeSignals {
                liked_songs: vec![
                    ("Queen".to_string(), "Under Pressure".to_string()),
                    ("Queen".to_string(), "Radio Ga Ga".to_string()),
                ],
            }),
            ..Default::default()
        };

        let (ranking, _) = compute_ranking(&catalog, &signals, false);
        let row = &ranking.rows[0];
        // Apple: 1, 1, 3, 3; YouTube: 2, 1, 6, 3; combined: (1+2)*3, (1+1)*3
        assert_eq!(row[4..], ints(&[1, 1, 3, 3, 2, 1, 6, 3, 9, 6])[..]);
    }

    #[test]
    fn test_empty_catalog() {
        let (ranking, stats) = compute_ranking(&[], &all_providers(), false);
        assert!(ranking.rows.is_empty());
        assert_eq!(ranking.header.len(), 22);
        assert_eq!(stats.catalog_songs, 0);
    }

    #[test]
    fn test_idempotent() {
        let catalog = vec![
            KaraokeSong::new("Abba", "Dancing Queen", "DJ1,DJ2"),
            KaraokeSong::new("Abba", "SOS", "DJ1,DJ2"),
            KaraokeSong::new("Abba", "Waterloo", "DJ1"),
        ];
        let signals = all_providers();
        let first = compute_ranking(&catalog, &signals, true);
        let second = compute_ranking(&catalog, &signals, true);
        assert_eq!(first, second);
    }

    #[test]
    fn test_skipped_entries_counted_not_fatal() {
        let mut lastfm = abba_lastfm();
        lastfm.tracks.push(LastfmTrack {
            name: "Orphan".to_string(),
            artist: None,
            playcount: Some(PlayCount::Number(1)),
        });
        let signals = ActiveSignals {
            lastfm: Some(lastfm),
            ..Default::default()
        };
        let (ranking, stats) = compute_ranking(&abba_catalog(), &signals, false);
        assert_eq!(ranking.rows.len(), 1);
        assert_eq!(stats.skipped_lastfm, 1);
    }

    #[test]
    fn test_entries_skipped_on_load_reach_stats() {
        let mut signals = ActiveSignals {
            lastfm: Some(abba_lastfm()),
            ..Default::default()
        };
        signals.record_load_skipped(Provider::LastFm, 2);
        signals.record_load_skipped(Provider::LastFm, 0);

        let (ranking, stats) = compute_ranking(&abba_catalog(), &signals, false);
        assert_eq!(ranking.rows.len(), 1);
        assert_eq!(stats.skipped_lastfm, 2);
        assert_eq!(stats.total_skipped(), 2);
    }
}
