use anyhow::{bail, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use karaoke_rank::catalog::{load_catalog_checked, max_age_from_days};
use karaoke_rank::models::SpotifyArtistMode;
use karaoke_rank::output::{write_ranking, CsvSink};
use karaoke_rank::progress::{create_spinner, finish_phase, format_duration, set_log_only};
use karaoke_rank::providers::ProviderFiles;
use karaoke_rank::safety::validate_output_path;
use karaoke_rank::scoring::compute_ranking;

#[derive(Parser)]
#[command(name = "karaoke-rank")]
#[command(about = "Rank karaoke songs by how well you know them from your listening history")]
struct Args {
    /// Karaoke catalog JSON, plain or gzipped (array of {Artist, Title, Brands})
    #[arg(long, env = "KARAOKE_SONGS_FILE")]
    catalog: PathBuf,

    /// Output CSV path
    #[arg(long, env = "CSV_OUTPUT_FILE")]
    output: PathBuf,

    /// Keep songs with no artist signal from any provider
    #[arg(long)]
    include_zero_score: bool,

    /// Warn when the catalog is older than this many days
    #[arg(long, default_value = "3")]
    catalog_max_age_days: u64,

    #[arg(long, env = "LASTFM_ARTISTS_FILE")]
    lastfm_artists: Option<PathBuf>,

    #[arg(long, env = "LASTFM_TRACKS_FILE")]
    lastfm_tracks: Option<PathBuf>,

    #[arg(long, env = "SPOTIFY_ARTISTS_FILE")]
    spotify_artists: Option<PathBuf>,

    #[arg(long, env = "SPOTIFY_TRACKS_FILE")]
    spotify_tracks: Option<PathBuf>,

    /// Score Spotify artists as followed (1) instead of by popularity
    #[arg(long)]
    spotify_followed_only: bool,

    #[arg(long, env = "APPLEMUSIC_ARTISTS_FILE")]
    applemusic_artists: Option<PathBuf>,

    #[arg(long, env = "APPLEMUSIC_SONGS_FILE")]
    applemusic_songs: Option<PathBuf>,

    /// YouTube liked songs as [artist, title] pairs
    #[arg(long, env = "YOUTUBE_LIKED_SONGS_FILE")]
    youtube_liked_songs: Option<PathBuf>,

    /// YouTube liked videos as [video_id, title] pairs, identified by title
    #[arg(long, env = "YOUTUBE_LIKED_VIDEOS_FILE", conflicts_with = "youtube_liked_songs")]
    youtube_liked_videos: Option<PathBuf>,

    /// Write ranking stats JSON to this path
    #[arg(long)]
    stats: Option<PathBuf>,

    /// Hide spinners, log only (for background runs)
    #[arg(long)]
    log_only: bool,
}

impl Args {
    fn provider_files(&self) -> ProviderFiles {
        ProviderFiles {
            lastfm_artists: self.lastfm_artists.clone(),
            lastfm_tracks: self.lastfm_tracks.clone(),
            spotify_artists: self.spotify_artists.clone(),
            spotify_tracks: self.spotify_tracks.clone(),
            spotify_artist_mode: if self.spotify_followed_only {
                SpotifyArtistMode::FollowedPresence
            } else {
                SpotifyArtistMode::Popularity
            },
            apple_music_artists: self.applemusic_artists.clone(),
            apple_music_songs: self.applemusic_songs.clone(),
            youtube_liked_songs: self.youtube_liked_songs.clone(),
            youtube_liked_videos: self.youtube_liked_videos.clone(),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "karaoke_rank=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    set_log_only(args.log_only);

    let start = Instant::now();

    let files = args.provider_files();
    let mut inputs: Vec<&Path> = files.paths();
    inputs.push(&args.catalog);
    validate_output_path(&args.output, &inputs)?;

    let spinner = create_spinner("Phase 1: Loading provider data");
    let signals = files.load()?;
    if signals.active_count() == 0 {
        bail!("At least one music data source is required");
    }
    finish_phase(
        &spinner,
        format!("Phase 1: Loaded data from {} provider(s)", signals.active_count()),
    );

    let spinner = create_spinner("Phase 2: Loading karaoke catalog");
    let max_age = max_age_from_days(args.catalog_max_age_days);
    let catalog = load_catalog_checked(&args.catalog, max_age)?;
    finish_phase(&spinner, format!("Phase 2: Loaded {} karaoke songs", catalog.len()));

    let spinner = create_spinner("Phase 3: Ranking songs");
    let (ranking, mut stats) = compute_ranking(&catalog, &signals, args.include_zero_score);
    finish_phase(&spinner, format!("Phase 3: Ranked {} songs", ranking.rows.len()));

    let spinner = create_spinner("Phase 4: Writing CSV");
    let mut sink = CsvSink::create(&args.output)?;
    let ranges = write_ranking(&mut sink, &ranking)?;
    finish_phase(
        &spinner,
        format!("Phase 4: Wrote {} (data {})", args.output.display(), ranges.data),
    );

    stats.elapsed_seconds = start.elapsed().as_secs_f64();
    stats.log_phase("ranking");
    if let Some(path) = &args.stats {
        stats.write_to_file(path)?;
        info!("Stats written to {}", path.display());
    }

    println!("\n{:=<60}", "");
    println!("Ranking complete!");
    println!("  Songs: {} of {} ({:.1}%)", stats.rows_kept, stats.catalog_songs, stats.keep_rate());
    println!("  Providers: {}", stats.active_providers);
    println!("  Skipped signal entries: {}", stats.total_skipped());
    println!("  Output: {} (header {}, data {})", args.output.display(), ranges.header, ranges.data);
    println!("  Elapsed: {}", format_duration(start.elapsed()));
    println!("{:=<60}", "");

    Ok(())
}
