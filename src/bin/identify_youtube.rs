//! Identify songs from liked YouTube video titles
//! Usage: identify-youtube <liked_videos.json> <liked_songs.json>
//!
//! Input is a JSON array of [video_id, video_title] pairs; output is a JSON
//! array of [artist, title] pairs usable as --youtube-liked-songs.

use anyhow::{Context, Result};
use std::path::Path;

use karaoke_rank::normalize::identify_song_from_video_title;
use karaoke_rank::providers::read_liked_videos;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: identify-youtube <liked_videos.json> <liked_songs.json> [--show-unidentified]");
        std::process::exit(1);
    }

    let videos_path = Path::new(&args[1]);
    let songs_path = Path::new(&args[2]);
    let show_unidentified = args.iter().any(|a| a == "--show-unidentified");

    eprintln!("Loading liked videos from {}...", videos_path.display());
    let loaded = read_liked_videos(videos_path)?;
    let videos = loaded.items;

    let mut songs: Vec<(String, String)> = Vec::with_capacity(videos.len());
    let mut unidentified: Vec<&str> = Vec::new();
    for (_, title) in &videos {
        match identify_song_from_video_title(title) {
            Some(song) => songs.push(song),
            None => unidentified.push(title),
        }
    }

    let json = serde_json::to_string_pretty(&songs)?;
    std::fs::write(songs_path, json)
        .with_context(|| format!("Failed to write {}", songs_path.display()))?;

    println!("\n=== IDENTIFICATION RESULTS ===\n");
    println!("Liked videos:  {:>7}", videos.len());
    println!("Malformed:     {:>7}", loaded.skipped);
    println!("Identified:    {:>7}", songs.len());
    println!("Unidentified:  {:>7}", unidentified.len());
    println!("Output:        {}", songs_path.display());

    if show_unidentified && !unidentified.is_empty() {
        println!("\n=== UNIDENTIFIED ===\n");
        for title in &unidentified {
            println!("  \"{}\"", title);
        }
    }

    Ok(())
}
