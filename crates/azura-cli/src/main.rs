//! Thin presentation caller for the azura-client provider.
//!
//! `azura history [count]` — recent songs, falling back to the persisted
//! snapshot when the live fetch fails (the fallback decision lives here,
//! not in the library).

use anyhow::Result;
use azura_client::{Config, HistoryResult, SongDataProvider};
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,azura_client=info")),
        )
        .init();

    let config = Config::load()?;
    let provider = SongDataProvider::new(config);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("history") => {
            let count = args.get(1).and_then(|s| s.parse::<usize>().ok());
            match provider.get_song_history(count).await {
                Ok(result) => print_history(&result),
                Err(e) => {
                    warn!("live fetch failed: {}", e);
                    let cached = provider.get_cached_history(count);
                    if cached.is_empty() {
                        println!("Song history is currently unavailable.");
                    } else {
                        println!("(showing last known data)");
                        print_history(&cached);
                    }
                }
            }
        }
        Some("now") => match provider.get_now_playing().await {
            Ok(Some(song)) => println!("{} \u{2013} {}", song.artist, song.title),
            Ok(None) => println!("Nothing playing right now."),
            Err(e) => {
                warn!("live fetch failed: {}", e);
                match provider.get_cached_history(Some(1)).now_playing {
                    Some(song) => println!("{} \u{2013} {} (last known)", song.artist, song.title),
                    None => println!("Now playing is currently unavailable."),
                }
            }
        },
        Some("test") => match provider.test_connection().await {
            Ok(()) => println!("Connection OK."),
            Err(e) => {
                eprintln!("Connection failed: {}", e);
                std::process::exit(1);
            }
        },
        Some("clear-cache") => {
            provider.clear_cache().await;
            println!("Caches cleared.");
        }
        _ => {
            eprintln!("usage: azura <history [count] | now | test | clear-cache>");
            eprintln!("config file: {}", Config::config_path().display());
            std::process::exit(2);
        }
    }

    Ok(())
}

fn print_history(result: &HistoryResult) {
    if let Some(name) = result.station_name() {
        println!("# {}", name);
    }
    if result.live.is_live {
        println!("LIVE: {}", result.live.streamer_name);
    }
    if let Some(song) = &result.now_playing {
        println!("Now playing: {} \u{2013} {}", song.artist, song.title);
    }
    let now = chrono::Utc::now().timestamp();
    for song in &result.song_history {
        let ago = song.played_ago(now);
        if ago.is_empty() {
            println!("  {} \u{2013} {}", song.artist, song.title);
        } else {
            println!("  {} \u{2013} {}  ({})", song.artist, song.title, ago);
        }
    }
}
