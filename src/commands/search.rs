use crate::config::Config;
use crate::error::Result;
use crate::youtube::{SearchQuery, VideoRecord, YouTubeClient, discover};

pub async fn run(config: &Config, query: &str, days: u32, limit: u32) -> Result<()> {
    let platform = YouTubeClient::new(config.youtube_api_key()?)?;

    eprintln!("Searching YouTube for: {}", query);

    let search = SearchQuery {
        query: query.to_string(),
        days,
        max_results: limit,
    };
    let results = discover(&platform, &search).await?;

    if results.is_empty() {
        println!("No results found for: {}", query);
        return Ok(());
    }

    println!("Found {} result(s) for '{}':\n", results.len(), query);

    for (i, video) in results.iter().enumerate() {
        print_search_result(i + 1, video);
    }

    println!("To review these videos, run:");
    println!("  yt-review run --query \"{}\"", query);

    Ok(())
}

fn print_search_result(index: usize, video: &VideoRecord) {
    println!("{}. {} - {}", index, video.title, video.channel);
    println!("   {}", video.link);
    println!();
}
