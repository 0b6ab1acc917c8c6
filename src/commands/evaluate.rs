use crate::config::{Config, PipelineVariant};
use crate::error::{Error, Result};
use crate::evaluator::{GeminiClient, analysis_or_placeholder, evaluate};
use crate::youtube::{VideoPlatform, VideoRecord, YouTubeClient, extract_video_id};

pub async fn run(config: &Config, input: &str, variant: PipelineVariant, model: Option<String>) -> Result<()> {
    let video_id = extract_video_id(input)
        .ok_or_else(|| Error::Config(format!("invalid video URL or ID: {input}")))?;

    let platform = YouTubeClient::new(config.youtube_api_key()?)?;
    let snippet = platform
        .video_snippet(&video_id)
        .await?
        .ok_or_else(|| Error::YouTube(format!("video not found: {video_id}")))?;
    let video = VideoRecord::from_snippet(&video_id, snippet);

    let model = model.unwrap_or_else(|| variant.default_model().to_string());
    let generator = GeminiClient::new(config.gemini_api_key()?, model)?;

    eprintln!("Evaluating: {} ({})", video.title, generator.model());
    let result = evaluate(
        &generator,
        &video.title,
        &video.description,
        &video.channel,
        variant.prompt_language(),
    )
    .await;

    println!("Title: {}", video.title);
    println!("Channel: {}", video.channel);
    println!("Link: {}\n", video.link);
    println!("{}", analysis_or_placeholder(result));

    Ok(())
}
