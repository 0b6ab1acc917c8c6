use std::path::PathBuf;

use crate::commands::open_store;
use crate::config::{Config, PipelineVariant};
use crate::error::Result;
use crate::evaluator::GeminiClient;
use crate::pipeline::{self, PipelineOptions, Services};
use crate::transcript::YouTubeCaptions;
use crate::youtube::{SearchQuery, YouTubeClient};

pub struct RunArgs {
    pub query: String,
    pub days: u32,
    pub max_results: Option<u32>,
    pub variant: PipelineVariant,
    pub model: Option<String>,
    pub languages: Vec<String>,
    pub output: PathBuf,
    pub local: bool,
}

pub async fn run(config: &Config, args: RunArgs) -> Result<()> {
    let platform = YouTubeClient::new(config.youtube_api_key()?)?;
    let model = args
        .model
        .unwrap_or_else(|| args.variant.default_model().to_string());
    let generator = GeminiClient::new(config.gemini_api_key()?, model)?;
    let captions = YouTubeCaptions::new()?;
    let store = open_store(config, args.local)?;

    let options = PipelineOptions {
        search: SearchQuery {
            query: args.query,
            days: args.days,
            max_results: args
                .max_results
                .unwrap_or_else(|| args.variant.default_max_results()),
        },
        variant: args.variant,
        languages: args.languages,
        output: args.output,
    };

    eprintln!(
        "Searching for '{}' (last {} days, up to {} videos, model {})",
        options.search.query,
        options.search.days,
        options.search.max_results,
        generator.model()
    );

    let services = Services {
        platform: &platform,
        captions: &captions,
        generator: &generator,
        store: store.as_ref(),
    };
    let summary = pipeline::run(&services, &options).await?;

    println!("Videos evaluated: {}", summary.videos.len());
    if options.variant.fetch_transcripts() {
        println!(
            "Transcripts: {} saved, {} already stored, {} failed",
            summary.transcripts.inserted, summary.transcripts.skipped, summary.transcripts.failed
        );
    }
    match &summary.report_path {
        Some(path) => println!("Report: {}", path.display()),
        None => println!("Report: not written (see log)"),
    }
    println!(
        "Database: {} inserted, {} already present, {} failed",
        summary.persisted.inserted, summary.persisted.skipped, summary.persisted.failed
    );

    Ok(())
}
