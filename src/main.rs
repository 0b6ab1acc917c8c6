use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yt_review::commands;
use yt_review::commands::run::RunArgs;
use yt_review::config::{Config, PipelineVariant};
use yt_review::report::DEFAULT_REPORT_FILE;

const DEFAULT_QUERY: &str = "Algorithm+Advent of Code+Python+2024";

#[derive(Parser)]
#[command(name = "yt-review")]
#[command(about = "Discover recent YouTube videos, filter their transcripts, and review them with Gemini")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search, review, and store recent long-form videos
    Run {
        /// Search query
        #[arg(short, long, default_value = DEFAULT_QUERY)]
        query: String,

        /// Only videos published in the last N days
        #[arg(short, long, default_value = "7")]
        days: u32,

        /// Maximum number of videos (default depends on the variant)
        #[arg(short = 'n', long)]
        max_results: Option<u32>,

        /// Pipeline variant
        #[arg(long, value_enum, default_value = "full")]
        variant: PipelineVariant,

        /// Gemini model (default depends on the variant)
        #[arg(short, long)]
        model: Option<String>,

        /// Caption languages to request, in order of preference
        #[arg(short, long, value_delimiter = ',', default_value = "en,pt,pt-BR")]
        languages: Vec<String>,

        /// Spreadsheet to write
        #[arg(short, long, default_value = DEFAULT_REPORT_FILE)]
        output: PathBuf,

        /// Store rows in the local SQLite database instead of Supabase
        #[arg(long)]
        local: bool,
    },

    /// Search YouTube without reviewing anything
    Search {
        /// Search query
        query: String,

        /// Only videos published in the last N days
        #[arg(short, long, default_value = "7")]
        days: u32,

        /// Maximum number of results (default: 10)
        #[arg(short = 'n', long, default_value = "10")]
        limit: u32,
    },

    /// Fetch and language-check one video's transcript
    Transcript {
        /// Video URL or ID
        video: String,

        /// Caption languages to request, in order of preference
        #[arg(short, long, value_delimiter = ',', default_value = "en,pt,pt-BR")]
        languages: Vec<String>,

        /// Store the result in the transcriptions table
        #[arg(short, long)]
        save: bool,

        /// Use the local SQLite database instead of Supabase
        #[arg(long)]
        local: bool,
    },

    /// Review a single video with Gemini
    Evaluate {
        /// Video URL or ID
        video: String,

        /// Which rubric and default model to use
        #[arg(long, value_enum, default_value = "quick")]
        variant: PipelineVariant,

        /// Gemini model
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Write API keys to the data directory's .env
    Init {
        /// Overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Show local database statistics
    Stats,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,yt_review=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match Config::load() {
        Ok(config) => match cli.command {
            Commands::Run {
                query,
                days,
                max_results,
                variant,
                model,
                languages,
                output,
                local,
            } => {
                let args = RunArgs {
                    query,
                    days,
                    max_results,
                    variant,
                    model,
                    languages,
                    output,
                    local,
                };
                commands::run::run(&config, args).await
            }
            Commands::Search { query, days, limit } => {
                commands::search::run(&config, &query, days, limit).await
            }
            Commands::Transcript {
                video,
                languages,
                save,
                local,
            } => commands::transcript::run(&config, &video, &languages, save, local).await,
            Commands::Evaluate {
                video,
                variant,
                model,
            } => commands::evaluate::run(&config, &video, variant, model).await,
            Commands::Init { force } => commands::init::run(&config, force),
            Commands::Stats => commands::stats::run(&config),
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
