use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::PipelineVariant;
use crate::database::{self, PersistSummary, TableStore};
use crate::error::Result;
use crate::evaluator::{self, TextGenerator};
use crate::report;
use crate::transcript::{self, CaptionSource};
use crate::youtube::{self, SearchQuery, VideoPlatform, VideoRecord};

/// What one run searches for and where it writes
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub search: SearchQuery,
    pub variant: PipelineVariant,
    pub languages: Vec<String>,
    pub output: PathBuf,
}

/// External collaborators a run talks to
pub struct Services<'a> {
    pub platform: &'a dyn VideoPlatform,
    pub captions: &'a dyn CaptionSource,
    pub generator: &'a dyn TextGenerator,
    pub store: &'a dyn TableStore,
}

/// Outcome of one run
#[derive(Debug)]
pub struct RunSummary {
    pub videos: Vec<VideoRecord>,
    pub transcripts: PersistSummary,
    pub report_path: Option<PathBuf>,
    pub persisted: PersistSummary,
}

/// Discovery → transcripts (full variant) → evaluation → report → persistence.
///
/// Only discovery errors are returned. Later stages log failures and keep
/// going with whatever they have.
pub async fn run(services: &Services<'_>, options: &PipelineOptions) -> Result<RunSummary> {
    let mut videos = youtube::discover(services.platform, &options.search).await?;
    info!(count = videos.len(), "videos discovered");

    let transcripts = if options.variant.fetch_transcripts() {
        store_transcripts(services, &videos, &options.languages).await
    } else {
        PersistSummary::default()
    };

    evaluator::evaluate_videos(
        services.generator,
        &mut videos,
        options.variant.prompt_language(),
    )
    .await;

    let report_path = match report::save_report(&videos, &options.output) {
        Ok(path) => Some(path),
        Err(e) => {
            warn!(error = %e, "failed to write report");
            None
        }
    };

    let persisted = database::save_videos(services.store, &videos).await;
    info!(
        inserted = persisted.inserted,
        skipped = persisted.skipped,
        failed = persisted.failed,
        "videos persisted"
    );

    Ok(RunSummary {
        videos,
        transcripts,
        report_path,
        persisted,
    })
}

/// Fetch and store a transcript for every video that doesn't have one yet.
/// Videos already in the table are not fetched at all.
async fn store_transcripts(
    services: &Services<'_>,
    videos: &[VideoRecord],
    languages: &[String],
) -> PersistSummary {
    let languages: Vec<&str> = languages.iter().map(String::as_str).collect();
    let languages = languages.as_slice();
    let mut summary = PersistSummary::default();

    for video in videos {
        let Some(video_id) = video.video_id() else {
            warn!(link = %video.link, "no video id in link, skipping transcript");
            summary.failed += 1;
            continue;
        };

        let id = video_id.as_str();
        let outcome = database::save_transcript_with(services.store, id, move || async move {
            transcript::resolve(services.captions, id, languages)
                .await
                .into_record(id)
        })
        .await;
        if let Err(e) = &outcome {
            warn!(video_id = %video_id, error = %e, "failed to save transcript");
        }
        summary.record(&outcome);
    }

    summary
}
