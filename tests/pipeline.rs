use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use yt_review::config::PipelineVariant;
use yt_review::database::{SqliteStore, TableStore};
use yt_review::error::{Error, Result};
use yt_review::evaluator::TextGenerator;
use yt_review::pipeline::{self, PipelineOptions, Services};
use yt_review::transcript::{CaptionSource, TranscriptRecord};
use yt_review::youtube::{
    SearchItem, SearchPage, SearchQuery, SearchRequest, VideoPlatform, VideoSnippet, watch_url,
};

const ENGLISH: &str = "In this video we solve the puzzle step by step, explaining how the \
    graph search works, why we keep a queue of the nodes we still have to visit, and how the \
    running time grows as the input gets larger and larger every single day.";

struct OnePagePlatform {
    ids: Vec<&'static str>,
    searches: Mutex<usize>,
}

#[async_trait]
impl VideoPlatform for OnePagePlatform {
    async fn search_page(&self, _request: &SearchRequest) -> Result<SearchPage> {
        *self.searches.lock().unwrap() += 1;
        Ok(SearchPage {
            items: self.ids.iter().map(|id| SearchItem::video(id)).collect(),
            next_page_token: None,
        })
    }

    async fn video_snippet(&self, video_id: &str) -> Result<Option<VideoSnippet>> {
        Ok(Some(VideoSnippet {
            title: format!("Advent of Code {video_id}"),
            description: Some("Day solutions".to_string()),
            channel_title: "Puzzles".to_string(),
        }))
    }
}

struct FailingPlatform;

#[async_trait]
impl VideoPlatform for FailingPlatform {
    async fn search_page(&self, _request: &SearchRequest) -> Result<SearchPage> {
        Err(Error::YouTube("quotaExceeded".to_string()))
    }

    async fn video_snippet(&self, _video_id: &str) -> Result<Option<VideoSnippet>> {
        Ok(None)
    }
}

#[derive(Default)]
struct RecordingCaptions {
    texts: HashMap<&'static str, &'static str>,
    fetched: Mutex<Vec<String>>,
}

#[async_trait]
impl CaptionSource for RecordingCaptions {
    async fn fetch_captions(&self, video_id: &str, _languages: &[&str]) -> Result<Vec<String>> {
        self.fetched.lock().unwrap().push(video_id.to_string());
        match self.texts.get(video_id) {
            Some(text) => Ok(vec![text.to_string()]),
            None => Err(Error::CaptionsUnavailable("transcripts disabled".to_string())),
        }
    }
}

/// Fails for titles containing "b", succeeds otherwise
struct PickyGenerator;

#[async_trait]
impl TextGenerator for PickyGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if prompt.contains("Title: Advent of Code b\n") {
            Err(Error::EvaluationStatus {
                status: 503,
                body: "overloaded".to_string(),
            })
        } else {
            Ok("Clear explanation".to_string())
        }
    }
}

fn options(dir: &tempfile::TempDir, variant: PipelineVariant, max_results: u32) -> PipelineOptions {
    PipelineOptions {
        search: SearchQuery {
            query: "test".to_string(),
            days: 7,
            max_results,
        },
        variant,
        languages: vec!["en".to_string(), "pt".to_string()],
        output: dir.path().join("report.xlsx"),
    }
}

#[tokio::test]
async fn full_run_annotates_reports_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let platform = OnePagePlatform {
        ids: vec!["a", "b"],
        searches: Mutex::new(0),
    };
    let captions = RecordingCaptions {
        texts: HashMap::from([("a", ENGLISH)]),
        ..Default::default()
    };
    let store = SqliteStore::open_in_memory().unwrap();
    let services = Services {
        platform: &platform,
        captions: &captions,
        generator: &PickyGenerator,
        store: &store,
    };

    let summary = pipeline::run(&services, &options(&dir, PipelineVariant::Full, 2))
        .await
        .unwrap();

    assert_eq!(*platform.searches.lock().unwrap(), 1);
    assert_eq!(summary.videos.len(), 2);
    assert_eq!(
        summary.videos[0].qualitative_analysis.as_deref(),
        Some("Clear explanation")
    );
    assert_eq!(
        summary.videos[1].qualitative_analysis.as_deref(),
        Some("Request failed: 503 - overloaded")
    );

    assert_eq!(summary.transcripts.inserted, 2);
    assert_eq!(store.transcript_text("a").unwrap(), Some(Some(ENGLISH.to_string())));
    assert_eq!(store.transcript_text("b").unwrap(), Some(None));

    assert_eq!(summary.report_path, Some(dir.path().join("report.xlsx")));
    assert_eq!(summary.persisted.inserted, 2);
    assert_eq!(store.count_videos(&watch_url("a")).unwrap(), 1);
}

#[tokio::test]
async fn second_run_skips_existing_rows_without_fetching() {
    let dir = tempfile::tempdir().unwrap();
    let platform = OnePagePlatform {
        ids: vec!["a"],
        searches: Mutex::new(0),
    };
    let captions = RecordingCaptions {
        texts: HashMap::from([("a", ENGLISH)]),
        ..Default::default()
    };
    let store = SqliteStore::open_in_memory().unwrap();
    store
        .insert_transcript(&TranscriptRecord {
            video_id: "a".to_string(),
            transcript_text: Some("earlier".to_string()),
        })
        .await
        .unwrap();
    let services = Services {
        platform: &platform,
        captions: &captions,
        generator: &PickyGenerator,
        store: &store,
    };

    pipeline::run(&services, &options(&dir, PipelineVariant::Full, 5))
        .await
        .unwrap();
    let summary = pipeline::run(&services, &options(&dir, PipelineVariant::Full, 5))
        .await
        .unwrap();

    assert!(captions.fetched.lock().unwrap().is_empty());
    assert_eq!(store.transcript_text("a").unwrap(), Some(Some("earlier".to_string())));
    assert_eq!(summary.transcripts.skipped, 1);
    assert_eq!(summary.persisted.inserted, 0);
    assert_eq!(summary.persisted.skipped, 1);
    assert_eq!(store.count_videos(&watch_url("a")).unwrap(), 1);
}

#[tokio::test]
async fn quick_variant_never_touches_transcripts() {
    let dir = tempfile::tempdir().unwrap();
    let platform = OnePagePlatform {
        ids: vec!["a"],
        searches: Mutex::new(0),
    };
    let captions = RecordingCaptions::default();
    let store = SqliteStore::open_in_memory().unwrap();
    let services = Services {
        platform: &platform,
        captions: &captions,
        generator: &PickyGenerator,
        store: &store,
    };

    let summary = pipeline::run(&services, &options(&dir, PipelineVariant::Quick, 10))
        .await
        .unwrap();

    assert!(captions.fetched.lock().unwrap().is_empty());
    assert_eq!(store.transcript_text("a").unwrap(), None);
    assert_eq!(summary.persisted.inserted, 1);
}

#[tokio::test]
async fn discovery_failure_ends_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let captions = RecordingCaptions::default();
    let store = SqliteStore::open_in_memory().unwrap();
    let services = Services {
        platform: &FailingPlatform,
        captions: &captions,
        generator: &PickyGenerator,
        store: &store,
    };

    let result = pipeline::run(&services, &options(&dir, PipelineVariant::Full, 10)).await;

    assert!(matches!(result, Err(Error::YouTube(_))));
    assert!(!dir.path().join("report.xlsx").exists());
}
