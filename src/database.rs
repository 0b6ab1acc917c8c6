use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::transcript::TranscriptRecord;
use crate::youtube::VideoRecord;

pub const VIDEOS_TABLE: &str = "videos";
pub const TRANSCRIPTS_TABLE: &str = "transcriptions";

/// Row shape of the `videos` table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoRow<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub channel: &'a str,
    pub link: &'a str,
    pub qualitative_analysis: &'a str,
}

impl<'a> From<&'a VideoRecord> for VideoRow<'a> {
    fn from(video: &'a VideoRecord) -> Self {
        Self {
            title: &video.title,
            description: &video.description,
            channel: &video.channel,
            link: &video.link,
            qualitative_analysis: video.qualitative_analysis.as_deref().unwrap_or(""),
        }
    }
}

/// The two tables the pipeline writes to.
///
/// Callers check for a row and insert it as two separate calls. Nothing makes
/// that pair atomic, so two concurrent runs can both see a key as absent and
/// both insert it.
#[async_trait]
pub trait TableStore: Send + Sync {
    async fn transcript_exists(&self, video_id: &str) -> Result<bool>;

    async fn insert_transcript(&self, record: &TranscriptRecord) -> Result<()>;

    async fn video_exists(&self, link: &str) -> Result<bool>;

    async fn insert_video(&self, video: &VideoRecord) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Skipped,
}

/// Per-batch persistence counts
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PersistSummary {
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl PersistSummary {
    pub(crate) fn record(&mut self, outcome: &Result<InsertOutcome>) {
        match outcome {
            Ok(InsertOutcome::Inserted) => self.inserted += 1,
            Ok(InsertOutcome::Skipped) => self.skipped += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// Insert a transcript row for `video_id` unless one exists. `fetch` only
/// runs when the row is missing, so stored videos are never fetched again.
pub async fn save_transcript_with<F, Fut>(
    store: &dyn TableStore,
    video_id: &str,
    fetch: F,
) -> Result<InsertOutcome>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = TranscriptRecord>,
{
    if store.transcript_exists(video_id).await? {
        info!(video_id, "transcript already stored, skipping");
        return Ok(InsertOutcome::Skipped);
    }

    let record = fetch().await;
    store.insert_transcript(&record).await?;
    match record.transcript_text {
        Some(_) => info!(video_id, "transcript saved"),
        None => info!(video_id, "transcript saved as null"),
    }
    Ok(InsertOutcome::Inserted)
}

/// Insert an already resolved transcript row unless one exists
pub async fn save_transcript(store: &dyn TableStore, record: &TranscriptRecord) -> Result<InsertOutcome> {
    save_transcript_with(store, &record.video_id, || std::future::ready(record.clone())).await
}

/// Insert a video row unless one with the same watch-URL exists
pub async fn save_video(store: &dyn TableStore, video: &VideoRecord) -> Result<InsertOutcome> {
    if store.video_exists(&video.link).await? {
        info!(link = %video.link, title = %video.title, "video already stored, skipping");
        return Ok(InsertOutcome::Skipped);
    }

    store.insert_video(video).await?;
    info!(link = %video.link, title = %video.title, "video saved");
    Ok(InsertOutcome::Inserted)
}

/// Save every video, logging and counting failures without stopping.
pub async fn save_videos(store: &dyn TableStore, videos: &[VideoRecord]) -> PersistSummary {
    let mut summary = PersistSummary::default();
    for video in videos {
        let outcome = save_video(store, video).await;
        if let Err(e) = &outcome {
            warn!(link = %video.link, error = %e, "failed to save video");
        }
        summary.record(&outcome);
    }
    summary
}

/// Supabase tables over the PostgREST API
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseStore {
    pub fn new(project_url: &str, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            base_url: format!("{}/rest/v1", project_url.trim_end_matches('/')),
            api_key: api_key.into(),
        })
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn exists(&self, table: &str, column: &str, value: &str) -> Result<bool> {
        let response = self
            .authorized(self.client.get(format!("{}/{}", self.base_url, table)))
            .query(&[("select", "id".to_string()), (column, format!("eq.{value}"))])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Persistence(format!(
                "select from {} failed ({}): {}",
                table, status, text
            )));
        }

        let rows: Vec<Value> = response.json().await?;
        Ok(!rows.is_empty())
    }

    async fn insert<T: Serialize + Sync>(&self, table: &str, row: &T) -> Result<()> {
        let response = self
            .authorized(self.client.post(format!("{}/{}", self.base_url, table)))
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Persistence(format!(
                "insert into {} failed ({}): {}",
                table, status, text
            )));
        }

        let rows: Vec<Value> = response.json().await?;
        if rows.is_empty() {
            return Err(Error::Persistence(format!(
                "insert into {} returned no rows",
                table
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl TableStore for SupabaseStore {
    async fn transcript_exists(&self, video_id: &str) -> Result<bool> {
        self.exists(TRANSCRIPTS_TABLE, "video_id", video_id).await
    }

    async fn insert_transcript(&self, record: &TranscriptRecord) -> Result<()> {
        self.insert(TRANSCRIPTS_TABLE, record).await
    }

    async fn video_exists(&self, link: &str) -> Result<bool> {
        self.exists(VIDEOS_TABLE, "link", link).await
    }

    async fn insert_video(&self, video: &VideoRecord) -> Result<()> {
        self.insert(VIDEOS_TABLE, &VideoRow::from(video)).await
    }
}

/// Initialize database tables
fn init_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS videos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT,
            channel TEXT,
            link TEXT NOT NULL,
            qualitative_analysis TEXT,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS transcriptions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            video_id TEXT NOT NULL,
            transcript_text TEXT,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX IF NOT EXISTS idx_videos_link ON videos(link);
        CREATE INDEX IF NOT EXISTS idx_transcriptions_video_id ON transcriptions(video_id);
        "#,
    )?;
    Ok(())
}

/// Database statistics
#[derive(Debug, Serialize, Deserialize)]
pub struct Stats {
    pub total_videos: i64,
    pub unique_channels: i64,
    pub total_transcriptions: i64,
    pub null_transcriptions: i64,
}

/// The same two tables in a local SQLite file
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        init_tables(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Persistence("database connection poisoned".to_string()))
    }

    /// Stored transcript text for a video, if a row exists
    pub fn transcript_text(&self, video_id: &str) -> Result<Option<Option<String>>> {
        let conn = self.conn()?;
        let text = conn
            .query_row(
                "SELECT transcript_text FROM transcriptions WHERE video_id = ?1 LIMIT 1",
                params![video_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(text)
    }

    /// Number of rows in the `videos` table with this link
    pub fn count_videos(&self, link: &str) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM videos WHERE link = ?1",
            params![link],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<Stats> {
        let conn = self.conn()?;

        let stats = conn.query_row(
            r#"
            SELECT
                (SELECT COUNT(*) FROM videos),
                (SELECT COUNT(DISTINCT channel) FROM videos),
                (SELECT COUNT(*) FROM transcriptions),
                (SELECT COUNT(*) FROM transcriptions WHERE transcript_text IS NULL)
            "#,
            [],
            |row| {
                Ok(Stats {
                    total_videos: row.get(0)?,
                    unique_channels: row.get(1)?,
                    total_transcriptions: row.get(2)?,
                    null_transcriptions: row.get(3)?,
                })
            },
        )?;

        Ok(stats)
    }
}

#[async_trait]
impl TableStore for SqliteStore {
    async fn transcript_exists(&self, video_id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT id FROM transcriptions WHERE video_id = ?1 LIMIT 1",
                params![video_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    async fn insert_transcript(&self, record: &TranscriptRecord) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO transcriptions (video_id, transcript_text) VALUES (?1, ?2)",
            params![record.video_id, record.transcript_text],
        )?;
        Ok(())
    }

    async fn video_exists(&self, link: &str) -> Result<bool> {
        let conn = self.conn()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT id FROM videos WHERE link = ?1 LIMIT 1",
                params![link],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    async fn insert_video(&self, video: &VideoRecord) -> Result<()> {
        let row = VideoRow::from(video);
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO videos (title, description, channel, link, qualitative_analysis)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![row.title, row.description, row.channel, row.link, row.qualitative_analysis],
        )?;
        Ok(())
    }
}
