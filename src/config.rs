use std::path::{Path, PathBuf};

use clap::ValueEnum;

use crate::error::{Error, Result};

pub const YOUTUBE_API_KEY: &str = "YOUTUBE_API_KEY";
pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const SUPABASE_URL: &str = "SUPABASE_URL";
pub const SUPABASE_KEY: &str = "SUPABASE_KEY";
const DATA_DIR_VAR: &str = "YT_REVIEW_DATA_DIR";

/// Settings resolved once at start-up and passed to every component.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub youtube_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
}

impl Config {
    /// Resolve the data directory, load its `.env` (falling back to the
    /// current directory), then read credentials from the environment.
    pub fn load() -> Result<Self> {
        let data_dir = resolve_data_dir()?;
        load_env(&data_dir);
        Ok(Self::from_lookup(data_dir, |name| std::env::var(name).ok()))
    }

    /// Build a config from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup<F>(data_dir: PathBuf, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            youtube_api_key: read(YOUTUBE_API_KEY),
            gemini_api_key: read(GEMINI_API_KEY),
            supabase_url: read(SUPABASE_URL),
            supabase_key: read(SUPABASE_KEY),
            data_dir,
        }
    }

    pub fn youtube_api_key(&self) -> Result<&str> {
        self.youtube_api_key
            .as_deref()
            .ok_or(Error::MissingCredential(YOUTUBE_API_KEY))
    }

    pub fn gemini_api_key(&self) -> Result<&str> {
        self.gemini_api_key
            .as_deref()
            .ok_or(Error::MissingCredential(GEMINI_API_KEY))
    }

    /// Supabase project URL and key, both required for the remote store.
    pub fn supabase(&self) -> Result<(&str, &str)> {
        let url = self
            .supabase_url
            .as_deref()
            .ok_or(Error::MissingCredential(SUPABASE_URL))?;
        let key = self
            .supabase_key
            .as_deref()
            .ok_or(Error::MissingCredential(SUPABASE_KEY))?;
        Ok((url, key))
    }

    /// Get the .env file path
    pub fn env_file_path(&self) -> PathBuf {
        self.data_dir.join(".env")
    }

    /// Get the local database path
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("videos.db")
    }

    /// Create the data directory if it doesn't exist
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

/// Get the base data directory (~/.yt-review/)
fn resolve_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(DATA_DIR_VAR) {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".yt-review"))
        .ok_or_else(|| Error::Config("could not determine home directory".to_string()))
}

/// Load environment variables from the data directory's .env file
fn load_env(data_dir: &Path) {
    let env_path = data_dir.join(".env");
    if env_path.exists() {
        let _ = dotenvy::from_path(&env_path);
    } else {
        // Try current directory as fallback
        let _ = dotenvy::dotenv();
    }
}

/// The two historical pipeline flavours, kept as configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PipelineVariant {
    /// Fetch and store transcripts, Portuguese rubric, larger batch
    Full,
    /// Metadata-only review with the English rubric
    Quick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptLanguage {
    English,
    Portuguese,
}

impl PipelineVariant {
    pub fn fetch_transcripts(self) -> bool {
        matches!(self, Self::Full)
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Self::Full => "gemini-1.5-flash",
            Self::Quick => "gemini-2.0-flash-exp",
        }
    }

    pub fn default_max_results(self) -> u32 {
        match self {
            Self::Full => 50,
            Self::Quick => 10,
        }
    }

    pub fn prompt_language(self) -> PromptLanguage {
        match self {
            Self::Full => PromptLanguage::Portuguese,
            Self::Quick => PromptLanguage::English,
        }
    }
}
