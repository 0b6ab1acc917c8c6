use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0} not set. Add it to your .env or run `yt-review init`.")]
    MissingCredential(&'static str),

    #[error("YouTube API error: {0}")]
    YouTube(String),

    #[error("Captions unavailable: {0}")]
    CaptionsUnavailable(String),

    #[error("Request failed: {status} - {body}")]
    EvaluationStatus { status: u16, body: String },

    #[error("Could not extract analysis from the evaluation response.")]
    EvaluationShape,

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
