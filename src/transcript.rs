use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use whatlang::Lang;
use yt_transcript_rs::api::YouTubeTranscriptApi;

use crate::error::{Error, Result};

/// Caption languages requested, in order of preference
pub const DEFAULT_LANGUAGES: &[&str] = &["en", "pt", "pt-BR"];

/// Languages a transcript may be detected as and still be kept
const ALLOWED_LANGUAGES: &[Lang] = &[Lang::Eng, Lang::Por];

/// Row stored in the `transcriptions` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptRecord {
    pub video_id: String,
    pub transcript_text: Option<String>,
}

/// How a transcript lookup ended. Every case except `Accepted` and `Blank`
/// stores a null transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptResolution {
    Accepted { text: String, language: Lang },
    /// Captions existed but held only whitespace; kept as fetched
    Blank(String),
    RejectedLanguage(Lang),
    Undetected,
    Unavailable(String),
}

impl TranscriptResolution {
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Accepted { text, .. } | Self::Blank(text) => Some(text),
            Self::RejectedLanguage(_) | Self::Undetected | Self::Unavailable(_) => None,
        }
    }

    pub fn into_record(self, video_id: &str) -> TranscriptRecord {
        TranscriptRecord {
            video_id: video_id.to_string(),
            transcript_text: self.into_text(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageVerdict {
    Allowed(Lang),
    Rejected(Lang),
    Undetected,
}

/// Detect the language of `text` and check it against the allow-list.
/// Unreliable detections count as undetected.
pub fn classify_language(text: &str) -> LanguageVerdict {
    match whatlang::detect(text) {
        Some(info) if info.is_reliable() => {
            if ALLOWED_LANGUAGES.contains(&info.lang()) {
                LanguageVerdict::Allowed(info.lang())
            } else {
                LanguageVerdict::Rejected(info.lang())
            }
        }
        _ => LanguageVerdict::Undetected,
    }
}

/// Source of caption fragments for a video
#[async_trait]
pub trait CaptionSource: Send + Sync {
    async fn fetch_captions(&self, video_id: &str, languages: &[&str]) -> Result<Vec<String>>;
}

/// Captions from YouTube's timed-text endpoints
#[derive(Clone)]
pub struct YouTubeCaptions {
    api: YouTubeTranscriptApi,
}

impl YouTubeCaptions {
    pub fn new() -> Result<Self> {
        let api = YouTubeTranscriptApi::new(None, None, None)
            .map_err(|e| Error::Config(format!("transcript client: {e}")))?;
        Ok(Self { api })
    }
}

#[async_trait]
impl CaptionSource for YouTubeCaptions {
    async fn fetch_captions(&self, video_id: &str, languages: &[&str]) -> Result<Vec<String>> {
        let transcript = self
            .api
            .fetch_transcript(video_id, languages, false)
            .await
            .map_err(|e| Error::CaptionsUnavailable(e.to_string()))?;

        Ok(transcript
            .snippets
            .into_iter()
            .map(|snippet| snippet.text)
            .collect())
    }
}

/// Fetch captions for `video_id` and keep them only when they read as
/// English or Portuguese. Never fails: every problem resolves to a null
/// transcript.
pub async fn resolve(
    source: &dyn CaptionSource,
    video_id: &str,
    languages: &[&str],
) -> TranscriptResolution {
    let fragments = match source.fetch_captions(video_id, languages).await {
        Ok(fragments) => fragments,
        Err(e) => {
            warn!(video_id, error = %e, "transcript unavailable");
            return TranscriptResolution::Unavailable(e.to_string());
        }
    };

    let text = fragments.join(" ");
    if text.trim().is_empty() {
        debug!(video_id, "transcript is blank");
        return TranscriptResolution::Blank(text);
    }

    match classify_language(&text) {
        LanguageVerdict::Allowed(language) => TranscriptResolution::Accepted { text, language },
        LanguageVerdict::Rejected(language) => {
            info!(video_id, language = language.code(), "transcript language not allowed, storing null");
            TranscriptResolution::RejectedLanguage(language)
        }
        LanguageVerdict::Undetected => {
            info!(video_id, "could not detect transcript language, storing null");
            TranscriptResolution::Undetected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENGLISH: &str = "Today we are going to walk through linked lists and binary trees. \
        First we will look at how each node keeps a reference to the next one, and then we \
        will write a small program that inserts and removes values while keeping the whole \
        structure balanced and easy to understand.";

    const PORTUGUESE: &str = "Hoje nós vamos estudar listas ligadas e árvores binárias. \
        Primeiro você vai ver como cada nó guarda uma referência para o próximo, e depois \
        nós vamos escrever um programa que insere e remove valores. Não é difícil, são só \
        algumas funções e também muitas explicações sobre a implementação.";

    const GERMAN: &str = "Heute lernen wir, wie verkettete Listen und binäre Bäume \
        funktionieren. Zuerst schauen wir uns an, wie jeder Knoten einen Verweis auf den \
        nächsten speichert, und danach schreiben wir gemeinsam ein kleines Programm, das \
        Werte einfügt und wieder entfernt.";

    struct FixedCaptions(std::result::Result<Vec<String>, String>);

    #[async_trait]
    impl CaptionSource for FixedCaptions {
        async fn fetch_captions(&self, _video_id: &str, _languages: &[&str]) -> Result<Vec<String>> {
            match &self.0 {
                Ok(fragments) => Ok(fragments.clone()),
                Err(reason) => Err(Error::CaptionsUnavailable(reason.clone())),
            }
        }
    }

    fn fragments(text: &str) -> FixedCaptions {
        FixedCaptions(Ok(text.split(' ').map(String::from).collect()))
    }

    #[test]
    fn english_and_portuguese_are_allowed() {
        assert_eq!(classify_language(ENGLISH), LanguageVerdict::Allowed(Lang::Eng));
        assert_eq!(classify_language(PORTUGUESE), LanguageVerdict::Allowed(Lang::Por));
    }

    #[test]
    fn other_languages_are_rejected() {
        assert_eq!(classify_language(GERMAN), LanguageVerdict::Rejected(Lang::Deu));
    }

    #[test]
    fn text_without_letters_is_undetected() {
        assert_eq!(classify_language("12 34 56 !!! ..."), LanguageVerdict::Undetected);
    }

    #[tokio::test]
    async fn allowed_transcript_passes_through_unchanged() {
        let resolution = resolve(&fragments(ENGLISH), "vid1", DEFAULT_LANGUAGES).await;

        assert_eq!(resolution.into_text().as_deref(), Some(ENGLISH));
    }

    #[tokio::test]
    async fn disallowed_language_becomes_null() {
        let resolution = resolve(&fragments(GERMAN), "vid1", DEFAULT_LANGUAGES).await;

        assert!(matches!(resolution, TranscriptResolution::RejectedLanguage(Lang::Deu)));
        assert_eq!(resolution.into_record("vid1").transcript_text, None);
    }

    #[tokio::test]
    async fn failed_detection_becomes_null() {
        let resolution = resolve(&fragments("42 17 99 ?!"), "vid1", DEFAULT_LANGUAGES).await;

        assert_eq!(resolution, TranscriptResolution::Undetected);
        assert_eq!(resolution.into_text(), None);
    }

    #[tokio::test]
    async fn missing_captions_become_null() {
        let source = FixedCaptions(Err("transcripts disabled".to_string()));

        let record = resolve(&source, "vid1", DEFAULT_LANGUAGES).await.into_record("vid1");

        assert_eq!(
            record,
            TranscriptRecord {
                video_id: "vid1".to_string(),
                transcript_text: None,
            }
        );
    }

    #[tokio::test]
    async fn blank_captions_are_kept_as_fetched() {
        let source = FixedCaptions(Ok(vec![" ".to_string(), String::new()]));

        let resolution = resolve(&source, "vid1", DEFAULT_LANGUAGES).await;

        assert_eq!(resolution, TranscriptResolution::Blank("  ".to_string()));
    }
}
