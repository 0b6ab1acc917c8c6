use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::PromptLanguage;
use crate::error::{Error, Result};
use crate::youtube::VideoRecord;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const TOPICS: [&str; 6] = [
    "Arrays",
    "Linked Lists",
    "Stacks",
    "Trees",
    "Graphs",
    "Asymptotic Analysis",
];

const ENGLISH_RUBRIC: &str = "Evaluate the video's quality and teaching methodology, focusing on the \
didactics used for presenting and explaining algorithms and data structures. Was the content clear \
and engaging, or did it lead to confusion? Provide a detailed evaluation based on the implementation \
and learning of the following key topics:";

const ENGLISH_CLOSING: &str = "For each topic, assess whether it was included in the video, how it \
was implemented, and how effectively it was taught. Highlight any strengths or areas for improvement \
in making these concepts understandable and applicable for learners.";

const PORTUGUESE_RUBRIC: &str = "Avalie a qualidade do vídeo e a metodologia de ensino, focando na \
didática utilizada para apresentar e explicar algoritmos e estruturas de dados. O conteúdo foi claro \
e envolvente ou causou confusão? Dê uma avaliação detalhada, considerando a implementação e \
aprendizado dos tópicos a seguir:";

const PORTUGUESE_CLOSING: &str = "Para cada tópico, verifique se foi abordado no vídeo, como foi \
implementado e o quão efetiva foi a explicação. Aponte pontos fortes e pontos que podem ser \
melhorados.";

/// Build the fixed review prompt around a video's metadata
pub fn build_prompt(title: &str, description: &str, channel: &str, language: PromptLanguage) -> String {
    let (rubric, closing) = match language {
        PromptLanguage::English => (ENGLISH_RUBRIC, ENGLISH_CLOSING),
        PromptLanguage::Portuguese => (PORTUGUESE_RUBRIC, PORTUGUESE_CLOSING),
    };

    let mut prompt = format!("Title: {title}\nDescription: {description}\nChannel: {channel}\n{rubric}\n");
    for (i, topic) in TOPICS.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, topic));
    }
    prompt.push_str(closing);
    prompt
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

/// Pull `candidates[0].content.parts[0].text` out of a generateContent response
pub fn extract_first_text(response: &Value) -> Option<&str> {
    response
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
}

/// A text-completion endpoint
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Gemini `generateContent` client
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(120)).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: GEMINI_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, self.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Http(e.without_url()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::EvaluationStatus { status, body });
        }

        let body: Value = response.json().await.map_err(|_| Error::EvaluationShape)?;
        extract_first_text(&body)
            .map(String::from)
            .ok_or(Error::EvaluationShape)
    }
}

/// Ask the generator for a review of one video
pub async fn evaluate(
    generator: &dyn TextGenerator,
    title: &str,
    description: &str,
    channel: &str,
    language: PromptLanguage,
) -> Result<String> {
    let prompt = build_prompt(title, description, channel, language);
    generator.generate(&prompt).await
}

/// Turn an evaluation failure into the text stored in place of a review
pub fn analysis_or_placeholder(result: Result<String>) -> String {
    match result {
        Ok(text) => text,
        Err(e @ (Error::EvaluationStatus { .. } | Error::EvaluationShape)) => e.to_string(),
        Err(e) => format!("Evaluation request failed: {e}"),
    }
}

/// Annotate every video in place. A failed evaluation stores a placeholder
/// and moves on to the next video.
pub async fn evaluate_videos(
    generator: &dyn TextGenerator,
    videos: &mut [VideoRecord],
    language: PromptLanguage,
) {
    for video in videos.iter_mut() {
        info!(link = %video.link, title = %video.title, "evaluating video");
        let result = evaluate(
            generator,
            &video.title,
            &video.description,
            &video.channel,
            language,
        )
        .await;
        if let Err(e) = &result {
            warn!(link = %video.link, error = %e, "evaluation failed, storing placeholder");
        }
        video.qualitative_analysis = Some(analysis_or_placeholder(result));
    }
}
