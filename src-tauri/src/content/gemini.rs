//! Google Gemini content provider
//!
//! Sends `generateContent` requests with a JSON response schema and decodes
//! the first candidate's text into lesson content.

use super::prompts::{self, ContentRequest};
use super::{
    retain_well_formed, ChatRole, ChatTurn, ContentError, ContentProvider, ContentResult,
    QuizQuestion, RaceChallenge, Story, VocabularyItem,
};
use crate::profile::Language;
use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Connection settings for the Gemini API
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    /// Models endpoint, without a trailing slash
    pub base_url: String,
    pub timeout_seconds: u64,
    pub temperature: Option<f32>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 30,
            temperature: None,
        }
    }
}

impl GeminiConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("GEMINI_API_KEY")
                .or_else(|_| std::env::var("API_KEY"))
                .unwrap_or_default(),
            model: std::env::var("LINGOVOXEL_MODEL").unwrap_or(defaults.model),
            base_url: std::env::var("LINGOVOXEL_API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            timeout_seconds: std::env::var("LINGOVOXEL_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.timeout_seconds),
            temperature: defaults.temperature,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

impl GeminiContent {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![GeminiPart {
                text: text.to_string(),
            }],
        }
    }
}

/// Gemini-backed [`ContentProvider`]
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> ContentResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn json_generation_config(&self, schema: Value) -> GenerationConfig {
        GenerationConfig {
            temperature: self.config.temperature,
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(schema),
        }
    }

    async fn generate(&self, body: &GenerateRequest) -> ContentResult<String> {
        if self.config.api_key.is_empty() {
            return Err(ContentError::MissingApiKey);
        }

        // The key travels in a header so it never shows up in URLs or error text
        let url = format!("{}/{}:generateContent", self.config.base_url, self.config.model);
        debug!("Sending request to Gemini API: {}", url);

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, self.config.api_key.as_str())
            .json(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            error!("Gemini API error: {} - {}", status, text);
            return Err(ContentError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        extract_text(&text)
    }

    async fn request_json<T: DeserializeOwned>(&self, request: ContentRequest) -> ContentResult<T> {
        let body = GenerateRequest {
            contents: vec![GeminiContent::text(Some("user"), &request.prompt)],
            system_instruction: None,
            generation_config: Some(self.json_generation_config(request.schema)),
        };
        let text = self.generate(&body).await?;
        parse_json_payload(&text)
    }
}

/// Concatenated text of the first candidate in a raw `generateContent` response
pub fn extract_text(raw: &str) -> ContentResult<String> {
    let response: GenerateResponse = serde_json::from_str(raw)?;
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ContentError::EmptyResponse);
    }
    Ok(text)
}

/// Decode a JSON payload, tolerating a surrounding markdown code fence
pub fn parse_json_payload<T: DeserializeOwned>(text: &str) -> ContentResult<T> {
    Ok(serde_json::from_str(strip_code_fence(text))?)
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip an optional language tag such as ```json
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end().trim_end_matches("```").trim()
}

/// Conversation history as Gemini `contents`; the API wants a user turn first
fn chat_contents(history: &[ChatTurn], message: &str) -> Vec<GeminiContent> {
    history
        .iter()
        .skip_while(|turn| turn.role == ChatRole::Model)
        .map(|turn| {
            let role = match turn.role {
                ChatRole::User => "user",
                ChatRole::Model => "model",
            };
            GeminiContent::text(Some(role), &turn.text)
        })
        .chain(std::iter::once(GeminiContent::text(Some("user"), message)))
        .collect()
}

#[async_trait]
impl ContentProvider for GeminiProvider {
    async fn quiz(&self, language: Language, topic: &str) -> ContentResult<Vec<QuizQuestion>> {
        let questions: Vec<QuizQuestion> =
            self.request_json(prompts::quiz_request(language, topic)).await?;
        info!("Generated {} quiz questions about {}", questions.len(), topic);
        Ok(retain_well_formed("quiz", questions, QuizQuestion::is_well_formed))
    }

    async fn vocabulary(
        &self,
        language: Language,
        topic: &str,
    ) -> ContentResult<Vec<VocabularyItem>> {
        let items: Vec<VocabularyItem> = self
            .request_json(prompts::vocabulary_request(language, topic))
            .await?;
        info!("Generated {} vocabulary items about {}", items.len(), topic);
        Ok(retain_well_formed("vocabulary", items, VocabularyItem::is_well_formed))
    }

    async fn story(&self, language: Language, topic: &str) -> ContentResult<Story> {
        let story: Story = self.request_json(prompts::story_request(language, topic)).await?;
        info!("Generated story \"{}\"", story.title);
        Ok(story)
    }

    async fn race_challenges(
        &self,
        language: Language,
        topic: &str,
    ) -> ContentResult<Vec<RaceChallenge>> {
        let challenges: Vec<RaceChallenge> =
            self.request_json(prompts::race_request(language, topic)).await?;
        info!("Generated {} race challenges about {}", challenges.len(), topic);
        Ok(retain_well_formed(
            "race challenge",
            challenges,
            RaceChallenge::is_well_formed,
        ))
    }

    async fn chat_reply(
        &self,
        language: Language,
        topic: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> ContentResult<String> {
        let body = GenerateRequest {
            contents: chat_contents(history, message),
            system_instruction: Some(GeminiContent::text(
                None,
                &prompts::chat_system_instruction(language, topic),
            )),
            generation_config: self.config.temperature.map(|t| GenerationConfig {
                temperature: Some(t),
                response_mime_type: None,
                response_schema: None,
            }),
        };

        match self.generate(&body).await {
            Ok(reply) => Ok(reply),
            // An empty reply is still a reply; the session supplies filler text
            Err(ContentError::EmptyResponse) => Ok(String::new()),
            Err(e) => Err(e),
        }
    }
}
