//! Content - Lesson material produced by a generative text service
//!
//! Every mini-game asks a [`ContentProvider`] for its material once per load.
//! The provider is best-effort: no retries, and the returned JSON is only
//! trusted after the well-formedness filters in this module have run.

pub mod gemini;
pub mod prompts;

pub use gemini::{GeminiConfig, GeminiProvider};

use crate::profile::Language;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Errors raised while fetching or decoding generated content
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("no API key configured for the content service")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("content service returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("content service returned no text")]
    EmptyResponse,

    #[error("malformed content: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub type ContentResult<T> = Result<T, ContentError>;

/// Multiple-choice question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    /// Written in the learner's native language
    pub explanation: String,
}

impl QuizQuestion {
    pub fn is_correct(&self, option: &str) -> bool {
        self.correct_answer == option
    }

    pub fn is_well_formed(&self) -> bool {
        !self.question.trim().is_empty()
            && self.options.len() >= 2
            && self.options.iter().any(|o| *o == self.correct_answer)
    }
}

/// Vocabulary card for the voxel matching game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyItem {
    pub id: String,
    /// Word in the target language
    #[serde(rename = "name")]
    pub target_word: String,
    /// Word in the native language
    #[serde(rename = "translation")]
    pub native_word: String,
    #[serde(default)]
    pub emoji: String,
}

impl VocabularyItem {
    pub fn is_well_formed(&self) -> bool {
        !self.id.trim().is_empty()
            && !self.target_word.trim().is_empty()
            && !self.native_word.trim().is_empty()
    }
}

/// Short reading passage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "content", default)]
    pub body: String,
}

impl Story {
    pub fn paragraphs(&self) -> Vec<&str> {
        self.body
            .split('\n')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }
}

/// Translation prompt for the racing game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceChallenge {
    pub prompt: String,
    pub correct: String,
    pub wrong: String,
}

impl RaceChallenge {
    pub fn new(prompt: &str, correct: &str, wrong: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            correct: correct.to_string(),
            wrong: wrong.to_string(),
        }
    }

    /// Both answers, alphabetically, so position never gives the answer away
    pub fn options(&self) -> [String; 2] {
        let mut options = [self.correct.clone(), self.wrong.clone()];
        options.sort_by(|a, b| collate(a, b));
        options
    }

    pub fn is_correct(&self, choice: &str) -> bool {
        self.correct == choice
    }

    pub fn is_well_formed(&self) -> bool {
        !self.prompt.trim().is_empty()
            && !self.correct.trim().is_empty()
            && !self.wrong.trim().is_empty()
            && self.correct != self.wrong
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One entry of a tutor conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: &str) -> Self {
        Self {
            role: ChatRole::User,
            text: text.to_string(),
        }
    }

    pub fn model(text: &str) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.to_string(),
        }
    }
}

/// Source of generated lesson content
#[async_trait]
pub trait ContentProvider: Send + Sync {
    async fn quiz(&self, language: Language, topic: &str) -> ContentResult<Vec<QuizQuestion>>;

    async fn vocabulary(&self, language: Language, topic: &str)
        -> ContentResult<Vec<VocabularyItem>>;

    async fn story(&self, language: Language, topic: &str) -> ContentResult<Story>;

    async fn race_challenges(
        &self,
        language: Language,
        topic: &str,
    ) -> ContentResult<Vec<RaceChallenge>>;

    async fn chat_reply(
        &self,
        language: Language,
        topic: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> ContentResult<String>;
}

/// Drop entries that would break a game screen, logging how many went
pub(crate) fn retain_well_formed<T>(
    kind: &str,
    items: Vec<T>,
    is_well_formed: impl Fn(&T) -> bool,
) -> Vec<T> {
    let total = items.len();
    let kept: Vec<T> = items.into_iter().filter(|item| is_well_formed(item)).collect();
    if kept.len() < total {
        log::warn!(
            "Dropped {} malformed {} item(s) out of {}",
            total - kept.len(),
            kind,
            total
        );
    }
    kept
}

/// Dictionary order: accents and case only break ties
fn collate(a: &str, b: &str) -> Ordering {
    fold(a).cmp(&fold(b)).then_with(|| a.cmp(b))
}

fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}
