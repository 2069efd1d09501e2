//! Games - Per-screen session state for the non-racing mini-games
//!
//! Each session is created from freshly generated content and owns its own
//! counters. Nothing is shared between games; reloading a game builds a
//! brand new session.

pub mod chat;
pub mod library;
pub mod quiz;
pub mod vocabulary;

pub use chat::ChatSession;
pub use library::LibrarySession;
pub use quiz::QuizSession;
pub use vocabulary::VocabularySession;

use crate::content::ContentError;
use crate::game_server::RaceError;
use crate::profile::ProfileError;
use serde::Serialize;
use thiserror::Error;

pub const QUIZ_CORRECT_XP: u32 = 10;
pub const VOCABULARY_MATCH_XP: u32 = 20;
pub const LIBRARY_FINISH_XP: u32 = 15;
pub const CHAT_MESSAGE_XP: u32 = 5;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("content for this game has not loaded")]
    NotLoaded,
    #[error("this question was already answered")]
    AlreadyAnswered,
    #[error("answer the current question first")]
    NotAnswered,
    #[error("this session is already complete")]
    Finished,
    #[error("message is empty")]
    EmptyMessage,
    #[error("still waiting for the tutor's reply")]
    AwaitingReply,
    #[error("pick at least one interest first")]
    NoInterests,
    #[error("the race screen was left before the track loaded")]
    Superseded,
    #[error("session lock poisoned")]
    Poisoned,
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Race(#[from] RaceError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

/// Loading lifecycle of a game screen
#[derive(Debug, Clone, Default, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "lowercase")]
pub enum LoadState<T> {
    #[default]
    Idle,
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            LoadState::Ready(session) => Some(session),
            _ => None,
        }
    }

    pub fn ready_mut(&mut self) -> Option<&mut T> {
        match self {
            LoadState::Ready(session) => Some(session),
            _ => None,
        }
    }

    /// Borrow the session or report that it is not available yet
    pub fn session_mut(&mut self) -> Result<&mut T, SessionError> {
        self.ready_mut().ok_or(SessionError::NotLoaded)
    }

    pub fn as_ref(&self) -> LoadState<&T> {
        match self {
            LoadState::Idle => LoadState::Idle,
            LoadState::Loading => LoadState::Loading,
            LoadState::Ready(session) => LoadState::Ready(session),
            LoadState::Failed(msg) => LoadState::Failed(msg.clone()),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> LoadState<U> {
        match self {
            LoadState::Idle => LoadState::Idle,
            LoadState::Loading => LoadState::Loading,
            LoadState::Ready(session) => LoadState::Ready(f(session)),
            LoadState::Failed(msg) => LoadState::Failed(msg),
        }
    }
}
