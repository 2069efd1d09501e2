//! Profile - The learner's persisted record
//!
//! A single JSON document holds the target language, interests, level, XP
//! and streak. It is read once at startup and rewritten after every change.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("profile could not be encoded: {0}")]
    Json(#[from] serde_json::Error),

    #[error("profile lock poisoned")]
    Poisoned,
}

/// Language being learned. Only English and Spanish are offered, and each
/// is the other's native language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Spanish,
}

impl Language {
    pub fn native(self) -> Language {
        match self {
            Language::English => Language::Spanish,
            Language::Spanish => Language::English,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Spanish => "Spanish",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

/// Selectable interest shown on the onboarding screen
#[derive(Debug, Clone, Copy, Serialize)]
pub struct InterestOption {
    pub id: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}

pub const INTEREST_OPTIONS: &[InterestOption] = &[
    InterestOption { id: "tech", label: "Technology", icon: "fa-laptop-code", color: "bg-blue-500" },
    InterestOption { id: "cooking", label: "Cooking", icon: "fa-utensils", color: "bg-orange-500" },
    InterestOption { id: "travel", label: "Travel", icon: "fa-plane", color: "bg-green-500" },
    InterestOption { id: "sports", label: "Sports", icon: "fa-football", color: "bg-red-500" },
    InterestOption { id: "music", label: "Music", icon: "fa-music", color: "bg-purple-500" },
    InterestOption { id: "art", label: "Art", icon: "fa-palette", color: "bg-pink-500" },
    InterestOption { id: "science", label: "Science", icon: "fa-microscope", color: "bg-indigo-500" },
    InterestOption { id: "history", label: "History", icon: "fa-landmark", color: "bg-amber-600" },
];

/// Label for an interest id; unknown ids are used verbatim
pub fn interest_label(id: &str) -> &str {
    INTEREST_OPTIONS
        .iter()
        .find(|opt| opt.id == id)
        .map(|opt| opt.label)
        .unwrap_or(id)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserProfile {
    pub target_language: Language,
    pub interests: Vec<String>,
    pub level: Level,
    pub xp: u32,
    pub streak: u32,
    /// Free-text theme for the racing game
    pub specific_interests_text: String,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            target_language: Language::English,
            interests: Vec::new(),
            level: Level::Beginner,
            xp: 0,
            streak: 0,
            specific_interests_text: String::new(),
        }
    }
}

impl UserProfile {
    /// Add the interest if absent, remove it if present
    pub fn toggle_interest(&mut self, id: &str) {
        if let Some(pos) = self.interests.iter().position(|i| i == id) {
            self.interests.remove(pos);
        } else {
            self.interests.push(id.to_string());
        }
    }

    pub fn can_start_journey(&self) -> bool {
        !self.interests.is_empty()
    }

    /// Theme string for content prompts
    pub fn topic(&self) -> String {
        self.interests
            .iter()
            .map(|id| interest_label(id))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Racing uses the free-text theme when one was given
    pub fn race_topic(&self) -> String {
        let specific = self.specific_interests_text.trim();
        if specific.is_empty() {
            self.topic()
        } else {
            specific.to_string()
        }
    }
}

/// Profile persisted as a JSON file, saved on every change
#[derive(Debug)]
pub struct ProfileStore {
    path: Option<PathBuf>,
    profile: Mutex<UserProfile>,
}

impl ProfileStore {
    /// Read the profile at `path`, falling back to defaults when the file is
    /// missing or unreadable
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let profile = match Self::read(&path) {
            Ok(Some(profile)) => {
                log::info!("Loaded profile from {}", path.display());
                profile
            }
            Ok(None) => UserProfile::default(),
            Err(e) => {
                log::warn!("Ignoring unreadable profile {}: {}", path.display(), e);
                UserProfile::default()
            }
        };

        Self {
            path: Some(path),
            profile: Mutex::new(profile),
        }
    }

    /// Store that never touches disk
    pub fn in_memory(profile: UserProfile) -> Self {
        Self {
            path: None,
            profile: Mutex::new(profile),
        }
    }

    fn read(path: &Path) -> Result<Option<UserProfile>, ProfileError> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn write(&self, profile: &UserProfile) -> Result<(), ProfileError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Write beside the target then rename, so a crash never leaves a truncated profile
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, serde_json::to_string_pretty(profile)?)?;
        fs::rename(&staging, path)?;
        log::debug!("Saved profile to {}", path.display());
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self) -> Result<UserProfile, ProfileError> {
        let profile = self.profile.lock().map_err(|_| ProfileError::Poisoned)?;
        Ok(profile.clone())
    }

    /// Apply a change and persist the result. The in-memory profile only
    /// changes once the save succeeds.
    pub fn update<F>(&self, change: F) -> Result<UserProfile, ProfileError>
    where
        F: FnOnce(&mut UserProfile),
    {
        let mut profile = self.profile.lock().map_err(|_| ProfileError::Poisoned)?;
        let mut next = profile.clone();
        change(&mut next);
        self.write(&next)?;
        *profile = next.clone();
        Ok(next)
    }

    pub fn set_language(&self, language: Language) -> Result<UserProfile, ProfileError> {
        self.update(|p| p.target_language = language)
    }

    pub fn toggle_interest(&self, id: &str) -> Result<UserProfile, ProfileError> {
        self.update(|p| p.toggle_interest(id))
    }

    pub fn set_specific_interests(&self, text: &str) -> Result<UserProfile, ProfileError> {
        self.update(|p| p.specific_interests_text = text.trim().to_string())
    }

    pub fn add_xp(&self, amount: u32) -> Result<UserProfile, ProfileError> {
        let profile = self.update(|p| p.xp = p.xp.saturating_add(amount))?;
        log::info!("+{} XP (total {})", amount, profile.xp);
        Ok(profile)
    }
}
