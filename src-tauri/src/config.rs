//! Application configuration, read from the environment at startup

use crate::content::GeminiConfig;
use crate::game_server::RaceConfig;
use std::path::{Path, PathBuf};

pub const PROFILE_FILE_NAME: &str = "profile.json";

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
    /// Explicit profile location; otherwise the platform data directory is used
    pub profile_path: Option<PathBuf>,
    pub race: RaceConfig,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        Self {
            gemini: GeminiConfig::from_env(),
            profile_path: std::env::var_os("LINGOVOXEL_PROFILE_PATH").map(PathBuf::from),
            race: RaceConfig::default(),
        }
    }

    /// Profile file to use, given the platform data directory
    pub fn resolve_profile_path(&self, data_dir: &Path) -> PathBuf {
        self.profile_path
            .clone()
            .unwrap_or_else(|| data_dir.join(PROFILE_FILE_NAME))
    }
}
