//! LingoVoxel AI - Tauri Backend
//!
//! Game logic, generated-content plumbing and profile persistence for the
//! language-learning mini-games. The webview renders; everything stateful
//! lives here and is reached through Tauri commands.

pub mod app_state;
pub mod config;
pub mod content;
pub mod game_server;
pub mod games;
pub mod profile;

#[cfg(feature = "desktop")]
mod commands;

pub use app_state::AppState;
pub use config::AppConfig;

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use std::sync::Arc;
    use tauri::Manager;

    tauri::Builder::default()
        .setup(|app| {
            if cfg!(debug_assertions) {
                app.handle().plugin(
                    tauri_plugin_log::Builder::default()
                        .level(log::LevelFilter::Info)
                        .build(),
                )?;
            }

            let config = AppConfig::from_env();
            let profile_path = config.resolve_profile_path(&app.path().app_data_dir()?);
            let profile = profile::ProfileStore::open(profile_path);
            if let Some(path) = profile.path() {
                log::info!("Profile stored at {}", path.display());
            }
            let provider = content::GeminiProvider::new(config.gemini.clone())?;
            if provider.config().api_key.is_empty() {
                log::warn!("GEMINI_API_KEY is not set; content generation will fail");
            }

            app.manage(AppState::new(profile, Arc::new(provider), config.race));
            log::info!("LingoVoxel backend initialized");
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::get_profile,
            commands::interest_options,
            commands::set_language,
            commands::toggle_interest,
            commands::set_specific_interests,
            commands::start_journey,
            commands::load_quiz,
            commands::answer_quiz,
            commands::next_question,
            commands::restart_quiz,
            commands::quiz_view,
            commands::load_vocabulary,
            commands::pick_vocabulary,
            commands::restart_vocabulary,
            commands::vocabulary_view,
            commands::load_story,
            commands::finish_story,
            commands::story_view,
            commands::open_chat,
            commands::send_chat,
            commands::chat_view,
            commands::start_race,
            commands::answer_race,
            commands::race_snapshot,
            commands::restart_race,
            commands::leave_race,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
