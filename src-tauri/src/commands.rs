//! Tauri commands exposed to the webview

use crate::app_state::{AppState, XpAward};
use crate::game_server::{AnswerOutcome, RaceObserver, RaceSnapshot};
use crate::games::chat::ChatView;
use crate::games::library::StoryView;
use crate::games::quiz::{QuizAnswer, QuizView};
use crate::games::vocabulary::{VocabularyPick, VocabularyView};
use crate::games::LoadState;
use crate::profile::{InterestOption, Language, UserProfile, INTEREST_OPTIONS};
use serde::Serialize;
use std::sync::Arc;
use tauri::{AppHandle, Emitter, State};

pub const RACE_SNAPSHOT_EVENT: &str = "race://snapshot";
pub const XP_EVENT: &str = "profile://xp";

/// Pushes race updates and rewards to the webview
struct WebviewRaceObserver {
    app: AppHandle,
}

impl RaceObserver for WebviewRaceObserver {
    fn on_snapshot(&self, snapshot: &RaceSnapshot) {
        if let Err(e) = self.app.emit(RACE_SNAPSHOT_EVENT, snapshot) {
            log::warn!("Failed to emit race snapshot: {}", e);
        }
    }

    fn on_finish(&self, reward: u32, _snapshot: &RaceSnapshot) {
        if let Err(e) = self.app.emit(XP_EVENT, reward) {
            log::warn!("Failed to emit race reward: {}", e);
        }
    }
}

fn announce_xp(app: &AppHandle, award: &XpAward) {
    if award.amount == 0 {
        return;
    }
    if let Err(e) = app.emit(XP_EVENT, award.amount) {
        log::warn!("Failed to emit XP event: {}", e);
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Awarded<T> {
    pub result: T,
    pub profile: UserProfile,
}

fn awarded<T>(app: &AppHandle, result: T, award: XpAward) -> Awarded<T> {
    announce_xp(app, &award);
    Awarded {
        result,
        profile: award.profile,
    }
}

// PROFILE -----------------------------------------------------------------------------------------

#[tauri::command]
pub fn get_profile(state: State<'_, AppState>) -> Result<UserProfile, String> {
    state.profile().map_err(|e| e.to_string())
}

#[tauri::command]
pub fn interest_options() -> Vec<InterestOption> {
    INTEREST_OPTIONS.to_vec()
}

#[tauri::command]
pub fn set_language(state: State<'_, AppState>, language: Language) -> Result<UserProfile, String> {
    state.set_language(language).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn toggle_interest(state: State<'_, AppState>, id: String) -> Result<UserProfile, String> {
    state.toggle_interest(&id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn set_specific_interests(
    state: State<'_, AppState>,
    text: String,
) -> Result<UserProfile, String> {
    state.set_specific_interests(&text).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn start_journey(state: State<'_, AppState>) -> Result<UserProfile, String> {
    state.start_journey().map_err(|e| e.to_string())
}

// QUIZ --------------------------------------------------------------------------------------------

#[tauri::command]
pub async fn load_quiz(state: State<'_, AppState>) -> Result<QuizView, String> {
    state.load_quiz().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub fn answer_quiz(
    app: AppHandle,
    state: State<'_, AppState>,
    option: String,
) -> Result<Awarded<QuizAnswer>, String> {
    let (answer, award) = state.answer_quiz(&option).map_err(|e| e.to_string())?;
    Ok(awarded(&app, answer, award))
}

#[tauri::command]
pub fn next_question(state: State<'_, AppState>) -> Result<QuizView, String> {
    state.next_question().map_err(|e| e.to_string())
}

#[tauri::command]
pub fn restart_quiz(state: State<'_, AppState>) -> Result<QuizView, String> {
    state.restart_quiz().map_err(|e| e.to_string())
}

#[tauri::command]
pub fn quiz_view(state: State<'_, AppState>) -> Result<LoadState<QuizView>, String> {
    state.quiz_view().map_err(|e| e.to_string())
}

// VOCABULARY --------------------------------------------------------------------------------------

#[tauri::command]
pub async fn load_vocabulary(state: State<'_, AppState>) -> Result<VocabularyView, String> {
    state.load_vocabulary().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub fn pick_vocabulary(
    app: AppHandle,
    state: State<'_, AppState>,
    item_id: String,
) -> Result<Awarded<VocabularyPick>, String> {
    let (pick, award) = state.pick_vocabulary(&item_id).map_err(|e| e.to_string())?;
    Ok(awarded(&app, pick, award))
}

#[tauri::command]
pub fn restart_vocabulary(state: State<'_, AppState>) -> Result<VocabularyView, String> {
    state.restart_vocabulary().map_err(|e| e.to_string())
}

#[tauri::command]
pub fn vocabulary_view(state: State<'_, AppState>) -> Result<LoadState<VocabularyView>, String> {
    state.vocabulary_view().map_err(|e| e.to_string())
}

// LIBRARY -----------------------------------------------------------------------------------------

#[tauri::command]
pub async fn load_story(state: State<'_, AppState>) -> Result<StoryView, String> {
    state.load_story().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub fn finish_story(app: AppHandle, state: State<'_, AppState>) -> Result<UserProfile, String> {
    let award = state.finish_story().map_err(|e| e.to_string())?;
    announce_xp(&app, &award);
    Ok(award.profile)
}

#[tauri::command]
pub fn story_view(state: State<'_, AppState>) -> Result<LoadState<StoryView>, String> {
    state.story_view().map_err(|e| e.to_string())
}

// CHAT --------------------------------------------------------------------------------------------

#[tauri::command]
pub fn open_chat(state: State<'_, AppState>) -> Result<ChatView, String> {
    state.open_chat().map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn send_chat(
    app: AppHandle,
    state: State<'_, AppState>,
    text: String,
) -> Result<Awarded<ChatView>, String> {
    let (view, award) = state.send_chat(&text).await.map_err(|e| e.to_string())?;
    Ok(awarded(&app, view, award))
}

#[tauri::command]
pub fn chat_view(state: State<'_, AppState>) -> Result<Option<ChatView>, String> {
    state.chat_view().map_err(|e| e.to_string())
}

// RACE --------------------------------------------------------------------------------------------

#[tauri::command]
pub async fn start_race(app: AppHandle, state: State<'_, AppState>) -> Result<RaceSnapshot, String> {
    let observer = Arc::new(WebviewRaceObserver { app: app.clone() });
    state.start_race(observer).await.map_err(|e| e.to_string())
}

#[tauri::command]
pub fn answer_race(state: State<'_, AppState>, choice: String) -> Result<AnswerOutcome, String> {
    state.answer_race(&choice).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn race_snapshot(state: State<'_, AppState>) -> Result<LoadState<RaceSnapshot>, String> {
    state.race_snapshot().map_err(|e| e.to_string())
}

/// Async so the new ticking task is spawned on the runtime
#[tauri::command]
pub async fn restart_race(state: State<'_, AppState>) -> Result<RaceSnapshot, String> {
    state.restart_race().map_err(|e| e.to_string())
}

#[tauri::command]
pub fn leave_race(state: State<'_, AppState>) -> Result<(), String> {
    state.leave_race().map_err(|e| e.to_string())
}
