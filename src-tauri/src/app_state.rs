//! Application state shared by every screen
//!
//! Holds the persisted profile, the content provider and one session slot
//! per mini-game. Content is fetched without holding any lock; sessions are
//! only touched under their own mutex.

use crate::content::ContentProvider;
use crate::game_server::{
    AnswerOutcome, Race, RaceConfig, RaceObserver, RaceServer, RaceSnapshot,
};
use crate::games::chat::ChatView;
use crate::games::library::StoryView;
use crate::games::quiz::{QuizAnswer, QuizView};
use crate::games::vocabulary::{VocabularyPick, VocabularyView};
use crate::games::{
    ChatSession, LibrarySession, LoadState, QuizSession, SessionError, VocabularySession,
};
use crate::profile::{Language, ProfileStore, UserProfile};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(slot: &Mutex<T>) -> Result<MutexGuard<'_, T>, SessionError> {
    slot.lock().map_err(|_| SessionError::Poisoned)
}

/// Adds the race reward to the profile before passing events on
struct RewardingObserver {
    profile: Arc<ProfileStore>,
    inner: Arc<dyn RaceObserver>,
}

impl RaceObserver for RewardingObserver {
    fn on_snapshot(&self, snapshot: &RaceSnapshot) {
        self.inner.on_snapshot(snapshot);
    }

    fn on_finish(&self, reward: u32, snapshot: &RaceSnapshot) {
        if let Err(e) = self.profile.add_xp(reward) {
            log::error!("Failed to record race reward: {}", e);
        }
        self.inner.on_finish(reward, snapshot);
    }
}

/// XP change plus the profile it produced
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct XpAward {
    pub amount: u32,
    pub profile: UserProfile,
}

pub struct AppState {
    profile: Arc<ProfileStore>,
    provider: Arc<dyn ContentProvider>,
    race_config: RaceConfig,
    quiz: Mutex<LoadState<QuizSession>>,
    vocabulary: Mutex<LoadState<VocabularySession>>,
    library: Mutex<LoadState<LibrarySession>>,
    chat: Mutex<Option<ChatSession>>,
    race: Mutex<LoadState<RaceServer>>,
    /// Bumped by every race start or leave; a load only installs its race if unchanged
    race_generation: AtomicU64,
}

impl AppState {
    pub fn new(
        profile: ProfileStore,
        provider: Arc<dyn ContentProvider>,
        race_config: RaceConfig,
    ) -> Self {
        Self {
            profile: Arc::new(profile),
            provider,
            race_config,
            quiz: Mutex::new(LoadState::Idle),
            vocabulary: Mutex::new(LoadState::Idle),
            library: Mutex::new(LoadState::Idle),
            chat: Mutex::new(None),
            race: Mutex::new(LoadState::Idle),
            race_generation: AtomicU64::new(0),
        }
    }

    // PROFILE -------------------------------------------------------------------------------------

    pub fn profile(&self) -> Result<UserProfile, SessionError> {
        Ok(self.profile.get()?)
    }

    pub fn set_language(&self, language: Language) -> Result<UserProfile, SessionError> {
        Ok(self.profile.set_language(language)?)
    }

    pub fn toggle_interest(&self, id: &str) -> Result<UserProfile, SessionError> {
        Ok(self.profile.toggle_interest(id)?)
    }

    pub fn set_specific_interests(&self, text: &str) -> Result<UserProfile, SessionError> {
        Ok(self.profile.set_specific_interests(text)?)
    }

    /// Leave onboarding; needs at least one interest
    pub fn start_journey(&self) -> Result<UserProfile, SessionError> {
        let profile = self.profile()?;
        if !profile.can_start_journey() {
            return Err(SessionError::NoInterests);
        }
        Ok(profile)
    }

    /// Credit XP; zero awards leave the profile untouched
    pub fn award_xp(&self, amount: u32) -> Result<XpAward, SessionError> {
        let profile = if amount > 0 {
            self.profile.add_xp(amount)?
        } else {
            self.profile.get()?
        };
        Ok(XpAward { amount, profile })
    }

    // QUIZ ----------------------------------------------------------------------------------------

    pub async fn load_quiz(&self) -> Result<QuizView, SessionError> {
        let profile = self.profile()?;
        *lock(&self.quiz)? = LoadState::Loading;

        let result = self.provider.quiz(profile.target_language, &profile.topic()).await;
        let mut slot = lock(&self.quiz)?;
        match result {
            Ok(questions) => {
                log::info!("Quiz ready with {} questions", questions.len());
                let session = QuizSession::new(questions);
                let view = session.view();
                *slot = LoadState::Ready(session);
                Ok(view)
            }
            Err(e) => {
                log::error!("Failed to load quiz: {}", e);
                *slot = LoadState::Failed(e.to_string());
                Err(e.into())
            }
        }
    }

    /// The answer only sticks once its XP is saved
    pub fn answer_quiz(&self, option: &str) -> Result<(QuizAnswer, XpAward), SessionError> {
        let mut slot = lock(&self.quiz)?;
        let session = slot.session_mut()?;
        let mut next = session.clone();
        let answer = next.select(option)?;
        let award = self.award_xp(answer.xp_awarded)?;
        *session = next;
        Ok((answer, award))
    }

    pub fn next_question(&self) -> Result<QuizView, SessionError> {
        let mut slot = lock(&self.quiz)?;
        let session = slot.session_mut()?;
        session.next_question()?;
        Ok(session.view())
    }

    pub fn restart_quiz(&self) -> Result<QuizView, SessionError> {
        let mut slot = lock(&self.quiz)?;
        let session = slot.session_mut()?;
        session.restart();
        Ok(session.view())
    }

    pub fn quiz_view(&self) -> Result<LoadState<QuizView>, SessionError> {
        Ok(lock(&self.quiz)?.as_ref().map(QuizSession::view))
    }

    // VOCABULARY ----------------------------------------------------------------------------------

    pub async fn load_vocabulary(&self) -> Result<VocabularyView, SessionError> {
        let profile = self.profile()?;
        *lock(&self.vocabulary)? = LoadState::Loading;

        let result = self
            .provider
            .vocabulary(profile.target_language, &profile.topic())
            .await;
        let mut slot = lock(&self.vocabulary)?;
        match result {
            Ok(items) => {
                log::info!("Voxel world ready with {} words", items.len());
                let session = VocabularySession::new(items);
                let view = session.view();
                *slot = LoadState::Ready(session);
                Ok(view)
            }
            Err(e) => {
                log::error!("Failed to load vocabulary: {}", e);
                *slot = LoadState::Failed(e.to_string());
                Err(e.into())
            }
        }
    }

    pub fn pick_vocabulary(&self, item_id: &str) -> Result<(VocabularyPick, XpAward), SessionError> {
        let mut slot = lock(&self.vocabulary)?;
        let session = slot.session_mut()?;
        let mut next = session.clone();
        let pick = next.pick(item_id)?;
        let award = self.award_xp(pick.xp_awarded)?;
        *session = next;
        Ok((pick, award))
    }

    pub fn restart_vocabulary(&self) -> Result<VocabularyView, SessionError> {
        let mut slot = lock(&self.vocabulary)?;
        let session = slot.session_mut()?;
        session.restart();
        Ok(session.view())
    }

    pub fn vocabulary_view(&self) -> Result<LoadState<VocabularyView>, SessionError> {
        Ok(lock(&self.vocabulary)?.as_ref().map(VocabularySession::view))
    }

    // LIBRARY -------------------------------------------------------------------------------------

    pub async fn load_story(&self) -> Result<StoryView, SessionError> {
        let profile = self.profile()?;
        *lock(&self.library)? = LoadState::Loading;

        // Stories read better with interests joined by "and"
        let topic = profile.topic().replace(", ", " and ");
        let result = self.provider.story(profile.target_language, &topic).await;
        let mut slot = lock(&self.library)?;
        match result {
            Ok(story) => {
                let session = LibrarySession::new(story);
                let view = session.view();
                *slot = LoadState::Ready(session);
                Ok(view)
            }
            Err(e) => {
                log::error!("Failed to load story: {}", e);
                *slot = LoadState::Failed(e.to_string());
                Err(e.into())
            }
        }
    }

    pub fn finish_story(&self) -> Result<XpAward, SessionError> {
        let mut slot = lock(&self.library)?;
        let session = slot.session_mut()?;
        let mut next = session.clone();
        let xp = next.finish()?;
        let award = self.award_xp(xp)?;
        *session = next;
        Ok(award)
    }

    pub fn story_view(&self) -> Result<LoadState<StoryView>, SessionError> {
        Ok(lock(&self.library)?.as_ref().map(LibrarySession::view))
    }

    // CHAT ----------------------------------------------------------------------------------------

    /// Start a fresh conversation themed on the current interests
    pub fn open_chat(&self) -> Result<ChatView, SessionError> {
        let profile = self.profile()?;
        let session = ChatSession::new(profile.target_language, &profile.topic());
        let view = session.view();
        *lock(&self.chat)? = Some(session);
        Ok(view)
    }

    /// Send a message, pay the participation reward, then wait for the tutor
    pub async fn send_chat(&self, text: &str) -> Result<(ChatView, XpAward), SessionError> {
        let pending = {
            let mut slot = lock(&self.chat)?;
            slot.as_mut().ok_or(SessionError::NotLoaded)?.begin_turn(text)?
        };
        let award = self.award_xp(pending.xp_awarded)?;

        let reply = self
            .provider
            .chat_reply(pending.language, &pending.topic, &pending.history, &pending.message)
            .await;

        let mut slot = lock(&self.chat)?;
        let session = slot.as_mut().ok_or(SessionError::NotLoaded)?;
        session.complete_turn(reply);
        Ok((session.view(), award))
    }

    pub fn chat_view(&self) -> Result<Option<ChatView>, SessionError> {
        Ok(lock(&self.chat)?.as_ref().map(ChatSession::view))
    }

    // RACE ----------------------------------------------------------------------------------------

    /// Generate a track and start the countdown. Must run inside a tokio runtime.
    pub async fn start_race(
        &self,
        observer: Arc<dyn RaceObserver>,
    ) -> Result<RaceSnapshot, SessionError> {
        let profile = self.profile()?;
        let generation = {
            let mut slot = lock(&self.race)?;
            // Dropping the old server cancels its ticking task
            *slot = LoadState::Loading;
            self.race_generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        let topic = profile.race_topic();
        let result = self
            .provider
            .race_challenges(profile.target_language, &topic)
            .await;
        let mut slot = lock(&self.race)?;
        if self.race_generation.load(Ordering::SeqCst) != generation {
            log::info!("Race screen changed while \"{}\" was loading, discarding it", topic);
            return Err(SessionError::Superseded);
        }
        match result {
            Ok(challenges) => {
                log::info!("Track \"{}\" ready with {} challenges", topic, challenges.len());
                let observer = Arc::new(RewardingObserver {
                    profile: Arc::clone(&self.profile),
                    inner: observer,
                });
                let race = Race::new(self.race_config.clone(), challenges);
                let mut server = RaceServer::new(race, observer);
                server.start();
                let snapshot = server.snapshot()?;
                *slot = LoadState::Ready(server);
                Ok(snapshot)
            }
            Err(e) => {
                log::error!("Failed to generate race track: {}", e);
                *slot = LoadState::Failed(e.to_string());
                Err(e.into())
            }
        }
    }

    pub fn answer_race(&self, choice: &str) -> Result<AnswerOutcome, SessionError> {
        let slot = lock(&self.race)?;
        let server = slot.ready().ok_or(SessionError::NotLoaded)?;
        Ok(server.submit_answer(choice)?)
    }

    pub fn restart_race(&self) -> Result<RaceSnapshot, SessionError> {
        let mut slot = lock(&self.race)?;
        let server = slot.session_mut()?;
        server.restart()?;
        Ok(server.snapshot()?)
    }

    pub fn race_snapshot(&self) -> Result<LoadState<RaceSnapshot>, SessionError> {
        let slot = lock(&self.race)?;
        Ok(match &*slot {
            LoadState::Idle => LoadState::Idle,
            LoadState::Loading => LoadState::Loading,
            LoadState::Ready(server) => LoadState::Ready(server.snapshot()?),
            LoadState::Failed(msg) => LoadState::Failed(msg.clone()),
        })
    }

    /// Leave the race screen, cancelling any running timers
    pub fn leave_race(&self) -> Result<(), SessionError> {
        let mut slot = lock(&self.race)?;
        self.race_generation.fetch_add(1, Ordering::SeqCst);
        *slot = LoadState::Idle;
        Ok(())
    }
}
