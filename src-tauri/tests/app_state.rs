use async_trait::async_trait;
use lingovoxel_lib::content::{
    ChatTurn, ContentError, ContentProvider, ContentResult, GeminiConfig, GeminiProvider,
    QuizQuestion, RaceChallenge, Story, VocabularyItem,
};
use lingovoxel_lib::game_server::{RaceConfig, RaceObserver, RaceSnapshot, RaceStatus};
use lingovoxel_lib::games::{LoadState, SessionError};
use lingovoxel_lib::profile::{Language, ProfileStore, UserProfile};
use lingovoxel_lib::AppState;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Canned content; `fail` makes every request error out, `track_delay`
/// slows down race track generation
#[derive(Default)]
struct MockProvider {
    fail: bool,
    track_delay: Duration,
    calls: AtomicUsize,
    topics: Mutex<Vec<String>>,
}

impl MockProvider {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn slow_tracks(delay: Duration) -> Self {
        Self {
            track_delay: delay,
            ..Default::default()
        }
    }

    fn record(&self, topic: &str) -> ContentResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.topics.lock().unwrap().push(topic.to_string());
        if self.fail {
            Err(ContentError::Api {
                status: 503,
                body: "overloaded".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ContentProvider for MockProvider {
    async fn quiz(&self, _language: Language, topic: &str) -> ContentResult<Vec<QuizQuestion>> {
        self.record(topic)?;
        Ok((1..=5)
            .map(|n| QuizQuestion {
                question: format!("Question {n}"),
                options: vec!["right".into(), "wrong".into(), "nope".into(), "nah".into()],
                correct_answer: "right".to_string(),
                explanation: "Explicación".to_string(),
            })
            .collect())
    }

    async fn vocabulary(
        &self,
        _language: Language,
        topic: &str,
    ) -> ContentResult<Vec<VocabularyItem>> {
        self.record(topic)?;
        Ok(vec![
            VocabularyItem {
                id: "a".into(),
                target_word: "guitar".into(),
                native_word: "guitarra".into(),
                emoji: "🎸".into(),
            },
            VocabularyItem {
                id: "b".into(),
                target_word: "drum".into(),
                native_word: "tambor".into(),
                emoji: "🥁".into(),
            },
        ])
    }

    async fn story(&self, _language: Language, topic: &str) -> ContentResult<Story> {
        self.record(topic)?;
        Ok(Story {
            title: "A Day at the Lab".to_string(),
            body: "First paragraph.\nSecond paragraph.".to_string(),
        })
    }

    async fn race_challenges(
        &self,
        _language: Language,
        topic: &str,
    ) -> ContentResult<Vec<RaceChallenge>> {
        self.record(topic)?;
        if !self.track_delay.is_zero() {
            tokio::time::sleep(self.track_delay).await;
        }
        Ok(vec![
            RaceChallenge::new("coche", "car", "cat"),
            RaceChallenge::new("rueda", "wheel", "whale"),
        ])
    }

    async fn chat_reply(
        &self,
        _language: Language,
        topic: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> ContentResult<String> {
        self.record(topic)?;
        Ok(format!("({} turns) You said: {}", history.len(), message))
    }
}

#[derive(Default)]
struct Recorder {
    snapshots: AtomicUsize,
    rewards: Mutex<Vec<u32>>,
}

impl RaceObserver for Recorder {
    fn on_snapshot(&self, _snapshot: &RaceSnapshot) {
        self.snapshots.fetch_add(1, Ordering::SeqCst);
    }

    fn on_finish(&self, reward: u32, _snapshot: &RaceSnapshot) {
        self.rewards.lock().unwrap().push(reward);
    }
}

fn learner() -> UserProfile {
    let mut profile = UserProfile {
        target_language: Language::Spanish,
        ..Default::default()
    };
    profile.toggle_interest("music");
    profile.toggle_interest("science");
    profile
}

fn app_with(provider: Arc<MockProvider>) -> AppState {
    AppState::new(
        ProfileStore::in_memory(learner()),
        provider,
        RaceConfig::default(),
    )
}

#[tokio::test]
async fn quiz_three_of_five_earns_thirty_xp() {
    let provider = Arc::new(MockProvider::default());
    let app = app_with(provider.clone());

    let view = app.load_quiz().await.unwrap();
    assert_eq!(view.total, 5);
    assert_eq!(provider.topics.lock().unwrap()[0], "Music, Science");

    for pick in ["right", "wrong", "right", "nope", "right"] {
        app.answer_quiz(pick).unwrap();
        app.next_question().unwrap();
    }

    let view = match app.quiz_view().unwrap() {
        LoadState::Ready(view) => view,
        other => panic!("quiz not ready: {:?}", other),
    };
    assert!(view.complete);
    assert_eq!(view.score_display, "3 / 5");
    assert_eq!(app.profile().unwrap().xp, 30);
}

#[tokio::test]
async fn reloading_a_quiz_starts_from_zero() {
    let app = app_with(Arc::new(MockProvider::default()));
    app.load_quiz().await.unwrap();
    app.answer_quiz("right").unwrap();
    app.next_question().unwrap();

    let view = app.load_quiz().await.unwrap();
    assert_eq!(view.score, 0);
    assert_eq!(view.question_number, 1);
    assert_eq!(view.selected, None);
}

#[tokio::test]
async fn failed_fetch_is_reported_without_retry() {
    let provider = Arc::new(MockProvider::failing());
    let app = app_with(provider.clone());

    let err = app.load_quiz().await.unwrap_err();
    assert!(matches!(err, SessionError::Content(ContentError::Api { status: 503, .. })));
    assert!(matches!(app.quiz_view().unwrap(), LoadState::Failed(msg) if msg.contains("503")));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

    assert!(matches!(app.answer_quiz("right"), Err(SessionError::NotLoaded)));
}

#[tokio::test]
async fn vocabulary_matches_pay_twenty_each() {
    let app = app_with(Arc::new(MockProvider::default()));
    let view = app.load_vocabulary().await.unwrap();
    assert_eq!(view.items.len(), 2);

    for _ in 0..2 {
        let target = match app.vocabulary_view().unwrap() {
            LoadState::Ready(view) => view.target_word.unwrap(),
            other => panic!("vocabulary not ready: {:?}", other),
        };
        let id = if target == "guitarra" { "a" } else { "b" };
        let (pick, award) = app.pick_vocabulary(id).unwrap();
        assert!(pick.matched);
        assert_eq!(award.amount, 20);
    }

    assert_eq!(app.profile().unwrap().xp, 40);
    match app.vocabulary_view().unwrap() {
        LoadState::Ready(view) => assert!(view.explored),
        other => panic!("vocabulary not ready: {:?}", other),
    }
}

#[tokio::test]
async fn story_pays_once_and_joins_topics_with_and() {
    let provider = Arc::new(MockProvider::default());
    let app = app_with(provider.clone());

    let view = app.load_story().await.unwrap();
    assert_eq!(view.paragraphs.len(), 2);
    assert_eq!(provider.topics.lock().unwrap()[0], "Music and Science");

    assert_eq!(app.finish_story().unwrap().profile.xp, 15);
    assert!(matches!(app.finish_story(), Err(SessionError::Finished)));
    assert_eq!(app.profile().unwrap().xp, 15);
}

#[tokio::test]
async fn chat_rewards_participation_and_appends_reply() {
    let app = app_with(Arc::new(MockProvider::default()));
    let opened = app.open_chat().unwrap();
    assert_eq!(opened.turns.len(), 1);

    let (view, award) = app.send_chat("Me gusta la música").await.unwrap();
    assert_eq!(award.amount, 5);
    assert_eq!(view.turns.len(), 3);
    assert_eq!(view.turns[2].text, "(1 turns) You said: Me gusta la música");
    assert!(!view.awaiting_reply);
}

#[tokio::test]
async fn chat_failure_keeps_reward_and_drops_reply() {
    let app = app_with(Arc::new(MockProvider::failing()));
    app.open_chat().unwrap();

    let (view, award) = app.send_chat("hola").await.unwrap();
    assert_eq!(award.profile.xp, 5);
    assert_eq!(view.turns.len(), 2);
    assert_eq!(view.turns[1].text, "hola");
}

#[tokio::test]
async fn chat_requires_an_open_session() {
    let app = app_with(Arc::new(MockProvider::default()));
    assert!(matches!(app.send_chat("hi").await, Err(SessionError::NotLoaded)));
}

#[tokio::test(start_paused = true)]
async fn race_runs_to_completion_and_records_reward() {
    let app = app_with(Arc::new(MockProvider::default()));
    let recorder = Arc::new(Recorder::default());

    let snapshot = app.start_race(recorder.clone()).await.unwrap();
    assert_eq!(snapshot.status, RaceStatus::Countdown);
    assert_eq!(snapshot.challenge_count, 2);

    // Nobody answers, so the 2.1-speed bot takes it
    tokio::time::sleep(Duration::from_secs(30)).await;

    let snapshot = match app.race_snapshot().unwrap() {
        LoadState::Ready(snapshot) => snapshot,
        other => panic!("race not ready: {:?}", other),
    };
    assert_eq!(snapshot.status, RaceStatus::Finished);
    assert_eq!(snapshot.player_won, Some(false));
    assert_eq!(*recorder.rewards.lock().unwrap(), vec![15]);
    assert_eq!(app.profile().unwrap().xp, 15);
    assert!(recorder.snapshots.load(Ordering::SeqCst) > 100);
}

#[tokio::test(start_paused = true)]
async fn race_uses_specific_interest_text_and_accepts_answers() {
    let provider = Arc::new(MockProvider::default());
    let app = app_with(provider.clone());
    app.set_specific_interests("Formula 1").unwrap();

    app.start_race(Arc::new(Recorder::default())).await.unwrap();
    assert_eq!(provider.topics.lock().unwrap()[0], "Formula 1");

    assert!(matches!(
        app.answer_race("car"),
        Err(SessionError::Race(_))
    ));

    tokio::time::sleep(Duration::from_millis(3050)).await;
    let outcome = app.answer_race("car").unwrap();
    assert!(outcome.correct);
    assert_eq!(outcome.challenge_index, 1);
}

#[tokio::test(start_paused = true)]
async fn leaving_the_race_stops_it() {
    let app = app_with(Arc::new(MockProvider::default()));
    let recorder = Arc::new(Recorder::default());
    app.start_race(recorder.clone()).await.unwrap();
    tokio::time::sleep(Duration::from_secs(4)).await;

    app.leave_race().unwrap();
    let seen = recorder.snapshots.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(recorder.snapshots.load(Ordering::SeqCst), seen);
    assert!(recorder.rewards.lock().unwrap().is_empty());
    assert!(matches!(app.race_snapshot().unwrap(), LoadState::Idle));
}

#[tokio::test(start_paused = true)]
async fn leaving_while_the_track_loads_discards_it() {
    let app = app_with(Arc::new(MockProvider::slow_tracks(Duration::from_secs(2))));
    let recorder = Arc::new(Recorder::default());

    let (started, _) = tokio::join!(app.start_race(recorder.clone()), async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        app.leave_race().unwrap();
    });
    assert!(matches!(started, Err(SessionError::Superseded)));

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(matches!(app.race_snapshot().unwrap(), LoadState::Idle));
    assert_eq!(recorder.snapshots.load(Ordering::SeqCst), 0);
    assert!(recorder.rewards.lock().unwrap().is_empty());
    assert_eq!(app.profile().unwrap().xp, 0);
}

#[tokio::test(start_paused = true)]
async fn only_the_latest_race_start_is_kept() {
    let app = app_with(Arc::new(MockProvider::slow_tracks(Duration::from_secs(2))));
    let first = Arc::new(Recorder::default());
    let second = Arc::new(Recorder::default());

    let (stale, latest) = tokio::join!(app.start_race(first.clone()), async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        app.start_race(second.clone()).await
    });
    assert!(matches!(stale, Err(SessionError::Superseded)));
    assert_eq!(latest.unwrap().status, RaceStatus::Countdown);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(first.snapshots.load(Ordering::SeqCst), 0);
    assert_eq!(*second.rewards.lock().unwrap(), vec![15]);
    assert_eq!(app.profile().unwrap().xp, 15);
}

#[tokio::test(start_paused = true)]
async fn failed_track_generation_does_not_start_a_race() {
    let app = app_with(Arc::new(MockProvider::failing()));
    let recorder = Arc::new(Recorder::default());

    assert!(app.start_race(recorder.clone()).await.is_err());
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(recorder.snapshots.load(Ordering::SeqCst), 0);
    assert!(matches!(app.race_snapshot().unwrap(), LoadState::Failed(_)));
}

#[tokio::test]
async fn unsaved_quiz_answer_can_be_retried() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();

    let app = AppState::new(
        ProfileStore::open(blocker.join("profile.json")),
        Arc::new(MockProvider::default()),
        RaceConfig::default(),
    );
    app.load_quiz().await.unwrap();

    for _ in 0..2 {
        assert!(matches!(app.answer_quiz("right"), Err(SessionError::Profile(_))));
    }
    let view = match app.quiz_view().unwrap() {
        LoadState::Ready(view) => view,
        other => panic!("quiz not ready: {:?}", other),
    };
    assert_eq!(view.score, 0);
    assert_eq!(view.selected, None);
    assert_eq!(app.profile().unwrap().xp, 0);
}

#[tokio::test]
async fn unreachable_service_errors_do_not_reveal_the_api_key() {
    let provider = GeminiProvider::new(GeminiConfig {
        api_key: "SECRET123".to_string(),
        base_url: "http://127.0.0.1:1/v1beta/models".to_string(),
        timeout_seconds: 5,
        ..Default::default()
    })
    .unwrap();
    let app = AppState::new(
        ProfileStore::in_memory(learner()),
        Arc::new(provider),
        RaceConfig::default(),
    );

    let err = app.load_quiz().await.unwrap_err();
    assert!(!err.to_string().contains("SECRET123"));
    match app.quiz_view().unwrap() {
        LoadState::Failed(msg) => assert!(!msg.contains("SECRET123"), "leaked key: {}", msg),
        other => panic!("expected a failed quiz, got {:?}", other),
    }
}

#[tokio::test]
async fn restarting_a_quiz_keeps_the_questions() {
    let app = app_with(Arc::new(MockProvider::default()));
    app.load_quiz().await.unwrap();
    app.answer_quiz("right").unwrap();
    app.next_question().unwrap();

    let view = app.restart_quiz().unwrap();
    assert_eq!(view.total, 5);
    assert_eq!(view.score, 0);
    assert_eq!(view.question_number, 1);
    assert_eq!(app.profile().unwrap().xp, 10);
}

#[tokio::test]
async fn restarting_vocabulary_forgets_found_words() {
    let app = app_with(Arc::new(MockProvider::default()));
    let view = app.load_vocabulary().await.unwrap();
    let id = if view.target_word.as_deref() == Some("guitarra") { "a" } else { "b" };
    app.pick_vocabulary(id).unwrap();

    let view = app.restart_vocabulary().unwrap();
    assert_eq!(view.found_count, 0);
    assert!(view.target_word.is_some());
}

#[test]
fn journey_needs_an_interest() {
    let app = AppState::new(
        ProfileStore::in_memory(UserProfile::default()),
        Arc::new(MockProvider::default()),
        RaceConfig::default(),
    );
    assert!(matches!(app.start_journey(), Err(SessionError::NoInterests)));

    app.toggle_interest("cooking").unwrap();
    assert_eq!(app.start_journey().unwrap().interests, vec!["cooking"]);
}

#[tokio::test]
async fn profile_changes_persist_between_launches() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("profile.json");

    {
        let app = AppState::new(
            ProfileStore::open(&path),
            Arc::new(MockProvider::default()),
            RaceConfig::default(),
        );
        app.set_language(Language::Spanish).unwrap();
        app.toggle_interest("history").unwrap();
        app.load_story().await.unwrap();
        app.finish_story().unwrap();
    }

    let profile = ProfileStore::open(&path).get().unwrap();
    assert_eq!(profile.target_language, Language::Spanish);
    assert_eq!(profile.interests, vec!["history"]);
    assert_eq!(profile.xp, 15);
}
