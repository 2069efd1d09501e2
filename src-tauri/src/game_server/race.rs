//! Race - Race configuration and state management
//!
//! Handles the countdown, per-tick movement, answer boosts and finish
//! detection. Time is driven from outside: `countdown_tick` once per second
//! and `tick` at the configured tick rate.

use crate::content::RaceChallenge;
use crate::game_server::feedback::TimedSignal;
use crate::game_server::racer::{Opponent, OpponentProfile, RacerSnapshot, RacerState};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Race configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceConfig {
    /// Progress value that ends the race
    pub finish_line: f32,
    /// Simulation ticks per second
    pub tick_rate: f32,
    /// Countdown start value, decremented once per second
    pub countdown_from: u32,
    /// Player speed once the countdown ends
    pub base_speed: f32,
    /// Speed lost per tick without input
    pub speed_decay: f32,
    /// Speed never decays below this
    pub decay_floor: f32,
    pub boost: f32,
    pub max_speed: f32,
    pub penalty: f32,
    pub min_speed: f32,
    /// Opponent speed jitter, applied as +/- this value
    pub jitter: f32,
    pub feedback_ms: u64,
    pub shake_ms: u64,
    pub win_reward: u32,
    pub participation_reward: u32,
    pub opponents: Vec<OpponentProfile>,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            finish_line: 1000.0,
            tick_rate: 60.0,
            countdown_from: 3,
            base_speed: 2.0,
            speed_decay: 0.005,
            decay_floor: 1.2,
            boost: 3.5,
            max_speed: 12.0,
            penalty: 2.0,
            min_speed: 0.5,
            jitter: 0.1,
            feedback_ms: 600,
            shake_ms: 300,
            win_reward: 50,
            participation_reward: 15,
            opponents: OpponentProfile::default_roster(),
        }
    }
}

impl RaceConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.tick_rate.max(1.0))
    }

    fn feedback_duration(&self) -> Duration {
        Duration::from_millis(self.feedback_ms)
    }

    fn shake_duration(&self) -> Duration {
        Duration::from_millis(self.shake_ms)
    }
}

/// Race status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaceStatus {
    Countdown,
    Playing,
    Finished,
}

/// Transient answer feedback shown over the player's car
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Hit,
    Miss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RaceError {
    #[error("answers are only accepted while the race is playing")]
    NotPlaying,
    #[error("still showing feedback for the previous answer")]
    FeedbackPending,
    #[error("no challenge available")]
    NoChallenge,
    #[error("race state lock poisoned")]
    Poisoned,
}

/// Result of applying one answer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub speed: f32,
    pub challenge_index: usize,
}

/// Complete race state
#[derive(Debug, Clone)]
pub struct Race {
    config: RaceConfig,
    status: RaceStatus,
    countdown: u32,
    player: RacerState,
    opponents: Vec<Opponent>,
    challenges: Vec<RaceChallenge>,
    current_index: usize,
    feedback: TimedSignal<Feedback>,
    shake: TimedSignal<()>,
    ticks: u64,
    reward_claimed: bool,
    rng: StdRng,
}

impl Race {
    /// Create a new race with the given configuration
    pub fn new(config: RaceConfig, challenges: Vec<RaceChallenge>) -> Self {
        Self::with_rng(config, challenges, StdRng::from_entropy())
    }

    /// Race with reproducible opponent jitter
    pub fn with_seed(config: RaceConfig, challenges: Vec<RaceChallenge>, seed: u64) -> Self {
        Self::with_rng(config, challenges, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: RaceConfig, challenges: Vec<RaceChallenge>, rng: StdRng) -> Self {
        let opponents = config.opponents.iter().cloned().map(Opponent::new).collect();
        Self {
            countdown: config.countdown_from,
            config,
            status: RaceStatus::Countdown,
            player: RacerState::default(),
            opponents,
            challenges,
            current_index: 0,
            feedback: TimedSignal::new(),
            shake: TimedSignal::new(),
            ticks: 0,
            reward_claimed: false,
            rng,
        }
    }

    /// Discard all progress and start a fresh countdown with the same challenges
    pub fn restart(&mut self) {
        self.status = RaceStatus::Countdown;
        self.countdown = self.config.countdown_from;
        self.player = RacerState::default();
        self.opponents = self.config.opponents.iter().cloned().map(Opponent::new).collect();
        self.current_index = 0;
        self.feedback.clear();
        self.shake.clear();
        self.ticks = 0;
        self.reward_claimed = false;
    }

    /// One-second countdown step. Reaching zero starts the race.
    pub fn countdown_tick(&mut self) -> RaceStatus {
        if self.status != RaceStatus::Countdown {
            return self.status;
        }

        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown == 0 {
            self.status = RaceStatus::Playing;
            self.player.speed = self.config.base_speed;
        }
        self.status
    }

    /// One fixed simulation step. The player is evaluated before the
    /// opponents, so a shared finishing tick goes to the player.
    pub fn tick(&mut self) -> RaceStatus {
        if self.status != RaceStatus::Playing {
            return self.status;
        }
        self.ticks += 1;

        let finish_line = self.config.finish_line;
        if self.player.advance(self.player.speed, finish_line) {
            self.status = RaceStatus::Finished;
        }

        self.player.speed = (self.player.speed - self.config.speed_decay).max(self.config.decay_floor);

        for opponent in &mut self.opponents {
            let done = opponent.step(&mut self.rng, self.config.jitter, finish_line);
            if done && self.status == RaceStatus::Playing {
                self.status = RaceStatus::Finished;
            }
        }

        self.status
    }

    /// Apply an answer already judged by the caller
    pub fn apply_answer(&mut self, is_correct: bool, now: Instant) -> Result<AnswerOutcome, RaceError> {
        if self.status != RaceStatus::Playing {
            return Err(RaceError::NotPlaying);
        }
        if self.feedback.is_active(now) {
            return Err(RaceError::FeedbackPending);
        }

        if is_correct {
            self.player.speed = (self.player.speed + self.config.boost).min(self.config.max_speed);
            if self.current_index + 1 < self.challenges.len() {
                self.current_index += 1;
            }
            self.feedback.set(Feedback::Hit, now, self.config.feedback_duration());
        } else {
            self.player.speed = (self.player.speed - self.config.penalty).max(self.config.min_speed);
            self.feedback.set(Feedback::Miss, now, self.config.feedback_duration());
            self.shake.set((), now, self.config.shake_duration());
        }

        Ok(AnswerOutcome {
            correct: is_correct,
            speed: self.player.speed,
            challenge_index: self.current_index,
        })
    }

    /// Judge `choice` against the current challenge and apply it
    pub fn submit_answer(&mut self, choice: &str, now: Instant) -> Result<AnswerOutcome, RaceError> {
        if self.status != RaceStatus::Playing {
            return Err(RaceError::NotPlaying);
        }
        let is_correct = self
            .current_challenge()
            .map(|c| c.is_correct(choice))
            .ok_or(RaceError::NoChallenge)?;
        self.apply_answer(is_correct, now)
    }

    pub fn current_challenge(&self) -> Option<&RaceChallenge> {
        self.challenges.get(self.current_index)
    }

    pub fn status(&self) -> RaceStatus {
        self.status
    }

    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    pub fn player(&self) -> RacerState {
        self.player
    }

    pub fn opponents(&self) -> &[Opponent] {
        &self.opponents
    }

    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    pub fn player_won(&self) -> bool {
        self.player.has_finished(self.config.finish_line)
    }

    /// XP earned by this race, known once it has finished
    pub fn reward(&self) -> Option<u32> {
        if self.status != RaceStatus::Finished {
            return None;
        }
        Some(if self.player_won() {
            self.config.win_reward
        } else {
            self.config.participation_reward
        })
    }

    /// The reward, handed out at most once per race
    pub fn take_reward(&mut self) -> Option<u32> {
        if self.reward_claimed {
            return None;
        }
        let reward = self.reward()?;
        self.reward_claimed = true;
        Some(reward)
    }

    /// Get compact snapshot for IPC transfer
    pub fn snapshot(&self, now: Instant) -> RaceSnapshot {
        let finished = self.status == RaceStatus::Finished;
        RaceSnapshot {
            status: self.status,
            countdown: self.countdown,
            tick: self.ticks,
            player: self.player,
            opponents: self.opponents.iter().map(RacerSnapshot::from).collect(),
            challenge: self.current_challenge().map(|c| ChallengeView {
                prompt: c.prompt.clone(),
                options: c.options(),
            }),
            challenge_index: self.current_index,
            challenge_count: self.challenges.len(),
            feedback: self.feedback.get(now),
            shake: self.shake.is_active(now),
            player_won: finished.then(|| self.player_won()),
            reward: self.reward(),
        }
    }
}

/// Prompt plus both answer options, as shown to the player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeView {
    pub prompt: String,
    pub options: [String; 2],
}

/// Compact race snapshot for network/IPC transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceSnapshot {
    pub status: RaceStatus,
    pub countdown: u32,
    pub tick: u64,
    pub player: RacerState,
    pub opponents: Vec<RacerSnapshot>,
    pub challenge: Option<ChallengeView>,
    pub challenge_index: usize,
    pub challenge_count: usize,
    pub feedback: Option<Feedback>,
    pub shake: bool,
    pub player_won: Option<bool>,
    pub reward: Option<u32>,
}
