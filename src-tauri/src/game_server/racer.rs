//! Racer - Player and opponent state and per-tick movement
//!
//! Progress lives on a 0-1000 scale. The player is driven by answer boosts
//! and a slow speed bleed; opponents run at a scripted base speed with a
//! little random jitter each tick.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Continuous race state shared by the player and every opponent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RacerState {
    /// Distance covered, clamped to the finish line
    pub progress: f32,
    /// Progress units gained per tick
    pub speed: f32,
}

impl RacerState {
    /// Advance by `delta` and clamp to `[0, finish_line]`.
    /// Returns true once the racer sits on the finish line.
    pub fn advance(&mut self, delta: f32, finish_line: f32) -> bool {
        let next = self.progress + delta.max(0.0);
        self.progress = next.min(finish_line);
        next >= finish_line
    }

    pub fn has_finished(&self, finish_line: f32) -> bool {
        self.progress >= finish_line
    }
}

/// Scripted opponent definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpponentProfile {
    pub id: u32,
    pub name: String,
    pub base_speed: f32,
    pub color: String,
}

impl OpponentProfile {
    pub fn new(id: u32, name: &str, base_speed: f32, color: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            base_speed,
            color: color.to_string(),
        }
    }

    /// The three bots every race is run against
    pub fn default_roster() -> Vec<OpponentProfile> {
        vec![
            Self::new(1, "Neural Bot", 1.8, "#06b6d4"),
            Self::new(2, "Cyber Racer", 1.5, "#ec4899"),
            Self::new(3, "Data Ghost", 2.1, "#a855f7"),
        ]
    }
}

/// An opponent in a running race
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opponent {
    pub profile: OpponentProfile,
    pub state: RacerState,
}

impl Opponent {
    pub fn new(profile: OpponentProfile) -> Self {
        let state = RacerState {
            progress: 0.0,
            speed: profile.base_speed,
        };
        Self { profile, state }
    }

    /// Move one tick: base speed plus uniform jitter in `[-jitter, +jitter]`.
    /// Returns true if this step reached the finish line.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R, jitter: f32, finish_line: f32) -> bool {
        let variance = if jitter > 0.0 {
            rng.gen_range(-jitter..=jitter)
        } else {
            0.0
        };
        self.state.speed = (self.profile.base_speed + variance).max(0.0);
        self.state.advance(self.state.speed, finish_line)
    }
}

/// Compact racer state for IPC transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RacerSnapshot {
    pub id: u32,
    pub name: String,
    pub color: String,
    pub progress: f32,
    pub speed: f32,
}

impl From<&Opponent> for RacerSnapshot {
    fn from(opponent: &Opponent) -> Self {
        Self {
            id: opponent.profile.id,
            name: opponent.profile.name.clone(),
            color: opponent.profile.color.clone(),
            progress: opponent.state.progress,
            speed: opponent.state.speed,
        }
    }
}
