//! Game Server Module
//!
//! Runs the translation race: three scripted bots against a player whose
//! speed is driven by answering prompts. The simulation ticks at 60 Hz on a
//! background task and pushes snapshots to the frontend.

pub mod feedback;
pub mod race;
pub mod racer;
pub mod simulation;

pub use feedback::TimedSignal;
pub use race::{AnswerOutcome, Feedback, Race, RaceConfig, RaceError, RaceSnapshot, RaceStatus};
pub use racer::{Opponent, OpponentProfile, RacerSnapshot, RacerState};
pub use simulation::{RaceObserver, RaceServer};
