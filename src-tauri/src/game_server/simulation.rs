//! Simulation - Real-time driver for a race
//!
//! Owns the race state and a single background task that runs the
//! one-second countdown and then the fixed-rate tick loop. The task is
//! aborted when the race finishes, restarts, or the server is dropped, so
//! no tick outlives its race.

use crate::game_server::race::{AnswerOutcome, Race, RaceError, RaceSnapshot, RaceStatus};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Receives race updates from the ticking task
pub trait RaceObserver: Send + Sync + 'static {
    /// Called after every countdown step and every tick
    fn on_snapshot(&self, snapshot: &RaceSnapshot);

    /// Called exactly once when the race ends
    fn on_finish(&self, reward: u32, snapshot: &RaceSnapshot);
}

type SharedRace = Arc<Mutex<Race>>;

fn lock(race: &SharedRace) -> Result<MutexGuard<'_, Race>, RaceError> {
    race.lock().map_err(|_| RaceError::Poisoned)
}

/// Main race server
pub struct RaceServer {
    race: SharedRace,
    observer: Arc<dyn RaceObserver>,
    task: Option<JoinHandle<()>>,
}

impl RaceServer {
    /// Create a server for `race`. Nothing runs until [`RaceServer::start`].
    pub fn new(race: Race, observer: Arc<dyn RaceObserver>) -> Self {
        Self {
            race: Arc::new(Mutex::new(race)),
            observer,
            task: None,
        }
    }

    /// Spawn the countdown and tick loop, replacing any running task.
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        self.stop();
        let race = Arc::clone(&self.race);
        let observer = Arc::clone(&self.observer);
        self.task = Some(tokio::spawn(drive(race, observer)));
        log::info!("Race started");
    }

    /// Cancel the background task; race state is left as is
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Reset the race and run it again from the countdown
    pub fn restart(&mut self) -> Result<(), RaceError> {
        self.stop();
        lock(&self.race)?.restart();
        self.start();
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().map_or(false, |t| !t.is_finished())
    }

    pub fn submit_answer(&self, choice: &str) -> Result<AnswerOutcome, RaceError> {
        let now = Instant::now().into_std();
        let (outcome, snapshot) = {
            let mut race = lock(&self.race)?;
            let outcome = race.submit_answer(choice, now)?;
            (outcome, race.snapshot(now))
        };
        self.observer.on_snapshot(&snapshot);
        Ok(outcome)
    }

    pub fn snapshot(&self) -> Result<RaceSnapshot, RaceError> {
        Ok(lock(&self.race)?.snapshot(Instant::now().into_std()))
    }

    pub fn status(&self) -> Result<RaceStatus, RaceError> {
        Ok(lock(&self.race)?.status())
    }
}

impl Drop for RaceServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn drive(race: SharedRace, observer: Arc<dyn RaceObserver>) {
    if let Err(e) = run_race(&race, observer.as_ref()).await {
        log::error!("Race loop stopped: {}", e);
    }
}

async fn run_race(race: &SharedRace, observer: &dyn RaceObserver) -> Result<(), RaceError> {
    let (tick_period, snapshot) = {
        let race = lock(race)?;
        (race.config().tick_period(), race.snapshot(Instant::now().into_std()))
    };
    observer.on_snapshot(&snapshot);

    // Countdown phase: one step per second
    let second = Duration::from_secs(1);
    let mut countdown = time::interval_at(Instant::now() + second, second);
    loop {
        countdown.tick().await;
        let now = Instant::now().into_std();
        let (status, snapshot) = {
            let mut race = lock(race)?;
            (race.countdown_tick(), race.snapshot(now))
        };
        observer.on_snapshot(&snapshot);
        if status != RaceStatus::Countdown {
            break;
        }
    }

    // Playing phase: fixed-rate ticks until someone crosses the line
    let mut ticker = time::interval_at(Instant::now() + tick_period, tick_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        let now = Instant::now().into_std();
        let (reward, snapshot) = {
            let mut race = lock(race)?;
            race.tick();
            (race.take_reward(), race.snapshot(now))
        };
        observer.on_snapshot(&snapshot);

        if let Some(reward) = reward {
            log::info!(
                "Race finished after {} ticks, player won: {}",
                snapshot.tick,
                snapshot.player_won.unwrap_or(false)
            );
            observer.on_finish(reward, &snapshot);
            return Ok(());
        }
    }
}
