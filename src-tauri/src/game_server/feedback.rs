//! Feedback - Short-lived signals for the renderer
//!
//! A signal holds a value until its deadline passes. Setting it again
//! replaces both the value and the deadline, so an older pending clear can
//! never wipe a newer signal.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct TimedSignal<T> {
    value: Option<T>,
    expires_at: Option<Instant>,
}

impl<T> Default for TimedSignal<T> {
    fn default() -> Self {
        Self {
            value: None,
            expires_at: None,
        }
    }
}

impl<T: Clone> TimedSignal<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal until `now + ttl`
    pub fn set(&mut self, value: T, now: Instant, ttl: Duration) {
        self.value = Some(value);
        self.expires_at = Some(now + ttl);
    }

    /// Current value, if the deadline has not passed yet
    pub fn get(&self, now: Instant) -> Option<T> {
        match self.expires_at {
            Some(deadline) if now < deadline => self.value.clone(),
            _ => None,
        }
    }

    pub fn is_active(&self, now: Instant) -> bool {
        self.get(now).is_some()
    }

    pub fn clear(&mut self) {
        self.value = None;
        self.expires_at = None;
    }
}
