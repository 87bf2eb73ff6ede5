//! Per-path commit throttling.
//!
//! A path committed at time `T` may not be committed again automatically
//! until `T + min_interval`, unless the caller forces the commit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;

/// Source of the current time as fractional Unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> f64 {
        (**self).now()
    }
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        Utc::now().timestamp_millis() as f64 / 1000.0
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<f64>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, t: f64) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = t;
    }

    pub fn advance(&self, secs: f64) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) += secs;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Last successful commit time per path.
#[derive(Debug, Clone)]
pub struct ThrottleStore {
    min_interval: f64,
    last_commit: HashMap<String, f64>,
}

impl ThrottleStore {
    pub fn new(min_interval_secs: u64) -> Self {
        Self {
            min_interval: min_interval_secs as f64,
            last_commit: HashMap::new(),
        }
    }

    /// Whether `path` may be committed at `now`.
    pub fn is_eligible(&self, path: &str, now: f64, ignore_throttle: bool) -> bool {
        if ignore_throttle {
            return true;
        }
        match self.last_commit.get(path) {
            Some(last) => now - last >= self.min_interval,
            None => true,
        }
    }

    /// Store `now` as the last commit time of `path`, replacing any earlier value.
    pub fn record_commit(&mut self, path: &str, now: f64) {
        self.last_commit.insert(path.to_string(), now);
    }

    pub fn last_commit(&self, path: &str) -> Option<f64> {
        self.last_commit.get(path).copied()
    }
}
