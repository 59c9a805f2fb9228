//! Debounce guard for duplicate activation events
//!
//! One logical user action can arrive as several low-level triggers (a click
//! landing on both a row and a button nested inside it). The guard accepts
//! the first trigger per key and rejects every other one until the threshold
//! has passed since that accepted trigger. Rejections do not re-arm the clock.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Per-key timestamp gate
#[derive(Debug)]
pub struct DebounceGuard {
    last_fired: Mutex<HashMap<String, Instant>>,
    default_threshold: Duration,
}

impl DebounceGuard {
    /// Create a guard whose [`fire`](Self::fire) uses `default_threshold`
    pub fn new(default_threshold: Duration) -> Self {
        Self {
            last_fired: Mutex::new(HashMap::new()),
            default_threshold,
        }
    }

    /// Should the trigger identified by `key` be acted on?
    pub fn should_fire(&self, key: &str, threshold: Duration) -> bool {
        self.should_fire_at(key, threshold, Instant::now())
    }

    /// [`should_fire`](Self::should_fire) with an explicit clock reading
    pub fn should_fire_at(&self, key: &str, threshold: Duration, now: Instant) -> bool {
        let mut last_fired = self
            .last_fired
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(last) = last_fired.get(key) {
            if now.saturating_duration_since(*last) < threshold {
                tracing::trace!(key, "debounced duplicate trigger");
                return false;
            }
        }

        last_fired.insert(key.to_string(), now);
        true
    }

    /// [`should_fire`](Self::should_fire) with the guard's default threshold
    pub fn fire(&self, key: &str) -> bool {
        self.should_fire(key, self.default_threshold)
    }

    /// Forget the last accepted trigger for `key`
    pub fn reset(&self, key: &str) {
        self.last_fired
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(key);
    }

    pub fn default_threshold(&self) -> Duration {
        self.default_threshold
    }
}

impl Default for DebounceGuard {
    fn default() -> Self {
        Self::new(Duration::from_millis(300))
    }
}
