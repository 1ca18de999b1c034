//! # Fibonacci Backoff
//!
//! Retry delays for transient reconcile failures. Delays grow along the
//! Fibonacci sequence (1s, 1s, 2s, 3s, 5s, 8s, ...) up to a cap, more slowly
//! than exponential backoff, so a flapping GitLab is retried often enough
//! without being hammered.
//!
//! `BackoffRegistry` keeps one sequence per record key (`namespace/name`) and
//! resets it once the record reconciles cleanly.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Fibonacci backoff calculator
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    min: u64,
    prev: u64,
    current: u64,
    max: u64,
}

impl FibonacciBackoff {
    /// Create a backoff whose first two delays are `min` and which never exceeds `max`
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        let min = min.as_secs().max(1);
        Self {
            min,
            prev: 0,
            current: min,
            max: max.as_secs().max(min),
        }
    }

    /// Get the next delay and advance the sequence
    pub fn next_backoff(&mut self) -> Duration {
        let result = self.current;
        let next = self.prev + self.current;
        self.prev = self.current;
        self.current = next.min(self.max);
        Duration::from_secs(result)
    }

    /// Reset to the initial state
    pub fn reset(&mut self) {
        self.prev = 0;
        self.current = self.min;
    }
}

/// Per-record backoff state
#[derive(Debug, Clone)]
struct BackoffState {
    backoff: FibonacciBackoff,
    error_count: u32,
}

/// Backoff sequences keyed by record
#[derive(Debug, Clone)]
pub struct BackoffRegistry {
    min: Duration,
    max: Duration,
    states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl BackoffRegistry {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max,
            states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record another failure for `key` and return how long to wait
    pub fn next_backoff(&self, key: &str) -> Duration {
        let mut states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
        let state = states.entry(key.to_string()).or_insert_with(|| BackoffState {
            backoff: FibonacciBackoff::new(self.min, self.max),
            error_count: 0,
        });
        state.error_count += 1;
        state.backoff.next_backoff()
    }

    /// Consecutive failures recorded for `key`
    pub fn error_count(&self, key: &str) -> u32 {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .map_or(0, |s| s.error_count)
    }

    /// Forget failures for `key`
    pub fn reset(&self, key: &str) {
        let mut states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(state) = states.get_mut(key) {
            state.error_count = 0;
            state.backoff.reset();
        }
    }
}

impl Default for BackoffRegistry {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(300))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(backoff: &mut FibonacciBackoff, n: usize) -> Vec<u64> {
        (0..n).map(|_| backoff.next_backoff().as_secs()).collect()
    }

    #[test]
    fn test_fibonacci_backoff_sequence() {
        let mut backoff = FibonacciBackoff::new(Duration::from_secs(1), Duration::from_secs(60));
        assert_eq!(secs(&mut backoff, 8), vec![1, 1, 2, 3, 5, 8, 13, 21]);
    }

    #[test]
    fn test_fibonacci_backoff_max_cap() {
        let mut backoff = FibonacciBackoff::new(Duration::from_secs(1), Duration::from_secs(10));
        assert_eq!(secs(&mut backoff, 9), vec![1, 1, 2, 3, 5, 8, 10, 10, 10]);
    }

    #[test]
    fn test_fibonacci_backoff_reset() {
        let mut backoff = FibonacciBackoff::new(Duration::from_secs(1), Duration::from_secs(10));
        secs(&mut backoff, 4);
        backoff.reset();
        assert_eq!(secs(&mut backoff, 3), vec![1, 1, 2]);
    }

    #[test]
    fn test_registry_tracks_keys_independently() {
        let registry = BackoffRegistry::default();
        assert_eq!(registry.next_backoff("ns/a"), Duration::from_secs(1));
        assert_eq!(registry.next_backoff("ns/a"), Duration::from_secs(1));
        assert_eq!(registry.next_backoff("ns/a"), Duration::from_secs(2));
        assert_eq!(registry.next_backoff("ns/b"), Duration::from_secs(1));
        assert_eq!(registry.error_count("ns/a"), 3);

        registry.reset("ns/a");
        assert_eq!(registry.error_count("ns/a"), 0);
        assert_eq!(registry.next_backoff("ns/a"), Duration::from_secs(1));
        assert_eq!(registry.error_count("ns/b"), 1);
    }
}
