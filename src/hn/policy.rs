//! Resilience policies wrapped around upstream calls.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::warn;

/// Maximum retries for a transient failure.
pub const MAX_RETRIES: u32 = 3;

/// Exponential backoff before retry `attempt` (1-based): 2, 4, 8 seconds.
pub fn retry_delay(attempt: u32) -> Duration {
  Duration::from_secs(2u64.saturating_pow(attempt))
}

/// Consecutive-failure circuit breaker.
///
/// After `failure_threshold` consecutive failures within a rolling
/// `failure_window`, the circuit opens and calls fail fast for `cooldown`.
/// Once the cooldown elapses a single probe call is let through; its outcome
/// closes the circuit or opens it for another cooldown.
pub struct CircuitBreaker {
  failure_threshold: u32,
  failure_window: Duration,
  cooldown: Duration,
  state: Mutex<BreakerState>,
}

#[derive(Default)]
struct BreakerState {
  /// Consecutive failures, all within `failure_window` of the first
  streak: u32,
  streak_started_at: Option<Instant>,
  opened_at: Option<Instant>,
  /// A half-open probe is in flight
  probing: bool,
}

impl CircuitBreaker {
  pub fn new(failure_threshold: u32, failure_window: Duration, cooldown: Duration) -> Self {
    Self {
      failure_threshold,
      failure_window,
      cooldown,
      state: Mutex::new(BreakerState::default()),
    }
  }

  fn lock(&self) -> MutexGuard<'_, BreakerState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Whether a call may proceed right now.
  ///
  /// Rejects while open; after the cooldown, admits exactly one probe until
  /// its outcome is recorded.
  pub fn allow_call(&self) -> bool {
    self.allow_call_at(Instant::now())
  }

  fn allow_call_at(&self, now: Instant) -> bool {
    let mut state = self.lock();
    let Some(opened_at) = state.opened_at else {
      return true;
    };
    if now.duration_since(opened_at) < self.cooldown {
      return false;
    }
    if state.probing {
      return false;
    }
    state.probing = true;
    true
  }

  /// Record a successful call: closes the circuit and clears the streak.
  pub fn record_success(&self) {
    let mut state = self.lock();
    if state.opened_at.is_some() {
      warn!("circuit breaker closed after successful probe");
    }
    *state = BreakerState::default();
  }

  /// Record a failed call.
  pub fn record_failure(&self) {
    self.record_failure_at(Instant::now());
  }

  fn record_failure_at(&self, now: Instant) {
    let mut state = self.lock();

    if state.probing {
      warn!("circuit breaker probe failed, reopening");
      *state = BreakerState {
        opened_at: Some(now),
        ..BreakerState::default()
      };
      return;
    }
    if state.opened_at.is_some() {
      // A call that was already in flight when the circuit opened
      return;
    }

    match state.streak_started_at {
      Some(started) if now.duration_since(started) <= self.failure_window => {
        state.streak += 1;
      }
      _ => {
        state.streak = 1;
        state.streak_started_at = Some(now);
      }
    }

    if state.streak >= self.failure_threshold {
      warn!(
        "circuit breaker opened after {} consecutive failures",
        state.streak
      );
      state.opened_at = Some(now);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
  }

  fn breaker() -> CircuitBreaker {
    CircuitBreaker::new(5, secs(30), secs(30))
  }

  #[test]
  fn test_retry_delay_doubles() {
    assert_eq!(retry_delay(1), secs(2));
    assert_eq!(retry_delay(2), secs(4));
    assert_eq!(retry_delay(3), secs(8));
  }

  #[test]
  fn test_opens_after_threshold_failures() {
    let breaker = breaker();
    let t0 = Instant::now();

    for i in 0..4 {
      breaker.record_failure_at(t0 + secs(i));
      assert!(breaker.allow_call_at(t0 + secs(i)));
    }

    breaker.record_failure_at(t0 + secs(4));
    assert!(!breaker.allow_call_at(t0 + secs(5)));
  }

  #[test]
  fn test_success_resets_streak() {
    let breaker = breaker();
    let t0 = Instant::now();

    for i in 0..4 {
      breaker.record_failure_at(t0 + secs(i));
    }
    breaker.record_success();
    breaker.record_failure_at(t0 + secs(5));

    // The earlier streak was cleared, so only one failure counts
    assert!(breaker.allow_call_at(t0 + secs(6)));
  }

  #[test]
  fn test_failures_outside_window_start_a_new_streak() {
    let breaker = breaker();
    let t0 = Instant::now();

    for i in 0..4 {
      breaker.record_failure_at(t0 + secs(i));
    }
    // Fifth failure lands outside the 30s window of the first
    breaker.record_failure_at(t0 + secs(31));

    assert!(breaker.allow_call_at(t0 + secs(32)));
  }

  #[test]
  fn test_probe_after_cooldown() {
    let breaker = breaker();
    let t0 = Instant::now();

    for i in 0..5 {
      breaker.record_failure_at(t0 + secs(i));
    }
    assert!(!breaker.allow_call_at(t0 + secs(20)));

    // Cooldown elapsed: exactly one probe is admitted
    assert!(breaker.allow_call_at(t0 + secs(35)));
    assert!(!breaker.allow_call_at(t0 + secs(35)));

    breaker.record_success();
    assert!(breaker.allow_call_at(t0 + secs(36)));
  }

  #[test]
  fn test_failed_probe_reopens() {
    let breaker = breaker();
    let t0 = Instant::now();

    for i in 0..5 {
      breaker.record_failure_at(t0 + secs(i));
    }
    assert!(breaker.allow_call_at(t0 + secs(35)));
    breaker.record_failure_at(t0 + secs(35));

    assert!(!breaker.allow_call_at(t0 + secs(60)));
    assert!(breaker.allow_call_at(t0 + secs(66)));
  }
}
