//! Bounded polling with exponential backoff.
//!
//! The delay source is a [`Sleeper`] so callers (and tests) decide how time
//! passes.

use async_trait::async_trait;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// How long to wait for a write to become visible to readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurabilityPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl DurabilityPolicy {
    /// `max_attempts` is clamped to at least one.
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
        }
    }

    /// Delay before the given 1-based attempt: none before the first,
    /// `initial_delay * 2^(attempt - 2)` before every later one.
    pub fn delay_before(&self, attempt: u32) -> Option<Duration> {
        if attempt < 2 {
            return None;
        }
        let factor = 1u32.checked_shl(attempt - 2).unwrap_or(u32::MAX);
        Some(self.initial_delay.saturating_mul(factor))
    }

    /// Sum of all delays when every attempt fails.
    pub fn total_delay(&self) -> Duration {
        (2..=self.max_attempts)
            .filter_map(|attempt| self.delay_before(attempt))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}

impl Default for DurabilityPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(50))
    }
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    Found { value: T, attempts: u32 },
    Exhausted { attempts: u32, last_error: Option<E> },
}

/// Run `probe` until it yields `Some`, at most `policy.max_attempts` times.
///
/// A probe error counts as a failed attempt; the last one is returned on
/// exhaustion.
pub async fn retry_until_found<T, E, F, Fut>(
    policy: &DurabilityPolicy,
    sleeper: &dyn Sleeper,
    mut probe: F,
) -> RetryOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
    E: Display,
{
    let mut last_error = None;

    for attempt in 1..=policy.max_attempts {
        if let Some(delay) = policy.delay_before(attempt) {
            sleeper.sleep(delay).await;
        }

        match probe(attempt).await {
            Ok(Some(value)) => {
                return RetryOutcome::Found {
                    value,
                    attempts: attempt,
                };
            }
            Ok(None) => {
                tracing::warn!(
                    "Probe found nothing (attempt {}/{})",
                    attempt,
                    policy.max_attempts
                );
            }
            Err(e) => {
                tracing::error!(
                    "Probe failed (attempt {}/{}): {}",
                    attempt,
                    policy.max_attempts,
                    e
                );
                last_error = Some(e);
            }
        }
    }

    RetryOutcome::Exhausted {
        attempts: policy.max_attempts,
        last_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordingSleeper;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_default_schedule() {
        let policy = DurabilityPolicy::default();
        assert_eq!(policy.delay_before(1), None);
        assert_eq!(policy.delay_before(2), Some(ms(50)));
        assert_eq!(policy.delay_before(3), Some(ms(100)));
        assert_eq!(policy.delay_before(4), Some(ms(200)));
        assert_eq!(policy.delay_before(5), Some(ms(400)));
        assert_eq!(policy.total_delay(), ms(750));
    }

    #[test]
    fn test_zero_attempts_clamped() {
        let policy = DurabilityPolicy::new(0, ms(10));
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.total_delay(), Duration::ZERO);
    }

    #[test]
    fn test_delay_saturates() {
        let policy = DurabilityPolicy::new(u32::MAX, ms(50));
        assert!(policy.delay_before(200).is_some());
    }

    #[tokio::test]
    async fn test_found_on_first_attempt_does_not_sleep() {
        let sleeper = RecordingSleeper::default();
        let outcome: RetryOutcome<&str, String> =
            retry_until_found(&DurabilityPolicy::default(), &sleeper, |_| async {
                Ok(Some("record"))
            })
            .await;

        assert!(matches!(
            outcome,
            RetryOutcome::Found {
                value: "record",
                attempts: 1
            }
        ));
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_found_on_fifth_attempt() {
        let sleeper = RecordingSleeper::default();
        let outcome: RetryOutcome<u32, String> =
            retry_until_found(&DurabilityPolicy::default(), &sleeper, |attempt| async move {
                Ok((attempt == 5).then_some(attempt))
            })
            .await;

        assert!(matches!(
            outcome,
            RetryOutcome::Found {
                value: 5,
                attempts: 5
            }
        ));
        assert_eq!(sleeper.delays(), vec![ms(50), ms(100), ms(200), ms(400)]);
        assert_eq!(sleeper.total(), ms(750));
    }

    #[tokio::test]
    async fn test_exhausted_after_exactly_max_attempts() {
        let sleeper = RecordingSleeper::default();
        let calls = AtomicU32::new(0);

        let outcome: RetryOutcome<(), String> =
            retry_until_found(&DurabilityPolicy::default(), &sleeper, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(None) }
            })
            .await;

        assert!(matches!(
            outcome,
            RetryOutcome::Exhausted {
                attempts: 5,
                last_error: None
            }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(sleeper.delays().len(), 4);
    }

    #[tokio::test]
    async fn test_errors_count_as_failed_attempts() {
        let sleeper = RecordingSleeper::default();
        let outcome: RetryOutcome<u32, String> =
            retry_until_found(&DurabilityPolicy::default(), &sleeper, |attempt| async move {
                if attempt < 3 {
                    Err(format!("connection reset on attempt {attempt}"))
                } else {
                    Ok(Some(attempt))
                }
            })
            .await;

        assert!(matches!(
            outcome,
            RetryOutcome::Found {
                value: 3,
                attempts: 3
            }
        ));
    }

    #[tokio::test]
    async fn test_exhausted_keeps_last_error() {
        let sleeper = RecordingSleeper::default();
        let outcome: RetryOutcome<(), String> = retry_until_found(
            &DurabilityPolicy::new(2, ms(1)),
            &sleeper,
            |attempt| async move { Err(format!("error {attempt}")) },
        )
        .await;

        match outcome {
            RetryOutcome::Exhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 2);
                assert_eq!(last_error.as_deref(), Some("error 2"));
            }
            other => panic!("Expected exhaustion, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_sleeper_waits_full_schedule() {
        let start = tokio::time::Instant::now();
        let outcome: RetryOutcome<(), String> =
            retry_until_found(&DurabilityPolicy::default(), &TokioSleeper, |_| async {
                Ok(None)
            })
            .await;

        assert!(matches!(outcome, RetryOutcome::Exhausted { attempts: 5, .. }));
        assert!(start.elapsed() >= ms(750));
    }
}
