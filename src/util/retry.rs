use std::{thread, time::Duration};

use tracing::warn;

/// Bounded exponential backoff for transient storage failures.
#[derive(Clone, Copy, Debug)]
pub struct Backoff {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

pub const STORAGE_BACKOFF: Backoff = Backoff {
    max_attempts: 4,
    initial_delay: Duration::from_millis(100),
    max_delay: Duration::from_secs(2),
};

impl Backoff {
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// Runs `op` until it succeeds, fails permanently, or runs out of attempts.
pub fn retry<T, E, F, P>(backoff: &Backoff, operation: &str, mut op: F, is_transient: P) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if attempt < backoff.max_attempts && is_transient(&err) => {
                let delay = backoff.delay(attempt);
                warn!(
                    error_message = %err,
                    error_group = operation,
                    attempt = attempt,
                    delay_ms = delay.as_millis() as u64,
                    "transient failure, retrying"
                );
                thread::sleep(delay);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: Backoff = Backoff {
        max_attempts: 3,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(2),
    };

    #[test]
    fn test_delay() {
        let cases = vec![
            (1, Duration::from_millis(100)),
            (2, Duration::from_millis(200)),
            (3, Duration::from_millis(400)),
            (10, Duration::from_secs(2)),
        ];

        for (attempt, expected) in cases {
            assert_eq!(
                STORAGE_BACKOFF.delay(attempt),
                expected,
                "failed for case: {}",
                attempt
            );
        }
    }

    #[test]
    fn test_retry_transient_then_success() {
        let mut calls = 0;
        let result: Result<u32, String> = retry(
            &FAST,
            "test",
            || {
                calls += 1;
                if calls < 3 {
                    Err("busy".to_string())
                } else {
                    Ok(calls)
                }
            },
            |_| true,
        );

        assert_eq!(result, Ok(3));
    }

    #[test]
    fn test_retry_gives_up() {
        let mut calls = 0;
        let result: Result<(), String> = retry(
            &FAST,
            "test",
            || {
                calls += 1;
                Err("busy".to_string())
            },
            |_| true,
        );

        assert!(result.is_err());
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_retry_permanent_error() {
        let mut calls = 0;
        let result: Result<(), String> = retry(
            &FAST,
            "test",
            || {
                calls += 1;
                Err("denied".to_string())
            },
            |err| err != "denied",
        );

        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
