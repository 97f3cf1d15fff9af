// Poll loop - bounded "retry while the predicate holds"
use crate::domain::PollOptions;
use crate::error::Result;
use crate::port::time_provider::SystemTimeProvider;
use crate::port::TimeProvider;
use std::sync::Arc;
use tracing::debug;

/// Blocking poll loop
///
/// Sleeps the calling thread between checks. Meant for sequential scripting
/// ("wait for a port", "wait for a pid to go away"), not for high-throughput
/// orchestration.
pub struct PollLoop {
    time_provider: Arc<dyn TimeProvider>,
}

impl PollLoop {
    /// Create a poll loop on top of a time provider
    ///
    /// # Example
    /// ```text
    /// let poll = PollLoop::new(Arc::new(SystemTimeProvider));
    /// ```
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self { time_provider }
    }

    /// Poll loop on the real clock
    pub fn system() -> Self {
        Self::new(Arc::new(SystemTimeProvider))
    }

    /// Keep calling `predicate` while it returns `true`
    ///
    /// Returns:
    /// - `Ok(true)` as soon as `predicate` returns `false` (condition reached)
    /// - `Ok(false)` if it still returned `true` once `timeout` elapsed
    ///
    /// Options are validated before the first call.
    ///
    /// # Example
    /// ```
    /// use hostexec_core::application::PollLoop;
    /// use hostexec_core::domain::PollOptions;
    ///
    /// let poll = PollLoop::system();
    /// assert!(poll.retry_while(|| false, &PollOptions::default()).unwrap());
    /// ```
    pub fn retry_while<F>(&self, mut predicate: F, options: &PollOptions) -> Result<bool>
    where
        F: FnMut() -> bool,
    {
        let (step, timeout) = options.validate()?;
        let started = self.time_provider.now();
        let mut checks: u64 = 0;

        loop {
            checks += 1;
            if !predicate() {
                debug!(checks = %checks, "Poll condition reached");
                return Ok(true);
            }

            let elapsed = self.time_provider.now().duration_since(started);
            let pause = match timeout {
                Some(limit) if elapsed >= limit => {
                    debug!(
                        checks = %checks,
                        elapsed_ms = %elapsed.as_millis(),
                        "Poll timed out"
                    );
                    return Ok(false);
                }
                Some(limit) => step.min(limit - elapsed),
                None => step,
            };
            self.time_provider.sleep(pause);
        }
    }
}

/// [`PollLoop::retry_while`] on the real clock
pub fn retry_while<F>(predicate: F, options: &PollOptions) -> Result<bool>
where
    F: FnMut() -> bool,
{
    PollLoop::system().retry_while(predicate, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::time_provider::mocks::ManualTimeProvider;
    use std::time::Duration;

    fn manual() -> (PollLoop, Arc<ManualTimeProvider>) {
        let clock = Arc::new(ManualTimeProvider::new());
        (PollLoop::new(clock.clone()), clock)
    }

    #[test]
    fn test_returns_true_on_first_check() {
        let (poll, clock) = manual();
        let mut calls = 0;
        let reached = poll
            .retry_while(
                || {
                    calls += 1;
                    false
                },
                &PollOptions::default(),
            )
            .unwrap();

        assert!(reached);
        assert_eq!(calls, 1);
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn test_times_out_while_predicate_holds() {
        let (poll, clock) = manual();
        let reached = poll
            .retry_while(|| true, &PollOptions::new(0.1, 0.3))
            .unwrap();

        assert!(!reached);
        assert_eq!(clock.elapsed(), Duration::from_millis(300));
        assert_eq!(clock.sleeps().len(), 3);
    }

    #[test]
    fn test_last_sleep_is_clamped_to_deadline() {
        let (poll, clock) = manual();
        let reached = poll
            .retry_while(|| true, &PollOptions::new(0.2, 0.5))
            .unwrap();

        assert!(!reached);
        assert_eq!(
            clock.sleeps(),
            vec![
                Duration::from_millis(200),
                Duration::from_millis(200),
                Duration::from_millis(100)
            ]
        );
    }

    #[test]
    fn test_condition_reached_before_timeout() {
        let (poll, _clock) = manual();
        let mut remaining = 4;
        let reached = poll
            .retry_while(
                || {
                    remaining -= 1;
                    remaining > 0
                },
                &PollOptions::new(0.1, 3.0),
            )
            .unwrap();
        assert!(reached);
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_infinite_timeout_keeps_polling() {
        let (poll, clock) = manual();
        let mut calls = 0;
        let reached = poll
            .retry_while(
                || {
                    calls += 1;
                    calls < 1000
                },
                &PollOptions::new(1.0, f64::INFINITY),
            )
            .unwrap();
        assert!(reached);
        assert_eq!(clock.elapsed(), Duration::from_secs(999));
    }

    #[test]
    fn test_invalid_step_rejected_before_looping() {
        let (poll, _clock) = manual();
        let mut called = false;
        let result = poll.retry_while(
            || {
                called = true;
                false
            },
            &PollOptions::new(f64::INFINITY, 1.0),
        );
        assert!(result.is_err());
        assert!(!called);
    }

    #[test]
    fn test_real_clock_timeout() {
        let started = std::time::Instant::now();
        let reached = retry_while(|| true, &PollOptions::new(0.1, 0.3)).unwrap();
        let elapsed = started.elapsed();

        assert!(!reached);
        assert!(elapsed >= Duration::from_millis(300));
        assert!(elapsed < Duration::from_secs(2));
    }
}
