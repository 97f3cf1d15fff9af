// Time Provider Port (for testability)

use std::time::{Duration, Instant};

/// Monotonic clock plus a blocking sleep (allows mocking in tests)
pub trait TimeProvider: Send + Sync {
    /// Current monotonic instant
    fn now(&self) -> Instant;

    /// Block the calling thread for `duration`
    fn sleep(&self, duration: Duration);
}

/// System time provider (production)
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Clock that only advances when slept on
    pub struct ManualTimeProvider {
        origin: Instant,
        offset: Arc<Mutex<Duration>>,
        sleeps: Arc<Mutex<Vec<Duration>>>,
    }

    impl ManualTimeProvider {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
                offset: Arc::new(Mutex::new(Duration::ZERO)),
                sleeps: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn advance(&self, duration: Duration) {
            *self.offset.lock().unwrap() += duration;
        }

        pub fn elapsed(&self) -> Duration {
            *self.offset.lock().unwrap()
        }

        pub fn sleeps(&self) -> Vec<Duration> {
            self.sleeps.lock().unwrap().clone()
        }
    }

    impl Default for ManualTimeProvider {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TimeProvider for ManualTimeProvider {
        fn now(&self) -> Instant {
            self.origin + *self.offset.lock().unwrap()
        }

        fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
            self.advance(duration);
        }
    }
}
