// Signal Sender Port
// Abstraction over OS signal delivery, used by ProcessHandle::kill

use crate::domain::SignalSpec;

/// Delivers signals to processes
///
/// Implementations never fail loudly: a missing process, a permission error
/// or an unknown signal all become `false`.
pub trait SignalSender: Send + Sync {
    /// Deliver `signal` to `pid`
    ///
    /// # Arguments
    /// * `pid` - Target process; values outside `0..=i32::MAX` return `false`
    /// * `signal` - Number or name; 0 probes liveness without delivering
    fn send(&self, pid: i64, signal: &SignalSpec) -> bool;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every delivery and answers with a fixed result
    pub struct RecordingSignalSender {
        outcome: bool,
        sent: Arc<Mutex<Vec<(i64, SignalSpec)>>>,
    }

    impl RecordingSignalSender {
        pub fn new(outcome: bool) -> Self {
            Self {
                outcome,
                sent: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn sent(&self) -> Vec<(i64, SignalSpec)> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl SignalSender for RecordingSignalSender {
        fn send(&self, pid: i64, signal: &SignalSpec) -> bool {
            self.sent.lock().unwrap().push((pid, signal.clone()));
            self.outcome
        }
    }
}
