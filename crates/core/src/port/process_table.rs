// Process table port
// One fresh, uncached query per call

use crate::domain::ProcessRecord;
use crate::error::Result;

/// Read access to the host process table
pub trait ProcessTable: Send + Sync {
    /// Snapshot every process currently listed
    ///
    /// # Errors
    /// - ProcessError::QueryFailed if the table cannot be read; callers must
    ///   not mistake a failed query for an empty table
    fn snapshot(&self) -> Result<Vec<ProcessRecord>>;

    /// Whether `pid` is listed (terminated-but-unreaped processes included)
    fn contains(&self, pid: u32) -> Result<bool>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::ProcessError;
    use std::sync::{Arc, Mutex};

    /// In-memory process table
    pub struct StaticProcessTable {
        records: Arc<Mutex<Vec<ProcessRecord>>>,
        failure: Arc<Mutex<Option<String>>>,
        queries: Arc<Mutex<usize>>,
    }

    impl StaticProcessTable {
        pub fn new(records: Vec<ProcessRecord>) -> Self {
            Self {
                records: Arc::new(Mutex::new(records)),
                failure: Arc::new(Mutex::new(None)),
                queries: Arc::new(Mutex::new(0)),
            }
        }

        /// Make every subsequent query fail with `message`
        pub fn fail_with(&self, message: impl Into<String>) {
            *self.failure.lock().unwrap() = Some(message.into());
        }

        pub fn set_records(&self, records: Vec<ProcessRecord>) {
            *self.records.lock().unwrap() = records;
        }

        pub fn query_count(&self) -> usize {
            *self.queries.lock().unwrap()
        }

        fn check(&self) -> Result<()> {
            *self.queries.lock().unwrap() += 1;
            match self.failure.lock().unwrap().clone() {
                Some(message) => Err(ProcessError::QueryFailed(message)),
                None => Ok(()),
            }
        }
    }

    impl ProcessTable for StaticProcessTable {
        fn snapshot(&self) -> Result<Vec<ProcessRecord>> {
            self.check()?;
            Ok(self.records.lock().unwrap().clone())
        }

        fn contains(&self, pid: u32) -> Result<bool> {
            self.check()?;
            Ok(self.records.lock().unwrap().iter().any(|r| r.pid == pid))
        }
    }
}
