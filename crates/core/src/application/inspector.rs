// Process inspector - filtered process-table queries
use crate::domain::{Filterer, ProcessRecord, PsResult};
use crate::error::Result;
use crate::port::ProcessTable;
use std::sync::Arc;
use tracing::debug;

/// Answers `ps` and `pid_find` on top of a process table
///
/// Every call performs one full, fresh query. Nothing is cached between
/// calls, and query failures are propagated as-is.
pub struct ProcessInspector {
    table: Arc<dyn ProcessTable>,
}

impl ProcessInspector {
    pub fn new(table: Arc<dyn ProcessTable>) -> Self {
        Self { table }
    }

    /// Query the process table
    ///
    /// - `Filterer::All` → every record
    /// - `Filterer::ByPid` → `PsResult::Single` with the record or `None`
    /// - `Filterer::ByFields` / `Filterer::ByPredicate` → matching records
    pub fn ps(&self, filter: Filterer) -> Result<PsResult> {
        let records = self.table.snapshot()?;
        let total = records.len();

        let result = match filter {
            Filterer::All => PsResult::Many(records),
            Filterer::ByPid(pid) => PsResult::Single(records.into_iter().find(|r| r.pid == pid)),
            Filterer::ByFields(fields) => PsResult::Many(keep(records, |r| fields.matches(r))),
            Filterer::ByPredicate(predicate) => PsResult::Many(keep(records, |r| predicate(r))),
        };

        debug!(total = %total, matched = %result.len(), "Process table queried");
        Ok(result)
    }

    /// Whether `pid` currently appears in the process table
    ///
    /// Distinct from a `kill(pid, 0)` probe: a zombie is still listed here
    /// even though it can no longer be signaled meaningfully.
    pub fn pid_find(&self, pid: u32) -> Result<bool> {
        self.table.contains(pid)
    }
}

fn keep(records: Vec<ProcessRecord>, predicate: impl Fn(&ProcessRecord) -> bool) -> Vec<ProcessRecord> {
    records.into_iter().filter(|r| predicate(r)).collect()
}
