// Process table adapter
// reason: sysinfo for a portable process listing
use sysinfo::{Pid, Process, ProcessRefreshKind, System, ThreadKind, Users, IS_SUPPORTED_SYSTEM};
use tracing::debug;

use hostexec_core::domain::ProcessRecord;
use hostexec_core::port::ProcessTable;
use hostexec_core::{ProcessError, Result};

/// Process table read through sysinfo
///
/// Every query builds a fresh `System`, so nothing survives between calls.
#[derive(Debug, Default)]
pub struct SysinfoProcessTable;

impl SysinfoProcessTable {
    pub fn new() -> Self {
        Self
    }

    fn ensure_supported() -> Result<()> {
        if IS_SUPPORTED_SYSTEM {
            Ok(())
        } else {
            Err(ProcessError::QueryFailed(
                "process listing is not supported on this platform".to_string(),
            ))
        }
    }
}

impl ProcessTable for SysinfoProcessTable {
    fn snapshot(&self) -> Result<Vec<ProcessRecord>> {
        Self::ensure_supported()?;

        let mut system = System::new();
        system.refresh_processes_specifics(ProcessRefreshKind::everything());
        let users = Users::new_with_refreshed_list();

        let mut records: Vec<ProcessRecord> = system
            .processes()
            .values()
            .filter(|process| !is_thread(process))
            .map(|process| to_record(process, &users))
            .collect();

        // We are running ourselves, so an empty listing means the read failed
        if records.is_empty() {
            return Err(ProcessError::QueryFailed(
                "process table came back empty".to_string(),
            ));
        }

        records.sort_by_key(|r| r.pid);
        debug!(count = %records.len(), "Process table snapshot taken");
        Ok(records)
    }

    fn contains(&self, pid: u32) -> Result<bool> {
        Self::ensure_supported()?;

        // A single-pid refresh would also accept a thread id, so list everything
        let mut system = System::new();
        system.refresh_processes_specifics(ProcessRefreshKind::new());
        Ok(system
            .process(Pid::from_u32(pid))
            .is_some_and(|process| !is_thread(process)))
    }
}

/// Linux lists every task of a process next to it; only the leader is a process
fn is_thread(process: &Process) -> bool {
    process.thread_kind() == Some(ThreadKind::Userland)
}

fn to_record(process: &Process, users: &Users) -> ProcessRecord {
    let cmd = process.name().to_string();
    let full_cmd = if process.cmd().is_empty() {
        cmd.clone()
    } else {
        process.cmd().join(" ")
    };
    let user = process
        .user_id()
        .map(|uid| {
            users
                .get_user_by_id(uid)
                .map(|u| u.name().to_string())
                .unwrap_or_else(|| (**uid).to_string())
        })
        .unwrap_or_default();

    ProcessRecord {
        pid: process.pid().as_u32(),
        user,
        cmd,
        full_cmd,
    }
}
