// Hostexec Infrastructure - OS Adapters
// Implements: CommandRunner, ProcessSpawner, SignalSender, ProcessTable
//
// The free functions below are the library's entry points; they wire the
// default adapters so callers do not have to.

#[cfg(not(unix))]
compile_error!("hostexec-infra-system supports Unix hosts only");

pub mod async_spawner;
pub mod identity;
pub mod path_lookup;
pub mod process_table;
pub mod program_runner;
pub mod signals;

use std::sync::Arc;

use hostexec_core::application::constants::DEFAULT_KILL_SIGNAL;
use hostexec_core::application::ProcessInspector;
use hostexec_core::domain::{
    Command, ExecutionOptions, Filterer, PsResult, RunOutput, SignalSpec, SpawnOptions,
    SpawnOutcome,
};
use hostexec_core::port::{CommandRunner, ProcessSpawner};
use hostexec_core::Result;

pub use async_spawner::AsyncSpawner;
pub use hostexec_core::application::retry_while;
pub use identity::running_as_root;
pub use path_lookup::{find_in_path, is_in_path};
pub use process_table::SysinfoProcessTable;
pub use program_runner::ProgramRunner;
pub use signals::{kill, signal_name, signal_number, NixSignalSender};

/// Run `command` to completion through `/bin/sh -c`
///
/// # Example
/// ```no_run
/// use hostexec_core::domain::{Command, ExecutionOptions};
/// use hostexec_infra_system::run_program;
///
/// let out = run_program(&Command::with_args("echo", ["foo"]), &ExecutionOptions::new())?;
/// assert_eq!(out.stdout(), "foo\n");
/// # Ok::<(), hostexec_core::ProcessError>(())
/// ```
pub fn run_program(command: &Command, options: &ExecutionOptions) -> Result<RunOutput> {
    ProgramRunner::new().run(command, options)
}

/// Spawn `command` under a live handle (requires a tokio runtime)
pub async fn spawn_async(command: &Command, options: SpawnOptions) -> Result<SpawnOutcome> {
    AsyncSpawner::new().spawn(command, options).await
}

/// `kill(pid, SIGINT)`
pub fn interrupt(pid: i64) -> bool {
    kill(pid, SignalSpec::from(DEFAULT_KILL_SIGNAL))
}

/// Query the host process table
pub fn ps(filter: impl Into<Filterer>) -> Result<PsResult> {
    inspector().ps(filter.into())
}

/// Query with a loosely-typed filterer (`null`, a pid, or a field object)
pub fn ps_value(filter: serde_json::Value) -> Result<PsResult> {
    inspector().ps(Filterer::from_value(filter)?)
}

/// Whether `pid` is listed in the process table
pub fn pid_find(pid: u32) -> Result<bool> {
    inspector().pid_find(pid)
}

fn inspector() -> ProcessInspector {
    ProcessInspector::new(Arc::new(SysinfoProcessTable::new()))
}
