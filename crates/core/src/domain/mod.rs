// Domain Layer - commands, options, results, handles and process records

pub mod command;
pub mod error;
pub mod handle;
pub mod options;
pub mod process;
pub mod result;
pub mod signal;

// Re-exports
pub use command::{Args, Command};
pub use error::DomainError;
pub use handle::{OutputSink, ProcessHandle, SpawnOutcome, StreamKind, TerminationWriter};
pub use options::{
    ExecutionOptions, GroupSpec, LaunchOptions, OutputCallback, PollOptions, SpawnOptions,
    UserSpec,
};
pub use process::{FieldMatch, Filterer, ProcessRecord, PsResult};
pub use result::{CapturedStreams, ExecutionResult, RunOutput, Termination};
pub use signal::SignalSpec;
