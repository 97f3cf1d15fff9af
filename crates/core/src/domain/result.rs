// Execution results and failure classification

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::application::constants::SIGNAL_EXIT_CODE_BASE;
use crate::error::{ProcessError, Result};

/// How a child ended: an exit code XOR a terminating signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Exited(i32),
    Signaled {
        signal: i32,
        name: Option<&'static str>,
    },
}

impl Termination {
    pub fn success(&self) -> bool {
        matches!(self, Termination::Exited(0))
    }

    /// Shell-convention code: the exit code, or `128 + signal`
    pub fn code(&self) -> i32 {
        match self {
            Termination::Exited(code) => *code,
            Termination::Signaled { signal, .. } => SIGNAL_EXIT_CODE_BASE + signal,
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Termination::Exited(code) => Some(*code),
            Termination::Signaled { .. } => None,
        }
    }

    pub fn signal(&self) -> Option<i32> {
        match self {
            Termination::Exited(_) => None,
            Termination::Signaled { signal, .. } => Some(*signal),
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Exited(code) => write!(f, "exit code {}", code),
            Termination::Signaled {
                name: Some(name), ..
            } => write!(f, "signal {}", name),
            Termination::Signaled { signal, name: None } => write!(f, "signal {}", signal),
        }
    }
}

/// Captured output of a completed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub termination: Termination,
}

/// `{stdout, stderr, code}` as returned when std streams are retrieved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedStreams {
    pub stdout: String,
    pub stderr: String,
    pub code: i32,
}

/// What a blocking run hands back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutput {
    /// Successful run, plain stdout
    Stdout(String),
    /// Streams retrieved, whatever the outcome
    Streams(CapturedStreams),
}

impl RunOutput {
    pub fn stdout(&self) -> &str {
        match self {
            RunOutput::Stdout(stdout) => stdout,
            RunOutput::Streams(streams) => &streams.stdout,
        }
    }

    pub fn into_stdout(self) -> String {
        match self {
            RunOutput::Stdout(stdout) => stdout,
            RunOutput::Streams(streams) => streams.stdout,
        }
    }

    pub fn streams(&self) -> Option<&CapturedStreams> {
        match self {
            RunOutput::Stdout(_) => None,
            RunOutput::Streams(streams) => Some(streams),
        }
    }
}

impl ExecutionResult {
    /// Message used when the run is treated as an error: trimmed stderr, or a
    /// generic line naming the exit code or signal
    pub fn failure_message(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        match self.termination {
            Termination::Exited(code) => format!("Program exited with exit code {}", code),
            other => format!("Program was terminated by {}", other),
        }
    }

    /// Apply the failure contract
    ///
    /// - `retrieve_std_streams`: never fails, returns the captured streams
    /// - otherwise: stdout on success, `ExecutionFailure` on anything else
    pub fn into_run_output(self, retrieve_std_streams: bool) -> Result<RunOutput> {
        if retrieve_std_streams {
            return Ok(RunOutput::Streams(CapturedStreams {
                code: self.termination.code(),
                stdout: self.stdout,
                stderr: self.stderr,
            }));
        }
        if self.termination.success() {
            return Ok(RunOutput::Stdout(self.stdout));
        }
        Err(ProcessError::ExecutionFailure {
            message: self.failure_message(),
            code: self.termination.code(),
        })
    }
}
