// Command Runner Port
// Blocking execution of a command to completion

use crate::domain::{Command, ExecutionOptions, RunOutput};
use crate::error::Result;

/// Runs a command to completion and applies the failure contract
///
/// Implementations:
/// - ProgramRunner (infra-system): `sh -c` with captured pipes
pub trait CommandRunner: Send + Sync {
    /// Run `command`, blocking the calling thread until it terminates
    ///
    /// # Errors
    /// - ProcessError::Validation for malformed options
    /// - ProcessError::SpawnFailed if the child cannot be created
    /// - ProcessError::ExecutionFailure on non-zero exit or signal, unless
    ///   `retrieve_std_streams` is set
    fn run(&self, command: &Command, options: &ExecutionOptions) -> Result<RunOutput>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::ExecutionResult;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Replays scripted results in order and records each command line
    pub struct ScriptedCommandRunner {
        results: Arc<Mutex<VecDeque<ExecutionResult>>>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedCommandRunner {
        pub fn new(results: Vec<ExecutionResult>) -> Self {
            Self {
                results: Arc::new(Mutex::new(results.into())),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CommandRunner for ScriptedCommandRunner {
        fn run(&self, command: &Command, options: &ExecutionOptions) -> Result<RunOutput> {
            options.validate()?;
            self.calls.lock().unwrap().push(command.display_line());
            let result = self
                .results
                .lock()
                .unwrap()
                .pop_front()
                .expect("ScriptedCommandRunner ran out of results");
            result.into_run_output(options.retrieve_std_streams)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::ScriptedCommandRunner;
    use super::*;
    use crate::domain::{ExecutionResult, Termination};

    #[test]
    fn test_scripted_runner_applies_failure_contract() {
        let runner = ScriptedCommandRunner::new(vec![
            ExecutionResult {
                stdout: "user : wheel staff\n".into(),
                stderr: String::new(),
                termination: Termination::Exited(0),
            },
            ExecutionResult {
                stdout: String::new(),
                stderr: "groups: nobody2: no such user\n".into(),
                termination: Termination::Exited(1),
            },
        ]);

        let output = runner
            .run(&Command::with_args("groups", ["user"]), &ExecutionOptions::new())
            .unwrap();
        assert_eq!(output.stdout(), "user : wheel staff\n");

        let err = runner
            .run(&Command::with_args("groups", ["nobody2"]), &ExecutionOptions::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "groups: nobody2: no such user");
        assert_eq!(runner.calls(), vec!["groups user", "groups nobody2"]);
    }
}
