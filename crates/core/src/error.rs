// Central Error Type for process execution

use thiserror::Error;

/// Error type shared by every execution entry point
#[derive(Error, Debug)]
pub enum ProcessError {
    /// Malformed options or filterers. Raised before any side effect.
    #[error("Validation error: {0}")]
    Validation(#[from] crate::domain::DomainError),

    /// Non-zero exit or signaled termination from a blocking run
    #[error("{message}")]
    ExecutionFailure { message: String, code: i32 },

    /// Only raised when the caller opted into `throw_on_timeout`
    #[error("Exceeded timeout of {seconds} seconds")]
    TimeoutExceeded { seconds: f64 },

    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("User lookup failed: {0}")]
    UserLookup(String),

    /// The process table could not be read. Never reported as "no processes".
    #[error("Process table query failed: {0}")]
    QueryFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProcessError {
    /// Exit code carried by an execution failure
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ProcessError::ExecutionFailure { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Result type alias using ProcessError
pub type Result<T> = std::result::Result<T, ProcessError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;

    #[test]
    fn test_execution_failure_displays_bare_message() {
        let err = ProcessError::ExecutionFailure {
            message: "Program exited with exit code 2".to_string(),
            code: 2,
        };
        assert_eq!(err.to_string(), "Program exited with exit code 2");
        assert_eq!(err.exit_code(), Some(2));
    }

    #[test]
    fn test_domain_error_converts_to_validation() {
        let err: ProcessError = DomainError::InvalidOption("step must be positive".into()).into();
        assert!(matches!(err, ProcessError::Validation(_)));
        assert!(err.to_string().contains("step must be positive"));
        assert_eq!(err.exit_code(), None);
    }
}
