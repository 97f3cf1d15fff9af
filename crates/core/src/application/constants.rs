// Execution constants (no magic values)

/// Default sleep between poll-loop checks (seconds)
pub const DEFAULT_POLL_STEP_SECS: f64 = 0.5;

/// Default poll-loop timeout (seconds)
pub const DEFAULT_POLL_TIMEOUT_SECS: f64 = 30.0;

/// Signal used by the free-standing `kill` when none is given
pub const DEFAULT_KILL_SIGNAL: &str = "SIGINT";

/// Signal used by `ProcessHandle::terminate`
pub const DEFAULT_HANDLE_SIGNAL: &str = "SIGTERM";

/// Shell used by the blocking runner
pub const SHELL_PATH: &str = "/bin/sh";

/// Read buffer size for stdout/stderr pumps (64 KiB)
pub const READ_CHUNK_SIZE: usize = 64 * 1024;

/// How long the waiter lets readers drain after the child exits (ms)
///
/// Readers still blocked after this (pipes inherited by a grandchild) keep
/// appending to the handle in the background.
pub const STREAM_DRAIN_GRACE_MS: u64 = 200;

/// Exit code base for signaled children (POSIX shell convention)
pub const SIGNAL_EXIT_CODE_BASE: i32 = 128;
