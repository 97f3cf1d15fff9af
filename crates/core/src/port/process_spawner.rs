// Process Spawner Port
// Non-blocking process creation returning a live handle

use async_trait::async_trait;

use crate::domain::{Command, SpawnOptions, SpawnOutcome};
use crate::error::Result;

/// Spawns long-lived children
///
/// Implementations:
/// - AsyncSpawner (infra-system): tokio::process with per-stream reader tasks
#[async_trait]
pub trait ProcessSpawner: Send + Sync {
    /// Spawn `command` and return its handle
    ///
    /// With `options.wait` the call resolves once the child terminates or the
    /// timeout elapses; otherwise it resolves as soon as the child exists.
    ///
    /// # Errors
    /// - ProcessError::Validation for malformed options
    /// - ProcessError::SpawnFailed if the child cannot be created
    /// - ProcessError::TimeoutExceeded if the wait timed out and
    ///   `throw_on_timeout` was set
    async fn spawn(&self, command: &Command, options: SpawnOptions) -> Result<SpawnOutcome>;
}
