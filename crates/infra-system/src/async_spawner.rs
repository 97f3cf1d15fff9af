// Async process spawner
// reason: tokio::process so readers and the waiter run as tasks
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command as TokioCommand};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use hostexec_core::application::constants::{READ_CHUNK_SIZE, STREAM_DRAIN_GRACE_MS};
use hostexec_core::domain::{
    Command, OutputCallback, OutputSink, ProcessHandle, SpawnOptions, SpawnOutcome, StreamKind,
    Termination, TerminationWriter,
};
use hostexec_core::port::{ProcessSpawner, SignalSender};
use hostexec_core::{ProcessError, Result};

use crate::identity::resolve_identity;
use crate::program_runner::create_output_file;
use crate::signals::{termination_from_status, NixSignalSender};

/// Spawns children directly (no shell) under a live `ProcessHandle`
///
/// Each child gets one reader task per output stream and a waiter task that
/// owns the `Child`. Termination is reported once the child is reaped; the
/// readers get a short grace period first so output written before exit is
/// in the handle by then.
pub struct AsyncSpawner {
    signals: Arc<dyn SignalSender>,
}

impl AsyncSpawner {
    pub fn new() -> Self {
        Self::with_signal_sender(Arc::new(NixSignalSender))
    }

    pub fn with_signal_sender(signals: Arc<dyn SignalSender>) -> Self {
        Self { signals }
    }
}

impl Default for AsyncSpawner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessSpawner for AsyncSpawner {
    async fn spawn(&self, command: &Command, options: SpawnOptions) -> Result<SpawnOutcome> {
        let limit = options.validate()?;
        let argv = command.argv()?;
        let SpawnOptions {
            launch,
            wait,
            timeout,
            throw_on_timeout,
            on_stdout,
            on_stderr,
        } = options;
        let identity = resolve_identity(&launch)?;

        let stdout_file = create_output_file(launch.stdout_file.as_deref())?.map(File::from_std);
        let stderr_file = create_output_file(launch.stderr_file.as_deref())?.map(File::from_std);

        let mut os_command = TokioCommand::new(command.program());
        os_command
            .args(&argv)
            .envs(&launch.env)
            .stdin(if launch.input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &launch.cwd {
            os_command.current_dir(cwd);
        }
        if let Some(gid) = identity.gid {
            os_command.gid(gid);
        }
        if let Some(uid) = identity.uid {
            os_command.uid(uid);
        }

        let mut child = os_command.spawn().map_err(|e| {
            ProcessError::SpawnFailed(format!("{}: {}", command.display_line(), e))
        })?;
        let pid = child.id().ok_or_else(|| {
            ProcessError::SpawnFailed(format!("{}: no pid after spawn", command.program()))
        })?;

        if launch.log_command {
            info!(
                pid = %pid,
                command = %command.display_line(),
                cwd = ?launch.cwd,
                "Process spawned"
            );
        }

        let (handle, sink, writer) = ProcessHandle::attach(pid, Arc::clone(&self.signals));

        if let (Some(stdin), Some(input)) = (child.stdin.take(), launch.input) {
            tokio::spawn(feed_input(stdin, input));
        }
        let readers = [
            tokio::spawn(pump(
                child.stdout.take(),
                StreamKind::Stdout,
                sink.clone(),
                stdout_file,
                on_stdout,
            )),
            tokio::spawn(pump(
                child.stderr.take(),
                StreamKind::Stderr,
                sink,
                stderr_file,
                on_stderr,
            )),
        ];
        tokio::spawn(supervise(child, writer, readers));

        if !wait {
            return Ok(SpawnOutcome {
                running: handle.is_running(),
                handle,
            });
        }

        let finished = match limit {
            Some(limit) => handle.wait_timeout(limit).await,
            None => handle.wait().await.is_some(),
        };
        if !finished {
            let seconds = timeout.unwrap_or(f64::INFINITY);
            if throw_on_timeout {
                return Err(ProcessError::TimeoutExceeded { seconds });
            }
            debug!(pid = %pid, seconds = %seconds, "Wait timed out, process left running");
        }

        // Snapshot: not updated after a timed-out wait
        Ok(SpawnOutcome {
            running: handle.is_running(),
            handle,
        })
    }
}

async fn feed_input(mut stdin: tokio::process::ChildStdin, input: Vec<u8>) {
    if let Err(e) = stdin.write_all(&input).await {
        debug!(error = %e, "Child closed stdin before reading all input");
    }
}

async fn pump<R>(
    pipe: Option<R>,
    stream: StreamKind,
    sink: OutputSink,
    mut file: Option<File>,
    mut callback: Option<OutputCallback>,
) where
    R: AsyncRead + Unpin,
{
    let Some(mut pipe) = pipe else {
        return;
    };

    let mut chunk = vec![0u8; READ_CHUNK_SIZE];
    loop {
        let read = match pipe.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                warn!(stream = ?stream, error = %e, "Stream read failed");
                break;
            }
        };
        let bytes = &chunk[..read];
        sink.append(stream, bytes);

        let failed = match file.as_mut() {
            Some(f) => f.write_all(bytes).await.err(),
            None => None,
        };
        if let Some(e) = failed {
            warn!(stream = ?stream, error = %e, "Write-through file failed, disabling it");
            file = None;
        }

        if let Some(callback) = callback.as_mut() {
            callback(bytes);
        }
    }

    if let Some(mut f) = file {
        if let Err(e) = f.flush().await {
            warn!(stream = ?stream, error = %e, "Failed to flush write-through file");
        }
    }
    debug!(stream = ?stream, "Stream closed");
}

/// Sole owner of the `TerminationWriter`
async fn supervise(
    mut child: Child,
    writer: TerminationWriter,
    mut readers: [JoinHandle<()>; 2],
) {
    let status = child.wait().await;

    let grace = Duration::from_millis(STREAM_DRAIN_GRACE_MS);
    let drained = tokio::time::timeout(grace, async {
        for reader in readers.iter_mut() {
            if let Err(e) = reader.await {
                warn!(pid = %writer.pid(), error = %e, "Stream reader task failed");
            }
        }
    })
    .await;
    if drained.is_err() {
        debug!(pid = %writer.pid(), "Streams still open after exit, draining in background");
    }

    let termination = match status {
        Ok(status) => termination_from_status(status),
        Err(e) => {
            warn!(pid = %writer.pid(), error = %e, "Failed to wait for child");
            Termination::Exited(-1)
        }
    };
    info!(pid = %writer.pid(), termination = %termination, "Process terminated");
    writer.finish(termination);
}
