// Process Handle - live view of a spawned child
//
// Ownership: reader tasks hold an `OutputSink` (append-only), the termination
// path holds the single `TerminationWriter`. `finish` consumes the writer, so
// `running` flips true -> false at most once.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;

use tokio::sync::watch;

use super::result::Termination;
use super::signal::SignalSpec;
use crate::application::constants::DEFAULT_HANDLE_SIGNAL;
use crate::port::SignalSender;

/// Which standard stream a chunk came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

struct HandleState {
    pid: u32,
    running: AtomicBool,
    stdout: Mutex<Vec<u8>>,
    stderr: Mutex<Vec<u8>>,
    termination: OnceLock<Termination>,
}

impl HandleState {
    fn buffer(&self, stream: StreamKind) -> &Mutex<Vec<u8>> {
        match stream {
            StreamKind::Stdout => &self.stdout,
            StreamKind::Stderr => &self.stderr,
        }
    }

    fn read(&self, stream: StreamKind) -> Vec<u8> {
        self.buffer(stream)
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Live reference to a spawned child process
///
/// Cloning is cheap; every clone observes the same process.
#[derive(Clone)]
pub struct ProcessHandle {
    state: Arc<HandleState>,
    signals: Arc<dyn SignalSender>,
    terminated: watch::Receiver<bool>,
}

impl ProcessHandle {
    /// Create a handle for a freshly spawned `pid`
    ///
    /// Returns the handle, the sink for stream readers and the writer for the
    /// termination path.
    pub fn attach(
        pid: u32,
        signals: Arc<dyn SignalSender>,
    ) -> (ProcessHandle, OutputSink, TerminationWriter) {
        let state = Arc::new(HandleState {
            pid,
            running: AtomicBool::new(true),
            stdout: Mutex::new(Vec::new()),
            stderr: Mutex::new(Vec::new()),
            termination: OnceLock::new(),
        });
        let (notify, terminated) = watch::channel(false);

        let handle = ProcessHandle {
            state: Arc::clone(&state),
            signals,
            terminated,
        };
        let sink = OutputSink {
            state: Arc::clone(&state),
        };
        let writer = TerminationWriter { state, notify };
        (handle, sink, writer)
    }

    pub fn pid(&self) -> u32 {
        self.state.pid
    }

    /// `false` once the OS reported termination
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::Acquire)
    }

    /// Everything written to stdout so far (lossy UTF-8)
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.state.read(StreamKind::Stdout)).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.state.read(StreamKind::Stderr)).into_owned()
    }

    /// Final state; `None` while running
    pub fn termination(&self) -> Option<Termination> {
        self.state.termination.get().copied()
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.termination().and_then(|t| t.exit_code())
    }

    pub fn signal(&self) -> Option<i32> {
        self.termination().and_then(|t| t.signal())
    }

    /// Deliver `signal` to the child
    ///
    /// Returns `false` once the child has terminated, or when delivery fails.
    /// Signal 0 is a pure liveness probe.
    pub fn kill(&self, signal: impl Into<SignalSpec>) -> bool {
        if !self.is_running() {
            return false;
        }
        self.signals.send(i64::from(self.state.pid), &signal.into())
    }

    /// `kill` with the default signal (SIGTERM)
    pub fn terminate(&self) -> bool {
        self.kill(DEFAULT_HANDLE_SIGNAL)
    }

    /// Wait for termination
    ///
    /// Returns `None` if the termination path went away without reporting.
    pub async fn wait(&self) -> Option<Termination> {
        let mut terminated = self.terminated.clone();
        let _ = terminated.wait_for(|done| *done).await;
        self.termination()
    }

    /// Wait at most `limit`; `true` if the child terminated in time
    pub async fn wait_timeout(&self, limit: Duration) -> bool {
        tokio::time::timeout(limit, self.wait()).await.is_ok() && !self.is_running()
    }
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.pid())
            .field("running", &self.is_running())
            .field("termination", &self.termination())
            .finish()
    }
}

/// Append-only access to the handle's output buffers
#[derive(Clone)]
pub struct OutputSink {
    state: Arc<HandleState>,
}

impl OutputSink {
    pub fn append(&self, stream: StreamKind, chunk: &[u8]) {
        self.state
            .buffer(stream)
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(chunk);
    }
}

/// Single-use writer owned by the termination path
pub struct TerminationWriter {
    state: Arc<HandleState>,
    notify: watch::Sender<bool>,
}

impl TerminationWriter {
    pub fn pid(&self) -> u32 {
        self.state.pid
    }

    /// Record the final state and flip `running` to false
    pub fn finish(self, termination: Termination) {
        let _ = self.state.termination.set(termination);
        self.state.running.store(false, Ordering::Release);
        let _ = self.notify.send(true);
    }
}

/// What `spawn_async` returns
///
/// `running` is a snapshot taken when the call returned. After a wait that
/// timed out it stays `true` even once the child exits; query the live
/// `handle` (or `handle.kill(0)`) for current state.
#[derive(Debug, Clone)]
pub struct SpawnOutcome {
    pub running: bool,
    pub handle: ProcessHandle,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::signal_sender::mocks::RecordingSignalSender;

    fn attach(pid: u32) -> (ProcessHandle, OutputSink, TerminationWriter, Arc<RecordingSignalSender>) {
        let sender = Arc::new(RecordingSignalSender::new(true));
        let (handle, sink, writer) = ProcessHandle::attach(pid, sender.clone());
        (handle, sink, writer, sender)
    }

    #[test]
    fn test_new_handle_is_running() {
        let (handle, _sink, _writer, _) = attach(100);
        assert_eq!(handle.pid(), 100);
        assert!(handle.is_running());
        assert_eq!(handle.termination(), None);
        assert_eq!(handle.exit_code(), None);
    }

    #[test]
    fn test_output_accumulates_per_stream() {
        let (handle, sink, _writer, _) = attach(100);
        sink.append(StreamKind::Stdout, b"Line 1\n");
        sink.clone().append(StreamKind::Stdout, b"Line 2\n");
        sink.append(StreamKind::Stderr, b"oops");
        assert_eq!(handle.stdout(), "Line 1\nLine 2\n");
        assert_eq!(handle.stderr(), "oops");
    }

    #[test]
    fn test_kill_delegates_while_running() {
        let (handle, _sink, _writer, sender) = attach(321);
        assert!(handle.terminate());
        assert!(handle.kill("SIGKILL"));
        assert_eq!(
            sender.sent(),
            vec![
                (321, SignalSpec::from("SIGTERM")),
                (321, SignalSpec::from("SIGKILL"))
            ]
        );
    }

    #[test]
    fn test_finish_flips_running_once() {
        let (handle, _sink, writer, sender) = attach(321);
        writer.finish(Termination::Exited(3));

        assert!(!handle.is_running());
        assert_eq!(handle.exit_code(), Some(3));
        assert_eq!(handle.signal(), None);
        assert!(!handle.kill(0));
        assert!(!handle.terminate());
        assert!(sender.sent().is_empty(), "no signal after termination");
    }

    #[tokio::test]
    async fn test_wait_resolves_on_finish() {
        let (handle, _sink, writer, _) = attach(7);
        let waiter = handle.clone();
        let task = tokio::spawn(async move { waiter.wait().await });

        writer.finish(Termination::Signaled {
            signal: 9,
            name: Some("SIGKILL"),
        });

        let termination = task.await.unwrap();
        assert_eq!(termination.and_then(|t| t.signal()), Some(9));
    }

    #[test]
    fn test_wait_after_finish_returns_immediately() {
        let (handle, _sink, writer, _) = attach(8);
        writer.finish(Termination::Exited(0));
        assert_eq!(
            tokio_test::block_on(handle.wait()),
            Some(Termination::Exited(0))
        );
    }

    #[tokio::test]
    async fn test_wait_timeout_expires_while_running() {
        let (handle, _sink, _writer, _) = attach(7);
        assert!(!handle.wait_timeout(Duration::from_millis(20)).await);
        assert!(handle.is_running());
    }
}
