// Signal translation and delivery
// reason: nix for typed POSIX signals instead of raw libc calls
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use tracing::debug;

use hostexec_core::domain::{SignalSpec, Termination};
use hostexec_core::port::SignalSender;

/// Signals `kill` knows by name, numbered by the host platform
///
/// Real-time signals are excluded.
pub const SUPPORTED_SIGNALS: [Signal; 29] = [
    Signal::SIGHUP,
    Signal::SIGINT,
    Signal::SIGQUIT,
    Signal::SIGILL,
    Signal::SIGTRAP,
    Signal::SIGABRT,
    Signal::SIGBUS,
    Signal::SIGFPE,
    Signal::SIGKILL,
    Signal::SIGUSR1,
    Signal::SIGSEGV,
    Signal::SIGUSR2,
    Signal::SIGPIPE,
    Signal::SIGALRM,
    Signal::SIGTERM,
    Signal::SIGCHLD,
    Signal::SIGCONT,
    Signal::SIGSTOP,
    Signal::SIGTSTP,
    Signal::SIGTTIN,
    Signal::SIGTTOU,
    Signal::SIGURG,
    Signal::SIGXCPU,
    Signal::SIGXFSZ,
    Signal::SIGVTALRM,
    Signal::SIGPROF,
    Signal::SIGWINCH,
    Signal::SIGIO,
    Signal::SIGSYS,
];

/// Canonical name (`SIGTERM`) for a supported signal number
pub fn signal_name(number: i32) -> Option<&'static str> {
    SUPPORTED_SIGNALS
        .iter()
        .find(|s| **s as i32 == number)
        .map(|s| s.as_str())
}

/// Number for a supported signal name; `SIGTERM`, `TERM` and `term` all work
pub fn signal_number(name: &str) -> Option<i32> {
    resolve(&SignalSpec::from(name)).map(|s| s as i32)
}

fn resolve(spec: &SignalSpec) -> Option<Signal> {
    match spec.normalized() {
        SignalSpec::Number(n) => signal_name(n).and_then(|name| lookup_name(name)),
        SignalSpec::Name(name) => lookup_name(&name),
    }
}

fn lookup_name(name: &str) -> Option<Signal> {
    SUPPORTED_SIGNALS.iter().copied().find(|s| s.as_str() == name)
}

/// Deliver `signal` to `pid`
///
/// Returns `false` without trying when `pid` is outside `0..=i32::MAX` or the
/// signal is unknown; delivery errors (no such process, permission denied)
/// also become `false`. Signal 0 only probes whether `pid` is addressable.
///
/// # Example
/// ```no_run
/// use hostexec_infra_system::signals::kill;
///
/// assert!(kill(i64::from(std::process::id()), 0));
/// assert!(!kill(-1, "SIGTERM"));
/// ```
pub fn kill(pid: i64, signal: impl Into<SignalSpec>) -> bool {
    let signal = signal.into();
    let Some(target) = target_pid(pid) else {
        debug!(pid = %pid, "Refusing to signal out-of-range pid");
        return false;
    };

    if signal.is_probe() {
        return signal::kill(target, None).is_ok();
    }

    let Some(resolved) = resolve(&signal) else {
        debug!(pid = %pid, signal = %signal, "Unknown signal");
        return false;
    };

    match signal::kill(target, resolved) {
        Ok(()) => {
            debug!(pid = %pid, signal = %resolved.as_str(), "Signal delivered");
            true
        }
        Err(errno) => {
            debug!(pid = %pid, signal = %resolved.as_str(), error = %errno, "Signal delivery failed");
            false
        }
    }
}

fn target_pid(pid: i64) -> Option<Pid> {
    i32::try_from(pid).ok().filter(|p| *p >= 0).map(Pid::from_raw)
}

/// `SignalSender` backed by `kill(2)`
#[derive(Debug, Clone, Copy, Default)]
pub struct NixSignalSender;

impl SignalSender for NixSignalSender {
    fn send(&self, pid: i64, signal: &SignalSpec) -> bool {
        kill(pid, signal)
    }
}

/// Map an OS exit status to a termination (exit code XOR signal)
pub fn termination_from_status(status: ExitStatus) -> Termination {
    match (status.code(), status.signal()) {
        (Some(code), _) => Termination::Exited(code),
        (None, Some(signal)) => Termination::Signaled {
            signal,
            name: signal_name(signal),
        },
        // Neither code nor signal: treat like a generic failure
        (None, None) => Termination::Exited(-1),
    }
}
