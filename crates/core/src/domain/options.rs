// Execution, spawn and poll options
// Every option is explicit, has a documented default and is validated before use

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use super::error::{DomainError, Result};
use crate::application::constants::{DEFAULT_POLL_STEP_SECS, DEFAULT_POLL_TIMEOUT_SECS};

/// Target user for privilege drop (`runAs` / `uid`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserSpec {
    Name(String),
    Id(u32),
}

impl From<u32> for UserSpec {
    fn from(id: u32) -> Self {
        UserSpec::Id(id)
    }
}

impl From<&str> for UserSpec {
    fn from(name: &str) -> Self {
        UserSpec::Name(name.to_string())
    }
}

/// Target group for privilege drop (`gid`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupSpec {
    Name(String),
    Id(u32),
}

impl From<u32> for GroupSpec {
    fn from(id: u32) -> Self {
        GroupSpec::Id(id)
    }
}

impl From<&str> for GroupSpec {
    fn from(name: &str) -> Self {
        GroupSpec::Name(name.to_string())
    }
}

/// Options shared by the blocking runner and the async spawner
///
/// | option | default |
/// |---|---|
/// | `cwd` | inherited working directory |
/// | `env` | no additions (parent environment is inherited) |
/// | `user` / `group` | current identity; a user alone keeps the current gid |
/// | `input` | none, stdin is `/dev/null` |
/// | `stdout_file` / `stderr_file` | none, output is only captured |
/// | `log_command` | `true` |
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub cwd: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
    pub user: Option<UserSpec>,
    pub group: Option<GroupSpec>,
    pub input: Option<Vec<u8>>,
    pub stdout_file: Option<PathBuf>,
    pub stderr_file: Option<PathBuf>,
    pub log_command: bool,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            cwd: None,
            env: BTreeMap::new(),
            user: None,
            group: None,
            input: None,
            stdout_file: None,
            stderr_file: None,
            log_command: true,
        }
    }
}

impl LaunchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Run as a user given by name or uid
    pub fn run_as(mut self, user: impl Into<UserSpec>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn gid(mut self, group: impl Into<GroupSpec>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn input(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn stdout_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout_file = Some(path.into());
        self
    }

    pub fn stderr_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.stderr_file = Some(path.into());
        self
    }

    pub fn log_command(mut self, enabled: bool) -> Self {
        self.log_command = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(cwd) = &self.cwd {
            if cwd.as_os_str().is_empty() {
                return Err(DomainError::InvalidOption("cwd must not be empty".into()));
            }
        }
        for key in self.env.keys() {
            if key.is_empty() || key.contains('=') || key.contains('\0') {
                return Err(DomainError::InvalidOption(format!(
                    "invalid environment variable name '{}'",
                    key
                )));
            }
        }
        if let Some(UserSpec::Name(name)) = &self.user {
            if name.trim().is_empty() {
                return Err(DomainError::InvalidOption("user name must not be empty".into()));
            }
        }
        if let Some(GroupSpec::Name(name)) = &self.group {
            if name.trim().is_empty() {
                return Err(DomainError::InvalidOption("group name must not be empty".into()));
            }
        }
        for (label, path) in [("stdout_file", &self.stdout_file), ("stderr_file", &self.stderr_file)] {
            if matches!(path, Some(p) if p.as_os_str().is_empty()) {
                return Err(DomainError::InvalidOption(format!("{} must not be empty", label)));
            }
        }
        Ok(())
    }
}

/// Options for the blocking runner
///
/// `retrieve_std_streams` (default `false`): return stdout, stderr and code
/// instead of raising on failure.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    pub launch: LaunchOptions,
    pub retrieve_std_streams: bool,
}

impl ExecutionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_launch(mut self, launch: LaunchOptions) -> Self {
        self.launch = launch;
        self
    }

    pub fn retrieve_std_streams(mut self, enabled: bool) -> Self {
        self.retrieve_std_streams = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.launch.validate()
    }
}

/// Receives each output chunk as it arrives
pub type OutputCallback = Box<dyn FnMut(&[u8]) + Send + 'static>;

/// Options for the async spawner
///
/// | option | default |
/// |---|---|
/// | `wait` | `false`, return as soon as the child exists |
/// | `timeout` | `None`: wait without limit. Seconds, finite and positive or `f64::INFINITY` |
/// | `throw_on_timeout` | `false`, a timed-out wait returns a snapshot |
/// | `on_stdout` / `on_stderr` | none |
#[derive(Default)]
pub struct SpawnOptions {
    pub launch: LaunchOptions,
    pub wait: bool,
    pub timeout: Option<f64>,
    pub throw_on_timeout: bool,
    pub on_stdout: Option<OutputCallback>,
    pub on_stderr: Option<OutputCallback>,
}

impl SpawnOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_launch(mut self, launch: LaunchOptions) -> Self {
        self.launch = launch;
        self
    }

    pub fn wait(mut self, enabled: bool) -> Self {
        self.wait = enabled;
        self
    }

    pub fn timeout(mut self, seconds: f64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    pub fn throw_on_timeout(mut self, enabled: bool) -> Self {
        self.throw_on_timeout = enabled;
        self
    }

    pub fn on_stdout(mut self, callback: impl FnMut(&[u8]) + Send + 'static) -> Self {
        self.on_stdout = Some(Box::new(callback));
        self
    }

    pub fn on_stderr(mut self, callback: impl FnMut(&[u8]) + Send + 'static) -> Self {
        self.on_stderr = Some(Box::new(callback));
        self
    }

    /// Validate and return the effective wait limit (`None` = unlimited)
    pub fn validate(&self) -> Result<Option<Duration>> {
        self.launch.validate()?;
        match self.timeout {
            None => Ok(None),
            Some(seconds) => parse_limit("timeout", seconds),
        }
    }
}

impl fmt::Debug for SpawnOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnOptions")
            .field("launch", &self.launch)
            .field("wait", &self.wait)
            .field("timeout", &self.timeout)
            .field("throw_on_timeout", &self.throw_on_timeout)
            .field("on_stdout", &self.on_stdout.is_some())
            .field("on_stderr", &self.on_stderr.is_some())
            .finish()
    }
}

/// Options for the polling loop, both in seconds
///
/// `step` (default 0.5) must be finite and positive. `timeout` (default 30)
/// must be positive; `f64::INFINITY` disables it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollOptions {
    pub step: f64,
    pub timeout: f64,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            step: DEFAULT_POLL_STEP_SECS,
            timeout: DEFAULT_POLL_TIMEOUT_SECS,
        }
    }
}

impl PollOptions {
    pub fn new(step: f64, timeout: f64) -> Self {
        Self { step, timeout }
    }

    /// Validate and return `(step, timeout)`; a `None` timeout never expires
    pub fn validate(&self) -> Result<(Duration, Option<Duration>)> {
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(DomainError::InvalidOption(format!(
                "step must be a finite positive number, got {}",
                self.step
            )));
        }
        let timeout = parse_limit("timeout", self.timeout)?;
        Ok((Duration::from_secs_f64(self.step), timeout))
    }
}

fn parse_limit(label: &str, seconds: f64) -> Result<Option<Duration>> {
    if seconds == f64::INFINITY {
        return Ok(None);
    }
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(DomainError::InvalidOption(format!(
            "{} must be a finite positive number or infinity, got {}",
            label, seconds
        )));
    }
    Ok(Some(Duration::from_secs_f64(seconds)))
}
