// Blocking program runner
// reason: std::process + scoped threads; the call is synchronous end to end
use std::fs::File;
use std::io::{self, Read, Write};
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Command as OsCommand, Stdio};
use std::thread;
use tracing::{debug, warn};

use hostexec_core::application::constants::{READ_CHUNK_SIZE, SHELL_PATH};
use hostexec_core::domain::{
    Command, ExecutionOptions, ExecutionResult, LaunchOptions, RunOutput,
};
use hostexec_core::port::CommandRunner;
use hostexec_core::{ProcessError, Result};

use crate::identity::{resolve_identity, Identity};
use crate::signals::termination_from_status;

/// Runs commands through `/bin/sh -c` and waits for them
///
/// Shell semantics are kept on purpose: argument lines may carry redirections
/// (`>&2`) and chains (`&&`), and builtins like `exit` work as programs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgramRunner;

impl ProgramRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run `command` and capture its output, whatever the exit status
    ///
    /// # Errors
    /// - ProcessError::Validation for malformed options or argument lines
    /// - ProcessError::UserLookup for unknown user/group names
    /// - ProcessError::SpawnFailed if the shell cannot be started (privilege
    ///   drop without privileges included)
    pub fn execute(&self, command: &Command, launch: &LaunchOptions) -> Result<ExecutionResult> {
        launch.validate()?;
        let line = command.shell_line()?;
        let identity = resolve_identity(launch)?;

        if launch.log_command {
            debug!(
                command = %command.display_line(),
                cwd = ?launch.cwd,
                uid = ?identity.uid,
                gid = ?identity.gid,
                "Running program"
            );
        }

        let stdout_file = create_output_file(launch.stdout_file.as_deref())?;
        let stderr_file = create_output_file(launch.stderr_file.as_deref())?;

        let mut os_command = OsCommand::new(SHELL_PATH);
        os_command
            .arg("-c")
            .arg(&line)
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
        apply_identity(&mut os_command, identity);

        let mut child = os_command.spawn().map_err(|e| {
            ProcessError::SpawnFailed(format!("{}: {}", command.display_line(), e))
        })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let input = launch.input.as_deref();

        let (stdout, stderr) = thread::scope(|scope| {
            if let (Some(pipe), Some(input)) = (stdin, input) {
                scope.spawn(move || feed_input(pipe, input));
            }
            let out = scope.spawn(move || drain(stdout, stdout_file));
            let err = scope.spawn(move || drain(stderr, stderr_file));
            (join(out), join(err))
        });

        let status = child.wait()?;
        let termination = termination_from_status(status);

        if launch.log_command {
            debug!(command = %command.program(), termination = %termination, "Program finished");
        }

        Ok(ExecutionResult {
            stdout: String::from_utf8_lossy(&stdout?).into_owned(),
            stderr: String::from_utf8_lossy(&stderr?).into_owned(),
            termination,
        })
    }
}

impl CommandRunner for ProgramRunner {
    fn run(&self, command: &Command, options: &ExecutionOptions) -> Result<RunOutput> {
        options.validate()?;
        self.execute(command, &options.launch)?
            .into_run_output(options.retrieve_std_streams)
    }
}

fn apply_identity(command: &mut OsCommand, identity: Identity) {
    if identity.is_empty() {
        return;
    }
    debug!(uid = ?identity.uid, gid = ?identity.gid, "Dropping privileges for child");
    if let Some(gid) = identity.gid {
        command.gid(gid);
    }
    if let Some(uid) = identity.uid {
        command.uid(uid);
    }
}

/// Open a write-through file, truncating it
pub(crate) fn create_output_file(path: Option<&Path>) -> Result<Option<File>> {
    path.map(File::create).transpose().map_err(ProcessError::from)
}

fn feed_input(mut pipe: impl Write, input: &[u8]) {
    // The pipe closes on drop, which gives the child EOF
    match pipe.write_all(input) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            debug!("Child closed stdin before reading all input");
        }
        Err(e) => warn!(error = %e, "Failed to write child stdin"),
    }
}

fn drain(pipe: Option<impl Read>, mut file: Option<File>) -> io::Result<Vec<u8>> {
    let mut captured = Vec::new();
    let Some(mut pipe) = pipe else {
        return Ok(captured);
    };

    let mut chunk = vec![0u8; READ_CHUNK_SIZE];
    loop {
        let read = match pipe.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        captured.extend_from_slice(&chunk[..read]);
        if let Some(f) = file.as_mut() {
            f.write_all(&chunk[..read])?;
        }
    }
    Ok(captured)
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, T>) -> T {
    handle
        .join()
        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
}
