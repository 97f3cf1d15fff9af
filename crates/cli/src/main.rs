//! Hostexec CLI - run, spawn, signal and inspect host processes

mod logging;

use std::io::Write;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use colored::Colorize;
use tabled::{Table, Tabled};
use tracing::debug;

use hostexec_core::application::constants::{
    DEFAULT_KILL_SIGNAL, DEFAULT_POLL_STEP_SECS, DEFAULT_POLL_TIMEOUT_SECS,
};
use hostexec_core::domain::{
    Args, Command, ExecutionOptions, FieldMatch, Filterer, LaunchOptions, PollOptions,
    ProcessRecord, PsResult, RunOutput, SignalSpec, SpawnOptions,
};
use hostexec_core::ProcessError;
use hostexec_infra_system::{
    find_in_path, kill, pid_find, ps, retry_while, run_program, spawn_async,
};

#[derive(Parser)]
#[command(name = "hostexec")]
#[command(about = "Run, spawn, signal and inspect host processes", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Debug-level logging (ignored when RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program to completion through /bin/sh
    Run {
        #[command(flatten)]
        target: Target,

        #[command(flatten)]
        launch: Launch,

        /// Print stdout, stderr and code instead of failing
        #[arg(long)]
        streams: bool,
    },

    /// Spawn a program directly and report its pid
    Spawn {
        #[command(flatten)]
        target: Target,

        #[command(flatten)]
        launch: Launch,

        /// Wait for the program to terminate
        #[arg(short, long)]
        wait: bool,

        /// Give up waiting after this many seconds
        #[arg(short, long, requires = "wait")]
        timeout: Option<f64>,

        /// Fail instead of detaching when the wait times out
        #[arg(long, requires = "timeout")]
        throw_on_timeout: bool,
    },

    /// Send a signal to a process (0 probes liveness)
    Kill {
        pid: i64,

        /// Signal number or name (SIGTERM, TERM, 15)
        #[arg(short, long, default_value = DEFAULT_KILL_SIGNAL)]
        signal: String,
    },

    /// List processes
    Ps {
        #[arg(long)]
        pid: Option<u32>,

        #[arg(long)]
        user: Option<String>,

        #[arg(long)]
        cmd: Option<String>,

        #[arg(long)]
        full_cmd: Option<String>,

        /// Filterer as JSON (`42`, `{"user": "root"}`)
        #[arg(long, conflicts_with_all = ["pid", "user", "cmd", "full_cmd"])]
        filter: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Check whether a pid is listed in the process table
    PidFind { pid: u32 },

    /// Locate a binary in PATH
    Which { binary: String },

    /// Block until a pid leaves the process table
    WaitPid {
        pid: u32,

        /// Seconds between checks
        #[arg(long, env = "HOSTEXEC_POLL_STEP", default_value_t = DEFAULT_POLL_STEP_SECS)]
        step: f64,

        /// Seconds before giving up (`inf` waits forever)
        #[arg(long, env = "HOSTEXEC_POLL_TIMEOUT", default_value_t = DEFAULT_POLL_TIMEOUT_SECS)]
        timeout: f64,
    },
}

#[derive(ClapArgs)]
struct Target {
    /// Program to execute
    program: String,

    /// Arguments as a single shell-quoted line
    #[arg(long, conflicts_with = "args")]
    line: Option<String>,

    /// Arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

impl Target {
    fn into_command(self) -> Command {
        let args = match self.line {
            Some(line) => Args::Line(line),
            None => Args::List(self.args),
        };
        Command::with_args(self.program, args)
    }
}

#[derive(ClapArgs)]
struct Launch {
    /// Working directory
    #[arg(long)]
    cwd: Option<String>,

    /// Extra environment variable (repeatable)
    #[arg(short, long = "env", value_name = "KEY=VALUE", value_parser = parse_env)]
    env: Vec<(String, String)>,

    /// Text written to the program's stdin
    #[arg(long)]
    input: Option<String>,

    /// Run as this user (name or uid)
    #[arg(long)]
    user: Option<String>,

    /// Run with this group (name or gid)
    #[arg(long)]
    group: Option<String>,

    /// Also write stdout to this file
    #[arg(long)]
    stdout_file: Option<String>,

    /// Also write stderr to this file
    #[arg(long)]
    stderr_file: Option<String>,

    /// Do not trace the invocation
    #[arg(long)]
    no_log_command: bool,
}

impl Launch {
    fn into_options(self) -> LaunchOptions {
        let mut options = LaunchOptions::new().log_command(!self.no_log_command);
        if let Some(cwd) = self.cwd {
            options = options.cwd(cwd);
        }
        for (key, value) in self.env {
            options = options.env(key, value);
        }
        if let Some(input) = self.input {
            options = options.input(input);
        }
        if let Some(user) = self.user {
            options = match user.parse::<u32>() {
                Ok(uid) => options.run_as(uid),
                Err(_) => options.run_as(user.as_str()),
            };
        }
        if let Some(group) = self.group {
            options = match group.parse::<u32>() {
                Ok(gid) => options.gid(gid),
                Err(_) => options.gid(group.as_str()),
            };
        }
        if let Some(path) = self.stdout_file {
            options = options.stdout_file(path);
        }
        if let Some(path) = self.stderr_file {
            options = options.stderr_file(path);
        }
        options
    }
}

fn parse_env(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))
}

#[derive(Tabled)]
struct ProcessRow {
    pid: u32,
    user: String,
    cmd: String,
    full_cmd: String,
}

impl From<ProcessRecord> for ProcessRow {
    fn from(record: ProcessRecord) -> Self {
        Self {
            pid: record.pid,
            user: record.user,
            cmd: record.cmd,
            full_cmd: record.full_cmd,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;
    debug!(version = %hostexec_core::VERSION, "hostexec starting");

    match cli.command {
        Commands::Run {
            target,
            launch,
            streams,
        } => {
            let command = target.into_command();
            let options = ExecutionOptions::new()
                .with_launch(launch.into_options())
                .retrieve_std_streams(streams);

            let outcome = tokio::task::spawn_blocking(move || run_program(&command, &options))
                .await
                .context("Runner task failed")?;

            match outcome {
                Ok(RunOutput::Stdout(stdout)) => print_raw(stdout.as_bytes())?,
                Ok(RunOutput::Streams(captured)) => {
                    println!("{}", serde_json::to_string_pretty(&captured)?);
                }
                Err(ProcessError::ExecutionFailure { message, code }) => {
                    eprintln!("{} {}", "✗".red(), message);
                    std::process::exit(code);
                }
                Err(e) => return Err(e).context("Failed to run program"),
            }
        }

        Commands::Spawn {
            target,
            launch,
            wait,
            timeout,
            throw_on_timeout,
        } => {
            let command = target.into_command();
            let mut options = SpawnOptions::new()
                .with_launch(launch.into_options())
                .wait(wait)
                .throw_on_timeout(throw_on_timeout);
            if let Some(seconds) = timeout {
                options = options.timeout(seconds);
            }
            if wait {
                options = options
                    .on_stdout(|chunk| {
                        let _ = std::io::stdout().write_all(chunk);
                    })
                    .on_stderr(|chunk| {
                        let _ = std::io::stderr().write_all(chunk);
                    });
            }

            let outcome = spawn_async(&command, options)
                .await
                .context("Failed to spawn program")?;
            let handle = outcome.handle;

            if outcome.running {
                println!(
                    "{} {} {}",
                    "✓".green(),
                    "Running with pid".bold(),
                    handle.pid()
                );
            } else if let Some(termination) = handle.termination() {
                let line = format!("pid {} ended with {}", handle.pid(), termination);
                if termination.success() {
                    eprintln!("{} {}", "✓".green(), line);
                } else {
                    eprintln!("{} {}", "✗".red(), line);
                    std::process::exit(termination.code());
                }
            }
        }

        Commands::Kill { pid, signal } => {
            let spec = match signal.parse::<i32>() {
                Ok(number) => SignalSpec::Number(number),
                Err(_) => SignalSpec::Name(signal),
            };
            if kill(pid, &spec) {
                println!("{} {} sent to {}", "✓".green(), spec, pid);
            } else {
                println!("{} could not send {} to {}", "✗".red(), spec, pid);
                std::process::exit(1);
            }
        }

        Commands::Ps {
            pid,
            user,
            cmd,
            full_cmd,
            filter,
            json,
        } => {
            let filterer = match filter {
                Some(raw) => {
                    let value: serde_json::Value =
                        serde_json::from_str(&raw).context("Invalid JSON filterer")?;
                    Filterer::from_value(value).map_err(ProcessError::from)?
                }
                None => field_filterer(pid, user, cmd, full_cmd),
            };
            let result = ps(filterer).context("Failed to query process table")?;
            print_processes(result, json)?;
        }

        Commands::PidFind { pid } => {
            if pid_find(pid).context("Failed to query process table")? {
                println!("{} {} is listed", "✓".green(), pid);
            } else {
                println!("{} {} is not listed", "✗".red(), pid);
                std::process::exit(1);
            }
        }

        Commands::Which { binary } => match find_in_path(&binary) {
            Some(path) => println!("{}", path.display()),
            None => {
                eprintln!("{} {} not found in PATH", "✗".red(), binary);
                std::process::exit(1);
            }
        },

        Commands::WaitPid { pid, step, timeout } => {
            let options = PollOptions::new(step, timeout);
            let gone = tokio::task::spawn_blocking(move || wait_for_exit(pid, &options))
                .await
                .context("Poll task failed")??;

            if gone {
                println!("{} {} is gone", "✓".green(), pid);
            } else {
                println!("{} {} still listed after {}s", "✗".red(), pid, timeout);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn field_filterer(
    pid: Option<u32>,
    user: Option<String>,
    cmd: Option<String>,
    full_cmd: Option<String>,
) -> Filterer {
    let fields = FieldMatch {
        pid,
        user,
        cmd,
        full_cmd,
    };
    match fields {
        FieldMatch {
            pid: Some(pid),
            user: None,
            cmd: None,
            full_cmd: None,
        } => Filterer::ByPid(pid),
        f if f == FieldMatch::default() => Filterer::All,
        f => Filterer::ByFields(f),
    }
}

/// Poll the process table until `pid` disappears
fn wait_for_exit(pid: u32, options: &PollOptions) -> Result<bool> {
    let mut failure = None;
    let gone = retry_while(
        || match pid_find(pid) {
            Ok(listed) => listed,
            Err(e) => {
                failure = Some(e);
                false
            }
        },
        options,
    )?;
    match failure {
        Some(e) => Err(e).context("Failed to query process table"),
        None => Ok(gone),
    }
}

fn print_processes(result: PsResult, json: bool) -> Result<()> {
    if json {
        let rendered = match result {
            PsResult::Single(record) => serde_json::to_string_pretty(&record)?,
            PsResult::Many(records) => serde_json::to_string_pretty(&records)?,
        };
        println!("{}", rendered);
        return Ok(());
    }

    let records = result.into_vec();
    if records.is_empty() {
        println!("{}", "No matching processes".yellow());
        return Ok(());
    }
    let rows: Vec<ProcessRow> = records.into_iter().map(ProcessRow::from).collect();
    println!("{}", Table::new(rows));
    Ok(())
}

fn print_raw(bytes: &[u8]) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(bytes)?;
    stdout.flush()?;
    Ok(())
}
