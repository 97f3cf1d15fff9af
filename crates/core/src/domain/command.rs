// Command - program plus ordered arguments

use serde::{Deserialize, Serialize};

use super::error::{DomainError, Result};

/// Arguments either as an explicit list or as a single shell-quoted line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Args {
    List(Vec<String>),
    Line(String),
}

impl Default for Args {
    fn default() -> Self {
        Args::List(Vec::new())
    }
}

impl Args {
    /// Split into argv.
    ///
    /// A line follows shell-word rules, so `'a b' c` yields two arguments.
    /// Unbalanced quotes are rejected.
    pub fn to_argv(&self) -> Result<Vec<String>> {
        match self {
            Args::List(items) => Ok(items.clone()),
            Args::Line(line) => shell_words::split(line).map_err(|e| {
                DomainError::InvalidCommand(format!("cannot parse arguments '{}': {}", line, e))
            }),
        }
    }

    /// Render as a fragment for `sh -c`.
    ///
    /// List items are quoted one by one. A line is passed verbatim once it
    /// parses, which keeps redirections and `&&` meaningful to the shell.
    pub fn to_shell_fragment(&self) -> Result<String> {
        match self {
            Args::List(items) => Ok(shell_words::join(items)),
            Args::Line(line) => {
                self.to_argv()?;
                Ok(line.trim().to_string())
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Args::List(items) => items.is_empty(),
            Args::Line(line) => line.trim().is_empty(),
        }
    }
}

impl From<Vec<String>> for Args {
    fn from(items: Vec<String>) -> Self {
        Args::List(items)
    }
}

impl From<Vec<&str>> for Args {
    fn from(items: Vec<&str>) -> Self {
        Args::List(items.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Args {
    fn from(items: [&str; N]) -> Self {
        Args::List(items.iter().map(|s| s.to_string()).collect())
    }
}

impl From<&str> for Args {
    fn from(line: &str) -> Self {
        Args::Line(line.to_string())
    }
}

impl From<String> for Args {
    fn from(line: String) -> Self {
        Args::Line(line)
    }
}

/// A program and its arguments. Never mutated by the runner or spawner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    program: String,
    #[serde(default)]
    args: Args,
}

impl Command {
    /// Create a command without arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Args::default(),
        }
    }

    /// Create a command with a list or a shell-quoted line of arguments
    ///
    /// # Example
    /// ```
    /// use hostexec_core::domain::Command;
    ///
    /// let cmd = Command::with_args("echo", ["foo"]);
    /// assert_eq!(cmd.argv().unwrap(), vec!["foo".to_string()]);
    ///
    /// let cmd = Command::with_args("echo", "-n 'a b' c");
    /// assert_eq!(cmd.argv().unwrap().len(), 3);
    /// ```
    pub fn with_args(program: impl Into<String>, args: impl Into<Args>) -> Self {
        Self {
            program: program.into(),
            args: args.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &Args {
        &self.args
    }

    pub fn validate(&self) -> Result<()> {
        if self.program.trim().is_empty() {
            return Err(DomainError::InvalidCommand(
                "program must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Arguments as argv (program excluded)
    pub fn argv(&self) -> Result<Vec<String>> {
        self.validate()?;
        self.args.to_argv()
    }

    /// Full command line for `sh -c`
    pub fn shell_line(&self) -> Result<String> {
        self.validate()?;
        let program = shell_words::quote(&self.program);
        if self.args.is_empty() {
            return Ok(program.into_owned());
        }
        Ok(format!("{} {}", program, self.args.to_shell_fragment()?))
    }

    /// Human-readable form for logs
    pub fn display_line(&self) -> String {
        match &self.args {
            Args::List(items) if items.is_empty() => self.program.clone(),
            Args::List(items) => format!("{} {}", self.program, items.join(" ")),
            Args::Line(line) => format!("{} {}", self.program, line.trim()),
        }
    }
}
