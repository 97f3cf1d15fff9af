// Process records and filterers for process-table queries

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{DomainError, Result};

/// Immutable snapshot of one process-table entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub pid: u32,
    /// Owning username (numeric uid when the name is unknown)
    pub user: String,
    /// Short command name
    pub cmd: String,
    /// Program and arguments joined by spaces
    pub full_cmd: String,
}

/// Field-equality filter. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_cmd: Option<String>,
}

impl FieldMatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn cmd(mut self, cmd: impl Into<String>) -> Self {
        self.cmd = Some(cmd.into());
        self
    }

    pub fn full_cmd(mut self, full_cmd: impl Into<String>) -> Self {
        self.full_cmd = Some(full_cmd.into());
        self
    }

    pub fn matches(&self, record: &ProcessRecord) -> bool {
        self.pid.map_or(true, |pid| record.pid == pid)
            && self.user.as_deref().map_or(true, |user| record.user == user)
            && self.cmd.as_deref().map_or(true, |cmd| record.cmd == cmd)
            && self
                .full_cmd
                .as_deref()
                .map_or(true, |full_cmd| record.full_cmd == full_cmd)
    }
}

/// Predicate used by [`Filterer::ByPredicate`]
pub type RecordPredicate = Box<dyn Fn(&ProcessRecord) -> bool + Send + Sync>;

/// Selector narrowing a process-table query
pub enum Filterer {
    ByPid(u32),
    ByFields(FieldMatch),
    ByPredicate(RecordPredicate),
    All,
}

impl Filterer {
    pub fn predicate(f: impl Fn(&ProcessRecord) -> bool + Send + Sync + 'static) -> Self {
        Filterer::ByPredicate(Box::new(f))
    }

    /// Build a filterer from loosely-typed input (CLI flags, JSON payloads)
    ///
    /// - `null` → `All`
    /// - non-negative integer → `ByPid`
    /// - object → `ByFields` (keys: `pid`, `user`, `cmd`, `full_cmd`)
    /// - anything else → `UnsupportedFilterer`
    ///
    /// # Example
    /// ```
    /// use hostexec_core::domain::Filterer;
    /// use serde_json::json;
    ///
    /// assert!(matches!(Filterer::from_value(json!(42)), Ok(Filterer::ByPid(42))));
    /// assert!(Filterer::from_value(json!([])).is_err());
    /// ```
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Filterer::All),
            Value::Number(n) => n
                .as_u64()
                .and_then(|pid| u32::try_from(pid).ok())
                .map(Filterer::ByPid)
                .ok_or_else(|| DomainError::UnsupportedFilterer(format!("number ({})", n))),
            Value::Object(map) => serde_json::from_value::<FieldMatch>(Value::Object(map))
                .map(Filterer::ByFields)
                .map_err(|e| DomainError::UnsupportedFilterer(format!("object ({})", e))),
            other => Err(DomainError::UnsupportedFilterer(
                json_kind(&other).to_string(),
            )),
        }
    }
}

impl fmt::Debug for Filterer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filterer::ByPid(pid) => f.debug_tuple("ByPid").field(pid).finish(),
            Filterer::ByFields(fields) => f.debug_tuple("ByFields").field(fields).finish(),
            Filterer::ByPredicate(_) => f.write_str("ByPredicate(<fn>)"),
            Filterer::All => f.write_str("All"),
        }
    }
}

impl From<u32> for Filterer {
    fn from(pid: u32) -> Self {
        Filterer::ByPid(pid)
    }
}

impl From<FieldMatch> for Filterer {
    fn from(fields: FieldMatch) -> Self {
        Filterer::ByFields(fields)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Result of a process-table query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PsResult {
    /// Lookup by pid: the record, or `None` when absent
    Single(Option<ProcessRecord>),
    Many(Vec<ProcessRecord>),
}

impl PsResult {
    pub fn into_vec(self) -> Vec<ProcessRecord> {
        match self {
            PsResult::Single(record) => record.into_iter().collect(),
            PsResult::Many(records) => records,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PsResult::Single(record) => usize::from(record.is_some()),
            PsResult::Many(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
