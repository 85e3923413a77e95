use std::collections::{BTreeMap, HashMap};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use serde::Serialize;

/// Environment key set on child processes started by `runenv`.
///
/// Loaders skip work when they find it in their target environment, so a
/// program that loads its own env file does not do it a second time when it
/// was already wrapped.
pub const WRAPPED_MARKER: &str = "_RUNENV_WRAPPED";

/// A `KEY=VALUE` triple as produced by a decoder, before prefix filtering and
/// placeholder substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub line: u32,
    pub key: String,
    pub value: String,
}

impl RawEntry {
    pub fn new(line: u32, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            line,
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Prefix handling for a single parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub prefix: Option<String>,
    pub strip_prefix: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            prefix: None,
            strip_prefix: true,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn strip_prefix(mut self, strip_prefix: bool) -> Self {
        self.strip_prefix = strip_prefix;
        self
    }

    /// The configured prefix, with an empty string treated as unset.
    pub(crate) fn active_prefix(&self) -> Option<&str> {
        self.prefix.as_deref().filter(|prefix| !prefix.is_empty())
    }
}

/// Severity of a [`ParseMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl Display for Level {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A lint diagnostic attached to a line of the env file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseMessage {
    pub line_number: u32,
    pub level: Level,
    pub message: String,
}

impl Display for ParseMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] (line {}) '{}'",
            self.level, self.line_number, self.message
        )
    }
}

/// Filtered keys and their unresolved values, in first-seen order.
///
/// Inserting an existing key replaces its value but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEnvironment {
    entries: Vec<(String, String)>,
    by_key: HashMap<String, usize>,
}

impl RawEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning `true` when it replaced an earlier one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        let value = value.into();
        if let Some(idx) = self.by_key.get(&key).copied() {
            self.entries[idx].1 = value;
            return true;
        }

        self.by_key.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        false
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.by_key
            .get(key)
            .map(|idx| self.entries[*idx].1.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Final key/value mapping after placeholder substitution.
pub type ResolvedEnvironment = BTreeMap<String, String>;

/// Summary of a [`crate::EnvLoader::load`] call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadReport {
    /// Number of variables written to the target.
    pub loaded: usize,
    /// Set when the target already carried [`WRAPPED_MARKER`] and loading was
    /// not forced.
    pub skipped_wrapped: bool,
    /// The env file that was found, if any.
    pub file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_environment_keeps_first_position_and_last_value() {
        let mut raw = RawEnvironment::new();
        assert!(!raw.insert("A", "1"));
        assert!(!raw.insert("B", "2"));
        assert!(raw.insert("A", "3"));

        let pairs: Vec<_> = raw.iter().collect();
        assert_eq!(pairs, vec![("A", "3"), ("B", "2")]);
        assert_eq!(raw.get("A"), Some("3"));
        assert_eq!(raw.len(), 2);
    }

    #[test]
    fn parse_message_serializes_with_lowercase_level() {
        let message = ParseMessage {
            line_number: 3,
            level: Level::Warning,
            message: "line not matched".to_owned(),
        };

        let json = serde_json::to_string(&message).expect("serialize should succeed");
        assert_eq!(
            json,
            r#"{"line_number":3,"level":"warning","message":"line not matched"}"#
        );
        assert_eq!(message.to_string(), "[warning] (line 3) 'line not matched'");
    }

    #[test]
    fn empty_prefix_counts_as_unset() {
        let options = ParseOptions::new().prefix("");
        assert_eq!(options.active_prefix(), None);
        assert!(options.strip_prefix);
    }
}
