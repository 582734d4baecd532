//! Audit results and the structural checks run before the rules.

mod osc;
mod validate;

pub(crate) use osc::advise_online_schema_change;
pub(crate) use validate::validate;

use core::fmt;

use serde::{Deserialize, Serialize};

/// Severity of a finding, ordered from harmless to blocking.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Nothing to report.
    #[default]
    Normal,
    /// Worth knowing.
    Notice,
    /// Should be reviewed.
    Warn,
    /// Must be fixed.
    Error,
}

impl Level {
    /// Returns the lower-case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Notice => "notice",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding about a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditMessage {
    /// Severity.
    pub level: Level,
    /// Name of the rule that reported it; `None` for built-in checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    /// Human-readable text.
    pub message: String,
}

impl fmt::Display for AuditMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]{}", self.level, self.message)
    }
}

/// All findings about one statement, worst first.
///
/// Messages of the same severity keep the order they were added in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditResult {
    messages: Vec<AuditMessage>,
}

impl AuditResult {
    /// Creates an empty result.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Adds a finding from a built-in check.
    pub fn add(&mut self, level: Level, message: impl Into<String>) {
        self.insert(AuditMessage {
            level,
            rule: None,
            message: message.into(),
        });
    }

    /// Adds a finding reported by a rule.
    pub fn add_rule(&mut self, level: Level, rule: impl Into<String>, message: impl Into<String>) {
        self.insert(AuditMessage {
            level,
            rule: Some(rule.into()),
            message: message.into(),
        });
    }

    fn insert(&mut self, message: AuditMessage) {
        let at = self
            .messages
            .iter()
            .position(|existing| existing.level < message.level)
            .unwrap_or(self.messages.len());
        self.messages.insert(at, message);
    }

    /// Adds every finding of `other`.
    pub fn merge(&mut self, other: Self) {
        for message in other.messages {
            self.insert(message);
        }
    }

    /// Returns the findings, worst first.
    #[must_use]
    pub fn messages(&self) -> &[AuditMessage] {
        &self.messages
    }

    /// Returns the worst severity, `Normal` when there is no finding.
    #[must_use]
    pub fn level(&self) -> Level {
        self.messages.first().map_or(Level::Normal, |m| m.level)
    }

    /// Returns true if there is no finding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns true if a message with exactly this text was reported.
    #[must_use]
    pub fn contains(&self, message: &str) -> bool {
        self.messages.iter().any(|m| m.message == message)
    }

    /// Returns true if the named rule reported something.
    #[must_use]
    pub fn has_rule(&self, rule: &str) -> bool {
        self.messages
            .iter()
            .any(|m| m.rule.as_deref() == Some(rule))
    }
}

impl fmt::Display for AuditResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, message) in self.messages.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{message}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Normal < Level::Notice);
        assert!(Level::Notice < Level::Warn);
        assert!(Level::Warn < Level::Error);
    }

    #[test]
    fn test_level_serde() {
        assert_eq!(serde_json::to_string(&Level::Warn).unwrap(), "\"warn\"");
        let level: Level = serde_json::from_str("\"notice\"").unwrap();
        assert_eq!(level, Level::Notice);
    }

    #[test]
    fn test_messages_sorted_worst_first_and_stable() {
        let mut result = AuditResult::new();
        result.add_rule(Level::Notice, "a", "first notice");
        result.add(Level::Error, "first error");
        result.add_rule(Level::Notice, "b", "second notice");
        result.add_rule(Level::Warn, "c", "warning");
        result.add(Level::Error, "second error");

        let texts: Vec<&str> = result.messages().iter().map(|m| m.message.as_str()).collect();
        assert_eq!(
            texts,
            [
                "first error",
                "second error",
                "warning",
                "first notice",
                "second notice"
            ]
        );
        assert_eq!(result.level(), Level::Error);
    }

    #[test]
    fn test_empty_result_is_normal() {
        let result = AuditResult::new();
        assert!(result.is_empty());
        assert_eq!(result.level(), Level::Normal);
        assert_eq!(result.to_string(), "");
    }

    #[test]
    fn test_display() {
        let mut result = AuditResult::new();
        result.add(Level::Error, "table exist_db.t1 does not exist");
        result.add_rule(Level::Notice, "x", "table should have a comment");
        assert_eq!(
            result.to_string(),
            "[error]table exist_db.t1 does not exist\n[notice]table should have a comment"
        );
    }

    #[test]
    fn test_merge_keeps_order() {
        let mut first = AuditResult::new();
        first.add(Level::Warn, "w1");
        let mut second = AuditResult::new();
        second.add(Level::Error, "e1");
        second.add(Level::Warn, "w2");
        first.merge(second);
        let texts: Vec<&str> = first.messages().iter().map(|m| m.message.as_str()).collect();
        assert_eq!(texts, ["e1", "w1", "w2"]);
        assert!(first.contains("w2"));
    }
}
