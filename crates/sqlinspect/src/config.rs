//! Engine configuration.
//!
//! The configuration is a JSON document; every field is optional:
//!
//! ```json
//! {
//!     "dml_rollback_max_rows": 1000,
//!     "ddl_osc_min_size": 1024,
//!     "query_timeout_secs": 30,
//!     "rules": [
//!         { "name": "ddl_check_*_comment", "enabled": false },
//!         { "name": "ddl_check_index_count", "level": "warn", "params": { "max_count": 8 } }
//!     ]
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::audit::Level;
use crate::error::{InspectError, Result};

/// Default cap on the number of rows a DML rollback may snapshot.
pub const DEFAULT_DML_ROLLBACK_MAX_ROWS: i64 = 1000;

/// Default table size (MB) from which an online schema change is advised.
pub const DEFAULT_DDL_OSC_MIN_SIZE: i64 = 1024;

/// Default deadline for a single live query.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

/// Settings shared by every session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectConfig {
    /// Row cap for DML rollback; below zero disables DML rollback.
    pub dml_rollback_max_rows: i64,
    /// Table size (MB) from which ALTER TABLE gets an online schema
    /// change advisory; below zero disables the advisory.
    pub ddl_osc_min_size: i64,
    /// Deadline for each live query, in seconds.
    pub query_timeout_secs: u64,
    /// Rule overrides, applied in order.
    pub rules: Vec<RuleSetting>,
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            dml_rollback_max_rows: DEFAULT_DML_ROLLBACK_MAX_ROWS,
            ddl_osc_min_size: DEFAULT_DDL_OSC_MIN_SIZE,
            query_timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
            rules: Vec::new(),
        }
    }
}

impl InspectConfig {
    /// Loads and validates a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| InspectError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values serde cannot check.
    pub fn validate(&self) -> Result<()> {
        if self.query_timeout_secs == 0 {
            return Err(InspectError::Config(
                "query_timeout_secs must be greater than zero".to_string(),
            ));
        }
        for setting in &self.rules {
            setting.pattern()?;
        }
        Ok(())
    }

    /// Returns the query deadline.
    #[must_use]
    pub const fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    /// Returns the DML rollback row cap, or `None` when DML rollback is
    /// disabled.
    #[must_use]
    pub fn dml_rollback_cap(&self) -> Option<u64> {
        u64::try_from(self.dml_rollback_max_rows).ok()
    }

    /// Returns the online schema change threshold in MB, or `None` when
    /// the advisory is disabled.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn osc_threshold_mb(&self) -> Option<f64> {
        (self.ddl_osc_min_size >= 0).then_some(self.ddl_osc_min_size as f64)
    }
}

const fn enabled_by_default() -> bool {
    true
}

/// An override for the rules whose name matches `name`.
///
/// `name` is a rule name or a glob where `*` matches any run of
/// characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSetting {
    /// Rule name or glob.
    pub name: String,
    /// Whether matching rules run.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Severity override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    /// Parameter overrides, merged over the rule defaults.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl RuleSetting {
    /// Creates an enabled setting without overrides.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            level: None,
            params: serde_json::Map::new(),
        }
    }

    /// Disables matching rules.
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Overrides the severity of matching rules.
    #[must_use]
    pub const fn level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Overrides one parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Compiles the name glob into an anchored regex.
    pub fn pattern(&self) -> Result<Regex> {
        if self.name.trim().is_empty() {
            return Err(InspectError::Config("rule setting without name".to_string()));
        }
        let body = self
            .name
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        Regex::new(&format!("^{body}$"))
            .map_err(|e| InspectError::Config(format!("rule pattern '{}': {e}", self.name)))
    }
}
