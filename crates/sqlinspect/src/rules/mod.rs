//! The rule catalog.
//!
//! A [`Rule`] is an independent check over one statement and the catalog
//! as it is before the statement runs. A [`RuleCatalog`] binds each rule
//! to a severity and parameters; it is built once and shared by every
//! session.
//!
//! ```rust
//! use sqlinspect::config::{InspectConfig, RuleSetting};
//! use sqlinspect::rules::RuleCatalog;
//!
//! let mut config = InspectConfig::default();
//! config.rules.push(RuleSetting::new("ddl_check_*_comment").disabled());
//! let rules = RuleCatalog::from_config(&config).unwrap();
//! assert!(rules.get("ddl_check_table_without_comment").is_none());
//! assert!(rules.get("ddl_check_pk_not_exist").is_some());
//! ```

mod ddl;
mod dml;

pub use ddl::{
    AlterTableNeedMerge, ColumnWithoutComment, DisableDropStatement, IndexCount,
    ObjectNameLength, ObjectNameUsingKeyword, PrimaryKeyNotExist, PrimaryKeyWithoutAutoIncrement,
    TableSize, TableWithoutComment, TableWithoutIfNotExists,
};
pub use dml::{BatchInsertListsMax, DisableSelectAllColumn, ExplainAccessTypeAll, WhereIsInvalid};

use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;
use sqlinspect_core::Statement;
use tracing::{debug, warn};

use crate::audit::Level;
use crate::catalog::CatalogView;
use crate::config::{InspectConfig, RuleSetting};
use crate::error::Result;

/// Parameters of a rule, as configured.
pub type RuleParams = serde_json::Map<String, Value>;

/// Reads an unsigned parameter, falling back to `default` when it is
/// missing or not a non-negative integer.
#[must_use]
pub fn param_u64(params: &RuleParams, key: &str, default: u64) -> u64 {
    params.get(key).and_then(Value::as_u64).unwrap_or(default)
}

/// Wraps the messages of a rule that needs no lookup.
pub(crate) fn ready<'a>(messages: Vec<String>) -> BoxFuture<'a, Result<Vec<String>>> {
    future::ready(Ok(messages)).boxed()
}

/// A check over one statement.
pub trait Rule: Send + Sync {
    /// Unique name, used in configuration and reports.
    fn name(&self) -> &'static str;

    /// One-line description.
    fn description(&self) -> &'static str;

    /// Severity when the configuration does not override it.
    fn default_level(&self) -> Level;

    /// Whether the rule can run without a live connection.
    fn allow_offline(&self) -> bool {
        true
    }

    /// Parameters when the configuration does not override them.
    fn default_params(&self) -> RuleParams {
        RuleParams::new()
    }

    /// Returns one message per finding; an empty list means the statement
    /// passes.
    fn check<'a>(
        &'a self,
        view: &'a mut CatalogView<'_>,
        statement: &'a Statement,
        params: &'a RuleParams,
    ) -> BoxFuture<'a, Result<Vec<String>>>;
}

/// A rule with its effective severity and parameters.
pub struct ConfiguredRule {
    rule: Box<dyn Rule>,
    level: Level,
    params: RuleParams,
}

impl std::fmt::Debug for ConfiguredRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfiguredRule")
            .field("name", &self.rule.name())
            .field("level", &self.level)
            .field("params", &self.params)
            .finish()
    }
}

impl ConfiguredRule {
    /// Binds a rule to its defaults.
    #[must_use]
    pub fn new(rule: Box<dyn Rule>) -> Self {
        let level = rule.default_level();
        let params = rule.default_params();
        Self {
            rule,
            level,
            params,
        }
    }

    /// Returns the rule name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.rule.name()
    }

    /// Returns the rule.
    #[must_use]
    pub fn rule(&self) -> &dyn Rule {
        self.rule.as_ref()
    }

    /// Returns the effective severity.
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }

    /// Returns the effective parameters.
    #[must_use]
    pub const fn params(&self) -> &RuleParams {
        &self.params
    }

    fn apply(&mut self, setting: &RuleSetting) {
        if let Some(level) = setting.level {
            self.level = level;
        }
        for (key, value) in &setting.params {
            self.params.insert(key.clone(), value.clone());
        }
    }
}

/// An ordered, immutable set of configured rules.
#[derive(Debug, Default)]
pub struct RuleCatalog {
    rules: Vec<ConfiguredRule>,
}

impl RuleCatalog {
    /// Creates a catalog without rules.
    #[must_use]
    pub const fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Creates a catalog with every built-in rule at its defaults.
    #[must_use]
    pub fn builtin() -> Self {
        Self::empty()
            .with_rule(TableWithoutIfNotExists)
            .with_rule(PrimaryKeyNotExist)
            .with_rule(PrimaryKeyWithoutAutoIncrement)
            .with_rule(ColumnWithoutComment)
            .with_rule(TableWithoutComment)
            .with_rule(ObjectNameLength)
            .with_rule(ObjectNameUsingKeyword)
            .with_rule(IndexCount)
            .with_rule(AlterTableNeedMerge)
            .with_rule(TableSize)
            .with_rule(DisableDropStatement)
            .with_rule(WhereIsInvalid)
            .with_rule(DisableSelectAllColumn)
            .with_rule(BatchInsertListsMax)
            .with_rule(ExplainAccessTypeAll)
    }

    /// Appends a rule at its defaults.
    #[must_use]
    pub fn with_rule(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(ConfiguredRule::new(Box::new(rule)));
        self
    }

    /// Builds the built-in catalog with the configured overrides applied
    /// in order.
    pub fn from_config(config: &InspectConfig) -> Result<Self> {
        let mut catalog = Self::builtin();
        for setting in &config.rules {
            catalog.apply(setting)?;
        }
        debug!(count = catalog.len(), "Rule catalog ready");
        Ok(catalog)
    }

    /// Applies one override to every rule whose name matches.
    pub fn apply(&mut self, setting: &RuleSetting) -> Result<()> {
        let pattern = setting.pattern()?;
        let matched = self
            .rules
            .iter()
            .filter(|rule| pattern.is_match(rule.name()))
            .count();
        if matched == 0 {
            warn!(pattern = %setting.name, "Rule setting matches no rule");
            return Ok(());
        }
        if setting.enabled {
            for rule in &mut self.rules {
                if pattern.is_match(rule.name()) {
                    rule.apply(setting);
                }
            }
        } else {
            self.rules.retain(|rule| !pattern.is_match(rule.name()));
        }
        Ok(())
    }

    /// Returns the rules in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &ConfiguredRule> {
        self.rules.iter()
    }

    /// Returns the number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Looks up a rule by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ConfiguredRule> {
        self.rules.iter().find(|rule| rule.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names_are_unique() {
        let catalog = RuleCatalog::builtin();
        assert_eq!(catalog.len(), 15);
        let mut names: Vec<&str> = catalog.iter().map(ConfiguredRule::name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 15);
    }

    #[test]
    fn test_levels_and_offline_flags() {
        let catalog = RuleCatalog::builtin();
        let rule = catalog.get("ddl_check_index_count").unwrap();
        assert_eq!(rule.level(), Level::Notice);
        assert!(!rule.rule().allow_offline());
        assert_eq!(param_u64(rule.params(), "max_count", 0), 5);

        let rule = catalog.get("dml_check_where_is_invalid").unwrap();
        assert_eq!(rule.level(), Level::Error);
        assert!(rule.rule().allow_offline());
    }

    #[test]
    fn test_override_level_and_params() {
        let mut catalog = RuleCatalog::builtin();
        catalog
            .apply(
                &RuleSetting::new("ddl_check_index_count")
                    .level(Level::Error)
                    .param("max_count", 2),
            )
            .unwrap();
        let rule = catalog.get("ddl_check_index_count").unwrap();
        assert_eq!(rule.level(), Level::Error);
        assert_eq!(param_u64(rule.params(), "max_count", 0), 2);
    }

    #[test]
    fn test_disable_by_glob_keeps_order() {
        let mut catalog = RuleCatalog::builtin();
        catalog.apply(&RuleSetting::new("dml_*").disabled()).unwrap();
        assert_eq!(catalog.len(), 11);
        assert_eq!(
            catalog.iter().last().map(ConfiguredRule::name),
            Some("ddl_disable_drop_statement")
        );
    }

    #[test]
    fn test_unmatched_setting_is_ignored() {
        let mut catalog = RuleCatalog::builtin();
        catalog.apply(&RuleSetting::new("no_such_rule").disabled()).unwrap();
        assert_eq!(catalog.len(), 15);
    }

    #[test]
    fn test_param_fallback() {
        let mut params = RuleParams::new();
        params.insert("n".to_string(), Value::from(-3));
        assert_eq!(param_u64(&params, "n", 7), 7);
        assert_eq!(param_u64(&params, "missing", 7), 7);
    }
}
