//! Rules over schema-changing statements.

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use sqlinspect_core::ast::{
    AlterSpec, AlterTableStatement, ColumnDef, ColumnOption, CreateTableStatement,
};
use sqlinspect_core::lexer::Keyword;
use sqlinspect_core::Statement;

use super::{param_u64, ready, Rule, RuleParams};
use crate::audit::Level;
use crate::catalog::{apply_alter_spec, CatalogView};
use crate::error::Result;

fn single_param(key: &str, value: u64) -> RuleParams {
    let mut params = RuleParams::new();
    params.insert(key.to_string(), Value::from(value));
    params
}

/// Returns the CREATE TABLE of a statement unless it copies another table.
fn create_definition(statement: &Statement) -> Option<&CreateTableStatement> {
    match statement {
        Statement::CreateTable(create) if create.like.is_none() => Some(create),
        _ => None,
    }
}

/// Column definitions written out by a statement.
fn defined_columns(statement: &Statement) -> Vec<&ColumnDef> {
    match statement {
        Statement::CreateTable(create) => create.columns.iter().collect(),
        Statement::AlterTable(alter) => alter
            .specs
            .iter()
            .flat_map(|spec| match spec {
                AlterSpec::AddColumns { columns, .. } => columns.iter().collect(),
                AlterSpec::ChangeColumn { column, .. } | AlterSpec::ModifyColumn { column, .. } => {
                    vec![column]
                }
                _ => Vec::new(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Names of the objects a statement creates or renames to.
fn new_object_names(statement: &Statement) -> Vec<&str> {
    let mut names = Vec::new();
    match statement {
        Statement::CreateDatabase(create) => names.push(create.name.as_str()),
        Statement::CreateTable(create) => {
            names.push(create.table.name.as_str());
            names.extend(create.columns.iter().map(|c| c.name.as_str()));
            names.extend(create.index_names());
        }
        Statement::AlterTable(alter) => {
            for spec in &alter.specs {
                match spec {
                    AlterSpec::AddColumns { columns, .. } => {
                        names.extend(columns.iter().map(|c| c.name.as_str()));
                    }
                    AlterSpec::ChangeColumn { column, .. } => names.push(column.name.as_str()),
                    AlterSpec::AddConstraint(constraint) => {
                        names.extend(constraint.name.as_deref());
                    }
                    AlterSpec::RenameIndex { to, .. } | AlterSpec::RenameColumn { to, .. } => {
                        names.push(to.as_str());
                    }
                    AlterSpec::RenameTable { to } => names.push(to.name.as_str()),
                    _ => {}
                }
            }
        }
        Statement::RenameTable(rename) => {
            names.extend(rename.pairs.iter().map(|pair| pair.to.name.as_str()));
        }
        Statement::CreateIndex(index) => names.push(index.name.as_str()),
        _ => {}
    }
    names
}

fn index_count(definition: &CreateTableStatement) -> usize {
    let constraints = definition
        .constraints
        .iter()
        .filter(|c| c.is_index() || c.is_primary_key())
        .count();
    let inline_unique = definition
        .columns
        .iter()
        .filter(|c| c.options.contains(&ColumnOption::Unique))
        .count();
    let inline_primary = !definition.constraints.iter().any(|c| c.is_primary_key())
        && definition.columns.iter().any(ColumnDef::is_primary_key);
    constraints + inline_unique + usize::from(inline_primary)
}

fn adds_index(alter: &AlterTableStatement) -> bool {
    alter.specs.iter().any(|spec| {
        matches!(spec, AlterSpec::AddConstraint(c) if c.is_index() || c.is_primary_key())
    })
}

// ============================================================================
// CREATE TABLE shape
// ============================================================================

/// `CREATE TABLE` without `IF NOT EXISTS`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableWithoutIfNotExists;

impl Rule for TableWithoutIfNotExists {
    fn name(&self) -> &'static str {
        "ddl_check_table_without_if_not_exists"
    }

    fn description(&self) -> &'static str {
        "CREATE TABLE must use IF NOT EXISTS"
    }

    fn default_level(&self) -> Level {
        Level::Error
    }

    fn check<'a>(
        &'a self,
        _view: &'a mut CatalogView<'_>,
        statement: &'a Statement,
        _params: &'a RuleParams,
    ) -> BoxFuture<'a, Result<Vec<String>>> {
        let mut messages = Vec::new();
        if matches!(statement, Statement::CreateTable(create) if !create.if_not_exists) {
            messages.push("CREATE TABLE should use IF NOT EXISTS".to_string());
        }
        ready(messages)
    }
}

/// Tables created without a primary key.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimaryKeyNotExist;

impl Rule for PrimaryKeyNotExist {
    fn name(&self) -> &'static str {
        "ddl_check_pk_not_exist"
    }

    fn description(&self) -> &'static str {
        "Tables must have a primary key"
    }

    fn default_level(&self) -> Level {
        Level::Error
    }

    fn check<'a>(
        &'a self,
        _view: &'a mut CatalogView<'_>,
        statement: &'a Statement,
        _params: &'a RuleParams,
    ) -> BoxFuture<'a, Result<Vec<String>>> {
        let mut messages = Vec::new();
        if create_definition(statement).is_some_and(|create| !create.has_primary_key()) {
            messages.push("table must have a primary key".to_string());
        }
        ready(messages)
    }
}

/// Primary keys that are not `AUTO_INCREMENT`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimaryKeyWithoutAutoIncrement;

impl Rule for PrimaryKeyWithoutAutoIncrement {
    fn name(&self) -> &'static str {
        "ddl_check_pk_without_auto_increment"
    }

    fn description(&self) -> &'static str {
        "Primary keys must be AUTO_INCREMENT"
    }

    fn default_level(&self) -> Level {
        Level::Error
    }

    fn check<'a>(
        &'a self,
        _view: &'a mut CatalogView<'_>,
        statement: &'a Statement,
        _params: &'a RuleParams,
    ) -> BoxFuture<'a, Result<Vec<String>>> {
        let mut messages = Vec::new();
        if let Some(create) = create_definition(statement) {
            let key = create.primary_key_columns();
            let incremented = key
                .iter()
                .any(|name| create.column(name).is_some_and(ColumnDef::is_auto_increment));
            if !key.is_empty() && !incremented {
                messages.push("primary key should be AUTO_INCREMENT".to_string());
            }
        }
        ready(messages)
    }
}

/// Column definitions without a comment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnWithoutComment;

impl Rule for ColumnWithoutComment {
    fn name(&self) -> &'static str {
        "ddl_check_column_without_comment"
    }

    fn description(&self) -> &'static str {
        "Columns should have a comment"
    }

    fn default_level(&self) -> Level {
        Level::Notice
    }

    fn check<'a>(
        &'a self,
        _view: &'a mut CatalogView<'_>,
        statement: &'a Statement,
        _params: &'a RuleParams,
    ) -> BoxFuture<'a, Result<Vec<String>>> {
        let missing: Vec<&str> = defined_columns(statement)
            .into_iter()
            .filter(|column| column.comment().is_none_or(str::is_empty))
            .map(|column| column.name.as_str())
            .collect();
        let mut messages = Vec::new();
        if !missing.is_empty() {
            messages.push(format!("column {} should have a comment", missing.join(",")));
        }
        ready(messages)
    }
}

/// Tables created without a comment.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableWithoutComment;

impl Rule for TableWithoutComment {
    fn name(&self) -> &'static str {
        "ddl_check_table_without_comment"
    }

    fn description(&self) -> &'static str {
        "Tables should have a comment"
    }

    fn default_level(&self) -> Level {
        Level::Notice
    }

    fn check<'a>(
        &'a self,
        _view: &'a mut CatalogView<'_>,
        statement: &'a Statement,
        _params: &'a RuleParams,
    ) -> BoxFuture<'a, Result<Vec<String>>> {
        let mut messages = Vec::new();
        if let Some(create) = create_definition(statement) {
            if create.option_value("COMMENT").is_none_or(|c| c.is_empty()) {
                messages.push("table should have a comment".to_string());
            }
        }
        ready(messages)
    }
}

// ============================================================================
// Naming
// ============================================================================

/// Object names longer than `max_length` characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectNameLength;

impl Rule for ObjectNameLength {
    fn name(&self) -> &'static str {
        "ddl_check_object_name_length"
    }

    fn description(&self) -> &'static str {
        "Object names must not exceed max_length characters"
    }

    fn default_level(&self) -> Level {
        Level::Error
    }

    fn default_params(&self) -> RuleParams {
        single_param("max_length", 64)
    }

    fn check<'a>(
        &'a self,
        _view: &'a mut CatalogView<'_>,
        statement: &'a Statement,
        params: &'a RuleParams,
    ) -> BoxFuture<'a, Result<Vec<String>>> {
        let max = param_u64(params, "max_length", 64);
        let long: Vec<&str> = new_object_names(statement)
            .into_iter()
            .filter(|name| u64::try_from(name.chars().count()).unwrap_or(u64::MAX) > max)
            .collect();
        let mut messages = Vec::new();
        if !long.is_empty() {
            messages.push(format!(
                "object name {} is longer than {max} characters",
                long.join(",")
            ));
        }
        ready(messages)
    }
}

/// Object names that are reserved words.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectNameUsingKeyword;

impl Rule for ObjectNameUsingKeyword {
    fn name(&self) -> &'static str {
        "ddl_check_object_name_using_keyword"
    }

    fn description(&self) -> &'static str {
        "Object names must not be reserved words"
    }

    fn default_level(&self) -> Level {
        Level::Error
    }

    fn check<'a>(
        &'a self,
        _view: &'a mut CatalogView<'_>,
        statement: &'a Statement,
        _params: &'a RuleParams,
    ) -> BoxFuture<'a, Result<Vec<String>>> {
        let reserved: Vec<&str> = new_object_names(statement)
            .into_iter()
            .filter(|name| Keyword::from_str(name).is_some())
            .collect();
        let mut messages = Vec::new();
        if !reserved.is_empty() {
            messages.push(format!(
                "object name {} is a reserved keyword",
                reserved.join(",")
            ));
        }
        ready(messages)
    }
}

// ============================================================================
// Catalog-dependent
// ============================================================================

/// Tables ending up with more than `max_count` indexes.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexCount;

impl Rule for IndexCount {
    fn name(&self) -> &'static str {
        "ddl_check_index_count"
    }

    fn description(&self) -> &'static str {
        "Tables should not have more than max_count indexes"
    }

    fn default_level(&self) -> Level {
        Level::Notice
    }

    fn allow_offline(&self) -> bool {
        false
    }

    fn default_params(&self) -> RuleParams {
        single_param("max_count", 5)
    }

    fn check<'a>(
        &'a self,
        view: &'a mut CatalogView<'_>,
        statement: &'a Statement,
        params: &'a RuleParams,
    ) -> BoxFuture<'a, Result<Vec<String>>> {
        async move {
            let max = param_u64(params, "max_count", 5);
            let count = match statement {
                Statement::CreateTable(create) if create.like.is_none() => Some(index_count(create)),
                Statement::AlterTable(alter) if adds_index(alter) => {
                    view.readable_shape(&alter.table).await?.map(|mut shape| {
                        for spec in &alter.specs {
                            apply_alter_spec(&mut shape, spec);
                        }
                        index_count(&shape)
                    })
                }
                Statement::CreateIndex(index) => {
                    view.readable_shape(&index.table).await?.map(|mut shape| {
                        let spec = AlterSpec::AddConstraint(index.to_constraint());
                        apply_alter_spec(&mut shape, &spec);
                        index_count(&shape)
                    })
                }
                _ => None,
            };
            let mut messages = Vec::new();
            if let Some(count) = count {
                if u64::try_from(count).unwrap_or(u64::MAX) > max {
                    messages.push(format!("table has {count} indexes, more than {max}"));
                }
            }
            Ok(messages)
        }
        .boxed()
    }
}

/// Several ALTERs on the same table in one session.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlterTableNeedMerge;

impl Rule for AlterTableNeedMerge {
    fn name(&self) -> &'static str {
        "ddl_check_alter_table_need_merge"
    }

    fn description(&self) -> &'static str {
        "ALTERs on the same table should be merged into one"
    }

    fn default_level(&self) -> Level {
        Level::Notice
    }

    fn allow_offline(&self) -> bool {
        false
    }

    fn check<'a>(
        &'a self,
        view: &'a mut CatalogView<'_>,
        statement: &'a Statement,
        _params: &'a RuleParams,
    ) -> BoxFuture<'a, Result<Vec<String>>> {
        async move {
            let mut messages = Vec::new();
            if let Statement::AlterTable(alter) = statement {
                if !view.alter_history(&alter.table).await?.is_empty() {
                    messages.push(format!(
                        "table {} was already altered, merge the ALTER statements",
                        view.display_name(&alter.table)
                    ));
                }
            }
            Ok(messages)
        }
        .boxed()
    }
}

/// ALTER or DROP of tables larger than `size_mb`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableSize;

impl Rule for TableSize {
    fn name(&self) -> &'static str {
        "ddl_check_table_size"
    }

    fn description(&self) -> &'static str {
        "ALTER and DROP should not target tables larger than size_mb"
    }

    fn default_level(&self) -> Level {
        Level::Warn
    }

    fn allow_offline(&self) -> bool {
        false
    }

    fn default_params(&self) -> RuleParams {
        single_param("size_mb", 1024)
    }

    #[allow(clippy::cast_precision_loss)]
    fn check<'a>(
        &'a self,
        view: &'a mut CatalogView<'_>,
        statement: &'a Statement,
        params: &'a RuleParams,
    ) -> BoxFuture<'a, Result<Vec<String>>> {
        async move {
            let limit = param_u64(params, "size_mb", 1024);
            let tables = match statement {
                Statement::AlterTable(alter) => vec![&alter.table],
                Statement::DropTable(drop) => drop.tables.iter().collect(),
                _ => Vec::new(),
            };
            let mut large = Vec::new();
            for table in tables {
                if view
                    .table_size_mb(table)
                    .await?
                    .is_some_and(|size| size > limit as f64)
                {
                    large.push(view.display_name(table));
                }
            }
            let mut messages = Vec::new();
            if !large.is_empty() {
                messages.push(format!(
                    "table {} is larger than {limit} MB",
                    large.join(",")
                ));
            }
            Ok(messages)
        }
        .boxed()
    }
}

/// Any `DROP DATABASE` or `DROP TABLE`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisableDropStatement;

impl Rule for DisableDropStatement {
    fn name(&self) -> &'static str {
        "ddl_disable_drop_statement"
    }

    fn description(&self) -> &'static str {
        "DROP DATABASE and DROP TABLE are forbidden"
    }

    fn default_level(&self) -> Level {
        Level::Error
    }

    fn check<'a>(
        &'a self,
        _view: &'a mut CatalogView<'_>,
        statement: &'a Statement,
        _params: &'a RuleParams,
    ) -> BoxFuture<'a, Result<Vec<String>>> {
        let mut messages = Vec::new();
        if matches!(statement, Statement::DropDatabase(_) | Statement::DropTable(_)) {
            messages.push(format!("{} is not allowed", statement.kind()));
        }
        ready(messages)
    }
}
