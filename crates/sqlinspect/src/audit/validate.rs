//! Structural checks every statement goes through before the rules.
//!
//! Messages are fixed and reported at `error`. Offline, objects the
//! catalog has never heard of are neither present nor absent, so only
//! self-consistency is checked for them.

use sqlinspect_core::ast::{
    AlterSpec, ConstraintKind, CreateIndexStatement, CreateTableStatement, Expr, InsertSource,
    InsertStatement, SelectStatement, TableConstraint, TableName, TableRef, UpdateAssignment,
};
use sqlinspect_core::Statement;
use tracing::debug;

use super::{AuditResult, Level};
use crate::catalog::{apply_alter_spec, Catalog};
use crate::error::{InspectError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Problem {
    SchemaMissing,
    SchemaExists,
    TableMissing,
    TableExists,
    ColumnMissing,
    ColumnExists,
    ColumnAmbiguous,
    IndexMissing,
    IndexExists,
    DuplicateColumn,
    DuplicateIndex,
    IndexColumnMissing,
    DuplicatePrimaryKeyColumn,
}

impl Problem {
    fn message(self, names: &str) -> String {
        match self {
            Self::SchemaMissing => format!("schema {names} does not exist"),
            Self::SchemaExists => format!("schema {names} already exists"),
            Self::TableMissing => format!("table {names} does not exist"),
            Self::TableExists => format!("table {names} already exists"),
            Self::ColumnMissing => format!("column {names} does not exist"),
            Self::ColumnExists => format!("column {names} already exists"),
            Self::ColumnAmbiguous => format!("column {names} is ambiguous"),
            Self::IndexMissing => format!("index {names} does not exist"),
            Self::IndexExists => format!("index {names} already exists"),
            Self::DuplicateColumn => format!("duplicate column name {names}"),
            Self::DuplicateIndex => format!("duplicate index name {names}"),
            Self::IndexColumnMissing => format!("index column {names} does not exist"),
            Self::DuplicatePrimaryKeyColumn => format!("duplicate primary key column {names}"),
        }
    }
}

enum Finding {
    Names(Problem, Vec<String>),
    Fixed(String),
}

/// Collects problems, grouping the names reported under the same one.
#[derive(Default)]
struct Findings {
    items: Vec<Finding>,
}

impl Findings {
    fn note(&mut self, problem: Problem, name: impl Into<String>) {
        let name = name.into();
        for item in &mut self.items {
            if let Finding::Names(existing, names) = item {
                if *existing == problem {
                    if !names.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
                        names.push(name);
                    }
                    return;
                }
            }
        }
        self.items.push(Finding::Names(problem, vec![name]));
    }

    fn fixed(&mut self, message: impl Into<String>) {
        let message = message.into();
        let seen = self
            .items
            .iter()
            .any(|item| matches!(item, Finding::Fixed(m) if *m == message));
        if !seen {
            self.items.push(Finding::Fixed(message));
        }
    }

    fn report(self, result: &mut AuditResult) {
        for item in self.items {
            match item {
                Finding::Names(problem, names) => {
                    result.add(Level::Error, problem.message(&names.join(",")));
                }
                Finding::Fixed(message) => result.add(Level::Error, message),
            }
        }
    }
}

fn duplicates<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen: Vec<&str> = Vec::new();
    let mut repeated: Vec<&str> = Vec::new();
    for name in names {
        if seen.iter().any(|s| s.eq_ignore_ascii_case(name)) {
            if !repeated.iter().any(|s| s.eq_ignore_ascii_case(name)) {
                repeated.push(name);
            }
        } else {
            seen.push(name);
        }
    }
    repeated
}

/// Runs the structural checks for one statement against the catalog as
/// it is before the statement's effect.
pub(crate) async fn validate(
    catalog: &mut Catalog,
    statement: &Statement,
    result: &mut AuditResult,
) -> Result<()> {
    let mut findings = Findings::default();
    match statement {
        Statement::CreateDatabase(create) => {
            if !create.if_not_exists && catalog.schema_exists(&create.name).await? {
                findings.note(Problem::SchemaExists, create.name.as_str());
            }
        }
        Statement::DropDatabase(drop) => {
            if !drop.if_exists && schema_absent(catalog, &drop.name).await? {
                findings.note(Problem::SchemaMissing, drop.name.as_str());
            }
        }
        Statement::Use { schema } => {
            if schema_absent(catalog, schema).await? {
                findings.note(Problem::SchemaMissing, schema.as_str());
            }
        }
        Statement::CreateTable(create) => check_create_table(catalog, create, &mut findings).await?,
        Statement::AlterTable(alter) => {
            if require_table(catalog, &alter.table, &mut findings).await? {
                if let Some(mut shape) = table_shape(catalog, &alter.table).await? {
                    check_alter_specs(&mut shape, &alter.specs, &mut findings);
                }
                if let Some(to) = alter.renamed_to() {
                    if catalog.table_exists(to).await? {
                        findings.note(Problem::TableExists, catalog.display_name(to));
                    }
                }
            }
        }
        Statement::DropTable(drop) => {
            if !drop.if_exists {
                for table in &drop.tables {
                    require_table(catalog, table, &mut findings).await?;
                }
            }
        }
        Statement::RenameTable(rename) => {
            for pair in &rename.pairs {
                require_table(catalog, &pair.from, &mut findings).await?;
                if catalog.table_exists(&pair.to).await? {
                    findings.note(Problem::TableExists, catalog.display_name(&pair.to));
                }
            }
        }
        Statement::CreateIndex(index) => {
            if require_table(catalog, &index.table, &mut findings).await? {
                if let Some(shape) = table_shape(catalog, &index.table).await? {
                    check_create_index(&shape, index, &mut findings);
                }
            }
        }
        Statement::DropIndex(drop) => {
            if !drop.if_exists && require_table(catalog, &drop.table, &mut findings).await? {
                if let Some(shape) = table_shape(catalog, &drop.table).await? {
                    check_alter_spec(
                        &shape,
                        &AlterSpec::DropIndex {
                            name: drop.name.clone(),
                        },
                        &mut findings,
                    );
                }
            }
        }
        Statement::Insert(insert) => check_insert(catalog, insert, &mut findings).await?,
        Statement::Update(update) => {
            let mut scope = Scope::default();
            if scope.load(catalog, &update.tables, &mut findings).await? {
                for assignment in &update.assignments {
                    scope.check_assignment(assignment, &mut findings);
                }
                if let Some(filter) = &update.where_clause {
                    scope.check_expr(filter, &mut findings);
                }
            }
        }
        Statement::Delete(delete) => {
            let mut scope = Scope::default();
            if scope.load(catalog, &delete.from, &mut findings).await? {
                if let Some(filter) = &delete.where_clause {
                    scope.check_expr(filter, &mut findings);
                }
            }
        }
        Statement::Select(select) => check_select_tables(catalog, select, &mut findings).await?,
        Statement::Unparsed { reason, .. } => {
            debug!(reason = %reason, "Statement not understood");
            findings.fixed("syntax error or unsupported construct, verify manually");
        }
        Statement::Set(_) | Statement::Transaction(_) => {}
    }
    findings.report(result);
    Ok(())
}

// ============================================================================
// Existence
// ============================================================================

/// Returns true when the schema is known not to exist.
async fn schema_absent(catalog: &mut Catalog, name: &str) -> Result<bool> {
    if catalog.schema_exists(name).await? {
        return Ok(false);
    }
    if !catalog.is_offline() {
        return Ok(true);
    }
    let key = catalog.key(name);
    Ok(catalog.schema_entry(&key).is_some())
}

/// Reports a missing schema or table. Returns true when later checks on
/// the table can go ahead, i.e. the table exists or is unknown offline.
async fn require_table(
    catalog: &mut Catalog,
    table: &TableName,
    findings: &mut Findings,
) -> Result<bool> {
    let resolved = catalog.resolve(table);
    let Some(schema) = resolved.schema.as_deref() else {
        findings.fixed("no schema selected");
        return Ok(false);
    };
    if schema_absent(catalog, schema).await? {
        findings.note(Problem::SchemaMissing, schema);
        return Ok(false);
    }
    if catalog.table_exists(&resolved).await? {
        return Ok(true);
    }
    let key = catalog.key(schema);
    if catalog.is_offline() && catalog.schema_entry(&key).is_none() {
        return Ok(true);
    }
    findings.note(Problem::TableMissing, catalog.display_name(&resolved));
    Ok(false)
}

/// Returns the current shape of a table when it is known and readable.
async fn table_shape(
    catalog: &mut Catalog,
    table: &TableName,
) -> Result<Option<CreateTableStatement>> {
    match catalog.create_table_shape(table).await {
        Ok(shape) => Ok(shape),
        Err(InspectError::UnparsableDefinition { table, .. }) => {
            debug!(table = %table, "Skipping column checks");
            Ok(None)
        }
        Err(error) => Err(error),
    }
}

async fn check_select_tables(
    catalog: &mut Catalog,
    select: &SelectStatement,
    findings: &mut Findings,
) -> Result<()> {
    let mut tables: Vec<TableName> = select
        .tables()
        .into_iter()
        .map(|(name, _)| name.clone())
        .collect();
    for part in &select.unions {
        tables.extend(part.select.tables().into_iter().map(|(name, _)| name.clone()));
    }
    for table in &tables {
        require_table(catalog, table, findings).await?;
    }
    Ok(())
}

// ============================================================================
// CREATE TABLE and indexes
// ============================================================================

async fn check_create_table(
    catalog: &mut Catalog,
    create: &CreateTableStatement,
    findings: &mut Findings,
) -> Result<()> {
    let resolved = catalog.resolve(&create.table);
    let Some(schema) = resolved.schema.as_deref() else {
        findings.fixed("no schema selected");
        return Ok(());
    };
    if schema_absent(catalog, schema).await? {
        findings.note(Problem::SchemaMissing, schema);
    } else if !create.if_not_exists && catalog.table_exists(&resolved).await? {
        findings.note(Problem::TableExists, catalog.display_name(&resolved));
    }
    match &create.like {
        Some(source) => {
            require_table(catalog, source, findings).await?;
        }
        None => check_definition(create, findings),
    }
    Ok(())
}

fn check_index_columns(
    shape: &CreateTableStatement,
    constraint: &TableConstraint,
    findings: &mut Findings,
) {
    if matches!(constraint.kind, ConstraintKind::Check(_)) {
        return;
    }
    for column in &constraint.columns {
        if shape.column(&column.name).is_none() {
            findings.note(Problem::IndexColumnMissing, column.name.as_str());
        }
    }
    for column in duplicates(constraint.column_names()) {
        if constraint.is_primary_key() {
            findings.note(Problem::DuplicatePrimaryKeyColumn, column);
        } else {
            findings.fixed(format!(
                "index {} has duplicate column {column}",
                constraint.name.as_deref().unwrap_or("(anonymous)")
            ));
        }
    }
}

fn check_definition(create: &CreateTableStatement, findings: &mut Findings) {
    for column in duplicates(create.columns.iter().map(|c| c.name.as_str())) {
        findings.note(Problem::DuplicateColumn, column);
    }
    let primary_keys = create.columns.iter().filter(|c| c.is_primary_key()).count()
        + create.constraints.iter().filter(|c| c.is_primary_key()).count();
    if primary_keys > 1 {
        findings.fixed("only one primary key is allowed");
    }
    for name in duplicates(create.index_names()) {
        findings.note(Problem::DuplicateIndex, name);
    }
    for constraint in &create.constraints {
        check_index_columns(create, constraint, findings);
    }
}

fn check_new_constraint(
    shape: &CreateTableStatement,
    constraint: &TableConstraint,
    findings: &mut Findings,
) {
    if constraint.is_primary_key() && shape.has_primary_key() {
        findings.fixed("primary key already exists, cannot add another");
    }
    if let Some(name) = &constraint.name {
        if shape.constraint(name).is_some() {
            findings.note(Problem::IndexExists, name.as_str());
        }
    }
    check_index_columns(shape, constraint, findings);
}

fn check_create_index(
    shape: &CreateTableStatement,
    index: &CreateIndexStatement,
    findings: &mut Findings,
) {
    check_new_constraint(shape, &index.to_constraint(), findings);
}

// ============================================================================
// ALTER TABLE
// ============================================================================

/// Clause groups are checked in a fixed order, each against the shape
/// left by the groups before it.
const fn clause_rank(spec: &AlterSpec) -> u8 {
    match spec {
        AlterSpec::DropColumn { .. } => 0,
        AlterSpec::ChangeColumn { .. } | AlterSpec::RenameColumn { .. } => 1,
        AlterSpec::AddColumns { .. } => 2,
        AlterSpec::AlterColumn { .. } | AlterSpec::ModifyColumn { .. } => 3,
        AlterSpec::DropPrimaryKey => 4,
        AlterSpec::DropIndex { .. } | AlterSpec::DropForeignKey { .. } => 5,
        AlterSpec::RenameIndex { .. } => 6,
        AlterSpec::AddConstraint(_) => 7,
        AlterSpec::RenameTable { .. } | AlterSpec::Options(_) => 8,
    }
}

fn check_alter_specs(shape: &mut CreateTableStatement, specs: &[AlterSpec], findings: &mut Findings) {
    let mut ordered: Vec<&AlterSpec> = specs.iter().collect();
    ordered.sort_by_key(|spec| clause_rank(spec));
    for spec in ordered {
        check_alter_spec(shape, spec, findings);
        apply_alter_spec(shape, spec);
    }
}

fn check_renamed_column(
    shape: &CreateTableStatement,
    from: &str,
    to: &str,
    findings: &mut Findings,
) {
    if shape.column(from).is_none() {
        findings.note(Problem::ColumnMissing, from);
    } else if !from.eq_ignore_ascii_case(to) && shape.column(to).is_some() {
        findings.note(Problem::ColumnExists, to);
    }
}

fn check_alter_spec(shape: &CreateTableStatement, spec: &AlterSpec, findings: &mut Findings) {
    match spec {
        AlterSpec::DropColumn { name } | AlterSpec::AlterColumn { name, .. } => {
            if shape.column(name).is_none() {
                findings.note(Problem::ColumnMissing, name.as_str());
            }
        }
        AlterSpec::ModifyColumn { column, .. } => {
            if shape.column(&column.name).is_none() {
                findings.note(Problem::ColumnMissing, column.name.as_str());
            }
        }
        AlterSpec::ChangeColumn {
            old_name, column, ..
        } => check_renamed_column(shape, old_name, &column.name, findings),
        AlterSpec::RenameColumn { from, to } => check_renamed_column(shape, from, to, findings),
        AlterSpec::AddColumns { columns, .. } => {
            for column in columns {
                if shape.column(&column.name).is_some() {
                    findings.note(Problem::ColumnExists, column.name.as_str());
                }
            }
            for column in duplicates(columns.iter().map(|c| c.name.as_str())) {
                findings.note(Problem::DuplicateColumn, column);
            }
        }
        AlterSpec::DropPrimaryKey => {
            if !shape.has_primary_key() {
                findings.fixed("no primary key exists, cannot drop it");
            }
        }
        AlterSpec::DropIndex { name } => {
            if name.eq_ignore_ascii_case("PRIMARY") {
                if !shape.has_primary_key() {
                    findings.fixed("no primary key exists, cannot drop it");
                }
            } else if !shape
                .constraints
                .iter()
                .any(|c| c.has_name(name) && !c.is_foreign_key())
            {
                findings.note(Problem::IndexMissing, name.as_str());
            }
        }
        AlterSpec::DropForeignKey { name } => {
            if !shape
                .constraints
                .iter()
                .any(|c| c.has_name(name) && c.is_foreign_key())
            {
                findings.note(Problem::IndexMissing, name.as_str());
            }
        }
        AlterSpec::RenameIndex { from, to } => {
            if shape.constraint(from).is_none() {
                findings.note(Problem::IndexMissing, from.as_str());
            } else if !from.eq_ignore_ascii_case(to) && shape.constraint(to).is_some() {
                findings.note(Problem::IndexExists, to.as_str());
            }
        }
        AlterSpec::AddConstraint(constraint) => check_new_constraint(shape, constraint, findings),
        AlterSpec::RenameTable { .. } | AlterSpec::Options(_) => {}
    }
}

// ============================================================================
// DML
// ============================================================================

async fn check_insert(
    catalog: &mut Catalog,
    insert: &InsertStatement,
    findings: &mut Findings,
) -> Result<()> {
    if let InsertSource::Query(select) = &insert.source {
        check_select_tables(catalog, select, findings).await?;
    }
    if !require_table(catalog, &insert.table, findings).await? {
        return Ok(());
    }
    let shape = table_shape(catalog, &insert.table).await?;

    let named: Vec<&str> = match &insert.source {
        InsertSource::Set(assignments) => assignments.iter().map(|a| a.column.as_str()).collect(),
        _ => insert.columns.iter().map(String::as_str).collect(),
    };
    for column in duplicates(named.iter().copied()) {
        findings.note(Problem::DuplicateColumn, column);
    }
    if let Some(shape) = &shape {
        for column in &named {
            if shape.column(column).is_none() {
                findings.note(Problem::ColumnMissing, *column);
            }
        }
    }

    let expected = if named.is_empty() {
        shape.as_ref().map(|shape| shape.columns.len())
    } else {
        Some(named.len())
    };
    let Some(expected) = expected else {
        return Ok(());
    };
    let mismatch = match &insert.source {
        InsertSource::Values(rows) => rows.iter().any(|row| row.len() != expected),
        InsertSource::Query(select) => !select.has_wildcard() && select.columns.len() != expected,
        InsertSource::Set(_) => false,
    };
    if mismatch {
        findings.fixed("column count does not match value count");
    }
    Ok(())
}

struct ScopeTable {
    name: String,
    alias: Option<String>,
    shape: Option<CreateTableStatement>,
}

impl ScopeTable {
    fn answers_to(&self, qualifier: &str) -> bool {
        match &self.alias {
            Some(alias) => alias.eq_ignore_ascii_case(qualifier),
            None => self.name.eq_ignore_ascii_case(qualifier),
        }
    }
}

/// The tables an UPDATE or DELETE reads, for resolving column references.
#[derive(Default)]
struct Scope {
    tables: Vec<ScopeTable>,
}

impl Scope {
    /// Loads every referenced table. Returns false when one of them is
    /// missing, in which case column references are not checked.
    async fn load(
        &mut self,
        catalog: &mut Catalog,
        refs: &[TableRef],
        findings: &mut Findings,
    ) -> Result<bool> {
        let mut complete = true;
        for table_ref in refs {
            if table_ref.has_subquery() {
                complete = false;
            }
            for (name, alias) in table_ref.tables() {
                if !require_table(catalog, name, findings).await? {
                    complete = false;
                    continue;
                }
                let shape = table_shape(catalog, name).await?;
                self.tables.push(ScopeTable {
                    name: name.name.clone(),
                    alias: alias.map(str::to_string),
                    shape,
                });
            }
        }
        Ok(complete)
    }

    fn check_column(&self, qualifier: Option<&str>, column: &str, findings: &mut Findings) {
        if let Some(qualifier) = qualifier {
            let label = format!("{qualifier}.{column}");
            match self.tables.iter().find(|t| t.answers_to(qualifier)) {
                None => findings.note(Problem::ColumnMissing, label),
                Some(table) => {
                    if table
                        .shape
                        .as_ref()
                        .is_some_and(|shape| shape.column(column).is_none())
                    {
                        findings.note(Problem::ColumnMissing, label);
                    }
                }
            }
            return;
        }
        let mut holders = 0;
        let mut unknown = false;
        for table in &self.tables {
            match &table.shape {
                Some(shape) if shape.column(column).is_some() => holders += 1,
                Some(_) => {}
                None => unknown = true,
            }
        }
        if holders > 1 {
            findings.note(Problem::ColumnAmbiguous, column);
        } else if holders == 0 && !unknown {
            findings.note(Problem::ColumnMissing, column);
        }
    }

    fn check_assignment(&self, assignment: &UpdateAssignment, findings: &mut Findings) {
        self.check_column(assignment.table.as_deref(), &assignment.column, findings);
        self.check_expr(&assignment.value, findings);
    }

    fn check_expr(&self, expr: &Expr, findings: &mut Findings) {
        for column in expr.columns() {
            if let Expr::Column { table, name, .. } = column {
                self.check_column(table.as_deref(), name, findings);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlinspect_core::parse_statements;

    fn validate_offline(catalog: &mut Catalog, sql: &str) -> AuditResult {
        let statement = parse_statements(sql).unwrap().remove(0).statement;
        let mut result = AuditResult::new();
        tokio_test::block_on(validate(catalog, &statement, &mut result)).unwrap();
        tokio_test::block_on(catalog.apply_effect(&statement)).unwrap();
        result
    }

    #[test]
    fn test_duplicates_are_case_insensitive() {
        assert_eq!(duplicates(["a", "B", "b", "A", "b"]), ["b", "A"]);
        assert!(duplicates(["a", "b"]).is_empty());
    }

    #[test]
    fn test_names_are_grouped() {
        let mut findings = Findings::default();
        findings.note(Problem::ColumnMissing, "a");
        findings.fixed("no schema selected");
        findings.note(Problem::ColumnMissing, "b");
        findings.note(Problem::ColumnMissing, "a");
        let mut result = AuditResult::new();
        findings.report(&mut result);
        assert_eq!(
            result.to_string(),
            "[error]column a,b does not exist\n[error]no schema selected"
        );
    }

    #[test]
    fn test_create_table_self_consistency() {
        let mut catalog = Catalog::new(None);
        let result = validate_offline(
            &mut catalog,
            "CREATE TABLE db1.t1 (id int PRIMARY KEY, v int, v int, \
             PRIMARY KEY (id, id), KEY idx_1 (w), KEY idx_1 (v, v))",
        );
        assert!(result.contains("duplicate column name v"));
        assert!(result.contains("only one primary key is allowed"));
        assert!(result.contains("duplicate index name idx_1"));
        assert!(result.contains("index column w does not exist"));
        assert!(result.contains("duplicate primary key column id"));
        assert!(result.contains("index idx_1 has duplicate column v"));
    }

    #[test]
    fn test_offline_unknown_table_is_not_reported() {
        let mut catalog = Catalog::new(None);
        let result = validate_offline(&mut catalog, "ALTER TABLE db1.t1 ADD COLUMN v int");
        assert!(result.is_empty());
        let result = validate_offline(&mut catalog, "UPDATE db1.t1 SET v = 1");
        assert!(result.is_empty());
    }

    #[test]
    fn test_offline_session_objects_are_checked() {
        let mut catalog = Catalog::new(None);
        validate_offline(&mut catalog, "CREATE TABLE db1.t1 (id int, v int)");
        let result = validate_offline(
            &mut catalog,
            "ALTER TABLE db1.t1 ADD COLUMN v int, DROP COLUMN w, DROP INDEX idx_9",
        );
        assert!(result.contains("column v already exists"));
        assert!(result.contains("column w does not exist"));
        assert!(result.contains("index idx_9 does not exist"));
        let result = validate_offline(&mut catalog, "INSERT INTO db1.t1 VALUES (1)");
        assert!(result.contains("column count does not match value count"));
        let result = validate_offline(&mut catalog, "DROP TABLE db1.t2");
        assert!(result.contains("table db1.t2 does not exist"));
    }

    #[test]
    fn test_alter_groups_run_in_order() {
        let mut catalog = Catalog::new(None);
        validate_offline(&mut catalog, "CREATE TABLE db1.t1 (id int, v int)");
        // The drop runs first, so the add of the same name is fine.
        let result = validate_offline(
            &mut catalog,
            "ALTER TABLE db1.t1 ADD COLUMN v bigint, DROP COLUMN v",
        );
        assert!(result.is_empty(), "{result}");
    }

    #[test]
    fn test_unqualified_table_without_schema() {
        let mut catalog = Catalog::new(None);
        let result = validate_offline(&mut catalog, "DROP TABLE t1");
        assert!(result.contains("no schema selected"));
    }

    #[test]
    fn test_unparsed_statement() {
        let mut catalog = Catalog::new(None);
        let result = validate_offline(&mut catalog, "CREATE VIEW v AS SELECT 1");
        assert!(result.contains("syntax error or unsupported construct, verify manually"));
        assert_eq!(result.level(), Level::Error);
    }

    #[test]
    fn test_ambiguous_column() {
        let mut catalog = Catalog::new(None);
        validate_offline(&mut catalog, "CREATE TABLE db1.a (id int, v int)");
        validate_offline(&mut catalog, "CREATE TABLE db1.b (id int, w int)");
        let result = validate_offline(
            &mut catalog,
            "UPDATE db1.a AS x JOIN db1.b AS y ON x.id = y.id SET v = 1 WHERE id = 2 AND y.z = 3",
        );
        assert!(result.contains("column id is ambiguous"));
        assert!(result.contains("column y.z does not exist"));
        assert!(!result.contains("column v does not exist"));
    }
}
