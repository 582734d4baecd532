//! Table definitions: parsing stored text and folding ALTERs into them.

use sqlinspect_core::ast::{
    AlterColumnAction, AlterSpec, ColumnDef, ColumnPosition, ConstraintKind, CreateIndexStatement,
    CreateTableStatement, TableConstraint, TableName, TableOption,
};
use sqlinspect_core::{parse_statement, Statement};

/// Parses `SHOW CREATE TABLE` output.
///
/// Servers append options the grammar may not know (partitioning,
/// `STATS_PERSISTENT`, ...). On failure the text is retried cut after
/// each `)`, last one first, so those trailing options are dropped.
pub(crate) fn parse_create_table(text: &str) -> Result<CreateTableStatement, String> {
    let first_error = match parse_statement(text) {
        Ok(Statement::CreateTable(create)) => return Ok(create),
        Ok(other) => return Err(format!("expected CREATE TABLE, found {}", other.kind())),
        Err(error) => error.to_string(),
    };
    for (end, _) in text.rmatch_indices(')') {
        if let Ok(Statement::CreateTable(create)) = parse_statement(&text[..=end]) {
            return Ok(create);
        }
    }
    Err(first_error)
}

/// Rewrites the head of stored `CREATE TABLE` text to name `table`,
/// keeping everything from the column list on as the server wrote it.
pub(crate) fn requalify(text: &str, table: &TableName) -> Option<String> {
    let open = text.find('(')?;
    let (head, body) = text.split_at(open);
    let temporary = head.to_ascii_uppercase().contains("TEMPORARY");
    let body = body.trim_end().trim_end_matches(';').trim_end();
    let kind = if temporary { "TEMPORARY TABLE" } else { "TABLE" };
    Some(format!("CREATE {kind} {table} {body};"))
}

fn place(
    definition: &mut CreateTableStatement,
    column: ColumnDef,
    position: Option<&ColumnPosition>,
) {
    let at = match position {
        Some(ColumnPosition::First) => 0,
        Some(ColumnPosition::After(after)) => definition
            .column_position(after)
            .map_or(definition.columns.len(), |i| i + 1),
        None => definition.columns.len(),
    };
    definition.columns.insert(at, column);
}

fn rename_in_constraints(definition: &mut CreateTableStatement, from: &str, to: &str) {
    for constraint in &mut definition.constraints {
        for column in &mut constraint.columns {
            if column.name.eq_ignore_ascii_case(from) {
                column.name = to.to_string();
            }
        }
    }
}

fn replace_column(
    definition: &mut CreateTableStatement,
    old_name: &str,
    column: &ColumnDef,
    position: Option<&ColumnPosition>,
) {
    let Some(index) = definition.column_position(old_name) else {
        return;
    };
    if !old_name.eq_ignore_ascii_case(&column.name) {
        rename_in_constraints(definition, old_name, &column.name);
    }
    if position.is_some() {
        definition.columns.remove(index);
        place(definition, column.clone(), position);
    } else {
        definition.columns[index] = column.clone();
    }
}

fn set_option(options: &mut Vec<TableOption>, option: &TableOption) {
    match options
        .iter_mut()
        .find(|existing| existing.key().eq_ignore_ascii_case(option.key()))
    {
        Some(existing) => *existing = option.clone(),
        None => options.push(option.clone()),
    }
}

/// Adds an index to a definition unless one with that name exists.
pub(crate) fn add_constraint(definition: &mut CreateTableStatement, constraint: &TableConstraint) {
    if constraint.is_primary_key() && definition.has_primary_key() {
        return;
    }
    if let Some(name) = &constraint.name {
        if definition.constraint(name).is_some() {
            return;
        }
    }
    definition.constraints.push(constraint.clone());
}

/// Removes an index, or the primary key for `PRIMARY`.
pub(crate) fn drop_index(definition: &mut CreateTableStatement, name: &str) {
    if name.eq_ignore_ascii_case("PRIMARY") {
        definition.drop_primary_key();
    } else {
        definition
            .constraints
            .retain(|constraint| !(constraint.has_name(name) && !constraint.is_foreign_key()));
    }
}

/// Applies `CREATE INDEX` to a definition.
pub(crate) fn create_index(definition: &mut CreateTableStatement, index: &CreateIndexStatement) {
    add_constraint(definition, &index.to_constraint());
}

/// Applies one ALTER TABLE clause to a definition.
///
/// Clauses that do not fit the definition (dropping a missing column,
/// adding an existing one) are ignored; validation reports them.
pub(crate) fn apply_alter_spec(definition: &mut CreateTableStatement, spec: &AlterSpec) {
    match spec {
        AlterSpec::AddColumns { columns, position } => {
            for column in columns {
                if definition.column(&column.name).is_none() {
                    place(definition, column.clone(), position.as_ref());
                }
            }
        }
        AlterSpec::AddConstraint(constraint) => add_constraint(definition, constraint),
        AlterSpec::DropColumn { name } => {
            definition
                .columns
                .retain(|column| !column.name.eq_ignore_ascii_case(name));
            for constraint in &mut definition.constraints {
                constraint
                    .columns
                    .retain(|column| !column.name.eq_ignore_ascii_case(name));
            }
            definition.constraints.retain(|constraint| {
                !constraint.columns.is_empty() || matches!(constraint.kind, ConstraintKind::Check(_))
            });
        }
        AlterSpec::DropIndex { name } => drop_index(definition, name),
        AlterSpec::DropPrimaryKey => definition.drop_primary_key(),
        AlterSpec::DropForeignKey { name } => definition
            .constraints
            .retain(|constraint| !(constraint.is_foreign_key() && constraint.has_name(name))),
        AlterSpec::ChangeColumn {
            old_name,
            column,
            position,
        } => replace_column(definition, old_name, column, position.as_ref()),
        AlterSpec::ModifyColumn { column, position } => {
            replace_column(definition, &column.name, column, position.as_ref());
        }
        AlterSpec::AlterColumn { name, action } => {
            if let Some(column) = definition.column_mut(name) {
                match action {
                    AlterColumnAction::SetDefault(expr) => column.set_default(Some(expr.clone())),
                    AlterColumnAction::DropDefault => column.set_default(None),
                }
            }
        }
        AlterSpec::RenameIndex { from, to } => {
            if let Some(constraint) = definition
                .constraints
                .iter_mut()
                .find(|constraint| constraint.has_name(from))
            {
                constraint.name = Some(to.clone());
            }
        }
        AlterSpec::RenameColumn { from, to } => {
            if let Some(column) = definition.column_mut(from) {
                column.name.clone_from(to);
                rename_in_constraints(definition, from, to);
            }
        }
        AlterSpec::RenameTable { to } => definition.table = to.clone(),
        AlterSpec::Options(options) => {
            for option in options {
                set_option(&mut definition.options, option);
            }
        }
    }
}
