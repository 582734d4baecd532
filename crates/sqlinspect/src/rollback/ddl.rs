//! Inverses of schema-changing statements.

use core::fmt;

use sqlinspect_core::ast::{
    AlterColumnAction, AlterSpec, AlterTableStatement, ColumnPosition, ConstraintKind,
    CreateDatabaseStatement, CreateIndexStatement, CreateTableStatement, DropDatabaseStatement,
    DropIndexStatement, DropTableStatement, IndexColumn, RenamePair, RenameTableStatement,
    TableConstraint, TableName, TableOption,
};
use sqlinspect_core::Statement;

use super::{Rollback, RollbackUnsupported};
use crate::catalog::{apply_alter_spec, requalify, CatalogView};
use crate::error::Result;

fn terminated(statement: impl fmt::Display) -> String {
    format!("{statement};")
}

pub(super) async fn rollback(
    view: &mut CatalogView<'_>,
    statement: &Statement,
) -> Result<Rollback> {
    match statement {
        Statement::CreateTable(create) => create_table(view, create).await,
        Statement::DropTable(drop) => drop_table(view, drop).await,
        Statement::AlterTable(alter) => alter_table(view, alter).await,
        Statement::RenameTable(rename) => rename_table(view, rename).await,
        Statement::CreateIndex(index) => create_index(view, index).await,
        Statement::DropIndex(index) => drop_index(view, index).await,
        Statement::CreateDatabase(create) => create_database(view, create).await,
        Statement::DropDatabase(_) => Ok(RollbackUnsupported::DropDatabase.into()),
        _ => Ok(Rollback::empty()),
    }
}

async fn create_table(
    view: &mut CatalogView<'_>,
    create: &CreateTableStatement,
) -> Result<Rollback> {
    let resolved = view.resolve(&create.table);
    let Some(schema) = resolved.schema.as_deref() else {
        return Ok(Rollback::empty());
    };
    if !view.schema_exists(schema).await? || view.table_exists(&resolved).await? {
        return Ok(Rollback::empty());
    }
    let drop = DropTableStatement {
        temporary: create.temporary,
        if_exists: true,
        tables: vec![resolved],
    };
    Ok(Rollback::statements(vec![terminated(drop)]))
}

async fn drop_table(view: &mut CatalogView<'_>, drop: &DropTableStatement) -> Result<Rollback> {
    let mut statements = Vec::new();
    for table in &drop.tables {
        let resolved = view.resolve(table);
        if let Some(text) = view.stored_definition(table).await? {
            if let Some(create) = requalify(&text, &resolved) {
                statements.push(create);
                continue;
            }
        }
        let Some(mut shape) = view.readable_shape(table).await? else {
            continue;
        };
        shape.table = resolved;
        shape.if_not_exists = false;
        statements.push(terminated(shape));
    }
    Ok(Rollback::statements(statements))
}

fn primary_key(shape: &CreateTableStatement) -> Option<TableConstraint> {
    if let Some(pk) = shape.constraints.iter().find(|c| c.is_primary_key()) {
        return Some(pk.clone());
    }
    let columns: Vec<IndexColumn> = shape
        .primary_key_columns()
        .into_iter()
        .map(IndexColumn::new)
        .collect();
    if columns.is_empty() {
        return None;
    }
    Some(TableConstraint::new(None, ConstraintKind::PrimaryKey, columns))
}

fn undo_add_constraint(
    shape: &CreateTableStatement,
    constraint: &TableConstraint,
) -> Option<AlterSpec> {
    match &constraint.kind {
        ConstraintKind::PrimaryKey => {
            (!shape.has_primary_key()).then_some(AlterSpec::DropPrimaryKey)
        }
        ConstraintKind::ForeignKey(_) => constraint
            .name
            .clone()
            .map(|name| AlterSpec::DropForeignKey { name }),
        ConstraintKind::Check(_) => None,
        ConstraintKind::Unique | ConstraintKind::Index | ConstraintKind::Fulltext => {
            // MySQL names an anonymous index after its first column.
            let name = constraint
                .name
                .clone()
                .or_else(|| constraint.columns.first().map(|c| c.name.clone()))?;
            shape
                .constraint(&name)
                .is_none()
                .then_some(AlterSpec::DropIndex { name })
        }
    }
}

/// Where a moved column has to go back to; `None` when it was not moved.
fn original_position(
    shape: &CreateTableStatement,
    name: &str,
    moved_to: Option<&ColumnPosition>,
) -> Option<ColumnPosition> {
    if moved_to.is_none() {
        return None;
    }
    match shape.column_position(name)? {
        0 => Some(ColumnPosition::First),
        i => Some(ColumnPosition::After(shape.columns[i - 1].name.clone())),
    }
}

fn restore_options(shape: &CreateTableStatement, options: &[TableOption]) -> Option<AlterSpec> {
    let previous: Vec<TableOption> = options
        .iter()
        .filter_map(|option| {
            shape
                .options
                .iter()
                .find(|old| old.key().eq_ignore_ascii_case(option.key()))
                .cloned()
        })
        .collect();
    (!previous.is_empty()).then_some(AlterSpec::Options(previous))
}

/// Returns the clauses undoing `spec`, given the shape just before it.
fn undo_spec(shape: &CreateTableStatement, spec: &AlterSpec) -> Vec<AlterSpec> {
    match spec {
        AlterSpec::AddColumns { columns, .. } => columns
            .iter()
            .filter(|column| shape.column(&column.name).is_none())
            .map(|column| AlterSpec::DropColumn {
                name: column.name.clone(),
            })
            .collect(),
        AlterSpec::DropColumn { name } => shape
            .column(name)
            .map(|column| AlterSpec::AddColumns {
                columns: vec![column.clone()],
                position: None,
            })
            .into_iter()
            .collect(),
        AlterSpec::ChangeColumn {
            old_name,
            column,
            position,
        } => shape
            .column(old_name)
            .map(|old| AlterSpec::ChangeColumn {
                old_name: column.name.clone(),
                column: old.clone(),
                position: original_position(shape, old_name, position.as_ref()),
            })
            .into_iter()
            .collect(),
        AlterSpec::ModifyColumn { column, position } => shape
            .column(&column.name)
            .map(|old| AlterSpec::ModifyColumn {
                column: old.clone(),
                position: original_position(shape, &column.name, position.as_ref()),
            })
            .into_iter()
            .collect(),
        AlterSpec::AlterColumn { name, action } => {
            let Some(column) = shape.column(name) else {
                return Vec::new();
            };
            let action = match (column.default_value(), action) {
                (Some(old), _) => AlterColumnAction::SetDefault(old.clone()),
                (None, AlterColumnAction::SetDefault(_)) => AlterColumnAction::DropDefault,
                (None, AlterColumnAction::DropDefault) => return Vec::new(),
            };
            vec![AlterSpec::AlterColumn {
                name: column.name.clone(),
                action,
            }]
        }
        AlterSpec::RenameColumn { from, to } => {
            if shape.column(from).is_none() {
                return Vec::new();
            }
            vec![AlterSpec::RenameColumn {
                from: to.clone(),
                to: from.clone(),
            }]
        }
        AlterSpec::AddConstraint(constraint) => {
            undo_add_constraint(shape, constraint).into_iter().collect()
        }
        AlterSpec::DropPrimaryKey => primary_key(shape)
            .map(AlterSpec::AddConstraint)
            .into_iter()
            .collect(),
        AlterSpec::DropIndex { name } if name.eq_ignore_ascii_case("PRIMARY") => {
            undo_spec(shape, &AlterSpec::DropPrimaryKey)
        }
        AlterSpec::DropIndex { name } => shape
            .constraint(name)
            .filter(|constraint| !constraint.is_foreign_key())
            .map(|constraint| AlterSpec::AddConstraint(constraint.clone()))
            .into_iter()
            .collect(),
        AlterSpec::DropForeignKey { name } => shape
            .constraint(name)
            .filter(|constraint| constraint.is_foreign_key())
            .map(|constraint| AlterSpec::AddConstraint(constraint.clone()))
            .into_iter()
            .collect(),
        AlterSpec::RenameIndex { from, to } => {
            if shape.constraint(from).is_none() {
                return Vec::new();
            }
            vec![AlterSpec::RenameIndex {
                from: to.clone(),
                to: from.clone(),
            }]
        }
        AlterSpec::Options(options) => restore_options(shape, options).into_iter().collect(),
        AlterSpec::RenameTable { .. } => Vec::new(),
    }
}

/// Walks the clauses forward against a working copy of the table, then
/// emits their inverses last to first in a single ALTER on the final name.
async fn alter_table(view: &mut CatalogView<'_>, alter: &AlterTableStatement) -> Result<Rollback> {
    let Some(mut shape) = view.readable_shape(&alter.table).await? else {
        return Ok(Rollback::empty());
    };
    let original = view.resolve(&alter.table);
    let mut inverses = Vec::new();
    for spec in &alter.specs {
        inverses.extend(undo_spec(&shape, spec));
        apply_alter_spec(&mut shape, spec);
    }
    inverses.reverse();

    let target = match alter.renamed_to() {
        Some(to) => {
            let to = view.resolve(to);
            if to != original {
                inverses.push(AlterSpec::RenameTable {
                    to: original.clone(),
                });
            }
            to
        }
        None => original,
    };
    if inverses.is_empty() {
        return Ok(Rollback::empty());
    }
    Ok(Rollback::statements(vec![terminated(
        AlterTableStatement::new(target, inverses),
    )]))
}

/// Replays the pairs in order: a source exists when an earlier pair moved
/// a table there or the catalog has it and no earlier pair moved it away.
/// A missing source fails the whole statement, which then has no inverse.
async fn rename_table(
    view: &mut CatalogView<'_>,
    rename: &RenameTableStatement,
) -> Result<Rollback> {
    let mut moved_in: Vec<TableName> = Vec::new();
    let mut moved_out: Vec<TableName> = Vec::new();
    let mut pairs = Vec::with_capacity(rename.pairs.len());
    for pair in &rename.pairs {
        let from = view.resolve(&pair.from);
        let to = view.resolve(&pair.to);
        let exists = match moved_in.iter().position(|name| *name == from) {
            Some(i) => {
                moved_in.swap_remove(i);
                true
            }
            None => !moved_out.contains(&from) && view.table_exists(&from).await?,
        };
        if !exists {
            return Ok(Rollback::empty());
        }
        moved_out.push(from.clone());
        moved_in.push(to.clone());
        pairs.push(RenamePair { from: to, to: from });
    }
    pairs.reverse();
    Ok(Rollback::statements(vec![terminated(RenameTableStatement {
        pairs,
    })]))
}

async fn create_index(
    view: &mut CatalogView<'_>,
    index: &CreateIndexStatement,
) -> Result<Rollback> {
    let Some(shape) = view.readable_shape(&index.table).await? else {
        return Ok(Rollback::empty());
    };
    if shape.constraint(&index.name).is_some() {
        return Ok(Rollback::empty());
    }
    let drop = DropIndexStatement {
        if_exists: false,
        name: index.name.clone(),
        table: view.resolve(&index.table),
    };
    Ok(Rollback::statements(vec![terminated(drop)]))
}

async fn drop_index(view: &mut CatalogView<'_>, index: &DropIndexStatement) -> Result<Rollback> {
    if index.name.eq_ignore_ascii_case("PRIMARY") {
        return Ok(RollbackUnsupported::DropKeyIndex.into());
    }
    let Some(shape) = view.readable_shape(&index.table).await? else {
        return Ok(Rollback::empty());
    };
    let Some(constraint) = shape.constraint(&index.name) else {
        return Ok(Rollback::empty());
    };
    if constraint.is_foreign_key() {
        return Ok(RollbackUnsupported::DropKeyIndex.into());
    }
    let alter = AlterTableStatement::new(
        view.resolve(&index.table),
        vec![AlterSpec::AddConstraint(constraint.clone())],
    );
    Ok(Rollback::statements(vec![terminated(alter)]))
}

async fn create_database(
    view: &mut CatalogView<'_>,
    create: &CreateDatabaseStatement,
) -> Result<Rollback> {
    if view.schema_exists(&create.name).await? {
        return Ok(Rollback::empty());
    }
    let drop = DropDatabaseStatement {
        if_exists: true,
        name: create.name.clone(),
    };
    Ok(Rollback::statements(vec![terminated(drop)]))
}
