//! Inverses of row-changing statements, built from live row snapshots.

use sqlinspect_core::ast::{
    CreateTableStatement, DeleteStatement, Expr, InsertSource, InsertStatement, Literal, OrderBy,
    Quoted, TableName, UpdateAssignment, UpdateStatement,
};
use sqlinspect_core::Statement;
use tracing::debug;

use super::{Rollback, RollbackUnsupported};
use crate::catalog::CatalogView;
use crate::config::InspectConfig;
use crate::connection::Row;
use crate::error::{ConnectionError, Result};

pub(super) async fn rollback(
    view: &mut CatalogView<'_>,
    statement: &Statement,
    config: &InspectConfig,
) -> Result<Rollback> {
    let Some(cap) = config.dml_rollback_cap() else {
        return Ok(Rollback::empty());
    };
    if uses_parameters(statement) {
        return Ok(RollbackUnsupported::Parameters.into());
    }
    match statement {
        Statement::Insert(insert) => insert_rollback(view, insert, cap).await,
        Statement::Delete(delete) => delete_rollback(view, delete, cap).await,
        Statement::Update(update) => update_rollback(view, update, cap).await,
        _ => Ok(Rollback::empty()),
    }
}

fn assigned_values(assignments: &[UpdateAssignment]) -> impl Iterator<Item = &Expr> {
    assignments.iter().map(|assignment| &assignment.value)
}

fn expressions(statement: &Statement) -> Vec<&Expr> {
    let mut exprs = Vec::new();
    match statement {
        Statement::Insert(insert) => {
            match &insert.source {
                InsertSource::Values(rows) => exprs.extend(rows.iter().flatten()),
                InsertSource::Set(assignments) => exprs.extend(assigned_values(assignments)),
                InsertSource::Query(_) => {}
            }
            exprs.extend(assigned_values(&insert.on_duplicate));
        }
        Statement::Update(update) => {
            exprs.extend(assigned_values(&update.assignments));
            exprs.extend(update.where_clause.iter());
            exprs.extend(update.limit.iter());
        }
        Statement::Delete(delete) => {
            exprs.extend(delete.where_clause.iter());
            exprs.extend(delete.limit.iter());
        }
        _ => {}
    }
    exprs
}

fn uses_parameters(statement: &Statement) -> bool {
    expressions(statement)
        .into_iter()
        .any(|expr| expr.has_parameter() || expr.has_user_variable())
}

/// Turns a fetched value back into a literal of the column's type.
fn value_literal(shape: &CreateTableStatement, column: &str, value: Option<&[u8]>) -> Literal {
    let Some(bytes) = value else {
        return Literal::Null;
    };
    let binary = shape
        .column(column)
        .is_some_and(|def| def.data_type.is_binary());
    if binary {
        return Literal::Blob(bytes.to_vec());
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => Literal::String(text.to_string()),
        Err(_) => Literal::Blob(bytes.to_vec()),
    }
}

fn key_filter<'a>(pairs: impl IntoIterator<Item = (&'a str, String)>) -> String {
    pairs
        .into_iter()
        .map(|(column, value)| format!("{} = {value}", Quoted(column)))
        .collect::<Vec<_>>()
        .join(" AND ")
}

async fn insert_rollback(
    view: &mut CatalogView<'_>,
    insert: &InsertStatement,
    cap: u64,
) -> Result<Rollback> {
    if insert.replace {
        return Ok(RollbackUnsupported::Replace.into());
    }
    if !insert.on_duplicate.is_empty() {
        return Ok(RollbackUnsupported::OnDuplicateKey.into());
    }
    let Some(shape) = view.readable_shape(&insert.table).await? else {
        return Ok(Rollback::empty());
    };
    let primary_key = shape.primary_key_columns();
    if primary_key.is_empty() {
        return Ok(RollbackUnsupported::NoPrimaryKey.into());
    }

    let rows: Vec<Vec<(&str, &Expr)>> = match &insert.source {
        InsertSource::Query(_) => return Ok(RollbackUnsupported::InsertSelect.into()),
        InsertSource::Values(rows) => {
            let columns: Vec<&str> = if insert.columns.is_empty() {
                shape.column_names()
            } else {
                insert.columns.iter().map(String::as_str).collect()
            };
            rows.iter()
                .map(|row| columns.iter().copied().zip(row.iter()).collect())
                .collect()
        }
        InsertSource::Set(assignments) => vec![assignments
            .iter()
            .map(|assignment| (assignment.column.as_str(), &assignment.value))
            .collect()],
    };
    if u64::try_from(rows.len()).unwrap_or(u64::MAX) > cap {
        return Ok(RollbackUnsupported::ExceededMaxRows.into());
    }

    let table = view.resolve(&insert.table).quoted();
    // Only a value written out in the text finds the same row again.
    let usable_key =
        |value: &Expr| value.is_literal_value() && *value != Expr::Literal(Literal::Null);
    let mut statements = Vec::with_capacity(rows.len());
    for row in rows {
        let mut key = Vec::with_capacity(primary_key.len());
        for column in &primary_key {
            let value = row
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(column))
                .map(|(_, value)| *value);
            match value {
                Some(value) if usable_key(value) => {
                    key.push((*column, value.to_string()));
                }
                _ => return Ok(RollbackUnsupported::InsertWithoutPrimaryKey.into()),
            }
        }
        statements.push(format!("DELETE FROM {table} WHERE {};", key_filter(key)));
    }
    Ok(Rollback::statements(statements))
}

/// The single table a DELETE or UPDATE changes, with what selects its rows.
struct Target<'a> {
    table: &'a TableName,
    alias: Option<&'a str>,
    where_clause: Option<&'a Expr>,
    order_by: &'a [OrderBy],
    limit: Option<&'a Expr>,
}

impl Target<'_> {
    fn from_clause(&self, quoted: &str) -> String {
        let mut sql = quoted.to_string();
        if let Some(alias) = self.alias {
            sql.push_str(&format!(" AS {}", Quoted(alias)));
        }
        if let Some(filter) = self.where_clause {
            sql.push_str(&format!(" WHERE {filter}"));
        }
        sql
    }

    fn limit(&self) -> Option<u64> {
        match self.limit {
            Some(Expr::Literal(literal)) => literal.as_u64(),
            _ => None,
        }
    }

    /// Fetches the rows the statement will change, `None` when there are
    /// more than `cap`.
    ///
    /// Unless the statement's own LIMIT is within the cap, the rows are
    /// counted first and the snapshot reads at most `cap + 1` of them.
    async fn snapshot(&self, view: &mut CatalogView<'_>, cap: u64) -> Result<Option<Vec<Row>>> {
        let quoted = view.resolve(self.table).quoted();
        let from = self.from_clause(&quoted);
        let limit = match self.limit() {
            Some(limit) if limit <= cap => limit,
            _ => {
                let rows = view.query(&format!("SELECT COUNT(*) FROM {from}")).await?;
                let count = rows
                    .first()
                    .and_then(|row| row.text_at(0))
                    .and_then(|text| text.trim().parse::<u64>().ok())
                    .ok_or_else(|| {
                        ConnectionError::UnexpectedShape(format!(
                            "row count of {quoted} is not a number"
                        ))
                    })?;
                debug!(table = %quoted, count, cap, "Counted rows to snapshot");
                if count > cap {
                    return Ok(None);
                }
                cap.saturating_add(1)
            }
        };
        let mut sql = format!("SELECT * FROM {from}");
        if !self.order_by.is_empty() {
            let order: Vec<String> = self.order_by.iter().map(ToString::to_string).collect();
            sql.push_str(&format!(" ORDER BY {}", order.join(", ")));
        }
        sql.push_str(&format!(" LIMIT {limit}"));
        let rows = view.query(&sql).await?;
        if u64::try_from(rows.len()).unwrap_or(u64::MAX) > cap {
            debug!(table = %quoted, cap, "Snapshot outgrew the row count");
            return Ok(None);
        }
        Ok(Some(rows))
    }
}

fn has_subquery(exprs: &[&Expr]) -> bool {
    exprs.iter().any(|expr| expr.has_subquery())
}

async fn delete_rollback(
    view: &mut CatalogView<'_>,
    delete: &DeleteStatement,
    cap: u64,
) -> Result<Rollback> {
    let Some((table, alias)) = delete.single_table() else {
        return Ok(RollbackUnsupported::MultiTable.into());
    };
    if has_subquery(&delete.where_clause.iter().collect::<Vec<_>>()) {
        return Ok(RollbackUnsupported::Subquery.into());
    }
    let Some(shape) = view.readable_shape(table).await? else {
        return Ok(Rollback::empty());
    };
    if !shape.has_primary_key() {
        return Ok(RollbackUnsupported::NoPrimaryKey.into());
    }
    let target = Target {
        table,
        alias,
        where_clause: delete.where_clause.as_ref(),
        order_by: &delete.order_by,
        limit: delete.limit.as_ref(),
    };
    let Some(rows) = target.snapshot(view, cap).await? else {
        return Ok(RollbackUnsupported::ExceededMaxRows.into());
    };

    let quoted = view.resolve(table).quoted();
    let statements = rows
        .iter()
        .map(|row| {
            let columns: Vec<String> = row
                .columns()
                .iter()
                .map(|column| Quoted(column).to_string())
                .collect();
            let values: Vec<String> = row
                .columns()
                .iter()
                .enumerate()
                .map(|(i, column)| {
                    value_literal(&shape, column, row.value_at(i).flatten()).to_string()
                })
                .collect();
            format!(
                "INSERT INTO {quoted} ({}) VALUES ({});",
                columns.join(", "),
                values.join(", ")
            )
        })
        .collect();
    Ok(Rollback::statements(statements))
}

async fn update_rollback(
    view: &mut CatalogView<'_>,
    update: &UpdateStatement,
    cap: u64,
) -> Result<Rollback> {
    let Some((table, alias)) = update.single_table() else {
        return Ok(RollbackUnsupported::MultiTable.into());
    };
    let mut filters: Vec<&Expr> = update.where_clause.iter().collect();
    filters.extend(assigned_values(&update.assignments));
    if has_subquery(&filters) {
        return Ok(RollbackUnsupported::Subquery.into());
    }
    let Some(shape) = view.readable_shape(table).await? else {
        return Ok(Rollback::empty());
    };
    let primary_key = shape.primary_key_columns();
    if primary_key.is_empty() {
        return Ok(RollbackUnsupported::NoPrimaryKey.into());
    }

    // The last assignment to a column wins.
    let assigned = |column: &str| {
        update
            .assignments
            .iter()
            .rev()
            .find(|assignment| assignment.column.eq_ignore_ascii_case(column))
    };
    let mut new_keys: Vec<(&str, String)> = Vec::new();
    for column in primary_key.iter().copied() {
        if let Some(assignment) = assigned(column) {
            if !assignment.value.is_literal_value() {
                return Ok(RollbackUnsupported::PrimaryKeyExpression.into());
            }
            new_keys.push((column, assignment.value.to_string()));
        }
    }
    let mut changed: Vec<&str> = Vec::new();
    for assignment in &update.assignments {
        if !changed
            .iter()
            .any(|column| column.eq_ignore_ascii_case(&assignment.column))
        {
            changed.push(&assignment.column);
        }
    }

    let target = Target {
        table,
        alias,
        where_clause: update.where_clause.as_ref(),
        order_by: &update.order_by,
        limit: update.limit.as_ref(),
    };
    let Some(rows) = target.snapshot(view, cap).await? else {
        return Ok(RollbackUnsupported::ExceededMaxRows.into());
    };

    let quoted = view.resolve(table).quoted();
    let old_value = |row: &Row, column: &str| {
        value_literal(&shape, column, row.get(column).flatten()).to_string()
    };
    let statements = rows
        .iter()
        .map(|row| {
            let set: Vec<String> = changed
                .iter()
                .copied()
                .map(|column| format!("{} = {}", Quoted(column), old_value(row, column)))
                .collect();
            let key = primary_key.iter().copied().map(|column| {
                let value = new_keys
                    .iter()
                    .find(|(name, _)| *name == column)
                    .map_or_else(|| old_value(row, column), |(_, value)| value.clone());
                (column, value)
            });
            format!(
                "UPDATE {quoted} SET {} WHERE {};",
                set.join(", "),
                key_filter(key)
            )
        })
        .collect();
    Ok(Rollback::statements(statements))
}
