//! Online schema change advice for ALTERs on large tables.

use sqlinspect_core::ast::AlterTableStatement;
use tracing::debug;

use crate::catalog::Catalog;
use crate::config::InspectConfig;
use crate::error::Result;

/// Returns the `pt-online-schema-change` command to run instead of an
/// ALTER when the table is at least as large as the configured threshold.
///
/// Renames are never advised; nor is anything when the threshold is
/// negative or the size is unknown.
pub(crate) async fn advise_online_schema_change(
    catalog: &mut Catalog,
    alter: &AlterTableStatement,
    config: &InspectConfig,
) -> Result<Option<String>> {
    let Some(threshold) = config.osc_threshold_mb() else {
        return Ok(None);
    };
    if alter.renamed_to().is_some() {
        return Ok(None);
    }
    let Some(size) = catalog.table_size_mb(&alter.table).await? else {
        return Ok(None);
    };
    if size < threshold {
        return Ok(None);
    }
    let resolved = catalog.resolve(&alter.table);
    let specs: Vec<String> = alter.specs.iter().map(ToString::to_string).collect();
    debug!(table = %resolved, size_mb = size, "Advising online schema change");
    Ok(Some(format!(
        "[osc]pt-online-schema-change D={},t={} --alter=\"{}\" --execute",
        resolved.schema.as_deref().unwrap_or_default(),
        resolved.name,
        specs.join(", ").replace('"', "\\\"")
    )))
}
