mod common;

use std::sync::Arc;

use common::*;
use sqlinspect::prelude::*;
use sqlinspect_core::parse_statement;

fn explain_sql(sql: &str) -> String {
    format!("EXPLAIN {}", parse_statement(sql).unwrap())
}

// ====================================================================
// Catalog-dependent rules
// ====================================================================

#[tokio::test]
async fn test_alter_table_need_merge() {
    let mock = Arc::new(fixture());
    let mut session = session(&mock);

    let results = session
        .audit_batch(
            "ALTER TABLE exist_db.exist_tb_1 ADD COLUMN c1 int; \
             ALTER TABLE exist_db.exist_tb_2 ADD COLUMN c2 int; \
             ALTER TABLE exist_db.exist_tb_1 ADD COLUMN c3 int",
        )
        .await
        .unwrap();
    assert!(!results[0].1.has_rule("ddl_check_alter_table_need_merge"));
    assert!(!results[1].1.has_rule("ddl_check_alter_table_need_merge"));
    assert!(results[2]
        .1
        .contains("table exist_db.exist_tb_1 was already altered, merge the ALTER statements"));
}

#[tokio::test]
async fn test_index_count_counts_existing_indexes() {
    let mock = Arc::new(fixture());
    let config = InspectConfig {
        rules: vec![RuleSetting::new("ddl_check_index_count").param("max_count", 2)],
        ..InspectConfig::default()
    };
    let mut session = session_with(&mock, config);

    let result = session
        .audit("ALTER TABLE exist_db.exist_tb_1 ADD INDEX idx_v2 (v2)")
        .await
        .unwrap();
    assert!(result.contains("table has 3 indexes, more than 2"));

    let result = session
        .audit("CREATE INDEX idx_v1 ON exist_db.exist_tb_2 (v1)")
        .await
        .unwrap();
    assert!(!result.has_rule("ddl_check_index_count"));
}

#[tokio::test]
async fn test_table_size() {
    let mock = Arc::new(
        fixture().rows(&stats_sql("exist_db", "exist_tb_2"), stats("300.0", "5000")),
    );
    let config = InspectConfig {
        rules: vec![RuleSetting::new("ddl_check_table_size").param("size_mb", 100)],
        ..InspectConfig::default()
    };

    let result = session_with(&mock, config)
        .audit("DROP TABLE exist_db.exist_tb_1, exist_db.exist_tb_2")
        .await
        .unwrap();
    assert!(result.contains("table exist_db.exist_tb_2 is larger than 100 MB"));
    assert!(result.contains("DROP TABLE is not allowed"));
}

#[tokio::test]
async fn test_explain_full_scan() {
    let sql = "UPDATE exist_db.exist_tb_1 SET v2 = 'x' WHERE v2 = 'y'";
    let mock = Arc::new(fixture().rows(
        &explain_sql(sql),
        vec![row(&[
            ("table", Some("exist_tb_1")),
            ("type", Some("ALL")),
            ("rows", Some("20000")),
        ])],
    ));

    let result = session(&mock).audit(sql).await.unwrap();
    assert!(result.contains("full table scan on exist_tb_1 over 20000 rows"));
    assert_eq!(result.level(), Level::Warn);
}

#[tokio::test]
async fn test_explain_below_threshold() {
    let sql = "DELETE FROM exist_db.exist_tb_1 WHERE v2 = 'y'";
    let mock = Arc::new(fixture().rows(
        &explain_sql(sql),
        vec![row(&[
            ("table", Some("exist_tb_1")),
            ("type", Some("ALL")),
            ("rows", Some("20")),
        ])],
    ));

    let result = session(&mock).audit(sql).await.unwrap();
    assert!(!result.has_rule("dml_check_explain_access_type_all"));
}

// ====================================================================
// Statement-only rules
// ====================================================================

#[tokio::test]
async fn test_create_table_rules() {
    let mock = Arc::new(fixture());

    let result = session(&mock)
        .audit("CREATE TABLE exist_db.t9 (v int)")
        .await
        .unwrap();
    assert!(result.has_rule("ddl_check_table_without_if_not_exists"));
    assert!(result.has_rule("ddl_check_pk_not_exist"));
    assert!(result.has_rule("ddl_check_column_without_comment"));
    assert!(result.has_rule("ddl_check_table_without_comment"));
    assert_eq!(result.level(), Level::Error);
}

#[tokio::test]
async fn test_dml_rules() {
    let mock = Arc::new(fixture());
    let mut session = session(&mock);

    let result = session
        .audit("UPDATE exist_db.exist_tb_1 SET v2 = 'x'")
        .await
        .unwrap();
    assert!(result.has_rule("dml_check_where_is_invalid"));

    let result = session
        .audit("DELETE FROM exist_db.exist_tb_1 WHERE 1 = 1")
        .await
        .unwrap();
    assert!(result.has_rule("dml_check_where_is_invalid"));

    let result = session
        .audit("SELECT * FROM exist_db.exist_tb_1 WHERE id = 1")
        .await
        .unwrap();
    assert!(result.has_rule("dml_disable_select_all_column"));
}

// ====================================================================
// Configuration
// ====================================================================

#[tokio::test]
async fn test_disabled_rules_do_not_run() {
    let mock = Arc::new(fixture());
    let config = InspectConfig {
        rules: vec![RuleSetting::new("ddl_*").disabled()],
        ..InspectConfig::default()
    };

    let result = session_with(&mock, config)
        .audit("CREATE TABLE exist_db.t9 (v int)")
        .await
        .unwrap();
    assert!(result
        .messages()
        .iter()
        .all(|message| message.rule.is_none()));
}

#[tokio::test]
async fn test_level_override() {
    let mock = Arc::new(fixture());
    let config = InspectConfig {
        rules: vec![RuleSetting::new("ddl_disable_drop_statement").level(Level::Notice)],
        ..InspectConfig::default()
    };

    let result = session_with(&mock, config)
        .audit("DROP TABLE exist_db.exist_tb_2")
        .await
        .unwrap();
    let message = result
        .messages()
        .iter()
        .find(|message| message.rule.as_deref() == Some("ddl_disable_drop_statement"))
        .unwrap();
    assert_eq!(message.level, Level::Notice);
    assert_eq!(message.message, "DROP TABLE is not allowed");
}

#[tokio::test]
async fn test_custom_rule() {
    #[derive(Debug)]
    struct NoDelete;

    impl Rule for NoDelete {
        fn name(&self) -> &'static str {
            "custom_no_delete"
        }

        fn description(&self) -> &'static str {
            "DELETE is not allowed"
        }

        fn default_level(&self) -> Level {
            Level::Warn
        }

        fn check<'a>(
            &'a self,
            _view: &'a mut CatalogView<'_>,
            statement: &'a sqlinspect_core::Statement,
            _params: &'a RuleParams,
        ) -> futures::future::BoxFuture<'a, Result<Vec<String>>> {
            let mut messages = Vec::new();
            if matches!(statement, sqlinspect_core::Statement::Delete(_)) {
                messages.push("use a soft delete".to_string());
            }
            Box::pin(futures::future::ready(Ok(messages)))
        }
    }

    let mock = Arc::new(fixture());
    let connection: Arc<dyn Connection> = mock.clone();
    let rules = RuleCatalog::empty().with_rule(NoDelete);
    let mut session = Session::new(
        Some(connection),
        Arc::new(rules),
        Arc::new(InspectConfig::default()),
    );

    let result = session
        .audit("DELETE FROM exist_db.exist_tb_1 WHERE id = 1")
        .await
        .unwrap();
    assert_eq!(result.messages().len(), 1);
    assert_eq!(result.messages()[0].to_string(), "[warn]use a soft delete");
}
