mod common;

use std::sync::Arc;

use common::*;
use sqlinspect::prelude::*;

async fn audit(mock: &Arc<MockConnection>, sql: &str) -> AuditResult {
    session(mock).audit(sql).await.unwrap()
}

// ====================================================================
// Structural validation
// ====================================================================

#[tokio::test]
async fn test_existing_objects_are_reported() {
    let mock = Arc::new(fixture());

    let result = audit(&mock, "CREATE DATABASE exist_db").await;
    assert!(result.contains("schema exist_db already exists"));
    assert_eq!(result.level(), Level::Error);

    let result = audit(&mock, "CREATE TABLE exist_db.exist_tb_1 (id int)").await;
    assert!(result.contains("table exist_db.exist_tb_1 already exists"));

    let result = audit(&mock, "CREATE TABLE IF NOT EXISTS exist_db.exist_tb_1 (id int)").await;
    assert!(!result.contains("table exist_db.exist_tb_1 already exists"));
}

#[tokio::test]
async fn test_missing_objects_are_reported() {
    let mock = Arc::new(fixture());

    let result = audit(&mock, "DROP DATABASE not_exist_db").await;
    assert!(result.contains("schema not_exist_db does not exist"));

    let result = audit(&mock, "DROP TABLE exist_db.not_exist_tb").await;
    assert!(result.contains("table exist_db.not_exist_tb does not exist"));

    let result = audit(&mock, "DROP TABLE IF EXISTS exist_db.not_exist_tb").await;
    assert!(!result.contains("table exist_db.not_exist_tb does not exist"));

    let result = audit(&mock, "USE not_exist_db").await;
    assert!(result.contains("schema not_exist_db does not exist"));
}

#[tokio::test]
async fn test_alter_table_against_definition() {
    let mock = Arc::new(fixture());

    let result = audit(
        &mock,
        "ALTER TABLE exist_db.exist_tb_1 ADD COLUMN v1 int, DROP COLUMN v9, \
         ADD INDEX uniq_1 (v2), DROP INDEX idx_9",
    )
    .await;
    assert!(result.contains("column v1 already exists"));
    assert!(result.contains("column v9 does not exist"));
    assert!(result.contains("index uniq_1 already exists"));
    assert!(result.contains("index idx_9 does not exist"));
}

#[tokio::test]
async fn test_dml_columns() {
    let mock = Arc::new(fixture());

    let result = audit(&mock, "INSERT INTO exist_db.exist_tb_1 (id, v1) VALUES (1)").await;
    assert!(result.contains("column count does not match value count"));

    let result = audit(&mock, "INSERT INTO exist_db.exist_tb_1 (id, v9) VALUES (1, 2)").await;
    assert!(result.contains("column v9 does not exist"));

    let result = audit(
        &mock,
        "UPDATE exist_db.exist_tb_1 SET v9 = 1 WHERE id = 1",
    )
    .await;
    assert!(result.contains("column v9 does not exist"));

    let result = audit(&mock, "DELETE FROM exist_db.exist_tb_1 WHERE v1 = 'a'").await;
    assert!(!result.contains("column v1 does not exist"));
}

#[tokio::test]
async fn test_findings_are_per_statement() {
    let mock = Arc::new(fixture());
    let mut session = session(&mock);

    let results = session
        .audit_batch(
            "USE exist_db; DROP TABLE not_exist_tb; \
             CREATE TABLE IF NOT EXISTS t9 (id bigint unsigned NOT NULL AUTO_INCREMENT COMMENT 'id', \
             PRIMARY KEY (id)) COMMENT 't9'",
        )
        .await
        .unwrap();
    assert_eq!(results.len(), 3);
    let (parsed, first) = &results[0];
    assert_eq!(parsed.text, "USE exist_db");
    assert!(first.is_empty());
    assert!(results[1].1.contains("table exist_db.not_exist_tb does not exist"));
    assert!(results[2].1.level() < Level::Error, "{}", results[2].1);
    assert!(!results[2].1.contains("table exist_db.t9 already exists"));
}

#[tokio::test]
async fn test_unparsed_statement_is_an_error() {
    let mock = Arc::new(fixture());

    let result = audit(&mock, "CREATE VIEW exist_db.v AS SELECT 1").await;
    assert_eq!(result.level(), Level::Error);
    assert!(result.contains("syntax error or unsupported construct, verify manually"));
}

// ====================================================================
// Online schema change advice
// ====================================================================

fn large_table() -> Arc<MockConnection> {
    Arc::new(fixture().rows(&stats_sql("exist_db", "exist_tb_1"), stats("2048.0", "1000000")))
}

#[tokio::test]
async fn test_osc_advised_for_large_table() {
    let mock = large_table();

    let result = audit(&mock, "ALTER TABLE exist_db.exist_tb_1 ADD COLUMN c int").await;
    assert!(result.contains(
        "[osc]pt-online-schema-change D=exist_db,t=exist_tb_1 --alter=\"ADD COLUMN c int\" --execute"
    ));
    assert!(result.contains("table exist_db.exist_tb_1 is larger than 1024 MB"));
}

#[tokio::test]
async fn test_osc_not_advised_for_rename() {
    let mock = large_table();

    let result = audit(&mock, "ALTER TABLE exist_db.exist_tb_1 RENAME TO exist_db.t2").await;
    assert!(result
        .messages()
        .iter()
        .all(|message| !message.message.starts_with("[osc]")));
}

#[tokio::test]
async fn test_osc_threshold_from_config() {
    let mock = large_table();

    let config = InspectConfig {
        ddl_osc_min_size: -1,
        ..InspectConfig::default()
    };
    let result = session_with(&mock, config)
        .audit("ALTER TABLE exist_db.exist_tb_1 ADD COLUMN c int")
        .await
        .unwrap();
    assert!(result
        .messages()
        .iter()
        .all(|message| !message.message.starts_with("[osc]")));

    let config = InspectConfig {
        ddl_osc_min_size: 4096,
        ..InspectConfig::default()
    };
    let result = session_with(&mock, config)
        .audit("ALTER TABLE exist_db.exist_tb_1 ADD COLUMN c int")
        .await
        .unwrap();
    assert!(result
        .messages()
        .iter()
        .all(|message| !message.message.starts_with("[osc]")));
}
