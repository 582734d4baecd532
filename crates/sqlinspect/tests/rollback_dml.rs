mod common;

use std::sync::Arc;

use common::*;
use sqlinspect::prelude::*;

const TB_1: &str = "`exist_db`.`exist_tb_1`";

async fn rollback_with(mock: MockConnection, config: InspectConfig, sql: &str) -> Rollback {
    let mock = Arc::new(mock);
    session_with(&mock, config)
        .generate_rollback(sql)
        .await
        .unwrap()
}

async fn rollback(mock: MockConnection, sql: &str) -> Rollback {
    rollback_with(mock, InspectConfig::default(), sql).await
}

fn reason(rollback: &Rollback) -> &str {
    assert!(rollback.statements.is_empty());
    rollback.reason.as_deref().unwrap_or_default()
}

fn capped(max_rows: i64) -> InspectConfig {
    InspectConfig {
        dml_rollback_max_rows: max_rows,
        ..InspectConfig::default()
    }
}

/// The row snapshot query under the default cap of 1000 rows.
fn snapshot_sql(from: &str) -> String {
    format!("SELECT * FROM {from} LIMIT 1001")
}

/// Serves `rows` for the snapshot of `<from>` and their count.
fn serving(mock: MockConnection, from: &str, rows: Vec<Row>) -> MockConnection {
    let count = u64::try_from(rows.len()).unwrap();
    mock.rows(&format!("SELECT COUNT(*) FROM {from}"), common::count(count))
        .rows(&snapshot_sql(from), rows)
}

fn tb_1_row(id: &str, v1: &str, v2: Option<&str>) -> Row {
    row(&[("id", Some(id)), ("v1", Some(v1)), ("v2", v2)])
}

// ====================================================================
// INSERT
// ====================================================================

#[tokio::test]
async fn test_insert_deletes_by_primary_key() {
    let rollback = rollback(
        fixture(),
        "INSERT INTO exist_db.exist_tb_1 (id, v1) VALUES (1, 'a'), (2, 'b')",
    )
    .await;
    assert_eq!(
        rollback.statements,
        [
            format!("DELETE FROM {TB_1} WHERE `id` = 1;"),
            format!("DELETE FROM {TB_1} WHERE `id` = 2;"),
        ]
    );
}

#[tokio::test]
async fn test_insert_forms() {
    let rollback = rollback(
        fixture(),
        "USE exist_db; INSERT INTO exist_tb_1 VALUES (5, 'a', 'b'); \
         INSERT INTO exist_tb_1 SET v1 = 'c', id = 6",
    )
    .await;
    assert_eq!(
        rollback.statements,
        [
            format!("DELETE FROM {TB_1} WHERE `id` = 6;"),
            format!("DELETE FROM {TB_1} WHERE `id` = 5;"),
        ]
    );
}

#[tokio::test]
async fn test_insert_refusals() {
    let cases = [
        (
            "INSERT INTO exist_db.exist_tb_1 (v1, v2) VALUES ('a', 'b')",
            "insert without primary key value, no rollback",
        ),
        (
            "INSERT INTO exist_db.exist_tb_1 (id, v1) VALUES (NULL, 'a')",
            "insert without primary key value, no rollback",
        ),
        (
            "INSERT INTO exist_db.exist_tb_2 (v1, v2) VALUES ('a', 1)",
            "no primary key, no rollback",
        ),
        (
            "REPLACE INTO exist_db.exist_tb_1 (id, v1) VALUES (1, 'a')",
            "REPLACE is not supported",
        ),
        (
            "INSERT INTO exist_db.exist_tb_1 (id, v1) VALUES (1, 'a') ON DUPLICATE KEY UPDATE v1 = 'b'",
            "ON DUPLICATE KEY UPDATE is not supported",
        ),
        (
            "INSERT INTO exist_db.exist_tb_1 (id, v1) SELECT id, v1 FROM exist_db.exist_tb_3",
            "INSERT ... SELECT is not supported",
        ),
        (
            "INSERT INTO exist_db.exist_tb_1 (id, v1) VALUES (?, ?)",
            "parameters and user variables are not supported",
        ),
    ];
    for (sql, expected) in cases {
        let rollback = rollback(fixture(), sql).await;
        assert_eq!(reason(&rollback), expected, "{sql}");
    }
}

#[tokio::test]
async fn test_insert_key_from_function_is_refused() {
    for sql in [
        "INSERT INTO exist_db.exist_tb_1 (id, v1) VALUES (UUID_SHORT(), 'a')",
        "INSERT INTO exist_db.exist_tb_1 SET id = RAND() * 100, v1 = 'a'",
        "INSERT INTO exist_db.exist_tb_1 (id, v1) VALUES (1, 'a'), (NOW(), 'b')",
    ] {
        let rollback = rollback(fixture(), sql).await;
        assert_eq!(
            reason(&rollback),
            "insert without primary key value, no rollback",
            "{sql}"
        );
    }
    let rollback = rollback(
        fixture(),
        "INSERT INTO exist_db.exist_tb_1 (id, v1) VALUES (-3, 'a')",
    )
    .await;
    assert_eq!(rollback.statements, [format!("DELETE FROM {TB_1} WHERE `id` = -3;")]);
}

#[tokio::test]
async fn test_insert_over_cap() {
    let rollback = rollback_with(
        fixture(),
        capped(1),
        "INSERT INTO exist_db.exist_tb_1 (id, v1) VALUES (1, 'a'), (2, 'b')",
    )
    .await;
    assert_eq!(reason(&rollback), "exceeded max rows, no rollback");
}

#[tokio::test]
async fn test_insert_into_unknown_table() {
    let rollback = rollback(fixture(), "INSERT INTO exist_db.not_exist_tb (id) VALUES (1)").await;
    assert!(rollback.statements.is_empty());
    assert_eq!(rollback.reason, None);
}

// ====================================================================
// DELETE
// ====================================================================

#[tokio::test]
async fn test_delete_reinserts_rows() {
    let mock = serving(
        fixture(),
        &format!("{TB_1} WHERE id = 1"),
        vec![tb_1_row("1", "a", None)],
    );
    let rollback = rollback(mock, "DELETE FROM exist_db.exist_tb_1 WHERE id = 1").await;
    assert_eq!(
        rollback.statements,
        [format!(
            "INSERT INTO {TB_1} (`id`, `v1`, `v2`) VALUES ('1', 'a', NULL);"
        )]
    );
}

#[tokio::test]
async fn test_delete_escapes_text_and_keeps_binary() {
    let mock = serving(
        fixture(),
        "`exist_db`.`exist_tb_3` WHERE id = 7",
        vec![Row::new(
            vec!["id".to_string(), "data".to_string()],
            vec![Some(b"7".to_vec()), Some(vec![0x01, 0xff])],
        )],
    );
    let rollback = rollback(mock, "DELETE FROM exist_db.exist_tb_3 WHERE id = 7").await;
    assert_eq!(
        rollback.statements,
        ["INSERT INTO `exist_db`.`exist_tb_3` (`id`, `data`) VALUES ('7', X'01FF');"]
    );

    let mock = serving(
        fixture(),
        &format!("{TB_1} WHERE id = 2"),
        vec![tb_1_row("2", "it's", Some("b"))],
    );
    let rollback = self::rollback(mock, "DELETE FROM exist_db.exist_tb_1 WHERE id = 2").await;
    assert_eq!(
        rollback.statements,
        [format!(
            "INSERT INTO {TB_1} (`id`, `v1`, `v2`) VALUES ('2', 'it''s', 'b');"
        )]
    );
}

#[tokio::test]
async fn test_delete_with_alias_and_current_schema() {
    let mock = serving(
        fixture(),
        &format!("{TB_1} AS `t` WHERE t.id = 1"),
        vec![tb_1_row("1", "a", Some("b"))],
    );
    let rollback = rollback(
        mock,
        "USE exist_db; DELETE FROM exist_tb_1 AS t WHERE t.id = 1",
    )
    .await;
    assert_eq!(
        rollback.statements,
        [format!(
            "INSERT INTO {TB_1} (`id`, `v1`, `v2`) VALUES ('1', 'a', 'b');"
        )]
    );
}

#[tokio::test]
async fn test_delete_with_small_limit_skips_count() {
    let mock = Arc::new(fixture().rows(
        &format!("SELECT * FROM {TB_1} WHERE v2 = 'b' ORDER BY id DESC LIMIT 2"),
        vec![tb_1_row("9", "a", Some("b")), tb_1_row("8", "a", Some("b"))],
    ));
    let rollback = session(&mock)
        .generate_rollback("DELETE FROM exist_db.exist_tb_1 WHERE v2 = 'b' ORDER BY id DESC LIMIT 2")
        .await
        .unwrap();
    assert_eq!(rollback.statements.len(), 2);
    assert!(rollback.statements[0].contains("VALUES ('9', 'a', 'b')"));
    assert!(mock.queried().iter().all(|sql| !sql.contains("COUNT(*)")));
}

#[tokio::test]
async fn test_delete_over_cap() {
    let mock = fixture().rows(
        &format!("SELECT COUNT(*) FROM {TB_1} WHERE v2 = 'b'"),
        common::count(5),
    );
    let rollback = rollback_with(
        mock,
        capped(1),
        "DELETE FROM exist_db.exist_tb_1 WHERE v2 = 'b'",
    )
    .await;
    assert_eq!(reason(&rollback), "exceeded max rows, no rollback");
}

#[tokio::test]
async fn test_delete_with_unreadable_count_fails() {
    let mock = fixture()
        .rows(
            &format!("SELECT COUNT(*) FROM {TB_1} WHERE v2 = 'b'"),
            vec![row(&[("COUNT(*)", Some("n/a"))])],
        )
        .rows(
            &format!("SELECT * FROM {TB_1} WHERE v2 = 'b' LIMIT 2"),
            vec![
                tb_1_row("1", "a", Some("b")),
                tb_1_row("2", "a", Some("b")),
            ],
        );
    let mock = Arc::new(mock);
    let err = session_with(&mock, capped(1))
        .generate_rollback("DELETE FROM exist_db.exist_tb_1 WHERE v2 = 'b'")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        InspectError::Connection(ConnectionError::UnexpectedShape(_))
    ));
    assert!(mock.queried().iter().all(|sql| !sql.starts_with("SELECT *")));
}

#[tokio::test]
async fn test_delete_snapshot_larger_than_count() {
    // The count is an estimate; the snapshot itself is capped too.
    let mock = fixture()
        .rows(
            &format!("SELECT COUNT(*) FROM {TB_1} WHERE v2 = 'b'"),
            common::count(1),
        )
        .rows(
            &format!("SELECT * FROM {TB_1} WHERE v2 = 'b' LIMIT 2"),
            vec![
                tb_1_row("1", "a", Some("b")),
                tb_1_row("2", "a", Some("b")),
            ],
        );
    let rollback = rollback_with(
        mock,
        capped(1),
        "DELETE FROM exist_db.exist_tb_1 WHERE v2 = 'b'",
    )
    .await;
    assert_eq!(reason(&rollback), "exceeded max rows, no rollback");
}

#[tokio::test]
async fn test_failed_snapshot_keeps_session_usable() {
    let from = format!("{TB_1} WHERE id = 1");
    let mock = serving(fixture(), &from, vec![tb_1_row("1", "a", None)])
        .fails_once(&snapshot_sql(&from));
    let mock = Arc::new(mock);
    let mut session = session(&mock);
    let sql = "DELETE FROM exist_db.exist_tb_1 WHERE id = 1";

    let err = session.generate_rollback(sql).await.unwrap_err();
    assert!(matches!(
        err,
        InspectError::Connection(ConnectionError::Timeout(_))
    ));
    assert!(!session.catalog().history().has_dml);

    let rollback = session.generate_rollback(sql).await.unwrap();
    assert_eq!(
        rollback.statements,
        [format!(
            "INSERT INTO {TB_1} (`id`, `v1`, `v2`) VALUES ('1', 'a', NULL);"
        )]
    );
    assert!(session.catalog().history().has_dml);
}

#[tokio::test]
async fn test_delete_refusals() {
    let cases = [
        (
            "DELETE FROM exist_db.exist_tb_2 WHERE v2 = 1",
            "no primary key, no rollback",
        ),
        (
            "DELETE FROM exist_db.exist_tb_1 WHERE id IN (SELECT v2 FROM exist_db.exist_tb_2)",
            "sub-queries are not supported",
        ),
        (
            "DELETE FROM exist_db.exist_tb_1 WHERE id = @id",
            "parameters and user variables are not supported",
        ),
    ];
    for (sql, expected) in cases {
        let rollback = rollback(fixture(), sql).await;
        assert_eq!(reason(&rollback), expected, "{sql}");
    }
}

// ====================================================================
// UPDATE
// ====================================================================

#[tokio::test]
async fn test_update_restores_changed_columns() {
    let mock = serving(
        fixture(),
        &format!("{TB_1} WHERE id = 1"),
        vec![tb_1_row("1", "a", None)],
    );
    let rollback = rollback(
        mock,
        "UPDATE exist_db.exist_tb_1 SET v2 = 'x', v2 = 'y' WHERE id = 1",
    )
    .await;
    assert_eq!(
        rollback.statements,
        [format!("UPDATE {TB_1} SET `v2` = NULL WHERE `id` = '1';")]
    );
}

#[tokio::test]
async fn test_update_of_primary_key() {
    let mock = serving(
        fixture(),
        &format!("{TB_1} WHERE id = 1"),
        vec![tb_1_row("1", "a", Some("b"))],
    );
    let rollback = rollback(mock, "UPDATE exist_db.exist_tb_1 SET id = 10 WHERE id = 1").await;
    assert_eq!(
        rollback.statements,
        [format!("UPDATE {TB_1} SET `id` = '1' WHERE `id` = 10;")]
    );
}

#[tokio::test]
async fn test_update_refusals() {
    let cases = [
        (
            "UPDATE exist_db.exist_tb_1 SET id = id + 1 WHERE v2 = 'b'",
            "primary key updated with an expression, no rollback",
        ),
        (
            "UPDATE exist_db.exist_tb_1 AS a JOIN exist_db.exist_tb_2 AS b ON a.v1 = b.v1 SET v2 = 'x'",
            "multi-table statements are not supported",
        ),
        (
            "UPDATE exist_db.exist_tb_1 SET v2 = (SELECT v1 FROM exist_db.exist_tb_2 LIMIT 1) WHERE id = 1",
            "sub-queries are not supported",
        ),
        (
            "UPDATE exist_db.exist_tb_2 SET v2 = 1 WHERE v1 = 'a'",
            "no primary key, no rollback",
        ),
        (
            "UPDATE exist_db.exist_tb_1 SET id = UUID_SHORT() WHERE v2 = 'b'",
            "primary key updated with an expression, no rollback",
        ),
        (
            "UPDATE exist_db.exist_tb_1 SET id = NOW() WHERE v2 = 'b'",
            "primary key updated with an expression, no rollback",
        ),
    ];
    for (sql, expected) in cases {
        let rollback = rollback(fixture(), sql).await;
        assert_eq!(reason(&rollback), expected, "{sql}");
    }
}

#[tokio::test]
async fn test_update_without_matching_rows() {
    let mock = serving(fixture(), &format!("{TB_1} WHERE id = 404"), Vec::new());
    let rollback = rollback(mock, "UPDATE exist_db.exist_tb_1 SET v2 = 'x' WHERE id = 404").await;
    assert!(rollback.statements.is_empty());
    assert_eq!(rollback.reason, None);
}

// ====================================================================
// Configuration and sessions
// ====================================================================

#[tokio::test]
async fn test_negative_cap_disables_dml_rollback() {
    let mock = Arc::new(fixture());
    let rollback = session_with(&mock, capped(-1))
        .generate_rollback("DELETE FROM exist_db.exist_tb_1 WHERE id = 1")
        .await
        .unwrap();
    assert!(rollback.statements.is_empty());
    assert_eq!(rollback.reason, None);
    assert!(mock.queried().iter().all(|sql| !sql.starts_with("SELECT *")));
}

#[tokio::test]
async fn test_inspection_pairs_audit_with_rollback() {
    let mock = serving(
        fixture(),
        &format!("{TB_1} WHERE id = 1"),
        vec![tb_1_row("1", "a", None)],
    );
    let mock = Arc::new(serving(mock, TB_1, Vec::new()));
    let inspections = session(&mock)
        .inspect_batch(
            "DELETE FROM exist_db.exist_tb_1 WHERE id = 1; UPDATE exist_db.exist_tb_1 SET v2 = 'x'",
        )
        .await
        .unwrap();
    assert_eq!(inspections.len(), 2);

    assert_eq!(inspections[0].kind, "DELETE");
    assert_eq!(
        inspections[0].rollback.statements,
        [format!(
            "INSERT INTO {TB_1} (`id`, `v1`, `v2`) VALUES ('1', 'a', NULL);"
        )]
    );

    assert!(inspections[1].audit.has_rule("dml_check_where_is_invalid"));

    let json = serde_json::to_value(&inspections[0]).unwrap();
    assert_eq!(json["kind"], "DELETE");
    assert_eq!(json["rollback"]["statements"][0], inspections[0].rollback.statements[0]);
}
