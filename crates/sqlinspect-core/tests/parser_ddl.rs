//! Tests for DDL and session statements.

mod common;
use common::*;

use sqlinspect_core::ast::{
    AlterColumnAction, AlterSpec, ColumnPosition, ConstraintKind, IndexOption, OrderDirection,
    SetItem, Statement, TransactionStatement, VariableScope,
};

// ===================================================================
// CREATE TABLE
// ===================================================================

#[test]
fn create_table_renders_as_written() {
    renders_as_written(
        "CREATE TABLE IF NOT EXISTS exist_db.not_exist_tb_1 (id bigint UNSIGNED NOT NULL \
         AUTO_INCREMENT COMMENT \"unit test\", v1 varchar(255) NOT NULL DEFAULT \"v1\", \
         PRIMARY KEY (id), INDEX idx_1 (v1)) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
    );
}

#[test]
fn create_table_inline_primary_key() {
    let c = parse_create_table("CREATE TABLE t (id int PRIMARY KEY, name text)");
    assert!(c.has_primary_key());
    assert_eq!(c.primary_key_columns(), vec!["id"]);
    assert_eq!(c.column_names(), vec!["id", "name"]);
}

#[test]
fn create_table_key_variants() {
    let c = parse_create_table(
        "CREATE TABLE t (a int, b varchar(64), c text, \
         KEY k_a (a), UNIQUE uniq_b (b(10) DESC) USING BTREE, FULLTEXT KEY ft_c (c))",
    );
    assert_eq!(c.index_names(), vec!["k_a", "uniq_b", "ft_c"]);
    let unique = c.constraint("uniq_b").expect("unique index");
    assert_eq!(unique.kind, ConstraintKind::Unique);
    assert_eq!(unique.columns[0].length, Some(10));
    assert_eq!(unique.columns[0].direction, Some(OrderDirection::Desc));
    assert_eq!(unique.options, vec![IndexOption::Using(String::from("BTREE"))]);
    assert_eq!(
        unique.to_string(),
        "UNIQUE INDEX uniq_b (b(10) DESC) USING BTREE"
    );
}

#[test]
fn create_table_foreign_key() {
    let sql = "CREATE TABLE orders (id int, user_id int, CONSTRAINT fk_user FOREIGN KEY (user_id) \
               REFERENCES users (id) ON DELETE CASCADE ON UPDATE SET NULL)";
    let c = parse_create_table(sql);
    let fk = c.constraint("fk_user").expect("foreign key");
    assert!(fk.is_foreign_key());
    assert!(!fk.is_index());
    renders_as_written(sql);
}

#[test]
fn create_table_like() {
    let c = parse_create_table("CREATE TABLE t2 LIKE db.t1");
    assert_eq!(c.like.as_ref().map(ToString::to_string).as_deref(), Some("db.t1"));
    let c = parse_create_table("CREATE TABLE t2 (LIKE t1)");
    assert!(c.like.is_some());
    assert_eq!(c.to_string(), "CREATE TABLE t2 LIKE t1");
}

#[test]
fn create_temporary_table() {
    let c = parse_create_table("CREATE TEMPORARY TABLE tmp (a int)");
    assert!(c.temporary);
    renders_as_written("CREATE TEMPORARY TABLE tmp (a int)");
}

#[test]
fn create_table_options_with_commas() {
    let c = parse_create_table(
        "CREATE TABLE t (a int) ENGINE=InnoDB, AUTO_INCREMENT=10, COMMENT='orders', \
         DEFAULT CHARACTER SET utf8mb4 COLLATE utf8mb4_bin",
    );
    assert_eq!(c.option_value("auto_increment").as_deref(), Some("10"));
    assert_eq!(c.option_value("COMMENT").as_deref(), Some("orders"));
    assert_eq!(c.option_value("CHARSET").as_deref(), Some("utf8mb4"));
    assert_eq!(c.option_value("COLLATE").as_deref(), Some("utf8mb4_bin"));
}

#[test]
fn column_attributes() {
    let c = parse_create_table(
        "CREATE TABLE t (updated_at timestamp NOT NULL DEFAULT CURRENT_TIMESTAMP \
         ON UPDATE CURRENT_TIMESTAMP, price decimal(10,2) SIGNED ZEROFILL, \
         d double precision, name varchar(32) CHARSET latin1 COLLATE latin1_bin)",
    );
    assert!(c.columns[0].default_value().is_some());
    assert_eq!(c.columns[1].data_type.args, vec!["10", "2"]);
    assert!(c.columns[1].data_type.zerofill);
    assert!(!c.columns[1].data_type.unsigned);
    assert_eq!(c.columns[2].data_type.name.to_ascii_uppercase(), "DOUBLE PRECISION");
    assert_eq!(c.columns[3].data_type.charset.as_deref(), Some("latin1"));
}

#[test]
fn duplicate_names_are_parsed_not_rejected() {
    // Semantic checks belong to the audit, the parser accepts them.
    let c = parse_create_table("CREATE TABLE t (a int, a int)");
    assert_eq!(c.columns.len(), 2);
}

// ===================================================================
// ALTER TABLE
// ===================================================================

#[test]
fn alter_add_column_renders_as_written() {
    renders_as_written(
        "ALTER TABLE exist_db.exist_tb_1 ADD COLUMN v1 varchar(255) NOT NULL DEFAULT \"v1\" \
         COMMENT \"unit test\"",
    );
}

#[test]
fn alter_add_multiple_columns() {
    let a = parse_alter_table("ALTER TABLE t ADD COLUMN (a int, b int)");
    let AlterSpec::AddColumns { columns, position } = &a.specs[0] else {
        panic!("Expected ADD COLUMN");
    };
    assert_eq!(columns.len(), 2);
    assert!(position.is_none());
    renders_as_written("ALTER TABLE t ADD COLUMN (a int, b int)");
}

#[test]
fn alter_add_column_first() {
    let a = parse_alter_table("ALTER TABLE t ADD a int FIRST");
    let AlterSpec::AddColumns { position, .. } = &a.specs[0] else {
        panic!("Expected ADD COLUMN");
    };
    assert_eq!(*position, Some(ColumnPosition::First));
    assert_eq!(a.to_string(), "ALTER TABLE t ADD COLUMN a int FIRST");
}

#[test]
fn alter_add_index_forms() {
    let a = parse_alter_table(
        "ALTER TABLE t ADD INDEX idx_1 (a), ADD UNIQUE KEY uniq_1 (v1, v2), ADD PRIMARY KEY (id)",
    );
    assert_eq!(
        a.to_string(),
        "ALTER TABLE t ADD INDEX idx_1 (a), ADD UNIQUE INDEX uniq_1 (v1,v2), ADD PRIMARY KEY (id)"
    );
}

#[test]
fn alter_drop_forms() {
    let a = parse_alter_table(
        "ALTER TABLE t DROP COLUMN a, DROP b, DROP KEY k, DROP PRIMARY KEY, DROP FOREIGN KEY fk",
    );
    assert!(matches!(&a.specs[0], AlterSpec::DropColumn { name } if name == "a"));
    assert!(matches!(&a.specs[1], AlterSpec::DropColumn { name } if name == "b"));
    assert!(matches!(&a.specs[2], AlterSpec::DropIndex { name } if name == "k"));
    assert_eq!(a.specs[3], AlterSpec::DropPrimaryKey);
    assert!(matches!(&a.specs[4], AlterSpec::DropForeignKey { name } if name == "fk"));
}

#[test]
fn alter_change_and_modify() {
    let sql = "ALTER TABLE t CHANGE COLUMN a b bigint NOT NULL AFTER id, MODIFY COLUMN c text";
    let a = parse_alter_table(sql);
    let AlterSpec::ChangeColumn {
        old_name,
        column,
        position,
    } = &a.specs[0]
    else {
        panic!("Expected CHANGE");
    };
    assert_eq!(old_name, "a");
    assert_eq!(column.name, "b");
    assert_eq!(*position, Some(ColumnPosition::After(String::from("id"))));
    renders_as_written(sql);
}

#[test]
fn alter_column_default() {
    let a = parse_alter_table("ALTER TABLE t ALTER COLUMN a DROP DEFAULT, ALTER b SET DEFAULT 'x'");
    assert!(matches!(
        &a.specs[0],
        AlterSpec::AlterColumn {
            action: AlterColumnAction::DropDefault,
            ..
        }
    ));
    assert_eq!(
        a.to_string(),
        "ALTER TABLE t ALTER COLUMN a DROP DEFAULT, ALTER COLUMN b SET DEFAULT 'x'"
    );
}

#[test]
fn alter_renames() {
    let a = parse_alter_table(
        "ALTER TABLE t RENAME INDEX i1 TO i2, RENAME COLUMN c1 TO c2, RENAME AS db.t2",
    );
    assert_eq!(
        a.to_string(),
        "ALTER TABLE t RENAME INDEX i1 TO i2, RENAME COLUMN c1 TO c2, RENAME TO db.t2"
    );
    assert_eq!(a.renamed_to().map(ToString::to_string).as_deref(), Some("db.t2"));
}

#[test]
fn alter_table_options() {
    let a = parse_alter_table("ALTER TABLE t ENGINE=InnoDB COMMENT='x'");
    let AlterSpec::Options(options) = &a.specs[0] else {
        panic!("Expected table options");
    };
    assert_eq!(options.len(), 2);
    assert_eq!(options[1].key(), "COMMENT");
    renders_as_written("ALTER TABLE t ENGINE=InnoDB COMMENT='x'");
}

// ===================================================================
// DROP / RENAME / INDEX / DATABASE
// ===================================================================

#[test]
fn drop_table() {
    let Statement::DropTable(d) = parse("DROP TABLE IF EXISTS a, db.b") else {
        panic!("Expected DROP TABLE");
    };
    assert!(d.if_exists);
    assert_eq!(d.tables.len(), 2);
    renders_as_written("DROP TABLE IF EXISTS a, db.b");
    renders_as_written("DROP TEMPORARY TABLE tmp");
}

#[test]
fn rename_table() {
    let Statement::RenameTable(r) = parse("RENAME TABLE a TO b, db.c TO db.d") else {
        panic!("Expected RENAME TABLE");
    };
    assert_eq!(r.pairs.len(), 2);
    renders_as_written("RENAME TABLE a TO b, db.c TO db.d");
}

#[test]
fn create_and_drop_index() {
    let Statement::CreateIndex(c) = parse("CREATE UNIQUE INDEX uniq_a ON db.t (a,b)") else {
        panic!("Expected CREATE INDEX");
    };
    assert_eq!(c.kind, ConstraintKind::Unique);
    assert_eq!(
        c.to_constraint().to_string(),
        "UNIQUE INDEX uniq_a (a,b)"
    );
    renders_as_written("CREATE UNIQUE INDEX uniq_a ON db.t (a,b)");
    renders_as_written("DROP INDEX IF EXISTS uniq_a ON db.t");
}

#[test]
fn create_and_drop_database() {
    let Statement::CreateDatabase(c) =
        parse("CREATE SCHEMA IF NOT EXISTS shop DEFAULT CHARACTER SET utf8mb4 COLLATE utf8mb4_bin")
    else {
        panic!("Expected CREATE DATABASE");
    };
    assert!(c.if_not_exists);
    assert_eq!(c.option_value("CHARSET").as_deref(), Some("utf8mb4"));
    assert_eq!(c.option_value("COLLATE").as_deref(), Some("utf8mb4_bin"));
    renders_as_written("DROP DATABASE IF EXISTS shop");
}

// ===================================================================
// USE / SET / transactions
// ===================================================================

#[test]
fn use_statement() {
    assert!(matches!(parse("use `my-db`"), Statement::Use { schema } if schema == "my-db"));
    renders_as_written("USE shop");
}

#[test]
fn set_statement_scopes() {
    let Statement::Set(s) =
        parse("SET @a = 1, @@global.max_connections = 100, SESSION sql_mode = '', NAMES utf8mb4")
    else {
        panic!("Expected SET");
    };
    assert!(matches!(
        &s.items[0],
        SetItem::Variable { scope: VariableScope::User, name, .. } if name == "a"
    ));
    assert!(matches!(
        &s.items[1],
        SetItem::Variable { scope: VariableScope::Global, name, .. } if name == "max_connections"
    ));
    assert!(matches!(
        &s.items[2],
        SetItem::Variable { scope: VariableScope::Session, .. }
    ));
    assert!(matches!(&s.items[3], SetItem::Names { charset } if charset == "utf8mb4"));
}

#[test]
fn transaction_statements() {
    assert_eq!(
        parse("START TRANSACTION"),
        Statement::Transaction(TransactionStatement::Begin)
    );
    assert_eq!(
        parse("begin"),
        Statement::Transaction(TransactionStatement::Begin)
    );
    assert_eq!(
        parse("COMMIT"),
        Statement::Transaction(TransactionStatement::Commit)
    );
    assert_eq!(
        parse("rollback work"),
        Statement::Transaction(TransactionStatement::Rollback)
    );
}

#[test]
fn statement_classification() {
    assert!(parse("ALTER TABLE t DROP COLUMN a").is_ddl());
    assert!(parse("CREATE DATABASE d").is_ddl());
    assert!(parse("DELETE FROM t").is_dml());
    assert!(!parse("SELECT 1").is_ddl());
    assert_eq!(parse("REPLACE INTO t VALUES (1)").kind(), "REPLACE");
}
