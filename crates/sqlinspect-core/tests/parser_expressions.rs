//! Tests for expression parsing and operator precedence.

mod common;
use common::*;

use sqlinspect_core::ast::{BinaryOp, Expr, Literal, UnaryOp};

fn expr(sql: &str) -> Expr {
    let mut select = parse_select(&format!("SELECT {sql}"));
    select.columns.remove(0).expr
}

fn where_expr(sql: &str) -> Expr {
    parse_select(&format!("SELECT * FROM t WHERE {sql}"))
        .where_clause
        .expect("WHERE clause")
}

fn top_op(e: &Expr) -> BinaryOp {
    match e {
        Expr::Binary { op, .. } => *op,
        other => panic!("Expected binary expression, got {other:?}"),
    }
}

// ===================================================================
// Precedence
// ===================================================================

#[test]
fn multiplication_binds_tighter_than_addition() {
    let e = expr("1 + 2 * 3");
    let Expr::Binary { op, right, .. } = &e else {
        panic!("Expected binary");
    };
    assert_eq!(*op, BinaryOp::Add);
    assert_eq!(top_op(right), BinaryOp::Mul);
}

#[test]
fn and_binds_tighter_than_xor_and_or() {
    assert_eq!(top_op(&where_expr("a = 1 OR b = 2 AND c = 3")), BinaryOp::Or);
    assert_eq!(top_op(&where_expr("a XOR b AND c")), BinaryOp::Xor);
    assert_eq!(top_op(&where_expr("a OR b XOR c")), BinaryOp::Or);
}

#[test]
fn symbolic_logical_operators() {
    assert_eq!(top_op(&where_expr("a = 1 || b = 2")), BinaryOp::Or);
    assert_eq!(top_op(&where_expr("a = 1 && b = 2")), BinaryOp::And);
    assert_eq!(
        where_expr("a = 1 && b = 2").to_string(),
        "a = 1 AND b = 2"
    );
}

#[test]
fn not_wraps_comparison() {
    let e = where_expr("NOT a = 1 AND b");
    let Expr::Binary { op, left, .. } = &e else {
        panic!("Expected binary");
    };
    assert_eq!(*op, BinaryOp::And);
    assert!(matches!(
        left.as_ref(),
        Expr::Unary {
            op: UnaryOp::Not,
            ..
        }
    ));
}

#[test]
fn bitwise_and_shift_levels() {
    let e = expr("1 | 2 & 3 << 4");
    let Expr::Binary { op, right, .. } = &e else {
        panic!("Expected binary");
    };
    assert_eq!(*op, BinaryOp::BitOr);
    assert_eq!(top_op(right), BinaryOp::BitAnd);
}

#[test]
fn integer_division_and_modulo() {
    assert_eq!(top_op(&expr("7 DIV 2")), BinaryOp::IntDiv);
    assert_eq!(top_op(&expr("7 MOD 2")), BinaryOp::Mod);
    assert_eq!(expr("7 MOD 2").to_string(), "7 % 2");
}

#[test]
fn subtraction_is_left_associative() {
    let e = expr("10 - 3 - 2");
    let Expr::Binary { left, .. } = &e else {
        panic!("Expected binary");
    };
    assert_eq!(top_op(left), BinaryOp::Sub);
}

// ===================================================================
// Predicates
// ===================================================================

#[test]
fn negated_predicates() {
    assert_eq!(top_op(&where_expr("a NOT LIKE 'x%'")), BinaryOp::NotLike);
    assert_eq!(top_op(&where_expr("a NOT REGEXP '^x'")), BinaryOp::NotRegexp);
    assert_eq!(top_op(&where_expr("a RLIKE '^x'")), BinaryOp::Regexp);
    assert!(matches!(
        where_expr("a NOT IN (1, 2)"),
        Expr::In { negated: true, .. }
    ));
    assert!(matches!(
        where_expr("a NOT BETWEEN 1 AND 5"),
        Expr::Between { negated: true, .. }
    ));
    round_trip("SELECT * FROM t WHERE a NOT LIKE 'x%' AND b NOT IN (1, 2)");
}

#[test]
fn between_inside_and() {
    let e = where_expr("a BETWEEN 1 AND 5 AND b = 2");
    assert_eq!(top_op(&e), BinaryOp::And);
}

#[test]
fn is_null_forms() {
    assert!(matches!(
        where_expr("a IS NULL"),
        Expr::IsNull { negated: false, .. }
    ));
    assert!(matches!(
        where_expr("a IS NOT NULL"),
        Expr::IsNull { negated: true, .. }
    ));
}

#[test]
fn null_safe_equality() {
    assert_eq!(top_op(&where_expr("a <=> NULL")), BinaryOp::NullSafeEq);
    assert_eq!(top_op(&where_expr("a <> 1")), BinaryOp::NotEq);
}

#[test]
fn exists_and_not_exists() {
    assert!(matches!(
        where_expr("NOT EXISTS (SELECT 1 FROM s)"),
        Expr::Exists { negated: true, .. }
    ));
    assert!(where_expr("EXISTS (SELECT 1)").has_subquery());
}

// ===================================================================
// Primaries
// ===================================================================

#[test]
fn case_expressions() {
    round_trip("SELECT CASE WHEN a > 1 THEN 'big' ELSE 'small' END FROM t");
    let e = expr("CASE status WHEN 1 THEN 'on' WHEN 0 THEN 'off' END");
    let Expr::Case {
        operand,
        when_clauses,
        else_clause,
    } = &e
    else {
        panic!("Expected CASE");
    };
    assert!(operand.is_some());
    assert_eq!(when_clauses.len(), 2);
    assert!(else_clause.is_none());
}

#[test]
fn cast_expression() {
    let e = expr("CAST(a AS UNSIGNED INTEGER)");
    let Expr::Cast { data_type, .. } = &e else {
        panic!("Expected CAST");
    };
    assert_eq!(data_type.name.to_ascii_uppercase(), "UNSIGNED INTEGER");
    assert_eq!(expr("CAST(x AS char(10))").to_string(), "CAST(x AS char(10))");
}

#[test]
fn interval_arithmetic() {
    let e = where_expr("created_at > NOW() - INTERVAL 1 DAY");
    assert_eq!(top_op(&e), BinaryOp::Gt);
    assert_eq!(e.to_string(), "created_at > NOW() - INTERVAL 1 DAY");
}

#[test]
fn keyword_named_functions() {
    assert_eq!(expr("IF(a > 1, 'x', 'y')").to_string(), "IF(a > 1, 'x', 'y')");
    assert_eq!(expr("LEFT(name, 3)").to_string(), "LEFT(name, 3)");
    assert_eq!(expr("COUNT(DISTINCT a)").to_string(), "COUNT(DISTINCT a)");
    assert_eq!(expr("COUNT(*)").to_string(), "COUNT(*)");
}

#[test]
fn variables() {
    assert_eq!(
        expr("@@global.sql_mode"),
        Expr::Variable {
            name: String::from("global.sql_mode"),
            system: true
        }
    );
    let e = where_expr("id = @last_id");
    assert!(e.has_user_variable());
    assert_eq!(e.to_string(), "id = @last_id");
}

#[test]
fn parameters_are_numbered() {
    let e = where_expr("a = ? AND b = ?");
    assert!(e.has_parameter());
    let mut positions = vec![];
    e.walk(&mut |node| {
        if let Expr::Parameter { position } = node {
            positions.push(*position);
        }
    });
    assert_eq!(positions, vec![1, 2]);
}

#[test]
fn unary_operators() {
    assert!(matches!(
        expr("-a"),
        Expr::Unary {
            op: UnaryOp::Neg,
            ..
        }
    ));
    assert!(matches!(
        expr("BINARY name"),
        Expr::Unary {
            op: UnaryOp::Binary,
            ..
        }
    ));
    assert_eq!(expr("+5"), Expr::Literal(Literal::Number(String::from("5"))));
    assert_eq!(expr("!a").to_string(), "NOT a");
}

#[test]
fn qualified_columns() {
    assert_eq!(expr("db.t.c").to_string(), "db.t.c");
    assert_eq!(expr("t.`select`").to_string(), "t.`select`");
    let e = where_expr("t.a = s.b");
    assert_eq!(e.columns().len(), 2);
    assert!(!e.is_constant());
    assert!(where_expr("1 = 1").is_constant());
}

#[test]
fn literal_values_exclude_function_calls() {
    for sql in ["1", "-7", "'a'", "X'01'", "(3)", "NULL"] {
        assert!(expr(sql).is_literal_value(), "{sql}");
    }
    for sql in ["UUID()", "UUID_SHORT()", "RAND() * 100", "NOW()", "1 + 1"] {
        assert!(expr(sql).is_constant(), "{sql}");
        assert!(!expr(sql).is_literal_value(), "{sql}");
    }
    assert!(!expr("-a").is_literal_value());
}

#[test]
fn boolean_and_null_literals() {
    assert_eq!(expr("TRUE"), Expr::Literal(Literal::Boolean(true)));
    assert_eq!(expr("NULL"), Expr::Literal(Literal::Null));
}
