//! Expression AST types.

use core::fmt;

use super::ident::{write_list, Ident};
use crate::lexer::Span;

/// A literal value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// Numeric literal, kept as written.
    Number(String),
    /// Single-quoted string literal.
    String(String),
    /// Double-quoted string literal.
    DoubleQuotedString(String),
    /// Hex literal.
    Blob(Vec<u8>),
    /// Boolean literal.
    Boolean(bool),
    /// NULL literal.
    Null,
}

impl Literal {
    /// Returns the value as an unsigned integer, if it is one.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Number(text) => text.parse().ok(),
            _ => None,
        }
    }

    /// Returns the string content of a quoted literal.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::DoubleQuotedString(s) => Some(s),
            _ => None,
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, value: &str, quote: char) -> fmt::Result {
    use fmt::Write;

    f.write_char(quote)?;
    for c in value.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            c if c == quote => {
                f.write_char(quote)?;
                f.write_char(quote)?;
            }
            c => f.write_char(c)?,
        }
    }
    f.write_char(quote)
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(text) => f.write_str(text),
            Self::String(s) => write_quoted(f, s, '\''),
            Self::DoubleQuotedString(s) => write_quoted(f, s, '"'),
            Self::Blob(bytes) => {
                f.write_str("X'")?;
                for byte in bytes {
                    write!(f, "{byte:02X}")?;
                }
                f.write_str("'")
            }
            Self::Boolean(true) => f.write_str("TRUE"),
            Self::Boolean(false) => f.write_str("FALSE"),
            Self::Null => f.write_str("NULL"),
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    Mod,

    // Comparison
    Eq,
    NullSafeEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Logical
    And,
    Or,
    Xor,

    // Pattern matching
    Like,
    NotLike,
    Regexp,
    NotRegexp,

    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    LeftShift,
    RightShift,
}

impl BinaryOp {
    /// Returns the SQL representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::IntDiv => "DIV",
            Self::Mod => "%",
            Self::Eq => "=",
            Self::NullSafeEq => "<=>",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::Regexp => "REGEXP",
            Self::NotRegexp => "NOT REGEXP",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::LeftShift => "<<",
            Self::RightShift => ">>",
        }
    }

    /// Returns true for comparison operators.
    #[must_use]
    pub const fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Eq | Self::NullSafeEq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq
        )
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
    /// Logical NOT
    Not,
    /// Bitwise NOT (~)
    BitNot,
    /// BINARY cast prefix
    Binary,
}

impl UnaryOp {
    /// Returns the SQL representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "NOT ",
            Self::BitNot => "~",
            Self::Binary => "BINARY ",
        }
    }
}

/// A function call expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    /// The function name, as written.
    pub name: String,
    /// The arguments.
    pub args: Vec<Expr>,
    /// Whether DISTINCT was specified.
    pub distinct: bool,
}

/// An SQL expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A literal value.
    Literal(Literal),

    /// A column reference, optionally qualified.
    Column {
        /// Schema qualifier (optional).
        schema: Option<String>,
        /// Table name or alias (optional).
        table: Option<String>,
        /// Column name.
        name: String,
        /// Source span.
        span: Span,
    },

    /// A binary expression.
    Binary {
        /// Left operand.
        left: Box<Expr>,
        /// Operator.
        op: BinaryOp,
        /// Right operand.
        right: Box<Expr>,
    },

    /// A unary expression.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Expr>,
    },

    /// A function call.
    Function(FunctionCall),

    /// A scalar subquery.
    Subquery(Box<super::SelectStatement>),

    /// EXISTS (subquery).
    Exists {
        /// The subquery.
        subquery: Box<super::SelectStatement>,
        /// Whether this is NOT EXISTS.
        negated: bool,
    },

    /// IS NULL expression.
    IsNull {
        /// The expression to check.
        expr: Box<Expr>,
        /// Whether this is IS NOT NULL.
        negated: bool,
    },

    /// IN expression.
    In {
        /// The expression to check.
        expr: Box<Expr>,
        /// The list of values or a single subquery.
        list: Vec<Expr>,
        /// Whether this is NOT IN.
        negated: bool,
    },

    /// BETWEEN expression.
    Between {
        /// The expression to check.
        expr: Box<Expr>,
        /// Lower bound.
        low: Box<Expr>,
        /// Upper bound.
        high: Box<Expr>,
        /// Whether this is NOT BETWEEN.
        negated: bool,
    },

    /// CASE expression.
    Case {
        /// The operand (if any).
        operand: Option<Box<Expr>>,
        /// WHEN/THEN clauses.
        when_clauses: Vec<(Expr, Expr)>,
        /// ELSE clause.
        else_clause: Option<Box<Expr>>,
    },

    /// CAST expression.
    Cast {
        /// Expression to cast.
        expr: Box<Expr>,
        /// Target type.
        data_type: super::DataType,
    },

    /// INTERVAL expr unit.
    Interval {
        /// The amount.
        value: Box<Expr>,
        /// The unit, as written (DAY, HOUR, ...).
        unit: String,
    },

    /// Parenthesized expression.
    Paren(Box<Expr>),

    /// A `?` parameter marker.
    Parameter {
        /// Position in the statement (1-based).
        position: usize,
    },

    /// A user (`@x`) or system (`@@x`) variable.
    Variable {
        /// Variable name without the `@` prefix.
        name: String,
        /// Whether this is a system variable.
        system: bool,
    },

    /// Wildcard (*) in SELECT.
    Wildcard {
        /// Table qualifier (optional).
        table: Option<String>,
    },
}

impl Expr {
    /// Creates a new column reference.
    #[must_use]
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column {
            schema: None,
            table: None,
            name: name.into(),
            span: Span::default(),
        }
    }

    /// Creates a new qualified column reference.
    #[must_use]
    pub fn qualified_column(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Column {
            schema: None,
            table: Some(table.into()),
            name: name.into(),
            span: Span::default(),
        }
    }

    /// Creates a literal expression.
    #[must_use]
    pub const fn literal(value: Literal) -> Self {
        Self::Literal(value)
    }

    /// Creates an equality comparison.
    #[must_use]
    pub fn eq(self, other: Self) -> Self {
        self.binary(BinaryOp::Eq, other)
    }

    /// Creates a logical AND.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        self.binary(BinaryOp::And, other)
    }

    /// Creates a binary expression.
    #[must_use]
    pub fn binary(self, op: BinaryOp, other: Self) -> Self {
        Self::Binary {
            left: Box::new(self),
            op,
            right: Box::new(other),
        }
    }

    /// Calls `visit` on this expression and every nested expression,
    /// descending into subqueries' own expressions is left to the caller.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Self)) {
        visit(self);
        match self {
            Self::Binary { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            Self::Unary { operand, .. } => operand.walk(visit),
            Self::Function(call) => call.args.iter().for_each(|arg| arg.walk(visit)),
            Self::IsNull { expr, .. } => expr.walk(visit),
            Self::In { expr, list, .. } => {
                expr.walk(visit);
                list.iter().for_each(|item| item.walk(visit));
            }
            Self::Between {
                expr, low, high, ..
            } => {
                expr.walk(visit);
                low.walk(visit);
                high.walk(visit);
            }
            Self::Case {
                operand,
                when_clauses,
                else_clause,
            } => {
                if let Some(operand) = operand {
                    operand.walk(visit);
                }
                for (when, then) in when_clauses {
                    when.walk(visit);
                    then.walk(visit);
                }
                if let Some(else_clause) = else_clause {
                    else_clause.walk(visit);
                }
            }
            Self::Cast { expr, .. } => expr.walk(visit),
            Self::Interval { value, .. } => value.walk(visit),
            Self::Paren(inner) => inner.walk(visit),
            Self::Literal(_)
            | Self::Column { .. }
            | Self::Subquery(_)
            | Self::Exists { .. }
            | Self::Parameter { .. }
            | Self::Variable { .. }
            | Self::Wildcard { .. } => {}
        }
    }

    /// Returns true if the expression contains a subquery.
    #[must_use]
    pub fn has_subquery(&self) -> bool {
        let mut found = false;
        self.walk(&mut |e| {
            if matches!(e, Self::Subquery(_) | Self::Exists { .. }) {
                found = true;
            }
        });
        found
    }

    /// Returns true if the expression contains a `?` marker.
    #[must_use]
    pub fn has_parameter(&self) -> bool {
        let mut found = false;
        self.walk(&mut |e| {
            if matches!(e, Self::Parameter { .. }) {
                found = true;
            }
        });
        found
    }

    /// Returns true if the expression references a user variable.
    #[must_use]
    pub fn has_user_variable(&self) -> bool {
        let mut found = false;
        self.walk(&mut |e| {
            if matches!(e, Self::Variable { system: false, .. }) {
                found = true;
            }
        });
        found
    }

    /// Returns every column reference in the expression.
    #[must_use]
    pub fn columns(&self) -> Vec<&Self> {
        let mut columns = Vec::new();
        self.walk(&mut |e| {
            if matches!(e, Self::Column { .. }) {
                columns.push(e);
            }
        });
        columns
    }

    /// Returns true if the expression contains no column reference,
    /// so it evaluates the same for every row.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.columns().is_empty() && !self.has_subquery()
    }

    /// Returns true if the expression is a value written out in the text:
    /// a literal, or a signed number. Function calls such as `NOW()` or
    /// `UUID()` are constant per statement but not literal values.
    #[must_use]
    pub fn is_literal_value(&self) -> bool {
        match self {
            Self::Literal(_) => true,
            Self::Unary {
                op: UnaryOp::Neg,
                operand,
            } => matches!(operand.as_ref(), Self::Literal(Literal::Number(_))),
            Self::Paren(inner) => inner.is_literal_value(),
            _ => false,
        }
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        if self.distinct {
            f.write_str("DISTINCT ")?;
        }
        write_list(f, &self.args, ", ")?;
        f.write_str(")")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(lit) => write!(f, "{lit}"),
            Self::Column {
                schema,
                table,
                name,
                ..
            } => {
                if let Some(schema) = schema {
                    write!(f, "{}.", Ident(schema))?;
                }
                if let Some(table) = table {
                    write!(f, "{}.", Ident(table))?;
                }
                write!(f, "{}", Ident(name))
            }
            Self::Binary { left, op, right } => write!(f, "{left} {} {right}", op.as_str()),
            Self::Unary { op, operand } => write!(f, "{}{operand}", op.as_str()),
            Self::Function(call) => write!(f, "{call}"),
            Self::Subquery(query) => write!(f, "({query})"),
            Self::Exists { subquery, negated } => {
                if *negated {
                    f.write_str("NOT ")?;
                }
                write!(f, "EXISTS ({subquery})")
            }
            Self::IsNull { expr, negated } => {
                if *negated {
                    write!(f, "{expr} IS NOT NULL")
                } else {
                    write!(f, "{expr} IS NULL")
                }
            }
            Self::In {
                expr,
                list,
                negated,
            } => {
                write!(f, "{expr} ")?;
                if *negated {
                    f.write_str("NOT ")?;
                }
                match list.as_slice() {
                    [Self::Subquery(query)] => write!(f, "IN ({query})"),
                    _ => {
                        f.write_str("IN (")?;
                        write_list(f, list, ", ")?;
                        f.write_str(")")
                    }
                }
            }
            Self::Between {
                expr,
                low,
                high,
                negated,
            } => {
                write!(f, "{expr} ")?;
                if *negated {
                    f.write_str("NOT ")?;
                }
                write!(f, "BETWEEN {low} AND {high}")
            }
            Self::Case {
                operand,
                when_clauses,
                else_clause,
            } => {
                f.write_str("CASE")?;
                if let Some(operand) = operand {
                    write!(f, " {operand}")?;
                }
                for (when, then) in when_clauses {
                    write!(f, " WHEN {when} THEN {then}")?;
                }
                if let Some(else_clause) = else_clause {
                    write!(f, " ELSE {else_clause}")?;
                }
                f.write_str(" END")
            }
            Self::Cast { expr, data_type } => write!(f, "CAST({expr} AS {data_type})"),
            Self::Interval { value, unit } => write!(f, "INTERVAL {value} {unit}"),
            Self::Paren(inner) => write!(f, "({inner})"),
            Self::Parameter { .. } => f.write_str("?"),
            Self::Variable { name, system } => {
                let prefix = if *system { "@@" } else { "@" };
                let plain = name
                    .chars()
                    .all(|c| c.is_alphanumeric() || matches!(c, '_' | '$' | '.'));
                if plain {
                    write!(f, "{prefix}{name}")
                } else {
                    write!(f, "{prefix}`{}`", name.replace('`', "``"))
                }
            }
            Self::Wildcard { table: Some(table) } => write!(f, "{}.*", Ident(table)),
            Self::Wildcard { table: None } => f.write_str("*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_rendering() {
        assert_eq!(Literal::String(String::from("it's")).to_string(), "'it''s'");
        assert_eq!(
            Literal::DoubleQuotedString(String::from("unit test")).to_string(),
            "\"unit test\""
        );
        assert_eq!(Literal::Blob(vec![0x00, 0xAB]).to_string(), "X'00AB'");
        assert_eq!(Literal::Number(String::from("1.50")).to_string(), "1.50");
        assert_eq!(Literal::Null.to_string(), "NULL");
    }

    #[test]
    fn test_column_quoting() {
        assert_eq!(Expr::qualified_column("t", "id").to_string(), "t.id");
        assert_eq!(Expr::column("select").to_string(), "`select`");
        assert_eq!(Expr::column("my col").to_string(), "`my col`");
    }

    #[test]
    fn test_builders_render() {
        let expr = Expr::column("id")
            .eq(Expr::literal(Literal::Number(String::from("1"))))
            .and(Expr::column("name").eq(Expr::literal(Literal::String(String::from("a")))));
        assert_eq!(expr.to_string(), "id = 1 AND name = 'a'");
    }

    #[test]
    fn test_constant_detection() {
        let constant = Expr::literal(Literal::Number(String::from("1")))
            .eq(Expr::literal(Literal::Number(String::from("1"))));
        assert!(constant.is_constant());
        assert!(!Expr::column("a").eq(Expr::column("b")).is_constant());
    }

    #[test]
    fn test_literal_value_detection() {
        let one = Expr::literal(Literal::Number(String::from("1")));
        assert!(one.is_literal_value());
        assert!(Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(one.clone()),
        }
        .is_literal_value());
        assert!(Expr::Paren(Box::new(one.clone())).is_literal_value());
        assert!(!Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(Expr::column("a")),
        }
        .is_literal_value());
        assert!(!one.clone().eq(one).is_literal_value());
    }

    #[test]
    fn test_parameter_and_variable_detection() {
        let expr = Expr::column("a").eq(Expr::Parameter { position: 1 });
        assert!(expr.has_parameter());
        let expr = Expr::column("a").eq(Expr::Variable {
            name: String::from("v"),
            system: false,
        });
        assert!(expr.has_user_variable());
        assert!(!expr.has_parameter());
    }
}
