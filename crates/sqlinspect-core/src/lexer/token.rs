//! Token types for the MySQL lexer.

use super::Span;

/// Reserved MySQL words.
///
/// Only words that can never be used as a bare identifier are keywords.
/// Contextual words such as `ENGINE`, `COMMENT` or `AFTER` stay identifiers
/// and are matched by text in the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    // Queries
    Select,
    From,
    Where,
    Order,
    By,
    Group,
    Having,
    Limit,
    Distinct,
    All,
    Union,
    For,
    As,

    // Joins
    Join,
    Inner,
    Left,
    Right,
    Outer,
    Cross,
    On,
    Using,

    // DML
    Insert,
    Replace,
    Ignore,
    Into,
    Values,
    Update,
    Set,
    Delete,

    // DDL
    Create,
    Drop,
    Alter,
    Rename,
    Table,
    Index,
    Key,
    Database,
    Schema,
    Column,
    Add,
    Change,
    To,
    Use,

    // Constraints
    Primary,
    Foreign,
    References,
    Unique,
    Fulltext,
    Check,
    Default,
    Constraint,
    Cascade,
    Restrict,

    // Column attributes
    Unsigned,
    Zerofill,
    Binary,
    Character,
    Collate,

    // Operators and predicates
    And,
    Or,
    Xor,
    Not,
    In,
    Between,
    Like,
    Regexp,
    Rlike,
    Is,
    Div,
    Mod,
    Null,
    True,
    False,
    Exists,
    Interval,

    // Ordering
    Asc,
    Desc,

    // Expressions
    Case,
    When,
    Then,
    Else,
    End,
    Cast,
    If,
    With,
}

impl Keyword {
    /// Attempts to parse a keyword from a string (case-insensitive).
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SELECT" => Some(Self::Select),
            "FROM" => Some(Self::From),
            "WHERE" => Some(Self::Where),
            "ORDER" => Some(Self::Order),
            "BY" => Some(Self::By),
            "GROUP" => Some(Self::Group),
            "HAVING" => Some(Self::Having),
            "LIMIT" => Some(Self::Limit),
            "DISTINCT" => Some(Self::Distinct),
            "ALL" => Some(Self::All),
            "UNION" => Some(Self::Union),
            "FOR" => Some(Self::For),
            "AS" => Some(Self::As),
            "JOIN" => Some(Self::Join),
            "INNER" => Some(Self::Inner),
            "LEFT" => Some(Self::Left),
            "RIGHT" => Some(Self::Right),
            "OUTER" => Some(Self::Outer),
            "CROSS" => Some(Self::Cross),
            "ON" => Some(Self::On),
            "USING" => Some(Self::Using),
            "INSERT" => Some(Self::Insert),
            "REPLACE" => Some(Self::Replace),
            "IGNORE" => Some(Self::Ignore),
            "INTO" => Some(Self::Into),
            "VALUES" => Some(Self::Values),
            "UPDATE" => Some(Self::Update),
            "SET" => Some(Self::Set),
            "DELETE" => Some(Self::Delete),
            "CREATE" => Some(Self::Create),
            "DROP" => Some(Self::Drop),
            "ALTER" => Some(Self::Alter),
            "RENAME" => Some(Self::Rename),
            "TABLE" => Some(Self::Table),
            "INDEX" => Some(Self::Index),
            "KEY" => Some(Self::Key),
            "DATABASE" => Some(Self::Database),
            "SCHEMA" => Some(Self::Schema),
            "COLUMN" => Some(Self::Column),
            "ADD" => Some(Self::Add),
            "CHANGE" => Some(Self::Change),
            "TO" => Some(Self::To),
            "USE" => Some(Self::Use),
            "PRIMARY" => Some(Self::Primary),
            "FOREIGN" => Some(Self::Foreign),
            "REFERENCES" => Some(Self::References),
            "UNIQUE" => Some(Self::Unique),
            "FULLTEXT" => Some(Self::Fulltext),
            "CHECK" => Some(Self::Check),
            "DEFAULT" => Some(Self::Default),
            "CONSTRAINT" => Some(Self::Constraint),
            "CASCADE" => Some(Self::Cascade),
            "RESTRICT" => Some(Self::Restrict),
            "UNSIGNED" => Some(Self::Unsigned),
            "ZEROFILL" => Some(Self::Zerofill),
            "BINARY" => Some(Self::Binary),
            "CHARACTER" => Some(Self::Character),
            "COLLATE" => Some(Self::Collate),
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            "XOR" => Some(Self::Xor),
            "NOT" => Some(Self::Not),
            "IN" => Some(Self::In),
            "BETWEEN" => Some(Self::Between),
            "LIKE" => Some(Self::Like),
            "REGEXP" => Some(Self::Regexp),
            "RLIKE" => Some(Self::Rlike),
            "IS" => Some(Self::Is),
            "DIV" => Some(Self::Div),
            "MOD" => Some(Self::Mod),
            "NULL" => Some(Self::Null),
            "TRUE" => Some(Self::True),
            "FALSE" => Some(Self::False),
            "EXISTS" => Some(Self::Exists),
            "INTERVAL" => Some(Self::Interval),
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            "CASE" => Some(Self::Case),
            "WHEN" => Some(Self::When),
            "THEN" => Some(Self::Then),
            "ELSE" => Some(Self::Else),
            "END" => Some(Self::End),
            "CAST" => Some(Self::Cast),
            "IF" => Some(Self::If),
            "WITH" => Some(Self::With),
            _ => None,
        }
    }

    /// Returns the keyword as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::From => "FROM",
            Self::Where => "WHERE",
            Self::Order => "ORDER",
            Self::By => "BY",
            Self::Group => "GROUP",
            Self::Having => "HAVING",
            Self::Limit => "LIMIT",
            Self::Distinct => "DISTINCT",
            Self::All => "ALL",
            Self::Union => "UNION",
            Self::For => "FOR",
            Self::As => "AS",
            Self::Join => "JOIN",
            Self::Inner => "INNER",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Outer => "OUTER",
            Self::Cross => "CROSS",
            Self::On => "ON",
            Self::Using => "USING",
            Self::Insert => "INSERT",
            Self::Replace => "REPLACE",
            Self::Ignore => "IGNORE",
            Self::Into => "INTO",
            Self::Values => "VALUES",
            Self::Update => "UPDATE",
            Self::Set => "SET",
            Self::Delete => "DELETE",
            Self::Create => "CREATE",
            Self::Drop => "DROP",
            Self::Alter => "ALTER",
            Self::Rename => "RENAME",
            Self::Table => "TABLE",
            Self::Index => "INDEX",
            Self::Key => "KEY",
            Self::Database => "DATABASE",
            Self::Schema => "SCHEMA",
            Self::Column => "COLUMN",
            Self::Add => "ADD",
            Self::Change => "CHANGE",
            Self::To => "TO",
            Self::Use => "USE",
            Self::Primary => "PRIMARY",
            Self::Foreign => "FOREIGN",
            Self::References => "REFERENCES",
            Self::Unique => "UNIQUE",
            Self::Fulltext => "FULLTEXT",
            Self::Check => "CHECK",
            Self::Default => "DEFAULT",
            Self::Constraint => "CONSTRAINT",
            Self::Cascade => "CASCADE",
            Self::Restrict => "RESTRICT",
            Self::Unsigned => "UNSIGNED",
            Self::Zerofill => "ZEROFILL",
            Self::Binary => "BINARY",
            Self::Character => "CHARACTER",
            Self::Collate => "COLLATE",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
            Self::Not => "NOT",
            Self::In => "IN",
            Self::Between => "BETWEEN",
            Self::Like => "LIKE",
            Self::Regexp => "REGEXP",
            Self::Rlike => "RLIKE",
            Self::Is => "IS",
            Self::Div => "DIV",
            Self::Mod => "MOD",
            Self::Null => "NULL",
            Self::True => "TRUE",
            Self::False => "FALSE",
            Self::Exists => "EXISTS",
            Self::Interval => "INTERVAL",
            Self::Asc => "ASC",
            Self::Desc => "DESC",
            Self::Case => "CASE",
            Self::When => "WHEN",
            Self::Then => "THEN",
            Self::Else => "ELSE",
            Self::End => "END",
            Self::Cast => "CAST",
            Self::If => "IF",
            Self::With => "WITH",
        }
    }

    /// Returns true if the keyword may be used as a function name
    /// (`IF(...)`, `REPLACE(...)`, `LEFT(...)`, ...).
    #[must_use]
    pub const fn is_function_name(&self) -> bool {
        matches!(
            self,
            Self::If
                | Self::Replace
                | Self::Left
                | Self::Right
                | Self::Insert
                | Self::Mod
                | Self::Database
                | Self::Schema
                | Self::Values
                | Self::Character
                | Self::Binary
        )
    }
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Numeric literal, kept as written (e.g., 42, 3.14, 1e10).
    Number(String),
    /// Single-quoted string literal (e.g., 'hello').
    String(String),
    /// Double-quoted string literal (e.g., "hello").
    DoubleQuotedString(String),
    /// Hexadecimal literal (e.g., X'1234' or 0x1234).
    Blob(Vec<u8>),

    // Identifiers and keywords
    /// Bare identifier (e.g., column_name).
    Identifier(String),
    /// Backquoted identifier (e.g., `column name`).
    QuotedIdentifier(String),
    /// Reserved word.
    Keyword(Keyword),
    /// User variable (e.g., @total).
    Variable(String),
    /// System variable (e.g., @@global.sql_mode).
    SystemVariable(String),

    // Operators
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// %
    Percent,
    /// =
    Eq,
    /// <=>
    NullSafeEq,
    /// != or <>
    NotEq,
    /// <
    Lt,
    /// <=
    LtEq,
    /// >
    Gt,
    /// >=
    GtEq,
    /// ||
    DoublePipe,
    /// &&
    DoubleAmpersand,
    /// !
    Bang,
    /// &
    BitAnd,
    /// |
    BitOr,
    /// ^
    BitXor,
    /// ~
    BitNot,
    /// <<
    LeftShift,
    /// >>
    RightShift,
    /// :=
    Assign,

    // Delimiters
    /// (
    LeftParen,
    /// )
    RightParen,
    /// ,
    Comma,
    /// ;
    Semicolon,
    /// .
    Dot,
    /// ?
    Question,

    // Special
    /// End of input
    Eof,
    /// Invalid/unknown token
    Error(String),
}

/// A token with its span in the source code.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The location in the source code.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns true if this is an EOF token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Returns true if this is a keyword.
    #[must_use]
    pub const fn is_keyword(&self) -> bool {
        matches!(self.kind, TokenKind::Keyword(_))
    }

    /// Returns the keyword if this is a keyword token.
    #[must_use]
    pub const fn as_keyword(&self) -> Option<Keyword> {
        match &self.kind {
            TokenKind::Keyword(kw) => Some(*kw),
            _ => None,
        }
    }
}
