//! Column data types and column definitions.

use core::fmt;

use super::expression::{Expr, Literal};
use super::ident::Ident;

/// A MySQL column type as written, e.g. `varchar(255)` or
/// `int(10) unsigned zerofill`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataType {
    /// Type name, case preserved.
    pub name: String,
    /// Rendered arguments (`255`, `10,2`, `'a','b'`).
    pub args: Vec<String>,
    /// UNSIGNED attribute.
    pub unsigned: bool,
    /// ZEROFILL attribute.
    pub zerofill: bool,
    /// BINARY attribute on a character type.
    pub binary: bool,
    /// CHARACTER SET attached to the type.
    pub charset: Option<String>,
    /// COLLATE attached to the type.
    pub collate: Option<String>,
}

impl DataType {
    /// Creates a type with the given name and no arguments.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds an argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Returns true for types whose values are raw bytes.
    #[must_use]
    pub fn is_binary(&self) -> bool {
        let name = self.name.to_ascii_lowercase();
        matches!(
            name.as_str(),
            "binary" | "varbinary" | "blob" | "tinyblob" | "mediumblob" | "longblob" | "bit"
        ) || self
            .charset
            .as_deref()
            .is_some_and(|charset| charset.eq_ignore_ascii_case("binary"))
    }

    /// Returns true for integer types.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        let name = self.name.to_ascii_lowercase();
        matches!(
            name.as_str(),
            "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint"
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            write!(f, "({})", self.args.join(","))?;
        }
        if self.unsigned {
            f.write_str(" UNSIGNED")?;
        }
        if self.zerofill {
            f.write_str(" ZEROFILL")?;
        }
        if self.binary {
            f.write_str(" BINARY")?;
        }
        if let Some(charset) = &self.charset {
            write!(f, " CHARACTER SET {}", Ident(charset))?;
        }
        if let Some(collate) = &self.collate {
            write!(f, " COLLATE {}", Ident(collate))?;
        }
        Ok(())
    }
}

/// A column attribute following the data type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnOption {
    /// NOT NULL
    NotNull,
    /// NULL
    Null,
    /// DEFAULT expr
    Default(Expr),
    /// AUTO_INCREMENT
    AutoIncrement,
    /// PRIMARY KEY
    PrimaryKey,
    /// UNIQUE [KEY]
    Unique,
    /// COMMENT 'text'
    Comment(Literal),
    /// ON UPDATE expr
    OnUpdate(Expr),
    /// COLLATE name
    Collate(String),
}

impl fmt::Display for ColumnOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotNull => f.write_str("NOT NULL"),
            Self::Null => f.write_str("NULL"),
            Self::Default(expr) => write!(f, "DEFAULT {expr}"),
            Self::AutoIncrement => f.write_str("AUTO_INCREMENT"),
            Self::PrimaryKey => f.write_str("PRIMARY KEY"),
            Self::Unique => f.write_str("UNIQUE KEY"),
            Self::Comment(text) => write!(f, "COMMENT {text}"),
            Self::OnUpdate(expr) => write!(f, "ON UPDATE {expr}"),
            Self::Collate(name) => write!(f, "COLLATE {}", Ident(name)),
        }
    }
}

/// A column definition in CREATE TABLE or ALTER TABLE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Data type.
    pub data_type: DataType,
    /// Attributes in source order.
    pub options: Vec<ColumnOption>,
}

impl ColumnDef {
    /// Creates a new column definition without attributes.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            options: Vec::new(),
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn option(mut self, option: ColumnOption) -> Self {
        self.options.push(option);
        self
    }

    /// Returns the DEFAULT expression, if any.
    #[must_use]
    pub fn default_value(&self) -> Option<&Expr> {
        self.options.iter().find_map(|option| match option {
            ColumnOption::Default(expr) => Some(expr),
            _ => None,
        })
    }

    /// Replaces the DEFAULT attribute; `None` removes it.
    pub fn set_default(&mut self, default: Option<Expr>) {
        let position = self
            .options
            .iter()
            .position(|option| matches!(option, ColumnOption::Default(_)));
        match (position, default) {
            (Some(i), Some(expr)) => self.options[i] = ColumnOption::Default(expr),
            (Some(i), None) => {
                self.options.remove(i);
            }
            (None, Some(expr)) => self.options.push(ColumnOption::Default(expr)),
            (None, None) => {}
        }
    }

    /// Returns the COMMENT text, if any.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.options.iter().find_map(|option| match option {
            ColumnOption::Comment(text) => text.as_str(),
            _ => None,
        })
    }

    /// Returns true if the column is declared PRIMARY KEY inline.
    #[must_use]
    pub fn is_primary_key(&self) -> bool {
        self.options.contains(&ColumnOption::PrimaryKey)
    }

    /// Returns true if the column is AUTO_INCREMENT.
    #[must_use]
    pub fn is_auto_increment(&self) -> bool {
        self.options.contains(&ColumnOption::AutoIncrement)
    }

    /// Returns true if the column is declared NOT NULL.
    #[must_use]
    pub fn is_not_null(&self) -> bool {
        self.options.contains(&ColumnOption::NotNull)
    }
}

impl fmt::Display for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", Ident(&self.name), self.data_type)?;
        for option in &self.options {
            write!(f, " {option}")?;
        }
        Ok(())
    }
}

/// Column placement in ALTER TABLE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnPosition {
    /// FIRST
    First,
    /// AFTER column
    After(String),
}

impl fmt::Display for ColumnPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => f.write_str("FIRST"),
            Self::After(column) => write!(f, "AFTER {}", Ident(column)),
        }
    }
}
