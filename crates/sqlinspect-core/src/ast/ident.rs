//! Identifier rendering helpers.

use core::fmt;

use crate::lexer::Keyword;

/// Returns true if `name` must be backquoted to be read back as the same
/// identifier.
#[must_use]
pub fn needs_quoting(name: &str) -> bool {
    name.is_empty()
        || Keyword::from_str(name).is_some()
        || name.starts_with(|c: char| c.is_ascii_digit())
        || !name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Renders an identifier bare when possible, backquoted otherwise.
#[derive(Debug, Clone, Copy)]
pub struct Ident<'a>(pub &'a str);

impl fmt::Display for Ident<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if needs_quoting(self.0) {
            write!(f, "{}", Quoted(self.0))
        } else {
            f.write_str(self.0)
        }
    }
}

/// Renders an identifier always backquoted.
#[derive(Debug, Clone, Copy)]
pub struct Quoted<'a>(pub &'a str);

impl fmt::Display for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`", self.0.replace('`', "``"))
    }
}

pub(crate) fn write_list<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    separator: &str,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

pub(crate) fn write_idents(
    f: &mut fmt::Formatter<'_>,
    names: &[String],
    separator: &str,
) -> fmt::Result {
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{}", Ident(name))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_quoting() {
        assert!(!needs_quoting("exist_tb_1"));
        assert!(needs_quoting("key"));
        assert!(needs_quoting("1abc"));
        assert!(needs_quoting("a-b"));
        assert!(needs_quoting(""));
    }

    #[test]
    fn test_quoted_escapes_backquote() {
        assert_eq!(Quoted("a`b").to_string(), "`a``b`");
        assert_eq!(Ident("id").to_string(), "id");
    }
}
