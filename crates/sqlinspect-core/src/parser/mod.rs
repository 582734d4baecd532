//! SQL Parser
//!
//! A hand-written recursive descent parser with Pratt expression parsing.
//! [`parse_statements`] splits a script on top-level `;` and parses each
//! piece; text the grammar rejects becomes [`Statement::Unparsed`] so the
//! caller can still report on it.

mod ddl;
mod error;
#[allow(clippy::module_inception)]
mod parser;
mod pratt;

pub use error::ParseError;
pub use parser::Parser;

use crate::ast::{ParsedStatement, Statement};
use crate::lexer::{Lexer, Span, TokenKind};

/// Parses a single statement.
///
/// # Errors
///
/// Returns a `ParseError` if the input is not one valid statement.
pub fn parse_statement(sql: &str) -> Result<Statement, ParseError> {
    Parser::new(sql).parse_statement()
}

/// Splits `input` into statements and parses each of them.
///
/// Statements the grammar does not cover are returned as
/// [`Statement::Unparsed`] with the parse error as reason. Empty pieces
/// (`;;`) are skipped.
///
/// # Errors
///
/// Returns a `ParseError` if the input cannot be tokenized, e.g. an
/// unterminated string or an unexpected character.
pub fn parse_statements(input: &str) -> Result<Vec<ParsedStatement>, ParseError> {
    let mut lexer = Lexer::new(input);
    let mut statements = vec![];
    let mut range: Option<Span> = None;

    loop {
        let token = lexer.next_token();
        match &token.kind {
            TokenKind::Error(message) => return Err(ParseError::new(message.clone(), token.span)),
            TokenKind::Semicolon | TokenKind::Eof => {
                if let Some(span) = range.take() {
                    statements.push(parse_piece(input, span));
                }
                if token.is_eof() {
                    break;
                }
            }
            _ => {
                range = Some(range.map_or(token.span, |span| span.merge(token.span)));
            }
        }
    }

    Ok(statements)
}

fn parse_piece(input: &str, span: Span) -> ParsedStatement {
    let text = span.text(input).to_string();
    let statement = match Parser::new(&text).parse_statement() {
        Ok(statement) => statement,
        Err(error) => Statement::Unparsed {
            text: text.clone(),
            reason: error.offset(span.start).to_string(),
        },
    };
    ParsedStatement {
        statement,
        text,
        span,
    }
}
