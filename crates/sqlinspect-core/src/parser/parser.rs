//! SQL Parser implementation.

use super::error::ParseError;
use super::pratt::{
    infix_binding_power, prefix_binding_power, token_to_binary_op, token_to_unary_op,
    COMPARISON_BP,
};
use crate::ast::{
    BinaryOp, DeleteStatement, Expr, FunctionCall, InsertSource, InsertStatement, JoinClause,
    JoinType, Literal, OrderBy, OrderDirection, SelectColumn, SelectStatement, SetItem,
    SetStatement, Statement, TableName, TableRef, TransactionStatement, UnionPart,
    UpdateAssignment, UpdateStatement, VariableScope,
};
use crate::lexer::{Keyword, Lexer, Span, Token, TokenKind};

/// Words that end a table reference and must not be read as an alias.
const CLAUSE_WORDS: &[&str] = &["FORCE", "STRAIGHT_JOIN", "NATURAL", "LOCK", "OFFSET"];

/// SQL Parser.
pub struct Parser<'a> {
    pub(super) lexer: Lexer<'a>,
    pub(super) current: Token,
    pub(super) previous: Token,
    /// Parameter counter for ? placeholders.
    param_counter: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given input.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            previous: Token::new(TokenKind::Eof, Span::new(0, 0)),
            param_counter: 0,
        }
    }

    /// Parses a single SQL statement. A trailing `;` is accepted; anything
    /// after it is an error.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the input is not a valid SQL statement.
    pub fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let statement = self.parse_statement_body()?;
        if self.check(&TokenKind::Semicolon) {
            self.advance();
        }
        if !self.current.is_eof() {
            return Err(self.unexpected("end of statement"));
        }
        Ok(statement)
    }

    fn parse_statement_body(&mut self) -> Result<Statement, ParseError> {
        match &self.current.kind {
            TokenKind::Keyword(Keyword::Select) => {
                Ok(Statement::Select(self.parse_select_statement()?))
            }
            TokenKind::Keyword(Keyword::Insert | Keyword::Replace) => {
                Ok(Statement::Insert(self.parse_insert_statement()?))
            }
            TokenKind::Keyword(Keyword::Update) => {
                Ok(Statement::Update(self.parse_update_statement()?))
            }
            TokenKind::Keyword(Keyword::Delete) => {
                Ok(Statement::Delete(self.parse_delete_statement()?))
            }
            TokenKind::Keyword(Keyword::Create) => self.parse_create_statement(),
            TokenKind::Keyword(Keyword::Alter) => {
                Ok(Statement::AlterTable(self.parse_alter_table_statement()?))
            }
            TokenKind::Keyword(Keyword::Drop) => self.parse_drop_statement(),
            TokenKind::Keyword(Keyword::Rename) => {
                Ok(Statement::RenameTable(self.parse_rename_table_statement()?))
            }
            TokenKind::Keyword(Keyword::Use) => {
                self.advance();
                let schema = self.expect_identifier()?;
                Ok(Statement::Use { schema })
            }
            TokenKind::Keyword(Keyword::Set) => Ok(Statement::Set(self.parse_set_statement()?)),
            TokenKind::Identifier(_) => self.parse_transaction_statement(),
            _ => Err(self.unexpected("a statement")),
        }
    }

    fn parse_transaction_statement(&mut self) -> Result<Statement, ParseError> {
        let statement = if self.consume_word("BEGIN") {
            self.consume_word("WORK");
            TransactionStatement::Begin
        } else if self.consume_word("START") {
            self.expect_word("TRANSACTION")?;
            TransactionStatement::Begin
        } else if self.consume_word("COMMIT") {
            self.consume_word("WORK");
            TransactionStatement::Commit
        } else if self.consume_word("ROLLBACK") {
            self.consume_word("WORK");
            TransactionStatement::Rollback
        } else {
            return Err(self.unexpected("a statement"));
        };
        Ok(Statement::Transaction(statement))
    }

    // ====================================================================
    // SELECT
    // ====================================================================

    /// Parses a SELECT statement with any trailing UNION branches.
    pub(super) fn parse_select_statement(&mut self) -> Result<SelectStatement, ParseError> {
        let mut select = self.parse_select_core()?;
        while self.consume_keyword(Keyword::Union) {
            let all = if self.consume_keyword(Keyword::All) {
                true
            } else {
                self.consume_keyword(Keyword::Distinct);
                false
            };
            let branch = self.parse_select_core()?;
            select.unions.push(UnionPart {
                all,
                select: branch,
            });
        }
        Ok(select)
    }

    fn parse_select_core(&mut self) -> Result<SelectStatement, ParseError> {
        self.expect_keyword(Keyword::Select)?;

        let mut distinct = false;
        loop {
            if self.consume_keyword(Keyword::Distinct) || self.consume_word("DISTINCTROW") {
                distinct = true;
            } else if !(self.consume_keyword(Keyword::All) || self.consume_select_modifier()) {
                break;
            }
        }

        let columns = self.parse_select_columns()?;

        let from = if self.consume_keyword(Keyword::From) {
            self.parse_table_refs()?
        } else {
            Vec::new()
        };

        let where_clause = self.parse_optional_where()?;

        let group_by = if self.consume_keyword(Keyword::Group) {
            self.expect_keyword(Keyword::By)?;
            self.parse_expression_list()?
        } else {
            Vec::new()
        };

        let having = if self.consume_keyword(Keyword::Having) {
            Some(self.parse_expression(0)?)
        } else {
            None
        };

        let order_by = self.parse_optional_order_by()?;

        let (limit, offset) = if self.consume_keyword(Keyword::Limit) {
            let first = self.parse_expression(0)?;
            if self.consume(&TokenKind::Comma) {
                // LIMIT offset, count
                let count = self.parse_expression(0)?;
                (Some(count), Some(first))
            } else if self.consume_word("OFFSET") {
                (Some(first), Some(self.parse_expression(0)?))
            } else {
                (Some(first), None)
            }
        } else {
            (None, None)
        };

        let for_update = if self.check_keyword(Keyword::For) {
            self.advance();
            self.expect_keyword(Keyword::Update)?;
            true
        } else {
            false
        };

        Ok(SelectStatement {
            distinct,
            columns,
            from,
            where_clause,
            group_by,
            having,
            order_by,
            limit,
            offset,
            for_update,
            unions: Vec::new(),
        })
    }

    /// Consumes `SQL_NO_CACHE`, `HIGH_PRIORITY` and similar modifiers.
    fn consume_select_modifier(&mut self) -> bool {
        match &self.current.kind {
            TokenKind::Identifier(word)
                if word.to_ascii_uppercase().starts_with("SQL_")
                    || word.eq_ignore_ascii_case("HIGH_PRIORITY")
                    || word.eq_ignore_ascii_case("STRAIGHT_JOIN") =>
            {
                self.advance();
                true
            }
            _ => false,
        }
    }

    /// Parses SELECT columns.
    fn parse_select_columns(&mut self) -> Result<Vec<SelectColumn>, ParseError> {
        let mut columns = vec![];

        loop {
            let expr = if self.check(&TokenKind::Star) {
                self.advance();
                Expr::Wildcard { table: None }
            } else {
                self.parse_expression(0)?
            };

            let alias = if self.consume_keyword(Keyword::As) {
                Some(self.expect_alias_name()?)
            } else if self.check_alias() {
                Some(self.expect_alias_name()?)
            } else {
                None
            };

            columns.push(SelectColumn { expr, alias });

            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }

        Ok(columns)
    }

    /// Parses a comma-separated list of table references.
    pub(super) fn parse_table_refs(&mut self) -> Result<Vec<TableRef>, ParseError> {
        let mut refs = vec![self.parse_table_ref()?];
        while self.consume(&TokenKind::Comma) {
            refs.push(self.parse_table_ref()?);
        }
        Ok(refs)
    }

    /// Parses a table reference with any number of joins.
    fn parse_table_ref(&mut self) -> Result<TableRef, ParseError> {
        let mut table_ref = self.parse_table_factor()?;

        while let Some(join_type) = self.parse_join_type()? {
            let table = self.parse_table_factor()?;
            let (on, using) = if self.consume_keyword(Keyword::On) {
                (Some(self.parse_expression(0)?), Vec::new())
            } else if self.consume_keyword(Keyword::Using) {
                self.expect(&TokenKind::LeftParen)?;
                let columns = self.parse_identifier_list()?;
                self.expect(&TokenKind::RightParen)?;
                (None, columns)
            } else {
                (None, Vec::new())
            };
            table_ref = TableRef::Join {
                left: Box::new(table_ref),
                join: Box::new(JoinClause {
                    join_type,
                    table,
                    on,
                    using,
                }),
            };
        }

        Ok(table_ref)
    }

    fn parse_table_factor(&mut self) -> Result<TableRef, ParseError> {
        if self.consume(&TokenKind::LeftParen) {
            if self.check_keyword(Keyword::Select) {
                let query = self.parse_select_statement()?;
                self.expect(&TokenKind::RightParen)?;
                let alias = self.parse_optional_alias()?;
                return Ok(TableRef::Subquery {
                    query: Box::new(query),
                    alias,
                });
            }
            let inner = self.parse_table_ref()?;
            self.expect(&TokenKind::RightParen)?;
            return Ok(inner);
        }

        let name = self.parse_table_name()?;
        let alias = self.parse_optional_alias()?;
        self.skip_index_hints()?;
        Ok(TableRef::Table { name, alias })
    }

    /// Skips `USE|FORCE|IGNORE INDEX|KEY [FOR ...] (...)` hints.
    fn skip_index_hints(&mut self) -> Result<(), ParseError> {
        while self.check_keyword(Keyword::Use)
            || self.check_keyword(Keyword::Ignore)
            || self.check_word("FORCE")
        {
            self.advance();
            if !(self.consume_keyword(Keyword::Index) || self.consume_keyword(Keyword::Key)) {
                return Err(self.unexpected("INDEX or KEY"));
            }
            if self.consume_keyword(Keyword::For) && !self.consume_keyword(Keyword::Join) {
                if !(self.consume_keyword(Keyword::Order) || self.consume_keyword(Keyword::Group)) {
                    return Err(self.unexpected("JOIN, ORDER BY or GROUP BY"));
                }
                self.expect_keyword(Keyword::By)?;
            }
            self.expect(&TokenKind::LeftParen)?;
            if !self.check(&TokenKind::RightParen) {
                self.parse_identifier_list()?;
            }
            self.expect(&TokenKind::RightParen)?;
        }
        Ok(())
    }

    fn parse_join_type(&mut self) -> Result<Option<JoinType>, ParseError> {
        let join_type = match &self.current.kind {
            TokenKind::Keyword(Keyword::Join) => {
                self.advance();
                return Ok(Some(JoinType::Inner));
            }
            TokenKind::Keyword(Keyword::Inner) => JoinType::Inner,
            TokenKind::Keyword(Keyword::Cross) => JoinType::Cross,
            TokenKind::Keyword(Keyword::Left) => JoinType::Left,
            TokenKind::Keyword(Keyword::Right) => JoinType::Right,
            TokenKind::Identifier(word) if word.eq_ignore_ascii_case("STRAIGHT_JOIN") => {
                self.advance();
                return Ok(Some(JoinType::Inner));
            }
            _ => return Ok(None),
        };
        self.advance();
        if matches!(join_type, JoinType::Left | JoinType::Right) {
            self.consume_keyword(Keyword::Outer);
        }
        self.expect_keyword(Keyword::Join)?;
        Ok(Some(join_type))
    }

    /// Parses an optional alias (with or without AS).
    pub(super) fn parse_optional_alias(&mut self) -> Result<Option<String>, ParseError> {
        if self.consume_keyword(Keyword::As) {
            return Ok(Some(self.expect_alias_name()?));
        }
        if self.check_alias() {
            return Ok(Some(self.expect_alias_name()?));
        }
        Ok(None)
    }

    fn check_alias(&self) -> bool {
        match &self.current.kind {
            TokenKind::Identifier(word) => !CLAUSE_WORDS
                .iter()
                .any(|clause| word.eq_ignore_ascii_case(clause)),
            TokenKind::QuotedIdentifier(_) => true,
            _ => false,
        }
    }

    fn expect_alias_name(&mut self) -> Result<String, ParseError> {
        match &self.current.kind {
            TokenKind::String(s) | TokenKind::DoubleQuotedString(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            _ => self.expect_identifier(),
        }
    }

    /// Parses `[schema.]table`.
    pub(super) fn parse_table_name(&mut self) -> Result<TableName, ParseError> {
        let first = self.expect_identifier()?;
        if self.consume(&TokenKind::Dot) {
            let name = self.expect_name_after_dot()?;
            return Ok(TableName::qualified(first, name));
        }
        Ok(TableName::new(first))
    }

    // ====================================================================
    // INSERT / UPDATE / DELETE
    // ====================================================================

    /// Parses an INSERT or REPLACE statement.
    fn parse_insert_statement(&mut self) -> Result<InsertStatement, ParseError> {
        let replace = self.check_keyword(Keyword::Replace);
        self.advance();

        let mut ignore = false;
        loop {
            if self.consume_keyword(Keyword::Ignore) {
                ignore = true;
            } else if !(self.consume_word("LOW_PRIORITY")
                || self.consume_word("DELAYED")
                || self.consume_word("HIGH_PRIORITY"))
            {
                break;
            }
        }
        self.consume_keyword(Keyword::Into);

        let table = self.parse_table_name()?;

        let mut columns = vec![];
        if self.check(&TokenKind::LeftParen) && !self.peek_is_keyword(Keyword::Select) {
            self.advance();
            if !self.check(&TokenKind::RightParen) {
                columns = self.parse_column_name_list()?;
            }
            self.expect(&TokenKind::RightParen)?;
        }

        let source = if self.consume_keyword(Keyword::Values) || self.consume_word("VALUE") {
            let mut rows = vec![];
            loop {
                self.expect(&TokenKind::LeftParen)?;
                let row = if self.check(&TokenKind::RightParen) {
                    vec![]
                } else {
                    self.parse_expression_list()?
                };
                self.expect(&TokenKind::RightParen)?;
                rows.push(row);
                if !self.consume(&TokenKind::Comma) {
                    break;
                }
            }
            InsertSource::Values(rows)
        } else if self.consume_keyword(Keyword::Set) {
            InsertSource::Set(self.parse_assignments()?)
        } else if self.check_keyword(Keyword::Select) {
            InsertSource::Query(Box::new(self.parse_select_statement()?))
        } else if self.consume(&TokenKind::LeftParen) {
            let query = self.parse_select_statement()?;
            self.expect(&TokenKind::RightParen)?;
            InsertSource::Query(Box::new(query))
        } else {
            return Err(self.unexpected("VALUES, SET or SELECT"));
        };

        let on_duplicate = if self.consume_keyword(Keyword::On) {
            self.expect_word("DUPLICATE")?;
            self.expect_keyword(Keyword::Key)?;
            self.expect_keyword(Keyword::Update)?;
            self.parse_assignments()?
        } else {
            vec![]
        };

        Ok(InsertStatement {
            replace,
            ignore,
            table,
            columns,
            source,
            on_duplicate,
        })
    }

    /// Parses an UPDATE statement.
    fn parse_update_statement(&mut self) -> Result<UpdateStatement, ParseError> {
        self.expect_keyword(Keyword::Update)?;
        while self.consume_word("LOW_PRIORITY") || self.consume_keyword(Keyword::Ignore) {}

        let tables = self.parse_table_refs()?;
        self.expect_keyword(Keyword::Set)?;
        let assignments = self.parse_assignments()?;
        let where_clause = self.parse_optional_where()?;
        let order_by = self.parse_optional_order_by()?;
        let limit = self.parse_optional_limit()?;

        Ok(UpdateStatement {
            tables,
            assignments,
            where_clause,
            order_by,
            limit,
        })
    }

    /// Parses a DELETE statement, single or multi-table.
    fn parse_delete_statement(&mut self) -> Result<DeleteStatement, ParseError> {
        self.expect_keyword(Keyword::Delete)?;
        while self.consume_word("LOW_PRIORITY")
            || self.consume_word("QUICK")
            || self.consume_keyword(Keyword::Ignore)
        {}

        let (targets, from) = if self.consume_keyword(Keyword::From) {
            let refs = self.parse_table_refs()?;
            if self.consume_keyword(Keyword::Using) {
                // DELETE FROM t1, t2 USING refs
                let targets = refs_to_targets(&refs).ok_or_else(|| {
                    ParseError::new("Invalid DELETE target list", self.previous.span)
                })?;
                (targets, self.parse_table_refs()?)
            } else {
                (vec![], refs)
            }
        } else {
            let mut targets = vec![self.parse_delete_target()?];
            while self.consume(&TokenKind::Comma) {
                targets.push(self.parse_delete_target()?);
            }
            self.expect_keyword(Keyword::From)?;
            (targets, self.parse_table_refs()?)
        };

        let where_clause = self.parse_optional_where()?;
        let order_by = self.parse_optional_order_by()?;
        let limit = self.parse_optional_limit()?;

        Ok(DeleteStatement {
            targets,
            from,
            where_clause,
            order_by,
            limit,
        })
    }

    fn parse_delete_target(&mut self) -> Result<TableName, ParseError> {
        let name = self.parse_table_name()?;
        if self.check(&TokenKind::Dot) {
            self.advance();
            self.expect(&TokenKind::Star)?;
        }
        Ok(name)
    }

    /// Parses `col = expr, ...` assignments.
    pub(super) fn parse_assignments(&mut self) -> Result<Vec<UpdateAssignment>, ParseError> {
        let mut assignments = vec![];
        loop {
            let mut parts = vec![self.expect_identifier()?];
            while self.consume(&TokenKind::Dot) {
                parts.push(self.expect_name_after_dot()?);
            }
            if !(self.consume(&TokenKind::Eq) || self.consume(&TokenKind::Assign)) {
                return Err(self.unexpected("="));
            }
            let value = self.parse_expression(0)?;
            let column = parts.pop().unwrap_or_default();
            let table = parts.pop();
            assignments.push(UpdateAssignment {
                table,
                column,
                value,
            });
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        Ok(assignments)
    }

    fn parse_optional_where(&mut self) -> Result<Option<Expr>, ParseError> {
        if self.consume_keyword(Keyword::Where) {
            Ok(Some(self.parse_expression(0)?))
        } else {
            Ok(None)
        }
    }

    fn parse_optional_order_by(&mut self) -> Result<Vec<OrderBy>, ParseError> {
        if self.consume_keyword(Keyword::Order) {
            self.expect_keyword(Keyword::By)?;
            self.parse_order_by_list()
        } else {
            Ok(vec![])
        }
    }

    fn parse_optional_limit(&mut self) -> Result<Option<Expr>, ParseError> {
        if self.consume_keyword(Keyword::Limit) {
            Ok(Some(self.parse_expression(0)?))
        } else {
            Ok(None)
        }
    }

    /// Parses ORDER BY list.
    fn parse_order_by_list(&mut self) -> Result<Vec<OrderBy>, ParseError> {
        let mut items = vec![];

        loop {
            let expr = self.parse_expression(0)?;
            let direction = if self.consume_keyword(Keyword::Asc) {
                Some(OrderDirection::Asc)
            } else if self.consume_keyword(Keyword::Desc) {
                Some(OrderDirection::Desc)
            } else {
                None
            };
            items.push(OrderBy { expr, direction });

            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }

        Ok(items)
    }

    // ====================================================================
    // SET
    // ====================================================================

    fn parse_set_statement(&mut self) -> Result<SetStatement, ParseError> {
        self.expect_keyword(Keyword::Set)?;
        let mut items = vec![];
        loop {
            items.push(self.parse_set_item()?);
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        Ok(SetStatement { items })
    }

    fn parse_set_item(&mut self) -> Result<SetItem, ParseError> {
        if self.consume_word("NAMES") {
            let charset = self.expect_name_or_string()?;
            if self.consume_keyword(Keyword::Collate) {
                self.expect_name_or_string()?;
            }
            return Ok(SetItem::Names { charset });
        }

        let (scope, name) = match self.current.kind.clone() {
            TokenKind::Variable(name) => {
                self.advance();
                (VariableScope::User, name)
            }
            TokenKind::SystemVariable(name) => {
                self.advance();
                split_system_variable(&name)
            }
            TokenKind::Identifier(word) if word.eq_ignore_ascii_case("GLOBAL") => {
                self.advance();
                (VariableScope::Global, self.expect_identifier()?)
            }
            TokenKind::Identifier(word)
                if word.eq_ignore_ascii_case("SESSION") || word.eq_ignore_ascii_case("LOCAL") =>
            {
                self.advance();
                (VariableScope::Session, self.expect_identifier()?)
            }
            _ => (VariableScope::Session, self.expect_identifier()?),
        };

        if !(self.consume(&TokenKind::Eq) || self.consume(&TokenKind::Assign)) {
            return Err(self.unexpected("="));
        }
        let value = self.parse_expression(0)?;
        Ok(SetItem::Variable { scope, name, value })
    }

    // ====================================================================
    // Expressions
    // ====================================================================

    /// Parses an expression using Pratt parsing.
    pub(super) fn parse_expression(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_prefix()?;

        loop {
            // Infix NOT only introduces a negated predicate.
            let negated = self.check_keyword(Keyword::Not) && self.peek_is_negatable_predicate();

            let (l_bp, r_bp) = if negated {
                COMPARISON_BP
            } else {
                match infix_binding_power(&self.current.kind) {
                    Some(bp) => bp,
                    None => break,
                }
            };

            if l_bp < min_bp {
                break;
            }

            if negated {
                self.advance();
            }

            match &self.current.kind {
                TokenKind::Keyword(Keyword::Is) => {
                    self.advance();
                    let negated = self.consume_keyword(Keyword::Not);
                    self.expect_keyword(Keyword::Null)?;
                    lhs = Expr::IsNull {
                        expr: Box::new(lhs),
                        negated,
                    };
                }
                TokenKind::Keyword(Keyword::In) => {
                    self.advance();
                    self.expect(&TokenKind::LeftParen)?;
                    let list = if self.check_keyword(Keyword::Select) {
                        vec![Expr::Subquery(Box::new(self.parse_select_statement()?))]
                    } else {
                        self.parse_expression_list()?
                    };
                    self.expect(&TokenKind::RightParen)?;
                    lhs = Expr::In {
                        expr: Box::new(lhs),
                        list,
                        negated,
                    };
                }
                TokenKind::Keyword(Keyword::Between) => {
                    self.advance();
                    let low = self.parse_expression(r_bp)?;
                    self.expect_keyword(Keyword::And)?;
                    let high = self.parse_expression(r_bp)?;
                    lhs = Expr::Between {
                        expr: Box::new(lhs),
                        low: Box::new(low),
                        high: Box::new(high),
                        negated,
                    };
                }
                _ => {
                    let Some(mut op) = token_to_binary_op(&self.current.kind) else {
                        break;
                    };
                    if negated {
                        op = match op {
                            BinaryOp::Like => BinaryOp::NotLike,
                            BinaryOp::Regexp => BinaryOp::NotRegexp,
                            _ => return Err(self.unexpected("IN, BETWEEN, LIKE or REGEXP")),
                        };
                    }
                    self.advance();
                    let rhs = self.parse_expression(r_bp)?;
                    lhs = Expr::Binary {
                        left: Box::new(lhs),
                        op,
                        right: Box::new(rhs),
                    };
                }
            }
        }

        Ok(lhs)
    }

    fn peek_is_negatable_predicate(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Keyword(
                Keyword::In | Keyword::Between | Keyword::Like | Keyword::Regexp | Keyword::Rlike
            )
        )
    }

    /// Parses a prefix expression.
    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        // BINARY(...) and NOT EXISTS are handled by parse_primary.
        let is_prefix = prefix_binding_power(&self.current.kind).is_some()
            && !(self.check_keyword(Keyword::Not) && self.peek_is_keyword(Keyword::Exists));

        if is_prefix {
            let bp = prefix_binding_power(&self.current.kind).unwrap_or(0);
            if self.check(&TokenKind::Plus) {
                self.advance();
                return self.parse_expression(bp);
            }
            if let Some(op) = token_to_unary_op(&self.current.kind) {
                self.advance();
                let operand = self.parse_expression(bp)?;
                return Ok(Expr::Unary {
                    op,
                    operand: Box::new(operand),
                });
            }
        }
        self.parse_primary()
    }

    /// Parses a primary expression.
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.current.clone();
        match token.kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Literal(Literal::Number(n)))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expr::Literal(Literal::String(s)))
            }
            TokenKind::DoubleQuotedString(s) => {
                self.advance();
                Ok(Expr::Literal(Literal::DoubleQuotedString(s)))
            }
            TokenKind::Blob(b) => {
                self.advance();
                Ok(Expr::Literal(Literal::Blob(b)))
            }
            TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Expr::Literal(Literal::Null))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expr::Literal(Literal::Boolean(true)))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expr::Literal(Literal::Boolean(false)))
            }
            TokenKind::Question => {
                self.advance();
                self.param_counter += 1;
                Ok(Expr::Parameter {
                    position: self.param_counter,
                })
            }
            TokenKind::Variable(name) => {
                self.advance();
                Ok(Expr::Variable {
                    name,
                    system: false,
                })
            }
            TokenKind::SystemVariable(name) => {
                self.advance();
                Ok(Expr::Variable { name, system: true })
            }
            TokenKind::LeftParen => {
                self.advance();
                if self.check_keyword(Keyword::Select) {
                    let query = self.parse_select_statement()?;
                    self.expect(&TokenKind::RightParen)?;
                    Ok(Expr::Subquery(Box::new(query)))
                } else {
                    let expr = self.parse_expression(0)?;
                    self.expect(&TokenKind::RightParen)?;
                    Ok(Expr::Paren(Box::new(expr)))
                }
            }
            TokenKind::Keyword(Keyword::Not) => {
                self.advance();
                self.parse_exists(true)
            }
            TokenKind::Keyword(Keyword::Exists) => self.parse_exists(false),
            TokenKind::Keyword(Keyword::Case) => self.parse_case_expression(),
            TokenKind::Keyword(Keyword::Cast) => self.parse_cast_expression(),
            TokenKind::Keyword(Keyword::Interval) => {
                self.advance();
                let value = self.parse_expression(COMPARISON_BP.1)?;
                let unit = self.expect_identifier()?.to_ascii_uppercase();
                Ok(Expr::Interval {
                    value: Box::new(value),
                    unit,
                })
            }
            TokenKind::Keyword(kw)
                if kw.is_function_name() && self.peek().kind == TokenKind::LeftParen =>
            {
                let name = self.lexer.slice(token.span).to_string();
                self.advance();
                self.parse_function_call(name)
            }
            TokenKind::Identifier(_) | TokenKind::QuotedIdentifier(_) => {
                let quoted = matches!(token.kind, TokenKind::QuotedIdentifier(_));
                let first = self.expect_identifier()?;
                if !quoted && self.check(&TokenKind::LeftParen) {
                    return self.parse_function_call(first);
                }
                self.parse_column_ref(first, token.span)
            }
            TokenKind::Star => {
                self.advance();
                Ok(Expr::Wildcard { table: None })
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// Parses the rest of a dotted column reference after its first part.
    fn parse_column_ref(&mut self, first: String, start: Span) -> Result<Expr, ParseError> {
        let mut parts = vec![first];
        while self.consume(&TokenKind::Dot) {
            if self.consume(&TokenKind::Star) {
                return Ok(Expr::Wildcard {
                    table: parts.pop(),
                });
            }
            parts.push(self.expect_name_after_dot()?);
        }
        let span = start.merge(self.previous.span);
        let name = parts.pop().unwrap_or_default();
        let table = parts.pop();
        let schema = parts.pop();
        if !parts.is_empty() {
            return Err(ParseError::new("Too many qualifiers in column name", span));
        }
        Ok(Expr::Column {
            schema,
            table,
            name,
            span,
        })
    }

    fn parse_exists(&mut self, negated: bool) -> Result<Expr, ParseError> {
        self.expect_keyword(Keyword::Exists)?;
        self.expect(&TokenKind::LeftParen)?;
        let subquery = self.parse_select_statement()?;
        self.expect(&TokenKind::RightParen)?;
        Ok(Expr::Exists {
            subquery: Box::new(subquery),
            negated,
        })
    }

    /// Parses a function call after its name.
    fn parse_function_call(&mut self, name: String) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LeftParen)?;

        let distinct = self.consume_keyword(Keyword::Distinct);

        let args = if self.check(&TokenKind::RightParen) {
            vec![]
        } else if self.check(&TokenKind::Star) {
            self.advance();
            vec![Expr::Wildcard { table: None }]
        } else {
            self.parse_expression_list()?
        };

        self.expect(&TokenKind::RightParen)?;

        Ok(Expr::Function(FunctionCall {
            name,
            args,
            distinct,
        }))
    }

    /// Parses a CAST expression.
    fn parse_cast_expression(&mut self) -> Result<Expr, ParseError> {
        self.expect_keyword(Keyword::Cast)?;
        self.expect(&TokenKind::LeftParen)?;
        let expr = self.parse_expression(0)?;
        self.expect_keyword(Keyword::As)?;
        let data_type = self.parse_data_type()?;
        self.expect(&TokenKind::RightParen)?;
        Ok(Expr::Cast {
            expr: Box::new(expr),
            data_type,
        })
    }

    /// Parses a CASE expression.
    fn parse_case_expression(&mut self) -> Result<Expr, ParseError> {
        self.expect_keyword(Keyword::Case)?;

        let operand = if self.check_keyword(Keyword::When) {
            None
        } else {
            Some(Box::new(self.parse_expression(0)?))
        };

        let mut when_clauses = vec![];
        while self.consume_keyword(Keyword::When) {
            let when = self.parse_expression(0)?;
            self.expect_keyword(Keyword::Then)?;
            let then = self.parse_expression(0)?;
            when_clauses.push((when, then));
        }
        if when_clauses.is_empty() {
            return Err(self.unexpected("WHEN"));
        }

        let else_clause = if self.consume_keyword(Keyword::Else) {
            Some(Box::new(self.parse_expression(0)?))
        } else {
            None
        };

        self.expect_keyword(Keyword::End)?;

        Ok(Expr::Case {
            operand,
            when_clauses,
            else_clause,
        })
    }

    /// Parses a comma-separated list of expressions.
    pub(super) fn parse_expression_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut exprs = vec![self.parse_expression(0)?];
        while self.consume(&TokenKind::Comma) {
            exprs.push(self.parse_expression(0)?);
        }
        Ok(exprs)
    }

    /// Parses a comma-separated list of identifiers.
    pub(super) fn parse_identifier_list(&mut self) -> Result<Vec<String>, ParseError> {
        let mut idents = vec![self.expect_identifier()?];
        while self.consume(&TokenKind::Comma) {
            idents.push(self.expect_identifier()?);
        }
        Ok(idents)
    }

    /// Parses a list of possibly qualified column names, keeping the last part.
    fn parse_column_name_list(&mut self) -> Result<Vec<String>, ParseError> {
        let mut names = vec![];
        loop {
            let mut name = self.expect_identifier()?;
            while self.consume(&TokenKind::Dot) {
                name = self.expect_name_after_dot()?;
            }
            names.push(name);
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        Ok(names)
    }

    // ====================================================================
    // Token helpers
    // ====================================================================

    /// Advances to the next token.
    pub(super) fn advance(&mut self) {
        let next = self.lexer.next_token();
        self.previous = core::mem::replace(&mut self.current, next);
    }

    /// Returns the token after the current one without consuming anything.
    pub(super) fn peek(&self) -> Token {
        self.lexer.clone().next_token()
    }

    pub(super) fn peek_is_keyword(&self, keyword: Keyword) -> bool {
        self.peek().kind == TokenKind::Keyword(keyword)
    }

    /// Checks if the current token matches the given kind.
    pub(super) fn check(&self, kind: &TokenKind) -> bool {
        core::mem::discriminant(&self.current.kind) == core::mem::discriminant(kind)
    }

    /// Checks if the current token is the given keyword.
    pub(super) fn check_keyword(&self, keyword: Keyword) -> bool {
        matches!(&self.current.kind, TokenKind::Keyword(k) if *k == keyword)
    }

    /// Checks if the current token is the given non-reserved word.
    pub(super) fn check_word(&self, word: &str) -> bool {
        matches!(&self.current.kind, TokenKind::Identifier(w) if w.eq_ignore_ascii_case(word))
    }

    pub(super) fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(super) fn consume_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(super) fn consume_word(&mut self, word: &str) -> bool {
        if self.check_word(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expects a specific token kind.
    pub(super) fn expect(&mut self, kind: &TokenKind) -> Result<(), ParseError> {
        if self.consume(kind) {
            Ok(())
        } else {
            Err(self.unexpected(format!("{kind:?}")))
        }
    }

    /// Expects a specific keyword.
    pub(super) fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), ParseError> {
        if self.consume_keyword(keyword) {
            Ok(())
        } else {
            Err(self.unexpected(keyword.as_str()))
        }
    }

    pub(super) fn expect_word(&mut self, word: &str) -> Result<(), ParseError> {
        if self.consume_word(word) {
            Ok(())
        } else {
            Err(self.unexpected(word))
        }
    }

    /// Expects a plain or backquoted identifier.
    pub(super) fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match &self.current.kind {
            TokenKind::Identifier(name) | TokenKind::QuotedIdentifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// Expects a name after `.`, where reserved words are allowed.
    pub(super) fn expect_name_after_dot(&mut self) -> Result<String, ParseError> {
        if self.current.is_keyword() {
            let name = self.lexer.slice(self.current.span).to_string();
            self.advance();
            return Ok(name);
        }
        self.expect_identifier()
    }

    /// Expects an identifier or a quoted string, returning its text.
    pub(super) fn expect_name_or_string(&mut self) -> Result<String, ParseError> {
        match &self.current.kind {
            TokenKind::String(s) | TokenKind::DoubleQuotedString(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            TokenKind::Keyword(Keyword::Binary) => {
                self.advance();
                Ok(String::from("binary"))
            }
            _ => self.expect_identifier(),
        }
    }

    /// Builds an error for the current token.
    pub(super) fn unexpected(&self, expected: impl Into<String>) -> ParseError {
        ParseError::unexpected(expected, self.current.kind.clone(), self.current.span)
    }
}

/// Splits `global.name`, `session.name` or `name` from a system variable.
fn split_system_variable(name: &str) -> (VariableScope, String) {
    match name.split_once('.') {
        Some((scope, rest)) if scope.eq_ignore_ascii_case("global") => {
            (VariableScope::Global, rest.to_string())
        }
        Some((scope, rest))
            if scope.eq_ignore_ascii_case("session") || scope.eq_ignore_ascii_case("local") =>
        {
            (VariableScope::Session, rest.to_string())
        }
        _ => (VariableScope::Session, name.to_string()),
    }
}

/// Converts `t1, t2` from `DELETE FROM t1, t2 USING ...` into target names.
fn refs_to_targets(refs: &[TableRef]) -> Option<Vec<TableName>> {
    refs.iter()
        .map(|r| match r {
            TableRef::Table { name, alias: None } => Some(name.clone()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(sql: &str) -> Result<Statement, ParseError> {
        Parser::new(sql).parse_statement()
    }

    #[test]
    fn test_simple_select() {
        let stmt = parse("SELECT id, name FROM users").unwrap();
        assert!(matches!(stmt, Statement::Select(_)));
    }

    #[test]
    fn test_select_with_where() {
        let stmt = parse("SELECT * FROM users WHERE id = 1").unwrap();
        if let Statement::Select(select) = stmt {
            assert!(select.where_clause.is_some());
            assert!(select.has_wildcard());
        } else {
            panic!("Expected SELECT statement");
        }
    }

    #[test]
    fn test_expression_precedence() {
        let stmt = parse("SELECT 1 + 2 * 3").unwrap();
        if let Statement::Select(select) = stmt {
            if let Expr::Binary { op, right, .. } = &select.columns[0].expr {
                assert_eq!(*op, BinaryOp::Add);
                assert!(matches!(
                    right.as_ref(),
                    Expr::Binary {
                        op: BinaryOp::Mul,
                        ..
                    }
                ));
            } else {
                panic!("Expected binary expression");
            }
        } else {
            panic!("Expected SELECT statement");
        }
    }

    #[test]
    fn test_not_binds_looser_than_comparison() {
        let stmt = parse("SELECT * FROM t WHERE NOT a = 1 AND b = 2").unwrap();
        let Statement::Select(select) = stmt else {
            panic!("Expected SELECT statement");
        };
        let Some(Expr::Binary { op, left, .. }) = select.where_clause else {
            panic!("Expected binary WHERE");
        };
        assert_eq!(op, BinaryOp::And);
        assert!(matches!(*left, Expr::Unary { .. }));
    }

    #[test]
    fn test_limit_offset_forms() {
        let Statement::Select(select) = parse("SELECT a FROM t LIMIT 5, 10").unwrap() else {
            panic!("Expected SELECT statement");
        };
        assert_eq!(select.limit.map(|e| e.to_string()), Some(String::from("10")));
        assert_eq!(select.offset.map(|e| e.to_string()), Some(String::from("5")));
    }

    #[test]
    fn test_parameter_placeholders() {
        let stmt = parse("SELECT * FROM users WHERE id = ? AND name = ?").unwrap();
        let Statement::Select(select) = stmt else {
            panic!("Expected SELECT statement");
        };
        let mut positions = vec![];
        if let Some(where_clause) = &select.where_clause {
            where_clause.walk(&mut |e| {
                if let Expr::Parameter { position } = e {
                    positions.push(*position);
                }
            });
        }
        assert_eq!(positions, vec![1, 2]);
    }

    #[test]
    fn test_transaction_words() {
        assert_eq!(
            parse("START TRANSACTION").unwrap(),
            Statement::Transaction(TransactionStatement::Begin)
        );
        assert_eq!(
            parse("commit").unwrap(),
            Statement::Transaction(TransactionStatement::Commit)
        );
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        assert!(parse("SELECT 1; SELECT 2").is_err());
        assert!(parse("SELECT 1;").is_ok());
    }
}
