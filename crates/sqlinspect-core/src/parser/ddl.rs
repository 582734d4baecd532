//! DDL grammar: CREATE, ALTER, DROP and RENAME, column definitions and
//! data types.

use super::error::ParseError;
use super::parser::Parser;
use crate::ast::{
    AlterColumnAction, AlterSpec, AlterTableStatement, ColumnDef, ColumnOption, ColumnPosition,
    ConstraintKind, CreateDatabaseStatement, CreateIndexStatement, CreateTableStatement,
    DataType, DropDatabaseStatement, DropIndexStatement, DropTableStatement, Expr, ForeignKeyRef,
    IndexColumn, IndexOption, Literal, OrderDirection, RenamePair, RenameTableStatement,
    Statement, TableConstraint, TableOption,
};
use crate::lexer::{Keyword, TokenKind};

impl Parser<'_> {
    // ====================================================================
    // CREATE
    // ====================================================================

    pub(super) fn parse_create_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::Create)?;

        if self.consume_keyword(Keyword::Database) || self.consume_keyword(Keyword::Schema) {
            return Ok(Statement::CreateDatabase(self.parse_create_database()?));
        }

        let temporary = self.consume_word("TEMPORARY");
        if self.consume_keyword(Keyword::Table) {
            let mut create = self.parse_create_table()?;
            create.temporary = temporary;
            return Ok(Statement::CreateTable(create));
        }
        if temporary {
            return Err(self.unexpected("TABLE"));
        }

        let kind = if self.consume_keyword(Keyword::Unique) {
            ConstraintKind::Unique
        } else if self.consume_keyword(Keyword::Fulltext) {
            ConstraintKind::Fulltext
        } else {
            ConstraintKind::Index
        };
        self.expect_keyword(Keyword::Index)?;
        let name = self.expect_identifier()?;
        let mut options = self.parse_index_options()?;
        self.expect_keyword(Keyword::On)?;
        let table = self.parse_table_name()?;
        let columns = self.parse_index_columns()?;
        options.extend(self.parse_index_options()?);
        Ok(Statement::CreateIndex(CreateIndexStatement {
            kind,
            name,
            table,
            columns,
            options,
        }))
    }

    fn parse_create_database(&mut self) -> Result<CreateDatabaseStatement, ParseError> {
        let if_not_exists = self.parse_if_not_exists()?;
        let name = self.expect_identifier()?;
        let mut options = vec![];
        while self.is_table_option_start() {
            options.push(self.parse_table_option()?);
        }
        Ok(CreateDatabaseStatement {
            if_not_exists,
            name,
            options,
        })
    }

    fn parse_create_table(&mut self) -> Result<CreateTableStatement, ParseError> {
        let if_not_exists = self.parse_if_not_exists()?;
        let table = self.parse_table_name()?;
        let mut create = CreateTableStatement::new(table);
        create.if_not_exists = if_not_exists;

        if self.consume_keyword(Keyword::Like) {
            create.like = Some(self.parse_table_name()?);
            return Ok(create);
        }

        self.expect(&TokenKind::LeftParen)?;
        if self.consume_keyword(Keyword::Like) {
            create.like = Some(self.parse_table_name()?);
            self.expect(&TokenKind::RightParen)?;
            return Ok(create);
        }

        loop {
            if self.is_constraint_start() {
                create.constraints.push(self.parse_table_constraint()?);
            } else {
                create.columns.push(self.parse_column_def()?);
            }
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightParen)?;

        loop {
            self.consume(&TokenKind::Comma);
            if !self.is_table_option_start() {
                break;
            }
            create.options.push(self.parse_table_option()?);
        }

        Ok(create)
    }

    fn parse_if_not_exists(&mut self) -> Result<bool, ParseError> {
        if self.consume_keyword(Keyword::If) {
            self.expect_keyword(Keyword::Not)?;
            self.expect_keyword(Keyword::Exists)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn parse_if_exists(&mut self) -> Result<bool, ParseError> {
        if self.consume_keyword(Keyword::If) {
            self.expect_keyword(Keyword::Exists)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    // ====================================================================
    // Columns and types
    // ====================================================================

    /// Parses `name type [attributes...]`.
    pub(super) fn parse_column_def(&mut self) -> Result<ColumnDef, ParseError> {
        let name = self.expect_identifier()?;
        let data_type = self.parse_data_type()?;
        let mut column = ColumnDef::new(name, data_type);

        loop {
            let option = if self.consume_keyword(Keyword::Not) {
                self.expect_keyword(Keyword::Null)?;
                ColumnOption::NotNull
            } else if self.consume_keyword(Keyword::Null) {
                ColumnOption::Null
            } else if self.consume_keyword(Keyword::Default) {
                ColumnOption::Default(self.parse_expression(0)?)
            } else if self.consume_word("AUTO_INCREMENT") {
                ColumnOption::AutoIncrement
            } else if self.consume_keyword(Keyword::Primary) {
                self.expect_keyword(Keyword::Key)?;
                ColumnOption::PrimaryKey
            } else if self.consume_keyword(Keyword::Key) {
                ColumnOption::PrimaryKey
            } else if self.consume_keyword(Keyword::Unique) {
                self.consume_keyword(Keyword::Key);
                ColumnOption::Unique
            } else if self.consume_word("COMMENT") {
                ColumnOption::Comment(self.expect_string_literal()?)
            } else if self.consume_keyword(Keyword::On) {
                self.expect_keyword(Keyword::Update)?;
                ColumnOption::OnUpdate(self.parse_expression(0)?)
            } else if self.consume_keyword(Keyword::Collate) {
                ColumnOption::Collate(self.expect_name_or_string()?)
            } else {
                break;
            };
            column.options.push(option);
        }

        Ok(column)
    }

    /// Parses a MySQL data type with its attributes.
    pub(super) fn parse_data_type(&mut self) -> Result<DataType, ParseError> {
        let name = match &self.current.kind {
            TokenKind::Identifier(name) => name.clone(),
            TokenKind::Keyword(Keyword::Binary | Keyword::Unsigned | Keyword::Character) => {
                self.lexer.slice(self.current.span).to_string()
            }
            _ => return Err(self.unexpected("data type")),
        };
        self.advance();

        let mut data_type = DataType::new(name);

        // CAST(x AS UNSIGNED INTEGER), CHARACTER VARYING, DOUBLE PRECISION
        if let TokenKind::Identifier(word) = &self.current.kind {
            let upper = word.to_ascii_uppercase();
            if matches!(upper.as_str(), "INTEGER" | "INT" | "PRECISION" | "VARYING") {
                data_type.name = format!("{} {word}", data_type.name);
                self.advance();
            }
        }

        if self.consume(&TokenKind::LeftParen) {
            loop {
                let arg = match &self.current.kind {
                    TokenKind::Number(n) => n.clone(),
                    TokenKind::String(s) => Literal::String(s.clone()).to_string(),
                    TokenKind::DoubleQuotedString(s) => {
                        Literal::DoubleQuotedString(s.clone()).to_string()
                    }
                    _ => return Err(self.unexpected("type argument")),
                };
                self.advance();
                data_type.args.push(arg);
                if !self.consume(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RightParen)?;
        }

        loop {
            if self.consume_keyword(Keyword::Unsigned) {
                data_type.unsigned = true;
            } else if self.consume_word("SIGNED") {
                data_type.unsigned = false;
            } else if self.consume_keyword(Keyword::Zerofill) {
                data_type.zerofill = true;
            } else if self.consume_keyword(Keyword::Binary) {
                data_type.binary = true;
            } else if self.check_keyword(Keyword::Character) || self.check_word("CHARSET") {
                if self.consume_keyword(Keyword::Character) {
                    self.expect_keyword(Keyword::Set)?;
                } else {
                    self.advance();
                }
                data_type.charset = Some(self.expect_name_or_string()?);
            } else if self.check_keyword(Keyword::Collate) && data_type.collate.is_none() {
                self.advance();
                data_type.collate = Some(self.expect_name_or_string()?);
            } else {
                break;
            }
        }

        Ok(data_type)
    }

    fn expect_string_literal(&mut self) -> Result<Literal, ParseError> {
        let literal = match &self.current.kind {
            TokenKind::String(s) => Literal::String(s.clone()),
            TokenKind::DoubleQuotedString(s) => Literal::DoubleQuotedString(s.clone()),
            _ => return Err(self.unexpected("string literal")),
        };
        self.advance();
        Ok(literal)
    }

    fn parse_column_position(&mut self) -> Result<Option<ColumnPosition>, ParseError> {
        if self.consume_word("FIRST") {
            Ok(Some(ColumnPosition::First))
        } else if self.consume_word("AFTER") {
            Ok(Some(ColumnPosition::After(self.expect_identifier()?)))
        } else {
            Ok(None)
        }
    }

    // ====================================================================
    // Indexes and constraints
    // ====================================================================

    fn is_constraint_start(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Keyword(
                Keyword::Primary
                    | Keyword::Unique
                    | Keyword::Key
                    | Keyword::Index
                    | Keyword::Fulltext
                    | Keyword::Constraint
                    | Keyword::Foreign
                    | Keyword::Check
            )
        )
    }

    /// Parses a table-level constraint or index definition.
    pub(super) fn parse_table_constraint(&mut self) -> Result<TableConstraint, ParseError> {
        let mut symbol = None;
        if self.consume_keyword(Keyword::Constraint)
            && matches!(
                self.current.kind,
                TokenKind::Identifier(_) | TokenKind::QuotedIdentifier(_)
            )
        {
            symbol = Some(self.expect_identifier()?);
        }

        if self.consume_keyword(Keyword::Primary) {
            self.expect_keyword(Keyword::Key)?;
            let mut options = self.parse_index_options()?;
            let columns = self.parse_index_columns()?;
            options.extend(self.parse_index_options()?);
            return Ok(TableConstraint {
                name: None,
                kind: ConstraintKind::PrimaryKey,
                columns,
                options,
            });
        }

        if self.consume_keyword(Keyword::Foreign) {
            self.expect_keyword(Keyword::Key)?;
            let name = self.parse_optional_index_name()?.or(symbol);
            let columns = self.parse_index_columns()?;
            self.expect_keyword(Keyword::References)?;
            let table = self.parse_table_name()?;
            self.expect(&TokenKind::LeftParen)?;
            let ref_columns = self.parse_identifier_list()?;
            self.expect(&TokenKind::RightParen)?;
            let mut reference = ForeignKeyRef {
                table,
                columns: ref_columns,
                on_delete: None,
                on_update: None,
            };
            while self.consume_keyword(Keyword::On) {
                if self.consume_keyword(Keyword::Delete) {
                    reference.on_delete = Some(self.parse_reference_action()?);
                } else {
                    self.expect_keyword(Keyword::Update)?;
                    reference.on_update = Some(self.parse_reference_action()?);
                }
            }
            return Ok(TableConstraint::new(
                name,
                ConstraintKind::ForeignKey(reference),
                columns,
            ));
        }

        if self.consume_keyword(Keyword::Check) {
            self.expect(&TokenKind::LeftParen)?;
            let expr = self.parse_expression(0)?;
            self.expect(&TokenKind::RightParen)?;
            return Ok(TableConstraint::new(
                symbol,
                ConstraintKind::Check(expr),
                vec![],
            ));
        }

        let kind = if self.consume_keyword(Keyword::Unique) {
            if !self.consume_keyword(Keyword::Index) {
                self.consume_keyword(Keyword::Key);
            }
            ConstraintKind::Unique
        } else if self.consume_keyword(Keyword::Fulltext) {
            if !self.consume_keyword(Keyword::Index) {
                self.consume_keyword(Keyword::Key);
            }
            ConstraintKind::Fulltext
        } else if self.consume_keyword(Keyword::Index) || self.consume_keyword(Keyword::Key) {
            ConstraintKind::Index
        } else {
            return Err(self.unexpected("PRIMARY KEY, UNIQUE, INDEX, FOREIGN KEY or CHECK"));
        };

        let name = self.parse_optional_index_name()?.or(symbol);
        let mut options = self.parse_index_options()?;
        let columns = self.parse_index_columns()?;
        options.extend(self.parse_index_options()?);
        Ok(TableConstraint {
            name,
            kind,
            columns,
            options,
        })
    }

    fn parse_optional_index_name(&mut self) -> Result<Option<String>, ParseError> {
        match &self.current.kind {
            TokenKind::Identifier(_) | TokenKind::QuotedIdentifier(_) => {
                Ok(Some(self.expect_identifier()?))
            }
            _ => Ok(None),
        }
    }

    fn parse_reference_action(&mut self) -> Result<String, ParseError> {
        if self.consume_keyword(Keyword::Restrict) {
            Ok(String::from("RESTRICT"))
        } else if self.consume_keyword(Keyword::Cascade) {
            Ok(String::from("CASCADE"))
        } else if self.consume_keyword(Keyword::Set) {
            if self.consume_keyword(Keyword::Null) {
                Ok(String::from("SET NULL"))
            } else {
                self.expect_keyword(Keyword::Default)?;
                Ok(String::from("SET DEFAULT"))
            }
        } else {
            self.expect_word("NO")?;
            self.expect_word("ACTION")?;
            Ok(String::from("NO ACTION"))
        }
    }

    /// Parses `(col [(len)] [ASC|DESC], ...)`.
    pub(super) fn parse_index_columns(&mut self) -> Result<Vec<IndexColumn>, ParseError> {
        self.expect(&TokenKind::LeftParen)?;
        let mut columns = vec![];
        loop {
            let mut column = IndexColumn::new(self.expect_identifier()?);
            if self.consume(&TokenKind::LeftParen) {
                column.length = match &self.current.kind {
                    TokenKind::Number(n) => n.parse().ok(),
                    _ => None,
                };
                if column.length.is_none() {
                    return Err(self.unexpected("prefix length"));
                }
                self.advance();
                self.expect(&TokenKind::RightParen)?;
            }
            if self.consume_keyword(Keyword::Asc) {
                column.direction = Some(OrderDirection::Asc);
            } else if self.consume_keyword(Keyword::Desc) {
                column.direction = Some(OrderDirection::Desc);
            }
            columns.push(column);
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightParen)?;
        Ok(columns)
    }

    fn parse_index_options(&mut self) -> Result<Vec<IndexOption>, ParseError> {
        let mut options = vec![];
        loop {
            if self.consume_keyword(Keyword::Using) {
                let method = self.expect_identifier()?.to_ascii_uppercase();
                options.push(IndexOption::Using(method));
            } else if self.consume_word("COMMENT") {
                options.push(IndexOption::Comment(self.expect_string_literal()?));
            } else {
                break;
            }
        }
        Ok(options)
    }

    // ====================================================================
    // Table options
    // ====================================================================

    fn is_table_option_start(&self) -> bool {
        match &self.current.kind {
            TokenKind::Keyword(Keyword::Default | Keyword::Character | Keyword::Collate) => true,
            TokenKind::Identifier(word) => !matches!(
                word.to_ascii_uppercase().as_str(),
                "FIRST" | "AFTER" | "MODIFY" | "PARTITION"
            ),
            _ => false,
        }
    }

    /// Parses `[DEFAULT] NAME [=] value`.
    pub(super) fn parse_table_option(&mut self) -> Result<TableOption, ParseError> {
        let default = self.consume_keyword(Keyword::Default);
        let key = if self.consume_keyword(Keyword::Character) {
            self.expect_keyword(Keyword::Set)?;
            String::from("CHARSET")
        } else if self.consume_keyword(Keyword::Collate) {
            String::from("COLLATE")
        } else {
            let word = self.expect_identifier()?.to_ascii_uppercase();
            if word == "CHARACTER" {
                self.expect_keyword(Keyword::Set)?;
                String::from("CHARSET")
            } else {
                word
            }
        };
        let name = if default { format!("DEFAULT {key}") } else { key };

        self.consume(&TokenKind::Eq);

        let value = match &self.current.kind {
            TokenKind::Number(n) => Expr::Literal(Literal::Number(n.clone())),
            TokenKind::String(s) => Expr::Literal(Literal::String(s.clone())),
            TokenKind::DoubleQuotedString(s) => {
                Expr::Literal(Literal::DoubleQuotedString(s.clone()))
            }
            TokenKind::Identifier(s) | TokenKind::QuotedIdentifier(s) => Expr::column(s.clone()),
            TokenKind::Keyword(Keyword::Binary | Keyword::Default) => {
                Expr::column(self.lexer.slice(self.current.span).to_string())
            }
            _ => return Err(self.unexpected("option value")),
        };
        self.advance();
        Ok(TableOption { name, value })
    }

    // ====================================================================
    // ALTER
    // ====================================================================

    pub(super) fn parse_alter_table_statement(
        &mut self,
    ) -> Result<AlterTableStatement, ParseError> {
        self.expect_keyword(Keyword::Alter)?;
        self.consume_keyword(Keyword::Ignore);
        self.expect_keyword(Keyword::Table)?;
        let table = self.parse_table_name()?;

        let mut specs = vec![];
        loop {
            specs.push(self.parse_alter_spec()?);
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }

        Ok(AlterTableStatement::new(table, specs))
    }

    fn parse_alter_spec(&mut self) -> Result<AlterSpec, ParseError> {
        if self.consume_keyword(Keyword::Add) {
            return self.parse_alter_add();
        }
        if self.consume_keyword(Keyword::Drop) {
            return self.parse_alter_drop();
        }
        if self.consume_keyword(Keyword::Change) {
            self.consume_keyword(Keyword::Column);
            let old_name = self.expect_identifier()?;
            let column = self.parse_column_def()?;
            let position = self.parse_column_position()?;
            return Ok(AlterSpec::ChangeColumn {
                old_name,
                column,
                position,
            });
        }
        if self.consume_word("MODIFY") {
            self.consume_keyword(Keyword::Column);
            let column = self.parse_column_def()?;
            let position = self.parse_column_position()?;
            return Ok(AlterSpec::ModifyColumn { column, position });
        }
        if self.consume_keyword(Keyword::Alter) {
            self.consume_keyword(Keyword::Column);
            let name = self.expect_identifier()?;
            let action = if self.consume_keyword(Keyword::Set) {
                self.expect_keyword(Keyword::Default)?;
                AlterColumnAction::SetDefault(self.parse_expression(0)?)
            } else {
                self.expect_keyword(Keyword::Drop)?;
                self.expect_keyword(Keyword::Default)?;
                AlterColumnAction::DropDefault
            };
            return Ok(AlterSpec::AlterColumn { name, action });
        }
        if self.consume_keyword(Keyword::Rename) {
            if self.consume_keyword(Keyword::Index) || self.consume_keyword(Keyword::Key) {
                let from = self.expect_identifier()?;
                self.expect_keyword(Keyword::To)?;
                let to = self.expect_identifier()?;
                return Ok(AlterSpec::RenameIndex { from, to });
            }
            if self.consume_keyword(Keyword::Column) {
                let from = self.expect_identifier()?;
                self.expect_keyword(Keyword::To)?;
                let to = self.expect_identifier()?;
                return Ok(AlterSpec::RenameColumn { from, to });
            }
            if !self.consume_keyword(Keyword::To) {
                self.consume_keyword(Keyword::As);
            }
            let to = self.parse_table_name()?;
            return Ok(AlterSpec::RenameTable { to });
        }
        if self.is_table_option_start() {
            let mut options = vec![self.parse_table_option()?];
            while self.is_table_option_start() {
                options.push(self.parse_table_option()?);
            }
            return Ok(AlterSpec::Options(options));
        }
        Err(self.unexpected("ALTER TABLE clause"))
    }

    fn parse_alter_add(&mut self) -> Result<AlterSpec, ParseError> {
        if self.is_constraint_start() {
            return Ok(AlterSpec::AddConstraint(self.parse_table_constraint()?));
        }
        self.consume_keyword(Keyword::Column);
        if self.consume(&TokenKind::LeftParen) {
            let mut columns = vec![self.parse_column_def()?];
            while self.consume(&TokenKind::Comma) {
                columns.push(self.parse_column_def()?);
            }
            self.expect(&TokenKind::RightParen)?;
            return Ok(AlterSpec::AddColumns {
                columns,
                position: None,
            });
        }
        let column = self.parse_column_def()?;
        let position = self.parse_column_position()?;
        Ok(AlterSpec::AddColumns {
            columns: vec![column],
            position,
        })
    }

    fn parse_alter_drop(&mut self) -> Result<AlterSpec, ParseError> {
        if self.consume_keyword(Keyword::Primary) {
            self.expect_keyword(Keyword::Key)?;
            return Ok(AlterSpec::DropPrimaryKey);
        }
        if self.consume_keyword(Keyword::Index) || self.consume_keyword(Keyword::Key) {
            let name = self.expect_identifier()?;
            return Ok(AlterSpec::DropIndex { name });
        }
        if self.consume_keyword(Keyword::Foreign) {
            self.expect_keyword(Keyword::Key)?;
            let name = self.expect_identifier()?;
            return Ok(AlterSpec::DropForeignKey { name });
        }
        self.consume_keyword(Keyword::Column);
        let name = self.expect_identifier()?;
        Ok(AlterSpec::DropColumn { name })
    }

    // ====================================================================
    // DROP / RENAME
    // ====================================================================

    pub(super) fn parse_drop_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::Drop)?;

        if self.consume_keyword(Keyword::Database) || self.consume_keyword(Keyword::Schema) {
            let if_exists = self.parse_if_exists()?;
            let name = self.expect_identifier()?;
            return Ok(Statement::DropDatabase(DropDatabaseStatement { if_exists, name }));
        }

        if self.consume_keyword(Keyword::Index) {
            let if_exists = self.parse_if_exists()?;
            let name = self.expect_identifier()?;
            self.expect_keyword(Keyword::On)?;
            let table = self.parse_table_name()?;
            return Ok(Statement::DropIndex(DropIndexStatement {
                if_exists,
                name,
                table,
            }));
        }

        let temporary = self.consume_word("TEMPORARY");
        self.expect_keyword(Keyword::Table)?;
        let if_exists = self.parse_if_exists()?;
        let mut tables = vec![self.parse_table_name()?];
        while self.consume(&TokenKind::Comma) {
            tables.push(self.parse_table_name()?);
        }
        if !self.consume_keyword(Keyword::Restrict) {
            self.consume_keyword(Keyword::Cascade);
        }
        Ok(Statement::DropTable(DropTableStatement {
            temporary,
            if_exists,
            tables,
        }))
    }

    pub(super) fn parse_rename_table_statement(
        &mut self,
    ) -> Result<RenameTableStatement, ParseError> {
        self.expect_keyword(Keyword::Rename)?;
        self.expect_keyword(Keyword::Table)?;
        let mut pairs = vec![];
        loop {
            let from = self.parse_table_name()?;
            self.expect_keyword(Keyword::To)?;
            let to = self.parse_table_name()?;
            pairs.push(RenamePair { from, to });
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        Ok(RenameTableStatement { pairs })
    }
}
