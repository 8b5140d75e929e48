//! SQL Parser implementation.

use super::error::ParseError;
use super::pratt::{
    infix_binding_power, prefix_binding_power, token_to_binary_op, token_to_unary_op,
};
use crate::ast::{
    AlterAction, AlterTableStatement, BeginStatement, CallStatement, ColumnDef,
    CreateDatabaseStatement, CreateIndexStatement, CreateTableStatement, CreateViewStatement,
    CteDef, DataType, DeleteStatement, DropDatabaseStatement, DropIndexStatement,
    DropTableStatement, DropViewStatement, Expr, FunctionCall, InsertSource, InsertStatement,
    IsolationLevel, JoinClause, JoinType, LockMode, LockingClause, Literal, OrderBy,
    OrderDirection, ReferentialAction, SelectColumn, SelectStatement, SetOp, SetOpLeg,
    SetTransactionStatement, SetVariableStatement, ShowKind, ShowStatement, Statement,
    TableConstraint, TableRef, TransactionScope, UpdateAssignment, UpdateStatement, WaitPolicy,
};
use crate::lexer::{Keyword, Lexer, Span, Token, TokenKind};

/// SQL Parser.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    previous: Token,
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

    /// Parses a single SQL statement.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the input is not a valid SQL statement.
    pub fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match &self.current.kind {
            TokenKind::Keyword(Keyword::Select) | TokenKind::Keyword(Keyword::With) => {
                Ok(Statement::Select(self.parse_select_statement()?))
            }
            TokenKind::Keyword(Keyword::Insert) => {
                Ok(Statement::Insert(self.parse_insert_statement()?))
            }
            TokenKind::Keyword(Keyword::Update) => {
                Ok(Statement::Update(self.parse_update_statement()?))
            }
            TokenKind::Keyword(Keyword::Delete) => {
                Ok(Statement::Delete(self.parse_delete_statement()?))
            }
            TokenKind::Keyword(Keyword::Create) => self.parse_create_statement(),
            TokenKind::Keyword(Keyword::Drop) => self.parse_drop_statement(),
            TokenKind::Keyword(Keyword::Alter) => {
                Ok(Statement::AlterTable(self.parse_alter_table_statement()?))
            }
            TokenKind::Keyword(Keyword::Begin) | TokenKind::Keyword(Keyword::Start) => {
                Ok(Statement::Begin(self.parse_begin_statement()?))
            }
            TokenKind::Keyword(Keyword::Commit) => {
                self.advance();
                Ok(Statement::Commit)
            }
            TokenKind::Keyword(Keyword::Rollback) => {
                self.advance();
                Ok(Statement::Rollback)
            }
            TokenKind::Keyword(Keyword::Set) => self.parse_set_statement(),
            TokenKind::Keyword(Keyword::Show) => Ok(Statement::Show(self.parse_show_statement()?)),
            TokenKind::Keyword(Keyword::Describe) | TokenKind::Keyword(Keyword::Desc) => {
                self.advance();
                let table = self.expect_identifier()?;
                Ok(Statement::Describe { table })
            }
            TokenKind::Keyword(Keyword::Call) => {
                self.advance();
                let name = self.expect_identifier()?;
                self.expect(&TokenKind::LeftParen)?;
                let args = if self.check(&TokenKind::RightParen) {
                    vec![]
                } else {
                    self.parse_expression_list()?
                };
                self.expect(&TokenKind::RightParen)?;
                Ok(Statement::Call(CallStatement { name, args }))
            }
            _ => Err(ParseError::unexpected(
                "a SQL statement",
                self.current.kind.clone(),
                self.current.span,
            )),
        }
    }

    // ===================================================================
    // CREATE / DROP / ALTER
    // ===================================================================

    fn parse_create_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::Create)?;

        let unique = if self.check_keyword(Keyword::Unique) {
            self.advance();
            true
        } else {
            false
        };

        let or_replace = if unique {
            false
        } else if self.check_keyword(Keyword::Or) {
            self.advance();
            self.expect_keyword(Keyword::Replace)?;
            true
        } else {
            false
        };

        match &self.current.kind {
            TokenKind::Keyword(Keyword::Database) => {
                self.advance();
                let if_not_exists = self.parse_if_not_exists()?;
                let name = self.expect_identifier()?;
                Ok(Statement::CreateDatabase(CreateDatabaseStatement {
                    name,
                    if_not_exists,
                }))
            }
            TokenKind::Keyword(Keyword::Table) => {
                self.advance();
                Ok(Statement::CreateTable(self.parse_create_table_body()?))
            }
            TokenKind::Keyword(Keyword::Index) => {
                self.advance();
                let name = self.expect_identifier()?;
                self.expect_keyword(Keyword::On)?;
                let table = self.expect_identifier()?;
                self.expect(&TokenKind::LeftParen)?;
                let columns = self.parse_identifier_list()?;
                self.expect(&TokenKind::RightParen)?;
                Ok(Statement::CreateIndex(CreateIndexStatement {
                    name,
                    table,
                    columns,
                    unique,
                    if_not_exists: false,
                }))
            }
            TokenKind::Keyword(Keyword::View) => {
                self.advance();
                let name = self.expect_identifier()?;
                self.expect_keyword(Keyword::As)?;
                let query = self.parse_select_statement()?;
                Ok(Statement::CreateView(CreateViewStatement {
                    name,
                    query: Box::new(query),
                    or_replace,
                }))
            }
            _ => Err(ParseError::unexpected(
                "DATABASE, TABLE, INDEX, or VIEW",
                self.current.kind.clone(),
                self.current.span,
            )),
        }
    }

    fn parse_if_not_exists(&mut self) -> Result<bool, ParseError> {
        if self.check_keyword(Keyword::If) {
            self.advance();
            self.expect_keyword(Keyword::Not)?;
            self.expect_keyword(Keyword::Exists)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn parse_if_exists(&mut self) -> Result<bool, ParseError> {
        if self.check_keyword(Keyword::If) {
            self.advance();
            self.expect_keyword(Keyword::Exists)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn parse_create_table_body(&mut self) -> Result<CreateTableStatement, ParseError> {
        let if_not_exists = self.parse_if_not_exists()?;

        let first = self.expect_identifier()?;
        let (schema, name) = if self.check(&TokenKind::Dot) {
            self.advance();
            let table_name = self.expect_identifier()?;
            (Some(first), table_name)
        } else {
            (None, first)
        };

        self.expect(&TokenKind::LeftParen)?;

        let mut columns = vec![];
        let mut constraints = vec![];

        loop {
            if self.is_table_constraint_start() {
                constraints.push(self.parse_table_constraint()?);
            } else {
                columns.push(self.parse_column_def()?);
            }

            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        self.expect(&TokenKind::RightParen)?;

        Ok(CreateTableStatement {
            schema,
            name,
            columns,
            constraints,
            if_not_exists,
        })
    }

    fn is_table_constraint_start(&self) -> bool {
        matches!(
            &self.current.kind,
            TokenKind::Keyword(
                Keyword::Primary | Keyword::Unique | Keyword::Foreign | Keyword::Check
            )
        ) || (self.check_keyword(Keyword::Constraint))
    }

    fn parse_column_def(&mut self) -> Result<ColumnDef, ParseError> {
        let name = self.expect_identifier()?;
        let data_type = self.parse_data_type()?;

        let mut col = ColumnDef::new(name, data_type);

        loop {
            match &self.current.kind {
                TokenKind::Keyword(Keyword::Not) => {
                    self.advance();
                    self.expect_keyword(Keyword::Null)?;
                    col = col.not_null();
                }
                TokenKind::Keyword(Keyword::Null) => {
                    self.advance();
                }
                TokenKind::Keyword(Keyword::Primary) => {
                    self.advance();
                    self.expect_keyword(Keyword::Key)?;
                    col = col.primary_key();
                }
                TokenKind::Keyword(Keyword::Unique) => {
                    self.advance();
                    col = col.unique();
                }
                TokenKind::Keyword(Keyword::Autoincrement) => {
                    self.advance();
                    col = col.autoincrement();
                }
                TokenKind::Keyword(Keyword::Default) => {
                    self.advance();
                    let expr = self.parse_expression(0)?;
                    col = col.default(expr);
                }
                _ => break,
            }
        }

        Ok(col)
    }

    fn parse_table_constraint(&mut self) -> Result<TableConstraint, ParseError> {
        let name = if self.check_keyword(Keyword::Constraint) {
            self.advance();
            Some(self.expect_identifier()?)
        } else {
            None
        };

        match &self.current.kind {
            TokenKind::Keyword(Keyword::Primary) => {
                self.advance();
                self.expect_keyword(Keyword::Key)?;
                self.expect(&TokenKind::LeftParen)?;
                let columns = self.parse_identifier_list()?;
                self.expect(&TokenKind::RightParen)?;
                Ok(TableConstraint::PrimaryKey { name, columns })
            }
            TokenKind::Keyword(Keyword::Unique) => {
                self.advance();
                self.expect(&TokenKind::LeftParen)?;
                let columns = self.parse_identifier_list()?;
                self.expect(&TokenKind::RightParen)?;
                Ok(TableConstraint::Unique { name, columns })
            }
            TokenKind::Keyword(Keyword::Foreign) => {
                self.advance();
                self.expect_keyword(Keyword::Key)?;
                self.expect(&TokenKind::LeftParen)?;
                let columns = self.parse_identifier_list()?;
                self.expect(&TokenKind::RightParen)?;
                self.expect_keyword(Keyword::References)?;
                let ref_table = self.expect_identifier()?;
                self.expect(&TokenKind::LeftParen)?;
                let ref_columns = self.parse_identifier_list()?;
                self.expect(&TokenKind::RightParen)?;

                let mut on_delete = ReferentialAction::Restrict;
                let mut on_update = ReferentialAction::Restrict;
                loop {
                    if self.check_keyword(Keyword::On) {
                        self.advance();
                        if self.check_keyword(Keyword::Delete) {
                            self.advance();
                            on_delete = self.parse_referential_action()?;
                        } else if self.check_keyword(Keyword::Update) {
                            self.advance();
                            on_update = self.parse_referential_action()?;
                        } else {
                            return Err(ParseError::new(
                                "Expected DELETE or UPDATE after ON",
                                self.current.span,
                            ));
                        }
                    } else {
                        break;
                    }
                }

                Ok(TableConstraint::ForeignKey {
                    name,
                    columns,
                    ref_table,
                    ref_columns,
                    on_delete,
                    on_update,
                })
            }
            TokenKind::Keyword(Keyword::Check) => {
                self.advance();
                self.expect(&TokenKind::LeftParen)?;
                let expr = self.parse_expression(0)?;
                self.expect(&TokenKind::RightParen)?;
                Ok(TableConstraint::Check { name, expr })
            }
            _ => Err(ParseError::unexpected(
                "PRIMARY KEY, UNIQUE, FOREIGN KEY, or CHECK",
                self.current.kind.clone(),
                self.current.span,
            )),
        }
    }

    fn parse_referential_action(&mut self) -> Result<ReferentialAction, ParseError> {
        match &self.current.kind {
            TokenKind::Keyword(Keyword::Cascade) => {
                self.advance();
                Ok(ReferentialAction::Cascade)
            }
            TokenKind::Keyword(Keyword::Restrict) => {
                self.advance();
                Ok(ReferentialAction::Restrict)
            }
            TokenKind::Keyword(Keyword::Set) => {
                self.advance();
                if self.check_keyword(Keyword::Null) {
                    self.advance();
                    Ok(ReferentialAction::SetNull)
                } else {
                    self.expect_keyword(Keyword::Default)?;
                    Ok(ReferentialAction::SetDefault)
                }
            }
            TokenKind::Keyword(Keyword::No) => {
                self.advance();
                self.expect_keyword(Keyword::Action)?;
                Ok(ReferentialAction::NoAction)
            }
            _ => Err(ParseError::unexpected(
                "CASCADE, RESTRICT, SET NULL, SET DEFAULT, or NO ACTION",
                self.current.kind.clone(),
                self.current.span,
            )),
        }
    }

    fn parse_drop_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::Drop)?;

        match &self.current.kind {
            TokenKind::Keyword(Keyword::Database) => {
                self.advance();
                let if_exists = self.parse_if_exists()?;
                let name = self.expect_identifier()?;
                Ok(Statement::DropDatabase(DropDatabaseStatement {
                    name,
                    if_exists,
                }))
            }
            TokenKind::Keyword(Keyword::Table) => {
                self.advance();
                let if_exists = self.parse_if_exists()?;
                let first = self.expect_identifier()?;
                let (schema, name) = if self.check(&TokenKind::Dot) {
                    self.advance();
                    let table_name = self.expect_identifier()?;
                    (Some(first), table_name)
                } else {
                    (None, first)
                };
                Ok(Statement::DropTable(DropTableStatement {
                    schema,
                    name,
                    if_exists,
                }))
            }
            TokenKind::Keyword(Keyword::Index) => {
                self.advance();
                let if_exists = self.parse_if_exists()?;
                let name = self.expect_identifier()?;
                self.expect_keyword(Keyword::On)?;
                let table = self.expect_identifier()?;
                Ok(Statement::DropIndex(DropIndexStatement {
                    name,
                    table,
                    if_exists,
                }))
            }
            TokenKind::Keyword(Keyword::View) => {
                self.advance();
                let if_exists = self.parse_if_exists()?;
                let name = self.expect_identifier()?;
                Ok(Statement::DropView(DropViewStatement { name, if_exists }))
            }
            _ => Err(ParseError::unexpected(
                "DATABASE, TABLE, INDEX, or VIEW",
                self.current.kind.clone(),
                self.current.span,
            )),
        }
    }

    fn parse_alter_table_statement(&mut self) -> Result<AlterTableStatement, ParseError> {
        self.expect_keyword(Keyword::Alter)?;
        self.expect_keyword(Keyword::Table)?;
        let table = self.expect_identifier()?;

        let mut actions = vec![];
        loop {
            actions.push(self.parse_alter_action()?);
            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        Ok(AlterTableStatement { table, actions })
    }

    fn parse_alter_action(&mut self) -> Result<AlterAction, ParseError> {
        match &self.current.kind {
            TokenKind::Keyword(Keyword::Add) => {
                self.advance();
                if self.is_table_constraint_start() {
                    Ok(AlterAction::AddConstraint(self.parse_table_constraint()?))
                } else {
                    if self.check_keyword(Keyword::Column) {
                        self.advance();
                    }
                    Ok(AlterAction::AddColumn(self.parse_column_def()?))
                }
            }
            TokenKind::Keyword(Keyword::Drop) => {
                self.advance();
                if self.check_keyword(Keyword::Column) {
                    self.advance();
                    Ok(AlterAction::DropColumn(self.expect_identifier()?))
                } else if self.check_keyword(Keyword::Primary) {
                    self.advance();
                    self.expect_keyword(Keyword::Key)?;
                    Ok(AlterAction::DropPrimaryKey)
                } else if self.check_keyword(Keyword::Foreign) {
                    self.advance();
                    self.expect_keyword(Keyword::Key)?;
                    Ok(AlterAction::DropForeignKey(self.expect_identifier()?))
                } else if self.check_keyword(Keyword::Index) || self.check_keyword(Keyword::Key) {
                    self.advance();
                    Ok(AlterAction::DropIndexConstraint(self.expect_identifier()?))
                } else if self.check_keyword(Keyword::Check) {
                    self.advance();
                    Ok(AlterAction::DropCheck(self.expect_identifier()?))
                } else {
                    Ok(AlterAction::DropColumn(self.expect_identifier()?))
                }
            }
            TokenKind::Keyword(Keyword::Modify) => {
                self.advance();
                if self.check_keyword(Keyword::Column) {
                    self.advance();
                }
                Ok(AlterAction::ModifyColumn(self.parse_column_def()?))
            }
            TokenKind::Keyword(Keyword::Change) => {
                self.advance();
                if self.check_keyword(Keyword::Column) {
                    self.advance();
                }
                let old_name = self.expect_identifier()?;
                let new_col = self.parse_column_def()?;
                Ok(AlterAction::ChangeColumn { old_name, new_col })
            }
            TokenKind::Keyword(Keyword::Rename) => {
                self.advance();
                if self.check_keyword(Keyword::Column) {
                    self.advance();
                    let old_name = self.expect_identifier()?;
                    self.expect_keyword(Keyword::To)?;
                    let new_name = self.expect_identifier()?;
                    Ok(AlterAction::RenameColumn { old_name, new_name })
                } else {
                    if self.check_keyword(Keyword::To) || self.check_keyword(Keyword::As) {
                        self.advance();
                    }
                    Ok(AlterAction::RenameTable(self.expect_identifier()?))
                }
            }
            _ => Err(ParseError::unexpected(
                "ADD, DROP, MODIFY, CHANGE, or RENAME",
                self.current.kind.clone(),
                self.current.span,
            )),
        }
    }

    // ===================================================================
    // Transactions / SET / SHOW / DESCRIBE
    // ===================================================================

    fn parse_begin_statement(&mut self) -> Result<BeginStatement, ParseError> {
        if self.check_keyword(Keyword::Start) {
            self.advance();
            self.expect_keyword(Keyword::Transaction)?;
        } else {
            self.advance();
        }

        let mut stmt = BeginStatement::default();
        loop {
            if self.check_keyword(Keyword::Read) {
                self.advance();
                if self.check_keyword(Keyword::Only) {
                    self.advance();
                    stmt.read_only = true;
                } else {
                    self.expect_keyword(Keyword::Write)?;
                    stmt.read_only = false;
                }
            } else if self.check_keyword(Keyword::Isolation) {
                self.advance();
                self.expect_keyword(Keyword::Level)?;
                stmt.isolation = Some(self.parse_isolation_level()?);
            } else {
                break;
            }
        }

        Ok(stmt)
    }

    fn parse_isolation_level(&mut self) -> Result<IsolationLevel, ParseError> {
        match &self.current.kind {
            TokenKind::Keyword(Keyword::Read) => {
                self.advance();
                if self.check_keyword(Keyword::Uncommitted) {
                    self.advance();
                    Ok(IsolationLevel::ReadUncommitted)
                } else {
                    self.expect_keyword(Keyword::Committed)?;
                    Ok(IsolationLevel::ReadCommitted)
                }
            }
            TokenKind::Keyword(Keyword::Repeatable) => {
                self.advance();
                self.expect_keyword(Keyword::Read)?;
                Ok(IsolationLevel::RepeatableRead)
            }
            TokenKind::Keyword(Keyword::Serializable) => {
                self.advance();
                Ok(IsolationLevel::Serializable)
            }
            _ => Err(ParseError::unexpected(
                "an isolation level",
                self.current.kind.clone(),
                self.current.span,
            )),
        }
    }

    fn parse_set_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::Set)?;

        if self.check_keyword(Keyword::Transaction) {
            self.advance();
            return self.parse_set_transaction_tail(TransactionScope::Next);
        }
        if self.check_keyword(Keyword::Session) {
            self.advance();
            self.expect_keyword(Keyword::Transaction)?;
            return self.parse_set_transaction_tail(TransactionScope::Session);
        }

        let global = if self.check_keyword(Keyword::Global) {
            self.advance();
            if self.check_keyword(Keyword::Transaction) {
                self.advance();
                return self.parse_set_transaction_tail(TransactionScope::Global);
            }
            true
        } else {
            false
        };

        let name = self.expect_identifier()?;
        self.expect(&TokenKind::Eq)?;
        let value = self.parse_expression(0)?;

        Ok(Statement::SetVariable(SetVariableStatement {
            name,
            value,
            global,
        }))
    }

    fn parse_set_transaction_tail(
        &mut self,
        scope: TransactionScope,
    ) -> Result<Statement, ParseError> {
        let mut isolation = None;
        let mut read_only = None;

        loop {
            if self.check_keyword(Keyword::Isolation) {
                self.advance();
                self.expect_keyword(Keyword::Level)?;
                isolation = Some(self.parse_isolation_level()?);
            } else if self.check_keyword(Keyword::Read) {
                self.advance();
                if self.check_keyword(Keyword::Only) {
                    self.advance();
                    read_only = Some(true);
                } else {
                    self.expect_keyword(Keyword::Write)?;
                    read_only = Some(false);
                }
            } else {
                break;
            }
        }

        Ok(Statement::SetTransaction(SetTransactionStatement {
            isolation,
            read_only,
            scope,
        }))
    }

    fn parse_show_statement(&mut self) -> Result<ShowStatement, ParseError> {
        self.expect_keyword(Keyword::Show)?;

        let kind = match &self.current.kind {
            TokenKind::Keyword(Keyword::Databases) => {
                self.advance();
                ShowKind::Databases
            }
            TokenKind::Keyword(Keyword::Tables) => {
                self.advance();
                let database = if self.check_keyword(Keyword::From) {
                    self.advance();
                    Some(self.expect_identifier()?)
                } else {
                    None
                };
                ShowKind::Tables { database }
            }
            TokenKind::Keyword(Keyword::Columns) => {
                self.advance();
                self.expect_keyword(Keyword::From)?;
                let table = self.expect_identifier()?;
                ShowKind::Columns { table }
            }
            _ => {
                return Err(ParseError::unexpected(
                    "DATABASES, TABLES, or COLUMNS",
                    self.current.kind.clone(),
                    self.current.span,
                ));
            }
        };

        let like_pattern = if self.check_keyword(Keyword::Like) {
            self.advance();
            match &self.current.kind {
                TokenKind::String(s) => {
                    let pattern = s.clone();
                    self.advance();
                    Some(pattern)
                }
                _ => {
                    return Err(ParseError::unexpected(
                        "a string literal",
                        self.current.kind.clone(),
                        self.current.span,
                    ));
                }
            }
        } else {
            None
        };

        let where_clause = if self.check_keyword(Keyword::Where) {
            self.advance();
            Some(self.parse_expression(0)?)
        } else {
            None
        };

        Ok(ShowStatement {
            kind,
            like_pattern,
            where_clause,
        })
    }

    /// Parses a SELECT statement, including an optional leading `WITH`
    /// clause and any trailing `UNION`/`INTERSECT`/`EXCEPT` legs.
    fn parse_select_statement(&mut self) -> Result<SelectStatement, ParseError> {
        let ctes = if self.check_keyword(Keyword::With) {
            self.advance();
            self.parse_cte_list()?
        } else {
            vec![]
        };

        let mut stmt = self.parse_select_core()?;
        stmt.ctes = ctes;

        loop {
            let op = match &self.current.kind {
                TokenKind::Keyword(Keyword::Union) => SetOp::Union,
                TokenKind::Keyword(Keyword::Intersect) => SetOp::Intersect,
                TokenKind::Keyword(Keyword::Except) => SetOp::Except,
                _ => break,
            };
            self.advance();

            let all = if self.check_keyword(Keyword::All) {
                self.advance();
                true
            } else if self.check_keyword(Keyword::Distinct) {
                self.advance();
                false
            } else {
                false
            };

            let leg = self.parse_select_core()?;
            stmt.set_ops.push(SetOpLeg {
                op,
                all,
                select: Box::new(leg),
            });
        }

        Ok(stmt)
    }

    /// Parses the `WITH [RECURSIVE] name [(cols)] AS (query), ...` list.
    fn parse_cte_list(&mut self) -> Result<Vec<CteDef>, ParseError> {
        let mut ctes = vec![];
        loop {
            let recursive = if self.check_keyword(Keyword::Recursive) {
                self.advance();
                true
            } else {
                false
            };

            let name = self.expect_identifier()?;

            let columns = if self.check(&TokenKind::LeftParen) {
                self.advance();
                let cols = self.parse_identifier_list()?;
                self.expect(&TokenKind::RightParen)?;
                cols
            } else {
                vec![]
            };

            self.expect_keyword(Keyword::As)?;
            self.expect(&TokenKind::LeftParen)?;
            let query = self.parse_select_statement()?;
            self.expect(&TokenKind::RightParen)?;

            ctes.push(CteDef {
                name,
                columns,
                recursive,
                query: Box::new(query),
            });

            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        Ok(ctes)
    }

    /// Parses a single `SELECT ... [FOR UPDATE|SHARE]` leg, without CTEs
    /// or set-operation chaining.
    fn parse_select_core(&mut self) -> Result<SelectStatement, ParseError> {
        self.expect_keyword(Keyword::Select)?;

        // DISTINCT or ALL
        let distinct = if self.check_keyword(Keyword::Distinct) {
            self.advance();
            true
        } else if self.check_keyword(Keyword::All) {
            self.advance();
            false
        } else {
            false
        };

        // SELECT columns
        let columns = self.parse_select_columns()?;

        // FROM clause (optional for expressions like SELECT 1+1)
        let from = if self.check_keyword(Keyword::From) {
            self.advance();
            Some(self.parse_table_ref()?)
        } else {
            None
        };

        // WHERE clause
        let where_clause = if self.check_keyword(Keyword::Where) {
            self.advance();
            Some(self.parse_expression(0)?)
        } else {
            None
        };

        // GROUP BY clause
        let group_by = if self.check_keyword(Keyword::Group) {
            self.advance();
            self.expect_keyword(Keyword::By)?;
            self.parse_expression_list()?
        } else {
            vec![]
        };

        // HAVING clause
        let having = if self.check_keyword(Keyword::Having) {
            self.advance();
            Some(self.parse_expression(0)?)
        } else {
            None
        };

        // ORDER BY clause
        let order_by = if self.check_keyword(Keyword::Order) {
            self.advance();
            self.expect_keyword(Keyword::By)?;
            self.parse_order_by_list()?
        } else {
            vec![]
        };

        // LIMIT clause
        let limit = if self.check_keyword(Keyword::Limit) {
            self.advance();
            Some(self.parse_expression(0)?)
        } else {
            None
        };

        // OFFSET clause
        let offset = if self.check_keyword(Keyword::Offset) {
            self.advance();
            Some(self.parse_expression(0)?)
        } else {
            None
        };

        // Locking clause: FOR UPDATE | FOR SHARE [NOWAIT | SKIP LOCKED]
        let locking = if self.check_keyword(Keyword::For) {
            self.advance();
            let mode = if self.check_keyword(Keyword::Update) {
                self.advance();
                LockMode::Update
            } else {
                self.expect_keyword(Keyword::Share)?;
                LockMode::Share
            };
            let wait = if self.check_keyword(Keyword::Nowait) {
                self.advance();
                WaitPolicy::NoWait
            } else if self.check_keyword(Keyword::Skip) {
                self.advance();
                self.expect_keyword(Keyword::Locked)?;
                WaitPolicy::SkipLocked
            } else {
                WaitPolicy::Wait
            };
            Some(LockingClause { mode, wait })
        } else {
            None
        };

        Ok(SelectStatement {
            ctes: vec![],
            distinct,
            columns,
            from,
            where_clause,
            group_by,
            having,
            order_by,
            set_ops: vec![],
            limit,
            offset,
            locking,
        })
    }

    /// Parses SELECT columns.
    fn parse_select_columns(&mut self) -> Result<Vec<SelectColumn>, ParseError> {
        let mut columns = vec![];

        loop {
            let expr = self.parse_expression(0)?;

            // Check for alias (AS name or just name)
            let alias = if self.check_keyword(Keyword::As) {
                self.advance();
                Some(self.expect_identifier()?)
            } else if matches!(&self.current.kind, TokenKind::Identifier(_)) {
                Some(self.expect_identifier()?)
            } else {
                None
            };

            columns.push(SelectColumn { expr, alias });

            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        Ok(columns)
    }

    /// Parses a table reference.
    fn parse_table_ref(&mut self) -> Result<TableRef, ParseError> {
        let mut table_ref = if self.check(&TokenKind::LeftParen) {
            // Subquery or grouped table ref
            self.advance();
            if self.check_keyword(Keyword::Select) {
                let query = self.parse_select_statement()?;
                self.expect(&TokenKind::RightParen)?;
                let alias = self.parse_optional_alias()?;
                TableRef::Subquery {
                    query: Box::new(query),
                    alias: alias.unwrap_or_else(|| String::from("subquery")),
                }
            } else {
                let inner = self.parse_table_ref()?;
                self.expect(&TokenKind::RightParen)?;
                inner
            }
        } else {
            // Simple table name
            let first = self.expect_identifier()?;
            let (schema, name) = if self.check(&TokenKind::Dot) {
                self.advance();
                let table_name = self.expect_identifier()?;
                (Some(first), table_name)
            } else {
                (None, first)
            };

            let alias = self.parse_optional_alias()?;

            TableRef::Table {
                schema,
                name,
                alias,
            }
        };

        // Parse joins
        while self.is_join_keyword() {
            let join_type = self.parse_join_type()?;
            let right = self.parse_simple_table_ref()?;

            let (on, using) = if join_type == JoinType::Cross {
                (None, vec![])
            } else if self.check_keyword(Keyword::On) {
                self.advance();
                (Some(self.parse_expression(0)?), vec![])
            } else if self.check_keyword(Keyword::Using) {
                self.advance();
                self.expect(&TokenKind::LeftParen)?;
                let cols = self.parse_identifier_list()?;
                self.expect(&TokenKind::RightParen)?;
                (None, cols)
            } else {
                return Err(ParseError::new(
                    "Expected ON or USING clause",
                    self.current.span,
                ));
            };

            table_ref = TableRef::Join {
                left: Box::new(table_ref),
                join: Box::new(JoinClause {
                    join_type,
                    table: right,
                    on,
                    using,
                }),
            };
        }

        Ok(table_ref)
    }

    /// Parses a simple table reference (no joins).
    fn parse_simple_table_ref(&mut self) -> Result<TableRef, ParseError> {
        let first = self.expect_identifier()?;
        let (schema, name) = if self.check(&TokenKind::Dot) {
            self.advance();
            let table_name = self.expect_identifier()?;
            (Some(first), table_name)
        } else {
            (None, first)
        };

        let alias = self.parse_optional_alias()?;

        Ok(TableRef::Table {
            schema,
            name,
            alias,
        })
    }

    /// Checks if current token is a join keyword.
    fn is_join_keyword(&self) -> bool {
        matches!(
            &self.current.kind,
            TokenKind::Keyword(
                Keyword::Join
                    | Keyword::Inner
                    | Keyword::Left
                    | Keyword::Right
                    | Keyword::Full
                    | Keyword::Cross
            )
        )
    }

    /// Parses a join type.
    fn parse_join_type(&mut self) -> Result<JoinType, ParseError> {
        let join_type = match &self.current.kind {
            TokenKind::Keyword(Keyword::Join) => {
                self.advance();
                JoinType::Inner
            }
            TokenKind::Keyword(Keyword::Inner) => {
                self.advance();
                self.expect_keyword(Keyword::Join)?;
                JoinType::Inner
            }
            TokenKind::Keyword(Keyword::Left) => {
                self.advance();
                if self.check_keyword(Keyword::Outer) {
                    self.advance();
                }
                self.expect_keyword(Keyword::Join)?;
                JoinType::Left
            }
            TokenKind::Keyword(Keyword::Right) => {
                self.advance();
                if self.check_keyword(Keyword::Outer) {
                    self.advance();
                }
                self.expect_keyword(Keyword::Join)?;
                JoinType::Right
            }
            TokenKind::Keyword(Keyword::Full) => {
                self.advance();
                if self.check_keyword(Keyword::Outer) {
                    self.advance();
                }
                self.expect_keyword(Keyword::Join)?;
                JoinType::Full
            }
            TokenKind::Keyword(Keyword::Cross) => {
                self.advance();
                self.expect_keyword(Keyword::Join)?;
                JoinType::Cross
            }
            _ => {
                return Err(ParseError::unexpected(
                    "JOIN keyword",
                    self.current.kind.clone(),
                    self.current.span,
                ));
            }
        };
        Ok(join_type)
    }

    /// Parses an optional table alias.
    fn parse_optional_alias(&mut self) -> Result<Option<String>, ParseError> {
        if self.check_keyword(Keyword::As) {
            self.advance();
            Ok(Some(self.expect_identifier()?))
        } else if matches!(&self.current.kind, TokenKind::Identifier(_)) && !self.is_reserved_word()
        {
            Ok(Some(self.expect_identifier()?))
        } else {
            Ok(None)
        }
    }

    /// Checks if current identifier is a reserved word.
    fn is_reserved_word(&self) -> bool {
        matches!(
            &self.current.kind,
            TokenKind::Keyword(
                Keyword::Where
                    | Keyword::Order
                    | Keyword::Group
                    | Keyword::Having
                    | Keyword::Limit
                    | Keyword::Offset
                    | Keyword::Join
                    | Keyword::Inner
                    | Keyword::Left
                    | Keyword::Right
                    | Keyword::Full
                    | Keyword::Cross
                    | Keyword::On
                    | Keyword::Using
                    | Keyword::Union
                    | Keyword::Intersect
                    | Keyword::Except
            )
        )
    }

    /// Parses an INSERT statement.
    fn parse_insert_statement(&mut self) -> Result<InsertStatement, ParseError> {
        self.expect_keyword(Keyword::Insert)?;
        self.expect_keyword(Keyword::Into)?;

        let first = self.expect_identifier()?;
        let (schema, table) = if self.check(&TokenKind::Dot) {
            self.advance();
            let table_name = self.expect_identifier()?;
            (Some(first), table_name)
        } else {
            (None, first)
        };

        // Column list (optional)
        let columns = if self.check(&TokenKind::LeftParen) {
            self.advance();
            let cols = self.parse_identifier_list()?;
            self.expect(&TokenKind::RightParen)?;
            cols
        } else {
            vec![]
        };

        // VALUES, SELECT, or DEFAULT VALUES
        let values = if self.check_keyword(Keyword::Values) {
            self.advance();
            let mut rows = vec![];
            loop {
                self.expect(&TokenKind::LeftParen)?;
                let row = self.parse_expression_list()?;
                self.expect(&TokenKind::RightParen)?;
                rows.push(row);
                if !self.check(&TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
            InsertSource::Values(rows)
        } else if self.check_keyword(Keyword::Select) {
            InsertSource::Query(Box::new(self.parse_select_statement()?))
        } else if self.check_keyword(Keyword::Default) {
            self.advance();
            self.expect_keyword(Keyword::Values)?;
            InsertSource::DefaultValues
        } else {
            return Err(ParseError::unexpected(
                "VALUES, SELECT, or DEFAULT VALUES",
                self.current.kind.clone(),
                self.current.span,
            ));
        };

        Ok(InsertStatement {
            schema,
            table,
            columns,
            values,
            on_conflict: None,
        })
    }

    /// Parses an UPDATE statement.
    fn parse_update_statement(&mut self) -> Result<UpdateStatement, ParseError> {
        self.expect_keyword(Keyword::Update)?;

        let first = self.expect_identifier()?;
        let (schema, table) = if self.check(&TokenKind::Dot) {
            self.advance();
            let table_name = self.expect_identifier()?;
            (Some(first), table_name)
        } else {
            (None, first)
        };

        let alias = self.parse_optional_alias()?;

        self.expect_keyword(Keyword::Set)?;

        // Parse SET assignments
        let mut assignments = vec![];
        loop {
            let column = self.expect_identifier()?;
            self.expect(&TokenKind::Eq)?;
            let value = self.parse_expression(0)?;
            assignments.push(UpdateAssignment { column, value });

            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        // FROM clause (optional, for joins)
        let from = if self.check_keyword(Keyword::From) {
            self.advance();
            Some(self.parse_table_ref()?)
        } else {
            None
        };

        // WHERE clause
        let where_clause = if self.check_keyword(Keyword::Where) {
            self.advance();
            Some(self.parse_expression(0)?)
        } else {
            None
        };

        Ok(UpdateStatement {
            schema,
            table,
            alias,
            assignments,
            from,
            where_clause,
        })
    }

    /// Parses a DELETE statement.
    fn parse_delete_statement(&mut self) -> Result<DeleteStatement, ParseError> {
        self.expect_keyword(Keyword::Delete)?;
        self.expect_keyword(Keyword::From)?;

        let first = self.expect_identifier()?;
        let (schema, table) = if self.check(&TokenKind::Dot) {
            self.advance();
            let table_name = self.expect_identifier()?;
            (Some(first), table_name)
        } else {
            (None, first)
        };

        let alias = self.parse_optional_alias()?;

        // WHERE clause
        let where_clause = if self.check_keyword(Keyword::Where) {
            self.advance();
            Some(self.parse_expression(0)?)
        } else {
            None
        };

        Ok(DeleteStatement {
            schema,
            table,
            alias,
            where_clause,
        })
    }

    /// Parses an ORDER BY list.
    fn parse_order_by_list(&mut self) -> Result<Vec<OrderBy>, ParseError> {
        let mut items = vec![];
        loop {
            let expr = self.parse_expression(0)?;
            let direction = if self.check_keyword(Keyword::Desc) {
                self.advance();
                OrderDirection::Desc
            } else if self.check_keyword(Keyword::Asc) {
                self.advance();
                OrderDirection::Asc
            } else {
                OrderDirection::Asc
            };

            items.push(OrderBy {
                expr,
                direction,
                nulls: None,
            });

            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        Ok(items)
    }

    /// Parses an expression using Pratt parsing.
    #[allow(clippy::while_let_loop)]
    fn parse_expression(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        // Parse prefix (primary expression or unary operator)
        let mut lhs = self.parse_prefix()?;

        // Parse infix operators
        loop {
            // Check if current token is an infix operator
            let (l_bp, r_bp) = match infix_binding_power(&self.current.kind) {
                Some(bp) => bp,
                None => break,
            };

            if l_bp < min_bp {
                break;
            }

            // Handle special infix operators
            match &self.current.kind {
                TokenKind::Keyword(Keyword::Is) => {
                    self.advance();
                    let negated = if self.check_keyword(Keyword::Not) {
                        self.advance();
                        true
                    } else {
                        false
                    };
                    self.expect_keyword(Keyword::Null)?;
                    lhs = Expr::IsNull {
                        expr: Box::new(lhs),
                        negated,
                    };
                }
                TokenKind::Keyword(Keyword::In) => {
                    self.advance();
                    self.expect(&TokenKind::LeftParen)?;
                    let list = self.parse_expression_list()?;
                    self.expect(&TokenKind::RightParen)?;
                    lhs = Expr::In {
                        expr: Box::new(lhs),
                        list,
                        negated: false,
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
                        negated: false,
                    };
                }
                _ => {
                    // Standard binary operator
                    if let Some(op) = token_to_binary_op(&self.current.kind) {
                        self.advance();

                        let quantifier = if self.check_keyword(Keyword::All) {
                            Some(crate::ast::Quantifier::All)
                        } else if self.check_keyword(Keyword::Any) || self.check_keyword(Keyword::Some) {
                            Some(crate::ast::Quantifier::Any)
                        } else {
                            None
                        };

                        if let Some(quantifier) = quantifier {
                            self.advance();
                            self.expect(&TokenKind::LeftParen)?;
                            let subquery = self.parse_select_statement()?;
                            self.expect(&TokenKind::RightParen)?;
                            lhs = Expr::Quantified {
                                left: Box::new(lhs),
                                op,
                                quantifier,
                                subquery: Box::new(subquery),
                            };
                        } else {
                            let rhs = self.parse_expression(r_bp)?;
                            lhs = Expr::Binary {
                                left: Box::new(lhs),
                                op,
                                right: Box::new(rhs),
                            };
                        }
                    } else {
                        break;
                    }
                }
            }
        }

        Ok(lhs)
    }

    /// Parses a prefix expression.
    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        // Check for unary operators
        if let Some(op) = token_to_unary_op(&self.current.kind) {
            let bp = prefix_binding_power(&self.current.kind).unwrap_or(15);
            self.advance();
            let operand = self.parse_expression(bp)?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }

        self.parse_primary()
    }

    /// Parses a primary expression.
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.current.clone();

        match &token.kind {
            // Literals
            TokenKind::Integer(n) => {
                self.advance();
                Ok(Expr::Literal(Literal::Integer(*n)))
            }
            TokenKind::Float(f) => {
                self.advance();
                Ok(Expr::Literal(Literal::Float(*f)))
            }
            TokenKind::String(s) => {
                let value = s.clone();
                self.advance();
                Ok(Expr::Literal(Literal::String(value)))
            }
            TokenKind::Blob(b) => {
                let value = b.clone();
                self.advance();
                Ok(Expr::Literal(Literal::Blob(value)))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expr::Literal(Literal::Boolean(true)))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expr::Literal(Literal::Boolean(false)))
            }
            TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Expr::Literal(Literal::Null))
            }

            // Parameter placeholders
            TokenKind::Question => {
                self.param_counter += 1;
                let position = self.param_counter;
                self.advance();
                Ok(Expr::Parameter {
                    name: None,
                    position,
                })
            }
            TokenKind::Colon => {
                self.advance();
                let name = self.expect_identifier()?;
                Ok(Expr::Parameter {
                    name: Some(name),
                    position: 0,
                })
            }

            // Wildcard
            TokenKind::Star => {
                self.advance();
                Ok(Expr::Wildcard { table: None })
            }

            // Parenthesized expression or subquery
            TokenKind::LeftParen => {
                self.advance();
                if self.check_keyword(Keyword::Select) {
                    let subquery = self.parse_select_statement()?;
                    self.expect(&TokenKind::RightParen)?;
                    Ok(Expr::Subquery(Box::new(subquery)))
                } else {
                    let expr = self.parse_expression(0)?;
                    self.expect(&TokenKind::RightParen)?;
                    Ok(Expr::Paren(Box::new(expr)))
                }
            }

            // Aggregate functions
            TokenKind::Keyword(
                kw @ (Keyword::Count | Keyword::Sum | Keyword::Avg | Keyword::Min | Keyword::Max),
            ) => {
                let name = kw.as_str().to_string();
                self.advance();
                self.parse_function_call(name)
            }

            // Other functions
            TokenKind::Keyword(kw @ (Keyword::Coalesce | Keyword::Nullif | Keyword::Cast)) => {
                let name = kw.as_str().to_string();
                self.advance();
                if matches!(kw, Keyword::Cast) {
                    self.parse_cast_expression()
                } else {
                    self.parse_function_call(name)
                }
            }

            // CASE expression
            TokenKind::Keyword(Keyword::Case) => self.parse_case_expression(),

            // EXISTS
            TokenKind::Keyword(Keyword::Exists) => {
                self.advance();
                self.expect(&TokenKind::LeftParen)?;
                let subquery = self.parse_select_statement()?;
                self.expect(&TokenKind::RightParen)?;
                Ok(Expr::Exists {
                    subquery: Box::new(subquery),
                    negated: false,
                })
            }

            // MATCH (cols) AGAINST (expr)
            TokenKind::Keyword(Keyword::Match) => {
                self.advance();
                self.expect(&TokenKind::LeftParen)?;
                let columns = self.parse_identifier_list()?;
                self.expect(&TokenKind::RightParen)?;
                self.expect_keyword(Keyword::Against)?;
                self.expect(&TokenKind::LeftParen)?;
                let against = self.parse_expression(0)?;
                self.expect(&TokenKind::RightParen)?;
                Ok(Expr::MatchAgainst {
                    columns,
                    against: Box::new(against),
                })
            }

            // Session / global variables: @name, @@name
            TokenKind::At => {
                self.advance();
                let global = if self.check(&TokenKind::At) {
                    self.advance();
                    true
                } else {
                    false
                };
                let name = self.expect_identifier()?;
                Ok(Expr::SessionVar { name, global })
            }

            // Identifier (column reference or function call)
            TokenKind::Identifier(name) => {
                let name = name.clone();
                let span = token.span;
                self.advance();

                // Check for function call
                if self.check(&TokenKind::LeftParen) {
                    return self.parse_function_call(name);
                }

                // Check for qualified name (table.column or table.*)
                if self.check(&TokenKind::Dot) {
                    self.advance();
                    if self.check(&TokenKind::Star) {
                        self.advance();
                        return Ok(Expr::Wildcard { table: Some(name) });
                    }
                    let column = self.expect_identifier()?;
                    return Ok(Expr::Column {
                        table: Some(name),
                        name: column,
                        span,
                    });
                }

                Ok(Expr::Column {
                    table: None,
                    name,
                    span,
                })
            }

            _ => Err(ParseError::unexpected(
                "expression",
                self.current.kind.clone(),
                self.current.span,
            )),
        }
    }

    /// Parses a function call.
    fn parse_function_call(&mut self, name: String) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LeftParen)?;

        let distinct = if self.check_keyword(Keyword::Distinct) {
            self.advance();
            true
        } else {
            false
        };

        let args = if self.check(&TokenKind::RightParen) {
            vec![]
        } else if self.check(&TokenKind::Star) {
            self.advance();
            vec![Expr::Wildcard { table: None }]
        } else {
            self.parse_expression_list()?
        };

        self.expect(&TokenKind::RightParen)?;

        let over = if self.check_keyword(Keyword::Over) {
            self.advance();
            Some(self.parse_window_spec()?)
        } else {
            None
        };

        Ok(Expr::Function(FunctionCall {
            name,
            args,
            distinct,
            over,
        }))
    }

    /// Parses the `(PARTITION BY ... ORDER BY ...)` body of an `OVER` clause.
    fn parse_window_spec(&mut self) -> Result<crate::ast::WindowSpec, ParseError> {
        self.expect(&TokenKind::LeftParen)?;

        let partition_by = if self.check_keyword(Keyword::Partition) {
            self.advance();
            self.expect_keyword(Keyword::By)?;
            self.parse_expression_list()?
        } else {
            vec![]
        };

        let order_by = if self.check_keyword(Keyword::Order) {
            self.advance();
            self.expect_keyword(Keyword::By)?;
            self.parse_order_by_list()?
        } else {
            vec![]
        };

        self.expect(&TokenKind::RightParen)?;

        Ok(crate::ast::WindowSpec {
            partition_by,
            order_by,
        })
    }

    /// Parses a CAST expression.
    fn parse_cast_expression(&mut self) -> Result<Expr, ParseError> {
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

        // Check for simple CASE (CASE expr WHEN ...)
        let operand = if !self.check_keyword(Keyword::When) {
            Some(Box::new(self.parse_expression(0)?))
        } else {
            None
        };

        // Parse WHEN/THEN clauses
        let mut when_clauses = vec![];
        while self.check_keyword(Keyword::When) {
            self.advance();
            let when_expr = self.parse_expression(0)?;
            self.expect_keyword(Keyword::Then)?;
            let then_expr = self.parse_expression(0)?;
            when_clauses.push((when_expr, then_expr));
        }

        // Parse ELSE clause
        let else_clause = if self.check_keyword(Keyword::Else) {
            self.advance();
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

    /// Parses a data type.
    fn parse_data_type(&mut self) -> Result<DataType, ParseError> {
        let data_type = match &self.current.kind {
            TokenKind::Keyword(Keyword::Int | Keyword::Integer) => {
                self.advance();
                DataType::Integer
            }
            TokenKind::Keyword(Keyword::Smallint) => {
                self.advance();
                DataType::Smallint
            }
            TokenKind::Keyword(Keyword::Bigint) => {
                self.advance();
                DataType::Bigint
            }
            TokenKind::Keyword(Keyword::Real) => {
                self.advance();
                DataType::Float
            }
            TokenKind::Keyword(Keyword::Double) => {
                self.advance();
                DataType::Double
            }
            TokenKind::Keyword(Keyword::Float) => {
                self.advance();
                DataType::Float
            }
            TokenKind::Keyword(Keyword::Decimal | Keyword::Numeric) => {
                self.advance();
                let (precision, scale) = self.parse_optional_precision_scale()?;
                DataType::Decimal { precision, scale }
            }
            TokenKind::Keyword(Keyword::Tinyint) => {
                self.advance();
                DataType::Tinyint
            }
            TokenKind::Keyword(Keyword::Json) => {
                self.advance();
                DataType::Json
            }
            TokenKind::Keyword(Keyword::Char) => {
                self.advance();
                let len = self.parse_optional_length()?;
                DataType::Char(len)
            }
            TokenKind::Keyword(Keyword::Varchar) => {
                self.advance();
                let len = self.parse_optional_length()?;
                DataType::Varchar(len)
            }
            TokenKind::Keyword(Keyword::Text) => {
                self.advance();
                DataType::Text
            }
            TokenKind::Keyword(Keyword::Blob) => {
                self.advance();
                DataType::Blob
            }
            TokenKind::Keyword(Keyword::Boolean) => {
                self.advance();
                DataType::Boolean
            }
            TokenKind::Keyword(Keyword::Date) => {
                self.advance();
                DataType::Date
            }
            TokenKind::Keyword(Keyword::Time) => {
                self.advance();
                DataType::Time
            }
            TokenKind::Keyword(Keyword::Timestamp) => {
                self.advance();
                DataType::Timestamp
            }
            TokenKind::Keyword(Keyword::Datetime) => {
                self.advance();
                DataType::Datetime
            }
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                DataType::Custom(name)
            }
            _ => {
                return Err(ParseError::unexpected(
                    "data type",
                    self.current.kind.clone(),
                    self.current.span,
                ));
            }
        };

        Ok(data_type)
    }

    /// Parses optional precision and scale (for DECIMAL/NUMERIC).
    fn parse_optional_precision_scale(&mut self) -> Result<(Option<u16>, Option<u16>), ParseError> {
        if !self.check(&TokenKind::LeftParen) {
            return Ok((None, None));
        }
        self.advance();

        let precision = match &self.current.kind {
            TokenKind::Integer(n) => {
                let p = u16::try_from(*n)
                    .map_err(|_| ParseError::new("Precision too large", self.current.span))?;
                self.advance();
                Some(p)
            }
            _ => {
                return Err(ParseError::unexpected(
                    "integer",
                    self.current.kind.clone(),
                    self.current.span,
                ));
            }
        };

        let scale = if self.check(&TokenKind::Comma) {
            self.advance();
            match &self.current.kind {
                TokenKind::Integer(n) => {
                    let s = u16::try_from(*n)
                        .map_err(|_| ParseError::new("Scale too large", self.current.span))?;
                    self.advance();
                    Some(s)
                }
                _ => {
                    return Err(ParseError::unexpected(
                        "integer",
                        self.current.kind.clone(),
                        self.current.span,
                    ));
                }
            }
        } else {
            None
        };

        self.expect(&TokenKind::RightParen)?;
        Ok((precision, scale))
    }

    /// Parses optional length (for CHAR/VARCHAR).
    fn parse_optional_length(&mut self) -> Result<Option<u32>, ParseError> {
        if !self.check(&TokenKind::LeftParen) {
            return Ok(None);
        }
        self.advance();

        let length = match &self.current.kind {
            TokenKind::Integer(n) => {
                let len = u32::try_from(*n)
                    .map_err(|_| ParseError::new("Length too large", self.current.span))?;
                self.advance();
                len
            }
            _ => {
                return Err(ParseError::unexpected(
                    "integer",
                    self.current.kind.clone(),
                    self.current.span,
                ));
            }
        };

        self.expect(&TokenKind::RightParen)?;
        Ok(Some(length))
    }

    /// Parses a comma-separated list of expressions.
    fn parse_expression_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut exprs = vec![];
        loop {
            exprs.push(self.parse_expression(0)?);
            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        Ok(exprs)
    }

    /// Parses a comma-separated list of identifiers.
    fn parse_identifier_list(&mut self) -> Result<Vec<String>, ParseError> {
        let mut idents = vec![];
        loop {
            idents.push(self.expect_identifier()?);
            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        Ok(idents)
    }

    // --- Helper methods ---

    /// Advances to the next token.
    fn advance(&mut self) {
        self.previous = core::mem::replace(&mut self.current, self.lexer.next_token());
    }

    /// Checks if the current token matches the given kind.
    fn check(&self, kind: &TokenKind) -> bool {
        core::mem::discriminant(&self.current.kind) == core::mem::discriminant(kind)
    }

    /// Checks if the current token is the given keyword.
    fn check_keyword(&self, keyword: Keyword) -> bool {
        matches!(&self.current.kind, TokenKind::Keyword(kw) if *kw == keyword)
    }

    /// Expects the current token to be the given kind.
    fn expect(&mut self, kind: &TokenKind) -> Result<(), ParseError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::unexpected(
                format!("{kind:?}"),
                self.current.kind.clone(),
                self.current.span,
            ))
        }
    }

    /// Expects the current token to be the given keyword.
    fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), ParseError> {
        if self.check_keyword(keyword) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::unexpected(
                keyword.as_str(),
                self.current.kind.clone(),
                self.current.span,
            ))
        }
    }

    /// Expects and returns an identifier.
    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match &self.current.kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(ParseError::unexpected(
                "identifier",
                self.current.kind.clone(),
                self.current.span,
            )),
        }
    }
}
