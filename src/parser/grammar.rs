//! SQL Grammar/Parser
//!
//! A recursive descent parser for the supported SQL subset. The parser
//! pre-tokenizes its input (dropping whitespace and comments), then walks
//! the token vector with one-token lookahead plus unbounded lookahead via
//! `peek_ahead`. Expressions use precedence climbing: each binding level
//! is its own function calling the next-tighter level.

use crate::error::{Error, Result};
use crate::parser::ast::*;
use crate::parser::tokenizer::{tokenize, unquote, Token, TokenKind};

// ============================================================================
// Public API
// ============================================================================

/// Parse a SQL string into statements.
///
/// Best-effort: a malformed statement is recorded as an error and skipped
/// (scanning to the next semicolon), and previously completed statements
/// are preserved. The first entry of the error list is the primary
/// diagnostic.
pub fn parse(source: &str) -> (Vec<Stmt>, Vec<Error>) {
    let mut parser = Parser::new(source);
    let mut stmts = Vec::new();
    let mut errors = Vec::new();

    loop {
        parser.skip_semicolons();
        if parser.is_eof() {
            break;
        }
        match parser.parse_stmt() {
            Ok(stmt) => stmts.push(stmt),
            Err(e) => {
                errors.push(e);
                parser.recover_to_semicolon();
            }
        }
    }

    (stmts, errors)
}

/// Parse exactly one statement
pub fn parse_single(source: &str) -> Result<Stmt> {
    let mut parser = Parser::new(source);
    parser.skip_semicolons();
    let stmt = parser.parse_stmt()?;
    parser.skip_semicolons();
    if !parser.is_eof() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(stmt)
}

/// Parse a single expression (used by tests and tooling)
pub fn parse_expression(source: &str) -> Result<Expr> {
    let mut parser = Parser::new(source);
    let expr = parser.parse_expr()?;
    if !parser.is_eof() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(expr)
}

// ============================================================================
// Parser
// ============================================================================

/// SQL parser over a pre-tokenized source
pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given SQL source
    pub fn new(source: &'a str) -> Self {
        let tokens = tokenize(source);
        Parser {
            source,
            tokens,
            pos: 0,
        }
    }

    /// Parse a single SQL statement at the cursor
    pub fn parse_stmt(&mut self) -> Result<Stmt> {
        let stmt = match self.current().kind {
            TokenKind::Explain => self.parse_explain(),
            TokenKind::Select => Ok(Stmt::Select(self.parse_select_stmt()?)),
            TokenKind::Insert | TokenKind::Replace => {
                Ok(Stmt::Insert(self.parse_insert_stmt()?))
            }
            TokenKind::Update => Ok(Stmt::Update(self.parse_update_stmt()?)),
            TokenKind::Delete => Ok(Stmt::Delete(self.parse_delete_stmt()?)),
            TokenKind::Create => self.parse_create(),
            TokenKind::Drop => self.parse_drop(),
            TokenKind::Begin => self.parse_begin(),
            TokenKind::Commit => {
                self.advance();
                self.match_token(TokenKind::Transaction);
                Ok(Stmt::Commit)
            }
            TokenKind::Rollback => {
                self.advance();
                self.match_token(TokenKind::Transaction);
                Ok(Stmt::Rollback)
            }
            _ => Err(self.error("expected statement")),
        }?;

        // Statements are separated by semicolons; the trailing one is
        // optional
        if !self.is_eof() && !self.check(TokenKind::Semicolon) {
            return Err(self.error("expected end of statement"));
        }

        Ok(stmt)
    }

    /// Check if at end of input
    pub fn is_eof(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    /// Skip semicolons between statements (empty statements accepted)
    pub fn skip_semicolons(&mut self) {
        while self.check(TokenKind::Semicolon) {
            self.advance();
        }
    }

    /// Discard tokens up to and including the next semicolon
    pub fn recover_to_semicolon(&mut self) {
        while !self.is_eof() && !self.check(TokenKind::Semicolon) {
            self.advance();
        }
        self.skip_semicolons();
    }

    // ========================================================================
    // Statement Parsers
    // ========================================================================

    fn parse_explain(&mut self) -> Result<Stmt> {
        self.advance(); // EXPLAIN

        let query_plan = if self.match_token(TokenKind::Query) {
            self.expect(TokenKind::Plan)?;
            true
        } else {
            false
        };

        let stmt = self.parse_stmt()?;

        if query_plan {
            Ok(Stmt::ExplainQueryPlan(Box::new(stmt)))
        } else {
            Ok(Stmt::Explain(Box::new(stmt)))
        }
    }

    // ========================================================================
    // SELECT Statement
    // ========================================================================

    fn parse_select_stmt(&mut self) -> Result<SelectStmt> {
        let body = self.parse_select_body()?;

        let order_by = if self.match_token(TokenKind::Order) {
            self.expect(TokenKind::By)?;
            Some(self.parse_ordering_terms()?)
        } else {
            None
        };

        let limit = if self.match_token(TokenKind::Limit) {
            Some(self.parse_limit_clause()?)
        } else {
            None
        };

        Ok(SelectStmt {
            body,
            order_by,
            limit,
        })
    }

    fn parse_select_body(&mut self) -> Result<SelectBody> {
        let mut left = SelectBody::Select(self.parse_select_core()?);

        loop {
            let op = if self.match_token(TokenKind::Union) {
                if self.match_token(TokenKind::All) {
                    CompoundOp::UnionAll
                } else {
                    CompoundOp::Union
                }
            } else if self.match_token(TokenKind::Intersect) {
                CompoundOp::Intersect
            } else if self.match_token(TokenKind::Except) {
                CompoundOp::Except
            } else {
                break;
            };

            let right = SelectBody::Select(self.parse_select_core()?);

            left = SelectBody::Compound {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_select_core(&mut self) -> Result<SelectCore> {
        self.expect(TokenKind::Select)?;

        let distinct = if self.match_token(TokenKind::Distinct) {
            true
        } else {
            self.match_token(TokenKind::All);
            false
        };

        let columns = self.parse_result_columns()?;

        let from = if self.match_token(TokenKind::From) {
            Some(self.parse_from_clause()?)
        } else {
            None
        };

        let where_clause = if self.match_token(TokenKind::Where) {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };

        let group_by = if self.match_token(TokenKind::Group) {
            self.expect(TokenKind::By)?;
            Some(self.parse_expr_list()?)
        } else {
            None
        };

        let having = if self.match_token(TokenKind::Having) {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };

        Ok(SelectCore {
            distinct,
            columns,
            from,
            where_clause,
            group_by,
            having,
        })
    }

    fn parse_result_columns(&mut self) -> Result<Vec<ResultColumn>> {
        let mut columns = vec![self.parse_result_column()?];
        while self.match_token(TokenKind::Comma) {
            columns.push(self.parse_result_column()?);
        }
        Ok(columns)
    }

    fn parse_result_column(&mut self) -> Result<ResultColumn> {
        if self.match_token(TokenKind::Star) {
            return Ok(ResultColumn::Star);
        }

        // table.*
        if self.check(TokenKind::Identifier)
            && self.peek_ahead(1).kind == TokenKind::Dot
            && self.peek_ahead(2).kind == TokenKind::Star
        {
            let name = unquote(self.current_text());
            self.advance(); // identifier
            self.advance(); // .
            self.advance(); // *
            return Ok(ResultColumn::TableStar(name));
        }

        let expr = self.parse_expr()?;
        let alias = if self.match_token(TokenKind::As) {
            Some(self.expect_identifier()?)
        } else if self.check(TokenKind::Identifier) {
            // Implicit alias: a bare identifier directly after the
            // expression
            Some(self.expect_identifier()?)
        } else {
            None
        };

        Ok(ResultColumn::Expr { expr, alias })
    }

    fn parse_from_clause(&mut self) -> Result<FromClause> {
        let mut tables = vec![self.parse_table_ref()?];

        // Comma-separated tables are implicit cross joins
        while self.match_token(TokenKind::Comma) {
            tables.push(self.parse_table_ref()?);
        }

        Ok(FromClause { tables })
    }

    fn parse_table_ref(&mut self) -> Result<TableRef> {
        let mut table = self.parse_table_primary()?;

        loop {
            let join_type = match self.parse_join_type()? {
                Some(jt) => jt,
                None => break,
            };

            self.expect(TokenKind::Join)?;
            let right = self.parse_table_primary()?;

            let constraint = if self.match_token(TokenKind::On) {
                Some(JoinConstraint::On(Box::new(self.parse_expr()?)))
            } else if self.match_token(TokenKind::Using) {
                self.expect(TokenKind::LParen)?;
                let columns = self.parse_identifier_list()?;
                self.expect(TokenKind::RParen)?;
                Some(JoinConstraint::Using(columns))
            } else {
                None
            };

            table = TableRef::Join {
                left: Box::new(table),
                join_type,
                right: Box::new(right),
                constraint,
            };
        }

        Ok(table)
    }

    fn parse_join_type(&mut self) -> Result<Option<JoinType>> {
        let natural = self.match_token(TokenKind::Natural);

        let op = if self.match_token(TokenKind::Left) {
            self.match_token(TokenKind::Outer);
            Some(JoinOp::Left)
        } else if self.match_token(TokenKind::Right) {
            self.match_token(TokenKind::Outer);
            Some(JoinOp::Right)
        } else if self.match_token(TokenKind::Full) {
            self.match_token(TokenKind::Outer);
            Some(JoinOp::Full)
        } else if self.match_token(TokenKind::Inner) {
            Some(JoinOp::Inner)
        } else if self.match_token(TokenKind::Cross) {
            Some(JoinOp::Cross)
        } else if self.check(TokenKind::Join) {
            Some(JoinOp::Inner)
        } else {
            None
        };

        match op {
            Some(op) => Ok(Some(JoinType { natural, op })),
            None if natural => Err(self.error("expected JOIN after NATURAL")),
            None => Ok(None),
        }
    }

    fn parse_table_primary(&mut self) -> Result<TableRef> {
        if self.match_token(TokenKind::LParen) {
            let query = self.parse_select_stmt()?;
            self.expect(TokenKind::RParen)?;
            let alias = self.parse_table_alias()?;
            return Ok(TableRef::Subquery {
                query: Box::new(query),
                alias,
            });
        }

        let name = self.parse_qualified_name()?;
        let alias = self.parse_table_alias()?;

        Ok(TableRef::Table { name, alias })
    }

    fn parse_table_alias(&mut self) -> Result<Option<String>> {
        if self.match_token(TokenKind::As) {
            return Ok(Some(self.expect_identifier()?));
        }

        if self.check(TokenKind::Identifier) {
            let alias = unquote(self.current_text());
            self.advance();
            return Ok(Some(alias));
        }

        Ok(None)
    }

    fn parse_ordering_terms(&mut self) -> Result<Vec<OrderingTerm>> {
        let mut terms = vec![self.parse_ordering_term()?];
        while self.match_token(TokenKind::Comma) {
            terms.push(self.parse_ordering_term()?);
        }
        Ok(terms)
    }

    fn parse_ordering_term(&mut self) -> Result<OrderingTerm> {
        let expr = self.parse_expr()?;

        let order = if self.match_token(TokenKind::Desc) {
            SortOrder::Desc
        } else {
            self.match_token(TokenKind::Asc);
            SortOrder::Asc
        };

        Ok(OrderingTerm { expr, order })
    }

    fn parse_limit_clause(&mut self) -> Result<LimitClause> {
        let limit = Box::new(self.parse_expr()?);

        if self.match_token(TokenKind::Offset) {
            let offset = Box::new(self.parse_expr()?);
            return Ok(LimitClause {
                limit,
                offset: Some(offset),
            });
        }

        if self.match_token(TokenKind::Comma) {
            // LIMIT offset, count
            let count = self.parse_expr()?;
            return Ok(LimitClause {
                limit: Box::new(count),
                offset: Some(limit),
            });
        }

        Ok(LimitClause {
            limit,
            offset: None,
        })
    }

    // ========================================================================
    // INSERT Statement
    // ========================================================================

    fn parse_insert_stmt(&mut self) -> Result<InsertStmt> {
        // REPLACE INTO is shorthand for INSERT OR REPLACE INTO
        let or_action = if self.match_token(TokenKind::Replace) {
            Some(ConflictAction::Replace)
        } else {
            self.expect(TokenKind::Insert)?;
            self.parse_or_conflict()?
        };

        self.expect(TokenKind::Into)?;
        let table = self.parse_qualified_name()?;

        let columns = if self.match_token(TokenKind::LParen) {
            let cols = self.parse_identifier_list()?;
            self.expect(TokenKind::RParen)?;
            Some(cols)
        } else {
            None
        };

        let source = if self.match_token(TokenKind::Values) {
            let mut rows = vec![self.parse_values_row()?];
            while self.match_token(TokenKind::Comma) {
                rows.push(self.parse_values_row()?);
            }
            InsertSource::Values(rows)
        } else if self.check(TokenKind::Select) {
            InsertSource::Select(Box::new(self.parse_select_stmt()?))
        } else if self.match_token(TokenKind::Default) {
            self.expect(TokenKind::Values)?;
            InsertSource::DefaultValues
        } else {
            return Err(self.error("expected VALUES, SELECT, or DEFAULT VALUES"));
        };

        Ok(InsertStmt {
            or_action,
            table,
            columns,
            source,
        })
    }

    fn parse_values_row(&mut self) -> Result<Vec<Expr>> {
        self.expect(TokenKind::LParen)?;
        let exprs = self.parse_expr_list()?;
        self.expect(TokenKind::RParen)?;
        Ok(exprs)
    }

    fn parse_or_conflict(&mut self) -> Result<Option<ConflictAction>> {
        if !self.match_token(TokenKind::Or) {
            return Ok(None);
        }

        let action = if self.match_token(TokenKind::Rollback) {
            ConflictAction::Rollback
        } else if self.match_token(TokenKind::Abort) {
            ConflictAction::Abort
        } else if self.match_token(TokenKind::Fail) {
            ConflictAction::Fail
        } else if self.match_token(TokenKind::Ignore) {
            ConflictAction::Ignore
        } else if self.match_token(TokenKind::Replace) {
            ConflictAction::Replace
        } else {
            return Err(self.error("expected ROLLBACK, ABORT, FAIL, IGNORE, or REPLACE"));
        };

        Ok(Some(action))
    }

    // ========================================================================
    // UPDATE Statement
    // ========================================================================

    fn parse_update_stmt(&mut self) -> Result<UpdateStmt> {
        self.expect(TokenKind::Update)?;
        let or_action = self.parse_or_conflict()?;

        let table = self.parse_qualified_name()?;
        let alias = if self.match_token(TokenKind::As) {
            Some(self.expect_identifier()?)
        } else {
            None
        };

        self.expect(TokenKind::Set)?;

        let mut assignments = vec![self.parse_assignment()?];
        while self.match_token(TokenKind::Comma) {
            assignments.push(self.parse_assignment()?);
        }

        let where_clause = if self.match_token(TokenKind::Where) {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };

        let order_by = if self.match_token(TokenKind::Order) {
            self.expect(TokenKind::By)?;
            Some(self.parse_ordering_terms()?)
        } else {
            None
        };

        let limit = if self.match_token(TokenKind::Limit) {
            Some(self.parse_limit_clause()?)
        } else {
            None
        };

        Ok(UpdateStmt {
            or_action,
            table,
            alias,
            assignments,
            where_clause,
            order_by,
            limit,
        })
    }

    fn parse_assignment(&mut self) -> Result<Assignment> {
        let column = self.expect_identifier()?;
        self.expect(TokenKind::Eq)?;
        let expr = self.parse_expr()?;
        Ok(Assignment { column, expr })
    }

    // ========================================================================
    // DELETE Statement
    // ========================================================================

    fn parse_delete_stmt(&mut self) -> Result<DeleteStmt> {
        self.expect(TokenKind::Delete)?;
        let or_action = self.parse_or_conflict()?;
        self.expect(TokenKind::From)?;

        let table = self.parse_qualified_name()?;
        let alias = if self.match_token(TokenKind::As) {
            Some(self.expect_identifier()?)
        } else if self.check(TokenKind::Identifier) {
            let alias = unquote(self.current_text());
            self.advance();
            Some(alias)
        } else {
            None
        };

        let where_clause = if self.match_token(TokenKind::Where) {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };

        let order_by = if self.match_token(TokenKind::Order) {
            self.expect(TokenKind::By)?;
            Some(self.parse_ordering_terms()?)
        } else {
            None
        };

        let limit = if self.match_token(TokenKind::Limit) {
            Some(self.parse_limit_clause()?)
        } else {
            None
        };

        Ok(DeleteStmt {
            or_action,
            table,
            alias,
            where_clause,
            order_by,
            limit,
        })
    }

    // ========================================================================
    // CREATE / DROP Statements
    // ========================================================================

    fn parse_create(&mut self) -> Result<Stmt> {
        self.expect(TokenKind::Create)?;

        let temporary =
            self.match_token(TokenKind::Temp) || self.match_token(TokenKind::Temporary);

        if self.match_token(TokenKind::Unique) {
            self.expect(TokenKind::Index)?;
            return Ok(Stmt::CreateIndex(self.parse_create_index(true)?));
        }

        if self.match_token(TokenKind::Index) {
            return Ok(Stmt::CreateIndex(self.parse_create_index(false)?));
        }

        if self.match_token(TokenKind::Table) {
            return Ok(Stmt::CreateTable(self.parse_create_table(temporary)?));
        }

        Err(self.error("expected TABLE or INDEX after CREATE"))
    }

    fn parse_create_table(&mut self, temporary: bool) -> Result<CreateTableStmt> {
        let if_not_exists = self.parse_if_not_exists()?;
        let name = self.parse_qualified_name()?;

        if self.match_token(TokenKind::As) {
            let query = self.parse_select_stmt()?;
            return Ok(CreateTableStmt {
                temporary,
                if_not_exists,
                name,
                definition: TableDefinition::AsSelect(Box::new(query)),
                without_rowid: false,
                strict: false,
            });
        }

        self.expect(TokenKind::LParen)?;

        let mut columns = Vec::new();
        let mut constraints = Vec::new();
        loop {
            if self.is_table_constraint_start() {
                constraints.push(self.parse_table_constraint()?);
            } else {
                columns.push(self.parse_column_def()?);
            }
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }

        self.expect(TokenKind::RParen)?;

        // WITHOUT ROWID and STRICT are accepted in any order
        let mut without_rowid = false;
        let mut strict = false;
        loop {
            if self.match_token(TokenKind::Without) {
                let id = self.expect_identifier()?;
                if !id.eq_ignore_ascii_case("ROWID") {
                    return Err(self.error("expected ROWID after WITHOUT"));
                }
                without_rowid = true;
            } else if self.check(TokenKind::Identifier)
                && self.current_text().eq_ignore_ascii_case("STRICT")
            {
                self.advance();
                strict = true;
            } else {
                break;
            }
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }

        Ok(CreateTableStmt {
            temporary,
            if_not_exists,
            name,
            definition: TableDefinition::Columns {
                columns,
                constraints,
            },
            without_rowid,
            strict,
        })
    }

    /// A table-constraint item leads with CONSTRAINT, PRIMARY, UNIQUE,
    /// CHECK, or FOREIGN; everything else is tried as a column definition
    fn is_table_constraint_start(&self) -> bool {
        matches!(
            self.current().kind,
            TokenKind::Constraint
                | TokenKind::Primary
                | TokenKind::Unique
                | TokenKind::Check
                | TokenKind::Foreign
        )
    }

    fn parse_column_def(&mut self) -> Result<ColumnDef> {
        let name = self.expect_identifier()?;

        let type_name = if self.check(TokenKind::Identifier) {
            Some(self.parse_type_name()?)
        } else {
            None
        };

        let mut constraints = Vec::new();
        loop {
            match self.parse_column_constraint()? {
                Some(c) => constraints.push(c),
                None => break,
            }
        }

        Ok(ColumnDef {
            name,
            type_name,
            constraints,
        })
    }

    fn parse_type_name(&mut self) -> Result<TypeName> {
        // Multi-word types like DOUBLE PRECISION join with a space
        let mut parts = vec![self.expect_identifier()?];
        while self.check(TokenKind::Identifier) {
            parts.push(self.expect_identifier()?);
        }
        let name = parts.join(" ");

        let mut args = Vec::new();
        if self.match_token(TokenKind::LParen) {
            args.push(self.parse_signed_integer()?);
            if self.match_token(TokenKind::Comma) {
                args.push(self.parse_signed_integer()?);
            }
            self.expect(TokenKind::RParen)?;
        }

        Ok(TypeName { name, args })
    }

    fn parse_signed_integer(&mut self) -> Result<i64> {
        let negative = self.match_token(TokenKind::Minus);
        if !self.check(TokenKind::Integer) {
            return Err(self.error("expected integer"));
        }
        let text = self.current_text().replace('_', "");
        self.advance();
        let value: i64 = text
            .parse()
            .map_err(|_| self.error("invalid integer"))?;
        Ok(if negative { -value } else { value })
    }

    fn parse_column_constraint(&mut self) -> Result<Option<ColumnConstraint>> {
        let name = if self.match_token(TokenKind::Constraint) {
            Some(self.expect_identifier()?)
        } else {
            None
        };

        let kind = if self.match_token(TokenKind::Primary) {
            self.expect(TokenKind::Key)?;
            let order = if self.match_token(TokenKind::Asc) {
                Some(SortOrder::Asc)
            } else if self.match_token(TokenKind::Desc) {
                Some(SortOrder::Desc)
            } else {
                None
            };
            let autoincrement = self.match_token(TokenKind::Autoincrement);
            ColumnConstraintKind::PrimaryKey {
                order,
                autoincrement,
            }
        } else if self.match_token(TokenKind::Not) {
            self.expect(TokenKind::Null)?;
            ColumnConstraintKind::NotNull
        } else if self.match_token(TokenKind::Unique) {
            ColumnConstraintKind::Unique
        } else if self.match_token(TokenKind::Check) {
            self.expect(TokenKind::LParen)?;
            let expr = self.parse_expr()?;
            self.expect(TokenKind::RParen)?;
            ColumnConstraintKind::Check(Box::new(expr))
        } else if self.match_token(TokenKind::Default) {
            ColumnConstraintKind::Default(Box::new(self.parse_default_value()?))
        } else if self.match_token(TokenKind::Collate) {
            ColumnConstraintKind::Collate(self.expect_identifier()?)
        } else if self.match_token(TokenKind::References) {
            ColumnConstraintKind::ForeignKey(self.parse_foreign_key_clause()?)
        } else if self.match_token(TokenKind::Generated) {
            self.expect(TokenKind::Always)?;
            self.expect(TokenKind::As)?;
            self.expect(TokenKind::LParen)?;
            let expr = self.parse_expr()?;
            self.expect(TokenKind::RParen)?;
            let storage = if self.match_token(TokenKind::Stored) {
                GeneratedStorage::Stored
            } else {
                self.match_token(TokenKind::Virtual);
                GeneratedStorage::Virtual
            };
            ColumnConstraintKind::Generated {
                expr: Box::new(expr),
                storage,
            }
        } else {
            if name.is_some() {
                return Err(self.error("expected constraint after CONSTRAINT name"));
            }
            return Ok(None);
        };

        Ok(Some(ColumnConstraint { name, kind }))
    }

    /// DEFAULT takes a primary expression, optionally signed
    fn parse_default_value(&mut self) -> Result<Expr> {
        if self.match_token(TokenKind::Minus) {
            let expr = self.parse_primary_expr()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                expr: Box::new(expr),
            });
        }
        if self.match_token(TokenKind::Plus) {
            let expr = self.parse_primary_expr()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Pos,
                expr: Box::new(expr),
            });
        }
        self.parse_primary_expr()
    }

    fn parse_foreign_key_clause(&mut self) -> Result<ForeignKeyClause> {
        let table = self.expect_identifier()?;
        let columns = if self.match_token(TokenKind::LParen) {
            let cols = self.parse_identifier_list()?;
            self.expect(TokenKind::RParen)?;
            Some(cols)
        } else {
            None
        };
        Ok(ForeignKeyClause { table, columns })
    }

    fn parse_table_constraint(&mut self) -> Result<TableConstraint> {
        let name = if self.match_token(TokenKind::Constraint) {
            Some(self.expect_identifier()?)
        } else {
            None
        };

        let kind = if self.match_token(TokenKind::Primary) {
            self.expect(TokenKind::Key)?;
            self.expect(TokenKind::LParen)?;
            let columns = self.parse_indexed_columns()?;
            self.expect(TokenKind::RParen)?;
            TableConstraintKind::PrimaryKey(columns)
        } else if self.match_token(TokenKind::Unique) {
            self.expect(TokenKind::LParen)?;
            let columns = self.parse_indexed_columns()?;
            self.expect(TokenKind::RParen)?;
            TableConstraintKind::Unique(columns)
        } else if self.match_token(TokenKind::Check) {
            self.expect(TokenKind::LParen)?;
            let expr = self.parse_expr()?;
            self.expect(TokenKind::RParen)?;
            TableConstraintKind::Check(Box::new(expr))
        } else if self.match_token(TokenKind::Foreign) {
            self.expect(TokenKind::Key)?;
            self.expect(TokenKind::LParen)?;
            let columns = self.parse_identifier_list()?;
            self.expect(TokenKind::RParen)?;
            self.expect(TokenKind::References)?;
            let clause = self.parse_foreign_key_clause()?;
            TableConstraintKind::ForeignKey { columns, clause }
        } else {
            return Err(self.error("expected PRIMARY, UNIQUE, CHECK, or FOREIGN"));
        };

        Ok(TableConstraint { name, kind })
    }

    fn parse_create_index(&mut self, unique: bool) -> Result<CreateIndexStmt> {
        let if_not_exists = self.parse_if_not_exists()?;
        let name = self.parse_qualified_name()?;

        self.expect(TokenKind::On)?;
        let table = self.expect_identifier()?;

        self.expect(TokenKind::LParen)?;
        let columns = self.parse_indexed_columns()?;
        self.expect(TokenKind::RParen)?;

        let where_clause = if self.match_token(TokenKind::Where) {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };

        Ok(CreateIndexStmt {
            unique,
            if_not_exists,
            name,
            table,
            columns,
            where_clause,
        })
    }

    fn parse_indexed_columns(&mut self) -> Result<Vec<IndexedColumn>> {
        let mut columns = vec![self.parse_indexed_column()?];
        while self.match_token(TokenKind::Comma) {
            columns.push(self.parse_indexed_column()?);
        }
        Ok(columns)
    }

    fn parse_indexed_column(&mut self) -> Result<IndexedColumn> {
        let name = self.expect_identifier()?;

        let collation = if self.match_token(TokenKind::Collate) {
            Some(self.expect_identifier()?)
        } else {
            None
        };

        let order = if self.match_token(TokenKind::Asc) {
            Some(SortOrder::Asc)
        } else if self.match_token(TokenKind::Desc) {
            Some(SortOrder::Desc)
        } else {
            None
        };

        Ok(IndexedColumn {
            name,
            collation,
            order,
        })
    }

    fn parse_if_not_exists(&mut self) -> Result<bool> {
        if self.match_token(TokenKind::If) {
            self.expect(TokenKind::Not)?;
            self.expect(TokenKind::Exists)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn parse_drop(&mut self) -> Result<Stmt> {
        self.expect(TokenKind::Drop)?;

        let is_table = if self.match_token(TokenKind::Table) {
            true
        } else if self.match_token(TokenKind::Index) {
            false
        } else {
            return Err(self.error("expected TABLE or INDEX after DROP"));
        };

        let if_exists = if self.match_token(TokenKind::If) {
            self.expect(TokenKind::Exists)?;
            true
        } else {
            false
        };

        let name = self.parse_qualified_name()?;
        let stmt = DropStmt { if_exists, name };

        if is_table {
            Ok(Stmt::DropTable(stmt))
        } else {
            Ok(Stmt::DropIndex(stmt))
        }
    }

    fn parse_begin(&mut self) -> Result<Stmt> {
        self.expect(TokenKind::Begin)?;

        let mode = if self.match_token(TokenKind::Deferred) {
            Some(TransactionMode::Deferred)
        } else if self.match_token(TokenKind::Immediate) {
            Some(TransactionMode::Immediate)
        } else if self.match_token(TokenKind::Exclusive) {
            Some(TransactionMode::Exclusive)
        } else {
            None
        };

        self.match_token(TokenKind::Transaction);

        Ok(Stmt::Begin(BeginStmt { mode }))
    }

    // ========================================================================
    // Expression Parser (precedence climbing, lowest to highest)
    // ========================================================================

    pub fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_or_expr()
    }

    fn parse_expr_list(&mut self) -> Result<Vec<Expr>> {
        let mut exprs = vec![self.parse_expr()?];
        while self.match_token(TokenKind::Comma) {
            exprs.push(self.parse_expr()?);
        }
        Ok(exprs)
    }

    fn parse_or_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_and_expr()?;

        while self.match_token(TokenKind::Or) {
            let right = self.parse_and_expr()?;
            left = Expr::Binary {
                op: BinaryOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_not_expr()?;

        while self.match_token(TokenKind::And) {
            let right = self.parse_not_expr()?;
            left = Expr::Binary {
                op: BinaryOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Prefix NOT consumes a single expression of this level, so
    /// NOT NOT x parses
    fn parse_not_expr(&mut self) -> Result<Expr> {
        if self.check(TokenKind::Not) {
            // NOT EXISTS (...) is an existence test, not a logical NOT
            if self.peek_ahead(1).kind == TokenKind::Exists {
                self.advance();
                self.advance();
                self.expect(TokenKind::LParen)?;
                let subquery = self.parse_select_stmt()?;
                self.expect(TokenKind::RParen)?;
                return Ok(Expr::Exists {
                    subquery: Box::new(subquery),
                    negated: true,
                });
            }

            self.advance();
            let expr = self.parse_not_expr()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                expr: Box::new(expr),
            });
        }

        self.parse_comparison_expr()
    }

    fn parse_comparison_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_bitwise_expr()?;

        loop {
            let cmp_op = match self.current().kind {
                TokenKind::Eq | TokenKind::EqEq => Some(BinaryOp::Eq),
                TokenKind::Ne | TokenKind::BangEq => Some(BinaryOp::Ne),
                TokenKind::Lt => Some(BinaryOp::Lt),
                TokenKind::Le => Some(BinaryOp::Le),
                TokenKind::Gt => Some(BinaryOp::Gt),
                TokenKind::Ge => Some(BinaryOp::Ge),
                _ => None,
            };

            if let Some(op) = cmp_op {
                self.advance();
                let right = self.parse_bitwise_expr()?;
                left = Expr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                };
                continue;
            }

            if self.match_token(TokenKind::Is) {
                let negated = self.match_token(TokenKind::Not);
                if self.match_token(TokenKind::Null) {
                    left = Expr::IsNull {
                        expr: Box::new(left),
                        negated,
                    };
                } else {
                    let right = self.parse_bitwise_expr()?;
                    left = Expr::Binary {
                        op: if negated { BinaryOp::IsNot } else { BinaryOp::Is },
                        left: Box::new(left),
                        right: Box::new(right),
                    };
                }
                continue;
            }

            if self.match_token(TokenKind::Isnull) {
                left = Expr::IsNull {
                    expr: Box::new(left),
                    negated: false,
                };
                continue;
            }

            if self.match_token(TokenKind::Notnull) {
                left = Expr::IsNull {
                    expr: Box::new(left),
                    negated: true,
                };
                continue;
            }

            if self.match_token(TokenKind::Not) {
                left = self.parse_not_suffix(left)?;
                continue;
            }

            if self.match_token(TokenKind::Between) {
                left = self.parse_between_expr(left, false)?;
                continue;
            }

            if self.match_token(TokenKind::In) {
                left = self.parse_in_expr(left, false)?;
                continue;
            }

            if self.match_token(TokenKind::Like) {
                left = self.parse_like_expr(left, LikeOp::Like, false)?;
                continue;
            }
            if self.match_token(TokenKind::Glob) {
                left = self.parse_like_expr(left, LikeOp::Glob, false)?;
                continue;
            }
            if self.match_token(TokenKind::Regexp) {
                left = self.parse_like_expr(left, LikeOp::Regexp, false)?;
                continue;
            }
            if self.match_token(TokenKind::Match) {
                left = self.parse_like_expr(left, LikeOp::Match, false)?;
                continue;
            }

            break;
        }

        Ok(left)
    }

    fn parse_not_suffix(&mut self, left: Expr) -> Result<Expr> {
        if self.match_token(TokenKind::Between) {
            self.parse_between_expr(left, true)
        } else if self.match_token(TokenKind::In) {
            self.parse_in_expr(left, true)
        } else if self.match_token(TokenKind::Like) {
            self.parse_like_expr(left, LikeOp::Like, true)
        } else if self.match_token(TokenKind::Glob) {
            self.parse_like_expr(left, LikeOp::Glob, true)
        } else if self.match_token(TokenKind::Regexp) {
            self.parse_like_expr(left, LikeOp::Regexp, true)
        } else if self.match_token(TokenKind::Match) {
            self.parse_like_expr(left, LikeOp::Match, true)
        } else if self.match_token(TokenKind::Null) {
            Ok(Expr::IsNull {
                expr: Box::new(left),
                negated: true,
            })
        } else {
            Err(self.error("expected BETWEEN, IN, LIKE, GLOB, REGEXP, MATCH, or NULL after NOT"))
        }
    }

    /// BETWEEN bounds bind at the bitwise level so that
    /// a BETWEEN b AND c OR d parses as (a BETWEEN b AND c) OR d
    fn parse_between_expr(&mut self, left: Expr, negated: bool) -> Result<Expr> {
        let low = self.parse_bitwise_expr()?;
        self.expect(TokenKind::And)?;
        let high = self.parse_bitwise_expr()?;
        Ok(Expr::Between {
            expr: Box::new(left),
            low: Box::new(low),
            high: Box::new(high),
            negated,
        })
    }

    fn parse_in_expr(&mut self, left: Expr, negated: bool) -> Result<Expr> {
        self.expect(TokenKind::LParen)?;

        let list = if self.check(TokenKind::Select) {
            InList::Subquery(Box::new(self.parse_select_stmt()?))
        } else if self.check(TokenKind::RParen) {
            InList::Values(Vec::new())
        } else {
            InList::Values(self.parse_expr_list()?)
        };

        self.expect(TokenKind::RParen)?;

        Ok(Expr::In {
            expr: Box::new(left),
            list,
            negated,
        })
    }

    fn parse_like_expr(&mut self, left: Expr, op: LikeOp, negated: bool) -> Result<Expr> {
        let pattern = self.parse_bitwise_expr()?;

        let escape = if self.match_token(TokenKind::Escape) {
            Some(Box::new(self.parse_bitwise_expr()?))
        } else {
            None
        };

        Ok(Expr::Like {
            expr: Box::new(left),
            pattern: Box::new(pattern),
            escape,
            op,
            negated,
        })
    }

    fn parse_bitwise_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_additive_expr()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Ampersand => BinaryOp::BitAnd,
                TokenKind::Pipe => BinaryOp::BitOr,
                TokenKind::LtLt => BinaryOp::ShiftLeft,
                TokenKind::GtGt => BinaryOp::ShiftRight,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive_expr()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_additive_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative_expr()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                TokenKind::DoublePipe => BinaryOp::Concat,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative_expr()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_multiplicative_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary_expr()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary_expr()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> Result<Expr> {
        let op = match self.current().kind {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Pos),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let expr = self.parse_unary_expr()?;
            return Ok(Expr::Unary {
                op,
                expr: Box::new(expr),
            });
        }

        self.parse_collate_expr()
    }

    fn parse_collate_expr(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary_expr()?;

        while self.match_token(TokenKind::Collate) {
            let collation = self.expect_identifier()?;
            expr = Expr::Collate {
                expr: Box::new(expr),
                collation,
            };
        }

        Ok(expr)
    }

    fn parse_primary_expr(&mut self) -> Result<Expr> {
        match self.current().kind {
            TokenKind::Integer
            | TokenKind::Float
            | TokenKind::String
            | TokenKind::Blob
            | TokenKind::Null
            | TokenKind::CurrentTime
            | TokenKind::CurrentDate
            | TokenKind::CurrentTimestamp => Ok(Expr::Literal(self.parse_literal()?)),

            TokenKind::Variable => Ok(Expr::Variable(self.parse_variable()?)),

            TokenKind::Case => {
                self.advance();
                self.parse_case_expr()
            }

            TokenKind::Cast => {
                self.advance();
                self.parse_cast_expr()
            }

            TokenKind::Exists => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let subquery = self.parse_select_stmt()?;
                self.expect(TokenKind::RParen)?;
                Ok(Expr::Exists {
                    subquery: Box::new(subquery),
                    negated: false,
                })
            }

            TokenKind::LParen => {
                self.advance();
                if self.check(TokenKind::Select) {
                    let subquery = self.parse_select_stmt()?;
                    self.expect(TokenKind::RParen)?;
                    return Ok(Expr::Subquery(Box::new(subquery)));
                }
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(Expr::Parens(Box::new(expr)))
            }

            TokenKind::Identifier => self.parse_identifier_or_function(),

            _ => Err(self.error("expected expression")),
        }
    }

    fn parse_literal(&mut self) -> Result<Literal> {
        let token = self.current().clone();
        self.advance();

        match token.kind {
            TokenKind::Null => Ok(Literal::Null),
            TokenKind::Integer => {
                let text = token.text(self.source).replace('_', "");
                if let Some(hex_digits) = text
                    .strip_prefix("0x")
                    .or_else(|| text.strip_prefix("0X"))
                {
                    let value = i64::from_str_radix(hex_digits, 16).map_err(|_| {
                        Error::parse(token.line, token.column, "invalid hex integer")
                    })?;
                    return Ok(Literal::Integer(value));
                }
                // Decimal integers too large for i64 fall back to float,
                // matching SQLite
                match text.parse::<i64>() {
                    Ok(value) => Ok(Literal::Integer(value)),
                    Err(_) => {
                        let value = text.parse::<f64>().map_err(|_| {
                            Error::parse(token.line, token.column, "invalid integer")
                        })?;
                        Ok(Literal::Float(value))
                    }
                }
            }
            TokenKind::Float => {
                let text = token.text(self.source).replace('_', "");
                let value = text
                    .parse()
                    .map_err(|_| Error::parse(token.line, token.column, "invalid float"))?;
                Ok(Literal::Float(value))
            }
            TokenKind::String => {
                let text = token.text(self.source);
                Ok(Literal::String(unquote(text)))
            }
            TokenKind::Blob => {
                let text = token.text(self.source);
                // X'...' with the lexer having validated the digits
                let digits = &text[2..text.len() - 1];
                let bytes = hex::decode(digits).map_err(|_| {
                    Error::parse(token.line, token.column, "invalid blob literal")
                })?;
                Ok(Literal::Blob(bytes))
            }
            TokenKind::CurrentTime => Ok(Literal::CurrentTime),
            TokenKind::CurrentDate => Ok(Literal::CurrentDate),
            TokenKind::CurrentTimestamp => Ok(Literal::CurrentTimestamp),
            _ => Err(Error::parse(token.line, token.column, "expected literal")),
        }
    }

    fn parse_variable(&mut self) -> Result<Variable> {
        let token = self.current().clone();
        let text = token.text(self.source).to_string();
        self.advance();

        if let Some(num_part) = text.strip_prefix('?') {
            if num_part.is_empty() {
                return Ok(Variable::Numbered(None));
            }
            let num: i32 = num_part.parse().map_err(|_| {
                Error::parse(token.line, token.column, "invalid parameter number")
            })?;
            return Ok(Variable::Numbered(Some(num)));
        }

        // Named parameters keep their original form including the prefix
        Ok(Variable::Named(text))
    }

    fn parse_case_expr(&mut self) -> Result<Expr> {
        let operand = if !self.check(TokenKind::When) {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };

        let mut when_clauses = Vec::new();
        while self.match_token(TokenKind::When) {
            let when = self.parse_expr()?;
            self.expect(TokenKind::Then)?;
            let then = self.parse_expr()?;
            when_clauses.push(WhenClause {
                when: Box::new(when),
                then: Box::new(then),
            });
        }

        if when_clauses.is_empty() {
            return Err(self.error("expected WHEN in CASE expression"));
        }

        let else_clause = if self.match_token(TokenKind::Else) {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };

        self.expect(TokenKind::End)?;

        Ok(Expr::Case {
            operand,
            when_clauses,
            else_clause,
        })
    }

    fn parse_cast_expr(&mut self) -> Result<Expr> {
        self.expect(TokenKind::LParen)?;
        let expr = self.parse_expr()?;
        self.expect(TokenKind::As)?;
        let type_name = self.parse_type_name()?;
        self.expect(TokenKind::RParen)?;

        Ok(Expr::Cast {
            expr: Box::new(expr),
            type_name,
        })
    }

    fn parse_identifier_or_function(&mut self) -> Result<Expr> {
        let name = unquote(self.current_text());
        self.advance();

        // Function call
        if self.match_token(TokenKind::LParen) {
            return self.parse_function_call(name);
        }

        // Qualified column: table.column
        if self.check(TokenKind::Dot) && self.peek_ahead(1).kind == TokenKind::Identifier {
            self.advance(); // .
            let column = self.expect_identifier()?;
            return Ok(Expr::Column(ColumnRef::with_table(name, column)));
        }

        Ok(Expr::Column(ColumnRef::new(name)))
    }

    fn parse_function_call(&mut self, name: String) -> Result<Expr> {
        let distinct = self.match_token(TokenKind::Distinct);

        let args = if self.match_token(TokenKind::Star) {
            FunctionArgs::Star
        } else if self.check(TokenKind::RParen) {
            FunctionArgs::List(Vec::new())
        } else {
            FunctionArgs::List(self.parse_expr_list()?)
        };

        self.expect(TokenKind::RParen)?;

        let filter = if self.match_token(TokenKind::Filter) {
            self.expect(TokenKind::LParen)?;
            self.expect(TokenKind::Where)?;
            let expr = self.parse_expr()?;
            self.expect(TokenKind::RParen)?;
            Some(Box::new(expr))
        } else {
            None
        };

        Ok(Expr::Function(FunctionCall {
            name,
            args,
            distinct,
            filter,
        }))
    }

    // ========================================================================
    // Token Helpers
    // ========================================================================

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn current_text(&self) -> &str {
        self.current().text(self.source)
    }

    /// Lookahead n tokens past the current one (clamped to Eof)
    fn peek_ahead(&self, n: usize) -> &Token {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<()> {
        if self.match_token(kind) {
            Ok(())
        } else {
            Err(self.error(format!("expected {:?}", kind)))
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        if self.check(TokenKind::Identifier) {
            let text = unquote(self.current_text());
            self.advance();
            Ok(text)
        } else {
            Err(self.error("expected identifier"))
        }
    }

    fn parse_qualified_name(&mut self) -> Result<QualifiedName> {
        let first = self.expect_identifier()?;

        if self.check(TokenKind::Dot) && self.peek_ahead(1).kind == TokenKind::Identifier {
            self.advance(); // .
            let name = self.expect_identifier()?;
            return Ok(QualifiedName::with_schema(first, name));
        }

        Ok(QualifiedName::new(first))
    }

    fn parse_identifier_list(&mut self) -> Result<Vec<String>> {
        let mut names = vec![self.expect_identifier()?];
        while self.match_token(TokenKind::Comma) {
            names.push(self.expect_identifier()?);
        }
        Ok(names)
    }

    /// Build a parse error at the current token. An Illegal token is
    /// surfaced with its lexeme; anything else gets the caller's message.
    fn error(&self, what: impl std::fmt::Display) -> Error {
        let token = self.current();
        if token.kind == TokenKind::Illegal {
            return Error::illegal_token(token.line, token.column, token.text(self.source));
        }
        Error::parse(token.line, token.column, what)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn select_core(stmt: &Stmt) -> &SelectCore {
        match stmt {
            Stmt::Select(SelectStmt {
                body: SelectBody::Select(core),
                ..
            }) => core,
            other => panic!("expected simple select, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_select_star() {
        let stmt = parse_single("SELECT * FROM users;").unwrap();
        let core = select_core(&stmt);
        assert_eq!(core.columns, vec![ResultColumn::Star]);
        let from = core.from.as_ref().unwrap();
        assert_eq!(from.tables.len(), 1);
        assert!(matches!(
            &from.tables[0],
            TableRef::Table { name, alias: None } if name.name == "users"
        ));
    }

    #[test]
    fn test_parse_select_no_from() {
        let stmt = parse_single("SELECT 1 + 2").unwrap();
        let core = select_core(&stmt);
        assert!(core.from.is_none());
        assert_eq!(core.columns.len(), 1);
    }

    #[test]
    fn test_parse_select_aliases() {
        let stmt = parse_single("SELECT a AS x, b y, t.* FROM t").unwrap();
        let core = select_core(&stmt);
        assert_eq!(core.columns.len(), 3);
        assert!(matches!(
            &core.columns[0],
            ResultColumn::Expr { alias: Some(a), .. } if a == "x"
        ));
        assert!(matches!(
            &core.columns[1],
            ResultColumn::Expr { alias: Some(a), .. } if a == "y"
        ));
        assert!(matches!(&core.columns[2], ResultColumn::TableStar(t) if t == "t"));
    }

    #[test]
    fn test_parse_select_precedence() {
        // a+b*c > 10: the multiplication binds tighter
        let stmt = parse_single("SELECT u.id, name FROM t u WHERE a+b*c > 10").unwrap();
        let core = select_core(&stmt);
        assert_eq!(core.columns.len(), 2);

        let from = core.from.as_ref().unwrap();
        assert!(matches!(
            &from.tables[0],
            TableRef::Table { name, alias: Some(a) } if name.name == "t" && a == "u"
        ));

        let where_clause = core.where_clause.as_ref().unwrap();
        match where_clause.as_ref() {
            Expr::Binary {
                op: BinaryOp::Gt,
                left,
                ..
            } => match left.as_ref() {
                Expr::Binary {
                    op: BinaryOp::Add,
                    right,
                    ..
                } => {
                    assert!(matches!(
                        right.as_ref(),
                        Expr::Binary {
                            op: BinaryOp::Mul,
                            ..
                        }
                    ));
                }
                other => panic!("expected Add, got {:?}", other),
            },
            other => panic!("expected Gt, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_concat_level() {
        // || binds like +: a || b + c == a || (b + c)? No: same level,
        // left-associative: (a || b) + c
        let expr = parse_expression("a || b + c").unwrap();
        assert!(matches!(
            expr,
            Expr::Binary {
                op: BinaryOp::Add,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_between_or() {
        // a BETWEEN b AND c OR d == (a BETWEEN b AND c) OR d
        let expr = parse_expression("a BETWEEN 1 AND 5 OR d").unwrap();
        match expr {
            Expr::Binary {
                op: BinaryOp::Or,
                left,
                ..
            } => assert!(matches!(left.as_ref(), Expr::Between { .. })),
            other => panic!("expected Or at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_not_not() {
        let expr = parse_expression("NOT NOT x").unwrap();
        match expr {
            Expr::Unary {
                op: UnaryOp::Not,
                expr,
            } => assert!(matches!(
                expr.as_ref(),
                Expr::Unary {
                    op: UnaryOp::Not,
                    ..
                }
            )),
            other => panic!("expected nested NOT, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_is_null_forms() {
        assert!(matches!(
            parse_expression("x IS NULL").unwrap(),
            Expr::IsNull { negated: false, .. }
        ));
        assert!(matches!(
            parse_expression("x IS NOT NULL").unwrap(),
            Expr::IsNull { negated: true, .. }
        ));
        assert!(matches!(
            parse_expression("x ISNULL").unwrap(),
            Expr::IsNull { negated: false, .. }
        ));
        assert!(matches!(
            parse_expression("x NOTNULL").unwrap(),
            Expr::IsNull { negated: true, .. }
        ));
        assert!(matches!(
            parse_expression("x NOT NULL").unwrap(),
            Expr::IsNull { negated: true, .. }
        ));
    }

    #[test]
    fn test_parse_in_list() {
        let expr = parse_expression("x IN (1, 2, 3)").unwrap();
        match expr {
            Expr::In {
                list: InList::Values(items),
                negated: false,
                ..
            } => assert_eq!(items.len(), 3),
            other => panic!("expected IN, got {:?}", other),
        }

        let expr = parse_expression("x NOT IN (SELECT a FROM t)").unwrap();
        assert!(matches!(
            expr,
            Expr::In {
                list: InList::Subquery(_),
                negated: true,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_like_escape() {
        let expr = parse_expression("name LIKE '100\\%' ESCAPE '\\'").unwrap();
        match expr {
            Expr::Like {
                op: LikeOp::Like,
                escape: Some(_),
                negated: false,
                ..
            } => {}
            other => panic!("expected LIKE with ESCAPE, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_case_forms() {
        let expr = parse_expression("CASE x WHEN 1 THEN 'one' WHEN 2 THEN 'two' ELSE 'many' END")
            .unwrap();
        match expr {
            Expr::Case {
                operand: Some(_),
                when_clauses,
                else_clause: Some(_),
            } => assert_eq!(when_clauses.len(), 2),
            other => panic!("expected CASE, got {:?}", other),
        }

        let expr = parse_expression("CASE WHEN x > 0 THEN 'pos' END").unwrap();
        assert!(matches!(
            expr,
            Expr::Case {
                operand: None,
                else_clause: None,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_cast() {
        let expr = parse_expression("CAST(x AS VARCHAR(255))").unwrap();
        match expr {
            Expr::Cast { type_name, .. } => {
                assert_eq!(type_name.to_string(), "VARCHAR(255)");
            }
            other => panic!("expected CAST, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_function_calls() {
        let expr = parse_expression("count(*)").unwrap();
        match expr {
            Expr::Function(call) => {
                assert_eq!(call.name, "count");
                assert!(matches!(call.args, FunctionArgs::Star));
            }
            other => panic!("expected function, got {:?}", other),
        }

        let expr = parse_expression("count(DISTINCT x) FILTER (WHERE y > 0)").unwrap();
        match expr {
            Expr::Function(call) => {
                assert!(call.distinct);
                assert!(call.filter.is_some());
            }
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_variables() {
        assert!(matches!(
            parse_expression("?").unwrap(),
            Expr::Variable(Variable::Numbered(None))
        ));
        assert!(matches!(
            parse_expression("?3").unwrap(),
            Expr::Variable(Variable::Numbered(Some(3)))
        ));
        assert!(matches!(
            parse_expression(":name").unwrap(),
            Expr::Variable(Variable::Named(n)) if n == ":name"
        ));
        assert!(matches!(
            parse_expression("@v").unwrap(),
            Expr::Variable(Variable::Named(n)) if n == "@v"
        ));
    }

    #[test]
    fn test_parse_joins() {
        let stmt =
            parse_single("SELECT * FROM a LEFT OUTER JOIN b ON a.id = b.id JOIN c USING (x)")
                .unwrap();
        let core = select_core(&stmt);
        let from = core.from.as_ref().unwrap();
        match &from.tables[0] {
            TableRef::Join {
                left,
                join_type,
                constraint,
                ..
            } => {
                assert_eq!(join_type.op, JoinOp::Inner);
                assert!(matches!(constraint, Some(JoinConstraint::Using(cols)) if cols == &vec!["x".to_string()]));
                match left.as_ref() {
                    TableRef::Join {
                        join_type,
                        constraint,
                        ..
                    } => {
                        assert_eq!(join_type.op, JoinOp::Left);
                        assert!(!join_type.natural);
                        assert!(matches!(constraint, Some(JoinConstraint::On(_))));
                    }
                    other => panic!("expected join, got {:?}", other),
                }
            }
            other => panic!("expected join, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_natural_join() {
        let stmt = parse_single("SELECT * FROM a NATURAL LEFT JOIN b").unwrap();
        let core = select_core(&stmt);
        match &core.from.as_ref().unwrap().tables[0] {
            TableRef::Join { join_type, .. } => {
                assert!(join_type.natural);
                assert_eq!(join_type.op, JoinOp::Left);
            }
            other => panic!("expected join, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_group_having_order_limit() {
        let stmt = parse_single(
            "SELECT dept, count(*) FROM emp WHERE pay > 10 GROUP BY dept \
             HAVING count(*) > 1 ORDER BY dept DESC LIMIT 5 OFFSET 2",
        )
        .unwrap();
        match &stmt {
            Stmt::Select(sel) => {
                let order = sel.order_by.as_ref().unwrap();
                assert_eq!(order.len(), 1);
                assert_eq!(order[0].order, SortOrder::Desc);
                let limit = sel.limit.as_ref().unwrap();
                assert!(limit.offset.is_some());
            }
            other => panic!("expected select, got {:?}", other),
        }
        let core = select_core(&stmt);
        assert!(core.group_by.is_some());
        assert!(core.having.is_some());
    }

    #[test]
    fn test_parse_limit_comma() {
        let stmt = parse_single("SELECT * FROM t LIMIT 10, 20").unwrap();
        match stmt {
            Stmt::Select(sel) => {
                let limit = sel.limit.unwrap();
                // LIMIT offset, count
                assert!(matches!(
                    limit.limit.as_ref(),
                    Expr::Literal(Literal::Integer(20))
                ));
                assert!(matches!(
                    limit.offset.unwrap().as_ref(),
                    Expr::Literal(Literal::Integer(10))
                ));
            }
            other => panic!("expected select, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_compound_select() {
        let stmt = parse_single("SELECT a FROM t UNION ALL SELECT b FROM u").unwrap();
        match stmt {
            Stmt::Select(SelectStmt {
                body: SelectBody::Compound { op, .. },
                ..
            }) => assert_eq!(op, CompoundOp::UnionAll),
            other => panic!("expected compound select, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_insert_values() {
        let stmt = parse_single("INSERT OR IGNORE INTO t (a, b) VALUES (1, 2), (3, 4)").unwrap();
        match stmt {
            Stmt::Insert(ins) => {
                assert_eq!(ins.or_action, Some(ConflictAction::Ignore));
                assert_eq!(ins.columns, Some(vec!["a".to_string(), "b".to_string()]));
                match ins.source {
                    InsertSource::Values(rows) => assert_eq!(rows.len(), 2),
                    other => panic!("expected VALUES, got {:?}", other),
                }
            }
            other => panic!("expected insert, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_insert_select_and_default() {
        assert!(matches!(
            parse_single("INSERT INTO t SELECT * FROM u").unwrap(),
            Stmt::Insert(InsertStmt {
                source: InsertSource::Select(_),
                ..
            })
        ));
        assert!(matches!(
            parse_single("INSERT INTO t DEFAULT VALUES").unwrap(),
            Stmt::Insert(InsertStmt {
                source: InsertSource::DefaultValues,
                ..
            })
        ));
        assert!(matches!(
            parse_single("REPLACE INTO t VALUES (1)").unwrap(),
            Stmt::Insert(InsertStmt {
                or_action: Some(ConflictAction::Replace),
                ..
            })
        ));
    }

    #[test]
    fn test_parse_update() {
        let stmt =
            parse_single("UPDATE OR FAIL t SET a = 1, b = b + 1 WHERE id = 5 LIMIT 3").unwrap();
        match stmt {
            Stmt::Update(upd) => {
                assert_eq!(upd.or_action, Some(ConflictAction::Fail));
                assert_eq!(upd.assignments.len(), 2);
                assert!(upd.where_clause.is_some());
                assert!(upd.limit.is_some());
            }
            other => panic!("expected update, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_delete() {
        let stmt = parse_single("DELETE FROM t WHERE a < 10 ORDER BY a LIMIT 1").unwrap();
        match stmt {
            Stmt::Delete(del) => {
                assert!(del.where_clause.is_some());
                assert!(del.order_by.is_some());
                assert!(del.limit.is_some());
            }
            other => panic!("expected delete, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_create_table() {
        let stmt = parse_single(
            "CREATE TABLE IF NOT EXISTS t (\
               id INTEGER PRIMARY KEY AUTOINCREMENT, \
               name TEXT NOT NULL UNIQUE COLLATE NOCASE, \
               price DECIMAL(10,2) DEFAULT 0, \
               total REAL GENERATED ALWAYS AS (price * 2) STORED, \
               ref_id INTEGER REFERENCES other (id), \
               CONSTRAINT pk_extra UNIQUE (name, price), \
               CHECK (price >= 0)\
             ) WITHOUT ROWID",
        )
        .unwrap();
        match stmt {
            Stmt::CreateTable(ct) => {
                assert!(ct.if_not_exists);
                assert!(ct.without_rowid);
                assert!(!ct.strict);
                match ct.definition {
                    TableDefinition::Columns {
                        columns,
                        constraints,
                    } => {
                        assert_eq!(columns.len(), 5);
                        assert_eq!(constraints.len(), 2);
                        assert!(matches!(
                            columns[0].constraints[0].kind,
                            ColumnConstraintKind::PrimaryKey {
                                autoincrement: true,
                                ..
                            }
                        ));
                        assert_eq!(
                            columns[2].type_name.as_ref().unwrap().to_string(),
                            "DECIMAL(10,2)"
                        );
                    }
                    other => panic!("expected columns, got {:?}", other),
                }
            }
            other => panic!("expected create table, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_create_table_as_select() {
        let stmt = parse_single("CREATE TEMP TABLE t2 AS SELECT * FROM t").unwrap();
        match stmt {
            Stmt::CreateTable(ct) => {
                assert!(ct.temporary);
                assert!(matches!(ct.definition, TableDefinition::AsSelect(_)));
            }
            other => panic!("expected create table, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_create_table_strict() {
        let stmt = parse_single("CREATE TABLE t (a INTEGER) STRICT, WITHOUT ROWID").unwrap();
        match stmt {
            Stmt::CreateTable(ct) => {
                assert!(ct.strict);
                assert!(ct.without_rowid);
            }
            other => panic!("expected create table, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_create_index() {
        let stmt = parse_single(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx ON t (a ASC, b COLLATE NOCASE DESC) WHERE a > 0",
        )
        .unwrap();
        match stmt {
            Stmt::CreateIndex(ci) => {
                assert!(ci.unique);
                assert!(ci.if_not_exists);
                assert_eq!(ci.table, "t");
                assert_eq!(ci.columns.len(), 2);
                assert_eq!(ci.columns[1].collation.as_deref(), Some("NOCASE"));
                assert_eq!(ci.columns[1].order, Some(SortOrder::Desc));
                assert!(ci.where_clause.is_some());
            }
            other => panic!("expected create index, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_drop() {
        assert!(matches!(
            parse_single("DROP TABLE IF EXISTS t").unwrap(),
            Stmt::DropTable(DropStmt {
                if_exists: true,
                ..
            })
        ));
        assert!(matches!(
            parse_single("DROP INDEX idx").unwrap(),
            Stmt::DropIndex(DropStmt {
                if_exists: false,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_transactions() {
        assert!(matches!(
            parse_single("BEGIN").unwrap(),
            Stmt::Begin(BeginStmt { mode: None })
        ));
        assert!(matches!(
            parse_single("BEGIN IMMEDIATE TRANSACTION").unwrap(),
            Stmt::Begin(BeginStmt {
                mode: Some(TransactionMode::Immediate)
            })
        ));
        assert!(matches!(parse_single("COMMIT").unwrap(), Stmt::Commit));
        assert!(matches!(
            parse_single("ROLLBACK TRANSACTION").unwrap(),
            Stmt::Rollback
        ));
    }

    #[test]
    fn test_parse_explain() {
        assert!(matches!(
            parse_single("EXPLAIN SELECT 1").unwrap(),
            Stmt::Explain(_)
        ));
        match parse_single("EXPLAIN QUERY PLAN SELECT 1").unwrap() {
            Stmt::ExplainQueryPlan(inner) => assert!(matches!(*inner, Stmt::Select(_))),
            other => panic!("expected explain query plan, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_multiple_statements() {
        let (stmts, errors) = parse("SELECT 1; SELECT 2;; SELECT 3");
        assert!(errors.is_empty());
        assert_eq!(stmts.len(), 3);
    }

    #[test]
    fn test_parse_error_recovery() {
        let (stmts, errors) = parse("SELECT 1; SELECT FROM WHERE; SELECT 3");
        assert_eq!(stmts.len(), 2);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().starts_with("parse error at line 1"));
    }

    #[test]
    fn test_parse_error_has_position() {
        let (_, errors) = parse("SELECT\n  1 +");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, Some(2));
    }

    #[test]
    fn test_parse_illegal_token() {
        let (_, errors) = parse("SELECT \\ FROM t");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().starts_with("illegal token"));
    }

    #[test]
    fn test_parse_empty_input() {
        let (stmts, errors) = parse("  ;; ");
        assert!(stmts.is_empty());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_parse_quoted_identifiers() {
        let stmt = parse_single("SELECT \"my col\" FROM [my table]").unwrap();
        let core = select_core(&stmt);
        assert!(matches!(
            &core.columns[0],
            ResultColumn::Expr {
                expr: Expr::Column(ColumnRef { column, .. }),
                ..
            } if column == "my col"
        ));
        assert!(matches!(
            &core.from.as_ref().unwrap().tables[0],
            TableRef::Table { name, .. } if name.name == "my table"
        ));
    }

    #[test]
    fn test_parse_subquery_expr() {
        let expr = parse_expression("(SELECT max(a) FROM t)").unwrap();
        assert!(matches!(expr, Expr::Subquery(_)));

        let expr = parse_expression("EXISTS (SELECT 1 FROM t)").unwrap();
        assert!(matches!(expr, Expr::Exists { negated: false, .. }));

        let expr = parse_expression("NOT EXISTS (SELECT 1 FROM t)").unwrap();
        assert!(matches!(expr, Expr::Exists { negated: true, .. }));
    }

    #[test]
    fn test_parse_collate_postfix() {
        let expr = parse_expression("name COLLATE NOCASE = 'abc'").unwrap();
        match expr {
            Expr::Binary {
                op: BinaryOp::Eq,
                left,
                ..
            } => assert!(matches!(left.as_ref(), Expr::Collate { .. })),
            other => panic!("expected Eq over COLLATE, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unary_collate_order() {
        // COLLATE binds tighter than unary minus: -x COLLATE BINARY
        // negates the collated expression
        let expr = parse_expression("-x COLLATE BINARY").unwrap();
        match expr {
            Expr::Unary {
                op: UnaryOp::Neg,
                expr,
            } => assert!(matches!(expr.as_ref(), Expr::Collate { .. })),
            other => panic!("expected Neg over COLLATE, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_hex_and_blob_literals() {
        assert!(matches!(
            parse_expression("0x1F").unwrap(),
            Expr::Literal(Literal::Integer(31))
        ));
        match parse_expression("X'48656C6C6F'").unwrap() {
            Expr::Literal(Literal::Blob(b)) => assert_eq!(b, b"Hello".to_vec()),
            other => panic!("expected blob, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_is_operator() {
        assert!(matches!(
            parse_expression("a IS b").unwrap(),
            Expr::Binary {
                op: BinaryOp::Is,
                ..
            }
        ));
        assert!(matches!(
            parse_expression("a IS NOT b").unwrap(),
            Expr::Binary {
                op: BinaryOp::IsNot,
                ..
            }
        ));
    }
}
