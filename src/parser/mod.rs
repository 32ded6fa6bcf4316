pub mod include;

use std::path::{Path, PathBuf};

use crate::ast::*;
use crate::error::CompileError;
use crate::scanner::token::{Literal, Token, TokenKind};

pub use include::{Loader, Parsed, parse_file};

const MAX_ARGUMENTS: usize = 16;

/// Recursive-descent parser over a scanned token list.
///
/// Parsing stops at the first error. A parser built with
/// [`Parser::with_loader`] resolves `include` directives relative to its
/// origin file and splices the included declarations in place.
pub struct Parser<'l> {
    tokens: Vec<Token>,
    current: usize,
    loop_depth: usize,
    source: Option<(String, String)>,
    loader: Option<&'l mut Loader>,
    origin: Option<PathBuf>,
}

impl<'l> Parser<'l> {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            loop_depth: 0,
            source: None,
            loader: None,
            origin: None,
        }
    }

    /// Attach the source text so parse errors render with a labelled snippet.
    pub fn with_source(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.source = Some((name.into(), source.into()));
        self
    }

    pub(crate) fn with_loader(mut self, loader: &'l mut Loader, origin: &Path) -> Self {
        self.loader = Some(loader);
        self.origin = Some(origin.to_path_buf());
        self
    }

    pub fn parse(mut self) -> Result<Program, CompileError> {
        let mut declarations = Vec::new();
        while !self.is_at_end() {
            if self.match_token(TokenKind::Include) {
                declarations.extend(self.include_directive()?);
            } else {
                declarations.push(self.declaration()?);
            }
        }
        Ok(Program { declarations })
    }

    fn include_directive(&mut self) -> Result<Vec<Stmt>, CompileError> {
        let keyword = self.previous().clone();
        let target = match self.peek().literal {
            Some(Literal::Str(ref s)) if self.check(TokenKind::StringLit) => s.clone(),
            _ => return Err(self.error_at_current("expected file name after 'include'")),
        };
        self.advance();
        self.consume(TokenKind::Semicolon, "';' after include")?;

        if let (Some(loader), Some(origin)) = (self.loader.as_deref_mut(), self.origin.as_deref()) {
            return loader.include(origin, &target);
        }
        Err(self.error_at(&keyword, "'include' is only available when parsing a file"))
    }

    fn declaration(&mut self) -> Result<Stmt, CompileError> {
        if self.match_token(TokenKind::Func) {
            self.func_declaration().map(Stmt::FuncDecl)
        } else if self.check_form(&[TokenKind::Identifier, TokenKind::Colon]) {
            self.var_declaration(false)
        } else if self.check(TokenKind::Include) {
            Err(self.error_at_current("'include' is only allowed at the top level of a file"))
        } else {
            self.statement()
        }
    }

    fn func_declaration(&mut self) -> Result<FuncDecl, CompileError> {
        let line = self.previous().line;
        let name = self.expect_identifier("function name")?;
        self.consume(TokenKind::LeftParen, "'(' after function name")?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if params.len() >= MAX_ARGUMENTS {
                    return Err(self.error_at_current(format!(
                        "can't have more than {MAX_ARGUMENTS} parameters"
                    )));
                }
                let name = self.expect_identifier("parameter name")?;
                self.consume(TokenKind::Colon, "':' after parameter name")?;
                let declared_type = self.parse_type()?;
                params.push(Param {
                    name,
                    declared_type,
                });
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "')' after parameters")?;
        if !self.match_token(TokenKind::Colon) {
            return Err(
                self.error_at_current(format!("function '{name}' is missing a return type"))
            );
        }
        let return_type = self.parse_type()?;
        self.consume(TokenKind::LeftBrace, "'{' before function body")?;

        // A function body starts a fresh loop context.
        let enclosing_loops = std::mem::replace(&mut self.loop_depth, 0);
        let body = self.block();
        self.loop_depth = enclosing_loops;

        Ok(FuncDecl {
            name,
            params,
            return_type,
            body: body?,
            line,
        })
    }

    /// `name: type [= expr]`, with the initializer mandatory inside a `for`
    /// header.
    fn var_declaration(&mut self, require_initializer: bool) -> Result<Stmt, CompileError> {
        let line = self.peek().line;
        let name = self.expect_identifier("variable name")?;
        self.consume(TokenKind::Colon, "':' after variable name")?;
        let declared_type = self.parse_type()?;

        let initializer = if self.match_token(TokenKind::Equal) {
            Some(self.expression()?)
        } else if require_initializer {
            return Err(self.error_at_current("expected '=' in for-loop initializer"));
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "';' after variable declaration")?;
        Ok(Stmt::VarDecl(VarDecl {
            name,
            declared_type,
            initializer,
            line,
        }))
    }

    fn parse_type(&mut self) -> Result<Type, CompileError> {
        let name = self.expect_identifier("type name")?;
        let mut ty = Type::Value { name };
        while self.match_token(TokenKind::Star) {
            ty = Type::Pointer {
                inner: Box::new(ty),
            };
        }
        Ok(ty)
    }

    fn statement(&mut self) -> Result<Stmt, CompileError> {
        if self.match_token(TokenKind::For) {
            self.for_statement()
        } else if self.match_token(TokenKind::If) {
            self.if_statement()
        } else if self.match_token(TokenKind::Return) {
            self.return_statement()
        } else if self.match_token(TokenKind::While) {
            self.while_statement()
        } else if self.match_token(TokenKind::LeftBrace) {
            self.block().map(Stmt::Block)
        } else if self.match_token(TokenKind::Break) {
            let line = self.loop_control("break")?;
            Ok(Stmt::Break { line })
        } else if self.match_token(TokenKind::Continue) {
            let line = self.loop_control("continue")?;
            Ok(Stmt::Continue { line })
        } else {
            self.expression_statement()
        }
    }

    fn loop_control(&mut self, keyword: &str) -> Result<usize, CompileError> {
        let token = self.previous().clone();
        if self.loop_depth == 0 {
            return Err(self.error_at(&token, format!("'{keyword}' outside of a loop")));
        }
        self.consume(TokenKind::Semicolon, &format!("';' after '{keyword}'"))?;
        Ok(token.line)
    }

    fn return_statement(&mut self) -> Result<Stmt, CompileError> {
        let line = self.previous().line;
        let value = if !self.check(TokenKind::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "';' after return value")?;
        Ok(Stmt::Return(ReturnStmt { value, line }))
    }

    /// Parses the statements up to the closing brace; the opening brace has
    /// already been consumed.
    fn block(&mut self) -> Result<BlockStmt, CompileError> {
        let line = self.previous().line;
        let mut statements = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }
        self.consume(TokenKind::RightBrace, "'}' after block")?;
        Ok(BlockStmt { statements, line })
    }

    fn if_statement(&mut self) -> Result<Stmt, CompileError> {
        let line = self.previous().line;
        self.consume(TokenKind::LeftParen, "'(' after 'if'")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "')' after if condition")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_token(TokenKind::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If(IfStmt {
            condition,
            then_branch,
            else_branch,
            line,
        }))
    }

    fn while_statement(&mut self) -> Result<Stmt, CompileError> {
        let line = self.previous().line;
        self.consume(TokenKind::LeftParen, "'(' after 'while'")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "')' after while condition")?;
        let body = Box::new(self.loop_body()?);
        Ok(Stmt::While(WhileStmt {
            condition,
            body,
            is_for_loop: false,
            line,
        }))
    }

    fn loop_body(&mut self) -> Result<Stmt, CompileError> {
        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;
        body
    }

    /// Desugar `for` into `{ init; while (cond) { body; incr; } }`.
    fn for_statement(&mut self) -> Result<Stmt, CompileError> {
        let line = self.previous().line;
        self.consume(TokenKind::LeftParen, "'(' after 'for'")?;

        let initializer = if self.match_token(TokenKind::Semicolon) {
            None
        } else if self.check_form(&[TokenKind::Identifier, TokenKind::Colon]) {
            Some(self.var_declaration(true)?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(TokenKind::Semicolon) {
            self.expression()?
        } else {
            Expr::Literal(LiteralExpr {
                value: LiteralValue::Bool(true),
                line: self.peek().line,
            })
        };
        self.consume(TokenKind::Semicolon, "';' after for condition")?;

        let increment = if !self.check(TokenKind::RightParen) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::RightParen, "')' after for clauses")?;

        let mut body = self.loop_body()?;

        let is_for_loop = increment.is_some();
        if let Some(inc) = increment {
            let inc_line = inc.line();
            body = Stmt::Block(BlockStmt {
                statements: vec![
                    body,
                    Stmt::Expression(ExprStmt {
                        expression: inc,
                        line: inc_line,
                    }),
                ],
                line,
            });
        }

        body = Stmt::While(WhileStmt {
            condition,
            body: Box::new(body),
            is_for_loop,
            line,
        });

        if let Some(init) = initializer {
            body = Stmt::Block(BlockStmt {
                statements: vec![init, body],
                line,
            });
        }

        Ok(body)
    }

    fn expression_statement(&mut self) -> Result<Stmt, CompileError> {
        let expression = self.expression()?;
        self.consume(TokenKind::Semicolon, "';' after expression")?;
        let line = expression.line();
        Ok(Stmt::Expression(ExprStmt { expression, line }))
    }

    fn expression(&mut self) -> Result<Expr, CompileError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, CompileError> {
        let expr = self.or()?;

        if self.match_token(TokenKind::Equal) {
            let equals = self.previous().clone();
            let value = self.assignment()?;

            return match expr {
                Expr::Identifier(target) => Ok(Expr::Assign(AssignExpr {
                    name: target.name,
                    value: Box::new(value),
                    line: target.line,
                })),
                _ => Err(self.error_at(&equals, "invalid assignment target")),
            };
        }

        Ok(expr)
    }

    fn or(&mut self) -> Result<Expr, CompileError> {
        self.binary_level(&[TokenKind::Or], Self::and)
    }

    fn and(&mut self) -> Result<Expr, CompileError> {
        self.binary_level(&[TokenKind::And], Self::equality)
    }

    fn equality(&mut self) -> Result<Expr, CompileError> {
        self.binary_level(&[TokenKind::EqualEqual, TokenKind::NotEqual], Self::comparison)
    }

    fn comparison(&mut self) -> Result<Expr, CompileError> {
        self.binary_level(
            &[
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> Result<Expr, CompileError> {
        self.binary_level(&[TokenKind::Plus, TokenKind::Minus], Self::factor)
    }

    fn factor(&mut self) -> Result<Expr, CompileError> {
        self.binary_level(
            &[TokenKind::Star, TokenKind::Slash, TokenKind::Percent],
            Self::unary,
        )
    }

    /// One left-associative precedence level.
    fn binary_level(
        &mut self,
        operators: &[TokenKind],
        operand: fn(&mut Self) -> Result<Expr, CompileError>,
    ) -> Result<Expr, CompileError> {
        let mut expr = operand(self)?;
        while let Some(op) = self.match_binary_op(operators) {
            let right = operand(self)?;
            let line = expr.line();
            expr = Expr::Binary(BinaryExpr {
                left: Box::new(expr),
                operator: op,
                right: Box::new(right),
                line,
            });
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, CompileError> {
        let operator = if self.match_token(TokenKind::Not) {
            UnaryOp::Not
        } else if self.match_token(TokenKind::Minus) {
            UnaryOp::Negate
        } else {
            return self.call();
        };
        let line = self.previous().line;
        let operand = self.unary()?;
        Ok(Expr::Unary(UnaryExpr {
            operator,
            operand: Box::new(operand),
            line,
        }))
    }

    fn call(&mut self) -> Result<Expr, CompileError> {
        let mut expr = self.primary()?;

        loop {
            if self.match_token(TokenKind::LeftParen) {
                expr = self.finish_call(expr)?;
            } else if self.match_token(TokenKind::Dot) {
                let name = self.expect_identifier("member name after '.'")?;
                let line = expr.line();
                expr = Expr::MemberAccess(MemberAccessExpr {
                    object: Box::new(expr),
                    name,
                    line,
                });
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr, CompileError> {
        let mut arguments = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if arguments.len() >= MAX_ARGUMENTS {
                    return Err(self.error_at_current(format!(
                        "can't have more than {MAX_ARGUMENTS} arguments"
                    )));
                }
                arguments.push(self.expression()?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "')' after arguments")?;
        let line = callee.line();
        Ok(Expr::Call(CallExpr {
            callee: Box::new(callee),
            arguments,
            line,
        }))
    }

    fn primary(&mut self) -> Result<Expr, CompileError> {
        let token = self.peek().clone();
        let value = match (token.kind, token.literal) {
            (TokenKind::IntLit, Some(Literal::Int(n))) => LiteralValue::Int(n),
            (TokenKind::DoubleLit, Some(Literal::Double(n))) => LiteralValue::Double(n),
            (TokenKind::StringLit, Some(Literal::Str(s))) => LiteralValue::Str(s),
            (TokenKind::BoolLit, Some(Literal::Bool(b))) => LiteralValue::Bool(b),
            (TokenKind::Identifier, Some(Literal::Identifier(name))) => {
                self.advance();
                return Ok(Expr::Identifier(IdentifierExpr {
                    name,
                    line: token.line,
                }));
            }
            (TokenKind::LeftParen, _) => {
                self.advance();
                let expr = self.expression()?;
                self.consume(TokenKind::RightParen, "')' after expression")?;
                return Ok(Expr::Parenthesized(ParenthesizedExpr {
                    expression: Box::new(expr),
                    line: token.line,
                }));
            }
            _ => {
                return Err(self.error_at_current(format!(
                    "expected expression, found '{}'",
                    self.peek().describe()
                )));
            }
        };
        self.advance();
        Ok(Expr::Literal(LiteralExpr {
            value,
            line: token.line,
        }))
    }

    // --- Helper methods ---

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// True when the upcoming tokens have exactly these kinds, in order.
    fn check_form(&self, kinds: &[TokenKind]) -> bool {
        kinds.iter().enumerate().all(|(i, kind)| {
            self.tokens
                .get(self.current + i)
                .is_some_and(|token| token.kind == *kind)
        })
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_binary_op(&mut self, kinds: &[TokenKind]) -> Option<BinaryOp> {
        let kind = kinds.iter().copied().find(|&kind| self.check(kind))?;
        self.advance();
        token_to_binary_op(kind)
    }

    fn consume(&mut self, kind: TokenKind, expected: &str) -> Result<&Token, CompileError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(format!(
                "expected {expected}, found '{}'",
                self.peek().describe()
            )))
        }
    }

    fn expect_identifier(&mut self, context: &str) -> Result<String, CompileError> {
        match self.peek().identifier() {
            Some(name) => {
                let name = name.to_string();
                self.advance();
                Ok(name)
            }
            None => Err(self.error_at_current(format!(
                "expected {context}, found '{}'",
                self.peek().describe()
            ))),
        }
    }

    fn error_at_current(&self, message: impl Into<String>) -> CompileError {
        self.error_at(self.peek(), message)
    }

    fn error_at(&self, token: &Token, message: impl Into<String>) -> CompileError {
        let error = CompileError::parse(message, token.line, token.span);
        match &self.source {
            Some((name, source)) => error.with_source_code(name.as_str(), source.as_str()),
            None => error,
        }
    }
}

fn token_to_binary_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Subtract,
        TokenKind::Star => BinaryOp::Multiply,
        TokenKind::Slash => BinaryOp::Divide,
        TokenKind::Percent => BinaryOp::Modulo,
        TokenKind::EqualEqual => BinaryOp::Equal,
        TokenKind::NotEqual => BinaryOp::NotEqual,
        TokenKind::Less => BinaryOp::Less,
        TokenKind::LessEqual => BinaryOp::LessEqual,
        TokenKind::Greater => BinaryOp::Greater,
        TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
        TokenKind::And => BinaryOp::And,
        TokenKind::Or => BinaryOp::Or,
        _ => return None,
    };
    Some(op)
}

/// Scan and parse an in-memory source. `include` directives are rejected.
pub fn parse_source(name: &str, source: &str) -> Result<Program, CompileError> {
    let tokens = crate::scanner::scan(source).map_err(|e| e.with_source_code(name, source))?;
    Parser::new(tokens).with_source(name, source).parse()
}
