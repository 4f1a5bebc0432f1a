/*!
Recursive‑descent parser for Nyx.

### Time & Space

Each token is consumed once via `advance()`; error recovery (`synchronize`)
only discards tokens up to the next statement boundary, so parsing is Θ(n) in
the token count. Call‑stack depth grows with syntactic nesting.

### Error recovery

Productions return `Result<_>`. A failing declaration does not abort the
parse: the innermost enclosing body (program, block or class) records the
error, calls [`Parser::synchronize`] to skip to the next `;`, statement
keyword or closing `}` of that body and carries on, so one genuine mistake
yields one diagnostic and the rest of the file still gets an AST.

### Logging Policy

| Location                     | Level  | Purpose                                   |
|------------------------------|--------|-------------------------------------------|
| `Parser::new`, `parse`       | `info` | Lifecycle milestones.                     |
| `declaration`                | `debug`| High‑level descent into grammar branches. |

--------------------------------------------------------------------------------
Grammar (EBNF)
--------------

```text
program      → declaration* EOF ;
declaration  → classDecl | funDecl | letDecl | statement ;
classDecl    → "class" IDENT ( "(" IDENT ")" )? "{" function* "}" ;
funDecl      → "fun" function ;
function     → IDENT "(" parameters? ")" block ;
letDecl      → "let" IDENT ( "=" expression )? ";"? ;
statement    → block | ifStmt | importStmt | whileStmt | forStmt
             | returnStmt | exprStmt ;
importStmt   → "import" IDENT ( "." IDENT )* ";"? ;
returnStmt   → "return" expression? ";"? ;
exprStmt     → expression ";"? ;
expression   → assignment ;
assignment   → ( call "." )? IDENT ( "=" | "+=" | "-=" | "*=" | "/=" ) assignment
             | logic_or ;
logic_or     → logic_and ( "or" logic_and )* ;
logic_and    → equality ( "and" equality )* ;
equality     → comparison ( ( "!=" | "==" ) comparison )* ;
comparison   → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
term         → factor ( ( "-" | "+" ) factor )* ;
factor       → unary ( ( "/" | "*" ) unary )* ;
unary        → ( "!" | "-" ) unary | call ;
call         → primary ( "(" arguments? ")" | "." IDENT )* ;
primary      → NUMBER | STRING | "true" | "false" | "nil" | "this"
             | "super" "." IDENT | IDENT | "(" expression ")"
             | "fun" "(" parameters? ")" block ;
```

Semicolons after simple statements are accepted but not required.
*/

use std::rc::Rc;

use log::{debug, info};

use crate::ast::{AssignOp, Expr, ExprId, FunctionDecl, LiteralValue, Stmt};
use crate::error::{NyxError, Result};
use crate::token::{Token, TokenType};

/// Upper bound on parameters per function and arguments per call.
pub const MAX_ARITY: usize = 127;

/// Top‑level parser over an immutable slice of tokens ending in `EOF`.
pub struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
    /// Number of `{ ... }` bodies currently open.
    depth: usize,
    errors: Vec<NyxError>,
}

impl<'a> Parser<'a> {
    /// `tokens` must end with an `EOF` token, as [`Scanner::scan_all`]
    /// guarantees. Parsing a slice without one panics.
    ///
    /// [`Scanner::scan_all`]: crate::scanner::Scanner::scan_all
    pub fn new(tokens: &'a [Token]) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        Self {
            tokens,
            current: 0,
            depth: 0,
            errors: Vec::new(),
        }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program. Returns every statement that parsed and every
    /// error encountered; a non-empty error list means the program must not
    /// run.
    pub fn parse(mut self) -> (Vec<Stmt>, Vec<NyxError>) {
        info!("Beginning parse phase");

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.recovering_declaration() {
                statements.push(stmt);
            }
        }

        info!(
            "Parsed {} statement(s) with {} error(s)",
            statements.len(),
            self.errors.len()
        );

        (statements, self.errors)
    }

    /// Parse a single expression followed by `EOF`.
    pub fn parse_expression(mut self) -> Result<Expr> {
        let expr = self.expression()?;

        if !self.is_at_end() {
            return Err(NyxError::parse(self.peek(), "Expected end of expression."));
        }

        Ok(expr)
    }

    // ──────────────────────── declaration rules ───────────────────

    /// A declaration, or `None` after recording its error and skipping to
    /// the next statement boundary.
    fn recovering_declaration(&mut self) -> Option<Stmt> {
        match self.declaration() {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                self.recover(e);
                None
            }
        }
    }

    fn recover(&mut self, error: NyxError) {
        debug!("Recovering from parse error: {}", error);

        self.errors.push(error);
        self.synchronize();
    }

    fn declaration(&mut self) -> Result<Stmt> {
        debug!("Entering declaration at {:?}", self.peek().token_type);

        if self.matches(TokenType::CLASS) {
            self.class_declaration()
        } else if self.check(TokenType::FUN) && self.check_next(TokenType::IDENTIFIER) {
            self.advance();
            Ok(Stmt::Function(self.function()?))
        } else if self.matches(TokenType::LET) {
            self.let_declaration()
        } else {
            self.statement()
        }
    }

    fn class_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expected class name.")?;

        let superclass: Option<Expr> = if self.matches(TokenType::LEFT_PAREN) {
            let parent = self.consume(TokenType::IDENTIFIER, "Expected superclass name.")?;
            self.consume(TokenType::RIGHT_PAREN, "Expected ')' after superclass.")?;

            Some(Expr::Variable {
                id: ExprId::fresh(),
                name: parent,
            })
        } else {
            None
        };

        self.consume(TokenType::LEFT_BRACE, "Expected '{' before class body.")?;

        let mut methods: Vec<Rc<FunctionDecl>> = Vec::new();

        self.depth += 1;
        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            match self.function() {
                Ok(method) => methods.push(method),
                Err(e) => self.recover(e),
            }
        }
        self.depth -= 1;

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after class body.")?;

        Ok(Stmt::Class {
            name,
            superclass,
            methods,
        })
    }

    /// `IDENT "(" parameters? ")" block`, shared by functions and methods.
    fn function(&mut self) -> Result<Rc<FunctionDecl>> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expected function name.")?;
        let keyword = name.clone();

        self.consume(TokenType::LEFT_PAREN, "Expected '(' after function name.")?;
        let (params, body) = self.function_tail()?;

        Ok(Rc::new(FunctionDecl {
            name: Some(name),
            keyword,
            params,
            body,
        }))
    }

    /// Parameters, `)` and body. The opening `(` is already consumed.
    fn function_tail(&mut self) -> Result<(Vec<Token>, Vec<Stmt>)> {
        let mut params: Vec<Token> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARITY {
                    return Err(NyxError::parse(
                        self.peek(),
                        format!("Can't have more than {} parameters.", MAX_ARITY),
                    ));
                }

                params.push(self.consume(TokenType::IDENTIFIER, "Expected parameter name.")?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after parameters.")?;
        self.consume(TokenType::LEFT_BRACE, "Expected '{' before function body.")?;

        let body: Vec<Stmt> = self.block()?;

        Ok((params, body))
    }

    fn let_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expected variable name.")?;

        let initializer: Option<Expr> = if self.matches(TokenType::EQUAL) {
            Some(self.expression()?)
        } else {
            None
        };

        self.matches(TokenType::SEMICOLON);

        Ok(Stmt::Let { name, initializer })
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> Result<Stmt> {
        if self.matches(TokenType::LEFT_BRACE) {
            Ok(Stmt::Block(self.block()?))
        } else if self.matches(TokenType::IF) {
            self.if_statement()
        } else if self.matches(TokenType::IMPORT) {
            self.import_statement()
        } else if self.matches(TokenType::WHILE) {
            self.while_statement()
        } else if self.matches(TokenType::FOR) {
            self.for_statement()
        } else if self.matches(TokenType::RETURN) {
            self.return_statement()
        } else {
            self.expression_statement()
        }
    }

    /// `for (init; cond; incr) body` becomes
    /// `{ init; while (cond) { body; incr; } }`.
    fn for_statement(&mut self) -> Result<Stmt> {
        let keyword = self.previous().clone();

        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'for'.")?;

        let initializer: Option<Stmt> = if self.matches(TokenType::SEMICOLON) {
            None
        } else if self.matches(TokenType::LET) {
            Some(self.let_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition: Expr = if !self.check(TokenType::SEMICOLON) {
            self.expression()?
        } else {
            Expr::Literal(LiteralValue::True)
        };
        self.consume(TokenType::SEMICOLON, "Expected ';' after loop condition.")?;

        let increment: Option<Expr> = if !self.check(TokenType::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after for clauses.")?;

        let mut body: Stmt = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        body = Stmt::While {
            condition,
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        debug!("Desugared 'for' on line {} into while", keyword.line);

        Ok(body)
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr: Expr = self.expression()?;
        self.matches(TokenType::SEMICOLON);
        Ok(Stmt::Expression(expr))
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'if'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after if condition.")?;

        let then_branch: Box<Stmt> = Box::new(self.statement()?);
        let else_branch: Option<Box<Stmt>> = if self.matches(TokenType::ELSE) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn import_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();
        let mut path: Vec<Token> = Vec::new();

        loop {
            path.push(self.consume(TokenType::IDENTIFIER, "Expected module name.")?);

            if !self.matches(TokenType::DOT) {
                break;
            }
        }

        self.matches(TokenType::SEMICOLON);

        Ok(Stmt::Import { keyword, path })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'while'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after condition.")?;
        let body: Box<Stmt> = Box::new(self.statement()?);

        Ok(Stmt::While { condition, body })
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();
        let value: Option<Expr> =
            if self.check(TokenType::SEMICOLON) || self.check(TokenType::RIGHT_BRACE) {
                None
            } else {
                Some(self.expression()?)
            };

        self.matches(TokenType::SEMICOLON);

        Ok(Stmt::Return { keyword, value })
    }

    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        self.depth += 1;
        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.recovering_declaration() {
                statements.push(stmt);
            }
        }
        self.depth -= 1;

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after block.")?;
        Ok(statements)
    }

    // ─────────────────────── expression rules ─────────────────────

    fn expression(&mut self) -> Result<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr: Expr = self.logical_or()?;

        let Some(op) = AssignOp::from_token(self.peek()) else {
            return Ok(expr);
        };

        let operator: Token = self.advance().clone();
        let value: Expr = self.assignment()?;

        match expr {
            Expr::Variable { name, .. } => Ok(Expr::Assign {
                id: ExprId::fresh(),
                name,
                operator,
                op,
                value: Box::new(value),
            }),

            Expr::Get { object, name } => Ok(Expr::Set {
                object,
                name,
                operator,
                op,
                value: Box::new(value),
            }),

            _ => Err(NyxError::parse(&operator, "Invalid assignment target.")),
        }
    }

    fn logical_or(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.logical_and()?;

        while self.matches(TokenType::OR) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.logical_and()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.equality()?;

        while self.matches(TokenType::AND) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.equality()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// One left-associative binary precedence level.
    fn binary_level(
        &mut self,
        operators: &[TokenType],
        next: fn(&mut Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let mut expr: Expr = next(self)?;

        while operators.iter().any(|op| self.check(op.clone())) {
            let operator: Token = self.advance().clone();
            let right: Expr = next(self)?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr> {
        self.binary_level(
            &[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> Result<Expr> {
        self.binary_level(
            &[
                TokenType::GREATER,
                TokenType::GREATER_EQUAL,
                TokenType::LESS,
                TokenType::LESS_EQUAL,
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> Result<Expr> {
        self.binary_level(&[TokenType::MINUS, TokenType::PLUS], Self::factor)
    }

    fn factor(&mut self) -> Result<Expr> {
        self.binary_level(&[TokenType::STAR, TokenType::SLASH], Self::unary)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.matches(TokenType::BANG) || self.matches(TokenType::MINUS) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.unary()?;
            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.primary()?;

        loop {
            if self.matches(TokenType::LEFT_PAREN) {
                expr = self.finish_call(expr)?;
            } else if self.matches(TokenType::DOT) {
                let name: Token =
                    self.consume(TokenType::IDENTIFIER, "Expected property name after '.'.")?;

                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_ARITY {
                    return Err(NyxError::parse(
                        self.peek(),
                        format!("Can't have more than {} arguments.", MAX_ARITY),
                    ));
                }

                arguments.push(self.expression()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        let paren: Token = self.consume(TokenType::RIGHT_PAREN, "Expected ')' after arguments.")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        let token: Token = self.peek().clone();

        let expr = match &token.token_type {
            TokenType::FALSE => Expr::Literal(LiteralValue::False),
            TokenType::TRUE => Expr::Literal(LiteralValue::True),
            TokenType::NIL => Expr::Literal(LiteralValue::Nil),
            TokenType::NUMBER(n) => Expr::Literal(LiteralValue::Number(*n)),
            TokenType::STRING(s) => Expr::Literal(LiteralValue::Str(s.clone())),

            TokenType::THIS => Expr::This {
                id: ExprId::fresh(),
                keyword: token.clone(),
            },

            TokenType::SUPER => {
                self.advance();
                self.consume(TokenType::DOT, "Expected '.' after 'super'.")?;
                let method =
                    self.consume(TokenType::IDENTIFIER, "Expected superclass method name.")?;

                return Ok(Expr::Super {
                    id: ExprId::fresh(),
                    keyword: token.clone(),
                    method,
                });
            }

            TokenType::IDENTIFIER => Expr::Variable {
                id: ExprId::fresh(),
                name: token.clone(),
            },

            TokenType::LEFT_PAREN => {
                self.advance();
                let expr: Expr = self.expression()?;
                self.consume(TokenType::RIGHT_PAREN, "Expected ')' after expression.")?;

                return Ok(Expr::Grouping(Box::new(expr)));
            }

            TokenType::FUN => {
                self.advance();
                self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'fun'.")?;
                let (params, body) = self.function_tail()?;

                return Ok(Expr::Function(Rc::new(FunctionDecl {
                    name: None,
                    keyword: token.clone(),
                    params,
                    body,
                })));
            }

            _ => return Err(NyxError::parse(&token, "Expected expression.")),
        };

        self.advance();

        Ok(expr)
    }

    // ────────────────────── utility helpers ───────────────────────

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<Token> {
        if self.check(ttype) {
            return Ok(self.advance().clone());
        }

        debug!("consume failed at {:?}: {}", self.peek().token_type, message);

        Err(NyxError::parse(self.peek(), message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    #[inline(always)]
    fn check_next(&self, ttype: TokenType) -> bool {
        self.tokens
            .get(self.current + 1)
            .is_some_and(|t| t.token_type == ttype)
    }

    #[inline(always)]
    fn advance(&mut self) -> &'a Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::EOF)
    }

    #[inline(always)]
    fn peek(&self) -> &'a Token {
        &self.tokens[self.current]
    }

    #[inline(always)]
    fn previous(&self) -> &'a Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    /// Discards tokens until it thinks it is at a statement boundary. Inside
    /// a body the closing `}` is left for the body to consume.
    pub fn synchronize(&mut self) {
        let nested = self.depth > 0;

        // skip the token that caused the error
        if !(nested && self.check(TokenType::RIGHT_BRACE)) {
            self.advance();
        }

        while !self.is_at_end() {
            if matches!(self.previous().token_type, TokenType::SEMICOLON) {
                return;
            }

            if nested && self.check(TokenType::RIGHT_BRACE) {
                return;
            }

            match self.peek().token_type {
                TokenType::CLASS
                | TokenType::FUN
                | TokenType::LET
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::RETURN
                | TokenType::IMPORT => return,
                _ => {}
            }

            self.advance();
        }
    }
}
