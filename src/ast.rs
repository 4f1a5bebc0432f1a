//! Abstract syntax tree produced by the [`Parser`](crate::parser::Parser).
//!
//! Two closed sets of variants: [`Expr`] and [`Stmt`]. Nodes are built once and
//! never mutated. Nodes whose binding the resolver computes (variables,
//! assignments, `this`, `super`) carry an [`ExprId`]; the resolution map is
//! keyed by that id, so two structurally equal references stay distinct.

use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::token::{Token, TokenType};

static NEXT_EXPR_ID: AtomicUsize = AtomicUsize::new(0);

/// Identity of a resolvable expression node. Unique within the process, so
/// ids from separately parsed modules never collide in a shared map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(usize);

impl ExprId {
    pub fn fresh() -> Self {
        ExprId(NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    True,
    False,
    Nil,
}

/// Which flavour of assignment an `=`-family token denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Set,
    /// `+=`
    Add,
    /// `-=`
    Sub,
    /// `*=`
    Mul,
    /// `/=`
    Div,
}

impl AssignOp {
    pub fn from_token(token: &Token) -> Option<Self> {
        match token.token_type {
            TokenType::EQUAL => Some(AssignOp::Set),
            TokenType::PLUS_EQUAL => Some(AssignOp::Add),
            TokenType::MINUS_EQUAL => Some(AssignOp::Sub),
            TokenType::STAR_EQUAL => Some(AssignOp::Mul),
            TokenType::SLASH_EQUAL => Some(AssignOp::Div),
            _ => None,
        }
    }

    pub fn is_compound(self) -> bool {
        self != AssignOp::Set
    }

    /// Apply a compound operator to two numbers. `Set` yields `rhs`.
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            AssignOp::Set => rhs,
            AssignOp::Add => lhs + rhs,
            AssignOp::Sub => lhs - rhs,
            AssignOp::Mul => lhs * rhs,
            AssignOp::Div => lhs / rhs,
        }
    }
}

/// **Abstract‑Syntax‑Tree node** for every kind of *expression*.
#[derive(Debug, Clone)]
pub enum Expr {
    Literal(LiteralValue),

    /// Prefix operator: `!ready`, `-42`.
    Unary {
        operator: Token,
        right: Box<Expr>,
    },

    /// Infix arithmetic, comparison or equality operator.
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Short‑circuiting `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    Grouping(Box<Expr>),

    Variable {
        id: ExprId,
        name: Token,
    },

    /// `name = value`, `name += value`, ...
    Assign {
        id: ExprId,
        name: Token,
        /// The `=`-family token, kept for error locations.
        operator: Token,
        op: AssignOp,
        value: Box<Expr>,
    },

    Call {
        callee: Box<Expr>,
        /// The closing `)` token, retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// object.property
    Get {
        object: Box<Expr>,
        name: Token,
    },

    /// object.property = value (or a compound operator)
    Set {
        object: Box<Expr>,
        name: Token,
        operator: Token,
        op: AssignOp,
        value: Box<Expr>,
    },

    This {
        id: ExprId,
        keyword: Token,
    },

    /// `super.method`
    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },

    /// Anonymous function: `fun (a, b) { ... }`.
    Function(Rc<FunctionDecl>),
}

/// Shared by function statements, methods and anonymous functions.
#[derive(Debug)]
pub struct FunctionDecl {
    /// `None` for anonymous functions.
    pub name: Option<Token>,
    /// The `fun` keyword or the method name; used when there is no name.
    pub keyword: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

impl FunctionDecl {
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_ref().map_or("anonymous", |n| n.lexeme.as_str())
    }
}

/// **Abstract‑Syntax‑Tree node** for *statements*. A program is a sequence of
/// these returned by [`Parser::parse`](crate::parser::Parser::parse).
///
/// There is no loop node besides `While`: `for` is desugared by the parser.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// Stand‑alone expression.
    Expression(Expr),

    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt>),

    /// `let name = initializer;`
    Let {
        name: Token,
        initializer: Option<Expr>,
    },

    Function(Rc<FunctionDecl>),

    Class {
        name: Token,
        /// Always an [`Expr::Variable`] when present.
        superclass: Option<Expr>,
        methods: Vec<Rc<FunctionDecl>>,
    },

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    While {
        condition: Expr,
        body: Box<Stmt>,
    },

    Return {
        /// The `return` keyword token (for runtime error locations).
        keyword: Token,
        /// Absent ⇒ `nil` is returned.
        value: Option<Expr>,
    },

    /// `import a.b.c;` binds the module to `c`.
    Import {
        keyword: Token,
        path: Vec<Token>,
    },
}

/// Dotted import path as written, e.g. `std.math`.
pub fn dotted(path: &[Token]) -> String {
    path.iter()
        .map(|t| t.lexeme.as_str())
        .collect::<Vec<_>>()
        .join(".")
}
