//! Syntax tree for Lox programs.
//!
//! Both node categories are closed sum types; every consumer (printer,
//! resolver, interpreter) matches on them exhaustively.  Nodes that the
//! resolver binds (`Variable`, `Assign`, `This`, `Super`) carry an
//! [`ExprId`] so resolution results can be keyed by node identity rather
//! than by structure.

use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::token::{LiteralValue, Token};

static NEXT_EXPR_ID: AtomicUsize = AtomicUsize::new(0);

/// Stable identity of a resolvable expression node.
///
/// Ids are unique for the life of the process, so resolution tables built
/// for successive REPL lines never collide inside one interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(usize);

impl ExprId {
    pub fn fresh() -> Self {
        ExprId(NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Parenthesised sub‑expression.
    Grouping(Box<Expr>),

    /// `!x` or `-x`.
    Unary { operator: Token, right: Box<Expr> },

    /// Arithmetic, comparison and equality operators.
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

    Variable { id: ExprId, name: Token },

    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    Call {
        callee: Box<Expr>,
        /// The closing `)`, kept for error locations.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// object.property
    Get { object: Box<Expr>, name: Token },

    /// object.property = value
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    This { id: ExprId, keyword: Token },

    /// super.method
    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },
}

impl Expr {
    /// Best source line for diagnostics about this expression.
    pub fn line(&self) -> usize {
        match self {
            Expr::Literal(_) => 0,
            Expr::Grouping(inner) => inner.line(),
            Expr::Unary { operator, .. }
            | Expr::Binary { operator, .. }
            | Expr::Logical { operator, .. } => operator.line,
            Expr::Variable { name, .. } | Expr::Assign { name, .. } => name.line,
            Expr::Call { paren, .. } => paren.line,
            Expr::Get { name, .. } | Expr::Set { name, .. } => name.line,
            Expr::This { keyword, .. } | Expr::Super { keyword, .. } => keyword.line,
        }
    }
}

/// A function or method declaration.  Shared (`Rc`) between the tree and
/// every closure created from it.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: Token,

    /// Always an `Expr::Variable` when present.
    pub superclass: Option<Expr>,

    pub methods: Vec<Rc<FunctionDecl>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expression(Expr),

    Print(Expr),

    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// Also the target of `for` desugaring.
    While { condition: Expr, body: Box<Stmt> },

    Function(Rc<FunctionDecl>),

    Return {
        keyword: Token,
        value: Option<Expr>,
    },

    Class(ClassDecl),
}
