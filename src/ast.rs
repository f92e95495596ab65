use std::fmt;
use std::ops::Deref;

use crate::tokens::Span;
use crate::value::Value;

/// Container for nodes with location info.
///
/// This container fulfills two purposes: it adds location information
/// to nodes, but it also ensures the nodes are heap allocated.  The
/// latter is useful to ensure that enum variants do not cause the enum
/// to become too large.
pub struct Spanned<T> {
    node: Box<T>,
    span: Span,
}

impl<T> Spanned<T> {
    /// Creates a new spanned node.
    pub fn new(node: T, span: Span) -> Spanned<T> {
        Spanned {
            node: Box::new(node),
            span,
        }
    }

    /// Accesses the span.
    pub fn span(&self) -> Span {
        self.span
    }
}

impl<T> Deref for Spanned<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.node
    }
}

impl<T: fmt::Debug> fmt::Debug for Spanned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.node, f)?;
        write!(f, "{:?}", self.span)
    }
}

/// A statement node.
#[derive(Debug)]
pub enum Stmt {
    EmitRaw(Spanned<EmitRaw>),
    EmitExpr(Spanned<EmitExpr>),
    ForLoop(Spanned<ForLoop>),
    IfCond(Spanned<IfCond>),
}

/// Outputs raw template text.
#[derive(Debug)]
pub struct EmitRaw {
    pub raw: String,
}

/// Outputs the result of an expression tag.
#[derive(Debug)]
pub struct EmitExpr {
    pub expr: Expr,
    /// Verbatim inner tag text, kept for error localization.
    pub raw: String,
}

/// A dotted-path lookup with an optional filter chain.
#[derive(Debug)]
pub struct Expr {
    pub path: Vec<String>,
    pub filters: Vec<FilterCall>,
}

/// A single filter invocation with literal arguments.
#[derive(Debug)]
pub struct FilterCall {
    pub name: String,
    pub args: Vec<Value>,
}

/// A for loop.
#[derive(Debug)]
pub struct ForLoop {
    pub target: String,
    pub iter: Vec<String>,
    pub body: Vec<Stmt>,
}

/// An if condition with `else if` branches and an optional else body.
///
/// Branches are kept in source order; rendering picks the first branch
/// whose condition path resolves to a truthy value.
#[derive(Debug)]
pub struct IfCond {
    pub branches: Vec<Branch>,
    pub else_body: Vec<Stmt>,
}

/// A single conditional branch.
#[derive(Debug)]
pub struct Branch {
    pub path: Vec<String>,
    pub body: Vec<Stmt>,
}
