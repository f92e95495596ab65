use std::fmt::Write;

use crate::ast;
use crate::error::{Error, ErrorKind};
use crate::filters;
use crate::value::{Value, ValueMap};

/// Per-iteration loop metadata, exposed inside loop bodies as `loop`.
pub(crate) struct LoopState {
    idx: usize,
    len: usize,
}

impl LoopState {
    fn get_attr(&self, name: &str) -> Option<Value> {
        match name {
            "index0" => Some(Value::from(self.idx)),
            "index" => Some(Value::from(self.idx + 1)),
            "length" => Some(Value::from(self.len)),
            "first" => Some(Value::from(self.idx == 0)),
            "last" => Some(Value::from(self.idx + 1 == self.len)),
            _ => None,
        }
    }

    fn as_value(&self) -> Value {
        let mut map = ValueMap::new();
        for field in ["index", "index0", "length", "first", "last"] {
            if let Some(value) = self.get_attr(field) {
                map.insert(field.to_string(), value);
            }
        }
        Value::from(map)
    }
}

/// A name resolution frame.
///
/// The root scope holds the render context, each loop iteration pushes a
/// child scope binding just the loop variable.  Scopes are chained by
/// parent reference and live on the render call's stack, so the chain is a
/// tree built strictly top-down and torn down on return.
pub(crate) struct Scope<'render> {
    frame: Frame<'render>,
    loop_state: Option<LoopState>,
    parent: Option<&'render Scope<'render>>,
}

enum Frame<'render> {
    Root(&'render Value),
    Loop { name: &'render str, value: Value },
}

impl<'render> Scope<'render> {
    pub fn root(ctx: &'render Value) -> Scope<'render> {
        Scope {
            frame: Frame::Root(ctx),
            loop_state: None,
            parent: None,
        }
    }

    fn lookup(&self, name: &str) -> Option<Value> {
        match self.frame {
            Frame::Root(ctx) => {
                let value = ctx.get_attr(name);
                if value.is_undefined() {
                    None
                } else {
                    Some(value)
                }
            }
            Frame::Loop {
                name: var,
                ref value,
            } => {
                if var == name {
                    Some(value.clone())
                } else {
                    None
                }
            }
        }
    }

    fn frame_value(&self) -> Value {
        match self.frame {
            Frame::Root(ctx) => ctx.clone(),
            Frame::Loop {
                name,
                ref value,
            } => {
                let mut map = ValueMap::new();
                map.insert(name.to_string(), value.clone());
                Value::from(map)
            }
        }
    }
}

fn nearest_loop<'a>(scope: &'a Scope<'a>) -> Option<&'a Scope<'a>> {
    let mut current = Some(scope);
    while let Some(scope) = current {
        if scope.loop_state.is_some() {
            return Some(scope);
        }
        current = scope.parent;
    }
    None
}

/// Resolves a dotted path against the scope chain.
///
/// Missing bindings, intermediates and leaves all resolve to the undefined
/// marker; resolution never fails.
pub(crate) fn resolve(scope: &Scope<'_>, path: &[String]) -> Value {
    let (first, rest) = match path.split_first() {
        Some(parts) => parts,
        None => return Value::UNDEFINED,
    };
    if first == "loop" {
        return resolve_loop(scope, rest);
    }
    let mut current = Some(scope);
    let mut value = loop {
        match current {
            Some(s) => {
                if let Some(value) = s.lookup(first) {
                    break value;
                }
                current = s.parent;
            }
            None => return Value::UNDEFINED,
        }
    };
    for segment in rest {
        value = value.get_attr(segment);
    }
    value
}

/// Resolves the reserved `loop` path against the nearest enclosing loop.
///
/// Each `parent` segment steps from a loop to its enclosing scope;
/// consecutive `parent` segments chain through ancestor loops, after which
/// the remaining segments resolve against that scope as an ordinary path.
fn resolve_loop(scope: &Scope<'_>, rest: &[String]) -> Value {
    let mut loop_scope = match nearest_loop(scope) {
        Some(s) => s,
        None => return Value::UNDEFINED,
    };
    let mut rest = rest;
    while rest.first().map(String::as_str) == Some("parent") {
        rest = &rest[1..];
        let enclosing = match loop_scope.parent {
            Some(p) => p,
            None => return Value::UNDEFINED,
        };
        if rest.first().map(String::as_str) == Some("parent") {
            loop_scope = match nearest_loop(enclosing) {
                Some(s) => s,
                None => return Value::UNDEFINED,
            };
            continue;
        }
        if rest.is_empty() {
            return enclosing.frame_value();
        }
        return resolve(enclosing, rest);
    }
    let state = match loop_scope.loop_state {
        Some(ref state) => state,
        None => return Value::UNDEFINED,
    };
    match rest.split_first() {
        None => state.as_value(),
        Some((field, tail)) => {
            let mut value = state.get_attr(field).unwrap_or(Value::UNDEFINED);
            for segment in tail {
                value = value.get_attr(segment);
            }
            value
        }
    }
}

/// Renders a parsed statement list against a root context value.
pub(crate) fn render(stmts: &[ast::Stmt], ctx: &Value) -> Result<String, Error> {
    let mut out = String::new();
    let root = Scope::root(ctx);
    eval_stmts(stmts, &root, &mut out)?;
    Ok(out)
}

fn eval_stmts(stmts: &[ast::Stmt], scope: &Scope<'_>, out: &mut String) -> Result<(), Error> {
    for stmt in stmts {
        match stmt {
            ast::Stmt::EmitRaw(raw) => out.push_str(&raw.raw),
            ast::Stmt::EmitExpr(emit) => {
                let value = eval_expr(&emit.expr, scope, &emit.raw, emit.span().start_line)?;
                // writing into a String cannot fail
                let _ = write!(out, "{}", value);
            }
            ast::Stmt::IfCond(if_cond) => {
                let mut taken = None;
                for branch in &if_cond.branches {
                    if resolve(scope, &branch.path).is_true() {
                        taken = Some(&branch.body);
                        break;
                    }
                }
                eval_stmts(taken.unwrap_or(&if_cond.else_body), scope, out)?;
            }
            ast::Stmt::ForLoop(for_loop) => {
                let items = resolve(scope, &for_loop.iter).iter_values();
                let len = items.len();
                for (idx, item) in items.into_iter().enumerate() {
                    let child = Scope {
                        frame: Frame::Loop {
                            name: for_loop.target.as_str(),
                            value: item,
                        },
                        loop_state: Some(LoopState { idx, len }),
                        parent: Some(scope),
                    };
                    eval_stmts(&for_loop.body, &child, out)?;
                }
            }
        }
    }
    Ok(())
}

fn eval_expr(expr: &ast::Expr, scope: &Scope<'_>, raw: &str, line: u32) -> Result<Value, Error> {
    let mut value = resolve(scope, &expr.path);
    for call in &expr.filters {
        value = apply_filter(&value, call).ok_or_else(|| {
            // the one mandated diagnostic line, location plus verbatim tag
            eprintln!("Line: {}; Error in {{{{{}}}}}", line, raw);
            let mut err = Error::new(
                ErrorKind::UnknownFilter,
                format!("{}.{} is not a function", expr.path.join("."), call.name),
            );
            err.set_lineno(line as usize);
            err
        })??;
    }
    Ok(value)
}

/// Applies a single filter call, trying the builtin table first and the
/// value's native operations second.  `None` means the name resolved in
/// neither tier.
fn apply_filter(value: &Value, call: &ast::FilterCall) -> Option<Result<Value, Error>> {
    if let Some(func) = filters::builtin(&call.name) {
        return Some(func(value, &call.args));
    }
    if let Some(s) = value.as_str() {
        if let Some(op) = filters::string_op(&call.name) {
            return Some(op(s, &call.args));
        }
    } else if let Some(items) = value.as_seq() {
        if let Some(op) = filters::seq_op(&call.name) {
            return Some(op(items, &call.args));
        }
    }
    None
}
