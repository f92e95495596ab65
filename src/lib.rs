//! <div align=center>
//!   <strong>minitem: a tiny template engine with minimal dependencies</strong>
//! </div>
//!
//! minitem compiles a text template into a reusable [`Template`] which can
//! then be rendered any number of times with different contexts.  Templates
//! interleave literal text with expression tags and statement tags:
//!
//! ```jinja
//! {% for user in users %}
//!   {{ loop.index }}: {{ user.name | default('anonymous') }}
//! {% endfor %}
//! ```
//!
//! # Example
//!
//! ```
//! use minitem::{compile, context};
//!
//! let tmpl = compile("Hello {{ name }}!").unwrap();
//! println!("{}", tmpl.render(context! { name => "World" }).unwrap());
//! ```
//!
//! # Template Syntax
//!
//! - **Expression tags**: `{{ path }}` or `{{ path | filter | filter(args) }}`
//!   where `path` is a dotted chain of identifiers resolved against the
//!   render context.  Whitespace inside tags is insignificant.  Filter
//!   arguments are numeric or quoted string literals.
//! - **Conditionals**: `{% if path %} ... {% else if path %} ...
//!   {% else %} ... {% endif %}`.  Branches are tried in order, the first
//!   one whose path resolves to a truthy value renders.  Truthy means
//!   anything except `false`, zero, empty strings, empty collections and
//!   missing values.
//! - **Loops**: `{% for name in path %} ... {% endfor %}` iterates
//!   sequences in order and keyed mappings in insertion order.  Inside the
//!   body the reserved `loop` variable exposes `index` (1-based), `index0`,
//!   `length`, `first` and `last`, and `loop.parent` reaches the scope
//!   enclosing the loop.
//!
//! Missing data is never an error: an absent variable or field renders as
//! the literal text `undefined` and can be papered over with the `default`
//! filter.  Unknown filters however abort the render call with an error
//! after writing a single diagnostic line to stderr that points at the
//! offending tag.
//!
//! # Contexts
//!
//! Any [`serde::Serialize`] value can be passed as render context; maps and
//! structs become field-addressable, vectors become iterable.  The
//! [`context!`] macro is a convenient way to build ad-hoc contexts.
#![warn(missing_docs)]

mod ast;
mod error;
mod lexer;
mod parser;
mod renderer;
mod template;
mod tokens;

pub mod filters;
pub mod value;

#[macro_use]
mod macros;

pub use crate::error::{Error, ErrorKind};
pub use crate::macros::__context;
pub use crate::template::Template;
pub use crate::value::Value;

/// Compiles a template from source.
///
/// This is a shorthand for [`Template::new`].  Compilation fails with a
/// [`SyntaxError`](ErrorKind::SyntaxError) if a tag is malformed or
/// unterminated or a block tag is unmatched; in that case no render
/// procedure is produced.
pub fn compile(source: &str) -> Result<Template, Error> {
    Template::new(source)
}
