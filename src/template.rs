use std::fmt;
use std::io;

use serde::Serialize;

use crate::ast;
use crate::error::Error;
use crate::parser::parse;
use crate::renderer;
use crate::value::Value;

/// Represents a compiled template.
///
/// A template is compiled once from source with [`Template::new`] (or the
/// [`compile`](crate::compile) shorthand) and can then be rendered any
/// number of times with different contexts.  Rendering never mutates the
/// template, so a template can be shared freely between threads.
///
/// ```rust
/// # use minitem::{compile, context};
/// let tmpl = compile("Hello {{ name }}!").unwrap();
/// let rv = tmpl.render(context! { name => "World" }).unwrap();
/// assert_eq!(rv, "Hello World!");
/// ```
pub struct Template {
    stmts: Vec<ast::Stmt>,
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("stmts", &self.stmts)
            .finish()
    }
}

impl Template {
    /// Compiles a template from source.
    ///
    /// Malformed or unterminated tags and unmatched block tags are fatal:
    /// the error is returned here and no template is produced.
    pub fn new(source: &str) -> Result<Template, Error> {
        Ok(Template {
            stmts: parse(source)?,
        })
    }

    /// Renders the template with the given context.
    ///
    /// The context can be any serializable value; it typically is a map of
    /// names to values, conveniently built with the
    /// [`context!`](crate::context) macro.  A failing render leaves the
    /// template intact, later calls are unaffected.
    pub fn render<S: Serialize>(&self, ctx: S) -> Result<String, Error> {
        let root = Value::from_serialize(&ctx);
        renderer::render(&self.stmts, &root)
    }

    /// Renders the template into an [`io::Write`].
    ///
    /// The output is rendered into memory first like
    /// [`render`](Self::render) and then written to the stream in a
    /// single call, so nothing reaches the writer on a failing render.
    pub fn render_to_write<S: Serialize, W: io::Write>(
        &self,
        ctx: S,
        mut w: W,
    ) -> Result<(), Error> {
        let rv = self.render(ctx)?;
        w.write_all(rv.as_bytes())
            .map_err(|err| Error::new(crate::ErrorKind::InvalidOperation, err.to_string()))
    }
}
