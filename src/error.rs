use std::borrow::Cow;
use std::fmt;

/// Represents template errors.
///
/// Errors carry a [`kind`](Self::kind) classifying the failure and, where
/// known, the 1-based template line the failure originated from.
///
/// # Example
///
/// Here is an example of how you might want to render errors:
///
/// ```rust
/// # let template = minitem::compile("").unwrap(); let ctx = ();
/// match template.render(ctx) {
///     Ok(result) => println!("{}", result),
///     Err(err) => eprintln!("could not render template: {}", err),
/// }
/// ```
pub struct Error {
    kind: ErrorKind,
    detail: Option<Cow<'static, str>>,
    lineno: usize,
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("detail", &self.detail)
            .field("lineno", &self.lineno)
            .finish()
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind()
    }
}

impl Eq for Error {}

/// An enum describing the error kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The template has a syntax error (malformed tag, unmatched block).
    SyntaxError,
    /// A filter is unknown to both the builtin table and the value's type.
    UnknownFilter,
    /// A filter was called with invalid arguments.
    InvalidArguments,
    /// An operation is not possible on the given value.
    InvalidOperation,
    /// A context value could not be serialized to the internal format.
    BadSerialization,
}

impl ErrorKind {
    fn description(self) -> &'static str {
        match self {
            ErrorKind::SyntaxError => "syntax error",
            ErrorKind::UnknownFilter => "unknown filter",
            ErrorKind::InvalidArguments => "invalid arguments",
            ErrorKind::InvalidOperation => "invalid operation",
            ErrorKind::BadSerialization => "could not serialize to internal format",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref detail) = self.detail {
            write!(f, "{}", detail)?;
        } else {
            write!(f, "{}", self.kind)?;
        }
        if f.alternate() {
            if let Some(line) = self.line() {
                write!(f, " (line {})", line)?;
            }
        }
        Ok(())
    }
}

impl Error {
    /// Creates a new error with kind and detail.
    pub fn new<D: Into<Cow<'static, str>>>(kind: ErrorKind, detail: D) -> Error {
        Error {
            kind,
            detail: Some(detail.into()),
            lineno: 0,
        }
    }

    pub(crate) fn set_lineno(&mut self, lineno: usize) {
        self.lineno = lineno;
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the 1-based template line the error originated from, if known.
    pub fn line(&self) -> Option<usize> {
        if self.lineno > 0 {
            Some(self.lineno)
        } else {
            None
        }
    }
}

impl std::error::Error for Error {}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error {
            kind,
            detail: None,
            lineno: 0,
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: fmt::Display,
    {
        Error::new(ErrorKind::BadSerialization, msg.to_string())
    }
}
