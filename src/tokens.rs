use std::fmt;

/// Represents a token in the stream.
#[derive(Debug)]
pub enum Token<'a> {
    /// Raw template data.
    TemplateData(&'a str),
    /// Variable tag start (`{{`).
    VariableStart,
    /// Variable tag end (`}}`).
    VariableEnd,
    /// Statement tag start (`{%`).
    BlockStart,
    /// Statement tag end (`%}`).
    BlockEnd,
    /// An identifier.
    Ident(&'a str),
    /// A quoted string literal.
    Str(&'a str),
    /// An integer literal.
    Int(i64),
    /// A float literal.
    Float(f64),
    /// A dot operator (`.`).
    Dot,
    /// The comma operator (`,`).
    Comma,
    /// The pipe symbol (`|`).
    Pipe,
    /// Open parenthesis.
    ParenOpen,
    /// Close parenthesis.
    ParenClose,
}

impl<'a> fmt::Display for Token<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::TemplateData(_) => f.write_str("template-data"),
            Token::VariableStart => f.write_str("start of variable tag"),
            Token::VariableEnd => f.write_str("end of variable tag"),
            Token::BlockStart => f.write_str("start of block tag"),
            Token::BlockEnd => f.write_str("end of block tag"),
            Token::Ident(_) => f.write_str("identifier"),
            Token::Str(_) => f.write_str("string"),
            Token::Int(_) => f.write_str("integer"),
            Token::Float(_) => f.write_str("float"),
            Token::Dot => f.write_str("`.`"),
            Token::Comma => f.write_str("`,`"),
            Token::Pipe => f.write_str("`|`"),
            Token::ParenOpen => f.write_str("`(`"),
            Token::ParenClose => f.write_str("`)`"),
        }
    }
}

/// Token span information.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub start_line: u32,
    pub start_col: u32,
    pub start_offset: u32,
    pub end_line: u32,
    pub end_col: u32,
    pub end_offset: u32,
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            " @ {}:{}-{}:{}",
            self.start_line, self.start_col, self.end_line, self.end_col
        )
    }
}
