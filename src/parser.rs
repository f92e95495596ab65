use crate::ast::{self, Spanned};
use crate::error::{Error, ErrorKind};
use crate::lexer::tokenize;
use crate::tokens::{Span, Token};
use crate::value::Value;

const RESERVED_NAMES: [&str; 1] = ["loop"];

macro_rules! syntax_error {
    ($msg:expr) => {{
        return Err(Error::new(ErrorKind::SyntaxError, $msg));
    }};
    ($msg:expr, $($tt:tt)*) => {{
        return Err(Error::new(ErrorKind::SyntaxError, format!($msg, $($tt)*)));
    }};
}

macro_rules! expect_token {
    ($parser:expr, $expectation:expr) => {{
        match $parser.stream.next()? {
            Some(rv) => Ok(rv),
            None => Err(Error::new(
                ErrorKind::SyntaxError,
                format!("unexpected end of input, expected {}", $expectation),
            )),
        }
    }};
    ($parser:expr, $match:pat, $expectation:expr) => {{
        match $parser.stream.next()? {
            Some((token, span)) if matches!(token, $match) => Ok((token, span)),
            Some((token, _)) => Err(Error::new(
                ErrorKind::SyntaxError,
                format!("unexpected {}, expected {}", token, $expectation),
            )),
            None => Err(Error::new(
                ErrorKind::SyntaxError,
                format!("unexpected end of input, expected {}", $expectation),
            )),
        }
    }};
    ($parser:expr, $match:pat => $target:expr, $expectation:expr) => {{
        match $parser.stream.next()? {
            Some(($match, span)) => Ok(($target, span)),
            Some((token, _)) => Err(Error::new(
                ErrorKind::SyntaxError,
                format!("unexpected {}, expected {}", token, $expectation),
            )),
            None => Err(Error::new(
                ErrorKind::SyntaxError,
                format!("unexpected end of input, expected {}", $expectation),
            )),
        }
    }};
}

struct TokenStream<'a> {
    iter: Box<dyn Iterator<Item = Result<(Token<'a>, Span), Error>> + 'a>,
    current: Option<Result<(Token<'a>, Span), Error>>,
    current_span: Span,
}

impl<'a> TokenStream<'a> {
    /// Tokenize a template.
    pub fn new(source: &'a str) -> TokenStream<'a> {
        TokenStream {
            iter: Box::new(tokenize(source)) as Box<dyn Iterator<Item = _>>,
            current: None,
            current_span: Span::default(),
        }
    }

    /// Advance the stream.
    pub fn next(&mut self) -> Result<Option<(Token<'a>, Span)>, Error> {
        let rv = self.current.take();
        self.current = self.iter.next();
        if let Some(Ok((_, span))) = rv {
            self.current_span = span;
        }
        rv.transpose()
    }

    /// Look at the current token.
    pub fn current(&mut self) -> Result<Option<(&Token<'a>, Span)>, Error> {
        if self.current.is_none() {
            self.current = self.iter.next();
        }
        match self.current {
            Some(Ok(ref tok)) => Ok(Some((&tok.0, tok.1))),
            Some(Err(_)) => Err(self.current.take().unwrap().unwrap_err()),
            None => Ok(None),
        }
    }

    /// Expands the span to the last seen token.
    pub fn expand_span(&self, mut span: Span) -> Span {
        span.end_line = self.current_span.end_line;
        span.end_col = self.current_span.end_col;
        span.end_offset = self.current_span.end_offset;
        span
    }

    /// Returns the last seen span.
    pub fn current_span(&self) -> Span {
        self.current_span
    }
}

struct Parser<'a> {
    stream: TokenStream<'a>,
    source: &'a str,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Parser<'a> {
        Parser {
            stream: TokenStream::new(source),
            source,
        }
    }

    fn parse_path(&mut self) -> Result<Vec<String>, Error> {
        let (first, _) = expect_token!(self, Token::Ident(name) => name, "identifier")?;
        let mut segments = vec![first.to_string()];
        while matches!(self.stream.current()?, Some((Token::Dot, _))) {
            self.stream.next()?;
            let (seg, _) = expect_token!(self, Token::Ident(name) => name, "identifier")?;
            segments.push(seg.to_string());
        }
        Ok(segments)
    }

    fn parse_expr(&mut self) -> Result<ast::Expr, Error> {
        let path = self.parse_path()?;
        let mut filters = Vec::new();
        while matches!(self.stream.current()?, Some((Token::Pipe, _))) {
            self.stream.next()?;
            let (name, _) = expect_token!(self, Token::Ident(name) => name, "identifier")?;
            let args = if matches!(self.stream.current()?, Some((Token::ParenOpen, _))) {
                self.parse_args()?
            } else {
                Vec::new()
            };
            filters.push(ast::FilterCall {
                name: name.to_string(),
                args,
            });
        }
        Ok(ast::Expr { path, filters })
    }

    fn parse_args(&mut self) -> Result<Vec<Value>, Error> {
        let mut args = Vec::new();
        expect_token!(self, Token::ParenOpen, "`(`")?;
        loop {
            if matches!(self.stream.current()?, Some((Token::ParenClose, _))) {
                break;
            }
            if !args.is_empty() {
                expect_token!(self, Token::Comma, "`,`")?;
            }
            let (token, _) = expect_token!(self, "literal argument")?;
            args.push(match token {
                Token::Str(val) => Value::from(val),
                Token::Int(val) => Value::from(val),
                Token::Float(val) => Value::from(val),
                token => syntax_error!("unexpected {}, expected literal argument", token),
            });
        }
        expect_token!(self, Token::ParenClose, "`)`")?;
        Ok(args)
    }

    fn parse_stmt(&mut self) -> Result<ast::Stmt, Error> {
        let (token, span) = expect_token!(self, "block keyword")?;
        match token {
            Token::Ident("for") => Ok(ast::Stmt::ForLoop(Spanned::new(
                self.parse_for_stmt()?,
                self.stream.expand_span(span),
            ))),
            Token::Ident("if") => Ok(ast::Stmt::IfCond(Spanned::new(
                self.parse_if_cond()?,
                self.stream.expand_span(span),
            ))),
            Token::Ident(name @ ("else" | "endif" | "endfor")) => {
                syntax_error!("unexpected {} with no open block", name)
            }
            Token::Ident(name) => syntax_error!("unknown statement {}", name),
            token => syntax_error!("unexpected {}, expected statement", token),
        }
    }

    fn parse_for_stmt(&mut self) -> Result<ast::ForLoop, Error> {
        let (target, _) = expect_token!(self, Token::Ident(name) => name, "identifier")?;
        if RESERVED_NAMES.contains(&target) {
            syntax_error!("cannot assign to reserved variable name {}", target);
        }
        expect_token!(self, Token::Ident("in"), "in")?;
        let iter = self.parse_path()?;
        expect_token!(self, Token::BlockEnd, "end of block")?;
        let body = self.subparse(&|tok| matches!(tok, Token::Ident("endfor")))?;
        expect_token!(self, Token::Ident("endfor"), "endfor")?;
        Ok(ast::ForLoop {
            target: target.to_string(),
            iter,
            body,
        })
    }

    fn parse_if_cond(&mut self) -> Result<ast::IfCond, Error> {
        let mut branches = Vec::new();
        let mut else_body = Vec::new();
        loop {
            let path = self.parse_path()?;
            expect_token!(self, Token::BlockEnd, "end of block")?;
            let body = self
                .subparse(&|tok| matches!(tok, Token::Ident("endif") | Token::Ident("else")))?;
            branches.push(ast::Branch { path, body });
            let (name, _) =
                expect_token!(self, Token::Ident(name) => name, "`else` or `endif`")?;
            if name == "endif" {
                break;
            }
            // `else if` opens the next branch, a bare `else` the final body
            if matches!(self.stream.current()?, Some((Token::Ident("if"), _))) {
                self.stream.next()?;
                continue;
            }
            expect_token!(self, Token::BlockEnd, "end of block")?;
            else_body = self.subparse(&|tok| matches!(tok, Token::Ident("endif")))?;
            expect_token!(self, Token::Ident("endif"), "endif")?;
            break;
        }
        Ok(ast::IfCond {
            branches,
            else_body,
        })
    }

    fn subparse(&mut self, end_check: &dyn Fn(&Token) -> bool) -> Result<Vec<ast::Stmt>, Error> {
        let mut rv = Vec::new();
        while let Some((token, span)) = self.stream.next()? {
            match token {
                Token::TemplateData(raw) => rv.push(ast::Stmt::EmitRaw(Spanned::new(
                    ast::EmitRaw {
                        raw: raw.to_string(),
                    },
                    span,
                ))),
                Token::VariableStart => {
                    let expr = self.parse_expr()?;
                    let (_, end_span) =
                        expect_token!(self, Token::VariableEnd, "end of variable tag")?;
                    let raw = self.source[span.end_offset as usize..end_span.start_offset as usize]
                        .to_string();
                    rv.push(ast::Stmt::EmitExpr(Spanned::new(
                        ast::EmitExpr { expr, raw },
                        self.stream.expand_span(span),
                    )));
                }
                Token::BlockStart => {
                    let (tok, _span) = match self.stream.current()? {
                        Some(rv) => rv,
                        None => syntax_error!("unexpected end of input, expected keyword"),
                    };
                    if end_check(tok) {
                        return Ok(rv);
                    }
                    rv.push(self.parse_stmt()?);
                    expect_token!(self, Token::BlockEnd, "end of block")?;
                }
                _ => unreachable!("lexer produced garbage"),
            }
        }
        Ok(rv)
    }

    pub fn parse(&mut self) -> Result<Vec<ast::Stmt>, Error> {
        self.subparse(&|_| false)
    }
}

/// Parses a template into its statement list.
pub fn parse(source: &str) -> Result<Vec<ast::Stmt>, Error> {
    let mut parser = Parser::new(source);
    parser.parse().map_err(|mut err| {
        if err.line().is_none() {
            err.set_lineno(parser.stream.current_span().start_line as usize);
        }
        err
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literal_only() {
        let stmts = parse("just some text").unwrap();
        assert_eq!(stmts.len(), 1);
        assert!(matches!(&stmts[0], ast::Stmt::EmitRaw(raw) if raw.raw == "just some text"));
    }

    #[test]
    fn test_parse_expression() {
        let stmts = parse("{{ person.name | default('n/a') }}").unwrap();
        match &stmts[0] {
            ast::Stmt::EmitExpr(emit) => {
                assert_eq!(emit.expr.path, vec!["person", "name"]);
                assert_eq!(emit.expr.filters.len(), 1);
                assert_eq!(emit.expr.filters[0].name, "default");
                assert_eq!(emit.raw, " person.name | default('n/a') ");
            }
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn test_parse_nested_blocks() {
        let stmts =
            parse("{% for a in xs %}{% if a %}{{ a }}{% endif %}{% endfor %}").unwrap();
        match &stmts[0] {
            ast::Stmt::ForLoop(for_loop) => {
                assert_eq!(for_loop.target, "a");
                assert_eq!(for_loop.iter, vec!["xs"]);
                assert!(matches!(&for_loop.body[0], ast::Stmt::IfCond(_)));
            }
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn test_parse_else_if_chain() {
        let stmts =
            parse("{% if a %}1{% else if b %}2{% else if c %}3{% else %}4{% endif %}").unwrap();
        match &stmts[0] {
            ast::Stmt::IfCond(if_cond) => {
                assert_eq!(if_cond.branches.len(), 3);
                assert_eq!(if_cond.branches[1].path, vec!["b"]);
                assert_eq!(if_cond.else_body.len(), 1);
            }
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn test_missing_endfor() {
        let err = parse("{% for a in xs %}body").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SyntaxError);
        assert_eq!(
            err.to_string(),
            "unexpected end of input, expected endfor"
        );
    }

    #[test]
    fn test_missing_endif() {
        let err = parse("{% if a %}body").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SyntaxError);
    }

    #[test]
    fn test_stray_end_tag() {
        let err = parse("text {% endif %}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SyntaxError);
        assert_eq!(err.to_string(), "unexpected endif with no open block");
    }

    #[test]
    fn test_unterminated_tag() {
        assert!(parse("hello {{ who").is_err());
        assert!(parse("hello {% if x").is_err());
    }

    #[test]
    fn test_loop_is_reserved() {
        let err = parse("{% for loop in xs %}{% endfor %}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SyntaxError);
    }

    #[test]
    fn test_non_literal_filter_arg() {
        let err = parse("{{ a | default(b) }}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SyntaxError);
    }
}
