use crate::error::{Error, ErrorKind};
use crate::tokens::{Span, Token};

enum LexerState {
    Template,
    InVariable,
    InBlock,
}

fn find_marker(a: &str) -> Option<usize> {
    let bytes = a.as_bytes();
    let mut offset = 0;
    loop {
        let idx = bytes[offset..].iter().position(|&x| x == b'{')?;
        if let Some(b'{') | Some(b'%') = bytes.get(offset + idx + 1).copied() {
            return Some(offset + idx);
        }
        offset += idx + 1;
    }
}

/// Tokenizes the source.
pub fn tokenize(input: &str) -> impl Iterator<Item = Result<(Token<'_>, Span), Error>> {
    let mut rest = input;
    let mut state = LexerState::Template;
    let mut failed = false;
    let mut current_line: u32 = 1;
    let mut current_col: u32 = 0;
    let mut current_offset: u32 = 0;

    macro_rules! syntax_error {
        ($msg:expr) => {{
            failed = true;
            return Some(Err(Error::new(ErrorKind::SyntaxError, $msg)));
        }};
    }

    macro_rules! span {
        ($start:expr) => {{
            let (start_line, start_col, start_offset) = $start;
            Span {
                start_line,
                start_col,
                start_offset,
                end_line: current_line,
                end_col: current_col,
                end_offset: current_offset,
            }
        }};
    }

    macro_rules! loc {
        () => {
            (current_line, current_col, current_offset)
        };
    }

    macro_rules! advance {
        ($bytes:expr) => {{
            let (skipped, new_rest) = rest.split_at($bytes);
            for c in skipped.chars() {
                match c {
                    '\n' => {
                        current_line += 1;
                        current_col = 0;
                    }
                    _ => current_col += 1,
                }
            }
            current_offset += skipped.len() as u32;
            rest = new_rest;
            skipped
        }};
    }

    macro_rules! eat_string {
        ($delim:expr) => {{
            let old_loc = loc!();
            let str_len = rest
                .as_bytes()
                .iter()
                .skip(1)
                .take_while(|&&c| c != $delim && c != b'\r' && c != b'\n')
                .count();
            if rest.as_bytes().get(str_len + 1) != Some(&$delim) {
                syntax_error!("unexpected end of string");
            }
            let s = advance!(str_len + 2);
            return Some(Ok((Token::Str(&s[1..s.len() - 1]), span!(old_loc))));
        }};
    }

    macro_rules! eat_number {
        ($neg:expr) => {{
            let old_loc = loc!();
            let mut is_float = false;
            let num_len = rest
                .as_bytes()
                .iter()
                .take_while(|&&c| {
                    if !is_float && c == b'.' {
                        is_float = true;
                        true
                    } else {
                        c.is_ascii_digit()
                    }
                })
                .count();
            let num = advance!(num_len);
            if is_float {
                return Some(Ok((
                    Token::Float(match num.parse::<f64>() {
                        Ok(val) => val * if $neg { -1.0 } else { 1.0 },
                        Err(_) => syntax_error!("invalid float"),
                    }),
                    span!(old_loc),
                )));
            } else {
                return Some(Ok((
                    Token::Int(match num.parse::<i64>() {
                        Ok(val) => val * if $neg { -1 } else { 1 },
                        Err(_) => syntax_error!("invalid integer"),
                    }),
                    span!(old_loc),
                )));
            }
        }};
    }

    std::iter::from_fn(move || loop {
        if rest.is_empty() || failed {
            return None;
        }

        let old_loc = loc!();
        match state {
            LexerState::Template => {
                match rest.get(..2) {
                    Some("{{") => {
                        advance!(2);
                        state = LexerState::InVariable;
                        return Some(Ok((Token::VariableStart, span!(old_loc))));
                    }
                    Some("{%") => {
                        advance!(2);
                        state = LexerState::InBlock;
                        return Some(Ok((Token::BlockStart, span!(old_loc))));
                    }
                    _ => {}
                }

                let lead = match find_marker(rest) {
                    Some(start) => advance!(start),
                    None => advance!(rest.len()),
                };
                return Some(Ok((Token::TemplateData(lead), span!(old_loc))));
            }
            LexerState::InVariable | LexerState::InBlock => {
                // within tags whitespace is insignificant, skip it
                match rest
                    .as_bytes()
                    .iter()
                    .position(|&x| !x.is_ascii_whitespace())
                {
                    Some(0) => {}
                    None => {
                        advance!(rest.len());
                        continue;
                    }
                    Some(offset) => {
                        advance!(offset);
                        continue;
                    }
                }

                // look out for the end of the tag
                if let LexerState::InBlock = state {
                    if let Some("%}") = rest.get(..2) {
                        state = LexerState::Template;
                        advance!(2);
                        return Some(Ok((Token::BlockEnd, span!(old_loc))));
                    }
                } else if let Some("}}") = rest.get(..2) {
                    state = LexerState::Template;
                    advance!(2);
                    return Some(Ok((Token::VariableEnd, span!(old_loc))));
                }

                // single character operators (and literals)
                let op = match rest.as_bytes().first() {
                    Some(b'-') => {
                        if rest.as_bytes().get(1).map_or(false, |x| x.is_ascii_digit()) {
                            advance!(1);
                            eat_number!(true);
                        }
                        syntax_error!("unexpected `-`");
                    }
                    Some(b'.') => Some(Token::Dot),
                    Some(b',') => Some(Token::Comma),
                    Some(b'|') => Some(Token::Pipe),
                    Some(b'(') => Some(Token::ParenOpen),
                    Some(b')') => Some(Token::ParenClose),
                    Some(b'\'') => eat_string!(b'\''),
                    Some(b'"') => eat_string!(b'"'),
                    Some(c) if c.is_ascii_digit() => eat_number!(false),
                    _ => None,
                };
                if let Some(op) = op {
                    advance!(1);
                    return Some(Ok((op, span!(old_loc))));
                }

                // identifiers
                let ident_len = rest
                    .as_bytes()
                    .iter()
                    .enumerate()
                    .take_while(|&(idx, &c)| {
                        if c == b'_' {
                            true
                        } else if idx == 0 {
                            c.is_ascii_alphabetic()
                        } else {
                            c.is_ascii_alphanumeric()
                        }
                    })
                    .count();
                if ident_len > 0 {
                    let ident = advance!(ident_len);
                    return Some(Ok((Token::Ident(ident), span!(old_loc))));
                }

                // syntax error
                syntax_error!("unexpected character");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<(Token<'_>, Span)> {
        tokenize(input).collect::<Result<Vec<_>, _>>().unwrap()
    }

    #[test]
    fn test_find_marker() {
        assert!(find_marker("{").is_none());
        assert!(find_marker("foo").is_none());
        assert!(find_marker("foo {").is_none());
        assert_eq!(find_marker("foo {{"), Some(4));
        assert_eq!(find_marker("foo {%"), Some(4));
    }

    #[test]
    fn test_basic_tokens() {
        let tokens = lex("hello {{ who | repeat(2) }}!");
        let kinds: Vec<String> = tokens.iter().map(|x| x.0.to_string()).collect();
        assert_eq!(
            kinds,
            vec![
                "template-data",
                "start of variable tag",
                "identifier",
                "`|`",
                "identifier",
                "`(`",
                "integer",
                "`)`",
                "end of variable tag",
                "template-data",
            ]
        );
    }

    #[test]
    fn test_whitespace_insignificant() {
        let a: Vec<String> = lex("{{x}}").iter().map(|x| x.0.to_string()).collect();
        let b: Vec<String> = lex("{{ x }}").iter().map(|x| x.0.to_string()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_line_numbers() {
        let tokens = lex("a\nb\n{{ x }}");
        let (_, span) = &tokens[1];
        assert_eq!(span.start_line, 3);
    }

    #[test]
    fn test_string_and_number_literals() {
        let tokens = lex("{% for x in y %}{{ x | default('n/a', -1, 2.5) }}{% endfor %}");
        assert!(tokens.iter().any(|x| matches!(x.0, Token::Str("n/a"))));
        assert!(tokens.iter().any(|x| matches!(x.0, Token::Int(-1))));
        assert!(tokens.iter().any(|x| matches!(x.0, Token::Float(f) if f == 2.5)));
    }

    #[test]
    fn test_unterminated_string() {
        let result: Result<Vec<_>, _> = tokenize("{{ x | default('oops) }}").collect();
        assert!(result.is_err());
    }
}
