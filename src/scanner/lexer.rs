use winnow::combinator::{alt, opt};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::stream::{LocatingSlice, Location};
use winnow::token::{any, one_of, take_while};

use crate::error::CompileError;
use crate::scanner::token::{Literal, Span, Token, TokenKind, keyword_kind};

type Input<'a> = LocatingSlice<&'a str>;

type Scanned = (TokenKind, Option<Literal>);

fn whitespace_and_comments<'a>(input: &mut Input<'a>) -> ModalResult<()> {
    loop {
        let before = input.current_token_start();
        take_while(0.., |c: char| {
            c == ' ' || c == '\t' || c == '\r' || c == '\n'
        })
        .void()
        .parse_next(input)?;

        if input.starts_with("//") {
            take_while(0.., |c: char| c != '\n')
                .void()
                .parse_next(input)?;
        } else if input.current_token_start() == before {
            break;
        }
    }
    Ok(())
}

fn cut() -> ErrMode<ContextError> {
    ErrMode::Cut(ContextError::new())
}

/// Strings end at the first `"`. Only `\n` and `\t` are escapes; any other
/// backslash is kept as written.
fn string_literal<'a>(input: &mut Input<'a>) -> ModalResult<Scanned> {
    '"'.parse_next(input)?;
    let mut s = String::new();
    loop {
        let c = any
            .parse_next(input)
            .map_err(|_: ErrMode<ContextError>| cut())?;
        match c {
            '"' => break,
            '\\' => match opt(one_of(['n', 't'])).parse_next(input)? {
                Some('n') => s.push('\n'),
                Some(_) => s.push('\t'),
                None => s.push('\\'),
            },
            other => s.push(other),
        }
    }
    Ok((TokenKind::StringLit, Some(Literal::Str(s))))
}

fn digits<'a>(input: &mut Input<'a>) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)
}

fn number_literal<'a>(input: &mut Input<'a>) -> ModalResult<Scanned> {
    let lexeme: &str = (digits, opt(('.', digits))).take().parse_next(input)?;

    if lexeme.contains('.') {
        let value: f64 = lexeme.parse().map_err(|_| cut())?;
        Ok((TokenKind::DoubleLit, Some(Literal::Double(value))))
    } else {
        let value: i64 = lexeme.parse().map_err(|_| cut())?;
        Ok((TokenKind::IntLit, Some(Literal::Int(value))))
    }
}

fn identifier_or_keyword<'a>(input: &mut Input<'a>) -> ModalResult<Scanned> {
    let lexeme: &str = (
        any.verify(|c: &char| c.is_ascii_alphabetic() || *c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)?;

    Ok(match keyword_kind(lexeme) {
        Some(TokenKind::BoolLit) => (TokenKind::BoolLit, Some(Literal::Bool(lexeme == "true"))),
        Some(kind) => (kind, None),
        None => (
            TokenKind::Identifier,
            Some(Literal::Identifier(lexeme.to_string())),
        ),
    })
}

fn two_char_token<'a>(input: &mut Input<'a>) -> ModalResult<Scanned> {
    let kind = alt((
        "!=".value(TokenKind::NotEqual),
        "==".value(TokenKind::EqualEqual),
        ">=".value(TokenKind::GreaterEqual),
        "<=".value(TokenKind::LessEqual),
        "::".value(TokenKind::DoubleColon),
    ))
    .parse_next(input)?;
    Ok((kind, None))
}

fn single_char_token<'a>(input: &mut Input<'a>) -> ModalResult<Scanned> {
    let c = any
        .verify(|c: &char| "(){}[].,;-+/*%!=<>:".contains(*c))
        .parse_next(input)?;
    let kind = match c {
        '(' => TokenKind::LeftParen,
        ')' => TokenKind::RightParen,
        '{' => TokenKind::LeftBrace,
        '}' => TokenKind::RightBrace,
        '[' => TokenKind::LeftBracket,
        ']' => TokenKind::RightBracket,
        ',' => TokenKind::Comma,
        '.' => TokenKind::Dot,
        '-' => TokenKind::Minus,
        '+' => TokenKind::Plus,
        ';' => TokenKind::Semicolon,
        '/' => TokenKind::Slash,
        '*' => TokenKind::Star,
        '%' => TokenKind::Percent,
        '!' => TokenKind::Not,
        '=' => TokenKind::Equal,
        '<' => TokenKind::Less,
        '>' => TokenKind::Greater,
        ':' => TokenKind::Colon,
        _ => unreachable!("verify guarantees valid char"),
    };
    Ok((kind, None))
}

fn scan_token<'a>(input: &mut Input<'a>) -> ModalResult<Scanned> {
    alt((
        string_literal,
        number_literal,
        identifier_or_keyword,
        two_char_token,
        single_char_token,
    ))
    .parse_next(input)
}

/// Build the error for a token that failed to scan at `offset`.
fn scan_error(source: &str, offset: usize, line: usize) -> CompileError {
    let rest = &source[offset..];
    match rest.chars().next() {
        Some('"') => CompileError::scan(
            "unterminated string",
            line,
            Span::new(offset, rest.len()),
        ),
        Some(c) if c.is_ascii_digit() => {
            let len = rest.chars().take_while(char::is_ascii_digit).count();
            CompileError::scan(
                "integer literal out of range",
                line,
                Span::new(offset, len),
            )
        }
        Some(c) => CompileError::scan(
            format!("unexpected character '{c}'"),
            line,
            Span::new(offset, c.len_utf8()),
        ),
        None => CompileError::scan("unexpected end of input", line, Span::new(offset, 0)),
    }
}

/// Scan all tokens from source. Scanning stops at the first error.
pub fn scan_all(source: &str) -> Result<Vec<Token>, CompileError> {
    let mut input = LocatingSlice::new(source);
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut counted_to = 0;

    loop {
        if whitespace_and_comments(&mut input).is_err() {
            break;
        }
        if input.is_empty() {
            break;
        }

        let start = input.current_token_start();
        line += source[counted_to..start].matches('\n').count();
        counted_to = start;

        match scan_token(&mut input) {
            Ok((kind, literal)) => {
                let span = Span::new(start, input.current_token_start() - start);
                tokens.push(match literal {
                    Some(literal) => Token::with_literal(kind, line, span, literal),
                    None => Token::new(kind, line, span),
                });
            }
            Err(_) => return Err(scan_error(source, start, line)),
        }
    }

    line += source[counted_to..].matches('\n').count();
    tokens.push(Token::new(
        TokenKind::Eof,
        line,
        Span::new(source.len(), 0),
    ));
    Ok(tokens)
}
