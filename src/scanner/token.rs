use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Single-character tokens
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Dot,
    Minus,
    Plus,
    Percent,
    Semicolon,
    Slash,
    Star,

    // One or two character tokens
    Colon,
    DoubleColon,
    Not,
    NotEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    // Literals
    Identifier,
    StringLit,
    IntLit,
    DoubleLit,
    BoolLit,

    // Keywords
    And,
    Or,
    If,
    Else,
    For,
    While,
    Break,
    Continue,
    Return,
    Var,
    Func,
    Include,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LeftParen => write!(f, "("),
            Self::RightParen => write!(f, ")"),
            Self::LeftBrace => write!(f, "{{"),
            Self::RightBrace => write!(f, "}}"),
            Self::LeftBracket => write!(f, "["),
            Self::RightBracket => write!(f, "]"),
            Self::Comma => write!(f, ","),
            Self::Dot => write!(f, "."),
            Self::Minus => write!(f, "-"),
            Self::Plus => write!(f, "+"),
            Self::Percent => write!(f, "%"),
            Self::Semicolon => write!(f, ";"),
            Self::Slash => write!(f, "/"),
            Self::Star => write!(f, "*"),
            Self::Colon => write!(f, ":"),
            Self::DoubleColon => write!(f, "::"),
            Self::Not => write!(f, "!"),
            Self::NotEqual => write!(f, "!="),
            Self::Equal => write!(f, "="),
            Self::EqualEqual => write!(f, "=="),
            Self::Greater => write!(f, ">"),
            Self::GreaterEqual => write!(f, ">="),
            Self::Less => write!(f, "<"),
            Self::LessEqual => write!(f, "<="),
            Self::Identifier => write!(f, "identifier"),
            Self::StringLit => write!(f, "string literal"),
            Self::IntLit => write!(f, "integer literal"),
            Self::DoubleLit => write!(f, "double literal"),
            Self::BoolLit => write!(f, "boolean literal"),
            Self::And => write!(f, "and"),
            Self::Or => write!(f, "or"),
            Self::If => write!(f, "if"),
            Self::Else => write!(f, "else"),
            Self::For => write!(f, "for"),
            Self::While => write!(f, "while"),
            Self::Break => write!(f, "break"),
            Self::Continue => write!(f, "continue"),
            Self::Return => write!(f, "return"),
            Self::Var => write!(f, "var"),
            Self::Func => write!(f, "func"),
            Self::Include => write!(f, "include"),
            Self::Eof => write!(f, "end of file"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    pub fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        miette::SourceSpan::new(span.offset.into(), span.len)
    }
}

/// Payload carried by identifier and literal tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Identifier(String),
    Str(String),
    Int(i64),
    Double(f64),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub span: Span,
    pub literal: Option<Literal>,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, span: Span) -> Self {
        Self {
            kind,
            line,
            span,
            literal: None,
        }
    }

    pub fn with_literal(kind: TokenKind, line: usize, span: Span, literal: Literal) -> Self {
        Self {
            kind,
            line,
            span,
            literal: Some(literal),
        }
    }

    /// The identifier name, for `Identifier` tokens.
    pub fn identifier(&self) -> Option<&str> {
        match &self.literal {
            Some(Literal::Identifier(name)) => Some(name),
            _ => None,
        }
    }

    /// Short human-readable text for error messages: the identifier name or
    /// literal value where there is one, the token kind otherwise.
    pub fn describe(&self) -> String {
        match &self.literal {
            Some(Literal::Identifier(name)) => name.clone(),
            Some(Literal::Str(s)) => format!("\"{s}\""),
            Some(Literal::Int(n)) => n.to_string(),
            Some(Literal::Double(n)) => n.to_string(),
            Some(Literal::Bool(b)) => b.to_string(),
            None => self.kind.to_string(),
        }
    }
}

const STRING_PREVIEW_LIMIT: usize = 20;
const STRING_PREVIEW_LEN: usize = 17;

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        match &self.literal {
            None => Ok(()),
            Some(Literal::Identifier(name)) => write!(f, ": {name}"),
            Some(Literal::Int(n)) => write!(f, ": {n}"),
            Some(Literal::Double(n)) => write!(f, ": {n:?}"),
            Some(Literal::Bool(b)) => write!(f, ": {b}"),
            Some(Literal::Str(s)) if s.chars().count() > STRING_PREVIEW_LIMIT => {
                let preview: String = s.chars().take(STRING_PREVIEW_LEN).collect();
                write!(f, ": \"{preview}\" [...]")
            }
            Some(Literal::Str(s)) => write!(f, ": \"{s}\""),
        }
    }
}

pub fn keyword_kind(ident: &str) -> Option<TokenKind> {
    match ident {
        "and" => Some(TokenKind::And),
        "or" => Some(TokenKind::Or),
        "not" => Some(TokenKind::Not),
        "true" | "false" => Some(TokenKind::BoolLit),
        "if" => Some(TokenKind::If),
        "else" => Some(TokenKind::Else),
        "for" => Some(TokenKind::For),
        "while" => Some(TokenKind::While),
        "break" => Some(TokenKind::Break),
        "continue" => Some(TokenKind::Continue),
        "return" => Some(TokenKind::Return),
        "var" => Some(TokenKind::Var),
        "func" => Some(TokenKind::Func),
        "include" => Some(TokenKind::Include),
        _ => None,
    }
}
