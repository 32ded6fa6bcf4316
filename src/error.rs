use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::scanner::token::Span;

// ============= Compile-time errors (with miette diagnostics) =============

#[derive(Error, Debug, Diagnostic)]
pub enum CompileError {
    #[error("scan error at line {line}: {message}")]
    #[diagnostic(code(culebra::scan))]
    Scan {
        message: String,
        line: usize,
        #[label("here")]
        span: SourceSpan,
        #[source_code]
        src: miette::NamedSource<String>,
    },

    #[error("parse error at line {line}: {message}")]
    #[diagnostic(code(culebra::parse))]
    Parse {
        message: String,
        line: usize,
        #[label("here")]
        span: SourceSpan,
        #[source_code]
        src: miette::NamedSource<String>,
    },

    #[error("include error: {message}")]
    #[diagnostic(code(culebra::include))]
    Include {
        message: String,
        #[source]
        cause: Option<std::io::Error>,
    },

    #[error("load error at line {line}: {message}")]
    #[diagnostic(
        code(culebra::load),
        help("top-level statements can only be function declarations or includes")
    )]
    Load { message: String, line: usize },
}

impl CompileError {
    pub fn scan(message: impl Into<String>, line: usize, span: Span) -> Self {
        Self::Scan {
            message: message.into(),
            line,
            span: span.into(),
            src: miette::NamedSource::new("input", String::new()),
        }
    }

    pub fn parse(message: impl Into<String>, line: usize, span: Span) -> Self {
        Self::Parse {
            message: message.into(),
            line,
            span: span.into(),
            src: miette::NamedSource::new("input", String::new()),
        }
    }

    pub fn include(message: impl Into<String>, cause: Option<std::io::Error>) -> Self {
        Self::Include {
            message: message.into(),
            cause,
        }
    }

    pub fn load(message: impl Into<String>, line: usize) -> Self {
        Self::Load {
            message: message.into(),
            line,
        }
    }

    /// Attach source code for fancy miette diagnostics.
    ///
    /// Only scan and parse errors point into a source file; the other
    /// variants are returned unchanged.
    pub fn with_source_code(self, name: impl Into<String>, source: impl Into<String>) -> Self {
        match self {
            Self::Scan {
                message,
                line,
                span,
                ..
            } => Self::Scan {
                message,
                line,
                span,
                src: miette::NamedSource::new(name.into(), source.into()),
            },
            Self::Parse {
                message,
                line,
                span,
                ..
            } => Self::Parse {
                message,
                line,
                span,
                src: miette::NamedSource::new(name.into(), source.into()),
            },
            other => other,
        }
    }
}

// ============= Warnings (non-fatal diagnostics) =============

#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(culebra::warning), severity(Warning))]
pub struct Warning {
    pub message: String,
}

impl Warning {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============= Runtime errors (simple, no miette) =============

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{}", describe(.message, .line))]
pub struct RuntimeError {
    pub message: String,
    pub line: Option<usize>,
}

impl RuntimeError {
    /// Create a runtime error without source location.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
        }
    }

    /// Create a runtime error pointing at a source line.
    pub fn at_line(message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line: Some(line),
        }
    }

    /// Fill in the line if the error doesn't carry one yet. Errors raised
    /// deeper in the tree keep their more precise location.
    pub fn with_line(mut self, line: usize) -> Self {
        self.line.get_or_insert(line);
        self
    }
}

fn describe(message: &str, line: &Option<usize>) -> String {
    match line {
        Some(line) => format!("runtime error at line {line}: {message}"),
        None => format!("runtime error: {message}"),
    }
}

// ============= Top-level error =============

/// Anything that terminates a run: compile-time or runtime.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

// ============= Tests =============
