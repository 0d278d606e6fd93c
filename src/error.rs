//! Error types shared across the pipeline.
//!
//! Mirrors the style the rest of this crate inherited from its teacher:
//! explicit enums implementing `std::error::Error` and `Display` by hand
//! rather than reaching for a derive-macro error crate.

use std::fmt;
use std::io;

/// A source position used to anchor parse failures and lint diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pos {
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// A fatal failure raised by the lexer or parser.
///
/// Parse failures are always fatal: the caller gets a `Result::Err` and no
/// AST is produced. Lint diagnostics, by contrast, are data (see
/// [`crate::linter::Diagnostic`]) and never raised as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub pos: Pos,
    pub msg: String,
}

impl ParseError {
    pub fn new(pos: Pos, msg: impl Into<String>) -> Self {
        ParseError {
            pos,
            msg: msg.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "parse error at {}: {}", self.pos, self.msg)
    }
}

impl std::error::Error for ParseError {}

/// Top-level error type returned by the library's fallible entry points.
#[derive(Debug)]
pub enum WodcError {
    Parse(ParseError),
    Io(io::Error),
    Catalog(String),
}

impl fmt::Display for WodcError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WodcError::Parse(e) => write!(f, "{e}"),
            WodcError::Io(e) => write!(f, "io error: {e}"),
            WodcError::Catalog(msg) => write!(f, "catalog error: {msg}"),
        }
    }
}

impl std::error::Error for WodcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WodcError::Parse(e) => Some(e),
            WodcError::Io(e) => Some(e),
            WodcError::Catalog(_) => None,
        }
    }
}

impl From<ParseError> for WodcError {
    fn from(e: ParseError) -> Self {
        WodcError::Parse(e)
    }
}

impl From<io::Error> for WodcError {
    fn from(e: io::Error) -> Self {
        WodcError::Io(e)
    }
}

pub type WodcResult<T> = Result<T, WodcError>;
