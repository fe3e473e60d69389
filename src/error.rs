use thiserror::Error;

use crate::memory::ArenaError;

/// The reason a parse failed, independent of where it failed.
///
/// One variant per error kind named in the front-end design; each carries
/// whatever the triggering token could tell us.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("empty input")]
    EmptyInput,

    #[error("unexpected token: {0}")]
    UnexpectedToken(String),

    #[error("missing select list")]
    MissingSelectList,

    #[error("unterminated construct: {0}")]
    UnterminatedConstruct(String),

    #[error("recursion depth exceeded (limit {0})")]
    DepthExceeded(u32),

    #[error("arena out of memory: {0}")]
    OutOfMemory(String),

    #[error("operator not allowed in strict mode: {0}")]
    StrictOperator(String),
}

/// A single parse failure: kind plus the source position that produced it.
///
/// The front-end reports exactly one of these per failed parse: the
/// first production that detects an inconsistency records the offending
/// token's position and aborts; there is no accumulation of diagnostics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at {line}:{column}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: u32,
    pub column: u32,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, line: u32, column: u32) -> Self {
        Self { kind, line, column }
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl From<ArenaError> for ParseError {
    fn from(e: ArenaError) -> Self {
        ParseError::new(ParseErrorKind::OutOfMemory(e.to_string()), 0, 0)
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;
