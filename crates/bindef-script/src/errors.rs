//! Driver errors with source locations.
//!
//! Errors format for stderr as:
//!
//! ```text
//! fixture.bd:12:1: error: width of 256 exceeds 8 bits
//! ```

use std::fmt;

use bindef_core::EvaluationError;

use crate::parser::{ParseError, ParseErrorKind};

/// A location in a named input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLoc {
    /// Input name as shown to the user.
    pub file: String,
    /// 1-indexed line number.
    pub line: usize,
    /// 1-indexed column number (1 if unknown).
    pub column: usize,
}

impl SourceLoc {
    /// Creates a new source location.
    #[must_use]
    pub fn new(file: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Classification of driver errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptErrorKind {
    /// The input could not be read.
    Read(String),
    /// The output file could not be created.
    Create {
        /// Output path.
        path: String,
        /// Underlying I/O error.
        reason: String,
    },
    /// The script is malformed.
    Parse(ParseErrorKind),
    /// A statement failed to evaluate.
    Evaluation(EvaluationError),
}

impl fmt::Display for ScriptErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(reason) => write!(f, "failed to read input: {reason}"),
            Self::Create { path, reason } => write!(f, "cannot create {path}: {reason}"),
            Self::Parse(kind) => write!(f, "{kind}"),
            Self::Evaluation(error) => write!(f, "{error}"),
        }
    }
}

/// A driver error with optional source context.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptError {
    /// The kind of error.
    pub kind: ScriptErrorKind,
    /// Source location if available.
    pub location: Option<SourceLoc>,
}

impl ScriptError {
    /// Creates an error without location.
    #[must_use]
    pub const fn new(kind: ScriptErrorKind) -> Self {
        Self {
            kind,
            location: None,
        }
    }

    /// Adds a source location.
    #[must_use]
    pub fn with_location(mut self, loc: SourceLoc) -> Self {
        self.location = Some(loc);
        self
    }

    /// Wraps a parse error raised in the input named `file`.
    #[must_use]
    pub fn parse(file: &str, error: ParseError) -> Self {
        Self::new(ScriptErrorKind::Parse(error.kind)).with_location(SourceLoc::new(
            file,
            error.location.line,
            error.location.column,
        ))
    }

    /// Wraps an evaluation failure of the statement on `line`.
    #[must_use]
    pub fn evaluation(file: &str, line: usize, error: EvaluationError) -> Self {
        Self::new(ScriptErrorKind::Evaluation(error)).with_location(SourceLoc::new(file, line, 1))
    }

    /// Formats the error for stderr output.
    #[must_use]
    pub fn format_for_stderr(&self) -> String {
        self.location.as_ref().map_or_else(
            || format!("error: {}", self.kind),
            |loc| format!("{loc}: error: {}", self.kind),
        )
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{loc}: {}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for ScriptError {}

/// Result alias for driver operations.
pub type ScriptResult<T> = Result<T, ScriptError>;
