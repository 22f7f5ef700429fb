//! Evaluation error taxonomy.
//!
//! Every failure is fatal to the run that raised it. The one recoverable
//! condition, a negative value handed to an unsigned integer command, is a
//! warning diagnostic and never appears here.

use thiserror::Error;

use crate::Int;

/// Any failure while evaluating an operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    /// A pragma key or value was rejected.
    #[error(transparent)]
    Pragma(#[from] PragmaError),
    /// A command was unknown or could not encode its arguments.
    #[error(transparent)]
    Command(#[from] CommandError),
    /// The primary output sink refused bytes.
    #[error("failed to write output: {0}")]
    Output(String),
}

/// Rejected pragma assignment. The pragma set is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PragmaError {
    /// Key is not part of the pragma schema.
    #[error("unknown pragma: {0}")]
    UnknownKey(String),
    /// Value is outside the key's allow-list.
    #[error("bad pragma value: {value}")]
    BadValue {
        /// Pragma key being assigned.
        key: String,
        /// Rendered rejected value.
        value: String,
    },
}

/// Command dispatch and encoding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// No handler is registered under the name.
    #[error("unknown command: {0}")]
    Unknown(String),
    /// Integer magnitude does not fit the target width.
    #[error("width of {value} exceeds {width} bits")]
    WidthExceeded {
        /// Offending value.
        value: Int,
        /// Target width in bits.
        width: u32,
    },
    /// `f64` refuses NaN.
    #[error("{0} is an invalid double-precision float")]
    InvalidDouble(String),
    /// `strnz` text is already longer than the requested padded size.
    #[error("maxpad < encoded string len")]
    PaddingOverflow {
        /// Requested padded size.
        maxpad: Int,
        /// Encoded text length in bytes.
        len: usize,
    },
    /// A character has no representation in the active encoding.
    #[error("{ch:?} cannot be encoded as {encoding}")]
    Unencodable {
        /// Character that failed.
        ch: char,
        /// Active encoding name.
        encoding: &'static str,
    },
    /// Wrong number of positional arguments.
    #[error("wrong number of arguments for {command} (given {given}, expected {expected})")]
    Arity {
        /// Command name.
        command: String,
        /// Arguments supplied.
        given: usize,
        /// Human-readable expectation, e.g. `1` or `1..2`.
        expected: &'static str,
    },
    /// Argument has the wrong shape.
    #[error("bad argument {index} for {command}: expected {expected}, got {got}")]
    BadArgument {
        /// Command name.
        command: String,
        /// Zero-based argument position.
        index: usize,
        /// Expected kind of value.
        expected: &'static str,
        /// Rendered supplied value.
        got: String,
    },
    /// Only `pragma` takes a nested block.
    #[error("{0} command does not take a block")]
    UnexpectedBlock(String),
}

/// Result alias for engine operations.
pub type EvalResult<T> = Result<T, EvaluationError>;
