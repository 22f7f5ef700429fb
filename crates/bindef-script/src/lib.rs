//! Script driver for the bindef emission engine.
//!
//! A script is one command per line:
//!
//! ```text
//! # header
//! u32 0xcafe_babe
//! pragma endian: :big do
//!   lstr :u16, "name"
//!   tlv_u8 1, u16: 0xff
//! end
//! ```
//!
//! [`source`] extracts script lines from plain or literate Markdown input,
//! [`parser`] turns them into operations and [`runner`] evaluates them on a
//! [`bindef_core::Engine`].

use clap as _;
use env_logger as _;
#[cfg(test)]
use tempfile as _;

/// Driver error types with source locations.
pub mod errors;
/// Line parser for the script syntax.
pub mod parser;
/// Statement evaluation and whole-input emission.
pub mod runner;
/// Input loading and literate Markdown extraction.
pub mod source;

pub use errors::{ScriptError, ScriptErrorKind, ScriptResult, SourceLoc};
pub use parser::{parse_line, parse_script, Line, ParseError, ParseErrorKind, Script, Statement};
pub use runner::{emit_source, run_script, RunSummary};
pub use source::{Source, SourceLine};
