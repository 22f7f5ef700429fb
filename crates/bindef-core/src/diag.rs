//! Diagnostics side channel.
//!
//! Lines are `V: <message>` or `W: <message>`, gated by the `verbose` and
//! `warnings` pragmas in effect when the triggering operation runs. A line
//! that cannot be written is dropped and logged; it never turns into an
//! evaluation error.

use std::fmt;
use std::io::Write;

use crate::PragmaSet;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Severity {
    /// Informational, shown only with `verbose`.
    Verbose,
    /// Recoverable problem, shown unless `warnings` is off.
    Warning,
}

impl Severity {
    /// Line prefix without the separator.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Verbose => "V",
            Self::Warning => "W",
        }
    }

    /// Returns true when `pragmas` allow this severity through.
    #[must_use]
    pub const fn enabled(self, pragmas: &PragmaSet) -> bool {
        match self {
            Self::Verbose => pragmas.verbose,
            Self::Warning => pragmas.warnings,
        }
    }
}

/// One diagnostic event.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Diagnostic {
    /// Severity.
    pub severity: Severity,
    /// Message text without prefix.
    pub message: String,
}

impl Diagnostic {
    /// Verbose diagnostic.
    #[must_use]
    pub fn verbose(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Verbose,
            message: message.into(),
        }
    }

    /// Warning diagnostic.
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity.prefix(), self.message)
    }
}

/// Append-only writer for diagnostic lines.
pub struct Diagnostics<'io> {
    sink: Box<dyn Write + 'io>,
    lines_written: usize,
}

impl<'io> Diagnostics<'io> {
    /// Wraps a line sink.
    #[must_use]
    pub fn new(sink: impl Write + 'io) -> Self {
        Self {
            sink: Box::new(sink),
            lines_written: 0,
        }
    }

    /// Writes `diagnostic` if its severity is enabled by `pragmas`.
    ///
    /// Returns true when the line reached the sink.
    pub fn emit(&mut self, pragmas: &PragmaSet, diagnostic: &Diagnostic) -> bool {
        if !diagnostic.severity.enabled(pragmas) {
            return false;
        }
        match writeln!(self.sink, "{diagnostic}") {
            Ok(()) => {
                self.lines_written += 1;
                true
            }
            Err(err) => {
                log::warn!("dropping diagnostic {diagnostic:?}: {err}");
                false
            }
        }
    }

    /// Number of lines successfully written so far.
    #[must_use]
    pub const fn lines_written(&self) -> usize {
        self.lines_written
    }

    /// Flushes the sink, logging failures.
    pub fn flush(&mut self) {
        if let Err(err) = self.sink.flush() {
            log::warn!("failed to flush diagnostics: {err}");
        }
    }
}

impl fmt::Debug for Diagnostics<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("lines_written", &self.lines_written)
            .finish_non_exhaustive()
    }
}
