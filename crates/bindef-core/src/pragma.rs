//! Pragma schema, current pragma state, and scoped overrides.
//!
//! Every key has a fixed allow-list. Assignments are validated as a batch
//! before anything changes, so the set is always schema-valid. Scoped
//! overrides restore the complete pre-scope snapshot on every exit path,
//! including values changed only by scopes nested inside the body.

use std::fmt;
use std::str::FromStr;

use crate::{Charset, PragmaError, Value};

/// Byte order for multi-byte numeric encoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Endian {
    /// Most significant byte first.
    Big,
    /// Least significant byte first.
    #[default]
    Little,
}

impl Endian {
    /// Schema name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Big => "big",
            Self::Little => "little",
        }
    }
}

/// Pragma keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum PragmaKey {
    /// Enables `V:` diagnostics.
    Verbose,
    /// Enables `W:` diagnostics.
    Warnings,
    /// Byte order of multi-byte numbers.
    Endian,
    /// Charset used by `str` and friends.
    Encoding,
}

impl PragmaKey {
    /// All keys in schema order.
    pub const ALL: [Self; 4] = [Self::Verbose, Self::Warnings, Self::Endian, Self::Encoding];

    /// Schema name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Verbose => "verbose",
            Self::Warnings => "warnings",
            Self::Endian => "endian",
            Self::Encoding => "encoding",
        }
    }
}

impl FromStr for PragmaKey {
    type Err = PragmaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.name() == s)
            .ok_or_else(|| PragmaError::UnknownKey(s.to_string()))
    }
}

/// A validated pragma value, tagged by key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pragma {
    /// `verbose` value.
    Verbose(bool),
    /// `warnings` value.
    Warnings(bool),
    /// `endian` value.
    Endian(Endian),
    /// `encoding` value.
    Encoding(Charset),
}

impl Pragma {
    /// Validates `value` against the allow-list of the key named `key`.
    ///
    /// `verbose`/`warnings` take booleans, `endian` takes the symbols `big` and
    /// `little`, and `encoding` takes a string from [`crate::CHARSET_NAMES`].
    ///
    /// # Errors
    ///
    /// Returns [`PragmaError::UnknownKey`] or [`PragmaError::BadValue`].
    pub fn parse(key: &str, value: &Value) -> Result<Self, PragmaError> {
        let key = key.parse::<PragmaKey>()?;
        let pragma = match (key, value) {
            (PragmaKey::Verbose, Value::Bool(b)) => Some(Self::Verbose(*b)),
            (PragmaKey::Warnings, Value::Bool(b)) => Some(Self::Warnings(*b)),
            (PragmaKey::Endian, Value::Symbol(s)) => match s.as_str() {
                "big" => Some(Self::Endian(Endian::Big)),
                "little" => Some(Self::Endian(Endian::Little)),
                _ => None,
            },
            (PragmaKey::Encoding, Value::Str(s)) => Charset::from_name(s).map(Self::Encoding),
            _ => None,
        };
        pragma.ok_or_else(|| PragmaError::BadValue {
            key: key.name().to_string(),
            value: value.to_string(),
        })
    }

    /// Key this value belongs to.
    #[must_use]
    pub const fn key(self) -> PragmaKey {
        match self {
            Self::Verbose(_) => PragmaKey::Verbose,
            Self::Warnings(_) => PragmaKey::Warnings,
            Self::Endian(_) => PragmaKey::Endian,
            Self::Encoding(_) => PragmaKey::Encoding,
        }
    }
}

impl fmt::Display for Pragma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verbose(b) | Self::Warnings(b) => write!(f, "{}: {b}", self.key().name()),
            Self::Endian(e) => write!(f, "endian: {}", e.name()),
            Self::Encoding(c) => write!(f, "encoding: {}", c.name()),
        }
    }
}

/// Current pragma values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct PragmaSet {
    /// Emit `V:` lines.
    pub verbose: bool,
    /// Emit `W:` lines.
    pub warnings: bool,
    /// Multi-byte numeric byte order.
    pub endian: Endian,
    /// String charset.
    pub encoding: Charset,
}

impl Default for PragmaSet {
    fn default() -> Self {
        Self {
            verbose: false,
            warnings: true,
            endian: Endian::Little,
            encoding: Charset::Utf8,
        }
    }
}

impl PragmaSet {
    /// Current value of `key`.
    #[must_use]
    pub const fn get(&self, key: PragmaKey) -> Pragma {
        match key {
            PragmaKey::Verbose => Pragma::Verbose(self.verbose),
            PragmaKey::Warnings => Pragma::Warnings(self.warnings),
            PragmaKey::Endian => Pragma::Endian(self.endian),
            PragmaKey::Encoding => Pragma::Encoding(self.encoding),
        }
    }

    /// Applies an already validated value.
    #[allow(clippy::missing_const_for_fn)]
    pub fn apply(&mut self, pragma: Pragma) {
        match pragma {
            Pragma::Verbose(b) => self.verbose = b,
            Pragma::Warnings(b) => self.warnings = b,
            Pragma::Endian(e) => self.endian = e,
            Pragma::Encoding(c) => self.encoding = c,
        }
    }

    /// Validates and assigns a single key.
    ///
    /// # Errors
    ///
    /// Returns [`PragmaError`] without mutating anything.
    pub fn set(&mut self, key: &str, value: &Value) -> Result<(), PragmaError> {
        let pragma = Pragma::parse(key, value)?;
        self.apply(pragma);
        Ok(())
    }

    /// Validates every entry, then assigns all of them.
    ///
    /// # Errors
    ///
    /// Returns the first [`PragmaError`]; nothing is assigned in that case.
    pub fn set_all(&mut self, entries: &[(String, Value)]) -> Result<Vec<Pragma>, PragmaError> {
        let validated = validate_all(entries)?;
        for pragma in &validated {
            self.apply(*pragma);
        }
        Ok(validated)
    }

    /// Runs `body` under `overrides`, then restores the full prior state.
    ///
    /// The restore happens whether `body` succeeds or fails. Invalid overrides
    /// are rejected before the snapshot is disturbed and `body` does not run.
    ///
    /// # Errors
    ///
    /// Returns the override validation error, or whatever `body` returned.
    pub fn scoped<T, E>(
        &mut self,
        overrides: &[(String, Value)],
        body: impl FnOnce(&mut Self) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<PragmaError>,
    {
        let snapshot = *self;
        self.set_all(overrides)?;
        let result = body(self);
        *self = snapshot;
        result
    }
}

/// Validates a batch of `key: value` entries.
///
/// # Errors
///
/// Returns the first rejected entry.
pub fn validate_all(entries: &[(String, Value)]) -> Result<Vec<Pragma>, PragmaError> {
    entries
        .iter()
        .map(|(key, value)| Pragma::parse(key, value))
        .collect()
}
