//! Session construction parameters.

use crate::{Extra, PragmaSet};

/// Initial state of an emission session.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    /// Initial `verbose` pragma.
    pub verbose: bool,
    /// Initial `warnings` pragma.
    pub warnings: bool,
    /// Extension command sets registered next to the primitives.
    pub extras: Vec<Extra>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            warnings: true,
            extras: Extra::ALL.to_vec(),
        }
    }
}

impl SessionConfig {
    /// Pragma set a session starts from.
    #[must_use]
    pub fn initial_pragmas(&self) -> PragmaSet {
        PragmaSet {
            verbose: self.verbose,
            warnings: self.warnings,
            ..PragmaSet::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SessionConfig;
    use crate::{Charset, Endian, Extra};

    #[test]
    fn defaults_enable_warnings_and_every_extra() {
        let config = SessionConfig::default();
        assert!(!config.verbose);
        assert!(config.warnings);
        assert_eq!(config.extras, Extra::ALL);
    }

    #[test]
    fn initial_pragmas_take_flags_and_schema_defaults() {
        let config = SessionConfig {
            verbose: true,
            warnings: false,
            extras: Vec::new(),
        };
        let pragmas = config.initial_pragmas();
        assert!(pragmas.verbose);
        assert!(!pragmas.warnings);
        assert_eq!(pragmas.endian, Endian::Little);
        assert_eq!(pragmas.encoding, Charset::Utf8);
    }
}
