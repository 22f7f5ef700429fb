//! Character encodings selectable through the `encoding` pragma.

use crate::CommandError;

/// Supported output character encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Charset {
    /// UTF-8.
    #[default]
    Utf8,
    /// UTF-16, little-endian, no BOM.
    Utf16Le,
    /// UTF-16, big-endian, no BOM.
    Utf16Be,
    /// UTF-16 with a big-endian BOM ahead of every encoded string.
    Utf16,
    /// UTF-32, little-endian, no BOM.
    Utf32Le,
    /// UTF-32, big-endian, no BOM.
    Utf32Be,
    /// UTF-32 with a big-endian BOM ahead of every encoded string.
    Utf32,
    /// 7-bit ASCII.
    UsAscii,
    /// Raw bytes; only ASCII text converts.
    Ascii8Bit,
    /// ISO-8859-1 (Latin-1).
    Latin1,
}

/// Accepted `encoding` pragma names, lowercase, with their charsets.
pub const CHARSET_NAMES: &[(&str, Charset)] = &[
    ("utf-8", Charset::Utf8),
    ("utf-16le", Charset::Utf16Le),
    ("utf-16be", Charset::Utf16Be),
    ("utf-16", Charset::Utf16),
    ("utf-32le", Charset::Utf32Le),
    ("utf-32be", Charset::Utf32Be),
    ("utf-32", Charset::Utf32),
    ("us-ascii", Charset::UsAscii),
    ("ascii", Charset::UsAscii),
    ("ascii-8bit", Charset::Ascii8Bit),
    ("binary", Charset::Ascii8Bit),
    ("iso-8859-1", Charset::Latin1),
    ("iso8859-1", Charset::Latin1),
];

impl Charset {
    /// Looks up a pragma name. Matching is exact; names are lowercase.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        CHARSET_NAMES
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|&(_, charset)| charset)
    }

    /// Canonical name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf16Le => "utf-16le",
            Self::Utf16Be => "utf-16be",
            Self::Utf16 => "utf-16",
            Self::Utf32Le => "utf-32le",
            Self::Utf32Be => "utf-32be",
            Self::Utf32 => "utf-32",
            Self::UsAscii => "us-ascii",
            Self::Ascii8Bit => "ascii-8bit",
            Self::Latin1 => "iso-8859-1",
        }
    }

    /// Encodes `text` into raw bytes, without terminator or length.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Unencodable`] for the first character that has
    /// no representation in this charset.
    pub fn encode(self, text: &str) -> Result<Vec<u8>, CommandError> {
        let bytes = match self {
            Self::Utf8 => text.as_bytes().to_vec(),
            Self::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
            Self::Utf16Be => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
            Self::Utf16 => bom(text, &[0xFE, 0xFF])
                .chain(text.encode_utf16().flat_map(u16::to_be_bytes))
                .collect(),
            Self::Utf32Le => text.chars().flat_map(|c| u32::from(c).to_le_bytes()).collect(),
            Self::Utf32Be => text.chars().flat_map(|c| u32::from(c).to_be_bytes()).collect(),
            Self::Utf32 => bom(text, &[0x00, 0x00, 0xFE, 0xFF])
                .chain(text.chars().flat_map(|c| u32::from(c).to_be_bytes()))
                .collect(),
            Self::UsAscii | Self::Ascii8Bit => self.narrow(text, 0x7F)?,
            Self::Latin1 => self.narrow(text, 0xFF)?,
        };
        Ok(bytes)
    }

    fn narrow(self, text: &str, max: u32) -> Result<Vec<u8>, CommandError> {
        text.chars()
            .map(|ch| {
                u8::try_from(u32::from(ch))
                    .ok()
                    .filter(|&b| u32::from(b) <= max)
                    .ok_or(CommandError::Unencodable {
                        ch,
                        encoding: self.name(),
                    })
            })
            .collect()
    }
}

/// Byte order mark for `text`, empty when there is nothing to mark.
fn bom<'a>(text: &str, mark: &'a [u8]) -> impl Iterator<Item = u8> + 'a {
    let len = if text.is_empty() { 0 } else { mark.len() };
    mark[..len].iter().copied()
}
