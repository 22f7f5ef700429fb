//! Primitive encoders: fixed-width integers, IEEE-754 floats and raw strings.
//!
//! Every encoder is a pure function of its argument and a pragma snapshot and
//! produces a [`Blob`]. Warnings raised while encoding are pushed onto a note
//! list so they reach the diagnostics channel even when encoding then fails.

use std::fmt;

use crate::{
    CommandError, Diagnostic, Endian, Engine, EvalResult, Int, Invocation, PragmaSet, Registry,
};

/// Immutable encoded bytes of one value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Blob(Vec<u8>);

impl Blob {
    /// Encoded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Byte length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for a zero-length blob.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the blob.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Blob {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

/// Where a format takes its byte order from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Single byte; byte order does not apply.
    Fixed,
    /// Follows the `endian` pragma.
    Pragma,
}

/// One row of the integer command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerFormat {
    /// Command name.
    pub name: &'static str,
    /// Width in bits.
    pub width: u32,
    /// Signed commands never warn about negative values.
    pub signed: bool,
    /// Byte-order rule.
    pub order: ByteOrder,
}

/// Integer commands, generated into handlers at registration.
pub const INTEGER_FORMATS: &[IntegerFormat] = &[
    IntegerFormat::new("u8", 8, false, ByteOrder::Fixed),
    IntegerFormat::new("u16", 16, false, ByteOrder::Pragma),
    IntegerFormat::new("u32", 32, false, ByteOrder::Pragma),
    IntegerFormat::new("u64", 64, false, ByteOrder::Pragma),
    IntegerFormat::new("i8", 8, true, ByteOrder::Fixed),
    IntegerFormat::new("i16", 16, true, ByteOrder::Pragma),
    IntegerFormat::new("i32", 32, true, ByteOrder::Pragma),
    IntegerFormat::new("i64", 64, true, ByteOrder::Pragma),
];

impl IntegerFormat {
    const fn new(name: &'static str, width: u32, signed: bool, order: ByteOrder) -> Self {
        Self {
            name,
            width,
            signed,
            order,
        }
    }

    /// Table row for a command name.
    #[must_use]
    pub fn lookup(name: &str) -> Option<&'static Self> {
        INTEGER_FORMATS.iter().find(|format| format.name == name)
    }

    /// Encoded size in bytes.
    #[must_use]
    pub const fn byte_len(&self) -> usize {
        (self.width / 8) as usize
    }

    /// Encodes `value` in this format.
    ///
    /// A negative value for an unsigned format pushes a warning onto `notes`
    /// and is stored as its two's-complement truncation. The width check
    /// compares the bit-length of `|value|` with the format width.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::WidthExceeded`] when `|value|` needs more bits.
    pub fn encode(
        &self,
        value: Int,
        pragmas: &PragmaSet,
        notes: &mut Vec<Diagnostic>,
    ) -> Result<Blob, CommandError> {
        if !self.signed && value.is_negative() {
            notes.push(Diagnostic::warning(format!(
                "{value} in {} command is negative",
                self.name
            )));
        }
        if !value.fits_width(self.width) {
            return Err(CommandError::WidthExceeded {
                value,
                width: self.width,
            });
        }

        let bits = value.truncate(self.width);
        let bytes = match (self.order, pragmas.endian) {
            (ByteOrder::Pragma, Endian::Big) => bits.to_be_bytes()[8 - self.byte_len()..].to_vec(),
            _ => bits.to_le_bytes()[..self.byte_len()].to_vec(),
        };
        Ok(Blob(bytes))
    }
}

/// IEEE-754 single precision in the current byte order. NaN passes through.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn encode_f32(value: f64, pragmas: &PragmaSet) -> Blob {
    let single = value as f32;
    Blob(match pragmas.endian {
        Endian::Big => single.to_be_bytes().to_vec(),
        Endian::Little => single.to_le_bytes().to_vec(),
    })
}

/// IEEE-754 double precision in the current byte order.
///
/// # Errors
///
/// Returns [`CommandError::InvalidDouble`] for NaN.
pub fn encode_f64(value: f64, pragmas: &PragmaSet) -> Result<Blob, CommandError> {
    if value.is_nan() {
        return Err(CommandError::InvalidDouble(format!("{value:?}")));
    }
    Ok(Blob(match pragmas.endian {
        Endian::Big => value.to_be_bytes().to_vec(),
        Endian::Little => value.to_le_bytes().to_vec(),
    }))
}

/// Raw text in the current charset, without prefix or terminator.
///
/// # Errors
///
/// Returns [`CommandError::Unencodable`] when the charset lacks a character.
pub fn encode_str(text: &str, pragmas: &PragmaSet) -> Result<Blob, CommandError> {
    pragmas.encoding.encode(text).map(Blob)
}

fn integer_command(
    format: &'static IntegerFormat,
) -> impl Fn(&mut Engine<'_>, &Invocation<'_>) -> EvalResult<()> {
    move |engine: &mut Engine<'_>, call: &Invocation<'_>| {
        call.expect_arity(1, "1")?;
        let value = call.int(0)?;
        let blob = engine.encode_with(|pragmas, notes| format.encode(value, pragmas, notes))?;
        engine.emit(&blob)
    }
}

fn f32_command(engine: &mut Engine<'_>, call: &Invocation<'_>) -> EvalResult<()> {
    call.expect_arity(1, "1")?;
    let value = call.number(0)?;
    let blob = encode_f32(value, engine.pragmas());
    engine.emit(&blob)
}

fn f64_command(engine: &mut Engine<'_>, call: &Invocation<'_>) -> EvalResult<()> {
    call.expect_arity(1, "1")?;
    let value = call.number(0)?;
    let blob = encode_f64(value, engine.pragmas())?;
    engine.emit(&blob)
}

fn str_command(engine: &mut Engine<'_>, call: &Invocation<'_>) -> EvalResult<()> {
    call.expect_arity(1, "1")?;
    let text = call.text(0)?;
    let blob = encode_str(text, engine.pragmas())?;
    engine.emit(&blob)
}

pub(crate) fn register(registry: &mut Registry) {
    for format in INTEGER_FORMATS {
        registry.register(format.name, integer_command(format));
    }
    registry.register("f32", f32_command);
    registry.register("f64", f64_command);
    registry.register("str", str_command);
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{encode_f32, encode_f64, encode_str, Blob, IntegerFormat, INTEGER_FORMATS};
    use crate::{Charset, CommandError, Endian, Int, PragmaSet, Severity};

    fn big() -> PragmaSet {
        PragmaSet {
            endian: Endian::Big,
            ..PragmaSet::default()
        }
    }

    fn format(name: &str) -> &'static IntegerFormat {
        IntegerFormat::lookup(name).unwrap()
    }

    #[test]
    fn table_names_are_unique_and_widths_are_whole_bytes() {
        let names: HashSet<_> = INTEGER_FORMATS.iter().map(|f| f.name).collect();
        assert_eq!(names.len(), INTEGER_FORMATS.len());
        for format in INTEGER_FORMATS {
            assert_eq!(format.width % 8, 0);
            assert_eq!(format.byte_len() * 8, format.width as usize);
        }
    }

    #[test]
    fn u32_follows_endian() {
        let mut notes = Vec::new();
        let value = Int::from(0x0102_0304u32);
        let le = format("u32")
            .encode(value, &PragmaSet::default(), &mut notes)
            .unwrap();
        let be = format("u32").encode(value, &big(), &mut notes).unwrap();
        assert_eq!(le.as_bytes(), [0x04, 0x03, 0x02, 0x01]);
        assert_eq!(be.as_bytes(), [0x01, 0x02, 0x03, 0x04]);
        assert!(notes.is_empty());
    }

    #[test]
    fn single_byte_formats_ignore_endian() {
        let mut notes = Vec::new();
        let blob = format("i8").encode(Int::from(-2i8), &big(), &mut notes).unwrap();
        assert_eq!(blob.as_bytes(), [0xFE]);
    }

    #[test]
    fn negative_unsigned_warns_and_truncates() {
        let mut notes = Vec::new();
        let blob = format("u16")
            .encode(Int::from(-1i8), &PragmaSet::default(), &mut notes)
            .unwrap();
        assert_eq!(blob.as_bytes(), [0xFF, 0xFF]);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].severity, Severity::Warning);
        assert_eq!(notes[0].message, "-1 in u16 command is negative");
    }

    #[test]
    fn warning_is_recorded_before_width_failure() {
        let mut notes = Vec::new();
        let result = format("u8").encode(Int::from(-256i16), &PragmaSet::default(), &mut notes);
        assert_eq!(
            result,
            Err(CommandError::WidthExceeded {
                value: Int::from(-256i16),
                width: 8,
            })
        );
        assert_eq!(notes.len(), 1);
    }

    #[test]
    fn signed_formats_do_not_warn() {
        let mut notes = Vec::new();
        let blob = format("i64")
            .encode(Int::from(-1i8), &PragmaSet::default(), &mut notes)
            .unwrap();
        assert_eq!(blob.as_bytes(), [0xFF; 8]);
        assert!(notes.is_empty());
    }

    #[test]
    fn floats_follow_endian() {
        assert_eq!(
            encode_f32(1.0, &big()).as_bytes(),
            [0x3F, 0x80, 0x00, 0x00]
        );
        assert_eq!(
            encode_f64(1.0, &PragmaSet::default()).unwrap().as_bytes(),
            [0, 0, 0, 0, 0, 0, 0xF0, 0x3F]
        );
    }

    #[test]
    fn only_double_rejects_nan() {
        assert_eq!(encode_f32(f64::NAN, &PragmaSet::default()).len(), 4);
        assert_eq!(
            encode_f64(f64::NAN, &PragmaSet::default()),
            Err(CommandError::InvalidDouble("NaN".into()))
        );
        assert_eq!(
            encode_f64(f64::NAN, &PragmaSet::default())
                .unwrap_err()
                .to_string(),
            "NaN is an invalid double-precision float"
        );
    }

    #[test]
    fn str_uses_active_encoding() {
        let pragmas = PragmaSet {
            encoding: Charset::Utf16Be,
            ..PragmaSet::default()
        };
        assert_eq!(encode_str("hi", &pragmas).unwrap().as_bytes(), [0, b'h', 0, b'i']);
        assert_eq!(
            encode_str("hi", &PragmaSet::default()).unwrap().as_bytes(),
            b"hi"
        );
    }

    #[test]
    fn blob_display_is_spaced_hex() {
        assert_eq!(Blob::from(vec![0x03, 0x66, 0xAB]).to_string(), "03 66 AB");
        assert!(Blob::default().is_empty());
    }
}
