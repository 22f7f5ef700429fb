//! Wide integer values accepted by the integer encoders.

use std::fmt;

/// A signed integer with a full 128-bit magnitude.
///
/// Integer arguments must host every unsigned 128-bit value as well as its
/// negation, which no native type does, so the value is kept as a sign and a
/// magnitude. Zero is never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Int {
    negative: bool,
    magnitude: u128,
}

impl Int {
    /// The value zero.
    pub const ZERO: Self = Self {
        negative: false,
        magnitude: 0,
    };

    /// Builds a value from a sign and a magnitude.
    #[must_use]
    pub const fn new(negative: bool, magnitude: u128) -> Self {
        Self {
            negative: negative && magnitude != 0,
            magnitude,
        }
    }

    /// Builds a non-negative value.
    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self::new(false, value)
    }

    /// Builds a value from a native signed integer.
    #[must_use]
    pub const fn from_i128(value: i128) -> Self {
        Self::new(value < 0, value.unsigned_abs())
    }

    /// Returns true for values below zero.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.negative
    }

    /// Returns `|self|`.
    #[must_use]
    pub const fn magnitude(self) -> u128 {
        self.magnitude
    }

    /// Number of bits needed for `|self|`; zero has bit-length 0.
    #[must_use]
    pub const fn bit_length(self) -> u32 {
        u128::BITS - self.magnitude.leading_zeros()
    }

    /// Returns true when `|self|` fits in `width` bits.
    #[must_use]
    pub const fn fits_width(self, width: u32) -> bool {
        self.bit_length() <= width
    }

    /// Low 128 bits of the two's-complement representation.
    #[must_use]
    pub const fn to_twos_complement(self) -> u128 {
        if self.negative {
            self.magnitude.wrapping_neg()
        } else {
            self.magnitude
        }
    }

    /// Two's-complement truncation to `width` bits (at most 64).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn truncate(self, width: u32) -> u64 {
        let bits = self.to_twos_complement() as u64;
        if width >= u64::BITS {
            bits
        } else {
            bits & ((1u64 << width) - 1)
        }
    }

    /// Arithmetic shift right by 64 bits, rounding toward negative infinity.
    #[must_use]
    pub const fn high_half(self) -> Self {
        if self.negative {
            Self::new(true, ((self.magnitude - 1) >> 64) + 1)
        } else {
            Self::new(false, self.magnitude >> 64)
        }
    }

    /// `self & (2^64 - 1)` under two's-complement semantics; never negative.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn low_half(self) -> Self {
        Self::from_u128(self.to_twos_complement() as u64 as u128)
    }

    /// Nearest double-precision value.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_f64(self) -> f64 {
        let magnitude = self.magnitude as f64;
        if self.negative {
            -magnitude
        } else {
            magnitude
        }
    }

    /// Converts to `usize` when the value is non-negative and in range.
    #[must_use]
    pub fn to_usize(self) -> Option<usize> {
        if self.negative {
            None
        } else {
            usize::try_from(self.magnitude).ok()
        }
    }
}

macro_rules! int_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Int {
            #[allow(clippy::cast_lossless)]
            fn from(value: $t) -> Self {
                Self::from_u128(value as u128)
            }
        })*
    };
}

macro_rules! int_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Int {
            #[allow(clippy::cast_lossless)]
            fn from(value: $t) -> Self {
                Self::from_i128(value as i128)
            }
        })*
    };
}

int_from_unsigned!(u8, u16, u32, u64, u128, usize);
int_from_signed!(i8, i16, i32, i64, i128, isize);

impl fmt::Display for Int {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "-{}", self.magnitude)
        } else {
            write!(f, "{}", self.magnitude)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Int;

    #[test]
    fn negative_zero_normalizes() {
        assert_eq!(Int::new(true, 0), Int::ZERO);
        assert!(!Int::new(true, 0).is_negative());
    }

    #[test]
    fn bit_length_uses_magnitude() {
        assert_eq!(Int::ZERO.bit_length(), 0);
        assert_eq!(Int::from(255u8).bit_length(), 8);
        assert_eq!(Int::from(256u16).bit_length(), 9);
        assert_eq!(Int::from(-128i16).bit_length(), 8);
        assert_eq!(Int::from(-256i16).bit_length(), 9);
        assert_eq!(Int::from_u128(u128::MAX).bit_length(), 128);
    }

    #[test]
    fn truncation_is_twos_complement() {
        assert_eq!(Int::from(-1i8).truncate(8), 0xFF);
        assert_eq!(Int::from(-1i8).truncate(64), u64::MAX);
        assert_eq!(Int::from(-10i8).truncate(16), 0xFFF6);
        assert_eq!(Int::from(0x1_23u16).truncate(8), 0x23);
    }

    #[test]
    fn halves_follow_floor_shift_and_mask() {
        assert_eq!(Int::from(-1i8).high_half(), Int::from(-1i8));
        assert_eq!(Int::from(-1i8).low_half(), Int::from(u64::MAX));

        let min_64 = Int::new(true, 1u128 << 64);
        assert_eq!(min_64.high_half(), Int::from(-1i8));
        assert_eq!(min_64.low_half(), Int::ZERO);

        let below = Int::new(true, (1u128 << 64) + 1);
        assert_eq!(below.high_half(), Int::from(-2i8));
        assert_eq!(below.low_half(), Int::from(u64::MAX));

        let big = Int::from_u128(u128::MAX);
        assert_eq!(big.high_half(), Int::from(u64::MAX));
        assert_eq!(big.low_half(), Int::from(u64::MAX));
    }

    #[test]
    fn display_includes_sign() {
        assert_eq!(Int::from(-10i8).to_string(), "-10");
        assert_eq!(Int::from(42u8).to_string(), "42");
    }

    #[test]
    fn usize_conversion_rejects_negative() {
        assert_eq!(Int::from(5u8).to_usize(), Some(5));
        assert_eq!(Int::from(-5i8).to_usize(), None);
    }
}
