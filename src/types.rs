//! Shared value types used across the library.

/// An enum representing a decoded primitive value.
///
/// Every simple type of a schema decodes to one of these variants; integers
/// keep their signedness so callers can tell a raw `u32` flag word from a
/// signed scaled quantity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecodedValue {
    /// Unsigned integer (up to 64 bits)
    UnsignedInteger(u64),
    /// Signed integer (up to 64 bits)
    SignedInteger(i64),
    /// Floating point value (32 or 64 bit)
    Float(f64),
}

impl DecodedValue {
    /// Returns true if this is an integer value (signed or unsigned).
    #[inline]
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DecodedValue::UnsignedInteger(_) | DecodedValue::SignedInteger(_)
        )
    }

    /// Returns true if this is a floating point value.
    #[inline]
    pub fn is_float(&self) -> bool {
        matches!(self, DecodedValue::Float(_))
    }

    /// Attempts to convert to f64, useful for numeric operations.
    pub fn as_f64(&self) -> f64 {
        match self {
            DecodedValue::UnsignedInteger(v) => *v as f64,
            DecodedValue::SignedInteger(v) => *v as f64,
            DecodedValue::Float(v) => *v,
        }
    }

    /// Returns the value as a signed integer, or `None` for floats and
    /// unsigned values that do not fit.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DecodedValue::UnsignedInteger(v) => i64::try_from(*v).ok(),
            DecodedValue::SignedInteger(v) => Some(*v),
            DecodedValue::Float(_) => None,
        }
    }

    /// Returns the value as an unsigned integer, or `None` for floats and
    /// negative values.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            DecodedValue::UnsignedInteger(v) => Some(*v),
            DecodedValue::SignedInteger(v) => u64::try_from(*v).ok(),
            DecodedValue::Float(_) => None,
        }
    }
}

impl core::fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DecodedValue::UnsignedInteger(v) => write!(f, "{v}"),
            DecodedValue::SignedInteger(v) => write!(f, "{v}"),
            DecodedValue::Float(v) => write!(f, "{v}"),
        }
    }
}
