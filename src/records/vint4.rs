// vint4.rs
use super::VINT4_SIZE;
use crate::{
    Result,
    records::common::{read_i32, validate_buffer_size},
};

/// Scaled integer: a signed power-of-ten exponent and a signed mantissa.
///
/// The physical value is `mantissa / 10^exponent`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct VInt4 {
    pub exponent: i8,
    pub mantissa: i32,
}

impl VInt4 {
    pub fn new(exponent: i8, mantissa: i32) -> Self {
        Self { exponent, mantissa }
    }

    /// Encode `value` at the given exponent, rounding to the nearest mantissa.
    pub fn encode(value: f64, exponent: i8) -> Self {
        let mantissa = (value * 10f64.powi(i32::from(exponent))).round() as i32;
        Self { exponent, mantissa }
    }

    /// Parse the 5-byte big-endian encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        validate_buffer_size(bytes, VINT4_SIZE)?;
        Ok(Self {
            exponent: bytes[0] as i8,
            mantissa: read_i32(bytes, 1),
        })
    }

    pub fn to_bytes(&self) -> [u8; VINT4_SIZE] {
        let mut out = [0u8; VINT4_SIZE];
        out[0] = self.exponent as u8;
        out[1..5].copy_from_slice(&self.mantissa.to_be_bytes());
        out
    }

    /// Physical value.
    pub fn value(&self) -> f64 {
        f64::from(self.mantissa) / 10f64.powi(i32::from(self.exponent))
    }
}
