// records/common.rs
//! Byte parsing helpers shared by the fixed-format record codecs.
//!
//! Everything in an EPS product is big-endian, so unlike most binary
//! formats there is a single set of readers here.

use crate::{Error, Result};

// ============================================================================
// Byte Parsing Helpers
// ============================================================================

/// Read a u32 from a byte slice at the given offset (big-endian).
///
/// # Panics
/// Panics if `offset + 4 > bytes.len()`. Call [`validate_buffer_size`] first.
#[inline]
pub fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Read an i32 from a byte slice at the given offset (big-endian).
#[inline]
pub fn read_i32(bytes: &[u8], offset: usize) -> i32 {
    read_u32(bytes, offset) as i32
}

/// Read a u16 from a byte slice at the given offset (big-endian).
#[inline]
pub fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([bytes[offset], bytes[offset + 1]])
}

/// Read a u8 from a byte slice at the given offset.
#[inline]
pub fn read_u8(bytes: &[u8], offset: usize) -> u8 {
    bytes[offset]
}

// ============================================================================
// Validation Helpers
// ============================================================================

/// Validate that a buffer has at least `expected` bytes.
///
/// Returns `Err(TooShortBuffer)` if the buffer is too small.
#[inline]
pub fn validate_buffer_size(bytes: &[u8], expected: usize) -> Result<()> {
    if bytes.len() < expected {
        return Err(Error::TooShortBuffer {
            actual: bytes.len(),
            expected,
            file: file!(),
            line: line!(),
        });
    }
    Ok(())
}

/// Safely convert a u64 offset/length to usize for indexing.
///
/// On 32-bit systems, returns an error if the value exceeds `usize::MAX`.
#[inline]
pub fn u64_to_usize(value: u64, context: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| {
        Error::IOError(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!(
                "{} value {} exceeds maximum addressable size on this platform",
                context, value
            ),
        ))
    })
}
