// time.rs
use super::SHORT_CDS_TIME_SIZE;
use crate::{
    Result,
    records::common::{read_u16, read_u32, validate_buffer_size},
};

/// Seconds between the Unix epoch (1970) and the EPS epoch (2000-01-01).
pub const EPS_EPOCH_UNIX_SECONDS: i64 = 946_684_800;

const MILLIS_PER_DAY: u32 = 86_400_000;

/// Short CCSDS day-segmented time: a day count since the EPS epoch and the
/// milliseconds elapsed in that day.
///
/// The clock is treated as flat and linear; leap seconds are not modelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct ShortCdsTime {
    /// Days since 2000-01-01.
    pub day: u16,
    /// Milliseconds in the day.
    pub millis: u32,
}

impl ShortCdsTime {
    pub fn new(day: u16, millis: u32) -> Self {
        Self { day, millis }
    }

    /// Parse the 6-byte big-endian encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        validate_buffer_size(bytes, SHORT_CDS_TIME_SIZE)?;
        Ok(Self {
            day: read_u16(bytes, 0),
            millis: read_u32(bytes, 2),
        })
    }

    pub fn to_bytes(&self) -> [u8; SHORT_CDS_TIME_SIZE] {
        let mut out = [0u8; SHORT_CDS_TIME_SIZE];
        out[0..2].copy_from_slice(&self.day.to_be_bytes());
        out[2..6].copy_from_slice(&self.millis.to_be_bytes());
        out
    }

    /// Whole seconds elapsed in the day.
    pub fn seconds(&self) -> u32 {
        self.millis / 1000
    }

    /// Sub-second part, in microseconds.
    pub fn micros(&self) -> u32 {
        (self.millis % 1000) * 1000
    }

    /// Decompose into `(days, seconds, microseconds)`.
    pub fn decompose(&self) -> (u16, u32, u32) {
        (self.day, self.seconds(), self.micros())
    }

    /// Microseconds since the Unix epoch.
    pub fn to_unix_micros(&self) -> i64 {
        let secs = EPS_EPOCH_UNIX_SECONDS + i64::from(self.day) * 86_400 + i64::from(self.seconds());
        secs * 1_000_000 + i64::from(self.micros())
    }

    /// Millis values of a day or more cannot come from a valid timestamp.
    pub fn is_valid(&self) -> bool {
        self.millis < MILLIS_PER_DAY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decomposes_millis_into_seconds_and_micros() {
        let t = ShortCdsTime::new(4000, 45_296_789);
        assert_eq!(t.decompose(), (4000, 45_296, 789_000));
    }

    #[test]
    fn parses_big_endian() -> Result<()> {
        let bytes = [0x12, 0x34, 0x00, 0x01, 0x86, 0xA0];
        let t = ShortCdsTime::from_bytes(&bytes)?;
        assert_eq!(t.day, 0x1234);
        assert_eq!(t.millis, 100_000);
        assert_eq!(t.to_bytes(), bytes);
        Ok(())
    }

    #[test]
    fn epoch_is_start_of_2000() {
        assert_eq!(ShortCdsTime::default().to_unix_micros(), 946_684_800_000_000);
        // 2001-01-01 is 366 days later (2000 is a leap year)
        let t = ShortCdsTime::new(366, 1_500);
        assert_eq!(t.to_unix_micros(), (978_307_200 + 1) * 1_000_000 + 500_000);
    }

    #[test]
    fn short_buffer_is_rejected() {
        assert!(ShortCdsTime::from_bytes(&[0, 1, 2]).is_err());
    }
}
