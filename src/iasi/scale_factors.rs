// scale_factors.rs
use crate::{Error, Result, engine::CompoundInstance};
use log::warn;

/// Spectral samples per IASI L1C spectrum.
pub const CHANNEL_COUNT: usize = 8700;
/// Range slots in the scale factor record.
pub const MAX_SCALE_RANGES: usize = 10;

/// One `[first, last] -> 10^-exponent` range.
///
/// Bounds are channel indices for [`ChannelScaleFactors::from_ranges`] and
/// sample numbers for [`ChannelScaleFactors::from_sample_ranges`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleRange {
    pub first: i64,
    pub last: i64,
    pub exponent: i32,
}

/// Dense per-channel radiance multipliers.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelScaleFactors {
    multipliers: Vec<f64>,
    iis_exponent: i32,
}

impl ChannelScaleFactors {
    /// Build the table from ranges expressed in channel indices.
    ///
    /// Ranges apply in order, so a later range overwrites an earlier one
    /// where they overlap. Channels outside the table are ignored; channels
    /// no range covers keep a multiplier of 1.0.
    pub fn from_ranges(ranges: &[ScaleRange], iis_exponent: i32) -> Self {
        Self::from_sample_ranges(ranges, 0, iis_exponent)
    }

    /// Build the table from ranges in sample numbers, where channel 0 is
    /// sample `first_sample`.
    pub fn from_sample_ranges(ranges: &[ScaleRange], first_sample: i64, iis_exponent: i32) -> Self {
        let mut multipliers = vec![1.0; CHANNEL_COUNT];
        for range in ranges {
            let multiplier = 10f64.powi(-range.exponent);
            let first = (range.first - first_sample).max(0);
            let last = (range.last - first_sample).min(CHANNEL_COUNT as i64 - 1);
            for channel in first..=last {
                multipliers[channel as usize] = multiplier;
            }
        }
        Self {
            multipliers,
            iis_exponent,
        }
    }

    /// Build the table from a `giadr-scalefactors` record whose range
    /// bounds are channel indices.
    ///
    /// Only the first `IDefScaleSondNbScale` range slots are used.
    pub fn from_record(record: &CompoundInstance) -> Result<Self> {
        let (ranges, iis_exponent) = read_ranges(record)?;
        Ok(Self::from_ranges(&ranges, iis_exponent))
    }

    /// Build the table from a `giadr-scalefactors` record whose range
    /// bounds are sample numbers, with channel 0 at `first_sample`.
    pub fn from_sample_record(record: &CompoundInstance, first_sample: i64) -> Result<Self> {
        let (ranges, iis_exponent) = read_ranges(record)?;
        Ok(Self::from_sample_ranges(&ranges, first_sample, iis_exponent))
    }

    /// Multiplier applied to raw spectrum values of `channel`.
    pub fn multiplier(&self, channel: usize) -> Result<f64> {
        self.multipliers
            .get(channel)
            .copied()
            .ok_or(Error::IndexOutOfRange {
                index: channel as u64,
                len: CHANNEL_COUNT as u64,
            })
    }

    pub fn multipliers(&self) -> &[f64] {
        &self.multipliers
    }

    /// Exponent of the IIS imager scale factor.
    pub fn iis_exponent(&self) -> i32 {
        self.iis_exponent
    }
}

/// Range slots and IIS exponent of a `giadr-scalefactors` record.
fn read_ranges(record: &CompoundInstance) -> Result<(Vec<ScaleRange>, i32)> {
    let declared = record
        .value("IDefScaleSondNbScale")?
        .as_i64()
        .unwrap_or(0)
        .max(0) as usize;
    if declared > MAX_SCALE_RANGES {
        warn!("Scale factor record declares {declared} ranges, using {MAX_SCALE_RANGES}");
    }
    let n = declared.min(MAX_SCALE_RANGES) as u64;

    let firsts = record.sequence("IDefScaleSondNsfirst")?.values_range(0, n)?;
    let lasts = record.sequence("IDefScaleSondNslast")?.values_range(0, n)?;
    let exponents = record
        .sequence("IDefScaleSondScaleFactor")?
        .values_range(0, n)?;

    let ranges: Vec<ScaleRange> = firsts
        .iter()
        .zip(&lasts)
        .zip(&exponents)
        .map(|((first, last), exponent)| ScaleRange {
            first: first.as_i64().unwrap_or(0),
            last: last.as_i64().unwrap_or(-1),
            exponent: exponent.as_i64().unwrap_or(0) as i32,
        })
        .collect();
    let iis_exponent = record
        .value("IDefScaleIISScaleFactor")?
        .as_i64()
        .unwrap_or(0) as i32;
    Ok((ranges, iis_exponent))
}
