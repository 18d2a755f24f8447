//! IASI level 1C and level 2 decoding.
//!
//! [`IasiProduct`] turns the generic records of an IASI product into
//! physical quantities: geolocation, calibrated spectra and brightness
//! temperatures, addressed by flat observation id (see [`Observation`]).
//!
//! # Example
//!
//! ```no_run
//! use eps_rs::{SchemaRegistry, iasi::IasiProduct};
//! use std::sync::Arc;
//!
//! fn main() -> eps_rs::Result<()> {
//!     let registry = Arc::new(SchemaRegistry::iasi()?);
//!     let product = IasiProduct::open("IASI_xxx_1C_M02.nat", registry)?;
//!
//!     let pos = product.channel_geolocation(0)?;
//!     let bt = product.brightness_temperature(0, 1000)?;
//!     println!("{} pixels, first at {:.3}/{:.3}: {:.2} K",
//!         product.mdr_count() * 120, pos.lat, pos.lon, bt);
//!     Ok(())
//! }
//! ```

mod l2;
mod observation;
pub mod planck;
mod scale_factors;

pub use l2::{PRESSURE_LEVELS_RECORD, PressureLevels};
pub use observation::{EFOV_PER_MDR, IFOV_PER_EFOV, IFOV_PER_MDR, Observation};
pub use planck::BRIGHTNESS_TEMPERATURE_NO_DATA;
pub use scale_factors::{CHANNEL_COUNT, ChannelScaleFactors, MAX_SCALE_RANGES, ScaleRange};

use crate::{
    Error, Result,
    engine::{CompoundInstance, SequenceInstance},
    product::EpsProduct,
    records::{HeaderRecord, ShortCdsTime, VInt4},
    schema::SchemaRegistry,
};
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::Arc;

/// The IASI type catalog shipped with the crate.
pub const CATALOG: &str = include_str!("../../schemas/iasi.json");

/// Name of the channel scale factor record type.
pub const SCALE_FACTOR_RECORD: &str = "giadr-scalefactors";

impl SchemaRegistry {
    /// Generic types plus the IASI catalog.
    pub fn iasi() -> Result<Self> {
        Self::from_catalog(CATALOG)
    }
}

/// Latitude and longitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPosition {
    pub lat: f64,
    pub lon: f64,
}

/// One spectrum sample: wavenumber (m⁻¹) and radiance (W/(m²·sr·m⁻¹)).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralSample {
    pub wavenumber: f64,
    pub radiance: f64,
}

/// Viewing geometry and context of one pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct IfovInfo {
    pub observation: Observation,
    pub position: GeoPosition,
    pub satellite_zenith: f64,
    pub satellite_azimuth: f64,
    pub sun_zenith: f64,
    pub sun_azimuth: f64,
    /// AVHRR cloud fraction in the pixel, percent.
    pub cloud_fraction: u8,
    /// AVHRR land fraction in the pixel, percent.
    pub land_fraction: u8,
    pub time: ShortCdsTime,
}

/// An open IASI L1C product.
#[derive(Debug)]
pub struct IasiProduct {
    product: EpsProduct,
    mdrs: Arc<SequenceInstance>,
    scale_factors: OnceCell<ChannelScaleFactors>,
}

/// Both values of a `[efov][ifov][2]` member, divided by its scale factor.
fn scaled_pair(mdr: &CompoundInstance, name: &str, obs: &Observation) -> Result<(f64, f64)> {
    let scale = mdr
        .compound_type()
        .member(name)
        .and_then(|(_, m)| m.meta.as_ref())
        .and_then(|meta| meta.scale_factor)
        .unwrap_or(0);
    let divisor = 10f64.powi(scale);
    let pair = mdr
        .sequence(name)?
        .sequence(obs.efov)?
        .sequence(obs.ifov)?
        .values_range(0, 2)?;
    Ok((pair[0].as_f64() / divisor, pair[1].as_f64() / divisor))
}

fn pixel_u8(mdr: &CompoundInstance, name: &str, obs: &Observation) -> Result<u8> {
    let value = mdr.sequence(name)?.sequence(obs.efov)?.value(obs.ifov)?;
    value
        .as_u64()
        .and_then(|v| u8::try_from(v).ok())
        .ok_or_else(|| Error::TypeMismatch {
            expected: "percentage",
            found: value.to_string(),
        })
}

fn int_field(mdr: &CompoundInstance, name: &str) -> Result<i64> {
    let value = mdr.value(name)?;
    value.as_i64().ok_or_else(|| Error::TypeMismatch {
        expected: "integer",
        found: value.to_string(),
    })
}

impl IasiProduct {
    /// Open an IASI product file.
    ///
    /// # Arguments
    /// * `path` - Path to the product file.
    /// * `registry` - Types used to decode the records, usually
    ///   [`SchemaRegistry::iasi`].
    pub fn open(path: impl AsRef<Path>, registry: Arc<SchemaRegistry>) -> Result<Self> {
        Self::from_product(EpsProduct::from_file(path, registry)?)
    }

    /// Wrap an opened product; fails with [`Error::MissingRecord`] when it
    /// has no typed MDR run.
    pub fn from_product(product: EpsProduct) -> Result<Self> {
        let mdrs = product
            .mdr_sequence()?
            .ok_or_else(|| Error::MissingRecord("mdr".to_string()))?;
        Ok(Self {
            product,
            mdrs,
            scale_factors: OnceCell::new(),
        })
    }

    /// The generic product underneath.
    pub fn product(&self) -> &EpsProduct {
        &self.product
    }

    /// Main product header.
    pub fn mphr(&self) -> &HeaderRecord {
        self.product.mphr()
    }

    /// Number of measurement data records; every one holds
    /// [`IFOV_PER_MDR`] pixels.
    pub fn mdr_count(&self) -> u64 {
        self.mdrs.len()
    }

    /// Measurement data record `index`. Repeated calls return the same
    /// instance.
    pub fn mdr(&self, index: u64) -> Result<Arc<CompoundInstance>> {
        self.mdrs.compound(index)
    }

    fn locate(&self, id: u64) -> Result<(Observation, Arc<CompoundInstance>)> {
        let obs = Observation::checked_from_id(id, self.mdr_count())?;
        Ok((obs, self.mdr(obs.mdr)?))
    }

    fn scale_factor_record(&self) -> Result<Arc<CompoundInstance>> {
        let records = self
            .product
            .aux_data_record(SCALE_FACTOR_RECORD)?
            .filter(|records| !records.is_empty())
            .ok_or_else(|| Error::MissingRecord(SCALE_FACTOR_RECORD.to_string()))?;
        records.compound(0)
    }

    /// Per-channel radiance multipliers, read from the scale factor record
    /// on first use. Range bounds are taken as channel indices.
    ///
    /// # Errors
    /// [`Error::MissingRecord`] when the product has no scale factor record.
    pub fn scale_factors(&self) -> Result<&ChannelScaleFactors> {
        self.scale_factors.get_or_try_init(|| {
            let record = self.scale_factor_record()?;
            ChannelScaleFactors::from_record(&record)
        })
    }

    /// Multipliers for products whose scale ranges are sample numbers:
    /// bounds are shifted so that `IDefNsfirst1b` of the first MDR is
    /// channel 0.
    pub fn sample_scale_factors(&self) -> Result<ChannelScaleFactors> {
        let record = self.scale_factor_record()?;
        let first_sample = if self.mdrs.is_empty() {
            0
        } else {
            let mdr = self.mdr(0)?;
            int_field(&mdr, "IDefNsfirst1b")?
        };
        ChannelScaleFactors::from_sample_record(&record, first_sample)
    }

    /// Multiplier of one channel, see [`IasiProduct::scale_factors`].
    pub fn scale_multiplier(&self, channel: usize) -> Result<f64> {
        self.scale_factors()?.multiplier(channel)
    }

    /// Centre of pixel `id`.
    ///
    /// # Errors
    /// [`Error::InvalidObservation`] when `id` is past the last pixel.
    pub fn channel_geolocation(&self, id: u64) -> Result<GeoPosition> {
        let (obs, mdr) = self.locate(id)?;
        let (lon, lat) = scaled_pair(&mdr, "GGeoSondLoc", &obs)?;
        Ok(GeoPosition { lat, lon })
    }

    /// Acquisition time of the scan position holding pixel `id`.
    pub fn observation_time(&self, id: u64) -> Result<ShortCdsTime> {
        let (obs, mdr) = self.locate(id)?;
        ShortCdsTime::from_bytes(&mdr.sequence("GEPSDatIasi")?.compound(obs.efov)?.raw_bytes()?)
    }

    /// Geometry, cloud and land cover and time of pixel `id`.
    pub fn ifov_info(&self, id: u64) -> Result<IfovInfo> {
        let (obs, mdr) = self.locate(id)?;
        let (lon, lat) = scaled_pair(&mdr, "GGeoSondLoc", &obs)?;
        let (satellite_zenith, satellite_azimuth) =
            scaled_pair(&mdr, "GGeoSondAnglesMETOP", &obs)?;
        let (sun_zenith, sun_azimuth) = scaled_pair(&mdr, "GGeoSondAnglesSUN", &obs)?;
        Ok(IfovInfo {
            observation: obs,
            position: GeoPosition { lat, lon },
            satellite_zenith,
            satellite_azimuth,
            sun_zenith,
            sun_azimuth,
            cloud_fraction: pixel_u8(&mdr, "GEUMAvhrr1BCldFrac", &obs)?,
            land_fraction: pixel_u8(&mdr, "GEUMAvhrr1BLandFrac", &obs)?,
            time: ShortCdsTime::from_bytes(
                &mdr.sequence("GEPSDatIasi")?.compound(obs.efov)?.raw_bytes()?,
            )?,
        })
    }

    /// Spectral grid of one record: sample spacing (m⁻¹), first sample
    /// number and number of valid channels.
    fn spectral_grid(mdr: &CompoundInstance) -> Result<(f64, i64, u64)> {
        let dwn = VInt4::from_bytes(&mdr.compound("IDefSpectDWn1b")?.raw_bytes()?)?.value();
        let first = int_field(mdr, "IDefNsfirst1b")?;
        let last = int_field(mdr, "IDefNslast1b")?;
        let channels = if last >= first {
            ((last - first + 1) as u64).min(CHANNEL_COUNT as u64)
        } else {
            CHANNEL_COUNT as u64
        };
        Ok((dwn, first, channels))
    }

    /// Calibrated spectrum of one pixel, one sample per valid channel.
    pub fn spectrum(&self, id: u64) -> Result<Vec<SpectralSample>> {
        let (obs, mdr) = self.locate(id)?;
        let (dwn, first, channels) = Self::spectral_grid(&mdr)?;
        let scale = self.scale_factors()?;
        let raw = mdr
            .sequence("GS1cSpect")?
            .sequence(obs.efov)?
            .sequence(obs.ifov)?
            .values_range(0, channels)?;

        Ok(raw
            .iter()
            .zip(scale.multipliers())
            .enumerate()
            .map(|(c, (value, multiplier))| SpectralSample {
                wavenumber: dwn * (first + c as i64 - 1) as f64,
                radiance: value.as_f64() * multiplier,
            })
            .collect())
    }

    /// Brightness temperature (K) of one channel of one pixel, or
    /// [`BRIGHTNESS_TEMPERATURE_NO_DATA`] for non-physical radiances.
    pub fn brightness_temperature(&self, id: u64, channel: usize) -> Result<f64> {
        let (obs, mdr) = self.locate(id)?;
        let (dwn, first, channels) = Self::spectral_grid(&mdr)?;
        if channel as u64 >= channels {
            return Err(Error::IndexOutOfRange {
                index: channel as u64,
                len: channels,
            });
        }
        let raw = mdr
            .sequence("GS1cSpect")?
            .sequence(obs.efov)?
            .sequence(obs.ifov)?
            .value(channel as u64)?;
        let radiance = raw.as_f64() * self.scale_multiplier(channel)?;
        let wavenumber = dwn * (first + channel as i64 - 1) as f64;
        Ok(planck::brightness_temperature(wavenumber, radiance))
    }
}
