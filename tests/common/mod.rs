//! Synthetic IASI products shared by the integration tests.
#![allow(dead_code)]

use eps_rs::{
    DecodedValue, EpsWriter, HeaderRecord, InstrumentGroup, RecordBuilder, RecordClass, RecordKey,
    Result, SchemaRegistry, ShortCdsTime, VInt4,
    iasi::{CHANNEL_COUNT, EFOV_PER_MDR, IFOV_PER_EFOV, planck},
};
use std::sync::Arc;

pub const PRODUCT_NAME: &str = "IASI_xxx_1C_M02_20240101000000Z_20240101000259Z_N_O_20240101010000Z";

/// Sample number of channel 0.
pub const FIRST_SAMPLE: i64 = 2581;
/// Sample number of the last valid channel.
pub const LAST_SAMPLE: i64 = 11041;
/// Spectral sample spacing, m⁻¹.
pub const SAMPLE_SPACING: f64 = 25.0;
/// Exponent of the scale range covering channels 0..=9.
pub const LOW_EXPONENT: i32 = 1;
/// Exponent of the scale range covering every other channel.
pub const HIGH_EXPONENT: i32 = 7;
/// Black body temperature encoded in the filled pixels.
pub const SCENE_TEMPERATURE: f64 = 280.0;

pub fn scale_factor_key() -> RecordKey {
    RecordKey::new(RecordClass::Giadr, InstrumentGroup::Iasi, 1)
}

pub fn mdr_key() -> RecordKey {
    RecordKey::new(RecordClass::Mdr, InstrumentGroup::Iasi, 2)
}

pub fn registry() -> Result<Arc<SchemaRegistry>> {
    Ok(Arc::new(SchemaRegistry::iasi()?))
}

pub fn mphr(total_mdr: u64) -> HeaderRecord {
    HeaderRecord::new(
        RecordClass::Mphr,
        vec![
            ("PRODUCT_NAME".to_string(), PRODUCT_NAME.to_string()),
            ("INSTRUMENT_ID".to_string(), "IASI".to_string()),
            ("TOTAL_MDR".to_string(), format!("{total_mdr:+013}")),
        ],
    )
}

pub fn wavenumber(channel: usize) -> f64 {
    SAMPLE_SPACING * (FIRST_SAMPLE + channel as i64 - 1) as f64
}

pub fn multiplier(channel: usize) -> f64 {
    if channel < 10 {
        10f64.powi(-LOW_EXPONENT)
    } else {
        10f64.powi(-HIGH_EXPONENT)
    }
}

/// Raw spectrum counts of a black body at [`SCENE_TEMPERATURE`].
pub fn scene_counts() -> Vec<DecodedValue> {
    let channels = (LAST_SAMPLE - FIRST_SAMPLE + 1) as usize;
    (0..channels.min(CHANNEL_COUNT))
        .map(|c| {
            if c < 10 {
                // low range only holds small test counts
                DecodedValue::SignedInteger(c as i64 + 1)
            } else {
                let counts = planck::radiance(wavenumber(c), SCENE_TEMPERATURE) / multiplier(c);
                DecodedValue::SignedInteger(counts.round() as i64)
            }
        })
        .collect()
}

pub fn longitude(mdr: u64, efov: u64) -> f64 {
    10.0 + mdr as f64 + efov as f64 * 0.25
}

pub fn latitude(ifov: u64) -> f64 {
    -5.0 + ifov as f64 * 0.5
}

pub fn efov_time(mdr: u64, efov: u64) -> ShortCdsTime {
    ShortCdsTime::new(9000 + mdr as u16, 1000 * efov as u32)
}

/// Pixels whose spectrum is filled with [`scene_counts`].
pub fn filled_pixels() -> [(u64, u64); 2] {
    [(0, 0), (1, 2)]
}

/// Scale factor record with channel ranges `[0, 9] -> 10^-1` and
/// `[10, 8699] -> 10^-7`.
pub fn scale_factor_body(registry: &SchemaRegistry) -> Result<Vec<u8>> {
    let mut builder = RecordBuilder::for_type(registry, "giadr:iasi:1")?;
    builder
        .set("IDefScaleSondNbScale", DecodedValue::SignedInteger(2))?
        .set_values(
            "IDefScaleSondNsfirst",
            &[DecodedValue::SignedInteger(0), DecodedValue::SignedInteger(10)],
        )?
        .set_values(
            "IDefScaleSondNslast",
            &[
                DecodedValue::SignedInteger(9),
                DecodedValue::SignedInteger(CHANNEL_COUNT as i64 - 1),
            ],
        )?
        .set_values(
            "IDefScaleSondScaleFactor",
            &[
                DecodedValue::SignedInteger(LOW_EXPONENT.into()),
                DecodedValue::SignedInteger(HIGH_EXPONENT.into()),
            ],
        )?
        .set("IDefScaleIISScaleFactor", DecodedValue::SignedInteger(4))?;
    Ok(builder.into_bytes())
}

pub fn mdr_body(registry: &SchemaRegistry, mdr: u64) -> Result<Vec<u8>> {
    let mut builder = RecordBuilder::for_type(registry, "mdr:iasi:2")?;
    builder
        .set_vint4("IDefSpectDWn1b", VInt4::new(0, SAMPLE_SPACING as i32))?
        .set("IDefNsfirst1b", DecodedValue::SignedInteger(FIRST_SAMPLE))?
        .set("IDefNslast1b", DecodedValue::SignedInteger(LAST_SAMPLE))?;

    for efov in 0..EFOV_PER_MDR {
        builder.set_time(&format!("GEPSDatIasi[{efov}]"), efov_time(mdr, efov))?;
        for ifov in 0..IFOV_PER_EFOV {
            let micro = |deg: f64| DecodedValue::SignedInteger((deg * 1e6).round() as i64);
            builder
                .set_values(
                    &format!("GGeoSondLoc[{efov}][{ifov}]"),
                    &[micro(longitude(mdr, efov)), micro(latitude(ifov))],
                )?
                .set_values(
                    &format!("GGeoSondAnglesMETOP[{efov}][{ifov}]"),
                    &[micro(20.0 + ifov as f64), micro(100.0)],
                )?
                .set_values(
                    &format!("GGeoSondAnglesSUN[{efov}][{ifov}]"),
                    &[micro(45.5), micro(-120.25)],
                )?
                .set(
                    &format!("GEUMAvhrr1BCldFrac[{efov}][{ifov}]"),
                    DecodedValue::UnsignedInteger(efov + ifov),
                )?
                .set(
                    &format!("GEUMAvhrr1BLandFrac[{efov}][{ifov}]"),
                    DecodedValue::UnsignedInteger(100 - efov),
                )?;
        }
    }

    let counts = scene_counts();
    for (efov, ifov) in filled_pixels() {
        builder.set_values(&format!("GS1cSpect[{efov}][{ifov}]"), &counts)?;
    }
    Ok(builder.into_bytes())
}

/// A level 1C product: MPHR, a scale factor GIADR and `mdr_count` MDRs.
pub fn iasi_product(mdr_count: u64) -> Result<Vec<u8>> {
    let registry = registry()?;
    let mut writer = EpsWriter::in_memory();
    writer.write_header(&mphr(mdr_count))?;
    let giadr = writer.write_pointer(scale_factor_key())?;
    let mdrs = writer.write_pointer(mdr_key())?;

    writer.begin_run(giadr)?;
    writer.write_record(scale_factor_key(), 3, &scale_factor_body(&registry)?)?;
    writer.begin_run(mdrs)?;
    for mdr in 0..mdr_count {
        writer.write_record(mdr_key(), 5, &mdr_body(&registry, mdr)?)?;
    }
    Ok(writer.finish()?.into_inner())
}

/// A unique path in the temporary directory, removed first if present.
pub fn temp_path(name: &str) -> Result<std::path::PathBuf> {
    let path = std::env::temp_dir().join(format!("eps_rs_{}_{}", std::process::id(), name));
    if path.exists() {
        std::fs::remove_file(&path)?;
    }
    Ok(path)
}

pub fn levels_key() -> RecordKey {
    RecordKey::new(RecordClass::Giadr, InstrumentGroup::IasiL2, 1)
}

pub fn l2_mdr_key() -> RecordKey {
    RecordKey::new(RecordClass::Mdr, InstrumentGroup::IasiL2, 4)
}

/// Vertical grids of one `giadr-pressure-levels` record, as stored.
pub struct Levels<'a> {
    pub temperature: &'a [u32],
    pub humidity: &'a [u32],
    pub ozone: &'a [u32],
    pub wavelengths: &'a [u32],
    pub pcs: [u8; 3],
    pub co_heights: &'a [u16],
}

/// Hand-encoded pressure level record body: every array is preceded by its
/// one-byte length.
pub fn levels_body(levels: &Levels<'_>) -> Vec<u8> {
    let mut body = Vec::new();
    for grid in [levels.temperature, levels.humidity, levels.ozone, levels.wavelengths] {
        body.push(grid.len() as u8);
        for v in grid {
            body.extend_from_slice(&v.to_be_bytes());
        }
    }
    body.extend_from_slice(&levels.pcs);
    body.push(levels.co_heights.len() as u8);
    for h in levels.co_heights {
        body.extend_from_slice(&h.to_be_bytes());
    }
    body
}

pub fn sample_levels() -> Levels<'static> {
    Levels {
        temperature: &[10_132_500, 5_000_000, 1_000_000],
        humidity: &[10_132_500, 3_000_000],
        ozone: &[2_000_000],
        wavelengths: &[38_000, 120_000],
        pcs: [28, 18, 10],
        co_heights: &[1000, 2000],
    }
}

pub fn short_levels() -> Levels<'static> {
    Levels {
        temperature: &[7_000_000],
        humidity: &[],
        ozone: &[],
        wavelengths: &[],
        pcs: [0, 0, 0],
        co_heights: &[],
    }
}

/// A level 2 product: two pressure level records of different sizes and
/// `mdr_count` MDRs of a type the catalog does not know.
pub fn l2_product(mdr_count: u64) -> Result<Vec<u8>> {
    let mut writer = EpsWriter::in_memory();
    writer.write_header(&mphr(mdr_count))?;
    let levels = writer.write_pointer(levels_key())?;
    let mdrs = writer.write_pointer(l2_mdr_key())?;

    writer.begin_run(levels)?;
    writer.write_record(levels_key(), 2, &levels_body(&sample_levels()))?;
    writer.write_record(levels_key(), 2, &levels_body(&short_levels()))?;
    writer.begin_run(mdrs)?;
    for mdr in 0..mdr_count {
        writer.write_record(l2_mdr_key(), 1, &[mdr as u8; 16])?;
    }
    Ok(writer.finish()?.into_inner())
}
