// l2.rs
//! IASI level 2 auxiliary data.

use crate::{
    Error, Result,
    engine::CompoundInstance,
    product::EpsProduct,
};

/// Name of the level 2 pressure level record type.
pub const PRESSURE_LEVELS_RECORD: &str = "giadr-pressure-levels";

/// Vertical grids of the level 2 retrievals (`giadr:iasi_l2:1`).
///
/// Pressures are in Pa, wavelengths in µm, heights in m.
#[derive(Debug, Clone, PartialEq)]
pub struct PressureLevels {
    pub temperature: Vec<f64>,
    pub humidity: Vec<f64>,
    pub ozone: Vec<f64>,
    pub surface_emissivity_wavelengths: Vec<f64>,
    pub co_layer_heights: Vec<f64>,
    pub temperature_pcs: u64,
    pub humidity_pcs: u64,
    pub ozone_pcs: u64,
}

/// Values of a sequence member divided by its catalog scale factor.
fn scaled(record: &CompoundInstance, name: &str) -> Result<Vec<f64>> {
    let scale = record
        .compound_type()
        .member(name)
        .and_then(|(_, m)| m.meta.as_ref())
        .and_then(|meta| meta.scale_factor)
        .unwrap_or(0);
    let divisor = 10f64.powi(scale);
    Ok(record
        .sequence(name)?
        .values()?
        .iter()
        .map(|v| v.as_f64() / divisor)
        .collect())
}

fn count(record: &CompoundInstance, name: &str) -> Result<u64> {
    let value = record.value(name)?;
    value.as_u64().ok_or_else(|| Error::TypeMismatch {
        expected: "unsigned count",
        found: value.to_string(),
    })
}

impl PressureLevels {
    pub fn from_record(record: &CompoundInstance) -> Result<Self> {
        Ok(Self {
            temperature: scaled(record, "PRESSURE_LEVELS_TEMP")?,
            humidity: scaled(record, "PRESSURE_LEVELS_HUMIDITY")?,
            ozone: scaled(record, "PRESSURE_LEVELS_OZONE")?,
            surface_emissivity_wavelengths: scaled(record, "SURFACE_EMISSIVITY_WAVELENGTHS")?,
            co_layer_heights: scaled(record, "FORLI_LAYER_HEIGHTS_CO")?,
            temperature_pcs: count(record, "NUM_TEMPERATURE_PCS")?,
            humidity_pcs: count(record, "NUM_WATER_VAPOUR_PCS")?,
            ozone_pcs: count(record, "NUM_OZONE_PCS")?,
        })
    }

    /// Read the first pressure level record of a level 2 product.
    pub fn from_product(product: &EpsProduct) -> Result<Self> {
        let records = product
            .aux_data_record(PRESSURE_LEVELS_RECORD)?
            .ok_or_else(|| Error::MissingRecord(PRESSURE_LEVELS_RECORD.to_string()))?;
        if records.is_empty() {
            return Err(Error::MissingRecord(PRESSURE_LEVELS_RECORD.to_string()));
        }
        let first = records.compound(0)?;
        Self::from_record(&first)
    }
}
