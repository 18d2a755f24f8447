// planck.rs
//! Planck function and its inverse in wavenumber space (SI units: m⁻¹ and
//! W/(m²·sr·m⁻¹)).

use log::trace;

/// First radiation constant `2hc²` (W·m²/sr).
pub const C1: f64 = 1.191042722e-16;
/// Second radiation constant `hc/k` (m·K).
pub const C2: f64 = 1.4387752e-2;

/// Brightness temperature reported for non-physical radiances.
pub const BRIGHTNESS_TEMPERATURE_NO_DATA: f64 = 0.0;

/// Spectral radiance of a black body at `temperature` K.
pub fn radiance(wavenumber: f64, temperature: f64) -> f64 {
    C1 * wavenumber.powi(3) / ((C2 * wavenumber / temperature).exp() - 1.0)
}

/// Brightness temperature of `radiance` at `wavenumber`.
///
/// Non-positive radiances and results that are not finite yield
/// [`BRIGHTNESS_TEMPERATURE_NO_DATA`].
pub fn brightness_temperature(wavenumber: f64, radiance: f64) -> f64 {
    if radiance.is_nan() || radiance <= 0.0 {
        return BRIGHTNESS_TEMPERATURE_NO_DATA;
    }
    let t = C2 * wavenumber / (1.0 + C1 * wavenumber.powi(3) / radiance).ln();
    if t.is_finite() {
        t
    } else {
        trace!("No brightness temperature for radiance {radiance} at {wavenumber} m-1");
        BRIGHTNESS_TEMPERATURE_NO_DATA
    }
}
