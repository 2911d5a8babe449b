//! Two-flux (Kubelka-Munk) relations for an opaque layer.
//!
//! With absorption `K` and scattering `S`, the single-scattering ratio is
//! `ω = S / (K + S)` and the reflectance of an infinitely thick layer is
//!
//! ```text
//! R = ω / (2 - ω + 2·sqrt(1 - ω))
//! ```
//!
//! which inverts to `K/S = (1 - R)^2 / (4R)`.

use crate::error::{MixingError, MixingResult};

/// Slack allowed on `ω` outside [0, 1] before a mixture is non-physical.
pub const OMEGA_TOLERANCE: f64 = 1e-9;

/// `K/S` of an opaque layer with reflectance `r`; infinite at `r = 0`.
#[inline]
pub fn k_over_s(r: f64) -> f64 {
    (1.0 - r) * (1.0 - r) / (4.0 * r)
}

/// Reflectance of an opaque layer with single-scattering ratio `omega`.
#[inline]
pub fn reflectance_from_omega(omega: f64) -> f64 {
    omega / (2.0 - omega + 2.0 * (1.0 - omega).sqrt())
}

/// Reflectance of a layer with absorption `k` and scattering `s`.
///
/// `ω` within [`OMEGA_TOLERANCE`] of [0, 1] is clamped into range.
///
/// # Errors
///
/// [`MixingError::DegenerateMixture`] when `k + s` is zero or the ratio is not
/// finite, [`MixingError::NonPhysical`] when `ω` is further out of range.
pub fn reflectance(wavelength: f64, k: f64, s: f64) -> MixingResult<f64> {
    let total = k + s;
    if total == 0.0 {
        return Err(MixingError::DegenerateMixture { wavelength });
    }
    let omega = s / total;
    if !omega.is_finite() {
        return Err(MixingError::DegenerateMixture { wavelength });
    }
    if !(-OMEGA_TOLERANCE..=1.0 + OMEGA_TOLERANCE).contains(&omega) {
        return Err(MixingError::NonPhysical { wavelength, omega });
    }
    Ok(reflectance_from_omega(omega.clamp(0.0, 1.0)))
}
