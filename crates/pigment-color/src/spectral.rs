//! Spectral to tristimulus conversion.
//!
//! Reflectance is lit by D65 and integrated against the CIE 1931 observer:
//!
//! ```text
//! Xi = ∫ R(λ) · D65(λ) · x̄i(λ) dλ  /  ∫ D65(λ) · ȳ(λ) dλ      (380..730 nm)
//! ```
//!
//! The normalization puts a perfect reflector at Y = 1. The observer and
//! illuminant spectra and the normalization constant are built once on first
//! use and shared by every caller.

use std::sync::OnceLock;

use pigment_spectrum::Spectrum;

use crate::lab::{WhitePoint, xyz_to_lab};
use crate::matrix::xyz_to_rgb;
use crate::tables::{CIE1931_X, CIE1931_Y, CIE1931_Z, D65_SPD, END_NM, START_NM, STEP_NM};
use crate::transfer::gamma_rgb;

/// Observer and illuminant spectra used for every conversion.
#[derive(Debug, Clone)]
pub struct StandardObserver {
    /// x-bar color-matching function.
    pub x: Spectrum,
    /// y-bar color-matching function.
    pub y: Spectrum,
    /// z-bar color-matching function.
    pub z: Spectrum,
    /// Illuminant spectral power.
    pub illuminant: Spectrum,
    normalization: f64,
}

impl StandardObserver {
    fn build() -> Self {
        let x = Spectrum::tabulated(START_NM, STEP_NM, &CIE1931_X);
        let y = Spectrum::tabulated(START_NM, STEP_NM, &CIE1931_Y);
        let z = Spectrum::tabulated(START_NM, STEP_NM, &CIE1931_Z);
        let illuminant = Spectrum::tabulated(START_NM, STEP_NM, &D65_SPD);
        let normalization = (&y * &illuminant).integrate(START_NM, END_NM);
        Self {
            x,
            y,
            z,
            illuminant,
            normalization,
        }
    }

    /// `∫ illuminant · ȳ dλ`, the divisor putting white at Y = 1.
    #[inline]
    pub fn normalization(&self) -> f64 {
        self.normalization
    }
}

static STANDARD: OnceLock<StandardObserver> = OnceLock::new();

/// CIE 1931 observer under D65, built on first use.
#[inline]
pub fn standard_observer() -> &'static StandardObserver {
    STANDARD.get_or_init(StandardObserver::build)
}

/// Integrates a reflectance spectrum to CIE XYZ under D65 (white Y = 1).
///
/// Reflectance outside its own support counts as zero.
///
/// # Example
///
/// ```rust
/// use pigment_color::{reflectance_to_xyz, tables};
/// use pigment_spectrum::Spectrum;
///
/// let white = Spectrum::constant(&tables::grid(), 1.0).unwrap();
/// let xyz = reflectance_to_xyz(&white);
/// assert!((xyz[1] - 1.0).abs() < 1e-12);
/// ```
pub fn reflectance_to_xyz(reflectance: &Spectrum) -> [f64; 3] {
    let obs = standard_observer();
    let lit = reflectance * &obs.illuminant;
    [&obs.x, &obs.y, &obs.z].map(|cmf| (&lit * cmf).integrate(START_NM, END_NM) / obs.normalization)
}

/// Linear-light sRGB of a reflectance, each channel clamped to [0, 1].
pub fn reflectance_to_linear_rgb(reflectance: &Spectrum) -> [f64; 3] {
    xyz_to_rgb(reflectance_to_xyz(reflectance)).map(|c| c.clamp(0.0, 1.0))
}

/// Display-encoded sRGB of a reflectance, each channel clamped to [0, 1].
///
/// Out-of-gamut colors are clipped silently rather than reported.
///
/// # Example
///
/// ```rust
/// use pigment_color::{reflectance_to_rgb, tables};
/// use pigment_spectrum::Spectrum;
///
/// let white = Spectrum::constant(&tables::grid(), 1.0).unwrap();
/// let rgb = reflectance_to_rgb(&white);
/// assert!(rgb.iter().all(|&c| (c - 1.0).abs() < 1e-3));
/// ```
pub fn reflectance_to_rgb(reflectance: &Spectrum) -> [f64; 3] {
    gamma_rgb(xyz_to_rgb(reflectance_to_xyz(reflectance))).map(|c| c.clamp(0.0, 1.0))
}

/// CIE Lab of a reflectance under D65 relative to `white` (Y = 100 scale).
pub fn reflectance_to_lab(reflectance: &Spectrum, white: WhitePoint) -> [f64; 3] {
    xyz_to_lab(reflectance_to_xyz(reflectance).map(|c| c * 100.0), white)
}
