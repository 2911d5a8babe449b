//! Error types for calibration, fitting and mixing.
//!
//! Errors fall into four groups:
//!
//! - **Malformed calibration** - duplicate or unknown names, bad mix weights,
//!   cycles, missing reference white. Raised before any fitting.
//! - **Degenerate physics** - zero reflectance in the closed-form white
//!   derivation, or a mixture whose `ω` leaves [0, 1].
//! - **Underdetermined data** - mixing a pigment that no usable mix could
//!   anchor, so the fit left it without parameters.
//! - **Inconsistency** - refit reflectance far from the measurement, only
//!   when strict checking is requested.

use pigment_spectrum::SpectrumError;
use thiserror::Error;

/// Pigment model error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MixingError {
    /// Spectrum construction failed.
    #[error("spectrum error: {0}")]
    Spectrum(#[from] SpectrumError),

    /// The calibration set has no samples.
    #[error("calibration set is empty")]
    EmptyCalibration,

    /// Two samples share a name.
    #[error("duplicate sample name '{0}'")]
    DuplicateSample(String),

    /// A sample has no reflectance data.
    #[error("sample '{0}' has no reflectance samples")]
    EmptyReflectance(String),

    /// A mix references a sample that does not exist.
    #[error("mix '{mix}' references unknown component '{component}'")]
    UnknownComponent {
        /// The referencing mix.
        mix: String,
        /// The missing component.
        component: String,
    },

    /// A mix has no components, or weights that are negative, non-finite or all zero.
    #[error("mix '{mix}' has invalid component weights: {reason}")]
    InvalidMixWeights {
        /// The offending mix.
        mix: String,
        /// What is wrong.
        reason: String,
    },

    /// Mix dependencies form a cycle.
    #[error("cyclic mix dependency: {}", .0.join(" -> "))]
    CyclicDependency(Vec<String>),

    /// The reference white is not in the calibration set.
    #[error("reference white '{0}' not found in calibration")]
    MissingReference(String),

    /// The reference white is a mix rather than a masstone.
    #[error("reference white '{0}' must be a masstone")]
    ReferenceNotMasstone(String),

    /// Reflectance is zero or negative where `K/S = (1-R)^2 / 4R` is evaluated.
    #[error("sample '{sample}' has reflectance {value} at {wavelength} nm; K/S is undefined")]
    DegenerateReflectance {
        /// Sample name.
        sample: String,
        /// Offending wavelength.
        wavelength: f64,
        /// Offending reflectance.
        value: f64,
    },

    /// The pigment was calibrated but left unfitted: no mix with known
    /// co-components references it.
    #[error("pigment '{0}' cannot be fitted: no mix anchors its scattering scale")]
    Underdetermined(String),

    /// The per-wavelength least-squares solve failed.
    #[error("least-squares solve for '{pigment}' failed at {wavelength} nm: {reason}")]
    Solver {
        /// Pigment being fitted.
        pigment: String,
        /// Wavelength of the failing system.
        wavelength: f64,
        /// Solver message.
        reason: String,
    },

    /// A mixture names a pigment the model has no parameters for.
    #[error("unknown pigment '{0}'")]
    UnknownPigment(String),

    /// A mixture has no components.
    #[error("mixture has no components")]
    EmptyMixture,

    /// A mixture weight is negative or non-finite.
    #[error("invalid weight {weight} for pigment '{pigment}'")]
    InvalidWeight {
        /// Pigment name.
        pigment: String,
        /// Offending weight.
        weight: f64,
    },

    /// Number of weights differs from the number of planned pigments.
    #[error("expected {expected} weights, got {got}")]
    WeightCountMismatch {
        /// Pigments in the plan.
        expected: usize,
        /// Weights supplied.
        got: usize,
    },

    /// `K + S` vanishes, so `ω` is undefined.
    #[error("mixture has K + S = 0 at {wavelength} nm")]
    DegenerateMixture {
        /// Offending wavelength.
        wavelength: f64,
    },

    /// `ω = S / (K + S)` falls outside [0, 1] beyond numerical noise.
    #[error("non-physical mixture at {wavelength} nm: omega = {omega}")]
    NonPhysical {
        /// Offending wavelength.
        wavelength: f64,
        /// Computed single-scattering ratio.
        omega: f64,
    },

    /// Refit reflectance deviates from the measurement beyond tolerance.
    #[error("sample '{sample}' refits with sum |diff| = {sum_abs:.6} (tolerance {tolerance})")]
    Inconsistent {
        /// Sample name.
        sample: String,
        /// Sum of absolute differences.
        sum_abs: f64,
        /// Configured tolerance.
        tolerance: f64,
    },
}

/// Result type for pigment model operations.
pub type MixingResult<T> = Result<T, MixingError>;
