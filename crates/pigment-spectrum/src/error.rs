//! Error types for spectrum construction.
//!
//! Arithmetic, resampling and integration never fail: out-of-support queries
//! are zero-filled and empty spectra act as the zero function. Only building a
//! [`Spectrum`](crate::Spectrum) from raw samples is validated.

use thiserror::Error;

/// Spectrum construction error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpectrumError {
    /// Wavelength and value arrays differ in length.
    #[error("length mismatch: {wavelengths} wavelengths, {values} values")]
    LengthMismatch {
        /// Number of wavelengths supplied.
        wavelengths: usize,
        /// Number of values supplied.
        values: usize,
    },

    /// Wavelengths are not strictly increasing (unsorted or duplicated).
    #[error("wavelengths must be strictly increasing: {previous} followed by {next} at index {index}")]
    NotIncreasing {
        /// Index of the offending wavelength.
        index: usize,
        /// Wavelength before it.
        previous: f64,
        /// The offending wavelength.
        next: f64,
    },

    /// A wavelength or value is NaN or infinite.
    #[error("non-finite sample at index {index}: ({wavelength}, {value})")]
    NonFinite {
        /// Sample index.
        index: usize,
        /// Wavelength at that index.
        wavelength: f64,
        /// Value at that index.
        value: f64,
    },
}

/// Result type for spectrum construction.
pub type SpectrumResult<T> = Result<T, SpectrumError>;
