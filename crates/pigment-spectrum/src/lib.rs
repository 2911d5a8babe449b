//! # pigment-spectrum
//!
//! Wavelength-indexed spectral data for paint color modeling.
//!
//! This crate provides the foundation of the pigment stack:
//!
//! - [`Spectrum`] - immutable `(wavelength, value)` samples
//! - Interpolation helpers ([`interp_clamped`], [`interp_zero_fill`], [`lerp`])
//! - Grid utilities ([`union_grid`], [`validate_grid`])
//!
//! # Usage
//!
//! ```rust
//! use pigment_spectrum::Spectrum;
//!
//! // Flat 90% reflector, 380-730 nm in 5 nm steps
//! let grid: Vec<f64> = (0..71).map(|i| 380.0 + 5.0 * i as f64).collect();
//! let white = Spectrum::constant(&grid, 0.9).unwrap();
//!
//! // Light a sample and integrate over the visible range
//! let light = Spectrum::constant(&grid, 100.0).unwrap();
//! let lit = &white * &light;
//! let energy = lit.integrate(380.0, 730.0);
//! assert!((energy - 0.9 * 100.0 * 350.0).abs() < 1e-6);
//! ```
//!
//! # Dependencies
//!
//! - [`thiserror`] - Error derive
//! - [`serde`] - Serialization of computed spectra
//!
//! # Used By
//!
//! - `pigment-color` - Spectral integration against observer functions
//! - `pigment-mixing` - K/S fitting and forward mixing

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
mod interp;
mod spectrum;

pub use error::{SpectrumError, SpectrumResult};
pub use interp::*;
pub use spectrum::{Spectrum, validate_grid};
