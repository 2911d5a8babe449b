//! # pigment-mixing
//!
//! Two-flux (Kubelka-Munk) pigment model for opaque paint layers.
//!
//! Each pigment is described by an absorption spectrum `K` and a scattering
//! spectrum `S`. They are fitted once from measured calibration samples,
//! masstones and mixtures with known proportions, and then predict the
//! reflectance of any mixture of the fitted pigments.
//!
//! - [`Calibration`] - validated sample set with mix flattening
//! - [`TwoFluxModel::fit`] - per-wavelength least-squares fitting
//! - [`TwoFluxModel::mix`] - forward prediction
//! - [`ConsistencyReport`] - how well the fit reproduces its own data
//!
//! # Quick Start
//!
//! ```rust
//! use pigment_mixing::{Calibration, FitOptions, MixComponent, PigmentSample, TwoFluxModel};
//! use pigment_spectrum::Spectrum;
//!
//! let grid: Vec<f64> = (0..=70).map(|i| 380.0 + 5.0 * i as f64).collect();
//! let white = Spectrum::constant(&grid, 0.9).unwrap();
//! let gray = Spectrum::constant(&grid, 0.2).unwrap();
//! let tint = Spectrum::constant(&grid, 0.45).unwrap();
//!
//! let calibration = Calibration::new([
//!     PigmentSample::masstone("white", white),
//!     PigmentSample::masstone("gray", gray),
//!     PigmentSample::mix("tint", [("gray", 1.0), ("white", 1.0)], tint.clone()),
//! ])
//! .unwrap();
//!
//! let model = TwoFluxModel::fit(&calibration, &FitOptions::default()).unwrap();
//! let mixed = model
//!     .mix(&[MixComponent::new("gray", 1.0), MixComponent::new("white", 1.0)])
//!     .unwrap();
//! assert!(mixed.max_abs_difference(&tint) < 1e-9);
//! ```
//!
//! # Dependencies
//!
//! - [`pigment-spectrum`] - Spectrum type
//! - [`pigment-color`] - Lab difference in the consistency report
//! - [`nalgebra`] - SVD least squares
//! - [`tracing`] - Fitting diagnostics
//!
//! # Used By
//!
//! - `pigment-recipe` - Optimizer objective
//! - `pigment-cli` - `fit` and `mix` commands

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod calibration;
mod consistency;
mod error;
mod fit;
pub mod km;
mod model;
mod sample;

pub use calibration::Calibration;
pub use consistency::{ConsistencyEntry, ConsistencyReport};
pub use error::{MixingError, MixingResult};
pub use fit::FitOptions;
pub use model::{MixPlan, PigmentParameters, TwoFluxModel};
pub use sample::{MixComponent, PigmentSample, SampleKind};
