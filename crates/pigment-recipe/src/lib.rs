//! # pigment-recipe
//!
//! Recipe search: which paints, in which proportions, reproduce a color.
//!
//! Given a fitted [`TwoFluxModel`](pigment_mixing::TwoFluxModel) and an
//! 8-bit target color:
//!
//! - [`RecipeOptimizer`] finds bounded mixing weights for one pigment subset
//! - [`RecipeSearch`] sweeps all subsets up to a size limit, tier by tier
//! - [`spawn_search`] runs the sweep on a background thread with an event channel
//!
//! # Quick Start
//!
//! ```rust
//! use pigment_mixing::{PigmentParameters, TwoFluxModel};
//! use pigment_recipe::{RecipeSearch, SearchConfig};
//! use pigment_spectrum::Spectrum;
//!
//! let grid: Vec<f64> = (0..=70).map(|i| 380.0 + 5.0 * i as f64).collect();
//! let flat = |v: f64| Spectrum::constant(&grid, v).unwrap();
//! let model = TwoFluxModel::from_parameters(
//!     "white",
//!     [
//!         ("white", PigmentParameters::new(flat(0.0), flat(1.0))),
//!         ("black", PigmentParameters::new(flat(10.0), flat(0.05))),
//!     ],
//! );
//!
//! let search = RecipeSearch::new(&model, [255, 255, 255], ["white", "black"], SearchConfig::default()).unwrap();
//! let tiers = search.run(|_| {}).unwrap();
//! let best = tiers[0].best().unwrap();
//! assert_eq!(best.pigments().collect::<Vec<_>>(), vec!["white"]);
//! ```
//!
//! # Features
//!
//! - `parallel` (default) - evaluate the subsets of a tier on the rayon pool
//!
//! # Dependencies
//!
//! - [`pigment-mixing`] - Forward model
//! - [`pigment-color`] - Color conversions for the objective
//! - [`nalgebra`] - Inverse Hessian updates
//! - [`rayon`] - Parallel tiers
//!
//! # Used By
//!
//! - `pigment-cli` - `solve` command

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod bounded;
mod config;
mod error;
mod optimizer;
mod search;

pub use config::{ErrorSpace, OptimizerSettings, SearchConfig};
pub use error::{RecipeError, RecipeResult, SearchError};
pub use optimizer::{Recipe, RecipeOptimizer};
pub use search::{
    CancelToken, RecipeSearch, SearchEvent, SearchHandle, TierResult, combinations, spawn_search,
};
