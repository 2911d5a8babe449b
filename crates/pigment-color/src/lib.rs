//! # pigment-color
//!
//! Colorimetry engine for spectral paint modeling.
//!
//! Every function here is pure and works over fixed tabulated data:
//!
//! - **Transfer** - [`gamma`] / [`degamma`], the two-piece sRGB curve
//! - **Tristimulus** - [`reflectance_to_xyz`] under D65 with the CIE 1931 observer
//! - **Display** - [`xyz_to_rgb`] / [`rgb_to_xyz`], [`reflectance_to_rgb`]
//! - **Perceptual** - [`xyz_to_lab`], [`delta_e76`]
//!
//! # Pipeline
//!
//! ```text
//! reflectance --(D65, x̄ȳz̄)--> XYZ --(3x3)--> linear RGB --(gamma)--> clamp [0,1]
//!                                 \
//!                                  +--> Lab
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use pigment_color::{reflectance_to_rgb, rgb_int_to_float, tables};
//! use pigment_spectrum::Spectrum;
//!
//! let gray = Spectrum::constant(&tables::grid(), 0.18).unwrap();
//! let rgb = reflectance_to_rgb(&gray);
//! assert!((rgb[1] - 0.46).abs() < 0.01);
//!
//! let target = rgb_int_to_float([118, 118, 118]);
//! assert!((target[1] - 0.18).abs() < 0.01);
//! ```
//!
//! # Dependencies
//!
//! - [`pigment-spectrum`] - Spectrum type and integration
//! - [`glam`] - 3x3 matrix math
//!
//! # Used By
//!
//! - `pigment-mixing` - Sanity checks of fitted pigments
//! - `pigment-recipe` - Optimizer objective

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod tables;
mod transfer;
mod matrix;
mod lab;
mod spectral;

pub use transfer::*;
pub use matrix::{RGB_TO_XYZ, XYZ_TO_RGB, mat_from_rows, rgb_to_xyz, xyz_to_rgb};
pub use lab::{WhitePoint, delta_e76, xyz_to_lab, xyz_to_xy};
pub use spectral::{
    StandardObserver, reflectance_to_lab, reflectance_to_linear_rgb, reflectance_to_rgb,
    reflectance_to_xyz, standard_observer,
};
