//! Linear sRGB (D65) <-> CIE XYZ matrices.
//!
//! Both directions operate on linear light; apply [`gamma`](crate::gamma)
//! afterwards for display encoding.
//!
//! # Convention
//!
//! Matrices are written **row-major** and applied to **column vectors**:
//!
//! ```text
//! | m00 m01 m02 |   | x |
//! | m10 m11 m12 | * | y |
//! | m20 m21 m22 |   | z |
//! ```
//!
//! [`glam::DMat3`] stores columns, so rows are transposed on conversion.

use glam::{DMat3, DVec3};

/// XYZ to linear sRGB, row-major.
pub const XYZ_TO_RGB: [[f64; 3]; 3] = [
    [3.2406, -1.5372, -0.4986],
    [-0.9689, 1.8758, 0.0415],
    [0.0557, -0.2040, 1.0570],
];

/// Linear sRGB to XYZ, row-major.
pub const RGB_TO_XYZ: [[f64; 3]; 3] = [
    [0.4124, 0.3576, 0.1805],
    [0.2126, 0.7152, 0.0722],
    [0.0193, 0.1192, 0.9505],
];

/// Builds a glam matrix from row-major rows.
#[inline]
pub fn mat_from_rows(rows: &[[f64; 3]; 3]) -> DMat3 {
    DMat3::from_cols_array_2d(rows).transpose()
}

/// Applies a row-major matrix to a triplet.
#[inline]
fn apply(rows: &[[f64; 3]; 3], v: [f64; 3]) -> [f64; 3] {
    (mat_from_rows(rows) * DVec3::from_array(v)).to_array()
}

/// Converts XYZ (Y = 1 for the reference white) to linear sRGB.
///
/// # Example
///
/// ```rust
/// use pigment_color::xyz_to_rgb;
///
/// let rgb = xyz_to_rgb([0.9505, 1.0, 1.089]);
/// assert!(rgb.iter().all(|&c| (c - 1.0).abs() < 1e-3));
/// ```
#[inline]
pub fn xyz_to_rgb(xyz: [f64; 3]) -> [f64; 3] {
    apply(&XYZ_TO_RGB, xyz)
}

/// Converts linear sRGB to XYZ.
#[inline]
pub fn rgb_to_xyz(rgb: [f64; 3]) -> [f64; 3] {
    apply(&RGB_TO_XYZ, rgb)
}
