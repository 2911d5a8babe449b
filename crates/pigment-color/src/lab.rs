//! CIE L*a*b* conversion.
//!
//! Lab is computed relative to a reference white given in the same scale as
//! the input XYZ. The default white is D65 on the 100-based scale, so XYZ from
//! [`reflectance_to_xyz`](crate::reflectance_to_xyz) (Y = 1 for a perfect
//! reflector) must be scaled by 100 first; [`reflectance_to_lab`](crate::reflectance_to_lab)
//! does that.

use serde::{Deserialize, Serialize};

/// Linear-segment threshold of the Lab companding function.
const EPSILON: f64 = 0.008856;

/// Slope of the linear segment.
const KAPPA_SLOPE: f64 = 7.787;

/// Offset of the linear segment.
const OFFSET: f64 = 16.0 / 116.0;

/// Reference white in XYZ.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WhitePoint {
    /// X of the white.
    pub x: f64,
    /// Y of the white.
    pub y: f64,
    /// Z of the white.
    pub z: f64,
}

impl WhitePoint {
    /// CIE D65, 2-degree observer, Y = 100.
    pub const D65: Self = Self::new(95.047, 100.0, 108.883);

    /// CIE D50, 2-degree observer, Y = 100.
    pub const D50: Self = Self::new(96.422, 100.0, 82.521);

    /// Creates a white point.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl Default for WhitePoint {
    fn default() -> Self {
        Self::D65
    }
}

#[inline]
fn compand(t: f64) -> f64 {
    if t > EPSILON {
        t.cbrt()
    } else {
        KAPPA_SLOPE * t + OFFSET
    }
}

/// Converts XYZ to CIE Lab relative to `white`.
///
/// # Example
///
/// ```rust
/// use pigment_color::{xyz_to_lab, WhitePoint};
///
/// let lab = xyz_to_lab([95.047, 100.0, 108.883], WhitePoint::D65);
/// assert!((lab[0] - 100.0).abs() < 1e-9);
/// assert!(lab[1].abs() < 1e-9 && lab[2].abs() < 1e-9);
/// ```
pub fn xyz_to_lab(xyz: [f64; 3], white: WhitePoint) -> [f64; 3] {
    let fx = compand(xyz[0] / white.x);
    let fy = compand(xyz[1] / white.y);
    let fz = compand(xyz[2] / white.z);
    [116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

/// Euclidean distance between two Lab colors (CIE76 Delta E).
#[inline]
pub fn delta_e76(a: [f64; 3], b: [f64; 3]) -> f64 {
    let d = [a[0] - b[0], a[1] - b[1], a[2] - b[2]];
    (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
}

/// CIE xy chromaticity of an XYZ triplet; `(0, 0)` for black.
pub fn xyz_to_xy(xyz: [f64; 3]) -> [f64; 2] {
    let sum = xyz[0] + xyz[1] + xyz[2];
    if sum.abs() < 1e-12 {
        [0.0, 0.0]
    } else {
        [xyz[0] / sum, xyz[1] / sum]
    }
}
