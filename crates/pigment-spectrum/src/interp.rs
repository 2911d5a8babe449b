//! Interpolation utilities over sampled grids.
//!
//! Two lookup contracts are provided, matching the two ways spectra are
//! queried:
//!
//! - [`interp_clamped`] - edge values hold outside the grid
//! - [`interp_zero_fill`] - zero outside the grid
//!
//! plus [`union_grid`] for merging sorted wavelength grids.
//!
//! # Usage
//!
//! ```rust
//! use pigment_spectrum::{interp_clamped, interp_zero_fill};
//!
//! let xs = [400.0, 500.0];
//! let ys = [0.2, 0.6];
//!
//! assert_eq!(interp_clamped(&xs, &ys, 450.0), 0.4);
//! assert_eq!(interp_clamped(&xs, &ys, 300.0), 0.2);
//! assert_eq!(interp_zero_fill(&xs, &ys, 300.0), 0.0);
//! ```

/// Linear interpolation between two values.
///
/// Returns `a` when `t = 0.0`, and `b` when `t = 1.0`.
///
/// # Formula
///
/// `a + (b - a) * t`
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Inverse linear interpolation.
///
/// Given a value between `a` and `b`, returns the corresponding `t` value.
/// A zero-width interval maps to `0.0`.
#[inline]
pub fn inverse_lerp(a: f64, b: f64, value: f64) -> f64 {
    if (b - a).abs() < 1e-12 {
        0.0
    } else {
        (value - a) / (b - a)
    }
}

/// Clamps a value to [0, 1].
#[inline]
pub fn saturate(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Interpolates `x` inside the grid; `None` outside it.
///
/// `xs` must be strictly increasing and the same length as `ys`. A NaN
/// query on a non-empty grid gives NaN.
fn interp_inside(xs: &[f64], ys: &[f64], x: f64) -> Option<f64> {
    let (first, last) = (*xs.first()?, *xs.last()?);
    if x.is_nan() {
        return Some(f64::NAN);
    }
    if x < first || x > last {
        return None;
    }
    // Index of the first grid point >= x.
    let hi = xs.partition_point(|&v| v < x);
    if xs[hi] == x {
        return Some(ys[hi]);
    }
    let lo = hi - 1;
    let t = inverse_lerp(xs[lo], xs[hi], x);
    Some(lerp(ys[lo], ys[hi], t))
}

/// Piecewise-linear lookup holding edge values outside the grid.
///
/// An empty grid evaluates to `0.0` everywhere; a NaN query otherwise
/// evaluates to NaN.
///
/// # Example
///
/// ```rust
/// use pigment_spectrum::interp_clamped;
///
/// let xs = [0.0, 1.0, 2.0];
/// let ys = [0.0, 10.0, 0.0];
/// assert_eq!(interp_clamped(&xs, &ys, 0.5), 5.0);
/// assert_eq!(interp_clamped(&xs, &ys, 7.0), 0.0);
/// assert_eq!(interp_clamped(&xs, &ys, -1.0), 0.0);
/// ```
pub fn interp_clamped(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    match (xs.first(), xs.last()) {
        (Some(&first), Some(&last)) => {
            if x <= first {
                ys[0]
            } else if x >= last {
                ys[ys.len() - 1]
            } else {
                interp_inside(xs, ys, x).unwrap_or(0.0)
            }
        }
        _ => 0.0,
    }
}

/// Piecewise-linear lookup returning `0.0` outside the grid.
///
/// A NaN query on a non-empty grid evaluates to NaN.
///
/// # Example
///
/// ```rust
/// use pigment_spectrum::interp_zero_fill;
///
/// let xs = [400.0, 410.0];
/// let ys = [1.0, 3.0];
/// assert_eq!(interp_zero_fill(&xs, &ys, 405.0), 2.0);
/// assert_eq!(interp_zero_fill(&xs, &ys, 410.0), 3.0);
/// assert_eq!(interp_zero_fill(&xs, &ys, 411.0), 0.0);
/// ```
pub fn interp_zero_fill(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    interp_inside(xs, ys, x).unwrap_or(0.0)
}

/// Sorted union of two strictly increasing grids, exact duplicates merged.
///
/// # Example
///
/// ```rust
/// use pigment_spectrum::union_grid;
///
/// let merged = union_grid(&[400.0, 420.0], &[410.0, 420.0, 430.0]);
/// assert_eq!(merged, vec![400.0, 410.0, 420.0, 430.0]);
/// ```
pub fn union_grid(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] < b[j] {
            out.push(a[i]);
            i += 1;
        } else if b[j] < a[i] {
            out.push(b[j]);
            j += 1;
        } else {
            out.push(a[i]);
            i += 1;
            j += 1;
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}
