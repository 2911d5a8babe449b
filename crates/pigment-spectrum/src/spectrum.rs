//! The [`Spectrum`] type.
//!
//! A spectrum is an ordered set of `(wavelength, value)` samples with strictly
//! increasing wavelengths. It stands for reflectance, radiant power, or a
//! dimensionless coefficient such as Kubelka-Munk `K` and `S`.
//!
//! # Support
//!
//! A spectrum is only defined on `[first, last]` wavelength. Resampling and
//! arithmetic treat everything outside that range as zero; [`Spectrum::sample`]
//! instead holds the edge values.
//!
//! # Arithmetic
//!
//! Binary operations run on the union of both grids:
//!
//! ```text
//! a:   400 ---- 420 ---- 440
//! b:         410 ------------- 450
//! out: 400  410 420      440  450
//! ```
//!
//! Each operand is linearly interpolated onto the union grid (zero outside its
//! support) and combined pointwise. Scaling by an `f64` keeps the grid.
//!
//! ```rust
//! use pigment_spectrum::Spectrum;
//!
//! let a = Spectrum::new(vec![400.0, 500.0], vec![0.2, 0.4]).unwrap();
//! let b = Spectrum::new(vec![450.0, 500.0], vec![1.0, 1.0]).unwrap();
//!
//! let sum = &a + &b;
//! assert_eq!(sum.wavelengths(), &[400.0, 450.0, 500.0]);
//! assert!((sum.sample(450.0) - 1.3).abs() < 1e-12);
//! ```

use std::ops::{Add, Mul};

use serde::Serialize;

use crate::error::{SpectrumError, SpectrumResult};
use crate::interp::{interp_clamped, interp_zero_fill, union_grid};

/// Wavelength-indexed samples.
///
/// Immutable once built; every operation returns a new instance.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Spectrum {
    wavelengths: Vec<f64>,
    values: Vec<f64>,
}

/// Checks that a grid is finite and strictly increasing.
pub fn validate_grid(grid: &[f64]) -> SpectrumResult<()> {
    for (i, &w) in grid.iter().enumerate() {
        if !w.is_finite() {
            return Err(SpectrumError::NonFinite {
                index: i,
                wavelength: w,
                value: f64::NAN,
            });
        }
        if i > 0 && grid[i - 1] >= w {
            return Err(SpectrumError::NotIncreasing {
                index: i,
                previous: grid[i - 1],
                next: w,
            });
        }
    }
    Ok(())
}

impl Spectrum {
    /// Builds a spectrum from parallel wavelength and value arrays.
    ///
    /// # Errors
    ///
    /// Fails on mismatched lengths, non-increasing wavelengths, or any
    /// non-finite sample.
    pub fn new(wavelengths: Vec<f64>, values: Vec<f64>) -> SpectrumResult<Self> {
        if wavelengths.len() != values.len() {
            return Err(SpectrumError::LengthMismatch {
                wavelengths: wavelengths.len(),
                values: values.len(),
            });
        }
        validate_grid(&wavelengths)?;
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(SpectrumError::NonFinite {
                index,
                wavelength: wavelengths[index],
                value: values[index],
            });
        }
        Ok(Self { wavelengths, values })
    }

    /// Builds a spectrum with every value multiplied by `scale`.
    ///
    /// Used for measurement data stored in percent (`scale = 0.01`).
    pub fn with_scale(wavelengths: Vec<f64>, values: Vec<f64>, scale: f64) -> SpectrumResult<Self> {
        let values = values.into_iter().map(|v| v * scale).collect();
        Self::new(wavelengths, values)
    }

    /// The empty spectrum: zero everywhere.
    pub const fn empty() -> Self {
        Self {
            wavelengths: Vec::new(),
            values: Vec::new(),
        }
    }

    /// A spectrum holding `value` at every grid point.
    pub fn constant(grid: &[f64], value: f64) -> SpectrumResult<Self> {
        Self::new(grid.to_vec(), vec![value; grid.len()])
    }

    /// Evaluates `f` at every grid point.
    pub fn from_fn(grid: &[f64], f: impl Fn(f64) -> f64) -> SpectrumResult<Self> {
        let values = grid.iter().map(|&w| f(w)).collect();
        Self::new(grid.to_vec(), values)
    }

    /// Builds a spectrum on a uniform grid `start + step * i`.
    ///
    /// Meant for compile-time tables; `step` must be positive and the values
    /// are taken as-is.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pigment_spectrum::Spectrum;
    ///
    /// let s = Spectrum::tabulated(400.0, 10.0, &[0.1, 0.2, 0.3]);
    /// assert_eq!(s.wavelengths(), &[400.0, 410.0, 420.0]);
    /// ```
    pub fn tabulated(start: f64, step: f64, values: &[f64]) -> Self {
        debug_assert!(step > 0.0, "tabulated step must be positive");
        let wavelengths = (0..values.len()).map(|i| start + step * i as f64).collect();
        Self::from_parts(wavelengths, values.to_vec())
    }

    /// Wraps arrays already known to form a valid grid.
    fn from_parts(wavelengths: Vec<f64>, values: Vec<f64>) -> Self {
        debug_assert_eq!(wavelengths.len(), values.len());
        Self { wavelengths, values }
    }

    /// Sample wavelengths.
    #[inline]
    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    /// Sample values.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.wavelengths.len()
    }

    /// True when there are no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.wavelengths.is_empty()
    }

    /// `(min, max)` wavelength, or `None` when empty.
    pub fn support(&self) -> Option<(f64, f64)> {
        Some((*self.wavelengths.first()?, *self.wavelengths.last()?))
    }

    /// Iterates `(wavelength, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.wavelengths.iter().copied().zip(self.values.iter().copied())
    }

    /// Linear interpolation at `wavelength`; edge values hold outside the support.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pigment_spectrum::Spectrum;
    ///
    /// let s = Spectrum::new(vec![400.0, 500.0], vec![0.2, 0.6]).unwrap();
    /// assert_eq!(s.sample(300.0), 0.2);
    /// assert_eq!(s.sample(800.0), 0.6);
    /// ```
    #[inline]
    pub fn sample(&self, wavelength: f64) -> f64 {
        interp_clamped(&self.wavelengths, &self.values, wavelength)
    }

    /// Values interpolated at arbitrary wavelengths, zero outside the support.
    ///
    /// `grid` does not need to be sorted.
    pub fn resample_values(&self, grid: &[f64]) -> Vec<f64> {
        grid.iter()
            .map(|&w| interp_zero_fill(&self.wavelengths, &self.values, w))
            .collect()
    }

    /// Re-expresses the spectrum on `grid`, zero-filled outside the support.
    ///
    /// Never fails: out-of-range wavelengths simply read as zero, so callers
    /// that do not want zero fill must restrict `grid` themselves. `grid` must
    /// be strictly increasing.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pigment_spectrum::Spectrum;
    ///
    /// let s = Spectrum::new(vec![400.0, 500.0], vec![0.2, 0.6]).unwrap();
    /// let r = s.resample(&[350.0, 450.0, 550.0]);
    /// assert_eq!(r.values()[0], 0.0);
    /// assert!((r.values()[1] - 0.4).abs() < 1e-12);
    /// assert_eq!(r.values()[2], 0.0);
    /// ```
    pub fn resample(&self, grid: &[f64]) -> Spectrum {
        debug_assert!(validate_grid(grid).is_ok(), "resample grid must be strictly increasing");
        Self::from_parts(grid.to_vec(), self.resample_values(grid))
    }

    /// Union of this spectrum's grid with another's.
    pub fn union_grid(&self, other: &Spectrum) -> Vec<f64> {
        union_grid(&self.wavelengths, &other.wavelengths)
    }

    /// Combines two spectra pointwise on the union of their grids.
    ///
    /// Both operands are zero-filled outside their own support before `f` is
    /// applied.
    pub fn zip_with(&self, other: &Spectrum, f: impl Fn(f64, f64) -> f64) -> Spectrum {
        let grid = self.union_grid(other);
        let values = grid
            .iter()
            .map(|&w| {
                f(
                    interp_zero_fill(&self.wavelengths, &self.values, w),
                    interp_zero_fill(&other.wavelengths, &other.values, w),
                )
            })
            .collect();
        Self::from_parts(grid, values)
    }

    /// Applies `f` to every value, keeping the grid.
    ///
    /// The result is not re-validated; `f` may introduce non-finite values.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Spectrum {
        Self::from_parts(
            self.wavelengths.clone(),
            self.values.iter().map(|&v| f(v)).collect(),
        )
    }

    /// Multiplies every value by `factor`, keeping the grid.
    #[inline]
    pub fn scale(&self, factor: f64) -> Spectrum {
        self.map(|v| v * factor)
    }

    /// Trapezoidal integral over the samples inside `[min, max]`.
    ///
    /// Samples outside the range are dropped rather than interpolated at the
    /// boundary; include `min` and `max` in the grid for an exact boundary.
    /// Fewer than two samples in range integrate to zero.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pigment_spectrum::Spectrum;
    ///
    /// let s = Spectrum::new(vec![0.0, 1.0, 2.0], vec![1.0, 1.0, 1.0]).unwrap();
    /// assert_eq!(s.integrate(0.0, 2.0), 2.0);
    /// assert_eq!(s.integrate(0.5, 2.0), 1.0);
    /// ```
    pub fn integrate(&self, min: f64, max: f64) -> f64 {
        let inside: Vec<(f64, f64)> = self.iter().filter(|&(w, _)| w >= min && w <= max).collect();
        inside
            .windows(2)
            .map(|pair| (pair[1].0 - pair[0].0) * (pair[0].1 + pair[1].1) * 0.5)
            .sum()
    }

    /// Largest absolute pointwise difference on the union grid.
    pub fn max_abs_difference(&self, other: &Spectrum) -> f64 {
        self.zip_with(other, |a, b| (a - b).abs())
            .values
            .iter()
            .fold(0.0, |acc: f64, &d| acc.max(d))
    }

    /// Pointwise mean of several spectra on the union of their grids.
    ///
    /// Returns the empty spectrum for an empty input.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pigment_spectrum::Spectrum;
    ///
    /// let a = Spectrum::new(vec![400.0, 500.0], vec![0.2, 0.4]).unwrap();
    /// let b = Spectrum::new(vec![400.0, 500.0], vec![0.4, 0.6]).unwrap();
    /// let m = Spectrum::mean([&a, &b]);
    /// assert!((m.values()[0] - 0.3).abs() < 1e-12);
    /// ```
    pub fn mean<'a>(spectra: impl IntoIterator<Item = &'a Spectrum>) -> Spectrum {
        let mut total = Spectrum::empty();
        let mut count = 0usize;
        for s in spectra {
            total = &total + s;
            count += 1;
        }
        if count == 0 {
            total
        } else {
            total * (1.0 / count as f64)
        }
    }
}

impl Add for &Spectrum {
    type Output = Spectrum;

    fn add(self, rhs: &Spectrum) -> Spectrum {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl Add for Spectrum {
    type Output = Spectrum;

    fn add(self, rhs: Spectrum) -> Spectrum {
        &self + &rhs
    }
}

impl Mul for &Spectrum {
    type Output = Spectrum;

    fn mul(self, rhs: &Spectrum) -> Spectrum {
        self.zip_with(rhs, |a, b| a * b)
    }
}

impl Mul for Spectrum {
    type Output = Spectrum;

    fn mul(self, rhs: Spectrum) -> Spectrum {
        &self * &rhs
    }
}

impl Mul<f64> for &Spectrum {
    type Output = Spectrum;

    fn mul(self, rhs: f64) -> Spectrum {
        self.scale(rhs)
    }
}

impl Mul<f64> for Spectrum {
    type Output = Spectrum;

    fn mul(mut self, rhs: f64) -> Spectrum {
        for v in &mut self.values {
            *v *= rhs;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn grid_5nm() -> Vec<f64> {
        (0..71).map(|i| 380.0 + 5.0 * i as f64).collect()
    }

    #[test]
    fn test_new_rejects_bad_input() {
        assert!(matches!(
            Spectrum::new(vec![400.0, 410.0], vec![1.0]),
            Err(SpectrumError::LengthMismatch { .. })
        ));
        assert!(matches!(
            Spectrum::new(vec![400.0, 400.0], vec![1.0, 1.0]),
            Err(SpectrumError::NotIncreasing { index: 1, .. })
        ));
        assert!(matches!(
            Spectrum::new(vec![410.0, 400.0], vec![1.0, 1.0]),
            Err(SpectrumError::NotIncreasing { .. })
        ));
        assert!(matches!(
            Spectrum::new(vec![400.0, 410.0], vec![1.0, f64::NAN]),
            Err(SpectrumError::NonFinite { index: 1, .. })
        ));
    }

    #[test]
    fn test_with_scale() {
        let s = Spectrum::with_scale(vec![400.0, 410.0], vec![50.0, 90.0], 0.01).unwrap();
        assert_eq!(s.values(), &[0.5, 0.9]);
    }

    #[test]
    fn test_empty_is_additive_identity() {
        let s = Spectrum::from_fn(&grid_5nm(), |w| (w - 380.0) / 350.0).unwrap();
        let sum = &Spectrum::empty() + &s;
        assert_eq!(sum, s);
        let sum = &s + &Spectrum::empty();
        assert_eq!(sum, s);
    }

    #[test]
    fn test_add_mul_commutative() {
        let a = Spectrum::new(vec![400.0, 450.0, 500.0], vec![0.1, 0.5, 0.2]).unwrap();
        let b = Spectrum::new(vec![420.0, 480.0, 520.0], vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(&a + &b, &b + &a);
        assert_eq!(&a * &b, &b * &a);
    }

    #[test]
    fn test_zero_fill_outside_support() {
        let a = Spectrum::new(vec![400.0, 500.0], vec![1.0, 1.0]).unwrap();
        let b = Spectrum::new(vec![450.0, 600.0], vec![1.0, 1.0]).unwrap();
        let sum = &a + &b;
        assert_eq!(sum.wavelengths(), &[400.0, 450.0, 500.0, 600.0]);
        assert_eq!(sum.values(), &[1.0, 2.0, 2.0, 1.0]);
        let prod = &a * &b;
        assert_eq!(prod.values(), &[0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_scalar_mul_keeps_grid() {
        let a = Spectrum::new(vec![400.0, 500.0], vec![0.5, 1.0]).unwrap();
        let b = &a * 2.0;
        assert_eq!(b.wavelengths(), a.wavelengths());
        assert_eq!(b.values(), &[1.0, 2.0]);
        let c = a * 0.5;
        assert_eq!(c.values(), &[0.25, 0.5]);
    }

    #[test]
    fn test_resample_on_own_grid_is_identity() {
        let grid = grid_5nm();
        let s = Spectrum::from_fn(&grid, |w| (w / 100.0).sin()).unwrap();
        let r = s.resample(&grid);
        assert_eq!(r, s);

        // A superset grid keeps every original value
        let fine: Vec<f64> = (0..351).map(|i| 380.0 + i as f64).collect();
        let r = s.resample(&fine);
        for (w, v) in s.iter() {
            assert_abs_diff_eq!(r.sample(w), v, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_sample_clamps() {
        let s = Spectrum::new(vec![400.0, 500.0], vec![0.2, 0.6]).unwrap();
        assert_eq!(s.sample(100.0), 0.2);
        assert_eq!(s.sample(1000.0), 0.6);
        assert_abs_diff_eq!(s.sample(475.0), 0.5, epsilon = 1e-12);
        assert_eq!(Spectrum::empty().sample(500.0), 0.0);
    }

    #[test]
    fn test_nan_wavelength_reads_nan() {
        let s = Spectrum::new(vec![400.0, 500.0], vec![0.2, 0.6]).unwrap();
        assert!(s.sample(f64::NAN).is_nan());
        let values = s.resample_values(&[450.0, f64::NAN]);
        assert_abs_diff_eq!(values[0], 0.4, epsilon = 1e-12);
        assert!(values[1].is_nan());
    }

    #[test]
    fn test_integrate_drops_outside_samples() {
        let s = Spectrum::new(vec![370.0, 380.0, 730.0, 740.0], vec![100.0, 1.0, 1.0, 100.0]).unwrap();
        assert_abs_diff_eq!(s.integrate(380.0, 730.0), 350.0, epsilon = 1e-9);
        assert_eq!(Spectrum::empty().integrate(380.0, 730.0), 0.0);
        let single = Spectrum::new(vec![500.0], vec![3.0]).unwrap();
        assert_eq!(single.integrate(380.0, 730.0), 0.0);
    }

    #[test]
    fn test_max_abs_difference() {
        let a = Spectrum::new(vec![400.0, 500.0], vec![0.2, 0.6]).unwrap();
        let b = Spectrum::new(vec![400.0, 500.0], vec![0.25, 0.5]).unwrap();
        assert_abs_diff_eq!(a.max_abs_difference(&b), 0.1, epsilon = 1e-12);
        assert_eq!(a.max_abs_difference(&a), 0.0);
    }

    #[test]
    fn test_mean_of_repeats() {
        let a = Spectrum::new(vec![400.0, 500.0], vec![0.2, 0.4]).unwrap();
        let b = Spectrum::new(vec![400.0, 500.0], vec![0.4, 0.8]).unwrap();
        let m = Spectrum::mean([&a, &b]);
        assert_eq!(m.wavelengths(), &[400.0, 500.0]);
        assert_abs_diff_eq!(m.values()[0], 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(m.values()[1], 0.6, epsilon = 1e-12);
        assert!(Spectrum::mean(Vec::<&Spectrum>::new()).is_empty());
    }
}
