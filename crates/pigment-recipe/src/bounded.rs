//! Box-constrained quasi-Newton minimization.
//!
//! A small projected BFGS for smooth objectives of a handful of variables,
//! all sharing one `[lower, upper]` interval:
//!
//! 1. Gradient by forward differences (backward at the upper bound).
//! 2. Variables pinned at a bound with the gradient pushing outward are held
//!    fixed; the search direction is `-H·g` over the rest.
//! 3. Projected Armijo backtracking along that direction.
//! 4. BFGS update of the inverse Hessian when the curvature `sᵀy` is positive.
//!
//! Stops when the projected gradient or the relative decrease of the
//! objective is below tolerance. Only a local minimum is found.

use nalgebra::{DMatrix, DVector};

use crate::config::OptimizerSettings;
use crate::error::{RecipeError, RecipeResult};

/// Sufficient-decrease constant of the Armijo condition.
const ARMIJO_C1: f64 = 1e-4;

/// Backtracking halvings before giving up on a direction.
const MAX_BACKTRACKS: usize = 40;

/// Result of a successful minimization.
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    /// Minimizer, inside the bounds.
    pub x: Vec<f64>,
    /// Objective at `x`.
    pub value: f64,
    /// Quasi-Newton iterations taken.
    pub iterations: usize,
    /// Objective evaluations, gradient probes included.
    pub evaluations: usize,
}

struct Objective<F> {
    f: F,
    lower: f64,
    upper: f64,
    step: f64,
    evaluations: usize,
}

impl<F> Objective<F>
where
    F: FnMut(&[f64]) -> RecipeResult<f64>,
{
    fn value(&mut self, x: &[f64]) -> RecipeResult<f64> {
        self.evaluations += 1;
        let v = (self.f)(x)?;
        if v.is_finite() {
            Ok(v)
        } else {
            Err(RecipeError::NonFiniteObjective(x.to_vec()))
        }
    }

    fn gradient(&mut self, x: &[f64], fx: f64) -> RecipeResult<DVector<f64>> {
        let mut probe = x.to_vec();
        let mut g = DVector::zeros(x.len());
        for i in 0..x.len() {
            let h = self.step * x[i].abs().max(1.0);
            if self.upper - self.lower < h {
                continue;
            }
            let forward = x[i] + h <= self.upper;
            probe[i] = if forward { x[i] + h } else { x[i] - h };
            let fh = self.value(&probe)?;
            g[i] = if forward { (fh - fx) / h } else { (fx - fh) / h };
            probe[i] = x[i];
        }
        Ok(g)
    }

    fn project(&self, v: f64) -> f64 {
        v.clamp(self.lower, self.upper)
    }
}

/// Minimizes `f` over the box `[lower, upper]^n` starting from `x0`.
///
/// `x0` is projected into the box first.
///
/// # Errors
///
/// Errors from `f` propagate. [`RecipeError::NotConverged`] after
/// `settings.max_iterations` iterations.
///
/// # Example
///
/// ```rust
/// use pigment_recipe::{OptimizerSettings, bounded::minimize};
///
/// // Unconstrained minimum at (2, -1); the box clips it to (1, 0).
/// let min = minimize(
///     |x: &[f64]| Ok((x[0] - 2.0).powi(2) + (x[1] + 1.0).powi(2)),
///     &[0.5, 0.5],
///     0.0,
///     1.0,
///     &OptimizerSettings::default(),
/// )
/// .unwrap();
/// assert!((min.x[0] - 1.0).abs() < 1e-6);
/// assert!(min.x[1].abs() < 1e-6);
/// ```
pub fn minimize<F>(
    f: F,
    x0: &[f64],
    lower: f64,
    upper: f64,
    settings: &OptimizerSettings,
) -> RecipeResult<Minimum>
where
    F: FnMut(&[f64]) -> RecipeResult<f64>,
{
    let n = x0.len();
    if n == 0 {
        return Err(RecipeError::EmptySubset);
    }
    if !(lower.is_finite() && upper.is_finite() && lower <= upper) {
        return Err(RecipeError::InvalidBounds { lower, upper });
    }

    let mut obj = Objective {
        f,
        lower,
        upper,
        step: settings.finite_difference_step,
        evaluations: 0,
    };

    let mut x = DVector::from_iterator(n, x0.iter().map(|&v| obj.project(v)));
    let mut fx = obj.value(x.as_slice())?;
    let mut g = obj.gradient(x.as_slice(), fx)?;
    let mut h_inv = DMatrix::<f64>::identity(n, n);

    let done = |x: DVector<f64>, value: f64, iterations: usize, evaluations: usize| Minimum {
        x: x.as_slice().to_vec(),
        value,
        iterations,
        evaluations,
    };

    for iteration in 0..settings.max_iterations {
        if projected_gradient_norm(&x, &g, lower, upper) <= settings.gradient_tolerance {
            return Ok(done(x, fx, iteration, obj.evaluations));
        }

        let free: Vec<bool> = (0..n)
            .map(|i| !((x[i] <= lower && g[i] > 0.0) || (x[i] >= upper && g[i] < 0.0)))
            .collect();

        let mut d = direction(&h_inv, &g, &free);
        if d.dot(&g) >= 0.0 {
            // Lost descent; restart from steepest descent.
            h_inv = DMatrix::identity(n, n);
            d = direction(&h_inv, &g, &free);
        }

        let Some((x_new, f_new)) = line_search(&mut obj, &x, fx, &g, &d)? else {
            return Ok(done(x, fx, iteration, obj.evaluations));
        };
        let g_new = obj.gradient(x_new.as_slice(), f_new)?;

        let s = &x_new - &x;
        let y = &g_new - &g;
        let sy = s.dot(&y);
        if sy > f64::EPSILON * s.norm() * y.norm() {
            let rho = 1.0 / sy;
            let identity = DMatrix::<f64>::identity(n, n);
            let left = &identity - rho * &s * y.transpose();
            let right = &identity - rho * &y * s.transpose();
            h_inv = &left * &h_inv * &right + rho * &s * s.transpose();
        }

        let decrease = fx - f_new;
        let scale = fx.abs().max(f_new.abs()).max(1.0);
        x = x_new;
        fx = f_new;
        g = g_new;

        if decrease <= settings.function_tolerance * scale {
            return Ok(done(x, fx, iteration + 1, obj.evaluations));
        }
    }

    Err(RecipeError::NotConverged {
        iterations: settings.max_iterations,
        error: fx,
    })
}

/// Largest component of `P(x - g) - x`.
fn projected_gradient_norm(x: &DVector<f64>, g: &DVector<f64>, lower: f64, upper: f64) -> f64 {
    x.iter()
        .zip(g.iter())
        .map(|(&xi, &gi)| ((xi - gi).clamp(lower, upper) - xi).abs())
        .fold(0.0, f64::max)
}

/// `-H·g` restricted to free variables; zero for pinned ones.
fn direction(h_inv: &DMatrix<f64>, g: &DVector<f64>, free: &[bool]) -> DVector<f64> {
    let n = g.len();
    DVector::from_fn(n, |i, _| {
        if !free[i] {
            return 0.0;
        }
        -(0..n)
            .filter(|&j| free[j])
            .map(|j| h_inv[(i, j)] * g[j])
            .sum::<f64>()
    })
}

/// Projected backtracking; `None` when no step decreases the objective.
fn line_search<F>(
    obj: &mut Objective<F>,
    x: &DVector<f64>,
    fx: f64,
    g: &DVector<f64>,
    d: &DVector<f64>,
) -> RecipeResult<Option<(DVector<f64>, f64)>>
where
    F: FnMut(&[f64]) -> RecipeResult<f64>,
{
    let mut t = 1.0;
    for _ in 0..MAX_BACKTRACKS {
        let candidate = DVector::from_fn(x.len(), |i, _| obj.project(x[i] + t * d[i]));
        let step = &candidate - x;
        if step.amax() == 0.0 {
            return Ok(None);
        }
        let f_new = obj.value(candidate.as_slice())?;
        if f_new <= fx + ARMIJO_C1 * g.dot(&step) {
            return Ok(Some((candidate, f_new)));
        }
        t *= 0.5;
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn settings() -> OptimizerSettings {
        OptimizerSettings::default()
    }

    #[test]
    fn test_interior_minimum() {
        let min = minimize(
            |x: &[f64]| Ok((x[0] - 0.3).powi(2) + 2.0 * (x[1] - 0.7).powi(2)),
            &[0.5, 0.5],
            0.0,
            1.0,
            &settings(),
        )
        .unwrap();
        assert_abs_diff_eq!(min.x[0], 0.3, epsilon = 1e-4);
        assert_abs_diff_eq!(min.x[1], 0.7, epsilon = 1e-4);
        assert!(min.value < 1e-8);
    }

    #[test]
    fn test_minimum_on_bound() {
        let min = minimize(
            |x: &[f64]| Ok((x[0] + 1.0).powi(2)),
            &[0.5],
            0.001,
            1.0,
            &settings(),
        )
        .unwrap();
        assert_eq!(min.x[0], 0.001);
    }

    #[test]
    fn test_start_is_projected() {
        let min = minimize(|x: &[f64]| Ok(x[0]), &[5.0], 0.0, 1.0, &settings()).unwrap();
        assert_eq!(min.x[0], 0.0);
    }

    #[test]
    fn test_flat_objective_stops_immediately() {
        let min = minimize(|_: &[f64]| Ok(1.0), &[0.5, 0.5], 0.0, 1.0, &settings()).unwrap();
        assert_eq!(min.iterations, 0);
        assert_eq!(min.x, vec![0.5, 0.5]);
    }

    #[test]
    fn test_rosenbrock_in_box() {
        let min = minimize(
            |x: &[f64]| Ok((1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2)),
            &[0.5, 0.5],
            0.0,
            2.0,
            &OptimizerSettings {
                max_iterations: 500,
                function_tolerance: 1e-14,
                ..settings()
            },
        )
        .unwrap();
        assert_abs_diff_eq!(min.x[0], 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(min.x[1], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_errors() {
        let ok = |_: &[f64]| Ok(0.0);
        assert_eq!(
            minimize(ok, &[], 0.0, 1.0, &settings()),
            Err(RecipeError::EmptySubset)
        );
        assert_eq!(
            minimize(ok, &[0.5], 1.0, 0.0, &settings()),
            Err(RecipeError::InvalidBounds { lower: 1.0, upper: 0.0 })
        );
        assert!(matches!(
            minimize(|_: &[f64]| Ok(f64::NAN), &[0.5], 0.0, 1.0, &settings()),
            Err(RecipeError::NonFiniteObjective(_))
        ));
    }

    #[test]
    fn test_iteration_cap() {
        let capped = OptimizerSettings {
            max_iterations: 1,
            function_tolerance: 0.0,
            gradient_tolerance: 0.0,
            ..settings()
        };
        let result = minimize(
            |x: &[f64]| Ok((1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2)),
            &[0.0, 0.0],
            -2.0,
            2.0,
            &capped,
        );
        assert!(matches!(result, Err(RecipeError::NotConverged { iterations: 1, .. })));
    }
}
