//! Search and optimizer settings.

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Color space in which the optimizer measures the mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorSpace {
    /// Linear-light sRGB against the degamma'd target.
    #[default]
    LinearRgb,
    /// Gamma-encoded sRGB against `byte / 255`.
    EncodedRgb,
    /// CIE Lab under D65; the error is squared Delta E 1976.
    Lab,
}

/// Limits of the bounded quasi-Newton solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSettings {
    /// Iteration cap; hitting it is a [`NotConverged`](crate::RecipeError::NotConverged) error.
    pub max_iterations: usize,
    /// Stop when every projected gradient component is below this.
    pub gradient_tolerance: f64,
    /// Stop when the relative objective decrease is below this.
    pub function_tolerance: f64,
    /// Forward-difference step relative to `max(1, |x|)`.
    pub finite_difference_step: f64,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            gradient_tolerance: 1e-7,
            function_tolerance: 2.220446049250313e-9,
            finite_difference_step: 1e-8,
        }
    }
}

/// Configuration of the subset sweep and the per-subset optimizer.
///
/// # Example
///
/// ```rust
/// use pigment_recipe::{ErrorSpace, SearchConfig};
///
/// let config = SearchConfig {
///     max_pigments: 2,
///     error_space: ErrorSpace::Lab,
///     ..SearchConfig::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Largest subset size tried.
    pub max_pigments: usize,
    /// Recipes kept per subset size.
    pub top_results: usize,
    /// Lower weight bound.
    pub min_weight: f64,
    /// Upper weight bound.
    pub max_weight: f64,
    /// Starting weight of every pigment.
    pub initial_weight: f64,
    /// Where color differences are measured.
    pub error_space: ErrorSpace,
    /// Solver limits.
    pub optimizer: OptimizerSettings,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_pigments: 4,
            top_results: 3,
            min_weight: 0.001,
            max_weight: 1.0,
            initial_weight: 0.5,
            error_space: ErrorSpace::default(),
            optimizer: OptimizerSettings::default(),
        }
    }
}

impl SearchConfig {
    /// Checks limits and bounds.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.max_pigments == 0 {
            return Err(SearchError::InvalidConfig("max_pigments must be at least 1".into()));
        }
        if self.top_results == 0 {
            return Err(SearchError::InvalidConfig("top_results must be at least 1".into()));
        }
        let bounds_ok = self.min_weight.is_finite()
            && self.max_weight.is_finite()
            && self.min_weight >= 0.0
            && self.min_weight <= self.max_weight;
        if !bounds_ok {
            return Err(SearchError::InvalidConfig(format!(
                "weight bounds [{}, {}] are not a non-negative interval",
                self.min_weight, self.max_weight
            )));
        }
        if self.optimizer.max_iterations == 0 {
            return Err(SearchError::InvalidConfig("max_iterations must be at least 1".into()));
        }
        Ok(())
    }
}
