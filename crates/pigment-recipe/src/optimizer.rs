//! Single-subset recipe optimization.

use pigment_color::{
    WhitePoint, reflectance_to_lab, reflectance_to_linear_rgb, reflectance_to_rgb, rgb_int_to_float,
    rgb_to_xyz, xyz_to_lab,
};
use pigment_mixing::{MixComponent, TwoFluxModel};
use pigment_spectrum::Spectrum;
use serde::Serialize;
use tracing::trace;

use crate::bounded;
use crate::config::{ErrorSpace, SearchConfig};
use crate::error::{RecipeError, RecipeResult};

/// An optimized mixture for one pigment subset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    /// Pigments with normalized fractions summing to 1.
    pub components: Vec<MixComponent>,
    /// Optimizer weights before normalization, inside the configured bounds.
    pub raw_weights: Vec<f64>,
    /// Display-encoded sRGB of the mixture, each channel in [0, 1].
    pub rgb: [f64; 3],
    /// Squared color distance to the target in the configured space.
    pub error: f64,
    /// Predicted reflectance of the mixture.
    pub reflectance: Spectrum,
    /// Optimizer iterations.
    pub iterations: usize,
}

impl Recipe {
    /// Display color as 8-bit channels.
    pub fn rgb8(&self) -> [u8; 3] {
        self.rgb.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
    }

    /// Pigment names in subset order.
    pub fn pigments(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(|c| c.pigment.as_str())
    }
}

/// Finds mixing weights that reproduce a target color with a fixed subset.
///
/// The target is an 8-bit display color; the objective is the squared
/// distance between the mixed color and the target in
/// [`SearchConfig::error_space`].
///
/// # Example
///
/// ```rust
/// use pigment_mixing::{PigmentParameters, TwoFluxModel};
/// use pigment_recipe::{RecipeOptimizer, SearchConfig};
/// use pigment_spectrum::Spectrum;
///
/// let grid: Vec<f64> = (0..=70).map(|i| 380.0 + 5.0 * i as f64).collect();
/// let white = PigmentParameters::new(
///     Spectrum::constant(&grid, 0.0).unwrap(),
///     Spectrum::constant(&grid, 1.0).unwrap(),
/// );
/// let model = TwoFluxModel::from_parameters("white", [("white", white)]);
///
/// let optimizer = RecipeOptimizer::new(&model, [255, 255, 255], SearchConfig::default());
/// let recipe = optimizer.optimize(&["white"]).unwrap();
/// assert!(recipe.error < 1e-4);
/// assert_eq!(recipe.rgb8(), [255, 255, 255]);
/// ```
#[derive(Debug, Clone)]
pub struct RecipeOptimizer<'m> {
    model: &'m TwoFluxModel,
    target: [u8; 3],
    reference: [f64; 3],
    config: SearchConfig,
}

impl<'m> RecipeOptimizer<'m> {
    /// Creates an optimizer for `target` over `model`.
    pub fn new(model: &'m TwoFluxModel, target: [u8; 3], config: SearchConfig) -> Self {
        let reference = target_in(config.error_space, target);
        Self {
            model,
            target,
            reference,
            config,
        }
    }

    /// The fitted model.
    pub fn model(&self) -> &'m TwoFluxModel {
        self.model
    }

    /// The 8-bit target color.
    pub fn target(&self) -> [u8; 3] {
        self.target
    }

    /// Active configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Squared distance of a reflectance's color to the target.
    pub fn color_error(&self, reflectance: &Spectrum) -> f64 {
        let color = match self.config.error_space {
            ErrorSpace::LinearRgb => reflectance_to_linear_rgb(reflectance),
            ErrorSpace::EncodedRgb => reflectance_to_rgb(reflectance),
            ErrorSpace::Lab => reflectance_to_lab(reflectance, WhitePoint::D65),
        };
        color
            .iter()
            .zip(self.reference)
            .map(|(c, t)| (c - t) * (c - t))
            .sum()
    }

    /// Optimizes weights for `subset`, starting every weight at
    /// [`SearchConfig::initial_weight`].
    ///
    /// # Errors
    ///
    /// Empty subsets, unknown pigments, mixing failures during the search and
    /// non-convergence.
    pub fn optimize<S: AsRef<str>>(&self, subset: &[S]) -> RecipeResult<Recipe> {
        if subset.is_empty() {
            return Err(RecipeError::EmptySubset);
        }
        let plan = self.model.plan(subset)?;
        let start = vec![self.config.initial_weight; subset.len()];

        let minimum = bounded::minimize(
            |weights: &[f64]| Ok(self.color_error(&plan.evaluate(weights)?)),
            &start,
            self.config.min_weight,
            self.config.max_weight,
            &self.config.optimizer,
        )?;
        trace!(
            pigments = ?plan.pigments(),
            error = minimum.value,
            iterations = minimum.iterations,
            evaluations = minimum.evaluations,
            "subset optimized"
        );

        let reflectance = plan.evaluate(&minimum.x)?;
        let components = plan
            .pigments()
            .iter()
            .zip(fractions(&minimum.x))
            .map(|(name, w)| MixComponent::new(name.clone(), w))
            .collect();

        Ok(Recipe {
            components,
            raw_weights: minimum.x,
            rgb: reflectance_to_rgb(&reflectance),
            error: minimum.value,
            reflectance,
            iterations: minimum.iterations,
        })
    }
}

/// Weights as fractions of their sum; all-zero weights are equal shares,
/// matching how the model mixes them.
fn fractions(weights: &[f64]) -> Vec<f64> {
    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        weights.iter().map(|w| w / total).collect()
    } else {
        vec![1.0 / weights.len() as f64; weights.len()]
    }
}

/// Target color expressed in the error space.
fn target_in(space: ErrorSpace, target: [u8; 3]) -> [f64; 3] {
    match space {
        ErrorSpace::LinearRgb => rgb_int_to_float(target),
        ErrorSpace::EncodedRgb => target.map(|v| f64::from(v) / 255.0),
        ErrorSpace::Lab => {
            let xyz = rgb_to_xyz(rgb_int_to_float(target)).map(|c| c * 100.0);
            xyz_to_lab(xyz, WhitePoint::D65)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use pigment_mixing::PigmentParameters;

    fn grid() -> Vec<f64> {
        (0..=70).map(|i| 380.0 + 5.0 * i as f64).collect()
    }

    fn model() -> TwoFluxModel {
        let grid = grid();
        let white = PigmentParameters::new(
            Spectrum::constant(&grid, 0.0).unwrap(),
            Spectrum::constant(&grid, 1.0).unwrap(),
        );
        let black = PigmentParameters::new(
            Spectrum::constant(&grid, 10.0).unwrap(),
            Spectrum::constant(&grid, 0.05).unwrap(),
        );
        TwoFluxModel::from_parameters("white", [("white", white), ("black", black)])
    }

    #[test]
    fn test_white_target_with_white() {
        let m = model();
        let opt = RecipeOptimizer::new(&m, [255, 255, 255], SearchConfig::default());
        let recipe = opt.optimize(&["white"]).unwrap();
        assert!(recipe.error < 1e-4);
        assert_eq!(recipe.components.len(), 1);
        assert_abs_diff_eq!(recipe.components[0].weight, 1.0, epsilon = 1e-12);
        assert_eq!(recipe.raw_weights, vec![0.5]);
    }

    #[test]
    fn test_fractions() {
        assert_eq!(fractions(&[1.0, 3.0]), vec![0.25, 0.75]);
        assert_eq!(fractions(&[0.0, 0.0]), vec![0.5, 0.5]);
    }

    #[test]
    fn test_zero_lower_bound_keeps_fractions_finite() {
        let m = model();
        let config = SearchConfig {
            min_weight: 0.0,
            max_weight: 0.0,
            initial_weight: 0.0,
            ..SearchConfig::default()
        };
        assert!(config.validate().is_ok());
        let recipe = RecipeOptimizer::new(&m, [128, 128, 128], config)
            .optimize(&["white", "black"])
            .unwrap();
        assert_eq!(recipe.raw_weights, vec![0.0, 0.0]);
        for c in &recipe.components {
            assert_abs_diff_eq!(c.weight, 0.5, epsilon = 1e-15);
        }
        let equal = m
            .mix(&[MixComponent::new("white", 1.0), MixComponent::new("black", 1.0)])
            .unwrap();
        assert_eq!(recipe.reflectance, equal);
    }

    #[test]
    fn test_gray_needs_both() {
        let m = model();
        let opt = RecipeOptimizer::new(&m, [128, 128, 128], SearchConfig::default());
        let recipe = opt.optimize(&["white", "black"]).unwrap();
        assert!(recipe.error < 1e-6, "{:?}", recipe);
        let rgb = recipe.rgb8();
        for c in rgb {
            assert!((i32::from(c) - 128).abs() <= 1, "{:?}", rgb);
        }
        let sum: f64 = recipe.components.iter().map(|c| c.weight).sum();
        assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-12);
        assert!(recipe.raw_weights.iter().all(|&w| (0.001..=1.0).contains(&w)));
    }

    #[test]
    fn test_error_spaces_agree_on_exact_match() {
        let m = model();
        for space in [ErrorSpace::LinearRgb, ErrorSpace::EncodedRgb, ErrorSpace::Lab] {
            let config = SearchConfig {
                error_space: space,
                ..SearchConfig::default()
            };
            let opt = RecipeOptimizer::new(&m, [255, 255, 255], config);
            let recipe = opt.optimize(&["white"]).unwrap();
            assert!(recipe.error < 0.05, "{:?}: {}", space, recipe.error);
        }
    }

    #[test]
    fn test_errors() {
        let m = model();
        let opt = RecipeOptimizer::new(&m, [0, 0, 0], SearchConfig::default());
        assert_eq!(opt.optimize::<&str>(&[]), Err(RecipeError::EmptySubset));
        assert!(matches!(
            opt.optimize(&["magenta"]),
            Err(RecipeError::Mixing(pigment_mixing::MixingError::UnknownPigment(_)))
        ));
    }
}
