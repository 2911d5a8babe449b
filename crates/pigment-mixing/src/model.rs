//! Fitted two-flux pigment model and forward mixing.
//!
//! A mixture's absorption and scattering are the weight-averaged `K` and `S`
//! of its pigments, evaluated on the union of their grids:
//!
//! ```text
//! K_mix = Σ wi·Ki    S_mix = Σ wi·Si    ω = S_mix / (K_mix + S_mix)
//! ```
//!
//! Weights are normalized first, so only their ratios matter.

use std::collections::BTreeMap;

use pigment_spectrum::Spectrum;
use serde::Serialize;

use crate::calibration::Calibration;
use crate::consistency::ConsistencyReport;
use crate::error::{MixingError, MixingResult};
use crate::km;
use crate::sample::MixComponent;

/// Absorption and scattering spectra of one pigment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PigmentParameters {
    /// Absorption coefficient `K`.
    pub k: Spectrum,
    /// Scattering coefficient `S`.
    pub s: Spectrum,
}

impl PigmentParameters {
    /// Pairs absorption and scattering spectra.
    pub fn new(k: Spectrum, s: Spectrum) -> Self {
        Self { k, s }
    }

    /// Union of the `K` and `S` grids.
    pub fn grid(&self) -> Vec<f64> {
        self.k.union_grid(&self.s)
    }
}

/// Immutable fitted pigment model.
///
/// Built once by [`TwoFluxModel::fit`] (or from known parameters) and shared
/// by reference; it has no interior mutability and is `Send + Sync`.
#[derive(Debug, Clone)]
pub struct TwoFluxModel {
    parameters: BTreeMap<String, PigmentParameters>,
    reference_white: String,
    unfitted: Vec<String>,
    report: ConsistencyReport,
}

impl TwoFluxModel {
    /// Wraps already known parameters. The consistency report is empty.
    pub fn from_parameters<N: Into<String>>(
        reference_white: impl Into<String>,
        parameters: impl IntoIterator<Item = (N, PigmentParameters)>,
    ) -> Self {
        Self {
            parameters: parameters.into_iter().map(|(n, p)| (n.into(), p)).collect(),
            reference_white: reference_white.into(),
            unfitted: Vec::new(),
            report: ConsistencyReport::default(),
        }
    }

    pub(crate) fn with_report(mut self, report: ConsistencyReport) -> Self {
        self.report = report;
        self
    }

    pub(crate) fn with_unfitted(mut self, unfitted: Vec<String>) -> Self {
        self.unfitted = unfitted;
        self
    }

    /// Parameters of one pigment.
    pub fn parameters(&self, pigment: &str) -> Option<&PigmentParameters> {
        self.parameters.get(pigment)
    }

    /// Fitted pigment names in sorted order.
    pub fn pigments(&self) -> impl Iterator<Item = &str> {
        self.parameters.keys().map(String::as_str)
    }

    /// Number of fitted pigments.
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// True if no pigment is fitted.
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Calibrated masstones that no usable mix anchored, in calibration order.
    ///
    /// They have no parameters; mixing them fails with
    /// [`MixingError::Underdetermined`].
    pub fn unfitted(&self) -> &[String] {
        &self.unfitted
    }

    /// Name of the pigment whose scattering defines the scale (`S ≡ 1`).
    pub fn reference_white(&self) -> &str {
        &self.reference_white
    }

    /// Reproduction errors of the calibration samples.
    pub fn consistency(&self) -> &ConsistencyReport {
        &self.report
    }

    /// Predicts the reflectance of a mixture.
    ///
    /// Weights are normalized; all-zero weights mix equal parts.
    ///
    /// # Errors
    ///
    /// Empty mixtures, unknown pigments, negative or non-finite weights and
    /// non-physical `ω` are errors.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pigment_mixing::{MixComponent, PigmentParameters, TwoFluxModel};
    /// use pigment_spectrum::Spectrum;
    ///
    /// let grid = [400.0, 500.0, 600.0];
    /// let white = PigmentParameters::new(
    ///     Spectrum::constant(&grid, 0.01).unwrap(),
    ///     Spectrum::constant(&grid, 1.0).unwrap(),
    /// );
    /// let black = PigmentParameters::new(
    ///     Spectrum::constant(&grid, 5.0).unwrap(),
    ///     Spectrum::constant(&grid, 0.1).unwrap(),
    /// );
    /// let model = TwoFluxModel::from_parameters("white", [("white", white), ("black", black)]);
    ///
    /// let gray = model
    ///     .mix(&[MixComponent::new("white", 3.0), MixComponent::new("black", 1.0)])
    ///     .unwrap();
    /// assert!(gray.values().iter().all(|&r| r > 0.0 && r < 0.5));
    /// ```
    pub fn mix(&self, components: &[MixComponent]) -> MixingResult<Spectrum> {
        let names: Vec<&str> = components.iter().map(|c| c.pigment.as_str()).collect();
        let weights: Vec<f64> = components.iter().map(|c| c.weight).collect();
        self.plan(&names)?.evaluate(&weights)
    }

    /// Re-predicts a calibration sample from its masstone fractions.
    pub fn mix_sample(&self, calibration: &Calibration, sample: &str) -> MixingResult<Spectrum> {
        let fractions = calibration
            .flatten(sample)
            .ok_or_else(|| MixingError::UnknownPigment(sample.to_string()))?;
        self.mix(fractions)
    }

    /// Prepares repeated mixing of a fixed pigment set.
    ///
    /// `K` and `S` of every pigment are resampled onto the combined grid once,
    /// so [`MixPlan::evaluate`] only does the per-wavelength arithmetic.
    pub fn plan<S: AsRef<str>>(&self, pigments: &[S]) -> MixingResult<MixPlan> {
        if pigments.is_empty() {
            return Err(MixingError::EmptyMixture);
        }
        let params = pigments
            .iter()
            .map(|p| {
                let name = p.as_ref();
                self.parameters.get(name).ok_or_else(|| {
                    if self.unfitted.iter().any(|u| u == name) {
                        MixingError::Underdetermined(name.to_string())
                    } else {
                        MixingError::UnknownPigment(name.to_string())
                    }
                })
            })
            .collect::<MixingResult<Vec<_>>>()?;

        let grid = params.iter().fold(Vec::new(), |grid, p| {
            pigment_spectrum::union_grid(&grid, &p.grid())
        });
        let k = params.iter().map(|p| p.k.resample_values(&grid)).collect();
        let s = params.iter().map(|p| p.s.resample_values(&grid)).collect();

        Ok(MixPlan {
            pigments: pigments.iter().map(|p| p.as_ref().to_string()).collect(),
            grid,
            k,
            s,
        })
    }
}

/// Pigment set resampled onto a shared grid, ready for repeated mixing.
#[derive(Debug, Clone)]
pub struct MixPlan {
    pigments: Vec<String>,
    grid: Vec<f64>,
    k: Vec<Vec<f64>>,
    s: Vec<Vec<f64>>,
}

impl MixPlan {
    /// Pigments in weight order.
    pub fn pigments(&self) -> &[String] {
        &self.pigments
    }

    /// Combined wavelength grid.
    pub fn grid(&self) -> &[f64] {
        &self.grid
    }

    /// Mixed reflectance for one weight per planned pigment.
    pub fn evaluate(&self, weights: &[f64]) -> MixingResult<Spectrum> {
        let fractions = self.normalize(weights)?;

        let values = self
            .grid
            .iter()
            .enumerate()
            .map(|(i, &wavelength)| {
                let mut k = 0.0;
                let mut s = 0.0;
                for (j, &w) in fractions.iter().enumerate() {
                    k += w * self.k[j][i];
                    s += w * self.s[j][i];
                }
                km::reflectance(wavelength, k, s)
            })
            .collect::<MixingResult<Vec<f64>>>()?;

        Ok(Spectrum::new(self.grid.clone(), values)?)
    }

    fn normalize(&self, weights: &[f64]) -> MixingResult<Vec<f64>> {
        if weights.len() != self.pigments.len() {
            return Err(MixingError::WeightCountMismatch {
                expected: self.pigments.len(),
                got: weights.len(),
            });
        }
        for (pigment, &weight) in self.pigments.iter().zip(weights) {
            if !weight.is_finite() || weight < 0.0 {
                return Err(MixingError::InvalidWeight {
                    pigment: pigment.clone(),
                    weight,
                });
            }
        }

        let total: f64 = weights.iter().sum();
        if total > 0.0 {
            Ok(weights.iter().map(|w| w / total).collect())
        } else {
            Ok(vec![1.0 / weights.len() as f64; weights.len()])
        }
    }
}
