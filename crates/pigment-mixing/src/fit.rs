//! Fitting pigment parameters from calibration measurements.
//!
//! The reference white fixes the scale: `S ≡ 1` and `K = (1-R)^2 / 4R`.
//! Every other masstone is solved per wavelength from all samples that
//! contain it. For a sample with reflectance `R` in which the target pigment
//! has fraction `c` and already fitted pigments `j` have fractions `cj`,
//! the opaque-layer relation `K_mix / S_mix = (1-R)^2 / 4R` rearranges to
//!
//! ```text
//! 4R·c·K - (1-R)^2·c·S = Σj [ -4R·cj·Kj + (1-R)^2·cj·Sj ]
//! ```
//!
//! One row per sample gives a small least-squares system in `(K, S)`,
//! solved through the SVD pseudo-inverse so that exactly, over- and
//! under-determined wavelengths are handled alike.
//!
//! Pigments are fitted in dependency order. In each pass the pigments whose
//! every referencing mix is usable (all other components known) are fitted;
//! if there are none, pigments with at least one usable mix go instead and
//! their remaining mixes are ignored. Masstones that never get a usable mix
//! are left out of the model and listed by [`TwoFluxModel::unfitted`].

use std::collections::{BTreeMap, HashSet};

use nalgebra::{DMatrix, DVector};
use pigment_spectrum::Spectrum;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::calibration::Calibration;
use crate::consistency::{ConsistencyEntry, ConsistencyReport};
use crate::error::{MixingError, MixingResult};
use crate::km::k_over_s;
use crate::model::{PigmentParameters, TwoFluxModel};
use crate::sample::{MixComponent, PigmentSample};

/// Relative singular value cutoff of the pseudo-inverse.
const PINV_RCOND: f64 = 1e-15;

/// Options for [`TwoFluxModel::fit`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Masstone whose scattering defines the scale.
    pub reference_white: String,
    /// Largest accepted `sum |predicted - measured|` per sample.
    pub consistency_tolerance: f64,
    /// Fail instead of warning when a sample exceeds the tolerance.
    pub strict: bool,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            reference_white: "white".into(),
            consistency_tolerance: 1e-3,
            strict: false,
        }
    }
}

impl FitOptions {
    /// Options with a custom reference white.
    pub fn with_reference_white(name: impl Into<String>) -> Self {
        Self {
            reference_white: name.into(),
            ..Self::default()
        }
    }
}

/// A sample in which the pigment being fitted has fraction `c`.
struct Equation<'a> {
    sample: &'a PigmentSample,
    c: f64,
    others: Vec<&'a MixComponent>,
}

impl TwoFluxModel {
    /// Fits absorption and scattering spectra for every masstone.
    ///
    /// # Errors
    ///
    /// - [`MixingError::MissingReference`] / [`MixingError::ReferenceNotMasstone`]
    ///   for a bad reference white
    /// - [`MixingError::DegenerateReflectance`] if the white reflectance is
    ///   not positive
    /// - [`MixingError::Inconsistent`] in strict mode, or the mixing error of
    ///   a sample that cannot be re-predicted (one containing an unfitted
    ///   pigment)
    pub fn fit(calibration: &Calibration, options: &FitOptions) -> MixingResult<Self> {
        let white_name = options.reference_white.as_str();
        let white = calibration
            .get(white_name)
            .ok_or_else(|| MixingError::MissingReference(white_name.to_string()))?;
        if !white.is_masstone() {
            return Err(MixingError::ReferenceNotMasstone(white_name.to_string()));
        }

        let mut fitted = BTreeMap::new();
        fitted.insert(white_name.to_string(), white_parameters(white)?);
        debug!(white = white_name, samples = calibration.len(), "fitting pigment model");

        let mut pending: Vec<&str> = calibration
            .masstones()
            .map(|s| s.name.as_str())
            .filter(|&n| n != white_name)
            .collect();

        let mut pass = 0;
        while !pending.is_empty() {
            pass += 1;
            let known: HashSet<&str> = fitted.keys().map(String::as_str).collect();

            let mut complete = Vec::new();
            let mut partial = Vec::new();
            for &pigment in &pending {
                let (usable, total) = usable_equations(calibration, pigment, &known);
                if usable.len() > 1 && usable.len() - 1 == total {
                    complete.push((pigment, usable));
                } else if usable.len() > 1 {
                    partial.push((pigment, usable));
                }
            }

            let batch = if !complete.is_empty() {
                complete
            } else if !partial.is_empty() {
                partial
            } else {
                for &pigment in &pending {
                    warn!(pigment, "no mix anchors this pigment; leaving it unfitted");
                }
                break;
            };
            debug!(
                pass,
                pigments = ?batch.iter().map(|(p, _)| *p).collect::<Vec<_>>(),
                "fitting pass"
            );

            let mut solved = Vec::with_capacity(batch.len());
            for (pigment, equations) in &batch {
                solved.push((pigment.to_string(), solve_pigment(pigment, equations, &fitted)?));
            }
            for (pigment, params) in solved {
                pending.retain(|&p| p != pigment);
                fitted.insert(pigment, params);
            }
        }

        let unfitted = pending.iter().map(|p| p.to_string()).collect();
        let model = TwoFluxModel::from_parameters(white_name, fitted).with_unfitted(unfitted);
        let report = check_consistency(&model, calibration, options)?;
        Ok(model.with_report(report))
    }
}

/// White: `S ≡ 1` on the measured grid, `K = K/S`.
fn white_parameters(white: &PigmentSample) -> MixingResult<PigmentParameters> {
    let r = &white.reflectance;
    if let Some((wavelength, value)) = r.iter().find(|&(_, v)| v <= 0.0) {
        return Err(MixingError::DegenerateReflectance {
            sample: white.name.clone(),
            wavelength,
            value,
        });
    }
    let s = r.map(|_| 1.0);
    let k = r.map(k_over_s);
    Ok(PigmentParameters::new(k, s))
}

/// Equations for `pigment` whose other components are all known.
///
/// The pigment's own masstone comes first. Also returns how many mixes
/// reference the pigment at all.
fn usable_equations<'a>(
    calibration: &'a Calibration,
    pigment: &str,
    known: &HashSet<&str>,
) -> (Vec<Equation<'a>>, usize) {
    let mut usable = Vec::new();
    let mut total = 0;

    for sample in calibration.samples() {
        let Some(fractions) = calibration.flatten(&sample.name) else {
            continue;
        };
        let Some(own) = fractions.iter().find(|c| c.pigment == pigment && c.weight > 0.0) else {
            continue;
        };
        let others: Vec<&MixComponent> = fractions
            .iter()
            .filter(|c| c.pigment != pigment && c.weight > 0.0)
            .collect();

        if sample.is_masstone() {
            usable.insert(0, Equation { sample, c: own.weight, others });
            continue;
        }
        total += 1;
        if others.iter().all(|c| known.contains(c.pigment.as_str())) {
            usable.push(Equation { sample, c: own.weight, others });
        }
    }
    (usable, total)
}

/// Solves `(K, S)` of one pigment at every wavelength its samples cover.
fn solve_pigment(
    pigment: &str,
    equations: &[Equation<'_>],
    fitted: &BTreeMap<String, PigmentParameters>,
) -> MixingResult<PigmentParameters> {
    // Union of the referencing samples and their components' measurements.
    let mut grid: Vec<f64> = Vec::new();
    for eq in equations {
        grid = pigment_spectrum::union_grid(&grid, eq.sample.reflectance.wavelengths());
        for other in &eq.others {
            if let Some(p) = fitted.get(&other.pigment) {
                grid = pigment_spectrum::union_grid(&grid, &p.grid());
            }
        }
    }

    let mut wavelengths = Vec::with_capacity(grid.len());
    let mut k_values = Vec::with_capacity(grid.len());
    let mut s_values = Vec::with_capacity(grid.len());

    for &wavelength in &grid {
        let mut rows = Vec::with_capacity(equations.len() * 2);
        let mut rhs = Vec::with_capacity(equations.len());

        for eq in equations {
            let r = &eq.sample.reflectance;
            let Some((lo, hi)) = r.support() else {
                continue;
            };
            // Outside its support a sample says nothing about this wavelength.
            if wavelength < lo || wavelength > hi {
                continue;
            }
            let value = r.sample(wavelength);
            let absorb = 4.0 * value;
            let scatter = (1.0 - value) * (1.0 - value);

            let mut b = 0.0;
            for other in &eq.others {
                if let Some(p) = fitted.get(&other.pigment) {
                    b += -absorb * other.weight * p.k.resample_values(&[wavelength])[0]
                        + scatter * other.weight * p.s.resample_values(&[wavelength])[0];
                }
            }
            rows.extend_from_slice(&[absorb * eq.c, -scatter * eq.c]);
            rhs.push(b);
        }

        if rhs.is_empty() {
            continue;
        }
        let [k, s] = least_squares(pigment, wavelength, &rows, &rhs)?;
        trace!(pigment, wavelength, equations = rhs.len(), k, s, "solved");

        wavelengths.push(wavelength);
        k_values.push(k);
        s_values.push(s);
    }

    let k = Spectrum::new(wavelengths.clone(), k_values)?;
    let s = Spectrum::new(wavelengths, s_values)?;
    debug!(pigment, samples = equations.len(), wavelengths = k.len(), "pigment fitted");
    Ok(PigmentParameters::new(k, s))
}

/// Minimum-norm least-squares solution of an `n x 2` system via SVD.
fn least_squares(pigment: &str, wavelength: f64, rows: &[f64], rhs: &[f64]) -> MixingResult<[f64; 2]> {
    let a = DMatrix::from_row_slice(rhs.len(), 2, rows);
    let b = DVector::from_column_slice(rhs);

    let svd = a.svd(true, true);
    let max_sv = svd.singular_values.max();
    let eps = PINV_RCOND * max_sv;
    let x = svd.solve(&b, eps).map_err(|reason| MixingError::Solver {
        pigment: pigment.to_string(),
        wavelength,
        reason: reason.to_string(),
    })?;

    let k = x[0];
    let s = x[1];
    if !k.is_finite() || !s.is_finite() {
        return Err(MixingError::Solver {
            pigment: pigment.to_string(),
            wavelength,
            reason: "non-finite solution".into(),
        });
    }
    Ok([k, s])
}

fn check_consistency(
    model: &TwoFluxModel,
    calibration: &Calibration,
    options: &FitOptions,
) -> MixingResult<ConsistencyReport> {
    let tolerance = options.consistency_tolerance;
    let mut entries = Vec::with_capacity(calibration.len());

    for sample in calibration.samples() {
        let entry = match model.mix_sample(calibration, &sample.name) {
            Ok(predicted) => {
                ConsistencyEntry::compare(&sample.name, &predicted, &sample.reflectance, tolerance)
            }
            Err(err) if options.strict => return Err(err),
            Err(err) => {
                warn!(sample = %sample.name, error = %err, "calibration sample cannot be re-predicted");
                ConsistencyEntry::unpredictable(&sample.name)
            }
        };

        if !entry.passed {
            if options.strict {
                return Err(MixingError::Inconsistent {
                    sample: entry.sample,
                    sum_abs: entry.sum_abs,
                    tolerance,
                });
            }
            warn!(
                sample = %entry.sample,
                sum_abs = entry.sum_abs,
                max_abs = entry.max_abs,
                tolerance,
                "fitted model does not reproduce calibration sample"
            );
        } else {
            trace!(sample = %entry.sample, sum_abs = entry.sum_abs, "consistent");
        }
        entries.push(entry);
    }

    Ok(ConsistencyReport { tolerance, entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn flat(v: f64) -> Spectrum {
        Spectrum::new(vec![400.0, 500.0, 600.0], vec![v, v, v]).unwrap()
    }

    #[test]
    fn test_white_parameters() {
        let white = PigmentSample::masstone("white", flat(0.8));
        let p = white_parameters(&white).unwrap();
        assert!(p.s.values().iter().all(|&v| v == 1.0));
        let expected = 0.2 * 0.2 / 3.2;
        for &k in p.k.values() {
            assert_abs_diff_eq!(k, expected, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_white_zero_reflectance() {
        let r = Spectrum::new(vec![400.0, 500.0], vec![0.5, 0.0]).unwrap();
        let err = white_parameters(&PigmentSample::masstone("white", r)).unwrap_err();
        assert_eq!(
            err,
            MixingError::DegenerateReflectance {
                sample: "white".into(),
                wavelength: 500.0,
                value: 0.0
            }
        );
    }

    #[test]
    fn test_least_squares_exact() {
        // 2k + s = 4, k - s = -1  ->  k = 1, s = 2
        let [k, s] = least_squares("p", 500.0, &[2.0, 1.0, 1.0, -1.0], &[4.0, -1.0]).unwrap();
        assert_abs_diff_eq!(k, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_least_squares_underdetermined_is_min_norm() {
        // One equation k + s = 2: minimum-norm answer is k = s = 1
        let [k, s] = least_squares("p", 500.0, &[1.0, 1.0], &[2.0]).unwrap();
        assert_abs_diff_eq!(k, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_least_squares_overdetermined() {
        // k = 1, k = 3, s = 0 -> k = 2
        let [k, s] = least_squares("p", 500.0, &[1.0, 0.0, 1.0, 0.0, 0.0, 1.0], &[1.0, 3.0, 0.0]).unwrap();
        assert_abs_diff_eq!(k, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_and_mix_reference() {
        let cal = Calibration::new([
            PigmentSample::masstone("white", flat(0.9)),
            PigmentSample::mix("tint", [("white", 1.0)], flat(0.9)),
        ])
        .unwrap();
        assert_eq!(
            TwoFluxModel::fit(&cal, &FitOptions::with_reference_white("titanium")).unwrap_err(),
            MixingError::MissingReference("titanium".into())
        );
        assert_eq!(
            TwoFluxModel::fit(&cal, &FitOptions::with_reference_white("tint")).unwrap_err(),
            MixingError::ReferenceNotMasstone("tint".into())
        );
    }

    #[test]
    fn test_unanchored_pigment_is_left_unfitted() {
        let cal = Calibration::new([
            PigmentSample::masstone("white", flat(0.9)),
            PigmentSample::masstone("red", flat(0.3)),
        ])
        .unwrap();
        let model = TwoFluxModel::fit(&cal, &FitOptions::default()).unwrap();
        assert_eq!(model.pigments().collect::<Vec<_>>(), vec!["white"]);
        assert_eq!(model.unfitted(), &["red".to_string()]);
        assert_eq!(
            model.mix(&[MixComponent::new("red", 1.0)]),
            Err(MixingError::Underdetermined("red".into()))
        );

        let report = model.consistency();
        assert!(report.get("white").unwrap().passed);
        assert!(!report.get("red").unwrap().passed);
        assert!(report.get("red").unwrap().sum_abs.is_infinite());
    }

    #[test]
    fn test_unanchored_pigment_fails_strict_fit() {
        let cal = Calibration::new([
            PigmentSample::masstone("white", flat(0.9)),
            PigmentSample::masstone("red", flat(0.3)),
        ])
        .unwrap();
        let options = FitOptions {
            strict: true,
            ..FitOptions::default()
        };
        assert_eq!(
            TwoFluxModel::fit(&cal, &options).unwrap_err(),
            MixingError::Underdetermined("red".into())
        );
    }

    #[test]
    fn test_white_only_model() {
        let cal = Calibration::new([PigmentSample::masstone("white", flat(0.9))]).unwrap();
        let model = TwoFluxModel::fit(&cal, &FitOptions::default()).unwrap();
        assert_eq!(model.pigments().collect::<Vec<_>>(), vec!["white"]);
        assert_eq!(model.reference_white(), "white");
        assert!(model.consistency().passed());
    }

    #[test]
    fn test_fit_options_yaml_defaults() {
        let opts: FitOptions = serde_yaml::from_str("strict: true\n").unwrap();
        assert!(opts.strict);
        assert_eq!(opts.reference_white, "white");
        assert_eq!(opts.consistency_tolerance, 1e-3);
    }
}
