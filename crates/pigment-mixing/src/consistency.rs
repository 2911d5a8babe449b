//! Self-consistency of a fitted model against its calibration data.

use pigment_color::{WhitePoint, delta_e76, reflectance_to_lab};
use pigment_spectrum::Spectrum;
use serde::Serialize;

/// How well one calibration sample is reproduced by the fitted model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsistencyEntry {
    /// Sample name.
    pub sample: String,
    /// Sum of absolute reflectance differences over the measured grid.
    pub sum_abs: f64,
    /// Root-mean-square difference.
    pub rms: f64,
    /// Largest absolute difference.
    pub max_abs: f64,
    /// CIE76 color difference of prediction and measurement under D65.
    pub delta_e: f64,
    /// Whether `sum_abs` is within tolerance.
    pub passed: bool,
}

impl ConsistencyEntry {
    /// Compares a predicted reflectance against a measurement.
    ///
    /// Differences are taken on the measurement's own grid.
    pub fn compare(sample: &str, predicted: &Spectrum, measured: &Spectrum, tolerance: f64) -> Self {
        let predicted_values = predicted.resample_values(measured.wavelengths());
        let diffs: Vec<f64> = predicted_values
            .iter()
            .zip(measured.values())
            .map(|(p, m)| (p - m).abs())
            .collect();

        let sum_abs: f64 = diffs.iter().sum();
        let max_abs = diffs.iter().fold(0.0_f64, |acc, &d| acc.max(d));
        let rms = if diffs.is_empty() {
            0.0
        } else {
            (diffs.iter().map(|d| d * d).sum::<f64>() / diffs.len() as f64).sqrt()
        };
        let delta_e = delta_e76(
            reflectance_to_lab(predicted, WhitePoint::D65),
            reflectance_to_lab(measured, WhitePoint::D65),
        );

        Self {
            sample: sample.to_string(),
            sum_abs,
            rms,
            max_abs,
            delta_e,
            passed: sum_abs <= tolerance,
        }
    }

    /// Entry for a sample the model could not predict at all.
    pub fn unpredictable(sample: &str) -> Self {
        Self {
            sample: sample.to_string(),
            sum_abs: f64::INFINITY,
            rms: f64::INFINITY,
            max_abs: f64::INFINITY,
            delta_e: f64::INFINITY,
            passed: false,
        }
    }
}

/// Per-sample reproduction errors recorded after fitting.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConsistencyReport {
    /// Tolerance on `sum_abs` used for `passed`.
    pub tolerance: f64,
    /// One entry per calibration sample, in calibration order.
    pub entries: Vec<ConsistencyEntry>,
}

impl ConsistencyReport {
    /// True when every sample passed.
    pub fn passed(&self) -> bool {
        self.entries.iter().all(|e| e.passed)
    }

    /// Entries that exceeded the tolerance.
    pub fn failures(&self) -> impl Iterator<Item = &ConsistencyEntry> {
        self.entries.iter().filter(|e| !e.passed)
    }

    /// Entry with the largest `sum_abs`.
    pub fn worst(&self) -> Option<&ConsistencyEntry> {
        self.entries
            .iter()
            .max_by(|a, b| a.sum_abs.total_cmp(&b.sum_abs))
    }

    /// Looks up the entry for a sample.
    pub fn get(&self, sample: &str) -> Option<&ConsistencyEntry> {
        self.entries.iter().find(|e| e.sample == sample)
    }
}
