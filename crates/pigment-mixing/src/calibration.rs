//! Validated calibration sets.
//!
//! A [`Calibration`] owns the measured samples in insertion order and
//! guarantees the invariants the fitter relies on:
//!
//! - names are unique and every sample has reflectance data
//! - every mix component names a known sample
//! - mix weights are finite, non-negative and not all zero
//! - the mix dependency graph is acyclic
//!
//! Mixes may contain other mixes. Construction flattens every sample into
//! normalized masstone fractions, so a 1:1 mix of `white` with a 1:1 tint of
//! `blue` and `white` becomes `white 0.75, blue 0.25`.

use std::collections::HashMap;

use crate::error::{MixingError, MixingResult};
use crate::sample::{MixComponent, PigmentSample, SampleKind};

/// DFS state for cycle detection.
#[derive(Clone, Copy, PartialEq)]
enum Visit {
    New,
    Active,
    Done,
}

/// An immutable, validated set of calibration samples.
#[derive(Debug, Clone)]
pub struct Calibration {
    samples: Vec<PigmentSample>,
    index: HashMap<String, usize>,
    /// Masstone fractions per sample, parallel to `samples`.
    flattened: Vec<Vec<MixComponent>>,
}

impl Calibration {
    /// Validates `samples` and builds the calibration set.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty set, duplicate names, empty reflectance,
    /// unknown components, bad weights or cyclic mixes.
    pub fn new(samples: impl IntoIterator<Item = PigmentSample>) -> MixingResult<Self> {
        let samples: Vec<PigmentSample> = samples.into_iter().collect();
        if samples.is_empty() {
            return Err(MixingError::EmptyCalibration);
        }

        let mut index = HashMap::with_capacity(samples.len());
        for (i, sample) in samples.iter().enumerate() {
            if sample.reflectance.is_empty() {
                return Err(MixingError::EmptyReflectance(sample.name.clone()));
            }
            if index.insert(sample.name.clone(), i).is_some() {
                return Err(MixingError::DuplicateSample(sample.name.clone()));
            }
        }

        for sample in &samples {
            if let SampleKind::Mix(components) = &sample.kind {
                validate_mix(&sample.name, components, &index)?;
            }
        }

        let order = topological_order(&samples, &index)?;
        let flattened = flatten_all(&samples, &index, &order);

        Ok(Self {
            samples,
            index,
            flattened,
        })
    }

    /// All samples in insertion order.
    #[inline]
    pub fn samples(&self) -> &[PigmentSample] {
        &self.samples
    }

    /// Number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; construction rejects empty sets.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Looks up a sample by name.
    pub fn get(&self, name: &str) -> Option<&PigmentSample> {
        self.index.get(name).map(|&i| &self.samples[i])
    }

    /// Masstone samples in insertion order.
    pub fn masstones(&self) -> impl Iterator<Item = &PigmentSample> {
        self.samples.iter().filter(|s| s.is_masstone())
    }

    /// Mix samples in insertion order.
    pub fn mixes(&self) -> impl Iterator<Item = &PigmentSample> {
        self.samples.iter().filter(|s| !s.is_masstone())
    }

    /// Normalized masstone fractions of a sample.
    ///
    /// A masstone flattens to itself with fraction 1. Fractions sum to 1 and
    /// appear in first-encounter order.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pigment_mixing::{Calibration, PigmentSample};
    /// use pigment_spectrum::Spectrum;
    ///
    /// let r = Spectrum::new(vec![400.0, 700.0], vec![0.5, 0.5]).unwrap();
    /// let cal = Calibration::new([
    ///     PigmentSample::masstone("white", r.clone()),
    ///     PigmentSample::masstone("blue", r.clone()),
    ///     PigmentSample::mix("tint", [("blue", 1.0), ("white", 1.0)], r.clone()),
    ///     PigmentSample::mix("pale", [("tint", 1.0), ("white", 1.0)], r),
    /// ])
    /// .unwrap();
    ///
    /// let pale = cal.flatten("pale").unwrap();
    /// assert_eq!(pale[0].pigment, "blue");
    /// assert!((pale[0].weight - 0.25).abs() < 1e-12);
    /// assert!((pale[1].weight - 0.75).abs() < 1e-12);
    /// ```
    pub fn flatten(&self, name: &str) -> Option<&[MixComponent]> {
        self.index.get(name).map(|&i| self.flattened[i].as_slice())
    }
}

fn validate_mix(
    mix: &str,
    components: &[MixComponent],
    index: &HashMap<String, usize>,
) -> MixingResult<()> {
    let invalid = |reason: String| MixingError::InvalidMixWeights {
        mix: mix.to_string(),
        reason,
    };

    if components.is_empty() {
        return Err(invalid("no components".into()));
    }
    let mut total = 0.0;
    for c in components {
        if !index.contains_key(&c.pigment) {
            return Err(MixingError::UnknownComponent {
                mix: mix.to_string(),
                component: c.pigment.clone(),
            });
        }
        if !c.weight.is_finite() || c.weight < 0.0 {
            return Err(invalid(format!("'{}' has weight {}", c.pigment, c.weight)));
        }
        total += c.weight;
    }
    if total <= 0.0 {
        return Err(invalid("weights sum to zero".into()));
    }
    Ok(())
}

/// Orders samples so every mix follows its components.
fn topological_order(
    samples: &[PigmentSample],
    index: &HashMap<String, usize>,
) -> MixingResult<Vec<usize>> {
    let mut state = vec![Visit::New; samples.len()];
    let mut order = Vec::with_capacity(samples.len());
    let mut path = Vec::new();

    for root in 0..samples.len() {
        visit(root, samples, index, &mut state, &mut path, &mut order)?;
    }
    Ok(order)
}

fn visit(
    node: usize,
    samples: &[PigmentSample],
    index: &HashMap<String, usize>,
    state: &mut [Visit],
    path: &mut Vec<usize>,
    order: &mut Vec<usize>,
) -> MixingResult<()> {
    match state[node] {
        Visit::Done => return Ok(()),
        Visit::Active => {
            let start = path.iter().position(|&n| n == node).unwrap_or(0);
            let mut cycle: Vec<String> = path[start..]
                .iter()
                .map(|&n| samples[n].name.clone())
                .collect();
            cycle.push(samples[node].name.clone());
            return Err(MixingError::CyclicDependency(cycle));
        }
        Visit::New => {}
    }

    state[node] = Visit::Active;
    path.push(node);
    for c in samples[node].components() {
        // Components were validated against the index already.
        if let Some(&child) = index.get(&c.pigment) {
            visit(child, samples, index, state, path, order)?;
        }
    }
    path.pop();
    state[node] = Visit::Done;
    order.push(node);
    Ok(())
}

fn flatten_all(
    samples: &[PigmentSample],
    index: &HashMap<String, usize>,
    order: &[usize],
) -> Vec<Vec<MixComponent>> {
    let mut flattened: Vec<Vec<MixComponent>> = vec![Vec::new(); samples.len()];

    for &i in order {
        let sample = &samples[i];
        let fractions = match &sample.kind {
            SampleKind::Masstone => vec![MixComponent::new(sample.name.clone(), 1.0)],
            SampleKind::Mix(components) => {
                let total: f64 = components.iter().map(|c| c.weight).sum();
                let mut merged: Vec<MixComponent> = Vec::new();
                for c in components {
                    let share = c.weight / total;
                    let Some(&child) = index.get(&c.pigment) else {
                        continue;
                    };
                    for leaf in &flattened[child] {
                        match merged.iter_mut().find(|m| m.pigment == leaf.pigment) {
                            Some(m) => m.weight += share * leaf.weight,
                            None => merged.push(MixComponent::new(
                                leaf.pigment.clone(),
                                share * leaf.weight,
                            )),
                        }
                    }
                }
                merged
            }
        };
        flattened[i] = fractions;
    }
    flattened
}
