//! Calibration samples and mixture components.

use pigment_spectrum::Spectrum;
use serde::{Deserialize, Serialize};

/// A pigment and its (unnormalized) amount in a mixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixComponent {
    /// Pigment name.
    pub pigment: String,
    /// Volume or mass amount; normalized before mixing.
    pub weight: f64,
}

impl MixComponent {
    /// Creates a component.
    pub fn new(pigment: impl Into<String>, weight: f64) -> Self {
        Self {
            pigment: pigment.into(),
            weight,
        }
    }
}

impl<S: Into<String>> From<(S, f64)> for MixComponent {
    fn from((pigment, weight): (S, f64)) -> Self {
        Self::new(pigment, weight)
    }
}

/// Whether a sample is a pure pigment or a measured mixture.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleKind {
    /// Undiluted pigment.
    Masstone,
    /// Mixture of other samples with known relative weights.
    Mix(Vec<MixComponent>),
}

/// One measured calibration sample.
#[derive(Debug, Clone, PartialEq)]
pub struct PigmentSample {
    /// Unique sample name.
    pub name: String,
    /// Masstone or mix.
    pub kind: SampleKind,
    /// Measured reflectance as a fraction in [0, 1].
    pub reflectance: Spectrum,
}

impl PigmentSample {
    /// A masstone sample.
    pub fn masstone(name: impl Into<String>, reflectance: Spectrum) -> Self {
        Self {
            name: name.into(),
            kind: SampleKind::Masstone,
            reflectance,
        }
    }

    /// A mix sample.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pigment_mixing::PigmentSample;
    /// use pigment_spectrum::Spectrum;
    ///
    /// let r = Spectrum::new(vec![400.0, 700.0], vec![0.4, 0.5]).unwrap();
    /// let tint = PigmentSample::mix("blue tint", [("blue", 1.0), ("white", 3.0)], r);
    /// assert_eq!(tint.components().len(), 2);
    /// ```
    pub fn mix<C: Into<MixComponent>>(
        name: impl Into<String>,
        components: impl IntoIterator<Item = C>,
        reflectance: Spectrum,
    ) -> Self {
        Self {
            name: name.into(),
            kind: SampleKind::Mix(components.into_iter().map(Into::into).collect()),
            reflectance,
        }
    }

    /// True for masstones.
    #[inline]
    pub fn is_masstone(&self) -> bool {
        matches!(self.kind, SampleKind::Masstone)
    }

    /// Mix components; empty for masstones.
    #[inline]
    pub fn components(&self) -> &[MixComponent] {
        match &self.kind {
            SampleKind::Masstone => &[],
            SampleKind::Mix(components) => components,
        }
    }
}
