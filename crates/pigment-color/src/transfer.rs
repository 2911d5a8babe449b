//! sRGB-style display transfer function.
//!
//! A piecewise curve combining a linear segment near black with a power law
//! for the rest. The linear segment keeps the derivative finite at zero, which
//! matters for gradient-based recipe optimization.
//!
//! The constants are the exact rational forms of the sRGB curve:
//! `12.92 = 323/25`, `1.055 = 211/200`, `0.055 = 11/200`, `2.4 = 12/5`.
//!
//! # Range
//!
//! - Input/Output: [0, 1]
//!
//! # Reference
//!
//! IEC 61966-2-1:1999

/// Linear-light threshold below which [`gamma`] is linear.
pub const GAMMA_THRESHOLD: f64 = 0.0031308;

/// Encoded threshold below which [`degamma`] is linear.
pub const DEGAMMA_THRESHOLD: f64 = 0.04045;

/// Encodes linear light for display.
///
/// # Formula
///
/// ```text
/// if L <= 0.0031308:
///     V = L * 323/25
/// else:
///     V = (211 * L^(5/12) - 11) / 200
/// ```
///
/// # Example
///
/// ```rust
/// use pigment_color::gamma;
///
/// let encoded = gamma(0.214);
/// assert!((encoded - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn gamma(x: f64) -> f64 {
    if x <= GAMMA_THRESHOLD {
        323.0 / 25.0 * x
    } else {
        (211.0 * x.powf(5.0 / 12.0) - 11.0) / 200.0
    }
}

/// Decodes display values to linear light.
///
/// # Formula
///
/// ```text
/// if V <= 0.04045:
///     L = V * 25/323
/// else:
///     L = ((200 * V + 11) / 211)^(12/5)
/// ```
///
/// # Example
///
/// ```rust
/// use pigment_color::degamma;
///
/// let linear = degamma(0.5);
/// assert!((linear - 0.214).abs() < 0.01);
/// ```
#[inline]
pub fn degamma(x: f64) -> f64 {
    if x <= DEGAMMA_THRESHOLD {
        25.0 / 323.0 * x
    } else {
        ((200.0 * x + 11.0) / 211.0).powf(12.0 / 5.0)
    }
}

/// Applies [`gamma`] to an RGB triplet.
#[inline]
pub fn gamma_rgb(rgb: [f64; 3]) -> [f64; 3] {
    rgb.map(gamma)
}

/// Applies [`degamma`] to an RGB triplet.
#[inline]
pub fn degamma_rgb(rgb: [f64; 3]) -> [f64; 3] {
    rgb.map(degamma)
}

/// Maps 8-bit display channels to linear-light floats via `degamma(v / 255)`.
///
/// # Example
///
/// ```rust
/// use pigment_color::rgb_int_to_float;
///
/// assert_eq!(rgb_int_to_float([0, 0, 0]), [0.0, 0.0, 0.0]);
/// let white = rgb_int_to_float([255, 255, 255]);
/// assert!(white.iter().all(|&c| (c - 1.0).abs() < 1e-12));
/// ```
#[inline]
pub fn rgb_int_to_float(rgb: [u8; 3]) -> [f64; 3] {
    rgb.map(|v| degamma(f64::from(v) / 255.0))
}

/// Encodes linear-light floats back to 8-bit display channels.
///
/// Channels are clamped to [0, 1] before encoding and rounded to nearest.
#[inline]
pub fn rgb_float_to_int(rgb: [f64; 3]) -> [u8; 3] {
    rgb.map(|v| (gamma(v.clamp(0.0, 1.0)) * 255.0).round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_roundtrip() {
        for i in 0..=1000 {
            let x = i as f64 / 1000.0;
            let back = degamma(gamma(x));
            assert_abs_diff_eq!(x, back, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_roundtrip_across_threshold() {
        for &x in &[0.0031, 0.0031308, 0.0031309, 0.0032, 0.04045 * 25.0 / 323.0] {
            // The two segments meet only to ~1e-8, not exactly
            assert_abs_diff_eq!(degamma(gamma(x)), x, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(gamma(0.0), 0.0);
        assert_abs_diff_eq!(gamma(1.0), 1.0, epsilon = 1e-12);
        assert_eq!(degamma(0.0), 0.0);
        assert_abs_diff_eq!(degamma(1.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_nearly_continuous_at_threshold() {
        let below = gamma(GAMMA_THRESHOLD);
        let above = gamma(GAMMA_THRESHOLD + 1e-12);
        assert_abs_diff_eq!(below, above, epsilon = 1e-6);

        let below = degamma(DEGAMMA_THRESHOLD);
        let above = degamma(DEGAMMA_THRESHOLD + 1e-12);
        assert_abs_diff_eq!(below, above, epsilon = 1e-6);
    }

    #[test]
    fn test_byte_roundtrip() {
        for v in [0u8, 1, 10, 64, 128, 200, 254, 255] {
            let lin = rgb_int_to_float([v, v, v]);
            assert_eq!(rgb_float_to_int(lin), [v, v, v]);
        }
    }
}
