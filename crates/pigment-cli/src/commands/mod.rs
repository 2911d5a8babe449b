//! CLI command implementations

pub mod fit;
pub mod mix;
pub mod solve;

use anyhow::{Context, Result, bail};
use pigment_mixing::{Calibration, FitOptions, MixComponent, TwoFluxModel};
use pigment_recipe::ErrorSpace;
use tracing::info;

use crate::ModelArgs;
use crate::loader;

/// Fit options from the config file with command-line overrides applied.
pub fn fit_options(args: &ModelArgs, base: &FitOptions) -> FitOptions {
    let mut options = base.clone();
    if let Some(white) = &args.white {
        options.reference_white = white.clone();
    }
    if args.strict {
        options.strict = true;
    }
    options
}

/// Loads the calibration files and fits the model.
pub fn fit_model(args: &ModelArgs, options: &FitOptions) -> Result<(Calibration, TwoFluxModel)> {
    let calibration = loader::load_calibration(&args.files)?;
    info!(
        samples = calibration.len(),
        masstones = calibration.masstones().count(),
        "calibration loaded"
    );
    let model = TwoFluxModel::fit(&calibration, options).context("Failed to fit pigment model")?;
    Ok((calibration, model))
}

/// Parses `name=weight`.
pub fn parse_component(s: &str) -> Result<MixComponent> {
    let Some((name, weight)) = s.rsplit_once('=') else {
        bail!("expected name=weight, got '{}'", s);
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("missing paint name in '{}'", s);
    }
    let weight: f64 = weight
        .trim()
        .parse()
        .with_context(|| format!("invalid weight in '{}'", s))?;
    if !weight.is_finite() || weight < 0.0 {
        bail!("weight must be a non-negative number, got {}", weight);
    }
    Ok(MixComponent::new(name, weight))
}

/// Parses `RRGGBB` or `#RRGGBB`.
pub fn parse_hex_color(s: &str) -> Result<[u8; 3]> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        bail!("expected a color as RRGGBB, got '{}'", s);
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16).with_context(|| format!("invalid hex color '{}'", s))
    };
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

/// Parses an error space name.
pub fn parse_error_space(s: &str) -> Result<ErrorSpace> {
    match s.to_ascii_lowercase().as_str() {
        "linear-rgb" | "linear" => Ok(ErrorSpace::LinearRgb),
        "encoded-rgb" | "srgb" => Ok(ErrorSpace::EncodedRgb),
        "lab" => Ok(ErrorSpace::Lab),
        other => bail!("unknown error space '{}' (linear-rgb, encoded-rgb, lab)", other),
    }
}

/// `#rrggbb` for display.
pub fn hex(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}
