//! JSON calibration files.
//!
//! A file is an array of entries. One entry gives the shared wavelength grid,
//! the others are samples with reflectance in percent on that grid:
//!
//! ```json
//! [
//!   {"type": "wavelengths", "values": [400, 410, 420]},
//!   {"name": "white", "type": "masstone", "reflectance": [88.0, 90.1, 90.4]},
//!   {"name": "tint", "type": "mix", "components": {"white": 3, "blue": 1},
//!    "reflectance": [40.2, 45.3, 51.0]}
//! ]
//! ```
//!
//! Repeated measurements of one name are averaged. A file without a
//! wavelength entry contributes nothing. When several files are merged, a
//! later file replaces samples of the same name.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use pigment_mixing::{Calibration, MixComponent, PigmentSample, SampleKind};
use pigment_spectrum::Spectrum;
use serde::Deserialize;
use tracing::{debug, warn};

/// Percent to fraction.
const PERCENT: f64 = 0.01;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Entry {
    Wavelengths {
        values: Vec<f64>,
    },
    Masstone {
        name: String,
        reflectance: Vec<f64>,
    },
    Mix {
        name: String,
        components: BTreeMap<String, f64>,
        reflectance: Vec<f64>,
    },
}

/// Parses one calibration document into averaged samples, in first-seen order.
pub fn parse_samples(json: &str) -> Result<Vec<PigmentSample>> {
    let entries: Vec<Entry> = serde_json::from_str(json).context("malformed calibration JSON")?;

    let Some(grid) = entries.iter().find_map(|e| match e {
        Entry::Wavelengths { values } => Some(values.clone()),
        _ => None,
    }) else {
        warn!("calibration data has no wavelength entry; ignoring it");
        return Ok(Vec::new());
    };

    let mut order: Vec<String> = Vec::new();
    let mut groups: BTreeMap<String, (SampleKind, Vec<Spectrum>)> = BTreeMap::new();

    for entry in entries {
        let (name, kind, values) = match entry {
            Entry::Wavelengths { .. } => continue,
            Entry::Masstone { name, reflectance } => (name, SampleKind::Masstone, reflectance),
            Entry::Mix {
                name,
                components,
                reflectance,
            } => {
                let components = components
                    .into_iter()
                    .map(|(pigment, weight)| MixComponent::new(pigment, weight))
                    .collect();
                (name, SampleKind::Mix(components), reflectance)
            }
        };

        let spectrum = Spectrum::with_scale(grid.clone(), values, PERCENT)
            .with_context(|| format!("bad reflectance for '{}'", name))?;

        match groups.get_mut(&name) {
            Some((_, spectra)) => spectra.push(spectrum),
            None => {
                order.push(name.clone());
                groups.insert(name, (kind, vec![spectrum]));
            }
        }
    }

    let mut samples = Vec::with_capacity(order.len());
    for name in order {
        let Some((kind, spectra)) = groups.remove(&name) else {
            continue;
        };
        if spectra.len() > 1 {
            debug!(sample = %name, measurements = spectra.len(), "averaging repeated measurements");
        }
        samples.push(PigmentSample {
            reflectance: Spectrum::mean(&spectra),
            name,
            kind,
        });
    }
    Ok(samples)
}

/// Reads one calibration file.
pub fn load_file(path: &Path) -> Result<Vec<PigmentSample>> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read: {}", path.display()))?;
    parse_samples(&text).with_context(|| format!("Failed to parse: {}", path.display()))
}

/// Loads and merges calibration files into a validated [`Calibration`].
pub fn load_calibration(paths: &[PathBuf]) -> Result<Calibration> {
    if paths.is_empty() {
        bail!("no calibration files given");
    }

    let mut merged: Vec<PigmentSample> = Vec::new();
    for path in paths {
        let samples = load_file(path)?;
        debug!(file = %path.display(), samples = samples.len(), "loaded calibration file");
        for sample in samples {
            match merged.iter_mut().find(|s| s.name == sample.name) {
                Some(existing) => *existing = sample,
                None => merged.push(sample),
            }
        }
    }

    Calibration::new(merged).context("invalid calibration data")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::io::Write;

    const BASIC: &str = r#"[
        {"type": "wavelengths", "values": [400, 500, 600]},
        {"name": "white", "type": "masstone", "reflectance": [90, 90, 90]},
        {"name": "blue", "type": "masstone", "reflectance": [40, 20, 10]},
        {"name": "blue", "type": "masstone", "reflectance": [44, 22, 12]},
        {"name": "tint", "type": "mix", "components": {"white": 3, "blue": 1},
         "reflectance": [70, 60, 50], "note": "ignored"}
    ]"#;

    fn write_temp(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_percent_scaling_and_averaging() {
        let samples = parse_samples(BASIC).unwrap();
        let names: Vec<&str> = samples.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["white", "blue", "tint"]);

        assert_abs_diff_eq!(samples[0].reflectance.values()[0], 0.9, epsilon = 1e-12);
        let blue = samples[1].reflectance.values();
        assert_abs_diff_eq!(blue[0], 0.42, epsilon = 1e-12);
        assert_abs_diff_eq!(blue[2], 0.11, epsilon = 1e-12);
        assert_eq!(samples[1].reflectance.wavelengths(), &[400.0, 500.0, 600.0]);

        let tint = &samples[2];
        assert!(!tint.is_masstone());
        let weight = |p: &str| tint.components().iter().find(|c| c.pigment == p).map(|c| c.weight);
        assert_eq!(weight("white"), Some(3.0));
        assert_eq!(weight("blue"), Some(1.0));
    }

    #[test]
    fn test_missing_wavelengths_contributes_nothing() {
        let json = r#"[{"name": "white", "type": "masstone", "reflectance": [90]}]"#;
        assert!(parse_samples(json).unwrap().is_empty());
    }

    #[test]
    fn test_length_mismatch_is_error() {
        let json = r#"[
            {"type": "wavelengths", "values": [400, 500]},
            {"name": "white", "type": "masstone", "reflectance": [90]}
        ]"#;
        let err = parse_samples(json).unwrap_err();
        assert!(format!("{:#}", err).contains("white"));
    }

    #[test]
    fn test_malformed_json() {
        assert!(parse_samples("{not json").is_err());
        assert!(parse_samples(r#"[{"type": "glaze"}]"#).is_err());
    }

    #[test]
    fn test_load_and_merge_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_temp(&dir, "masstone.json", BASIC);
        let second = write_temp(
            &dir,
            "update.json",
            r#"[
                {"type": "wavelengths", "values": [400, 500, 600]},
                {"name": "white", "type": "masstone", "reflectance": [80, 80, 80]},
                {"name": "pale", "type": "mix", "components": {"tint": 1, "white": 1},
                 "reflectance": [75, 70, 65]}
            ]"#,
        );

        let cal = load_calibration(&[first, second]).unwrap();
        assert_eq!(cal.len(), 4);
        assert_eq!(cal.samples()[0].name, "white");
        assert_abs_diff_eq!(cal.get("white").unwrap().reflectance.values()[1], 0.8, epsilon = 1e-12);
        let pale = cal.flatten("pale").unwrap();
        let total: f64 = pale.iter().map(|c| c.weight).sum();
        assert_abs_diff_eq!(total, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_file_and_bad_graph() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_calibration(&[dir.path().join("absent.json")]).is_err());
        assert!(load_calibration(&[]).is_err());

        let orphan = write_temp(
            &dir,
            "orphan.json",
            r#"[
                {"type": "wavelengths", "values": [400, 500]},
                {"name": "tint", "type": "mix", "components": {"ochre": 1}, "reflectance": [50, 50]}
            ]"#,
        );
        let err = load_calibration(&[orphan]).unwrap_err();
        assert!(format!("{:#}", err).contains("ochre"));
    }
}
