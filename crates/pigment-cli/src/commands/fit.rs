//! Fit command
//!
//! Fits the pigment model and prints how well each calibration sample is
//! reproduced.

use crate::FitArgs;
use crate::config::Config;
use anyhow::Result;

pub fn run(args: FitArgs, config: Config, verbose: u8) -> Result<()> {
    let mut options = super::fit_options(&args.model, &config.fit);
    if let Some(tolerance) = args.tolerance {
        options.consistency_tolerance = tolerance;
    }

    let (calibration, model) = super::fit_model(&args.model, &options)?;
    let report = model.consistency();

    println!(
        "Fitted {} pigments from {} samples (reference white '{}')",
        model.len(),
        calibration.len(),
        model.reference_white()
    );
    if !model.unfitted().is_empty() {
        println!("Not fitted (no usable mix): {}", model.unfitted().join(", "));
    }
    println!();
    println!(
        "{:<24} {:>10} {:>10} {:>10} {:>8}  {}",
        "sample", "sum|d|", "rms", "max|d|", "dE76", "status"
    );
    for entry in &report.entries {
        println!(
            "{:<24} {:>10.5} {:>10.5} {:>10.5} {:>8.3}  {}",
            entry.sample,
            entry.sum_abs,
            entry.rms,
            entry.max_abs,
            entry.delta_e,
            if entry.passed { "ok" } else { "FAIL" }
        );
    }

    let failures = report.failures().count();
    println!();
    if failures == 0 {
        println!("All samples within tolerance {}", report.tolerance);
    } else {
        println!("{} of {} samples exceed tolerance {}", failures, report.entries.len(), report.tolerance);
    }

    if args.parameters || verbose > 0 {
        for pigment in model.pigments() {
            let Some(params) = model.parameters(pigment) else {
                continue;
            };
            println!();
            println!("{}:", pigment);
            if args.parameters {
                println!("  {:>8} {:>12} {:>12}", "nm", "K", "S");
                for w in params.grid() {
                    println!("  {:>8.1} {:>12.6} {:>12.6}", w, params.k.sample(w), params.s.sample(w));
                }
            } else if let Some((lo, hi)) = params.k.support() {
                println!("  {} wavelengths, {:.0}-{:.0} nm", params.k.len(), lo, hi);
            }
        }
    }

    Ok(())
}
