//! Mix command
//!
//! Predicts reflectance and color of a mixture of fitted paints.

use crate::MixArgs;
use crate::config::Config;
use anyhow::{Context, Result};
use pigment_color::{
    WhitePoint, reflectance_to_lab, reflectance_to_linear_rgb, reflectance_to_rgb,
    reflectance_to_xyz, rgb_float_to_int, xyz_to_xy,
};

pub fn run(args: MixArgs, config: Config, verbose: u8) -> Result<()> {
    let options = super::fit_options(&args.model, &config.fit);
    let (_, model) = super::fit_model(&args.model, &options)?;

    let reflectance = model.mix(&args.paints).context("Failed to mix paints")?;

    if verbose > 0 {
        let total: f64 = args.paints.iter().map(|c| c.weight).sum();
        for c in &args.paints {
            let share = if total > 0.0 { c.weight / total } else { 1.0 / args.paints.len() as f64 };
            println!("  {:<24} {:>6.1}%", c.pigment, share * 100.0);
        }
    }

    let xyz = reflectance_to_xyz(&reflectance);
    let xy = xyz_to_xy(xyz);
    let lab = reflectance_to_lab(&reflectance, WhitePoint::D65);
    let rgb = reflectance_to_rgb(&reflectance);
    let rgb8 = rgb_float_to_int(reflectance_to_linear_rgb(&reflectance));

    println!("XYZ  {:.4} {:.4} {:.4}  (x {:.4}, y {:.4})", xyz[0], xyz[1], xyz[2], xy[0], xy[1]);
    println!("Lab  {:.2} {:.2} {:.2}", lab[0], lab[1], lab[2]);
    println!("sRGB {:.4} {:.4} {:.4}  {}", rgb[0], rgb[1], rgb[2], super::hex(rgb8));

    if args.spectrum {
        println!();
        println!("{:>8} {:>10}", "nm", "R");
        for (w, r) in reflectance.iter() {
            println!("{:>8.1} {:>10.5}", w, r);
        }
    }

    Ok(())
}
