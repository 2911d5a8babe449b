//! Reference values for the reflectance → display pipeline.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use pigment_color::{
    WhitePoint, degamma, gamma, reflectance_to_lab, reflectance_to_linear_rgb, reflectance_to_rgb,
    reflectance_to_xyz, rgb_float_to_int, rgb_int_to_float, rgb_to_xyz, standard_observer, tables,
    xyz_to_rgb,
};
use pigment_spectrum::Spectrum;

#[test]
fn perfect_reflector_is_display_white() {
    let white = Spectrum::constant(&tables::grid(), 1.0).unwrap();
    for c in reflectance_to_rgb(&white) {
        assert_abs_diff_eq!(c, 1.0, epsilon = 1e-3);
    }
    for c in reflectance_to_linear_rgb(&white) {
        assert_abs_diff_eq!(c, 1.0, epsilon = 1e-3);
    }
}

#[test]
fn gray_reflector_is_neutral() {
    let gray = Spectrum::constant(&tables::grid(), 0.9).unwrap();
    let rgb = reflectance_to_rgb(&gray);
    for c in rgb {
        assert_abs_diff_eq!(c, 0.9545, epsilon = 1e-3);
    }
    let lab = reflectance_to_lab(&gray, WhitePoint::D65);
    assert_abs_diff_eq!(lab[1], 0.0, epsilon = 0.1);
    assert_abs_diff_eq!(lab[2], 0.0, epsilon = 0.1);
}

#[test]
fn normalization_matches_tabulated_data() {
    assert_relative_eq!(standard_observer().normalization(), 10566.786, max_relative = 1e-6);
}

#[test]
fn transfer_roundtrip_over_unit_interval() {
    for i in 0..=1000 {
        let x = i as f64 / 1000.0;
        assert_abs_diff_eq!(degamma(gamma(x)), x, epsilon = 1e-8);
        assert_abs_diff_eq!(gamma(degamma(x)), x, epsilon = 1e-8);
    }
}

#[test]
fn matrices_invert_each_other() {
    let xyz = [0.3, 0.4, 0.5];
    let back = rgb_to_xyz(xyz_to_rgb(xyz));
    for (a, b) in back.iter().zip(xyz) {
        assert_abs_diff_eq!(*a, b, epsilon = 1e-3);
    }
}

#[test]
fn bytes_roundtrip_through_linear_light() {
    for v in [0u8, 1, 10, 11, 64, 128, 200, 254, 255] {
        let linear = rgb_int_to_float([v, v, v]);
        assert_eq!(rgb_float_to_int(linear), [v, v, v]);
    }
}

#[test]
fn spectrum_outside_visible_range_is_black() {
    let infrared = Spectrum::new(vec![750.0, 800.0], vec![1.0, 1.0]).unwrap();
    assert_eq!(reflectance_to_xyz(&infrared), [0.0, 0.0, 0.0]);
}
