//! Subset sweep behavior on a small synthetic palette.

use std::sync::Arc;

use approx::assert_abs_diff_eq;
use pigment_mixing::{PigmentParameters, TwoFluxModel, km};
use pigment_recipe::{
    CancelToken, RecipeOptimizer, RecipeSearch, SearchConfig, SearchError, SearchEvent,
    spawn_search,
};
use pigment_spectrum::Spectrum;

fn grid() -> Vec<f64> {
    (0..=70).map(|i| 380.0 + 5.0 * i as f64).collect()
}

fn pigment(r: impl Fn(f64) -> f64, s: f64) -> PigmentParameters {
    let grid = grid();
    let s = Spectrum::constant(&grid, s).unwrap();
    let k = &Spectrum::from_fn(&grid, |w| km::k_over_s(r(w))).unwrap() * &s;
    PigmentParameters::new(k, s)
}

fn palette() -> TwoFluxModel {
    TwoFluxModel::from_parameters(
        "white",
        [
            ("white", pigment(|_| 1.0, 1.0)),
            ("black", pigment(|_| 0.02, 0.2)),
            ("blue", pigment(|w| 0.05 + 0.5 * (-((w - 450.0) / 40.0).powi(2)).exp(), 0.4)),
            ("yellow", pigment(|w| 0.05 + 0.8 / (1.0 + (-(w - 500.0) / 15.0).exp()), 0.6)),
        ],
    )
}

#[test]
fn white_target_is_matched_by_white_alone() {
    let model = palette();
    let optimizer = RecipeOptimizer::new(&model, [255, 255, 255], SearchConfig::default());
    let recipe = optimizer.optimize(&["white"]).unwrap();
    assert!(recipe.error < 1e-4, "error = {}", recipe.error);
    assert_abs_diff_eq!(recipe.components[0].weight, 1.0, epsilon = 1e-12);
}

#[test]
fn tiers_are_ranked_and_sized() {
    let model = palette();
    let config = SearchConfig {
        max_pigments: 3,
        top_results: 2,
        ..SearchConfig::default()
    };
    let search = RecipeSearch::new(&model, [90, 140, 60], ["white", "black", "blue", "yellow"], config).unwrap();

    let mut reported = Vec::new();
    let tiers = search.run(|tier| reported.push(tier.size)).unwrap();

    assert_eq!(reported, vec![1, 2, 3]);
    let evaluated: Vec<usize> = tiers.iter().map(|t| t.evaluated).collect();
    assert_eq!(evaluated, vec![4, 6, 4]);
    for tier in &tiers {
        assert!(tier.recipes.len() <= 2);
        assert!(tier.recipes.windows(2).all(|w| w[0].error <= w[1].error));
        for recipe in &tier.recipes {
            assert_eq!(recipe.components.len(), tier.size);
            let total: f64 = recipe.components.iter().map(|c| c.weight).sum();
            assert_abs_diff_eq!(total, 1.0, epsilon = 1e-12);
            assert!(recipe.raw_weights.iter().all(|&w| (0.001..=1.0).contains(&w)));
        }
    }
    // A green needs both blue and yellow.
    let best_pair = tiers[1].best().unwrap();
    let names: Vec<&str> = best_pair.pigments().collect();
    assert!(names.contains(&"blue") && names.contains(&"yellow"), "{:?}", names);
    assert!(tiers[1].best().unwrap().error < tiers[0].best().unwrap().error);
}

#[test]
fn sweep_is_deterministic() {
    let model = palette();
    let run = || {
        RecipeSearch::new(&model, [200, 120, 40], ["white", "black", "blue", "yellow"], SearchConfig::default())
            .unwrap()
            .run(|_| {})
            .unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn failing_subsets_are_excluded() {
    let grid = grid();
    let void = PigmentParameters::new(
        Spectrum::constant(&grid, 0.0).unwrap(),
        Spectrum::constant(&grid, 0.0).unwrap(),
    );
    let model = TwoFluxModel::from_parameters(
        "white",
        [("white", pigment(|_| 1.0, 1.0)), ("void", void)],
    );
    let search = RecipeSearch::new(&model, [255, 255, 255], ["void", "white"], SearchConfig::default()).unwrap();
    let tier = search.run_tier(1).unwrap();
    assert_eq!(tier.evaluated, 2);
    assert_eq!(tier.failed, 1);
    assert_eq!(tier.recipes.len(), 1);
    assert_eq!(tier.best().unwrap().components[0].pigment, "white");
}

#[test]
fn invalid_searches_are_rejected() {
    let model = palette();
    let none: [&str; 0] = [];
    assert_eq!(
        RecipeSearch::new(&model, [0, 0, 0], none, SearchConfig::default()).unwrap_err(),
        SearchError::EmptyPool
    );
    assert_eq!(
        RecipeSearch::new(&model, [0, 0, 0], ["white", "magenta"], SearchConfig::default()).unwrap_err(),
        SearchError::UnknownPigment("magenta".into())
    );
    let search = RecipeSearch::new(&model, [0, 0, 0], ["white", "white", "black"], SearchConfig::default()).unwrap();
    assert_eq!(search.candidates(), &["white".to_string(), "black".to_string()]);
    assert_eq!(search.max_size(), 2);
}

#[test]
fn cancelled_before_start() {
    let model = palette();
    let token = CancelToken::new();
    token.cancel();
    let search = RecipeSearch::new(&model, [10, 20, 30], ["white", "black"], SearchConfig::default())
        .unwrap()
        .with_cancel_token(token);
    let mut calls = 0;
    assert_eq!(search.run(|_| calls += 1), Err(SearchError::Cancelled));
    assert_eq!(calls, 0);
}

#[test]
fn cancelled_between_tiers_keeps_reported_tiers() {
    let model = palette();
    let search = RecipeSearch::new(&model, [10, 20, 30], ["white", "black", "blue"], SearchConfig::default()).unwrap();
    let token = search.cancel_token();
    let mut sizes = Vec::new();
    let result = search.run(|tier| {
        sizes.push(tier.size);
        token.cancel();
    });
    assert_eq!(result, Err(SearchError::Cancelled));
    assert_eq!(sizes, vec![1]);
}

#[test]
fn background_search_streams_tiers() {
    let model = Arc::new(palette());
    let config = SearchConfig {
        max_pigments: 2,
        ..SearchConfig::default()
    };
    let handle = spawn_search(
        model,
        [90, 140, 60],
        vec!["blue".into(), "yellow".into(), "white".into()],
        config,
    )
    .unwrap();

    let events: Vec<SearchEvent> = handle.events().iter().collect();
    handle.join().unwrap();

    assert_eq!(events.len(), 3);
    assert!(matches!(&events[0], SearchEvent::Tier(t) if t.size == 1));
    assert!(matches!(&events[1], SearchEvent::Tier(t) if t.size == 2));
    assert_eq!(events[2], SearchEvent::Finished);
}

#[test]
fn background_search_validates_up_front() {
    let model = Arc::new(palette());
    let err = spawn_search(model, [0, 0, 0], vec!["ochre".into()], SearchConfig::default()).unwrap_err();
    assert_eq!(err, SearchError::UnknownPigment("ochre".into()));
}
