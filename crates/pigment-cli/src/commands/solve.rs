//! Solve command
//!
//! Searches paint subsets for the recipes closest to a target color,
//! printing each recipe size as soon as it is done.

use crate::SolveArgs;
use crate::config::Config;
use anyhow::{Context, Result};
use pigment_recipe::{RecipeSearch, TierResult};

pub fn run(args: SolveArgs, config: Config, verbose: u8) -> Result<()> {
    let options = super::fit_options(&args.model, &config.fit);
    let (_, model) = super::fit_model(&args.model, &options)?;

    let mut search_config = config.search;
    if let Some(k) = args.max_paints {
        search_config.max_pigments = k;
    }
    if let Some(n) = args.top {
        search_config.top_results = n;
    }
    if let Some(space) = args.error_space {
        search_config.error_space = space;
    }

    let candidates: Vec<String> = if args.paints.is_empty() {
        model.pigments().map(str::to_string).collect()
    } else {
        args.paints
    };

    let search = RecipeSearch::new(&model, args.target, candidates, search_config)
        .context("Failed to set up recipe search")?;

    println!(
        "Target {} with up to {} of: {}",
        super::hex(args.target),
        search.max_size(),
        search.candidates().join(", ")
    );

    search
        .run(|tier| print_tier(tier, verbose))
        .context("Recipe search failed")?;

    Ok(())
}

fn print_tier(tier: &TierResult, verbose: u8) {
    println!();
    println!(
        "{} paint{} ({} combinations{})",
        tier.size,
        if tier.size == 1 { "" } else { "s" },
        tier.evaluated,
        if tier.failed > 0 { format!(", {} failed", tier.failed) } else { String::new() }
    );
    for (rank, recipe) in tier.recipes.iter().enumerate() {
        let parts: Vec<String> = recipe
            .components
            .iter()
            .map(|c| format!("{} {:.1}%", c.pigment, c.weight * 100.0))
            .collect();
        println!(
            "  {}. {}  error {:.3e}  {}",
            rank + 1,
            super::hex(recipe.rgb8()),
            recipe.error,
            parts.join(" + ")
        );
        if verbose > 1 {
            println!("     weights {:?}, {} iterations", recipe.raw_weights, recipe.iterations);
        }
    }
}
