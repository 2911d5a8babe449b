//! Subset sweep over a candidate pigment pool.
//!
//! For every subset size from 1 up to [`SearchConfig::max_pigments`], all
//! subsets of the pool are enumerated in lexicographic order, optimized
//! independently and ranked by error. Ties keep enumeration order, so the
//! ranking is deterministic regardless of thread count.
//!
//! Subsets of one size form a tier. Tiers run one after another and each is
//! reported as soon as it completes; within a tier subsets are evaluated in
//! parallel on the rayon pool.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use pigment_mixing::TwoFluxModel;
use tracing::{debug, info, warn};

use crate::config::SearchConfig;
use crate::error::{RecipeResult, SearchError};
use crate::optimizer::{Recipe, RecipeOptimizer};

/// Shared flag for cooperative cancellation.
///
/// Clones share the flag. The search checks it before every subset and
/// between tiers.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// True once [`cancel`](Self::cancel) was called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Best recipes of one subset size.
#[derive(Debug, Clone, PartialEq)]
pub struct TierResult {
    /// Number of pigments per subset.
    pub size: usize,
    /// Subsets optimized.
    pub evaluated: usize,
    /// Subsets excluded after an optimization error.
    pub failed: usize,
    /// Up to `top_results` recipes, best first.
    pub recipes: Vec<Recipe>,
}

impl TierResult {
    /// The best recipe of the tier.
    pub fn best(&self) -> Option<&Recipe> {
        self.recipes.first()
    }
}

/// All `k`-element index subsets of `0..n` in lexicographic order.
///
/// # Example
///
/// ```rust
/// use pigment_recipe::combinations;
///
/// assert_eq!(
///     combinations(4, 2),
///     vec![vec![0, 1], vec![0, 2], vec![0, 3], vec![1, 2], vec![1, 3], vec![2, 3]]
/// );
/// ```
pub fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    if k > n {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut current: Vec<usize> = (0..k).collect();
    loop {
        out.push(current.clone());
        // Rightmost index that can still move.
        let Some(i) = (0..k).rev().find(|&i| current[i] < n - k + i) else {
            return out;
        };
        current[i] += 1;
        for j in i + 1..k {
            current[j] = current[j - 1] + 1;
        }
    }
}

/// Tiered search for the best recipes from a candidate pool.
///
/// # Example
///
/// ```rust
/// use pigment_mixing::{PigmentParameters, TwoFluxModel};
/// use pigment_recipe::{RecipeSearch, SearchConfig};
/// use pigment_spectrum::Spectrum;
///
/// let grid: Vec<f64> = (0..=70).map(|i| 380.0 + 5.0 * i as f64).collect();
/// let flat = |v: f64| Spectrum::constant(&grid, v).unwrap();
/// let model = TwoFluxModel::from_parameters(
///     "white",
///     [
///         ("white", PigmentParameters::new(flat(0.0), flat(1.0))),
///         ("black", PigmentParameters::new(flat(10.0), flat(0.05))),
///     ],
/// );
///
/// let search = RecipeSearch::new(&model, [128, 128, 128], ["white", "black"], SearchConfig::default()).unwrap();
/// let tiers = search.run(|tier| println!("{} pigments: {:?}", tier.size, tier.best().map(|r| r.error))).unwrap();
/// assert_eq!(tiers.len(), 2);
/// assert_eq!(tiers[1].recipes.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct RecipeSearch<'m> {
    optimizer: RecipeOptimizer<'m>,
    candidates: Vec<String>,
    cancel: CancelToken,
}

impl<'m> RecipeSearch<'m> {
    /// Prepares a search; repeated candidate names are dropped.
    ///
    /// # Errors
    ///
    /// Invalid configuration, an empty pool or candidates the model lacks.
    pub fn new<S: Into<String>>(
        model: &'m TwoFluxModel,
        target: [u8; 3],
        candidates: impl IntoIterator<Item = S>,
        config: SearchConfig,
    ) -> Result<Self, SearchError> {
        config.validate()?;

        let mut pool: Vec<String> = Vec::new();
        for name in candidates {
            let name = name.into();
            if model.parameters(&name).is_none() {
                return Err(SearchError::UnknownPigment(name));
            }
            if !pool.contains(&name) {
                pool.push(name);
            }
        }
        if pool.is_empty() {
            return Err(SearchError::EmptyPool);
        }

        Ok(Self {
            optimizer: RecipeOptimizer::new(model, target, config),
            candidates: pool,
            cancel: CancelToken::new(),
        })
    }

    /// Uses an externally owned cancellation token.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels this search.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Candidate pool in enumeration order.
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Largest subset size this search will try.
    pub fn max_size(&self) -> usize {
        self.optimizer.config().max_pigments.min(self.candidates.len())
    }

    /// Runs every tier, calling `on_tier` as each one completes.
    ///
    /// # Errors
    ///
    /// [`SearchError::Cancelled`] if the token fires; tiers finished before
    /// that were already passed to `on_tier`.
    pub fn run(&self, mut on_tier: impl FnMut(&TierResult)) -> Result<Vec<TierResult>, SearchError> {
        info!(
            candidates = self.candidates.len(),
            max_size = self.max_size(),
            target = ?self.optimizer.target(),
            "starting recipe search"
        );
        let mut tiers = Vec::with_capacity(self.max_size());
        for size in 1..=self.max_size() {
            if self.cancel.is_cancelled() {
                return Err(SearchError::Cancelled);
            }
            let tier = self.run_tier(size)?;
            on_tier(&tier);
            tiers.push(tier);
        }
        Ok(tiers)
    }

    /// Optimizes and ranks every subset of one size.
    pub fn run_tier(&self, size: usize) -> Result<TierResult, SearchError> {
        let subsets = combinations(self.candidates.len(), size);

        #[cfg(feature = "parallel")]
        let outcomes: Vec<Option<RecipeResult<Recipe>>> =
            subsets.par_iter().map(|s| self.evaluate(s)).collect();
        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<Option<RecipeResult<Recipe>>> =
            subsets.iter().map(|s| self.evaluate(s)).collect();

        if self.cancel.is_cancelled() || outcomes.iter().any(Option::is_none) {
            return Err(SearchError::Cancelled);
        }

        let mut recipes = Vec::with_capacity(outcomes.len());
        let mut failed = 0;
        for (subset, outcome) in subsets.iter().zip(outcomes.into_iter().flatten()) {
            match outcome {
                Ok(recipe) => recipes.push(recipe),
                Err(err) => {
                    failed += 1;
                    warn!(subset = ?self.names(subset), error = %err, "subset excluded");
                }
            }
        }

        let evaluated = subsets.len();
        // Stable sort: equal errors keep enumeration order.
        recipes.sort_by(|a, b| a.error.total_cmp(&b.error));
        recipes.truncate(self.optimizer.config().top_results);

        debug!(
            size,
            evaluated,
            failed,
            best = recipes.first().map(|r| r.error),
            "tier complete"
        );
        Ok(TierResult {
            size,
            evaluated,
            failed,
            recipes,
        })
    }

    fn names(&self, subset: &[usize]) -> Vec<&str> {
        subset.iter().map(|&i| self.candidates[i].as_str()).collect()
    }

    /// `None` when cancelled before starting.
    fn evaluate(&self, subset: &[usize]) -> Option<RecipeResult<Recipe>> {
        if self.cancel.is_cancelled() {
            return None;
        }
        Some(self.optimizer.optimize(&self.names(subset)))
    }
}

/// Progress of a background search.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    /// A tier finished.
    Tier(TierResult),
    /// All tiers finished.
    Finished,
    /// The search stopped early.
    Failed(SearchError),
}

/// Handle to a search running on its own thread.
#[derive(Debug)]
pub struct SearchHandle {
    events: Receiver<SearchEvent>,
    cancel: CancelToken,
    thread: JoinHandle<()>,
}

impl SearchHandle {
    /// Event stream; closes after `Finished` or `Failed`.
    pub fn events(&self) -> &Receiver<SearchEvent> {
        &self.events
    }

    /// Requests cancellation; a `Failed(Cancelled)` event follows.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for the search thread to exit.
    pub fn join(self) -> thread::Result<()> {
        self.thread.join()
    }
}

/// Runs [`RecipeSearch::run`] on a background thread, streaming tiers.
///
/// The search is validated before the thread starts. Dropping the receiver
/// cancels the search at the next tier boundary.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use pigment_mixing::{PigmentParameters, TwoFluxModel};
/// use pigment_recipe::{SearchConfig, SearchEvent, spawn_search};
/// use pigment_spectrum::Spectrum;
///
/// let grid: Vec<f64> = (0..=70).map(|i| 380.0 + 5.0 * i as f64).collect();
/// let flat = |v: f64| Spectrum::constant(&grid, v).unwrap();
/// let model = Arc::new(TwoFluxModel::from_parameters(
///     "white",
///     [("white", PigmentParameters::new(flat(0.0), flat(1.0)))],
/// ));
///
/// let handle = spawn_search(model, [255, 255, 255], vec!["white".into()], SearchConfig::default()).unwrap();
/// let events: Vec<SearchEvent> = handle.events().iter().collect();
/// assert!(matches!(events.last(), Some(SearchEvent::Finished)));
/// handle.join().unwrap();
/// ```
pub fn spawn_search(
    model: Arc<TwoFluxModel>,
    target: [u8; 3],
    candidates: Vec<String>,
    config: SearchConfig,
) -> Result<SearchHandle, SearchError> {
    RecipeSearch::new(&model, target, candidates.iter().cloned(), config.clone())?;

    let (tx, rx) = mpsc::channel();
    let cancel = CancelToken::new();
    let token = cancel.clone();

    let thread = thread::spawn(move || {
        let search = match RecipeSearch::new(&model, target, candidates, config) {
            Ok(search) => search.with_cancel_token(token.clone()),
            Err(err) => {
                let _ = tx.send(SearchEvent::Failed(err));
                return;
            }
        };
        let result = search.run(|tier| {
            if tx.send(SearchEvent::Tier(tier.clone())).is_err() {
                // Nobody is listening any more.
                token.cancel();
            }
        });
        let last = match result {
            Ok(_) => SearchEvent::Finished,
            Err(err) => SearchEvent::Failed(err),
        };
        let _ = tx.send(last);
    });

    Ok(SearchHandle {
        events: rx,
        cancel,
        thread,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combinations_counts() {
        assert_eq!(combinations(5, 0), vec![Vec::<usize>::new()]);
        assert_eq!(combinations(5, 1).len(), 5);
        assert_eq!(combinations(5, 3).len(), 10);
        assert_eq!(combinations(5, 5), vec![vec![0, 1, 2, 3, 4]]);
        assert!(combinations(2, 3).is_empty());
    }

    #[test]
    fn test_combinations_are_sorted() {
        let all = combinations(6, 3);
        assert!(all.windows(2).all(|w| w[0] < w[1]));
        assert!(all.iter().all(|c| c.windows(2).all(|p| p[0] < p[1])));
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let a = CancelToken::new();
        let b = a.clone();
        assert!(!b.is_cancelled());
        a.cancel();
        assert!(b.is_cancelled());
    }
}
