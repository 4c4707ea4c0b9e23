//! HGS search loop execution.
//!
//! [`HgsRunner`] orchestrates the complete search:
//! population generation → tournament → crossover → split → local search →
//! insertion → penalty management → restart → repeat.

use super::operators::ox_crossover;
use super::types::{educate, LocalSearch, Split};
use crate::error::HgsResult;
use crate::individual::Individual;
use crate::mining::ItemsetMiner;
use crate::params::Params;
use crate::population::{Population, ProgressSample, REPAIR_FACTOR};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Iterations between two penalty adjustments.
const PENALTY_PERIOD: usize = 100;

/// Iterations between two population state lines.
const LOG_PERIOD: usize = 500;

/// Result of an HGS run.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Best feasible solution of the run, if any was found.
    pub best: Option<Individual>,

    /// Number of offspring generated.
    pub iterations: usize,

    /// Number of population restarts.
    pub restarts: usize,

    /// Wall-clock time of the run.
    pub elapsed: Duration,

    /// Whether the run was cancelled externally.
    pub cancelled: bool,

    /// One sample per improvement of the best solution.
    pub progress: Vec<ProgressSample>,
}

impl SearchResult {
    /// Penalized cost of the best solution, if any.
    pub fn best_cost(&self) -> Option<f64> {
        self.best.as_ref().map(Individual::penalized_cost)
    }
}

/// Executes the HGS loop.
///
/// # Usage
///
/// ```ignore
/// let mut params = Params::new(instance, HgsConfig::default().with_seed(42))?;
/// let result = HgsRunner::run(&mut params, &mut LinearSplit::new(), &mut RelocateSearch::new())?;
/// println!("Best cost: {:?}", result.best_cost());
/// ```
pub struct HgsRunner;

impl HgsRunner {
    /// Runs the search with the default elite miner.
    ///
    /// Without a time limit the run ends after `nb_iter` consecutive
    /// iterations without improvement. With a time limit it restarts the
    /// population instead and runs until the limit.
    ///
    /// # Errors
    ///
    /// Propagates [`HgsError::InvariantViolation`](crate::HgsError::InvariantViolation)
    /// from the population.
    pub fn run<S: Split, L: LocalSearch>(
        params: &mut Params,
        split: &mut S,
        local_search: &mut L,
    ) -> HgsResult<SearchResult> {
        Self::run_with_cancel(params, split, local_search, None)
    }

    /// Runs the search with an optional cancellation token.
    ///
    /// If `cancel` is `Some` and the flag is set to `true`, the search stops
    /// before the next iteration and returns the best solution so far.
    pub fn run_with_cancel<S: Split, L: LocalSearch>(
        params: &mut Params,
        split: &mut S,
        local_search: &mut L,
        cancel: Option<Arc<AtomicBool>>,
    ) -> HgsResult<SearchResult> {
        params.reset_clock();
        let mut population = Population::new(params);
        Self::evolve(&mut population, params, split, local_search, cancel)
    }

    /// Runs the search on a caller-provided population.
    ///
    /// The search clock is not reset, so the population may be built with a
    /// custom [`EliteMiner`](crate::mining::EliteMiner) beforehand.
    pub fn evolve<M: ItemsetMiner, S: Split, L: LocalSearch>(
        population: &mut Population<M>,
        params: &mut Params,
        split: &mut S,
        local_search: &mut L,
        cancel: Option<Arc<AtomicBool>>,
    ) -> HgsResult<SearchResult> {
        population.generate(params, split, local_search)?;
        info!(
            size = population.len(),
            best = population.best_found().map(Individual::penalized_cost),
            "population ready"
        );

        let nb_iter = params.config.nb_iter;
        let mut iterations = 0usize;
        let mut without_improvement = 1usize;
        let mut restarts = 0usize;
        let mut cancelled = false;

        while without_improvement <= nb_iter && !params.time_exhausted() {
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    cancelled = true;
                    break;
                }
            }
            iterations += 1;

            let parent1 = population.binary_tournament(params)?.giant_tour.clone();
            let parent2 = population.binary_tournament(params)?.giant_tour.clone();
            let tour = ox_crossover(&parent1, &parent2, &mut params.rng);

            let mut offspring = Individual::from_giant_tour(params, tour);
            split.decompose(&mut offspring, params);
            educate(local_search, &mut offspring, params, 1.0);
            let mut improved = population.add_individual(&offspring, params, true)?;

            if !offspring.is_feasible() && params.rng.random_bool(0.5) {
                educate(local_search, &mut offspring, params, REPAIR_FACTOR);
                if offspring.is_feasible() {
                    improved |= population.add_individual(&offspring, params, false)?;
                }
            }

            if improved {
                without_improvement = 1;
            } else {
                without_improvement += 1;
            }

            if iterations % PENALTY_PERIOD == 0 {
                population.manage_penalties(params);
            }
            if iterations % LOG_PERIOD == 0 {
                population.log_state(params, iterations, without_improvement);
            }

            if let Some(limit) = params.config.time_limit {
                if without_improvement == nb_iter {
                    restarts += 1;
                    let threshold = drought_threshold(
                        params.config.mdm_nu_restarts,
                        limit,
                        params.elapsed(),
                        restarts,
                    );
                    population.miner_mut().set_drought_threshold(threshold);
                    debug!(restarts, threshold, "drought threshold updated");
                    population.restart(params, split, local_search)?;
                    without_improvement = 1;
                }
            }
        }

        let result = SearchResult {
            best: population.best_found().cloned(),
            iterations,
            restarts,
            elapsed: params.elapsed(),
            cancelled,
            progress: population.progress().to_vec(),
        };
        info!(
            iterations,
            restarts,
            cancelled,
            elapsed = result.elapsed.as_secs_f64(),
            best = result.best_cost(),
            "search finished"
        );
        Ok(result)
    }
}

/// Number of non-updating restarts required before mining.
///
/// The total number of restarts of the run is estimated from the mean
/// period of the restarts so far; the threshold is `nu` times that
/// estimate, rounded up, and at least 1.
pub(crate) fn drought_threshold(
    nu: f64,
    time_limit: Duration,
    elapsed: Duration,
    restarts: usize,
) -> usize {
    if restarts == 0 || elapsed.is_zero() {
        return 1;
    }
    let period = elapsed.as_secs_f64() / restarts as f64;
    let estimated_restarts = time_limit.as_secs_f64() / period;
    ((nu * estimated_restarts).ceil() as usize).max(1)
}
