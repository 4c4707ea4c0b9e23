//! Population management.
//!
//! The [`Population`] keeps feasible and infeasible individuals in two
//! separate [`SubPopulation`]s. Each grows to `mu + lambda` members and is
//! then cut back to `mu` by repeatedly evicting the member with the worst
//! biased fitness, which trades cost against contribution to diversity.
//!
//! It also adapts the capacity and duration penalties toward the target
//! share of feasible offspring, tracks the best solutions of the current
//! restart and of the whole run, and feeds feasible improvements to the
//! elite pattern miner.
//!
//! # Submodules
//!
//! - [`arena`]: stable member ids
//! - [`diversity`]: broken-pairs distance
//! - [`subpopulation`]: cost-ordered members with proximity structure
//! - [`selection`]: biased fitness, eviction and binary tournament
//!
//! # References
//!
//! - Vidal et al. (2012), "A Hybrid Genetic Algorithm for Multidepot and
//!   Periodic Vehicle Routing Problems"
//! - Vidal (2022), "Hybrid genetic search for the CVRP: Open-source
//!   implementation and SWAP* neighborhood"

pub mod arena;
pub mod diversity;
pub mod selection;
pub mod subpopulation;

pub use arena::MemberId;
pub use diversity::broken_pairs_distance;
pub use selection::binary_tournament;
pub use subpopulation::{Member, SubPopulation};

use crate::error::{HgsError, HgsResult};
use crate::ga::types::educate;
use crate::ga::{LocalSearch, Split};
use crate::individual::{Construction, Individual};
use crate::mining::{ClosedItemsetMiner, EliteMiner, ItemsetMiner};
use crate::params::{Params, EPSILON, UNEVALUATED_COST};
use rand::Rng;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, info};

/// Number of recent offspring in the feasibility history.
const FEASIBILITY_WINDOW: usize = 100;

/// Penalty coefficients never leave `[PENALTY_MIN, PENALTY_MAX]`.
const PENALTY_MIN: f64 = 0.1;
const PENALTY_MAX: f64 = 100_000.0;

/// Penalty scaling factor of the repair attempt.
pub(crate) const REPAIR_FACTOR: f64 = 10.0;

/// One improvement of the best solution of the run.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgressSample {
    /// Time since the search clock started.
    pub elapsed: Duration,
    /// Penalized cost of the new best solution.
    pub cost: f64,
}

/// Feasible and infeasible subpopulations with penalty control and
/// best-solution tracking.
#[derive(Debug)]
pub struct Population<M: ItemsetMiner = ClosedItemsetMiner> {
    feasible: SubPopulation,
    infeasible: SubPopulation,
    load_history: VecDeque<bool>,
    duration_history: VecDeque<bool>,
    best_restart: Option<Individual>,
    best_overall: Option<Individual>,
    progress: Vec<ProgressSample>,
    miner: EliteMiner<M>,
}

impl Population<ClosedItemsetMiner> {
    /// Empty population with the default itemset miner.
    pub fn new(params: &Params) -> Self {
        Self::with_miner(EliteMiner::new(&params.config))
    }
}

impl<M: ItemsetMiner> Population<M> {
    /// Empty population with a custom elite miner.
    pub fn with_miner(miner: EliteMiner<M>) -> Self {
        Self {
            feasible: SubPopulation::new(),
            infeasible: SubPopulation::new(),
            load_history: VecDeque::from(vec![true; FEASIBILITY_WINDOW]),
            duration_history: VecDeque::from(vec![true; FEASIBILITY_WINDOW]),
            best_restart: None,
            best_overall: None,
            progress: Vec::new(),
            miner,
        }
    }

    // ---- generation ----

    /// Fills the population with constructed and educated individuals.
    ///
    /// `mu * (1 - rand_generation)` individuals come from the randomized
    /// savings heuristic, each seeded with the next mined pattern when a
    /// pattern pool exists. The remaining `mu * rand_generation` are random
    /// giant tours cut by `split`. Every individual goes through the local
    /// search before insertion; an infeasible random individual gets a
    /// repair attempt with tenfold penalties half of the time.
    ///
    /// The time limit is checked before each individual except the first
    /// of each phase.
    pub fn generate<S: Split, L: LocalSearch>(
        &mut self,
        params: &mut Params,
        split: &mut S,
        local_search: &mut L,
    ) -> HgsResult<()> {
        let mu = params.config.mu as f64;
        let rand_generation = params.config.rand_generation_or_default();
        info!(
            mu = params.config.mu,
            rand_generation,
            patterns = self.miner.patterns().len(),
            "generating population"
        );

        let mut built = 0usize;
        while (built as f64) < mu * (1.0 - rand_generation)
            && (built == 0 || !params.time_exhausted())
        {
            let pattern = self.miner.next_pattern().cloned();
            let mut individual =
                Individual::construct(params, Construction::Savings, pattern.as_deref());
            educate(local_search, &mut individual, params, 1.0);
            self.add_individual(&individual, params, true)?;
            built += 1;
        }

        let mut drawn = 0usize;
        while (drawn as f64) < mu * rand_generation && (drawn == 0 || !params.time_exhausted()) {
            let mut individual = Individual::construct(params, Construction::Random, None);
            split.decompose(&mut individual, params);
            educate(local_search, &mut individual, params, 1.0);
            self.add_individual(&individual, params, true)?;
            if !individual.is_feasible() && params.rng.random_bool(0.5) {
                educate(local_search, &mut individual, params, REPAIR_FACTOR);
                if individual.is_feasible() {
                    self.add_individual(&individual, params, false)?;
                }
            }
            drawn += 1;
        }
        Ok(())
    }

    /// Discards both subpopulations and the best solution of the restart,
    /// mines the elite set when due, and generates a fresh population.
    ///
    /// The best solution of the run, the elite set and the search progress
    /// survive.
    pub fn restart<S: Split, L: LocalSearch>(
        &mut self,
        params: &mut Params,
        split: &mut S,
        local_search: &mut L,
    ) -> HgsResult<()> {
        self.miner.register_restart();
        info!(
            restarts_without_update = self.miner.restarts_without_update(),
            best = self.best_overall.as_ref().map(Individual::penalized_cost),
            "restarting population"
        );
        self.feasible.clear();
        self.infeasible.clear();
        self.best_restart = None;
        self.miner.mine_elite(params.nb_clients);
        self.generate(params, split, local_search)
    }

    // ---- insertion ----

    /// Inserts a copy of an evaluated individual.
    ///
    /// With `update_feasibility`, the load and duration feasibility of the
    /// individual enter the sliding histories used by
    /// [`manage_penalties`](Self::manage_penalties). Once its subpopulation
    /// exceeds `mu + lambda` members, survivors are selected down to `mu`.
    ///
    /// A feasible individual improving on the best of the restart is
    /// offered to the elite set. Returns whether it also improved the best
    /// solution of the run, in which case a progress sample is recorded.
    ///
    /// # Errors
    ///
    /// Propagates [`HgsError::InvariantViolation`] from survivor selection.
    pub fn add_individual(
        &mut self,
        individual: &Individual,
        params: &Params,
        update_feasibility: bool,
    ) -> HgsResult<bool> {
        if update_feasibility {
            self.record_feasibility(
                individual.eval.capacity_excess < EPSILON,
                individual.eval.duration_excess < EPSILON,
            );
        }

        let config = &params.config;
        let subpop = if individual.is_feasible() {
            &mut self.feasible
        } else {
            &mut self.infeasible
        };
        subpop.insert(individual.clone(), params.nb_clients);
        if subpop.len() > config.mu + config.lambda {
            while subpop.len() > config.mu {
                subpop.remove_worst_biased_fitness(config.nb_elite, config.nb_close)?;
            }
        }

        let cost = individual.penalized_cost();
        if !individual.is_feasible() || cost >= best_cost(self.best_restart.as_ref()) - EPSILON {
            return Ok(false);
        }
        self.miner.update_elite(individual);
        self.best_restart = Some(individual.clone());
        if cost < best_cost(self.best_overall.as_ref()) - EPSILON {
            self.best_overall = Some(individual.clone());
            self.progress.push(ProgressSample {
                elapsed: params.elapsed(),
                cost,
            });
            return Ok(true);
        }
        Ok(false)
    }

    /// Pushes one entry into each feasibility history, dropping the oldest.
    pub fn record_feasibility(&mut self, load_feasible: bool, duration_feasible: bool) {
        self.load_history.push_back(load_feasible);
        self.load_history.pop_front();
        self.duration_history.push_back(duration_feasible);
        self.duration_history.pop_front();
    }

    // ---- penalties ----

    /// Moves each penalty toward the target feasible share.
    ///
    /// Below `target - 0.05` the penalty grows by 20% (capped at 100000),
    /// above `target + 0.05` it shrinks by 15% (floored at 0.1). Infeasible
    /// members are then repriced and re-sorted.
    pub fn manage_penalties(&mut self, params: &mut Params) {
        let target = params.config.target_feasible;
        params.penalty_capacity =
            adapt_penalty(params.penalty_capacity, self.feasible_fraction_load(), target);
        params.penalty_duration =
            adapt_penalty(params.penalty_duration, self.feasible_fraction_duration(), target);
        self.infeasible.reprice(params.penalty_capacity, params.penalty_duration);
    }

    // ---- selection ----

    /// Refreshes the biased fitness of both subpopulations.
    pub fn update_biased_fitnesses(&mut self, params: &Params) {
        let (nb_elite, nb_close) = (params.config.nb_elite, params.config.nb_close);
        self.feasible.update_biased_fitnesses(nb_elite, nb_close);
        self.infeasible.update_biased_fitnesses(nb_elite, nb_close);
    }

    /// Parent chosen by binary tournament over both subpopulations.
    ///
    /// # Errors
    ///
    /// [`HgsError::InvariantViolation`] when the population is empty.
    pub fn binary_tournament(&mut self, params: &mut Params) -> HgsResult<&Individual> {
        self.update_biased_fitnesses(params);
        binary_tournament(&self.feasible, &self.infeasible, &mut params.rng).ok_or_else(|| {
            HgsError::InvariantViolation("binary tournament on an empty population".into())
        })
    }

    // ---- statistics ----

    pub fn feasible(&self) -> &SubPopulation {
        &self.feasible
    }

    pub fn infeasible(&self) -> &SubPopulation {
        &self.infeasible
    }

    pub fn len(&self) -> usize {
        self.feasible.len() + self.infeasible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn miner(&self) -> &EliteMiner<M> {
        &self.miner
    }

    pub fn miner_mut(&mut self) -> &mut EliteMiner<M> {
        &mut self.miner
    }

    /// Cheapest feasible member of the current population.
    pub fn best_feasible(&self) -> Option<&Individual> {
        self.feasible.best()
    }

    /// Cheapest infeasible member of the current population.
    pub fn best_infeasible(&self) -> Option<&Individual> {
        self.infeasible.best()
    }

    /// Best feasible solution since the last restart.
    pub fn best_of_restart(&self) -> Option<&Individual> {
        self.best_restart.as_ref()
    }

    /// Best feasible solution of the whole run.
    pub fn best_found(&self) -> Option<&Individual> {
        self.best_overall.as_ref()
    }

    /// One sample per improvement of [`best_found`](Self::best_found).
    pub fn progress(&self) -> &[ProgressSample] {
        &self.progress
    }

    /// Share of recent offspring within the vehicle capacity.
    pub fn feasible_fraction_load(&self) -> f64 {
        fraction(&self.load_history)
    }

    /// Share of recent offspring within the duration limit.
    pub fn feasible_fraction_duration(&self) -> f64 {
        fraction(&self.duration_history)
    }

    /// Emits the population state line at debug level.
    pub fn log_state(&self, params: &Params, iterations: usize, without_improvement: usize) {
        let mu = params.config.mu;
        debug!(
            iterations,
            without_improvement,
            elapsed = params.elapsed().as_secs_f64(),
            feasible = self.feasible.len(),
            feasible_best = self.best_feasible().map(Individual::penalized_cost),
            feasible_avg = self.feasible.average_cost(mu),
            infeasible = self.infeasible.len(),
            infeasible_best = self.best_infeasible().map(Individual::penalized_cost),
            infeasible_avg = self.infeasible.average_cost(mu),
            feasible_diversity = self.feasible.diversity(mu),
            infeasible_diversity = self.infeasible.diversity(mu),
            load_share = self.feasible_fraction_load(),
            duration_share = self.feasible_fraction_duration(),
            penalty_capacity = params.penalty_capacity,
            penalty_duration = params.penalty_duration,
            "population state"
        );
    }
}

fn best_cost(best: Option<&Individual>) -> f64 {
    best.map_or(UNEVALUATED_COST, Individual::penalized_cost)
}

fn fraction(history: &VecDeque<bool>) -> f64 {
    if history.is_empty() {
        return 1.0;
    }
    history.iter().filter(|&&ok| ok).count() as f64 / history.len() as f64
}

fn adapt_penalty(penalty: f64, fraction: f64, target: f64) -> f64 {
    if fraction < target - 0.05 && penalty < PENALTY_MAX {
        (penalty * 1.2).min(PENALTY_MAX)
    } else if fraction > target + 0.05 && penalty > PENALTY_MIN {
        (penalty * 0.85).max(PENALTY_MIN)
    } else {
        penalty
    }
}
