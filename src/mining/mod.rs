//! Elite pattern mining (MDM).
//!
//! Keeps a small set of the best distinct feasible solutions found across
//! restarts. After a drought of restarts that did not change this set, the
//! route adjacencies of its members are mined for frequent closed
//! itemsets, and each itemset is chained back into route fragments. The
//! savings construction then seeds new individuals with these fragments,
//! one pattern per individual, cycling through the pool.
//!
//! # Submodules
//!
//! - [`elite`]: the bounded elite set
//! - [`miner`]: the [`ItemsetMiner`] trait and [`ClosedItemsetMiner`]
//! - [`pattern`]: edge codes and fragment assembly
//!
//! # References
//!
//! - Maia, Plastino & Souza (2023), "MineReduce-based metaheuristic for the
//!   minimum latency problem" and the MDM-HGS variant for the CVRP
//! - Ribeiro, Plastino & Martins (2006), "Hybridization of GRASP metaheuristic
//!   with data mining techniques"

pub mod elite;
pub mod miner;
pub mod pattern;

pub use elite::EliteSet;
pub use miner::{ClosedItemsetMiner, ItemsetMiner};
pub use pattern::{assemble_fragments, edge_transaction, Pattern};

use crate::ga::HgsConfig;
use crate::individual::Individual;
use std::collections::BTreeSet;
use tracing::info;

/// Where the miner stands in its restart cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiningState {
    /// Collecting elite solutions; no pattern pool yet.
    Tracking,
    /// Mining conditions held at the last restart.
    Triggered,
    /// Patterns are available to the construction.
    PoolAvailable,
    /// Mining ran and produced no usable pattern.
    PoolExhausted,
}

/// Elite set, drought counter and pattern pool.
#[derive(Debug, Clone)]
pub struct EliteMiner<M: ItemsetMiner = ClosedItemsetMiner> {
    elite: EliteSet,
    miner: M,
    patterns: Vec<Pattern>,
    cursor: usize,
    /// Elite set changed since the last mining.
    updated: bool,
    restarts_without_update: usize,
    drought_threshold: usize,
    nb_patterns: usize,
    min_sup: f64,
    state: MiningState,
}

impl EliteMiner<ClosedItemsetMiner> {
    pub fn new(config: &HgsConfig) -> Self {
        Self::with_miner(config, ClosedItemsetMiner)
    }
}

impl<M: ItemsetMiner> EliteMiner<M> {
    /// Miner with a custom itemset mining backend.
    ///
    /// The drought threshold starts at 1 restart until the driver provides
    /// an estimate through [`EliteMiner::set_drought_threshold`].
    pub fn with_miner(config: &HgsConfig, miner: M) -> Self {
        Self {
            elite: EliteSet::new(config.mdm_nb_elite_or_default()),
            miner,
            patterns: Vec::new(),
            cursor: 0,
            updated: false,
            restarts_without_update: 0,
            drought_threshold: 1,
            nb_patterns: config.mdm_nb_patterns,
            min_sup: config.mdm_min_sup,
            state: MiningState::Tracking,
        }
    }

    pub fn elite(&self) -> &EliteSet {
        &self.elite
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn state(&self) -> MiningState {
        self.state
    }

    pub fn restarts_without_update(&self) -> usize {
        self.restarts_without_update
    }

    pub fn drought_threshold(&self) -> usize {
        self.drought_threshold
    }

    /// Number of non-updating restarts required before mining; at least 1.
    pub fn set_drought_threshold(&mut self, restarts: usize) {
        self.drought_threshold = restarts.max(1);
    }

    /// Offers a feasible solution to the elite set.
    ///
    /// Any change of the set resets the drought counter.
    pub fn update_elite(&mut self, individual: &Individual) -> bool {
        let changed = self.elite.insert(individual);
        if changed {
            self.restarts_without_update = 0;
            self.updated = true;
        }
        changed
    }

    /// Counts one more restart and moves to [`MiningState::Triggered`] when
    /// mining is due.
    pub fn register_restart(&mut self) {
        self.restarts_without_update += 1;
        if self.mining_due() {
            self.state = MiningState::Triggered;
        }
    }

    /// Changed elite of at least two members and a long enough drought.
    pub fn mining_due(&self) -> bool {
        self.updated
            && self.elite.len() > 1
            && self.restarts_without_update >= self.drought_threshold
    }

    /// Rebuilds the pattern pool when mining is due; returns whether it ran.
    ///
    /// The pool is replaced as a whole and the cursor goes back to its
    /// first pattern.
    pub fn mine_elite(&mut self, nb_clients: usize) -> bool {
        if !self.mining_due() {
            return false;
        }

        let nb_nodes = nb_clients + 1;
        let transactions: Vec<BTreeSet<usize>> = self
            .elite
            .members()
            .iter()
            .map(|m| edge_transaction(m, nb_nodes))
            .collect();
        let min_support = ((self.min_sup * self.elite.len() as f64) as usize).max(2);

        self.patterns = self
            .miner
            .mine(&transactions, min_support, self.nb_patterns)
            .iter()
            .map(|itemset| assemble_fragments(itemset, nb_nodes))
            .filter(|pattern| !pattern.is_empty())
            .collect();
        self.cursor = 0;
        self.updated = false;
        self.state = if self.patterns.is_empty() {
            MiningState::PoolExhausted
        } else {
            MiningState::PoolAvailable
        };

        info!(
            elite = self.elite.len(),
            min_support,
            patterns = self.patterns.len(),
            "mined elite set"
        );
        true
    }

    /// Next pattern of the pool, cycling; `None` when the pool is empty.
    pub fn next_pattern(&mut self) -> Option<&Pattern> {
        if self.patterns.is_empty() {
            return None;
        }
        let index = self.cursor;
        self.cursor = (self.cursor + 1) % self.patterns.len();
        self.patterns.get(index)
    }
}
