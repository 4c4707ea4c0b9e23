//! Biased fitness, survivor removal and parent selection.
//!
//! The biased fitness of a member blends its cost rank with its diversity
//! rank. With `n` members ranked by decreasing diversity contribution,
//! member `i` gets
//!
//! ```text
//! bf = fit_rank                                   if n <= nb_elite
//! bf = fit_rank + (1 - nb_elite / n) * div_rank   otherwise
//! ```
//!
//! where both ranks are normalized to `[0, 1]`. Lower is better.
//!
//! # References
//!
//! - Vidal et al. (2012), "A Hybrid Genetic Algorithm for Multidepot and
//!   Periodic Vehicle Routing Problems"
//! - Vidal (2022), "Hybrid genetic search for the CVRP: Open-source
//!   implementation and SWAP* neighborhood"

use super::subpopulation::{Member, SubPopulation};
use crate::error::{HgsError, HgsResult};
use crate::individual::Individual;
use crate::params::EPSILON;
use rand::Rng;

impl SubPopulation {
    /// Recomputes the biased fitness of every member.
    ///
    /// Diversity is the mean distance to the `nb_close` closest members.
    /// Ties in diversity keep the cost order.
    pub fn update_biased_fitnesses(&mut self, nb_elite: usize, nb_close: usize) {
        let n = self.len();
        if n == 0 {
            return;
        }
        if n == 1 {
            let id = self.order[0];
            self.arena[id].biased_fitness = 0.0;
            return;
        }

        let mut ranking: Vec<(f64, usize)> = self
            .order
            .iter()
            .enumerate()
            .map(|(position, &id)| (-self.average_closest_distance(id, nb_close), position))
            .collect();
        ranking.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let scale = (n - 1) as f64;
        let elite_share = 1.0 - nb_elite as f64 / n as f64;
        for (div_position, &(_, position)) in ranking.iter().enumerate() {
            let div_rank = div_position as f64 / scale;
            let fit_rank = position as f64 / scale;
            let id = self.order[position];
            self.arena[id].biased_fitness = if n <= nb_elite {
                fit_rank
            } else {
                fit_rank + elite_share * div_rank
            };
        }
    }

    /// Evicts the member with the worst biased fitness and returns it.
    ///
    /// The cheapest member is never evicted. Clones (distance to the closest
    /// member below [`EPSILON`]) are evicted before non-clones.
    ///
    /// # Errors
    ///
    /// [`HgsError::InvariantViolation`] when fewer than two members remain.
    pub fn remove_worst_biased_fitness(
        &mut self,
        nb_elite: usize,
        nb_close: usize,
    ) -> HgsResult<Individual> {
        if self.len() <= 1 {
            return Err(HgsError::InvariantViolation(format!(
                "cannot evict from a subpopulation of {} member(s)",
                self.len()
            )));
        }
        self.update_biased_fitnesses(nb_elite, nb_close);

        let mut worst = 1;
        let mut worst_is_clone = false;
        let mut worst_fitness = -1.0;
        for position in 1..self.len() {
            let id = self.order[position];
            let is_clone = self.average_closest_distance(id, 1) < EPSILON;
            let fitness = self.arena[id].biased_fitness;
            if (is_clone && !worst_is_clone)
                || (is_clone == worst_is_clone && fitness > worst_fitness)
            {
                worst = position;
                worst_is_clone = is_clone;
                worst_fitness = fitness;
            }
        }

        self.remove_at(worst).ok_or_else(|| {
            HgsError::InvariantViolation(format!("eviction rank {worst} out of range"))
        })
    }
}

/// Binary tournament over the union of both subpopulations.
///
/// Two members are drawn uniformly with replacement and the one with the
/// lower biased fitness wins; equal fitness returns the second draw.
/// Biased fitnesses must be up to date. Returns `None` when both
/// subpopulations are empty.
pub fn binary_tournament<'a, R: Rng>(
    feasible: &'a SubPopulation,
    infeasible: &'a SubPopulation,
    rng: &mut R,
) -> Option<&'a Individual> {
    let total = feasible.len() + infeasible.len();
    if total == 0 {
        return None;
    }
    let member_at = |place: usize| -> Option<&'a Member> {
        if place < feasible.len() {
            feasible.member_at(place)
        } else {
            infeasible.member_at(place - feasible.len())
        }
    };
    let first = member_at(rng.random_range(0..total))?;
    let second = member_at(rng.random_range(0..total))?;
    if first.biased_fitness < second.biased_fitness {
        Some(&first.individual)
    } else {
        Some(&second.individual)
    }
}
