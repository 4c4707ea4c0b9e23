//! One cost-ordered subpopulation with its proximity structure.

use super::arena::{Arena, MemberId};
use super::diversity::{broken_pairs_distance, Proximity};
use crate::individual::Individual;
use crate::params::EPSILON;
use std::collections::BTreeSet;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// An individual together with its population bookkeeping.
#[derive(Debug, Clone)]
pub struct Member {
    pub individual: Individual,
    /// Rank-based fitness; lower is better. Valid after
    /// [`SubPopulation::update_biased_fitnesses`].
    pub biased_fitness: f64,
    /// Every other member of the subpopulation keyed by distance, closest first.
    pub proximity: BTreeSet<(Proximity, MemberId)>,
}

impl Member {
    fn new(individual: Individual) -> Self {
        Self {
            individual,
            biased_fitness: 0.0,
            proximity: BTreeSet::new(),
        }
    }
}

/// Members sorted by non-decreasing penalized cost.
///
/// Every pair of members is linked through the proximity sets, and both
/// directions are added and removed together.
#[derive(Debug, Clone, Default)]
pub struct SubPopulation {
    pub(crate) arena: Arena<Member>,
    pub(crate) order: Vec<MemberId>,
}

impl SubPopulation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Member ids by increasing cost.
    pub fn ids(&self) -> &[MemberId] {
        &self.order
    }

    pub fn member(&self, id: MemberId) -> Option<&Member> {
        self.arena.get(id)
    }

    /// Member at a cost rank.
    pub fn member_at(&self, position: usize) -> Option<&Member> {
        self.order.get(position).map(|&id| &self.arena[id])
    }

    /// Members by increasing cost.
    pub fn iter(&self) -> impl Iterator<Item = &Member> {
        self.order.iter().map(|&id| &self.arena[id])
    }

    /// Cheapest member.
    pub fn best(&self) -> Option<&Individual> {
        self.member_at(0).map(|m| &m.individual)
    }

    /// Inserts an evaluated individual and links it to every other member.
    ///
    /// The new member goes after every member whose cost is not above its
    /// own by more than [`EPSILON`].
    pub fn insert(&mut self, individual: Individual, nb_clients: usize) -> MemberId {
        #[cfg(feature = "parallel")]
        let distances: Vec<(MemberId, f64)> = self
            .order
            .par_iter()
            .map(|&other| {
                let d = broken_pairs_distance(&individual, &self.arena[other].individual, nb_clients);
                (other, d)
            })
            .collect();

        #[cfg(not(feature = "parallel"))]
        let distances: Vec<(MemberId, f64)> = self
            .order
            .iter()
            .map(|&other| {
                let d = broken_pairs_distance(&individual, &self.arena[other].individual, nb_clients);
                (other, d)
            })
            .collect();

        let cost = individual.penalized_cost();
        let id = self.arena.insert(Member::new(individual));
        for (other, d) in distances {
            self.arena[other].proximity.insert((Proximity(d), id));
            self.arena[id].proximity.insert((Proximity(d), other));
        }

        let mut place = self.order.len();
        while place > 0 && self.cost_at(place - 1) > cost - EPSILON {
            place -= 1;
        }
        self.order.insert(place, id);
        id
    }

    /// Removes the member at a cost rank and unlinks it from the others.
    pub fn remove_at(&mut self, position: usize) -> Option<Individual> {
        if position >= self.order.len() {
            return None;
        }
        let id = self.order.remove(position);
        let member = self.arena.remove(id)?;
        for &(d, other) in &member.proximity {
            if let Some(other) = self.arena.get_mut(other) {
                other.proximity.remove(&(d, id));
            }
        }
        Some(member.individual)
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.order.clear();
    }

    /// Mean distance from a member to its `k` closest neighbors.
    ///
    /// Fewer than `k` neighbors are averaged as they are; zero neighbors
    /// give 0.
    pub fn average_closest_distance(&self, id: MemberId, k: usize) -> f64 {
        let Some(member) = self.arena.get(id) else {
            return 0.0;
        };
        let (sum, count) = member
            .proximity
            .iter()
            .take(k)
            .fold((0.0, 0usize), |(sum, count), (d, _)| (sum + d.0, count + 1));
        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }

    /// Recomputes penalized costs with new coefficients and restores the
    /// cost order.
    ///
    /// Stable insertion sort: two members swap only when the first is more
    /// expensive by more than [`EPSILON`].
    pub fn reprice(&mut self, penalty_capacity: f64, penalty_duration: f64) {
        for &id in &self.order {
            let eval = &mut self.arena[id].individual.eval;
            eval.penalized_cost = eval.penalized_with(penalty_capacity, penalty_duration);
        }
        for i in 1..self.order.len() {
            let mut j = i;
            while j > 0 && self.cost_at(j - 1) > self.cost_at(j) + EPSILON {
                self.order.swap(j - 1, j);
                j -= 1;
            }
        }
    }

    /// Mean broken-pairs distance among the `min(mu, len)` cheapest
    /// members, each measured against that many neighbors. -1 when empty.
    pub fn diversity(&self, mu: usize) -> f64 {
        let size = mu.min(self.len());
        if size == 0 {
            return -1.0;
        }
        let total: f64 = self.order[..size]
            .iter()
            .map(|&id| self.average_closest_distance(id, size))
            .sum();
        total / size as f64
    }

    /// Mean penalized cost of the `min(mu, len)` cheapest members. -1 when empty.
    pub fn average_cost(&self, mu: usize) -> f64 {
        let size = mu.min(self.len());
        if size == 0 {
            return -1.0;
        }
        let total: f64 = (0..size).map(|i| self.cost_at(i)).sum();
        total / size as f64
    }

    fn cost_at(&self, position: usize) -> f64 {
        self.arena[self.order[position]].individual.penalized_cost()
    }

    #[cfg(test)]
    pub(crate) fn is_sorted_by_cost(&self) -> bool {
        (1..self.len()).all(|i| self.cost_at(i - 1) <= self.cost_at(i) + EPSILON)
    }

    #[cfg(test)]
    pub(crate) fn proximity_is_consistent(&self) -> bool {
        self.order.iter().all(|&id| {
            let member = &self.arena[id];
            member.proximity.len() == self.len() - 1
                && member.proximity.iter().all(|&(d, other)| {
                    self.arena
                        .get(other)
                        .is_some_and(|o| o.proximity.contains(&(d, id)))
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::HgsConfig;
    use crate::params::test_support::ring_params;
    use crate::params::Params;

    fn params() -> Params {
        ring_params(6, 1.0, 100.0, HgsConfig::default().with_nb_vehicles(6))
    }

    fn individual(params: &Params, routes: Vec<Vec<usize>>) -> Individual {
        Individual::from_routes(params, routes)
    }

    #[test]
    fn test_insert_keeps_cost_order() {
        let params = params();
        let mut sub = SubPopulation::new();
        sub.insert(individual(&params, vec![vec![1, 4, 2, 5, 3, 6]]), 6);
        sub.insert(individual(&params, vec![vec![1, 2, 3, 4, 5, 6]]), 6);
        sub.insert(individual(&params, vec![vec![1, 2, 3], vec![4, 5, 6]]), 6);

        assert_eq!(sub.len(), 3);
        assert!(sub.is_sorted_by_cost());
        assert!(sub.proximity_is_consistent());
        assert_eq!(
            sub.best().map(|b| b.routes[0].clone()),
            Some(vec![1, 2, 3, 4, 5, 6])
        );
    }

    #[test]
    fn test_equal_costs_keep_arrival_order() {
        let params = params();
        let mut sub = SubPopulation::new();
        let a = sub.insert(individual(&params, vec![vec![1, 2, 3, 4, 5, 6]]), 6);
        let b = sub.insert(individual(&params, vec![vec![6, 5, 4, 3, 2, 1]]), 6);
        assert_eq!(sub.ids(), &[a, b]);
    }

    #[test]
    fn test_remove_unlinks_both_directions() {
        let params = params();
        let mut sub = SubPopulation::new();
        sub.insert(individual(&params, vec![vec![1, 2, 3, 4, 5, 6]]), 6);
        sub.insert(individual(&params, vec![vec![1, 3, 5], vec![2, 4, 6]]), 6);
        sub.insert(individual(&params, vec![vec![6, 1, 2], vec![3, 4, 5]]), 6);

        let removed = sub.remove_at(1);
        assert!(removed.is_some());
        assert_eq!(sub.len(), 2);
        assert!(sub.proximity_is_consistent());
        assert!(sub.remove_at(5).is_none());
    }

    #[test]
    fn test_average_closest_distance() {
        let params = params();
        let mut sub = SubPopulation::new();
        let a = sub.insert(individual(&params, vec![vec![1, 2, 3, 4, 5, 6]]), 6);
        assert_eq!(sub.average_closest_distance(a, 3), 0.0);

        sub.insert(individual(&params, vec![vec![1, 2, 3, 4, 5, 6]]), 6);
        assert_eq!(sub.average_closest_distance(a, 1), 0.0);
    }

    // ---- statistics ----

    #[test]
    fn test_empty_statistics() {
        let sub = SubPopulation::new();
        assert_eq!(sub.diversity(25), -1.0);
        assert_eq!(sub.average_cost(25), -1.0);
    }

    #[test]
    fn test_average_cost_over_best() {
        let params = params();
        let mut sub = SubPopulation::new();
        let good = individual(&params, vec![vec![1, 2, 3, 4, 5, 6]]);
        let bad = individual(&params, vec![vec![1, 4, 2, 5, 3, 6]]);
        let (c_good, c_bad) = (good.penalized_cost(), bad.penalized_cost());
        sub.insert(good, 6);
        sub.insert(bad, 6);

        assert!((sub.average_cost(1) - c_good).abs() < 1e-9);
        assert!((sub.average_cost(10) - (c_good + c_bad) / 2.0).abs() < 1e-9);
        assert!(sub.diversity(10) > 0.0);
    }

    #[test]
    fn test_reprice_reorders() {
        // capacity 3: the single route carries 3 units too many
        let params = ring_params(6, 1.0, 3.0, HgsConfig::default().with_nb_vehicles(6));
        let mut sub = SubPopulation::new();
        sub.insert(individual(&params, vec![vec![1, 2, 3, 4, 5, 6]]), 6);
        sub.insert(individual(&params, vec![vec![1, 2, 3], vec![4, 5, 6]]), 6);

        sub.reprice(0.1, 1.0);
        assert!(sub.is_sorted_by_cost());
        let cheap_first = sub.best().map(|b| b.eval.nb_routes);
        assert_eq!(cheap_first, Some(1));

        sub.reprice(1000.0, 1.0);
        assert!(sub.is_sorted_by_cost());
        assert_eq!(sub.best().map(|b| b.eval.nb_routes), Some(2));
    }
}
