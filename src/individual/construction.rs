//! Initial solution builders.
//!
//! - [`randomized_savings`]: Clarke & Wright savings where the merge order
//!   is sampled by tournaments over the savings list, optionally seeded with
//!   route fragments mined from elite solutions.
//! - [`random_permutation`]: shuffled giant tour, left for a split procedure.
//!
//! # References
//!
//! - Clarke & Wright (1964), "Scheduling of Vehicles from a Central Depot to
//!   a Number of Delivery Points"
//! - Vidal (2022), "Hybrid genetic search for the CVRP: Open-source
//!   implementation and SWAP* neighborhood"

use super::Individual;
use crate::params::{Params, Savings};
use rand::seq::SliceRandom;
use rand::Rng;

/// Largest tournament drawn from the savings list.
const MAX_TOURNAMENT: usize = 6;

/// How a new individual is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Construction {
    /// Randomized savings heuristic, fully evaluated.
    Savings,
    /// Random permutation, unevaluated until split.
    Random,
}

impl Individual {
    /// Builds a new individual with the requested heuristic.
    ///
    /// `pattern` is only used by [`Construction::Savings`].
    pub fn construct(
        params: &mut Params,
        mode: Construction,
        pattern: Option<&[Vec<usize>]>,
    ) -> Self {
        match mode {
            Construction::Savings => randomized_savings(params, pattern),
            Construction::Random => random_permutation(params),
        }
    }
}

/// Uniformly shuffled giant tour with empty routes and a sentinel cost.
pub fn random_permutation(params: &mut Params) -> Individual {
    let mut tour: Vec<usize> = (1..=params.nb_clients).collect();
    tour.shuffle(&mut params.rng);
    Individual::from_giant_tour(params, tour)
}

/// Route bookkeeping of the savings heuristic.
struct SavingsBuilder {
    routes: Vec<Vec<usize>>,
    load: Vec<f64>,
    in_route: Vec<bool>,
    interior: Vec<bool>,
}

impl SavingsBuilder {
    fn new(params: &Params) -> Self {
        Self {
            routes: vec![Vec::new(); params.nb_vehicles],
            load: vec![0.0; params.nb_vehicles],
            in_route: vec![false; params.nb_clients + 1],
            interior: vec![false; params.nb_clients + 1],
        }
    }

    /// Index of the first empty route, opening a new slot if all are used.
    fn empty_route(&mut self) -> usize {
        match self.routes.iter().position(Vec::is_empty) {
            Some(r) => r,
            None => {
                self.routes.push(Vec::new());
                self.load.push(0.0);
                self.routes.len() - 1
            }
        }
    }

    /// Seeds one route per fragment. Fragment ends stay open for merges,
    /// inner clients are locked.
    fn seed(&mut self, params: &Params, pattern: &[Vec<usize>]) {
        for fragment in pattern {
            let clients: Vec<usize> = fragment
                .iter()
                .copied()
                .filter(|&c| c >= 1 && c <= params.nb_clients && !self.in_route[c])
                .collect();
            if clients.is_empty() {
                continue;
            }
            let r = self.empty_route();
            for (pos, &c) in clients.iter().enumerate() {
                self.in_route[c] = true;
                self.interior[c] = pos > 0 && pos + 1 < clients.len();
                self.load[r] += params.demand(c);
            }
            self.routes[r] = clients;
        }
    }

    /// Applies the merge rules to one savings pair. Pairs that violate a
    /// rule are discarded silently.
    fn merge(&mut self, params: &Params, c1: usize, c2: usize) {
        let capacity = params.vehicle_capacity;
        if params.demand(c1) + params.demand(c2) > capacity {
            return;
        }

        let open1 = self.in_route[c1] && !self.interior[c1];
        let open2 = self.in_route[c2] && !self.interior[c2];

        if !self.in_route[c1] && !self.in_route[c2] {
            let r = self.empty_route();
            self.routes[r] = vec![c1, c2];
            self.load[r] = params.demand(c1) + params.demand(c2);
            self.in_route[c1] = true;
            self.in_route[c2] = true;
        } else if open1 && !self.in_route[c2] {
            self.extend(params, c1, c2);
        } else if open2 && !self.in_route[c1] {
            self.extend(params, c2, c1);
        } else if open1 && open2 {
            self.join(params, c1, c2);
        }
    }

    /// Attaches `client` next to the route end `anchor`.
    fn extend(&mut self, params: &Params, anchor: usize, client: usize) {
        let Some((r, at_front)) = self.find_end(anchor) else {
            return;
        };
        if self.load[r] + params.demand(client) > params.vehicle_capacity {
            return;
        }
        if at_front {
            self.routes[r].insert(0, client);
        } else {
            self.routes[r].push(client);
        }
        self.load[r] += params.demand(client);
        self.in_route[client] = true;
        if self.routes[r].len() > 2 {
            self.interior[anchor] = true;
        }
    }

    /// Concatenates the routes ending in `c1` and `c2` so that the two
    /// clients become adjacent.
    fn join(&mut self, params: &Params, c1: usize, c2: usize) {
        let (Some((r1, front1)), Some((r2, front2))) = (self.find_end(c1), self.find_end(c2))
        else {
            return;
        };
        if r1 == r2 || self.load[r1] + self.load[r2] > params.vehicle_capacity {
            return;
        }

        let (keep, drop) = match (front1, front2) {
            (true, true) => {
                // reversed r2 followed by r1
                let mut merged: Vec<usize> = self.routes[r2].iter().rev().copied().collect();
                merged.extend_from_slice(&self.routes[r1]);
                self.routes[r1] = merged;
                (r1, r2)
            }
            (true, false) => {
                let tail = std::mem::take(&mut self.routes[r1]);
                self.routes[r2].extend(tail);
                (r2, r1)
            }
            (false, true) => {
                let tail = std::mem::take(&mut self.routes[r2]);
                self.routes[r1].extend(tail);
                (r1, r2)
            }
            (false, false) => {
                let tail: Vec<usize> = self.routes[r2].iter().rev().copied().collect();
                self.routes[r1].extend(tail);
                (r1, r2)
            }
        };
        self.routes[drop].clear();
        self.load[keep] += self.load[drop];
        self.load[drop] = 0.0;
        self.interior[c1] = true;
        self.interior[c2] = true;
    }

    /// Route holding `client` at one of its ends, and whether it is the front.
    fn find_end(&self, client: usize) -> Option<(usize, bool)> {
        self.routes.iter().enumerate().find_map(|(r, route)| {
            if route.first() == Some(&client) {
                Some((r, true))
            } else if route.last() == Some(&client) {
                Some((r, false))
            } else {
                None
            }
        })
    }

    /// Moves non-empty routes to the front and trims back to the fleet size.
    /// Clients of routes beyond the fleet go back to the unassigned pool.
    fn compact(&mut self, nb_vehicles: usize) {
        let mut slots: Vec<(Vec<usize>, f64)> = std::mem::take(&mut self.routes)
            .into_iter()
            .zip(self.load.drain(..))
            .filter(|(route, _)| !route.is_empty())
            .collect();

        if slots.len() > nb_vehicles {
            for (route, _) in slots.drain(nb_vehicles..) {
                for c in route {
                    self.in_route[c] = false;
                    self.interior[c] = false;
                }
            }
        }
        slots.resize(nb_vehicles, (Vec::new(), 0.0));
        (self.routes, self.load) = slots.into_iter().unzip();
    }

    /// Appends every unassigned client to the route whose tail is closest,
    /// preferring routes with spare capacity.
    fn insert_unassigned(&mut self, params: &Params) {
        for client in 1..=params.nb_clients {
            if self.in_route[client] {
                continue;
            }
            let demand = params.demand(client);
            let tail = |route: &Vec<usize>| route.last().copied().unwrap_or(0);

            let mut best: Option<(usize, f64)> = None;
            for (r, route) in self.routes.iter().enumerate() {
                if self.load[r] + demand <= params.vehicle_capacity {
                    let cost = params.dist(tail(route), client);
                    if best.is_none_or(|(_, b)| cost < b) {
                        best = Some((r, cost));
                    }
                }
            }
            if best.is_none() {
                for (r, route) in self.routes.iter().enumerate() {
                    let excess = self.load[r] + demand - params.vehicle_capacity;
                    let cost = params.dist(tail(route), client) + excess * params.penalty_capacity;
                    if best.is_none_or(|(_, b)| cost < b) {
                        best = Some((r, cost));
                    }
                }
            }

            let r = best.map_or(0, |(r, _)| r);
            self.routes[r].push(client);
            self.load[r] += demand;
            self.in_route[client] = true;
        }
    }
}

/// Randomized Clarke & Wright savings construction.
///
/// Savings are consumed through tournaments of 2 to 6 entries drawn from the
/// head of the sorted list; one entry per tournament is sampled with
/// probability proportional to its value and then removed. A non-positive
/// value ends the draw. Leftover clients are appended greedily.
pub fn randomized_savings(params: &mut Params, pattern: Option<&[Vec<usize>]>) -> Individual {
    let mut builder = SavingsBuilder::new(params);
    if let Some(pattern) = pattern {
        builder.seed(params, pattern);
    }

    let nb_savings = params.savings.len();
    let mut tournament: Vec<Savings> = Vec::with_capacity(MAX_TOURNAMENT);
    let mut next = 0usize;

    while next < nb_savings || !tournament.is_empty() {
        let window = 2 + params.rng.random_range(0..5);
        let mut size = window.min(nb_savings - next + tournament.len());

        while tournament.len() < size {
            let s = params.savings[next];
            next += 1;
            if s.value > 0.0 {
                tournament.push(s);
            } else {
                size = tournament.len();
                next = nb_savings;
            }
        }
        // entries left over from a wider window stay queued
        let size = size.min(tournament.len());
        if size == 0 {
            break;
        }

        let candidates = &tournament[..size];
        let total: f64 = candidates.iter().map(|s| s.value).sum();
        let draw: f64 = params.rng.random_range(0.0..=1.0);
        let mut cumulative = 0.0;
        let mut picked = size - 1;
        for (i, s) in candidates.iter().enumerate() {
            cumulative += s.value / total;
            if draw <= cumulative {
                picked = i;
                break;
            }
        }

        let chosen = tournament.remove(picked);
        builder.merge(params, chosen.c1, chosen.c2);
    }

    builder.compact(params.nb_vehicles);
    builder.insert_unassigned(params);

    let mut individual = Individual {
        routes: builder.routes,
        ..Individual::new(params)
    };
    individual.refresh(params);
    individual
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::HgsConfig;
    use crate::params::test_support::{euclidean_instance, ring_params};

    // ---- savings heuristic ----

    #[test]
    fn test_single_route_when_capacity_allows() {
        let config = HgsConfig::default().with_nb_vehicles(3).with_seed(1);
        let mut params = ring_params(5, 1.0, 100.0, config);
        let indiv = randomized_savings(&mut params, None);

        assert!(indiv.is_consistent(5));
        assert!(indiv.is_feasible());
        assert_eq!(indiv.eval.nb_routes, 1);

        let route = indiv.non_empty_routes().next().unwrap();
        let mut expected = params.dist(0, route[0]) + params.dist(route[route.len() - 1], 0);
        for pair in route.windows(2) {
            expected += params.dist(pair[0], pair[1]);
        }
        assert!((indiv.eval.distance - expected).abs() < 1e-9);
    }

    #[test]
    fn test_partition_holds_under_tight_capacity() {
        for seed in 0..20 {
            let config = HgsConfig::default().with_seed(seed);
            let mut params = ring_params(30, 3.0, 10.0, config);
            let indiv = randomized_savings(&mut params, None);
            assert!(indiv.is_consistent(30), "seed {seed} broke the partition");
            assert!(indiv.routes.len() <= params.nb_vehicles);
            assert!(indiv.eval.is_evaluated());
        }
    }

    #[test]
    fn test_merge_respects_capacity() {
        let config = HgsConfig::default().with_seed(3);
        let mut params = ring_params(12, 4.0, 12.0, config);
        let indiv = randomized_savings(&mut params, None);
        // 12 clients * 4 = 48 demand, capacity 12: at least 4 routes
        assert!(indiv.eval.nb_routes >= 4);
        assert!(indiv.is_consistent(12));
    }

    #[test]
    fn test_same_seed_same_solution() {
        let build = || {
            let mut params = ring_params(25, 2.0, 15.0, HgsConfig::default().with_seed(11));
            randomized_savings(&mut params, None)
        };
        let a = build();
        let b = build();
        assert!(a.same_routes(&b));
        assert_eq!(a.penalized_cost(), b.penalized_cost());
    }

    #[test]
    fn test_pattern_fragments_are_kept() {
        let config = HgsConfig::default().with_seed(5);
        let mut params = ring_params(10, 1.0, 4.0, config);
        let pattern = vec![vec![1, 2, 3], vec![7, 8]];
        let indiv = randomized_savings(&mut params, Some(&pattern));

        assert!(indiv.is_consistent(10));
        // interior client 2 is locked between 1 and 3
        assert!(
            (indiv.predecessors[2] == 1 && indiv.successors[2] == 3)
                || (indiv.predecessors[2] == 3 && indiv.successors[2] == 1)
        );
        // 7 and 8 stay adjacent
        assert!(indiv.successors[7] == 8 || indiv.predecessors[7] == 8);
    }

    #[test]
    fn test_pattern_with_unknown_clients_is_filtered() {
        let config = HgsConfig::default().with_seed(5);
        let mut params = ring_params(6, 1.0, 10.0, config);
        let pattern = vec![vec![0, 2, 99], vec![2, 3]];
        let indiv = randomized_savings(&mut params, Some(&pattern));
        assert!(indiv.is_consistent(6));
    }

    #[test]
    fn test_overfull_fleet_reinserts_dropped_clients() {
        // a single vehicle cannot hold the seeded fragments; dropped routes
        // must not lose their clients
        let config = HgsConfig::default().with_seed(2).with_nb_vehicles(1);
        let mut params = ring_params(8, 1.0, 3.0, config);
        let pattern = vec![vec![1, 2], vec![4, 5], vec![7, 8]];
        let indiv = randomized_savings(&mut params, Some(&pattern));
        assert!(indiv.is_consistent(8));
        assert_eq!(indiv.routes.len(), 1);
        assert!(!indiv.is_feasible());
    }

    #[test]
    fn test_non_positive_savings_stop_merging() {
        // clients on opposite sides of the depot: every saving is zero
        let instance = euclidean_instance(
            &[(0.0, 0.0, 0.0), (5.0, 0.0, 1.0), (-5.0, 0.0, 1.0)],
            10.0,
        );
        let config = HgsConfig::default().with_nb_vehicles(2);
        let mut params = Params::new(instance, config).unwrap();
        let indiv = randomized_savings(&mut params, None);
        assert!(indiv.is_consistent(2));
        assert!((indiv.eval.distance - 20.0).abs() < 1e-9);
    }

    // ---- random permutation ----

    #[test]
    fn test_random_permutation() {
        let mut params = ring_params(15, 1.0, 10.0, HgsConfig::default().with_seed(4));
        let indiv = Individual::construct(&mut params, Construction::Random, None);

        let mut sorted = indiv.giant_tour.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (1..=15).collect::<Vec<_>>());
        assert!(!indiv.eval.is_evaluated());
        assert!(indiv.routes.iter().all(Vec::is_empty));
    }
}
