//! Reference local search: client relocation.
//!
//! Every client in turn is tried at every position of every route, its own
//! included. The first move that lowers the penalized cost is applied, and
//! passes over the clients repeat until a full pass finds no improvement.
//! Client order is shuffled at each pass.
//!
//! Route totals are maintained incrementally, so a move is evaluated in
//! O(1); a pass costs O(n·(n + m)) for `n` clients and `m` routes.

use super::types::LocalSearch;
use crate::individual::Individual;
use crate::params::{Params, EPSILON};
use rand::seq::SliceRandom;

/// First-improvement relocate neighborhood under penalized costs.
#[derive(Debug, Clone, Default)]
pub struct RelocateSearch {
    moves: usize,
}

impl RelocateSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves applied since construction.
    pub fn moves(&self) -> usize {
        self.moves
    }
}

/// Totals of one route.
#[derive(Debug, Clone, Copy, Default)]
struct RouteLoad {
    distance: f64,
    load: f64,
    service: f64,
}

/// Penalty weights of one improvement call.
#[derive(Debug, Clone, Copy)]
struct Penalties {
    capacity: f64,
    duration: f64,
}

impl RouteLoad {
    fn of(route: &[usize], params: &Params) -> Self {
        let mut totals = Self::default();
        let mut prev = 0;
        for &client in route {
            totals.distance += params.dist(prev, client);
            totals.load += params.clients[client].demand;
            totals.service += params.clients[client].service_duration;
            prev = client;
        }
        totals.distance += params.dist(prev, 0);
        totals
    }

    fn cost(&self, params: &Params, penalties: Penalties) -> f64 {
        let capacity_excess = (self.load - params.vehicle_capacity).max(0.0);
        let duration_excess = params
            .duration_limit
            .map_or(0.0, |limit| (self.distance + self.service - limit).max(0.0));
        self.distance + penalties.capacity * capacity_excess + penalties.duration * duration_excess
    }

    /// Totals after inserting `client` between `prev` and `next`.
    fn with(&self, client: usize, prev: usize, next: usize, params: &Params) -> Self {
        Self {
            distance: self.distance + params.dist(prev, client) + params.dist(client, next)
                - params.dist(prev, next),
            load: self.load + params.clients[client].demand,
            service: self.service + params.clients[client].service_duration,
        }
    }

    /// Totals after removing `client` from between `prev` and `next`.
    fn without(&self, client: usize, prev: usize, next: usize, params: &Params) -> Self {
        Self {
            distance: self.distance - params.dist(prev, client) - params.dist(client, next)
                + params.dist(prev, next),
            load: self.load - params.clients[client].demand,
            service: self.service - params.clients[client].service_duration,
        }
    }
}

/// Neighbors of insertion position `p` of a route, the depot at both ends.
fn around(route: &[usize], p: usize) -> (usize, usize) {
    let prev = if p == 0 { 0 } else { route[p - 1] };
    let next = route.get(p).copied().unwrap_or(0);
    (prev, next)
}

fn locate(routes: &[Vec<usize>], client: usize) -> Option<(usize, usize)> {
    routes.iter().enumerate().find_map(|(r, route)| {
        route
            .iter()
            .position(|&c| c == client)
            .map(|pos| (r, pos))
    })
}

impl RelocateSearch {
    /// Applies the first improving relocation of `client`, if any.
    fn relocate(
        &mut self,
        client: usize,
        routes: &mut [Vec<usize>],
        totals: &mut [RouteLoad],
        params: &Params,
        penalties: Penalties,
    ) -> bool {
        let Some((r, pos)) = locate(routes, client) else {
            return false;
        };
        let (prev, next) = (around(&routes[r], pos).0, around(&routes[r], pos + 1).1);
        let origin_cost = totals[r].cost(params, penalties);
        let removed = totals[r].without(client, prev, next, params);
        let removal_gain = removed.cost(params, penalties) - origin_cost;

        // same route: positions of the route without the client
        let mut reduced = routes[r].clone();
        reduced.remove(pos);
        for p in 0..=reduced.len() {
            if p == pos {
                continue;
            }
            let (a, b) = around(&reduced, p);
            let moved = removed.with(client, a, b, params);
            if moved.cost(params, penalties) - origin_cost < -EPSILON {
                reduced.insert(p, client);
                routes[r] = reduced;
                totals[r] = moved;
                self.moves += 1;
                return true;
            }
        }

        let mut tried_empty = false;
        for t in 0..routes.len() {
            if t == r {
                continue;
            }
            if routes[t].is_empty() {
                if tried_empty {
                    continue;
                }
                tried_empty = true;
            }
            let target_cost = totals[t].cost(params, penalties);
            for p in 0..=routes[t].len() {
                let (a, b) = around(&routes[t], p);
                let inserted = totals[t].with(client, a, b, params);
                let delta = inserted.cost(params, penalties) - target_cost + removal_gain;
                if delta < -EPSILON {
                    routes[r].remove(pos);
                    routes[t].insert(p, client);
                    totals[r] = removed;
                    totals[t] = inserted;
                    self.moves += 1;
                    return true;
                }
            }
        }
        false
    }
}

impl LocalSearch for RelocateSearch {
    fn improve(
        &mut self,
        individual: &mut Individual,
        params: &mut Params,
        penalty_capacity: f64,
        penalty_duration: f64,
    ) {
        let penalties = Penalties {
            capacity: penalty_capacity,
            duration: penalty_duration,
        };
        let mut totals: Vec<RouteLoad> = individual
            .routes
            .iter()
            .map(|route| RouteLoad::of(route, params))
            .collect();
        let mut order: Vec<usize> = (1..=params.nb_clients).collect();

        loop {
            order.shuffle(&mut params.rng);
            let mut improved = false;
            for &client in &order {
                if self.relocate(client, &mut individual.routes, &mut totals, params, penalties) {
                    improved = true;
                }
            }
            if !improved {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::HgsConfig;
    use crate::params::test_support::{euclidean_instance, ring_params};

    fn improve(params: &mut Params, indiv: &mut Individual) {
        let (pc, pd) = (params.penalty_capacity, params.penalty_duration);
        RelocateSearch::new().improve(indiv, params, pc, pd);
        indiv.refresh(params);
    }

    #[test]
    fn test_fixes_route_order() {
        let instance = euclidean_instance(
            &[(0.0, 0.0, 0.0), (1.0, 0.0, 1.0), (2.0, 0.0, 1.0), (3.0, 0.0, 1.0)],
            10.0,
        );
        let mut params = Params::new(instance, HgsConfig::default().with_nb_vehicles(2)).unwrap();
        let mut indiv = Individual::from_routes(&params, vec![vec![3, 1, 2]]);
        assert!((indiv.eval.distance - 8.0).abs() < 1e-9);

        improve(&mut params, &mut indiv);
        assert!((indiv.eval.distance - 6.0).abs() < 1e-9);
        assert!(indiv.is_consistent(3));
    }

    #[test]
    fn test_merges_routes() {
        let mut params = ring_params(6, 1.0, 100.0, HgsConfig::default().with_nb_vehicles(6));
        let mut indiv = Individual::from_routes(
            &params,
            vec![vec![1], vec![2], vec![3], vec![4], vec![5], vec![6]],
        );
        let before = indiv.penalized_cost();
        improve(&mut params, &mut indiv);
        assert!(indiv.penalized_cost() < before);
        assert!(indiv.eval.nb_routes < 6);
        assert!(indiv.is_consistent(6));
    }

    #[test]
    fn test_capacity_penalty_splits_overload() {
        let mut params = ring_params(6, 1.0, 3.0, HgsConfig::default().with_nb_vehicles(3));
        params.penalty_capacity = 1000.0;
        let mut indiv = Individual::from_routes(&params, vec![vec![1, 2, 3, 4, 5, 6]]);
        assert!(!indiv.is_feasible());

        improve(&mut params, &mut indiv);
        assert!(indiv.is_feasible());
        assert!(indiv.is_consistent(6));
    }

    #[test]
    fn test_never_worsens() {
        let mut params = ring_params(12, 1.0, 4.0, HgsConfig::default().with_seed(3));
        for seed in 0..10u64 {
            let mut tour: Vec<usize> = (1..=12).collect();
            let mut rng = <rand::rngs::StdRng as rand::SeedableRng>::seed_from_u64(seed);
            tour.shuffle(&mut rng);
            let routes: Vec<Vec<usize>> = tour.chunks(3).map(|c| c.to_vec()).collect();
            let mut indiv = Individual::from_routes(&params, routes);
            let before = indiv.penalized_cost();
            improve(&mut params, &mut indiv);
            assert!(indiv.penalized_cost() <= before + 1e-9);
            assert!(indiv.is_consistent(12));
        }
    }
}
