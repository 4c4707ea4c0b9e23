//! Giant-tour splitting.
//!
//! # Algorithm
//!
//! Node `i` of an auxiliary graph is the boundary after the `i`-th client of
//! the giant tour, and arc `(i, j)` serves clients `i+1..=j` in one route at
//! its penalized cost. The shortest path from `0` to `n` gives the best
//! decomposition that keeps the tour order.
//!
//! The unlimited-fleet pass only considers routes whose load, before the
//! last client is added, stays within 1.5 times the capacity. When it uses
//! more routes than there are vehicles, a fleet-limited pass with one
//! potential layer per vehicle replaces it.
//!
//! # Complexity
//!
//! O(n²) for the unlimited pass (much less with capacity pruning),
//! O(m·n²) for the fleet-limited pass with `m` vehicles.
//!
//! # Reference
//!
//! Prins, C. (2004). "A simple and effective evolutionary algorithm for the
//! vehicle routing problem", *Computers & Operations Research* 31(12), 1985-2002.
//! Vidal, T. (2016). "Split algorithm in O(n) for the capacitated vehicle
//! routing problem", *Computers & Operations Research* 69, 40-47.

use super::types::Split;
use crate::individual::Individual;
use crate::params::Params;
use std::ops::Range;

/// Load pruning factor of the unlimited-fleet pass.
const LOAD_PRUNING: f64 = 1.5;

/// Shortest-path split with penalized capacity and duration.
#[derive(Debug, Clone, Default)]
pub struct LinearSplit {
    potential: Vec<f64>,
    pred: Vec<usize>,
}

impl LinearSplit {
    pub fn new() -> Self {
        Self::default()
    }

    fn unlimited(&mut self, tour: &[usize], params: &Params) -> Vec<Range<usize>> {
        let n = tour.len();
        self.potential.clear();
        self.potential.resize(n + 1, f64::INFINITY);
        self.pred.clear();
        self.pred.resize(n + 1, 0);
        self.potential[0] = 0.0;

        let load_limit = LOAD_PRUNING * params.vehicle_capacity;
        for i in 0..n {
            if self.potential[i] == f64::INFINITY {
                continue;
            }
            let mut route = RouteScan::default();
            for j in i..n {
                if route.load > load_limit {
                    break;
                }
                route.push(tour, i, j, params);
                let cost = self.potential[i] + route.cost(tour[j], params);
                if cost < self.potential[j + 1] {
                    self.potential[j + 1] = cost;
                    self.pred[j + 1] = i;
                }
            }
        }

        let mut ranges = Vec::new();
        let mut j = n;
        while j > 0 {
            let i = self.pred[j];
            ranges.push(i..j);
            j = i;
        }
        ranges.reverse();
        ranges
    }

    fn limited(tour: &[usize], params: &Params) -> Vec<Range<usize>> {
        let n = tour.len();
        let max_routes = params.nb_vehicles;
        let mut potential = vec![vec![f64::INFINITY; n + 1]; max_routes + 1];
        let mut pred = vec![vec![0usize; n + 1]; max_routes + 1];
        potential[0][0] = 0.0;

        for k in 0..max_routes {
            for i in k..n {
                if potential[k][i] == f64::INFINITY {
                    continue;
                }
                let mut route = RouteScan::default();
                for j in i..n {
                    route.push(tour, i, j, params);
                    let cost = potential[k][i] + route.cost(tour[j], params);
                    if cost < potential[k + 1][j + 1] {
                        potential[k + 1][j + 1] = cost;
                        pred[k + 1][j + 1] = i;
                    }
                }
            }
        }

        let mut best_k = 1;
        for k in 2..=max_routes {
            if potential[k][n] < potential[best_k][n] {
                best_k = k;
            }
        }

        let mut ranges = Vec::with_capacity(best_k);
        let mut j = n;
        for k in (1..=best_k).rev() {
            let i = pred[k][j];
            ranges.push(i..j);
            j = i;
        }
        ranges.reverse();
        ranges
    }
}

impl Split for LinearSplit {
    fn decompose(&mut self, individual: &mut Individual, params: &mut Params) {
        let tour = &individual.giant_tour;
        let mut ranges = if tour.is_empty() {
            Vec::new()
        } else {
            self.unlimited(tour, params)
        };
        if ranges.len() > params.nb_vehicles {
            ranges = Self::limited(tour, params);
        }

        let mut routes: Vec<Vec<usize>> = ranges.into_iter().map(|r| tour[r].to_vec()).collect();
        routes.resize(params.nb_vehicles.max(routes.len()), Vec::new());
        individual.routes = routes;
        individual.evaluate(params);
    }
}

/// Running totals of the route `tour[i..=j]` while `j` grows.
#[derive(Debug, Clone, Copy, Default)]
struct RouteScan {
    load: f64,
    distance: f64,
    service: f64,
}

impl RouteScan {
    fn push(&mut self, tour: &[usize], i: usize, j: usize, params: &Params) {
        let client = tour[j];
        let from = if j == i { 0 } else { tour[j - 1] };
        self.load += params.clients[client].demand;
        self.service += params.clients[client].service_duration;
        self.distance += params.dist(from, client);
    }

    /// Penalized cost once the route returns to the depot from `last`.
    fn cost(&self, last: usize, params: &Params) -> f64 {
        let distance = self.distance + params.dist(last, 0);
        let capacity_excess = (self.load - params.vehicle_capacity).max(0.0);
        let duration_excess = params
            .duration_limit
            .map_or(0.0, |limit| (distance + self.service - limit).max(0.0));
        distance
            + params.penalty_capacity * capacity_excess
            + params.penalty_duration * duration_excess
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::HgsConfig;
    use crate::params::test_support::euclidean_instance;

    /// Depot at 0 and three clients of demand 10 at x = 1, 2, 3.
    fn line_params(capacity: f64, nb_vehicles: usize) -> Params {
        let instance = euclidean_instance(
            &[(0.0, 0.0, 0.0), (1.0, 0.0, 10.0), (2.0, 0.0, 10.0), (3.0, 0.0, 10.0)],
            capacity,
        );
        let mut params =
            Params::new(instance, HgsConfig::default().with_nb_vehicles(nb_vehicles)).unwrap();
        params.penalty_capacity = 1000.0;
        params
    }

    fn split(params: &mut Params, tour: Vec<usize>) -> Individual {
        let mut indiv = Individual::from_giant_tour(params, tour);
        LinearSplit::new().decompose(&mut indiv, params);
        indiv
    }

    #[test]
    fn test_single_route() {
        let mut params = line_params(30.0, 3);
        let indiv = split(&mut params, vec![1, 2, 3]);
        assert_eq!(indiv.routes, vec![vec![1, 2, 3], vec![], vec![]]);
        // 0->1->2->3->0 = 1+1+1+3
        assert!((indiv.eval.distance - 6.0).abs() < 1e-10);
        assert!(indiv.is_feasible());
    }

    #[test]
    fn test_forced_two_routes() {
        let mut params = line_params(20.0, 3);
        let indiv = split(&mut params, vec![1, 2, 3]);
        // [1] + [2, 3] = 2 + 6
        assert_eq!(indiv.routes[0], vec![1]);
        assert_eq!(indiv.routes[1], vec![2, 3]);
        assert!((indiv.eval.distance - 8.0).abs() < 1e-10);
    }

    #[test]
    fn test_cheap_penalty_allows_overload() {
        let mut params = line_params(20.0, 3);
        params.penalty_capacity = 0.01;
        let indiv = split(&mut params, vec![1, 2, 3]);
        assert_eq!(indiv.eval.nb_routes, 1);
        assert!(!indiv.is_feasible());
    }

    #[test]
    fn test_fleet_limit() {
        let mut params = line_params(10.0, 2);
        let indiv = split(&mut params, vec![1, 2, 3]);
        assert_eq!(indiv.routes.len(), 2);
        assert_eq!(indiv.routes, vec![vec![1], vec![2, 3]]);
        assert!((indiv.eval.capacity_excess - 10.0).abs() < 1e-10);
    }

    #[test]
    fn test_keeps_tour_order() {
        let mut params = line_params(20.0, 3);
        let indiv = split(&mut params, vec![3, 1, 2]);
        assert!(indiv.is_consistent(3));
        assert_eq!(indiv.giant_tour, vec![3, 1, 2]);
        let flattened: Vec<usize> = indiv.routes.iter().flatten().copied().collect();
        assert_eq!(flattened, vec![3, 1, 2]);
    }

    #[test]
    fn test_duration_penalty() {
        // two clients at distance 2 from the depot on perpendicular axes:
        // together 4 + 2*sqrt(2), separately 4 + 4
        let points = [(0.0, 0.0, 0.0), (2.0, 0.0, 1.0), (0.0, 2.0, 1.0)];
        let mut params =
            Params::new(euclidean_instance(&points, 100.0), HgsConfig::default().with_nb_vehicles(2))
                .unwrap();
        assert_eq!(split(&mut params, vec![1, 2]).eval.nb_routes, 1);

        let mut instance = euclidean_instance(&points, 100.0);
        instance.duration_limit = Some(5.0);
        let mut params =
            Params::new(instance, HgsConfig::default().with_nb_vehicles(2)).unwrap();
        params.penalty_duration = 1000.0;
        let indiv = split(&mut params, vec![1, 2]);
        assert_eq!(indiv.eval.nb_routes, 2);
        assert!(indiv.is_feasible());
    }
}
