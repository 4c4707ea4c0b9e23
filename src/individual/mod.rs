//! Solution representation.
//!
//! An [`Individual`] carries two synchronized chromosomes: the giant tour
//! (a permutation of all clients) and its decomposition into routes. The
//! cached [`EvalIndiv`] and the predecessor/successor links are rebuilt by
//! [`Individual::evaluate`] after every structural change.
//!
//! # Submodules
//!
//! - [`construction`]: randomized savings and random-permutation builders

pub mod construction;

use crate::params::{Params, EPSILON, UNEVALUATED_COST};

pub use construction::Construction;

/// Cached evaluation of an individual.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvalIndiv {
    /// Distance plus weighted capacity and duration excesses.
    pub penalized_cost: f64,
    /// Number of non-empty routes.
    pub nb_routes: usize,
    /// Total travel distance.
    pub distance: f64,
    /// Sum over routes of the load above capacity.
    pub capacity_excess: f64,
    /// Sum over routes of the duration above the limit.
    pub duration_excess: f64,
    pub is_feasible: bool,
}

impl Default for EvalIndiv {
    fn default() -> Self {
        Self {
            penalized_cost: UNEVALUATED_COST,
            nb_routes: 0,
            distance: 0.0,
            capacity_excess: 0.0,
            duration_excess: 0.0,
            is_feasible: false,
        }
    }
}

impl EvalIndiv {
    /// Whether the individual has been evaluated at least once.
    pub fn is_evaluated(&self) -> bool {
        self.penalized_cost < UNEVALUATED_COST
    }

    /// Penalized cost for the given penalty coefficients.
    pub fn penalized_with(&self, penalty_capacity: f64, penalty_duration: f64) -> f64 {
        self.distance
            + penalty_capacity * self.capacity_excess
            + penalty_duration * self.duration_excess
    }
}

/// One candidate solution.
#[derive(Debug, Clone)]
pub struct Individual {
    /// All clients in visiting order, routes concatenated.
    pub giant_tour: Vec<usize>,
    /// Route decomposition; may contain empty routes.
    pub routes: Vec<Vec<usize>>,
    /// Next client on the route, 0 at the route end.
    pub successors: Vec<usize>,
    /// Previous client on the route, 0 at the route start.
    pub predecessors: Vec<usize>,
    pub eval: EvalIndiv,
}

impl Individual {
    /// Unevaluated individual visiting clients in index order, with empty routes.
    pub fn new(params: &Params) -> Self {
        Self {
            giant_tour: (1..=params.nb_clients).collect(),
            routes: vec![Vec::new(); params.nb_vehicles],
            successors: vec![0; params.nb_clients + 1],
            predecessors: vec![0; params.nb_clients + 1],
            eval: EvalIndiv::default(),
        }
    }

    /// Unevaluated individual with the given giant tour, awaiting a split.
    pub fn from_giant_tour(params: &Params, giant_tour: Vec<usize>) -> Self {
        Self {
            giant_tour,
            ..Self::new(params)
        }
    }

    /// Evaluated individual built from an explicit route decomposition.
    ///
    /// Routes are padded with empty routes up to the fleet size.
    pub fn from_routes(params: &Params, mut routes: Vec<Vec<usize>>) -> Self {
        if routes.len() < params.nb_vehicles {
            routes.resize(params.nb_vehicles, Vec::new());
        }
        let mut individual = Self {
            routes,
            ..Self::new(params)
        };
        individual.refresh(params);
        individual
    }

    /// Recomputes distance, loads, excesses, penalized cost and the
    /// predecessor/successor links from the current routes.
    pub fn evaluate(&mut self, params: &Params) {
        let mut eval = EvalIndiv {
            penalized_cost: 0.0,
            ..EvalIndiv::default()
        };

        for route in self.routes.iter().filter(|r| !r.is_empty()) {
            let first = route[0];
            let mut distance = params.dist(0, first);
            let mut load = params.clients[first].demand;
            let mut service = params.clients[first].service_duration;
            self.predecessors[first] = 0;

            for pair in route.windows(2) {
                let (prev, next) = (pair[0], pair[1]);
                distance += params.dist(prev, next);
                load += params.clients[next].demand;
                service += params.clients[next].service_duration;
                self.predecessors[next] = prev;
                self.successors[prev] = next;
            }

            let last = route[route.len() - 1];
            self.successors[last] = 0;
            distance += params.dist(last, 0);

            eval.distance += distance;
            eval.nb_routes += 1;
            if load > params.vehicle_capacity {
                eval.capacity_excess += load - params.vehicle_capacity;
            }
            if let Some(limit) = params.duration_limit {
                if distance + service > limit {
                    eval.duration_excess += distance + service - limit;
                }
            }
        }

        eval.penalized_cost = eval.penalized_with(params.penalty_capacity, params.penalty_duration);
        eval.is_feasible = eval.capacity_excess < EPSILON && eval.duration_excess < EPSILON;
        self.eval = eval;
    }

    /// Rebuilds the giant tour as the concatenation of the routes.
    pub fn sync_giant_tour(&mut self) {
        self.giant_tour.clear();
        self.giant_tour.extend(self.routes.iter().flatten().copied());
    }

    /// Rebuilds the giant tour, then evaluates.
    pub fn refresh(&mut self, params: &Params) {
        self.sync_giant_tour();
        self.evaluate(params);
    }

    #[inline]
    pub fn penalized_cost(&self) -> f64 {
        self.eval.penalized_cost
    }

    #[inline]
    pub fn is_feasible(&self) -> bool {
        self.eval.is_feasible
    }

    /// Non-empty routes in order.
    pub fn non_empty_routes(&self) -> impl Iterator<Item = &Vec<usize>> {
        self.routes.iter().filter(|r| !r.is_empty())
    }

    /// Structural equality of the route decompositions, ignoring empty routes.
    pub fn same_routes(&self, other: &Individual) -> bool {
        self.non_empty_routes().eq(other.non_empty_routes())
    }

    /// Non-empty routes in a form independent of route order and direction:
    /// each route starts at its smaller end, routes are sorted.
    pub fn canonical_routes(&self) -> Vec<Vec<usize>> {
        let mut routes: Vec<Vec<usize>> = self
            .non_empty_routes()
            .map(|route| {
                let mut route = route.clone();
                if route.last() < route.first() {
                    route.reverse();
                }
                route
            })
            .collect();
        routes.sort_unstable();
        routes
    }

    /// Checks that the routes visit every client in `1..=nb_clients` exactly
    /// once and that the giant tour is their concatenation.
    pub fn is_consistent(&self, nb_clients: usize) -> bool {
        let mut seen = vec![false; nb_clients + 1];
        for &client in self.routes.iter().flatten() {
            if client == 0 || client > nb_clients || seen[client] {
                return false;
            }
            seen[client] = true;
        }
        seen[1..].iter().all(|&s| s)
            && self.giant_tour.iter().eq(self.routes.iter().flatten())
    }
}
