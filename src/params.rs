//! Problem context shared by every component of the search.
//!
//! [`Params`] bundles the instance data, the resolved configuration, the
//! adaptive penalty coefficients and the single seeded random source. It is
//! threaded by reference through construction, evaluation and population
//! management; the penalty coefficients are the only instance-level values
//! that change during a run.

use crate::error::{HgsError, HgsResult};
use crate::ga::HgsConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::{Duration, Instant};

/// Precision used for cost comparisons and feasibility tests.
pub const EPSILON: f64 = 0.00001;

/// Penalized cost of an individual that has not been evaluated yet.
pub const UNEVALUATED_COST: f64 = 1.0e30;

/// A location of the instance. Index 0 is the depot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Client {
    /// Position of the client in the instance.
    pub index: usize,
    /// Optional planar coordinates.
    pub coords: Option<(f64, f64)>,
    /// Quantity delivered to the client.
    pub demand: f64,
    /// Time spent at the client.
    pub service_duration: f64,
}

impl Client {
    /// Creates the depot (no demand, no service time).
    pub fn depot() -> Self {
        Self {
            index: 0,
            coords: None,
            demand: 0.0,
            service_duration: 0.0,
        }
    }

    /// Creates a client with a demand and no service time.
    pub fn new(index: usize, demand: f64) -> Self {
        Self {
            index,
            coords: None,
            demand,
            service_duration: 0.0,
        }
    }

    /// Sets the service duration.
    pub fn with_service_duration(mut self, duration: f64) -> Self {
        self.service_duration = duration;
        self
    }

    /// Sets the coordinates.
    pub fn with_coords(mut self, x: f64, y: f64) -> Self {
        self.coords = Some((x, y));
        self
    }
}

/// Distance saved by serving `c1` and `c2` consecutively instead of with two
/// separate depot round trips.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Savings {
    pub c1: usize,
    pub c2: usize,
    pub value: f64,
}

/// Raw instance data handed to [`Params::new`].
///
/// Loading and parsing instance files is left to the caller; the distance
/// matrix must be given explicitly.
#[derive(Debug, Clone)]
pub struct Instance {
    /// Depot followed by the clients, so that `clients[i].index == i`.
    pub clients: Vec<Client>,
    /// Square matrix of travel costs between every pair of locations.
    pub distances: Vec<Vec<f64>>,
    /// Vehicle capacity.
    pub vehicle_capacity: f64,
    /// Optional maximum route duration (travel plus service time).
    pub duration_limit: Option<f64>,
}

/// Problem context of one run.
#[derive(Debug, Clone)]
pub struct Params {
    /// Configuration with all instance-size dependent values resolved.
    pub config: HgsConfig,
    /// Number of clients, depot excluded.
    pub nb_clients: usize,
    /// Fleet size.
    pub nb_vehicles: usize,
    pub vehicle_capacity: f64,
    pub duration_limit: Option<f64>,
    pub total_demand: f64,
    pub max_demand: f64,
    pub max_dist: f64,
    pub clients: Vec<Client>,
    pub distances: Vec<Vec<f64>>,
    /// Client pairs sorted by decreasing savings value.
    pub savings: Vec<Savings>,
    /// Penalty for one unit of capacity excess (adapted during the search).
    pub penalty_capacity: f64,
    /// Penalty for one unit of duration excess (adapted during the search).
    pub penalty_duration: f64,
    /// Seeded random source shared by all randomized components.
    pub rng: StdRng,
    start: Instant,
}

impl Params {
    /// Builds the problem context from raw instance data.
    ///
    /// # Errors
    ///
    /// Returns [`HgsError::InvalidInstance`] when the matrix is not square or
    /// does not match the client list, when the capacity is not positive or
    /// when a demand is negative, and [`HgsError::InvalidConfig`] when the
    /// configuration does not validate.
    pub fn new(instance: Instance, config: HgsConfig) -> HgsResult<Self> {
        let Instance {
            clients,
            distances,
            vehicle_capacity,
            duration_limit,
        } = instance;

        if clients.len() < 2 {
            return Err(HgsError::InvalidInstance(
                "an instance needs a depot and at least one client".into(),
            ));
        }
        let nb_nodes = clients.len();
        if distances.len() != nb_nodes || distances.iter().any(|row| row.len() != nb_nodes) {
            return Err(HgsError::InvalidInstance(format!(
                "distance matrix must be {nb_nodes}x{nb_nodes}"
            )));
        }
        if vehicle_capacity <= 0.0 {
            return Err(HgsError::InvalidInstance(
                "vehicle capacity must be positive".into(),
            ));
        }
        if clients.iter().any(|c| c.demand < 0.0) {
            return Err(HgsError::InvalidInstance("demands must be non-negative".into()));
        }
        if matches!(duration_limit, Some(limit) if limit <= 0.0) {
            return Err(HgsError::InvalidInstance(
                "duration limit must be positive".into(),
            ));
        }

        let nb_clients = nb_nodes - 1;
        let config = config.resolved(nb_clients);
        config.validate()?;

        let total_demand: f64 = clients[1..].iter().map(|c| c.demand).sum();
        let max_demand = clients[1..].iter().map(|c| c.demand).fold(0.0, f64::max);
        let max_dist = distances
            .iter()
            .flat_map(|row| row.iter().copied())
            .fold(0.0, f64::max);

        let nb_vehicles = match config.nb_vehicles {
            Some(n) => n,
            None => (1.3 * total_demand / vehicle_capacity).ceil() as usize + 3,
        };

        let savings = compute_savings(&distances, nb_clients);
        let rng = StdRng::seed_from_u64(config.seed);

        let penalty_capacity = if max_demand > 0.0 {
            (max_dist / max_demand).clamp(0.1, 1000.0)
        } else {
            1000.0
        };

        Ok(Self {
            penalty_capacity,
            penalty_duration: 1.0,
            config,
            nb_clients,
            nb_vehicles,
            vehicle_capacity,
            duration_limit,
            total_demand,
            max_demand,
            max_dist,
            clients,
            distances,
            savings,
            rng,
            start: Instant::now(),
        })
    }

    /// Travel cost between two locations.
    #[inline]
    pub fn dist(&self, from: usize, to: usize) -> f64 {
        self.distances[from][to]
    }

    #[inline]
    pub fn demand(&self, client: usize) -> f64 {
        self.clients[client].demand
    }

    /// Time elapsed since the context was created (or the clock reset).
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Restarts the run clock.
    pub fn reset_clock(&mut self) {
        self.start = Instant::now();
    }

    /// Whether the configured time limit has been reached.
    pub fn time_exhausted(&self) -> bool {
        self.config
            .time_limit
            .is_some_and(|limit| self.elapsed() >= limit)
    }
}

/// Clarke & Wright savings for every client pair, sorted by decreasing value.
fn compute_savings(distances: &[Vec<f64>], nb_clients: usize) -> Vec<Savings> {
    let mut savings = Vec::with_capacity(nb_clients * nb_clients.saturating_sub(1) / 2);
    for c1 in 1..=nb_clients {
        for c2 in (c1 + 1)..=nb_clients {
            savings.push(Savings {
                c1,
                c2,
                value: distances[c1][0] + distances[0][c2] - distances[c1][c2],
            });
        }
    }
    savings.sort_by(|a, b| b.value.total_cmp(&a.value));
    savings
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Euclidean instance built from `(x, y, demand)` triples; the first
    /// triple is the depot.
    pub fn euclidean_instance(points: &[(f64, f64, f64)], capacity: f64) -> Instance {
        let clients = points
            .iter()
            .enumerate()
            .map(|(i, &(x, y, demand))| Client::new(i, demand).with_coords(x, y))
            .collect();
        let distances = points
            .iter()
            .map(|&(x1, y1, _)| {
                points
                    .iter()
                    .map(|&(x2, y2, _)| ((x1 - x2).powi(2) + (y1 - y2).powi(2)).sqrt())
                    .collect()
            })
            .collect();
        Instance {
            clients,
            distances,
            vehicle_capacity: capacity,
            duration_limit: None,
        }
    }

    /// Clients spread on a circle of radius 10 around the depot.
    pub fn ring_params(nb_clients: usize, demand: f64, capacity: f64, config: HgsConfig) -> Params {
        let mut points = vec![(0.0, 0.0, 0.0)];
        for i in 0..nb_clients {
            let angle = 2.0 * std::f64::consts::PI * i as f64 / nb_clients as f64;
            points.push((10.0 * angle.cos(), 10.0 * angle.sin(), demand));
        }
        Params::new(euclidean_instance(&points, capacity), config).expect("valid ring instance")
    }
}
