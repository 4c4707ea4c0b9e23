//! Instance builders shared by the integration tests.

#![allow(dead_code)]

use u_hgs::ga::HgsConfig;
use u_hgs::params::{Client, Instance, Params};

/// Euclidean instance from `(x, y, demand)` triples; the first is the depot.
pub fn euclidean(points: &[(f64, f64, f64)], capacity: f64) -> Instance {
    let clients = points
        .iter()
        .enumerate()
        .map(|(i, &(x, y, demand))| {
            let client = if i == 0 {
                Client::depot()
            } else {
                Client::new(i, demand)
            };
            client.with_coords(x, y)
        })
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

/// Clients on a grid of `side × side` points spaced 10 apart, depot in a
/// corner, demands cycling through 1..=4.
pub fn grid(side: usize, capacity: f64) -> Instance {
    let mut points = vec![(0.0, 0.0, 0.0)];
    for r in 0..side {
        for c in 0..side {
            let demand = 1.0 + ((r * side + c) % 4) as f64;
            points.push((10.0 * (c + 1) as f64, 10.0 * (r + 1) as f64, demand));
        }
    }
    euclidean(&points, capacity)
}

pub fn params(instance: Instance, config: HgsConfig) -> Params {
    Params::new(instance, config).expect("valid instance")
}
