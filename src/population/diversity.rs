//! Broken-pairs distance between two solutions.

use crate::individual::Individual;
use std::cmp::Ordering;

/// Fraction of client adjacencies of `a` that do not exist in `b`.
///
/// For each client `j`, one mismatch is counted when `a`'s successor of `j`
/// is neither `b`'s successor nor `b`'s predecessor of `j`, and another when
/// `j` starts a route in `a` while sitting strictly inside a route in `b`.
fn one_way_distance(a: &Individual, b: &Individual, nb_clients: usize) -> f64 {
    let mut differences = 0usize;
    for j in 1..=nb_clients {
        if a.successors[j] != b.successors[j] && a.successors[j] != b.predecessors[j] {
            differences += 1;
        }
        if a.predecessors[j] == 0 && b.predecessors[j] != 0 && b.successors[j] != 0 {
            differences += 1;
        }
    }
    differences as f64 / nb_clients as f64
}

/// Symmetric broken-pairs distance between two evaluated individuals.
///
/// The one-way count depends on the number of routes of the first argument,
/// so both directions are averaged: `d(a, b) == d(b, a)` and `d(a, a) == 0`.
pub fn broken_pairs_distance(a: &Individual, b: &Individual, nb_clients: usize) -> f64 {
    if nb_clients == 0 {
        return 0.0;
    }
    (one_way_distance(a, b, nb_clients) + one_way_distance(b, a, nb_clients)) / 2.0
}

/// Totally ordered distance key for proximity maps.
#[derive(Debug, Clone, Copy)]
pub struct Proximity(pub f64);

impl PartialEq for Proximity {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Proximity {}

impl PartialOrd for Proximity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Proximity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}
