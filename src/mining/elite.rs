//! Bounded set of the best distinct feasible solutions.

use crate::individual::Individual;
use std::cmp::Ordering;

/// Canonical routes of a member, see [`Individual::canonical_routes`].
type RouteKey = Vec<Vec<usize>>;

/// Capacity-bounded, cost-ordered set of distinct solutions.
///
/// Two solutions are the same member when their canonical routes are equal,
/// whatever the order and direction of their routes. Members of equal cost
/// are ordered by canonical routes.
#[derive(Debug, Clone)]
pub struct EliteSet {
    members: Vec<Individual>,
    keys: Vec<RouteKey>,
    capacity: usize,
}

impl EliteSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            members: Vec::with_capacity(capacity + 1),
            keys: Vec::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members from cheapest to most expensive.
    pub fn members(&self) -> &[Individual] {
        &self.members
    }

    /// Offers a solution to the set.
    ///
    /// Returns `true` when the content changed: the set grew, or the
    /// solution displaced the previous worst member.
    pub fn insert(&mut self, individual: &Individual) -> bool {
        let key = individual.canonical_routes();
        if self.keys.contains(&key) {
            return false;
        }
        let cost = individual.penalized_cost();
        let place = self
            .members
            .iter()
            .zip(&self.keys)
            .take_while(|(m, k)| {
                m.penalized_cost()
                    .total_cmp(&cost)
                    .then_with(|| k.cmp(&&key))
                    == Ordering::Less
            })
            .count();
        if place >= self.capacity {
            return false;
        }
        self.members.insert(place, individual.clone());
        self.keys.insert(place, key);
        if self.members.len() > self.capacity {
            self.members.pop();
            self.keys.pop();
        }
        true
    }

    pub fn clear(&mut self) {
        self.members.clear();
        self.keys.clear();
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

    fn with_cost(params: &Params, routes: Vec<Vec<usize>>, cost: f64) -> Individual {
        let mut indiv = Individual::from_routes(params, routes);
        indiv.eval.penalized_cost = cost;
        indiv
    }

    #[test]
    fn test_capacity_keeps_cheapest() {
        let params = params();
        let mut elite = EliteSet::new(2);
        assert!(elite.insert(&with_cost(&params, vec![vec![1, 2, 3, 4, 5, 6]], 10.0)));
        assert!(elite.insert(&with_cost(&params, vec![vec![1, 2, 3], vec![4, 5, 6]], 20.0)));
        assert!(!elite.insert(&with_cost(&params, vec![vec![1, 3, 5], vec![2, 4, 6]], 30.0)));

        let costs: Vec<f64> = elite.members().iter().map(|m| m.penalized_cost()).collect();
        assert_eq!(costs, vec![10.0, 20.0]);
    }

    #[test]
    fn test_better_solution_displaces_worst() {
        let params = params();
        let mut elite = EliteSet::new(2);
        elite.insert(&with_cost(&params, vec![vec![1, 2, 3, 4, 5, 6]], 10.0));
        elite.insert(&with_cost(&params, vec![vec![1, 2, 3], vec![4, 5, 6]], 20.0));
        assert!(elite.insert(&with_cost(&params, vec![vec![1, 3, 5], vec![2, 4, 6]], 5.0)));

        let costs: Vec<f64> = elite.members().iter().map(|m| m.penalized_cost()).collect();
        assert_eq!(costs, vec![5.0, 10.0]);
    }

    #[test]
    fn test_duplicates_are_rejected() {
        let params = params();
        let mut elite = EliteSet::new(3);
        assert!(elite.insert(&with_cost(&params, vec![vec![1, 2, 3, 4, 5, 6]], 10.0)));
        // empty routes do not make a solution distinct
        let padded = with_cost(&params, vec![vec![], vec![1, 2, 3, 4, 5, 6]], 10.0);
        assert!(!elite.insert(&padded));
        assert_eq!(elite.len(), 1);
    }

    #[test]
    fn test_reordered_and_reversed_routes_are_duplicates() {
        let params = params();
        let mut elite = EliteSet::new(3);
        let base = Individual::from_routes(&params, vec![vec![1, 2], vec![3, 4], vec![5, 6]]);
        let reordered = Individual::from_routes(&params, vec![vec![3, 4], vec![5, 6], vec![1, 2]]);
        let reversed = Individual::from_routes(&params, vec![vec![2, 1], vec![4, 3], vec![6, 5]]);
        assert!((base.penalized_cost() - reversed.penalized_cost()).abs() < 1e-9);

        assert!(elite.insert(&base));
        assert!(!elite.insert(&reordered));
        assert!(!elite.insert(&reversed));
        assert_eq!(elite.len(), 1);
    }

    #[test]
    fn test_equal_costs_ordered_by_routes() {
        let params = params();
        let mut elite = EliteSet::new(3);
        elite.insert(&with_cost(&params, vec![vec![2, 1, 3, 4, 5, 6]], 10.0));
        elite.insert(&with_cost(&params, vec![vec![1, 2, 3, 4, 5, 6]], 10.0));
        assert_eq!(elite.members()[0].routes[0], vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_zero_capacity() {
        let params = params();
        let mut elite = EliteSet::new(0);
        assert!(!elite.insert(&with_cost(&params, vec![vec![1, 2, 3, 4, 5, 6]], 1.0)));
        assert!(elite.is_empty());
    }
}
