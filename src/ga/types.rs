//! Extension points of the HGS engine.
//!
//! The engine drives two pluggable procedures: [`Split`], which turns a
//! giant tour into routes, and [`LocalSearch`], which improves an
//! individual in place. Reference implementations are provided by
//! [`LinearSplit`](super::LinearSplit) and
//! [`RelocateSearch`](super::RelocateSearch).

use crate::individual::Individual;
use crate::params::Params;

/// Decomposes a giant tour into routes.
///
/// # Implementing
///
/// ```ignore
/// struct OneRoute;
///
/// impl Split for OneRoute {
///     fn decompose(&mut self, individual: &mut Individual, params: &mut Params) {
///         individual.routes = vec![individual.giant_tour.clone()];
///         individual.routes.resize(params.nb_vehicles, Vec::new());
///         individual.evaluate(params);
///     }
/// }
/// ```
pub trait Split {
    /// Fills `individual.routes` from `individual.giant_tour` and evaluates.
    ///
    /// Must keep every client exactly once and produce `params.nb_vehicles`
    /// routes, some possibly empty.
    fn decompose(&mut self, individual: &mut Individual, params: &mut Params);
}

/// Improves an individual in place.
pub trait LocalSearch {
    /// Improves the routes of `individual` under the given penalty
    /// coefficients.
    ///
    /// Only `routes` must be left valid; the engine rebuilds the giant tour
    /// and re-evaluates with the current penalties afterwards.
    fn improve(
        &mut self,
        individual: &mut Individual,
        params: &mut Params,
        penalty_capacity: f64,
        penalty_duration: f64,
    );
}

/// Runs the local search with penalties scaled by `factor`, then refreshes
/// the individual under the current penalties.
pub(crate) fn educate<L: LocalSearch>(
    local_search: &mut L,
    individual: &mut Individual,
    params: &mut Params,
    factor: f64,
) {
    let (capacity, duration) = (params.penalty_capacity, params.penalty_duration);
    local_search.improve(individual, params, capacity * factor, duration * factor);
    individual.refresh(params);
}
