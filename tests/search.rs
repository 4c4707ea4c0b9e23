//! End-to-end runs of the search on small synthetic instances.

mod common;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use u_hgs::ga::{HgsConfig, HgsRunner, LinearSplit, RelocateSearch};
use u_hgs::mining::{EliteMiner, MiningState};
use u_hgs::{Individual, Population};

fn route_length(params: &u_hgs::Params, route: &[usize]) -> f64 {
    let mut length = 0.0;
    let mut prev = 0;
    for &client in route {
        length += params.dist(prev, client);
        prev = client;
    }
    length + params.dist(prev, 0)
}

#[test]
fn test_five_clients_fit_one_route() {
    let points = [
        (0.0, 0.0, 0.0),
        (1.0, 0.0, 1.0),
        (2.0, 0.0, 1.0),
        (3.0, 0.0, 1.0),
        (4.0, 0.0, 1.0),
        (5.0, 0.0, 1.0),
    ];
    let config = HgsConfig::default()
        .with_population(4, 4)
        .with_nb_iter(100)
        .with_seed(3);
    let mut params = common::params(common::euclidean(&points, 100.0), config);
    let result =
        HgsRunner::run(&mut params, &mut LinearSplit::new(), &mut RelocateSearch::new()).unwrap();

    let best = result.best.expect("feasible solution");
    assert!(best.is_feasible());
    assert!(best.is_consistent(5));
    assert_eq!(best.eval.nb_routes, 1);

    let route = best.non_empty_routes().next().unwrap();
    assert!((best.eval.distance - route_length(&params, route)).abs() < 1e-9);
    // out and back along the line
    assert!((best.eval.distance - 10.0).abs() < 1e-9);
}

#[test]
fn test_grid_run_is_feasible_and_consistent() {
    let config = HgsConfig::default()
        .with_population(10, 15)
        .with_nb_iter(300)
        .with_seed(42);
    let mut params = common::params(common::grid(5, 12.0), config);
    let result =
        HgsRunner::run(&mut params, &mut LinearSplit::new(), &mut RelocateSearch::new()).unwrap();

    let best = result.best.expect("feasible solution");
    assert!(best.is_feasible());
    assert!(best.is_consistent(25));
    assert!(best.eval.nb_routes <= params.nb_vehicles);

    let total: f64 = best
        .non_empty_routes()
        .map(|route| route_length(&params, route))
        .sum();
    assert!((best.eval.distance - total).abs() < 1e-6);

    assert!(params.penalty_capacity >= 0.1 && params.penalty_capacity <= 100_000.0);
    assert!(result.progress.windows(2).all(|w| w[1].cost < w[0].cost));
}

#[test]
fn test_same_seed_same_result() {
    let run = || {
        let config = HgsConfig::default()
            .with_population(6, 6)
            .with_nb_iter(100)
            .with_seed(17);
        let mut params = common::params(common::grid(4, 10.0), config);
        HgsRunner::run(&mut params, &mut LinearSplit::new(), &mut RelocateSearch::new()).unwrap()
    };
    let a = run();
    let b = run();
    assert_eq!(a.iterations, b.iterations);
    assert_eq!(a.best_cost(), b.best_cost());
    let (a, b) = (a.best.unwrap(), b.best.unwrap());
    assert!(a.same_routes(&b));
}

#[test]
fn test_cancelled_run_keeps_initial_best() {
    let config = HgsConfig::default().with_population(5, 5).with_seed(8);
    let mut params = common::params(common::grid(3, 10.0), config);
    let cancel = Arc::new(AtomicBool::new(true));
    let result = HgsRunner::run_with_cancel(
        &mut params,
        &mut LinearSplit::new(),
        &mut RelocateSearch::new(),
        Some(cancel),
    )
    .unwrap();

    assert!(result.cancelled);
    assert_eq!(result.iterations, 0);
    assert!(result.best.as_ref().is_some_and(Individual::is_feasible));
}

#[test]
fn test_time_limited_run_with_elite_mining() {
    let config = HgsConfig::default()
        .with_population(5, 5)
        .with_nb_iter(20)
        .with_time_limit(Duration::from_millis(500))
        .with_mdm_nb_elite(4)
        .with_mdm_nu_restarts(0.0)
        .with_seed(5);
    let mut params = common::params(common::grid(4, 10.0), config);
    params.reset_clock();
    let mut population = Population::with_miner(EliteMiner::new(&params.config));
    let result = HgsRunner::evolve(
        &mut population,
        &mut params,
        &mut LinearSplit::new(),
        &mut RelocateSearch::new(),
        None,
    )
    .unwrap();

    assert!(result.restarts > 0);
    assert!(result.elapsed >= Duration::from_millis(500));

    let miner = population.miner();
    let elite = miner.elite();
    assert!(!elite.is_empty());
    assert!(elite.len() <= 4);
    assert!(elite
        .members()
        .iter()
        .all(|m| m.is_feasible() && m.is_consistent(16)));
    assert!(elite
        .members()
        .windows(2)
        .all(|w| w[0].penalized_cost() <= w[1].penalized_cost()));

    let best = result.best.expect("feasible solution");
    assert!(best.penalized_cost() <= elite.members()[0].penalized_cost() + 1e-9);

    if miner.state() == MiningState::PoolAvailable {
        for pattern in miner.patterns() {
            let mut seen: Vec<usize> = pattern.iter().flatten().copied().collect();
            let len = seen.len();
            seen.sort_unstable();
            seen.dedup();
            assert_eq!(seen.len(), len);
            assert!(seen.iter().all(|&c| (1..=16).contains(&c)));
            assert!(pattern.iter().all(|fragment| fragment.len() >= 2));
        }
    }
}
