//! Hybrid Genetic Search for the Capacitated Vehicle Routing Problem.
//!
//! Provides a population engine in the HGS family, extended with elite
//! pattern mining:
//!
//! - **Solutions**: giant tour plus route decomposition with cached
//!   penalized evaluation ([`individual`]).
//! - **Construction**: randomized Clarke & Wright savings, optionally seeded
//!   with mined route fragments, or random giant tours.
//! - **Population**: feasible and infeasible subpopulations ranked by a
//!   biased fitness mixing cost and broken-pairs diversity, with adaptive
//!   capacity and duration penalties ([`population`]).
//! - **Pattern mining**: closed frequent edge sets of an elite set, rebuilt
//!   into route fragments after a drought of restarts ([`mining`]).
//! - **Search**: the HGS loop with OX crossover, a pluggable split and
//!   local search, and time-limited restarts ([`ga`]).
//! - **Files**: solution files and search-progress CSV ([`io`]).
//!
//! # Example
//!
//! ```
//! use u_hgs::ga::{HgsConfig, HgsRunner, LinearSplit, RelocateSearch};
//! use u_hgs::params::{Client, Instance, Params};
//!
//! // depot and four clients on the corners of a square
//! let points = [(0.0, 0.0), (1.0, 1.0), (1.0, -1.0), (-1.0, -1.0), (-1.0, 1.0)];
//! let clients = (0..points.len())
//!     .map(|i| if i == 0 { Client::depot() } else { Client::new(i, 1.0) })
//!     .collect();
//! let distances = points
//!     .iter()
//!     .map(|&(x1, y1): &(f64, f64)| {
//!         points.iter().map(|&(x2, y2)| ((x1 - x2).powi(2) + (y1 - y2).powi(2)).sqrt()).collect()
//!     })
//!     .collect();
//! let instance = Instance { clients, distances, vehicle_capacity: 2.0, duration_limit: None };
//!
//! let config = HgsConfig::default().with_population(4, 4).with_nb_iter(50).with_seed(1);
//! let mut params = Params::new(instance, config).unwrap();
//! let result = HgsRunner::run(&mut params, &mut LinearSplit::new(), &mut RelocateSearch::new())
//!     .unwrap();
//! assert!(result.best.is_some_and(|best| best.is_feasible()));
//! ```
//!
//! # Logging
//!
//! Phase changes are reported with `tracing` at `info` level and the
//! periodic population state at `debug` level. The crate installs no
//! subscriber.
//!
//! # Features
//!
//! - `serde`: `Serialize`/`Deserialize` for configuration and records
//! - `parallel`: rayon computation of broken-pairs distances on insertion

pub mod error;
pub mod ga;
pub mod individual;
pub mod io;
pub mod mining;
pub mod params;
pub mod population;

pub use error::{HgsError, HgsResult};
pub use individual::Individual;
pub use params::{Instance, Params};
pub use population::Population;
