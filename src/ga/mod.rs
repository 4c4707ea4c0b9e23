//! Hybrid Genetic Search driver.
//!
//! The search evolves a [`Population`](crate::population::Population) of
//! routing solutions: parents chosen by binary tournament are recombined
//! on their giant tours with [`ox_crossover`], the child is cut into routes
//! by a [`Split`] and improved by a [`LocalSearch`] before insertion.
//!
//! # Extension Traits
//!
//! - [`Split`]: giant tour to routes
//! - [`LocalSearch`]: in-place improvement under penalized costs
//!
//! # Key Types
//!
//! - [`HgsConfig`]: Algorithm parameters (population sizes, penalties, mining, presets)
//! - [`HgsRunner`]: Executes the search loop
//! - [`SearchResult`]: Best solution with run statistics
//!
//! # Submodules
//!
//! - [`operators`]: OX crossover on giant tours
//! - [`split`]: [`LinearSplit`], the shortest-path split
//! - [`local_search`]: [`RelocateSearch`], a relocate neighborhood
//!
//! # References
//!
//! - Vidal et al. (2012), "A Hybrid Genetic Algorithm for Multidepot and
//!   Periodic Vehicle Routing Problems"
//! - Vidal (2022), "Hybrid genetic search for the CVRP: Open-source
//!   implementation and SWAP* neighborhood"
//! - Prins (2004), "A simple and effective evolutionary algorithm for the
//!   vehicle routing problem"

mod config;
pub mod local_search;
pub mod operators;
mod runner;
pub mod split;
pub(crate) mod types;

pub use config::HgsConfig;
pub use local_search::RelocateSearch;
pub use operators::ox_crossover;
pub use runner::{HgsRunner, SearchResult};
pub use split::LinearSplit;
pub use types::{LocalSearch, Split};
