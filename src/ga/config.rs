//! HGS configuration.
//!
//! [`HgsConfig`] holds every parameter of the genetic search and of the
//! elite pattern mining restarts.

use crate::error::{HgsError, HgsResult};
use std::time::Duration;

/// Configuration for the Hybrid Genetic Search.
///
/// Fields left as `None` are instance-size dependent and are filled in by
/// [`resolved`](HgsConfig::resolved) once the number of clients is known.
///
/// # Defaults
///
/// ```
/// use u_hgs::ga::HgsConfig;
///
/// let config = HgsConfig::default();
/// assert_eq!(config.mu, 25);
/// assert_eq!(config.lambda, 40);
/// assert_eq!(config.nb_iter, 20_000);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use std::time::Duration;
/// use u_hgs::ga::HgsConfig;
///
/// let config = HgsConfig::default()
///     .with_seed(7)
///     .with_time_limit(Duration::from_secs(30))
///     .with_population(25, 40)
///     .with_mdm_min_sup(0.5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HgsConfig {
    /// Granular search parameter, passed through to local search
    /// implementations that restrict their neighborhoods.
    pub nb_granular: usize,

    /// Minimum subpopulation size (μ).
    pub mu: usize,

    /// Generation size (λ): a subpopulation is culled back to `mu` once it
    /// exceeds `mu + lambda` members.
    pub lambda: usize,

    /// Number of elite individuals protected from diversity-driven eviction.
    pub nb_elite: usize,

    /// Number of closest individuals considered for the diversity contribution.
    pub nb_close: usize,

    /// Target fraction of feasible individuals, driving penalty adaptation.
    pub target_feasible: f64,

    /// Random seed.
    pub seed: u64,

    /// Consecutive iterations without improvement before termination
    /// (or before a restart when a time limit is set).
    pub nb_iter: usize,

    /// Optional wall-clock time limit.
    ///
    /// Checked between individuals during population generation and
    /// between iterations of the main loop.
    pub time_limit: Option<Duration>,

    /// Fraction of the initial population built as random permutations;
    /// the rest uses the randomized savings heuristic.
    ///
    /// `None` selects a value from the instance size.
    pub rand_generation: Option<f64>,

    /// Fleet size. `None` derives it from the total demand.
    pub nb_vehicles: Option<usize>,

    /// Maximum number of solutions in the mining elite set.
    ///
    /// `None` selects a value from the instance size.
    pub mdm_nb_elite: Option<usize>,

    /// Maximum number of patterns mined from the elite set.
    pub mdm_nb_patterns: usize,

    /// Fraction of the estimated total number of restarts without elite
    /// update that triggers mining.
    pub mdm_nu_restarts: f64,

    /// Minimum support (as a fraction of the elite set size) of mined patterns.
    pub mdm_min_sup: f64,
}

impl Default for HgsConfig {
    fn default() -> Self {
        Self {
            nb_granular: 20,
            mu: 25,
            lambda: 40,
            nb_elite: 4,
            nb_close: 5,
            target_feasible: 0.2,
            seed: 0,
            nb_iter: 20_000,
            time_limit: None,
            rand_generation: None,
            nb_vehicles: None,
            mdm_nb_elite: None,
            mdm_nb_patterns: 5,
            mdm_nu_restarts: 0.05,
            mdm_min_sup: 0.8,
        }
    }
}

impl HgsConfig {
    /// Sets `mu` and `lambda`.
    pub fn with_population(mut self, mu: usize, lambda: usize) -> Self {
        self.mu = mu;
        self.lambda = lambda;
        self
    }

    /// Sets the number of protected elites.
    pub fn with_nb_elite(mut self, n: usize) -> Self {
        self.nb_elite = n;
        self
    }

    /// Sets the number of closest individuals used for diversity.
    pub fn with_nb_close(mut self, n: usize) -> Self {
        self.nb_close = n;
        self
    }

    /// Sets the granular search parameter.
    pub fn with_nb_granular(mut self, n: usize) -> Self {
        self.nb_granular = n;
        self
    }

    /// Sets the target feasible fraction.
    pub fn with_target_feasible(mut self, target: f64) -> Self {
        self.target_feasible = target.clamp(0.0, 1.0);
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the number of non-improving iterations before stopping/restarting.
    pub fn with_nb_iter(mut self, n: usize) -> Self {
        self.nb_iter = n;
        self
    }

    /// Sets the wall-clock time limit.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Sets the fraction of randomly generated initial individuals.
    pub fn with_rand_generation(mut self, fraction: f64) -> Self {
        self.rand_generation = Some(fraction.clamp(0.0, 1.0));
        self
    }

    /// Sets the fleet size.
    pub fn with_nb_vehicles(mut self, n: usize) -> Self {
        self.nb_vehicles = Some(n);
        self
    }

    /// Sets the maximum size of the mining elite set.
    pub fn with_mdm_nb_elite(mut self, n: usize) -> Self {
        self.mdm_nb_elite = Some(n);
        self
    }

    /// Sets the maximum number of mined patterns.
    pub fn with_mdm_nb_patterns(mut self, n: usize) -> Self {
        self.mdm_nb_patterns = n;
        self
    }

    /// Sets the drought fraction that triggers mining.
    pub fn with_mdm_nu_restarts(mut self, fraction: f64) -> Self {
        self.mdm_nu_restarts = fraction.max(0.0);
        self
    }

    /// Sets the minimum support fraction of mined patterns.
    pub fn with_mdm_min_sup(mut self, fraction: f64) -> Self {
        self.mdm_min_sup = fraction.clamp(0.0, 1.0);
        self
    }

    /// Fills the instance-size dependent fields that are still unset.
    ///
    /// | clients | `rand_generation` | `mdm_nb_elite` |
    /// |---------|-------------------|----------------|
    /// | < 200   | 0.1               | 5              |
    /// | < 400   | 0.8               | 10             |
    /// | < 1001  | 0.2               | 5              |
    /// | ≥ 1001  | 0.2               | 0              |
    pub fn resolved(mut self, nb_clients: usize) -> Self {
        if self.rand_generation.is_none() {
            self.rand_generation = Some(if nb_clients < 200 {
                0.1
            } else if nb_clients < 400 {
                0.8
            } else {
                0.2
            });
        }
        if self.mdm_nb_elite.is_none() {
            self.mdm_nb_elite = Some(if nb_clients < 200 {
                5
            } else if nb_clients < 400 {
                10
            } else if nb_clients < 1001 {
                5
            } else {
                0
            });
        }
        self
    }

    /// Fraction of random individuals; 0.1 when unresolved.
    pub fn rand_generation_or_default(&self) -> f64 {
        self.rand_generation.unwrap_or(0.1)
    }

    /// Elite set capacity; 5 when unresolved.
    pub fn mdm_nb_elite_or_default(&self) -> usize {
        self.mdm_nb_elite.unwrap_or(5)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> HgsResult<()> {
        if self.mu == 0 {
            return Err(HgsError::InvalidConfig("mu must be at least 1".into()));
        }
        if self.lambda == 0 {
            return Err(HgsError::InvalidConfig("lambda must be at least 1".into()));
        }
        if self.nb_close == 0 {
            return Err(HgsError::InvalidConfig("nb_close must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.target_feasible) {
            return Err(HgsError::InvalidConfig(format!(
                "target_feasible must be in [0, 1], got {}",
                self.target_feasible
            )));
        }
        if let Some(fraction) = self.rand_generation {
            if !(0.0..=1.0).contains(&fraction) {
                return Err(HgsError::InvalidConfig(format!(
                    "rand_generation must be in [0, 1], got {fraction}"
                )));
            }
        }
        if self.nb_vehicles == Some(0) {
            return Err(HgsError::InvalidConfig(
                "nb_vehicles must be positive or None".into(),
            ));
        }
        if self.mdm_min_sup <= 0.0 || self.mdm_min_sup > 1.0 {
            return Err(HgsError::InvalidConfig(format!(
                "mdm_min_sup must be in (0, 1], got {}",
                self.mdm_min_sup
            )));
        }
        if self.mdm_nu_restarts < 0.0 {
            return Err(HgsError::InvalidConfig(
                "mdm_nu_restarts must be non-negative".into(),
            ));
        }
        if self.time_limit == Some(Duration::ZERO) {
            return Err(HgsError::InvalidConfig(
                "time_limit must be positive or None".into(),
            ));
        }
        Ok(())
    }
}
