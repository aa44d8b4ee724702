//! Parameters of the search engines and of the run controller.
//!
//! Every field has a default, so a configuration file only needs to list the
//! values it overrides:
//!
//! ```json
//! { "genetic": { "population_size": 100, "selection": { "kind": "roulette" } },
//!   "run": { "nb_runs": 5, "seed": 42 } }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::search::greedy::VertexOrder;

/** parent selection scheme of the genetic algorithm */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selection {
    /// best of `size` individuals drawn uniformly (with replacement)
    Tournament {
        /// number of individuals drawn
        size: usize
    },
    /// probability proportional to (max_fitness - fitness + 1)
    Roulette,
    /// uniform among the `pool` best individuals
    Truncation {
        /// number of best individuals eligible
        pool: usize
    },
}

impl Default for Selection {
    fn default() -> Self { Self::Tournament { size: 3 } }
}

/** construction of the initial coloring of each run */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InitialColoring {
    /// first-fit greedy visiting the vertices in the given order
    FirstFit {
        /// visiting order
        order: VertexOrder
    },
    /// DSATUR greedy
    Dsatur,
}

impl Default for InitialColoring {
    fn default() -> Self { Self::FirstFit { order: VertexOrder::DegreeDescending } }
}

/** tabu search parameters */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabuConfig {
    /// iterations per color budget
    pub max_iter: usize,
    /// capacity of the tabu list
    pub tabu_size: usize,
}

impl Default for TabuConfig {
    fn default() -> Self {
        Self { max_iter: 1000, tabu_size: 10 }
    }
}

/** genetic algorithm parameters */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    /// number of individuals
    pub population_size: usize,
    /// maximum number of generations per color budget
    pub max_generations: usize,
    /// initial mutation probability of an offspring
    pub mutation_rate: f64,
    /// probability that an offspring is produced by crossover (clone of a parent otherwise)
    pub crossover_rate: f64,
    /// number of best individuals copied unchanged to the next generation
    pub elitism: usize,
    /// fraction of the initial population built by the randomized greedy
    pub heuristic_fraction: f64,
    /// parent selection scheme
    pub selection: Selection,
    /// fraction of the new population (elites first) improved by the local repair
    pub local_repair_fraction: f64,
    /// every that many generations, the worst individuals are replaced by random ones (0: never)
    pub reinjection_interval: usize,
    /// fraction of the population replaced at each reinjection
    pub reinjection_fraction: f64,
    /// the mutation rate increases every that many generations without improvement (0: never)
    pub mutation_increase_every: usize,
    /// increase of the mutation rate (capped at 1)
    pub mutation_increase_step: f64,
    /// generations without improvement before giving up
    pub max_stagnation: usize,
    /// weight of a conflict in the fitness (raised to n+1 if smaller)
    pub conflict_weight: u64,
    /// eliminates color classes of the conflict-free result
    pub aggressive_reduction: bool,
    /// also tries the randomized greedy remap reduction on the conflict-free result
    pub greedy_reduction: bool,
    /// evaluates the population in parallel
    pub parallel_evaluation: bool,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: 200,
            max_generations: 600,
            mutation_rate: 0.2,
            crossover_rate: 0.85,
            elitism: 10,
            heuristic_fraction: 0.5,
            selection: Selection::default(),
            local_repair_fraction: 0.1,
            reinjection_interval: 20,
            reinjection_fraction: 0.2,
            mutation_increase_every: 20,
            mutation_increase_step: 0.1,
            max_stagnation: 500,
            conflict_weight: 10_000,
            aggressive_reduction: true,
            greedy_reduction: false,
            parallel_evaluation: false,
        }
    }
}

/** run controller parameters */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// number of independent runs
    pub nb_runs: usize,
    /// greedy building the initial coloring of each run
    pub initial: InitialColoring,
    /// random seed (entropy if none)
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { nb_runs: 3, initial: InitialColoring::default(), seed: None }
    }
}

/** complete solver configuration */
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// tabu search parameters
    pub tabu: TabuConfig,
    /// genetic algorithm parameters
    pub genetic: GeneticConfig,
    /// run controller parameters
    pub run: RunConfig,
}

/// error unless 0 <= value <= 1
fn check_probability(name:&str, value:f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) { Ok(()) }
    else { Err(ConfigError::Invalid(format!("{} must be within [0,1] (got {})", name, value))) }
}

impl GeneticConfig {
    /// checks that the parameters are consistent
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size < 2 {
            return Err(ConfigError::Invalid("population_size must be at least 2".to_string()));
        }
        if self.elitism >= self.population_size {
            return Err(ConfigError::Invalid(format!(
                "elitism ({}) must be smaller than population_size ({})",
                self.elitism, self.population_size
            )));
        }
        check_probability("mutation_rate", self.mutation_rate)?;
        check_probability("crossover_rate", self.crossover_rate)?;
        check_probability("heuristic_fraction", self.heuristic_fraction)?;
        check_probability("local_repair_fraction", self.local_repair_fraction)?;
        check_probability("reinjection_fraction", self.reinjection_fraction)?;
        check_probability("mutation_increase_step", self.mutation_increase_step)?;
        match self.selection {
            Selection::Tournament { size } if size == 0 => {
                return Err(ConfigError::Invalid("tournament size must be positive".to_string()));
            },
            Selection::Truncation { pool } if pool == 0 => {
                return Err(ConfigError::Invalid("truncation pool must be positive".to_string()));
            },
            _ => {},
        }
        if self.conflict_weight == 0 {
            return Err(ConfigError::Invalid("conflict_weight must be positive".to_string()));
        }
        Ok(())
    }
}

impl SolverConfig {
    /// reads a JSON configuration file and validates it
    pub fn from_file<P:AsRef<Path>>(path:P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// parses a JSON configuration and validates it
    pub fn from_json(content:&str) -> Result<Self, ConfigError> {
        let res:Self = serde_json::from_str(content)?;
        res.validate()?;
        Ok(res)
    }

    /// checks that the parameters are consistent
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.genetic.validate()?;
        if self.run.nb_runs == 0 {
            return Err(ConfigError::Invalid("nb_runs must be positive".to_string()));
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SolverConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tabu.tabu_size, 10);
        assert_eq!(config.genetic.selection, Selection::Tournament { size: 3 });
    }

    #[test]
    fn test_partial_json() {
        let config = SolverConfig::from_json(r#"{
            "genetic": { "population_size": 50, "elitism": 2, "selection": { "kind": "truncation", "pool": 20 } },
            "run": { "seed": 7, "initial": { "kind": "first_fit", "order": "random" } }
        }"#).unwrap();
        assert_eq!(config.genetic.population_size, 50);
        assert_eq!(config.genetic.selection, Selection::Truncation { pool: 20 });
        assert_eq!(config.genetic.max_generations, 600);
        assert_eq!(config.run.seed, Some(7));
        assert_eq!(config.run.initial, InitialColoring::FirstFit { order: VertexOrder::Random });
        let config = SolverConfig::from_json(r#"{ "run": { "initial": { "kind": "dsatur" } } }"#).unwrap();
        assert_eq!(config.run.initial, InitialColoring::Dsatur);
        assert_eq!(config.tabu, TabuConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = SolverConfig::default();
        config.genetic.selection = Selection::Roulette;
        config.run.seed = Some(1);
        config.run.initial = InitialColoring::Dsatur;
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(SolverConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_configurations() {
        assert!(matches!(
            SolverConfig::from_json(r#"{ "genetic": { "mutation_rate": 1.5 } }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SolverConfig::from_json(r#"{ "genetic": { "population_size": 10, "elitism": 10 } }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SolverConfig::from_json(r#"{ "genetic": { "selection": { "kind": "tournament", "size": 0 } } }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SolverConfig::from_json(r#"{ "run": { "nb_runs": 0 } }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(SolverConfig::from_json("{ not json"), Err(ConfigError::Json(_))));
        assert!(matches!(SolverConfig::from_file("insts/missing.json"), Err(ConfigError::Io(_))));
    }
}
