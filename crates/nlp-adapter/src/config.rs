//! Adapter configuration.
//!
//! [`AdapterConfig`] is plain data with a default for every field, so a TOML
//! file only needs the settings it changes:
//!
//! ```toml
//! problem_name = "wing"
//!
//! [finite_difference]
//! scheme = "central"
//!
//! [normalizer]
//! population_file = "run/nsga2_final_pop.out"
//!
//! [[backends]]
//! name = "ALPSO"
//! trust_echoed_result = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::backend::FiniteDifference;
use crate::error::AdapterResult;
use crate::quirks::{BackendQuirkEntry, QuirkTable};

/// Default name of the descriptor handed to the solver.
pub const DEFAULT_PROBLEM_NAME: &str = "optimization";

/// Default population file written by the genetic multi-objective backend.
pub const DEFAULT_POPULATION_FILE: &str = "nsga2_final_pop.out";

/// Settings for one or more solves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Name given to the problem descriptor.
    pub problem_name: String,

    /// Fallback used when the evaluation function supplies no gradients.
    pub finite_difference: FiniteDifference,

    /// Post-solve normalization settings.
    pub normalizer: NormalizerConfig,

    /// Extra or overriding rows for the backend quirk table.
    pub backends: Vec<BackendQuirkEntry>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            problem_name: DEFAULT_PROBLEM_NAME.to_string(),
            finite_difference: FiniteDifference::default(),
            normalizer: NormalizerConfig::default(),
            backends: Vec::new(),
        }
    }
}

/// Settings for the result normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Re-evaluate the final point even for backends whose echoed result is trusted.
    pub always_reevaluate: bool,

    /// Where the population-file backend writes its final population.
    pub population_file: PathBuf,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            always_reevaluate: false,
            population_file: PathBuf::from(DEFAULT_POPULATION_FILE),
        }
    }
}

impl AdapterConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> AdapterResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> AdapterResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Render the configuration as TOML.
    pub fn to_toml_string(&self) -> AdapterResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> AdapterResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// The built-in quirk table with this configuration's rows applied.
    pub fn quirk_table(&self) -> QuirkTable {
        QuirkTable::with_overrides(&self.backends)
    }
}
