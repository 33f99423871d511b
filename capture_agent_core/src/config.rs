use serde::{Deserialize, Serialize};

use crate::{evaluator::WeightTable, features::Profile};

/// Errors raised while loading a team configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid team config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tunables shared by both agents of a team.
///
/// ```toml
/// seed = 7
///
/// [defense]
/// onDefense = 150.0
/// numInvaders = -1000.0
/// stop = -100.0
/// ```
///
/// Omitted tables keep the built-in weights; a table that is present replaces the
/// built-in one entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamConfig {
    /// Seeds each agent's tie-break random source (offset by seat).
    pub seed: u64,
    pub offense: WeightTable,
    pub defense: WeightTable,
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            offense: WeightTable::for_profile(Profile::Offensive),
            defense: WeightTable::for_profile(Profile::Defensive),
        }
    }
}

impl TeamConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn weights(&self, profile: Profile) -> &WeightTable {
        match profile {
            Profile::Offensive => &self.offense,
            Profile::Defensive => &self.defense,
        }
    }
}
