//! Configuration of a [`Mixer`](crate::engine::Mixer), loadable from TOML.
//!
//! ```
//! use group_mixer::config::MixerConfig;
//!
//! let config = MixerConfig::from_toml_str("random_seed = 42").unwrap();
//! assert_eq!(config.random_seed, Some(42));
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MixerConfig {
    /// Seed of the tie-breaking random source. Entropy is used when absent.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl MixerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(MixerConfig::from_toml_str("").unwrap(), MixerConfig::default());
    }

    #[test]
    fn builder_sets_seed() {
        assert_eq!(MixerConfig::new().with_random_seed(9).random_seed, Some(9));
    }

    #[test]
    fn invalid_toml_is_reported() {
        assert!(matches!(
            MixerConfig::from_toml_str("random_seed = \"soon\""),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(MixerConfig::load("/nonexistent/mixer.toml"), Err(ConfigError::Io(_))));
    }
}
