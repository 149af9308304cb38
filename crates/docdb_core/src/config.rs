//! Database configuration.

use crate::conflict::ConflictPolicy;
use serde::{Deserialize, Serialize};

/// Configuration for opening a database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How many resolve-and-retry rounds a save may run after detecting a
    /// concurrent revision before failing with a conflict (0 = fail on the
    /// first conflict).
    pub max_save_retries: usize,

    /// Built-in resolver used when a save is not given one explicitly.
    pub conflict_policy: ConflictPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_save_retries: 3,
            conflict_policy: ConflictPolicy::Merge,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the save retry bound.
    #[must_use]
    pub const fn max_save_retries(mut self, value: usize) -> Self {
        self.max_save_retries = value;
        self
    }

    /// Sets the default conflict policy.
    #[must_use]
    pub const fn conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.max_save_retries, 3);
        assert_eq!(config.conflict_policy, ConflictPolicy::Merge);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .max_save_retries(0)
            .conflict_policy(ConflictPolicy::Manual);

        assert_eq!(config.max_save_retries, 0);
        assert_eq!(config.conflict_policy, ConflictPolicy::Manual);
    }

    #[test]
    fn loads_from_json_with_defaults() {
        let config: Config = serde_json::from_str(r#"{"conflict_policy":"theirs_wins"}"#).unwrap();
        assert_eq!(config.conflict_policy, ConflictPolicy::TheirsWins);
        assert_eq!(config.max_save_retries, 3);
    }
}
