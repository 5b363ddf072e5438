//! Engine configuration, loadable from TOML.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Which isolation level a session asks for when breaking down `r*` and
/// `r+` transitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IsolationPolicy {
    /// The weakest level that is still correct for the transition.
    #[default]
    Optimal,
    /// Always add fresh states on both sides of the loop.
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Allow executing commands mid-history, discarding the redoable tail.
    pub clobber_history: bool,
    pub isolation: IsolationPolicy,
    /// Run the full optimiser over the expression recovered from an
    /// automaton.
    pub optimise_extracted: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            clobber_history: false,
            isolation: IsolationPolicy::Optimal,
            optimise_extracted: true,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration. Missing keys take their default value.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let config = EngineConfig::from_toml_str(
            r#"
            clobber_history = true
            isolation = "full"
            "#,
        )
        .unwrap();
        assert!(config.clobber_history);
        assert_eq!(config.isolation, IsolationPolicy::Full);
        assert!(config.optimise_extracted);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(matches!(
            EngineConfig::from_toml_str("clobber = true"),
            Err(Error::Config(_))
        ));
        assert!(EngineConfig::from_toml_str("isolation = \"sometimes\"").is_err());
    }
}
