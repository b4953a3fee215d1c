//! Bot configuration, loadable from TOML.

use std::path::Path;

use serde::Deserialize;

use crate::engine::DEFAULT_MAX_LHOPITAL;
use crate::error::ConfigError;
use crate::history::DEFAULT_HISTORY_CAP;

/// Configuration for the request pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BotConfig {
    /// Per-user bound on stored history entries.
    pub history_cap: usize,
    /// Variable assumed when a request names none.
    pub default_variable: String,
    /// L'Hôpital iteration budget for 0/0 limits.
    pub max_lhopital: usize,
    /// Whether replies carry the decorative frame.
    pub decorated_replies: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            history_cap: DEFAULT_HISTORY_CAP,
            default_variable: "x".to_string(),
            max_lhopital: DEFAULT_MAX_LHOPITAL,
            decorated_replies: true,
        }
    }
}

impl BotConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_sensible() {
        let config = BotConfig::default();
        assert_eq!(config.history_cap, 20);
        assert_eq!(config.default_variable, "x");
        assert_eq!(config.max_lhopital, 4);
        assert!(config.decorated_replies);
    }

    #[test]
    fn loads_partial_toml_over_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "history_cap = 5\ndefault_variable = \"t\"").unwrap();
        let config = BotConfig::load(file.path()).unwrap();
        assert_eq!(config.history_cap, 5);
        assert_eq!(config.default_variable, "t");
        // Untouched keys keep their defaults.
        assert_eq!(config.max_lhopital, 4);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "histroy_cap = 5").unwrap();
        assert!(matches!(
            BotConfig::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            BotConfig::load(Path::new("/nonexistent/seshat.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
