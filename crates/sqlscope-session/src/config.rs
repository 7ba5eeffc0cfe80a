//! Session configuration.

use serde::{Deserialize, Serialize};

/// Configuration for Session behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Run each statement outside a transaction. When off, the first
    /// statement begins a transaction that must be committed explicitly.
    pub autocommit: bool,
    /// Flush staged statements before every `execute` / `query`.
    pub autoflush: bool,
    /// Log every statement at info level instead of debug.
    pub echo: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            autocommit: false,
            autoflush: false,
            echo: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_defaults() {
        let config = SessionConfig::default();
        assert!(!config.autocommit);
        assert!(!config.autoflush);
        assert!(!config.echo);
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: SessionConfig = serde_json::from_str(r#"{"autoflush": true}"#).unwrap();
        assert!(config.autoflush);
        assert!(!config.autocommit);
    }
}
