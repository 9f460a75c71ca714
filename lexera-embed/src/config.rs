/// Tuning shared by every board instance embedded in a host document.
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncConfig {
    /// Quiet period before an incremental text edit is written.
    pub debounce_ms: u64,
    /// Delay between a host validation failure and the recovery write.
    pub recovery_delay_ms: u64,
    /// Node type name the host uses in validation failure reports.
    pub node_type: String,
    /// Lifetime of an unconsumed self-write fingerprint.
    pub echo_ttl_ms: u64,
    /// Column counted as "done" when no column carries the completion flag.
    pub default_completion_column: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            recovery_delay_ms: 100,
            node_type: "kanbanBoard".to_string(),
            echo_ttl_ms: 10_000,
            default_completion_column: "col-3".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("debounceMs must be greater than zero")]
    ZeroDebounce,

    #[error("nodeType must not be empty")]
    EmptyNodeType,

    #[error("defaultCompletionColumn must not be empty")]
    EmptyDefaultColumn,
}

impl SyncConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.debounce_ms == 0 {
            return Err(ConfigError::ZeroDebounce);
        }
        if self.node_type.trim().is_empty() {
            return Err(ConfigError::EmptyNodeType);
        }
        if self.default_completion_column.trim().is_empty() {
            return Err(ConfigError::EmptyDefaultColumn);
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn recovery_delay(&self) -> Duration {
        Duration::from_millis(self.recovery_delay_ms)
    }

    pub fn echo_ttl(&self) -> Duration {
        Duration::from_millis(self.echo_ttl_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.debounce(), Duration::from_millis(500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SyncConfig = serde_json::from_str(r#"{"debounceMs": 250}"#).unwrap();
        assert_eq!(config.debounce_ms, 250);
        assert_eq!(config.recovery_delay_ms, 100);
        assert_eq!(config.node_type, "kanbanBoard");
    }

    #[test]
    fn test_validate_rejects_zero_debounce() {
        let config = SyncConfig {
            debounce_ms: 0,
            ..SyncConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroDebounce));
    }

    #[test]
    fn test_validate_rejects_blank_node_type() {
        let config = SyncConfig {
            node_type: "  ".to_string(),
            ..SyncConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyNodeType));
    }
}
