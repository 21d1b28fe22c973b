use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::triage::TriageError;

/// Application-level constants
pub const APP_NAME: &str = "CareBow Triage";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "carebow_triage=info"
}

/// Host-tunable engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number dialed by the `emergency_call` action.
    pub emergency_number: String,
    /// Map search opened by the `find_er` action.
    pub er_search_query: String,
    /// Severity recorded when the reply cannot be parsed.
    pub default_severity: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            emergency_number: "911".into(),
            er_search_query: "emergency room near me".into(),
            default_severity: 5,
        }
    }
}

impl EngineConfig {
    /// Load settings from a JSON file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, TriageError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| TriageError::ConfigLoad(path.display().to_string(), e.to_string()))?;
        let mut config: Self = serde_json::from_str(&json)
            .map_err(|e| TriageError::ConfigLoad(path.display().to_string(), e.to_string()))?;
        config.default_severity = config.default_severity.clamp(1, 10);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_name_is_carebow() {
        assert_eq!(APP_NAME, "CareBow Triage");
    }

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.emergency_number, "911");
        assert_eq!(config.default_severity, 5);
    }

    #[test]
    fn load_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{"emergency_number": "112"}"#).unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.emergency_number, "112");
        assert_eq!(config.er_search_query, "emergency room near me");
        assert_eq!(config.default_severity, 5);
    }

    #[test]
    fn load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, TriageError::ConfigLoad(..)));
    }

    #[test]
    fn load_clamps_default_severity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{"default_severity": 42}"#).unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap().default_severity, 10);
    }
}
