//! Effective configuration with provenance
//!
//! Records which layers contributed and the SHA-256 of every file read, so
//! a deployment can tell which site file produced its behavior.

use chrono::{DateTime, Utc};
use puzzup_status::Status;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

use super::merge::merge_layers;
use super::settings::WorkflowSettings;
use crate::engine::MessageTemplates;

/// Origin of a configuration layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    Site,
    Cli,
}

/// A contributing layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 of the raw file bytes (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Merged configuration plus the typed settings it produced.
#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    pub created_at: DateTime<Utc>,

    /// The merged configuration object
    pub config: Value,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,

    #[serde(skip)]
    pub settings: WorkflowSettings,
}

impl EffectiveConfig {
    /// Build from built-in defaults, an optional site file and CLI overrides.
    ///
    /// A site path that does not exist is skipped.
    pub fn build(
        site_config_path: Option<&Path>,
        cli_overrides: Option<Value>,
    ) -> Result<Self, ConfigError> {
        let mut layers = vec![WorkflowSettings::defaults_value()?];
        let mut sources = vec![ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        }];

        if let Some(path) = site_config_path {
            if path.exists() {
                let (value, digest) = Self::load_toml_file(path)?;
                layers.push(value);
                sources.push(ConfigSource {
                    origin: ConfigOrigin::Site,
                    path: Some(path.to_string_lossy().to_string()),
                    digest: Some(digest),
                });
            }
        }

        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        let merged = merge_layers(layers);
        let settings: WorkflowSettings = serde_json::from_value(merged.clone())
            .map_err(|e| ConfigError::ParseError(format!("invalid settings: {}", e)))?;
        Self::validate(&settings)?;

        Ok(Self {
            created_at: Utc::now(),
            config: merged,
            sources,
            settings,
        })
    }

    /// Load a TOML file, returning its JSON value and digest
    fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
        let bytes = fs::read(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let contents = String::from_utf8(bytes)
            .map_err(|e| ConfigError::ParseError(format!("Invalid UTF-8: {}", e)))?;
        let value: Value = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

        Ok((value, digest))
    }

    /// Reject settings the engine cannot use
    fn validate(settings: &WorkflowSettings) -> Result<(), ConfigError> {
        MessageTemplates::compile(&settings.messages)?;

        let notifications = &settings.notifications;
        for (key, template) in [
            ("status_update_template", &notifications.status_update_template),
            (
                "testsolve_coordinator_template",
                &notifications.testsolve_coordinator_template,
            ),
            ("new_comment_template", &notifications.new_comment_template),
        ] {
            if template.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "notifications.{} must not be empty",
                    key
                )));
            }
        }

        for (code, template) in &notifications.status_templates {
            if Status::from_code(code).is_none() {
                return Err(ConfigError::ValidationError(format!(
                    "notifications.status_templates: unknown status code {:?}",
                    code
                )));
            }
            if template.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "notifications.status_templates.{} must not be empty",
                    code
                )));
            }
        }

        if settings.logging.filter.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "logging.filter must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Get a config value by dot-separated path
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.config, |current, part| current.get(part))
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(|v| v.as_str())
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(|v| v.as_bool())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_build_with_defaults_only() {
        let config = EffectiveConfig::build(None, None).unwrap();

        assert_eq!(config.settings, WorkflowSettings::default());
        assert_eq!(config.get_bool("workflow.strict_transitions"), Some(false));
        assert_eq!(config.get_str("notifications.status_templates.AE"), Some("awaiting_editor"));
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].origin, ConfigOrigin::Builtin);
    }

    #[test]
    fn test_site_file_layer() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "[workflow]").unwrap();
        writeln!(temp, "strict_transitions = true").unwrap();
        writeln!(temp, "[notifications.status_templates]").unwrap();
        writeln!(temp, "T = \"ready_for_testsolve\"").unwrap();

        let config = EffectiveConfig::build(Some(temp.path()), None).unwrap();

        assert!(config.settings.workflow.strict_transitions);
        assert_eq!(config.settings.notifications.template_for("T"), "ready_for_testsolve");
        assert_eq!(config.settings.notifications.template_for("AE"), "awaiting_editor");

        let site = &config.sources[1];
        assert_eq!(site.origin, ConfigOrigin::Site);
        assert_eq!(site.digest.as_ref().map(|d| d.len()), Some(64));
    }

    #[test]
    fn test_missing_site_file_is_skipped() {
        let config =
            EffectiveConfig::build(Some(Path::new("/nonexistent/puzzup.toml")), None).unwrap();
        assert_eq!(config.sources.len(), 1);
    }

    #[test]
    fn test_cli_override() {
        let cli = serde_json::json!({"logging": {"filter": "debug"}});
        let config = EffectiveConfig::build(None, Some(cli)).unwrap();
        assert_eq!(config.settings.logging.filter, "debug");
        assert_eq!(config.sources.last().map(|s| &s.origin), Some(&ConfigOrigin::Cli));
    }

    #[test]
    fn test_unknown_status_template_key_rejected() {
        let cli = serde_json::json!({"notifications": {"status_templates": {"ZZ": "x"}}});
        let err = EffectiveConfig::build(None, Some(cli)).unwrap_err();
        assert!(err.to_string().contains("ZZ"));
    }

    #[test]
    fn test_bad_message_template_rejected() {
        let cli = serde_json::json!({"messages": {"status_changed": "moved"}});
        let err = EffectiveConfig::build(None, Some(cli)).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "[workflow").unwrap();
        let err = EffectiveConfig::build(Some(temp.path()), None).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_wrong_type_is_parse_error() {
        let cli = serde_json::json!({"workflow": {"strict_transitions": "yes"}});
        let err = EffectiveConfig::build(None, Some(cli)).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
