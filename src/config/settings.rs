//! Typed workflow settings
//!
//! `Default` is the built-in layer; site files and CLI flags override it
//! key by key before the merged value is deserialized back into this shape.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ConfigError;

/// All workflow settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowSettings {
    pub workflow: TransitionSettings,
    pub messages: MessageSettings,
    pub notifications: NotificationSettings,
    pub logging: LoggingSettings,
}

/// Transition acceptance policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionSettings {
    /// Reject targets missing from the resolved menu (default: false).
    ///
    /// Off by default: admins and editors move puzzles directly during a
    /// live event, and the audit comment records every move.
    pub strict_transitions: bool,
}

/// Human-facing message templates. Placeholders are `{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageSettings {
    /// Posted when a puzzle changes status. Must contain `{status}`.
    pub status_changed: String,
    /// Appended when entering postprod approval. Must contain `{postprod_url}`.
    pub postprod_clause: String,
    /// Logged on each testsolve session closed by a status change.
    pub session_closed: String,
    /// Posted when a puzzle is created. Must contain `{status}`.
    pub created: String,
}

impl Default for MessageSettings {
    fn default() -> Self {
        Self {
            status_changed: "This puzzle is now **{status}**.".to_string(),
            postprod_clause: "\nView the postprod at {postprod_url}".to_string(),
            session_closed:
                "Puzzle status changed, automatically marking session as no longer joinable"
                    .to_string(),
            created: "This puzzle has been created in status **{status}**!".to_string(),
        }
    }
}

/// Email template selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// Template for status subscribers when no per-status template exists.
    pub status_update_template: String,
    /// Template for the testsolve coordinator blast.
    pub testsolve_coordinator_template: String,
    /// Template for comment notifications to puzzle participants.
    pub new_comment_template: String,
    /// Per-status subscriber templates, keyed by status code.
    pub status_templates: BTreeMap<String, String>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            status_update_template: "status_update_email".to_string(),
            testsolve_coordinator_template: "testsolving_time".to_string(),
            new_comment_template: "new_comment_email".to_string(),
            status_templates: BTreeMap::from([("AE".to_string(), "awaiting_editor".to_string())]),
        }
    }
}

impl NotificationSettings {
    /// Subscriber template for a status code.
    pub fn template_for(&self, code: &str) -> &str {
        self.status_templates
            .get(code)
            .map(String::as_str)
            .unwrap_or(&self.status_update_template)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing-subscriber` filter directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl WorkflowSettings {
    /// Built-in defaults as a JSON value for merging.
    pub fn defaults_value() -> Result<serde_json::Value, ConfigError> {
        serde_json::to_value(Self::default())
            .map_err(|e| ConfigError::ParseError(format!("defaults: {}", e)))
    }
}
