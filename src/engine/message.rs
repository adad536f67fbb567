//! Human-facing status messages
//!
//! Templates come from configuration and use `{name}` placeholders. They are
//! checked once when settings load, so rendering never fails.

use puzzup_status::{Status, StatusCode};
use regex_lite::{Captures, Regex};

use crate::config::{ConfigError, MessageSettings};
use crate::model::Puzzle;

/// Compiled message templates.
#[derive(Debug, Clone)]
pub struct MessageTemplates {
    placeholder: Regex,
    settings: MessageSettings,
}

impl MessageTemplates {
    /// Validate placeholders and build the renderer.
    pub fn compile(settings: &MessageSettings) -> Result<Self, ConfigError> {
        let placeholder = Regex::new(r"\{([a-z_]+)\}")
            .map_err(|e| ConfigError::ValidationError(format!("placeholder pattern: {}", e)))?;
        let templates = Self {
            placeholder,
            settings: settings.clone(),
        };

        templates.check(
            "messages.status_changed",
            &settings.status_changed,
            &["status"],
            &["status", "puzzle"],
        )?;
        templates.check(
            "messages.postprod_clause",
            &settings.postprod_clause,
            &["postprod_url"],
            &["postprod_url"],
        )?;
        templates.check("messages.session_closed", &settings.session_closed, &[], &[])?;
        templates.check(
            "messages.created",
            &settings.created,
            &["status"],
            &["status", "puzzle"],
        )?;

        Ok(templates)
    }

    /// Placeholder names used by a template, in order of appearance.
    pub fn placeholders(&self, template: &str) -> Vec<String> {
        self.placeholder
            .captures_iter(template)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
            .collect()
    }

    fn check(
        &self,
        key: &str,
        template: &str,
        required: &[&str],
        allowed: &[&str],
    ) -> Result<(), ConfigError> {
        if template.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!("{} must not be empty", key)));
        }
        let used = self.placeholders(template);
        if let Some(missing) = required.iter().find(|r| !used.iter().any(|u| u == *r)) {
            return Err(ConfigError::ValidationError(format!(
                "{} must contain {{{}}}",
                key, missing
            )));
        }
        if let Some(unknown) = used.iter().find(|u| !allowed.contains(&u.as_str())) {
            return Err(ConfigError::ValidationError(format!(
                "{} uses unknown placeholder {{{}}}",
                key, unknown
            )));
        }
        Ok(())
    }

    /// Substitute `{name}` placeholders; unknown names are left verbatim.
    pub fn render(&self, template: &str, vars: &[(&str, &str)]) -> String {
        self.placeholder
            .replace_all(template, |caps: &Captures| {
                let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                vars.iter()
                    .find(|(k, _)| *k == name)
                    .map(|(_, v)| v.to_string())
                    .unwrap_or_else(|| caps.get(0).map(|m| m.as_str()).unwrap_or_default().to_string())
            })
            .into_owned()
    }

    /// Message announcing that `puzzle` is now in `target`.
    ///
    /// Entering postprod approval appends a link to the postprod when one
    /// exists.
    pub fn status_changed(&self, puzzle: &Puzzle, target: &StatusCode, display: &str) -> String {
        let title = puzzle.spoiler_free_title();
        let mut message = self.render(
            &self.settings.status_changed,
            &[("status", display), ("puzzle", &title)],
        );
        if target.is(Status::AwaitingPostprodApproval) {
            if let Some(url) = puzzle.postprod_url() {
                message.push_str(&self.render(&self.settings.postprod_clause, &[("postprod_url", url)]));
            }
        }
        message
    }

    /// Message announcing a newly created puzzle.
    pub fn created(&self, puzzle: &Puzzle, display: &str) -> String {
        let title = puzzle.spoiler_free_title();
        self.render(&self.settings.created, &[("status", display), ("puzzle", &title)])
    }

    /// Comment logged on each session closed by a status change.
    pub fn session_closed(&self) -> &str {
        &self.settings.session_closed
    }
}
