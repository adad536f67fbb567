//! Notification delivery
//!
//! The engine only produces directives. A [`Notifier`] delivers them; a
//! failed delivery is logged and reported, and the status change it belongs
//! to stands.

use serde::Serialize;
use tracing::{info, warn};

use crate::engine::{ChatUpdate, EffectBundle, NotificationDirective, NotificationKind};
use crate::model::PuzzleId;

/// Delivery errors reported by a notifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    #[error("mail delivery failed: {0}")]
    Mail(String),

    #[error("chat delivery failed: {0}")]
    Chat(String),
}

/// Sends email and chat updates.
pub trait Notifier {
    fn send(&self, directive: &NotificationDirective) -> Result<(), NotifyError>;

    /// Post to the puzzle's chat channel. No chat integration by default.
    fn post_chat(&self, _puzzle: PuzzleId, _update: &ChatUpdate) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// What [`dispatch`] managed to deliver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub sent: Vec<NotificationKind>,
    pub chat_posted: bool,
    pub failures: Vec<String>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Deliver everything an effect bundle asks for.
pub fn dispatch(notifier: &dyn Notifier, bundle: &EffectBundle) -> DispatchReport {
    let mut report = DispatchReport::default();

    if let Some(chat) = &bundle.chat {
        match notifier.post_chat(bundle.puzzle_id, chat) {
            Ok(()) => report.chat_posted = true,
            Err(e) => {
                warn!(puzzle = %bundle.puzzle_id, error = %e, "chat update failed");
                report.failures.push(e.to_string());
            }
        }
    }

    for directive in &bundle.notifications {
        match notifier.send(directive) {
            Ok(()) => report.sent.push(directive.kind),
            Err(e) => {
                warn!(
                    puzzle = %bundle.puzzle_id,
                    template = %directive.template,
                    recipients = directive.recipients.len(),
                    error = %e,
                    "notification failed"
                );
                report.failures.push(e.to_string());
            }
        }
    }

    report
}

/// Notifier that only logs what it would send.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, directive: &NotificationDirective) -> Result<(), NotifyError> {
        info!(
            kind = ?directive.kind,
            template = %directive.template,
            subject = %directive.subject,
            recipients = ?directive.recipients,
            "email"
        );
        Ok(())
    }

    fn post_chat(&self, puzzle: PuzzleId, update: &ChatUpdate) -> Result<(), NotifyError> {
        info!(puzzle = %puzzle, category = %update.category, message = %update.message, "chat");
        Ok(())
    }
}
