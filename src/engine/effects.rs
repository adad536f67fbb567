//! Effect bundles
//!
//! What a workflow operation did, and what the caller still has to deliver.
//! The engine never sends mail or chat itself.

use puzzup_status::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{AnswerId, CommentId, PuzzleId, SessionId, User};

/// Why a notification is being sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Users subscribed to the state the puzzle entered
    StatusSubscription,
    /// Everyone holding the testsolve coordinator role
    TestsolveCoordinators,
    /// Puzzle participants, for a new comment
    NewComment,
}

/// One email to send: template, subject, recipients and template context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationDirective {
    pub kind: NotificationKind,
    pub template: String,
    pub subject: String,
    /// Email addresses, deduplicated, never empty.
    pub recipients: Vec<String>,
    pub context: Value,
}

impl NotificationDirective {
    /// Build a directive for `users`.
    ///
    /// Users without an email are dropped, as is any address in `exclude`.
    /// Returns `None` when nobody is left to notify.
    pub fn for_users<'a>(
        kind: NotificationKind,
        template: impl Into<String>,
        subject: impl Into<String>,
        users: impl IntoIterator<Item = &'a User>,
        exclude: Option<&str>,
        context: Value,
    ) -> Option<Self> {
        let mut recipients: Vec<String> = Vec::new();
        for email in users.into_iter().filter_map(User::email) {
            if Some(email) == exclude || recipients.iter().any(|r| r == email) {
                continue;
            }
            recipients.push(email.to_string());
        }
        if recipients.is_empty() {
            return None;
        }
        Some(Self {
            kind,
            template: template.into(),
            subject: subject.into(),
            recipients,
            context,
        })
    }
}

/// Chat channel update: move the puzzle channel into `category` and post
/// `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatUpdate {
    pub category: String,
    pub message: String,
}

/// Result of a status transition attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectBundle {
    pub puzzle_id: PuzzleId,
    pub previous_status: StatusCode,
    pub status: StatusCode,
    pub status_display: String,
    /// False when the same status was reselected.
    pub status_changed: bool,
    /// Whether the target was on the resolved menu.
    pub offered: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat: Option<ChatUpdate>,
    #[serde(default)]
    pub notifications: Vec<NotificationDirective>,
    /// Joinable testsolve sessions were to be closed.
    pub close_joinable_sessions: bool,
    #[serde(default)]
    pub closed_sessions: Vec<SessionId>,
    #[serde(default)]
    pub cleared_answers: Vec<AnswerId>,
    pub factcheck_created: bool,
    /// Comments appended, audit comment first.
    #[serde(default)]
    pub comments: Vec<CommentId>,
}

impl EffectBundle {
    pub fn notifications_of(&self, kind: NotificationKind) -> impl Iterator<Item = &NotificationDirective> {
        self.notifications.iter().filter(move |n| n.kind == kind)
    }
}

/// Result of posting a comment that may carry a status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentOutcome {
    pub comment: CommentId,
    /// The status change recorded on the comment, if it was accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_change: Option<StatusCode>,
    pub status_changed: bool,
    /// True when the comment moved the puzzle into factcheck and the
    /// record did not exist yet.
    #[serde(default)]
    pub factcheck_created: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat: Option<ChatUpdate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationDirective>,
}

/// Result of a testsolve session finding the correct answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestsolveOutcome {
    pub comment: CommentId,
    pub content: String,
    pub status_changed: bool,
    pub session_closed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat: Option<ChatUpdate>,
}

/// Result of recording a new puzzle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreationOutcome {
    pub comment: CommentId,
    pub chat: ChatUpdate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserId;
    use serde_json::json;

    #[test]
    fn test_directive_drops_blank_and_duplicate_emails() {
        let users = vec![
            User::new(UserId(1), "a").with_email("a@example.com"),
            User::new(UserId(2), "b"),
            User::new(UserId(3), "a2").with_email("a@example.com"),
            User::new(UserId(4), "c").with_email("c@example.com"),
        ];
        let directive = NotificationDirective::for_users(
            NotificationKind::StatusSubscription,
            "status_update_email",
            "Maze ➡ Done",
            &users,
            None,
            json!({}),
        )
        .unwrap();
        assert_eq!(directive.recipients, vec!["a@example.com", "c@example.com"]);
    }

    #[test]
    fn test_directive_with_nobody_left_is_none() {
        let users = vec![
            User::new(UserId(1), "a").with_email("a@example.com"),
            User::new(UserId(2), "b"),
        ];
        let directive = NotificationDirective::for_users(
            NotificationKind::NewComment,
            "new_comment_email",
            "New comment on Maze",
            &users,
            Some("a@example.com"),
            json!({}),
        );
        assert!(directive.is_none());
    }

    #[test]
    fn test_bundle_serializes_codes_as_strings() {
        let bundle = EffectBundle {
            puzzle_id: PuzzleId(4),
            previous_status: StatusCode::from("T"),
            status: StatusCode::from("TR"),
            status_display: "Awaiting Testsolve Review".to_string(),
            status_changed: true,
            offered: true,
            message: String::new(),
            chat: None,
            notifications: Vec::new(),
            close_joinable_sessions: true,
            closed_sessions: vec![SessionId(2)],
            cleared_answers: Vec::new(),
            factcheck_created: false,
            comments: vec![CommentId(1)],
        };
        let value = serde_json::to_value(&bundle).unwrap();
        assert_eq!(value["previous_status"], "T");
        assert_eq!(value["status"], "TR");
        assert_eq!(value["closed_sessions"], json!([2]));
        assert!(value.get("chat").is_none());
    }
}
