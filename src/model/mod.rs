//! Entity model
//!
//! The slices of the puzzle database the workflow engine reads and writes.
//! Persistence itself lives behind the traits in [`crate::store`].

mod user;

pub use user::{PuzzleRole, Role, RoleSet, User};

use chrono::{DateTime, Utc};
use puzzup_status::{Status, StatusCode, StatusRegistry, TransitionContext};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Puzzle primary key
    PuzzleId
);
id_type!(
    /// User primary key
    UserId
);
id_type!(
    /// Testsolve session primary key
    SessionId
);
id_type!(
    /// Comment primary key
    CommentId
);
id_type!(
    /// Answer primary key
    AnswerId
);

/// A puzzle as seen by the workflow engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Puzzle {
    pub id: PuzzleId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codename: Option<String>,
    pub status: StatusCode,
    /// Last time `status` actually changed.
    pub status_changed_at: DateTime<Utc>,
    #[serde(default)]
    pub authors: Vec<UserId>,
    #[serde(default)]
    pub editors: Vec<UserId>,
    #[serde(default)]
    pub postprodders: Vec<UserId>,
    #[serde(default)]
    pub factcheckers: Vec<UserId>,
    #[serde(default)]
    pub answers: Vec<AnswerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postprod_url: Option<String>,
    #[serde(default)]
    pub has_factcheck: bool,
}

impl Puzzle {
    /// A new puzzle in the initial-idea state.
    pub fn new(id: PuzzleId, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            codename: None,
            status: Status::InitialIdea.into(),
            status_changed_at: now,
            authors: Vec::new(),
            editors: Vec::new(),
            postprodders: Vec::new(),
            factcheckers: Vec::new(),
            answers: Vec::new(),
            postprod_url: None,
            has_factcheck: false,
        }
    }

    pub fn with_status(mut self, status: impl Into<StatusCode>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_codename(mut self, codename: impl Into<String>) -> Self {
        self.codename = Some(codename.into());
        self
    }

    pub fn with_authors(mut self, authors: Vec<UserId>) -> Self {
        self.authors = authors;
        self
    }

    pub fn with_editors(mut self, editors: Vec<UserId>) -> Self {
        self.editors = editors;
        self
    }

    pub fn with_answers(mut self, answers: Vec<AnswerId>) -> Self {
        self.answers = answers;
        self
    }

    pub fn with_postprod_url(mut self, url: impl Into<String>) -> Self {
        self.postprod_url = Some(url.into());
        self
    }

    pub fn has_editors(&self) -> bool {
        !self.editors.is_empty()
    }

    /// Facts the transition resolver needs.
    pub fn context(&self) -> TransitionContext {
        TransitionContext {
            has_editors_assigned: self.has_editors(),
        }
    }

    /// Title safe to show to people not spoiled on the puzzle.
    pub fn spoiler_free_title(&self) -> String {
        match self.codename.as_deref().filter(|c| !c.is_empty()) {
            Some(codename) => format!("({})", codename),
            None => self.name.clone(),
        }
    }

    /// Postprod URL, if one exists and is non-empty.
    pub fn postprod_url(&self) -> Option<&str> {
        self.postprod_url.as_deref().filter(|u| !u.is_empty())
    }

    /// Set the status, bumping `status_changed_at` only on a real change.
    ///
    /// Returns whether the status changed.
    pub fn set_status(&mut self, status: StatusCode, now: DateTime<Utc>) -> bool {
        if self.status == status {
            return false;
        }
        self.status = status;
        self.status_changed_at = now;
        true
    }

    /// The user's role on this puzzle, checked author first.
    pub fn role_of(&self, user: UserId) -> Option<PuzzleRole> {
        if self.authors.contains(&user) {
            Some(PuzzleRole::Author)
        } else if self.editors.contains(&user) {
            Some(PuzzleRole::Editor)
        } else if self.postprodders.contains(&user) {
            Some(PuzzleRole::Postprodder)
        } else if self.factcheckers.contains(&user) {
            Some(PuzzleRole::Factchecker)
        } else {
            None
        }
    }

    /// Everyone attached to the puzzle, deduplicated, in role order.
    pub fn participants(&self) -> Vec<UserId> {
        let mut out: Vec<UserId> = Vec::new();
        for id in self
            .authors
            .iter()
            .chain(&self.editors)
            .chain(&self.factcheckers)
            .chain(&self.postprodders)
        {
            if !out.contains(id) {
                out.push(*id);
            }
        }
        out
    }
}

/// A testsolve session belonging to a puzzle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestsolveSession {
    pub id: SessionId,
    pub puzzle: PuzzleId,
    /// Still open for new participants.
    pub joinable: bool,
}

/// An append-only audit/comment record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub puzzle: PuzzleId,
    pub author: UserId,
    pub is_system: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testsolve_session: Option<SessionId>,
    pub content: String,
    /// Status recorded by this comment. History only, never a source of truth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_change: Option<StatusCode>,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// One-line description of what the author did, for activity listings.
    ///
    /// Moves into dead or deferred are not called out as status changes.
    pub fn last_action(&self, registry: &StatusRegistry) -> String {
        if let Some(session) = self.testsolve_session {
            if !self.is_system {
                return format!("Commented on testsolve session #{}", session);
            }
            if self.content.starts_with("Created") || self.content.starts_with("Joined") {
                return self.content.clone();
            }
            return format!("Participated in testsolve session #{}", session);
        }

        if let Some(code) = &self.status_change {
            if code.is(Status::InitialIdea) && self.content == CREATED_PUZZLE {
                return self.content.clone();
            }
            if !code.status().map(Status::clears_answers).unwrap_or(false) {
                return format!("Changed puzzle status to {}", registry.display_name(code));
            }
        }

        if self.is_system {
            "Updated puzzle".to_string()
        } else {
            "Commented on puzzle".to_string()
        }
    }
}

/// Content of the audit comment written when a puzzle is created.
pub const CREATED_PUZZLE: &str = "Created puzzle";

/// A comment to be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct NewComment {
    pub puzzle: PuzzleId,
    pub author: UserId,
    pub is_system: bool,
    pub testsolve_session: Option<SessionId>,
    pub content: String,
    pub status_change: Option<StatusCode>,
}

impl NewComment {
    /// A system-authored comment.
    pub fn system(puzzle: PuzzleId, author: UserId, content: impl Into<String>) -> Self {
        Self {
            puzzle,
            author,
            is_system: true,
            testsolve_session: None,
            content: content.into(),
            status_change: None,
        }
    }

    /// A comment written by a person.
    pub fn user(puzzle: PuzzleId, author: UserId, content: impl Into<String>) -> Self {
        Self {
            is_system: false,
            ..Self::system(puzzle, author, content)
        }
    }

    pub fn with_status_change(mut self, status: Option<StatusCode>) -> Self {
        self.status_change = status;
        self
    }

    pub fn on_session(mut self, session: SessionId) -> Self {
        self.testsolve_session = Some(session);
        self
    }
}
