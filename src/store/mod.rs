//! Collaborator interfaces
//!
//! The engine reads and writes the entity store through these traits. The
//! backing store owns transactions; last write wins on concurrent updates.

mod memory;

pub use memory::MemoryStore;

use chrono::{DateTime, Utc};
use puzzup_status::StatusCode;

use crate::model::{
    CommentId, NewComment, Puzzle, PuzzleId, Role, SessionId, TestsolveSession, User, UserId,
};

/// Errors surfaced by a backing store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("puzzle {0} not found")]
    PuzzleNotFound(PuzzleId),

    #[error("testsolve session {0} not found")]
    SessionNotFound(SessionId),

    #[error("user {0} not found")]
    UserNotFound(UserId),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Puzzle records and their testsolve sessions.
pub trait PuzzleStore {
    fn puzzle(&self, id: PuzzleId) -> Result<Puzzle, StoreError>;

    /// Persist status, timestamp, answers and factcheck flag.
    fn save_puzzle(&self, puzzle: &Puzzle) -> Result<(), StoreError>;

    fn session(&self, id: SessionId) -> Result<TestsolveSession, StoreError>;

    /// Sessions of `puzzle` that are still joinable.
    fn joinable_sessions(&self, puzzle: PuzzleId) -> Result<Vec<TestsolveSession>, StoreError>;

    fn set_session_joinable(&self, id: SessionId, joinable: bool) -> Result<(), StoreError>;
}

/// Append-only comment log.
pub trait CommentStore {
    fn append_comment(
        &self,
        comment: NewComment,
        at: DateTime<Utc>,
    ) -> Result<CommentId, StoreError>;
}

/// Per-status email subscriptions.
pub trait SubscriptionStore {
    /// Users who asked to hear about any puzzle entering `status`.
    fn subscribers(&self, status: &StatusCode) -> Result<Vec<User>, StoreError>;
}

/// User lookup.
pub trait UserDirectory {
    fn user(&self, id: UserId) -> Result<User, StoreError>;

    fn users_with_role(&self, role: Role) -> Result<Vec<User>, StoreError>;
}

/// Everything the workflow engine needs from the outside world.
pub trait WorkflowStore: PuzzleStore + CommentStore + SubscriptionStore + UserDirectory {}

impl<T> WorkflowStore for T where T: PuzzleStore + CommentStore + SubscriptionStore + UserDirectory {}
