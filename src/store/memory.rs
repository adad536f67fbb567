//! In-memory store.
//!
//! Backs the CLI simulator and the tests. Cheap to clone; clones share state.

use chrono::{DateTime, Utc};
use puzzup_status::StatusCode;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{CommentStore, PuzzleStore, StoreError, SubscriptionStore, UserDirectory};
use crate::model::{
    Comment, CommentId, NewComment, Puzzle, PuzzleId, Role, SessionId, TestsolveSession, User,
    UserId,
};

/// Thread-safe in-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    puzzles: BTreeMap<PuzzleId, Puzzle>,
    sessions: BTreeMap<SessionId, TestsolveSession>,
    users: BTreeMap<UserId, User>,
    /// Subscribed users by status code.
    subscriptions: HashMap<String, Vec<UserId>>,
    comments: Vec<Comment>,
    /// Counter for comment ids.
    comment_counter: u64,
}

fn poisoned() -> StoreError {
    StoreError::Backend("memory store lock poisoned".to_string())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>, StoreError> {
        self.inner.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>, StoreError> {
        self.inner.write().map_err(|_| poisoned())
    }

    pub fn insert_puzzle(&self, puzzle: Puzzle) -> Result<(), StoreError> {
        self.write()?.puzzles.insert(puzzle.id, puzzle);
        Ok(())
    }

    pub fn insert_user(&self, user: User) -> Result<(), StoreError> {
        self.write()?.users.insert(user.id, user);
        Ok(())
    }

    pub fn insert_session(&self, session: TestsolveSession) -> Result<(), StoreError> {
        self.write()?.sessions.insert(session.id, session);
        Ok(())
    }

    /// Subscribe a user to a status. Subscribing twice is a no-op.
    pub fn subscribe(&self, user: UserId, status: &StatusCode) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let subscribers = inner
            .subscriptions
            .entry(status.as_str().to_string())
            .or_default();
        if !subscribers.contains(&user) {
            subscribers.push(user);
        }
        Ok(())
    }

    /// All comments on a puzzle, oldest first.
    pub fn comments_for(&self, puzzle: PuzzleId) -> Result<Vec<Comment>, StoreError> {
        Ok(self
            .read()?
            .comments
            .iter()
            .filter(|c| c.puzzle == puzzle)
            .cloned()
            .collect())
    }

    pub fn sessions_for(&self, puzzle: PuzzleId) -> Result<Vec<TestsolveSession>, StoreError> {
        Ok(self
            .read()?
            .sessions
            .values()
            .filter(|s| s.puzzle == puzzle)
            .cloned()
            .collect())
    }
}

impl PuzzleStore for MemoryStore {
    fn puzzle(&self, id: PuzzleId) -> Result<Puzzle, StoreError> {
        self.read()?
            .puzzles
            .get(&id)
            .cloned()
            .ok_or(StoreError::PuzzleNotFound(id))
    }

    fn save_puzzle(&self, puzzle: &Puzzle) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        match inner.puzzles.get_mut(&puzzle.id) {
            Some(existing) => {
                *existing = puzzle.clone();
                Ok(())
            }
            None => Err(StoreError::PuzzleNotFound(puzzle.id)),
        }
    }

    fn session(&self, id: SessionId) -> Result<TestsolveSession, StoreError> {
        self.read()?
            .sessions
            .get(&id)
            .cloned()
            .ok_or(StoreError::SessionNotFound(id))
    }

    fn joinable_sessions(&self, puzzle: PuzzleId) -> Result<Vec<TestsolveSession>, StoreError> {
        Ok(self
            .read()?
            .sessions
            .values()
            .filter(|s| s.puzzle == puzzle && s.joinable)
            .cloned()
            .collect())
    }

    fn set_session_joinable(&self, id: SessionId, joinable: bool) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let session = inner
            .sessions
            .get_mut(&id)
            .ok_or(StoreError::SessionNotFound(id))?;
        session.joinable = joinable;
        Ok(())
    }
}

impl CommentStore for MemoryStore {
    fn append_comment(
        &self,
        comment: NewComment,
        at: DateTime<Utc>,
    ) -> Result<CommentId, StoreError> {
        let mut inner = self.write()?;
        inner.comment_counter += 1;
        let id = CommentId(inner.comment_counter);
        inner.comments.push(Comment {
            id,
            puzzle: comment.puzzle,
            author: comment.author,
            is_system: comment.is_system,
            testsolve_session: comment.testsolve_session,
            content: comment.content,
            status_change: comment.status_change,
            created_at: at,
        });
        Ok(id)
    }
}

impl SubscriptionStore for MemoryStore {
    fn subscribers(&self, status: &StatusCode) -> Result<Vec<User>, StoreError> {
        let inner = self.read()?;
        Ok(inner
            .subscriptions
            .get(status.as_str())
            .map(|ids| ids.iter().filter_map(|id| inner.users.get(id).cloned()).collect())
            .unwrap_or_default())
    }
}

impl UserDirectory for MemoryStore {
    fn user(&self, id: UserId) -> Result<User, StoreError> {
        self.read()?
            .users
            .get(&id)
            .cloned()
            .ok_or(StoreError::UserNotFound(id))
    }

    fn users_with_role(&self, role: Role) -> Result<Vec<User>, StoreError> {
        Ok(self
            .read()?
            .users
            .values()
            .filter(|u| match role {
                Role::EditorInChief => u.is_eic(),
                Role::Editor => u.is_editor(),
                Role::TestsolveCoordinator => u.is_testsolve_coordinator(),
                other => u.has_role(other),
            })
            .cloned()
            .collect())
    }
}
