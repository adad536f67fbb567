//! Puzzup workflow - puzzle status engine
//!
//! Moves puzzles through the editorial pipeline, records every move in the
//! comment log, and tells the caller which emails and chat updates follow.
//! The static status catalog lives in the `puzzup-status` crate.

pub mod config;
pub mod engine;
pub mod model;
pub mod notify;
pub mod store;

pub use config::{EffectiveConfig, WorkflowSettings};
pub use engine::{EffectBundle, NotificationDirective, NotificationKind, WorkflowEngine, WorkflowError};
pub use model::{Puzzle, PuzzleId, User, UserId};
pub use notify::{dispatch, LogNotifier, Notifier};
pub use store::{MemoryStore, WorkflowStore};
