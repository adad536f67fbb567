//! Blocker roles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The party responsible for moving a puzzle out of its current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Blocker {
    EditorInChief,
    Editors,
    Authors,
    TestsolveCoordinators,
    Postprodders,
    Factcheckers,
    /// Terminal and frozen states.
    Nobody,
}

impl Blocker {
    pub const ALL: [Blocker; 7] = [
        Blocker::EditorInChief,
        Blocker::Editors,
        Blocker::Authors,
        Blocker::TestsolveCoordinators,
        Blocker::Postprodders,
        Blocker::Factcheckers,
        Blocker::Nobody,
    ];

    /// Machine name, matching the serialized form.
    pub const fn name(self) -> &'static str {
        match self {
            Blocker::EditorInChief => "editor_in_chief",
            Blocker::Editors => "editors",
            Blocker::Authors => "authors",
            Blocker::TestsolveCoordinators => "testsolve_coordinators",
            Blocker::Postprodders => "postprodders",
            Blocker::Factcheckers => "factcheckers",
            Blocker::Nobody => "nobody",
        }
    }

    /// Human-readable description shown next to a puzzle's status.
    pub const fn label(self) -> &'static str {
        match self {
            Blocker::EditorInChief => "editor-in-chief",
            Blocker::Editors => "editor(s)",
            Blocker::Authors => "the author(s)",
            Blocker::TestsolveCoordinators => "testsolve coordinators",
            Blocker::Postprodders => "postprodders",
            Blocker::Factcheckers => "factcheckers",
            Blocker::Nobody => "nobody",
        }
    }
}

impl fmt::Display for Blocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Input that names no blocker role
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown blocker role: {0}")]
pub struct BlockerParseError(pub String);

impl FromStr for Blocker {
    type Err = BlockerParseError;

    /// Accepts the snake_case name (`editors`) or the label (`editor(s)`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Blocker::ALL
            .iter()
            .copied()
            .find(|b| b.name() == wanted || b.label() == wanted)
            .ok_or_else(|| BlockerParseError(s.to_string()))
    }
}
