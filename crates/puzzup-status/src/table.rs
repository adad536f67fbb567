//! Blocker and transition table
//!
//! For each status: who is responsible for moving it along, and the
//! transitions offered to them, in presentation order. Statuses without an
//! entry are leaves blocked on nobody.

use serde::Serialize;
use std::collections::HashMap;

use crate::blocker::Blocker;
use crate::status::{Status, StatusCode};

/// One outgoing edge: target status and the button label offered for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub target: Status,
    pub label: &'static str,
}

const fn to(target: Status, label: &'static str) -> Transition {
    Transition { target, label }
}

/// Table row for a status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableEntry {
    pub status: Status,
    pub blocker: Blocker,
    pub transitions: &'static [Transition],
}

const EDITORS_ASSIGNED_ANSWER_CONFIRMED: &str = "✅ Editors assigned 👍 Answer confirmed";
const EDITORS_ASSIGNED_NO_ANSWER: &str = "✅ Editors assigned 🤷🏽‍♀️ No answer yet";
const REQUEST_PRE_TESTSOLVE: &str = "📝 Request Editor Pre-testsolve";
const REQUEST_POSTPROD_APPROVAL: &str = "📝 Request approval after postprod";
const REQUEST_AUTHOR_REVISIONS: &str = "❌✏️ Request revisions from author/art";
const BLOCKED_ON_TECH: &str = "❌💻 Blocked on tech request";
const POSTPROD_RESUME: &str = "🏠 Postprodding can resume";
const READY_FOR_POSTPROD: &str = "📝 Mark as Ready for Postprod";
const REQUEST_FACTCHECK: &str = "⏩ Mark postprod as finished; request factcheck";
const SOLUTION_FINISHED: &str = "✅ Mark solution as finished; request postprod";
const MARK_DONE: &str = "⏩🎆 Mark as done! 🎆⏩";
const ART_CHECK: &str = "🎨 Needs art check";
const FINAL_DAY_FACTCHECK: &str = "📆 Needs final day factcheck";

/// The authored table, in authored order.
const BLOCKERS_AND_TRANSITIONS: &[TableEntry] = &[
    TableEntry {
        status: Status::InitialIdea,
        blocker: Blocker::Authors,
        transitions: &[
            to(Status::AwaitingEditor, "✅ Ready for an editor"),
            to(Status::Deferred, "⏸️  Mark deferred"),
            to(Status::Dead, "⏹️  Mark as dead"),
        ],
    },
    TableEntry {
        status: Status::AwaitingEditor,
        blocker: Blocker::EditorInChief,
        transitions: &[
            to(Status::AwaitingReview, EDITORS_ASSIGNED_ANSWER_CONFIRMED),
            to(Status::AwaitingReview, EDITORS_ASSIGNED_NO_ANSWER),
            to(Status::NeedsDiscussion, "🗣 Need to discuss with EICs"),
            to(Status::InitialIdea, "🔄 Puzzle needs more work"),
        ],
    },
    TableEntry {
        status: Status::NeedsDiscussion,
        blocker: Blocker::EditorInChief,
        transitions: &[
            to(Status::AwaitingReview, EDITORS_ASSIGNED_ANSWER_CONFIRMED),
            to(Status::AwaitingReview, EDITORS_ASSIGNED_NO_ANSWER),
            to(Status::InitialIdea, "🔄 Send back to author(s)"),
        ],
    },
    TableEntry {
        status: Status::WaitingForRound,
        blocker: Blocker::EditorInChief,
        transitions: &[
            to(Status::AwaitingReview, EDITORS_ASSIGNED_ANSWER_CONFIRMED),
            to(Status::AwaitingReview, EDITORS_ASSIGNED_NO_ANSWER),
            to(Status::InitialIdea, "🔄 Send back to author(s)"),
        ],
    },
    TableEntry {
        status: Status::AwaitingReview,
        blocker: Blocker::Editors,
        transitions: &[
            to(Status::AwaitingAnswer, "✅ Idea approved 🤷🏽‍♀️ need answer"),
            to(Status::Writing, "✅ Idea approved 👍 Answer assigned"),
            to(Status::Testsolving, "✏️ Ready to testsolve!"),
        ],
    },
    TableEntry {
        status: Status::AwaitingAnswer,
        blocker: Blocker::EditorInChief,
        transitions: &[to(Status::Writing, "✅ Mark as answer assigned")],
    },
    TableEntry {
        status: Status::Writing,
        blocker: Blocker::Authors,
        transitions: &[
            to(Status::AwaitingAnswer, "❌ Reject answer"),
            to(Status::AwaitingEditorPreTestsolve, REQUEST_PRE_TESTSOLVE),
        ],
    },
    TableEntry {
        status: Status::WritingFlexible,
        blocker: Blocker::Authors,
        transitions: &[
            to(Status::Writing, "✅ Mark as answer assigned"),
            to(Status::AwaitingEditorPreTestsolve, REQUEST_PRE_TESTSOLVE),
        ],
    },
    TableEntry {
        status: Status::AwaitingEditorPreTestsolve,
        blocker: Blocker::Editors,
        transitions: &[
            to(Status::Testsolving, "✅ Puzzle is ready to be testsolved"),
            to(Status::Revising, "❌ Request puzzle revision"),
            to(Status::NeedsSolutionSketch, "📝 Request Solution Sketch"),
        ],
    },
    TableEntry {
        status: Status::Testsolving,
        blocker: Blocker::Editors,
        transitions: &[
            to(
                Status::AwaitingTestsolveReview,
                "🧐 Testsolve done; author to review feedback",
            ),
            to(
                Status::Revising,
                "❌ Testsolve done; needs revision and more testsolving",
            ),
            to(
                Status::RevisingPostTestsolving,
                "⭕ Testsolve done; needs revision (but not testsolving)",
            ),
        ],
    },
    TableEntry {
        status: Status::AwaitingTestsolveReview,
        blocker: Blocker::Authors,
        transitions: &[
            to(
                Status::AwaitingEditorPreTestsolve,
                "🔄 Ready for editor pre-testsolve",
            ),
            to(Status::Revising, "❌ Needs revision (then more testsolving)"),
            to(
                Status::RevisingPostTestsolving,
                "⭕ Needs revision (but can skip testsolving)",
            ),
            to(
                Status::AwaitingApprovalPostTestsolving,
                "📝 Send to editors for approval",
            ),
            to(
                Status::NeedsSolution,
                "✅ Accept testsolve; request solution walkthru",
            ),
            to(
                Status::NeedsPostprod,
                "⏩ Accept testsolve and solution; request postprod",
            ),
        ],
    },
    TableEntry {
        status: Status::Revising,
        blocker: Blocker::Authors,
        transitions: &[
            to(Status::AwaitingEditorPreTestsolve, REQUEST_PRE_TESTSOLVE),
            to(Status::Testsolving, "⏩ Put into testsolving"),
            to(
                Status::AwaitingApprovalPostTestsolving,
                "⏭️  Request approval to skip testsolving",
            ),
        ],
    },
    TableEntry {
        status: Status::RevisingPostTestsolving,
        blocker: Blocker::Authors,
        transitions: &[
            to(
                Status::AwaitingApprovalPostTestsolving,
                "📝 Request approval for post-testsolving",
            ),
            to(Status::NeedsSolution, "⏩ Mark revision as done"),
        ],
    },
    TableEntry {
        status: Status::AwaitingApprovalPostTestsolving,
        blocker: Blocker::Editors,
        transitions: &[
            to(
                Status::RevisingPostTestsolving,
                "❌ Request puzzle revision (done with testsolving)",
            ),
            to(Status::Testsolving, "🔙 Return to testsolving"),
            to(Status::NeedsSolution, "✅ Accept revision; request solution"),
            to(
                Status::NeedsPostprod,
                "⏩ Accept revision and solution; request postprod",
            ),
        ],
    },
    TableEntry {
        status: Status::NeedsSolutionSketch,
        blocker: Blocker::Authors,
        transitions: &[to(Status::AwaitingEditorPreTestsolve, REQUEST_PRE_TESTSOLVE)],
    },
    TableEntry {
        status: Status::NeedsSolution,
        blocker: Blocker::Authors,
        transitions: &[
            to(
                Status::AwaitingSolutionAndHintsApproval,
                "📝 Request approval for solution and hints",
            ),
            to(Status::NeedsPostprod, SOLUTION_FINISHED),
        ],
    },
    TableEntry {
        status: Status::AwaitingSolutionAndHintsApproval,
        blocker: Blocker::Editors,
        transitions: &[
            to(Status::NeedsSolution, "❌ Request revisions to solution"),
            to(Status::NeedsPostprod, SOLUTION_FINISHED),
        ],
    },
    TableEntry {
        status: Status::NeedsPostprod,
        blocker: Blocker::Postprodders,
        transitions: &[
            to(Status::ActivelyPostprodding, "🏠 Postprodding has started"),
            to(Status::AwaitingPostprodApproval, REQUEST_POSTPROD_APPROVAL),
            to(Status::PostprodBlocked, REQUEST_AUTHOR_REVISIONS),
            to(Status::PostprodBlockedOnTech, BLOCKED_ON_TECH),
        ],
    },
    TableEntry {
        status: Status::ActivelyPostprodding,
        blocker: Blocker::Postprodders,
        transitions: &[
            to(Status::AwaitingPostprodApproval, REQUEST_POSTPROD_APPROVAL),
            to(Status::NeedsFactcheck, REQUEST_FACTCHECK),
            to(Status::PostprodBlocked, REQUEST_AUTHOR_REVISIONS),
            to(Status::PostprodBlockedOnTech, BLOCKED_ON_TECH),
        ],
    },
    TableEntry {
        status: Status::PostprodBlocked,
        blocker: Blocker::Authors,
        transitions: &[
            to(Status::ActivelyPostprodding, POSTPROD_RESUME),
            to(Status::NeedsPostprod, READY_FOR_POSTPROD),
            to(Status::PostprodBlockedOnTech, BLOCKED_ON_TECH),
            to(Status::AwaitingPostprodApproval, REQUEST_POSTPROD_APPROVAL),
        ],
    },
    TableEntry {
        status: Status::PostprodBlockedOnTech,
        blocker: Blocker::Postprodders,
        transitions: &[
            to(Status::ActivelyPostprodding, POSTPROD_RESUME),
            to(Status::NeedsPostprod, READY_FOR_POSTPROD),
            to(Status::PostprodBlocked, REQUEST_AUTHOR_REVISIONS),
            to(Status::AwaitingPostprodApproval, REQUEST_POSTPROD_APPROVAL),
        ],
    },
    TableEntry {
        status: Status::AwaitingPostprodApproval,
        blocker: Blocker::Authors,
        transitions: &[
            to(Status::ActivelyPostprodding, "❌ Request revisions to postprod"),
            to(Status::NeedsFactcheck, REQUEST_FACTCHECK),
        ],
    },
    TableEntry {
        status: Status::NeedsFactcheck,
        blocker: Blocker::Factcheckers,
        transitions: &[
            to(
                Status::Revising,
                "❌ Request large revisions (needs more testsolving)",
            ),
            to(
                Status::RevisingPostTestsolving,
                "❌ Request large revisions (doesn't need testsolving)",
            ),
            to(Status::NeedsFinalRevisions, "🟡 Needs minor revisions"),
            to(Status::NeedsArtCheck, ART_CHECK),
            to(Status::NeedsFinalDayFactcheck, FINAL_DAY_FACTCHECK),
            to(Status::Done, MARK_DONE),
        ],
    },
    TableEntry {
        status: Status::NeedsFinalRevisions,
        blocker: Blocker::Authors,
        transitions: &[
            to(
                Status::NeedsFactcheck,
                "📝 Request factcheck (for large revisions)",
            ),
            to(
                Status::NeedsCopyEdits,
                "✅ Request copy edits (for small revisions)",
            ),
        ],
    },
    TableEntry {
        status: Status::NeedsCopyEdits,
        blocker: Blocker::Factcheckers,
        transitions: &[
            to(Status::NeedsArtCheck, ART_CHECK),
            to(Status::NeedsFinalDayFactcheck, FINAL_DAY_FACTCHECK),
            to(Status::Done, MARK_DONE),
        ],
    },
    TableEntry {
        status: Status::NeedsFinalDayFactcheck,
        blocker: Blocker::Factcheckers,
        transitions: &[to(Status::Done, MARK_DONE)],
    },
    TableEntry {
        status: Status::Deferred,
        blocker: Blocker::Nobody,
        transitions: &[],
    },
];

/// Read-only blocker/transition map with derived role indexes.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    entries: &'static [TableEntry],
    index: HashMap<Status, usize>,
    blocked_on_editors: Vec<Status>,
    blocked_on_authors: Vec<Status>,
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionTable {
    /// Build the table and its role indexes.
    pub fn new() -> Self {
        let entries = BLOCKERS_AND_TRANSITIONS;
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.status, i))
            .collect();
        let blocked_on = |blocker: Blocker| -> Vec<Status> {
            entries
                .iter()
                .filter(|e| e.blocker == blocker)
                .map(|e| e.status)
                .collect()
        };
        Self {
            entries,
            index,
            blocked_on_editors: blocked_on(Blocker::Editors),
            blocked_on_authors: blocked_on(Blocker::Authors),
        }
    }

    /// The table row for a code, if the code has one.
    pub fn entry(&self, code: &StatusCode) -> Option<&TableEntry> {
        let status = code.status()?;
        self.index.get(&status).and_then(|&i| self.entries.get(i))
    }

    /// Whether the status has a row (including rows with no transitions).
    pub fn contains(&self, code: &StatusCode) -> bool {
        self.entry(code).is_some()
    }

    /// Responsible role; `Nobody` for leaves and unknown codes.
    pub fn blocker(&self, code: &StatusCode) -> Blocker {
        self.entry(code)
            .map(|e| e.blocker)
            .unwrap_or(Blocker::Nobody)
    }

    /// Base outgoing transitions, in presentation order.
    pub fn transitions(&self, code: &StatusCode) -> &'static [Transition] {
        self.entry(code).map(|e| e.transitions).unwrap_or(&[])
    }

    /// Rows in authored order.
    pub fn iter(&self) -> impl Iterator<Item = &TableEntry> {
        self.entries.iter()
    }

    /// Statuses whose blocker is `blocker`, in table order.
    pub fn statuses_blocked_on(&self, blocker: Blocker) -> Vec<Status> {
        match blocker {
            Blocker::Editors => self.blocked_on_editors.clone(),
            Blocker::Authors => self.blocked_on_authors.clone(),
            other => self
                .entries
                .iter()
                .filter(|e| e.blocker == other)
                .map(|e| e.status)
                .collect(),
        }
    }

    pub fn blocked_on_editors(&self) -> &[Status] {
        &self.blocked_on_editors
    }

    pub fn blocked_on_authors(&self) -> &[Status] {
        &self.blocked_on_authors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::CANONICAL_ORDER;
    use std::collections::HashSet;

    #[test]
    fn test_each_status_has_at_most_one_row() {
        let mut seen = HashSet::new();
        for entry in BLOCKERS_AND_TRANSITIONS {
            assert!(seen.insert(entry.status), "duplicate row {:?}", entry.status);
        }
    }

    #[test]
    fn test_targets_are_registered_statuses() {
        let table = TransitionTable::new();
        for entry in table.iter() {
            for t in entry.transitions {
                assert!(CANONICAL_ORDER.contains(&t.target));
                assert!(!t.label.is_empty());
            }
        }
    }

    #[test]
    fn test_leaves_are_blocked_on_nobody() {
        let table = TransitionTable::new();
        for status in [Status::Done, Status::Dead, Status::NeedsArtCheck] {
            let code = StatusCode::from(status);
            assert!(!table.contains(&code));
            assert_eq!(table.blocker(&code), Blocker::Nobody);
            assert!(table.transitions(&code).is_empty());
        }
    }

    #[test]
    fn test_deferred_is_absorbing_but_present() {
        let table = TransitionTable::new();
        let deferred = StatusCode::from(Status::Deferred);
        assert!(table.contains(&deferred));
        assert_eq!(table.blocker(&deferred), Blocker::Nobody);
        assert!(table.transitions(&deferred).is_empty());
    }

    #[test]
    fn test_unknown_code_is_a_leaf() {
        let table = TransitionTable::new();
        let stale = StatusCode::from("NH");
        assert_eq!(table.blocker(&stale), Blocker::Nobody);
        assert!(table.transitions(&stale).is_empty());
    }

    #[test]
    fn test_base_order_is_preserved() {
        let table = TransitionTable::new();
        let targets: Vec<Status> = table
            .transitions(&Status::InitialIdea.into())
            .iter()
            .map(|t| t.target)
            .collect();
        assert_eq!(
            targets,
            vec![Status::AwaitingEditor, Status::Deferred, Status::Dead]
        );
    }

    #[test]
    fn test_blocked_on_indexes() {
        let table = TransitionTable::new();
        assert_eq!(
            table.blocked_on_editors(),
            &[
                Status::AwaitingReview,
                Status::AwaitingEditorPreTestsolve,
                Status::Testsolving,
                Status::AwaitingApprovalPostTestsolving,
                Status::AwaitingSolutionAndHintsApproval,
            ]
        );
        assert!(table.blocked_on_authors().contains(&Status::InitialIdea));
        assert!(table.blocked_on_authors().contains(&Status::AwaitingPostprodApproval));
        assert!(!table.blocked_on_authors().contains(&Status::Testsolving));
        assert_eq!(
            table.statuses_blocked_on(Blocker::Factcheckers),
            vec![
                Status::NeedsFactcheck,
                Status::NeedsCopyEdits,
                Status::NeedsFinalDayFactcheck,
            ]
        );
        assert!(table.statuses_blocked_on(Blocker::TestsolveCoordinators).is_empty());
    }
}
