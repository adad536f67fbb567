//! Status registry
//!
//! Display name, emoji and rank for every status. Ranks are computed once
//! from `CANONICAL_ORDER` when the registry is built and cached per entry.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::status::{Status, StatusCode, CANONICAL_ORDER};

/// Rank reported for codes the registry does not know.
pub const UNKNOWN_RANK: i32 = -1;

/// Last non-absorbing pipeline state; nothing after it counts as "past" a phase.
pub const TERMINAL_DONE: Status = Status::Done;

/// Puzzles ranked after this have finished writing.
pub const PAST_WRITING_BOUNDARY: Status = Status::WritingFlexible;

/// Puzzles ranked after this have finished testsolving.
pub const PAST_TESTSOLVING_BOUNDARY: Status = Status::Revising;

/// Fixed phase boundaries used by dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Writing,
    Testsolving,
}

impl Phase {
    pub const fn boundary(self) -> Status {
        match self {
            Phase::Writing => PAST_WRITING_BOUNDARY,
            Phase::Testsolving => PAST_TESTSOLVING_BOUNDARY,
        }
    }
}

/// Registry entry for one status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusInfo {
    pub status: Status,
    pub display_name: &'static str,
    /// May be empty; not every status has a glyph.
    pub emoji: &'static str,
    pub rank: usize,
}

/// Display info for an arbitrary persisted code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusView {
    pub code: String,
    pub display_name: String,
    pub emoji: String,
    pub rank: i32,
}

/// Dropdown row: code, display name and emoji.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub value: String,
    pub display: String,
    pub emoji: String,
}

fn describe(status: Status) -> (&'static str, &'static str) {
    match status {
        Status::InitialIdea => ("Initial Idea", "🥚"),
        Status::AwaitingEditor => ("Awaiting Approval By EIC", "🎩"),
        Status::NeedsDiscussion => ("EICs are Discussing", "🗣"),
        Status::WaitingForRound => ("Waiting for Round to Open", "⏳"),
        Status::AwaitingReview => ("Awaiting Input By Editor(s)", "👒"),
        Status::AwaitingAnswer => ("Awaiting Answer", "🤷🏽‍♀️"),
        Status::Writing => ("Writing (Answer Assigned)", "✏️"),
        Status::WritingFlexible => ("Writing (Answer Flexible)", "✏️"),
        Status::AwaitingEditorPreTestsolve => ("Awaiting Editor Pre-testsolve", "⏳✅"),
        Status::Testsolving => ("Ready to be Testsolved", "💡"),
        Status::AwaitingTestsolveReview => ("Awaiting Testsolve Review", ""),
        Status::Revising => ("Revising (Needs Testsolving)", "✏️🔄"),
        Status::RevisingPostTestsolving => ("Revising (Done with Testsolving)", "✏️🔄"),
        Status::AwaitingApprovalPostTestsolving => {
            ("Awaiting Approval (Done with Testsolving)", "")
        }
        Status::NeedsSolutionSketch => ("Needs Solution Sketch", ""),
        Status::NeedsSolution => ("Needs Solution", ""),
        Status::AwaitingSolutionAndHintsApproval => ("Awaiting Solution and Hints Approval", ""),
        Status::NeedsPostprod => ("Ready for Postprodding", "🪵"),
        Status::ActivelyPostprodding => ("Actively Postprodding", "🏠"),
        Status::PostprodBlocked => ("Postproduction Blocked", "⚠️✏️"),
        Status::PostprodBlockedOnTech => ("Postproduction Blocked On Tech Request", "⚠️💻"),
        Status::AwaitingPostprodApproval => ("Awaiting Approval After Postprod", "🧐"),
        Status::NeedsFactcheck => ("Needs Factcheck", "📋"),
        Status::NeedsFinalRevisions => ("Needs Final Revisions", "🔬"),
        Status::NeedsCopyEdits => ("Needs Copy Edits", "📃"),
        Status::NeedsArtCheck => ("Needs Art Check", "🎨"),
        Status::NeedsFinalDayFactcheck => ("Needs Final Day Factcheck", "📆"),
        Status::Done => ("Done", "🏁"),
        Status::Deferred => ("Deferred", "💤"),
        Status::Dead => ("Dead", "💀"),
    }
}

/// Static catalog of statuses in canonical order.
#[derive(Debug, Clone)]
pub struct StatusRegistry {
    entries: Vec<StatusInfo>,
    index: HashMap<Status, usize>,
}

impl Default for StatusRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusRegistry {
    /// Build the registry from the canonical order.
    pub fn new() -> Self {
        let entries: Vec<StatusInfo> = CANONICAL_ORDER
            .iter()
            .enumerate()
            .map(|(rank, &status)| {
                let (display_name, emoji) = describe(status);
                StatusInfo {
                    status,
                    display_name,
                    emoji,
                    rank,
                }
            })
            .collect();
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, info)| (info.status, i))
            .collect();
        Self { entries, index }
    }

    /// Entry for a known status.
    pub fn info(&self, status: Status) -> &StatusInfo {
        // every variant is in CANONICAL_ORDER
        &self.entries[self.index[&status]]
    }

    fn lookup(&self, code: &StatusCode) -> Option<&StatusInfo> {
        code.status().map(|s| self.info(s))
    }

    /// Display info for a persisted code, with fallbacks for unknown codes.
    pub fn view(&self, code: &StatusCode) -> StatusView {
        StatusView {
            code: code.as_str().to_string(),
            display_name: self.display_name(code).to_string(),
            emoji: self.emoji(code).to_string(),
            rank: self.rank(code),
        }
    }

    /// Human-readable label; the raw code when unknown.
    pub fn display_name<'a>(&self, code: &'a StatusCode) -> &'a str {
        match code {
            StatusCode::Known(s) => describe(*s).0,
            StatusCode::Unknown(raw) => raw,
        }
    }

    /// Emoji glyph; empty when unknown.
    pub fn emoji(&self, code: &StatusCode) -> &'static str {
        self.lookup(code).map(|info| info.emoji).unwrap_or("")
    }

    /// Position in the canonical order, or `UNKNOWN_RANK`.
    pub fn rank(&self, code: &StatusCode) -> i32 {
        self.lookup(code)
            .and_then(|info| i32::try_from(info.rank).ok())
            .unwrap_or(UNKNOWN_RANK)
    }

    /// All statuses in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &StatusInfo> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dropdown data for every status, in canonical order.
    pub fn all_states(&self) -> Vec<StatusSummary> {
        self.entries
            .iter()
            .map(|info| StatusSummary {
                value: info.status.code().to_string(),
                display: info.display_name.to_string(),
                emoji: info.emoji.to_string(),
            })
            .collect()
    }

    /// Whether a puzzle in `code` has progressed past `phase`.
    ///
    /// Deferred and Dead rank after Done and therefore never count as past
    /// any phase.
    pub fn has_passed_phase(&self, code: &StatusCode, phase: Phase) -> bool {
        let rank = self.rank(code);
        let boundary = self.rank(&phase.boundary().into());
        let done = self.rank(&TERMINAL_DONE.into());
        rank > boundary && rank <= done
    }

    pub fn past_writing(&self, code: &StatusCode) -> bool {
        self.has_passed_phase(code, Phase::Writing)
    }

    pub fn past_testsolving(&self, code: &StatusCode) -> bool {
        self.has_passed_phase(code, Phase::Testsolving)
    }

    /// Stable sort by status rank; unknown codes sort first.
    pub fn sort_by_rank<T, F>(&self, items: &mut [T], status_of: F)
    where
        F: Fn(&T) -> &StatusCode,
    {
        items.sort_by_key(|item| self.rank(status_of(item)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> StatusCode {
        StatusCode::from(s)
    }

    #[test]
    fn test_ranks_follow_canonical_order() {
        let registry = StatusRegistry::new();
        assert_eq!(registry.len(), 30);
        for (i, info) in registry.iter().enumerate() {
            assert_eq!(info.rank, i);
            assert_eq!(registry.rank(&info.status.into()), i as i32);
        }
        assert_eq!(registry.rank(&code("II")), 0);
        assert_eq!(registry.rank(&code("X")), 29);
    }

    #[test]
    fn test_unknown_code_falls_back() {
        let registry = StatusRegistry::new();
        let stale = code("NH");

        assert_eq!(registry.display_name(&stale), "NH");
        assert_eq!(registry.emoji(&stale), "");
        assert_eq!(registry.rank(&stale), UNKNOWN_RANK);

        let view = registry.view(&stale);
        assert_eq!(view.code, "NH");
        assert_eq!(view.rank, -1);
    }

    #[test]
    fn test_display_and_emoji() {
        let registry = StatusRegistry::new();
        assert_eq!(registry.display_name(&code("T")), "Ready to be Testsolved");
        assert_eq!(registry.emoji(&code("T")), "💡");
        assert_eq!(registry.display_name(&code("AP")), "Awaiting Approval After Postprod");
        // no glyph assigned
        assert_eq!(registry.emoji(&code("TR")), "");
    }

    #[test]
    fn test_all_states_in_canonical_order() {
        let registry = StatusRegistry::new();
        let all = registry.all_states();
        assert_eq!(all.len(), 30);
        assert_eq!(all[0].value, "II");
        assert_eq!(all[0].display, "Initial Idea");
        assert_eq!(all[0].emoji, "🥚");
        assert_eq!(all[29].value, "X");
    }

    #[test]
    fn test_past_writing_boundaries() {
        let registry = StatusRegistry::new();
        assert!(!registry.past_writing(&code("II")));
        assert!(!registry.past_writing(&code("WF")));
        assert!(registry.past_writing(&code("AT")));
        assert!(registry.past_writing(&code("D")));
        assert!(!registry.past_writing(&code("DF")));
        assert!(!registry.past_writing(&code("X")));
        assert!(!registry.past_writing(&code("NH")));
    }

    #[test]
    fn test_past_testsolving_boundaries() {
        let registry = StatusRegistry::new();
        assert!(!registry.past_testsolving(&code("T")));
        assert!(!registry.past_testsolving(&code("R")));
        assert!(registry.past_testsolving(&code("RP")));
        assert!(registry.past_testsolving(&code("NK")));
        assert!(!registry.past_testsolving(&code("X")));
    }

    #[test]
    fn test_has_passed_phase_is_monotonic_up_to_done() {
        let registry = StatusRegistry::new();
        for phase in [Phase::Writing, Phase::Testsolving] {
            let boundary = registry.info(phase.boundary()).rank;
            let done = registry.info(TERMINAL_DONE).rank;
            for info in registry.iter() {
                let expected = info.rank > boundary && info.rank <= done;
                assert_eq!(
                    registry.has_passed_phase(&info.status.into(), phase),
                    expected,
                    "{:?} / {:?}",
                    info.status,
                    phase
                );
            }
        }
    }

    #[test]
    fn test_sort_by_rank() {
        let registry = StatusRegistry::new();
        let mut codes = vec![code("D"), code("NH"), code("T"), code("II")];
        registry.sort_by_rank(&mut codes, |c| c);
        let sorted: Vec<&str> = codes.iter().map(|c| c.as_str()).collect();
        assert_eq!(sorted, vec!["NH", "II", "T", "D"]);
    }
}
