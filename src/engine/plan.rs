//! Transition planning
//!
//! Decides what a transition request implies without touching any store.

use puzzup_status::{Status, StatusCode, StatusRegistry, TransitionResolver};
use serde::Serialize;

use super::MessageTemplates;
use crate::model::Puzzle;

/// Decisions for one transition request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionPlan {
    pub from: StatusCode,
    pub target: StatusCode,
    pub target_display: String,
    /// False when the target equals the current status.
    pub changes_status: bool,
    /// Target appears on the resolved menu.
    pub offered: bool,
    pub message: String,
    pub clear_answers: bool,
    pub create_factcheck: bool,
    pub close_joinable_sessions: bool,
    pub notify_coordinators: bool,
}

/// Plan moving `puzzle` to `target`.
///
/// Reselecting the current status still closes sessions and clears answers
/// where the target calls for it, but never re-announces testsolving.
pub fn plan_transition(
    registry: &StatusRegistry,
    resolver: &TransitionResolver<'_>,
    templates: &MessageTemplates,
    puzzle: &Puzzle,
    target: &StatusCode,
) -> TransitionPlan {
    let changes_status = puzzle.status != *target;
    let target_display = registry.display_name(target).to_string();
    let offered = resolver.is_offered(&puzzle.status, &puzzle.context(), target);
    let entering_testsolving = target.is(Status::Testsolving);

    TransitionPlan {
        from: puzzle.status.clone(),
        target: target.clone(),
        message: templates.status_changed(puzzle, target, &target_display),
        target_display,
        changes_status,
        offered,
        clear_answers: target.status().map(Status::clears_answers).unwrap_or(false),
        create_factcheck: target.is(Status::NeedsFactcheck) && !puzzle.has_factcheck,
        close_joinable_sessions: !entering_testsolving,
        notify_coordinators: changes_status && entering_testsolving,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MessageSettings;
    use crate::model::{AnswerId, PuzzleId, UserId};
    use chrono::Utc;
    use puzzup_status::{registry, resolver};

    fn plan(puzzle: &Puzzle, target: impl Into<StatusCode>) -> TransitionPlan {
        let templates = MessageTemplates::compile(&MessageSettings::default()).unwrap();
        plan_transition(registry(), &resolver(), &templates, puzzle, &target.into())
    }

    fn puzzle_in(status: Status) -> Puzzle {
        Puzzle::new(PuzzleId(1), "Maze", Utc::now()).with_status(status)
    }

    #[test]
    fn test_testsolving_to_review() {
        let p = plan(&puzzle_in(Status::Testsolving), Status::AwaitingTestsolveReview);
        assert!(p.changes_status);
        assert!(p.offered);
        assert!(p.close_joinable_sessions);
        assert!(!p.notify_coordinators);
        assert!(!p.clear_answers);
        assert_eq!(p.message, "This puzzle is now **Awaiting Testsolve Review**.");
    }

    #[test]
    fn test_entering_testsolving_notifies_coordinators() {
        let p = plan(&puzzle_in(Status::AwaitingEditorPreTestsolve), Status::Testsolving);
        assert!(p.notify_coordinators);
        assert!(!p.close_joinable_sessions);
    }

    #[test]
    fn test_reselecting_testsolving_is_quiet() {
        let p = plan(&puzzle_in(Status::Testsolving), Status::Testsolving);
        assert!(!p.changes_status);
        assert!(!p.notify_coordinators);
        assert!(!p.close_joinable_sessions);
    }

    #[test]
    fn test_dead_and_deferred_clear_answers() {
        let puzzle = puzzle_in(Status::Writing).with_answers(vec![AnswerId(1)]);
        assert!(plan(&puzzle, Status::Dead).clear_answers);
        assert!(plan(&puzzle, Status::Deferred).clear_answers);
        assert!(!plan(&puzzle, Status::Done).clear_answers);
    }

    #[test]
    fn test_out_of_menu_target_is_planned_but_not_offered() {
        let p = plan(&puzzle_in(Status::InitialIdea), Status::Done);
        assert!(!p.offered);
        assert!(p.changes_status);
    }

    #[test]
    fn test_unknown_target_uses_raw_code() {
        let p = plan(&puzzle_in(Status::Writing), StatusCode::from("Q9"));
        assert!(!p.offered);
        assert_eq!(p.target_display, "Q9");
        assert_eq!(p.message, "This puzzle is now **Q9**.");
        assert!(p.close_joinable_sessions);
    }

    #[test]
    fn test_factcheck_record_created_once() {
        let mut puzzle = puzzle_in(Status::AwaitingPostprodApproval).with_editors(vec![UserId(2)]);
        assert!(plan(&puzzle, Status::NeedsFactcheck).create_factcheck);
        puzzle.has_factcheck = true;
        assert!(!plan(&puzzle, Status::NeedsFactcheck).create_factcheck);
    }
}
