//! Puzzle status catalog.
//!
//! Static configuration for the editorial pipeline: every status with its
//! label, emoji and rank, the blocker/transition table, and the resolver
//! that adjusts the table for a particular puzzle. Everything here is built
//! once per process and read-only afterwards.

mod blocker;
mod registry;
mod resolver;
mod status;
mod table;

pub use blocker::{Blocker, BlockerParseError};
pub use registry::{
    Phase, StatusInfo, StatusRegistry, StatusSummary, StatusView, PAST_TESTSOLVING_BOUNDARY,
    PAST_WRITING_BOUNDARY, TERMINAL_DONE, UNKNOWN_RANK,
};
pub use resolver::{TransitionContext, TransitionOption, TransitionResolver, SEND_TO_EDITORS_LABEL};
pub use status::{Status, StatusCode, StatusCodeError, CANONICAL_ORDER, MAX_CODE_LENGTH};
pub use table::{TableEntry, Transition, TransitionTable};

use std::sync::OnceLock;

static REGISTRY: OnceLock<StatusRegistry> = OnceLock::new();
static TABLE: OnceLock<TransitionTable> = OnceLock::new();

/// Process-wide status registry.
pub fn registry() -> &'static StatusRegistry {
    REGISTRY.get_or_init(StatusRegistry::new)
}

/// Process-wide transition table.
pub fn table() -> &'static TransitionTable {
    TABLE.get_or_init(TransitionTable::new)
}

/// Resolver over the process-wide table.
pub fn resolver() -> TransitionResolver<'static> {
    TransitionResolver::new(table())
}

/// Display info for a code.
pub fn get_state(code: &StatusCode) -> StatusView {
    registry().view(code)
}

/// All states in canonical order.
pub fn get_all_states() -> Vec<StatusSummary> {
    registry().all_states()
}

/// Legal transitions for a code in context, rendered for display.
pub fn get_legal_transitions(code: &StatusCode, ctx: &TransitionContext) -> Vec<TransitionOption> {
    resolver().options(registry(), code, ctx)
}

/// See [`StatusRegistry::has_passed_phase`].
pub fn has_passed_phase(code: &StatusCode, phase: Phase) -> bool {
    registry().has_passed_phase(code, phase)
}

/// See [`TransitionTable::blocker`].
pub fn get_blocker(code: &StatusCode) -> Blocker {
    table().blocker(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_globals_are_shared() {
        assert!(std::ptr::eq(registry(), registry()));
        assert!(std::ptr::eq(table(), table()));
    }

    #[test]
    fn test_dead_is_absorbing() {
        let dead = StatusCode::from(Status::Dead);
        assert_eq!(get_blocker(&dead), Blocker::Nobody);
        assert!(get_legal_transitions(&dead, &TransitionContext::default()).is_empty());
    }

    #[test]
    fn test_every_registered_status_resolves_without_panicking() {
        for summary in get_all_states() {
            let code = StatusCode::from(summary.value.as_str());
            assert!(code.is_known());
            let view = get_state(&code);
            assert!(view.rank >= 0);
            for ctx in [
                TransitionContext::default(),
                TransitionContext {
                    has_editors_assigned: true,
                },
            ] {
                for option in get_legal_transitions(&code, &ctx) {
                    assert!(StatusCode::from(option.status.as_str()).is_known());
                }
            }
        }
    }
}
