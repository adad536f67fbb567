//! Contextual transition resolution
//!
//! The base table is adjusted per puzzle: once editors are assigned, routing
//! back to the editor-assignment queue is pointless, and a fresh idea can go
//! straight to its editors.

use serde::{Deserialize, Serialize};

use crate::registry::StatusRegistry;
use crate::status::{Status, StatusCode};
use crate::table::{Transition, TransitionTable};

/// Label of the transition added for initial ideas with editors assigned.
pub const SEND_TO_EDITORS_LABEL: &str = "Send to editors for input";

/// The puzzle facts the resolver looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionContext {
    pub has_editors_assigned: bool,
}

/// A resolved menu entry with the target's display name filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOption {
    pub status: String,
    pub status_display: String,
    pub description: String,
}

/// Computes the effective transitions for a status in context.
#[derive(Debug, Clone, Copy)]
pub struct TransitionResolver<'a> {
    table: &'a TransitionTable,
}

impl<'a> TransitionResolver<'a> {
    pub fn new(table: &'a TransitionTable) -> Self {
        Self { table }
    }

    /// Effective transitions: additions first, then the base list in order,
    /// with exclusions applied to both.
    pub fn resolve(&self, code: &StatusCode, ctx: &TransitionContext) -> Vec<Transition> {
        if !self.table.contains(code) {
            return Vec::new();
        }

        let mut additions = Vec::new();
        let mut exclusions = Vec::new();
        if ctx.has_editors_assigned {
            exclusions.push(Status::AwaitingEditor);
            if code.is(Status::InitialIdea) {
                additions.push(Transition {
                    target: Status::AwaitingReview,
                    label: SEND_TO_EDITORS_LABEL,
                });
            }
        }

        additions
            .into_iter()
            .chain(self.table.transitions(code).iter().copied())
            .filter(|t| !exclusions.contains(&t.target))
            .collect()
    }

    /// Whether `target` appears in the resolved menu.
    pub fn is_offered(&self, code: &StatusCode, ctx: &TransitionContext, target: &StatusCode) -> bool {
        target
            .status()
            .map(|wanted| self.resolve(code, ctx).iter().any(|t| t.target == wanted))
            .unwrap_or(false)
    }

    /// Resolved menu rendered for display.
    pub fn options(
        &self,
        registry: &StatusRegistry,
        code: &StatusCode,
        ctx: &TransitionContext,
    ) -> Vec<TransitionOption> {
        self.resolve(code, ctx)
            .into_iter()
            .map(|t| TransitionOption {
                status: t.target.code().to_string(),
                status_display: registry.info(t.target).display_name.to_string(),
                description: t.label.to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::CANONICAL_ORDER;

    const NO_EDITORS: TransitionContext = TransitionContext {
        has_editors_assigned: false,
    };
    const WITH_EDITORS: TransitionContext = TransitionContext {
        has_editors_assigned: true,
    };

    #[test]
    fn test_initial_idea_without_editors_is_base_list() {
        let table = TransitionTable::new();
        let resolver = TransitionResolver::new(&table);
        let code = Status::InitialIdea.into();

        assert_eq!(resolver.resolve(&code, &NO_EDITORS), table.transitions(&code).to_vec());
    }

    #[test]
    fn test_initial_idea_with_editors_prepends_send_to_editors() {
        let table = TransitionTable::new();
        let resolver = TransitionResolver::new(&table);

        let menu = resolver.resolve(&Status::InitialIdea.into(), &WITH_EDITORS);
        assert_eq!(menu[0].target, Status::AwaitingReview);
        assert_eq!(menu[0].label, SEND_TO_EDITORS_LABEL);
        assert!(menu.iter().all(|t| t.target != Status::AwaitingEditor));

        let rest: Vec<Status> = menu[1..].iter().map(|t| t.target).collect();
        assert_eq!(rest, vec![Status::Deferred, Status::Dead]);
    }

    #[test]
    fn test_editor_assignment_target_excluded_everywhere() {
        let table = TransitionTable::new();
        let resolver = TransitionResolver::new(&table);
        for status in CANONICAL_ORDER {
            let menu = resolver.resolve(&status.into(), &WITH_EDITORS);
            assert!(menu.iter().all(|t| t.target != Status::AwaitingEditor));
        }
    }

    #[test]
    fn test_addition_only_for_initial_idea() {
        let table = TransitionTable::new();
        let resolver = TransitionResolver::new(&table);
        let menu = resolver.resolve(&Status::AwaitingEditor.into(), &WITH_EDITORS);
        assert_eq!(menu, table.transitions(&Status::AwaitingEditor.into()).to_vec());
    }

    #[test]
    fn test_leaves_and_unknown_codes_resolve_empty() {
        let table = TransitionTable::new();
        let resolver = TransitionResolver::new(&table);
        for ctx in [NO_EDITORS, WITH_EDITORS] {
            assert!(resolver.resolve(&Status::Dead.into(), &ctx).is_empty());
            assert!(resolver.resolve(&Status::Done.into(), &ctx).is_empty());
            assert!(resolver.resolve(&Status::Deferred.into(), &ctx).is_empty());
            assert!(resolver.resolve(&StatusCode::from("NH"), &ctx).is_empty());
        }
    }

    #[test]
    fn test_is_offered() {
        let table = TransitionTable::new();
        let resolver = TransitionResolver::new(&table);
        let testsolving = Status::Testsolving.into();
        assert!(resolver.is_offered(&testsolving, &NO_EDITORS, &Status::Revising.into()));
        assert!(!resolver.is_offered(&testsolving, &NO_EDITORS, &Status::Done.into()));
        assert!(!resolver.is_offered(&testsolving, &NO_EDITORS, &StatusCode::from("NH")));
    }

    #[test]
    fn test_options_carry_display_names() {
        let table = TransitionTable::new();
        let registry = StatusRegistry::new();
        let resolver = TransitionResolver::new(&table);

        let options = resolver.options(&registry, &Status::AwaitingAnswer.into(), &NO_EDITORS);
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].status, "W");
        assert_eq!(options[0].status_display, "Writing (Answer Assigned)");
        assert_eq!(options[0].description, "✅ Mark as answer assigned");
    }
}
