//! Workflow engine
//!
//! Applies status transitions to puzzles held in a [`WorkflowStore`] and
//! reports the side effects as an [`EffectBundle`].
//!
//! The engine is permissive: any syntactically valid target is accepted
//! whether or not the resolved menu offers it, and the audit comment is the
//! record of what happened. `workflow.strict_transitions` tightens this.

mod effects;
mod message;
mod plan;

pub use effects::{
    ChatUpdate, CommentOutcome, CreationOutcome, EffectBundle, NotificationDirective,
    NotificationKind, TestsolveOutcome,
};
pub use message::MessageTemplates;
pub use plan::{plan_transition, TransitionPlan};

use chrono::{DateTime, Utc};
use puzzup_status::{registry, resolver, table, Status, StatusCode, StatusCodeError, TransitionOption};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::{ConfigError, WorkflowSettings};
use crate::model::{NewComment, Puzzle, PuzzleId, Role, SessionId, User, CREATED_PUZZLE};
use crate::store::{StoreError, WorkflowStore};

/// Workflow errors
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid status code: {0}")]
    InvalidStatusCode(#[from] StatusCodeError),

    #[error("transition from {from} to {to} is not offered")]
    IllegalTransition { from: StatusCode, to: StatusCode },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Applies transitions against a store.
pub struct WorkflowEngine<S> {
    store: S,
    settings: WorkflowSettings,
    templates: MessageTemplates,
    clock: fn() -> DateTime<Utc>,
}

impl<S: WorkflowStore> WorkflowEngine<S> {
    pub fn new(store: S, settings: WorkflowSettings) -> Result<Self, ConfigError> {
        let templates = MessageTemplates::compile(&settings.messages)?;
        Ok(Self {
            store,
            settings,
            templates,
            clock: Utc::now,
        })
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    pub fn templates(&self) -> &MessageTemplates {
        &self.templates
    }

    /// The transition menu for a puzzle in its current state.
    pub fn legal_transitions(&self, puzzle: &Puzzle) -> Vec<TransitionOption> {
        let options = resolver().options(registry(), &puzzle.status, &puzzle.context());
        debug!(
            puzzle = %puzzle.id,
            status = %puzzle.status,
            options = options.len(),
            "resolved transition menu"
        );
        options
    }

    /// Parse a raw code from the web layer, then transition.
    pub fn attempt_transition_raw(
        &self,
        puzzle_id: PuzzleId,
        raw: &str,
        actor: &User,
    ) -> Result<EffectBundle, WorkflowError> {
        let target = StatusCode::parse(raw)?;
        self.attempt_transition(puzzle_id, &target, actor)
    }

    /// Move a puzzle to `target` on behalf of `actor`.
    ///
    /// Reselecting the current status keeps the timestamp and skips the
    /// coordinator blast, but still writes the audit comment and notifies
    /// subscribers.
    ///
    /// The puzzle is saved before the audit comment is appended. A store
    /// that needs both writes to land together must wrap the call in its
    /// own transaction.
    pub fn attempt_transition(
        &self,
        puzzle_id: PuzzleId,
        target: &StatusCode,
        actor: &User,
    ) -> Result<EffectBundle, WorkflowError> {
        let now = (self.clock)();
        let mut puzzle = self.store.puzzle(puzzle_id)?;
        let plan = plan_transition(registry(), &resolver(), &self.templates, &puzzle, target);

        if !plan.offered && plan.changes_status {
            if self.settings.workflow.strict_transitions {
                return Err(WorkflowError::IllegalTransition {
                    from: plan.from,
                    to: plan.target,
                });
            }
            warn!(
                puzzle = %puzzle.id,
                from = %plan.from,
                to = %plan.target,
                known = target.is_known(),
                actor = %actor.id,
                "accepting transition that is not on the menu"
            );
        }

        let status_changed = puzzle.set_status(target.clone(), now);

        let cleared_answers = if plan.clear_answers {
            std::mem::take(&mut puzzle.answers)
        } else {
            Vec::new()
        };

        let factcheck_created = plan.create_factcheck;
        if factcheck_created {
            puzzle.has_factcheck = true;
        }

        if status_changed || !cleared_answers.is_empty() || factcheck_created {
            self.store.save_puzzle(&puzzle)?;
        }
        if status_changed {
            info!(
                puzzle = %puzzle.id,
                from = %plan.from,
                to = %plan.target,
                actor = %actor.id,
                "puzzle status changed"
            );
        }

        let mut comments = vec![self.store.append_comment(
            NewComment::system(puzzle.id, actor.id, "").with_status_change(Some(target.clone())),
            now,
        )?];

        let mut closed_sessions = Vec::new();
        if plan.close_joinable_sessions {
            for session in self.store.joinable_sessions(puzzle.id)? {
                self.store.set_session_joinable(session.id, false)?;
                comments.push(self.store.append_comment(
                    NewComment::system(puzzle.id, actor.id, self.templates.session_closed())
                        .on_session(session.id),
                    now,
                )?);
                closed_sessions.push(session.id);
            }
        }

        let mut notifications = Vec::new();
        let title = puzzle.spoiler_free_title();
        let context = notification_context(&puzzle, actor, &plan.target_display);

        if plan.notify_coordinators {
            let coordinators = self.store.users_with_role(Role::TestsolveCoordinator)?;
            notifications.extend(NotificationDirective::for_users(
                NotificationKind::TestsolveCoordinators,
                &self.settings.notifications.testsolve_coordinator_template,
                format!("✏️✏️✏️ {} ({})", title, puzzle.id),
                &coordinators,
                None,
                context.clone(),
            ));
        }

        let subscribers = self.store.subscribers(target)?;
        notifications.extend(NotificationDirective::for_users(
            NotificationKind::StatusSubscription,
            self.settings.notifications.template_for(target.as_str()),
            format!("{} ➡ {}", title, plan.target_display),
            &subscribers,
            None,
            context,
        ));

        let chat = status_changed.then(|| ChatUpdate {
            category: plan.target_display.clone(),
            message: plan.message.clone(),
        });

        Ok(EffectBundle {
            puzzle_id: puzzle.id,
            previous_status: plan.from,
            status: plan.target,
            status_display: plan.target_display,
            status_changed,
            offered: plan.offered,
            message: plan.message,
            chat,
            notifications,
            close_joinable_sessions: plan.close_joinable_sessions,
            closed_sessions,
            cleared_answers,
            factcheck_created,
            comments,
        })
    }

    /// Post a user comment that may also change the status.
    ///
    /// A status code that does not parse, or that has no row in the
    /// transition table, is dropped and the comment is posted without it.
    pub fn comment_with_status(
        &self,
        puzzle_id: PuzzleId,
        actor: &User,
        content: &str,
        raw_status: Option<&str>,
    ) -> Result<CommentOutcome, WorkflowError> {
        let now = (self.clock)();
        let mut puzzle = self.store.puzzle(puzzle_id)?;

        let status_change = raw_status
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .and_then(|raw| match StatusCode::parse(raw) {
                Ok(code) if table().contains(&code) => Some(code),
                Ok(code) => {
                    warn!(puzzle = %puzzle.id, status = %code, "dropping status change with no table entry");
                    None
                }
                Err(e) => {
                    warn!(puzzle = %puzzle.id, error = %e, "dropping malformed status change");
                    None
                }
            });

        let mut chat = None;
        let mut status_changed = false;
        let mut factcheck_created = false;
        if let Some(code) = &status_change {
            status_changed = puzzle.set_status(code.clone(), now);
            if code.is(Status::NeedsFactcheck) && !puzzle.has_factcheck {
                puzzle.has_factcheck = true;
                factcheck_created = true;
            }
            if status_changed || factcheck_created {
                self.store.save_puzzle(&puzzle)?;
            }
            if status_changed {
                let display = registry().display_name(code).to_string();
                info!(puzzle = %puzzle.id, to = %code, actor = %actor.id, "status changed by comment");
                chat = Some(ChatUpdate {
                    message: self.templates.status_changed(&puzzle, code, &display),
                    category: display,
                });
            }
        }

        let comment = self.store.append_comment(
            NewComment::user(puzzle.id, actor.id, content).with_status_change(status_change.clone()),
            now,
        )?;

        let mut participants = Vec::new();
        for id in puzzle.participants() {
            match self.store.user(id) {
                Ok(user) => participants.push(user),
                Err(StoreError::UserNotFound(missing)) => {
                    warn!(puzzle = %puzzle.id, user = %missing, "skipping unknown participant");
                }
                Err(e) => return Err(e.into()),
            }
        }
        let notification = NotificationDirective::for_users(
            NotificationKind::NewComment,
            &self.settings.notifications.new_comment_template,
            format!("New comment on {}", puzzle.spoiler_free_title()),
            &participants,
            actor.email(),
            json!({
                "puzzle": puzzle_context(&puzzle),
                "author": actor.name(),
                "author_hat": actor.hat(),
                "author_role": puzzle.role_of(actor.id),
                "content": content,
                "is_system": false,
                "status_change": status_change.as_ref().map(|c| registry().display_name(c)),
            }),
        );

        Ok(CommentOutcome {
            comment,
            status_change,
            status_changed,
            factcheck_created,
            chat,
            notification,
        })
    }

    /// Record a correct answer from a testsolve session.
    ///
    /// A puzzle still in testsolving moves to testsolve review, and the
    /// session stops accepting new participants.
    pub fn complete_testsolve(
        &self,
        session_id: SessionId,
        guess: &str,
        actor: &User,
    ) -> Result<TestsolveOutcome, WorkflowError> {
        let now = (self.clock)();
        let session = self.store.session(session_id)?;
        let mut puzzle = self.store.puzzle(session.puzzle)?;

        let mut content = format!("Correct answer: {}.", guess);
        let mut chat = None;
        let mut status_changed = false;

        if puzzle.status.is(Status::Testsolving) {
            let review = StatusCode::from(Status::AwaitingTestsolveReview);
            let display = registry().display_name(&review).to_string();
            content.push_str(&format!(" Moving puzzle to {}.", display));
            puzzle.set_status(review, now);
            self.store.save_puzzle(&puzzle)?;
            status_changed = true;
            info!(puzzle = %puzzle.id, session = %session.id, "testsolve solved, awaiting review");
            chat = Some(ChatUpdate {
                message: format!(
                    "Testsolve completed with correct answer! Moving puzzle to **{}**.",
                    display
                ),
                category: display,
            });
        }

        let session_closed = session.joinable;
        if session_closed {
            content.push_str(" Automatically marking session as no longer joinable.");
            self.store.set_session_joinable(session.id, false)?;
        }

        let comment = self.store.append_comment(
            NewComment::system(puzzle.id, actor.id, content.clone()).on_session(session.id),
            now,
        )?;

        Ok(TestsolveOutcome {
            comment,
            content,
            status_changed,
            session_closed,
            chat,
        })
    }

    /// Audit a newly created puzzle and announce it.
    pub fn record_creation(
        &self,
        puzzle_id: PuzzleId,
        actor: &User,
    ) -> Result<CreationOutcome, WorkflowError> {
        let now = (self.clock)();
        let puzzle = self.store.puzzle(puzzle_id)?;
        if !puzzle.status.is_known() {
            warn!(puzzle = %puzzle.id, status = %puzzle.status, "new puzzle has unrecognized status");
        }

        let comment = self.store.append_comment(
            NewComment::system(puzzle.id, actor.id, CREATED_PUZZLE)
                .with_status_change(Some(Status::InitialIdea.into())),
            now,
        )?;

        let display = registry().display_name(&puzzle.status).to_string();
        Ok(CreationOutcome {
            comment,
            chat: ChatUpdate {
                message: self.templates.created(&puzzle, &display),
                category: display,
            },
        })
    }
}

fn puzzle_context(puzzle: &Puzzle) -> Value {
    json!({
        "id": puzzle.id,
        "title": puzzle.spoiler_free_title(),
        "status": puzzle.status,
        "postprod_url": puzzle.postprod_url(),
    })
}

fn notification_context(puzzle: &Puzzle, actor: &User, status_display: &str) -> Value {
    json!({
        "puzzle": puzzle_context(puzzle),
        "user": actor.name(),
        "status": status_display,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerId, TestsolveSession, UserId};
    use crate::store::{MemoryStore, PuzzleStore};
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 12, 18, 0, 0).unwrap()
    }

    fn created_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    fn setup(status: Status) -> (WorkflowEngine<MemoryStore>, User) {
        let store = MemoryStore::new();
        let actor = User::new(UserId(1), "eic").with_role(Role::EditorInChief);
        store.insert_user(actor.clone()).unwrap();
        store
            .insert_puzzle(Puzzle::new(PuzzleId(10), "Maze", created_at()).with_status(status))
            .unwrap();
        let engine = WorkflowEngine::new(store, WorkflowSettings::default())
            .unwrap()
            .with_clock(fixed_now);
        (engine, actor)
    }

    #[test]
    fn test_transition_updates_status_and_timestamp() {
        let (engine, actor) = setup(Status::Writing);
        let bundle = engine
            .attempt_transition(PuzzleId(10), &Status::AwaitingEditorPreTestsolve.into(), &actor)
            .unwrap();

        assert!(bundle.status_changed);
        assert_eq!(bundle.comments.len(), 1);
        let puzzle = engine.store().puzzle(PuzzleId(10)).unwrap();
        assert_eq!(puzzle.status, Status::AwaitingEditorPreTestsolve);
        assert_eq!(puzzle.status_changed_at, fixed_now());
    }

    #[test]
    fn test_reselect_keeps_timestamp() {
        let (engine, actor) = setup(Status::Writing);
        let bundle = engine
            .attempt_transition(PuzzleId(10), &Status::Writing.into(), &actor)
            .unwrap();

        assert!(!bundle.status_changed);
        assert!(bundle.chat.is_none());
        assert_eq!(bundle.comments.len(), 1);
        let puzzle = engine.store().puzzle(PuzzleId(10)).unwrap();
        assert_eq!(puzzle.status_changed_at, created_at());
    }

    #[test]
    fn test_strict_mode_rejects_out_of_menu() {
        let (engine, actor) = setup(Status::InitialIdea);
        let mut settings = WorkflowSettings::default();
        settings.workflow.strict_transitions = true;
        let engine = WorkflowEngine::new(engine.store().clone(), settings).unwrap();

        let err = engine
            .attempt_transition(PuzzleId(10), &Status::Done.into(), &actor)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::IllegalTransition { .. }));
        // nothing written
        assert!(engine.store().comments_for(PuzzleId(10)).unwrap().is_empty());
    }

    #[test]
    fn test_permissive_mode_accepts_out_of_menu() {
        let (engine, actor) = setup(Status::InitialIdea);
        let bundle = engine
            .attempt_transition(PuzzleId(10), &Status::Done.into(), &actor)
            .unwrap();
        assert!(!bundle.offered);
        assert!(bundle.status_changed);
    }

    #[test]
    fn test_raw_code_is_validated() {
        let (engine, actor) = setup(Status::InitialIdea);
        let err = engine
            .attempt_transition_raw(PuzzleId(10), "not a code", &actor)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidStatusCode(_)));
    }

    #[test]
    fn test_missing_puzzle_is_store_error() {
        let (engine, actor) = setup(Status::InitialIdea);
        let err = engine
            .attempt_transition(PuzzleId(99), &Status::Done.into(), &actor)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Store(StoreError::PuzzleNotFound(_))));
    }

    #[test]
    fn test_dead_clears_answers() {
        let (engine, actor) = setup(Status::Writing);
        let puzzle = engine
            .store()
            .puzzle(PuzzleId(10))
            .unwrap()
            .with_answers(vec![AnswerId(4), AnswerId(5)]);
        engine.store().save_puzzle(&puzzle).unwrap();

        let bundle = engine
            .attempt_transition(PuzzleId(10), &Status::Dead.into(), &actor)
            .unwrap();
        assert_eq!(bundle.cleared_answers, vec![AnswerId(4), AnswerId(5)]);
        assert!(engine.store().puzzle(PuzzleId(10)).unwrap().answers.is_empty());
    }

    #[test]
    fn test_comment_with_unknown_table_code_is_dropped() {
        let (engine, actor) = setup(Status::Writing);
        // Dead is a real state but has no table row
        let outcome = engine
            .comment_with_status(PuzzleId(10), &actor, "bye", Some("X"))
            .unwrap();
        assert_eq!(outcome.status_change, None);
        assert!(!outcome.status_changed);
        assert_eq!(engine.store().puzzle(PuzzleId(10)).unwrap().status, Status::Writing);
    }

    #[test]
    fn test_comment_with_table_code_changes_status() {
        let (engine, actor) = setup(Status::Writing);
        let outcome = engine
            .comment_with_status(PuzzleId(10), &actor, "ready", Some("AT"))
            .unwrap();
        assert!(outcome.status_changed);
        assert_eq!(outcome.status_change, Some(Status::AwaitingEditorPreTestsolve.into()));
        let chat = outcome.chat.unwrap();
        assert_eq!(chat.category, "Awaiting Editor Pre-testsolve");

        let comments = engine.store().comments_for(PuzzleId(10)).unwrap();
        assert_eq!(comments.len(), 1);
        assert!(!comments[0].is_system);
    }

    #[test]
    fn test_complete_testsolve_in_testsolving() {
        let (engine, actor) = setup(Status::Testsolving);
        engine
            .store()
            .insert_session(TestsolveSession {
                id: SessionId(3),
                puzzle: PuzzleId(10),
                joinable: true,
            })
            .unwrap();

        let outcome = engine.complete_testsolve(SessionId(3), "FOO", &actor).unwrap();
        assert_eq!(
            outcome.content,
            "Correct answer: FOO. Moving puzzle to Awaiting Testsolve Review. Automatically marking session as no longer joinable."
        );
        assert!(outcome.session_closed);
        assert_eq!(
            outcome.chat.unwrap().message,
            "Testsolve completed with correct answer! Moving puzzle to **Awaiting Testsolve Review**."
        );
        assert!(!engine.store().session(SessionId(3)).unwrap().joinable);
    }

    #[test]
    fn test_record_creation() {
        let (engine, actor) = setup(Status::InitialIdea);
        let outcome = engine.record_creation(PuzzleId(10), &actor).unwrap();
        assert_eq!(
            outcome.chat.message,
            "This puzzle has been created in status **Initial Idea**!"
        );
        let comments = engine.store().comments_for(PuzzleId(10)).unwrap();
        assert_eq!(comments[0].content, "Created puzzle");
        assert_eq!(comments[0].status_change, Some(Status::InitialIdea.into()));
    }
}
