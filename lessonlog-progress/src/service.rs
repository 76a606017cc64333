//! Activity service: the entry point for every progression write.

use crate::{CourseProgressionGate, EnrollmentGuard, LessonStateMachine, ProgressReporter};
use lessonlog_core::{
    Activity, ActivityAction, Course, CourseId, EngineConfig, IdempotencyToken, Lesson, LessonId,
    LessonLogError, LessonLogResult, ProgressError, RequestedAction, StorageError, UserId,
};
use lessonlog_events::{ActivityDraft, EventLogExt};
use lessonlog_storage::{ChangeSet, CommitReceipt, CourseStore, HeadGuard};

/// Orchestrates lookups, guards, the state machine and the commit.
///
/// Every write operation commits through a single [`CourseStore::commit`]:
/// it either records everything it decided to record or nothing.
#[derive(Debug, Clone)]
pub struct ActivityService<S> {
    store: S,
    config: EngineConfig,
}

impl<S: CourseStore> ActivityService<S> {
    /// Create a service, rejecting an invalid configuration.
    pub fn new(store: S, config: EngineConfig) -> LessonLogResult<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn with_defaults(store: S) -> Self {
        Self {
            store,
            config: EngineConfig::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Read models over the same store.
    pub fn reporter(&self) -> ProgressReporter<'_, S> {
        ProgressReporter::new(&self.store, self.config.percent_precision)
    }

    // === Write Operations ===

    /// Record a caller-requested transition under the caller's token.
    pub fn record(
        &self,
        user_id: UserId,
        course_id: CourseId,
        lesson_id: LessonId,
        action: RequestedAction,
        token: IdempotencyToken,
    ) -> LessonLogResult<Activity> {
        let course = self
            .store
            .course_get(course_id)?
            .ok_or(ProgressError::CourseNotFound { course_id })?;
        EnrollmentGuard::require_enrolled(&course, user_id)?;
        let lesson = course
            .lesson(lesson_id)
            .ok_or(ProgressError::LessonNotFound {
                lesson_id,
                course_id,
            })?;

        let draft = ActivityDraft::new(user_id, lesson_id, action.into(), token);
        self.transition(&course, lesson, draft)
    }

    /// Mark a completed lesson incomplete under a generated token.
    pub fn incomplete(&self, user_id: UserId, lesson_id: LessonId) -> LessonLogResult<Activity> {
        self.record_generated(user_id, lesson_id, ActivityAction::Incomplete)
    }

    /// Start a lesson under a generated token.
    pub fn start(&self, user_id: UserId, lesson_id: LessonId) -> LessonLogResult<Activity> {
        self.record_generated(user_id, lesson_id, ActivityAction::Start)
    }

    /// Enroll a user in a course, seeding one `enroll` activity per lesson.
    ///
    /// Refused as a whole if the user already has history on any lesson.
    pub fn enroll(&self, course_id: CourseId, user_id: UserId) -> LessonLogResult<CommitReceipt> {
        let course = self
            .store
            .course_get(course_id)?
            .ok_or(ProgressError::CourseNotFound { course_id })?;
        let head = self.store.course_head(user_id, course_id)?;
        let mut changes = EnrollmentGuard::enrollment_changes(
            &self.store,
            &course,
            user_id,
            &self.config.generated_token_prefix,
        )
        .inspect_err(|err| {
            tracing::debug!(user_id = %user_id, course_id = %course_id, error = %err, "Enrollment rejected");
        })?;
        if self.config.optimistic_concurrency {
            changes = changes.guarded_by(HeadGuard {
                user_id,
                course_id,
                expected: head,
            });
        }

        let receipt = self.commit(changes)?;
        tracing::info!(
            user_id = %user_id,
            course_id = %course_id,
            lessons = receipt.activities.len(),
            "User enrolled"
        );
        Ok(receipt)
    }

    // === Internals ===

    fn record_generated(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
        action: ActivityAction,
    ) -> LessonLogResult<Activity> {
        let course = self
            .store
            .course_find_by_lesson(lesson_id)?
            .ok_or(ProgressError::CourseForLessonNotFound { lesson_id })?;
        EnrollmentGuard::require_enrolled(&course, user_id)?;
        let lesson = course
            .lesson(lesson_id)
            .ok_or(ProgressError::LessonNotFound {
                lesson_id,
                course_id: course.course_id,
            })?;

        let draft = ActivityDraft::generated(
            user_id,
            lesson_id,
            action,
            &self.config.generated_token_prefix,
        );
        self.transition(&course, lesson, draft)
    }

    fn transition(
        &self,
        course: &Course,
        lesson: &Lesson,
        draft: ActivityDraft,
    ) -> LessonLogResult<Activity> {
        let user_id = draft.user_id;

        // A reused token short-circuits before any state is evaluated.
        if let Err(err) = self.store.ensure_token_unused(&draft) {
            tracing::warn!(user_id = %user_id, token = %draft.token, error = %err, "Duplicate token");
            return Err(err);
        }

        // Observe the head before reading history so the guard covers both reads.
        let head = self.store.course_head(user_id, course.course_id)?;
        let last = self
            .store
            .lesson_history(lesson.lesson_id, user_id)?
            .effective_status();
        let missing = if draft.action == ActivityAction::Start {
            CourseProgressionGate::missing_prerequisites(
                &self.store,
                course,
                user_id,
                lesson.order_number,
            )?
        } else {
            Vec::new()
        };

        if let Err(err) =
            LessonStateMachine::transition(lesson.lesson_id, user_id, last, draft.action, &missing)
        {
            tracing::debug!(
                user_id = %user_id,
                lesson_id = %lesson.lesson_id,
                action = %draft.action,
                last = ?last,
                error = %err,
                "Transition rejected"
            );
            return Err(err.into());
        }

        let mut changes = ChangeSet::new().with_activity(draft);
        if self.config.optimistic_concurrency {
            changes = changes.guarded_by(HeadGuard {
                user_id,
                course_id: course.course_id,
                expected: head,
            });
        }

        let activity = self
            .commit(changes)?
            .activities
            .into_iter()
            .next()
            .ok_or_else(|| {
                LessonLogError::from(StorageError::InsertFailed {
                    entity: "activity",
                    reason: "commit returned no activity".to_string(),
                })
            })?;

        tracing::info!(
            user_id = %user_id,
            course_id = %course.course_id,
            lesson_id = %activity.lesson_id,
            action = %activity.action,
            sequence = activity.sequence,
            "Activity recorded"
        );
        Ok(activity)
    }

    fn commit(&self, changes: ChangeSet) -> LessonLogResult<CommitReceipt> {
        self.store.commit(changes).map_err(|err| {
            if let Some(
                conflict @ (ProgressError::DuplicateToken { .. }
                | ProgressError::ConcurrentModification { .. }
                | ProgressError::UserAlreadyEnrolled { .. }),
            ) = err.as_progress()
            {
                tracing::warn!(error = %conflict, "Commit rejected");
            }
            err
        })
    }
}
