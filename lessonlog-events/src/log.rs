//! EventLog trait for the append-only activity log.

use crate::{ActivityDraft, LessonHistory};
use lessonlog_core::{Activity, IdempotencyToken, LessonId, LessonLogResult, Sequence, UserId};

/// Trait for activity log operations.
///
/// Implementations store activities permanently: there is no update or
/// delete. Tokens are unique across the whole log, not per lesson.
pub trait EventLog: Send + Sync {
    /// Append a single activity.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::DuplicateToken` if any stored activity already
    /// carries the draft's token. Nothing is written in that case.
    fn append(&self, draft: ActivityDraft) -> LessonLogResult<Activity>;

    /// Find the activity recorded under a token.
    fn find_by_token(&self, token: &IdempotencyToken) -> LessonLogResult<Option<Activity>>;

    /// All activities of a user on a lesson, oldest first.
    fn history_for_user(&self, lesson_id: LessonId, user_id: UserId)
        -> LessonLogResult<Vec<Activity>>;

    /// Highest sequence among all of a user's activities, across every lesson.
    ///
    /// Used as the optimistic-concurrency guard for a user's transitions.
    fn user_head(&self, user_id: UserId) -> LessonLogResult<Option<Sequence>>;
}

/// Extension trait for EventLog with derived queries.
///
/// Implementors get these methods for free by implementing `EventLog`.
pub trait EventLogExt: EventLog {
    /// Whether any activity carries this token.
    fn has_token(&self, token: &IdempotencyToken) -> LessonLogResult<bool> {
        Ok(self.find_by_token(token)?.is_some())
    }

    /// The user's history on a lesson as a [`LessonHistory`] view.
    fn lesson_history(&self, lesson_id: LessonId, user_id: UserId) -> LessonLogResult<LessonHistory> {
        let activities = self.history_for_user(lesson_id, user_id)?;
        Ok(LessonHistory::from_activities(lesson_id, user_id, activities))
    }

    /// The user's latest activity on a lesson, if any.
    fn latest_for_user(&self, lesson_id: LessonId, user_id: UserId) -> LessonLogResult<Option<Activity>> {
        Ok(self.lesson_history(lesson_id, user_id)?.latest().cloned())
    }

    /// Whether the user ever completed the lesson.
    fn has_completed(&self, lesson_id: LessonId, user_id: UserId) -> LessonLogResult<bool> {
        Ok(self.lesson_history(lesson_id, user_id)?.has_completed())
    }

    /// Fail with `DuplicateToken` if the draft's token is already taken.
    fn ensure_token_unused(&self, draft: &ActivityDraft) -> LessonLogResult<()> {
        match self.find_by_token(&draft.token)? {
            Some(existing) => Err(draft.duplicate_of(&existing).into()),
            None => Ok(()),
        }
    }
}

// Blanket implementation: any type implementing EventLog automatically gets EventLogExt
impl<T: EventLog + ?Sized> EventLogExt for T {}
