//! Per-lesson view of one user's activities.

use lessonlog_core::{Activity, ActivityAction, LessonId, UserId};

/// One user's activities on one lesson, ordered oldest first by
/// `(occurred_at, sequence)`.
///
/// Status is never stored; it is recomputed from this slice every time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonHistory {
    lesson_id: LessonId,
    user_id: UserId,
    activities: Vec<Activity>,
}

impl LessonHistory {
    /// Build the history from any activities, keeping only the ones that
    /// belong to `(lesson_id, user_id)`.
    pub fn from_activities<I>(lesson_id: LessonId, user_id: UserId, activities: I) -> Self
    where
        I: IntoIterator<Item = Activity>,
    {
        let mut activities: Vec<Activity> = activities
            .into_iter()
            .filter(|a| a.lesson_id == lesson_id && a.user_id == user_id)
            .collect();
        activities.sort_by_key(Activity::recency_key);
        Self {
            lesson_id,
            user_id,
            activities,
        }
    }

    pub fn empty(lesson_id: LessonId, user_id: UserId) -> Self {
        Self {
            lesson_id,
            user_id,
            activities: Vec::new(),
        }
    }

    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// The activity with the greatest `(occurred_at, sequence)`.
    pub fn latest(&self) -> Option<&Activity> {
        self.activities.last()
    }

    /// Effective status: the action of the latest activity.
    pub fn effective_status(&self) -> Option<ActivityAction> {
        self.latest().map(|a| a.action)
    }

    /// Whether the user ever reached `complete` on this lesson, regardless of
    /// what happened afterwards.
    pub fn has_completed(&self) -> bool {
        self.activities
            .iter()
            .any(|a| a.action == ActivityAction::Complete)
    }
}
