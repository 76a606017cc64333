//! Change sets: the unit of work handed to the store.

use lessonlog_core::{Activity, CourseId, Enrollment, Sequence, UserId};
use lessonlog_events::ActivityDraft;

/// Enrollment to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewEnrollment {
    pub user_id: UserId,
    pub course_id: CourseId,
}

/// Optimistic-concurrency guard: the commit only succeeds if the user's head
/// within the course is still the one observed while the transition was
/// evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadGuard {
    pub user_id: UserId,
    /// Course whose lessons the head is taken over.
    pub course_id: CourseId,
    pub expected: Option<Sequence>,
}

/// Records to write in one atomic commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub enrollment: Option<NewEnrollment>,
    pub activities: Vec<ActivityDraft>,
    pub head_guard: Option<HeadGuard>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an enrollment as part of this commit.
    pub fn with_enrollment(mut self, user_id: UserId, course_id: CourseId) -> Self {
        self.enrollment = Some(NewEnrollment { user_id, course_id });
        self
    }

    /// Append an activity as part of this commit.
    pub fn with_activity(mut self, draft: ActivityDraft) -> Self {
        self.activities.push(draft);
        self
    }

    /// Guard the commit with the user's observed log head.
    pub fn guarded_by(mut self, guard: HeadGuard) -> Self {
        self.head_guard = Some(guard);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.enrollment.is_none() && self.activities.is_empty()
    }
}

/// What a successful commit wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReceipt {
    pub enrollment: Option<Enrollment>,
    pub activities: Vec<Activity>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use lessonlog_core::{ActivityAction, EntityIdType, IdempotencyToken, LessonId};

    #[test]
    fn test_builder_collects_records() {
        let user = UserId::new(7).unwrap();
        let course = CourseId::new(10);
        assert!(ChangeSet::new().is_empty());

        let changes = ChangeSet::new()
            .with_enrollment(user, course)
            .with_activity(ActivityDraft::new(
                user,
                LessonId::new(101),
                ActivityAction::Enroll,
                IdempotencyToken::new("e1").unwrap(),
            ))
            .guarded_by(HeadGuard {
                user_id: user,
                course_id: course,
                expected: None,
            });

        assert!(!changes.is_empty());
        assert_eq!(changes.activities.len(), 1);
        assert_eq!(
            changes.enrollment,
            Some(NewEnrollment {
                user_id: user,
                course_id: course
            })
        );
        assert!(changes.head_guard.is_some());
    }
}
