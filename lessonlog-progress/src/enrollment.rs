//! Enrollment checks and the enrollment fan-out.

use crate::LessonStateMachine;
use lessonlog_core::{
    ActivityAction, Course, Enrollment, LessonLogResult, ProgressError, UserId,
};
use lessonlog_events::{ActivityDraft, EventLog, EventLogExt};
use lessonlog_storage::ChangeSet;

#[derive(Debug, Clone, Copy, Default)]
pub struct EnrollmentGuard;

impl EnrollmentGuard {
    /// The user's enrollment in `course`, or `UserNotEnrolled`.
    pub fn require_enrolled(course: &Course, user_id: UserId) -> Result<&Enrollment, ProgressError> {
        course
            .enrollment_for(user_id)
            .ok_or(ProgressError::UserNotEnrolled {
                user_id,
                course_id: course.course_id,
            })
    }

    /// Changes that enroll the user: the enrollment itself plus one `enroll`
    /// activity per lesson currently in the course, each under a fresh token.
    ///
    /// Every lesson must accept `enroll` from the user's current status on
    /// it. If any lesson already has history the whole change set is refused
    /// with that lesson's error. Lessons added later get no seed activity.
    pub fn enrollment_changes<L>(
        log: &L,
        course: &Course,
        user_id: UserId,
        token_prefix: &str,
    ) -> LessonLogResult<ChangeSet>
    where
        L: EventLog + ?Sized,
    {
        if course.is_enrolled(user_id) {
            return Err(ProgressError::UserAlreadyEnrolled {
                user_id,
                course_id: course.course_id,
            }
            .into());
        }

        let mut changes = ChangeSet::new().with_enrollment(user_id, course.course_id);
        for lesson in &course.lessons {
            let last = log
                .lesson_history(lesson.lesson_id, user_id)?
                .effective_status();
            let action = LessonStateMachine::transition(
                lesson.lesson_id,
                user_id,
                last,
                ActivityAction::Enroll,
                &[],
            )?;
            changes = changes.with_activity(ActivityDraft::generated(
                user_id,
                lesson.lesson_id,
                action,
                token_prefix,
            ));
        }
        Ok(changes)
    }
}
