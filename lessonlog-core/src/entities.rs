//! Core entity structures

use crate::{
    ActivityAction, ActivityId, CourseId, EnrollmentId, IdempotencyToken, LessonId, Sequence,
    Timestamp, UserId, ValidationError,
};
use serde::{Deserialize, Serialize};

/// Maximum length of a course or lesson title in bytes.
pub const MAX_TITLE_LEN: usize = 255;

/// Validate a catalog title.
pub fn validate_title(field: &str, title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: field.to_string(),
        });
    }
    if title.len() > MAX_TITLE_LEN {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            reason: format!("cannot exceed {} bytes", MAX_TITLE_LEN),
        });
    }
    Ok(())
}

/// Validate a lesson order number.
pub fn validate_order_number(order_number: u32) -> Result<(), ValidationError> {
    if order_number == 0 {
        return Err(ValidationError::InvalidValue {
            field: "order_number".to_string(),
            reason: "must be positive".to_string(),
        });
    }
    Ok(())
}

/// Course aggregate: the course row with the lessons and enrollments it owns.
///
/// Lessons are kept sorted by order number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub course_id: CourseId,
    pub title: String,
    pub created_at: Timestamp,
    pub lessons: Vec<Lesson>,
    pub enrollments: Vec<Enrollment>,
}

impl Course {
    /// Find a lesson of this course by id.
    pub fn lesson(&self, lesson_id: LessonId) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.lesson_id == lesson_id)
    }

    /// Find the lesson at a given order number.
    pub fn lesson_by_order(&self, order_number: u32) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.order_number == order_number)
    }

    /// The enrollment of a user, if any.
    pub fn enrollment_for(&self, user_id: UserId) -> Option<&Enrollment> {
        self.enrollments.iter().find(|e| e.user_id == user_id)
    }

    pub fn is_enrolled(&self, user_id: UserId) -> bool {
        self.enrollment_for(user_id).is_some()
    }

    pub fn lesson_ids(&self) -> Vec<LessonId> {
        self.lessons.iter().map(|l| l.lesson_id).collect()
    }
}

/// A lesson within a course. Holds its course by id only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub lesson_id: LessonId,
    pub course_id: CourseId,
    pub title: String,
    pub order_number: u32,
}

/// A user's enrollment in a course. At most one per (user, course).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub enrollment_id: EnrollmentId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub enrolled_at: Timestamp,
}

/// Immutable record of one user action on one lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub activity_id: ActivityId,
    pub user_id: UserId,
    pub lesson_id: LessonId,
    pub action: ActivityAction,
    pub token: IdempotencyToken,
    /// Hex SHA-256 over (user, lesson, action).
    pub fingerprint: String,
    pub occurred_at: Timestamp,
    pub sequence: Sequence,
}

impl Activity {
    /// Ordering key for "latest": occurrence time, then log sequence.
    pub fn recency_key(&self) -> (Timestamp, Sequence) {
        (self.occurred_at, self.sequence)
    }
}
