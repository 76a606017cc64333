//! Error types for LessonLog operations

use crate::{CourseId, IdempotencyToken, LessonId, UserId};
use thiserror::Error;

/// Coarse classification callers use to decide how to surface an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A referenced course, lesson or enrollment does not exist. Never retried.
    NotFound,
    /// The request contradicts the log (duplicate token, illegal transition,
    /// existing enrollment, lost race). Retry only with a new token.
    Conflict,
    /// Malformed input rejected before any log access.
    Validation,
    /// Storage or configuration failure.
    Internal,
}

/// Progression rule violations and lookup failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProgressError {
    #[error("Course with ID {course_id} not found")]
    CourseNotFound { course_id: CourseId },

    #[error("Course with lesson ID {lesson_id} not found")]
    CourseForLessonNotFound { lesson_id: LessonId },

    #[error("Lesson with ID {lesson_id} not found in course {course_id}")]
    LessonNotFound {
        lesson_id: LessonId,
        course_id: CourseId,
    },

    #[error("User with ID {user_id} not enrolled to the course with ID {course_id}")]
    UserNotEnrolled { user_id: UserId, course_id: CourseId },

    #[error("User with ID {user_id} is already enrolled in course with ID {course_id}")]
    UserAlreadyEnrolled { user_id: UserId, course_id: CourseId },

    #[error("Request with token '{token}' has already been processed (replay: {replay})")]
    DuplicateToken {
        token: IdempotencyToken,
        /// True when the stored activity describes the same transition.
        replay: bool,
    },

    #[error("Lesson with ID {lesson_id} has already been started by user with ID {user_id}")]
    LessonAlreadyStarted { lesson_id: LessonId, user_id: UserId },

    #[error("Lesson with ID {lesson_id} has already been completed by user with ID {user_id}")]
    LessonAlreadyCompleted { lesson_id: LessonId, user_id: UserId },

    #[error("Lesson with ID {lesson_id} has already been marked incomplete by user with ID {user_id}")]
    LessonAlreadyIncompleted { lesson_id: LessonId, user_id: UserId },

    #[error("Lesson with ID {lesson_id} has not been started by user with ID {user_id}")]
    LessonNotStarted { lesson_id: LessonId, user_id: UserId },

    #[error("Lesson with ID {lesson_id} has not been completed by user with ID {user_id}")]
    LessonNotCompleted { lesson_id: LessonId, user_id: UserId },

    #[error("Lesson with ID {lesson_id} is not startable yet for user with ID {user_id} (missing lessons: {missing:?})")]
    LessonNotStartable {
        lesson_id: LessonId,
        user_id: UserId,
        /// Order numbers of lower-ordered lessons not yet completed.
        missing: Vec<u32>,
    },

    #[error("Progress log for user {user_id} changed while evaluating course {course_id}")]
    ConcurrentModification { user_id: UserId, course_id: CourseId },
}

impl ProgressError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProgressError::CourseNotFound { .. }
            | ProgressError::CourseForLessonNotFound { .. }
            | ProgressError::LessonNotFound { .. }
            | ProgressError::UserNotEnrolled { .. } => ErrorKind::NotFound,
            ProgressError::UserAlreadyEnrolled { .. }
            | ProgressError::DuplicateToken { .. }
            | ProgressError::LessonAlreadyStarted { .. }
            | ProgressError::LessonAlreadyCompleted { .. }
            | ProgressError::LessonAlreadyIncompleted { .. }
            | ProgressError::LessonNotStarted { .. }
            | ProgressError::LessonNotCompleted { .. }
            | ProgressError::LessonNotStartable { .. }
            | ProgressError::ConcurrentModification { .. } => ErrorKind::Conflict,
        }
    }
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid action: {action}")]
    UnknownAction { action: String },
}

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Insert failed for {entity}: {reason}")]
    InsertFailed { entity: &'static str, reason: String },

    #[error("Snapshot I/O failed for {path}: {reason}")]
    SnapshotIo { path: String, reason: String },

    #[error("Snapshot is malformed: {reason}")]
    SnapshotInvalid { reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all LessonLog errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LessonLogError {
    #[error("Progress error: {0}")]
    Progress(#[from] ProgressError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl LessonLogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LessonLogError::Progress(e) => e.kind(),
            LessonLogError::Validation(_) => ErrorKind::Validation,
            LessonLogError::Storage(_) | LessonLogError::Config(_) => ErrorKind::Internal,
        }
    }

    /// The progression error inside, if this is one.
    pub fn as_progress(&self) -> Option<&ProgressError> {
        match self {
            LessonLogError::Progress(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type alias for LessonLog operations.
pub type LessonLogResult<T> = Result<T, LessonLogError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntityIdType;

    fn user(raw: i64) -> UserId {
        UserId::new(raw).unwrap()
    }

    #[test]
    fn test_not_enrolled_display() {
        let err = ProgressError::UserNotEnrolled {
            user_id: user(3),
            course_id: CourseId::new(1),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("User with ID 3"));
        assert!(msg.contains("course with ID 1"));
    }

    #[test]
    fn test_not_startable_lists_missing() {
        let err = ProgressError::LessonNotStartable {
            lesson_id: LessonId::new(103),
            user_id: user(7),
            missing: vec![1, 2],
        };
        let msg = format!("{}", err);
        assert!(msg.contains("not startable"));
        assert!(msg.contains("[1, 2]"));
    }

    #[test]
    fn test_progress_error_kinds() {
        assert_eq!(
            ProgressError::CourseNotFound {
                course_id: CourseId::new(1)
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ProgressError::DuplicateToken {
                token: IdempotencyToken::new("t1").unwrap(),
                replay: true,
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            ProgressError::ConcurrentModification {
                user_id: user(1),
                course_id: CourseId::new(1),
            }
            .kind(),
            ErrorKind::Conflict
        );
    }

    #[test]
    fn test_lessonlog_error_from_variants() {
        let progress = LessonLogError::from(ProgressError::CourseForLessonNotFound {
            lesson_id: LessonId::new(5),
        });
        assert!(matches!(progress, LessonLogError::Progress(_)));
        assert_eq!(progress.kind(), ErrorKind::NotFound);
        assert!(progress.as_progress().is_some());

        let validation = LessonLogError::from(ValidationError::UnknownAction {
            action: "finish".to_string(),
        });
        assert_eq!(validation.kind(), ErrorKind::Validation);
        assert!(validation.as_progress().is_none());

        let storage = LessonLogError::from(StorageError::LockPoisoned);
        assert_eq!(storage.kind(), ErrorKind::Internal);

        let config = LessonLogError::from(ConfigError::InvalidValue {
            field: "percent_precision".to_string(),
            value: "9".to_string(),
            reason: "too large".to_string(),
        });
        assert_eq!(config.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_storage_error_display_lock_poisoned() {
        let msg = format!("{}", StorageError::LockPoisoned);
        assert!(msg.contains("lock poisoned"));
    }
}
