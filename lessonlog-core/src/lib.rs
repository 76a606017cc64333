//! LessonLog Core - Entity Types
//!
//! Pure data structures shared by every other crate: identifiers, the action
//! vocabulary, catalog and log entities, the error taxonomy, and engine
//! configuration. No progression rules live here.

mod config;
mod entities;
mod enums;
mod error;
mod identity;

pub use config::{EngineConfig, MAX_PERCENT_PRECISION, MAX_TOKEN_PREFIX_LEN};
pub use entities::{
    validate_order_number, validate_title, Activity, Course, Enrollment, Lesson, MAX_TITLE_LEN,
};
pub use enums::{ActivityAction, ProgressStatus, RequestedAction};
pub use error::{
    ConfigError, ErrorKind, LessonLogError, LessonLogResult, ProgressError, StorageError,
    ValidationError,
};
pub use identity::{
    compute_fingerprint, ActivityId, CourseId, EnrollmentId, EntityIdType, IdempotencyToken,
    LessonId, Sequence, Timestamp, UserId, MAX_TOKEN_LEN,
};
