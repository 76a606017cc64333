//! LessonLog Storage - Storage Trait and In-Memory Implementation
//!
//! Defines the persistence boundary of the progression engine. Everything the
//! engine writes goes through a single [`CourseStore::commit`] call so a
//! transition is either fully recorded or not recorded at all.

mod changes;
mod memory;
mod snapshot;

pub use changes::{ChangeSet, CommitReceipt, HeadGuard, NewEnrollment};
pub use memory::MockStorage;
pub use snapshot::{CourseRecord, StoreSnapshot};

use lessonlog_core::{Course, CourseId, Enrollment, LessonId, LessonLogResult, Sequence, UserId};
use lessonlog_events::EventLog;

// ============================================================================
// STORAGE TRAIT
// ============================================================================

/// Storage trait for course aggregates and the activity log.
///
/// Implementations must enforce, inside `commit`, the constraints the engine
/// relies on for correctness: activity tokens are globally unique and there is
/// at most one enrollment per (user, course).
pub trait CourseStore: EventLog {
    // === Course Operations ===

    /// Load a course with its lessons (sorted by order number) and enrollments.
    fn course_get(&self, id: CourseId) -> LessonLogResult<Option<Course>>;

    /// Load the course that owns a lesson.
    fn course_find_by_lesson(&self, lesson_id: LessonId) -> LessonLogResult<Option<Course>>;

    /// All courses, in id order.
    fn course_list(&self) -> LessonLogResult<Vec<Course>>;

    // === Enrollment Operations ===

    /// Enrollments of a user across all courses.
    fn enrollments_for_user(&self, user_id: UserId) -> LessonLogResult<Vec<Enrollment>>;

    /// Highest sequence among a user's activities on the lessons of one
    /// course. This is what a [`HeadGuard`] is checked against, so writes by
    /// the same user in other courses never conflict with it.
    fn course_head(&self, user_id: UserId, course_id: CourseId) -> LessonLogResult<Option<Sequence>>;

    // === Write Boundary ===

    /// Atomically apply a change set.
    ///
    /// Checks run in order: activity token uniqueness (against the log and
    /// within the set), enrollment uniqueness, then the head guard. The first
    /// failing check is returned and nothing is written.
    fn commit(&self, changes: ChangeSet) -> LessonLogResult<CommitReceipt>;
}
