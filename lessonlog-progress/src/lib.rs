//! LessonLog Progress - Progression Rules and Orchestration
//!
//! Lesson status is never stored. Every decision re-derives it from the
//! user's activities on the lesson:
//!
//! - [`LessonStateMachine`] decides whether an action is legal from the
//!   current effective status.
//! - [`CourseProgressionGate`] blocks `start` until every lower-ordered
//!   lesson has been completed.
//! - [`EnrollmentGuard`] checks enrollment and builds the enrollment fan-out.
//! - [`ActivityService`] runs lookups, guards and the machine, then commits.
//! - [`ProgressReporter`] derives read models from the same log.

mod enrollment;
mod gate;
mod report;
mod service;
mod state_machine;

pub use enrollment::EnrollmentGuard;
pub use gate::CourseProgressionGate;
pub use report::{
    round_percent, CourseProgress, CourseSummary, LessonProgress, ProgressReporter,
};
pub use service::ActivityService;
pub use state_machine::LessonStateMachine;
