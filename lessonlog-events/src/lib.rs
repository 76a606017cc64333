//! LessonLog Events - Activity Log Trait and Views
//!
//! This crate defines the `EventLog` contract for the append-only activity log
//! and the pure views the progression rules evaluate. It provides the contract
//! without a storage implementation; `lessonlog-storage` supplies one.
//!
//! # Key Types
//!
//! - `ActivityDraft`: a transition the engine wants recorded, before the store
//!   assigns id, sequence and timestamp
//! - `LessonHistory`: one user's activities on one lesson, oldest first
//!
//! # Traits
//!
//! - `EventLog`: core log operations (append, token lookup, per-lesson history)
//! - `EventLogExt`: derived queries (latest, effective status, duplicate check)

mod draft;
mod history;
mod log;

pub use draft::ActivityDraft;
pub use history::LessonHistory;
pub use log::{EventLog, EventLogExt};

// Re-export core types for convenience
pub use lessonlog_core::{Activity, ActivityAction, IdempotencyToken, LessonId, Sequence, UserId};
