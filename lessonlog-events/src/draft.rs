//! Activity drafts: transitions waiting to be written.

use lessonlog_core::{
    compute_fingerprint, Activity, ActivityAction, IdempotencyToken, LessonId, ProgressError,
    UserId,
};
use serde::{Deserialize, Serialize};

/// A transition the engine decided to record.
///
/// The store turns a draft into an [`Activity`] by assigning its id, log
/// sequence and occurrence time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDraft {
    pub user_id: UserId,
    pub lesson_id: LessonId,
    pub action: ActivityAction,
    pub token: IdempotencyToken,
}

impl ActivityDraft {
    pub fn new(
        user_id: UserId,
        lesson_id: LessonId,
        action: ActivityAction,
        token: IdempotencyToken,
    ) -> Self {
        Self {
            user_id,
            lesson_id,
            action,
            token,
        }
    }

    /// Draft carrying a freshly generated token.
    pub fn generated(
        user_id: UserId,
        lesson_id: LessonId,
        action: ActivityAction,
        token_prefix: &str,
    ) -> Self {
        Self::new(
            user_id,
            lesson_id,
            action,
            IdempotencyToken::generate(token_prefix),
        )
    }

    /// Hex SHA-256 over the draft's intent (user, lesson, action).
    pub fn fingerprint(&self) -> String {
        compute_fingerprint(&[
            &self.user_id.to_string(),
            &self.lesson_id.to_string(),
            self.action.as_db_str(),
        ])
    }

    /// Conflict raised when `existing` already holds this draft's token.
    pub fn duplicate_of(&self, existing: &Activity) -> ProgressError {
        ProgressError::DuplicateToken {
            token: self.token.clone(),
            replay: existing.fingerprint == self.fingerprint(),
        }
    }
}
