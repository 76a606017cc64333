//! Identity types for LessonLog entities

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Position of an activity in the log. Strictly increasing per store.
pub type Sequence = u64;

/// Maximum length of an idempotency token in bytes.
pub const MAX_TOKEN_LEN: usize = 255;

/// Common behaviour of the integer identifier newtypes.
pub trait EntityIdType: Copy + Eq + std::hash::Hash + fmt::Display {
    /// Entity name used in error messages.
    const ENTITY_NAME: &'static str;

    /// Wrap a raw identifier.
    fn new(raw: i64) -> Self;

    /// Unwrap to the raw identifier.
    fn as_i64(&self) -> i64;
}

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $name:ident, $entity:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl EntityIdType for $name {
            const ENTITY_NAME: &'static str = $entity;

            fn new(raw: i64) -> Self {
                Self(raw)
            }

            fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

define_entity_id!(
    /// Identifier of a course. Assigned by the store.
    CourseId,
    "Course"
);
define_entity_id!(
    /// Identifier of a lesson. Assigned by the store.
    LessonId,
    "Lesson"
);
define_entity_id!(
    /// Identifier of an enrollment row.
    EnrollmentId,
    "Enrollment"
);
define_entity_id!(
    /// Identifier of a stored activity.
    ActivityId,
    "Activity"
);

/// Identifier of a learner. Users live outside this system, so the id is
/// only checked for being positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct UserId(i64);

impl UserId {
    /// Validate and wrap a raw user id.
    pub fn new(raw: i64) -> Result<Self, ValidationError> {
        if raw <= 0 {
            return Err(ValidationError::InvalidValue {
                field: "user_id".to_string(),
                reason: format!("must be positive, got {}", raw),
            });
        }
        Ok(Self(raw))
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for UserId {
    type Error = ValidationError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<UserId> for i64 {
    fn from(id: UserId) -> i64 {
        id.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller-supplied (or generated) key that makes a transition request
/// idempotent. Unique across the whole log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdempotencyToken(String);

impl IdempotencyToken {
    /// Validate and wrap a token.
    ///
    /// Rejects blank tokens, tokens longer than [`MAX_TOKEN_LEN`] bytes, and
    /// tokens without a single ASCII alphanumeric character.
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "idempotency_token".to_string(),
            });
        }
        if raw.len() > MAX_TOKEN_LEN {
            return Err(ValidationError::InvalidValue {
                field: "idempotency_token".to_string(),
                reason: format!("cannot exceed {} bytes", MAX_TOKEN_LEN),
            });
        }
        if !raw.bytes().any(|b| b.is_ascii_alphanumeric()) {
            return Err(ValidationError::InvalidValue {
                field: "idempotency_token".to_string(),
                reason: "must contain at least one alphanumeric character".to_string(),
            });
        }
        Ok(Self(raw))
    }

    /// Generate a fresh token for internally initiated transitions.
    pub fn generate(prefix: &str) -> Self {
        Self(format!("{}{}", prefix, Uuid::now_v7()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for IdempotencyToken {
    type Error = ValidationError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<IdempotencyToken> for String {
    fn from(token: IdempotencyToken) -> String {
        token.0
    }
}

impl fmt::Display for IdempotencyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the hex SHA-256 fingerprint of a request's intent.
///
/// Two submissions with the same fingerprint describe the same transition, so
/// a token collision between them is a replay rather than a reused token.
pub fn compute_fingerprint(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0x1f]);
    }
    hex::encode(hasher.finalize())
}
