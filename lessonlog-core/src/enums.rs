//! Enum types for LessonLog entities

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// ACTIVITY ACTION
// ============================================================================

/// Action recorded by an activity. The action of a user's latest activity on
/// a lesson is that lesson's effective status for the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityAction {
    Enroll,
    Start,
    Complete,
    Incomplete,
}

impl ActivityAction {
    /// All actions, in lifecycle order.
    pub const ALL: [ActivityAction; 4] = [
        ActivityAction::Enroll,
        ActivityAction::Start,
        ActivityAction::Complete,
        ActivityAction::Incomplete,
    ];

    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ActivityAction::Enroll => "enroll",
            ActivityAction::Start => "start",
            ActivityAction::Complete => "complete",
            ActivityAction::Incomplete => "incomplete",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, ValidationError> {
        match s.trim().to_lowercase().as_str() {
            "enroll" => Ok(ActivityAction::Enroll),
            "start" => Ok(ActivityAction::Start),
            "complete" => Ok(ActivityAction::Complete),
            "incomplete" => Ok(ActivityAction::Incomplete),
            _ => Err(ValidationError::UnknownAction {
                action: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

impl FromStr for ActivityAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

// ============================================================================
// REQUESTED ACTION
// ============================================================================

/// Transition a caller may request explicitly. Enrollment seeding is only
/// ever produced by the enrollment path, so `enroll` is not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestedAction {
    Start,
    Complete,
    Incomplete,
}

impl RequestedAction {
    pub fn as_db_str(&self) -> &'static str {
        ActivityAction::from(*self).as_db_str()
    }
}

impl From<RequestedAction> for ActivityAction {
    fn from(action: RequestedAction) -> Self {
        match action {
            RequestedAction::Start => ActivityAction::Start,
            RequestedAction::Complete => ActivityAction::Complete,
            RequestedAction::Incomplete => ActivityAction::Incomplete,
        }
    }
}

impl FromStr for RequestedAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match ActivityAction::from_db_str(s)? {
            ActivityAction::Start => Ok(RequestedAction::Start),
            ActivityAction::Complete => Ok(RequestedAction::Complete),
            ActivityAction::Incomplete => Ok(RequestedAction::Incomplete),
            ActivityAction::Enroll => Err(ValidationError::UnknownAction {
                action: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for RequestedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

// ============================================================================
// PROGRESS STATUS
// ============================================================================

/// Reporting status of a lesson for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Complete,
    InProgress,
    Pending,
}

impl ProgressStatus {
    /// Map an effective status to its reporting status.
    ///
    /// `complete` stays complete, `start` is in progress, and everything else
    /// (no history, `enroll`, `incomplete`) is pending.
    pub fn from_effective(last: Option<ActivityAction>) -> Self {
        match last {
            Some(ActivityAction::Complete) => ProgressStatus::Complete,
            Some(ActivityAction::Start) => ProgressStatus::InProgress,
            Some(ActivityAction::Enroll) | Some(ActivityAction::Incomplete) | None => {
                ProgressStatus::Pending
            }
        }
    }

    pub fn as_db_str(&self) -> &'static str {
        match self {
            ProgressStatus::Complete => "complete",
            ProgressStatus::InProgress => "in_progress",
            ProgressStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}
