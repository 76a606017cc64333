//! Per-lesson transition rules.
//!
//! The machine holds no state. Each call receives the effective status
//! derived from the log (the action of the user's latest activity on the
//! lesson) and either returns the action to record or the rule it breaks.
//!
//! | Requested    | Legal when last status is    | Records      |
//! |--------------|------------------------------|--------------|
//! | `enroll`     | none                         | `enroll`     |
//! | `start`      | `enroll`, `incomplete` + gate| `start`      |
//! | `complete`   | `start`, `incomplete`        | `complete`   |
//! | `incomplete` | `complete`                   | `incomplete` |

use lessonlog_core::{ActivityAction, LessonId, ProgressError, UserId};

/// Stateless Mealy machine over a lesson's effective status.
#[derive(Debug, Clone, Copy, Default)]
pub struct LessonStateMachine;

impl LessonStateMachine {
    /// Whether `action` is allowed from `last`, ignoring the progression gate.
    pub fn allows(last: Option<ActivityAction>, action: ActivityAction) -> bool {
        use ActivityAction::*;
        matches!(
            (action, last),
            (Enroll, None)
                | (Start, Some(Enroll | Incomplete))
                | (Complete, Some(Start | Incomplete))
                | (Incomplete, Some(Complete))
        )
    }

    /// Decide a transition.
    ///
    /// `missing` holds the order numbers of lower-ordered lessons the user has
    /// not completed; it only matters for `start`.
    pub fn transition(
        lesson_id: LessonId,
        user_id: UserId,
        last: Option<ActivityAction>,
        action: ActivityAction,
        missing: &[u32],
    ) -> Result<ActivityAction, ProgressError> {
        use ActivityAction::*;

        if Self::allows(last, action) {
            if action == Start && !missing.is_empty() {
                return Err(ProgressError::LessonNotStartable {
                    lesson_id,
                    user_id,
                    missing: missing.to_vec(),
                });
            }
            return Ok(action);
        }

        let err = match (action, last) {
            (Enroll, _) | (Start, Some(Start)) => {
                ProgressError::LessonAlreadyStarted { lesson_id, user_id }
            }
            (Start, _) => ProgressError::LessonNotStartable {
                lesson_id,
                user_id,
                missing: missing.to_vec(),
            },
            (Complete, Some(Complete)) => {
                ProgressError::LessonAlreadyCompleted { lesson_id, user_id }
            }
            (Complete, _) => ProgressError::LessonNotStarted { lesson_id, user_id },
            (Incomplete, Some(Incomplete)) => {
                ProgressError::LessonAlreadyIncompleted { lesson_id, user_id }
            }
            (Incomplete, _) => ProgressError::LessonNotCompleted { lesson_id, user_id },
        };
        Err(err)
    }
}
