//! In-memory store used by tests, the CLI, and embedders without a database.

use crate::{ChangeSet, CommitReceipt, CourseRecord, CourseStore};
use chrono::Utc;
use lessonlog_core::{
    validate_order_number, validate_title, Activity, ActivityId, Course, CourseId, Enrollment,
    EnrollmentId, EntityIdType, IdempotencyToken, Lesson, LessonId, LessonLogError,
    LessonLogResult, ProgressError, Sequence, StorageError, Timestamp, UserId,
};
use lessonlog_events::{ActivityDraft, EventLog};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Everything the store holds, guarded by one lock so a commit sees and
/// writes a consistent state.
#[derive(Debug, Default)]
pub(crate) struct StoreState {
    pub(crate) courses: BTreeMap<CourseId, CourseRecord>,
    pub(crate) lessons: BTreeMap<LessonId, Lesson>,
    pub(crate) enrollments: Vec<Enrollment>,
    pub(crate) activities: Vec<Activity>,
    pub(crate) token_index: HashMap<IdempotencyToken, usize>,
    pub(crate) last_course_id: i64,
    pub(crate) last_lesson_id: i64,
    pub(crate) last_enrollment_id: i64,
    pub(crate) last_activity_id: i64,
    pub(crate) last_sequence: Sequence,
    pub(crate) last_occurred_at: Option<Timestamp>,
}

impl StoreState {
    fn course_aggregate(&self, record: &CourseRecord) -> Course {
        let mut lessons: Vec<Lesson> = self
            .lessons
            .values()
            .filter(|l| l.course_id == record.course_id)
            .cloned()
            .collect();
        lessons.sort_by_key(|l| (l.order_number, l.lesson_id));

        let enrollments = self
            .enrollments
            .iter()
            .filter(|e| e.course_id == record.course_id)
            .cloned()
            .collect();

        Course {
            course_id: record.course_id,
            title: record.title.clone(),
            created_at: record.created_at,
            lessons,
            enrollments,
        }
    }

    pub(crate) fn user_head(&self, user_id: UserId) -> Option<Sequence> {
        self.activities
            .iter()
            .filter(|a| a.user_id == user_id)
            .map(|a| a.sequence)
            .max()
    }

    /// Highest sequence among the user's activities on the course's lessons.
    pub(crate) fn course_head(&self, user_id: UserId, course_id: CourseId) -> Option<Sequence> {
        self.activities
            .iter()
            .filter(|a| a.user_id == user_id)
            .filter(|a| {
                self.lessons
                    .get(&a.lesson_id)
                    .is_some_and(|l| l.course_id == course_id)
            })
            .map(|a| a.sequence)
            .max()
    }

    fn is_enrolled(&self, user_id: UserId, course_id: CourseId) -> bool {
        self.enrollments
            .iter()
            .any(|e| e.user_id == user_id && e.course_id == course_id)
    }

    /// Validate a change set against the current state without writing.
    fn check(&self, changes: &ChangeSet) -> LessonLogResult<()> {
        let mut pending: HashMap<&IdempotencyToken, &ActivityDraft> = HashMap::new();
        for draft in &changes.activities {
            if let Some(&index) = self.token_index.get(&draft.token) {
                return Err(draft.duplicate_of(&self.activities[index]).into());
            }
            if let Some(earlier) = pending.insert(&draft.token, draft) {
                return Err(ProgressError::DuplicateToken {
                    token: draft.token.clone(),
                    replay: earlier.fingerprint() == draft.fingerprint(),
                }
                .into());
            }
        }

        if let Some(new) = changes.enrollment {
            if !self.courses.contains_key(&new.course_id) {
                return Err(ProgressError::CourseNotFound {
                    course_id: new.course_id,
                }
                .into());
            }
            if self.is_enrolled(new.user_id, new.course_id) {
                return Err(ProgressError::UserAlreadyEnrolled {
                    user_id: new.user_id,
                    course_id: new.course_id,
                }
                .into());
            }
        }

        if let Some(guard) = changes.head_guard {
            if self.course_head(guard.user_id, guard.course_id) != guard.expected {
                return Err(ProgressError::ConcurrentModification {
                    user_id: guard.user_id,
                    course_id: guard.course_id,
                }
                .into());
            }
        }

        for draft in &changes.activities {
            if !self.lessons.contains_key(&draft.lesson_id) {
                return Err(StorageError::InsertFailed {
                    entity: "activity",
                    reason: format!("lesson {} does not exist", draft.lesson_id),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Write a change set that already passed `check`.
    fn apply(&mut self, changes: ChangeSet) -> CommitReceipt {
        // Occurrence times never go backwards, even if the wall clock does.
        let now = Utc::now();
        let occurred_at = match self.last_occurred_at {
            Some(last) if last > now => last,
            _ => now,
        };

        let enrollment = changes.enrollment.map(|new| {
            self.last_enrollment_id += 1;
            let enrollment = Enrollment {
                enrollment_id: EnrollmentId::new(self.last_enrollment_id),
                user_id: new.user_id,
                course_id: new.course_id,
                enrolled_at: occurred_at,
            };
            self.enrollments.push(enrollment.clone());
            enrollment
        });

        let mut activities = Vec::with_capacity(changes.activities.len());
        for draft in changes.activities {
            self.last_activity_id += 1;
            self.last_sequence += 1;
            let activity = Activity {
                activity_id: ActivityId::new(self.last_activity_id),
                user_id: draft.user_id,
                lesson_id: draft.lesson_id,
                action: draft.action,
                fingerprint: draft.fingerprint(),
                token: draft.token,
                occurred_at,
                sequence: self.last_sequence,
            };
            self.token_index
                .insert(activity.token.clone(), self.activities.len());
            self.activities.push(activity.clone());
            activities.push(activity);
        }

        if !activities.is_empty() || enrollment.is_some() {
            self.last_occurred_at = Some(occurred_at);
        }

        CommitReceipt {
            enrollment,
            activities,
        }
    }
}

// ============================================================================
// MOCK STORAGE
// ============================================================================

/// In-memory storage implementing both [`CourseStore`] and [`EventLog`].
///
/// Clones share the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct MockStorage {
    state: Arc<RwLock<StoreState>>,
}

impl MockStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_state(state: StoreState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub(crate) fn read_state(&self) -> LessonLogResult<RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|_| LessonLogError::Storage(StorageError::LockPoisoned))
    }

    fn write_state(&self) -> LessonLogResult<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|_| LessonLogError::Storage(StorageError::LockPoisoned))
    }

    // === Catalog Seeding ===

    /// Add a course with no lessons.
    pub fn course_insert(&self, title: &str) -> LessonLogResult<CourseId> {
        validate_title("title", title)?;
        let mut state = self.write_state()?;
        state.last_course_id += 1;
        let course_id = CourseId::new(state.last_course_id);
        state.courses.insert(
            course_id,
            CourseRecord {
                course_id,
                title: title.to_string(),
                created_at: Utc::now(),
            },
        );
        tracing::debug!(course_id = %course_id, title, "course inserted");
        Ok(course_id)
    }

    /// Add a lesson to an existing course. Order numbers are unique per course.
    pub fn lesson_insert(
        &self,
        course_id: CourseId,
        title: &str,
        order_number: u32,
    ) -> LessonLogResult<LessonId> {
        validate_title("title", title)?;
        validate_order_number(order_number)?;
        let mut state = self.write_state()?;
        if !state.courses.contains_key(&course_id) {
            return Err(ProgressError::CourseNotFound { course_id }.into());
        }
        let taken = state
            .lessons
            .values()
            .any(|l| l.course_id == course_id && l.order_number == order_number);
        if taken {
            return Err(StorageError::InsertFailed {
                entity: "lesson",
                reason: format!(
                    "order number {} already used in course {}",
                    order_number, course_id
                ),
            }
            .into());
        }

        state.last_lesson_id += 1;
        let lesson_id = LessonId::new(state.last_lesson_id);
        state.lessons.insert(
            lesson_id,
            Lesson {
                lesson_id,
                course_id,
                title: title.to_string(),
                order_number,
            },
        );
        tracing::debug!(course_id = %course_id, lesson_id = %lesson_id, order_number, "lesson inserted");
        Ok(lesson_id)
    }

    // === Counts ===

    pub fn course_count(&self) -> LessonLogResult<usize> {
        Ok(self.read_state()?.courses.len())
    }

    pub fn enrollment_count(&self) -> LessonLogResult<usize> {
        Ok(self.read_state()?.enrollments.len())
    }

    pub fn activity_count(&self) -> LessonLogResult<usize> {
        Ok(self.read_state()?.activities.len())
    }

    /// Every stored activity in log order.
    pub fn activities(&self) -> LessonLogResult<Vec<Activity>> {
        Ok(self.read_state()?.activities.clone())
    }
}

impl CourseStore for MockStorage {
    fn course_get(&self, id: CourseId) -> LessonLogResult<Option<Course>> {
        let state = self.read_state()?;
        Ok(state
            .courses
            .get(&id)
            .map(|record| state.course_aggregate(record)))
    }

    fn course_find_by_lesson(&self, lesson_id: LessonId) -> LessonLogResult<Option<Course>> {
        let state = self.read_state()?;
        Ok(state
            .lessons
            .get(&lesson_id)
            .and_then(|lesson| state.courses.get(&lesson.course_id))
            .map(|record| state.course_aggregate(record)))
    }

    fn course_list(&self) -> LessonLogResult<Vec<Course>> {
        let state = self.read_state()?;
        Ok(state
            .courses
            .values()
            .map(|record| state.course_aggregate(record))
            .collect())
    }

    fn enrollments_for_user(&self, user_id: UserId) -> LessonLogResult<Vec<Enrollment>> {
        let state = self.read_state()?;
        Ok(state
            .enrollments
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    fn course_head(&self, user_id: UserId, course_id: CourseId) -> LessonLogResult<Option<Sequence>> {
        Ok(self.read_state()?.course_head(user_id, course_id))
    }

    fn commit(&self, changes: ChangeSet) -> LessonLogResult<CommitReceipt> {
        let mut state = self.write_state()?;
        state.check(&changes)?;
        let receipt = state.apply(changes);
        tracing::debug!(
            activities = receipt.activities.len(),
            enrollment = receipt.enrollment.is_some(),
            head = state.last_sequence,
            "change set committed"
        );
        Ok(receipt)
    }
}

impl EventLog for MockStorage {
    fn append(&self, draft: ActivityDraft) -> LessonLogResult<Activity> {
        let receipt = self.commit(ChangeSet::new().with_activity(draft))?;
        receipt.activities.into_iter().next().ok_or_else(|| {
            StorageError::InsertFailed {
                entity: "activity",
                reason: "commit returned no activity".to_string(),
            }
            .into()
        })
    }

    fn find_by_token(&self, token: &IdempotencyToken) -> LessonLogResult<Option<Activity>> {
        let state = self.read_state()?;
        Ok(state
            .token_index
            .get(token)
            .and_then(|&index| state.activities.get(index))
            .cloned())
    }

    fn history_for_user(
        &self,
        lesson_id: LessonId,
        user_id: UserId,
    ) -> LessonLogResult<Vec<Activity>> {
        let state = self.read_state()?;
        let mut history: Vec<Activity> = state
            .activities
            .iter()
            .filter(|a| a.lesson_id == lesson_id && a.user_id == user_id)
            .cloned()
            .collect();
        history.sort_by_key(Activity::recency_key);
        Ok(history)
    }

    fn user_head(&self, user_id: UserId) -> LessonLogResult<Option<Sequence>> {
        Ok(self.read_state()?.user_head(user_id))
    }
}

// ============================================================================
// TESTS
// ============================================================================
