//! JSON snapshots of the whole store.
//!
//! The CLI persists state between invocations by reading a snapshot, running
//! one command against a [`MockStorage`], and writing the snapshot back.

use crate::memory::StoreState;
use crate::MockStorage;
use lessonlog_core::{
    Activity, CourseId, Enrollment, EntityIdType, Lesson, LessonLogResult, StorageError,
    Timestamp,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// Course row without its lessons and enrollments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub course_id: CourseId,
    pub title: String,
    pub created_at: Timestamp,
}

/// Serializable copy of every record in a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub courses: Vec<CourseRecord>,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
    /// Activities in log order.
    #[serde(default)]
    pub activities: Vec<Activity>,
}

fn invalid(reason: String) -> StorageError {
    StorageError::SnapshotInvalid { reason }
}

impl StoreSnapshot {
    /// Read a snapshot file.
    pub fn read_json(path: &Path) -> LessonLogResult<Self> {
        let raw = fs::read_to_string(path).map_err(|e| StorageError::SnapshotIo {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let snapshot =
            serde_json::from_str(&raw).map_err(|e| invalid(format!("{}: {}", path.display(), e)))?;
        Ok(snapshot)
    }

    /// Write the snapshot through a temporary sibling file and rename it into
    /// place, so readers never see a half-written file.
    pub fn write_json(&self, path: &Path) -> LessonLogResult<()> {
        let io_err = |e: std::io::Error| StorageError::SnapshotIo {
            path: path.display().to_string(),
            reason: e.to_string(),
        };
        let body = serde_json::to_string_pretty(self).map_err(|e| invalid(e.to_string()))?;

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = Path::new(&tmp_name);

        fs::write(tmp_path, body).map_err(io_err)?;
        fs::rename(tmp_path, path).map_err(io_err)?;
        tracing::debug!(path = %path.display(), activities = self.activities.len(), "snapshot written");
        Ok(())
    }

    /// Check referential integrity and uniqueness before loading.
    fn validate(&self) -> Result<(), StorageError> {
        let mut course_ids = HashSet::new();
        for course in &self.courses {
            if !course_ids.insert(course.course_id) {
                return Err(invalid(format!("duplicate course id {}", course.course_id)));
            }
        }

        let mut lesson_courses = HashMap::new();
        let mut orders = HashSet::new();
        for lesson in &self.lessons {
            if !course_ids.contains(&lesson.course_id) {
                return Err(invalid(format!(
                    "lesson {} references unknown course {}",
                    lesson.lesson_id, lesson.course_id
                )));
            }
            if lesson_courses.insert(lesson.lesson_id, lesson.course_id).is_some() {
                return Err(invalid(format!("duplicate lesson id {}", lesson.lesson_id)));
            }
            if lesson.order_number == 0 || !orders.insert((lesson.course_id, lesson.order_number)) {
                return Err(invalid(format!(
                    "invalid order number {} in course {}",
                    lesson.order_number, lesson.course_id
                )));
            }
        }

        let mut enrollment_ids = HashSet::new();
        let mut enrolled = HashSet::new();
        for enrollment in &self.enrollments {
            if !enrollment_ids.insert(enrollment.enrollment_id) {
                return Err(invalid(format!(
                    "duplicate enrollment id {}",
                    enrollment.enrollment_id
                )));
            }
            if !course_ids.contains(&enrollment.course_id) {
                return Err(invalid(format!(
                    "enrollment {} references unknown course {}",
                    enrollment.enrollment_id, enrollment.course_id
                )));
            }
            if !enrolled.insert((enrollment.user_id, enrollment.course_id)) {
                return Err(invalid(format!(
                    "user {} enrolled twice in course {}",
                    enrollment.user_id, enrollment.course_id
                )));
            }
        }

        let mut activity_ids = HashSet::new();
        let mut tokens = HashSet::new();
        let mut last_sequence = 0;
        for activity in &self.activities {
            if !activity_ids.insert(activity.activity_id) {
                return Err(invalid(format!(
                    "duplicate activity id {}",
                    activity.activity_id
                )));
            }
            let course_id = lesson_courses.get(&activity.lesson_id).ok_or_else(|| {
                invalid(format!(
                    "activity {} references unknown lesson {}",
                    activity.activity_id, activity.lesson_id
                ))
            })?;
            if !enrolled.contains(&(activity.user_id, *course_id)) {
                return Err(invalid(format!(
                    "activity {} belongs to user {} who is not enrolled in course {}",
                    activity.activity_id, activity.user_id, course_id
                )));
            }
            if !tokens.insert(activity.token.clone()) {
                return Err(invalid(format!("token '{}' used twice", activity.token)));
            }
            if activity.sequence <= last_sequence {
                return Err(invalid(format!(
                    "activity {} breaks sequence order",
                    activity.activity_id
                )));
            }
            last_sequence = activity.sequence;
        }

        Ok(())
    }
}

impl MockStorage {
    /// Copy the whole store into a snapshot.
    pub fn snapshot(&self) -> LessonLogResult<StoreSnapshot> {
        let state = self.read_state()?;
        Ok(StoreSnapshot {
            courses: state.courses.values().cloned().collect(),
            lessons: state.lessons.values().cloned().collect(),
            enrollments: state.enrollments.clone(),
            activities: state.activities.clone(),
        })
    }

    /// Build a store from a snapshot, rejecting inconsistent data.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> LessonLogResult<Self> {
        snapshot.validate()?;

        let mut state = StoreState::default();
        for course in snapshot.courses {
            state.last_course_id = state.last_course_id.max(course.course_id.as_i64());
            state.courses.insert(course.course_id, course);
        }
        for lesson in snapshot.lessons {
            state.last_lesson_id = state.last_lesson_id.max(lesson.lesson_id.as_i64());
            state.lessons.insert(lesson.lesson_id, lesson);
        }
        for enrollment in snapshot.enrollments {
            state.last_enrollment_id = state
                .last_enrollment_id
                .max(enrollment.enrollment_id.as_i64());
            state.enrollments.push(enrollment);
        }
        for activity in snapshot.activities {
            state.last_activity_id = state.last_activity_id.max(activity.activity_id.as_i64());
            state.last_sequence = activity.sequence;
            state.last_occurred_at = Some(match state.last_occurred_at {
                Some(last) if last > activity.occurred_at => last,
                _ => activity.occurred_at,
            });
            state
                .token_index
                .insert(activity.token.clone(), state.activities.len());
            state.activities.push(activity);
        }

        Ok(MockStorage::from_state(state))
    }
}
