//! Read models derived from the activity log.

use crate::service::ActivityService;
use lessonlog_core::{
    Course, CourseId, LessonId, LessonLogResult, ProgressError, ProgressStatus, UserId,
};
use lessonlog_events::EventLogExt;
use lessonlog_storage::CourseStore;
use serde::Serialize;

/// Status of one lesson for one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonProgress {
    pub lesson_id: LessonId,
    pub title: String,
    pub order_number: u32,
    pub status: ProgressStatus,
}

/// A user's progress through a course.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseProgress {
    pub course_id: CourseId,
    pub user_id: UserId,
    pub completed: usize,
    pub total: usize,
    pub percent: f64,
    /// Ordered by order number.
    pub lessons: Vec<LessonProgress>,
}

impl CourseProgress {
    /// `"<completed>/<total> (<percent>%)"` with the percentage truncated.
    pub fn summary_line(&self) -> String {
        format!(
            "{}/{} ({}%)",
            self.completed,
            self.total,
            self.percent.trunc() as u64
        )
    }
}

/// Course listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseSummary {
    pub course_id: CourseId,
    pub title: String,
    pub total_lessons: usize,
}

impl From<&Course> for CourseSummary {
    fn from(course: &Course) -> Self {
        Self {
            course_id: course.course_id,
            title: course.title.clone(),
            total_lessons: course.lessons.len(),
        }
    }
}

/// Round `value` to `precision` decimal places, halves away from zero.
pub fn round_percent(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// Pure reads over a [`CourseStore`]. Never writes.
#[derive(Debug)]
pub struct ProgressReporter<'a, S: ?Sized> {
    store: &'a S,
    percent_precision: u32,
}

impl<'a, S: CourseStore + ?Sized> ProgressReporter<'a, S> {
    pub fn new(store: &'a S, percent_precision: u32) -> Self {
        Self {
            store,
            percent_precision,
        }
    }

    /// Per-lesson statuses and the completion ratio of a user in a course.
    ///
    /// Statuses come from each lesson's latest activity: `complete` is
    /// complete, `start` is in progress, anything else is pending.
    pub fn compute_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> LessonLogResult<CourseProgress> {
        let course = self
            .store
            .course_get(course_id)?
            .ok_or(ProgressError::CourseNotFound { course_id })?;

        let mut lessons = Vec::with_capacity(course.lessons.len());
        for lesson in &course.lessons {
            let last = self
                .store
                .lesson_history(lesson.lesson_id, user_id)?
                .effective_status();
            lessons.push(LessonProgress {
                lesson_id: lesson.lesson_id,
                title: lesson.title.clone(),
                order_number: lesson.order_number,
                status: ProgressStatus::from_effective(last),
            });
        }

        let total = lessons.len();
        let completed = lessons
            .iter()
            .filter(|l| l.status == ProgressStatus::Complete)
            .count();
        let percent = if total == 0 {
            0.0
        } else {
            round_percent(
                completed as f64 / total as f64 * 100.0,
                self.percent_precision,
            )
        };

        Ok(CourseProgress {
            course_id,
            user_id,
            completed,
            total,
            percent,
            lessons,
        })
    }

    /// Every course with its lesson count, ordered by title.
    pub fn list_courses(&self) -> LessonLogResult<Vec<CourseSummary>> {
        let courses = self.store.course_list()?;
        Ok(sorted_summaries(courses.iter()))
    }

    /// Courses the user is enrolled in, ordered by title.
    pub fn user_courses(&self, user_id: UserId) -> LessonLogResult<Vec<CourseSummary>> {
        let mut courses = Vec::new();
        for enrollment in self.store.enrollments_for_user(user_id)? {
            if let Some(course) = self.store.course_get(enrollment.course_id)? {
                courses.push(course);
            }
        }
        Ok(sorted_summaries(courses.iter()))
    }
}

fn sorted_summaries<'c>(courses: impl Iterator<Item = &'c Course>) -> Vec<CourseSummary> {
    let mut summaries: Vec<CourseSummary> = courses.map(CourseSummary::from).collect();
    summaries.sort_by(|a, b| a.title.cmp(&b.title).then(a.course_id.cmp(&b.course_id)));
    summaries
}

impl<S: CourseStore> ActivityService<S> {
    /// Shorthand for `self.reporter().compute_progress(..)`.
    pub fn compute_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> LessonLogResult<CourseProgress> {
        self.reporter().compute_progress(user_id, course_id)
    }
}
