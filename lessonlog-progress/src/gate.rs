//! Ordering gate: a lesson can only be started once every lower-ordered
//! lesson of its course has been completed.

use lessonlog_core::{Course, LessonLogResult, UserId};
use lessonlog_events::{EventLog, EventLogExt};

#[derive(Debug, Clone, Copy, Default)]
pub struct CourseProgressionGate;

impl CourseProgressionGate {
    /// Order numbers below `order_number` whose lesson the user never
    /// completed, ascending.
    ///
    /// A completion counts even if the lesson was later marked incomplete.
    /// An order number with no lesson behind it is always reported, so a gap
    /// in the numbering blocks every later lesson.
    pub fn missing_prerequisites<L>(
        log: &L,
        course: &Course,
        user_id: UserId,
        order_number: u32,
    ) -> LessonLogResult<Vec<u32>>
    where
        L: EventLog + ?Sized,
    {
        let mut missing = Vec::new();
        for order in 1..order_number {
            let completed = match course.lesson_by_order(order) {
                Some(lesson) => log.has_completed(lesson.lesson_id, user_id)?,
                None => false,
            };
            if !completed {
                missing.push(order);
            }
        }
        Ok(missing)
    }

    /// Whether the lesson at `order_number` may be started.
    pub fn passes<L>(
        log: &L,
        course: &Course,
        user_id: UserId,
        order_number: u32,
    ) -> LessonLogResult<bool>
    where
        L: EventLog + ?Sized,
    {
        Ok(Self::missing_prerequisites(log, course, user_id, order_number)?.is_empty())
    }
}
