//! Command-line interface definition.

use clap::{Parser, Subcommand};
use lessonlog_core::{
    validate_order_number, CourseId, EntityIdType, IdempotencyToken, LessonId, RequestedAction,
    UserId, ValidationError,
};
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_SNAPSHOT: &str = "lessonlog.json";

/// Event-sourced course progression against a JSON snapshot
#[derive(Debug, Parser)]
#[command(name = "lessonlog", version)]
#[command(about = "Record lesson activity and report course progress", long_about = None)]
pub struct Cli {
    /// Snapshot file holding the store between invocations
    #[arg(
        long,
        short,
        global = true,
        env = "LESSONLOG_SNAPSHOT",
        default_value = DEFAULT_SNAPSHOT,
        value_name = "FILE"
    )]
    pub snapshot: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print completed/total (percent)
    ProgressSummary {
        #[arg(value_parser = parse_user)]
        user_id: UserId,
        #[arg(value_parser = parse_course)]
        course_id: CourseId,
    },

    /// Print per-lesson progress as JSON
    Progress {
        #[arg(value_parser = parse_user)]
        user_id: UserId,
        #[arg(value_parser = parse_course)]
        course_id: CourseId,
    },

    /// List courses as JSON
    Courses,

    /// List a user's courses as JSON
    UserCourses {
        #[arg(value_parser = parse_user)]
        user_id: UserId,
    },

    /// Create a course
    AddCourse { title: String },

    /// Add a lesson to a course
    AddLesson {
        #[arg(value_parser = parse_course)]
        course_id: CourseId,
        #[arg(value_parser = parse_order)]
        order_number: u32,
        title: String,
    },

    /// Enroll a user in a course
    Enroll {
        #[arg(value_parser = parse_course)]
        course_id: CourseId,
        #[arg(value_parser = parse_user)]
        user_id: UserId,
    },

    /// Record start, complete or incomplete under a caller token
    Record {
        #[arg(value_parser = parse_user)]
        user_id: UserId,
        #[arg(value_parser = parse_course)]
        course_id: CourseId,
        #[arg(value_parser = parse_lesson)]
        lesson_id: LessonId,
        #[arg(value_parser = parse_action)]
        action: RequestedAction,
        #[arg(value_parser = parse_token)]
        token: IdempotencyToken,
    },

    /// Start a lesson
    Start {
        #[arg(value_parser = parse_user)]
        user_id: UserId,
        #[arg(value_parser = parse_lesson)]
        lesson_id: LessonId,
    },

    /// Mark a completed lesson incomplete
    Incomplete {
        #[arg(value_parser = parse_user)]
        user_id: UserId,
        #[arg(value_parser = parse_lesson)]
        lesson_id: LessonId,
    },
}

impl Command {
    /// Whether the command writes to the store.
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            Command::ProgressSummary { .. }
                | Command::Progress { .. }
                | Command::Courses
                | Command::UserCourses { .. }
        )
    }
}

fn parse_id(field: &str, raw: &str) -> Result<i64, ValidationError> {
    let value: i64 = raw.trim().parse().map_err(|_| ValidationError::InvalidValue {
        field: field.to_string(),
        reason: format!("'{}' is not an integer", raw),
    })?;
    if value <= 0 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            reason: "must be positive".to_string(),
        });
    }
    Ok(value)
}

fn parse_user(raw: &str) -> Result<UserId, ValidationError> {
    UserId::new(parse_id("user_id", raw)?)
}

fn parse_course(raw: &str) -> Result<CourseId, ValidationError> {
    parse_id("course_id", raw).map(CourseId::new)
}

fn parse_lesson(raw: &str) -> Result<LessonId, ValidationError> {
    parse_id("lesson_id", raw).map(LessonId::new)
}

fn parse_order(raw: &str) -> Result<u32, ValidationError> {
    let order: u32 = raw.trim().parse().map_err(|_| ValidationError::InvalidValue {
        field: "order_number".to_string(),
        reason: format!("'{}' is not a positive integer", raw),
    })?;
    validate_order_number(order)?;
    Ok(order)
}

fn parse_action(raw: &str) -> Result<RequestedAction, ValidationError> {
    RequestedAction::from_str(raw)
}

fn parse_token(raw: &str) -> Result<IdempotencyToken, ValidationError> {
    IdempotencyToken::new(raw)
}
