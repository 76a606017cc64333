//! Command execution against a snapshot-backed store.

use crate::args::{Cli, Command};
use lessonlog_core::{EngineConfig, ErrorKind, LessonLogResult, StorageError};
use lessonlog_progress::ActivityService;
use lessonlog_storage::{MockStorage, StoreSnapshot};
use serde::Serialize;
use std::io::ErrorKind as IoErrorKind;
use std::path::Path;

/// Process exit code for an error kind.
pub fn exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Validation => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::Conflict => 4,
        ErrorKind::Internal => 1,
    }
}

/// Load the store from `path`; a missing file is an empty store.
pub fn load_store(path: &Path) -> LessonLogResult<MockStorage> {
    match std::fs::metadata(path) {
        Err(e) if e.kind() == IoErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No snapshot yet, starting empty");
            Ok(MockStorage::new())
        }
        Err(e) => Err(StorageError::SnapshotIo {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
        .into()),
        Ok(_) => MockStorage::from_snapshot(StoreSnapshot::read_json(path)?),
    }
}

fn to_json<T: Serialize>(value: &T) -> LessonLogResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| {
        StorageError::SnapshotInvalid {
            reason: e.to_string(),
        }
        .into()
    })
}

/// Run one command and return what to print on stdout.
pub fn execute(service: &ActivityService<MockStorage>, command: &Command) -> LessonLogResult<String> {
    let output = match command {
        Command::ProgressSummary { user_id, course_id } => service
            .compute_progress(*user_id, *course_id)?
            .summary_line(),
        Command::Progress { user_id, course_id } => {
            to_json(&service.compute_progress(*user_id, *course_id)?)?
        }
        Command::Courses => to_json(&service.reporter().list_courses()?)?,
        Command::UserCourses { user_id } => to_json(&service.reporter().user_courses(*user_id)?)?,
        Command::AddCourse { title } => {
            let course_id = service.store().course_insert(title)?;
            format!("Created course {}", course_id)
        }
        Command::AddLesson {
            course_id,
            order_number,
            title,
        } => {
            let lesson_id = service
                .store()
                .lesson_insert(*course_id, title, *order_number)?;
            format!("Created lesson {} in course {}", lesson_id, course_id)
        }
        Command::Enroll { course_id, user_id } => {
            let receipt = service.enroll(*course_id, *user_id)?;
            format!(
                "Enrolled user {} in course {} ({} lessons seeded)",
                user_id,
                course_id,
                receipt.activities.len()
            )
        }
        Command::Record {
            user_id,
            course_id,
            lesson_id,
            action,
            token,
        } => {
            let activity = service.record(*user_id, *course_id, *lesson_id, *action, token.clone())?;
            format!(
                "Recorded {} on lesson {} for user {} (token {})",
                activity.action, activity.lesson_id, activity.user_id, activity.token
            )
        }
        Command::Start { user_id, lesson_id } => {
            let activity = service.start(*user_id, *lesson_id)?;
            format!(
                "Recorded {} on lesson {} for user {} (token {})",
                activity.action, activity.lesson_id, activity.user_id, activity.token
            )
        }
        Command::Incomplete { user_id, lesson_id } => {
            let activity = service.incomplete(*user_id, *lesson_id)?;
            format!(
                "Recorded {} on lesson {} for user {} (token {})",
                activity.action, activity.lesson_id, activity.user_id, activity.token
            )
        }
    };
    Ok(output)
}

/// Load, execute, and persist if the command wrote anything.
pub fn run(cli: &Cli, config: EngineConfig) -> LessonLogResult<String> {
    let store = load_store(&cli.snapshot)?;
    let service = ActivityService::new(store, config)?;
    let output = execute(&service, &cli.command)?;
    if cli.command.is_mutating() {
        service.store().snapshot()?.write_json(&cli.snapshot)?;
    }
    Ok(output)
}
