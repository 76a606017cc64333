//! End-to-end progression scenarios against the in-memory store.

use lessonlog_core::{ActivityAction, EngineConfig, ErrorKind, ProgressError, ProgressStatus, RequestedAction};
use lessonlog_events::{ActivityDraft, EventLog, EventLogExt};
use lessonlog_progress::ActivityService;
use lessonlog_storage::{CourseStore, MockStorage};
use lessonlog_test_utils::assertions::*;
use lessonlog_test_utils::fixtures::{self, token, user, SeededCourse};
use lessonlog_test_utils::{CourseId, EntityIdType, LessonId};

fn service(seeded: &SeededCourse) -> ActivityService<MockStorage> {
    ActivityService::with_defaults(seeded.storage.clone())
}

fn enrolled_rust_basics() -> (SeededCourse, ActivityService<MockStorage>) {
    let seeded = fixtures::rust_basics();
    let service = service(&seeded);
    service.enroll(seeded.course_id, user(7)).unwrap();
    (seeded, service)
}

#[test]
fn test_enroll_start_complete_scenario() {
    let (seeded, service) = enrolled_rust_basics();
    let u = user(7);
    let course = CourseId::new(10);
    let lesson = LessonId::new(101);

    let started = service
        .record(u, course, lesson, RequestedAction::Start, token("t1"))
        .unwrap();
    assert_eq!(started.action, ActivityAction::Start);

    let completed = service
        .record(u, course, lesson, RequestedAction::Complete, token("t2"))
        .unwrap();
    assert_eq!(completed.action, ActivityAction::Complete);
    assert!(completed.sequence > started.sequence);

    let history = seeded.storage.lesson_history(lesson, u).unwrap();
    assert_actions(
        history.activities(),
        &[ActivityAction::Enroll, ActivityAction::Start, ActivityAction::Complete],
    );
    assert_eq!(history.effective_status(), Some(ActivityAction::Complete));
}

#[test]
fn test_enroll_fans_out_one_activity_per_lesson() {
    let seeded = fixtures::rust_basics();
    let service = service(&seeded);

    let receipt = service.enroll(seeded.course_id, user(7)).unwrap();
    assert_eq!(receipt.enrollment.unwrap().user_id, user(7));
    assert_eq!(receipt.activities.len(), 3);

    let lessons: Vec<_> = receipt.activities.iter().map(|a| a.lesson_id).collect();
    assert_eq!(lessons, seeded.lesson_ids);

    let mut tokens: Vec<_> = receipt.activities.iter().map(|a| a.token.clone()).collect();
    tokens.sort();
    tokens.dedup();
    assert_eq!(tokens.len(), 3);
    assert_eq!(seeded.storage.activity_count().unwrap(), 3);
}

#[test]
fn test_enroll_twice_is_conflict_and_writes_nothing() {
    let (seeded, service) = enrolled_rust_basics();
    let result = service.enroll(seeded.course_id, user(7));
    assert_progress_error(
        &result,
        &ProgressError::UserAlreadyEnrolled {
            user_id: user(7),
            course_id: seeded.course_id,
        },
    );
    assert_eq!(seeded.storage.activity_count().unwrap(), 3);
    assert_eq!(seeded.storage.enrollment_count().unwrap(), 1);
}

#[test]
fn test_enroll_refused_when_lesson_already_has_history() {
    let seeded = fixtures::rust_basics();
    seeded
        .storage
        .append(ActivityDraft::new(
            user(7),
            seeded.lesson(1),
            ActivityAction::Complete,
            token("c1"),
        ))
        .unwrap();

    let result = service(&seeded).enroll(seeded.course_id, user(7));
    assert_progress_error(
        &result,
        &ProgressError::LessonAlreadyStarted {
            lesson_id: seeded.lesson(1),
            user_id: user(7),
        },
    );

    // Nothing from the refused fan-out landed; the completion still stands.
    assert_eq!(seeded.storage.enrollment_count().unwrap(), 0);
    assert_eq!(seeded.storage.activity_count().unwrap(), 1);
    let history = seeded.storage.lesson_history(seeded.lesson(1), user(7)).unwrap();
    assert_eq!(history.effective_status(), Some(ActivityAction::Complete));
}

#[test]
fn test_enroll_unknown_course() {
    let seeded = fixtures::rust_basics();
    let result = service(&seeded).enroll(CourseId::new(99), user(7));
    assert_progress_error(
        &result,
        &ProgressError::CourseNotFound {
            course_id: CourseId::new(99),
        },
    );
}

#[test]
fn test_same_token_twice_creates_one_activity() {
    let (seeded, service) = enrolled_rust_basics();
    let u = user(7);
    let lesson = seeded.lesson(1);

    service
        .record(u, seeded.course_id, lesson, RequestedAction::Start, token("t1"))
        .unwrap();
    let before = seeded.storage.activity_count().unwrap();

    let retry = service.record(u, seeded.course_id, lesson, RequestedAction::Start, token("t1"));
    assert_duplicate_token(&retry, true);

    // Reusing the token for another intent is still a conflict.
    let reuse = service.record(u, seeded.course_id, lesson, RequestedAction::Complete, token("t1"));
    assert_duplicate_token(&reuse, false);

    assert_eq!(seeded.storage.activity_count().unwrap(), before);
}

#[test]
fn test_duplicate_token_checked_before_state() {
    let (seeded, service) = enrolled_rust_basics();
    let u = user(7);
    service
        .record(u, seeded.course_id, seeded.lesson(1), RequestedAction::Start, token("t1"))
        .unwrap();

    // Completing lesson 3 would be illegal, but the token clash wins.
    let result = service.record(u, seeded.course_id, seeded.lesson(3), RequestedAction::Complete, token("t1"));
    assert_duplicate_token(&result, false);
}

#[test]
fn test_retrying_a_failure_fails_identically() {
    let (seeded, service) = enrolled_rust_basics();
    let u = user(7);
    let first = service.record(u, seeded.course_id, seeded.lesson(1), RequestedAction::Complete, token("c1"));
    let second = service.record(u, seeded.course_id, seeded.lesson(1), RequestedAction::Complete, token("c1"));
    assert_eq!(first.unwrap_err(), second.unwrap_err());
}

#[test]
fn test_start_third_lesson_blocked_by_gate() {
    let (seeded, service) = enrolled_rust_basics();
    let u = user(7);

    let result = service.record(u, seeded.course_id, seeded.lesson(3), RequestedAction::Start, token("s3"));
    assert_not_startable(&result, &[1, 2]);
    assert_eq!(seeded.storage.activity_count().unwrap(), 3);

    service.start(u, seeded.lesson(1)).unwrap();
    service
        .record(u, seeded.course_id, seeded.lesson(1), RequestedAction::Complete, token("c1"))
        .unwrap();
    let result = service.record(u, seeded.course_id, seeded.lesson(3), RequestedAction::Start, token("s3"));
    assert_not_startable(&result, &[2]);
}

#[test]
fn test_full_walkthrough_with_incomplete_and_restart() {
    let (seeded, service) = enrolled_rust_basics();
    let u = user(7);
    let course = seeded.course_id;

    service.start(u, seeded.lesson(1)).unwrap();
    service
        .record(u, course, seeded.lesson(1), RequestedAction::Complete, token("c1"))
        .unwrap();
    service.incomplete(u, seeded.lesson(1)).unwrap();

    // Lesson 1 was completed once, so lesson 2 stays open.
    service.start(u, seeded.lesson(2)).unwrap();

    // Incomplete lesson can be started again or completed directly.
    service.start(u, seeded.lesson(1)).unwrap();
    service
        .record(u, course, seeded.lesson(1), RequestedAction::Complete, token("c1b"))
        .unwrap();

    let progress = service.compute_progress(u, course).unwrap();
    let statuses: Vec<_> = progress.lessons.iter().map(|l| l.status).collect();
    assert_eq!(
        statuses,
        vec![ProgressStatus::Complete, ProgressStatus::InProgress, ProgressStatus::Pending]
    );
}

#[test]
fn test_illegal_transitions_are_specific_conflicts() {
    let (seeded, service) = enrolled_rust_basics();
    let u = user(7);
    let lesson_id = seeded.lesson(1);
    let course = seeded.course_id;

    assert_progress_error(
        &service.record(u, course, lesson_id, RequestedAction::Complete, token("a")),
        &ProgressError::LessonNotStarted { lesson_id, user_id: u },
    );
    assert_progress_error(
        &service.record(u, course, lesson_id, RequestedAction::Incomplete, token("b")),
        &ProgressError::LessonNotCompleted { lesson_id, user_id: u },
    );

    service.start(u, lesson_id).unwrap();
    assert_progress_error(
        &service.record(u, course, lesson_id, RequestedAction::Start, token("c")),
        &ProgressError::LessonAlreadyStarted { lesson_id, user_id: u },
    );

    service
        .record(u, course, lesson_id, RequestedAction::Complete, token("d"))
        .unwrap();
    assert_progress_error(
        &service.record(u, course, lesson_id, RequestedAction::Complete, token("e")),
        &ProgressError::LessonAlreadyCompleted { lesson_id, user_id: u },
    );

    service.incomplete(u, lesson_id).unwrap();
    assert_progress_error(
        &service.incomplete(u, lesson_id),
        &ProgressError::LessonAlreadyIncompleted { lesson_id, user_id: u },
    );
}

#[test]
fn test_not_enrolled_user_is_rejected() {
    let seeded = fixtures::rust_basics();
    let service = service(&seeded);

    let result = service.record(user(8), seeded.course_id, seeded.lesson(1), RequestedAction::Start, token("t1"));
    assert_progress_error(
        &result,
        &ProgressError::UserNotEnrolled {
            user_id: user(8),
            course_id: seeded.course_id,
        },
    );
    assert_not_found(&service.start(user(8), seeded.lesson(1)));
    assert_eq!(seeded.storage.activity_count().unwrap(), 0);
}

#[test]
fn test_lookup_failures_are_not_found() {
    let (seeded, service) = enrolled_rust_basics();
    let u = user(7);

    assert_progress_error(
        &service.record(u, CourseId::new(99), seeded.lesson(1), RequestedAction::Start, token("x")),
        &ProgressError::CourseNotFound {
            course_id: CourseId::new(99),
        },
    );
    assert_progress_error(
        &service.record(u, seeded.course_id, LessonId::new(999), RequestedAction::Start, token("y")),
        &ProgressError::LessonNotFound {
            lesson_id: LessonId::new(999),
            course_id: seeded.course_id,
        },
    );
    assert_progress_error(
        &service.incomplete(u, LessonId::new(999)),
        &ProgressError::CourseForLessonNotFound {
            lesson_id: LessonId::new(999),
        },
    );
}

#[test]
fn test_lesson_added_after_enrollment_cannot_be_started() {
    let (seeded, service) = enrolled_rust_basics();
    let u = user(7);
    let late = seeded.storage.lesson_insert(seeded.course_id, "Traits", 4).unwrap();

    // Complete lessons 1-3 so the gate is open.
    for (i, lesson) in seeded.lesson_ids.iter().enumerate() {
        service.start(u, *lesson).unwrap();
        service
            .record(u, seeded.course_id, *lesson, RequestedAction::Complete, token(&format!("c{}", i)))
            .unwrap();
    }

    let result = service.start(u, late);
    assert_not_startable(&result, &[]);
    assert_kind(&result, ErrorKind::Conflict);
}

#[test]
fn test_generated_tokens_use_configured_prefix() {
    let seeded = fixtures::rust_basics();
    let config = EngineConfig {
        generated_token_prefix: "cli-".to_string(),
        ..EngineConfig::default()
    };
    let service = ActivityService::new(seeded.storage.clone(), config).unwrap();
    let receipt = service.enroll(seeded.course_id, user(7)).unwrap();
    assert!(receipt
        .activities
        .iter()
        .all(|a| a.token.as_str().starts_with("cli-")));

    let started = service.start(user(7), seeded.lesson(1)).unwrap();
    assert!(started.token.as_str().starts_with("cli-"));
}

#[test]
fn test_invalid_config_rejected() {
    let config = EngineConfig {
        percent_precision: 12,
        ..EngineConfig::default()
    };
    let result = ActivityService::new(MockStorage::new(), config);
    assert_kind(&result.map(|_| ()), ErrorKind::Internal);
}

#[test]
fn test_compute_progress_one_of_three() {
    let (seeded, service) = enrolled_rust_basics();
    let u = user(7);
    service.start(u, seeded.lesson(1)).unwrap();
    service
        .record(u, seeded.course_id, seeded.lesson(1), RequestedAction::Complete, token("c1"))
        .unwrap();
    service.start(u, seeded.lesson(2)).unwrap();

    let progress = service.compute_progress(u, seeded.course_id).unwrap();
    assert_eq!(progress.completed, 1);
    assert_eq!(progress.total, 3);
    assert_eq!(progress.percent, 33.33);
    assert_eq!(progress.summary_line(), "1/3 (33%)");
    let statuses: Vec<_> = progress.lessons.iter().map(|l| l.status).collect();
    assert_eq!(
        statuses,
        vec![ProgressStatus::Complete, ProgressStatus::InProgress, ProgressStatus::Pending]
    );
}

#[test]
fn test_compute_progress_precision_and_empty_course() {
    let seeded = fixtures::rust_basics();
    let config = EngineConfig {
        percent_precision: 0,
        ..EngineConfig::default()
    };
    let service = ActivityService::new(seeded.storage.clone(), config).unwrap();
    let u = user(7);
    service.enroll(seeded.course_id, u).unwrap();
    for (i, lesson) in seeded.lesson_ids.iter().take(2).enumerate() {
        service.start(u, *lesson).unwrap();
        service
            .record(u, seeded.course_id, *lesson, RequestedAction::Complete, token(&format!("c{}", i)))
            .unwrap();
    }
    assert_eq!(service.compute_progress(u, seeded.course_id).unwrap().percent, 67.0);

    let empty = seeded.storage.course_insert("Empty").unwrap();
    let progress = service.compute_progress(u, empty).unwrap();
    assert_eq!(progress.total, 0);
    assert_eq!(progress.percent, 0.0);

    assert_not_found(&service.compute_progress(u, CourseId::new(404)));
}

#[test]
fn test_listing_read_models() {
    let seeded = fixtures::rust_basics();
    let service = service(&seeded);
    let advanced = seeded.storage.course_insert("Advanced Rust").unwrap();
    seeded.storage.lesson_insert(advanced, "Unsafe", 1).unwrap();
    seeded.storage.course_insert("Zig Interop").unwrap();

    let titles: Vec<_> = service
        .reporter()
        .list_courses()
        .unwrap()
        .into_iter()
        .map(|c| (c.title, c.total_lessons))
        .collect();
    assert_eq!(
        titles,
        vec![
            ("Advanced Rust".to_string(), 1),
            ("Rust Basics".to_string(), 3),
            ("Zig Interop".to_string(), 0),
        ]
    );

    assert!(service.reporter().user_courses(user(7)).unwrap().is_empty());
    service.enroll(seeded.course_id, user(7)).unwrap();
    service.enroll(advanced, user(7)).unwrap();
    let mine: Vec<_> = service
        .reporter()
        .user_courses(user(7))
        .unwrap()
        .into_iter()
        .map(|c| c.course_id)
        .collect();
    assert_eq!(mine, vec![advanced, seeded.course_id]);
    assert_eq!(seeded.storage.enrollments_for_user(user(7)).unwrap().len(), 2);
}

#[test]
fn test_progress_serializes_for_reporting() {
    let (seeded, service) = enrolled_rust_basics();
    let progress = service.compute_progress(user(7), seeded.course_id).unwrap();
    let json = serde_json::to_value(&progress).unwrap();
    assert_eq!(json["completed"], 0);
    assert_eq!(json["total"], 3);
    assert_eq!(json["lessons"][0]["status"], "pending");
}
