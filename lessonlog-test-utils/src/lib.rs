//! LessonLog Test Utilities
//!
//! Shared test infrastructure for the LessonLog workspace:
//! - Proptest generators for identifiers, actions and configuration
//! - Seeded catalog fixtures backed by [`MockStorage`]
//! - Assertions on error kinds and specific progression errors

// Re-export mock storage from its source crate
pub use lessonlog_storage::{CourseRecord, MockStorage, StoreSnapshot};

// Re-export core types for convenience
pub use lessonlog_core::{
    Activity, ActivityAction, CourseId, EngineConfig, EntityIdType, ErrorKind, IdempotencyToken,
    Lesson, LessonId, LessonLogError, LessonLogResult, ProgressError, RequestedAction, UserId,
};

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for LessonLog types.

    use super::*;
    use lessonlog_core::{MAX_PERCENT_PRECISION, MAX_TOKEN_LEN};
    use proptest::prelude::*;

    /// Generate a valid (positive) user id.
    pub fn arb_user_id() -> impl Strategy<Value = UserId> {
        (1i64..1_000_000).prop_map(|raw| UserId::new(raw).expect("positive id"))
    }

    /// Generate a valid idempotency token.
    pub fn arb_token() -> impl Strategy<Value = IdempotencyToken> {
        "[A-Za-z0-9][A-Za-z0-9_-]{0,63}"
            .prop_map(|raw| IdempotencyToken::new(raw).expect("generated token is valid"))
    }

    /// Generate a raw string that is too long to be a token.
    pub fn arb_oversized_token() -> impl Strategy<Value = String> {
        ((MAX_TOKEN_LEN + 1)..(MAX_TOKEN_LEN + 64)).prop_map(|len| "t".repeat(len))
    }

    pub fn arb_activity_action() -> impl Strategy<Value = ActivityAction> {
        prop_oneof![
            Just(ActivityAction::Enroll),
            Just(ActivityAction::Start),
            Just(ActivityAction::Complete),
            Just(ActivityAction::Incomplete),
        ]
    }

    pub fn arb_requested_action() -> impl Strategy<Value = RequestedAction> {
        prop_oneof![
            Just(RequestedAction::Start),
            Just(RequestedAction::Complete),
            Just(RequestedAction::Incomplete),
        ]
    }

    /// Generate an effective status, including "no activity yet".
    pub fn arb_effective_status() -> impl Strategy<Value = Option<ActivityAction>> {
        prop::option::of(arb_activity_action())
    }

    /// Generate a lesson title.
    pub fn arb_title() -> impl Strategy<Value = String> {
        "[A-Z][a-z]{2,12}( [A-Za-z]{2,10}){0,3}"
    }

    /// Generate a valid engine configuration.
    pub fn arb_valid_config() -> impl Strategy<Value = EngineConfig> {
        (0..=MAX_PERCENT_PRECISION, any::<bool>(), "[a-z]{0,8}-?").prop_map(
            |(percent_precision, optimistic_concurrency, generated_token_prefix)| EngineConfig {
                percent_precision,
                optimistic_concurrency,
                generated_token_prefix,
            },
        )
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Seeded stores for common scenarios.

    use super::*;
    use chrono::{TimeZone, Utc};

    /// A store holding one course and its lessons.
    #[derive(Debug, Clone)]
    pub struct SeededCourse {
        pub storage: MockStorage,
        pub course_id: CourseId,
        /// Lesson ids in order-number order.
        pub lesson_ids: Vec<LessonId>,
    }

    impl SeededCourse {
        /// Lesson id at a 1-based order number.
        pub fn lesson(&self, order_number: usize) -> LessonId {
            self.lesson_ids[order_number - 1]
        }
    }

    pub fn user(raw: i64) -> UserId {
        UserId::new(raw).expect("fixture user ids are positive")
    }

    pub fn token(raw: &str) -> IdempotencyToken {
        IdempotencyToken::new(raw).expect("fixture tokens are valid")
    }

    /// Default configuration, validated.
    pub fn minimal_config() -> EngineConfig {
        EngineConfig::default()
    }

    /// Course 10 "Rust Basics" with lessons 101, 102 and 103 at order numbers
    /// 1, 2 and 3. Nobody is enrolled.
    pub fn rust_basics() -> SeededCourse {
        course_with_ids(10, "Rust Basics", &[(101, "Ownership"), (102, "Borrowing"), (103, "Lifetimes")])
    }

    /// Course with fixed ids; lessons get order numbers 1, 2, 3... in slice order.
    pub fn course_with_ids(course_id: i64, title: &str, lessons: &[(i64, &str)]) -> SeededCourse {
        let course_id = CourseId::new(course_id);
        let snapshot = StoreSnapshot {
            courses: vec![CourseRecord {
                course_id,
                title: title.to_string(),
                created_at: Utc
                    .timestamp_opt(1_700_000_000, 0)
                    .single()
                    .expect("fixed timestamp"),
            }],
            lessons: lessons
                .iter()
                .enumerate()
                .map(|(i, (id, lesson_title))| Lesson {
                    lesson_id: LessonId::new(*id),
                    course_id,
                    title: lesson_title.to_string(),
                    order_number: i as u32 + 1,
                })
                .collect(),
            enrollments: Vec::new(),
            activities: Vec::new(),
        };
        SeededCourse {
            storage: MockStorage::from_snapshot(snapshot).expect("fixture snapshot is valid"),
            course_id,
            lesson_ids: lessons.iter().map(|(id, _)| LessonId::new(*id)).collect(),
        }
    }

    /// Fresh store with one course of `lessons` lessons and store-assigned ids.
    pub fn course_with_lessons(title: &str, lessons: u32) -> SeededCourse {
        let storage = MockStorage::new();
        let course_id = storage.course_insert(title).expect("valid course title");
        let lesson_ids = (1..=lessons)
            .map(|order| {
                storage
                    .lesson_insert(course_id, &format!("Lesson {}", order), order)
                    .expect("valid lesson")
            })
            .collect();
        SeededCourse {
            storage,
            course_id,
            lesson_ids,
        }
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for LessonLog results.

    use super::*;

    /// Assert that a LessonLogResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &LessonLogResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a LessonLogResult failed with the given kind.
    #[track_caller]
    pub fn assert_kind<T: std::fmt::Debug>(result: &LessonLogResult<T>, kind: ErrorKind) {
        match result {
            Err(err) => assert_eq!(err.kind(), kind, "Wrong error kind for {:?}", err),
            Ok(value) => panic!("Expected {:?} error, got Ok: {:?}", kind, value),
        }
    }

    #[track_caller]
    pub fn assert_conflict<T: std::fmt::Debug>(result: &LessonLogResult<T>) {
        assert_kind(result, ErrorKind::Conflict);
    }

    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &LessonLogResult<T>) {
        assert_kind(result, ErrorKind::NotFound);
    }

    /// Assert that a LessonLogResult is exactly this progression error.
    #[track_caller]
    pub fn assert_progress_error<T: std::fmt::Debug>(
        result: &LessonLogResult<T>,
        expected: &ProgressError,
    ) {
        match result {
            Err(LessonLogError::Progress(err)) => assert_eq!(err, expected),
            other => panic!("Expected {:?}, got: {:?}", expected, other),
        }
    }

    /// Assert a duplicate-token conflict, checking whether it was a replay.
    #[track_caller]
    pub fn assert_duplicate_token<T: std::fmt::Debug>(result: &LessonLogResult<T>, replay: bool) {
        match result {
            Err(LessonLogError::Progress(ProgressError::DuplicateToken { replay: r, .. })) => {
                assert_eq!(*r, replay, "Wrong replay flag");
            }
            other => panic!("Expected DuplicateToken, got: {:?}", other),
        }
    }

    /// Assert a not-startable conflict listing exactly `missing`.
    #[track_caller]
    pub fn assert_not_startable<T: std::fmt::Debug>(result: &LessonLogResult<T>, missing: &[u32]) {
        match result {
            Err(LessonLogError::Progress(ProgressError::LessonNotStartable { missing: m, .. })) => {
                assert_eq!(m.as_slice(), missing, "Wrong missing prerequisites");
            }
            other => panic!("Expected LessonNotStartable, got: {:?}", other),
        }
    }

    /// Assert the actions of a sequence of activities.
    #[track_caller]
    pub fn assert_actions(activities: &[Activity], expected: &[ActivityAction]) {
        let actions: Vec<ActivityAction> = activities.iter().map(|a| a.action).collect();
        assert_eq!(actions, expected);
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use lessonlog_storage::CourseStore;
    use proptest::prelude::*;

    #[test]
    fn test_minimal_config_is_valid() {
        assert!(fixtures::minimal_config().validate().is_ok());
    }

    #[test]
    fn test_rust_basics_fixture() {
        let seeded = fixtures::rust_basics();
        let course = seeded.storage.course_get(seeded.course_id).unwrap().unwrap();
        assert_eq!(course.course_id, CourseId::new(10));
        assert_eq!(course.lesson_ids(), seeded.lesson_ids);
        assert_eq!(seeded.lesson(1), LessonId::new(101));
        assert!(course.enrollments.is_empty());

        // Store-assigned ids continue after the fixed ones.
        let next = seeded.storage.course_insert("Next").unwrap();
        assert_eq!(next, CourseId::new(11));
    }

    #[test]
    fn test_course_with_lessons_fixture() {
        let seeded = fixtures::course_with_lessons("Generated", 4);
        let course = seeded.storage.course_get(seeded.course_id).unwrap().unwrap();
        assert_eq!(course.lessons.len(), 4);
        assert_eq!(course.lesson_by_order(4).unwrap().lesson_id, seeded.lesson(4));
    }

    #[test]
    fn test_assertions_accept_matching_errors() {
        let result: LessonLogResult<()> = Err(ProgressError::DuplicateToken {
            token: fixtures::token("t1"),
            replay: true,
        }
        .into());
        assertions::assert_conflict(&result);
        assertions::assert_duplicate_token(&result, true);
    }

    #[test]
    #[should_panic(expected = "Expected Conflict error")]
    fn test_assert_kind_rejects_ok() {
        let result: LessonLogResult<u8> = Ok(1);
        assertions::assert_conflict(&result);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_generated_configs_validate(config in generators::arb_valid_config()) {
            prop_assert!(config.validate().is_ok());
        }

        #[test]
        fn prop_oversized_tokens_rejected(raw in generators::arb_oversized_token()) {
            prop_assert!(IdempotencyToken::new(raw).is_err());
        }

        #[test]
        fn prop_generated_titles_insert(title in generators::arb_title()) {
            let storage = MockStorage::new();
            prop_assert!(storage.course_insert(&title).is_ok());
        }
    }
}
