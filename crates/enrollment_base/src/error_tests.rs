/* 📖 # Why use a separate file for these error tests?

The span trace tests install a global subscriber with an ErrorLayer. Keeping them apart
from the error module keeps that setup out of the way of the plain unit tests.
*/

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::{EnrollmentError, EnrollmentResult, ResultExt};
    use expect_test::expect;
    use std::error::Error;
    use std::io;
    use std::path::PathBuf;
    use tracing::span;
    use tracing_error::ErrorLayer;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    /// Set up tracing with ErrorLayer for tests.
    /// Uses `try_init()` to handle multiple tests running concurrently.
    fn setup_tracing_subscriber() {
        let _ = tracing_subscriber::registry()
            .with(ErrorLayer::default())
            .try_init();
    }

    #[test]
    fn test_error_from_file_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let path = PathBuf::from("courses.json");
        let error = EnrollmentError::file_error(path.clone(), io_err);

        match error.kind() {
            ErrorKind::FileError { path: p, .. } => {
                assert_eq!(p, &path);
            }
            _ => panic!("Expected FileError variant"),
        }
    }

    #[test]
    fn test_error_context_attachment() {
        let error = EnrollmentError::message("original error")
            .context("first context")
            .context("second context");

        assert_eq!(error.get_context().len(), 2);
        assert_eq!(error.get_context()[0], "first context");
        assert_eq!(error.get_context()[1], "second context");
    }

    #[test]
    fn test_error_with_context_lazy_evaluation() {
        let mut called = false;
        let error = EnrollmentError::message("error").with_context(|| {
            called = true;
            "lazy context".to_string()
        });

        assert!(called);
        assert_eq!(error.get_context()[0], "lazy context");
    }

    #[test]
    fn test_error_display_with_multiple_contexts() {
        let error = EnrollmentError::message("root error")
            .context("first")
            .context("second")
            .context("third");
        assert_eq!(error.to_string(), "first: second: third: root error");
    }

    #[test]
    fn test_error_display_domain_kinds() {
        let rendered = [
            EnrollmentError::invalid_request("Student name and course ID are required."),
            EnrollmentError::not_found("Course not found."),
            EnrollmentError::new(ErrorKind::CapacityExceeded {
                course_id: "c1".to_string(),
            }),
            EnrollmentError::new(ErrorKind::DuplicateEnrollment {
                student_name: "Alice".to_string(),
                course_id: "c1".to_string(),
            }),
            EnrollmentError::new(ErrorKind::StoreUnavailable {
                path: PathBuf::from("courses.json"),
            }),
        ]
        .iter()
        .map(|error| error.to_string())
        .collect::<Vec<_>>()
        .join("\n");

        expect![[r#"
            Student name and course ID are required.
            Course not found.
            No available slots for this course.
            Student is already enrolled in this course.
            Courses file not found: courses.json"#]]
        .assert_eq(&rendered);
    }

    #[test]
    fn test_kind_display_ignores_context() {
        let error = EnrollmentError::not_found("Course not found.").context("enrolling Alice");
        assert_eq!(error.to_string(), "enrolling Alice: Course not found.");
        assert_eq!(error.kind().to_string(), "Course not found.");
    }

    #[test]
    fn test_error_source_file_error() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let error = EnrollmentError::file_error("courses.json", io_err);
        assert!(error.source().is_some());
        assert_eq!(error.root_cause().to_string(), "access denied");
    }

    #[test]
    fn test_error_source_domain_kind() {
        let error = EnrollmentError::invalid_request("bad input");
        assert!(error.source().is_none());
        assert_eq!(error.root_cause().to_string(), "bad input");
    }

    #[test]
    fn test_result_ext_context_success() {
        let result: EnrollmentResult<i32> = Ok(42);
        let final_result = result.context("operation failed");
        assert_eq!(final_result.unwrap(), 42);
    }

    #[test]
    fn test_result_ext_chaining() {
        let result: EnrollmentResult<i32> = Err(Box::new(EnrollmentError::message("root")));
        let err = result
            .context("step 1")
            .context("step 2")
            .with_context(|| "step 3".to_string())
            .unwrap_err();
        assert_eq!(err.to_string(), "step 1: step 2: step 3: root");
    }

    #[test]
    fn test_err_macro_formats_message() {
        let error = crate::err!("course {} is broken", "c1");
        match error.kind() {
            ErrorKind::Message { message } => assert_eq!(message, "course c1 is broken"),
            _ => panic!("Expected Message variant"),
        }
    }

    #[test]
    fn test_bail_macro_returns_early() {
        fn fails() -> EnrollmentResult<()> {
            crate::bail!("nope: {}", 7);
        }
        assert_eq!(fails().unwrap_err().to_string(), "nope: 7");
    }

    #[test]
    fn test_spantrace_debug_includes_span_name() {
        setup_tracing_subscriber();

        let operation_span = span!(tracing::Level::INFO, "enroll_operation", course_id = "c1");
        let _guard = operation_span.enter();

        let error = EnrollmentError::message("test error message");
        let debug = format!("{:?}", error);

        assert!(debug.starts_with("test error message\n"));
        assert!(debug.contains("enroll_operation"));
        assert!(debug.contains("course_id"));
    }
}
