use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use tracing_error::{SpanTrace, SpanTraceStatus};

/* 📖 # Why a custom error type and not use anyhow/eyre/thiserror etc?

- Better control over error handling
- No dependencies to compile and integrate
- The HTTP layer needs to pattern match on the business rule that failed
  (missing input, unknown course, full course, duplicate enrollment) to pick a status code
 */

/// Error variants that can occur in enrollment operations.
/// Each variant represents a specific error category with its associated context.
#[derive(Debug)]
pub enum ErrorKind {
    /// File system operation failed
    FileError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Required input was missing or malformed
    InvalidRequest { message: String },

    /// A referenced entity does not exist, or a search matched nothing
    NotFound { message: String },

    /// The course has no seats left
    CapacityExceeded { course_id: String },

    /// The student is already enrolled in the course
    DuplicateEnrollment {
        student_name: String,
        course_id: String,
    },

    /// A snapshot file required at startup is missing
    StoreUnavailable { path: PathBuf },

    /// Catch-all for other errors with a message
    Message { message: String },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::FileError { path, source } => {
                write!(f, "File error at {}: {}", path.display(), source)
            }
            ErrorKind::InvalidRequest { message } | ErrorKind::NotFound { message } => {
                write!(f, "{}", message)
            }
            ErrorKind::CapacityExceeded { .. } => {
                write!(f, "No available slots for this course.")
            }
            ErrorKind::DuplicateEnrollment { .. } => {
                write!(f, "Student is already enrolled in this course.")
            }
            ErrorKind::StoreUnavailable { path } => {
                write!(f, "Courses file not found: {}", path.display())
            }
            ErrorKind::Message { message } => write!(f, "{}", message),
        }
    }
}

/* 📖 # Why separate ErrorKind and EnrollmentError?
ErrorKind holds the structural variant the caller matches on, EnrollmentError adds the
context strings attached during propagation and the span trace captured at creation.
The HTTP layer renders `kind()` for the response body so that context added for the
server log never leaks into user-visible messages.
*/

/// Error type wrapping ErrorKind with optional context and a captured span trace.
pub struct EnrollmentError {
    kind: ErrorKind,
    context: Vec<String>,
    span_trace: SpanTrace,
}

impl EnrollmentError {
    /// Creates a new error from an ErrorKind, capturing the current span trace.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: vec![],
            span_trace: SpanTrace::capture(),
        }
    }

    /// Creates a catch-all error from a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Message {
            message: message.into(),
        })
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest {
            message: message.into(),
        })
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound {
            message: message.into(),
        })
    }

    pub fn file_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::new(ErrorKind::FileError {
            path: path.into(),
            source,
        })
    }

    /// Attaches context to an error.
    /// Context is displayed before the error message.
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Attaches context using lazy evaluation.
    pub fn with_context<F>(mut self, f: F) -> Self
    where
        F: FnOnce() -> String,
    {
        self.context.push(f());
        self
    }

    /// Returns a reference to the underlying ErrorKind.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns the context strings in the order they were attached.
    pub fn get_context(&self) -> &[String] {
        &self.context
    }

    /// Returns the span trace captured when the error was created.
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// Returns the innermost error in the chain.
    pub fn root_cause(&self) -> &(dyn StdError + 'static) {
        let mut current: &(dyn StdError + 'static) = self;
        while let Some(next) = current.source() {
            current = next;
        }
        current
    }
}

impl From<ErrorKind> for EnrollmentError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl StdError for EnrollmentError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.kind {
            ErrorKind::FileError { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for EnrollmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, ctx) in self.context.iter().enumerate() {
            if i == 0 {
                write!(f, "{}", ctx)?;
            } else {
                write!(f, ": {}", ctx)?;
            }
        }

        if !self.context.is_empty() {
            write!(f, ": ")?;
        }

        write!(f, "{}", self.kind)
    }
}

impl fmt::Debug for EnrollmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self)?;
        if self.span_trace.status() == SpanTraceStatus::CAPTURED {
            write!(f, "Trace: {}", self.span_trace)?;
        }
        Ok(())
    }
}

/* 📖 # Why use Box<EnrollmentError> in the result type?

Boxing the error reduces the size of the result type, making it more efficient to return in the common case.
The span trace alone would otherwise make every Result several words wider.
*/

/// Standard result type for enrollment operations.
pub type EnrollmentResult<T> = std::result::Result<T, Box<EnrollmentError>>;

/// Extension trait for attaching context to Results.
pub trait ResultExt<T> {
    /// Attaches context to an error, consuming and re-wrapping it.
    fn context(self, context: impl Into<String>) -> EnrollmentResult<T>;

    /// Attaches context using lazy evaluation.
    /// Context is only evaluated if the result is an error.
    fn with_context<F>(self, f: F) -> EnrollmentResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for EnrollmentResult<T> {
    fn context(self, context: impl Into<String>) -> EnrollmentResult<T> {
        self.map_err(|err| Box::new(err.context(context)))
    }

    fn with_context<F>(self, f: F) -> EnrollmentResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|err| Box::new(err.with_context(f)))
    }
}

/// Creates a boxed `EnrollmentError` with a formatted message.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        Box::new($crate::EnrollmentError::message(format!($($arg)*)))
    };
}

/// Returns early with a boxed `EnrollmentError` carrying a formatted message.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::err!($($arg)*))
    };
}
