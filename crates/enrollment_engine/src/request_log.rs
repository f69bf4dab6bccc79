use chrono::{DateTime, SecondsFormat, Utc};
use tracing::warn;

use enrollment_base::{FilePath, PalHandle};
use enrollment_base::pal::http::HttpMethod;

/// Append-only plaintext log with one line per handled request.
#[derive(Debug, Clone)]
pub struct RequestLog {
    pal: PalHandle,
    path: FilePath,
}

impl RequestLog {
    pub fn new(pal: PalHandle, path: FilePath) -> Self {
        Self { pal, path }
    }

    pub fn path(&self) -> &FilePath {
        &self.path
    }

    /// Record a request. A failed append is reported through tracing and
    /// otherwise ignored so that logging never fails a request.
    pub fn append(&self, method: &HttpMethod, url: &str) {
        self.append_at(Utc::now(), method, url);
    }

    fn append_at(&self, timestamp: DateTime<Utc>, method: &HttpMethod, url: &str) {
        let line = format_line(timestamp, method, url);
        if let Err(error) = self.pal.append_file(&self.path, line.as_bytes()) {
            warn!("Failed to write request log {}: {}", self.path, error);
        }
    }
}

fn format_line(timestamp: DateTime<Utc>, method: &HttpMethod, url: &str) -> String {
    format!(
        "{} - {} {}\n",
        timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        method,
        url
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use enrollment_base::MockPal;
    use expect_test::expect;

    fn mock_log() -> (MockPal, RequestLog) {
        let mock = MockPal::new();
        let log = RequestLog::new(PalHandle::new(mock.clone()), FilePath::from("server.log"));
        (mock, log)
    }

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap()
            + chrono::Duration::milliseconds(42)
    }

    #[test]
    fn test_lines_are_appended_in_order() {
        let (mock, log) = mock_log();
        log.append_at(timestamp(), &HttpMethod::Get, "/api/courses");
        log.append_at(
            timestamp(),
            &HttpMethod::Get,
            "/api/courses/search?name=Intro%20Math",
        );
        log.append_at(timestamp(), &HttpMethod::Post, "/api/enroll");

        expect![[r#"
            2024-03-05T14:07:09.042Z - GET /api/courses
            2024-03-05T14:07:09.042Z - GET /api/courses/search?name=Intro%20Math
            2024-03-05T14:07:09.042Z - POST /api/enroll
        "#]]
        .assert_eq(&mock.file_content(log.path()).unwrap());
    }

    #[test]
    fn test_append_uses_current_time() {
        let (mock, log) = mock_log();
        log.append(&HttpMethod::Delete, "/");
        let content = mock.file_content(log.path()).unwrap();
        assert!(content.ends_with("Z - DELETE /\n"));
        let timestamp = content.split(" - ").next().unwrap();
        assert!(DateTime::parse_from_rfc3339(timestamp).is_ok());
    }

    #[test]
    fn test_failed_append_is_ignored() {
        let (mock, log) = mock_log();
        mock.fail_writes_to(FilePath::from("server.log"));
        log.append(&HttpMethod::Get, "/");
        assert_eq!(mock.file_content(log.path()), None);
    }
}
