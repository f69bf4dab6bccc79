/* 📖 # Why a single unified API service?

One ApiService handles every endpoint and does its own routing on method and path. All
endpoints share the request log, the error rendering and the JSON helper, and the server
only has one service to register. Tests drive it through MockPal without opening sockets.

Routing follows the usual web framework conventions: matching ignores case and a trailing
slash, HEAD is answered like GET without a body, and an unmatched request gets a 404
naming the method and path.
*/

/* 📖 # Why render domain errors here and propagate everything else?

Rejections the client can act on (missing fields, unknown course, full course, duplicate
enrollment, empty search) are rendered as plain text with a 4xx status, and the body is
`ErrorKind`'s message only, never the context chain meant for the server log. Any other
error, typically a failed snapshot write, is returned as `Err` so the PAL answers HTTP 599
and it stands out from the deliberate rejections.
*/

use serde::Serialize;
use tracing::{debug, instrument};

use enrollment_base::pal::http::{
    HttpBody, HttpMethod, HttpRequest, HttpResponse, HttpService, HttpStatusCode,
};
use enrollment_base::{EnrollmentError, EnrollmentResult, ErrorKind};

use super::upload_form::read_file_field;
use crate::catalog::CatalogHandle;
use crate::model::{CourseId, EnrollmentRequest};
use crate::request_log::RequestLog;
use crate::upload::UploadStore;

pub const WELCOME_MESSAGE: &str = "Welcome to the Online Student Enrollment System API!!!";
const NO_FILE_MESSAGE: &str = "No file uploaded.";

/// Unified HTTP service for the enrollment API.
///
/// - `GET /` - welcome text
/// - `GET /api/courses` - all courses as JSON
/// - `POST /api/enroll` - enroll `{"studentName", "courseId"}`
/// - `GET /api/enrollments` - all enrollments as JSON
/// - `GET /api/courses/sort-popularity` - courses by descending popularity
/// - `GET /api/courses/search?name={query}` - courses whose name contains the query
/// - `POST /api/upload` - store the multipart `file` field
#[derive(Clone)]
pub struct ApiService {
    catalog: CatalogHandle,
    uploads: UploadStore,
    request_log: RequestLog,
}

impl ApiService {
    pub fn new(catalog: CatalogHandle, uploads: UploadStore, request_log: RequestLog) -> Self {
        Self {
            catalog,
            uploads,
            request_log,
        }
    }

    /// Serialize data to JSON and wrap it in an HTTP 200 response.
    fn serialize_json_response<T: Serialize>(data: &T) -> EnrollmentResult<HttpResponse> {
        serde_json::to_string(data)
            .map(HttpResponse::json)
            .map_err(|e| {
                Box::new(EnrollmentError::message(format!(
                    "JSON serialization error: {}",
                    e
                )))
            })
    }

    /// Render domain rejections, propagate everything else.
    fn error_response(error: Box<EnrollmentError>) -> EnrollmentResult<HttpResponse> {
        let status = match error.kind() {
            ErrorKind::InvalidRequest { .. }
            | ErrorKind::CapacityExceeded { .. }
            | ErrorKind::DuplicateEnrollment { .. } => HttpStatusCode::BadRequest,
            ErrorKind::NotFound { .. } => HttpStatusCode::NotFound,
            _ => return Err(error),
        };
        debug!(status = status.as_u16(), "Request rejected: {}", error);
        Ok(HttpResponse::text(error.kind().to_string()).with_status(status))
    }

    fn route(&self, request: &HttpRequest) -> EnrollmentResult<HttpResponse> {
        let path = normalize_path(request.path());
        let method = match request.method() {
            HttpMethod::Head => &HttpMethod::Get,
            method => method,
        };
        match (method, path.as_str()) {
            (HttpMethod::Get, "/") => Ok(HttpResponse::text(WELCOME_MESSAGE)),
            (HttpMethod::Get, "/api/courses") => {
                Self::serialize_json_response(&self.catalog.list_courses())
            }
            (HttpMethod::Post, "/api/enroll") => self.handle_enroll(request),
            (HttpMethod::Get, "/api/enrollments") => {
                Self::serialize_json_response(&self.catalog.list_enrollments())
            }
            (HttpMethod::Get, "/api/courses/sort-popularity") => {
                Self::serialize_json_response(&self.catalog.sort_by_popularity())
            }
            (HttpMethod::Get, "/api/courses/search") => self.handle_search(request),
            (HttpMethod::Post, "/api/upload") => self.handle_upload(request),
            _ => {
                debug!(path = request.path(), "No route");
                Ok(
                    HttpResponse::text(format!("Cannot {} {}", request.method(), request.path()))
                        .with_status(HttpStatusCode::NotFound),
                )
            }
        }
    }

    fn handle_enroll(&self, request: &HttpRequest) -> EnrollmentResult<HttpResponse> {
        // An empty body is treated like an empty object so it reports the missing fields
        let body: EnrollmentRequest = if request.body().is_empty() {
            EnrollmentRequest::default()
        } else {
            serde_json::from_slice(request.body().as_bytes()).map_err(|e| {
                Box::new(EnrollmentError::invalid_request(format!(
                    "Invalid JSON body: {}",
                    e
                )))
            })?
        };

        let student_name = body.student_name.unwrap_or_default();
        let course_id = body.course_id.unwrap_or_else(|| CourseId::new(""));
        let receipt = self.catalog.enroll(&student_name, &course_id)?;
        Ok(HttpResponse::text(receipt.message()))
    }

    fn handle_search(&self, request: &HttpRequest) -> EnrollmentResult<HttpResponse> {
        let name = query_param(request.query(), "name")?.unwrap_or_default();
        let courses = self.catalog.search_courses(&name)?;
        Self::serialize_json_response(&courses)
    }

    fn handle_upload(&self, request: &HttpRequest) -> EnrollmentResult<HttpResponse> {
        let Some(file) = read_file_field(request)? else {
            return Err(Box::new(EnrollmentError::invalid_request(NO_FILE_MESSAGE)));
        };
        let path = self.uploads.store(&file.file_name, &file.content)?;
        Ok(HttpResponse::text(format!(
            "File uploaded successfully: {}",
            path
        )))
    }
}

/// Lowercase the path and drop trailing slashes, keeping the root as `/`.
fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_ascii_lowercase()
    }
}

/// Find the first value for `key` in a query string.
fn query_param(query: Option<&str>, key: &str) -> EnrollmentResult<Option<String>> {
    let Some(query) = query else {
        return Ok(None);
    };
    for pair in query.split('&') {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        if decode_component(raw_key)? == key {
            return decode_component(raw_value).map(Some);
        }
    }
    Ok(None)
}

/// Decode one form-urlencoded component: `+` is a space, then percent-decoding.
fn decode_component(raw: &str) -> EnrollmentResult<String> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| {
            Box::new(EnrollmentError::invalid_request(format!(
                "Invalid query string encoding: {}",
                e
            )))
        })
}

impl std::fmt::Debug for ApiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiService")
            .field("uploads", self.uploads.directory())
            .field("request_log", self.request_log.path())
            .finish()
    }
}

impl HttpService for ApiService {
    #[instrument(skip(self, request), fields(method = %request.method(), url = request.url()))]
    fn handle_request(&self, request: HttpRequest) -> EnrollmentResult<HttpResponse> {
        self.request_log.append(request.method(), request.url());
        let response = self.route(&request).or_else(Self::error_response)?;
        if *request.method() == HttpMethod::Head {
            return Ok(response.with_body(HttpBody::empty()));
        }
        Ok(response)
    }
}
