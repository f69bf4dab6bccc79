/* 📖 # Why parse multipart bodies with the multipart crate?

Upload bodies are `multipart/form-data`: boundaries, per-part headers, quoted filenames and
binary content. The multipart crate already handles the framing and streams each field, so
this module only needs to find the boundary and pick out the `file` field.
*/

use std::io::{Cursor, Read};

use multipart::server::Multipart;
use tracing::debug;

use enrollment_base::pal::http::HttpRequest;
use enrollment_base::{EnrollmentError, EnrollmentResult};

/// Form field that carries the uploaded file.
const FILE_FIELD: &str = "file";

/// A file extracted from a multipart request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content: Vec<u8>,
}

/// Extract the boundary from a `multipart/form-data` content type.
fn multipart_boundary(content_type: &str) -> Option<&str> {
    let mut parts = content_type.split(';');
    let media_type = parts.next()?.trim();
    if !media_type.eq_ignore_ascii_case("multipart/form-data") {
        return None;
    }
    parts.find_map(|param| {
        let (key, value) = param.trim().split_once('=')?;
        if key.trim().eq_ignore_ascii_case("boundary") {
            let value = value.trim().trim_matches('"');
            (!value.is_empty()).then_some(value)
        } else {
            None
        }
    })
}

/// Read the `file` field of a multipart request.
///
/// Returns `Ok(None)` when the request is not multipart or has no file part
/// named `file`. A field named `file` without a filename is a plain form
/// value, not an upload. Broken framing is an invalid request.
pub fn read_file_field(request: &HttpRequest) -> EnrollmentResult<Option<UploadedFile>> {
    let Some(boundary) = request
        .headers()
        .get("Content-Type")
        .and_then(|content_type| multipart_boundary(content_type))
    else {
        debug!("Upload request is not multipart/form-data");
        return Ok(None);
    };

    let mut multipart = Multipart::with_body(Cursor::new(request.body().as_bytes()), boundary);
    loop {
        let entry = multipart.read_entry().map_err(|e| {
            Box::new(EnrollmentError::invalid_request(format!(
                "Malformed multipart body: {}",
                e
            )))
        })?;
        let Some(mut field) = entry else {
            return Ok(None);
        };

        if &*field.headers.name != FILE_FIELD {
            continue;
        }
        let Some(file_name) = field.headers.filename.clone() else {
            continue;
        };

        let mut content = Vec::new();
        field.data.read_to_end(&mut content).map_err(|e| {
            Box::new(EnrollmentError::invalid_request(format!(
                "Malformed multipart body: {}",
                e
            )))
        })?;
        debug!(file_name = %file_name, size = content.len(), "Read uploaded file");
        return Ok(Some(UploadedFile { file_name, content }));
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use enrollment_base::pal::http::HttpMethod;

    pub(crate) const BOUNDARY: &str = "XyZBoundary42";

    /// Build a multipart body from `(field name, optional filename, content)` parts.
    pub(crate) fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, file_name, content) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match file_name {
                Some(file_name) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                ),
            }
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    pub(crate) fn upload_request(body: Vec<u8>) -> HttpRequest {
        HttpRequest::new(HttpMethod::Post, "/api/upload")
            .with_header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .with_body(body)
    }

    #[test]
    fn test_multipart_boundary() {
        assert_eq!(
            multipart_boundary("multipart/form-data; boundary=abc"),
            Some("abc")
        );
        assert_eq!(
            multipart_boundary("Multipart/Form-Data; charset=utf-8; boundary=\"a b\""),
            Some("a b")
        );
        assert_eq!(multipart_boundary("multipart/form-data"), None);
        assert_eq!(multipart_boundary("multipart/form-data; boundary="), None);
        assert_eq!(multipart_boundary("application/json"), None);
    }

    #[test]
    fn test_reads_file_field() {
        let body = multipart_body(&[
            ("comment", None, &b"hello"[..]),
            ("file", Some("notes.txt"), &b"line one\r\nline two"[..]),
        ]);
        let file = read_file_field(&upload_request(body)).unwrap().unwrap();
        assert_eq!(file.file_name, "notes.txt");
        assert_eq!(file.content, b"line one\r\nline two");
    }

    #[test]
    fn test_binary_content_is_preserved() {
        let content: Vec<u8> = (0u8..=255).collect();
        let body = multipart_body(&[("file", Some("blob.bin"), content.as_slice())]);
        let file = read_file_field(&upload_request(body)).unwrap().unwrap();
        assert_eq!(file.content, content);
    }

    #[test]
    fn test_missing_file_field() {
        let body = multipart_body(&[("other", Some("notes.txt"), &b"x"[..])]);
        assert_eq!(read_file_field(&upload_request(body)).unwrap(), None);

        let body = multipart_body(&[("file", None, &b"just text"[..])]);
        assert_eq!(read_file_field(&upload_request(body)).unwrap(), None);
    }

    #[test]
    fn test_non_multipart_request() {
        let request = HttpRequest::new(HttpMethod::Post, "/api/upload")
            .with_header("Content-Type", "application/json")
            .with_body("{}");
        assert_eq!(read_file_field(&request).unwrap(), None);

        let request = HttpRequest::new(HttpMethod::Post, "/api/upload");
        assert_eq!(read_file_field(&request).unwrap(), None);
    }
}
