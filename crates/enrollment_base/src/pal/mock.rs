use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};

use parking_lot::Mutex;

use crate::{EnrollmentError, EnrollmentResult};

use super::FilePath;
use super::http::{HttpRequest, HttpResponse, HttpServerConfig, HttpServerHandle, HttpService};
use super::traits::{Pal, ReadSeek};

/* 📖 # Why use HashMap for MockPal storage?

MockPal keeps files in memory so catalog and API tests are fast, isolated and
deterministic. Paths listed with `fail_writes_to` reject creation, which lets tests
exercise the rollback taken when a snapshot cannot be persisted.
*/

/// In-memory PAL implementation for testing.
///
/// # Examples
///
/// ```
/// use enrollment_base::{FilePath, MockPal, Pal};
///
/// let mock = MockPal::new();
/// mock.add_file(FilePath::from("courses.json"), b"[]".to_vec());
/// let content = mock.read_file_to_string(&FilePath::from("courses.json")).unwrap();
/// assert_eq!(content, "[]");
/// ```
#[derive(Debug, Clone)]
pub struct MockPal {
    files: Arc<Mutex<HashMap<FilePath, Vec<u8>>>>,
    directories: Arc<Mutex<HashSet<FilePath>>>,
    failing_writes: Arc<Mutex<HashSet<FilePath>>>,
    http_servers: Arc<Mutex<HashMap<u16, HttpServerInfo>>>,
    next_port: Arc<AtomicU16>,
}

/// Information about a registered HTTP server.
#[derive(Debug)]
struct HttpServerInfo {
    service: Box<dyn HttpService>,
    _config: HttpServerConfig,
}

impl MockPal {
    /// Create a new empty MockPal.
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            directories: Arc::new(Mutex::new(HashSet::new())),
            failing_writes: Arc::new(Mutex::new(HashSet::new())),
            http_servers: Arc::new(Mutex::new(HashMap::new())),
            next_port: Arc::new(AtomicU16::new(10000)),
        }
    }

    /// Add a file to the mock storage.
    pub fn add_file(&self, path: FilePath, content: Vec<u8>) {
        self.files.lock().insert(path, content);
    }

    /// Read back a file's content as a string, if present and valid UTF-8.
    pub fn file_content(&self, path: &FilePath) -> Option<String> {
        self.files
            .lock()
            .get(path)
            .and_then(|content| String::from_utf8(content.clone()).ok())
    }

    /// All stored file paths, sorted.
    pub fn file_paths(&self) -> Vec<FilePath> {
        let mut paths: Vec<_> = self.files.lock().keys().cloned().collect();
        paths.sort_by(|a, b| a.to_string().cmp(&b.to_string()));
        paths
    }

    /// Check whether a directory was created.
    pub fn directory_exists(&self, path: &FilePath) -> bool {
        self.directories.lock().contains(path)
    }

    /// Make `create_file` and `append_file` fail for the given path.
    pub fn fail_writes_to(&self, path: FilePath) {
        self.failing_writes.lock().insert(path);
    }

    /// Stop failing writes for all paths.
    pub fn clear_write_failures(&self) {
        self.failing_writes.lock().clear();
    }

    fn check_writable(&self, path: &FilePath) -> EnrollmentResult<()> {
        if self.failing_writes.lock().contains(path) {
            return Err(Box::new(EnrollmentError::file_error(
                path.as_path(),
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "write rejected"),
            )));
        }
        Ok(())
    }

    /// Simulate an HTTP request to a running server.
    ///
    /// Mirrors RealPal: an `Err` from the service comes back as an `Err` here, where
    /// RealPal would answer with HTTP 599.
    pub fn simulate_request(
        &self,
        port: u16,
        request: HttpRequest,
    ) -> EnrollmentResult<HttpResponse> {
        let servers = self.http_servers.lock();
        let server_info = servers
            .get(&port)
            .ok_or_else(|| crate::err!("No HTTP server registered on port {}", port))?;

        server_info.service.handle_request(request)
    }

    /// Get the number of registered HTTP servers.
    pub fn http_server_count(&self) -> usize {
        self.http_servers.lock().len()
    }
}

impl Default for MockPal {
    fn default() -> Self {
        Self::new()
    }
}

impl Pal for MockPal {
    fn file_exists(&self, path: &FilePath) -> EnrollmentResult<bool> {
        Ok(self.files.lock().contains_key(path))
    }

    fn read_file(&self, path: &FilePath) -> EnrollmentResult<Box<dyn ReadSeek + 'static>> {
        let content = self.files.lock().get(path).cloned().ok_or_else(|| {
            Box::new(EnrollmentError::file_error(
                path.as_path(),
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ),
            ))
        })?;
        Ok(Box::new(Cursor::new(content)))
    }

    fn create_file(&self, path: &FilePath) -> EnrollmentResult<Box<dyn Write>> {
        self.check_writable(path)?;
        // The content becomes visible when the writer is dropped
        Ok(Box::new(MockFileWriter {
            path: path.clone(),
            files: Arc::clone(&self.files),
            buffer: Vec::new(),
        }))
    }

    fn append_file(&self, path: &FilePath, content: &[u8]) -> EnrollmentResult<()> {
        self.check_writable(path)?;
        self.files
            .lock()
            .entry(path.clone())
            .or_default()
            .extend_from_slice(content);
        Ok(())
    }

    fn rename_file(&self, from: &FilePath, to: &FilePath) -> EnrollmentResult<()> {
        let mut files = self.files.lock();
        let content = files.remove(from).ok_or_else(|| {
            Box::new(EnrollmentError::file_error(
                from.as_path(),
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", from),
                ),
            ))
        })?;
        files.insert(to.clone(), content);
        Ok(())
    }

    fn create_directory_all(&self, path: &FilePath) -> EnrollmentResult<()> {
        self.directories.lock().insert(path.clone());
        Ok(())
    }

    fn start_http_server(
        &self,
        service: Box<dyn HttpService>,
        config: HttpServerConfig,
    ) -> EnrollmentResult<HttpServerHandle> {
        let port = match config.port {
            Some(p) => p,
            None => self.next_port.fetch_add(1, Ordering::SeqCst),
        };

        self.http_servers.lock().insert(
            port,
            HttpServerInfo {
                service,
                _config: config,
            },
        );

        Ok(HttpServerHandle::new(port))
    }
}

/// Helper struct for writing files to MockPal.
struct MockFileWriter {
    path: FilePath,
    files: Arc<Mutex<HashMap<FilePath, Vec<u8>>>>,
    buffer: Vec<u8>,
}

impl Write for MockFileWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for MockFileWriter {
    fn drop(&mut self) {
        self.files
            .lock()
            .insert(self.path.clone(), std::mem::take(&mut self.buffer));
    }
}
