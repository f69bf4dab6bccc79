use std::io::{Read, Seek, Write};
use std::sync::Arc;

use crate::error::{EnrollmentError, EnrollmentResult};

use super::file_path::FilePath;
use super::http::{HttpServerConfig, HttpServerHandle, HttpService};

/// Trait combining Read + Seek for file operations.
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

/* 📖 # Why is Pal a trait instead of a struct?

Code depends on the abstraction, not the concrete implementation. The catalog tests run
against MockPal without touching the disk or binding a port, while the server binary
passes RealPal rooted at the working directory.
*/

/// Platform Abstraction Layer (PAL) trait providing filesystem and HTTP operations.
///
/// Two implementations are provided:
/// - `RealPal`: Uses the real filesystem via `std::fs` and serves HTTP via `tiny_http`
/// - `MockPal`: In-memory implementation for testing
pub trait Pal: std::fmt::Debug + Send + Sync + 'static {
    /// Check if a file exists at the given path.
    fn file_exists(&self, path: &FilePath) -> EnrollmentResult<bool>;

    /// Open a file for reading.
    fn read_file(&self, path: &FilePath) -> EnrollmentResult<Box<dyn ReadSeek + 'static>>;

    /// Read entire file contents as a UTF-8 string.
    fn read_file_to_string(&self, path: &FilePath) -> EnrollmentResult<String> {
        let mut reader = self.read_file(path)?;
        let mut contents = Vec::new();
        reader
            .read_to_end(&mut contents)
            .map_err(|e| Box::new(EnrollmentError::file_error(path.as_path(), e)))?;
        String::from_utf8(contents).map_err(|_e| crate::err!("File is not valid UTF-8: {}", path))
    }

    /// Create a new file, overwriting if it exists.
    fn create_file(&self, path: &FilePath) -> EnrollmentResult<Box<dyn Write>>;

    /// Append bytes to a file, creating it if it does not exist.
    fn append_file(&self, path: &FilePath, content: &[u8]) -> EnrollmentResult<()>;

    /// Rename a file, replacing the destination if it exists.
    ///
    /// On RealPal this is a single `rename(2)`, so readers observe either the old or the
    /// new content, never a partial write.
    fn rename_file(&self, from: &FilePath, to: &FilePath) -> EnrollmentResult<()>;

    /// Create a directory and all parent directories.
    fn create_directory_all(&self, path: &FilePath) -> EnrollmentResult<()>;

    /// Start an HTTP server with the given service.
    ///
    /// Returns a handle to the running server. When the handle is dropped (or
    /// `shutdown()` is called) the server stops accepting new connections.
    fn start_http_server(
        &self,
        service: Box<dyn HttpService>,
        config: HttpServerConfig,
    ) -> EnrollmentResult<HttpServerHandle>;

    /// Write the whole content to a file through a temporary sibling and rename it into place.
    fn write_file_atomic(&self, path: &FilePath, content: &[u8]) -> EnrollmentResult<()> {
        let temp_path = path.with_suffix(".tmp");
        {
            let mut writer = self.create_file(&temp_path)?;
            writer
                .write_all(content)
                .and_then(|_| writer.flush())
                .map_err(|e| Box::new(EnrollmentError::file_error(temp_path.as_path(), e)))?;
        }
        self.rename_file(&temp_path, path)
    }
}

/// Handle to a PAL implementation, enabling shared ownership.
///
/// Internally wraps `Arc<dyn Pal>` for cheap cloning and thread-safe sharing.
///
/// ```no_run
/// use enrollment_base::{RealPal, PalHandle};
///
/// let pal = PalHandle::new(RealPal::new(".".into()));
/// let pal_clone = pal.clone();
/// ```
#[derive(Debug, Clone)]
pub struct PalHandle(Arc<dyn Pal>);

impl PalHandle {
    /// Create a new PalHandle from a Pal implementation.
    pub fn new(pal: impl Pal + 'static) -> Self {
        Self(Arc::new(pal))
    }
}

impl std::ops::Deref for PalHandle {
    type Target = dyn Pal;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}
