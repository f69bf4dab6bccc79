use std::io::Write;

use chrono::Utc;
use tracing::{debug, info, instrument};

use enrollment_base::{EnrollmentError, EnrollmentResult, FilePath, PalHandle, ResultExt};

/// Name used when a client sends a file without a usable name.
const FALLBACK_NAME: &str = "upload";

/// Stores uploaded files as opaque blobs in one directory.
#[derive(Debug, Clone)]
pub struct UploadStore {
    pal: PalHandle,
    directory: FilePath,
}

impl UploadStore {
    pub fn new(pal: PalHandle, directory: FilePath) -> Self {
        Self { pal, directory }
    }

    pub fn directory(&self) -> &FilePath {
        &self.directory
    }

    /// Create the upload directory if it does not exist yet.
    pub fn ensure_directory(&self) -> EnrollmentResult<()> {
        self.pal
            .create_directory_all(&self.directory)
            .with_context(|| format!("Failed to create upload directory {}", self.directory))
    }

    /// Write `content` to `<unix-millis>-<name>` inside the upload directory
    /// and return the stored path.
    #[instrument(skip(self, content), fields(size = content.len()))]
    pub fn store(&self, original_name: &str, content: &[u8]) -> EnrollmentResult<FilePath> {
        let file_name = format!(
            "{}-{}",
            Utc::now().timestamp_millis(),
            sanitize_file_name(original_name)
        );
        let path = self.directory.join(&file_name);
        debug!("Storing upload at {}", path);

        let mut writer = self.pal.create_file(&path)?;
        writer
            .write_all(content)
            .and_then(|_| writer.flush())
            .map_err(|e| Box::new(EnrollmentError::file_error(path.as_path(), e)))?;

        info!("Stored upload {} ({} bytes)", path, content.len());
        Ok(path)
    }
}

/// Reduce a client-supplied name to its last path component.
fn sanitize_file_name(original_name: &str) -> &str {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base == "." || base == ".." {
        FALLBACK_NAME
    } else {
        base
    }
}
