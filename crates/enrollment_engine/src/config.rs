use serde::Deserialize;
use tracing::info;

use enrollment_base::{EnrollmentError, EnrollmentResult, FilePath, PalHandle};

/// Name of the optional configuration file in the working directory.
pub const CONFIG_FILE: &str = "enrollment.toml";

/// Configuration for the enrollment server.
///
/// Every key is optional; paths are relative to the working directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Interface to bind the HTTP server to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Snapshot of the course catalog. Must exist at startup.
    pub courses_file: String,
    /// Snapshot of enrollment records. Created empty when missing.
    pub enrollments_file: String,
    /// Plaintext request log.
    pub log_file: String,
    /// Directory receiving uploaded files.
    pub upload_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            courses_file: "courses.json".to_string(),
            enrollments_file: "enrollments.json".to_string(),
            log_file: "server.log".to_string(),
            upload_dir: "uploads".to_string(),
        }
    }
}

impl Config {
    pub fn courses_path(&self) -> FilePath {
        FilePath::from(self.courses_file.as_str())
    }

    pub fn enrollments_path(&self) -> FilePath {
        FilePath::from(self.enrollments_file.as_str())
    }

    pub fn log_path(&self) -> FilePath {
        FilePath::from(self.log_file.as_str())
    }

    pub fn upload_path(&self) -> FilePath {
        FilePath::from(self.upload_dir.as_str())
    }
}

/// Load the configuration at `path`, falling back to defaults when the file is absent.
pub fn load_config(pal: &PalHandle, path: &FilePath) -> EnrollmentResult<Config> {
    if !pal.file_exists(path)? {
        info!("No {} found, using default configuration", path);
        return Ok(Config::default());
    }

    let content = pal.read_file_to_string(path)?;
    let config: Config = toml::from_str(&content).map_err(|e| {
        Box::new(EnrollmentError::message(format!(
            "Failed to parse config {}: {}",
            path, e
        )))
    })?;
    info!("Loaded configuration from {}", path);
    Ok(config)
}
