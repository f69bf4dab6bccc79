use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use crate::{EnrollmentError, EnrollmentResult};

use super::FilePath;
use super::http::{
    HttpMethod, HttpRequest, HttpResponse, HttpServerConfig, HttpServerHandle, HttpService,
    HttpStatusCode,
};
use super::traits::{Pal, ReadSeek};

/// How long the accept loop waits for a request before re-checking the shutdown flag.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Concrete PAL implementation using the real filesystem via std::fs and tiny_http.
///
/// All file paths are resolved relative to a configured base directory.
#[derive(Debug)]
pub struct RealPal {
    base_dir: PathBuf,
}

impl RealPal {
    /// Create a new RealPal with the given base directory.
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Resolve a FilePath to an absolute filesystem path.
    fn resolve_path(&self, path: &FilePath) -> PathBuf {
        self.base_dir.join(path.as_path())
    }
}

impl Pal for RealPal {
    #[instrument(skip(self), fields(path = %path))]
    fn file_exists(&self, path: &FilePath) -> EnrollmentResult<bool> {
        let resolved = self.resolve_path(path);
        let exists = resolved.exists();
        debug!(exists, resolved = %resolved.display(), "checked file existence");
        Ok(exists)
    }

    #[instrument(skip(self), fields(path = %path))]
    fn read_file(&self, path: &FilePath) -> EnrollmentResult<Box<dyn ReadSeek + 'static>> {
        let resolved = self.resolve_path(path);
        debug!(resolved = %resolved.display(), "opening file for reading");
        let file = fs::File::open(&resolved).map_err(|e| {
            debug!(error = %e, "failed to open file");
            Box::new(EnrollmentError::file_error(resolved, e))
        })?;
        Ok(Box::new(file))
    }

    #[instrument(skip(self), fields(path = %path))]
    fn create_file(&self, path: &FilePath) -> EnrollmentResult<Box<dyn Write>> {
        let resolved = self.resolve_path(path);
        debug!(resolved = %resolved.display(), "creating file");
        let file = fs::File::create(&resolved).map_err(|e| {
            debug!(error = %e, "failed to create file");
            Box::new(EnrollmentError::file_error(resolved, e))
        })?;
        Ok(Box::new(file))
    }

    #[instrument(skip(self, content), fields(path = %path, bytes = content.len()))]
    fn append_file(&self, path: &FilePath, content: &[u8]) -> EnrollmentResult<()> {
        let resolved = self.resolve_path(path);
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&resolved)
            .and_then(|mut file| file.write_all(content))
            .map_err(|e| {
                debug!(error = %e, "failed to append to file");
                Box::new(EnrollmentError::file_error(resolved, e))
            })
    }

    #[instrument(skip(self), fields(from = %from, to = %to))]
    fn rename_file(&self, from: &FilePath, to: &FilePath) -> EnrollmentResult<()> {
        let resolved_from = self.resolve_path(from);
        let resolved_to = self.resolve_path(to);
        fs::rename(&resolved_from, &resolved_to).map_err(|e| {
            debug!(error = %e, "failed to rename file");
            Box::new(EnrollmentError::file_error(resolved_from, e))
        })?;
        debug!("file renamed successfully");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path))]
    fn create_directory_all(&self, path: &FilePath) -> EnrollmentResult<()> {
        let resolved = self.resolve_path(path);
        debug!(resolved = %resolved.display(), "creating directory and parents");
        fs::create_dir_all(&resolved).map_err(|e| {
            debug!(error = %e, "failed to create directory");
            Box::new(EnrollmentError::file_error(resolved, e))
        })
    }

    #[instrument(skip(self, service), fields(address = %config.address()))]
    fn start_http_server(
        &self,
        service: Box<dyn HttpService>,
        config: HttpServerConfig,
    ) -> EnrollmentResult<HttpServerHandle> {
        let server = tiny_http::Server::http(config.address()).map_err(|e| {
            Box::new(EnrollmentError::message(format!(
                "Failed to bind HTTP server to {}: {}",
                config.address(),
                e
            )))
        })?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| crate::err!("HTTP server is not bound to an IP address"))?;
        info!(port, "HTTP server listening");

        let service: Arc<dyn HttpService> = Arc::from(service);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = Arc::clone(&shutdown);
        let server_name = config.server_name.clone();

        let thread = thread::Builder::new()
            .name("http-accept".to_string())
            .spawn(move || {
                accept_loop(&server, &service, &shutdown_flag, &server_name);
                debug!("HTTP accept loop stopped");
            })
            .map_err(|e| {
                Box::new(EnrollmentError::message(format!(
                    "Failed to spawn HTTP server thread: {}",
                    e
                )))
            })?;

        Ok(HttpServerHandle::with_thread(port, shutdown, thread))
    }
}

/* 📖 # Why one thread per request?

tiny_http accepts connections on its own threads and hands us fully parsed requests.
Answering each on a fresh thread keeps a slow upload from blocking course listings.
Correctness does not depend on it: the catalog serializes mutations behind its lock.
*/

fn accept_loop(
    server: &tiny_http::Server,
    service: &Arc<dyn HttpService>,
    shutdown: &AtomicBool,
    server_name: &str,
) {
    while !shutdown.load(Ordering::SeqCst) {
        let request = match server.recv_timeout(ACCEPT_POLL_INTERVAL) {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(e) => {
                error!(error = %e, "failed to receive HTTP request");
                continue;
            }
        };
        let service = Arc::clone(service);
        let server_name = server_name.to_string();
        let spawned = thread::Builder::new()
            .name("http-request".to_string())
            .spawn(move || serve_request(request, service.as_ref(), &server_name));
        if let Err(e) = spawned {
            error!(error = %e, "failed to spawn request thread");
        }
    }
}

fn serve_request(mut raw: tiny_http::Request, service: &dyn HttpService, server_name: &str) {
    let response = match convert_request(&mut raw) {
        Ok(request) => {
            let method = request.method().clone();
            let url = request.url().to_string();
            match service.handle_request(request) {
                Ok(response) => response,
                Err(e) => {
                    error!(%method, %url, error = ?e, "service failed to handle request");
                    HttpResponse::text(e.to_string())
                        .with_status(HttpStatusCode::UnhandledServiceError)
                }
            }
        }
        Err(response) => response,
    };

    let status = response.status();
    let mut headers = vec![];
    for (key, value) in response
        .headers()
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .chain(std::iter::once(("server", server_name)))
    {
        match tiny_http::Header::from_bytes(key.as_bytes(), value.as_bytes()) {
            Ok(header) => headers.push(header),
            Err(()) => warn!(header = key, "dropping invalid response header"),
        }
    }
    let body = response.into_body().into_bytes();
    let length = body.len();
    let tiny_response = tiny_http::Response::new(
        tiny_http::StatusCode(status.as_u16()),
        headers,
        std::io::Cursor::new(body),
        Some(length),
        None,
    );
    if let Err(e) = raw.respond(tiny_response) {
        warn!(error = %e, "failed to send HTTP response");
    }
}

/// Convert a tiny_http request into the PAL request type.
///
/// Returns a ready-made error response when the request cannot be represented.
fn convert_request(raw: &mut tiny_http::Request) -> Result<HttpRequest, HttpResponse> {
    let method = HttpMethod::parse(raw.method().as_str()).ok_or_else(|| {
        HttpResponse::text("Method not supported").with_status(HttpStatusCode::MethodNotAllowed)
    })?;

    let mut request = HttpRequest::new(method, raw.url());
    for header in raw.headers() {
        request = request.with_header(header.field.as_str().as_str(), header.value.as_str());
    }

    let mut body = Vec::new();
    if let Err(e) = raw.as_reader().read_to_end(&mut body) {
        warn!(error = %e, "failed to read request body");
        return Err(HttpResponse::text("Failed to read request body")
            .with_status(HttpStatusCode::BadRequest));
    }
    Ok(request.with_body(body))
}
