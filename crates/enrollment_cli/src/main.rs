/* 📖 # Why is the server binary minimal?

There is no argument parsing. The server always runs in the current directory, reads the
optional `enrollment.toml` there, and resolves every data path against that directory.

Startup either completes or exits with status 1 before the port is opened: a missing or
unreadable courses snapshot means there is nothing to serve, and answering requests from an
empty catalog would hide the problem.

Exit codes:
- 0: never reached while the server runs
- 1: configuration, catalog or server startup failed
*/

use std::env;
use std::process;

use enrollment_base::pal::http::HttpServerConfig;
use enrollment_base::tracing::init_tracing;
use enrollment_base::{FilePath, PalHandle, RealPal};
use enrollment_engine::{
    ApiService, CONFIG_FILE, Catalog, CatalogHandle, JsonSnapshotStore, RequestLog, UploadStore,
    load_config,
};
use tracing::info;

fn main() {
    if let Err(e) = init_tracing() {
        eprintln!("Error: Failed to initialize logging: {}", e);
        process::exit(1);
    }

    let current_dir = env::current_dir().unwrap_or_else(|e| {
        eprintln!("Error: Failed to get current directory: {}", e);
        process::exit(1);
    });

    let pal = PalHandle::new(RealPal::new(current_dir));

    let config = match load_config(&pal, &FilePath::from(CONFIG_FILE)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config from {}: {}", CONFIG_FILE, e);
            process::exit(1);
        }
    };

    let store = JsonSnapshotStore::new(
        pal.clone(),
        config.courses_path(),
        config.enrollments_path(),
    );
    let catalog = match Catalog::open(store) {
        Ok(catalog) => CatalogHandle::new(catalog),
        Err(e) => {
            eprintln!("Error: Failed to load catalog: {}", e);
            process::exit(1);
        }
    };

    let uploads = UploadStore::new(pal.clone(), config.upload_path());
    if let Err(e) = uploads.ensure_directory() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    let request_log = RequestLog::new(pal.clone(), config.log_path());
    let service = ApiService::new(catalog, uploads, request_log);

    let server_config = HttpServerConfig::new(config.host.clone()).with_port(config.port);
    let handle = match pal.start_http_server(Box::new(service), server_config) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!(
                "Error: Failed to start server on {}:{}: {}",
                config.host, config.port, e
            );
            process::exit(1);
        }
    };

    info!(
        "Server running on http://{}",
        handle.address(&config.host)
    );
    handle.wait();
}
