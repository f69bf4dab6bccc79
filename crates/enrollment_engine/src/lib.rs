pub mod api;
pub mod catalog;
pub mod config;
pub mod enrollment;
pub mod model;
pub mod query;
pub mod request_log;
pub mod store;
pub mod upload;

pub use api::{ApiService, WELCOME_MESSAGE};
pub use catalog::{Catalog, CatalogHandle, ConsistencyIssue};
pub use config::{CONFIG_FILE, Config, load_config};
pub use enrollment::EnrollmentReceipt;
pub use model::{Course, CourseId, Enrollment, EnrollmentId, EnrollmentRequest};
pub use query::{search_courses, sort_by_popularity};
pub use request_log::RequestLog;
pub use store::{JsonSnapshotStore, SnapshotStore};
pub use upload::UploadStore;
