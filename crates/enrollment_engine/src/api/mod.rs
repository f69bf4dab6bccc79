/* 📖 # Why an API module in enrollment_engine?

The api module exposes the catalog, the upload store and the request log over HTTP. The
service implements the HttpService trait from enrollment_base, so the same code runs behind
RealPal (tiny_http) in production and behind MockPal in the unit tests.
*/

mod service;
mod upload_form;

pub use service::{ApiService, WELCOME_MESSAGE};
pub use upload_form::{UploadedFile, read_file_field};
