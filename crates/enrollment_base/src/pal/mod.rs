/* 📖 # What is the Platform Abstraction Layer?

The PAL is the only place that touches the filesystem or opens sockets. The snapshot store,
the upload directory, the request log and the HTTP server all go through the Pal trait:
- RealPal: std::fs and tiny_http, with every path resolved against a base directory
- MockPal: in-memory files and a request simulator, used by the unit tests
*/

mod file_path;
pub mod http;
pub mod mock;
pub mod real_pal;
mod traits;

pub use file_path::FilePath;
pub use mock::MockPal;
pub use real_pal::RealPal;
pub use traits::{Pal, PalHandle, ReadSeek};
