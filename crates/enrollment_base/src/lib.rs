/* 📖 # Why have enrollment_base as a core library?
enrollment_base provides the error type, tracing setup and the platform abstraction layer
shared by the engine and the server binary. Keeping them here prevents the engine from
depending on the binary crate and keeps filesystem and network access behind one trait.
*/

pub mod error;
mod error_tests;
pub mod pal;
pub mod tracing;

// Re-export commonly used types for convenience
pub use error::{EnrollmentError, EnrollmentResult, ErrorKind, ResultExt};
pub use pal::{FilePath, MockPal, Pal, PalHandle, RealPal};
