pub mod json;
pub mod traits;

pub use json::JsonSnapshotStore;
pub use traits::SnapshotStore;
