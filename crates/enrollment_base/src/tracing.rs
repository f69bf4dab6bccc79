use crate::error::{EnrollmentError, EnrollmentResult};
pub use tracing::instrument;
pub use tracing::{debug, error, info, trace, warn};
use tracing_error::ErrorLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "info";

pub fn init_tracing() -> EnrollmentResult<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| {
            Box::new(EnrollmentError::message(format!(
                "Failed to install tracing subscriber: {}",
                e
            )))
        })?;
    Ok(())
}
