//! # Relay Telemetry
//!
//! Structured logging for the signed notification relay.
//!
//! Libraries only emit `tracing` events; installing the global subscriber is
//! the binary's job and happens once, through [`init_logging`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relay_telemetry::{init_logging, LoggingConfig};
//!
//! init_logging(&LoggingConfig::from_env())?;
//! let span = relay_telemetry::component_span!("dispatcher");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LOG_ENV` | `development` | `production` switches to JSON logs |
//! | `LOG_LEVEL` | `debug` | Filter directive |
//! | `RUST_LOG` | unset | Overrides `LOG_LEVEL` |

mod config;
mod logging;

pub use config::LoggingConfig;
pub use logging::init_logging;

use thiserror::Error;

#[doc(hidden)]
pub use tracing;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Global subscriber already installed: {0}")]
    AlreadyInitialized(String),
}

/// Root span of a long-lived component; every event of the component is
/// parented to it.
///
/// ```rust,ignore
/// let span = component_span!("subscription_broker", max_per_user = 5);
/// ```
#[macro_export]
macro_rules! component_span {
    ($name:expr) => {
        $crate::tracing::info_span!($name)
    };
    ($name:expr, $($field:tt)*) => {
        $crate::tracing::info_span!($name, $($field)*)
    };
}
