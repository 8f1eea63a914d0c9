// SPDX-License-Identifier: MIT OR Apache-2.0
//! errtree-telemetry
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Report sinks and tracing setup. [`TracingSink`] is the default sink used
//! when a taxonomy is built without one.

mod sinks;

pub use sinks::{CollectingSink, FanoutSink, NoopSink, Report, TracingSink};

use errtree_config::TaxonomyConfig;
use tracing_subscriber::EnvFilter;

/// Level used when a config leaves `log_level` unset.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Errors from telemetry setup.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// A global subscriber was already installed, or the filter was invalid.
    #[error("failed to install tracing subscriber: {reason}")]
    SubscriberInit {
        /// Underlying failure.
        reason: String,
    },
}

/// Build the env filter used by [`init_tracing`].
///
/// `RUST_LOG` wins when set; otherwise `errtree=<level>`.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("errtree={level}")))
}

/// Install a global `fmt` subscriber for the `errtree.*` targets.
///
/// # Errors
///
/// Returns [`TelemetryError::SubscriberInit`] if a global subscriber is
/// already set.
pub fn init_tracing(level: &str) -> Result<(), TelemetryError> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .try_init()
        .map_err(|e| TelemetryError::SubscriberInit {
            reason: e.to_string(),
        })
}

/// Level `config` asks for, after env overrides were applied by the loader.
pub fn config_level(config: &TaxonomyConfig) -> &str {
    config.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
}

/// [`init_tracing`] at the level named by `config.log_level`.
///
/// # Errors
///
/// Returns [`TelemetryError::SubscriberInit`] if a global subscriber is
/// already set.
pub fn init_tracing_from(config: &TaxonomyConfig) -> Result<(), TelemetryError> {
    init_tracing(config_level(config))
}
