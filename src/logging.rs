//! Logging prelude module for convenient access to tracing macros.
//!
//! # Usage
//!
//! ```ignore
//! use crate::logging::*;
//!
//! info!("Uploading {}", filename);
//! warn!("Download of {} aborted: {}", filename, err);
//! ```

pub use tracing::{debug, error, info, warn};

/// Initialize the tracing subscriber with environment filter support.
///
/// `RUST_LOG` always wins. Without it, `default_level` is used:
///
/// ```bash
/// RUST_LOG=debug blocksync sync 127.0.0.1:8080 ./dir 4096
/// RUST_LOG=blocksync::reconcile=trace blocksync sync 127.0.0.1:8080 ./dir 4096
/// ```
pub fn init_tracing(default_level: &str) {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
		)
		.with_writer(std::io::stderr)
		.init();
}
