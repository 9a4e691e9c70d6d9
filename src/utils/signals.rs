//! Termination signal handling for the server process

use tracing::{debug, warn};

/// Resolve once SIGINT or SIGTERM is received
///
/// If the SIGTERM handler cannot be installed, only SIGINT (ctrl-c) is
/// awaited.
pub async fn shutdown_signal() {
	use tokio::signal;

	let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
		Ok(stream) => Some(stream),
		Err(e) => {
			warn!("Failed to setup SIGTERM handler: {}. Only SIGINT stops the server.", e);
			None
		}
	};

	let term = async {
		match sigterm.as_mut() {
			Some(s) => {
				s.recv().await;
			}
			None => std::future::pending::<()>().await,
		}
	};

	tokio::select! {
		_ = term => debug!("Received SIGTERM"),
		result = signal::ctrl_c() => match result {
			Ok(()) => debug!("Received SIGINT"),
			Err(e) => warn!("Failed to listen for SIGINT: {}", e),
		},
	}
}

// vim: ts=4
