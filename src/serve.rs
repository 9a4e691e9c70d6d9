//! Block and metadata server process
//!
//! Stores live in memory for the lifetime of the process. Nothing is
//! persisted; a restarted server starts empty and clients repopulate it.

use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::error::SyncError;
use crate::logging::*;
use crate::protocol::server;
use crate::store::StoreService;
use crate::utils::shutdown_signal;

/// Listen on `config.listen_address` until SIGINT or SIGTERM
pub async fn serve(config: &Config) -> Result<(), SyncError> {
	config.validate_server()?;

	let listener = TcpListener::bind(&config.listen_address).await?;
	info!("Listening on {} (hash: {})", listener.local_addr()?, config.hash_algorithm);

	let service = Arc::new(StoreService::new(config.hash_algorithm));
	serve_until(listener, service, shutdown_signal()).await
}

/// Serve connections on `listener` until `shutdown` resolves
pub async fn serve_until<F>(
	listener: TcpListener,
	service: Arc<StoreService>,
	shutdown: F,
) -> Result<(), SyncError>
where
	F: Future<Output = ()>,
{
	tokio::select! {
		_ = server::run(listener, service) => Ok(()),
		_ = shutdown => {
			info!("Shutting down");
			Ok(())
		}
	}
}

// vim: ts=4
