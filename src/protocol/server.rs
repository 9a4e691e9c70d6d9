//! TCP server loop
//!
//! Every accepted connection gets its own task. A connection carries any
//! number of request lines; each is answered with exactly one response line.

use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use super::messages::{Request, Response};
use crate::logging::*;
use crate::store::StoreService;

/// Pause after a failed accept, so descriptor exhaustion does not spin
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Source of incoming connections
#[async_trait]
pub trait Acceptor: Send + Sync {
	async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)>;
}

#[async_trait]
impl Acceptor for TcpListener {
	async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
		TcpListener::accept(self).await
	}
}

/// Accept connections on `listener` forever
pub async fn run(listener: TcpListener, service: Arc<StoreService>) {
	accept_loop(&listener, service).await
}

/// Accept connections forever
///
/// A failed accept (EMFILE, a connection reset before accept) only affects
/// that one connection; the loop logs it and keeps going.
pub async fn accept_loop<A: Acceptor + ?Sized>(acceptor: &A, service: Arc<StoreService>) {
	loop {
		let (stream, peer) = match acceptor.accept().await {
			Ok(accepted) => accepted,
			Err(e) => {
				warn!("Accept failed: {}", e);
				tokio::time::sleep(ACCEPT_BACKOFF).await;
				continue;
			}
		};
		debug!("Connection from {}", peer);
		let service = service.clone();
		tokio::spawn(async move {
			if let Err(e) = serve_connection(stream, service).await {
				debug!("Connection from {} ended with error: {}", peer, e);
			}
		});
	}
}

/// Answer requests on one connection until the peer closes it
pub async fn serve_connection(stream: TcpStream, service: Arc<StoreService>) -> std::io::Result<()> {
	let (read_half, mut write_half) = stream.into_split();
	let mut reader = BufReader::new(read_half);
	let mut line = String::new();

	loop {
		line.clear();
		if reader.read_line(&mut line).await? == 0 {
			return Ok(()); // EOF
		}

		let trimmed = line.trim();
		if trimmed.is_empty() {
			continue;
		}

		let response = match serde_json::from_str::<Request>(trimmed) {
			Ok(request) => service.handle(request).await,
			Err(e) => {
				warn!("Malformed request: {}", e);
				Response::Error(format!("malformed request: {}", e))
			}
		};

		let mut out = match serde_json::to_string(&response) {
			Ok(json) => json,
			Err(e) => {
				error!("Cannot encode {} response: {}", response.kind(), e);
				serde_json::to_string(&Response::Error("internal encoding error".to_string()))
					.unwrap_or_default()
			}
		};
		out.push('\n');
		write_half.write_all(out.as_bytes()).await?;
		write_half.flush().await?;
	}
}

// vim: ts=4
