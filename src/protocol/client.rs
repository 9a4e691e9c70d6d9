//! TCP client for the remote store
//!
//! Each call opens a connection, sends one request line and reads one
//! response line, all under the configured timeout. Calls share no state, so
//! concurrent transfers simply use concurrent connections.

use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use super::error::ProtocolError;
use super::messages::{Request, Response};
use super::traits::*;
use crate::logging::*;
use crate::types::{FileMetadata, Fingerprint, Index};

pub struct RpcClient {
	address: String,
	timeout: Duration,
}

impl RpcClient {
	pub fn new(address: &str, timeout: Duration) -> Self {
		RpcClient { address: address.to_string(), timeout }
	}

	/// Send one request and wait for its response
	///
	/// A server-side `Response::Error` is turned into `ProtocolError::Remote`.
	pub async fn call(&self, request: &Request) -> ProtocolResult<Response> {
		let method = request.method();
		let response = match tokio::time::timeout(self.timeout, self.exchange(request)).await {
			Ok(result) => result?,
			Err(_) => {
				debug!("{} to {} timed out after {:?}", method, self.address, self.timeout);
				return Err(ProtocolError::Timeout);
			}
		};

		match response {
			Response::Error(message) => Err(ProtocolError::Remote(message)),
			other => Ok(other),
		}
	}

	async fn exchange(&self, request: &Request) -> ProtocolResult<Response> {
		let stream = TcpStream::connect(&self.address).await?;
		let (read_half, mut write_half) = stream.into_split();

		let mut line = serde_json::to_string(request)?;
		line.push('\n');
		write_half.write_all(line.as_bytes()).await?;
		write_half.flush().await?;

		let mut reader = BufReader::new(read_half);
		let mut buf = String::new();
		if reader.read_line(&mut buf).await? == 0 {
			return Err(ProtocolError::Disconnected);
		}

		Ok(serde_json::from_str(buf.trim())?)
	}
}

fn unexpected(expected: &'static str, got: Response) -> ProtocolError {
	ProtocolError::UnexpectedResponse { expected, got: got.kind().to_string() }
}

#[async_trait]
impl RemoteStore for RpcClient {
	async fn ping(&self) -> ProtocolResult<bool> {
		match self.call(&Request::Ping).await? {
			Response::Bool(ok) => Ok(ok),
			other => Err(unexpected("bool", other)),
		}
	}

	async fn get_block(&self, fingerprint: &str) -> ProtocolResult<Option<Vec<u8>>> {
		let request = Request::GetBlock { fingerprint: fingerprint.to_string() };
		match self.call(&request).await? {
			Response::Block(block) => Ok(block.map(|b| b.0)),
			other => Err(unexpected("block", other)),
		}
	}

	async fn put_block(&self, data: &[u8]) -> ProtocolResult<bool> {
		match self.call(&Request::PutBlock { data: data.to_vec() }).await? {
			Response::Bool(ok) => Ok(ok),
			other => Err(unexpected("bool", other)),
		}
	}

	async fn has_blocks(&self, fingerprints: &[Fingerprint]) -> ProtocolResult<Vec<Fingerprint>> {
		let request = Request::HasBlocks { fingerprints: fingerprints.to_vec() };
		match self.call(&request).await? {
			Response::Fingerprints(present) => Ok(present),
			other => Err(unexpected("fingerprints", other)),
		}
	}

	async fn get_file_info_map(&self) -> ProtocolResult<Index> {
		match self.call(&Request::GetFileInfoMap).await? {
			Response::FileInfoMap(index) => Ok(index),
			other => Err(unexpected("fileInfoMap", other)),
		}
	}

	async fn read_file(&self, filename: &str) -> ProtocolResult<FileMetadata> {
		match self.call(&Request::ReadFile { filename: filename.to_string() }).await? {
			Response::FileInfo(meta) => Ok(meta),
			other => Err(unexpected("fileInfo", other)),
		}
	}

	async fn update_file(
		&self,
		filename: &str,
		version: u64,
		hash_list: &[Fingerprint],
	) -> ProtocolResult<bool> {
		let request = Request::UpdateFile {
			filename: filename.to_string(),
			version,
			hash_list: hash_list.to_vec(),
		};
		match self.call(&request).await? {
			Response::Bool(accepted) => Ok(accepted),
			other => Err(unexpected("bool", other)),
		}
	}
}

// vim: ts=4
