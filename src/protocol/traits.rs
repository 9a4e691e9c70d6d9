//! Core trait defining the remote store interface
//!
//! The reconciler depends only on this trait. `StoreService` implements it
//! in-process, `RpcClient` implements it over TCP.

use async_trait::async_trait;

use super::error::ProtocolError;
use crate::types::{FileMetadata, Fingerprint, Index};

/// Result type for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;

#[async_trait]
pub trait RemoteStore: Send + Sync {
	/// Liveness check
	async fn ping(&self) -> ProtocolResult<bool>;

	// === Blocks ===

	/// Fetch a block; `None` if the server does not hold it
	async fn get_block(&self, fingerprint: &str) -> ProtocolResult<Option<Vec<u8>>>;

	/// Store a block; the server computes its fingerprint
	async fn put_block(&self, data: &[u8]) -> ProtocolResult<bool>;

	/// Subset of `fingerprints` the server holds, in the same order
	async fn has_blocks(&self, fingerprints: &[Fingerprint]) -> ProtocolResult<Vec<Fingerprint>>;

	// === Metadata ===

	/// Every file the server knows about
	async fn get_file_info_map(&self) -> ProtocolResult<Index>;

	/// One file's metadata, `(0, [])` if unknown
	async fn read_file(&self, filename: &str) -> ProtocolResult<FileMetadata>;

	/// Commit `version` of `filename`; `Ok(false)` is a version conflict
	async fn update_file(
		&self,
		filename: &str,
		version: u64,
		hash_list: &[Fingerprint],
	) -> ProtocolResult<bool>;
}

// vim: ts=4
