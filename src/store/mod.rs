//! Server-side state
//!
//! `StoreService` owns one block store and one metadata store for the whole
//! process lifetime and is shared by handle with every connection task.

pub mod block_store;
pub mod metadata_store;

pub use block_store::BlockStore;
pub use metadata_store::MetadataStore;

use async_trait::async_trait;

use crate::hash::HashAlgorithm;
use crate::protocol::{BlockData, ProtocolResult, RemoteStore, Request, Response};
use crate::types::{FileMetadata, Fingerprint, Index};

pub struct StoreService {
	blocks: BlockStore,
	metadata: MetadataStore,
}

impl StoreService {
	pub fn new(algorithm: HashAlgorithm) -> Self {
		StoreService { blocks: BlockStore::new(algorithm), metadata: MetadataStore::new() }
	}

	pub fn blocks(&self) -> &BlockStore {
		&self.blocks
	}

	pub fn metadata(&self) -> &MetadataStore {
		&self.metadata
	}

	/// Dispatch one decoded request
	pub async fn handle(&self, request: Request) -> Response {
		match request {
			Request::Ping => Response::Bool(true),
			Request::GetBlock { fingerprint } => {
				Response::Block(self.blocks.get(&fingerprint).await.map(BlockData))
			}
			Request::PutBlock { data } => {
				self.blocks.put(data).await;
				Response::Bool(true)
			}
			Request::HasBlocks { fingerprints } => {
				Response::Fingerprints(self.blocks.has_blocks(&fingerprints).await)
			}
			Request::GetFileInfoMap => Response::FileInfoMap(self.metadata.get_file_info_map().await),
			Request::ReadFile { filename } => {
				Response::FileInfo(self.metadata.read_file(&filename).await)
			}
			Request::UpdateFile { filename, version, hash_list } => {
				Response::Bool(self.metadata.update_file(&filename, version, hash_list).await)
			}
		}
	}
}

/// In-process access, used when client and stores share a process
#[async_trait]
impl RemoteStore for StoreService {
	async fn ping(&self) -> ProtocolResult<bool> {
		Ok(true)
	}

	async fn get_block(&self, fingerprint: &str) -> ProtocolResult<Option<Vec<u8>>> {
		Ok(self.blocks.get(fingerprint).await)
	}

	async fn put_block(&self, data: &[u8]) -> ProtocolResult<bool> {
		self.blocks.put(data.to_vec()).await;
		Ok(true)
	}

	async fn has_blocks(&self, fingerprints: &[Fingerprint]) -> ProtocolResult<Vec<Fingerprint>> {
		Ok(self.blocks.has_blocks(fingerprints).await)
	}

	async fn get_file_info_map(&self) -> ProtocolResult<Index> {
		Ok(self.metadata.get_file_info_map().await)
	}

	async fn read_file(&self, filename: &str) -> ProtocolResult<FileMetadata> {
		Ok(self.metadata.read_file(filename).await)
	}

	async fn update_file(
		&self,
		filename: &str,
		version: u64,
		hash_list: &[Fingerprint],
	) -> ProtocolResult<bool> {
		Ok(self.metadata.update_file(filename, version, hash_list.to_vec()).await)
	}
}


// vim: ts=4
