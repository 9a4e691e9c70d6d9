//! Content-addressed block storage
//!
//! Stores blocks by their fingerprint. Never stores the same content twice.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::hash::HashAlgorithm;
use crate::logging::*;
use crate::types::Fingerprint;

pub struct BlockStore {
	algorithm: HashAlgorithm,
	blocks: RwLock<HashMap<Fingerprint, Arc<Vec<u8>>>>,
}

impl BlockStore {
	pub fn new(algorithm: HashAlgorithm) -> Self {
		BlockStore { algorithm, blocks: RwLock::new(HashMap::new()) }
	}

	/// Store a block under its own fingerprint
	///
	/// Returns the fingerprint. Storing bytes that are already present leaves
	/// the store unchanged.
	pub async fn put(&self, data: Vec<u8>) -> Fingerprint {
		let fingerprint = self.algorithm.fingerprint(&data);
		let mut blocks = self.blocks.write().await;
		if blocks.contains_key(&fingerprint) {
			debug!("PutBlock({}): already stored", fingerprint);
		} else {
			debug!("PutBlock({}): {} bytes", fingerprint, data.len());
			blocks.insert(fingerprint.clone(), Arc::new(data));
		}
		fingerprint
	}

	pub async fn get(&self, fingerprint: &str) -> Option<Vec<u8>> {
		let block = self.blocks.read().await.get(fingerprint).cloned();
		debug!("GetBlock({}): {}", fingerprint, if block.is_some() { "found" } else { "missing" });
		block.map(|b| b.as_ref().clone())
	}

	pub async fn contains(&self, fingerprint: &str) -> bool {
		self.blocks.read().await.contains_key(fingerprint)
	}

	/// Return the requested fingerprints that are stored, in request order
	pub async fn has_blocks(&self, fingerprints: &[Fingerprint]) -> Vec<Fingerprint> {
		let blocks = self.blocks.read().await;
		let present: Vec<Fingerprint> =
			fingerprints.iter().filter(|f| blocks.contains_key(f.as_str())).cloned().collect();
		debug!("HasBlocks(): {} of {} present", present.len(), fingerprints.len());
		present
	}

	pub async fn len(&self) -> usize {
		self.blocks.read().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.blocks.read().await.is_empty()
	}
}


// vim: ts=4
