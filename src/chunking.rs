//! Fixed-size chunking
//!
//! Files are cut into blocks of exactly `block_size` bytes, except the last
//! one which holds whatever remains. An empty file yields no blocks.

use std::path::Path;
use tokio::io::AsyncReadExt;

use crate::error::ChunkError;
use crate::hash::HashAlgorithm;
use crate::types::FileBlocks;

/// Default block size in bytes
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Largest accepted block size (64 MiB)
pub const MAX_BLOCK_SIZE: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
	block_size: usize,
}

impl Chunker {
	pub fn new(block_size: usize) -> Result<Self, ChunkError> {
		if block_size == 0 {
			return Err(ChunkError::InvalidBlockSize { size: block_size });
		}
		Ok(Chunker { block_size })
	}

	/// Split in-memory data; every block owns a copy of its bytes
	pub fn split(&self, data: &[u8]) -> Vec<Vec<u8>> {
		data.chunks(self.block_size).map(|c| c.to_vec()).collect()
	}

	/// Read a file block by block, allocating a fresh buffer for each block
	pub async fn split_file(&self, path: &Path) -> Result<Vec<Vec<u8>>, ChunkError> {
		let mut file = tokio::fs::File::open(path).await?;
		let mut blocks = Vec::new();

		loop {
			let mut block = Vec::with_capacity(self.block_size);
			let n = (&mut file).take(self.block_size as u64).read_to_end(&mut block).await?;
			if n == 0 {
				break;
			}
			blocks.push(block);
			if n < self.block_size {
				break;
			}
		}

		Ok(blocks)
	}

	/// Read, split and fingerprint one file
	pub async fn chunk_file(
		&self,
		path: &Path,
		algorithm: HashAlgorithm,
	) -> Result<FileBlocks, ChunkError> {
		let blocks = self.split_file(path).await?;
		Ok(hash_blocks(blocks, algorithm))
	}
}

/// Fingerprint each block, keeping blocks and hashes in the same order
pub fn hash_blocks(blocks: Vec<Vec<u8>>, algorithm: HashAlgorithm) -> FileBlocks {
	let hash_list = blocks.iter().map(|b| algorithm.fingerprint(b)).collect();
	FileBlocks { hash_list, blocks }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_zero_block_size_rejected() {
		assert!(matches!(Chunker::new(0), Err(ChunkError::InvalidBlockSize { size: 0 })));
	}

	#[test]
	fn test_split_sizes() {
		let chunker = Chunker::new(4).unwrap();
		let blocks = chunker.split(b"abcdefghij");
		let sizes: Vec<usize> = blocks.iter().map(|b| b.len()).collect();
		assert_eq!(sizes, vec![4, 4, 2]);
		assert_eq!(blocks.concat(), b"abcdefghij");
	}

	#[test]
	fn test_split_empty() {
		let chunker = Chunker::new(4).unwrap();
		assert!(chunker.split(b"").is_empty());
	}

	#[tokio::test]
	async fn test_split_file_matches_split() {
		let dir = tempfile::TempDir::new().unwrap();
		let path = dir.path().join("data.bin");
		let content: Vec<u8> = (0..=255).cycle().take(1000).collect();
		std::fs::write(&path, &content).unwrap();

		let chunker = Chunker::new(128).unwrap();
		let from_file = chunker.split_file(&path).await.unwrap();
		assert_eq!(from_file, chunker.split(&content));
		assert_eq!(from_file.len(), 8);
	}

	#[tokio::test]
	async fn test_split_file_exact_multiple() {
		let dir = tempfile::TempDir::new().unwrap();
		let path = dir.path().join("even.bin");
		std::fs::write(&path, vec![7u8; 64]).unwrap();

		let blocks = Chunker::new(32).unwrap().split_file(&path).await.unwrap();
		assert_eq!(blocks.len(), 2);
		assert!(blocks.iter().all(|b| b.len() == 32));
	}

	#[test]
	fn test_hash_blocks_order() {
		let blocks = vec![b"one".to_vec(), b"two".to_vec()];
		let fb = hash_blocks(blocks, HashAlgorithm::Sha256);
		assert_eq!(fb.hash_list[0], HashAlgorithm::Sha256.fingerprint(b"one"));
		assert_eq!(fb.hash_list[1], HashAlgorithm::Sha256.fingerprint(b"two"));
	}
}

// vim: ts=4
