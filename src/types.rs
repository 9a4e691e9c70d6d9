use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hex-encoded content digest identifying a block
pub type Fingerprint = String;

/// Version and ordered block list of one file
///
/// An empty `hash_list` is a tombstone: the file was deleted at `version`.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct FileMetadata {
	pub version: u64,
	#[serde(rename = "hashList")]
	pub hash_list: Vec<Fingerprint>,
}

impl FileMetadata {
	pub fn new(version: u64, hash_list: Vec<Fingerprint>) -> Self {
		FileMetadata { version, hash_list }
	}

	pub fn tombstone(version: u64) -> Self {
		FileMetadata { version, hash_list: Vec::new() }
	}

	pub fn is_tombstone(&self) -> bool {
		self.hash_list.is_empty()
	}
}

/// Filename to metadata, used for the local index, the remote index and the
/// locally derived view alike
pub type Index = BTreeMap<String, FileMetadata>;

/// Blocks of one scanned file with their fingerprints, in file order
#[derive(Clone, PartialEq, Debug, Default)]
pub struct FileBlocks {
	pub hash_list: Vec<Fingerprint>,
	pub blocks: Vec<Vec<u8>>,
}

/// Every readable file of the base directory, chunked and hashed for this run
pub type FilesData = BTreeMap<String, FileBlocks>;


// vim: ts=4
