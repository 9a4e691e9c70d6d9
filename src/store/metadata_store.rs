//! Filename to (version, hash list) map with optimistic version checks
//!
//! Each entry sits behind its own mutex so that updates to one filename are
//! serialized while updates to different filenames proceed independently.
//! The outer map lock is only held long enough to find or create an entry.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::logging::*;
use crate::types::{FileMetadata, Fingerprint, Index};

#[derive(Default)]
pub struct MetadataStore {
	files: RwLock<HashMap<String, Arc<Mutex<FileMetadata>>>>,
}

impl MetadataStore {
	pub fn new() -> Self {
		MetadataStore::default()
	}

	/// Snapshot of every entry
	///
	/// Each entry is read under its own lock, so every (version, hash list)
	/// pair is internally consistent.
	pub async fn get_file_info_map(&self) -> Index {
		let entries: Vec<(String, Arc<Mutex<FileMetadata>>)> = {
			let files = self.files.read().await;
			files.iter().map(|(name, entry)| (name.clone(), entry.clone())).collect()
		};

		let mut index = Index::new();
		for (name, entry) in entries {
			index.insert(name, entry.lock().await.clone());
		}
		index
	}

	/// Current metadata of one file, `(0, [])` if it was never written
	pub async fn read_file(&self, filename: &str) -> FileMetadata {
		let entry = self.files.read().await.get(filename).cloned();
		match entry {
			Some(entry) => entry.lock().await.clone(),
			None => FileMetadata::default(),
		}
	}

	/// Commit a new version of a file
	///
	/// An unknown filename is created with the proposed version. A known one is
	/// only replaced when `version` is exactly one more than the stored version.
	pub async fn update_file(&self, filename: &str, version: u64, hash_list: Vec<Fingerprint>) -> bool {
		let existing = self.files.read().await.get(filename).cloned();

		let entry = match existing {
			Some(entry) => entry,
			None => {
				let mut files = self.files.write().await;
				match files.entry(filename.to_string()) {
					Entry::Vacant(slot) => {
						slot.insert(Arc::new(Mutex::new(FileMetadata::new(version, hash_list))));
						info!("UpdateFile({}): created at version {}", filename, version);
						return true;
					}
					// Another writer created it between our two lock acquisitions
					Entry::Occupied(slot) => slot.get().clone(),
				}
			}
		};

		let mut current = entry.lock().await;
		// A file at u64::MAX can never move forward again
		if current.version.checked_add(1) != Some(version) {
			info!(
				"UpdateFile({}): rejected version {}, current is {}",
				filename, version, current.version
			);
			return false;
		}

		*current = FileMetadata::new(version, hash_list);
		info!("UpdateFile({}): now at version {}", filename, version);
		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn fp(c: char) -> String {
		c.to_string().repeat(64)
	}

	#[tokio::test]
	async fn test_unknown_file_created_with_proposed_version() {
		let store = MetadataStore::new();
		assert!(store.update_file("a.txt", 1, vec![fp('a')]).await);
		assert_eq!(store.read_file("a.txt").await, FileMetadata::new(1, vec![fp('a')]));
	}

	#[tokio::test]
	async fn test_read_unknown_file() {
		let store = MetadataStore::new();
		assert_eq!(store.read_file("nope").await, FileMetadata::new(0, vec![]));
	}

	#[tokio::test]
	async fn test_only_next_version_accepted() {
		let store = MetadataStore::new();
		assert!(store.update_file("f", 1, vec![fp('1')]).await);

		for stale in [0, 1, 3, 10] {
			assert!(!store.update_file("f", stale, vec![fp('x')]).await, "version {}", stale);
			assert_eq!(store.read_file("f").await, FileMetadata::new(1, vec![fp('1')]));
		}

		assert!(store.update_file("f", 2, vec![]).await);
		assert_eq!(store.read_file("f").await, FileMetadata::tombstone(2));
	}

	#[tokio::test]
	async fn test_file_info_map_snapshot() {
		let store = MetadataStore::new();
		store.update_file("a", 1, vec![fp('a')]).await;
		store.update_file("b", 1, vec![fp('b')]).await;
		store.update_file("b", 2, vec![]).await;

		let map = store.get_file_info_map().await;
		assert_eq!(map.len(), 2);
		assert_eq!(map["b"], FileMetadata::tombstone(2));
	}

	#[tokio::test]
	async fn test_concurrent_writers_one_winner() {
		let store = Arc::new(MetadataStore::new());
		store.update_file("race", 1, vec![fp('0')]).await;

		let mut handles = Vec::new();
		for i in 0..16u8 {
			let store = store.clone();
			handles.push(tokio::spawn(async move {
				store.update_file("race", 2, vec![format!("{:064x}", i)]).await
			}));
		}

		let mut accepted = 0;
		for handle in handles {
			if handle.await.unwrap() {
				accepted += 1;
			}
		}
		assert_eq!(accepted, 1);
		assert_eq!(store.read_file("race").await.version, 2);
	}

	#[tokio::test]
	async fn test_max_version_is_final() {
		let store = MetadataStore::new();
		assert!(store.update_file("end", u64::MAX, vec![fp('a')]).await);

		for next in [0, 1, u64::MAX] {
			assert!(!store.update_file("end", next, vec![]).await, "version {}", next);
		}
		assert_eq!(store.read_file("end").await, FileMetadata::new(u64::MAX, vec![fp('a')]));
	}
}

// vim: ts=4
