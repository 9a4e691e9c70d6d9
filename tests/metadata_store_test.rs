//! Server store properties
//!
//! Version monotonicity and the `current + 1` rule under concurrent writers,
//! and idempotent block storage.

use std::sync::Arc;

use blocksync::hash::HashAlgorithm;
use blocksync::store::{BlockStore, MetadataStore};
use blocksync::types::FileMetadata;

fn fp(data: &str) -> String {
	HashAlgorithm::Sha256.fingerprint(data.as_bytes())
}

#[tokio::test]
async fn test_versions_never_decrease() {
	let store = MetadataStore::new();
	let mut last = 0;

	for proposed in [1, 1, 3, 2, 2, 5, 3, 0, 4] {
		store.update_file("f", proposed, vec![fp(&proposed.to_string())]).await;
		let current = store.read_file("f").await.version;
		assert!(current >= last, "version went from {} to {}", last, current);
		last = current;
	}
	assert_eq!(last, 4);
}

#[tokio::test]
async fn test_unknown_file_accepts_any_version() {
	let store = MetadataStore::new();
	assert!(store.update_file("late", 7, vec![fp("x")]).await);
	assert!(!store.update_file("late", 7, vec![fp("y")]).await);
	assert!(store.update_file("late", 8, vec![]).await);
	assert_eq!(store.read_file("late").await, FileMetadata::tombstone(8));
}

#[tokio::test]
async fn test_concurrent_writers_one_winner() {
	let store = Arc::new(MetadataStore::new());
	store.update_file("contended", 1, vec![fp("base")]).await;

	let mut tasks = Vec::new();
	for i in 0..16 {
		let store = store.clone();
		tasks.push(tokio::spawn(async move {
			store.update_file("contended", 2, vec![fp(&format!("writer {}", i))]).await
		}));
	}

	let mut accepted = 0;
	for task in tasks {
		if task.await.unwrap() {
			accepted += 1;
		}
	}

	assert_eq!(accepted, 1);
	assert_eq!(store.read_file("contended").await.version, 2);
}

#[tokio::test]
async fn test_different_files_do_not_interfere() {
	let store = Arc::new(MetadataStore::new());

	let mut tasks = Vec::new();
	for i in 0..32 {
		let store = store.clone();
		tasks.push(tokio::spawn(async move {
			let name = format!("file-{}", i);
			store.update_file(&name, 1, vec![fp(&name)]).await
				&& store.update_file(&name, 2, vec![]).await
		}));
	}
	for task in tasks {
		assert!(task.await.unwrap());
	}

	let index = store.get_file_info_map().await;
	assert_eq!(index.len(), 32);
	assert!(index.values().all(|m| *m == FileMetadata::tombstone(2)));
}

#[tokio::test]
async fn test_idempotent_put() {
	let store = BlockStore::new(HashAlgorithm::Sha256);

	let first = store.put(b"same".to_vec()).await;
	let second = store.put(b"same".to_vec()).await;

	assert_eq!(first, second);
	assert_eq!(store.len().await, 1);
	assert_eq!(store.get(&first).await, Some(b"same".to_vec()));
}

// vim: ts=4
