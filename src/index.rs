//! Local index persistence
//!
//! The index file holds one record per line: `filename,version,hash1 hash2 ...`.
//! A tombstone's empty hash list is written as the single token `0`.

use std::path::{Path, PathBuf};

use crate::config::TEMP_SUFFIX;
use crate::error::IndexError;
use crate::hash::is_fingerprint;
use crate::types::{FileMetadata, Index};

/// Placeholder written in place of an empty hash list
const EMPTY_HASH_LIST: &str = "0";

/// Parse index file contents
///
/// The filename is everything before the last two commas, so names that
/// contain commas survive a round trip.
pub fn parse_index(contents: &str) -> Result<Index, IndexError> {
	let mut index = Index::new();

	for (n, raw) in contents.lines().enumerate() {
		let line = raw.trim_end_matches('\r');
		if line.trim().is_empty() {
			continue;
		}

		let mut fields = line.rsplitn(3, ',');
		let (hashes, version, filename) = match (fields.next(), fields.next(), fields.next()) {
			(Some(h), Some(v), Some(f)) if !f.is_empty() => (h, v, f),
			_ => {
				return Err(IndexError::Corrupted {
					line: n + 1,
					message: format!("expected filename,version,hashes: {:?}", line),
				})
			}
		};

		let version: u64 = version.trim().parse().map_err(|_| IndexError::Corrupted {
			line: n + 1,
			message: format!("invalid version {:?}", version),
		})?;

		let mut hash_list = Vec::new();
		for token in hashes.split(' ').filter(|h| !h.is_empty() && *h != EMPTY_HASH_LIST) {
			if !is_fingerprint(token) {
				return Err(IndexError::Corrupted {
					line: n + 1,
					message: format!("invalid fingerprint {:?}", token),
				});
			}
			hash_list.push(token.to_string());
		}

		index.insert(filename.to_string(), FileMetadata::new(version, hash_list));
	}

	Ok(index)
}

/// Render an index in the on-disk format
pub fn format_index(index: &Index) -> String {
	let mut out = String::new();
	for (filename, meta) in index {
		let hashes =
			if meta.is_tombstone() { EMPTY_HASH_LIST.to_string() } else { meta.hash_list.join(" ") };
		out.push_str(&format!("{},{},{}\n", filename, meta.version, hashes));
	}
	out
}

/// Reads and writes the local index file of one base directory
pub struct IndexStore {
	path: PathBuf,
}

impl IndexStore {
	pub fn new(base_dir: &Path, file_name: &str) -> Self {
		IndexStore { path: base_dir.join(file_name) }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Create an empty index file if none exists yet
	pub async fn ensure_exists(&self) -> Result<(), IndexError> {
		if tokio::fs::try_exists(&self.path)
			.await
			.map_err(|e| IndexError::LoadFailed { source: e })?
		{
			return Ok(());
		}
		tokio::fs::write(&self.path, b"").await.map_err(|e| IndexError::SaveFailed { source: e })
	}

	/// Load the index; a missing file is an empty index
	pub async fn load(&self) -> Result<Index, IndexError> {
		let contents = match tokio::fs::read_to_string(&self.path).await {
			Ok(c) => c,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Index::new()),
			Err(e) => return Err(IndexError::LoadFailed { source: e }),
		};
		parse_index(&contents)
	}

	/// Replace the index file atomically (write a sibling file, then rename)
	pub async fn save(&self, index: &Index) -> Result<(), IndexError> {
		let mut tmp = self.path.clone().into_os_string();
		tmp.push(TEMP_SUFFIX);
		let tmp = PathBuf::from(tmp);

		tokio::fs::write(&tmp, format_index(index))
			.await
			.map_err(|e| IndexError::SaveFailed { source: e })?;
		tokio::fs::rename(&tmp, &self.path).await.map_err(|e| IndexError::SaveFailed { source: e })
	}

	/// Acquire an exclusive lock on the base directory
	pub async fn lock(&self, lock_name: &str) -> Result<IndexLock, IndexError> {
		let dir = self.path.parent().unwrap_or(Path::new("."));
		let lock_path = dir.join(lock_name);

		// create_new fails if another run holds the lock
		let pid = std::process::id();
		let result = tokio::fs::OpenOptions::new()
			.write(true)
			.create_new(true)
			.open(&lock_path)
			.await;

		match result {
			Ok(mut file) => {
				use tokio::io::AsyncWriteExt;
				file.write_all(pid.to_string().as_bytes()).await.map_err(|e| {
					IndexError::LockFailed { message: format!("Failed to write lock file: {}", e) }
				})?;
				Ok(IndexLock { path: lock_path })
			}
			Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Err(IndexError::LockFailed {
				message: format!(
					"Sync already in progress (lock file exists). If stale, delete: {}",
					lock_path.display()
				),
			}),
			Err(e) => Err(IndexError::LockFailed {
				message: format!("Failed to create lock file: {}", e),
			}),
		}
	}
}

/// RAII lock guard for exclusive access to a base directory
#[derive(Debug)]
pub struct IndexLock {
	path: PathBuf,
}

impl Drop for IndexLock {
	fn drop(&mut self) {
		// Remove lock file on drop (whether success or failure)
		let _ = std::fs::remove_file(&self.path);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn fp(c: char) -> String {
		c.to_string().repeat(64)
	}

	#[test]
	fn test_parse_drops_placeholder() {
		let index = parse_index("gone.txt,3,0\n").unwrap();
		assert_eq!(index["gone.txt"], FileMetadata::tombstone(3));
	}

	#[test]
	fn test_format_tombstone_as_zero() {
		let mut index = Index::new();
		index.insert("gone.txt".to_string(), FileMetadata::tombstone(2));
		assert_eq!(format_index(&index), "gone.txt,2,0\n");
	}

	#[test]
	fn test_parse_multiple_hashes() {
		let line = format!("a.txt,5,{} {}\n", fp('a'), fp('b'));
		let index = parse_index(&line).unwrap();
		assert_eq!(index["a.txt"], FileMetadata::new(5, vec![fp('a'), fp('b')]));
	}

	#[test]
	fn test_filename_with_commas() {
		let mut index = Index::new();
		index.insert("x,y,z.txt".to_string(), FileMetadata::new(1, vec![fp('c')]));
		let parsed = parse_index(&format_index(&index)).unwrap();
		assert_eq!(parsed, index);
	}

	#[test]
	fn test_parse_skips_blank_lines_and_crlf() {
		let text = format!("\r\na.txt,1,{}\r\n\n", fp('d'));
		let index = parse_index(&text).unwrap();
		assert_eq!(index.len(), 1);
		assert_eq!(index["a.txt"].hash_list, vec![fp('d')]);
	}

	#[test]
	fn test_parse_rejects_bad_version() {
		let result = parse_index("ok.txt,1,0\nbad.txt,one,0\n");
		match result {
			Err(IndexError::Corrupted { line, .. }) => assert_eq!(line, 2),
			other => panic!("expected corruption error, got {:?}", other),
		}
	}

	#[test]
	fn test_parse_rejects_bad_fingerprint() {
		assert!(matches!(parse_index("a.txt,1,xyz\n"), Err(IndexError::Corrupted { line: 1, .. })));
	}

	#[test]
	fn test_parse_rejects_missing_fields() {
		assert!(matches!(parse_index("lonely\n"), Err(IndexError::Corrupted { line: 1, .. })));
	}

	#[tokio::test]
	async fn test_store_save_and_load() {
		let dir = tempfile::TempDir::new().unwrap();
		let store = IndexStore::new(dir.path(), "index.txt");

		assert!(store.load().await.unwrap().is_empty());
		store.ensure_exists().await.unwrap();
		assert!(store.path().exists());

		let mut index = Index::new();
		index.insert("a.txt".to_string(), FileMetadata::new(1, vec![fp('e')]));
		index.insert("b.txt".to_string(), FileMetadata::tombstone(2));
		store.save(&index).await.unwrap();

		assert_eq!(store.load().await.unwrap(), index);
	}

	#[tokio::test]
	async fn test_lock_is_exclusive() {
		let dir = tempfile::TempDir::new().unwrap();
		let store = IndexStore::new(dir.path(), "index.txt");

		let guard = store.lock(".lock").await.unwrap();
		assert!(matches!(store.lock(".lock").await, Err(IndexError::LockFailed { .. })));
		drop(guard);
		assert!(store.lock(".lock").await.is_ok());
	}
}

// vim: ts=4
