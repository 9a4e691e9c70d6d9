//! Base directory scanning
//!
//! Only regular files directly inside the base directory take part in a
//! sync. Subdirectories, symlinks, blocksync's own files and excluded names
//! are skipped.

use std::collections::BTreeSet;
use std::path::Path;

use crate::chunking::Chunker;
use crate::config::TEMP_SUFFIX;
use crate::hash::HashAlgorithm;
use crate::logging::*;
use crate::types::FilesData;
use crate::validation::is_plain_filename;

/// Outcome of one directory scan
#[derive(Debug, Default)]
pub struct ScanResult {
	/// Readable files, chunked and hashed
	pub files: FilesData,

	/// Files that exist but could not be read this run
	pub unreadable: BTreeSet<String>,
}

pub struct Scanner<'a> {
	pub chunker: Chunker,
	pub algorithm: HashAlgorithm,
	pub reserved: &'a [&'a str],
	pub exclude: &'a [glob::Pattern],
}

impl Scanner<'_> {
	/// Should `name` be left out of the sync entirely
	pub fn is_ignored(&self, name: &str) -> bool {
		self.reserved.contains(&name)
			|| name.ends_with(TEMP_SUFFIX)
			|| !is_plain_filename(name)
			|| self.exclude.iter().any(|p| p.matches(name))
	}

	/// Chunk and hash every synced file in `dir`
	///
	/// Failing to list the directory is an error; failing to read one file
	/// only marks that file as unreadable.
	pub async fn scan(&self, dir: &Path) -> std::io::Result<ScanResult> {
		let mut result = ScanResult::default();
		let mut entries = tokio::fs::read_dir(dir).await?;

		while let Some(entry) = entries.next_entry().await? {
			let file_name = entry.file_name();
			let name = match file_name.to_str() {
				Some(n) => n.to_string(),
				None => {
					warn!("Skipping non-UTF-8 filename {:?}", file_name);
					continue;
				}
			};

			if self.is_ignored(&name) {
				debug!("Skipping {}", name.escape_debug());
				continue;
			}

			let file_type = match entry.file_type().await {
				Ok(t) => t,
				Err(e) => {
					warn!("Cannot stat {}: {}", name, e);
					result.unreadable.insert(name);
					continue;
				}
			};
			if !file_type.is_file() {
				continue;
			}

			match self.chunker.chunk_file(&entry.path(), self.algorithm).await {
				Ok(blocks) => {
					debug!("Scanned {} ({} blocks)", name, blocks.hash_list.len());
					result.files.insert(name, blocks);
				}
				Err(e) => {
					warn!("Cannot read {}: {}", name, e);
					result.unreadable.insert(name);
				}
			}
		}

		Ok(result)
	}
}

/// Remove temp files left behind by an interrupted run
pub async fn cleanup_temp_files(dir: &Path) -> std::io::Result<usize> {
	let mut count = 0;
	let mut entries = tokio::fs::read_dir(dir).await?;

	while let Some(entry) = entries.next_entry().await? {
		let name = entry.file_name();
		let is_temp = name.to_str().is_some_and(|n| n.ends_with(TEMP_SUFFIX));
		if !is_temp {
			continue;
		}

		debug!("Removing orphaned temp file: {:?}", entry.path());
		match tokio::fs::remove_file(entry.path()).await {
			Ok(()) => count += 1,
			// Already gone
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
			Err(e) => warn!("Failed to remove temp file {:?}: {}", entry.path(), e),
		}
	}

	if count > 0 {
		info!("Cleaned up {} temporary files", count);
	}
	Ok(count)
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	fn scanner<'a>(reserved: &'a [&'a str], exclude: &'a [glob::Pattern]) -> Scanner<'a> {
		Scanner {
			chunker: Chunker::new(4).unwrap(),
			algorithm: HashAlgorithm::Sha256,
			reserved,
			exclude,
		}
	}

	#[tokio::test]
	async fn test_scan_skips_reserved_and_subdirs() {
		let dir = TempDir::new().unwrap();
		std::fs::write(dir.path().join("a.txt"), b"hello world").unwrap();
		std::fs::write(dir.path().join("index.txt"), b"").unwrap();
		std::fs::write(dir.path().join("x.blocksync-tmp"), b"junk").unwrap();
		std::fs::create_dir(dir.path().join("sub")).unwrap();
		std::fs::write(dir.path().join("sub/b.txt"), b"nested").unwrap();

		let reserved = ["index.txt", ".blocksync.lock"];
		let result = scanner(&reserved, &[]).scan(dir.path()).await.unwrap();

		assert_eq!(result.files.keys().collect::<Vec<_>>(), vec!["a.txt"]);
		assert_eq!(result.files["a.txt"].blocks.len(), 3);
		assert!(result.unreadable.is_empty());
	}

	#[tokio::test]
	async fn test_scan_applies_exclude_patterns() {
		let dir = TempDir::new().unwrap();
		std::fs::write(dir.path().join("keep.txt"), b"1").unwrap();
		std::fs::write(dir.path().join("drop.log"), b"2").unwrap();

		let exclude = [glob::Pattern::new("*.log").unwrap()];
		let result = scanner(&[], &exclude).scan(dir.path()).await.unwrap();
		assert!(result.files.contains_key("keep.txt"));
		assert!(!result.files.contains_key("drop.log"));
	}

	#[tokio::test]
	async fn test_empty_file_has_no_blocks() {
		let dir = TempDir::new().unwrap();
		std::fs::write(dir.path().join("empty"), b"").unwrap();

		let result = scanner(&[], &[]).scan(dir.path()).await.unwrap();
		assert!(result.files["empty"].hash_list.is_empty());
	}

	#[tokio::test]
	async fn test_cleanup_removes_only_temp_files() {
		let dir = TempDir::new().unwrap();
		std::fs::write(dir.path().join("a.txt"), b"keep").unwrap();
		std::fs::write(dir.path().join("a.txt.blocksync-tmp"), b"partial").unwrap();

		assert_eq!(cleanup_temp_files(dir.path()).await.unwrap(), 1);
		assert!(dir.path().join("a.txt").exists());
		assert!(!dir.path().join("a.txt.blocksync-tmp").exists());
	}
}

// vim: ts=4
