//! Three-way reconciliation of local files, local index and remote index
//!
//! A run derives what changed locally since the last sync, downloads every
//! file the server has a newer version of, uploads every local change the
//! server has not seen, and builds the index to persist for the next run.
//!
//! Downloads and uploads of different files run concurrently. Each task
//! returns its own verdict; the new index is assembled from the verdicts once
//! the phase is over.

use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::config::TEMP_SUFFIX;
use crate::error::TransferError;
use crate::hash::HashAlgorithm;
use crate::logging::*;
use crate::protocol::{ProtocolError, RemoteStore};
use crate::scan::ScanResult;
use crate::types::{FileBlocks, FileMetadata, FilesData, Fingerprint, Index};
use crate::validation::{self, ValidationError};

/// Compare the scanned directory with the local index
///
/// New files start at version 1, changed files get the next version, files
/// missing from the directory become tombstones. Names for which `held`
/// returns true keep their local entry as is.
pub fn derive_local_metadata<F>(local: &Index, files: &FilesData, held: F) -> Index
where
	F: Fn(&str) -> bool,
{
	let mut metadata = Index::new();

	for (name, file) in files {
		if held(name.as_str()) {
			continue;
		}
		let meta = match local.get(name) {
			None => FileMetadata::new(1, file.hash_list.clone()),
			Some(prev) if prev.hash_list == file.hash_list => prev.clone(),
			Some(prev) => match next_version(name, prev) {
				Some(version) => FileMetadata::new(version, file.hash_list.clone()),
				None => prev.clone(),
			},
		};
		metadata.insert(name.clone(), meta);
	}

	for (name, prev) in local {
		if metadata.contains_key(name) {
			continue;
		}
		let meta = if held(name.as_str()) || prev.is_tombstone() {
			prev.clone()
		} else {
			match next_version(name, prev) {
				Some(version) => FileMetadata::tombstone(version),
				None => prev.clone(),
			}
		};
		metadata.insert(name.clone(), meta);
	}

	metadata
}

/// Version following `prev`, or `None` once the version space is exhausted
fn next_version(name: &str, prev: &FileMetadata) -> Option<u64> {
	let next = prev.version.checked_add(1);
	if next.is_none() {
		warn!("{} is at the highest possible version, local changes are not synced", name);
	}
	next
}

/// Remote entries that are new or newer than the local index
pub fn plan_downloads<F>(local: &Index, remote: &Index, held: F) -> Vec<(String, FileMetadata)>
where
	F: Fn(&str) -> bool,
{
	remote
		.iter()
		.filter(|(name, meta)| match local.get(*name) {
			None => true,
			Some(prev) => meta.version > prev.version,
		})
		.filter(|(name, _)| !held(name.as_str()))
		.map(|(name, meta)| (name.clone(), meta.clone()))
		.collect()
}

/// Derived entries the server has not seen yet
pub fn plan_uploads<F>(metadata: &Index, remote: &Index, held: F) -> Vec<(String, FileMetadata)>
where
	F: Fn(&str) -> bool,
{
	metadata
		.iter()
		.filter(|(name, meta)| match remote.get(*name) {
			None => true,
			Some(current) => current.version < meta.version,
		})
		.filter(|(name, _)| !held(name.as_str()))
		.map(|(name, meta)| (name.clone(), meta.clone()))
		.collect()
}

/// What happened to each file during a run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SyncReport {
	pub downloaded: Vec<String>,
	pub deleted: Vec<String>,
	pub uploaded: Vec<String>,
	/// Uploads the server rejected because it already has a newer version
	pub conflicts: Vec<String>,
	/// Files whose download or upload failed, with the reason
	pub failed: Vec<(String, String)>,
}

impl SyncReport {
	/// True if the run changed nothing locally or remotely
	pub fn is_noop(&self) -> bool {
		self.downloaded.is_empty()
			&& self.deleted.is_empty()
			&& self.uploaded.is_empty()
			&& self.conflicts.is_empty()
			&& self.failed.is_empty()
	}
}

enum Verdict {
	Downloaded,
	Deleted,
	/// Remote tombstone for a file that is already absent
	AlreadyDeleted,
	Uploaded,
	Conflict,
}

pub struct Reconciler<'a> {
	pub remote: &'a dyn RemoteStore,
	pub base_dir: &'a Path,
	pub algorithm: HashAlgorithm,
	/// Names owned by blocksync (index and lock file)
	pub reserved: &'a [&'a str],
	pub exclude: &'a [glob::Pattern],
	/// Files transferred concurrently
	pub parallel: usize,
}

impl Reconciler<'_> {
	fn is_excluded(&self, name: &str) -> bool {
		self.exclude.iter().any(|p| p.matches(name))
	}

	/// Run both transfer phases and compute the new local index
	///
	/// Never fails as a whole: per-file failures are logged, reported and
	/// leave the file's pre-run index entry in place.
	pub async fn run(&self, local: &Index, scan: &ScanResult, remote: &Index) -> (Index, SyncReport) {
		let held = |name: &str| scan.unreadable.contains(name) || self.is_excluded(name);
		let metadata = derive_local_metadata(local, &scan.files, held);

		let mut new_index = Index::new();
		let mut report = SyncReport::default();

		// Download phase
		let local_blocks = block_map(&scan.files);
		let local_blocks = &local_blocks;
		let downloads = plan_downloads(local, remote, held);
		debug!("{} file(s) to download", downloads.len());

		let results: Vec<_> = stream::iter(downloads.into_iter().map(|(name, meta)| async move {
			let result = self.download(&name, &meta, local_blocks).await;
			(name, meta, result)
		}))
		.buffer_unordered(self.parallel.max(1))
		.collect()
		.await;

		for (name, meta, result) in results {
			match result {
				Ok(Verdict::Deleted) => {
					info!("Deleted {} (version {})", name, meta.version);
					report.deleted.push(name.clone());
					new_index.insert(name, meta);
				}
				Ok(Verdict::AlreadyDeleted) => {
					debug!("{} deleted remotely at version {}, already absent", name, meta.version);
					new_index.insert(name, meta);
				}
				Ok(_) => {
					info!("Downloaded {} (version {})", name, meta.version);
					report.downloaded.push(name.clone());
					new_index.insert(name, meta);
				}
				Err(e) => {
					warn!("Download of {} aborted: {}{}", name, e, retry_hint(&e));
					report.failed.push((name, e.to_string()));
				}
			}
		}

		// Upload phase
		let uploads = plan_uploads(&metadata, remote, held);
		debug!("{} file(s) to upload", uploads.len());

		let files = &scan.files;
		let results: Vec<_> = stream::iter(uploads.into_iter().map(|(name, meta)| async move {
			let result = self.upload(&name, &meta, files.get(&name)).await;
			(name, meta, result)
		}))
		.buffer_unordered(self.parallel.max(1))
		.collect()
		.await;

		for (name, meta, result) in results {
			match result {
				Ok(Verdict::Conflict) => {
					info!("Version conflict on {}: server already has a newer version", name);
					report.conflicts.push(name);
				}
				Ok(_) => {
					info!("Uploaded {} (version {})", name, meta.version);
					report.uploaded.push(name.clone());
					new_index.insert(name, meta);
				}
				Err(e) => {
					warn!("Upload of {} failed: {}{}", name, e, retry_hint(&e));
					report.failed.push((name, e.to_string()));
				}
			}
		}

		// Everything not placed above keeps its pre-run entry
		for (name, prev) in local {
			new_index.entry(name.clone()).or_insert_with(|| prev.clone());
		}

		(new_index, report)
	}

	fn check_name(&self, name: &str) -> Result<(), TransferError> {
		validation::validate_filename(name, self.reserved).map_err(TransferError::UnsafeName)?;
		if name.ends_with(TEMP_SUFFIX) {
			return Err(TransferError::UnsafeName(ValidationError::PathError(format!(
				"'{}' is a temporary filename",
				name
			))));
		}
		Ok(())
	}

	async fn download(
		&self,
		name: &str,
		meta: &FileMetadata,
		local_blocks: &HashMap<&str, &[u8]>,
	) -> Result<Verdict, TransferError> {
		self.check_name(name)?;
		let path = self.base_dir.join(name);

		if meta.is_tombstone() {
			return match tokio::fs::remove_file(&path).await {
				Ok(()) => Ok(Verdict::Deleted),
				// Nothing to delete
				Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Verdict::AlreadyDeleted),
				Err(e) => Err(e.into()),
			};
		}

		let wanted = distinct(&meta.hash_list);
		let on_server: HashSet<Fingerprint> =
			self.remote.has_blocks(&wanted).await?.into_iter().collect();

		let missing: Vec<Fingerprint> = wanted
			.iter()
			.filter(|fp| !on_server.contains(*fp) && !local_blocks.contains_key(fp.as_str()))
			.cloned()
			.collect();
		if !missing.is_empty() {
			return Err(TransferError::MissingBlocks { missing });
		}

		// Blocks the server lost but this directory still has
		for fp in wanted.iter().filter(|fp| !on_server.contains(*fp)) {
			if let Some(data) = local_blocks.get(fp.as_str()) {
				debug!("Restoring block {} on server", fp);
				self.put(fp, data).await?;
			}
		}

		let mut fetched: HashMap<&str, Vec<u8>> = HashMap::new();
		for fp in wanted.iter().filter(|fp| !local_blocks.contains_key(fp.as_str())) {
			let data = self
				.remote
				.get_block(fp)
				.await?
				.ok_or_else(|| TransferError::BlockNotFound { fingerprint: fp.clone() })?;
			let actual = self.algorithm.fingerprint(&data);
			if &actual != fp {
				return Err(TransferError::HashMismatch { expected: fp.clone(), actual });
			}
			fetched.insert(fp.as_str(), data);
		}

		let mut contents = Vec::new();
		for fp in &meta.hash_list {
			let block = match local_blocks.get(fp.as_str()) {
				Some(data) => *data,
				None => fetched
					.get(fp.as_str())
					.map(Vec::as_slice)
					.ok_or_else(|| TransferError::BlockNotFound { fingerprint: fp.clone() })?,
			};
			contents.extend_from_slice(block);
		}

		write_atomically(&path, &contents).await?;
		Ok(Verdict::Downloaded)
	}

	async fn upload(
		&self,
		name: &str,
		meta: &FileMetadata,
		file: Option<&FileBlocks>,
	) -> Result<Verdict, TransferError> {
		if !self.remote.update_file(name, meta.version, &meta.hash_list).await? {
			return Ok(Verdict::Conflict);
		}

		// Tombstones carry no blocks
		let Some(file) = file else {
			return Ok(Verdict::Uploaded);
		};

		let wanted = distinct(&file.hash_list);
		if wanted.is_empty() {
			return Ok(Verdict::Uploaded);
		}
		let present: HashSet<Fingerprint> =
			self.remote.has_blocks(&wanted).await?.into_iter().collect();

		let blocks = block_map(std::iter::once((name, file)));
		for fp in wanted.iter().filter(|fp| !present.contains(*fp)) {
			if let Some(data) = blocks.get(fp.as_str()) {
				self.put(fp, data).await?;
			}
		}

		Ok(Verdict::Uploaded)
	}

	async fn put(&self, fingerprint: &str, data: &[u8]) -> Result<(), TransferError> {
		if self.remote.put_block(data).await? {
			Ok(())
		} else {
			Err(ProtocolError::Remote(format!("server refused block {}", fingerprint)).into())
		}
	}
}

fn retry_hint(e: &TransferError) -> &'static str {
	if e.is_retryable() {
		" (transient, retried on the next run)"
	} else {
		""
	}
}

/// Fingerprint to block bytes over every given file
fn block_map<'a, K, I>(files: I) -> HashMap<&'a str, &'a [u8]>
where
	I: IntoIterator<Item = (K, &'a FileBlocks)>,
{
	files
		.into_iter()
		.flat_map(|(_, f)| f.hash_list.iter().map(String::as_str).zip(f.blocks.iter().map(Vec::as_slice)))
		.collect()
}

/// Fingerprints in first-seen order, without repeats
fn distinct(hash_list: &[Fingerprint]) -> Vec<Fingerprint> {
	let mut seen = HashSet::new();
	hash_list.iter().filter(|fp| seen.insert(fp.as_str())).cloned().collect()
}

/// Write next to the target, then rename over it
async fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
	let mut tmp = path.as_os_str().to_owned();
	tmp.push(TEMP_SUFFIX);
	let tmp = PathBuf::from(tmp);

	if let Err(e) = tokio::fs::write(&tmp, contents).await {
		let _ = tokio::fs::remove_file(&tmp).await;
		return Err(e);
	}
	tokio::fs::rename(&tmp, path).await
}


// vim: ts=4
