//! One client synchronization run
//!
//! ```rust,ignore
//! use blocksync::sync::SyncBuilder;
//!
//! let report = SyncBuilder::new()
//!     .server("127.0.0.1:8080")
//!     .base_dir("./data")
//!     .block_size(4096)
//!     .sync()
//!     .await?;
//! println!("{} uploaded, {} downloaded", report.uploaded.len(), report.downloaded.len());
//! ```

use std::path::PathBuf;

use crate::chunking::Chunker;
use crate::config::{Config, LOCK_FILE_NAME};
use crate::error::SyncError;
use crate::hash::HashAlgorithm;
use crate::index::{format_index, IndexStore};
use crate::logging::*;
use crate::protocol::{RemoteStore, RpcClient};
use crate::reconcile::{Reconciler, SyncReport};
use crate::scan::{cleanup_temp_files, Scanner};

/// Synchronize `config.base_dir` with the server at `config.server_address`
pub async fn sync(config: &Config) -> Result<SyncReport, SyncError> {
	let client = RpcClient::new(&config.server_address, config.request_timeout());
	sync_with(config, &client).await
}

/// Synchronize against any remote store implementation
///
/// The local index is only rewritten if the run gets past fetching the
/// remote index; per-file failures do not prevent the write.
pub async fn sync_with(config: &Config, remote: &dyn RemoteStore) -> Result<SyncReport, SyncError> {
	config.validate_client()?;
	let chunker = Chunker::new(config.block_size)?;
	let exclude = config.exclude_matchers()?;
	let reserved = config.reserved_names();

	let store = IndexStore::new(&config.base_dir, &config.index_file);
	let _lock = store.lock(LOCK_FILE_NAME).await?;

	cleanup_temp_files(&config.base_dir).await?;
	store.ensure_exists().await?;
	let local = store.load().await?;
	debug!("Loaded {} index entries from {}", local.len(), store.path().display());

	let scanner = Scanner { chunker, algorithm: config.hash_algorithm, reserved: &reserved, exclude: &exclude };
	let scan = scanner.scan(&config.base_dir).await?;
	info!("Scanned {} file(s) in {}", scan.files.len(), config.base_dir.display());

	if !remote.ping().await? {
		return Err(SyncError::ServerUnavailable { address: config.server_address.clone() });
	}
	let remote_index = remote.get_file_info_map().await?;
	debug!("Server knows {} file(s)", remote_index.len());

	let reconciler = Reconciler {
		remote,
		base_dir: &config.base_dir,
		algorithm: config.hash_algorithm,
		reserved: &reserved,
		exclude: &exclude,
		parallel: config.parallel_transfers,
	};
	let (new_index, report) = reconciler.run(&local, &scan, &remote_index).await;

	store.save(&new_index).await?;
	debug!("New local index:\n{}", format_index(&new_index));

	info!(
		"Sync finished: {} uploaded, {} downloaded, {} deleted, {} conflicts, {} failed",
		report.uploaded.len(),
		report.downloaded.len(),
		report.deleted.len(),
		report.conflicts.len(),
		report.failed.len()
	);
	Ok(report)
}

/// Fluent construction of a sync run
#[derive(Debug, Clone, Default)]
pub struct SyncBuilder {
	config: Config,
}

impl SyncBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Start from an already loaded configuration
	pub fn from_config(config: Config) -> Self {
		SyncBuilder { config }
	}

	pub fn server(mut self, address: &str) -> Self {
		self.config.server_address = address.to_string();
		self
	}

	pub fn base_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
		self.config.base_dir = dir.into();
		self
	}

	pub fn block_size(mut self, size: usize) -> Self {
		self.config.block_size = size;
		self
	}

	pub fn hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
		self.config.hash_algorithm = algorithm;
		self
	}

	pub fn parallel_transfers(mut self, count: usize) -> Self {
		self.config.parallel_transfers = count;
		self
	}

	pub fn exclude(mut self, pattern: &str) -> Self {
		self.config.exclude_patterns.push(pattern.to_string());
		self
	}

	/// Run against the configured server over TCP
	pub async fn sync(self) -> Result<SyncReport, SyncError> {
		sync(&self.config).await
	}

	/// Run against the given store
	pub async fn sync_with(self, remote: &dyn RemoteStore) -> Result<SyncReport, SyncError> {
		sync_with(&self.config, remote).await
	}
}

// vim: ts=4
