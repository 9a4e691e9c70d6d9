//! Unified configuration for blocksync
//!
//! The configuration follows a priority chain:
//! 1. Built-in defaults (Config::default())
//! 2. Config file (`--config`, TOML if the extension is `.toml`, JSON5 otherwise)
//! 3. Environment variables (BLOCKSYNC_* prefix)
//! 4. CLI arguments (highest priority)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::chunking::DEFAULT_BLOCK_SIZE;
use crate::error::ConfigError;
use crate::hash::HashAlgorithm;
use crate::validation::{self, ValidationError};

/// Name of the lock file created in the base directory during a run
pub const LOCK_FILE_NAME: &str = ".blocksync.lock";

/// Suffix of temporary files written while a download is in flight
pub const TEMP_SUFFIX: &str = ".blocksync-tmp";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
	// ========================================================================
	// CLIENT
	// ========================================================================
	/// Server to synchronize against (host:port)
	pub server_address: String,

	/// Directory whose top-level files are synchronized
	pub base_dir: PathBuf,

	/// Maximum block length in bytes
	pub block_size: usize,

	/// Name of the local index file inside `base_dir`
	pub index_file: String,

	/// Glob patterns of filenames that are never scanned or uploaded
	pub exclude_patterns: Vec<String>,

	/// Number of files downloaded or uploaded concurrently
	pub parallel_transfers: usize,

	/// Timeout for every remote call
	pub request_timeout_secs: u64,

	// ========================================================================
	// SERVER
	// ========================================================================
	/// Address the server listens on
	pub listen_address: String,

	// ========================================================================
	// SHARED
	// ========================================================================
	/// Block fingerprint algorithm; must match between client and server
	pub hash_algorithm: HashAlgorithm,

	/// Default log level when RUST_LOG is unset
	pub log_level: String,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			server_address: "127.0.0.1:8080".to_string(),
			base_dir: PathBuf::from("."),
			block_size: DEFAULT_BLOCK_SIZE,
			index_file: "index.txt".to_string(),
			exclude_patterns: vec![],
			parallel_transfers: 4,
			request_timeout_secs: 30,
			listen_address: "127.0.0.1:8080".to_string(),
			hash_algorithm: HashAlgorithm::Sha256,
			log_level: "info".to_string(),
		}
	}
}

impl Config {
	/// Load a config file on top of the defaults
	pub fn load_file(path: &Path) -> Result<Config, ConfigError> {
		let display = path.display().to_string();
		let contents = std::fs::read_to_string(path)
			.map_err(|e| ConfigError::ReadFailed { path: display.clone(), source: e })?;

		let is_toml = path.extension().and_then(|e| e.to_str()) == Some("toml");
		if is_toml {
			toml::from_str(&contents)
				.map_err(|e| ConfigError::ParseFailed { path: display, message: e.to_string() })
		} else {
			json5::from_str(&contents)
				.map_err(|e| ConfigError::ParseFailed { path: display, message: e.to_string() })
		}
	}

	/// Apply BLOCKSYNC_* variables from the process environment
	pub fn apply_env(&mut self) -> Result<(), ConfigError> {
		self.apply_env_from(|key| std::env::var(key).ok())
	}

	/// Apply BLOCKSYNC_* variables looked up through `lookup`
	pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(v) = lookup("BLOCKSYNC_SERVER") {
			self.server_address = v;
		}
		if let Some(v) = lookup("BLOCKSYNC_LISTEN") {
			self.listen_address = v;
		}
		if let Some(v) = lookup("BLOCKSYNC_BASE_DIR") {
			self.base_dir = PathBuf::from(v);
		}
		if let Some(v) = lookup("BLOCKSYNC_BLOCK_SIZE") {
			self.block_size = parse_number("BLOCKSYNC_BLOCK_SIZE", &v)?;
		}
		if let Some(v) = lookup("BLOCKSYNC_HASH") {
			self.hash_algorithm = HashAlgorithm::from_name(&v)?;
		}
		if let Some(v) = lookup("BLOCKSYNC_TIMEOUT_SECS") {
			self.request_timeout_secs = parse_number("BLOCKSYNC_TIMEOUT_SECS", &v)?;
		}
		if let Some(v) = lookup("BLOCKSYNC_PARALLEL") {
			self.parallel_transfers = parse_number("BLOCKSYNC_PARALLEL", &v)?;
		}
		if let Some(v) = lookup("BLOCKSYNC_LOG") {
			self.log_level = v;
		}
		Ok(())
	}

	/// Validate the client side of the configuration
	pub fn validate_client(&self) -> Result<(), ConfigError> {
		validation::validate_address(&self.server_address)?;
		validation::validate_block_size(self.block_size)?;
		validation::validate_timeout_secs(self.request_timeout_secs)?;
		validation::validate_parallel_transfers(self.parallel_transfers)?;
		validation::validate_filename(&self.index_file, &[LOCK_FILE_NAME])?;
		self.exclude_matchers()?;
		Ok(())
	}

	/// Validate the server side of the configuration
	pub fn validate_server(&self) -> Result<(), ConfigError> {
		validation::validate_address(&self.listen_address)?;
		Ok(())
	}

	pub fn request_timeout(&self) -> Duration {
		Duration::from_secs(self.request_timeout_secs)
	}

	/// Compile the exclude patterns
	pub fn exclude_matchers(&self) -> Result<Vec<glob::Pattern>, ConfigError> {
		self.exclude_patterns
			.iter()
			.map(|p| {
				glob::Pattern::new(p).map_err(|e| {
					ConfigError::Invalid(ValidationError::ConfigError(format!(
						"invalid exclude pattern '{}': {}",
						p, e
					)))
				})
			})
			.collect()
	}

	/// Names inside the base directory that belong to blocksync itself
	pub fn reserved_names(&self) -> [&str; 2] {
		[self.index_file.as_str(), LOCK_FILE_NAME]
	}
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
	value.trim().parse().map_err(|_| {
		ConfigError::Invalid(ValidationError::ConfigError(format!(
			"{} must be a number, got '{}'",
			key, value
		)))
	})
}


// vim: ts=4
