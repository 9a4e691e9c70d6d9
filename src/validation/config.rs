//! Configuration validation functions

use super::ValidationError;
use crate::chunking::MAX_BLOCK_SIZE;

/// Validate the block size used by the chunker
///
/// # Arguments
/// * `block_size` - Maximum block length in bytes (must be 1..=64 MiB)
pub fn validate_block_size(block_size: usize) -> Result<(), ValidationError> {
	if block_size == 0 {
		return Err(ValidationError::ConfigError(
			"block size must be at least 1 byte".to_string(),
		));
	}
	if block_size > MAX_BLOCK_SIZE {
		return Err(ValidationError::ConfigError(format!(
			"block size must be at most {} bytes, got {}",
			MAX_BLOCK_SIZE, block_size
		)));
	}
	Ok(())
}

/// Validate request timeout in seconds
pub fn validate_timeout_secs(timeout_secs: u64) -> Result<(), ValidationError> {
	if timeout_secs == 0 {
		return Err(ValidationError::ConfigError("Timeout must be greater than 0".to_string()));
	}
	if timeout_secs > 3600 {
		return Err(ValidationError::ConfigError(format!(
			"Timeout too large: {} seconds (max 3600)",
			timeout_secs
		)));
	}
	Ok(())
}

/// Validate the number of concurrent per-file transfers
pub fn validate_parallel_transfers(count: usize) -> Result<(), ValidationError> {
	if count == 0 || count > 64 {
		return Err(ValidationError::ConfigError(format!(
			"parallel transfers must be between 1 and 64, got {}",
			count
		)));
	}
	Ok(())
}

/// Validate a `host:port` address
pub fn validate_address(address: &str) -> Result<(), ValidationError> {
	match address.rsplit_once(':') {
		Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => Ok(()),
		_ => Err(ValidationError::ConfigError(format!(
			"address must have the form host:port, got '{}'",
			address
		))),
	}
}
