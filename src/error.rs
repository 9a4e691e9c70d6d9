//! Error types for blocksync operations

use std::error::Error;
use std::fmt;
use std::io;

use crate::protocol::ProtocolError;
use crate::validation::ValidationError;

/// Main error type for a sync run or a server startup
#[derive(Debug)]
pub enum SyncError {
	/// I/O error outside of any single file's operation
	Io(io::Error),

	/// Remote call failed for a run-level operation (ping, fetching the index)
	Protocol(ProtocolError),

	/// Local index could not be read or written
	Index(IndexError),

	/// Chunker misconfiguration or read failure
	Chunk(ChunkError),

	/// Invalid configuration
	Config(ConfigError),

	/// Server did not answer ping positively
	ServerUnavailable { address: String },
}

impl fmt::Display for SyncError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SyncError::Io(e) => write!(f, "I/O error: {}", e),
			SyncError::Protocol(e) => write!(f, "Remote call failed: {}", e),
			SyncError::Index(e) => write!(f, "Index error: {}", e),
			SyncError::Chunk(e) => write!(f, "Chunk error: {}", e),
			SyncError::Config(e) => write!(f, "{}", e),
			SyncError::ServerUnavailable { address } => {
				write!(f, "Server at {} is not available", address)
			}
		}
	}
}

impl Error for SyncError {}

impl From<io::Error> for SyncError {
	fn from(e: io::Error) -> Self {
		SyncError::Io(e)
	}
}

impl From<ProtocolError> for SyncError {
	fn from(e: ProtocolError) -> Self {
		SyncError::Protocol(e)
	}
}

impl From<IndexError> for SyncError {
	fn from(e: IndexError) -> Self {
		SyncError::Index(e)
	}
}

impl From<ChunkError> for SyncError {
	fn from(e: ChunkError) -> Self {
		SyncError::Chunk(e)
	}
}

impl From<ConfigError> for SyncError {
	fn from(e: ConfigError) -> Self {
		SyncError::Config(e)
	}
}

/// Chunking-specific errors
#[derive(Debug)]
pub enum ChunkError {
	/// Failed to read file data
	ReadFailed { source: io::Error },

	/// Invalid block size
	InvalidBlockSize { size: usize },
}

impl fmt::Display for ChunkError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ChunkError::ReadFailed { source } => write!(f, "Failed to read block: {}", source),
			ChunkError::InvalidBlockSize { size } => {
				write!(f, "Invalid block size {}: must be at least 1 byte", size)
			}
		}
	}
}

impl Error for ChunkError {}

impl From<io::Error> for ChunkError {
	fn from(e: io::Error) -> Self {
		ChunkError::ReadFailed { source: e }
	}
}

/// Local index persistence errors
#[derive(Debug)]
pub enum IndexError {
	/// Failed to load the index file
	LoadFailed { source: io::Error },

	/// Failed to save the index file
	SaveFailed { source: io::Error },

	/// Another run holds the lock on the base directory
	LockFailed { message: String },

	/// A record in the index file could not be parsed
	Corrupted { line: usize, message: String },
}

impl fmt::Display for IndexError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			IndexError::LoadFailed { source } => write!(f, "Failed to load index: {}", source),
			IndexError::SaveFailed { source } => write!(f, "Failed to save index: {}", source),
			IndexError::LockFailed { message } => write!(f, "Lock failed: {}", message),
			IndexError::Corrupted { line, message } => {
				write!(f, "Index corrupted at line {}: {}", line, message)
			}
		}
	}
}

impl Error for IndexError {}

/// Configuration errors, all fatal at startup
#[derive(Debug)]
pub enum ConfigError {
	/// Config file could not be read
	ReadFailed { path: String, source: io::Error },

	/// Config file could not be parsed
	ParseFailed { path: String, message: String },

	/// Hash algorithm name is not supported by this build
	UnknownHashAlgorithm { name: String },

	/// A value failed validation
	Invalid(ValidationError),
}

impl fmt::Display for ConfigError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ConfigError::ReadFailed { path, source } => {
				write!(f, "Cannot read config file {}: {}", path, source)
			}
			ConfigError::ParseFailed { path, message } => {
				write!(f, "Cannot parse config file {}: {}", path, message)
			}
			ConfigError::UnknownHashAlgorithm { name } => {
				write!(f, "Hash algorithm '{}' is not available", name)
			}
			ConfigError::Invalid(e) => write!(f, "Invalid configuration: {}", e),
		}
	}
}

impl Error for ConfigError {}

impl From<ValidationError> for ConfigError {
	fn from(e: ValidationError) -> Self {
		ConfigError::Invalid(e)
	}
}

/// Failure of a single file's download or upload
///
/// These never abort a run: the reconciler logs them and keeps the file's
/// previous index entry.
#[derive(Debug)]
pub enum TransferError {
	/// Remote call failed
	Protocol(ProtocolError),

	/// Local file could not be read, written or removed
	Io(io::Error),

	/// Some blocks are neither local nor on the server
	MissingBlocks { missing: Vec<String> },

	/// Server reported a block as present but returned nothing for it
	BlockNotFound { fingerprint: String },

	/// Fetched block does not match its fingerprint
	HashMismatch { expected: String, actual: String },

	/// Filename cannot be safely written inside the base directory
	UnsafeName(ValidationError),
}

impl fmt::Display for TransferError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TransferError::Protocol(e) => write!(f, "{}", e),
			TransferError::Io(e) => write!(f, "I/O error: {}", e),
			TransferError::MissingBlocks { missing } => {
				write!(f, "{} block(s) missing on server", missing.len())
			}
			TransferError::BlockNotFound { fingerprint } => {
				write!(f, "Block {} not found on server", fingerprint)
			}
			TransferError::HashMismatch { expected, actual } => {
				write!(f, "Hash mismatch: expected {}, got {}", expected, actual)
			}
			TransferError::UnsafeName(e) => write!(f, "{}", e),
		}
	}
}

impl TransferError {
	/// Whether the same transfer may succeed on a later run
	pub fn is_retryable(&self) -> bool {
		matches!(self, TransferError::Protocol(e) if e.is_retryable())
	}
}

impl Error for TransferError {}

impl From<ProtocolError> for TransferError {
	fn from(e: ProtocolError) -> Self {
		TransferError::Protocol(e)
	}
}

impl From<io::Error> for TransferError {
	fn from(e: io::Error) -> Self {
		TransferError::Io(e)
	}
}


// vim: ts=4
