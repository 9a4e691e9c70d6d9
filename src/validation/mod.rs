//! Centralized validation for blocksync
//!
//! - Configuration validation (block size, timeouts, parallelism)
//! - Filename validation (names coming from the server must stay inside the base directory)

use std::error::Error;
use std::fmt;

pub mod config;
pub mod path;

pub use config::*;
pub use path::*;

/// Generic validation error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
	/// Invalid configuration
	ConfigError(String),
	/// Invalid path
	PathError(String),
}

impl fmt::Display for ValidationError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ValidationError::ConfigError(msg) => write!(f, "Config validation error: {}", msg),
			ValidationError::PathError(msg) => write!(f, "Path validation error: {}", msg),
		}
	}
}

impl Error for ValidationError {}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_validation_error_display() {
		let err = ValidationError::ConfigError("test error".to_string());
		assert!(err.to_string().contains("Config validation error"));
	}

	#[test]
	fn test_validation_error_equality() {
		let err1 = ValidationError::PathError("test".to_string());
		let err2 = ValidationError::PathError("test".to_string());
		assert_eq!(err1, err2);
	}
}
