//! Block fingerprints
//!
//! Fingerprints are lowercase hex digests, 64 characters for both supported
//! algorithms. Client and server must be configured with the same algorithm.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::ConfigError;
use crate::types::Fingerprint;

/// Length of a hex fingerprint
pub const FINGERPRINT_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum HashAlgorithm {
	#[default]
	Sha256,
	Blake3,
}

impl HashAlgorithm {
	/// Resolve an algorithm by name; an unknown name is a fatal config error
	pub fn from_name(name: &str) -> Result<Self, ConfigError> {
		match name.trim().to_lowercase().as_str() {
			"sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
			"blake3" => Ok(HashAlgorithm::Blake3),
			_ => Err(ConfigError::UnknownHashAlgorithm { name: name.to_string() }),
		}
	}

	pub fn fingerprint(&self, data: &[u8]) -> Fingerprint {
		match self {
			HashAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
			HashAlgorithm::Blake3 => blake3::hash(data).to_hex().to_string(),
		}
	}
}

impl fmt::Display for HashAlgorithm {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			HashAlgorithm::Sha256 => write!(f, "sha256"),
			HashAlgorithm::Blake3 => write!(f, "blake3"),
		}
	}
}

/// Check that a token looks like a fingerprint (64 lowercase hex digits)
pub fn is_fingerprint(token: &str) -> bool {
	token.len() == FINGERPRINT_LEN
		&& token.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_sha256_known_vector() {
		assert_eq!(
			HashAlgorithm::Sha256.fingerprint(b"hello"),
			"2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
		);
	}

	#[test]
	fn test_fingerprint_deterministic() {
		for algo in [HashAlgorithm::Sha256, HashAlgorithm::Blake3] {
			assert_eq!(algo.fingerprint(b"block"), algo.fingerprint(b"block"));
			assert_ne!(algo.fingerprint(b"block a"), algo.fingerprint(b"block b"));
			assert!(is_fingerprint(&algo.fingerprint(b"")));
		}
	}

	#[test]
	fn test_algorithms_disagree() {
		assert_ne!(HashAlgorithm::Sha256.fingerprint(b"x"), HashAlgorithm::Blake3.fingerprint(b"x"));
	}

	#[test]
	fn test_from_name() {
		assert_eq!(HashAlgorithm::from_name("SHA256").unwrap(), HashAlgorithm::Sha256);
		assert_eq!(HashAlgorithm::from_name("blake3").unwrap(), HashAlgorithm::Blake3);
		assert!(matches!(
			HashAlgorithm::from_name("md5"),
			Err(ConfigError::UnknownHashAlgorithm { .. })
		));
	}

	#[test]
	fn test_is_fingerprint_rejects_placeholder() {
		assert!(!is_fingerprint("0"));
		assert!(!is_fingerprint(&"A".repeat(64)));
	}
}

// vim: ts=4
