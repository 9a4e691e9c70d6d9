//! Filename validation
//!
//! The index is flat: every synced file lives directly in the base directory.
//! Names received from the server are checked before anything touches disk.

use std::path::{Component, Path};

use super::ValidationError;

/// Check that a name is a single normal path component
///
/// Rejects empty names, `.`/`..`, anything with a separator, absolute paths,
/// and names containing a newline (they cannot be stored in the index file).
pub fn is_plain_filename(name: &str) -> bool {
	if name.is_empty() || name.contains('\n') || name.contains('\r') {
		return false;
	}
	let mut components = Path::new(name).components();
	matches!((components.next(), components.next()), (Some(Component::Normal(c)), None) if c.to_str() == Some(name))
}

/// Validate that a remote filename can be written inside the base directory
///
/// # Arguments
/// * `name` - Filename to validate
/// * `reserved` - Names owned by blocksync itself (index file, lock file)
pub fn validate_filename(name: &str, reserved: &[&str]) -> Result<(), ValidationError> {
	if !is_plain_filename(name) {
		return Err(ValidationError::PathError(format!(
			"'{}' is not a plain filename",
			name.escape_debug()
		)));
	}
	if reserved.contains(&name) {
		return Err(ValidationError::PathError(format!("'{}' is a reserved filename", name)));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_is_plain_filename_normal() {
		assert!(is_plain_filename("file.txt"));
		assert!(is_plain_filename("with space, and comma"));
		assert!(is_plain_filename(".hidden"));
	}

	#[test]
	fn test_is_plain_filename_rejects_traversal() {
		assert!(!is_plain_filename(".."));
		assert!(!is_plain_filename("."));
		assert!(!is_plain_filename("../etc/passwd"));
		assert!(!is_plain_filename("dir/file.txt"));
		assert!(!is_plain_filename("/etc/passwd"));
		assert!(!is_plain_filename(""));
		assert!(!is_plain_filename("two\nlines"));
	}

	#[test]
	fn test_validate_filename_reserved() {
		let reserved = ["index.txt"];
		assert!(validate_filename("a.txt", &reserved).is_ok());
		let result = validate_filename("index.txt", &reserved);
		assert!(result.unwrap_err().to_string().contains("reserved"));
	}

	#[test]
	fn test_validate_filename_error_message() {
		let result = validate_filename("../x", &[]);
		assert!(result.unwrap_err().to_string().contains("not a plain filename"));
	}
}
