//! Protocol error types
//!
//! Every variant is a transport-level failure. A rejected `updateFile` is not
//! an error: it is a successful call that returned `false`.

use std::fmt;
use std::io;

#[derive(Debug)]
pub enum ProtocolError {
	/// I/O error on the connection
	Io(io::Error),
	/// Message could not be encoded or decoded
	Json(String),
	/// No response within the request timeout
	Timeout,
	/// Peer closed the connection before answering
	Disconnected,
	/// Server answered with an error message
	Remote(String),
	/// Server answered with the wrong kind of result
	UnexpectedResponse { expected: &'static str, got: String },
}

impl ProtocolError {
	/// Whether retrying the same call later may succeed
	pub fn is_retryable(&self) -> bool {
		matches!(self, ProtocolError::Io(_) | ProtocolError::Timeout | ProtocolError::Disconnected)
	}
}

impl fmt::Display for ProtocolError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ProtocolError::Io(e) => write!(f, "I/O error: {}", e),
			ProtocolError::Json(msg) => write!(f, "Message encoding error: {}", msg),
			ProtocolError::Timeout => write!(f, "Request timed out"),
			ProtocolError::Disconnected => write!(f, "Connection closed by peer"),
			ProtocolError::Remote(msg) => write!(f, "Server error: {}", msg),
			ProtocolError::UnexpectedResponse { expected, got } => {
				write!(f, "Protocol violation: expected {} response, got {}", expected, got)
			}
		}
	}
}

impl std::error::Error for ProtocolError {}

impl From<io::Error> for ProtocolError {
	fn from(e: io::Error) -> Self {
		ProtocolError::Io(e)
	}
}

impl From<serde_json::Error> for ProtocolError {
	fn from(e: serde_json::Error) -> Self {
		ProtocolError::Json(e.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_timeout_is_retryable_remote_is_not() {
		assert!(ProtocolError::Timeout.is_retryable());
		assert!(ProtocolError::Disconnected.is_retryable());
		assert!(!ProtocolError::Remote("boom".to_string()).is_retryable());
	}
}

// vim: ts=4
