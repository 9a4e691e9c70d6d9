//! Wire messages
//!
//! One JSON object per line. Requests carry the method name in `method` and
//! the arguments in `params`; responses carry the result kind in `status`
//! and the value in `result`. Block bytes travel as standard base64.

use serde::{Deserialize, Serialize};

use crate::types::{FileMetadata, Fingerprint, Index};

/// Commands sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum Request {
	Ping,

	GetBlock {
		fingerprint: Fingerprint,
	},

	PutBlock {
		#[serde(with = "base64_bytes")]
		data: Vec<u8>,
	},

	HasBlocks {
		fingerprints: Vec<Fingerprint>,
	},

	GetFileInfoMap,

	ReadFile {
		filename: String,
	},

	UpdateFile {
		filename: String,
		version: u64,
		#[serde(rename = "hashList")]
		hash_list: Vec<Fingerprint>,
	},
}

impl Request {
	pub fn method(&self) -> &'static str {
		match self {
			Request::Ping => "ping",
			Request::GetBlock { .. } => "getBlock",
			Request::PutBlock { .. } => "putBlock",
			Request::HasBlocks { .. } => "hasBlocks",
			Request::GetFileInfoMap => "getFileInfoMap",
			Request::ReadFile { .. } => "readFile",
			Request::UpdateFile { .. } => "updateFile",
		}
	}
}

/// Block bytes with base64 serialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockData(#[serde(with = "base64_bytes")] pub Vec<u8>);

/// Responses sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "result", rename_all = "camelCase")]
pub enum Response {
	/// ping, putBlock, updateFile
	Bool(bool),

	/// getBlock; `None` when the block is not stored
	Block(Option<BlockData>),

	/// hasBlocks
	Fingerprints(Vec<Fingerprint>),

	/// getFileInfoMap
	FileInfoMap(Index),

	/// readFile
	FileInfo(FileMetadata),

	/// Request could not be served
	Error(String),
}

impl Response {
	pub fn kind(&self) -> &'static str {
		match self {
			Response::Bool(_) => "bool",
			Response::Block(_) => "block",
			Response::Fingerprints(_) => "fingerprints",
			Response::FileInfoMap(_) => "fileInfoMap",
			Response::FileInfo(_) => "fileInfo",
			Response::Error(_) => "error",
		}
	}
}

mod base64_bytes {
	use base64::engine::general_purpose::STANDARD;
	use base64::Engine as _;
	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&STANDARD.encode(data))
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
		let encoded = String::deserialize(deserializer)?;
		STANDARD.decode(encoded.as_bytes()).map_err(serde::de::Error::custom)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_update_file_wire_format() {
		let req = Request::UpdateFile {
			filename: "a.txt".to_string(),
			version: 2,
			hash_list: vec!["ab".to_string()],
		};
		let json = serde_json::to_string(&req).unwrap();
		assert_eq!(
			json,
			r#"{"method":"updateFile","params":{"filename":"a.txt","version":2,"hashList":["ab"]}}"#
		);
	}

	#[test]
	fn test_unit_requests_have_no_params() {
		assert_eq!(serde_json::to_string(&Request::Ping).unwrap(), r#"{"method":"ping"}"#);
		let parsed: Request = serde_json::from_str(r#"{"method":"getFileInfoMap"}"#).unwrap();
		assert_eq!(parsed, Request::GetFileInfoMap);
	}

	#[test]
	fn test_put_block_is_base64() {
		let req = Request::PutBlock { data: b"hello".to_vec() };
		let json = serde_json::to_string(&req).unwrap();
		assert_eq!(json, r#"{"method":"putBlock","params":{"data":"aGVsbG8="}}"#);
		let back: Request = serde_json::from_str(&json).unwrap();
		assert_eq!(back, req);
	}

	#[test]
	fn test_missing_block_response() {
		let json = serde_json::to_string(&Response::Block(None)).unwrap();
		assert_eq!(json, r#"{"status":"block","result":null}"#);
	}

	#[test]
	fn test_bad_base64_rejected() {
		let result: Result<Request, _> =
			serde_json::from_str(r#"{"method":"putBlock","params":{"data":"***"}}"#);
		assert!(result.is_err());
	}

	#[test]
	fn test_unknown_method_rejected() {
		let result: Result<Request, _> = serde_json::from_str(r#"{"method":"isLeader"}"#);
		assert!(result.is_err());
	}
}

// vim: ts=4
