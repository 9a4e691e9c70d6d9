//! Remote store protocol
//!
//! The reconciler talks to the server only through the [`RemoteStore`] trait.
//! Messages are typed per method and sent as newline-delimited JSON over TCP.
//!
//! # Example Usage
//!
//! ```ignore
//! use blocksync::protocol::{RemoteStore, RpcClient};
//!
//! let client = RpcClient::new("127.0.0.1:8080", Duration::from_secs(30));
//! let remote_index = client.get_file_info_map().await?;
//! ```

pub mod client;
pub mod error;
pub mod messages;
pub mod server;
pub mod traits;

// Re-export public API
pub use client::RpcClient;
pub use error::ProtocolError;
pub use messages::{BlockData, Request, Response};
pub use traits::{ProtocolResult, RemoteStore};

// vim: ts=4
