//! # blocksync - block-level content-addressed file synchronizer
//!
//! A client splits the files of a directory into fixed-size blocks, names each
//! block by its content fingerprint and reconciles the directory against a
//! server holding a block store and a versioned metadata store. Concurrent
//! updates to the same file are serialized by an optimistic version check:
//! the server only accepts version `current + 1`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use blocksync::config::Config;
//! use blocksync::sync::sync;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.base_dir = "./data".into();
//!     let report = sync(&config).await?;
//!     println!("{} files uploaded", report.uploaded.len());
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod config;
pub mod error;
pub mod hash;
pub mod index;
pub mod logging;
pub mod protocol;
pub mod reconcile;
pub mod scan;
pub mod serve;
pub mod store;
pub mod sync;
pub mod types;
pub mod utils;
pub mod validation;

// Re-export commonly used types and functions
pub use config::Config;
pub use error::{ChunkError, ConfigError, IndexError, SyncError, TransferError};
pub use hash::HashAlgorithm;
pub use reconcile::SyncReport;
pub use sync::SyncBuilder;
pub use types::{FileBlocks, FileMetadata, FilesData, Fingerprint, Index};

// vim: ts=4
