//! Utility modules for common functionality

pub mod signals;

pub use signals::shutdown_signal;

// vim: ts=4
