//! flowprobe core library
//!
//! Shared error handling and the raw link-layer transmitter used by the
//! flowprobe frame builder and command-line tool.

pub mod error;
pub mod interface;

pub use error::{Error, Result};
pub use interface::{Interface, LinkSender};
