//! Error types for flowprobe

use thiserror::Error;

/// Result type alias for flowprobe operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for flowprobe
#[derive(Error, Debug)]
pub enum Error {
    /// Network I/O error
    #[error("Network I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// IPv4 protocol number the frame builder cannot encode
    #[error("Unsupported IPv4 protocol: {0:#04x}")]
    InvalidProtocol(u8),

    /// Invalid parameter error
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Interface not found
    #[error("Interface '{0}' not found")]
    InterfaceNotFound(String),

    /// Interface error
    #[error("Interface error: {0}")]
    Interface(String),

    /// Packet construction error
    #[error("Packet construction error: {0}")]
    PacketConstruction(String),

    /// Packet parsing error
    #[error("Packet parsing error: {0}")]
    PacketParsing(String),
}

impl Error {
    /// Create an invalid parameter error
    pub fn invalid_parameter<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        Error::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error was raised by the frame builder's protocol check
    pub fn is_invalid_protocol(&self) -> bool {
        matches!(self, Error::InvalidProtocol(_))
    }
}
