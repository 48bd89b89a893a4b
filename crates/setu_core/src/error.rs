//! Error types shared by the setu crates.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SetuError {
    /// The API returned a record that cannot be turned into a local file name.
    #[error("Invalid image record {pid}: {reason}")]
    InvalidRecord { pid: u64, reason: String },

    /// The host refused or failed to deliver a message.
    #[error("Failed to send message: {0}")]
    Send(String),

    /// The host connection is gone.
    #[error("Host connection closed")]
    Disconnected,
}

pub type Result<T> = std::result::Result<T, SetuError>;
