// SPDX-License-Identifier: Apache-2.0

//! Error types for `pima-transport`.

use thiserror::Error;

/// Errors raised while opening or operating a [`crate::Transport`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// The serial device or TCP endpoint could not be acquired.
    #[error("failed to open transport: {0}")]
    Open(String),

    /// An I/O error occurred during a read, write, or close.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}
