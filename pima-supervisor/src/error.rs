// SPDX-License-Identifier: Apache-2.0

//! Error types for `pima-supervisor`.

use pima_protocol::ProtocolError;
use pima_transport::TransportError;
use thiserror::Error;

/// Errors that can abort the initial connect-and-login sequence in
/// [`crate::Supervisor::start`]. Fatal: the caller should treat this as a
/// startup failure and let the process exit for a supervised restart.
#[derive(Debug, Error)]
pub enum StartError {
    /// The configured transport could not be opened.
    #[error("failed to open transport: {0}")]
    Transport(#[from] TransportError),

    /// The initial status poll or login sequence failed.
    #[error("initial login sequence failed: {0}")]
    Protocol(#[from] ProtocolError),
}

/// The panel link is mid-recovery. Returned to command callers (e.g. the
/// HTTP boundary's `arm` handler) instead of the underlying protocol error,
/// since the supervisor — not its callers — decides retry and rebuild
/// policy for the transport itself.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("panel link unavailable, supervisor is rebuilding the transport")]
pub struct Unavailable;
