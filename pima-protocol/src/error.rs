// SPDX-License-Identifier: Apache-2.0

//! Error types for `pima-protocol`.

use pima_frame::FrameError;
use pima_transport::TransportError;
use thiserror::Error;

/// Errors raised by the protocol engine.
///
/// The engine never decides recovery policy itself — it surfaces every
/// fault upward so the supervisor can be the sole place that chooses
/// between retry, rebuild, and process restart.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The transport could not be read from or written to.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The frame read off the wire failed to decode.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// A STATUS-channel reply carried a message kind other than `STATUS`.
    #[error("invalid message kind {0:#04x}")]
    InvalidMessage(u8),

    /// A STATUS reply's channel was neither `IDLE` nor `SYSTEM`.
    #[error("invalid status channel {0:#04x}")]
    InvalidStatus(u8),

    /// A SYSTEM/STATUS reply's address field was not `02 00 00`.
    #[error("invalid status address {0:02x?}")]
    InvalidAddress([u8; 3]),

    /// A caller-supplied login code was not 4-6 decimal digits.
    #[error("invalid login code: {0}")]
    InvalidLoginCode(String),

    /// A partition byte in a STATUS body did not decode to a known arm mode.
    #[error("invalid partition arm mode byte {0:#04x}")]
    InvalidPartitionMode(u8),

    /// A STATUS body was shorter than its own zone capacity requires.
    #[error("truncated status body: expected at least {expected} bytes, got {actual}")]
    TruncatedStatus {
        /// Minimum bytes the configured `ZoneCapacity` requires.
        expected: usize,
        /// Bytes actually present.
        actual: usize,
    },
}
