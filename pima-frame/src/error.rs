// SPDX-License-Identifier: Apache-2.0

//! Error types for `pima-frame`.

use thiserror::Error;

/// Errors raised while encoding or decoding a PIMA wire frame.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum FrameError {
    /// The assembled payload is too large to fit the single-byte length prefix.
    #[error("frame payload is {0} bytes, exceeds the 255-byte length prefix")]
    PayloadTooLong(usize),

    /// Fewer than `length + 3` bytes were available to decode.
    #[error("short frame: expected {expected} bytes, read {actual}")]
    ShortFrame {
        /// Bytes the length prefix promised (`length + 3`).
        expected: usize,
        /// Bytes actually supplied.
        actual: usize,
    },

    /// The whole frame buffer is a single repeated byte, e.g. a noisy line.
    #[error("garbage input: length byte {0:#04x}, frame is a single repeated byte")]
    GarbageInput(u8),

    /// The trailing CRC-16 did not match the recomputed value.
    #[error("CRC mismatch: frame claims {claimed:#06x}, computed {computed:#06x}")]
    CrcMismatch {
        /// CRC read from the frame's trailing two bytes.
        claimed: u16,
        /// CRC recomputed over the frame body.
        computed: u16,
    },

    /// `payload[0]` did not match the module ID for the configured zone capacity.
    #[error("module ID mismatch: expected {expected:#04x}, got {actual:#04x}")]
    ModuleIdMismatch {
        /// Module ID implied by the configured `ZoneCapacity`.
        expected: u8,
        /// Module ID actually present in the frame.
        actual: u8,
    },
}
