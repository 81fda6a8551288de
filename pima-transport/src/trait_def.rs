// SPDX-License-Identifier: Apache-2.0

use crate::TransportError;

/// A byte-oriented, bidirectional channel to a PIMA panel.
///
/// This trait uses native AFIT (stable since Rust 1.75, MSRV is 1.84.1). It
/// is intentionally not object-safe — callers hold a concrete
/// [`crate::TransportHandle`], never a `dyn Transport`.
pub trait Transport: Send {
    /// Reads up to `n` bytes, blocking for at most the transport's configured
    /// timeout. Returns fewer bytes than `n` (possibly zero) on timeout; this
    /// is not an error.
    async fn read(&mut self, n: usize) -> Result<Vec<u8>, TransportError>;

    /// Writes the full contents of `buf`.
    async fn write(&mut self, buf: &[u8]) -> Result<(), TransportError>;

    /// Closes the underlying channel. Idempotent.
    async fn close(&mut self) -> Result<(), TransportError>;
}
