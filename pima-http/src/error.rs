// SPDX-License-Identifier: Apache-2.0

//! Error types for `pima-http`.

use thiserror::Error;

/// Errors raised while starting or running the HTTP boundary.
///
/// Per §7's propagation rule, boundary adapters never touch the transport
/// directly and never surface `FrameError`/`ProtocolError` — these are
/// purely HTTP-server concerns (binding the socket, loading TLS material).
#[derive(Debug, Error)]
pub enum HttpError {
    /// The configured port could not be bound.
    #[error("failed to bind HTTP listener: {0}")]
    Bind(std::io::Error),

    /// Accepting an incoming connection failed.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// The TLS certificate or key file could not be read.
    #[error("failed to read TLS material: {0}")]
    Io(std::io::Error),

    /// The TLS certificate/key pair was rejected by rustls.
    #[error("invalid TLS certificate/key: {0}")]
    Tls(#[from] rustls::Error),

    /// The configured key file contained no private key.
    #[error("TLS key file contained no private key")]
    MissingKey,
}
