// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

//! Byte-oriented transport abstraction over a serial line or TCP socket to a
//! PIMA alarm panel.
//!
//! Callers never hold a `dyn Transport` — [`Transport`] uses native
//! async-fn-in-trait and is not object-safe. Instead they hold a
//! [`TransportHandle`], a concrete enum over the two backends, opened from a
//! [`TransportConfig`] chosen once at startup (or rebuilt in place by the
//! supervisor on recovery).

mod config;
mod error;
mod serial;
mod tcp;
mod timed_read;
mod trait_def;

pub use config::{TransportConfig, READ_TIMEOUT, SERIAL_BAUD_RATE};
pub use error::TransportError;
pub use serial::SerialTransport;
pub use tcp::TcpTransport;
pub use trait_def::Transport;

/// A concrete, owned transport of either kind.
///
/// Exists so the supervisor can hold one field typed `TransportHandle`
/// instead of being generic over `T: Transport`, since the backend it holds
/// can change at runtime if recovery reopens the same endpoint.
pub enum TransportHandle {
    /// See [`SerialTransport`].
    Serial(SerialTransport),
    /// See [`TcpTransport`].
    Tcp(TcpTransport),
}

impl TransportHandle {
    /// Opens the transport described by `config`.
    pub async fn open(config: &TransportConfig) -> Result<Self, TransportError> {
        match config {
            TransportConfig::Serial { path } => {
                Ok(Self::Serial(SerialTransport::open(path)?))
            }
            TransportConfig::Tcp { host, port } => {
                Ok(Self::Tcp(TcpTransport::connect(host, *port).await?))
            }
        }
    }
}

/// A reusable recipe for (re-)opening a [`Transport`].
///
/// The supervisor holds one of these instead of a bare [`TransportConfig`]
/// so tests can substitute an in-memory opener that hands out fake
/// transports, the same way `libdd-http-client` swaps its HTTP backend
/// behind a trait. This trait uses native AFIT and is not object-safe.
pub trait TransportOpener: Send + Sync {
    /// The transport type this opener produces.
    type Transport: Transport;

    /// Opens (or reopens) the transport.
    async fn open(&self) -> Result<Self::Transport, TransportError>;
}

impl TransportOpener for TransportConfig {
    type Transport = TransportHandle;

    async fn open(&self) -> Result<TransportHandle, TransportError> {
        TransportHandle::open(self).await
    }
}

impl Transport for TransportHandle {
    async fn read(&mut self, n: usize) -> Result<Vec<u8>, TransportError> {
        match self {
            Self::Serial(t) => t.read(n).await,
            Self::Tcp(t) => t.read(n).await,
        }
    }

    async fn write(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        match self {
            Self::Serial(t) => t.write(buf).await,
            Self::Tcp(t) => t.write(buf).await,
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        match self {
            Self::Serial(t) => t.close().await,
            Self::Tcp(t) => t.close().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_config_equality() {
        let a = TransportConfig::Tcp {
            host: "panel.local".to_owned(),
            port: 4025,
        };
        let b = TransportConfig::Tcp {
            host: "panel.local".to_owned(),
            port: 4025,
        };
        assert_eq!(a, b);
    }
}
