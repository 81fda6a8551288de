// SPDX-License-Identifier: Apache-2.0

use crate::timed_read::read_unbounded;
use crate::{Transport, TransportError};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

/// Raw TCP transport: a single connection, read and write on the same stream.
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    /// Connects to `host:port`.
    pub async fn connect(host: &str, port: u16) -> Result<Self, TransportError> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| TransportError::Open(e.to_string()))?;
        Ok(Self { stream })
    }
}

impl Transport for TcpTransport {
    async fn read(&mut self, n: usize) -> Result<Vec<u8>, TransportError> {
        read_unbounded(&mut self.stream, n).await
    }

    async fn write(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        self.stream.write_all(buf).await.map_err(TransportError::from)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.stream.shutdown().await.map_err(TransportError::from)
    }
}
