// SPDX-License-Identifier: Apache-2.0

use crate::config::{READ_TIMEOUT, SERIAL_BAUD_RATE};
use crate::timed_read::read_with_timeout;
use crate::{Transport, TransportError};
use tokio::io::AsyncWriteExt;
use tokio_serial::SerialPortBuilderExt;

/// RS-232 transport: 2400 baud, 8 data bits, no parity, 1 stop bit.
pub struct SerialTransport {
    port: tokio_serial::SerialStream,
}

impl SerialTransport {
    /// Opens the serial device at `path`.
    pub fn open(path: &str) -> Result<Self, TransportError> {
        let port = tokio_serial::new(path, SERIAL_BAUD_RATE)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .open_native_async()
            .map_err(|e| TransportError::Open(e.to_string()))?;
        Ok(Self { port })
    }
}

impl Transport for SerialTransport {
    async fn read(&mut self, n: usize) -> Result<Vec<u8>, TransportError> {
        read_with_timeout(&mut self.port, n, READ_TIMEOUT).await
    }

    async fn write(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        self.port.write_all(buf).await.map_err(TransportError::from)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}
