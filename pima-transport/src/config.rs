// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

/// Per-syscall read timeout for [`crate::SerialTransport`] only — matches
/// the panel's own settle delay and the original tooling's pyserial
/// configuration. [`crate::TcpTransport`] relies on the OS socket default
/// instead (§5: the 1 second budget is serial-only).
pub const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Baud rate for the RS-232 link to the panel. Fixed by the panel's own
/// firmware, not configurable.
pub const SERIAL_BAUD_RATE: u32 = 2400;

/// Selects which physical link a [`crate::TransportHandle`] opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportConfig {
    /// RS-232 serial link: 2400 baud, 8 data bits, no parity, 1 stop bit.
    Serial {
        /// Device path, e.g. `/dev/ttyUSB0`.
        path: String,
    },
    /// Raw TCP socket to a PIMA IP module or serial-to-IP bridge.
    Tcp {
        /// Hostname or IP address.
        host: String,
        /// TCP port.
        port: u16,
    },
}
