// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use pima_protocol::ZoneCapacity;
use pima_transport::TransportOpener;

/// Default interval between background status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Everything the supervisor needs to open a transport, declare a module ID,
/// and maintain a logged-in session.
///
/// Generic over `O` so tests can supply an in-memory [`TransportOpener`]
/// instead of a real [`pima_transport::TransportConfig`].
#[derive(Debug, Clone)]
pub struct SupervisorConfig<O: TransportOpener> {
    /// Recipe for opening (and reopening) the transport.
    pub opener: O,
    /// The panel's configured zone capacity.
    pub capacity: ZoneCapacity,
    /// 4-6 digit login code.
    pub login_code: String,
    /// Interval between background status polls.
    pub poll_interval: Duration,
}

impl<O: TransportOpener> SupervisorConfig<O> {
    /// Builds a config with [`DEFAULT_POLL_INTERVAL`].
    pub fn new(opener: O, capacity: ZoneCapacity, login_code: String) -> Self {
        Self {
            opener,
            capacity,
            login_code,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}
