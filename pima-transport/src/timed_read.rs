// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use crate::TransportError;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::Instant;

/// Reads up to `n` bytes from `reader`, stopping early (without error) once
/// `timeout` has elapsed since the call began. Mirrors pyserial's
/// `read(size)`: a single logical read attempts to fill the whole buffer but
/// returns whatever arrived once its timeout budget runs out.
///
/// Used by [`crate::SerialTransport`] only — §5 scopes the per-syscall 1
/// second deadline to the serial link.
pub(crate) async fn read_with_timeout<R: AsyncRead + Unpin>(
    reader: &mut R,
    n: usize,
    timeout: Duration,
) -> Result<Vec<u8>, TransportError> {
    let mut buf = Vec::with_capacity(n);
    let deadline = Instant::now() + timeout;
    while buf.len() < n {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        let mut chunk = vec![0u8; n - buf.len()];
        match tokio::time::timeout(remaining, reader.read(&mut chunk)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(read)) => buf.extend_from_slice(&chunk[..read]),
            Ok(Err(e)) => return Err(TransportError::Io(e)),
            Err(_elapsed) => break,
        }
    }
    Ok(buf)
}

/// Reads up to `n` bytes from `reader` with no software-imposed deadline —
/// the read blocks on whatever the OS socket does. Used by
/// [`crate::TcpTransport`], which per §5 relies on "the OS default" rather
/// than the serial link's 1 second timeout.
pub(crate) async fn read_unbounded<R: AsyncRead + Unpin>(reader: &mut R, n: usize) -> Result<Vec<u8>, TransportError> {
    let mut buf = Vec::with_capacity(n);
    while buf.len() < n {
        let mut chunk = vec![0u8; n - buf.len()];
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(read) => buf.extend_from_slice(&chunk[..read]),
            Err(e) => return Err(TransportError::Io(e)),
        }
    }
    Ok(buf)
}
