// SPDX-License-Identifier: Apache-2.0

//! Stateless request builder and response interpreter for the panel's
//! WRITE/READ/OPEN/CLOSE/STATUS command set.
//!
//! The engine never decides retry or recovery policy; every error is
//! surfaced to the caller (the supervisor), which is the sole place that
//! chooses between retry, rebuild, and process restart. The one exception is
//! a single inline garbage-drain on a corrupted read, since draining noise
//! off the line is part of reading a frame correctly, not a recovery
//! decision.

use std::time::Duration;

use pima_frame::FrameError;
use pima_transport::Transport;

use crate::error::ProtocolError;
use crate::model::{encode_partitions, ArmMode, ChannelKind, MessageKind, Partitions, ZoneCapacity};
use crate::status::decode_status;
use crate::StatusRecord;

/// Size of the post-write settle delay the panel needs after any command
/// other than a status poll.
const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Size of one garbage-drain read attempt.
const DRAIN_CHUNK: usize = 64;

/// Wraps a transport with the PIMA command/response protocol for a given
/// zone capacity.
pub struct ProtocolEngine<T: Transport> {
    transport: T,
    capacity: ZoneCapacity,
}

impl<T: Transport> ProtocolEngine<T> {
    /// Wraps `transport`, declaring `capacity`'s module ID on every frame.
    pub fn new(transport: T, capacity: ZoneCapacity) -> Self {
        Self { transport, capacity }
    }

    /// Consumes the engine, returning the transport it wrapped.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// The zone capacity this engine was configured with.
    pub fn capacity(&self) -> ZoneCapacity {
        self.capacity
    }

    /// Sends a LOGIN WRITE with `code` (4-6 decimal digits), then polls
    /// status. Discards whatever unsolicited frame the panel currently has
    /// queued before sending (errors from that discard read still
    /// propagate).
    pub async fn login(&mut self, code: &str) -> Result<StatusRecord, ProtocolError> {
        validate_login_code(code)?;
        let mut data: Vec<u8> = code.bytes().map(|b| b - b'0').collect();
        data.resize(6, 0xff);

        self.read_frame().await?;
        self.write_frame(MessageKind::Write, ChannelKind::Login, &[], &data)
            .await?;
        self.get_status().await
    }

    /// Reads the panel's pending reply and requests the next one.
    ///
    /// A reply for the next poll is implicit in consuming the current one —
    /// callers must not assume request/response symmetry with the frame
    /// this call reads.
    pub async fn get_status(&mut self) -> Result<StatusRecord, ProtocolError> {
        let body = self.read_frame().await?;
        self.write_frame(MessageKind::Status, ChannelKind::Idle, &[], &[])
            .await?;
        decode_status(&body, self.capacity)
    }

    /// Arms or disarms `partitions` to `mode`, then polls status.
    pub async fn arm(
        &mut self,
        mode: ArmMode,
        partitions: &Partitions,
    ) -> Result<StatusRecord, ProtocolError> {
        self.read_frame().await?;
        let addr = encode_partitions(partitions);
        let message = if mode == ArmMode::Disarm {
            MessageKind::Open
        } else {
            MessageKind::Close
        };
        self.write_frame(message, ChannelKind::System, &addr, &[mode.to_byte()])
            .await?;
        self.get_status().await
    }

    async fn write_frame(
        &mut self,
        message: MessageKind,
        channel: ChannelKind,
        addr: &[u8],
        data: &[u8],
    ) -> Result<(), ProtocolError> {
        let frame = pima_frame::encode(
            self.capacity.module_id(),
            message.to_byte(),
            channel.to_byte(),
            addr,
            data,
        )?;
        tracing::debug!(frame = %hex(&frame), "writing frame");
        self.transport.write(&frame).await?;
        if message != MessageKind::Status {
            tokio::time::sleep(SETTLE_DELAY).await;
        }
        Ok(())
    }

    async fn read_frame(&mut self) -> Result<Vec<u8>, ProtocolError> {
        match self.read_frame_once().await {
            Err(ProtocolError::Frame(FrameError::GarbageInput(length))) => {
                tracing::warn!(length, "garbage input on channel, draining");
                self.drain_garbage().await?;
                self.read_frame_once().await
            }
            other => other,
        }
    }

    async fn read_frame_once(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let mut raw;
        loop {
            let chunk = self.transport.read(1).await?;
            if !chunk.is_empty() {
                raw = chunk;
                break;
            }
        }
        let length = raw[0] as usize;
        let rest = self.transport.read(length + 2).await?;
        raw.extend_from_slice(&rest);
        tracing::debug!(frame = %hex(&raw), "read frame");
        Ok(pima_frame::decode(&raw, self.capacity.module_id())?)
    }

    /// Drains a noisy channel by reading chunks until one is not a single
    /// repeated byte, or until nothing more arrives.
    async fn drain_garbage(&mut self) -> Result<(), ProtocolError> {
        loop {
            let chunk = self.transport.read(DRAIN_CHUNK).await?;
            if chunk.is_empty() || !pima_frame::is_garbage(&chunk) {
                return Ok(());
            }
        }
    }
}

fn validate_login_code(code: &str) -> Result<(), ProtocolError> {
    let valid = (4..=6).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(ProtocolError::InvalidLoginCode(code.to_owned()))
    }
}

fn hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(" ")
}
