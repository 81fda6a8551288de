// SPDX-License-Identifier: Apache-2.0

//! Decodes a SYSTEM/STATUS frame body into a [`StatusRecord`].

use std::collections::BTreeSet;

use crate::error::ProtocolError;
use crate::model::{require_message_kind, ArmMode, ChannelKind, MessageKind, StatusRecord, ZoneCapacity};

/// Discrete system failures, indexed 1..48 (bit `k` of the 6-byte bitmap
/// maps to `DISCRETE_FAILURES[k - 1]`). The misspelling "Commuincation" is
/// preserved verbatim for compatibility with existing consumers.
const DISCRETE_FAILURES: [&str; 48] = [
    "System Low Power",
    "Unknown (2)",
    "System Error",
    "Zone Failure",
    "Unknown (5)",
    "Auxiliary Voltage Failure (Fuse short)",
    "W/L Zone Low Battery",
    "Wireless Receiver Failure",
    "Low Battery",
    "Telephone Line Failure",
    "MAINS Failure (220V)",
    "Tamper 1 Open",
    "Tamper 2 Open",
    "Clock Not Set",
    "RAM Error",
    "Station Commuincation Failure",
    "Siren 1 Failure",
    "Siren 2 Failure",
    "SMS Communication",
    "SMS Card",
    "GSM200 Error",
    "Network Comm. Fault",
    "Radio Fault",
    "Keyfob Rec. Fault",
    "Wireless Receiver Tamper Open",
    "Wireless Jamming",
    "GSM-200 Failure",
    "GSM Communication Failure",
    "GSM-SIM Failure",
    "GSM Link Failure",
    "GSM Comm. Fault 2nd station",
    "W/L Zone Supervision",
    "Unknown (33)",
    "Network fault Station 2",
    "Net4Pro Fault",
    "VVR 1 Fault",
    "VVR 2 Fault",
    "VVR 3 Fault",
    "VVR 4 Fault",
    "VVR 1 Power Fault",
    "VVR 2 Power Fault",
    "VVR 3 Power Fault",
    "VVR 4 Power Fault",
    "Unknown (44)",
    "Unknown (45)",
    "Unknown (46)",
    "Unknown (47)",
    "Unknown (48)",
];

/// Per-module failure bitmaps: a format template and the byte width of the
/// bitmap that follows the discrete-failure block, in wire order.
const CLUSTERED_FAILURES: [(&str, usize); 12] = [
    ("Keypad %d Failure", 1),
    ("Keypad %d Tamper", 1),
    ("Zone Expander %d Failure", 2),
    ("Zone Expander %d Tamper", 2),
    ("Zone Expander %d Low Voltage", 2),
    ("Zone Expander %d AC Failure", 2),
    ("Zone Expander %d Low Battery", 2),
    ("Out Expander %d Failure", 1),
    ("Out Expander %d Tamper", 1),
    ("Out Expander %d Low Voltage", 1),
    ("Out Expander %d AC Failure", 1),
    ("Out Expander %d Low Battery", 1),
];

/// Reads a little-endian bitmap and returns the 1-based indices of its set
/// bits.
fn parse_bitmap(bytes: &[u8]) -> BTreeSet<u32> {
    let mut set = BTreeSet::new();
    for (byte_index, &byte) in bytes.iter().enumerate() {
        for bit in 0..8u32 {
            if byte & (1 << bit) != 0 {
                set.insert((byte_index as u32 * 8) + bit + 1);
            }
        }
    }
    set
}

fn take<'a>(body: &'a [u8], offset: usize, len: usize) -> Result<&'a [u8], ProtocolError> {
    body.get(offset..offset + len)
        .ok_or(ProtocolError::TruncatedStatus {
            expected: offset + len,
            actual: body.len(),
        })
}

/// Decodes `body` — the length-byte-inclusive frame body returned by
/// [`pima_frame::decode`] — into a [`StatusRecord`].
///
/// Returns [`StatusRecord::idle`] if the frame's channel is `IDLE` (the
/// panel has nothing new to report). `capacity` selects the zone bitmap
/// width and stride used to lay out the body.
pub fn decode_status(body: &[u8], capacity: ZoneCapacity) -> Result<StatusRecord, ProtocolError> {
    let message = *body.get(2).ok_or(ProtocolError::TruncatedStatus {
        expected: 3,
        actual: body.len(),
    })?;
    require_message_kind(message, MessageKind::Status)?;

    let channel_byte = *body.get(3).ok_or(ProtocolError::TruncatedStatus {
        expected: 4,
        actual: body.len(),
    })?;
    if channel_byte == ChannelKind::Idle as u8 {
        return Ok(StatusRecord::idle());
    }
    if channel_byte != ChannelKind::System as u8 {
        return Err(ProtocolError::InvalidStatus(channel_byte));
    }

    let address = take(body, 4, 3)?;
    if address != [0x02, 0x00, 0x00] {
        return Err(ProtocolError::InvalidAddress([address[0], address[1], address[2]]));
    }

    let zb = capacity.zone_bytes_stride();
    let w = capacity.zone_width();
    let zone_slot = |slot: usize| -> Result<BTreeSet<u32>, ProtocolError> {
        Ok(parse_bitmap(take(body, 7 + slot * zb, w)?))
    };
    let open_zones = zone_slot(0)?;
    let alarmed_zones = zone_slot(1)?;
    let bypassed_zones = zone_slot(2)?;
    let failed_zones = zone_slot(3)?;

    let mut cursor = 7 + 4 * zb;

    let partition_bytes = take(body, cursor, 16)?;
    let mut partitions = std::collections::BTreeMap::new();
    for (i, &byte) in partition_bytes.iter().enumerate() {
        let mode = ArmMode::from_byte(byte).ok_or(ProtocolError::InvalidPartitionMode(byte))?;
        partitions.insert((i + 1) as u8, mode);
    }
    cursor += 16;

    let mut failures = BTreeSet::new();
    let discrete_bytes = take(body, cursor, 6)?;
    for bit in parse_bitmap(discrete_bytes) {
        if let Some(label) = DISCRETE_FAILURES.get((bit - 1) as usize) {
            failures.insert((*label).to_owned());
        }
    }
    cursor += 6;

    for (template, count) in CLUSTERED_FAILURES {
        let bytes = take(body, cursor, count)?;
        for bit in parse_bitmap(bytes) {
            failures.insert(template.replace("%d", &bit.to_string()));
        }
        cursor += count;
    }

    // Skip ID/account.
    cursor += 4;
    let flags = *take(body, cursor, 1)?.first().ok_or(ProtocolError::TruncatedStatus {
        expected: cursor + 1,
        actual: body.len(),
    })?;

    Ok(StatusRecord {
        logged_in: flags & 0b01 != 0,
        command_ack: flags & 0b10 != 0,
        open_zones,
        alarmed_zones,
        bypassed_zones,
        failed_zones,
        partitions,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hp32_frame(zone_byte0: u8, partition_byte0: u8, flags: u8) -> Vec<u8> {
        // body layout: len, module, message, channel, addr(3), zones(4*12), partitions(16), discrete(6), clustered(17), id(4), flags(1)
        let mut body = Vec::new();
        body.push(0); // length placeholder, unused by decode_status
        body.push(0x0d);
        body.push(MessageKind::Status as u8);
        body.push(ChannelKind::System as u8);
        body.extend_from_slice(&[0x02, 0x00, 0x00]);
        // open zones slot
        let mut open_slot = vec![0u8; 12];
        open_slot[0] = zone_byte0;
        body.extend_from_slice(&open_slot);
        body.extend_from_slice(&[0u8; 12]); // alarmed
        body.extend_from_slice(&[0u8; 12]); // bypassed
        body.extend_from_slice(&[0u8; 12]); // failed
        let mut partitions = vec![0u8; 16];
        partitions[0] = partition_byte0;
        body.extend_from_slice(&partitions);
        body.extend_from_slice(&[0u8; 6]); // discrete failures
        body.extend_from_slice(&[0u8; 17]); // clustered failures
        body.extend_from_slice(&[0u8; 4]); // id/account
        body.push(flags);
        body
    }

    #[test]
    fn e1_happy_path_status_32_zone() {
        let body = hp32_frame(0x03, 0x01, 0x03);
        let status = decode_status(&body, ZoneCapacity::Hp32).unwrap();
        assert_eq!(status.open_zones, BTreeSet::from([1, 2]));
        assert!(status.alarmed_zones.is_empty());
        assert!(status.bypassed_zones.is_empty());
        assert!(status.failed_zones.is_empty());
        assert_eq!(status.partitions.len(), 16);
        assert_eq!(status.partitions[&1], ArmMode::FullArm);
        for p in 2..=16u8 {
            assert_eq!(status.partitions[&p], ArmMode::Disarm);
        }
        assert!(status.failures.is_empty());
        assert!(status.logged_in);
        assert!(status.command_ack);
    }

    #[test]
    fn idle_channel_yields_idle_record() {
        let mut body = vec![0, 0x0d, MessageKind::Status as u8, ChannelKind::Idle as u8];
        body.resize(4, 0);
        let status = decode_status(&body, ZoneCapacity::Hp32).unwrap();
        assert_eq!(status, StatusRecord::idle());
    }

    #[test]
    fn wrong_message_kind_rejected() {
        let body = vec![0, 0x0d, 0xaa, ChannelKind::System as u8];
        assert!(matches!(
            decode_status(&body, ZoneCapacity::Hp32),
            Err(ProtocolError::InvalidMessage(0xaa))
        ));
    }

    #[test]
    fn wrong_channel_rejected() {
        let body = vec![0, 0x0d, MessageKind::Status as u8, ChannelKind::Login as u8];
        assert!(matches!(
            decode_status(&body, ZoneCapacity::Hp32),
            Err(ProtocolError::InvalidStatus(_))
        ));
    }

    #[test]
    fn wrong_address_rejected() {
        let mut body = vec![0, 0x0d, MessageKind::Status as u8, ChannelKind::System as u8];
        body.extend_from_slice(&[0x01, 0x00, 0x00]);
        assert!(matches!(
            decode_status(&body, ZoneCapacity::Hp32),
            Err(ProtocolError::InvalidAddress(_))
        ));
    }

    #[test]
    fn discrete_failures_decoded() {
        let mut body = hp32_frame(0, 0, 0);
        // discrete failures block starts at 7 + 4*12 + 16 = 71
        let idx = 7 + 4 * 12 + 16;
        body[idx] = 0b0000_0001; // bit 1 -> "System Low Power"
        let status = decode_status(&body, ZoneCapacity::Hp32).unwrap();
        assert!(status.failures.contains("System Low Power"));
    }

    #[test]
    fn clustered_failure_template_formatted() {
        let mut body = hp32_frame(0, 0, 0);
        // clustered block starts right after discrete (6 bytes): idx+6
        let idx = 7 + 4 * 12 + 16 + 6;
        body[idx] = 0b0000_0001; // "Keypad %d Failure", bit 1
        let status = decode_status(&body, ZoneCapacity::Hp32).unwrap();
        assert!(status.failures.contains("Keypad 1 Failure"));
    }

    #[test]
    fn truncated_status_reported() {
        let body = vec![0, 0x0d, MessageKind::Status as u8, ChannelKind::System as u8, 0x02];
        assert!(matches!(
            decode_status(&body, ZoneCapacity::Hp32),
            Err(ProtocolError::TruncatedStatus { .. })
        ));
    }
}
