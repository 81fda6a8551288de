// SPDX-License-Identifier: Apache-2.0

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ProtocolError;

/// Arming mode for the panel or a single partition. Round-trips to a single
/// wire byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmMode {
    /// Fully disarmed.
    Disarm,
    /// Fully armed.
    FullArm,
    /// Home/stay arming profile 1.
    Home1,
    /// Home/stay arming profile 2.
    Home2,
}

impl ArmMode {
    /// The byte this mode is encoded as on the wire.
    pub fn to_byte(self) -> u8 {
        match self {
            ArmMode::Disarm => 0x00,
            ArmMode::FullArm => 0x01,
            ArmMode::Home1 => 0x02,
            ArmMode::Home2 => 0x03,
        }
    }

    /// Decodes a wire byte into an arm mode.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(ArmMode::Disarm),
            0x01 => Some(ArmMode::FullArm),
            0x02 => Some(ArmMode::Home1),
            0x03 => Some(ArmMode::Home2),
            _ => None,
        }
    }

    /// Parses the lowercase label used on the HTTP/MQTT boundary
    /// (`full_arm`, `home1`, `home2`, `disarm`).
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "disarm" => Some(ArmMode::Disarm),
            "full_arm" => Some(ArmMode::FullArm),
            "home1" => Some(ArmMode::Home1),
            "home2" => Some(ArmMode::Home2),
            _ => None,
        }
    }

    /// The lowercase label used on the HTTP/MQTT boundary.
    pub fn label(self) -> &'static str {
        match self {
            ArmMode::Disarm => "disarm",
            ArmMode::FullArm => "full_arm",
            ArmMode::Home1 => "home1",
            ArmMode::Home2 => "home2",
        }
    }
}

/// The panel's configured zone capacity. Determines the module ID the
/// adapter must declare and the byte width the status frame allocates per
/// zone category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneCapacity {
    /// 32-zone panel.
    Hp32,
    /// 96-zone panel.
    Hp96,
    /// 144-zone panel.
    Hp144,
}

impl ZoneCapacity {
    /// Builds a capacity from the raw zone count (32, 96, or 144).
    pub fn from_zones(zones: u32) -> Option<Self> {
        match zones {
            32 => Some(ZoneCapacity::Hp32),
            96 => Some(ZoneCapacity::Hp96),
            144 => Some(ZoneCapacity::Hp144),
            _ => None,
        }
    }

    /// Number of zones this capacity covers.
    pub fn zones(self) -> u32 {
        match self {
            ZoneCapacity::Hp32 => 32,
            ZoneCapacity::Hp96 => 96,
            ZoneCapacity::Hp144 => 144,
        }
    }

    /// The module ID the adapter declares, and that the panel echoes back in
    /// every reply.
    pub fn module_id(self) -> u8 {
        match self {
            ZoneCapacity::Hp32 | ZoneCapacity::Hp96 => 0x0d,
            ZoneCapacity::Hp144 => 0x13,
        }
    }

    /// Bytes the status frame allocates per zone category. HP32 panels use
    /// only the leading `zone_width()` bytes of this stride.
    pub fn zone_bytes_stride(self) -> usize {
        match self {
            ZoneCapacity::Hp32 | ZoneCapacity::Hp96 => 12,
            ZoneCapacity::Hp144 => 18,
        }
    }

    /// Width in bytes of one zone category's little-endian bitmap.
    pub fn zone_width(self) -> usize {
        (self.zones() / 8) as usize
    }
}

/// Outbound operation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MessageKind {
    Write = 0x0f,
    Read = 0x0e,
    Open = 0x01,
    Close = 0x19,
    Status = 0x05,
}

impl MessageKind {
    pub(crate) fn to_byte(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x0f => Some(MessageKind::Write),
            0x0e => Some(MessageKind::Read),
            0x01 => Some(MessageKind::Open),
            0x19 => Some(MessageKind::Close),
            0x05 => Some(MessageKind::Status),
            _ => None,
        }
    }
}

/// Subsystem selector inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChannelKind {
    Idle = 0x00,
    System = 0x01,
    #[allow(dead_code)]
    Zones = 0x02,
    #[allow(dead_code)]
    Outputs = 0x03,
    Login = 0x04,
    #[allow(dead_code)]
    Parameter = 0x05,
}

impl ChannelKind {
    pub(crate) fn to_byte(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(ChannelKind::Idle),
            0x01 => Some(ChannelKind::System),
            0x02 => Some(ChannelKind::Zones),
            0x03 => Some(ChannelKind::Outputs),
            0x04 => Some(ChannelKind::Login),
            0x05 => Some(ChannelKind::Parameter),
            _ => None,
        }
    }
}

/// A set of 1-based partition indices (1..16).
pub type Partitions = BTreeSet<u8>;

/// Encodes a partition set as the little-endian 16-bit address field the
/// wire protocol expects: bit `p-1` set means partition `p` is selected.
pub fn encode_partitions(partitions: &Partitions) -> [u8; 2] {
    let bits: u16 = partitions
        .iter()
        .filter(|&&p| (1..=16).contains(&p))
        .fold(0u16, |acc, &p| acc | (1 << (p - 1)));
    bits.to_le_bytes()
}

/// The canonical decoded panel status.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StatusRecord {
    /// Whether the session is currently logged in.
    pub logged_in: bool,
    /// Whether the panel acknowledged the last command.
    pub command_ack: bool,
    /// 1-based zone numbers currently open.
    pub open_zones: BTreeSet<u32>,
    /// 1-based zone numbers currently alarmed.
    pub alarmed_zones: BTreeSet<u32>,
    /// 1-based zone numbers currently bypassed.
    pub bypassed_zones: BTreeSet<u32>,
    /// 1-based zone numbers currently reporting a fault.
    pub failed_zones: BTreeSet<u32>,
    /// Arm mode of each partition, 1..16. Empty for an idle (no-data) status.
    pub partitions: BTreeMap<u8, ArmMode>,
    /// Human-readable system failure strings.
    pub failures: BTreeSet<String>,
}

impl StatusRecord {
    /// The status reported when the panel's reply carries no data (an
    /// `IDLE`-channel frame): only `logged_in` is meaningful, and it is
    /// always `false`.
    pub fn idle() -> Self {
        Self {
            logged_in: false,
            command_ack: false,
            open_zones: BTreeSet::new(),
            alarmed_zones: BTreeSet::new(),
            bypassed_zones: BTreeSet::new(),
            failed_zones: BTreeSet::new(),
            partitions: BTreeMap::new(),
            failures: BTreeSet::new(),
        }
    }
}

pub(crate) fn require_message_kind(byte: u8, expected: MessageKind) -> Result<(), ProtocolError> {
    match MessageKind::from_byte(byte) {
        Some(kind) if kind == expected => Ok(()),
        _ => Err(ProtocolError::InvalidMessage(byte)),
    }
}
