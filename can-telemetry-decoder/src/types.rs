//! Core types for the CAN telemetry decoder
//!
//! This module defines the raw frame type handed over by the transport, the
//! channel indices used by the vehicle state, and the error type shared by the
//! whole library.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Largest payload of a classic CAN frame
pub const CAN_MAX_DLEN: usize = 8;

/// Highest identifier of the 11-bit standard range
pub const CAN_SFF_MAX: u32 = 0x7FF;

/// Raw CAN frame as delivered by the transport
///
/// The payload is always stored in an 8-byte buffer; `len` records how many of
/// those bytes the bus actually delivered. Bytes past `len` are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFrame {
    /// CAN identifier (11-bit standard range)
    pub can_id: u32,
    data: [u8; CAN_MAX_DLEN],
    len: u8,
}

impl CanFrame {
    /// Build a frame from an identifier and up to 8 payload bytes
    pub fn new(can_id: u32, payload: &[u8]) -> Result<Self> {
        if can_id > CAN_SFF_MAX {
            return Err(DecoderError::InvalidIdentifier(can_id));
        }
        if payload.len() > CAN_MAX_DLEN {
            return Err(DecoderError::PayloadTooLong {
                can_id,
                len: payload.len(),
            });
        }

        let mut data = [0u8; CAN_MAX_DLEN];
        data[..payload.len()].copy_from_slice(payload);

        Ok(Self {
            can_id,
            data,
            len: payload.len() as u8,
        })
    }

    /// Build a full-length frame
    pub fn from_bytes(can_id: u32, data: [u8; CAN_MAX_DLEN]) -> Result<Self> {
        Self::new(can_id, &data)
    }

    /// Delivered payload bytes
    pub fn data(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    /// Get the data length code (DLC) - number of data bytes
    pub fn dlc(&self) -> usize {
        self.len as usize
    }
}

/// Errors that can occur during decoding
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Frame 0x{can_id:03X} too short: needs {required} bytes, got {actual}")]
    FrameTooShort {
        can_id: u32,
        required: usize,
        actual: usize,
    },

    #[error("Frame 0x{can_id:03X} payload of {len} bytes exceeds 8")]
    PayloadTooLong { can_id: u32, len: usize },

    #[error("CAN ID 0x{0:X} outside the standard 11-bit range")]
    InvalidIdentifier(u32),

    #[error("Failed to parse log file: {0}")]
    LogParseError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Integer channels, in snapshot column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntChannel {
    SteeringRaw,
    SteeringAngle,
    Rpm,
    Fuel,
    Gear,
}

impl IntChannel {
    pub const COUNT: usize = 5;

    pub const ALL: [IntChannel; Self::COUNT] = [
        IntChannel::SteeringRaw,
        IntChannel::SteeringAngle,
        IntChannel::Rpm,
        IntChannel::Fuel,
        IntChannel::Gear,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            IntChannel::SteeringRaw => "steering_raw",
            IntChannel::SteeringAngle => "steering_angle",
            IntChannel::Rpm => "rpm",
            IntChannel::Fuel => "fuel",
            IntChannel::Gear => "gear",
        }
    }
}

/// Floating-point channels, in snapshot column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloatChannel {
    AccelPedal,
    LongitudinalAccel,
    LateralAccel,
    ReferenceSpeed,
    SpeedFrontLeft,
    SpeedFrontRight,
    SpeedRearLeft,
    SpeedRearRight,
    TransmissionTorque,
    EngineTorque,
    TorqueLoss,
}

impl FloatChannel {
    pub const COUNT: usize = 11;

    pub const ALL: [FloatChannel; Self::COUNT] = [
        FloatChannel::AccelPedal,
        FloatChannel::LongitudinalAccel,
        FloatChannel::LateralAccel,
        FloatChannel::ReferenceSpeed,
        FloatChannel::SpeedFrontLeft,
        FloatChannel::SpeedFrontRight,
        FloatChannel::SpeedRearLeft,
        FloatChannel::SpeedRearRight,
        FloatChannel::TransmissionTorque,
        FloatChannel::EngineTorque,
        FloatChannel::TorqueLoss,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            FloatChannel::AccelPedal => "accel_pedal",
            FloatChannel::LongitudinalAccel => "longitudinal_accel",
            FloatChannel::LateralAccel => "lateral_accel",
            FloatChannel::ReferenceSpeed => "reference_speed",
            FloatChannel::SpeedFrontLeft => "speed_front_left",
            FloatChannel::SpeedFrontRight => "speed_front_right",
            FloatChannel::SpeedRearLeft => "speed_rear_left",
            FloatChannel::SpeedRearRight => "speed_rear_right",
            FloatChannel::TransmissionTorque => "transmission_torque",
            FloatChannel::EngineTorque => "engine_torque",
            FloatChannel::TorqueLoss => "torque_loss",
        }
    }

    /// Engineering unit
    pub fn unit(self) -> &'static str {
        match self {
            FloatChannel::AccelPedal => "%",
            FloatChannel::LongitudinalAccel | FloatChannel::LateralAccel => "g",
            FloatChannel::ReferenceSpeed
            | FloatChannel::SpeedFrontLeft
            | FloatChannel::SpeedFrontRight
            | FloatChannel::SpeedRearLeft
            | FloatChannel::SpeedRearRight => "km/h",
            FloatChannel::TransmissionTorque
            | FloatChannel::EngineTorque
            | FloatChannel::TorqueLoss => "Nm",
        }
    }
}

/// Switch channels, in snapshot column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchChannel {
    Brake,
    Clutch,
    Door,
}

impl SwitchChannel {
    pub const COUNT: usize = 3;

    pub const ALL: [SwitchChannel; Self::COUNT] =
        [SwitchChannel::Brake, SwitchChannel::Clutch, SwitchChannel::Door];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SwitchChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchChannel::Brake => write!(f, "BRAKE"),
            SwitchChannel::Clutch => write!(f, "CLUTCH"),
            SwitchChannel::Door => write!(f, "DOOR"),
        }
    }
}

/// The four wheel corners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    FrontLeft,
    FrontRight,
    RearLeft,
    RearRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::FrontLeft,
        Corner::FrontRight,
        Corner::RearLeft,
        Corner::RearRight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Corner::FrontLeft => write!(f, "FRONT LEFT"),
            Corner::FrontRight => write!(f, "FRONT RIGHT"),
            Corner::RearLeft => write!(f, "REAR LEFT"),
            Corner::RearRight => write!(f, "REAR RIGHT"),
        }
    }
}
