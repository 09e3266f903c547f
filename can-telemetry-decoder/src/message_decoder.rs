//! Message Decoding Engine
//!
//! Maps a CAN identifier and its payload to a typed [`FrameMessage`]. Each
//! known identifier has a fixed layout: byte offsets, signedness and a scaling
//! formula. All multi-byte fields are little-endian. Frames shorter than the
//! layout requires are rejected before anything is read.

use crate::types::{CanFrame, DecoderError, Result};
use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;
use std::fmt;

/// Scale shared by the wheel and reference speed sensors (km/h per bit)
pub const SPEED_SCALE: f64 = 0.05625;

/// Acceleration sensor scale (g per bit)
pub const ACCEL_SCALE: f64 = 0.000_127_42;

/// Acceleration sensor offset (g)
pub const ACCEL_OFFSET: f64 = 4.1768;

/// Torque scale (Nm per bit)
pub const TORQUE_SCALE: f64 = 1.6;

/// Identifiers with a known layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FrameId {
    SteeringSensor,
    LateralMotion,
    LongitudinalMotion,
    EngineTorque,
    Transmission,
    TorqueIntervention,
    SteeringAngle,
    ReferenceSpeed,
    WheelSpeeds,
    AmbientTemperature,
    EngineStatus,
    BodyStatus,
}

impl FrameId {
    /// Every known identifier
    pub const ALL: [FrameId; 12] = [
        FrameId::SteeringSensor,
        FrameId::LateralMotion,
        FrameId::LongitudinalMotion,
        FrameId::EngineTorque,
        FrameId::Transmission,
        FrameId::TorqueIntervention,
        FrameId::SteeringAngle,
        FrameId::ReferenceSpeed,
        FrameId::WheelSpeeds,
        FrameId::AmbientTemperature,
        FrameId::EngineStatus,
        FrameId::BodyStatus,
    ];

    /// Raw CAN identifier
    pub fn can_id(self) -> u32 {
        match self {
            FrameId::SteeringSensor => 0x002,
            FrameId::LateralMotion => 0x070,
            FrameId::LongitudinalMotion => 0x080,
            FrameId::EngineTorque => 0x410,
            FrameId::Transmission => 0x411,
            FrameId::TorqueIntervention => 0x501,
            FrameId::SteeringAngle => 0x511,
            FrameId::ReferenceSpeed => 0x512,
            FrameId::WheelSpeeds => 0x513,
            FrameId::AmbientTemperature => 0x514,
            FrameId::EngineStatus => 0x600,
            FrameId::BodyStatus => 0x620,
        }
    }

    /// Look up a raw identifier
    pub fn from_can_id(can_id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.can_id() == can_id)
    }

    /// Number of payload bytes the layout reads
    pub fn required_len(self) -> usize {
        match self {
            FrameId::SteeringSensor => 2,
            FrameId::LateralMotion | FrameId::LongitudinalMotion => 5,
            FrameId::EngineTorque | FrameId::Transmission => 7,
            FrameId::TorqueIntervention => 0,
            FrameId::SteeringAngle => 2,
            FrameId::ReferenceSpeed => 4,
            FrameId::WheelSpeeds => 8,
            FrameId::AmbientTemperature => 4,
            FrameId::EngineStatus => 6,
            FrameId::BodyStatus => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FrameId::SteeringSensor => "steering_sensor",
            FrameId::LateralMotion => "lateral_motion",
            FrameId::LongitudinalMotion => "longitudinal_motion",
            FrameId::EngineTorque => "engine_torque",
            FrameId::Transmission => "transmission",
            FrameId::TorqueIntervention => "torque_intervention",
            FrameId::SteeringAngle => "steering_angle",
            FrameId::ReferenceSpeed => "reference_speed",
            FrameId::WheelSpeeds => "wheel_speeds",
            FrameId::AmbientTemperature => "ambient_temperature",
            FrameId::EngineStatus => "engine_status",
            FrameId::BodyStatus => "body_status",
        }
    }
}

impl TryFrom<u32> for FrameId {
    type Error = u32;

    fn try_from(can_id: u32) -> std::result::Result<Self, Self::Error> {
        Self::from_can_id(can_id).ok_or(can_id)
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:03X})", self.name(), self.can_id())
    }
}

/// Four wheel speeds in km/h
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct WheelSpeeds {
    pub front_left: f64,
    pub front_right: f64,
    pub rear_left: f64,
    pub rear_right: f64,
}

impl WheelSpeeds {
    /// Front axle difference, right minus left
    pub fn front_delta(&self) -> f64 {
        self.front_right - self.front_left
    }

    /// Rear axle difference, right minus left
    pub fn rear_delta(&self) -> f64 {
        self.rear_right - self.rear_left
    }

    /// Left side difference, front minus rear
    pub fn left_delta(&self) -> f64 {
        self.front_left - self.rear_left
    }

    /// Right side difference, front minus rear
    pub fn right_delta(&self) -> f64 {
        self.front_right - self.rear_right
    }
}

/// A decoded frame of a known identifier
///
/// Besides the values latched into the vehicle state, some variants carry
/// display-only readings (yaw, temperatures, message counters) that are handed
/// to the presenter and then dropped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "frame", rename_all = "snake_case")]
pub enum FrameMessage {
    SteeringSensor {
        raw: i16,
    },
    LateralMotion {
        yaw_rate: f64,
        lateral_accel: f64,
    },
    LongitudinalMotion {
        yaw_accel: f64,
        longitudinal_accel: f64,
    },
    EngineTorque {
        rpm: u16,
        accel_pedal: f64,
        transmission_torque: f64,
        engine_torque: f64,
        torque_loss: f64,
    },
    Transmission {
        gear: u8,
        brake: bool,
    },
    TorqueIntervention,
    SteeringAngle {
        degrees: i16,
    },
    ReferenceSpeed {
        speed: f64,
        counter: Option<u8>,
    },
    WheelSpeeds(WheelSpeeds),
    AmbientTemperature {
        celsius: f64,
        counter: Option<u8>,
    },
    EngineStatus {
        fuel_mm3: u16,
        coolant_celsius: i16,
        clutch: bool,
        counter: u8,
    },
    BodyStatus {
        door: bool,
    },
}

impl FrameMessage {
    /// Identifier this message was decoded from
    pub fn frame_id(&self) -> FrameId {
        match self {
            FrameMessage::SteeringSensor { .. } => FrameId::SteeringSensor,
            FrameMessage::LateralMotion { .. } => FrameId::LateralMotion,
            FrameMessage::LongitudinalMotion { .. } => FrameId::LongitudinalMotion,
            FrameMessage::EngineTorque { .. } => FrameId::EngineTorque,
            FrameMessage::Transmission { .. } => FrameId::Transmission,
            FrameMessage::TorqueIntervention => FrameId::TorqueIntervention,
            FrameMessage::SteeringAngle { .. } => FrameId::SteeringAngle,
            FrameMessage::ReferenceSpeed { .. } => FrameId::ReferenceSpeed,
            FrameMessage::WheelSpeeds(_) => FrameId::WheelSpeeds,
            FrameMessage::AmbientTemperature { .. } => FrameId::AmbientTemperature,
            FrameMessage::EngineStatus { .. } => FrameId::EngineStatus,
            FrameMessage::BodyStatus { .. } => FrameId::BodyStatus,
        }
    }
}

/// Outcome of decoding one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decoded {
    Known(FrameMessage),
    Unknown(u32),
}

/// Message decoder - table-driven mapping from identifier to layout
pub struct MessageDecoder;

impl MessageDecoder {
    /// Decode a CAN frame
    ///
    /// # Returns
    /// * `Ok(Decoded::Known)` for an identifier in the decode table
    /// * `Ok(Decoded::Unknown)` for any other identifier
    /// * `Err(DecoderError::FrameTooShort)` if the payload does not cover the layout
    pub fn decode(frame: &CanFrame) -> Result<Decoded> {
        let Some(frame_id) = FrameId::from_can_id(frame.can_id) else {
            return Ok(Decoded::Unknown(frame.can_id));
        };

        let data = frame.data();
        let required = frame_id.required_len();
        if data.len() < required {
            return Err(DecoderError::FrameTooShort {
                can_id: frame.can_id,
                required,
                actual: data.len(),
            });
        }

        let message = match frame_id {
            FrameId::SteeringSensor => FrameMessage::SteeringSensor {
                raw: LittleEndian::read_i16(&data[0..2]),
            },
            FrameId::LateralMotion => FrameMessage::LateralMotion {
                yaw_rate: f64::from(LittleEndian::read_u16(&data[0..2])) * 0.005 - 163.84,
                lateral_accel: Self::accel(LittleEndian::read_u16(&data[3..5])),
            },
            FrameId::LongitudinalMotion => FrameMessage::LongitudinalMotion {
                yaw_accel: f64::from(LittleEndian::read_u16(&data[0..2])) * 0.125 - 4096.0,
                longitudinal_accel: Self::accel(LittleEndian::read_u16(&data[3..5])),
            },
            FrameId::EngineTorque => FrameMessage::EngineTorque {
                rpm: LittleEndian::read_u16(&data[5..7]),
                accel_pedal: f64::from(data[4]) * 100.0 / 255.0,
                transmission_torque: Self::torque(data[1]),
                engine_torque: Self::torque(data[2]),
                torque_loss: Self::torque(data[3]),
            },
            FrameId::Transmission => FrameMessage::Transmission {
                gear: data[4],
                brake: Self::bit(data[6], 4),
            },
            FrameId::TorqueIntervention => FrameMessage::TorqueIntervention,
            FrameId::SteeringAngle => FrameMessage::SteeringAngle {
                degrees: LittleEndian::read_i16(&data[0..2]),
            },
            FrameId::ReferenceSpeed => FrameMessage::ReferenceSpeed {
                speed: Self::speed(LittleEndian::read_i16(&data[2..4])),
                counter: data.get(5).copied(),
            },
            FrameId::WheelSpeeds => FrameMessage::WheelSpeeds(WheelSpeeds {
                front_left: Self::speed(LittleEndian::read_i16(&data[0..2])),
                front_right: Self::speed(LittleEndian::read_i16(&data[2..4])),
                rear_left: Self::speed(LittleEndian::read_i16(&data[4..6])),
                rear_right: Self::speed(LittleEndian::read_i16(&data[6..8])),
            }),
            FrameId::AmbientTemperature => FrameMessage::AmbientTemperature {
                celsius: f64::from(LittleEndian::read_i16(&data[2..4])) / 2.0 - 40.0,
                counter: data.get(6).copied(),
            },
            FrameId::EngineStatus => FrameMessage::EngineStatus {
                fuel_mm3: LittleEndian::read_u16(&data[1..3]),
                coolant_celsius: i16::from(data[3]) - 40,
                clutch: Self::bit(data[5], 2),
                counter: data[4],
            },
            FrameId::BodyStatus => FrameMessage::BodyStatus {
                door: Self::bit(data[0], 5),
            },
        };

        log::trace!("Decoded {}: {:?}", frame_id, message);
        Ok(Decoded::Known(message))
    }

    fn accel(raw: u16) -> f64 {
        f64::from(raw) * ACCEL_SCALE - ACCEL_OFFSET
    }

    fn speed(raw: i16) -> f64 {
        f64::from(raw) * SPEED_SCALE
    }

    fn torque(raw: u8) -> f64 {
        f64::from(raw) * TORQUE_SCALE
    }

    /// Read bit `n` of `byte`
    fn bit(byte: u8, n: u8) -> bool {
        byte & (1 << n) != 0
    }
}
