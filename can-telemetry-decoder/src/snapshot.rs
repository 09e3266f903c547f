//! Periodic snapshots of the vehicle state
//!
//! The log-line form of a snapshot is the interchange format for downstream
//! consumers and must not change:
//!
//! ```text
//! SSSSSSSSSS.UUUUUU  ints(%5d)...  floats(%7.2f)...  switches(0/1)...
//! ```
//!
//! The timestamp is followed by one space, and every field after it is
//! preceded by one space.

use crate::state::VehicleState;
use crate::types::{DecoderError, FloatChannel, IntChannel, Result, SwitchChannel};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Immutable read of every channel at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub seconds: i64,
    pub micros: u32,
    pub ints: [i32; IntChannel::COUNT],
    pub floats: [f64; FloatChannel::COUNT],
    pub switches: [bool; SwitchChannel::COUNT],
}

impl Snapshot {
    pub fn capture(state: &VehicleState, now: DateTime<Utc>) -> Self {
        Self {
            seconds: now.timestamp(),
            micros: now.timestamp_subsec_micros(),
            ints: state.ints(),
            floats: state.floats(),
            switches: state.switches(),
        }
    }

    pub fn int(&self, channel: IntChannel) -> i32 {
        self.ints[channel.index()]
    }

    pub fn float(&self, channel: FloatChannel) -> f64 {
        self.floats[channel.index()]
    }

    pub fn switch(&self, channel: SwitchChannel) -> bool {
        self.switches[channel.index()]
    }

    /// Render the log-line form, without trailing newline
    pub fn to_log_line(&self) -> String {
        self.to_string()
    }

    /// Parse a line produced by [`Snapshot::to_log_line`]
    ///
    /// Floats come back at the two-decimal precision of the line.
    pub fn parse_log_line(line: &str) -> Result<Self> {
        let mut fields = line.split_whitespace();

        let stamp = fields
            .next()
            .ok_or_else(|| DecoderError::LogParseError("empty snapshot line".to_string()))?;
        let (seconds, micros) = stamp.split_once('.').ok_or_else(|| {
            DecoderError::LogParseError(format!("malformed timestamp '{}'", stamp))
        })?;
        let seconds = parse_field::<i64>(seconds, "seconds")?;
        let micros = parse_field::<u32>(micros, "microseconds")?;

        let mut ints = [0i32; IntChannel::COUNT];
        for (slot, channel) in ints.iter_mut().zip(IntChannel::ALL) {
            *slot = parse_field(next_field(&mut fields, channel.name())?, channel.name())?;
        }

        let mut floats = [0f64; FloatChannel::COUNT];
        for (slot, channel) in floats.iter_mut().zip(FloatChannel::ALL) {
            *slot = parse_field(next_field(&mut fields, channel.name())?, channel.name())?;
        }

        let mut switches = [false; SwitchChannel::COUNT];
        for (slot, channel) in switches.iter_mut().zip(SwitchChannel::ALL) {
            let name = channel.to_string();
            *slot = match next_field(&mut fields, &name)? {
                "0" => false,
                "1" => true,
                other => {
                    return Err(DecoderError::LogParseError(format!(
                        "switch {} must be 0 or 1, got '{}'",
                        name, other
                    )))
                }
            };
        }

        if let Some(extra) = fields.next() {
            return Err(DecoderError::LogParseError(format!(
                "unexpected trailing field '{}'",
                extra
            )));
        }

        Ok(Self {
            seconds,
            micros,
            ints,
            floats,
            switches,
        })
    }
}

fn next_field<'a>(fields: &mut impl Iterator<Item = &'a str>, name: &str) -> Result<&'a str> {
    fields
        .next()
        .ok_or_else(|| DecoderError::LogParseError(format!("missing field '{}'", name)))
}

fn parse_field<T: std::str::FromStr>(raw: &str, name: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| DecoderError::LogParseError(format!("invalid {} '{}'", name, raw)))
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:010}.{:06} ", self.seconds, self.micros)?;
        for value in &self.ints {
            write!(f, " {:5}", value)?;
        }
        for value in &self.floats {
            write!(f, " {:7.2}", value)?;
        }
        for value in &self.switches {
            write!(f, " {}", u8::from(*value))?;
        }
        Ok(())
    }
}

/// Emits a snapshot every `interval` routed frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEmitter {
    interval: usize,
    frames: usize,
}

impl SnapshotEmitter {
    pub fn new(interval: usize) -> Self {
        Self {
            interval: interval.max(1),
            frames: 0,
        }
    }

    /// Count one routed frame, capturing a snapshot when one is due
    pub fn record_frame(&mut self, state: &VehicleState) -> Option<Snapshot> {
        self.record_frame_at(state, Utc::now())
    }

    /// Same as [`SnapshotEmitter::record_frame`] with an explicit clock reading
    pub fn record_frame_at(&mut self, state: &VehicleState, now: DateTime<Utc>) -> Option<Snapshot> {
        self.frames += 1;
        if self.frames < self.interval {
            return None;
        }

        self.frames = 0;
        Some(Snapshot::capture(state, now))
    }

    /// Frames counted since the last snapshot
    pub fn pending(&self) -> usize {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message_decoder::{FrameMessage, WheelSpeeds};
    use chrono::TimeZone;

    fn sample_time() -> DateTime<Utc> {
        Utc.timestamp_opt(1_436_509_052, 249_713_000).unwrap()
    }

    fn sample_state() -> VehicleState {
        let mut state = VehicleState::new();
        state.apply(&FrameMessage::SteeringSensor { raw: -200 });
        state.apply(&FrameMessage::SteeringAngle { degrees: 12 });
        state.apply(&FrameMessage::EngineTorque {
            rpm: 2150,
            accel_pedal: 37.254_901_960_784_31,
            transmission_torque: 120.0,
            engine_torque: 96.0,
            torque_loss: 8.0,
        });
        state.apply(&FrameMessage::ReferenceSpeed { speed: 56.25, counter: None });
        state.apply(&FrameMessage::WheelSpeeds(WheelSpeeds {
            front_left: 56.25,
            front_right: 56.306_25,
            rear_left: 55.8,
            rear_right: -0.05625,
        }));
        state.apply(&FrameMessage::Transmission { gear: 4, brake: false });
        state
    }

    #[test]
    fn test_log_line_layout() {
        let snapshot = Snapshot::capture(&sample_state(), sample_time());
        assert_eq!(
            snapshot.to_log_line(),
            "1436509052.249713   -200    12  2150     0     4   37.25    0.00    0.00   56.25   56.25   56.31   55.80   -0.06  120.00   96.00    8.00 0 1 1"
        );
    }

    #[test]
    fn test_timestamp_zero_padding() {
        let mut snapshot = Snapshot::capture(&VehicleState::new(), sample_time());
        snapshot.seconds = 42;
        snapshot.micros = 7;
        assert!(snapshot.to_log_line().starts_with("0000000042.000007  "));
    }

    #[test]
    fn test_log_line_round_trip() {
        let snapshot = Snapshot::capture(&sample_state(), sample_time());
        let parsed = Snapshot::parse_log_line(&snapshot.to_log_line()).unwrap();

        assert_eq!(parsed.seconds, snapshot.seconds);
        assert_eq!(parsed.micros, snapshot.micros);
        assert_eq!(parsed.ints, snapshot.ints);
        assert_eq!(parsed.switches, snapshot.switches);
        for (parsed, original) in parsed.floats.iter().zip(snapshot.floats.iter()) {
            assert!((parsed - original).abs() <= 0.005 + 1e-9);
        }
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        assert!(Snapshot::parse_log_line("").is_err());
        assert!(Snapshot::parse_log_line("1436509052 1 2 3").is_err());
        let line = Snapshot::capture(&VehicleState::new(), sample_time()).to_log_line();
        assert!(Snapshot::parse_log_line(&format!("{} 1", line)).is_err());
        assert!(Snapshot::parse_log_line(&line.replace(" 1 1 1", " 1 1 2")).is_err());
    }

    #[test]
    fn test_emitter_every_fifth_frame() {
        let state = VehicleState::new();
        let mut emitter = SnapshotEmitter::new(5);
        let emitted: Vec<bool> = (0..15)
            .map(|_| emitter.record_frame_at(&state, sample_time()).is_some())
            .collect();

        let expected: Vec<bool> = (1..=15).map(|n| n % 5 == 0).collect();
        assert_eq!(emitted, expected);
        assert_eq!(emitter.pending(), 0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let snapshot = Snapshot::capture(&sample_state(), sample_time());
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["seconds"], 1_436_509_052i64);
        assert_eq!(json["ints"][2], 2150);
        assert_eq!(json["switches"][0], false);
    }
}
