//! Latched channel values and running extrema
//!
//! `VehicleState` is the only mutable aggregate of the decoder. Applying a
//! decoded message overwrites every channel that message owns and nothing
//! else; a message is applied whole or not at all.

use crate::message_decoder::{FrameMessage, WheelSpeeds};
use crate::switches::{SwitchDebouncer, SwitchTransition};
use crate::types::{FloatChannel, IntChannel, SwitchChannel};
use serde::Serialize;

/// Empirical correction applied to the injected fuel quantity
pub const FUEL_FUDGE: f64 = 64.0;

/// Injections per crankshaft revolution
const INJECTIONS_PER_REV: f64 = 2.0;

/// Running minimum and maximum of one quantity
///
/// Unset until the first sample; afterwards the range only ever widens.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Extrema {
    range: Option<(f64, f64)>,
}

impl Extrema {
    pub fn update(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        self.range = Some(match self.range {
            Some((min, max)) => (min.min(value), max.max(value)),
            None => (value, value),
        });
    }

    pub fn min(&self) -> Option<f64> {
        self.range.map(|(min, _)| min)
    }

    pub fn max(&self) -> Option<f64> {
        self.range.map(|(_, max)| max)
    }
}

/// Fuel consumption derived from the current state
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FuelReport {
    /// Injected quantity divided by the fudge factor
    pub fuel_rate: f64,
    pub liters_per_hour: f64,
    /// `None` while the reference speed is not positive
    pub liters_per_100km: Option<f64>,
}

impl FuelReport {
    pub fn compute(fuel_mm3: i32, rpm: i32, reference_speed: f64) -> Self {
        let liters_per_hour = f64::from(fuel_mm3) * INJECTIONS_PER_REV * f64::from(rpm) * 1.0e-6
            * 60.0
            / FUEL_FUDGE;

        let liters_per_100km = if reference_speed > 0.0 {
            Some(liters_per_hour * 100.0 / reference_speed)
        } else {
            None
        };

        Self {
            fuel_rate: f64::from(fuel_mm3) / FUEL_FUDGE,
            liters_per_hour,
            liters_per_100km,
        }
    }
}

/// Current value of every channel
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleState {
    ints: [i32; IntChannel::COUNT],
    floats: [f64; FloatChannel::COUNT],
    switches: SwitchDebouncer,
    longitudinal_accel: Extrema,
    lateral_accel: Extrema,
    fuel_rate: Extrema,
}

impl VehicleState {
    pub fn new() -> Self {
        Self {
            ints: [0; IntChannel::COUNT],
            floats: [0.0; FloatChannel::COUNT],
            switches: SwitchDebouncer::new(),
            longitudinal_accel: Extrema::default(),
            lateral_accel: Extrema::default(),
            fuel_rate: Extrema::default(),
        }
    }

    /// Latch the channels owned by `message`
    ///
    /// Returns the switch transition if the message carried a switch bit that
    /// differs from the stored state.
    pub fn apply(&mut self, message: &FrameMessage) -> Option<SwitchTransition> {
        match *message {
            FrameMessage::SteeringSensor { raw } => {
                self.set_int(IntChannel::SteeringRaw, i32::from(raw));
                None
            }
            FrameMessage::LateralMotion { lateral_accel, .. } => {
                self.set_float(FloatChannel::LateralAccel, lateral_accel);
                self.lateral_accel.update(lateral_accel);
                None
            }
            FrameMessage::LongitudinalMotion { longitudinal_accel, .. } => {
                self.set_float(FloatChannel::LongitudinalAccel, longitudinal_accel);
                self.longitudinal_accel.update(longitudinal_accel);
                None
            }
            FrameMessage::EngineTorque {
                rpm,
                accel_pedal,
                transmission_torque,
                engine_torque,
                torque_loss,
            } => {
                self.set_int(IntChannel::Rpm, i32::from(rpm));
                self.set_float(FloatChannel::AccelPedal, accel_pedal);
                self.set_float(FloatChannel::TransmissionTorque, transmission_torque);
                self.set_float(FloatChannel::EngineTorque, engine_torque);
                self.set_float(FloatChannel::TorqueLoss, torque_loss);
                None
            }
            FrameMessage::Transmission { gear, brake } => {
                self.set_int(IntChannel::Gear, i32::from(gear));
                self.switches.observe(SwitchChannel::Brake, brake)
            }
            FrameMessage::TorqueIntervention => None,
            FrameMessage::SteeringAngle { degrees } => {
                self.set_int(IntChannel::SteeringAngle, i32::from(degrees));
                None
            }
            FrameMessage::ReferenceSpeed { speed, .. } => {
                self.set_float(FloatChannel::ReferenceSpeed, speed);
                None
            }
            FrameMessage::WheelSpeeds(speeds) => {
                self.set_float(FloatChannel::SpeedFrontLeft, speeds.front_left);
                self.set_float(FloatChannel::SpeedFrontRight, speeds.front_right);
                self.set_float(FloatChannel::SpeedRearLeft, speeds.rear_left);
                self.set_float(FloatChannel::SpeedRearRight, speeds.rear_right);
                None
            }
            FrameMessage::AmbientTemperature { .. } => None,
            FrameMessage::EngineStatus { fuel_mm3, clutch, .. } => {
                self.set_int(IntChannel::Fuel, i32::from(fuel_mm3));
                self.fuel_rate.update(f64::from(fuel_mm3) / FUEL_FUDGE);
                self.switches.observe(SwitchChannel::Clutch, clutch)
            }
            FrameMessage::BodyStatus { door } => self.switches.observe(SwitchChannel::Door, door),
        }
    }

    fn set_int(&mut self, channel: IntChannel, value: i32) {
        self.ints[channel.index()] = value;
    }

    fn set_float(&mut self, channel: FloatChannel, value: f64) {
        self.floats[channel.index()] = value;
    }

    pub fn int(&self, channel: IntChannel) -> i32 {
        self.ints[channel.index()]
    }

    pub fn float(&self, channel: FloatChannel) -> f64 {
        self.floats[channel.index()]
    }

    pub fn switch(&self, channel: SwitchChannel) -> bool {
        self.switches.state(channel)
    }

    pub fn ints(&self) -> [i32; IntChannel::COUNT] {
        self.ints
    }

    pub fn floats(&self) -> [f64; FloatChannel::COUNT] {
        self.floats
    }

    pub fn switches(&self) -> [bool; SwitchChannel::COUNT] {
        self.switches.states()
    }

    pub fn wheel_speeds(&self) -> WheelSpeeds {
        WheelSpeeds {
            front_left: self.float(FloatChannel::SpeedFrontLeft),
            front_right: self.float(FloatChannel::SpeedFrontRight),
            rear_left: self.float(FloatChannel::SpeedRearLeft),
            rear_right: self.float(FloatChannel::SpeedRearRight),
        }
    }

    pub fn longitudinal_accel_extrema(&self) -> Extrema {
        self.longitudinal_accel
    }

    pub fn lateral_accel_extrema(&self) -> Extrema {
        self.lateral_accel
    }

    pub fn fuel_rate_extrema(&self) -> Extrema {
        self.fuel_rate
    }

    /// Fuel consumption from the latest fuel, RPM and reference speed values
    pub fn fuel_report(&self) -> FuelReport {
        FuelReport::compute(
            self.int(IntChannel::Fuel),
            self.int(IntChannel::Rpm),
            self.float(FloatChannel::ReferenceSpeed),
        )
    }
}

impl Default for VehicleState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extrema_unset_until_first_sample() {
        let mut extrema = Extrema::default();
        assert_eq!(extrema.min(), None);
        extrema.update(-0.5);
        assert_eq!(extrema.min(), Some(-0.5));
        assert_eq!(extrema.max(), Some(-0.5));
    }

    #[test]
    fn test_extrema_only_widen() {
        let mut extrema = Extrema::default();
        for value in [0.2, -0.1, 0.1, 0.4, 0.0] {
            extrema.update(value);
        }
        assert_eq!(extrema.min(), Some(-0.1));
        assert_eq!(extrema.max(), Some(0.4));
        extrema.update(f64::NAN);
        assert_eq!(extrema.max(), Some(0.4));
    }

    #[test]
    fn test_apply_touches_only_owned_channels() {
        let mut state = VehicleState::new();
        state.apply(&FrameMessage::SteeringSensor { raw: 200 });
        state.apply(&FrameMessage::ReferenceSpeed { speed: 56.25, counter: None });

        let before = state.clone();
        state.apply(&FrameMessage::SteeringAngle { degrees: -45 });

        assert_eq!(state.int(IntChannel::SteeringAngle), -45);
        for channel in IntChannel::ALL {
            if channel != IntChannel::SteeringAngle {
                assert_eq!(state.int(channel), before.int(channel));
            }
        }
        assert_eq!(state.floats(), before.floats());
        assert_eq!(state.switches(), before.switches());
    }

    #[test]
    fn test_engine_torque_fills_all_fields() {
        let mut state = VehicleState::new();
        state.apply(&FrameMessage::EngineTorque {
            rpm: 2000,
            accel_pedal: 40.0,
            transmission_torque: 160.0,
            engine_torque: 80.0,
            torque_loss: 16.0,
        });
        assert_eq!(state.int(IntChannel::Rpm), 2000);
        assert_eq!(state.float(FloatChannel::AccelPedal), 40.0);
        assert_eq!(state.float(FloatChannel::TransmissionTorque), 160.0);
        assert_eq!(state.float(FloatChannel::EngineTorque), 80.0);
        assert_eq!(state.float(FloatChannel::TorqueLoss), 16.0);
    }

    #[test]
    fn test_switch_bits_feed_debouncer() {
        let mut state = VehicleState::new();
        let transition = state.apply(&FrameMessage::Transmission { gear: 2, brake: false });
        assert_eq!(
            transition,
            Some(SwitchTransition { channel: SwitchChannel::Brake, active: false })
        );
        assert_eq!(state.int(IntChannel::Gear), 2);
        assert!(!state.switch(SwitchChannel::Brake));

        let transition = state.apply(&FrameMessage::Transmission { gear: 3, brake: false });
        assert_eq!(transition, None);
    }

    #[test]
    fn test_fuel_extrema_tracked() {
        let mut state = VehicleState::new();
        for fuel in [640u16, 128, 1280] {
            state.apply(&FrameMessage::EngineStatus {
                fuel_mm3: fuel,
                coolant_celsius: 80,
                clutch: true,
                counter: 0,
            });
        }
        assert_eq!(state.int(IntChannel::Fuel), 1280);
        assert_eq!(state.fuel_rate_extrema().min(), Some(2.0));
        assert_eq!(state.fuel_rate_extrema().max(), Some(20.0));
    }

    #[test]
    fn test_fuel_report() {
        // 64 mm3 per injection at 1000 rpm: 64 * 2 * 1000 * 1e-6 * 60 / 64 = 0.12 l/h
        let report = FuelReport::compute(64, 1000, 60.0);
        assert!((report.liters_per_hour - 0.12).abs() < 1e-9);
        assert!((report.liters_per_100km.unwrap() - 0.2).abs() < 1e-9);
        assert_eq!(report.fuel_rate, 1.0);
    }

    #[test]
    fn test_fuel_report_without_speed() {
        assert_eq!(FuelReport::compute(64, 1000, 0.0).liters_per_100km, None);
        assert_eq!(FuelReport::compute(64, 1000, -3.0).liters_per_100km, None);
    }
}
