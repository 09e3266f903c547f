//! Presenters selected with `--format`

use crate::config::OutputFormat;
use can_telemetry_decoder::{
    FrameMessage, Presenter, Snapshot, SwitchChannel, SwitchTransition, TpmReport,
    UnknownFrameRegistry, VehicleState,
};
use serde::Serialize;
use std::io::{self, Write};

/// Build the presenter for `format`, writing record output to stdout
pub fn presenter_for(format: OutputFormat) -> Box<dyn Presenter> {
    match format {
        OutputFormat::Lines => Box::new(LogLinePresenter::new(io::stdout())),
        OutputFormat::Json => Box::new(JsonPresenter::new(io::stdout())),
        OutputFormat::Events => Box::new(EventPresenter::default()),
    }
}

/// Writes each snapshot as one log line
pub struct LogLinePresenter<W: Write> {
    out: W,
}

impl<W: Write> LogLinePresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Presenter for LogLinePresenter<W> {
    fn switch_transition(&mut self, transition: &SwitchTransition) -> io::Result<()> {
        log::debug!("{} -> {}", transition.channel, u8::from(transition.active));
        Ok(())
    }

    fn snapshot(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        writeln!(self.out, "{}", snapshot)?;
        self.out.flush()
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum JsonRecord<'a> {
    Snapshot(&'a Snapshot),
    Switch(&'a SwitchTransition),
    TireAdvisory(&'a TpmReport),
}

/// Writes newline-delimited JSON records
pub struct JsonPresenter<W: Write> {
    out: W,
    alerted: [bool; 4],
}

impl<W: Write> JsonPresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            alerted: [false; 4],
        }
    }

    fn emit(&mut self, record: &JsonRecord<'_>) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }
}

impl<W: Write> Presenter for JsonPresenter<W> {
    fn switch_transition(&mut self, transition: &SwitchTransition) -> io::Result<()> {
        self.emit(&JsonRecord::Switch(transition))
    }

    fn tire_pressure(&mut self, report: &TpmReport) -> io::Result<()> {
        // only when the set of alerted corners changes
        if report.advisories == self.alerted {
            return Ok(());
        }
        self.alerted = report.advisories;
        self.emit(&JsonRecord::TireAdvisory(report))
    }

    fn snapshot(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        self.emit(&JsonRecord::Snapshot(snapshot))
    }
}

/// Logs what the dashboard would show, through the `log` facade
#[derive(Default)]
pub struct EventPresenter {
    alerted: [bool; 4],
    unknown_seen: usize,
}

impl EventPresenter {
    fn describe(message: &FrameMessage, state: &VehicleState) -> String {
        match *message {
            FrameMessage::SteeringSensor { raw } => format!("steering value {:7}", raw),
            FrameMessage::LateralMotion { yaw_rate, lateral_accel } => {
                let extrema = state.lateral_accel_extrema();
                format!(
                    "yaw rate {:7.3} deg/s  y_accel {:7.3} g  (left {:7.4}, right {:7.4})",
                    yaw_rate,
                    lateral_accel,
                    extrema.min().unwrap_or_default(),
                    extrema.max().unwrap_or_default()
                )
            }
            FrameMessage::LongitudinalMotion { yaw_accel, longitudinal_accel } => {
                let extrema = state.longitudinal_accel_extrema();
                format!(
                    "yaw accel {:7.3} deg/s^2  x_accel {:7.3} g  (acc {:7.4}, dec {:7.4})",
                    yaw_accel,
                    longitudinal_accel,
                    extrema.min().unwrap_or_default(),
                    extrema.max().unwrap_or_default()
                )
            }
            FrameMessage::EngineTorque {
                rpm,
                accel_pedal,
                transmission_torque,
                engine_torque,
                torque_loss,
            } => format!(
                "{:5} rpm  pedal {:6.2} %  torque {:5.1} / {:5.1} / {:5.1} Nm  diff {:5.1}",
                rpm,
                accel_pedal,
                transmission_torque,
                engine_torque,
                torque_loss,
                transmission_torque - engine_torque
            ),
            FrameMessage::Transmission { gear, .. } => format!("gear: {}", gear),
            FrameMessage::TorqueIntervention => "torque intervention".to_string(),
            FrameMessage::SteeringAngle { degrees } => format!("steering angle {:7} DEG", degrees),
            FrameMessage::ReferenceSpeed { speed, counter } => format!(
                "reference speed {:5.2} km/h  msg cnt {}",
                speed,
                counter.map_or_else(|| "-".to_string(), |c| c.to_string())
            ),
            FrameMessage::WheelSpeeds(speeds) => format!(
                "wheels FL {:5.2} FR {:5.2} RL {:5.2} RR {:5.2} km/h  \
                 front {:5.2} rear {:5.2} left {:5.2} right {:5.2}",
                speeds.front_left,
                speeds.front_right,
                speeds.rear_left,
                speeds.rear_right,
                speeds.front_delta(),
                speeds.rear_delta(),
                speeds.left_delta(),
                speeds.right_delta()
            ),
            FrameMessage::AmbientTemperature { celsius, .. } => {
                format!("ambient temperature {:5.1} degC", celsius)
            }
            FrameMessage::EngineStatus { coolant_celsius, counter, .. } => {
                let fuel = state.fuel_report();
                let extrema = state.fuel_rate_extrema();
                let per_100km = fuel
                    .liters_per_100km
                    .map_or_else(|| "  -.-".to_string(), |v| format!("{:6.1}", v));
                format!(
                    "fuel {:5.2} mm3/s (min {:5.2}, max {:5.2})  {} l/100km  {:6.1} l/h  \
                     coolant {:5} degC  msg cnt {}",
                    fuel.fuel_rate,
                    extrema.min().unwrap_or_default(),
                    extrema.max().unwrap_or_default(),
                    per_100km,
                    fuel.liters_per_hour,
                    coolant_celsius,
                    counter
                )
            }
            FrameMessage::BodyStatus { door } => format!("door bit {}", u8::from(door)),
        }
    }
}

impl Presenter for EventPresenter {
    fn channel_update(&mut self, message: &FrameMessage, state: &VehicleState) -> io::Result<()> {
        log::debug!("{}", Self::describe(message, state));
        Ok(())
    }

    fn switch_transition(&mut self, transition: &SwitchTransition) -> io::Result<()> {
        match (transition.channel, transition.active) {
            (SwitchChannel::Brake, true) => log::warn!("! BRAKE !"),
            (SwitchChannel::Door, true) => log::warn!("DOOR OPEN"),
            (channel, true) => log::info!("{}", channel),
            (channel, false) => log::info!("{} released", channel),
        }
        Ok(())
    }

    fn tire_pressure(&mut self, report: &TpmReport) -> io::Result<()> {
        for corner in can_telemetry_decoder::Corner::ALL {
            let active = report.advisory(corner);
            let was = std::mem::replace(&mut self.alerted[corner.index()], active);
            if active && !was {
                log::warn!(
                    "CHECK PRESSURE OF {} WHEEL! (counter {})",
                    corner,
                    report.counter(corner)
                );
            } else if was && !active {
                log::info!("{} wheel pressure advisory cleared", corner);
            }
        }
        Ok(())
    }

    fn snapshot(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        log::info!("values [{}]", snapshot);
        Ok(())
    }

    fn unknown_frame(&mut self, _can_id: u32, registry: &UnknownFrameRegistry) -> io::Result<()> {
        if registry.len() == self.unknown_seen {
            return Ok(());
        }
        self.unknown_seen = registry.len();

        let ids: Vec<String> = registry.ids().iter().map(|id| format!("{:02x}", id)).collect();
        log::info!("unknown frames: {} ({})", ids.join(" "), registry.len());
        Ok(())
    }
}
