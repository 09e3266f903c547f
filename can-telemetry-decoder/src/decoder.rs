//! Main decoder API
//!
//! The `Decoder` owns all mutable state and routes one frame at a time:
//! decode → latch into `VehicleState` → switch edges → tire check (wheel
//! speed frames only) → unknown registry (unrecognised identifiers) →
//! snapshot cadence. Everything it observes is reported to a [`Presenter`].

use crate::config::MonitorConfig;
use crate::message_decoder::{Decoded, FrameId, FrameMessage, MessageDecoder};
use crate::presenter::Presenter;
use crate::registry::UnknownFrameRegistry;
use crate::snapshot::SnapshotEmitter;
use crate::state::VehicleState;
use crate::tpm::TirePressureMonitor;
use crate::types::{CanFrame, DecoderError, IntChannel, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What happened to one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Decoded and latched
    Recognized(FrameId),
    /// Identifier outside the decode table, routed to the unknown registry
    Unrecognized(u32),
    /// Payload too short for the identifier's layout; nothing was touched
    Rejected(u32),
}

/// Running counters over the processed stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecodeStats {
    pub frames: u64,
    pub recognized: u64,
    pub unrecognized: u64,
    pub rejected: u64,
    pub snapshots: u64,
}

/// The decoding engine - entry point for all frame processing
pub struct Decoder {
    config: MonitorConfig,
    state: VehicleState,
    tpm: TirePressureMonitor,
    unknown: UnknownFrameRegistry,
    snapshots: SnapshotEmitter,
    stats: DecodeStats,
}

impl Decoder {
    /// Create a decoder with the default monitor configuration
    pub fn new() -> Self {
        Self::build(MonitorConfig::default())
    }

    /// Create a decoder with a validated configuration
    pub fn with_config(config: MonitorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: MonitorConfig) -> Self {
        Self {
            tpm: TirePressureMonitor::new(&config),
            unknown: UnknownFrameRegistry::new(config.unknown_capacity),
            snapshots: SnapshotEmitter::new(config.snapshot_interval),
            state: VehicleState::new(),
            stats: DecodeStats::default(),
            config,
        }
    }

    /// Route one frame through the decoder
    ///
    /// Only presenter I/O errors are returned; short frames and unknown
    /// identifiers are absorbed and reported through the outcome.
    pub fn process_frame<P>(&mut self, frame: &CanFrame, presenter: &mut P) -> Result<FrameOutcome>
    where
        P: Presenter + ?Sized,
    {
        self.process_frame_at(frame, presenter, Utc::now())
    }

    /// Same as [`Decoder::process_frame`] with an explicit clock reading for snapshots
    pub fn process_frame_at<P>(
        &mut self,
        frame: &CanFrame,
        presenter: &mut P,
        now: DateTime<Utc>,
    ) -> Result<FrameOutcome>
    where
        P: Presenter + ?Sized,
    {
        self.stats.frames += 1;

        let outcome = match MessageDecoder::decode(frame) {
            Ok(Decoded::Known(message)) => {
                self.stats.recognized += 1;
                self.apply(&message, presenter)?;
                FrameOutcome::Recognized(message.frame_id())
            }
            Ok(Decoded::Unknown(can_id)) => {
                self.stats.unrecognized += 1;
                if self.unknown.insert(can_id) {
                    log::debug!(
                        "New unknown CAN ID 0x{:03X} ({} recorded)",
                        can_id,
                        self.unknown.len()
                    );
                }
                presenter.unknown_frame(can_id, &self.unknown)?;
                FrameOutcome::Unrecognized(can_id)
            }
            Err(e @ DecoderError::FrameTooShort { .. }) => {
                self.stats.rejected += 1;
                log::warn!("Rejected frame: {}", e);
                return Ok(FrameOutcome::Rejected(frame.can_id));
            }
            Err(e) => return Err(e),
        };

        if let Some(snapshot) = self.snapshots.record_frame_at(&self.state, now) {
            self.stats.snapshots += 1;
            presenter.snapshot(&snapshot)?;
        }

        Ok(outcome)
    }

    fn apply<P>(&mut self, message: &FrameMessage, presenter: &mut P) -> Result<()>
    where
        P: Presenter + ?Sized,
    {
        let transition = self.state.apply(message);
        presenter.channel_update(message, &self.state)?;

        if let Some(transition) = transition {
            presenter.switch_transition(&transition)?;
        }

        if let FrameMessage::WheelSpeeds(speeds) = message {
            let angle = self.state.int(IntChannel::SteeringAngle);
            if let Some(report) = self.tpm.check(angle, speeds) {
                for corner in report.alerted() {
                    log::debug!(
                        "Tire pressure advisory {} (counter {})",
                        corner,
                        report.counter(corner)
                    );
                }
                presenter.tire_pressure(&report)?;
            }
        }

        Ok(())
    }

    /// Process every frame of a source until it ends or `max_frames` is reached
    ///
    /// The first error from the source or the presenter stops the run.
    pub fn run<I, P>(&mut self, frames: I, presenter: &mut P, max_frames: Option<u64>) -> Result<DecodeStats>
    where
        I: IntoIterator<Item = Result<CanFrame>>,
        P: Presenter + ?Sized,
    {
        for frame in frames {
            if max_frames.is_some_and(|max| self.stats.frames >= max) {
                log::info!("Frame limit of {} reached", self.stats.frames);
                break;
            }
            self.process_frame(&frame?, presenter)?;
        }
        Ok(self.stats)
    }

    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    pub fn tire_monitor(&self) -> &TirePressureMonitor {
        &self.tpm
    }

    pub fn unknown_frames(&self) -> &UnknownFrameRegistry {
        &self.unknown
    }

    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::NullPresenter;

    #[test]
    fn test_decoder_creation() {
        let decoder = Decoder::new();
        assert_eq!(decoder.stats(), DecodeStats::default());
        assert!(decoder.unknown_frames().is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = MonitorConfig::new().with_snapshot_interval(0);
        assert!(Decoder::with_config(config).is_err());
    }

    #[test]
    fn test_outcomes() {
        let mut decoder = Decoder::new();
        let mut presenter = NullPresenter;

        let known = CanFrame::new(0x002, &[1, 0]).unwrap();
        let unknown = CanFrame::new(0x3FF, &[]).unwrap();
        let short = CanFrame::new(0x410, &[0, 1, 2]).unwrap();

        assert_eq!(
            decoder.process_frame(&known, &mut presenter).unwrap(),
            FrameOutcome::Recognized(FrameId::SteeringSensor)
        );
        assert_eq!(
            decoder.process_frame(&unknown, &mut presenter).unwrap(),
            FrameOutcome::Unrecognized(0x3FF)
        );
        assert_eq!(
            decoder.process_frame(&short, &mut presenter).unwrap(),
            FrameOutcome::Rejected(0x410)
        );

        let stats = decoder.stats();
        assert_eq!(stats.frames, 3);
        assert_eq!(stats.recognized, 1);
        assert_eq!(stats.unrecognized, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(decoder.state().int(IntChannel::SteeringRaw), 1);
    }

    #[test]
    fn test_run_honours_frame_limit() {
        let mut decoder = Decoder::new();
        let frames = (0..10).map(|_| CanFrame::new(0x002, &[0, 0]));
        let stats = decoder.run(frames, &mut NullPresenter, Some(4)).unwrap();
        assert_eq!(stats.frames, 4);
    }
}
