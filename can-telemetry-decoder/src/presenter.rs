//! Presentation interface
//!
//! The decoder reports everything it observes through this trait and makes no
//! assumption about how it is rendered. Every method has a no-op default, so a
//! presenter only implements what it displays.

use crate::message_decoder::FrameMessage;
use crate::registry::UnknownFrameRegistry;
use crate::snapshot::Snapshot;
use crate::state::VehicleState;
use crate::switches::SwitchTransition;
use crate::tpm::TpmReport;
use std::io;

pub trait Presenter {
    /// A known frame was decoded and latched; `state` already reflects it
    fn channel_update(&mut self, _message: &FrameMessage, _state: &VehicleState) -> io::Result<()> {
        Ok(())
    }

    /// A switch changed state
    fn switch_transition(&mut self, _transition: &SwitchTransition) -> io::Result<()> {
        Ok(())
    }

    /// Tire pressure evaluation after fresh wheel speeds
    fn tire_pressure(&mut self, _report: &TpmReport) -> io::Result<()> {
        Ok(())
    }

    /// Periodic snapshot
    fn snapshot(&mut self, _snapshot: &Snapshot) -> io::Result<()> {
        Ok(())
    }

    /// A frame with an identifier outside the decode table
    fn unknown_frame(&mut self, _can_id: u32, _registry: &UnknownFrameRegistry) -> io::Result<()> {
        Ok(())
    }
}

impl<P: Presenter + ?Sized> Presenter for Box<P> {
    fn channel_update(&mut self, message: &FrameMessage, state: &VehicleState) -> io::Result<()> {
        (**self).channel_update(message, state)
    }

    fn switch_transition(&mut self, transition: &SwitchTransition) -> io::Result<()> {
        (**self).switch_transition(transition)
    }

    fn tire_pressure(&mut self, report: &TpmReport) -> io::Result<()> {
        (**self).tire_pressure(report)
    }

    fn snapshot(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        (**self).snapshot(snapshot)
    }

    fn unknown_frame(&mut self, can_id: u32, registry: &UnknownFrameRegistry) -> io::Result<()> {
        (**self).unknown_frame(can_id, registry)
    }
}

/// Presenter that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {}
