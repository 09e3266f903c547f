//! Edge detection over the brake, clutch and door bits
//!
//! A transition is reported the moment a sampled bit differs from the stored
//! state; there is no time-based filtering. All switches start out `true`, so
//! the first `false` sample after start-up always reports a transition even if
//! nothing physically changed.

use crate::types::SwitchChannel;
use serde::Serialize;

/// A switch changed state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwitchTransition {
    pub channel: SwitchChannel,
    pub active: bool,
}

/// Stored state of the three switch channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchDebouncer {
    states: [bool; SwitchChannel::COUNT],
}

impl SwitchDebouncer {
    pub fn new() -> Self {
        Self {
            states: [true; SwitchChannel::COUNT],
        }
    }

    /// Feed one raw bit sample, returning the transition if the state flipped
    pub fn observe(&mut self, channel: SwitchChannel, raw: bool) -> Option<SwitchTransition> {
        let stored = &mut self.states[channel.index()];
        if *stored == raw {
            return None;
        }

        *stored = raw;
        log::debug!("Switch {} -> {}", channel, raw);
        Some(SwitchTransition {
            channel,
            active: raw,
        })
    }

    pub fn state(&self, channel: SwitchChannel) -> bool {
        self.states[channel.index()]
    }

    /// All switch states in snapshot order
    pub fn states(&self) -> [bool; SwitchChannel::COUNT] {
        self.states
    }
}

impl Default for SwitchDebouncer {
    fn default() -> Self {
        Self::new()
    }
}
