//! CAN Telemetry Decoder Library
//!
//! Decodes a vehicle's CAN traffic into physical channels (steering, wheel
//! speeds, torques, fuel) and derives situational state from them: brake,
//! clutch and door transitions, and a tire pressure advisory based on wheel
//! speed skew.
//!
//! # Architecture
//!
//! - `message_decoder`: identifier → typed message, one fixed layout per ID
//! - `state`: latched channel values and running extrema
//! - `switches`: edge detection on the switch bits
//! - `tpm`: hysteresis counters per wheel corner
//! - `registry`: bounded set of identifiers without a layout
//! - `snapshot`: periodic timestamped read of all channels
//! - `decoder`: the engine routing one frame at a time through the above
//!
//! The library does NOT open sockets or render anything. Frames come from the
//! caller and observations leave through the [`Presenter`] trait.
//!
//! # Example Usage
//!
//! ```no_run
//! use can_telemetry_decoder::{CanFrame, Decoder, MonitorConfig, NullPresenter};
//!
//! let config = MonitorConfig::new().with_steering_limit(15);
//! let mut decoder = Decoder::with_config(config).unwrap();
//!
//! let frame = CanFrame::new(0x512, &[0, 0, 0xE8, 0x03, 0, 0, 0, 0]).unwrap();
//! decoder.process_frame(&frame, &mut NullPresenter).unwrap();
//! ```

// Public modules
pub mod config;
pub mod decoder;
pub mod formats;
pub mod message_decoder;
pub mod presenter;
pub mod registry;
pub mod snapshot;
pub mod state;
pub mod switches;
pub mod tpm;
pub mod types;

// Re-export main types for convenience
pub use config::MonitorConfig;
pub use decoder::{DecodeStats, Decoder, FrameOutcome};
pub use formats::{CandumpFrameIterator, CandumpParser};
pub use message_decoder::{Decoded, FrameId, FrameMessage, MessageDecoder, WheelSpeeds};
pub use presenter::{NullPresenter, Presenter};
pub use registry::UnknownFrameRegistry;
pub use snapshot::{Snapshot, SnapshotEmitter};
pub use state::{Extrema, FuelReport, VehicleState};
pub use switches::{SwitchDebouncer, SwitchTransition};
pub use tpm::{PairSkew, TirePressureMonitor, TpmReport};
pub use types::{
    CanFrame, Corner, DecoderError, FloatChannel, IntChannel, Result, SwitchChannel,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: ensure we can create a decoder
        let decoder = Decoder::new();
        assert_eq!(decoder.stats().frames, 0);
        assert_eq!(FrameId::ALL.len(), 12);
        assert_eq!(FloatChannel::COUNT, 11);
        assert_eq!(IntChannel::COUNT, 5);
    }
}
