//! Recorded CAN traffic formats
//!
//! Each parser yields `Result<CanFrame>` items so a recording can be fed to
//! `Decoder::run` exactly like a live bus.

pub mod candump;

pub use candump::{CandumpFrameIterator, CandumpParser};
