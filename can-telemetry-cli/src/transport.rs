//! Frame sources: a live SocketCAN interface or a candump recording

use anyhow::{Context, Result};
use can_telemetry_decoder::{CandumpParser, CanFrame};
use std::io::{self, BufReader};
use std::path::Path;

/// Boxed stream of frames handed to the decoder
pub type FrameSource = Box<dyn Iterator<Item = can_telemetry_decoder::Result<CanFrame>>>;

/// Replay a candump recording, `-` reads from stdin
pub fn open_replay(path: &Path) -> Result<FrameSource> {
    if path == Path::new("-") {
        log::info!("Replaying candump log from stdin");
        return Ok(Box::new(CandumpParser::from_reader(BufReader::new(io::stdin()))));
    }

    let frames = CandumpParser::parse(path)
        .with_context(|| format!("Failed to open replay file: {:?}", path))?;
    Ok(Box::new(frames))
}

/// Open a raw CAN socket bound to `interface`
#[cfg(target_os = "linux")]
pub fn open_interface(interface: &str) -> Result<FrameSource> {
    let source = socket::SocketCanSource::open(interface)?;
    Ok(Box::new(source))
}

#[cfg(not(target_os = "linux"))]
pub fn open_interface(interface: &str) -> Result<FrameSource> {
    anyhow::bail!(
        "SocketCAN is only available on Linux; cannot open '{}'. Use --replay FILE instead",
        interface
    )
}

#[cfg(target_os = "linux")]
mod socket {
    use anyhow::{Context, Result};
    use can_telemetry_decoder::{CanFrame, DecoderError};
    use socketcan::{CanFrame as SocketCanFrame, CanSocket, EmbeddedFrame, Frame, Socket};

    /// Blocking reader over a SocketCAN raw socket
    pub struct SocketCanSource {
        socket: CanSocket,
        interface: String,
    }

    impl SocketCanSource {
        pub fn open(interface: &str) -> Result<Self> {
            let socket = CanSocket::open(interface)
                .with_context(|| format!("Failed to open CAN socket on '{}'", interface))?;
            log::info!("Listening on {}", interface);

            Ok(Self {
                socket,
                interface: interface.to_string(),
            })
        }

        /// Classic data frames with a standard identifier, anything else is skipped
        fn convert(frame: &SocketCanFrame) -> Option<CanFrame> {
            match frame {
                SocketCanFrame::Data(data) if !data.is_extended() => {
                    CanFrame::new(data.raw_id(), data.data()).ok()
                }
                SocketCanFrame::Data(data) => {
                    log::trace!("Skipping extended frame 0x{:08X}", data.raw_id());
                    None
                }
                SocketCanFrame::Remote(_) => None,
                SocketCanFrame::Error(_) => {
                    log::debug!("Error frame received");
                    None
                }
            }
        }
    }

    impl Iterator for SocketCanSource {
        type Item = can_telemetry_decoder::Result<CanFrame>;

        fn next(&mut self) -> Option<Self::Item> {
            loop {
                match self.socket.read_frame() {
                    Ok(frame) => {
                        if let Some(frame) = Self::convert(&frame) {
                            return Some(Ok(frame));
                        }
                    }
                    Err(e) => {
                        log::error!("Error reading from {}: {}", self.interface, e);
                        return Some(Err(DecoderError::IoError(e)));
                    }
                }
            }
        }
    }
}
