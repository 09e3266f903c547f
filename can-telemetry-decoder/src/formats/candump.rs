//! candump log parser
//!
//! Reads recordings made with the SocketCAN `candump` utility so a drive can be
//! decoded without a bus attached.
//!
//! ## Supported Line Formats
//! - Log format (`candump -l` / `-L`): `(1436509052.249713) can0 002#4500000000000000`
//! - Bare frame: `002#4500000000000000`
//! - Default console format: `  can0  002   [8]  45 00 00 00 00 00 00 00`
//!
//! ## Skipped Lines
//! Blank lines, remote frames (`#R`), CAN-FD frames (`##`) and extended
//! identifiers. Malformed lines are reported once per line number and skipped.

use crate::types::{CanFrame, DecoderError, Result, CAN_MAX_DLEN};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// candump log parser
pub struct CandumpParser;

impl CandumpParser {
    /// Open a candump log file and return an iterator over its frames
    pub fn parse(path: &Path) -> Result<CandumpFrameIterator<BufReader<File>>> {
        log::info!("Parsing candump log: {:?}", path);

        if !path.exists() {
            return Err(DecoderError::LogParseError(format!(
                "candump log not found: {:?}",
                path
            )));
        }

        let file = File::open(path).map_err(|e| {
            DecoderError::LogParseError(format!("Failed to open candump log: {}", e))
        })?;

        Ok(Self::from_reader(BufReader::new(file)))
    }

    /// Iterate over frames from any buffered reader (e.g. stdin)
    pub fn from_reader<R: BufRead>(reader: R) -> CandumpFrameIterator<R> {
        CandumpFrameIterator {
            reader,
            line: String::new(),
            line_number: 0,
            skipped: 0,
        }
    }

    /// Parse a single line
    ///
    /// # Returns
    /// * `Ok(Some(frame))` for a classic standard-ID data frame
    /// * `Ok(None)` for lines that are valid but carry nothing to decode
    /// * `Err(_)` for malformed lines
    pub fn parse_line(line: &str) -> Result<Option<CanFrame>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        if let Some(token) = line.split_whitespace().find(|t| t.contains('#')) {
            return Self::parse_compact(token);
        }

        Self::parse_console(line)
    }

    /// `ID#DATA` token
    fn parse_compact(token: &str) -> Result<Option<CanFrame>> {
        let (id, data) = token
            .split_once('#')
            .ok_or_else(|| malformed(token, "missing '#'"))?;

        if data.starts_with('#') {
            log::trace!("Skipping CAN-FD frame {}", token);
            return Ok(None);
        }
        if data.starts_with('R') || data.starts_with('r') {
            log::trace!("Skipping remote frame {}", token);
            return Ok(None);
        }
        if id.len() > 3 {
            log::trace!("Skipping extended identifier {}", token);
            return Ok(None);
        }

        let can_id = parse_id(id)?;
        let payload = parse_hex_bytes(data)?;
        CanFrame::new(can_id, &payload).map(Some)
    }

    /// `iface  ID   [len]  b0 b1 ...`
    fn parse_console(line: &str) -> Result<Option<CanFrame>> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let len_pos = tokens
            .iter()
            .position(|t| t.starts_with('[') && t.ends_with(']'))
            .ok_or_else(|| malformed(line, "no frame found"))?;

        if len_pos == 0 {
            return Err(malformed(line, "missing identifier"));
        }

        let id = tokens[len_pos - 1];
        if id.len() > 3 {
            log::trace!("Skipping extended identifier {}", id);
            return Ok(None);
        }

        let len: usize = tokens[len_pos]
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse()
            .map_err(|_| malformed(line, "invalid length"))?;
        if len > CAN_MAX_DLEN {
            return Ok(None);
        }

        let bytes = &tokens[len_pos + 1..];
        if bytes.first().is_some_and(|t| t.eq_ignore_ascii_case("remote")) {
            return Ok(None);
        }
        if bytes.len() < len {
            return Err(malformed(line, "fewer data bytes than length"));
        }

        let payload = bytes[..len]
            .iter()
            .map(|b| u8::from_str_radix(b, 16).map_err(|_| malformed(line, "invalid data byte")))
            .collect::<Result<Vec<u8>>>()?;

        CanFrame::new(parse_id(id)?, &payload).map(Some)
    }
}

fn malformed(input: &str, reason: &str) -> DecoderError {
    DecoderError::LogParseError(format!("{}: '{}'", reason, input))
}

fn parse_id(id: &str) -> Result<u32> {
    u32::from_str_radix(id, 16).map_err(|_| malformed(id, "invalid CAN identifier"))
}

fn parse_hex_bytes(data: &str) -> Result<Vec<u8>> {
    let data: String = data.chars().filter(|c| *c != '.').collect();
    if data.len() % 2 != 0 {
        return Err(malformed(&data, "odd number of hex digits"));
    }

    (0..data.len())
        .step_by(2)
        .map(|i| {
            data.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| malformed(&data, "invalid hex byte"))
        })
        .collect()
}

/// Iterator over CAN frames from a candump log
pub struct CandumpFrameIterator<R> {
    reader: R,
    line: String,
    line_number: usize,
    skipped: usize,
}

impl<R> CandumpFrameIterator<R> {
    /// Number of malformed lines skipped so far
    pub fn skipped_lines(&self) -> usize {
        self.skipped
    }
}

impl<R: BufRead> Iterator for CandumpFrameIterator<R> {
    type Item = Result<CanFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e.into())),
            }
            self.line_number += 1;

            match CandumpParser::parse_line(&self.line) {
                Ok(Some(frame)) => return Some(Ok(frame)),
                Ok(None) => continue,
                Err(e) => {
                    self.skipped += 1;
                    log::warn!("Skipping candump line {}: {}", self.line_number, e);
                    continue;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_candump_file_not_found() {
        let result = CandumpParser::parse(Path::new("nonexistent.log"));
        assert!(result.is_err());
    }

    #[test]
    fn test_candump_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "(1436509052.249713) can0 511#F6FF").unwrap();
        writeln!(file, "(1436509052.250101) can0 7DF#0201").unwrap();

        let frames: Vec<CanFrame> = CandumpParser::parse(file.path())
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].data(), &[0xF6, 0xFF]);
        assert_eq!(frames[1].can_id, 0x7DF);
    }

    #[test]
    fn test_log_format_line() {
        let frame = CandumpParser::parse_line("(1436509052.249713) can0 512#0000E80300070000")
            .unwrap()
            .unwrap();
        assert_eq!(frame.can_id, 0x512);
        assert_eq!(frame.data(), &[0x00, 0x00, 0xE8, 0x03, 0x00, 0x07, 0x00, 0x00]);
    }

    #[test]
    fn test_bare_and_short_frames() {
        let frame = CandumpParser::parse_line("620#20").unwrap().unwrap();
        assert_eq!(frame.can_id, 0x620);
        assert_eq!(frame.dlc(), 1);

        let frame = CandumpParser::parse_line("501#").unwrap().unwrap();
        assert_eq!(frame.dlc(), 0);
    }

    #[test]
    fn test_console_format_line() {
        let frame = CandumpParser::parse_line("  can0  002   [8]  C8 00 00 00 00 00 00 00")
            .unwrap()
            .unwrap();
        assert_eq!(frame.can_id, 0x002);
        assert_eq!(frame.data()[0], 0xC8);
    }

    #[test]
    fn test_skipped_frame_kinds() {
        assert_eq!(CandumpParser::parse_line("").unwrap(), None);
        assert_eq!(CandumpParser::parse_line("123#R").unwrap(), None);
        assert_eq!(CandumpParser::parse_line("123##1DEADBEEF").unwrap(), None);
        assert_eq!(CandumpParser::parse_line("18FEF100#0011223344556677").unwrap(), None);
    }

    #[test]
    fn test_malformed_lines() {
        assert!(CandumpParser::parse_line("XYZ#00").is_err());
        assert!(CandumpParser::parse_line("123#0").is_err());
        assert!(CandumpParser::parse_line("123#001122334455667788").is_err());
        assert!(CandumpParser::parse_line("not a frame").is_err());
    }

    #[test]
    fn test_iterator_skips_bad_lines() {
        let log = "\
(0.000001) can0 002#C800000000000000
garbage
(0.000002) can0 123#DEADBEEF

(0.000003) can0 620#20
";
        let mut frames = CandumpParser::from_reader(Cursor::new(log));
        let ids: Vec<u32> = frames
            .by_ref()
            .map(|frame| frame.unwrap().can_id)
            .collect();
        assert_eq!(ids, vec![0x002, 0x123, 0x620]);
        assert_eq!(frames.skipped_lines(), 1);
    }
}
