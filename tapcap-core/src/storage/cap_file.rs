//! Capture-file serialization.
//!
//! A capture file is a fixed-layout header, a fixed-size free-text
//! annotation, and the variable-length edge-delta stream:
//!
//! ```text
//! [0-7]    magic "TAPECAP1"
//! [8-11]   oscillator precision in MHz (u32 LE)
//! [12]     machine id
//! [13]     video id
//! [14]     start-edge id
//! [15]     signal-format id
//! [16]     signal width in bits (40: the widest delta form is 5 bytes)
//! [17-19]  reserved, zero
//! [20-23]  start-of-data offset (u32 LE, = 72)
//! [24-71]  annotation, 48 bytes, space padded
//! [72-..]  edge-delta stream (codec module)
//! ```
//!
//! Writing is not transactional: a crash mid-write leaves a partial file
//! on disk. Callers treat any unfinished file as unusable and remove it
//! when the session fails.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::codec::{self, StreamStats};
use crate::models::error::CaptureError;

pub const CAP_MAGIC: [u8; 8] = *b"TAPECAP1";
pub const HEADER_SIZE: usize = 24;
pub const ANNOTATION_SIZE: usize = 0x30;
pub const DATA_START_OFFSET: u32 = (HEADER_SIZE + ANNOTATION_SIZE) as u32;

/// Deltas are relative tick counts between consecutive edges.
pub const SIGNAL_FORMAT_RELATIVE: u8 = 0x00;
/// Deltas are absolute timestamps. Not produced by this tool; reserved
/// for downstream converters.
pub const SIGNAL_FORMAT_ABSOLUTE: u8 = 0x01;

/// Widest signal word in the stream: the 5-byte long form.
pub const SIGNAL_WIDTH_40BIT: u8 = 40;

/// Annotation written when the caller supplies none.
pub const DEFAULT_ANNOTATION: &str = "Created by tapcap";

/// Fixed header fields of a capture file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapFileHeader {
    pub precision_mhz: u32,
    pub machine: u8,
    pub video: u8,
    pub start_edge: u8,
    pub signal_format: u8,
    pub signal_width: u8,
    pub start_offset: u32,
}

impl CapFileHeader {
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut header = [0u8; HEADER_SIZE];
        header[0..8].copy_from_slice(&CAP_MAGIC);
        header[8..12].copy_from_slice(&self.precision_mhz.to_le_bytes());
        header[12] = self.machine;
        header[13] = self.video;
        header[14] = self.start_edge;
        header[15] = self.signal_format;
        header[16] = self.signal_width;
        header[20..24].copy_from_slice(&self.start_offset.to_le_bytes());
        header
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CaptureError> {
        if bytes.len() < HEADER_SIZE {
            return Err(CaptureError::Io(format!(
                "capture file header truncated: {} of {HEADER_SIZE} bytes",
                bytes.len()
            )));
        }
        if bytes[0..8] != CAP_MAGIC {
            return Err(CaptureError::Io("not a capture file (bad magic)".into()));
        }
        Ok(Self {
            precision_mhz: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            machine: bytes[12],
            video: bytes[13],
            start_edge: bytes[14],
            signal_format: bytes[15],
            signal_width: bytes[16],
            start_offset: u32::from_le_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]),
        })
    }
}

/// Streaming writer for the capture-file artifact.
///
/// The file is created up front (so the overwrite decision happens before
/// the hardware session starts) and the header is written once capture
/// diagnostics are known.
pub struct CapFileWriter {
    path: PathBuf,
    file: Option<File>,
    bytes_written: u64,
    stats: StreamStats,
}

impl CapFileWriter {
    /// Create (or truncate) the capture file.
    pub fn create(path: &Path) -> Result<Self, CaptureError> {
        let file = File::create(path)
            .map_err(|err| CaptureError::Io(format!("could not create {}: {err}", path.display())))?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            bytes_written: 0,
            stats: StreamStats::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the fixed header and the annotation block, padded or
    /// truncated to its byte budget.
    pub fn write_header(
        &mut self,
        header: &CapFileHeader,
        annotation: &str,
    ) -> Result<(), CaptureError> {
        let mut block = [b' '; ANNOTATION_SIZE];
        let text = annotation.as_bytes();
        let len = text.len().min(ANNOTATION_SIZE);
        block[..len].copy_from_slice(&text[..len]);

        self.write_raw(&header.encode())?;
        self.write_raw(&block)
    }

    /// Append one edge delta, re-encoded through the signal codec.
    pub fn write_signal(&mut self, delta: u64) -> Result<(), CaptureError> {
        let narrow =
            u32::try_from(delta).map_err(|_| codec::CodecError::DeltaTooWide(delta))?;
        let encoded = codec::encode_delta(narrow)?;
        self.write_raw(encoded.as_bytes())?;
        self.stats.signal_count += 1;
        self.stats.total_ticks += delta;
        Ok(())
    }

    /// Decode a raw captured stream and append every delta.
    pub fn write_stream(&mut self, stream: &[u8]) -> Result<(), CaptureError> {
        for delta in codec::DeltaReader::new(stream) {
            self.write_signal(delta?)?;
        }
        Ok(())
    }

    /// Flush and close, returning aggregate statistics for the written
    /// stream.
    pub fn finish(mut self) -> Result<StreamStats, CaptureError> {
        if let Some(mut file) = self.file.take() {
            file.flush()
                .map_err(|err| CaptureError::Io(format!("flush failed: {err}")))?;
            file.sync_all()
                .map_err(|err| CaptureError::Io(format!("sync failed: {err}")))?;
        }
        Ok(self.stats)
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), CaptureError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| CaptureError::Io("capture file already closed".into()))?;
        file.write_all(data)
            .map_err(|err| CaptureError::Io(format!("write failed: {err}")))?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }
}
