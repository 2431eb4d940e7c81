use std::fmt;
use std::path::PathBuf;

use super::error::CaptureError;

/// Tape machine the recording originates from. The id is stored in the
/// capture-file header for downstream emulators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TapeMachine {
    C64,
    C16,
    Vic20,
    Spectrum48K,
    Custom,
}

impl TapeMachine {
    pub fn id(self) -> u8 {
        match self {
            Self::C64 => 0x00,
            Self::C16 => 0x01,
            Self::Vic20 => 0x02,
            Self::Spectrum48K => 0x03,
            Self::Custom => 0xFF,
        }
    }
}

/// Video standard of the originating machine, which fixes its clock rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoStandard {
    Pal,
    Ntsc,
    Custom,
}

impl VideoStandard {
    pub fn id(self) -> u8 {
        match self {
            Self::Pal => 0x00,
            Self::Ntsc => 0x01,
            Self::Custom => 0xFF,
        }
    }
}

/// The tape profile selected on the command line. Each profile pins a
/// machine/video pair; exactly one profile must be chosen per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TapeProfile {
    C64Pal,
    C64Ntsc,
    C16Pal,
    C16Ntsc,
    VicPal,
    VicNtsc,
    Spectrum48K,
    Custom,
}

impl TapeProfile {
    pub fn machine(self) -> TapeMachine {
        match self {
            Self::C64Pal | Self::C64Ntsc => TapeMachine::C64,
            Self::C16Pal | Self::C16Ntsc => TapeMachine::C16,
            Self::VicPal | Self::VicNtsc => TapeMachine::Vic20,
            Self::Spectrum48K => TapeMachine::Spectrum48K,
            Self::Custom => TapeMachine::Custom,
        }
    }

    pub fn video(self) -> VideoStandard {
        match self {
            Self::C64Pal | Self::C16Pal | Self::VicPal => VideoStandard::Pal,
            Self::C64Ntsc | Self::C16Ntsc | Self::VicNtsc => VideoStandard::Ntsc,
            // The Spectrum profile carries its own timing; neither PAL nor
            // NTSC ids apply.
            Self::Spectrum48K => VideoStandard::Custom,
            Self::Custom => VideoStandard::Custom,
        }
    }
}

impl fmt::Display for TapeProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::C64Pal => "C64 PAL",
            Self::C64Ntsc => "C64 NTSC",
            Self::C16Pal => "C16 PAL",
            Self::C16Ntsc => "C16 NTSC",
            Self::VicPal => "VIC-20 PAL",
            Self::VicNtsc => "VIC-20 NTSC",
            Self::Spectrum48K => "Spectrum48K",
            Self::Custom => "custom/unknown",
        };
        f.write_str(label)
    }
}

/// Host-side capture buffer size. The device streams edge deltas into this
/// buffer until the tape stops or the buffer fills.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BufferCapacity {
    Mb10,
    #[default]
    Mb25,
    Mb50,
    Mb100,
}

impl BufferCapacity {
    pub fn bytes(self) -> usize {
        match self {
            Self::Mb10 => 10 * 1024 * 1024,
            Self::Mb25 => 25 * 1024 * 1024,
            Self::Mb50 => 50 * 1024 * 1024,
            Self::Mb100 => 100 * 1024 * 1024,
        }
    }

    pub fn megabytes(self) -> usize {
        self.bytes() / (1024 * 1024)
    }
}

/// Immutable capture configuration, constructed once per run from validated
/// command-line input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    pub profile: TapeProfile,
    pub capacity: BufferCapacity,
    pub output: PathBuf,
}

impl CaptureConfig {
    pub fn new(
        profile: TapeProfile,
        capacity: Option<BufferCapacity>,
        output: PathBuf,
    ) -> Result<Self, CaptureError> {
        if output.as_os_str().is_empty() {
            return Err(CaptureError::Config("output path is empty".into()));
        }
        Ok(Self {
            profile,
            capacity: capacity.unwrap_or_default(),
            output,
        })
    }
}
