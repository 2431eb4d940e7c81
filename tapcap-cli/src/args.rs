use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use tapcap_core::{BufferCapacity, TapeProfile};

/// Capture the signal edges of a tape into a capture file.
#[derive(Debug, Parser)]
#[command(name = "tapcap", version, about = "Capture tape signal edges to a capture file")]
pub struct Args {
    /// Machine/video profile recorded in the capture-file header.
    #[arg(value_enum)]
    pub profile: ProfileArg,

    /// Capture buffer size in megabytes.
    #[arg(short = 'b', long = "buffer", value_enum)]
    pub buffer: Option<BufferArg>,

    /// Output capture file.
    pub output: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProfileArg {
    #[value(name = "c64-pal")]
    C64Pal,
    #[value(name = "c64-ntsc")]
    C64Ntsc,
    #[value(name = "c16-pal")]
    C16Pal,
    #[value(name = "c16-ntsc")]
    C16Ntsc,
    #[value(name = "vic-pal")]
    VicPal,
    #[value(name = "vic-ntsc")]
    VicNtsc,
    #[value(name = "spec48k")]
    Spectrum48K,
    #[value(name = "custom")]
    Custom,
}

impl ProfileArg {
    pub fn profile(self) -> TapeProfile {
        match self {
            Self::C64Pal => TapeProfile::C64Pal,
            Self::C64Ntsc => TapeProfile::C64Ntsc,
            Self::C16Pal => TapeProfile::C16Pal,
            Self::C16Ntsc => TapeProfile::C16Ntsc,
            Self::VicPal => TapeProfile::VicPal,
            Self::VicNtsc => TapeProfile::VicNtsc,
            Self::Spectrum48K => TapeProfile::Spectrum48K,
            Self::Custom => TapeProfile::Custom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BufferArg {
    #[value(name = "10")]
    Mb10,
    #[value(name = "25")]
    Mb25,
    #[value(name = "50")]
    Mb50,
    #[value(name = "100")]
    Mb100,
}

impl BufferArg {
    pub fn capacity(self) -> BufferCapacity {
        match self {
            Self::Mb10 => BufferCapacity::Mb10,
            Self::Mb25 => BufferCapacity::Mb25,
            Self::Mb50 => BufferCapacity::Mb50,
            Self::Mb100 => BufferCapacity::Mb100,
        }
    }
}
