use std::fmt;
use std::num::NonZeroU32;

/// Mechanical play/stop state reported by the tape deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TapeSense {
    Play,
    Stop,
}

/// Polarity of the first edge seen during a capture. Recorded in the
/// capture-file header so downstream tools can reconstruct the waveform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EdgePolarity {
    #[default]
    Unspecified,
    Rising,
    Falling,
}

impl EdgePolarity {
    pub fn id(self) -> u8 {
        match self {
            Self::Unspecified => 0,
            Self::Rising => 1,
            Self::Falling => 2,
        }
    }

    /// Interpret the raw first-edge value reported by the device. Unknown
    /// values degrade to `Unspecified` rather than failing the session.
    pub fn from_device(raw: u32) -> Self {
        match raw {
            1 => Self::Rising,
            2 => Self::Falling,
            _ => Self::Unspecified,
        }
    }
}

/// Named 32-bit device parameters the host configures before capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceParam {
    /// Firmware debug verbosity, visible on the device's serial port.
    DebugLevel,
    /// Debounce delay for the mechanical sense line, to suppress noise.
    SenseDelay,
}

/// Named metadata strings the device reports once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfoField {
    BoardName,
    McuName,
    McuClock,
    FirmwareVersion,
    BufferSize,
    TimerSpeed,
    SamplingRate,
}

/// Post-capture counters downloaded from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureCounter {
    FirstEdge,
    Lost,
    Discarded,
    Overcapture,
}

/// Semantic status codes reported by the tape firmware. Every device call
/// is checked at two levels: the transport result and one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TapeStatus {
    Ok,
    InfoSent,
    ConfiguredForRead,
    SenseOnPlay,
    SenseOnStop,
    CaptureFinished,
    SenseNotOnPlay,
    DeviceNotConfigured,
    DeviceDisconnected,
    NotInTapeMode,
    NoTapeSupport,
}

impl fmt::Display for TapeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Ok => "ok",
            Self::InfoSent => "info sent",
            Self::ConfiguredForRead => "device configured for read",
            Self::SenseOnPlay => "sense on <PLAY>",
            Self::SenseOnStop => "sense on <STOP>",
            Self::CaptureFinished => "capture finished",
            Self::SenseNotOnPlay => "sense not on <PLAY>",
            Self::DeviceNotConfigured => "device not configured",
            Self::DeviceDisconnected => "device disconnected",
            Self::NotInTapeMode => "device not in tape mode",
            Self::NoTapeSupport => "no tape support in firmware",
        };
        f.write_str(text)
    }
}

/// Read-only hardware snapshot fetched once per session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    pub board_name: String,
    pub mcu_name: String,
    pub mcu_clock: String,
    pub firmware_version: String,
    pub buffer_size: String,
    /// Hardware timer speed in MHz, parsed from the device's string report.
    /// Zero means the report was missing or unparsable and the session must
    /// fail before any duration arithmetic.
    pub precision_mhz: u32,
    pub sampling_rate: String,
}

impl DeviceInfo {
    /// The validated oscillator precision, or `None` when the device
    /// reported zero.
    pub fn precision(&self) -> Option<NonZeroU32> {
        NonZeroU32::new(self.precision_mhz)
    }
}

/// Capture diagnostics downloaded after a successful capture. These are
/// reported to the user but never fail the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureDiagnostics {
    pub first_edge: EdgePolarity,
    pub lost: u32,
    pub discarded: u32,
    pub overcapture: u32,
}
