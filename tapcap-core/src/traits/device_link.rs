use thiserror::Error;

use crate::models::device::{CaptureCounter, DeviceParam, InfoField, TapeSense, TapeStatus};

/// Tape protocol revision this host speaks. The device must report the
/// same value or the session fails before any configuration is sent.
pub const TAPE_FIRMWARE_VERSION: i32 = 1;

/// Transport-level failure talking to the device. Semantic firmware
/// statuses travel separately as [`TapeStatus`] so the session can check
/// both levels on every call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct LinkError(pub String);

/// Handle through which the interrupt context requests a device-level
/// break.
///
/// The handle is registered with the cancellation controller while the
/// device session is open. Implementations must be callable from any
/// thread and must remain safe to call after the owning [`DeviceLink`] has
/// been dropped, degrading to a no-op.
pub trait BreakRequest: Send + Sync {
    fn request_break(&self) -> Result<(), LinkError>;
}

/// Operations the capture session drives on an open tape device.
///
/// Every blocking operation (the sense waits and the capture call itself)
/// carries no software timeout: it unblocks on the corresponding state
/// change or on a device-level break issued through [`BreakRequest`].
pub trait DeviceLink: Send {
    /// Tape protocol revision implemented by the device firmware.
    /// Negative values are firmware error codes.
    fn firmware_version(&mut self) -> Result<i32, LinkError>;

    /// Set a named 32-bit device parameter.
    fn set_param(&mut self, param: DeviceParam, value: u32) -> Result<TapeStatus, LinkError>;

    /// Read a named metadata string. A healthy device answers with
    /// [`TapeStatus::InfoSent`].
    fn read_info(&mut self, field: InfoField) -> Result<(TapeStatus, String), LinkError>;

    /// Arm the firmware for a capture run. A healthy device answers with
    /// [`TapeStatus::ConfiguredForRead`].
    fn prepare_capture(&mut self) -> Result<TapeStatus, LinkError>;

    /// Read the current mechanical sense state.
    fn sense(&mut self) -> Result<TapeStatus, LinkError>;

    /// Block until the deck reaches `target`, or until a break request
    /// unblocks the wait.
    fn wait_for_sense(&mut self, target: TapeSense) -> Result<TapeStatus, LinkError>;

    /// Blocking capture into `buffer`, up to its full length. Returns the
    /// completion status and the actual number of bytes written.
    fn capture(&mut self, buffer: &mut [u8]) -> Result<(TapeStatus, usize), LinkError>;

    /// Download one post-capture counter.
    fn read_counter(&mut self, counter: CaptureCounter) -> Result<(TapeStatus, u32), LinkError>;

    /// A break handle usable from the interrupt context.
    fn break_handle(&self) -> Box<dyn BreakRequest>;
}
