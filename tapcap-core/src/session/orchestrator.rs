use std::num::NonZeroU32;
use std::sync::Arc;

use crate::buffer::CaptureBuffer;
use crate::models::device::{
    CaptureCounter, CaptureDiagnostics, DeviceInfo, DeviceParam, EdgePolarity, InfoField,
    TapeSense, TapeStatus,
};
use crate::models::error::CaptureError;
use crate::models::state::SessionPhase;
use crate::session::cancel::CancellationController;
use crate::traits::device_link::{DeviceLink, LinkError, TAPE_FIRMWARE_VERSION};
use crate::traits::session_observer::{NoopObserver, SessionObserver};

/// Firmware debug verbosity requested for capture runs.
pub const CAPTURE_DEBUG_LEVEL: u32 = 0;

/// Sense-line debounce delay in milliseconds, set before capture to keep
/// mechanical noise from faking play/stop transitions.
pub const CAPTURE_SENSE_DELAY_MS: u32 = 100;

/// Everything a finished session hands to the capture-file stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureReport {
    pub info: DeviceInfo,
    /// Oscillator precision in MHz, already validated non-zero.
    pub precision: NonZeroU32,
    pub captured_len: usize,
    pub diagnostics: CaptureDiagnostics,
}

/// Drives a [`DeviceLink`] through the capture sequence.
///
/// The shared abort flag is polled before every state transition; once it
/// is set the session terminates in `Aborted` without starting the next
/// step. Blocking device calls additionally unblock through the
/// device-level break request issued by the cancellation controller, so a
/// long sense wait cannot outlive an abort.
pub struct CaptureOrchestrator<L: DeviceLink> {
    link: L,
    cancel: Arc<CancellationController>,
    observer: Arc<dyn SessionObserver>,
    phase: SessionPhase,
}

impl<L: DeviceLink> CaptureOrchestrator<L> {
    pub fn new(link: L, cancel: Arc<CancellationController>) -> Self {
        Self::with_observer(link, cancel, Arc::new(NoopObserver))
    }

    pub fn with_observer(
        link: L,
        cancel: Arc<CancellationController>,
        observer: Arc<dyn SessionObserver>,
    ) -> Self {
        Self {
            link,
            cancel,
            observer,
            phase: SessionPhase::Idle,
        }
    }

    /// Run the full capture sequence, filling `buffer` with the raw delta
    /// stream.
    ///
    /// Consumes the orchestrator; dropping it closes the device link.
    pub fn run(mut self, buffer: &mut CaptureBuffer) -> Result<CaptureReport, CaptureError> {
        match self.drive(buffer) {
            Ok(report) => {
                self.set_phase(SessionPhase::Finished);
                Ok(report)
            }
            Err(_) if self.cancel.is_abort_requested() => {
                // A device error observed while an abort is in flight is
                // the break request tearing the session down, not a fault.
                self.set_phase(SessionPhase::Aborted);
                Err(CaptureError::UserAbort)
            }
            Err(err) => {
                self.set_phase(SessionPhase::Failed(err.clone()));
                Err(err)
            }
        }
    }

    fn drive(&mut self, buffer: &mut CaptureBuffer) -> Result<CaptureReport, CaptureError> {
        self.cancel.checkpoint()?;
        self.check_firmware_version()?;

        self.cancel.checkpoint()?;
        self.configure_device()?;

        self.cancel.checkpoint()?;
        let info = self.read_metadata()?;
        let precision = info.precision().ok_or(CaptureError::InvalidPrecision)?;

        self.cancel.checkpoint()?;
        self.prepare_capture()?;

        self.cancel.checkpoint()?;
        self.check_sense()?;

        self.cancel.checkpoint()?;
        self.wait_for_play()?;

        self.cancel.checkpoint()?;
        let captured_len = self.capture_into(buffer)?;

        self.cancel.checkpoint()?;
        let diagnostics = self.read_diagnostics();

        self.cancel.checkpoint()?;
        Ok(CaptureReport {
            info,
            precision,
            captured_len,
            diagnostics,
        })
    }

    fn check_firmware_version(&mut self) -> Result<(), CaptureError> {
        let reported = self.link.firmware_version()?;
        if reported < 0 {
            return Err(CaptureError::Device(format!(
                "firmware error code {reported} while reading the tape protocol version"
            )));
        }
        if reported != TAPE_FIRMWARE_VERSION {
            return Err(CaptureError::VersionMismatch {
                expected: TAPE_FIRMWARE_VERSION,
                reported,
            });
        }
        self.set_phase(SessionPhase::VersionChecked);
        Ok(())
    }

    fn configure_device(&mut self) -> Result<(), CaptureError> {
        self.expect_status(
            "set_debug_level",
            TapeStatus::Ok,
            |s| s.link.set_param(DeviceParam::DebugLevel, CAPTURE_DEBUG_LEVEL),
        )?;

        self.cancel.checkpoint()?;
        self.expect_status(
            "set_sense_delay",
            TapeStatus::Ok,
            |s| s.link.set_param(DeviceParam::SenseDelay, CAPTURE_SENSE_DELAY_MS),
        )?;

        self.set_phase(SessionPhase::Configured);
        Ok(())
    }

    fn read_metadata(&mut self) -> Result<DeviceInfo, CaptureError> {
        let mut info = DeviceInfo {
            board_name: self.read_info_field(InfoField::BoardName)?,
            mcu_name: self.read_info_field(InfoField::McuName)?,
            mcu_clock: self.read_info_field(InfoField::McuClock)?,
            firmware_version: self.read_info_field(InfoField::FirmwareVersion)?,
            buffer_size: self.read_info_field(InfoField::BufferSize)?,
            precision_mhz: 0,
            sampling_rate: String::new(),
        };
        // The timer speed arrives as a decimal string; anything unparsable
        // counts as zero and is rejected by the precision check upstream.
        let timer_speed = self.read_info_field(InfoField::TimerSpeed)?;
        info.precision_mhz = timer_speed.trim().parse().unwrap_or(0);
        info.sampling_rate = self.read_info_field(InfoField::SamplingRate)?;

        self.set_phase(SessionPhase::MetadataRead);
        self.observer.device_info(&info);
        Ok(info)
    }

    fn read_info_field(&mut self, field: InfoField) -> Result<String, CaptureError> {
        let (status, value) = self.link.read_info(field)?;
        if status != TapeStatus::InfoSent {
            return Err(unexpected_status("board_info", status));
        }
        Ok(value)
    }

    fn prepare_capture(&mut self) -> Result<(), CaptureError> {
        self.expect_status("prepare_capture", TapeStatus::ConfiguredForRead, |s| {
            s.link.prepare_capture()
        })
    }

    fn check_sense(&mut self) -> Result<(), CaptureError> {
        let status = self.link.sense()?;
        self.set_phase(SessionPhase::SenseChecked);
        match status {
            TapeStatus::SenseOnStop => Ok(()),
            TapeStatus::SenseOnPlay => {
                // The deck is still rolling from a previous run; wait for
                // the user to stop it before arming the real wait-for-play.
                self.cancel.checkpoint()?;
                self.set_phase(SessionPhase::WaitingForStop);
                self.expect_status("wait_for_stop_sense", TapeStatus::SenseOnStop, |s| {
                    s.link.wait_for_sense(TapeSense::Stop)
                })
            }
            other => Err(unexpected_status("get_sense", other)),
        }
    }

    fn wait_for_play(&mut self) -> Result<(), CaptureError> {
        self.set_phase(SessionPhase::WaitingForPlay);
        self.expect_status("wait_for_play_sense", TapeStatus::SenseOnPlay, |s| {
            s.link.wait_for_sense(TapeSense::Play)
        })
    }

    fn capture_into(&mut self, buffer: &mut CaptureBuffer) -> Result<usize, CaptureError> {
        self.set_phase(SessionPhase::Capturing);
        let capacity = buffer.capacity();
        let (status, len) = self.link.capture(buffer.as_capture_target())?;
        buffer.mark_captured(len);

        // Checked before the completion status, and with `>=`: a capture
        // that reached the last buffer byte may have been truncated by the
        // device, so the file must not be finalized.
        if len >= capacity {
            return Err(CaptureError::BufferOverflow {
                captured: len,
                capacity,
            });
        }
        if status != TapeStatus::CaptureFinished {
            return Err(unexpected_status("capture", status));
        }
        Ok(len)
    }

    /// Diagnostics are reported to the user but never fail the session; a
    /// counter that cannot be read is logged and left at its default.
    fn read_diagnostics(&mut self) -> CaptureDiagnostics {
        let diagnostics = CaptureDiagnostics {
            first_edge: EdgePolarity::from_device(
                self.read_counter_lossy(CaptureCounter::FirstEdge),
            ),
            lost: self.read_counter_lossy(CaptureCounter::Lost),
            discarded: self.read_counter_lossy(CaptureCounter::Discarded),
            overcapture: self.read_counter_lossy(CaptureCounter::Overcapture),
        };
        self.observer.diagnostics(&diagnostics);
        diagnostics
    }

    fn read_counter_lossy(&mut self, counter: CaptureCounter) -> u32 {
        match self.link.read_counter(counter) {
            Ok((TapeStatus::Ok, value)) => value,
            Ok((status, _)) => {
                log::warn!("unexpected status reading {counter:?} counter: {status}");
                0
            }
            Err(err) => {
                log::warn!("could not read {counter:?} counter: {err}");
                0
            }
        }
    }

    fn expect_status(
        &mut self,
        op: &str,
        expected: TapeStatus,
        call: impl FnOnce(&mut Self) -> Result<TapeStatus, LinkError>,
    ) -> Result<(), CaptureError> {
        let status = call(self)?;
        if status != expected {
            return Err(unexpected_status(op, status));
        }
        Ok(())
    }

    fn set_phase(&mut self, phase: SessionPhase) {
        self.phase = phase.clone();
        self.observer.phase_changed(&phase);
    }
}

fn unexpected_status(op: &str, status: TapeStatus) -> CaptureError {
    CaptureError::Device(format!("unexpected status from {op}: {status}"))
}
