//! Software tape deck that replays a pre-recorded delta stream.
//!
//! Used for exercising the full capture pipeline without hardware: the deck
//! reports a healthy 16 MHz board, answers every sense query immediately,
//! and serves the stream file verbatim as its capture payload.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tapcap_core::{
    BreakRequest, CaptureCounter, DeviceLink, DeviceParam, InfoField, LinkError, TapeSense,
    TapeStatus, TAPE_FIRMWARE_VERSION,
};

pub struct ReplayDeck {
    stream: Vec<u8>,
    broken: Arc<AtomicBool>,
}

impl ReplayDeck {
    pub fn open(path: &Path) -> Result<Self, LinkError> {
        let stream = fs::read(path).map_err(|err| {
            LinkError(format!(
                "could not read replay stream {}: {err}",
                path.display()
            ))
        })?;
        Ok(Self {
            stream,
            broken: Arc::new(AtomicBool::new(false)),
        })
    }
}

struct ReplayBreak {
    broken: Arc<AtomicBool>,
}

impl BreakRequest for ReplayBreak {
    fn request_break(&self) -> Result<(), LinkError> {
        self.broken.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl DeviceLink for ReplayDeck {
    fn firmware_version(&mut self) -> Result<i32, LinkError> {
        Ok(TAPE_FIRMWARE_VERSION)
    }

    fn set_param(&mut self, _param: DeviceParam, _value: u32) -> Result<TapeStatus, LinkError> {
        Ok(TapeStatus::Ok)
    }

    fn read_info(&mut self, field: InfoField) -> Result<(TapeStatus, String), LinkError> {
        let text = match field {
            InfoField::BoardName => "replay deck",
            InfoField::McuName => "none",
            InfoField::McuClock => "n/a",
            InfoField::FirmwareVersion => "replay-1",
            InfoField::BufferSize => "n/a",
            InfoField::TimerSpeed => "16",
            InfoField::SamplingRate => "n/a",
        };
        Ok((TapeStatus::InfoSent, text.to_string()))
    }

    fn prepare_capture(&mut self) -> Result<TapeStatus, LinkError> {
        Ok(TapeStatus::ConfiguredForRead)
    }

    fn sense(&mut self) -> Result<TapeStatus, LinkError> {
        Ok(TapeStatus::SenseOnStop)
    }

    fn wait_for_sense(&mut self, target: TapeSense) -> Result<TapeStatus, LinkError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(LinkError("sense wait interrupted".into()));
        }
        Ok(match target {
            TapeSense::Play => TapeStatus::SenseOnPlay,
            TapeSense::Stop => TapeStatus::SenseOnStop,
        })
    }

    fn capture(&mut self, buffer: &mut [u8]) -> Result<(TapeStatus, usize), LinkError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(LinkError("capture interrupted".into()));
        }
        // A stream longer than the buffer fills it to capacity, the same
        // way the hardware reports an overrun.
        let len = self.stream.len().min(buffer.len());
        buffer[..len].copy_from_slice(&self.stream[..len]);
        Ok((TapeStatus::CaptureFinished, len))
    }

    fn read_counter(&mut self, _counter: CaptureCounter) -> Result<(TapeStatus, u32), LinkError> {
        Ok((TapeStatus::Ok, 0))
    }

    fn break_handle(&self) -> Box<dyn BreakRequest> {
        Box::new(ReplayBreak {
            broken: Arc::clone(&self.broken),
        })
    }
}
