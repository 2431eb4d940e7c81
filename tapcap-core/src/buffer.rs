use crate::models::error::CaptureError;

/// Fixed-capacity byte region the device streams raw edge deltas into.
///
/// The buffer has two non-overlapping phases: a mutable producer phase
/// (the blocking capture call writes through [`as_capture_target`]) and an
/// immutable consumer phase (the codec reads the captured prefix through
/// [`captured`]). The logical length is never reported larger than the
/// capacity; a logical length equal to the capacity signals overflow.
///
/// [`as_capture_target`]: CaptureBuffer::as_capture_target
/// [`captured`]: CaptureBuffer::captured
#[derive(Debug)]
pub struct CaptureBuffer {
    data: Vec<u8>,
    captured: usize,
}

impl CaptureBuffer {
    /// Allocate a zeroed buffer of exactly `capacity` bytes.
    ///
    /// Allocation failure is reported as [`CaptureError::Allocation`]
    /// instead of aborting the process; capture buffers run to 100 MB.
    pub fn with_capacity(capacity: usize) -> Result<Self, CaptureError> {
        if capacity == 0 {
            return Err(CaptureError::Allocation(
                "capture buffer capacity must be non-zero".into(),
            ));
        }
        let mut data = Vec::new();
        data.try_reserve_exact(capacity).map_err(|err| {
            CaptureError::Allocation(format!("could not reserve {capacity} bytes: {err}"))
        })?;
        data.resize(capacity, 0);
        Ok(Self { data, captured: 0 })
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// The whole capacity, handed to the device for the blocking capture
    /// call.
    pub fn as_capture_target(&mut self) -> &mut [u8] {
        self.captured = 0;
        &mut self.data
    }

    /// Record the actual captured length reported by the device, clamped
    /// to the capacity.
    pub fn mark_captured(&mut self, len: usize) {
        self.captured = len.min(self.data.len());
    }

    /// The captured prefix, valid after [`mark_captured`].
    ///
    /// [`mark_captured`]: CaptureBuffer::mark_captured
    pub fn captured(&self) -> &[u8] {
        &self.data[..self.captured]
    }

    pub fn captured_len(&self) -> usize {
        self.captured
    }

    /// Whether the capture filled the buffer completely, i.e. the tail may
    /// have been truncated by the device.
    pub fn is_full(&self) -> bool {
        self.captured == self.data.len()
    }
}
