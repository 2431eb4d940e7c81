use crate::models::device::{CaptureDiagnostics, DeviceInfo};
use crate::models::state::SessionPhase;

/// Progress notifications from a running capture session.
///
/// All methods are called from the session thread, between device
/// operations; implementations should not block. The CLI uses this to
/// drive its console protocol (`Press <PLAY> on tape.` and friends).
pub trait SessionObserver: Send + Sync {
    /// Called after every state transition.
    fn phase_changed(&self, _phase: &SessionPhase) {}

    /// Called once, after the device metadata snapshot has been read.
    fn device_info(&self, _info: &DeviceInfo) {}

    /// Called once, after the post-capture diagnostics have been
    /// downloaded.
    fn diagnostics(&self, _diagnostics: &CaptureDiagnostics) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}
