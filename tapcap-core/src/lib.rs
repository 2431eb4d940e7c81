//! # tapcap-core
//!
//! Hardware-agnostic tape signal capture core library.
//!
//! Provides the signal codec, capture buffering, capture-file I/O, and
//! session orchestration. Hardware-specific transports implement the
//! `DeviceLink` trait and plug into the generic `CaptureOrchestrator`.
//!
//! ## Architecture
//!
//! ```text
//! tapcap-core (this crate)
//! ├── traits/       ← DeviceLink, BreakRequest, SessionObserver
//! ├── models/       ← CaptureError, SessionPhase, CaptureConfig, device enums
//! ├── codec.rs      ← edge-delta wire format, stream statistics
//! ├── buffer.rs     ← raw capture buffer
//! ├── session/      ← CaptureOrchestrator, CancellationController
//! └── storage/      ← capture-file header and writer
//! ```

pub mod buffer;
pub mod codec;
pub mod models;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use buffer::CaptureBuffer;
pub use codec::{DeltaReader, StreamStats};
pub use models::config::{BufferCapacity, CaptureConfig, TapeMachine, TapeProfile, VideoStandard};
pub use models::device::{
    CaptureCounter, CaptureDiagnostics, DeviceInfo, DeviceParam, EdgePolarity, InfoField,
    TapeSense, TapeStatus,
};
pub use models::error::CaptureError;
pub use models::state::SessionPhase;
pub use session::cancel::CancellationController;
pub use session::orchestrator::{CaptureOrchestrator, CaptureReport};
pub use storage::cap_file::{CapFileHeader, CapFileWriter};
pub use traits::device_link::{BreakRequest, DeviceLink, LinkError, TAPE_FIRMWARE_VERSION};
pub use traits::session_observer::{NoopObserver, SessionObserver};
