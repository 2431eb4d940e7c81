//! Tape deck backend selection.

use std::env;
use std::path::PathBuf;

use tapcap_core::CaptureError;

use crate::replay::ReplayDeck;

/// Environment variable naming the tape deck backend. `replay:<path>`
/// replays a pre-recorded delta stream file.
pub const DEVICE_ENV: &str = "TAPCAP_DEVICE";

pub fn open_deck() -> Result<ReplayDeck, CaptureError> {
    let spec = env::var(DEVICE_ENV).map_err(|_| {
        CaptureError::Device(format!(
            "no tape device configured; set {DEVICE_ENV}=replay:<stream file>"
        ))
    })?;

    match spec.strip_prefix("replay:") {
        Some(path) if !path.is_empty() => {
            let deck = ReplayDeck::open(&PathBuf::from(path))?;
            Ok(deck)
        }
        _ => Err(CaptureError::Config(format!(
            "unsupported device spec {spec:?} in {DEVICE_ENV}"
        ))),
    }
}
