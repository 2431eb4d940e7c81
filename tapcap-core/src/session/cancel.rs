//! Cooperative cancellation of a blocking hardware session.
//!
//! Two execution contexts share this controller: the main sequential
//! session, which polls the abort flag between state transitions, and an
//! asynchronous interrupt context (the Ctrl-C handler), which may run at
//! any instruction boundary of the main sequence, including during its own
//! teardown. The only shared mutable state between the two contexts is the
//! abort flag and the break-handle slot.

use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::CaptureError;
use crate::traits::device_link::BreakRequest;

/// What the interrupt path observed while delivering an abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortOutcome {
    /// First abort of the process; a device break was issued.
    BreakIssued,
    /// First abort of the process, but no device session was open, so only
    /// the flag was set.
    NoDeviceAttached,
    /// An abort sequence was already in flight; this delivery was a no-op
    /// beyond (re)setting the flag.
    AlreadyAborting,
}

/// Shared abort flag plus the two-lock protocol coordinating an
/// asynchronous interrupt with the main session.
///
/// Lock domains:
/// - `deck`: handle validity. Held whenever the break-handle slot is read
///   or mutated. The main sequence only touches it for attach/detach, so
///   the interrupt's acquisition stays bounded and short.
/// - `abort_once`: abort re-entrancy. Taken without blocking by the first
///   interrupt and never released for the rest of the process, so at most
///   one break sequence ever executes.
pub struct CancellationController {
    abort: AtomicBool,
    abort_once: Mutex<()>,
    deck: Mutex<Option<Box<dyn BreakRequest>>>,
}

impl Default for CancellationController {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationController {
    pub fn new() -> Self {
        Self {
            abort: AtomicBool::new(false),
            abort_once: Mutex::new(()),
            deck: Mutex::new(None),
        }
    }

    /// Whether an abort has been requested. Sequentially consistent, so a
    /// flag set by the interrupt context is visible to the very next poll.
    pub fn is_abort_requested(&self) -> bool {
        self.abort.load(Ordering::SeqCst)
    }

    /// Poll point for the main sequence, used before every state
    /// transition.
    pub fn checkpoint(&self) -> Result<(), CaptureError> {
        if self.is_abort_requested() {
            Err(CaptureError::UserAbort)
        } else {
            Ok(())
        }
    }

    /// Deliver an abort from the interrupt context.
    ///
    /// Safe to call concurrently with any point of the main sequence:
    /// 1. sets the abort flag unconditionally, without blocking;
    /// 2. tries the re-entrancy lock without blocking and bails if another
    ///    abort already holds it;
    /// 3. under the handle-validity lock, issues a device break if a
    ///    session is open.
    ///
    /// The re-entrancy lock is deliberately never released.
    pub fn trigger(&self) -> AbortOutcome {
        self.abort.store(true, Ordering::SeqCst);

        let Some(guard) = self.abort_once.try_lock() else {
            return AbortOutcome::AlreadyAborting;
        };

        let outcome = {
            let deck = self.deck.lock();
            match deck.as_ref() {
                Some(handle) => {
                    if let Err(err) = handle.request_break() {
                        log::warn!("device break request failed: {err}");
                    }
                    AbortOutcome::BreakIssued
                }
                None => AbortOutcome::NoDeviceAttached,
            }
        };

        // Keep the re-entrancy lock for the rest of the process; later
        // interrupts must observe an abort already in flight.
        mem::forget(guard);
        outcome
    }

    /// Register the open device session's break handle. The returned guard
    /// clears the slot again when dropped, before the device is closed.
    pub fn attach_deck(
        self: &Arc<Self>,
        handle: Box<dyn BreakRequest>,
    ) -> DeckAttachment {
        *self.deck.lock() = Some(handle);
        DeckAttachment {
            controller: Arc::clone(self),
        }
    }

    fn detach_deck(&self) {
        *self.deck.lock() = None;
    }
}

/// RAII registration of a device break handle, scoped to the open device
/// session.
pub struct DeckAttachment {
    controller: Arc<CancellationController>,
}

impl Drop for DeckAttachment {
    fn drop(&mut self) {
        self.controller.detach_deck();
    }
}
