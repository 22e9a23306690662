use crate::frame::Frame;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Result of the most recent acquisition step.
///
/// Only [`Outcome::Ok`] counts as success for [`crate::CameraCapture::read`];
/// the other variants exist for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing has been attempted yet.
    #[default]
    Pending,
    Ok,
    DeviceNotOpen,
    AcquireFailed,
    DecodeFailed,
}

impl Outcome {
    pub fn is_ok(self) -> bool {
        matches!(self, Outcome::Ok)
    }
}

#[derive(Debug, Default)]
struct Published {
    frame: Frame,
    outcome: Outcome,
}

/// Single-slot "latest frame" shared between one writer and many readers.
///
/// Frame and outcome sit behind one mutex so every access sees both from the
/// same completed write. The writer holds the lock only for the decode and
/// swap, never across a blocking device call.
#[derive(Debug, Default)]
pub struct LatestFrame {
    published: Mutex<Published>,
}

impl LatestFrame {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic inside a decode can only have touched the scratch frame, so the
    // published pair is still consistent after poisoning.
    fn lock(&self) -> MutexGuard<'_, Published> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Deep-copy the published frame into `dst` and return the outcome that
    /// goes with it.
    pub fn read_into(&self, dst: &mut Frame) -> Outcome {
        let published = self.lock();
        published.frame.copy_to(dst);
        published.outcome
    }

    pub fn outcome(&self) -> Outcome {
        self.lock().outcome
    }

    /// Record an outcome, leaving the frame as it is.
    pub fn mark(&self, outcome: Outcome) {
        self.lock().outcome = outcome;
    }

    /// Run `decode` into `scratch` under the lock and publish it on success.
    ///
    /// On success the scratch buffer and the slot swap places, so `scratch`
    /// comes back holding the previous frame's allocation. On failure the slot
    /// keeps its previous frame and only the outcome changes.
    pub fn publish_with<F>(&self, scratch: &mut Frame, decode: F) -> bool
    where
        F: FnOnce(&mut Frame) -> bool,
    {
        let mut published = self.lock();
        if decode(scratch) {
            std::mem::swap(&mut published.frame, scratch);
            published.outcome = Outcome::Ok;
            true
        } else {
            published.outcome = Outcome::DecodeFailed;
            false
        }
    }
}
