// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Frame progress tracking and coarse cancellation.
//!
//! A [`Progress`] is shared through an `Arc` between the thread running the
//! pipeline and whoever displays progress or wants to abort. The drivers
//! check for cancellation once per frame; no partial frame is recoverable
//! after an abort.

use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use super::error::StreamError;

#[derive(Debug, Default)]
pub struct Progress {
    step: AtomicU64,
    total: AtomicU64,
    cancelled: AtomicBool,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset progress to 0 and set the total frame count (0 = unknown).
    /// Also clears a previous cancellation.
    pub fn init(&self, total: u64) {
        self.cancelled.store(false, Ordering::Relaxed);
        self.step.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// `Err(StreamError::Cancelled)` once cancellation was requested.
    pub fn check_cancelled(&self) -> Result<(), StreamError> {
        if self.is_cancelled() {
            Err(StreamError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Advance by one frame. With a known total the step stops one short of
    /// it so the count never reads complete before [`Progress::finish`].
    pub fn advance(&self) {
        let total = self.total.load(Ordering::Relaxed);
        if total == 0 {
            self.step.fetch_add(1, Ordering::Relaxed);
        } else {
            let _ = self.step.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |s| {
                if s + 1 < total { Some(s + 1) } else { Some(s) }
            });
        }
    }

    /// Current (step, total).
    pub fn get(&self) -> (u64, u64) {
        (self.step.load(Ordering::Relaxed), self.total.load(Ordering::Relaxed))
    }

    /// Mark the run complete. An unknown total becomes the final step count.
    pub fn finish(&self) {
        let total = self.total.load(Ordering::Relaxed);
        if total == 0 {
            self.total.store(self.step.load(Ordering::Relaxed), Ordering::Relaxed);
        } else {
            self.step.store(total, Ordering::Relaxed);
        }
    }
}
