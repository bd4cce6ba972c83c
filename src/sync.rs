//! Simulated cloud-sync indicator
//!
//! There is no backend: a signed-in user gets a short "syncing" window after
//! every state change, then the indicator settles on "synced". Re-arming
//! drops the previous deadline so a stale completion can never report.

use std::time::{Duration, Instant};

/// How long the fake upload takes.
pub const SYNC_DELAY: Duration = Duration::from_millis(1200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// No user: data stays on this device.
    Local,
    Syncing,
    Synced,
}

impl SyncStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Local => "local only",
            Self::Syncing => "syncing...",
            Self::Synced => "cloud synced",
        }
    }
}

/// Deadline-based sync timer, polled from the UI loop.
#[derive(Debug)]
pub struct SyncTimer {
    status: SyncStatus,
    due: Option<Instant>,
}

impl SyncTimer {
    pub fn new() -> Self {
        Self {
            status: SyncStatus::Local,
            due: None,
        }
    }

    /// Record a state change. Signed in: arm (or re-arm) the deadline and
    /// show "syncing". Signed out: drop any pending deadline.
    pub fn touch(&mut self, signed_in: bool, now: Instant) {
        if signed_in {
            self.status = SyncStatus::Syncing;
            self.due = Some(now + SYNC_DELAY);
        } else {
            self.status = SyncStatus::Local;
            self.due = None;
        }
    }

    /// Advance the timer. Returns true exactly once when a pending sync
    /// completes; the caller stamps `last_sync` at that point.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.due {
            Some(due) if now >= due => {
                self.due = None;
                self.status = SyncStatus::Synced;
                true
            }
            _ => false,
        }
    }

    pub fn status(&self) -> SyncStatus {
        self.status
    }
}

impl Default for SyncTimer {
    fn default() -> Self {
        Self::new()
    }
}
