// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! UI state tracks
//!
//! Two independent state machines, one per orchestrator:
//!
//! ```text
//! apply:    Idle -> Uploading -> Invoking -> Success | Failed -> Idle
//! download: Idle -> Downloading -> Ready
//! ```
//!
//! Phases are published on `tokio::sync::watch` channels so a front end can
//! render busy indicators without polling.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyPhase {
    Idle,
    Uploading,
    Invoking,
    Success,
    Failed,
}

impl ApplyPhase {
    pub fn can_transition_to(self, next: ApplyPhase) -> bool {
        use ApplyPhase::*;
        matches!(
            (self, next),
            (Idle, Uploading)
                | (Uploading, Invoking)
                | (Uploading, Failed)
                | (Invoking, Success)
                | (Invoking, Failed)
                | (Success, Idle)
                | (Failed, Idle)
        )
    }

    pub fn is_busy(self) -> bool {
        matches!(self, ApplyPhase::Uploading | ApplyPhase::Invoking)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadPhase {
    Idle,
    Downloading,
    Ready,
}

impl DownloadPhase {
    pub fn can_transition_to(self, next: DownloadPhase) -> bool {
        use DownloadPhase::*;
        matches!(
            (self, next),
            (Idle, Downloading) | (Ready, Downloading) | (Downloading, Ready)
                | (Downloading, Idle)
        )
    }
}

/// Publishes a phase and rejects transitions the state machine does not
/// allow.
pub(crate) struct PhaseTracker<P> {
    tx: watch::Sender<P>,
    allowed: fn(P, P) -> bool,
}

impl<P: Copy + PartialEq + std::fmt::Debug> PhaseTracker<P> {
    pub(crate) fn new(initial: P, allowed: fn(P, P) -> bool) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx, allowed }
    }

    pub(crate) fn current(&self) -> P {
        *self.tx.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<P> {
        self.tx.subscribe()
    }

    /// Move to `next`. Returns false and stays put on an illegal transition.
    pub(crate) fn advance(&self, next: P) -> bool {
        let current = self.current();
        if !(self.allowed)(current, next) {
            tracing::warn!(from = ?current, to = ?next, "Ignoring illegal phase transition");
            return false;
        }
        self.tx.send_replace(next);
        true
    }

    /// Put the phase back to a previously observed value.
    pub(crate) fn restore(&self, phase: P) {
        self.tx.send_replace(phase);
    }
}

/// Re-entry gate over one orchestrator; released on drop.
pub(crate) struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Puts the phase back to `fallback` on drop unless the run reached `done`.
///
/// Covers every way out of a run, including a cancelled future.
pub(crate) struct PhaseRollback<'a, P: Copy + PartialEq + std::fmt::Debug> {
    tracker: &'a PhaseTracker<P>,
    done: P,
    fallback: P,
}

impl<'a, P: Copy + PartialEq + std::fmt::Debug> PhaseRollback<'a, P> {
    pub(crate) fn new(tracker: &'a PhaseTracker<P>, done: P, fallback: P) -> Self {
        Self {
            tracker,
            done,
            fallback,
        }
    }
}

impl<P: Copy + PartialEq + std::fmt::Debug> Drop for PhaseRollback<'_, P> {
    fn drop(&mut self) {
        let current = self.tracker.current();
        if current != self.done && current != self.fallback {
            tracing::debug!(from = ?current, to = ?self.fallback, "Rolling back interrupted phase");
            self.tracker.restore(self.fallback);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_happy_path_is_legal() {
        use ApplyPhase::*;
        let path = [Idle, Uploading, Invoking, Success, Idle];
        assert!(path.windows(2).all(|w| w[0].can_transition_to(w[1])));
    }

    #[test]
    fn test_apply_shortcuts_are_illegal() {
        use ApplyPhase::*;
        assert!(!Idle.can_transition_to(Invoking));
        assert!(!Idle.can_transition_to(Success));
        assert!(!Uploading.can_transition_to(Success));
        assert!(!Failed.can_transition_to(Uploading));
        assert!(!Success.can_transition_to(Uploading));
    }

    #[test]
    fn test_download_track() {
        use DownloadPhase::*;
        assert!(Idle.can_transition_to(Downloading));
        assert!(Downloading.can_transition_to(Ready));
        assert!(Ready.can_transition_to(Downloading));
        assert!(!Idle.can_transition_to(Ready));
    }

    #[test]
    fn test_tracker_rejects_illegal_transition() {
        let tracker = PhaseTracker::new(ApplyPhase::Idle, ApplyPhase::can_transition_to);
        let rx = tracker.subscribe();
        assert!(!tracker.advance(ApplyPhase::Success));
        assert_eq!(*rx.borrow(), ApplyPhase::Idle);
        assert!(tracker.advance(ApplyPhase::Uploading));
        assert_eq!(*rx.borrow(), ApplyPhase::Uploading);
    }

    #[test]
    fn test_rollback_resets_unfinished_run() {
        let tracker = PhaseTracker::new(ApplyPhase::Idle, ApplyPhase::can_transition_to);
        {
            let _rollback = PhaseRollback::new(&tracker, ApplyPhase::Success, ApplyPhase::Idle);
            tracker.advance(ApplyPhase::Uploading);
            tracker.advance(ApplyPhase::Invoking);
            assert!(tracker.current().is_busy());
        }
        assert_eq!(tracker.current(), ApplyPhase::Idle);
        assert!(!tracker.current().is_busy());
    }

    #[test]
    fn test_rollback_keeps_finished_run() {
        let tracker = PhaseTracker::new(DownloadPhase::Idle, DownloadPhase::can_transition_to);
        {
            let _rollback = PhaseRollback::new(&tracker, DownloadPhase::Ready, DownloadPhase::Idle);
            tracker.advance(DownloadPhase::Downloading);
            tracker.advance(DownloadPhase::Ready);
        }
        assert_eq!(tracker.current(), DownloadPhase::Ready);
    }

    #[test]
    fn test_busy_guard_excludes_and_releases() {
        let flag = AtomicBool::new(false);
        let guard = BusyGuard::acquire(&flag).unwrap();
        assert!(BusyGuard::acquire(&flag).is_none());
        drop(guard);
        assert!(BusyGuard::acquire(&flag).is_some());
    }
}
