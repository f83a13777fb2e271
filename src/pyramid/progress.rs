//! Build progress and cancellation.
//!
//! Tiles within a level are written by independent workers. The only shared
//! state is a completion counter per level, a cancellation flag that workers
//! check before starting each tile, and the list of recovered warnings.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

// =============================================================================
// Cancel Flag
// =============================================================================

/// Shared flag requesting that a build stop at the next tile boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Level Progress
// =============================================================================

/// Completion counter for one level.
///
/// A level is complete only when every tile in its grid has been persisted.
#[derive(Debug)]
pub struct LevelProgress {
    level: u32,
    expected: usize,
    completed: AtomicUsize,
}

impl LevelProgress {
    pub fn new(level: u32, expected: usize) -> Self {
        Self {
            level,
            expected,
            completed: AtomicUsize::new(0),
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Record one persisted tile, returning the new completed count.
    pub fn record_tile(&self) -> usize {
        self.completed.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn is_complete(&self) -> bool {
        self.completed() == self.expected
    }
}

// =============================================================================
// Build Warnings
// =============================================================================

/// Recoverable problems collected during a build.
///
/// Each distinct message is logged once and kept for the build report.
#[derive(Debug, Default)]
pub struct BuildWarnings {
    inner: Mutex<WarningLog>,
}

/// Messages in first-seen order plus a set for duplicate checks.
#[derive(Debug, Default)]
struct WarningLog {
    seen: HashSet<String>,
    messages: Vec<String>,
}

impl BuildWarnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, message: impl Into<String>) {
        let message = message.into();
        let mut log = self.lock();
        if !log.seen.insert(message.clone()) {
            return;
        }
        warn!("{}", message);
        log.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.lock().messages.clone()
    }

    fn lock(&self) -> MutexGuard<'_, WarningLog> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
