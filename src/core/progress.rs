//! Progress snapshots emitted during a transfer
//!
//! Snapshots are owned and mutated only by the running transfer. The
//! registered callback receives a clone by value and can never observe a
//! half-updated snapshot.

use crate::core::config::Category;
use log::warn;
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Coarse phase of a transfer run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferPhase {
    #[default]
    Idle,
    /// Resolving identifiers and fetching device details
    Connecting,
    /// Running category steps
    Transferring,
    /// Companion-app strategy: copying files off the source
    Pulling,
    /// Companion-app strategy: copying files onto the target
    Pushing,
    Complete,
    CompleteWithErrors,
    /// Aborted before any step (unresolved device)
    Error,
}

impl TransferPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferPhase::Idle => "idle",
            TransferPhase::Connecting => "connecting",
            TransferPhase::Transferring => "transferring",
            TransferPhase::Pulling => "pulling",
            TransferPhase::Pushing => "pushing",
            TransferPhase::Complete => "complete",
            TransferPhase::CompleteWithErrors => "complete_with_errors",
            TransferPhase::Error => "error",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            TransferPhase::Complete | TransferPhase::CompleteWithErrors | TransferPhase::Error
        )
    }
}

/// Outcome of one executed category step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryReport {
    pub category: Category,
    pub success: bool,
    /// Items exported or files pulled from the source
    pub pulled: usize,
    /// Items imported or files pushed to the target
    pub pushed: usize,
    /// File-level errors counted inside the step
    pub errors: usize,
    /// The step stopped early on request
    pub cancelled: bool,
}

impl CategoryReport {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            success: false,
            pulled: 0,
            pushed: 0,
            errors: 0,
            cancelled: false,
        }
    }
}

/// Snapshot of a cross-platform transfer
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrossTransferProgress {
    /// Incremented on every emission
    pub version: u64,
    pub phase: TransferPhase,
    /// Category label of the running step, or a finer status
    pub sub_phase: String,
    /// Free-text description of the item being processed
    pub current_item: String,
    pub source_platform: String,
    pub source_name: String,
    pub target_platform: String,
    pub target_name: String,
    /// Completed category steps
    pub done: usize,
    /// Enabled category steps
    pub total: usize,
    pub percent: f64,
    pub elapsed: Duration,
    /// Set when the run stopped early on request
    pub cancelled: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub categories: Vec<CategoryReport>,
}

impl CrossTransferProgress {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Report for a category, if its step ran
    pub fn report(&self, category: Category) -> Option<&CategoryReport> {
        self.categories.iter().find(|r| r.category == category)
    }
}

/// Snapshot of a companion-app media transfer
#[derive(Debug, Clone, Default, Serialize)]
pub struct WhatsAppTransferProgress {
    pub version: u64,
    pub phase: TransferPhase,
    /// Media sub-folder being processed (e.g., "WhatsApp Images")
    pub sub_phase: String,
    pub current_item: String,
    pub files_done: usize,
    pub files_total: usize,
    pub files_pulled: usize,
    pub files_pushed: usize,
    pub bytes_transferred: u64,
    /// 0-50 while pulling, 50-100 while pushing
    pub percent: f64,
    pub elapsed: Duration,
    pub cancelled: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Callback receiving progress snapshots by value
pub type ProgressCallback<P> = Arc<dyn Fn(P) + Send + Sync>;

/// Deliver a snapshot to an optional callback
///
/// A panicking callback is logged and otherwise ignored so it cannot abort
/// the transfer.
pub(crate) fn deliver<P: Clone>(callback: Option<&ProgressCallback<P>>, snapshot: &P) {
    if let Some(callback) = callback {
        let snapshot = snapshot.clone();
        if panic::catch_unwind(AssertUnwindSafe(|| callback(snapshot))).is_err() {
            warn!("Progress callback panicked; continuing transfer");
        }
    }
}

/// A snapshot type an emitter can stamp before delivery
pub trait ProgressSnapshot: Clone {
    fn stamp(&mut self, version: u64, elapsed: Duration);
}

impl ProgressSnapshot for CrossTransferProgress {
    fn stamp(&mut self, version: u64, elapsed: Duration) {
        self.version = version;
        self.elapsed = elapsed;
    }
}

impl ProgressSnapshot for WhatsAppTransferProgress {
    fn stamp(&mut self, version: u64, elapsed: Duration) {
        self.version = version;
        self.elapsed = elapsed;
    }
}

/// Owns the live snapshot of one run and publishes copies of it
pub struct ProgressEmitter<P: ProgressSnapshot> {
    snapshot: P,
    version: u64,
    started: Instant,
    callback: Option<ProgressCallback<P>>,
}

impl<P: ProgressSnapshot> ProgressEmitter<P> {
    pub fn new(snapshot: P, callback: Option<ProgressCallback<P>>) -> Self {
        Self {
            snapshot,
            version: 0,
            started: Instant::now(),
            callback,
        }
    }

    pub fn snapshot(&self) -> &P {
        &self.snapshot
    }

    /// Mutate the snapshot without publishing
    pub fn update(&mut self, f: impl FnOnce(&mut P)) {
        f(&mut self.snapshot);
    }

    /// Stamp and publish the current snapshot
    pub fn emit(&mut self) {
        self.version += 1;
        self.snapshot.stamp(self.version, self.started.elapsed());
        deliver(self.callback.as_ref(), &self.snapshot);
    }

    /// Mutate then publish
    pub fn emit_with(&mut self, f: impl FnOnce(&mut P)) {
        self.update(f);
        self.emit();
    }

    pub fn into_snapshot(self) -> P {
        self.snapshot
    }
}

/// Percent of `done` out of `total`, scaled into `[band_start, band_end]`
pub fn banded_percent(done: usize, total: usize, band_start: f64, band_end: f64) -> f64 {
    if total == 0 {
        return band_end;
    }
    let fraction = (done as f64 / total as f64).clamp(0.0, 1.0);
    band_start + fraction * (band_end - band_start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_phase_strings() {
        assert_eq!(TransferPhase::Complete.as_str(), "complete");
        assert_eq!(
            TransferPhase::CompleteWithErrors.as_str(),
            "complete_with_errors"
        );
        assert_eq!(TransferPhase::Error.as_str(), "error");
        assert!(TransferPhase::Error.is_finished());
        assert!(!TransferPhase::Transferring.is_finished());
    }

    #[test]
    fn test_banded_percent() {
        assert_eq!(banded_percent(0, 4, 0.0, 50.0), 0.0);
        assert_eq!(banded_percent(2, 4, 0.0, 50.0), 25.0);
        assert_eq!(banded_percent(4, 4, 50.0, 100.0), 100.0);
        assert_eq!(banded_percent(1, 4, 50.0, 100.0), 62.5);
        assert_eq!(banded_percent(0, 0, 0.0, 50.0), 50.0);
    }

    #[test]
    fn test_deliver_passes_clone() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: ProgressCallback<CrossTransferProgress> =
            Arc::new(move |p: CrossTransferProgress| sink.lock().unwrap().push(p.version));

        let mut progress = CrossTransferProgress::default();
        progress.version = 7;
        deliver(Some(&callback), &progress);
        progress.version = 8;
        deliver(Some(&callback), &progress);

        assert_eq!(*seen.lock().unwrap(), vec![7, 8]);
    }

    #[test]
    fn test_deliver_swallows_panics() {
        let callback: ProgressCallback<CrossTransferProgress> =
            Arc::new(|_p: CrossTransferProgress| panic!("ui went away"));
        deliver(Some(&callback), &CrossTransferProgress::default());
        deliver(None, &CrossTransferProgress::default());
    }

    #[test]
    fn test_emitter_versions_increase() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: ProgressCallback<WhatsAppTransferProgress> =
            Arc::new(move |p: WhatsAppTransferProgress| {
                sink.lock().unwrap().push((p.version, p.files_done))
            });

        let mut emitter = ProgressEmitter::new(WhatsAppTransferProgress::default(), Some(callback));
        emitter.emit();
        emitter.emit_with(|p| p.files_done = 3);
        emitter.update(|p| p.files_done = 4);

        assert_eq!(*seen.lock().unwrap(), vec![(1, 0), (2, 3)]);
        let last = emitter.into_snapshot();
        assert_eq!(last.version, 2);
        assert_eq!(last.files_done, 4);
    }

    #[test]
    fn test_report_lookup() {
        let mut progress = CrossTransferProgress::default();
        progress.categories.push(CategoryReport::new(Category::Photos));
        assert!(progress.report(Category::Photos).is_some());
        assert!(progress.report(Category::Music).is_none());
    }
}
