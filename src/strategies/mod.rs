//! Per-category transfer strategies
//!
//! Each enabled category runs as one step of a cross-platform transfer.
//! A step sees both devices through [`DeviceHandle`]s, writes interchange
//! files under its own staging subfolder, and reports warnings and errors
//! through the shared [`TransferContext`].
//!
//! The companion-app media strategy (`whatsapp`) is not a step; it runs on
//! its own with a separate progress type.

pub mod calendar;
pub mod contacts;
pub mod media;
pub mod messages;
pub mod whatsapp;

use crate::core::config::{Category, CrossTransferConfig};
use crate::core::error::Result;
use crate::core::progress::{CrossTransferProgress, ProgressEmitter};
use crate::device::DeviceHandle;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

pub use calendar::CalendarStrategy;
pub use contacts::ContactsStrategy;
pub use media::MediaStrategy;
pub use messages::MessagesStrategy;
pub use whatsapp::{official_migration_guide, WhatsAppTransfer};

/// Counters returned by a finished step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    pub success: bool,
    pub pulled: usize,
    pub pushed: usize,
    pub errors: usize,
    /// Left before finishing because cancellation was requested
    pub cancelled: bool,
}

impl StepOutcome {
    /// Nothing to move; not a failure
    pub fn nothing() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    /// Left early on a cancellation request
    pub fn stopped() -> Self {
        Self {
            cancelled: true,
            ..Default::default()
        }
    }

    pub fn from_result(success: bool, count: usize) -> Self {
        Self {
            success,
            pulled: count,
            pushed: if success { count } else { 0 },
            errors: 0,
            cancelled: false,
        }
    }
}

/// Everything a running step may touch
pub struct TransferContext<'a> {
    pub source: DeviceHandle<'a>,
    pub target: DeviceHandle<'a>,
    pub staging_dir: &'a Path,
    pub config: &'a CrossTransferConfig,
    progress: &'a mut ProgressEmitter<CrossTransferProgress>,
    cancel: &'a AtomicBool,
    step_index: usize,
    step_total: usize,
}

impl<'a> TransferContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: DeviceHandle<'a>,
        target: DeviceHandle<'a>,
        staging_dir: &'a Path,
        config: &'a CrossTransferConfig,
        progress: &'a mut ProgressEmitter<CrossTransferProgress>,
        cancel: &'a AtomicBool,
        step_index: usize,
        step_total: usize,
    ) -> Self {
        Self {
            source,
            target,
            staging_dir,
            config,
            progress,
            cancel,
            step_index,
            step_total,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Staging subfolder for a category, created on first use
    pub fn category_dir(&self, category: Category) -> Result<PathBuf> {
        let dir = self.staging_dir.join(category.key());
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}", message);
        self.progress.update(|p| p.warnings.push(message));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::error!("{}", message);
        self.progress.update(|p| p.errors.push(message));
    }

    /// Describe the item in flight and publish
    pub fn set_current_item(&mut self, item: impl Into<String>) {
        let item = item.into();
        self.progress.emit_with(|p| p.current_item = item);
    }

    /// Publish fractional progress inside this step
    pub fn set_step_fraction(&mut self, done: usize, total: usize, item: impl Into<String>) {
        let item = item.into();
        let fraction = if total == 0 {
            0.0
        } else {
            (done as f64 / total as f64).clamp(0.0, 1.0)
        };
        let percent = if self.step_total == 0 {
            100.0
        } else {
            (self.step_index as f64 + fraction) / self.step_total as f64 * 100.0
        };
        self.progress.emit_with(|p| {
            p.current_item = item;
            p.percent = percent;
        });
    }

    pub(crate) fn error_count(&self) -> usize {
        self.progress.snapshot().errors.len()
    }
}

/// One category step of a cross-platform transfer
pub trait CategoryStrategy {
    fn category(&self) -> Category;

    /// Run the step
    ///
    /// Returning `Err` with an unsupported-capability error turns into a
    /// warning; any other `Err` is a category failure.
    fn run(&self, ctx: &mut TransferContext<'_>) -> Result<StepOutcome>;
}

/// The strategy responsible for a category
pub fn strategy_for(category: Category) -> Box<dyn CategoryStrategy> {
    match category {
        Category::Contacts => Box::new(ContactsStrategy),
        Category::Messages => Box::new(MessagesStrategy),
        Category::Calendar => Box::new(CalendarStrategy),
        Category::Photos | Category::Videos | Category::Music | Category::Documents => {
            Box::new(MediaStrategy::new(category))
        }
    }
}
