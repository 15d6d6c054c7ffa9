//! Cross-platform transfer orchestrator
//!
//! Resolves both devices through the registry, creates a staging directory
//! and runs one strategy per enabled category, strictly in order. A failing
//! category is recorded and the run moves on; cancellation stops before the
//! next category (or the next file inside a media step) without rolling
//! back what already landed on the target.

use crate::core::config::{Category, CrossTransferConfig};
use crate::core::progress::{
    CategoryReport, CrossTransferProgress, ProgressCallback, ProgressEmitter, TransferPhase,
};
use crate::device::{DeviceHandle, DeviceRegistry, DeviceTransport, UnifiedDeviceInfo};
use crate::strategies::{strategy_for, TransferContext};
use chrono::Local;
use log::{error, info, warn};
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Warning recorded when a run stops on request
pub const CANCELLED_MESSAGE: &str = "Transferência cancelada pelo usuário";

/// Create `<prefix>_<YYYYMMDD_HHMMSS>` under `work_dir`, suffixed if taken
pub fn create_staging_dir(work_dir: &Path, prefix: &str) -> std::io::Result<PathBuf> {
    fs::create_dir_all(work_dir)?;
    let base = format!("{}_{}", prefix, Local::now().format("%Y%m%d_%H%M%S"));

    let mut candidate = work_dir.join(&base);
    let mut counter = 1;
    while candidate.exists() {
        candidate = work_dir.join(format!("{}_{}", base, counter));
        counter += 1;
    }
    fs::create_dir(&candidate)?;
    Ok(candidate)
}

/// Drives full transfers between two registered devices
pub struct CrossPlatformTransfer {
    registry: Arc<DeviceRegistry>,
    work_dir: PathBuf,
    callback: Option<ProgressCallback<CrossTransferProgress>>,
    cancel: Arc<AtomicBool>,
    last_progress: Mutex<CrossTransferProgress>,
    last_staging: Mutex<Option<PathBuf>>,
}

impl CrossPlatformTransfer {
    pub fn new(registry: Arc<DeviceRegistry>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            work_dir: work_dir.into(),
            callback: None,
            cancel: Arc::new(AtomicBool::new(false)),
            last_progress: Mutex::new(CrossTransferProgress::default()),
            last_staging: Mutex::new(None),
        }
    }

    /// Receive every progress snapshot
    pub fn with_callback(mut self, callback: ProgressCallback<CrossTransferProgress>) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Share an external stop flag, e.g. one set by a Ctrl+C handler
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }

    /// Request a stop; takes effect at the next category or file boundary
    pub fn cancel(&self) {
        info!("Cancellation requested");
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Clear a previous cancellation before starting another run
    pub fn reset_cancel(&self) {
        self.cancel.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Final snapshot of the last run
    pub fn progress(&self) -> CrossTransferProgress {
        self.last_progress
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    /// Staging directory of the last run, if one was created
    pub fn staging_dir(&self) -> Option<PathBuf> {
        self.last_staging.lock().ok().and_then(|s| s.clone())
    }

    fn finish(&self, emitter: ProgressEmitter<CrossTransferProgress>, staging: Option<PathBuf>) {
        if let Ok(mut last) = self.last_progress.lock() {
            *last = emitter.into_snapshot();
        }
        if let Ok(mut last) = self.last_staging.lock() {
            *last = staging;
        }
    }

    fn fail(
        &self,
        mut emitter: ProgressEmitter<CrossTransferProgress>,
        message: String,
    ) -> bool {
        error!("{}", message);
        emitter.emit_with(|p| {
            p.phase = TransferPhase::Error;
            p.errors.push(message);
        });
        self.finish(emitter, None);
        false
    }

    fn resolve(
        &self,
        id: &str,
        role: &str,
    ) -> Result<(Arc<dyn DeviceTransport>, UnifiedDeviceInfo), String> {
        let backend = self
            .registry
            .resolve(id)
            .ok_or_else(|| format!("Dispositivo de {} não encontrado: {}", role, id))?;
        let info = backend
            .get_device_info(id)
            .map_err(|e| format!("Falha ao consultar dispositivo de {} {}: {}", role, id, e))?;
        Ok((backend, info))
    }

    /// Move every enabled category from `source_id` to `target_id`
    ///
    /// Returns `true` only when every enabled category ran and succeeded.
    /// Warnings never affect the result.
    pub fn transfer(&self, source_id: &str, target_id: &str, config: &CrossTransferConfig) -> bool {
        let mut emitter =
            ProgressEmitter::new(CrossTransferProgress::default(), self.callback.clone());
        emitter.emit_with(|p| p.phase = TransferPhase::Connecting);

        let (source_backend, source_info) = match self.resolve(source_id, "origem") {
            Ok(resolved) => resolved,
            Err(message) => return self.fail(emitter, message),
        };
        let (target_backend, target_info) = match self.resolve(target_id, "destino") {
            Ok(resolved) => resolved,
            Err(message) => return self.fail(emitter, message),
        };

        let cross = self.registry.is_cross_platform(source_id, target_id);
        info!(
            "Transfer {} ({}) -> {} ({}){}",
            source_info.display_name(),
            source_info.platform,
            target_info.display_name(),
            target_info.platform,
            if cross { " [cross-platform]" } else { "" }
        );

        let steps = config.enabled_categories();
        let total = steps.len();
        emitter.emit_with(|p| {
            p.source_platform = source_info.platform.display_name().to_string();
            p.source_name = source_info.display_name();
            p.target_platform = target_info.platform.display_name().to_string();
            p.target_name = target_info.display_name();
            p.total = total;
        });

        for info in [&source_info, &target_info] {
            if !info.is_ready() {
                let message = format!(
                    "{} não está pronto ({:?}); desbloqueie o aparelho e confirme a autorização",
                    info.display_name(),
                    info.state
                );
                warn!("{}", message);
                emitter.update(|p| p.warnings.push(message));
            }
        }

        let staging = match create_staging_dir(&self.work_dir, "cross") {
            Ok(dir) => dir,
            Err(e) => {
                return self.fail(
                    emitter,
                    format!(
                        "Falha ao criar diretório temporário em {}: {}",
                        self.work_dir.display(),
                        e
                    ),
                )
            }
        };
        info!("Staging directory: {}", staging.display());

        let source = DeviceHandle::new(source_backend.as_ref(), &source_info);
        let target = DeviceHandle::new(target_backend.as_ref(), &target_info);
        let mut success = true;

        for (index, category) in steps.iter().copied().enumerate() {
            if self.is_cancelled() {
                warn!("Stopping before {}: cancelled", category.key());
                emitter.update(|p| {
                    p.cancelled = true;
                    p.warnings.push(CANCELLED_MESSAGE.to_string());
                });
                success = false;
                break;
            }

            emitter.emit_with(|p| {
                p.phase = TransferPhase::Transferring;
                p.sub_phase = category.label().to_string();
                p.current_item.clear();
                p.done = index;
                p.percent = index as f64 / total as f64 * 100.0;
            });

            let report = self.run_step(
                category,
                &mut emitter,
                source,
                target,
                &staging,
                config,
                index,
                total,
            );
            success &= report.success;
            let stopped = report.cancelled || self.is_cancelled();

            emitter.emit_with(|p| {
                p.done = index + 1;
                p.categories.push(report);
            });

            if stopped {
                warn!("Stopped during {}: cancelled", category.key());
                emitter.update(|p| {
                    p.cancelled = true;
                    p.warnings.push(CANCELLED_MESSAGE.to_string());
                });
                success = false;
                break;
            }
        }

        emitter.emit_with(|p| {
            p.phase = if !p.has_errors() {
                TransferPhase::Complete
            } else {
                TransferPhase::CompleteWithErrors
            };
            p.current_item.clear();
            p.percent = 100.0;
        });

        let snapshot = emitter.snapshot();
        info!(
            "Transfer finished: {} ({} warning(s), {} error(s))",
            snapshot.phase.as_str(),
            snapshot.warnings.len(),
            snapshot.errors.len()
        );

        self.finish(emitter, Some(staging));
        success
    }

    #[allow(clippy::too_many_arguments)]
    fn run_step(
        &self,
        category: Category,
        emitter: &mut ProgressEmitter<CrossTransferProgress>,
        source: DeviceHandle<'_>,
        target: DeviceHandle<'_>,
        staging: &Path,
        config: &CrossTransferConfig,
        index: usize,
        total: usize,
    ) -> CategoryReport {
        let mut report = CategoryReport::new(category);
        let strategy = strategy_for(category);
        let label = category.label();

        let mut ctx = TransferContext::new(
            source,
            target,
            staging,
            config,
            emitter,
            &self.cancel,
            index,
            total,
        );
        let errors_before = ctx.error_count();

        let result = panic::catch_unwind(AssertUnwindSafe(|| strategy.run(&mut ctx)));
        match result {
            Ok(Ok(outcome)) => {
                report.success = outcome.success;
                report.pulled = outcome.pulled;
                report.pushed = outcome.pushed;
                report.errors = outcome.errors;
                report.cancelled = outcome.cancelled;
                if !outcome.success && !outcome.cancelled && ctx.error_count() == errors_before {
                    ctx.error(format!("Falha ao transferir {}", label));
                }
            }
            Ok(Err(e)) if e.is_unsupported() => {
                ctx.warn(format!(
                    "{}: operação não suportada neste dispositivo ({})",
                    label, e
                ));
                report.success = true;
            }
            Ok(Err(e)) => {
                ctx.error(format!("Erro em {}: {}", label, e));
            }
            Err(_) => {
                ctx.error(format!("Erro inesperado em {}", label));
            }
        }

        info!(
            "{} finished: success={} pulled={} pushed={} errors={}",
            category.key(),
            report.success,
            report.pulled,
            report.pushed,
            report.errors
        );
        report
    }
}
