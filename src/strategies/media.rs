//! Media steps (photos, videos, music, documents)
//!
//! Files are copied one at a time: pull into staging, optional HEIC
//! conversion, push into the first target root, then delete the local copy.
//! A failed file is counted and skipped; only cancellation stops the loop.

use super::{CategoryStrategy, StepOutcome, TransferContext};
use crate::convert::photo::convert_if_needed;
use crate::core::config::Category;
use crate::core::error::Result;
use crate::device::{join_remote, RemoteEntry};
use log::{debug, info, warn};
use std::fs;
use std::path::Path;

/// Hidden/cache entries skipped when `exclude_cache` is set
pub(crate) fn is_cache_entry(name: &str) -> bool {
    let lower = name.to_lowercase();
    name.starts_with('.') || lower == "cache" || lower.ends_with(".tmp")
}

/// Thumbnail entries skipped when `exclude_thumbnails` is set
pub(crate) fn is_thumbnail_entry(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower == ".thumbnails"
        || lower == "thumbs.db"
        || lower.starts_with("thumb_")
        || lower.starts_with(".thumbdata")
}

struct SourceFile {
    root: String,
    entry: RemoteEntry,
}

pub struct MediaStrategy {
    category: Category,
}

impl MediaStrategy {
    pub fn new(category: Category) -> Self {
        Self { category }
    }

    fn wanted(&self, ctx: &TransferContext<'_>, entry: &RemoteEntry) -> bool {
        if entry.is_dir {
            return false;
        }
        if ctx.config.exclude_cache && is_cache_entry(&entry.name) {
            debug!("Skipping cache entry {}", entry.name);
            return false;
        }
        if ctx.config.exclude_thumbnails && is_thumbnail_entry(&entry.name) {
            debug!("Skipping thumbnail {}", entry.name);
            return false;
        }
        true
    }

    fn remove_local(path: &Path) {
        let _ = fs::remove_file(path);
    }
}

impl CategoryStrategy for MediaStrategy {
    fn category(&self) -> Category {
        self.category
    }

    fn run(&self, ctx: &mut TransferContext<'_>) -> Result<StepOutcome> {
        let key = self.category.key();
        let label = self.category.label();

        let source_roots = ctx.source.category_paths().remove(key).unwrap_or_default();
        if source_roots.is_empty() {
            info!("No {} location on source; nothing to do", key);
            return Ok(StepOutcome::nothing());
        }

        let target_roots = ctx.target.category_paths().remove(key).unwrap_or_default();
        let Some(target_root) = target_roots.into_iter().next() else {
            ctx.warn(format!(
                "{}: {} não possui local de destino para esta categoria; arquivos não transferidos",
                label,
                ctx.target.platform()
            ));
            return Ok(StepOutcome::nothing());
        };

        let mut files = Vec::new();
        for root in &source_roots {
            if ctx.is_cancelled() {
                return Ok(StepOutcome::stopped());
            }
            for entry in ctx.source.list_directory(root) {
                if self.wanted(ctx, &entry) {
                    files.push(SourceFile {
                        root: root.clone(),
                        entry,
                    });
                }
            }
        }
        info!("{} {} file(s) to copy", files.len(), key);

        if files.is_empty() {
            return Ok(StepOutcome::nothing());
        }

        let local_dir = ctx.category_dir(self.category)?;
        if !ctx.target.make_directory(&target_root) {
            debug!("Could not create {} on target; pushing anyway", target_root);
        }

        let convert = self.category == Category::Photos && ctx.config.convert_heic;
        let target_platform = ctx.target.platform();
        let total = files.len();
        let mut outcome = StepOutcome::default();

        for (index, file) in files.iter().enumerate() {
            if ctx.is_cancelled() {
                outcome.cancelled = true;
                break;
            }
            let name = &file.entry.name;
            ctx.set_step_fraction(index, total, format!("{} ({}/{})", name, index + 1, total));

            let remote_source = join_remote(&file.root, name);
            let local = local_dir.join(name);
            if !ctx.source.pull_file(&remote_source, &local) {
                warn!("Pull failed: {}", remote_source);
                outcome.errors += 1;
                Self::remove_local(&local);
                continue;
            }
            outcome.pulled += 1;

            let upload = if convert {
                convert_if_needed(&local, target_platform)
            } else {
                local.clone()
            };

            if ctx.is_cancelled() {
                Self::remove_local(&local);
                if upload != local {
                    Self::remove_local(&upload);
                }
                outcome.cancelled = true;
                break;
            }

            let final_name = upload
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| name.clone());
            let remote_target = join_remote(&target_root, &final_name);

            if ctx.target.push_file(&upload, &remote_target) {
                outcome.pushed += 1;
            } else {
                warn!("Push failed: {}", remote_target);
                outcome.errors += 1;
            }

            Self::remove_local(&local);
            if upload != local {
                Self::remove_local(&upload);
            }
        }

        if outcome.cancelled {
            info!(
                "{} stopped after {} of {} file(s): cancelled",
                key, outcome.pushed, total
            );
        } else {
            ctx.set_step_fraction(total, total, String::new());
        }

        if outcome.errors > 0 {
            ctx.error(format!(
                "{}: {} arquivo(s) com erro ({} copiado(s), {} enviado(s))",
                label, outcome.errors, outcome.pulled, outcome.pushed
            ));
        }
        outcome.success = outcome.errors == 0 && !outcome.cancelled;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::test_support::Harness;
    use crate::testdb::{MockDevice, MockDeviceConfig};
    use std::sync::atomic::Ordering;

    #[test]
    fn test_partial_pull_failure() {
        let source = MockDevice::android("A1")
            .with_file("/sdcard/DCIM/Camera/IMG_1.jpg", vec![1; 16])
            .with_file("/sdcard/DCIM/Camera/IMG_2.jpg", vec![2; 16])
            .with_file("/sdcard/DCIM/Camera/IMG_3.jpg", vec![3; 16])
            .with_config(MockDeviceConfig {
                pull_error_paths: vec!["/sdcard/DCIM/Camera/IMG_2.jpg".to_string()],
                ..Default::default()
            });
        let mut h = Harness::new(source, MockDevice::iphone("I1"));

        let outcome = h.run(&MediaStrategy::new(Category::Photos)).unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.pulled, 2);
        assert_eq!(outcome.pushed, 2);
        assert_eq!(outcome.errors, 1);
        assert_eq!(h.progress().errors.len(), 1);

        let target = h.target_device();
        assert!(target.has_file("/DCIM/100APPLE/IMG_1.jpg"));
        assert!(target.has_file("/DCIM/100APPLE/IMG_3.jpg"));
        assert!(!target.has_file("/DCIM/100APPLE/IMG_2.jpg"));
    }

    #[test]
    fn test_local_copies_removed() {
        let source = MockDevice::android("A1").with_file("/sdcard/Music/a.mp3", vec![1]);
        let mut h = Harness::new(source, MockDevice::android("A2"));
        let outcome = h.run(&MediaStrategy::new(Category::Music)).unwrap();

        assert!(outcome.success);
        let music_dir = h.staging.path().join("music");
        assert_eq!(fs::read_dir(music_dir).unwrap().count(), 0);
    }

    #[test]
    fn test_no_target_location_is_a_warning() {
        let source = MockDevice::android("A1").with_file("/sdcard/Music/a.mp3", vec![1]);
        let mut h = Harness::new(source, MockDevice::iphone("I1"));
        let outcome = h.run(&MediaStrategy::new(Category::Music)).unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.pulled, 0);
        assert_eq!(h.progress().warnings.len(), 1);
    }

    #[test]
    fn test_no_source_location_is_silent_success() {
        let source = MockDevice::iphone("I1");
        let mut h = Harness::new(source, MockDevice::android("A1"));
        let outcome = h.run(&MediaStrategy::new(Category::Music)).unwrap();
        assert!(outcome.success);
        assert!(h.progress().warnings.is_empty());
    }

    #[test]
    fn test_filters_and_directories() {
        let source = MockDevice::android("A1")
            .with_file("/sdcard/DCIM/Camera/IMG_1.jpg", vec![1])
            .with_file("/sdcard/DCIM/Camera/.nomedia", vec![])
            .with_file("/sdcard/DCIM/Camera/thumb_0001.jpg", vec![1])
            .with_file("/sdcard/DCIM/Camera/.thumbnails/t.jpg", vec![1]);
        let mut h = Harness::new(source.clone(), MockDevice::android("A2"));
        let outcome = h.run(&MediaStrategy::new(Category::Photos)).unwrap();
        assert_eq!(outcome.pushed, 1);

        let mut h = Harness::new(source, MockDevice::android("A2"));
        h.config.exclude_cache = false;
        h.config.exclude_thumbnails = false;
        let outcome = h.run(&MediaStrategy::new(Category::Photos)).unwrap();
        assert_eq!(outcome.pushed, 3);
    }

    #[test]
    fn test_jpeg_keeps_name_with_conversion_enabled() {
        let source = MockDevice::iphone("I1").with_file("/DCIM/100APPLE/IMG_0001.JPG", vec![7; 8]);
        let mut h = Harness::new(source, MockDevice::android("A1"));
        assert!(h.config.convert_heic);
        h.run(&MediaStrategy::new(Category::Photos)).unwrap();

        let target = h.target_device();
        assert_eq!(
            target.file("/sdcard/DCIM/Camera/IMG_0001.JPG"),
            Some(&vec![7; 8])
        );
    }

    #[test]
    fn test_cancelled_before_first_file() {
        let source = MockDevice::android("A1").with_file("/sdcard/Movies/a.mp4", vec![1]);
        let mut h = Harness::new(source, MockDevice::android("A2"));
        h.cancel.store(true, Ordering::SeqCst);
        let outcome = h.run(&MediaStrategy::new(Category::Videos)).unwrap();
        assert!(outcome.cancelled);
        assert!(!outcome.success);
        assert_eq!(outcome.pulled, 0);
        assert!(h.target_device().files_under("/sdcard/Movies").is_empty());
    }

    #[test]
    fn test_entry_filters() {
        assert!(is_cache_entry(".nomedia"));
        assert!(is_cache_entry("cache"));
        assert!(!is_cache_entry("IMG_1.jpg"));
        assert!(is_thumbnail_entry("thumb_01.jpg"));
        assert!(is_thumbnail_entry(".thumbdata3--1967290299"));
        assert!(!is_thumbnail_entry("photo.jpg"));
    }
}
