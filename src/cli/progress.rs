//! Progress bar utilities for CLI output
//!
//! Transfers report progress through callbacks; the bars here turn those
//! snapshots into an indicatif display that suspends cleanly for log
//! output.

use crate::core::progress::{CrossTransferProgress, ProgressCallback, WhatsAppTransferProgress};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Styles
// ============================================================================

fn progress_bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("  {spinner:.green} [{bar:40.cyan/dim}] {pos:>3}% {prefix:.bold} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━━╾─")
}

fn completed_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("  ✓ [{bar:40.green/dim}] {pos:>3}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━━━")
}

// ============================================================================
// Console output helpers
// ============================================================================

/// Print a header section with a box
pub fn print_header(title: &str) {
    let width = 68;
    let title_padded = format!("{:^width$}", title, width = width - 4);
    println!();
    println!("╔{}╗", "═".repeat(width - 2));
    println!("║{}║", title_padded);
    println!("╚{}╝", "═".repeat(width - 2));
    println!();
}

/// Print a section divider
pub fn print_divider() {
    println!();
    println!("{}", "─".repeat(60));
    println!();
}

pub fn print_success(msg: &str) {
    println!("  ✓ {}", msg);
}

pub fn print_info(msg: &str) {
    println!("  • {}", msg);
}

pub fn print_warning(msg: &str) {
    println!("  ⚠ {}", msg);
}

pub fn print_error(msg: &str) {
    println!("  ✗ {}", msg);
}

// ============================================================================
// Percent bar fed by progress callbacks
// ============================================================================

/// A 0-100 bar driven by progress snapshots
#[derive(Clone)]
pub struct TransferProgressBar {
    bar: ProgressBar,
}

impl TransferProgressBar {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(progress_bar_style());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// Move to `percent` with a step label and item description
    pub fn update(&self, percent: f64, step: &str, item: &str) {
        self.bar.set_position(percent.clamp(0.0, 100.0).round() as u64);
        self.bar.set_prefix(step.to_string());
        self.bar.set_message(item.to_string());
    }

    /// Print a line above the bar
    pub fn log(&self, msg: &str) {
        self.bar.suspend(|| println!("  → {}", msg));
    }

    pub fn finish(&self, msg: &str) {
        self.bar.set_style(completed_style());
        self.bar.finish_with_message(msg.to_string());
    }

    pub fn finish_with_error(&self, msg: &str) {
        self.bar.abandon_with_message(format!("✗ {}", msg));
    }

    /// Callback for a cross-platform transfer
    pub fn cross_callback(&self) -> ProgressCallback<CrossTransferProgress> {
        let this = self.clone();
        Arc::new(move |p: CrossTransferProgress| {
            let step = if p.total > 0 {
                format!("[{}/{}] {}", (p.done + 1).min(p.total), p.total, p.sub_phase)
            } else {
                p.sub_phase.clone()
            };
            this.update(p.percent, &step, &p.current_item);
        })
    }

    /// Callback for a WhatsApp media transfer
    pub fn whatsapp_callback(&self) -> ProgressCallback<WhatsAppTransferProgress> {
        let this = self.clone();
        Arc::new(move |p: WhatsAppTransferProgress| {
            let step = format!("{} {}", p.phase.as_str(), p.sub_phase);
            this.update(p.percent, step.trim(), &p.current_item);
        })
    }
}

impl Default for TransferProgressBar {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Utility functions
// ============================================================================

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}

// ============================================================================
// Dual writer for file + console logging
// ============================================================================

/// A writer that writes to both stderr and a log file
pub struct DualWriter {
    pub console: std::io::Stderr,
    pub file: std::fs::File,
}

impl Write for DualWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let _ = self.console.write(buf);
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let _ = self.console.flush();
        self.file.flush()
    }
}
