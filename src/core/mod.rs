//! Core functionality module
//!
//! # Submodules
//!
//! - `config` - Configuration loading, saving, and transfer options
//! - `error` - Error types and result aliases
//! - `orchestrator` - Category-by-category transfer between two devices
//! - `progress` - Progress snapshots and callback delivery

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod progress;
