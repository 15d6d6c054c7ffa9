//! Device Migration Tool Library
//!
//! Moves a user's data from one phone to another, including between
//! Android and iOS: contacts, SMS, calendar events, photos, videos, music,
//! documents and WhatsApp media.
//!
//! # Architecture
//!
//! - [`device`] - Platform-neutral device model, the [`device::DeviceTransport`]
//!   trait and the [`device::DeviceRegistry`] that resolves identifiers to backends
//! - [`convert`] - Interchange formats: vCard, SMS JSON, iCalendar, HEIC to JPEG
//! - [`strategies`] - One transfer step per category, plus WhatsApp media
//! - [`core`] - Configuration, errors, progress snapshots and the orchestrator
//! - [`testdb`] - Mock phones, scenarios and a scenario runner
//! - [`cli`] - Command-line interface (only used by the binary)
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use device_migration_tool::core::config::{Category, CrossTransferConfig};
//! use device_migration_tool::core::orchestrator::CrossPlatformTransfer;
//! use device_migration_tool::core::progress::CrossTransferProgress;
//! use device_migration_tool::testdb::ScenarioLibrary;
//! use std::sync::Arc;
//!
//! let scenario = ScenarioLibrary::android_to_iphone();
//! let registry = Arc::new(scenario.build_registry());
//!
//! let transfer = CrossPlatformTransfer::new(registry, "/tmp/migration")
//!     .with_callback(Arc::new(|p: CrossTransferProgress| println!("{:>5.1}% {}", p.percent, p.sub_phase)));
//!
//! let config = CrossTransferConfig::only(&[Category::Contacts, Category::Photos]);
//! let ok = transfer.transfer(scenario.source.serial(), scenario.target.serial(), &config);
//! println!("success: {}, warnings: {:?}", ok, transfer.progress().warnings);
//! ```

pub mod cli;
pub mod convert;
pub mod core;
pub mod device;
pub mod strategies;
pub mod testdb;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
