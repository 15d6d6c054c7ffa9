//! Device interaction module
//!
//! This module provides the platform-agnostic device model the transfer
//! core depends on. It never talks to hardware itself: concrete transports
//! implement [`DeviceTransport`] outside this crate.
//!
//! # Submodules
//!
//! - `traits` - Unified device model and the transport capability trait
//! - `registry` - Backend aggregation and identifier resolution

pub mod registry;
pub mod traits;

// Re-export commonly used types for convenience
pub use registry::DeviceRegistry;
pub use traits::{
    join_remote, DeviceHandle, DeviceState, DeviceTransport, Platform, PlatformExtras,
    RemoteEntry, RemoteFileStat, StorageInfo, UnifiedDeviceInfo, PATH_DOWNLOADS,
};
