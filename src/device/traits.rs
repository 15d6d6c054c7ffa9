//! Unified device model and transport capability trait
//!
//! This module defines the platform-agnostic view of a phone that the
//! transfer core works against. Concrete transports (an Android bridge
//! client, an iOS lockdown/file-conduit client) live outside this crate and
//! implement [`DeviceTransport`]; mock transports in `testdb` implement it
//! for tests.
//!
//! # Architecture
//!
//! - `Platform` - Which mobile OS a device runs
//! - `UnifiedDeviceInfo` - Immutable snapshot of one device (re-fetched, never patched)
//! - `DeviceTransport` - The capability interface one backend implements
//! - `DeviceHandle` - A transport bound to one device serial
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use device_migration_tool::device::traits::{DeviceHandle, DeviceTransport};
//!
//! fn list_photos(transport: &dyn DeviceTransport, serial: &str) {
//!     let info = transport.get_device_info(serial).unwrap();
//!     let device = DeviceHandle::new(transport, &info);
//!     for root in device.category_paths().get("photos").into_iter().flatten() {
//!         for entry in device.list_directory(root) {
//!             println!("{}/{}", root, entry.name);
//!         }
//!     }
//! }
//! ```

use crate::core::error::{Result, TransferError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::path::{Path, PathBuf};

/// Category-path key for the public downloads location
pub const PATH_DOWNLOADS: &str = "downloads";

/// Mobile platform a device runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Android phones and tablets
    Android,
    /// iPhone, iPad, iPod touch
    Ios,
    /// Not (yet) identified
    #[default]
    Unknown,
}

/// Known Android device manufacturers for detection
const ANDROID_MANUFACTURERS: &[&str] = &[
    "samsung", "google", "oneplus", "xiaomi", "huawei", "oppo", "vivo", "motorola", "lg", "sony",
    "asus", "lenovo", "zte", "realme", "nokia", "htc", "honor", "tecno", "infinix", "poco",
    "redmi", "nothing",
];

/// Known Android model keywords for detection
const ANDROID_MODEL_KEYWORDS: &[&str] = &[
    "galaxy", "pixel", "oneplus", "redmi", "poco", "mi ", "note ", "mate ", "nova", "reno",
    "realme", "moto ", "edge", "razr", "xperia", "zenfone", "nord",
];

impl Platform {
    /// Get a human-readable name for this platform
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Android => "Android",
            Platform::Ios => "iOS",
            Platform::Unknown => "Unknown",
        }
    }

    /// Whether the platform's message store accepts programmatic inserts
    pub fn allows_message_insert(&self) -> bool {
        !matches!(self, Platform::Ios)
    }

    /// Whether the platform exposes a structured calendar event query
    pub fn has_calendar_query(&self) -> bool {
        matches!(self, Platform::Android)
    }

    /// Public downloads folder used when a transport reports none
    pub fn default_downloads_dir(&self) -> &'static str {
        match self {
            Platform::Android => "/sdcard/Download",
            Platform::Ios => "/Downloads",
            Platform::Unknown => "/",
        }
    }

    /// Guess the platform from manufacturer/model strings
    ///
    /// Backends that only see a generic USB descriptor use this; dedicated
    /// Android/iOS transports already know their platform.
    pub fn from_manufacturer_model(manufacturer: &str, model: &str) -> Self {
        let manufacturer = manufacturer.to_lowercase();
        let model = model.to_lowercase();

        if manufacturer.contains("apple")
            || model.contains("iphone")
            || model.contains("ipad")
            || model.contains("ipod")
        {
            return Platform::Ios;
        }

        if manufacturer.contains("android") || model.contains("android") {
            return Platform::Android;
        }

        if ANDROID_MANUFACTURERS.iter().any(|m| manufacturer.contains(m)) {
            return Platform::Android;
        }

        if ANDROID_MODEL_KEYWORDS.iter().any(|k| model.contains(k)) {
            return Platform::Android;
        }

        // Samsung model numbers: SM-XXXX
        if model.starts_with("sm-") {
            return Platform::Android;
        }

        Platform::Unknown
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Connection/lifecycle state reported by a transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceState {
    /// Connected and authorised
    Connected,
    /// Connected but the trust / USB-debugging prompt was not accepted
    Unauthorized,
    /// Known but not currently reachable
    Offline,
    /// Bootloader/recovery mode
    Recovery,
    #[default]
    Unknown,
}

/// Platform-specific fields that have no cross-platform equivalent
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PlatformExtras {
    Ios {
        udid: String,
        build_version: String,
    },
    Android {
        sdk_level: u32,
        codename: String,
    },
    #[default]
    None,
}

/// Immutable snapshot of one device
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UnifiedDeviceInfo {
    /// Platform the device runs
    pub platform: Platform,
    /// Serial / UDID used to address the device through its transport
    pub serial: String,
    /// Lifecycle state at query time
    pub state: DeviceState,
    /// User-facing name (e.g., "Maria's iPhone")
    pub name: String,
    /// Device model (e.g., "iPhone 15 Pro", "SM-S928B")
    pub model: String,
    /// Device manufacturer
    pub manufacturer: String,
    /// OS version string
    pub os_version: String,
    /// Total storage in bytes
    pub storage_total: u64,
    /// Free storage in bytes
    pub storage_free: u64,
    /// Battery percentage, when the transport reports it
    pub battery_level: Option<u8>,
    /// Platform-specific extension fields
    pub extras: PlatformExtras,
}

impl UnifiedDeviceInfo {
    /// Create a minimal snapshot
    pub fn new(platform: Platform, serial: &str, manufacturer: &str, model: &str) -> Self {
        Self {
            platform,
            serial: serial.to_string(),
            state: DeviceState::Connected,
            manufacturer: manufacturer.to_string(),
            model: model.to_string(),
            ..Default::default()
        }
    }

    /// Set the user-facing name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Name for progress labels and messages
    pub fn display_name(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        let label = format!("{} {}", self.manufacturer, self.model);
        let label = label.trim();
        if label.is_empty() {
            self.serial.clone()
        } else {
            label.to_string()
        }
    }

    /// Whether the device can currently be used for a transfer
    pub fn is_ready(&self) -> bool {
        self.state == DeviceState::Connected
    }
}

/// A directory entry on the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Entry name (no path)
    pub name: String,
    /// Whether this is a directory
    pub is_dir: bool,
    /// Size in bytes (0 for directories)
    pub size: u64,
}

impl RemoteEntry {
    /// Create a file entry
    pub fn file(name: &str, size: u64) -> Self {
        Self {
            name: name.to_string(),
            is_dir: false,
            size,
        }
    }

    /// Create a directory entry
    pub fn dir(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_dir: true,
            size: 0,
        }
    }
}

/// Result of a remote stat call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileStat {
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// Storage totals in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StorageInfo {
    pub total: u64,
    pub free: u64,
}

/// Capability interface a device transport implements
///
/// File operations report expected failures (missing remote file, refused
/// write) as `false`/`None`. Only [`DeviceTransport::execute_command`]
/// distinguishes "not supported" ([`TransferError::Unsupported`]) from a
/// runtime failure.
pub trait DeviceTransport: Send + Sync {
    /// Platform all devices of this backend run
    fn platform(&self) -> Platform;

    /// Short backend name for logs (e.g., "adb", "lockdown")
    fn backend_name(&self) -> &str;

    /// Enumerate devices visible to this backend
    fn list_devices(&self) -> Result<Vec<UnifiedDeviceInfo>>;

    /// Fetch a full, fresh snapshot for one device
    fn get_device_info(&self, serial: &str) -> Result<UnifiedDeviceInfo>;

    /// Copy a remote file to a local path
    fn pull_file(&self, serial: &str, remote: &str, local: &Path) -> bool;

    /// Copy a local file to a remote path
    fn push_file(&self, serial: &str, local: &Path, remote: &str) -> bool;

    /// List a remote directory (empty if missing or unreadable)
    fn list_directory(&self, serial: &str, remote: &str) -> Vec<RemoteEntry>;

    /// Check whether a remote path exists
    fn file_exists(&self, serial: &str, remote: &str) -> bool;

    /// Create a remote directory, including parents
    fn make_directory(&self, serial: &str, remote: &str) -> bool;

    /// Delete a remote file or directory
    fn delete_path(&self, serial: &str, remote: &str) -> bool;

    /// Stat a remote file
    fn stat_file(&self, serial: &str, remote: &str) -> Option<RemoteFileStat>;

    /// Export all contacts as a vCard file inside `output_dir`
    ///
    /// Returns `Ok(None)` when the device has no contacts.
    fn export_contacts(&self, serial: &str, output_dir: &Path) -> Result<Option<PathBuf>>;

    /// Import contacts from a local vCard file
    fn import_contacts(&self, serial: &str, vcf_path: &Path) -> Result<bool>;

    /// Export all messages as a JSON interchange file inside `output_dir`
    ///
    /// Returns `Ok(None)` when the device has no messages.
    fn export_messages(&self, serial: &str, output_dir: &Path) -> Result<Option<PathBuf>>;

    /// Import messages from a local JSON interchange file
    fn import_messages(&self, serial: &str, json_path: &Path) -> Result<bool>;

    /// Candidate remote root paths per category name
    fn category_paths(&self, serial: &str) -> HashMap<String, Vec<String>>;

    /// Query free/total storage
    fn storage_info(&self, serial: &str) -> Option<StorageInfo>;

    /// Run a raw platform command (e.g., an Android shell command)
    fn execute_command(&self, serial: &str, command: &str) -> Result<String> {
        let _ = (serial, command);
        Err(TransferError::Unsupported(format!(
            "command execution on {}",
            self.platform()
        )))
    }
}

/// A transport bound to one device
///
/// Strategies work with handles so they never pass serials around.
#[derive(Clone, Copy)]
pub struct DeviceHandle<'a> {
    transport: &'a dyn DeviceTransport,
    info: &'a UnifiedDeviceInfo,
}

impl<'a> DeviceHandle<'a> {
    pub fn new(transport: &'a dyn DeviceTransport, info: &'a UnifiedDeviceInfo) -> Self {
        Self { transport, info }
    }

    pub fn info(&self) -> &'a UnifiedDeviceInfo {
        self.info
    }

    pub fn platform(&self) -> Platform {
        self.info.platform
    }

    pub fn serial(&self) -> &'a str {
        &self.info.serial
    }

    pub fn pull_file(&self, remote: &str, local: &Path) -> bool {
        self.transport.pull_file(self.serial(), remote, local)
    }

    pub fn push_file(&self, local: &Path, remote: &str) -> bool {
        self.transport.push_file(self.serial(), local, remote)
    }

    pub fn list_directory(&self, remote: &str) -> Vec<RemoteEntry> {
        self.transport.list_directory(self.serial(), remote)
    }

    pub fn file_exists(&self, remote: &str) -> bool {
        self.transport.file_exists(self.serial(), remote)
    }

    pub fn make_directory(&self, remote: &str) -> bool {
        self.transport.make_directory(self.serial(), remote)
    }

    pub fn delete_path(&self, remote: &str) -> bool {
        self.transport.delete_path(self.serial(), remote)
    }

    pub fn stat_file(&self, remote: &str) -> Option<RemoteFileStat> {
        self.transport.stat_file(self.serial(), remote)
    }

    pub fn export_contacts(&self, output_dir: &Path) -> Result<Option<PathBuf>> {
        self.transport.export_contacts(self.serial(), output_dir)
    }

    pub fn import_contacts(&self, vcf_path: &Path) -> Result<bool> {
        self.transport.import_contacts(self.serial(), vcf_path)
    }

    pub fn export_messages(&self, output_dir: &Path) -> Result<Option<PathBuf>> {
        self.transport.export_messages(self.serial(), output_dir)
    }

    pub fn import_messages(&self, json_path: &Path) -> Result<bool> {
        self.transport.import_messages(self.serial(), json_path)
    }

    pub fn category_paths(&self) -> HashMap<String, Vec<String>> {
        self.transport.category_paths(self.serial())
    }

    pub fn storage_info(&self) -> Option<StorageInfo> {
        self.transport.storage_info(self.serial())
    }

    pub fn execute_command(&self, command: &str) -> Result<String> {
        self.transport.execute_command(self.serial(), command)
    }
}

/// Join a remote directory and a file name with exactly one separator
pub fn join_remote(base: &str, name: &str) -> String {
    let base = base.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if base.is_empty() {
        format!("/{}", name)
    } else {
        format!("{}/{}", base, name)
    }
}
