//! Mock device transports for testing without a real phone
//!
//! `MockTransport` implements [`DeviceTransport`] over in-memory devices.
//! Each `MockDevice` holds a flat remote file map, optional contact,
//! message and calendar stores, and a `MockDeviceConfig` that injects
//! failures the way a flaky cable or a locked phone would.

use crate::convert::sms::{write_messages_json, SmsEntry};
use crate::convert::{parse_messages_json, ContactEntry};
use crate::core::error::{Result, TransferError};
use crate::device::traits::{
    DeviceState, DeviceTransport, Platform, PlatformExtras, RemoteEntry,
    RemoteFileStat, StorageInfo, UnifiedDeviceInfo, PATH_DOWNLOADS,
};
use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

/// Configuration for mock device behavior
#[derive(Debug, Clone, Default)]
pub struct MockDeviceConfig {
    /// Simulate a locked / untrusted device (every operation refused)
    pub simulate_locked: bool,
    /// Simulate disconnection after N successful pulls
    pub disconnect_after_pulls: Option<usize>,
    /// Remote paths whose pull fails
    pub pull_error_paths: Vec<String>,
    /// Remote paths whose push fails
    pub push_error_paths: Vec<String>,
    /// Simulate slow transfers (milliseconds delay per KB)
    pub transfer_delay_ms_per_kb: u64,
    /// Simulate random pull failures (percentage 0-100)
    pub random_failure_rate: u8,
}

/// One simulated phone
#[derive(Debug, Clone)]
pub struct MockDevice {
    info: UnifiedDeviceInfo,
    files: BTreeMap<String, Vec<u8>>,
    directories: BTreeSet<String>,
    category_paths: HashMap<String, Vec<String>>,
    contacts_vcf: Option<String>,
    messages: Vec<SmsEntry>,
    calendar_output: Option<String>,
    accepts_message_import: bool,
    config: MockDeviceConfig,
    pull_count: usize,
    imported_contacts: Vec<String>,
    imported_messages: Vec<SmsEntry>,
}

fn android_paths() -> HashMap<String, Vec<String>> {
    let mut paths = HashMap::new();
    paths.insert(
        "photos".to_string(),
        vec!["/sdcard/DCIM/Camera".to_string()],
    );
    paths.insert("videos".to_string(), vec!["/sdcard/Movies".to_string()]);
    paths.insert("music".to_string(), vec!["/sdcard/Music".to_string()]);
    paths.insert(
        "documents".to_string(),
        vec!["/sdcard/Documents".to_string()],
    );
    paths.insert(
        PATH_DOWNLOADS.to_string(),
        vec!["/sdcard/Download".to_string()],
    );
    paths
}

fn ios_paths() -> HashMap<String, Vec<String>> {
    // Music has no public location on iOS
    let mut paths = HashMap::new();
    paths.insert("photos".to_string(), vec!["/DCIM/100APPLE".to_string()]);
    paths.insert("videos".to_string(), vec!["/DCIM/101APPLE".to_string()]);
    paths.insert("documents".to_string(), vec!["/Downloads".to_string()]);
    paths.insert(PATH_DOWNLOADS.to_string(), vec!["/Downloads".to_string()]);
    paths
}

impl MockDevice {
    fn empty(info: UnifiedDeviceInfo, category_paths: HashMap<String, Vec<String>>) -> Self {
        let accepts_message_import = info.platform.allows_message_insert();
        Self {
            info,
            files: BTreeMap::new(),
            directories: BTreeSet::new(),
            category_paths,
            contacts_vcf: None,
            messages: Vec::new(),
            calendar_output: None,
            accepts_message_import,
            config: MockDeviceConfig::default(),
            pull_count: 0,
            imported_contacts: Vec::new(),
            imported_messages: Vec::new(),
        }
    }

    /// A Samsung phone with the usual shared-storage layout
    pub fn android(serial: &str) -> Self {
        let mut info = UnifiedDeviceInfo::new(Platform::Android, serial, "samsung", "SM-S918B")
            .with_name("Galaxy S23 Ultra");
        info.os_version = "14".to_string();
        info.storage_total = 256 * 1024 * 1024 * 1024;
        info.storage_free = 120 * 1024 * 1024 * 1024;
        info.battery_level = Some(82);
        info.extras = PlatformExtras::Android {
            sdk_level: 34,
            codename: "dm3q".to_string(),
        };
        Self::empty(info, android_paths())
    }

    /// An iPhone exposing the media and downloads containers
    pub fn iphone(serial: &str) -> Self {
        let mut info = UnifiedDeviceInfo::new(Platform::Ios, serial, "Apple Inc.", "iPhone 15 Pro")
            .with_name("iPhone de Maria");
        info.os_version = "17.4".to_string();
        info.storage_total = 128 * 1024 * 1024 * 1024;
        info.storage_free = 40 * 1024 * 1024 * 1024;
        info.extras = PlatformExtras::Ios {
            udid: serial.to_string(),
            build_version: "21E219".to_string(),
        };
        Self::empty(info, ios_paths())
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.info.name = name.to_string();
        self
    }

    /// Add a remote file
    pub fn with_file(mut self, remote: &str, content: Vec<u8>) -> Self {
        self.files.insert(remote.to_string(), content);
        self
    }

    /// Add an empty remote directory
    pub fn with_directory(mut self, remote: &str) -> Self {
        self.directories.insert(remote.trim_end_matches('/').to_string());
        self
    }

    /// Set the contact store to these cards
    pub fn with_contacts(mut self, vcf: &str) -> Self {
        self.contacts_vcf = Some(vcf.to_string());
        self
    }

    /// Set the contact store from entries
    pub fn with_contact_entries(self, entries: &[ContactEntry]) -> Self {
        let vcf = crate::convert::write_vcards(entries);
        self.with_contacts(&vcf)
    }

    pub fn with_messages(mut self, messages: Vec<SmsEntry>) -> Self {
        self.messages = messages;
        self
    }

    /// Set the raw output of the calendar content query
    pub fn with_calendar_output(mut self, output: &str) -> Self {
        self.calendar_output = Some(output.to_string());
        self
    }

    /// Override the candidate roots of one category; empty removes it
    pub fn with_category_paths(mut self, category: &str, paths: &[&str]) -> Self {
        if paths.is_empty() {
            self.category_paths.remove(category);
        } else {
            self.category_paths.insert(
                category.to_string(),
                paths.iter().map(|p| p.to_string()).collect(),
            );
        }
        self
    }

    /// Whether message import reports success
    pub fn with_message_import(mut self, accepts: bool) -> Self {
        self.accepts_message_import = accepts;
        self
    }

    pub fn with_config(mut self, config: MockDeviceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn serial(&self) -> &str {
        &self.info.serial
    }

    pub fn info(&self) -> &UnifiedDeviceInfo {
        &self.info
    }

    pub fn config(&self) -> &MockDeviceConfig {
        &self.config
    }

    pub fn file(&self, remote: &str) -> Option<&Vec<u8>> {
        self.files.get(remote)
    }

    pub fn has_file(&self, remote: &str) -> bool {
        self.files.contains_key(remote)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Files stored directly or indirectly below `dir`
    pub fn files_under(&self, dir: &str) -> Vec<String> {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        self.files
            .keys()
            .filter(|k| k.starts_with(&prefix))
            .cloned()
            .collect()
    }

    /// Raw vCard texts received by `import_contacts`
    pub fn imported_contacts(&self) -> &[String] {
        &self.imported_contacts
    }

    /// Records received by `import_messages`
    pub fn imported_messages(&self) -> &[SmsEntry] {
        &self.imported_messages
    }

    fn dir_exists(&self, remote: &str) -> bool {
        let dir = remote.trim_end_matches('/');
        let prefix = format!("{}/", dir);
        self.directories.contains(dir)
            || self.directories.iter().any(|d| d.starts_with(&prefix))
            || self.files.keys().any(|k| k.starts_with(&prefix))
    }

    fn check_unlocked(&self) -> Result<()> {
        if self.config.simulate_locked {
            Err(TransferError::AccessDenied)
        } else {
            Ok(())
        }
    }

    fn read_file(&mut self, remote: &str) -> Result<Vec<u8>> {
        self.check_unlocked()?;

        if let Some(limit) = self.config.disconnect_after_pulls {
            if self.pull_count >= limit {
                return Err(TransferError::DeviceError(
                    "Device disconnected during transfer".to_string(),
                ));
            }
        }

        if self.config.pull_error_paths.iter().any(|p| p == remote) {
            return Err(TransferError::DeviceError(format!(
                "Simulated read error: {}",
                remote
            )));
        }

        if self.config.random_failure_rate > 0 {
            let roll = rand::random::<u8>() % 100;
            if roll < self.config.random_failure_rate {
                return Err(TransferError::DeviceError(format!(
                    "Random simulated failure: {}",
                    remote
                )));
            }
        }

        let content = self
            .files
            .get(remote)
            .cloned()
            .ok_or_else(|| TransferError::DeviceError(format!("No such file: {}", remote)))?;

        if self.config.transfer_delay_ms_per_kb > 0 {
            let delay_ms = (content.len() as u64 / 1024) * self.config.transfer_delay_ms_per_kb;
            std::thread::sleep(Duration::from_millis(delay_ms));
        }

        self.pull_count += 1;
        Ok(content)
    }

    fn write_file(&mut self, remote: &str, content: Vec<u8>) -> Result<()> {
        self.check_unlocked()?;
        if self.config.push_error_paths.iter().any(|p| p == remote) {
            return Err(TransferError::DeviceError(format!(
                "Simulated write error: {}",
                remote
            )));
        }
        self.files.insert(remote.to_string(), content);
        Ok(())
    }

    fn list(&self, remote: &str) -> Vec<RemoteEntry> {
        let dir = remote.trim_end_matches('/');
        let prefix = format!("{}/", dir);
        let mut subdirs = BTreeSet::new();
        let mut entries = Vec::new();

        for (path, content) in &self.files {
            let Some(rest) = path.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((sub, _)) => {
                    subdirs.insert(sub.to_string());
                }
                None => entries.push(RemoteEntry::file(rest, content.len() as u64)),
            }
        }
        for path in &self.directories {
            if let Some(rest) = path.strip_prefix(&prefix) {
                let sub = rest.split('/').next().unwrap_or(rest);
                if !sub.is_empty() {
                    subdirs.insert(sub.to_string());
                }
            }
        }

        let mut listing: Vec<RemoteEntry> = subdirs.iter().map(|d| RemoteEntry::dir(d)).collect();
        listing.extend(entries);
        listing
    }
}

/// A backend exposing a set of mock devices of one platform
pub struct MockTransport {
    platform: Platform,
    name: String,
    devices: RwLock<HashMap<String, MockDevice>>,
    enumerations: AtomicUsize,
}

impl MockTransport {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            name: format!("mock-{}", platform.display_name().to_lowercase()),
            devices: RwLock::new(HashMap::new()),
            enumerations: AtomicUsize::new(0),
        }
    }

    /// Plug in a device
    pub fn add_device(&self, device: MockDevice) {
        if let Ok(mut devices) = self.devices.write() {
            devices.insert(device.serial().to_string(), device);
        }
    }

    /// Unplug a device
    pub fn remove_device(&self, serial: &str) -> Option<MockDevice> {
        self.devices.write().ok()?.remove(serial)
    }

    /// Snapshot of a device's current state
    pub fn device(&self, serial: &str) -> Option<MockDevice> {
        self.devices.read().ok()?.get(serial).cloned()
    }

    pub fn device_count(&self) -> usize {
        self.devices.read().map(|d| d.len()).unwrap_or(0)
    }

    /// How many times `list_devices` has run
    pub fn enumeration_count(&self) -> usize {
        self.enumerations.load(Ordering::SeqCst)
    }

    fn with_device<T>(&self, serial: &str, f: impl FnOnce(&MockDevice) -> T) -> Option<T> {
        let devices = self.devices.read().ok()?;
        devices.get(serial).map(f)
    }

    fn with_device_mut<T>(&self, serial: &str, f: impl FnOnce(&mut MockDevice) -> T) -> Option<T> {
        let mut devices = self.devices.write().ok()?;
        devices.get_mut(serial).map(f)
    }

    fn require<T>(&self, serial: &str, f: impl FnOnce(&mut MockDevice) -> Result<T>) -> Result<T> {
        self.with_device_mut(serial, f)
            .unwrap_or_else(|| Err(TransferError::DeviceNotFound(serial.to_string())))
    }
}

impl DeviceTransport for MockTransport {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn backend_name(&self) -> &str {
        &self.name
    }

    fn list_devices(&self) -> Result<Vec<UnifiedDeviceInfo>> {
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        let devices = self
            .devices
            .read()
            .map_err(|_| TransferError::DeviceError("mock device table poisoned".to_string()))?;
        let mut infos: Vec<_> = devices.values().map(|d| d.info.clone()).collect();
        infos.sort_by(|a, b| a.serial.cmp(&b.serial));
        Ok(infos)
    }

    fn get_device_info(&self, serial: &str) -> Result<UnifiedDeviceInfo> {
        self.with_device(serial, |d| {
            let mut info = d.info.clone();
            if d.config.simulate_locked {
                info.state = DeviceState::Unauthorized;
            }
            info
        })
        .ok_or_else(|| TransferError::DeviceNotFound(serial.to_string()))
    }

    fn pull_file(&self, serial: &str, remote: &str, local: &Path) -> bool {
        let content = match self.require(serial, |d| d.read_file(remote)) {
            Ok(content) => content,
            Err(e) => {
                debug!("Mock pull {} failed: {}", remote, e);
                return false;
            }
        };
        if let Some(parent) = local.parent() {
            if fs::create_dir_all(parent).is_err() {
                return false;
            }
        }
        fs::write(local, content).is_ok()
    }

    fn push_file(&self, serial: &str, local: &Path, remote: &str) -> bool {
        let Ok(content) = fs::read(local) else {
            return false;
        };
        match self.require(serial, |d| d.write_file(remote, content)) {
            Ok(()) => {
                trace!("Mock push {} -> {}", local.display(), remote);
                true
            }
            Err(e) => {
                debug!("Mock push {} failed: {}", remote, e);
                false
            }
        }
    }

    fn list_directory(&self, serial: &str, remote: &str) -> Vec<RemoteEntry> {
        self.with_device(serial, |d| {
            if d.config.simulate_locked {
                Vec::new()
            } else {
                d.list(remote)
            }
        })
        .unwrap_or_default()
    }

    fn file_exists(&self, serial: &str, remote: &str) -> bool {
        self.with_device(serial, |d| d.files.contains_key(remote) || d.dir_exists(remote))
            .unwrap_or(false)
    }

    fn make_directory(&self, serial: &str, remote: &str) -> bool {
        self.with_device_mut(serial, |d| {
            d.directories.insert(remote.trim_end_matches('/').to_string());
        })
        .is_some()
    }

    fn delete_path(&self, serial: &str, remote: &str) -> bool {
        self.with_device_mut(serial, |d| {
            let prefix = format!("{}/", remote.trim_end_matches('/'));
            let before = d.files.len() + d.directories.len();
            d.files.retain(|k, _| k != remote && !k.starts_with(&prefix));
            d.directories
                .retain(|k| k != remote && !k.starts_with(&prefix));
            before != d.files.len() + d.directories.len()
        })
        .unwrap_or(false)
    }

    fn stat_file(&self, serial: &str, remote: &str) -> Option<RemoteFileStat> {
        self.with_device(serial, |d| {
            d.files.get(remote).map(|content| RemoteFileStat {
                size: content.len() as u64,
                modified: None,
            })
        })
        .flatten()
    }

    fn export_contacts(&self, serial: &str, output_dir: &Path) -> Result<Option<PathBuf>> {
        let vcf = self.require(serial, |d| {
            d.check_unlocked()?;
            Ok(d.contacts_vcf.clone())
        })?;
        let Some(vcf) = vcf else {
            return Ok(None);
        };
        fs::create_dir_all(output_dir)?;
        let path = output_dir.join("contacts.vcf");
        fs::write(&path, vcf)?;
        Ok(Some(path))
    }

    fn import_contacts(&self, serial: &str, vcf_path: &Path) -> Result<bool> {
        let vcf = fs::read_to_string(vcf_path)?;
        self.require(serial, |d| {
            d.check_unlocked()?;
            d.imported_contacts.push(vcf);
            Ok(true)
        })
    }

    fn export_messages(&self, serial: &str, output_dir: &Path) -> Result<Option<PathBuf>> {
        let messages = self.require(serial, |d| {
            d.check_unlocked()?;
            Ok(d.messages.clone())
        })?;
        if messages.is_empty() {
            return Ok(None);
        }
        fs::create_dir_all(output_dir)?;
        let path = output_dir.join("sms.json");
        fs::write(&path, write_messages_json(&messages)?)?;
        Ok(Some(path))
    }

    fn import_messages(&self, serial: &str, json_path: &Path) -> Result<bool> {
        let records = parse_messages_json(&fs::read_to_string(json_path)?);
        self.require(serial, |d| {
            d.check_unlocked()?;
            if !d.accepts_message_import {
                return Ok(false);
            }
            d.imported_messages.extend(records);
            Ok(true)
        })
    }

    fn category_paths(&self, serial: &str) -> HashMap<String, Vec<String>> {
        self.with_device(serial, |d| d.category_paths.clone())
            .unwrap_or_default()
    }

    fn storage_info(&self, serial: &str) -> Option<StorageInfo> {
        self.with_device(serial, |d| StorageInfo {
            total: d.info.storage_total,
            free: d.info.storage_free,
        })
    }

    fn execute_command(&self, serial: &str, command: &str) -> Result<String> {
        if self.platform != Platform::Android {
            return Err(TransferError::Unsupported(format!(
                "command execution on {}",
                self.platform
            )));
        }
        self.require(serial, |d| {
            d.check_unlocked()?;
            if command.starts_with("content query") {
                Ok(d.calendar_output.clone().unwrap_or_default())
            } else {
                Ok(String::new())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn transport_with(device: MockDevice) -> MockTransport {
        let transport = MockTransport::new(device.info().platform);
        transport.add_device(device);
        transport
    }

    #[test]
    fn test_list_directory_shows_files_and_subdirs() {
        let device = MockDevice::android("A1")
            .with_file("/sdcard/DCIM/Camera/IMG_1.jpg", vec![1, 2, 3])
            .with_file("/sdcard/DCIM/Camera/.thumbnails/t1.jpg", vec![1])
            .with_directory("/sdcard/DCIM/Camera/Empty");
        let transport = transport_with(device);

        let listing = transport.list_directory("A1", "/sdcard/DCIM/Camera");
        assert_eq!(listing.len(), 3);
        assert!(listing.contains(&RemoteEntry::dir(".thumbnails")));
        assert!(listing.contains(&RemoteEntry::dir("Empty")));
        assert!(listing.contains(&RemoteEntry::file("IMG_1.jpg", 3)));
    }

    #[test]
    fn test_pull_and_push() {
        let dir = TempDir::new().unwrap();
        let device = MockDevice::android("A1").with_file("/sdcard/Music/song.mp3", vec![9; 10]);
        let transport = transport_with(device);

        let local = dir.path().join("music/song.mp3");
        assert!(transport.pull_file("A1", "/sdcard/Music/song.mp3", &local));
        assert_eq!(fs::read(&local).unwrap(), vec![9; 10]);
        assert!(!transport.pull_file("A1", "/sdcard/Music/missing.mp3", &local));

        assert!(transport.push_file("A1", &local, "/sdcard/Download/song.mp3"));
        assert!(transport.file_exists("A1", "/sdcard/Download/song.mp3"));
        assert!(transport.file_exists("A1", "/sdcard/Download"));
        assert_eq!(
            transport.stat_file("A1", "/sdcard/Download/song.mp3").unwrap().size,
            10
        );
    }

    #[test]
    fn test_failure_injection() {
        let dir = TempDir::new().unwrap();
        let device = MockDevice::android("A1")
            .with_file("/sdcard/Movies/a.mp4", vec![1])
            .with_file("/sdcard/Movies/b.mp4", vec![2])
            .with_file("/sdcard/Movies/c.mp4", vec![3])
            .with_config(MockDeviceConfig {
                pull_error_paths: vec!["/sdcard/Movies/a.mp4".to_string()],
                disconnect_after_pulls: Some(1),
                ..Default::default()
            });
        let transport = transport_with(device);
        let local = dir.path().join("x");

        assert!(!transport.pull_file("A1", "/sdcard/Movies/a.mp4", &local));
        assert!(transport.pull_file("A1", "/sdcard/Movies/b.mp4", &local));
        assert!(!transport.pull_file("A1", "/sdcard/Movies/c.mp4", &local));
    }

    #[test]
    fn test_locked_device() {
        let dir = TempDir::new().unwrap();
        let device = MockDevice::iphone("I1")
            .with_contacts("BEGIN:VCARD\nFN:A\nEND:VCARD")
            .with_config(MockDeviceConfig {
                simulate_locked: true,
                ..Default::default()
            });
        let transport = transport_with(device);

        let info = transport.get_device_info("I1").unwrap();
        assert_eq!(info.state, DeviceState::Unauthorized);
        assert!(matches!(
            transport.export_contacts("I1", dir.path()),
            Err(TransferError::AccessDenied)
        ));
    }

    #[test]
    fn test_ios_rejects_message_import_and_shell() {
        let dir = TempDir::new().unwrap();
        let json = dir.path().join("sms.json");
        fs::write(&json, "[]").unwrap();
        let transport = transport_with(MockDevice::iphone("I1"));

        assert!(!transport.import_messages("I1", &json).unwrap());
        assert!(transport
            .execute_command("I1", "content query --uri x")
            .unwrap_err()
            .is_unsupported());
    }

    #[test]
    fn test_unknown_serial() {
        let transport = MockTransport::new(Platform::Android);
        assert!(matches!(
            transport.get_device_info("nope"),
            Err(TransferError::DeviceNotFound(_))
        ));
        assert!(transport.list_directory("nope", "/").is_empty());
        assert!(transport.category_paths("nope").is_empty());
    }

    #[test]
    fn test_delete_path() {
        let transport = transport_with(
            MockDevice::android("A1")
                .with_file("/sdcard/Documents/a.pdf", vec![1])
                .with_file("/sdcard/Documents/sub/b.pdf", vec![1]),
        );
        assert!(transport.delete_path("A1", "/sdcard/Documents"));
        assert!(!transport.file_exists("A1", "/sdcard/Documents/sub/b.pdf"));
        assert!(!transport.delete_path("A1", "/sdcard/Documents"));
    }
}
