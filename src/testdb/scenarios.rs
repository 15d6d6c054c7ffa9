//! Predefined transfer scenarios
//!
//! Each scenario pairs a populated source phone with a target phone, the
//! categories to move, and what the finished run should look like.

use super::generator::{MockDataGenerator, MEDIA_FILE_SIZE};
use super::mock_device::{MockDevice, MockDeviceConfig, MockTransport};
use crate::core::config::{Category, CrossTransferConfig};
use crate::device::{DeviceRegistry, DeviceTransport, Platform};
use std::sync::Arc;

/// A source/target pair with the options and expected outcome of one run
#[derive(Debug, Clone)]
pub struct TransferScenario {
    /// Scenario name for identification
    pub name: String,
    /// Description of what this scenario exercises
    pub description: String,
    pub source: MockDevice,
    pub target: MockDevice,
    pub config: CrossTransferConfig,
    pub expected: ExpectedResults,
    /// Tags for filtering scenarios
    pub tags: Vec<String>,
}

/// Expected outcome of a scenario run
#[derive(Debug, Clone, Default)]
pub struct ExpectedResults {
    /// Overall result of the transfer
    pub should_succeed: bool,
    /// Exact number of error messages
    pub errors: usize,
    /// Lower bound on warning messages
    pub min_warnings: usize,
    /// Remote paths that must exist on the target afterwards
    pub target_files: Vec<String>,
    /// Files pushed per media category
    pub pushed: Vec<(Category, usize)>,
}

impl TransferScenario {
    pub fn new(
        name: &str,
        description: &str,
        source: MockDevice,
        target: MockDevice,
        config: CrossTransferConfig,
        expected: ExpectedResults,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            source,
            target,
            config,
            expected,
            tags: Vec::new(),
        }
    }

    /// Add tags to the scenario
    pub fn with_tags(mut self, tags: Vec<&str>) -> Self {
        self.tags = tags.into_iter().map(String::from).collect();
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Register both phones in a fresh registry with one backend per platform
    pub fn build_registry(&self) -> DeviceRegistry {
        let android = Arc::new(MockTransport::new(Platform::Android));
        let ios = Arc::new(MockTransport::new(Platform::Ios));
        for device in [&self.source, &self.target] {
            match device.info().platform {
                Platform::Ios => ios.add_device(device.clone()),
                _ => android.add_device(device.clone()),
            }
        }
        DeviceRegistry::with_backends(vec![
            android as Arc<dyn DeviceTransport>,
            ios as Arc<dyn DeviceTransport>,
        ])
    }
}

/// Put `files` under `dir` on `device`
fn with_files(mut device: MockDevice, dir: &str, files: Vec<(String, Vec<u8>)>) -> MockDevice {
    for (name, content) in files {
        device = device.with_file(&format!("{}/{}", dir, name), content);
    }
    device
}

fn media(prefix: &str, ext: &str, count: usize) -> Vec<(String, Vec<u8>)> {
    (0..count)
        .map(|i| {
            (
                format!("{}_{:03}.{}", prefix, i + 1, ext),
                MockDataGenerator::media_file(ext, MEDIA_FILE_SIZE, i as u64 + 100),
            )
        })
        .collect()
}

/// Collection of all predefined scenarios
pub struct ScenarioLibrary;

impl ScenarioLibrary {
    fn populated_android(serial: &str) -> MockDevice {
        let device = MockDevice::android(serial)
            .with_contact_entries(&MockDataGenerator::contacts(12))
            .with_messages(MockDataGenerator::messages(20))
            .with_calendar_output(&MockDataGenerator::calendar_query_output(3));
        let device = with_files(
            device,
            "/sdcard/DCIM/Camera",
            MockDataGenerator::camera_roll(4, false),
        );
        let device = with_files(device, "/sdcard/Movies", media("VID", "mp4", 2));
        let device = with_files(device, "/sdcard/Music", media("Faixa", "mp3", 2));
        let device = with_files(device, "/sdcard/Documents", media("Contrato", "pdf", 1));
        Self::with_whatsapp_media(device)
    }

    /// App media under the scoped-storage location
    fn with_whatsapp_media(device: MockDevice) -> MockDevice {
        let root = "/sdcard/Android/media/com.whatsapp/WhatsApp/Media";
        let device = with_files(
            device,
            &format!("{}/WhatsApp Images", root),
            media("IMG-20240101-WA", "jpg", 3),
        );
        let device = with_files(
            device,
            &format!("{}/WhatsApp Voice Notes/202401", root),
            media("PTT-20240101-WA", "opus", 2),
        );
        with_files(
            device,
            &format!("{}/WhatsApp Documents", root),
            media("Boleto", "pdf", 1),
        )
    }

    fn populated_iphone(serial: &str) -> MockDevice {
        let device = MockDevice::iphone(serial)
            .with_contact_entries(&MockDataGenerator::contacts(8))
            .with_messages(MockDataGenerator::messages(10));
        let device = with_files(
            device,
            "/DCIM/100APPLE",
            MockDataGenerator::camera_roll(4, true),
        );
        with_files(device, "/DCIM/101APPLE", media("IMG", "mov", 1))
    }

    /// Android to iPhone with every category populated
    pub fn android_to_iphone() -> TransferScenario {
        TransferScenario::new(
            "android_to_iphone",
            "Full Android to iPhone migration; iOS refuses message import and has no music folder",
            Self::populated_android("R5CT10ABCDE"),
            MockDevice::iphone("00008110-001A2B3C4D5E"),
            CrossTransferConfig::default(),
            ExpectedResults {
                should_succeed: false,
                errors: 1,
                min_warnings: 2,
                target_files: vec![
                    "/DCIM/100APPLE/IMG_20240101_000000.jpg".to_string(),
                    "/DCIM/101APPLE/VID_001.mp4".to_string(),
                    "/Downloads/Contrato_001.pdf".to_string(),
                    "/Downloads/calendar_import.ics".to_string(),
                ],
                pushed: vec![
                    (Category::Photos, 4),
                    (Category::Videos, 2),
                    (Category::Music, 0),
                    (Category::Documents, 1),
                ],
            },
        )
        .with_tags(vec!["cross-platform", "android", "iphone", "basic"])
    }

    /// iPhone to Android, HEIC photos included
    pub fn iphone_to_android() -> TransferScenario {
        TransferScenario::new(
            "iphone_to_android",
            "iPhone to Android; calendar is left to cloud sync and HEIC falls back to the original file",
            Self::populated_iphone("00008110-00AABBCCDDEE"),
            MockDevice::android("R5CT20FGHIJ"),
            CrossTransferConfig::default(),
            ExpectedResults {
                should_succeed: true,
                errors: 0,
                min_warnings: 1,
                target_files: vec![
                    "/sdcard/DCIM/Camera/IMG_0002.JPG".to_string(),
                    "/sdcard/Movies/IMG_001.mov".to_string(),
                ],
                pushed: vec![(Category::Photos, 4), (Category::Videos, 1)],
            },
        )
        .with_tags(vec!["cross-platform", "android", "iphone", "basic"])
    }

    /// Same-platform upgrade between two Android phones
    pub fn android_to_android() -> TransferScenario {
        TransferScenario::new(
            "android_to_android",
            "Android to Android upgrade; every category lands without warnings about capability",
            Self::populated_android("R5CT10ABCDE"),
            MockDevice::android("R5CT30KLMNO").with_name("Galaxy S24"),
            CrossTransferConfig::default(),
            ExpectedResults {
                should_succeed: true,
                errors: 0,
                min_warnings: 0,
                target_files: vec![
                    "/sdcard/Music/Faixa_002.mp3".to_string(),
                    "/sdcard/Download/calendar_import.ics".to_string(),
                ],
                pushed: vec![(Category::Photos, 4), (Category::Music, 2)],
            },
        )
        .with_tags(vec!["same-platform", "android", "basic"])
    }

    /// Source with nothing on it
    pub fn empty_source() -> TransferScenario {
        TransferScenario::new(
            "empty_source",
            "Empty Android phone; missing personal data becomes warnings, not errors",
            MockDevice::android("R5CT40EMPTY"),
            MockDevice::iphone("00008110-00EMPTYTARGET"),
            CrossTransferConfig::default(),
            ExpectedResults {
                should_succeed: true,
                errors: 0,
                min_warnings: 3,
                ..Default::default()
            },
        )
        .with_tags(vec!["edge-case", "empty"])
    }

    /// Only personal data, no media
    pub fn personal_data_only() -> TransferScenario {
        TransferScenario::new(
            "personal_data_only",
            "Contacts and calendar only; media folders stay untouched",
            Self::populated_android("R5CT10ABCDE"),
            MockDevice::android("R5CT50PQRST"),
            CrossTransferConfig::only(&[Category::Contacts, Category::Calendar]),
            ExpectedResults {
                should_succeed: true,
                errors: 0,
                min_warnings: 0,
                target_files: vec!["/sdcard/Download/calendar_import.ics".to_string()],
                pushed: Vec::new(),
            },
        )
        .with_tags(vec!["options", "same-platform"])
    }

    /// Some photos fail to read
    pub fn file_read_errors() -> TransferScenario {
        let source = with_files(
            MockDevice::android("R5CT60FLAKY"),
            "/sdcard/DCIM/Camera",
            media("IMG", "jpg", 5),
        )
        .with_config(MockDeviceConfig {
            pull_error_paths: vec![
                "/sdcard/DCIM/Camera/IMG_002.jpg".to_string(),
                "/sdcard/DCIM/Camera/IMG_004.jpg".to_string(),
            ],
            ..Default::default()
        });
        TransferScenario::new(
            "file_read_errors",
            "Two of five photos fail to pull; the rest still arrive",
            source,
            MockDevice::iphone("00008110-00READERRORS"),
            CrossTransferConfig::only(&[Category::Photos]),
            ExpectedResults {
                should_succeed: false,
                errors: 1,
                min_warnings: 0,
                target_files: vec!["/DCIM/100APPLE/IMG_005.jpg".to_string()],
                pushed: vec![(Category::Photos, 3)],
            },
        )
        .with_tags(vec!["error", "media"])
    }

    /// Cable pulled after a few files
    pub fn disconnect_mid_transfer() -> TransferScenario {
        let source = with_files(
            MockDevice::android("R5CT70DISCO"),
            "/sdcard/Movies",
            media("VID", "mp4", 5),
        )
        .with_config(MockDeviceConfig {
            disconnect_after_pulls: Some(2),
            ..Default::default()
        });
        TransferScenario::new(
            "disconnect_mid_transfer",
            "Source disconnects after two videos; remaining files are counted as errors",
            source,
            MockDevice::android("R5CT71TARGET"),
            CrossTransferConfig::only(&[Category::Videos]),
            ExpectedResults {
                should_succeed: false,
                errors: 1,
                min_warnings: 0,
                target_files: vec!["/sdcard/Movies/VID_002.mp4".to_string()],
                pushed: vec![(Category::Videos, 2)],
            },
        )
        .with_tags(vec!["error", "disconnect"])
    }

    /// Source refuses every operation
    pub fn locked_source() -> TransferScenario {
        TransferScenario::new(
            "locked_source",
            "Source phone not unlocked/trusted; contacts fail and media lists come back empty",
            Self::populated_android("R5CT80LOCKD").with_config(MockDeviceConfig {
                simulate_locked: true,
                ..Default::default()
            }),
            MockDevice::iphone("00008110-00LOCKEDTGT"),
            CrossTransferConfig::only(&[Category::Contacts, Category::Photos]),
            ExpectedResults {
                should_succeed: false,
                errors: 1,
                min_warnings: 1,
                pushed: vec![(Category::Photos, 0)],
                ..Default::default()
            },
        )
        .with_tags(vec!["error", "locked"])
    }

    /// Slow link, small library
    pub fn slow_transfer() -> TransferScenario {
        let source = with_files(
            MockDevice::android("R5CT90SLOWW"),
            "/sdcard/Documents",
            media("Nota", "pdf", 3),
        )
        .with_config(MockDeviceConfig {
            transfer_delay_ms_per_kb: 5,
            ..Default::default()
        });
        TransferScenario::new(
            "slow_transfer",
            "Simulated slow connection on the source",
            source,
            MockDevice::iphone("00008110-00SLOWTARGET"),
            CrossTransferConfig::only(&[Category::Documents]),
            ExpectedResults {
                should_succeed: true,
                errors: 0,
                min_warnings: 0,
                target_files: vec!["/Downloads/Nota_003.pdf".to_string()],
                pushed: vec![(Category::Documents, 3)],
            },
        )
        .with_tags(vec!["performance", "slow"])
    }

    pub fn all_scenarios() -> Vec<TransferScenario> {
        vec![
            Self::android_to_iphone(),
            Self::iphone_to_android(),
            Self::android_to_android(),
            Self::empty_source(),
            Self::personal_data_only(),
            Self::file_read_errors(),
            Self::disconnect_mid_transfer(),
            Self::locked_source(),
            Self::slow_transfer(),
        ]
    }

    pub fn scenarios_by_tag(tag: &str) -> Vec<TransferScenario> {
        Self::all_scenarios()
            .into_iter()
            .filter(|s| s.has_tag(tag))
            .collect()
    }

    pub fn by_name(name: &str) -> Option<TransferScenario> {
        Self::all_scenarios().into_iter().find(|s| s.name == name)
    }

    /// Scenarios that finish quickly
    pub fn quick_scenarios() -> Vec<TransferScenario> {
        Self::all_scenarios()
            .into_iter()
            .filter(|s| !s.has_tag("performance"))
            .collect()
    }
}
