//! WhatsApp media transfer
//!
//! Copies the media the app keeps on shared storage (images, video, audio,
//! voice notes, documents, stickers, GIFs) between two phones. The chat
//! database is end-to-end encrypted and tied to the app install, so it is
//! never copied; the user is pointed at WhatsApp's own migration flow
//! instead.
//!
//! On iOS the app container is only reachable through a full backup, so an
//! iPhone source is scanned through its public camera-roll and downloads
//! folders, filtered by extension.

use crate::core::orchestrator::{create_staging_dir, CANCELLED_MESSAGE};
use crate::core::progress::{
    banded_percent, ProgressCallback, ProgressEmitter, TransferPhase, WhatsAppTransferProgress,
};
use crate::device::{join_remote, DeviceHandle, DeviceRegistry, Platform, RemoteEntry};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Guidance for Android <-> iPhone pairs
pub const CROSS_PLATFORM_GUIDE: &str = "O histórico de conversas do WhatsApp é criptografado e não pode ser copiado por esta ferramenta. Para migrar as conversas entre Android e iPhone use a ferramenta oficial: de Android para iPhone, o app \"Mover para iOS\" durante a configuração do iPhone; de iPhone para Android, a opção \"Transferir conversas\" do WhatsApp com cabo USB-C durante a configuração do Android. Esta ferramenta copia apenas fotos, vídeos, áudios e documentos.";

/// Guidance for same-platform pairs
pub const SAME_PLATFORM_GUIDE: &str = "O histórico de conversas do WhatsApp é criptografado e não pode ser copiado por esta ferramenta. Entre aparelhos da mesma plataforma, use o backup do próprio WhatsApp (Google Drive no Android, iCloud no iPhone) ou Configurações > Conversas > Transferir conversas. Esta ferramenta copia apenas fotos, vídeos, áudios e documentos.";

/// Android media roots, in lookup order
pub const ANDROID_MEDIA_CANDIDATES: &[&str] = &[
    "/sdcard/Android/media/com.whatsapp/WhatsApp/Media",
    "/sdcard/WhatsApp/Media",
    "/storage/emulated/0/Android/media/com.whatsapp/WhatsApp/Media",
    "/storage/emulated/0/WhatsApp/Media",
];

/// Where media lands on an Android target
pub const ANDROID_TARGET_ROOT: &str = "/sdcard/Android/media/com.whatsapp/WhatsApp/Media";

const IOS_CAMERA_ROLL: &str = "/DCIM";
const IOS_DOWNLOADS: &str = "/Downloads";
const IOS_TARGET_SUBDIR: &str = "WhatsApp";

/// Extensions collected from an iPhone's public folders
pub const IOS_ALLOWED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "heic", "gif", "webp", "mp4", "mov", "3gp", "m4a", "aac", "opus", "mp3",
    "ogg", "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "zip",
];

const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "heic", "gif", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "3gp"];
const AUDIO_EXTENSIONS: &[&str] = &["m4a", "aac", "opus", "mp3", "ogg"];

/// Android destination folders
pub const FOLDER_IMAGES: &str = "WhatsApp Images";
pub const FOLDER_VIDEO: &str = "WhatsApp Video";
pub const FOLDER_AUDIO: &str = "WhatsApp Audio";
pub const FOLDER_VOICE_NOTES: &str = "WhatsApp Voice Notes";
pub const FOLDER_DOCUMENTS: &str = "WhatsApp Documents";
pub const FOLDER_GIFS: &str = "WhatsApp Animated Gifs";
pub const FOLDER_STICKERS: &str = "WhatsApp Stickers";

/// Deepest folder level scanned below a media root
const MAX_SCAN_DEPTH: usize = 4;

/// Guidance text for a device pair
pub fn official_migration_guide(source: Platform, target: Platform) -> &'static str {
    if source == target {
        SAME_PLATFORM_GUIDE
    } else {
        CROSS_PLATFORM_GUIDE
    }
}

/// Android destination folder for a source sub-category name
///
/// Matching is by keyword; more specific buckets are tested first.
pub fn android_media_folder(sub_category: &str) -> &'static str {
    let name = sub_category.to_lowercase();
    let has = |keys: &[&str]| keys.iter().any(|k| name.contains(k));

    if has(&["voice", "ptt", "voz"]) {
        FOLDER_VOICE_NOTES
    } else if has(&["sticker", "figurinha"]) {
        FOLDER_STICKERS
    } else if has(&["gif", "animated"]) {
        FOLDER_GIFS
    } else if has(&["image", "photo", "imagem", "foto"]) {
        FOLDER_IMAGES
    } else if has(&["video", "vídeo"]) {
        FOLDER_VIDEO
    } else if has(&["audio", "áudio", "music"]) {
        FOLDER_AUDIO
    } else {
        FOLDER_DOCUMENTS
    }
}

fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// Sub-category for a file found outside the app's own folders
fn sub_category_for_extension(name: &str) -> &'static str {
    let ext = extension_of(name);
    let ext = ext.as_str();
    if ext == "gif" {
        FOLDER_GIFS
    } else if PHOTO_EXTENSIONS.contains(&ext) {
        FOLDER_IMAGES
    } else if VIDEO_EXTENSIONS.contains(&ext) {
        FOLDER_VIDEO
    } else if AUDIO_EXTENSIONS.contains(&ext) {
        FOLDER_AUDIO
    } else {
        FOLDER_DOCUMENTS
    }
}

fn is_photo_or_video(name: &str) -> bool {
    let ext = extension_of(name);
    PHOTO_EXTENSIONS.contains(&ext.as_str()) || VIDEO_EXTENSIONS.contains(&ext.as_str())
}

/// One file found on the source
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFile {
    pub remote: String,
    pub name: String,
    pub sub_category: String,
    pub size: u64,
}

/// Destination path of `file` on a device of `platform`
pub fn target_path(device: &DeviceHandle<'_>, file: &MediaFile) -> String {
    match device.platform() {
        Platform::Ios => {
            let paths = device.category_paths();
            let root = if is_photo_or_video(&file.name) {
                paths
                    .get("photos")
                    .and_then(|p| p.first())
                    .map(|p| join_remote(p, IOS_TARGET_SUBDIR))
                    .unwrap_or_else(|| join_remote(IOS_CAMERA_ROLL, IOS_TARGET_SUBDIR))
            } else {
                paths
                    .get(crate::device::PATH_DOWNLOADS)
                    .and_then(|p| p.first())
                    .cloned()
                    .unwrap_or_else(|| IOS_DOWNLOADS.to_string())
            };
            join_remote(&root, &file.name)
        }
        _ => {
            let folder = join_remote(ANDROID_TARGET_ROOT, android_media_folder(&file.sub_category));
            join_remote(&folder, &file.name)
        }
    }
}

/// First Android media root that exists on the device
pub fn find_android_media_root(device: &DeviceHandle<'_>) -> Option<&'static str> {
    ANDROID_MEDIA_CANDIDATES
        .iter()
        .copied()
        .find(|candidate| device.file_exists(candidate))
}

fn skip_entry(entry: &RemoteEntry) -> bool {
    entry.name.starts_with('.') || entry.name.eq_ignore_ascii_case("thumbs.db")
}

fn collect_files(
    device: &DeviceHandle<'_>,
    dir: &str,
    sub_category: &str,
    depth: usize,
    filter: &dyn Fn(&str) -> bool,
    out: &mut Vec<MediaFile>,
) {
    for entry in device.list_directory(dir) {
        if skip_entry(&entry) {
            continue;
        }
        let remote = join_remote(dir, &entry.name);
        if entry.is_dir {
            if depth < MAX_SCAN_DEPTH {
                collect_files(device, &remote, sub_category, depth + 1, filter, out);
            }
        } else if filter(&entry.name) {
            out.push(MediaFile {
                remote,
                sub_category: sub_category.to_string(),
                name: entry.name,
                size: entry.size,
            });
        }
    }
}

/// Enumerate the WhatsApp media present on `device`
pub fn discover_media(device: &DeviceHandle<'_>) -> Vec<MediaFile> {
    let mut files = Vec::new();

    match device.platform() {
        Platform::Ios => {
            let allowed = |name: &str| IOS_ALLOWED_EXTENSIONS.contains(&extension_of(name).as_str());
            for root in [IOS_CAMERA_ROLL, IOS_DOWNLOADS] {
                let mut found = Vec::new();
                collect_files(device, root, "", 0, &allowed, &mut found);
                for mut file in found {
                    file.sub_category = sub_category_for_extension(&file.name).to_string();
                    files.push(file);
                }
            }
        }
        _ => {
            let Some(root) = find_android_media_root(device) else {
                return files;
            };
            debug!("WhatsApp media root: {}", root);
            for entry in device.list_directory(root) {
                if skip_entry(&entry) {
                    continue;
                }
                let remote = join_remote(root, &entry.name);
                if entry.is_dir {
                    collect_files(device, &remote, &entry.name, 1, &|_: &str| true, &mut files);
                } else {
                    files.push(MediaFile {
                        remote,
                        sub_category: FOLDER_DOCUMENTS.to_string(),
                        name: entry.name,
                        size: entry.size,
                    });
                }
            }
        }
    }

    files
}

/// Runs WhatsApp media transfers between registered devices
pub struct WhatsAppTransfer {
    registry: Arc<DeviceRegistry>,
    work_dir: PathBuf,
    callback: Option<ProgressCallback<WhatsAppTransferProgress>>,
    cancel: Arc<AtomicBool>,
    last_progress: Mutex<WhatsAppTransferProgress>,
}

impl WhatsAppTransfer {
    pub fn new(registry: Arc<DeviceRegistry>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            work_dir: work_dir.into(),
            callback: None,
            cancel: Arc::new(AtomicBool::new(false)),
            last_progress: Mutex::new(WhatsAppTransferProgress::default()),
        }
    }

    pub fn with_callback(mut self, callback: ProgressCallback<WhatsAppTransferProgress>) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Share an external stop flag
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Request a stop at the next file boundary
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    pub fn reset_cancel(&self) {
        self.cancel.store(false, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Snapshot of the last finished run
    pub fn progress(&self) -> WhatsAppTransferProgress {
        self.last_progress
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    fn finish(&self, emitter: ProgressEmitter<WhatsAppTransferProgress>) -> bool {
        let snapshot = emitter.into_snapshot();
        let success = snapshot.errors.is_empty() && !snapshot.cancelled;
        if let Ok(mut last) = self.last_progress.lock() {
            *last = snapshot;
        }
        success
    }

    /// Copy WhatsApp media from `source_id` to `target_id`
    pub fn transfer(&self, source_id: &str, target_id: &str) -> bool {
        let mut emitter =
            ProgressEmitter::new(WhatsAppTransferProgress::default(), self.callback.clone());
        emitter.emit_with(|p| p.phase = TransferPhase::Connecting);

        let resolved = self
            .registry
            .resolve(source_id)
            .zip(self.registry.resolve(target_id));
        let Some((source_backend, target_backend)) = resolved else {
            emitter.emit_with(|p| {
                p.phase = TransferPhase::Error;
                p.errors.push(format!(
                    "Dispositivo não encontrado: {}",
                    if self.registry.resolve(source_id).is_none() {
                        source_id
                    } else {
                        target_id
                    }
                ));
            });
            return self.finish(emitter);
        };

        let infos = source_backend
            .get_device_info(source_id)
            .and_then(|s| target_backend.get_device_info(target_id).map(|t| (s, t)));
        let (source_info, target_info) = match infos {
            Ok(infos) => infos,
            Err(e) => {
                emitter.emit_with(|p| {
                    p.phase = TransferPhase::Error;
                    p.errors.push(format!("Falha ao consultar dispositivo: {}", e));
                });
                return self.finish(emitter);
            }
        };
        let source = DeviceHandle::new(source_backend.as_ref(), &source_info);
        let target = DeviceHandle::new(target_backend.as_ref(), &target_info);

        let guide = official_migration_guide(source.platform(), target.platform());
        warn!("Chat history is not copied; showing migration guidance");
        emitter.update(|p| p.warnings.push(guide.to_string()));

        let files = discover_media(&source);
        info!(
            "Found {} WhatsApp media file(s) on {}",
            files.len(),
            source_info.display_name()
        );
        if files.is_empty() {
            emitter.emit_with(|p| {
                p.warnings
                    .push("Nenhuma mídia do WhatsApp encontrada no dispositivo de origem".to_string());
                p.phase = TransferPhase::Complete;
                p.percent = 100.0;
            });
            return self.finish(emitter);
        }

        let staging = match create_staging_dir(&self.work_dir, "whatsapp") {
            Ok(dir) => dir,
            Err(e) => {
                emitter.emit_with(|p| {
                    p.phase = TransferPhase::Error;
                    p.errors.push(format!(
                        "Falha ao criar diretório temporário em {}: {}",
                        self.work_dir.display(),
                        e
                    ));
                });
                return self.finish(emitter);
            }
        };

        let total = files.len();
        emitter.emit_with(|p| {
            p.phase = TransferPhase::Pulling;
            p.files_total = total;
        });

        let mut pulled: Vec<(MediaFile, PathBuf)> = Vec::new();
        for (index, file) in files.into_iter().enumerate() {
            if self.is_cancelled() {
                break;
            }
            emitter.emit_with(|p| {
                p.sub_phase = file.sub_category.clone();
                p.current_item = file.name.clone();
                p.percent = banded_percent(index, total, 0.0, 50.0);
            });

            let local = staging.join(&file.sub_category).join(&file.name);
            if source.pull_file(&file.remote, &local) {
                emitter.update(|p| {
                    p.files_pulled += 1;
                    p.bytes_transferred += file.size;
                });
                pulled.push((file, local));
            } else {
                emitter.update(|p| p.errors.push(format!("Falha ao copiar {}", file.remote)));
            }
        }

        if !self.is_cancelled() {
            let to_push = pulled.len();
            emitter.emit_with(|p| {
                p.phase = TransferPhase::Pushing;
                p.percent = 50.0;
            });

            for (index, (file, local)) in pulled.iter().enumerate() {
                if self.is_cancelled() {
                    break;
                }
                let remote = target_path(&target, file);
                emitter.emit_with(|p| {
                    p.sub_phase = file.sub_category.clone();
                    p.current_item = file.name.clone();
                    p.percent = banded_percent(index, to_push, 50.0, 100.0);
                });

                if target.push_file(local, &remote) {
                    emitter.update(|p| p.files_pushed += 1);
                } else {
                    emitter.update(|p| p.errors.push(format!("Falha ao enviar {}", remote)));
                }
                emitter.update(|p| p.files_done = index + 1);
            }
        }

        for (_, local) in &pulled {
            let _ = fs::remove_file(local);
        }

        let cancelled = self.is_cancelled();
        emitter.emit_with(|p| {
            if cancelled {
                p.cancelled = true;
                p.warnings.push(CANCELLED_MESSAGE.to_string());
            }
            p.phase = if p.errors.is_empty() {
                TransferPhase::Complete
            } else {
                TransferPhase::CompleteWithErrors
            };
            p.current_item.clear();
            p.percent = 100.0;
        });

        self.finish(emitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceTransport;
    use crate::testdb::{MockDevice, MockDeviceConfig, MockTransport};
    use std::sync::Mutex as StdMutex;
    use tempfile::TempDir;

    const MEDIA: &str = "/sdcard/Android/media/com.whatsapp/WhatsApp/Media";

    fn android_with_media() -> MockDevice {
        MockDevice::android("A1")
            .with_file(&format!("{}/WhatsApp Images/IMG-1.jpg", MEDIA), vec![1; 10])
            .with_file(&format!("{}/WhatsApp Images/Sent/IMG-2.jpg", MEDIA), vec![2; 10])
            .with_file(&format!("{}/WhatsApp Voice Notes/202401/PTT-1.opus", MEDIA), vec![3; 10])
            .with_file(&format!("{}/WhatsApp Documents/nota.pdf", MEDIA), vec![4; 10])
            .with_file(&format!("{}/WhatsApp Images/.nomedia", MEDIA), vec![])
            .with_file("/sdcard/Android/media/com.whatsapp/WhatsApp/Databases/msgstore.db.crypt14", vec![9])
    }

    fn registry(source: MockDevice, target: MockDevice) -> (Arc<DeviceRegistry>, Arc<MockTransport>) {
        let source_transport = Arc::new(MockTransport::new(source.info().platform));
        source_transport.add_device(source);
        let target_transport = Arc::new(MockTransport::new(target.info().platform));
        target_transport.add_device(target);
        let registry = DeviceRegistry::with_backends(vec![
            source_transport as Arc<dyn DeviceTransport>,
            target_transport.clone() as Arc<dyn DeviceTransport>,
        ]);
        (Arc::new(registry), target_transport)
    }

    #[test]
    fn test_guides() {
        assert_eq!(
            official_migration_guide(Platform::Android, Platform::Android),
            SAME_PLATFORM_GUIDE
        );
        assert_eq!(
            official_migration_guide(Platform::Ios, Platform::Ios),
            SAME_PLATFORM_GUIDE
        );
        assert_eq!(
            official_migration_guide(Platform::Android, Platform::Ios),
            CROSS_PLATFORM_GUIDE
        );
        assert_ne!(CROSS_PLATFORM_GUIDE, SAME_PLATFORM_GUIDE);
    }

    #[test]
    fn test_folder_mapping() {
        assert_eq!(android_media_folder("WhatsApp Images"), FOLDER_IMAGES);
        assert_eq!(android_media_folder("WhatsApp Video"), FOLDER_VIDEO);
        assert_eq!(android_media_folder("WhatsApp Audio"), FOLDER_AUDIO);
        assert_eq!(android_media_folder("WhatsApp Voice Notes"), FOLDER_VOICE_NOTES);
        assert_eq!(android_media_folder("WhatsApp Animated Gifs"), FOLDER_GIFS);
        assert_eq!(android_media_folder("WhatsApp Stickers"), FOLDER_STICKERS);
        assert_eq!(android_media_folder("WhatsApp Documents"), FOLDER_DOCUMENTS);
        assert_eq!(android_media_folder("WallPaper"), FOLDER_DOCUMENTS);
    }

    #[test]
    fn test_candidate_priority() {
        let source = MockDevice::android("A1")
            .with_file("/sdcard/WhatsApp/Media/WhatsApp Images/old.jpg", vec![1])
            .with_file("/storage/emulated/0/WhatsApp/Media/WhatsApp Images/alt.jpg", vec![1]);
        let transport = MockTransport::new(Platform::Android);
        let info = source.info().clone();
        transport.add_device(source);
        let handle = DeviceHandle::new(&transport, &info);
        assert_eq!(find_android_media_root(&handle), Some("/sdcard/WhatsApp/Media"));

        let files = discover_media(&handle);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "old.jpg");
    }

    #[test]
    fn test_ios_discovery_filters_extensions() {
        let source = MockDevice::iphone("I1")
            .with_file("/DCIM/100APPLE/IMG_0001.HEIC", vec![1])
            .with_file("/DCIM/100APPLE/IMG_0002.MOV", vec![1])
            .with_file("/DCIM/100APPLE/IMG_0002.AAE", vec![1])
            .with_file("/Downloads/contrato.pdf", vec![1])
            .with_file("/Downloads/setup.exe", vec![1]);
        let transport = MockTransport::new(Platform::Ios);
        let info = source.info().clone();
        transport.add_device(source);
        let handle = DeviceHandle::new(&transport, &info);

        let files = discover_media(&handle);
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["IMG_0001.HEIC", "IMG_0002.MOV", "contrato.pdf"]);
        assert_eq!(files[1].sub_category, FOLDER_VIDEO);
        assert_eq!(files[2].sub_category, FOLDER_DOCUMENTS);
    }

    #[test]
    fn test_android_to_iphone_routes_by_type() {
        let dir = TempDir::new().unwrap();
        let (registry, target) = registry(android_with_media(), MockDevice::iphone("I1"));
        let transfer = WhatsAppTransfer::new(registry, dir.path());

        assert!(transfer.transfer("A1", "I1"));

        let progress = transfer.progress();
        assert_eq!(progress.files_total, 4);
        assert_eq!(progress.files_pulled, 4);
        assert_eq!(progress.files_pushed, 4);
        assert_eq!(progress.phase, TransferPhase::Complete);
        assert_eq!(progress.warnings[0], CROSS_PLATFORM_GUIDE);

        let device = target.device("I1").unwrap();
        assert!(device.has_file("/DCIM/100APPLE/WhatsApp/IMG-1.jpg"));
        assert!(device.has_file("/DCIM/100APPLE/WhatsApp/IMG-2.jpg"));
        assert!(device.has_file("/Downloads/PTT-1.opus"));
        assert!(device.has_file("/Downloads/nota.pdf"));
        assert!(!device.files_under("/").iter().any(|f| f.contains("msgstore")));
    }

    #[test]
    fn test_iphone_to_android_maps_folders() {
        let dir = TempDir::new().unwrap();
        let source = MockDevice::iphone("I1")
            .with_file("/DCIM/100APPLE/IMG_0001.JPG", vec![1])
            .with_file("/Downloads/boleto.pdf", vec![1]);
        let (registry, target) = registry(source, MockDevice::android("A1"));
        let transfer = WhatsAppTransfer::new(registry, dir.path());

        assert!(transfer.transfer("I1", "A1"));
        let device = target.device("A1").unwrap();
        assert!(device.has_file(&format!("{}/WhatsApp Images/IMG_0001.JPG", ANDROID_TARGET_ROOT)));
        assert!(device.has_file(&format!("{}/WhatsApp Documents/boleto.pdf", ANDROID_TARGET_ROOT)));
    }

    #[test]
    fn test_percent_bands() {
        let dir = TempDir::new().unwrap();
        let (registry, _) = registry(android_with_media(), MockDevice::android("A2"));
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = seen.clone();
        let transfer = WhatsAppTransfer::new(registry, dir.path()).with_callback(Arc::new(
            move |p: WhatsAppTransferProgress| sink.lock().unwrap().push((p.phase, p.percent)),
        ));
        assert!(transfer.transfer("A1", "A2"));

        let seen = seen.lock().unwrap();
        for (phase, percent) in seen.iter() {
            match phase {
                TransferPhase::Pulling => assert!(*percent <= 50.0),
                TransferPhase::Pushing => assert!(*percent >= 50.0 && *percent <= 100.0),
                _ => {}
            }
        }
        assert_eq!(seen.last().unwrap(), &(TransferPhase::Complete, 100.0));
        assert_eq!(transfer.progress().warnings[0], SAME_PLATFORM_GUIDE);
    }

    #[test]
    fn test_push_failures_reported() {
        let dir = TempDir::new().unwrap();
        let target = MockDevice::iphone("I1").with_config(MockDeviceConfig {
            push_error_paths: vec!["/Downloads/nota.pdf".to_string()],
            ..Default::default()
        });
        let (registry, _) = registry(android_with_media(), target);
        let transfer = WhatsAppTransfer::new(registry, dir.path());

        assert!(!transfer.transfer("A1", "I1"));
        let progress = transfer.progress();
        assert_eq!(progress.files_pushed, 3);
        assert_eq!(progress.errors.len(), 1);
        assert_eq!(progress.phase, TransferPhase::CompleteWithErrors);
    }

    #[test]
    fn test_unknown_device_and_cancel() {
        let dir = TempDir::new().unwrap();
        let (registry, _) = registry(android_with_media(), MockDevice::iphone("I1"));
        let transfer = WhatsAppTransfer::new(registry, dir.path());

        assert!(!transfer.transfer("A1", "missing"));
        assert_eq!(transfer.progress().phase, TransferPhase::Error);

        transfer.cancel();
        assert!(!transfer.transfer("A1", "I1"));
        let progress = transfer.progress();
        assert!(progress.cancelled);
        assert_eq!(progress.files_pulled, 0);

        transfer.reset_cancel();
        assert!(transfer.transfer("A1", "I1"));
    }

    #[test]
    fn test_cancel_between_pull_and_push() {
        let dir = TempDir::new().unwrap();
        let (registry, target) = registry(android_with_media(), MockDevice::iphone("I1"));
        let flag = Arc::new(AtomicBool::new(false));
        let trigger = flag.clone();
        let transfer = WhatsAppTransfer::new(registry, dir.path())
            .with_cancel_flag(flag)
            .with_callback(Arc::new(move |p: WhatsAppTransferProgress| {
                if p.phase == TransferPhase::Pushing {
                    trigger.store(true, Ordering::SeqCst);
                }
            }));

        assert!(!transfer.transfer("A1", "I1"));

        let progress = transfer.progress();
        assert!(progress.cancelled);
        assert!(progress.warnings.contains(&CANCELLED_MESSAGE.to_string()));
        assert_eq!(progress.files_pulled, 4);
        assert_eq!(progress.files_pushed, 0);
        assert_eq!(target.device("I1").unwrap().file_count(), 0);
    }

    #[test]
    fn test_runs_use_separate_staging() {
        let dir = TempDir::new().unwrap();
        let (registry, _) = registry(android_with_media(), MockDevice::android("A2"));
        let transfer = WhatsAppTransfer::new(registry, dir.path());

        assert!(transfer.transfer("A1", "A2"));
        assert!(transfer.transfer("A1", "A2"));

        let staging: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(staging.len(), 2);
        assert!(staging.iter().all(|name| name.starts_with("whatsapp_")));
    }
}
