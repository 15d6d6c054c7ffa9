//! Configuration module for the device migration tool
//!
//! Supports loading configuration from a TOML file.
//! Configuration is stored in a standard location:
//! - Windows: %APPDATA%\device_migration_tool\config.toml
//! - Linux: ~/.config/device_migration_tool/config.toml
//! - macOS: ~/Library/Application Support/device_migration_tool/config.toml

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Application name used for config directory
const APP_NAME: &str = "device_migration_tool";

/// Default config file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Local config files checked before the standard location
const LOCAL_CONFIG_FILES: &[&str] = &["./config.toml", "./device_migration.toml"];

/// Get the standard configuration directory for the application.
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME))
}

/// Get the standard configuration file path.
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Default work directory for staging trees
fn default_work_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_NAME).join("staging"))
        .unwrap_or_else(|| PathBuf::from("./staging"))
}

/// Initialize the configuration file if it doesn't exist.
///
/// Returns the path to the config file.
pub fn init_config() -> Result<PathBuf, ConfigError> {
    let config_dir = get_config_dir().ok_or(ConfigError::ConfigDirNotFound)?;
    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)
            .map_err(|e| ConfigError::WriteError(config_dir.clone(), e.to_string()))?;
    }

    let config_path = config_dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        fs::write(&config_path, Config::generate_default_config())
            .map_err(|e| ConfigError::WriteError(config_path.clone(), e.to_string()))?;
    }

    Ok(config_path)
}

/// One kind of transferable data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Contacts,
    Messages,
    Calendar,
    Photos,
    Videos,
    Music,
    Documents,
}

impl Category {
    /// Fixed execution order: small, high-value data before bulk media
    pub const ORDERED: [Category; 7] = [
        Category::Contacts,
        Category::Messages,
        Category::Calendar,
        Category::Photos,
        Category::Videos,
        Category::Music,
        Category::Documents,
    ];

    /// Key used for staging subfolders and transport category paths
    pub fn key(&self) -> &'static str {
        match self {
            Category::Contacts => "contacts",
            Category::Messages => "sms",
            Category::Calendar => "calendar",
            Category::Photos => "photos",
            Category::Videos => "videos",
            Category::Music => "music",
            Category::Documents => "documents",
        }
    }

    /// User-facing label
    pub fn label(&self) -> &'static str {
        match self {
            Category::Contacts => "Contatos",
            Category::Messages => "Mensagens",
            Category::Calendar => "Calendário",
            Category::Photos => "Fotos",
            Category::Videos => "Vídeos",
            Category::Music => "Músicas",
            Category::Documents => "Documentos",
        }
    }

    /// Whether this category is moved file-by-file
    pub fn is_media(&self) -> bool {
        matches!(
            self,
            Category::Photos | Category::Videos | Category::Music | Category::Documents
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Per-transfer toggles
///
/// Every toggle is independent; the orchestrator evaluates each one on its
/// own when building the step list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossTransferConfig {
    pub contacts: bool,
    pub messages: bool,
    pub calendar: bool,
    pub photos: bool,
    pub videos: bool,
    pub music: bool,
    pub documents: bool,

    /// Re-encode HEIC/HEIF photos as JPEG when the target lacks support
    pub convert_heic: bool,

    /// Skip hidden/cache entries (".nomedia", ".cache", "cache")
    pub exclude_cache: bool,

    /// Skip thumbnail folders and files (".thumbnails", "thumb_*")
    pub exclude_thumbnails: bool,
}

impl Default for CrossTransferConfig {
    fn default() -> Self {
        Self {
            contacts: true,
            messages: true,
            calendar: true,
            photos: true,
            videos: true,
            music: true,
            documents: true,
            convert_heic: true,
            exclude_cache: true,
            exclude_thumbnails: true,
        }
    }
}

impl CrossTransferConfig {
    /// A config with every category disabled
    pub fn none() -> Self {
        Self {
            contacts: false,
            messages: false,
            calendar: false,
            photos: false,
            videos: false,
            music: false,
            documents: false,
            ..Default::default()
        }
    }

    /// A config with only the given categories enabled
    pub fn only(categories: &[Category]) -> Self {
        let mut config = Self::none();
        for category in categories {
            config.set_enabled(*category, true);
        }
        config
    }

    /// Check a single category toggle
    pub fn is_enabled(&self, category: Category) -> bool {
        match category {
            Category::Contacts => self.contacts,
            Category::Messages => self.messages,
            Category::Calendar => self.calendar,
            Category::Photos => self.photos,
            Category::Videos => self.videos,
            Category::Music => self.music,
            Category::Documents => self.documents,
        }
    }

    /// Set a single category toggle
    pub fn set_enabled(&mut self, category: Category, enabled: bool) {
        match category {
            Category::Contacts => self.contacts = enabled,
            Category::Messages => self.messages = enabled,
            Category::Calendar => self.calendar = enabled,
            Category::Photos => self.photos = enabled,
            Category::Videos => self.videos = enabled,
            Category::Music => self.music = enabled,
            Category::Documents => self.documents = enabled,
        }
    }

    /// Enabled categories in execution order
    pub fn enabled_categories(&self) -> Vec<Category> {
        Category::ORDERED
            .iter()
            .copied()
            .filter(|c| self.is_enabled(*c))
            .collect()
    }
}

/// Staging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    /// Directory under which `cross_<timestamp>` staging trees are created
    pub work_dir: PathBuf,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log to file
    pub log_to_file: bool,

    /// Log file path
    pub log_file: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: false,
            log_file: PathBuf::from("./device_migration.log"),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Category toggles and conversion options
    pub transfer: CrossTransferConfig,

    /// Staging settings
    pub staging: StagingConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))
    }

    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./config.toml
    /// 2. ./device_migration.toml
    /// 3. Standard config location
    ///
    /// If no config file is found, returns default configuration.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(Self::get_active_config_path()).or_else(|e| match e {
            ConfigError::FileNotFound(_) => Ok(Self::default()),
            other => Err(other),
        })
    }

    /// Get the path where the config file is (or would be) located.
    pub fn get_active_config_path() -> PathBuf {
        for path in LOCAL_CONFIG_FILES {
            let path = PathBuf::from(path);
            if path.exists() {
                return path;
            }
        }

        get_config_path().unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILES[0]))
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        fs::write(path.as_ref(), content)
            .map_err(|e| ConfigError::WriteError(path.as_ref().to_path_buf(), e.to_string()))
    }

    /// Generate a default config file with comments
    pub fn generate_default_config() -> String {
        include_str!("../../config.example.toml").to_string()
    }
}

/// Configuration error types
#[derive(Debug)]
pub enum ConfigError {
    /// Configuration file was not found at the specified path
    FileNotFound(PathBuf),
    /// Failed to read the configuration file
    ReadError(PathBuf, String),
    /// Failed to parse the configuration file (invalid TOML)
    ParseError(PathBuf, String),
    /// Failed to serialize configuration to TOML
    SerializeError(String),
    /// Failed to write configuration file
    WriteError(PathBuf, String),
    /// Could not determine config directory
    ConfigDirNotFound,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ReadError(path, err) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), err)
            }
            ConfigError::ParseError(path, err) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), err)
            }
            ConfigError::SerializeError(err) => {
                write!(f, "Failed to serialize configuration: {}", err)
            }
            ConfigError::WriteError(path, err) => {
                write!(f, "Failed to write config file '{}': {}", path.display(), err)
            }
            ConfigError::ConfigDirNotFound => {
                write!(f, "Could not determine configuration directory")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
