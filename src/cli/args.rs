//! Command-line argument definitions
//!
//! This module defines all CLI arguments and subcommands using clap.

use crate::core::config::Category;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Move contacts, messages, calendar and media between Android and iOS phones
#[derive(Parser, Debug)]
#[command(name = "device-migrate")]
#[command(author = "Vihaan Reddy M")]
#[command(version)]
#[command(about = "Cross-platform phone migration: contacts, messages, calendar and media between Android and iPhone", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Staging work directory (overrides config)
    #[arg(short, long, global = true)]
    pub work_dir: Option<PathBuf>,

    /// Log level: error, warn, info, debug, trace (overrides config)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,
}

/// Category names accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CategoryArg {
    Contacts,
    Messages,
    Calendar,
    Photos,
    Videos,
    Music,
    Documents,
}

impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Contacts => Category::Contacts,
            CategoryArg::Messages => Category::Messages,
            CategoryArg::Calendar => Category::Calendar,
            CategoryArg::Photos => Category::Photos,
            CategoryArg::Videos => Category::Videos,
            CategoryArg::Music => Category::Music,
            CategoryArg::Documents => Category::Documents,
        }
    }
}

/// Platform names accepted by `guide`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlatformArg {
    Android,
    Ios,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a full transfer between the two phones of a simulated scenario
    ///
    /// Uses mock devices, so no phone needs to be connected. Categories come
    /// from the config file unless `--only` is given.
    Transfer {
        /// Scenario providing the source and target phones
        #[arg(short, long, default_value = "android_to_iphone")]
        scenario: String,

        /// Transfer only these categories (comma-separated)
        #[arg(long, value_enum, value_delimiter = ',')]
        only: Vec<CategoryArg>,

        /// Skip these categories (comma-separated)
        #[arg(long, value_enum, value_delimiter = ',')]
        skip: Vec<CategoryArg>,

        /// Keep HEIC photos as-is when the target is Android
        #[arg(long)]
        no_convert: bool,

        /// Delete the staging directory afterwards
        #[arg(long)]
        clean_staging: bool,
    },

    /// Copy WhatsApp media between the phones of a simulated scenario
    Whatsapp {
        /// Scenario providing the source and target phones
        #[arg(short, long, default_value = "android_to_iphone")]
        scenario: String,
    },

    /// Show how to move WhatsApp chat history between two platforms
    Guide {
        /// Source platform
        #[arg(long, value_enum)]
        from: PlatformArg,

        /// Target platform
        #[arg(long, value_enum)]
        to: PlatformArg,
    },

    /// List the devices a scenario registers
    Devices {
        /// Scenario to inspect
        #[arg(short, long, default_value = "android_to_iphone")]
        scenario: String,
    },

    /// Open the configuration file location
    ///
    /// The config file is stored at:
    /// - Windows: %APPDATA%\device_migration_tool\config.toml
    /// - Linux: ~/.config/device_migration_tool/config.toml
    ///
    /// If no config file exists, a default one will be created.
    Config {
        /// Show the config file path only
        #[arg(long)]
        path: bool,

        /// Reset config to defaults (creates a fresh config file)
        #[arg(long)]
        reset: bool,
    },

    /// Generate a configuration file at a specific location
    GenerateConfig {
        /// Output path for the config file (defaults to standard location)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show current configuration
    ShowConfig,

    /// Run transfer scenarios against mock devices
    Test {
        #[command(subcommand)]
        test_command: TestCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum TestCommands {
    /// Run all available scenarios
    RunAll {
        /// Directory for the JSON report
        #[arg(short, long)]
        report_dir: Option<PathBuf>,

        /// Stop on first failure
        #[arg(long)]
        fail_fast: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run quick scenarios only
    RunQuick {
        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run scenarios filtered by tag
    RunTag {
        /// Tag to filter scenarios by
        tag: String,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run specific scenarios by name
    Run {
        /// Scenario names (comma-separated or multiple values)
        #[arg(value_delimiter = ',', required = true)]
        scenarios: Vec<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// List all available scenarios
    ListScenarios {
        /// Filter by tag
        #[arg(short, long)]
        tag: Option<String>,
    },

    /// List all scenario tags
    ListTags,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_args() {
        let args = Args::parse_from([
            "device-migrate",
            "transfer",
            "--scenario",
            "iphone_to_android",
            "--only",
            "contacts,photos",
            "--no-convert",
        ]);
        match args.command {
            Commands::Transfer {
                scenario,
                only,
                no_convert,
                ..
            } => {
                assert_eq!(scenario, "iphone_to_android");
                assert_eq!(only, vec![CategoryArg::Contacts, CategoryArg::Photos]);
                assert!(no_convert);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::parse_from(["device-migrate", "show-config", "--log-level", "debug"]);
        assert_eq!(args.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_guide_platforms() {
        let args = Args::parse_from(["device-migrate", "guide", "--from", "android", "--to", "ios"]);
        assert!(matches!(
            args.command,
            Commands::Guide {
                from: PlatformArg::Android,
                to: PlatformArg::Ios
            }
        ));
    }

    #[test]
    fn test_category_conversion() {
        assert_eq!(Category::from(CategoryArg::Music), Category::Music);
    }
}
