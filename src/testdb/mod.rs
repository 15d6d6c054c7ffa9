//! Test Database Module
//!
//! Simulated phones for exercising transfers without real hardware.
//!
//! # Features
//!
//! - **Mock Devices**: Android and iOS phones with in-memory storage,
//!   contacts, messages and calendar rows
//! - **Failure Injection**: locked devices, read/write errors, disconnects,
//!   slow links and random failures
//! - **Scenarios**: ready-made source/target pairs with expected outcomes
//! - **Data Generators**: deterministic media and personal data
//! - **Runner**: executes scenarios end to end and reports results
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use device_migration_tool::testdb::{ScenarioLibrary, ScenarioRunner};
//!
//! let mut runner = ScenarioRunner::new();
//! let summary = runner.run_quick();
//! println!("Passed: {}/{}", summary.passed, summary.total);
//!
//! let scenario = ScenarioLibrary::by_name("android_to_iphone").unwrap();
//! let result = runner.run_scenario(&scenario, None);
//! println!("{}: {:?}", result.name, result.progress.phase);
//! ```
//!
//! # Available Scenarios
//!
//! - `android_to_iphone` - Full migration with every category populated
//! - `iphone_to_android` - HEIC photos, calendar left to cloud sync
//! - `android_to_android` - Same-platform upgrade
//! - `empty_source` - Nothing to move
//! - `personal_data_only` - Contacts and calendar only
//! - `file_read_errors` - Some photos fail to pull
//! - `disconnect_mid_transfer` - Source drops after two files
//! - `locked_source` - Source not unlocked/trusted
//! - `slow_transfer` - Simulated slow connection

pub mod generator;
pub mod mock_device;
pub mod runner;
pub mod scenarios;

pub use generator::MockDataGenerator;
pub use mock_device::{MockDevice, MockDeviceConfig, MockTransport};
pub use runner::{RunSummary, RunnerConfig, ScenarioResult, ScenarioRunner};
pub use scenarios::{ExpectedResults, ScenarioLibrary, TransferScenario};

/// Print available scenarios to console
pub fn print_available_scenarios() {
    println!("\n📋 Available transfer scenarios:\n");
    for scenario in ScenarioLibrary::all_scenarios() {
        println!(
            "  {:<26} {} -> {}",
            scenario.name,
            scenario.source.info().platform,
            scenario.target.info().platform
        );
        println!("      {}", scenario.description);
        if !scenario.tags.is_empty() {
            println!("      Tags: {}", scenario.tags.join(", "));
        }
    }
    println!();
}

/// All distinct scenario tags, sorted
pub fn available_tags() -> Vec<String> {
    let mut tags: Vec<String> = ScenarioLibrary::all_scenarios()
        .into_iter()
        .flat_map(|s| s.tags)
        .collect();
    tags.sort();
    tags.dedup();
    tags
}
