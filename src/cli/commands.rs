//! Command handlers for the CLI
//!
//! Transfers run against the mock phones of a named scenario; the same
//! orchestrator drives real transports once a backend for them is
//! registered.

use super::args::{Args, CategoryArg, Commands, PlatformArg, TestCommands};
use super::progress::{
    format_bytes, format_duration, print_divider, print_error, print_header, print_info,
    print_success, print_warning, TransferProgressBar,
};
use crate::core::config::{get_config_path, init_config, Category, Config, CrossTransferConfig};
use crate::core::orchestrator::CrossPlatformTransfer;
use crate::core::progress::{CrossTransferProgress, TransferPhase};
use crate::device::Platform;
use crate::strategies::{official_migration_guide, WhatsAppTransfer};
use crate::testdb::{
    available_tags, print_available_scenarios, RunnerConfig, ScenarioLibrary, ScenarioRunner,
    TransferScenario,
};
use anyhow::{anyhow, bail, Result};
use log::{debug, info};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Run the command specified in the arguments
pub fn run_command(args: &Args, config: &Config, shutdown_flag: Arc<AtomicBool>) -> Result<()> {
    match &args.command {
        Commands::Transfer {
            scenario,
            only,
            skip,
            no_convert,
            clean_staging,
        } => {
            let transfer_config = build_transfer_config(&config.transfer, only, skip, *no_convert);
            run_transfer(config, scenario, &transfer_config, *clean_staging, shutdown_flag)?;
        }
        Commands::Whatsapp { scenario } => {
            run_whatsapp(config, scenario, shutdown_flag)?;
        }
        Commands::Guide { from, to } => {
            show_guide(*from, *to);
        }
        Commands::Devices { scenario } => {
            list_devices(scenario)?;
        }
        Commands::Config { path, reset } => {
            handle_config_command(*path, *reset)?;
        }
        Commands::GenerateConfig { output } => {
            generate_config_file(output.clone())?;
        }
        Commands::ShowConfig => {
            show_config(config);
        }
        Commands::Test { test_command } => {
            handle_test_command(test_command, config)?;
        }
    }

    Ok(())
}

/// Apply `--only`, `--skip` and `--no-convert` on top of the configured options
pub fn build_transfer_config(
    base: &CrossTransferConfig,
    only: &[CategoryArg],
    skip: &[CategoryArg],
    no_convert: bool,
) -> CrossTransferConfig {
    let mut config = base.clone();
    if !only.is_empty() {
        let only: Vec<Category> = only.iter().copied().map(Category::from).collect();
        for category in Category::ORDERED {
            config.set_enabled(category, only.contains(&category));
        }
    }
    for category in skip {
        config.set_enabled((*category).into(), false);
    }
    if no_convert {
        config.convert_heic = false;
    }
    config
}

fn find_scenario(name: &str) -> Result<TransferScenario> {
    ScenarioLibrary::by_name(name).ok_or_else(|| {
        anyhow!(
            "Unknown scenario '{}'. Run 'device-migrate test list-scenarios' to see the options.",
            name
        )
    })
}

fn print_pair(scenario: &TransferScenario) {
    let source = scenario.source.info();
    let target = scenario.target.info();
    print_info(&format!(
        "Origem:  {} ({}, {})",
        source.display_name(),
        source.platform,
        source.serial
    ));
    print_info(&format!(
        "Destino: {} ({}, {})",
        target.display_name(),
        target.platform,
        target.serial
    ));
}

/// Full category-by-category transfer
pub fn run_transfer(
    config: &Config,
    scenario_name: &str,
    transfer_config: &CrossTransferConfig,
    clean_staging: bool,
    shutdown_flag: Arc<AtomicBool>,
) -> Result<()> {
    let scenario = find_scenario(scenario_name)?;
    print_header("TRANSFERÊNCIA ENTRE APARELHOS");
    print_pair(&scenario);

    let categories = transfer_config.enabled_categories();
    print_info(&format!(
        "Categorias: {}",
        categories
            .iter()
            .map(|c| c.label())
            .collect::<Vec<_>>()
            .join(", ")
    ));
    println!();

    let registry = Arc::new(scenario.build_registry());
    let bar = TransferProgressBar::new();
    let transfer = CrossPlatformTransfer::new(registry, &config.staging.work_dir)
        .with_callback(bar.cross_callback())
        .with_cancel_flag(shutdown_flag);

    let success = transfer.transfer(
        scenario.source.serial(),
        scenario.target.serial(),
        transfer_config,
    );
    let progress = transfer.progress();

    match progress.phase {
        TransferPhase::Complete => bar.finish("Concluído"),
        TransferPhase::CompleteWithErrors => bar.finish("Concluído com erros"),
        _ => bar.finish_with_error(progress.phase.as_str()),
    }

    print_transfer_summary(&progress);

    if let Some(staging) = transfer.staging_dir() {
        if !clean_staging {
            print_info(&format!("Arquivos temporários: {}", staging.display()));
        } else if let Err(e) = fs::remove_dir_all(&staging) {
            debug!("Could not remove {}: {}", staging.display(), e);
        }
    }

    if progress.cancelled {
        print_warning("Transferência interrompida antes do fim");
        return Ok(());
    }
    if !success {
        bail!(
            "transfer finished with {} error(s)",
            progress.errors.len().max(1)
        );
    }
    Ok(())
}

fn print_transfer_summary(progress: &CrossTransferProgress) {
    print_divider();
    for report in &progress.categories {
        let (pulled, pushed) = if report.category.is_media() {
            ("arquivo(s) copiado(s)", "enviado(s)")
        } else {
            ("exportado(s)", "importado(s)")
        };
        let line = format!(
            "{:<11} {} {}, {} {}{}",
            report.category.label(),
            report.pulled,
            pulled,
            report.pushed,
            pushed,
            if report.errors > 0 {
                format!(", {} com erro", report.errors)
            } else {
                String::new()
            }
        );
        if report.cancelled {
            print_warning(&line);
        } else if report.success {
            print_success(&line);
        } else {
            print_error(&line);
        }
    }

    if !progress.warnings.is_empty() {
        println!();
        for warning in &progress.warnings {
            print_warning(warning);
        }
    }
    if !progress.errors.is_empty() {
        println!();
        for error in &progress.errors {
            print_error(error);
        }
    }

    println!();
    print_info(&format!(
        "{} de {} categoria(s) em {}",
        progress.done,
        progress.total,
        format_duration(progress.elapsed)
    ));
}

/// WhatsApp media copy
pub fn run_whatsapp(
    config: &Config,
    scenario_name: &str,
    shutdown_flag: Arc<AtomicBool>,
) -> Result<()> {
    let scenario = find_scenario(scenario_name)?;
    print_header("MÍDIA DO WHATSAPP");
    print_pair(&scenario);
    println!();

    let registry = Arc::new(scenario.build_registry());
    let bar = TransferProgressBar::new();
    let transfer = WhatsAppTransfer::new(registry, &config.staging.work_dir)
        .with_callback(bar.whatsapp_callback())
        .with_cancel_flag(shutdown_flag);

    let success = transfer.transfer(scenario.source.serial(), scenario.target.serial());
    let progress = transfer.progress();
    if success {
        bar.finish("Concluído");
    } else {
        bar.finish_with_error(progress.phase.as_str());
    }

    print_divider();
    print_success(&format!(
        "{} de {} arquivo(s) copiados, {} enviados ({})",
        progress.files_pulled,
        progress.files_total,
        progress.files_pushed,
        format_bytes(progress.bytes_transferred)
    ));
    for warning in &progress.warnings {
        print_warning(warning);
    }
    for error in &progress.errors {
        print_error(error);
    }

    if !success && !progress.cancelled {
        bail!("WhatsApp media transfer finished with errors");
    }
    Ok(())
}

fn to_platform(arg: PlatformArg) -> Platform {
    match arg {
        PlatformArg::Android => Platform::Android,
        PlatformArg::Ios => Platform::Ios,
    }
}

/// Print WhatsApp chat-history guidance for a platform pair
pub fn show_guide(from: PlatformArg, to: PlatformArg) {
    let (from, to) = (to_platform(from), to_platform(to));
    print_header(&format!("WHATSAPP: {} → {}", from, to));
    println!("{}", official_migration_guide(from, to));
    println!();
}

/// List the devices registered by a scenario
pub fn list_devices(scenario_name: &str) -> Result<()> {
    let scenario = find_scenario(scenario_name)?;
    let registry = scenario.build_registry();
    let devices = registry.refresh();

    info!("Found {} device(s)", devices.len());
    for device in &devices {
        println!();
        println!("  📱 {}", device.display_name());
        println!("     Plataforma: {}", device.platform);
        println!("     Modelo:     {} {}", device.manufacturer, device.model);
        println!("     Sistema:    {}", device.os_version);
        println!("     Serial:     {}", device.serial);
        println!("     Estado:     {:?}", device.state);
        println!(
            "     Armazenamento: {} livres de {}",
            format_bytes(device.storage_free),
            format_bytes(device.storage_total)
        );
        if let Some(battery) = device.battery_level {
            println!("     Bateria:    {}%", battery);
        }
    }
    println!();
    Ok(())
}

/// Show or reset the config file
pub fn handle_config_command(show_path: bool, reset: bool) -> Result<()> {
    if reset {
        if let Some(config_path) = get_config_path() {
            if config_path.exists() {
                fs::remove_file(&config_path)?;
                info!("Removed existing config file");
            }
        }
        let path = init_config()?;
        info!("Created fresh config file at: {}", path.display());
        return Ok(());
    }

    let path = Config::get_active_config_path();
    if show_path {
        println!("{}", path.display());
        return Ok(());
    }

    if path.exists() {
        info!("Config file: {}", path.display());
    } else {
        let created = init_config()?;
        info!("Created config file at: {}", created.display());
    }
    info!("Edit the file and run 'device-migrate show-config' to verify your settings.");
    Ok(())
}

/// Generate a configuration file at the specified or default location
pub fn generate_config_file(output: Option<PathBuf>) -> Result<()> {
    let output_path = match output {
        Some(path) => {
            fs::write(&path, Config::generate_default_config())?;
            path
        }
        None => init_config()?,
    };

    info!("Configuration file: {}", output_path.display());
    Ok(())
}

/// Show the current configuration settings
pub fn show_config(config: &Config) {
    let config_path = Config::get_active_config_path();
    info!("Configuration file: {}", config_path.display());
    if !config_path.exists() {
        info!("(Using default settings - no config file found)");
    }
    info!("");
    info!("[transfer]");
    for category in Category::ORDERED {
        info!(
            "  {} = {}",
            category.key(),
            config.transfer.is_enabled(category)
        );
    }
    info!("  convert_heic = {}", config.transfer.convert_heic);
    info!("  exclude_cache = {}", config.transfer.exclude_cache);
    info!("  exclude_thumbnails = {}", config.transfer.exclude_thumbnails);
    info!("");
    info!("[staging]");
    info!("  work_dir = \"{}\"", config.staging.work_dir.display());
    info!("");
    info!("[logging]");
    info!("  level = \"{}\"", config.logging.level);
    info!("  log_to_file = {}", config.logging.log_to_file);
    info!("  log_file = \"{}\"", config.logging.log_file.display());
}

/// Handle test subcommands
pub fn handle_test_command(test_command: &TestCommands, config: &Config) -> Result<()> {
    let runner_config = |verbose: bool| RunnerConfig {
        verbose,
        work_dir: config.staging.work_dir.join("scenarios"),
        ..Default::default()
    };

    let summary = match test_command {
        TestCommands::RunAll {
            report_dir,
            fail_fast,
            verbose,
        } => {
            print_header("ALL SCENARIOS");
            let mut runner = ScenarioRunner::with_config(RunnerConfig {
                fail_fast: *fail_fast,
                report_dir: report_dir.clone(),
                ..runner_config(*verbose)
            });
            runner.run_all()
        }
        TestCommands::RunQuick { verbose } => {
            print_header("QUICK SCENARIOS");
            ScenarioRunner::with_config(runner_config(*verbose)).run_quick()
        }
        TestCommands::RunTag { tag, verbose } => {
            print_header(&format!("SCENARIOS TAGGED '{}'", tag));
            ScenarioRunner::with_config(runner_config(*verbose)).run_by_tag(tag)
        }
        TestCommands::Run { scenarios, verbose } => {
            ScenarioRunner::with_config(runner_config(*verbose)).run_by_names(scenarios)
        }
        TestCommands::ListScenarios { tag } => {
            match tag {
                Some(tag) => {
                    for scenario in ScenarioLibrary::scenarios_by_tag(tag) {
                        println!("  {:<26} {}", scenario.name, scenario.description);
                    }
                }
                None => print_available_scenarios(),
            }
            return Ok(());
        }
        TestCommands::ListTags => {
            for tag in available_tags() {
                println!("  {}", tag);
            }
            return Ok(());
        }
    };

    if summary.failed > 0 {
        bail!("{} scenario(s) failed", summary.failed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_and_skip_override_config() {
        let base = CrossTransferConfig::default();
        let config = build_transfer_config(
            &base,
            &[CategoryArg::Contacts, CategoryArg::Photos, CategoryArg::Music],
            &[CategoryArg::Music],
            true,
        );
        assert_eq!(
            config.enabled_categories(),
            vec![Category::Contacts, Category::Photos]
        );
        assert!(!config.convert_heic);
        assert!(config.exclude_cache);
    }

    #[test]
    fn test_no_flags_keep_config() {
        let mut base = CrossTransferConfig::default();
        base.set_enabled(Category::Calendar, false);
        let config = build_transfer_config(&base, &[], &[], false);
        assert!(!config.is_enabled(Category::Calendar));
        assert!(config.convert_heic);
    }

    #[test]
    fn test_unknown_scenario_is_an_error() {
        assert!(find_scenario("nope").is_err());
        assert!(find_scenario("empty_source").is_ok());
    }
}
