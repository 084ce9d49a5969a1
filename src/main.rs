use anyhow::{Context, Result};
use substep::cli::commands::{InterfaceCommand, LastRunCommand, NameCommand};
use substep::cli::output::*;
use substep::cli::{Cli, Command};
use substep::core::config::EnvironmentResolver;
use substep::{
    GitRepository, InterfaceDeclaration, LocalStorage, RunResolver, Settings, StepParams, Substep,
    VersionInfo,
};
use tracing::{error, warn, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    let settings = load_settings(&cli)?;

    match &cli.command {
        Command::Interface(cmd) => declare_interface(cmd, settings)?,
        Command::LastRun(cmd) => show_last_run(cmd, &settings)?,
        Command::Name(cmd) => show_name(cmd, &settings)?,
    }

    Ok(())
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.settings {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    settings
        .apply_env(|key| std::env::var(key).ok())
        .context("Invalid settings in environment")?;
    Ok(settings)
}

fn capture_version() -> VersionInfo {
    let cwd = std::env::current_dir().unwrap_or_else(|_| ".".into());
    match VersionInfo::capture(&GitRepository::new(cwd)) {
        Ok(version) => version,
        Err(e) => {
            warn!("Version control metadata unavailable: {}", e);
            VersionInfo::default()
        }
    }
}

fn declare_interface(cmd: &InterfaceCommand, settings: Settings) -> Result<()> {
    let params = StepParams::from_file(&cmd.params)
        .with_context(|| format!("Failed to load step params from {}", cmd.params.display()))?
        .with_env_name(settings.env_name.as_deref());
    let declaration = InterfaceDeclaration::from_file(&cmd.interface)
        .with_context(|| format!("Failed to load interface from {}", cmd.interface.display()))?;

    let mut substep = Substep::new(params, settings, capture_version())
        .context("Failed to start substep")?;

    let resolved = substep.interface(&declaration).map(|report| report.clone());
    let report = match resolved {
        Ok(report) => report,
        Err(e) => {
            println!("{} Interface resolution failed:", CROSS);
            println!("  {}", style(&e).red());
            error!("{}", e);
            substep.fail().context("Failed to record the failed run")?;
            std::process::exit(1);
        }
    };

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", format_report(&report));
    }

    if let Some(path) = substep.visualize()? {
        println!(
            "\n{} Design mode: visualizer report written to {}",
            INFO,
            style(path.display()).dim()
        );
        return Ok(());
    }

    if cmd.complete {
        substep.complete()?;
        println!(
            "\n{} Run {} recorded as {}",
            CHECK,
            style(substep.run_id()).bold(),
            format_run_result(substep.run_result())
        );
    }

    Ok(())
}

fn show_last_run(cmd: &LastRunCommand, settings: &Settings) -> Result<()> {
    let address = cmd
        .entity
        .address(settings.env_name.as_deref())
        .context("Invalid entity address")?;
    let storage = LocalStorage::new();
    let resolver = RunResolver::new(&storage, settings.design_mode);

    let step_path = address.step_path(&settings.env_path(&address.env_name));
    match resolver.last_run_id(&step_path, &address.entity_name) {
        Ok(run_id) => {
            println!("{}", run_id);
            Ok(())
        }
        Err(e) => {
            println!("{} {}", WARN, style(&e).yellow());
            std::process::exit(1);
        }
    }
}

fn show_name(cmd: &NameCommand, settings: &Settings) -> Result<()> {
    let address = cmd
        .entity
        .address(settings.env_name.as_deref())
        .context("Invalid entity address")?;
    let env_path = settings.env_path(&address.env_name);

    let run_id = match &cmd.run_id {
        Some(run_id) => run_id.clone(),
        None => {
            let storage = LocalStorage::new();
            RunResolver::new(&storage, settings.design_mode)
                .last_run_id(&address.step_path(&env_path), &address.entity_name)
                .context("Failed to resolve the last run")?
        }
    };
    let full_name = address.full_name();
    let url = address.url(&env_path, &run_id);

    if cmd.json {
        let data = serde_json::json!({
            "full_name": full_name,
            "url": url,
            "run_id": run_id,
        });
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        println!("{} {}", INFO, style(&full_name).bold());
        println!("  {}", style(&url).dim());
    }

    Ok(())
}
