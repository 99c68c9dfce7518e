use clap::Parser;
use ssh_key_manager::cli::info::print_info;
use ssh_key_manager::cli::{Cli, Commands};
use ssh_key_manager::commands::completion::cmd_generate_completion;
use ssh_key_manager::commands::config::cmd_init_config;
use ssh_key_manager::commands::deploy::cmd_deploy;
use ssh_key_manager::commands::describe_error;
use ssh_key_manager::commands::key::{cmd_create, cmd_delete, cmd_delete_all};
use ssh_key_manager::commands::list::cmd_list;
use ssh_key_manager::commands::show::{cmd_show_config, cmd_show_registry};
use ssh_key_manager::commands::verify::cmd_verify_integrity;
use ssh_key_manager::config::{apply_env_overrides, default_config_path, LogLevel, Settings, SettingsManager};
use ssh_key_manager::error::SyncError;
use ssh_key_manager::sync::SyncEngine;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        match e.downcast_ref::<SyncError>() {
            Some(sync_err) => eprintln!("{}", describe_error(sync_err)),
            None => eprintln!("❌ {}", e),
        }
        std::process::exit(1);
    }

    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };

    // init-config 不读取现有配置，避免坏文件挡住覆盖
    if let Commands::InitConfig { force } = cli.command {
        init_logging(cli.verbose, LogLevel::default());
        return cmd_init_config(&config_path, force);
    }

    let settings = load_settings(&config_path, cli.base_dir.clone())?;
    init_logging(cli.verbose, settings.log_level);
    tracing::debug!(config = %config_path.display(), base_dir = %settings.base_dir.display(), "Settings resolved");

    match cli.command {
        Commands::Info => {
            print_info(config_path, &settings);
            return Ok(());
        }
        Commands::Completion { shell } => return cmd_generate_completion(shell),
        _ => {}
    }

    let mut engine = SyncEngine::from_settings(&settings)?;

    match cli.command {
        Commands::Create { email, host, alias } => cmd_create(&mut engine, email, host, alias)?,
        Commands::Delete { alias } => cmd_delete(&mut engine, &alias)?,
        Commands::DeleteAll { yes } => cmd_delete_all(&mut engine, yes)?,
        Commands::List { fingerprints } => cmd_list(&mut engine, fingerprints)?,
        Commands::Deploy { alias } => cmd_deploy(&mut engine, &alias)?,
        Commands::ShowConfig => cmd_show_config(&engine)?,
        Commands::ShowRegistry => cmd_show_registry(&mut engine)?,
        Commands::Verify { repair, yes } => cmd_verify_integrity(&mut engine, repair, yes)?,
        Commands::InitConfig { .. } | Commands::Info | Commands::Completion { .. } => {}
    }

    Ok(())
}

/// 配置文件 → 环境变量 → 命令行参数，后者覆盖前者
fn load_settings(config_path: &std::path::Path, base_dir: Option<PathBuf>) -> Result<Settings, Box<dyn std::error::Error>> {
    let manager = SettingsManager::new_with_path(config_path.to_path_buf())?;
    let mut settings = manager.settings().clone();

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    if let Some(dir) = base_dir {
        settings.base_dir = dir;
    }

    settings.validate()?;
    Ok(settings)
}

/// RUST_LOG 优先，其次 --verbose，最后是配置中的 log_level
fn init_logging(verbose: bool, level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directive = if verbose { "debug" } else { level.as_filter() };
        EnvFilter::new(directive)
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
