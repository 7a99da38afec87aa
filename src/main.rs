use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use voicserve::cli::{Cli, Commands};
use voicserve::config::Config;
use voicserve::diagnostics::check_installation;
use voicserve::engine::scratch::ensure_dir;
use voicserve::models::catalog::list_models;
use voicserve::server::{self, AppState};
use voicserve::{SystemCommandRunner, version_string};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_filter());

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        None => run_server(config, None, None).await?,
        Some(Commands::Serve { host, port }) => run_server(config, host, port).await?,
        Some(Commands::Models) => print_models(&config),
        Some(Commands::Check) => {
            if !check_installation(&config) {
                std::process::exit(1);
            }
        }
        Some(Commands::Transcribe { file, model }) => transcribe(config, &file, model).await?,
    }

    Ok(())
}

/// Install the tracing subscriber; `RUST_LOG` takes precedence over CLI flags.
fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    // A subscriber may already be installed (e.g. by a test harness).
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: logging was already initialized");
    }
}

fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?
    } else if let Some(default_path) = Config::default_path() {
        Config::load_or_default(&default_path)
            .with_context(|| format!("Failed to load config from {}", default_path.display()))?
    } else {
        Config::default()
    };

    let config = config.with_env_overrides();
    config.validate()?;
    tracing::debug!(config = %config.to_toml()?, "effective configuration");
    Ok(config)
}

async fn run_server(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    ensure_dir(&config.storage.scratch_dir)?;
    tracing::info!(version = %version_string(), "starting voicserve");

    let state = AppState::new(config, Arc::new(SystemCommandRunner::new()));
    server::serve(state).await
}

fn print_models(config: &Config) {
    let dir = config.engine.model_dir();
    let models = list_models(&dir);

    if models.is_empty() {
        println!("No models found in {}", dir.display());
        return;
    }

    println!("Models in {}:", dir.display());
    for (name, path) in &models {
        let default = &config.engine.default_model;
        let is_default = name == default
            || path.file_name().and_then(|n| n.to_str()) == Some(default.as_str());
        let marker = if is_default { " (default)" } else { "" };
        println!("  {:<12} {}{}", name, path.display(), marker);
    }
}

async fn transcribe(config: Config, file: &Path, model: Option<String>) -> Result<()> {
    ensure_dir(&config.storage.scratch_dir)?;
    let audio = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let model = model.unwrap_or_else(|| config.engine.default_model.clone());
    let state = AppState::new(config, Arc::new(SystemCommandRunner::new()));
    let response = state.recognizer.recognize(&audio, &model).await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
