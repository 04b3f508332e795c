// # ddnsd - DDNS Daemon
//
// Thin integration layer around ddns-core. All reconciliation logic lives in
// the library; the daemon only:
// 1. Reads its environment and the YAML configuration file
// 2. Initializes logging and the runtime
// 3. Builds the HTTP IP source and the Route 53 provider
// 4. Runs the DDNS engine until SIGTERM/SIGINT
//
// ## Environment
//
// - `DDNS_CONFIG`: Path to the YAML configuration (default `/etc/ddns/config.yaml`)
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn or error (default `info`)
//
// ## Example
//
// ```bash
// export DDNS_CONFIG=/etc/ddns/config.yaml
// export DDNS_LOG_LEVEL=debug
//
// ddnsd
// ```

use anyhow::{Context, Result};
use ddns_core::{DdnsConfig, DdnsEngine, EngineEvent};
use ddns_ip_http::HttpIpSource;
use ddns_provider_route53::Route53Provider;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::{mpsc, oneshot};
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Configuration file used when `DDNS_CONFIG` is unset
const DEFAULT_CONFIG_PATH: &str = "/etc/ddns/config.yaml";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Process-level settings, read from the environment
struct Settings {
    config_path: PathBuf,
    log_level: Level,
}

impl Settings {
    /// Load settings from environment variables
    fn from_env() -> Result<Self> {
        let config_path = env::var_os("DDNS_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        let log_level = env::var("DDNS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            config_path,
            log_level: parse_log_level(&log_level)?,
        })
    }
}

fn parse_log_level(value: &str) -> Result<Level> {
    match value.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "DDNS_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            value
        ),
    }
}

fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(settings.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting ddnsd daemon");

    let config = match DdnsConfig::from_file(&settings.config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    info!(
        "Configuration loaded from {}: {} zone(s), cycle every {}s",
        settings.config_path.display(),
        config.aws.zones.len(),
        config.check_every_seconds
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        let (engine, event_rx) = match build_engine(config).await {
            Ok(parts) => parts,
            Err(e) => {
                error!("Startup error: {:#}", e);
                return DdnsExitCode::ConfigError;
            }
        };

        match run_daemon(engine, event_rx).await {
            Ok(()) => DdnsExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {:#}", e);
                DdnsExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Build the IP source, the provider and the engine
async fn build_engine(config: DdnsConfig) -> Result<(DdnsEngine, mpsc::Receiver<EngineEvent>)> {
    let ip_source = HttpIpSource::from_config(&config.ip_source);

    let provider = Route53Provider::from_config(&config.aws)
        .await
        .context("unable to initialise the Route 53 client")?;

    for zone in &config.aws.zones {
        info!("Managing zone {}: {}", zone.id, zone.records.join(", "));
    }

    let parts = DdnsEngine::new(Box::new(ip_source), Box::new(provider), config)?;
    Ok(parts)
}

/// Run the engine until a shutdown signal arrives
async fn run_daemon(engine: DdnsEngine, mut event_rx: mpsc::Receiver<EngineEvent>) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let signals = tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => info!("Received shutdown signal: {}", signal),
            Err(e) => error!("Signal handling failed, shutting down: {}", e),
        }
        // The engine may already be gone
        let _ = shutdown_tx.send(());
    });

    let events = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!("Engine event: {:?}", event);
        }
    });

    let result = engine.run_until(shutdown_rx).await;

    signals.abort();
    drop(engine);
    // Ends once the engine's sender is dropped
    let _ = events.await;

    info!("Shutting down daemon");
    result.context("engine stopped with an error")
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };

    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
