//! Agnosis API server
//!
//! Graph-backed JSON API for sharing ideas and recording reactions to them.

use clap::{Arg, Command};

use agnosis::api::{start_server, AppState};
use agnosis::core::Config;
use agnosis::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let matches = Command::new("agnosis-server")
        .version(agnosis::VERSION)
        .about("Graph-backed JSON API for sharing ideas.")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("http-addr")
                .long("http-addr")
                .value_name("ADDR")
                .help("HTTP server bind address"),
        )
        .arg(
            Arg::new("jwt-secret")
                .long("jwt-secret")
                .value_name("SECRET")
                .help("HS256 signing secret for session tokens"),
        )
        .arg(
            Arg::new("token-ttl")
                .long("token-ttl")
                .value_name("DURATION")
                .help("Session token lifetime (e.g. 30s, 15m, 24h)"),
        )
        .arg(
            Arg::new("bcrypt-cost")
                .long("bcrypt-cost")
                .value_name("N")
                .help("bcrypt work factor for password hashing"),
        )
        .arg(
            Arg::new("enable-prometheus")
                .long("enable-prometheus")
                .value_name("BOOL")
                .help("Serve Prometheus metrics at /metrics (true or false)"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)"),
        )
        .get_matches();

    // Load configuration; env vars sit above the file, CLI flags above both
    let mut config = if let Some(config_path) = matches.get_one::<String>("config") {
        let mut config = Config::from_file(config_path)?;
        config.apply_env_overrides()?;
        config
    } else {
        Config::load()?
    };

    // Apply CLI overrides, then validate the merged configuration
    apply_cli_overrides(&mut config, &matches)?;
    config.validate()?;

    // Initialize logging and metrics
    agnosis::init(&config.logging)?;

    tracing::info!("Starting Agnosis v{}", agnosis::VERSION);

    // Initialize storage
    let storage = agnosis::storage::create_shared_storage(&config.storage)?;
    tracing::info!("Storage initialized: {:?}", config.storage.storage_type);

    let state = AppState::new(&config, storage)?;

    // Runs until Ctrl+C or SIGTERM
    start_server(config.server.http_addr, state).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Apply command line argument overrides to configuration
fn apply_cli_overrides(config: &mut Config, matches: &clap::ArgMatches) -> Result<()> {
    if let Some(addr) = matches.get_one::<String>("http-addr") {
        config.server.http_addr = addr
            .parse()
            .map_err(|e| agnosis::Error::config(format!("Invalid HTTP address: {}", e)))?;
    }

    if let Some(secret) = matches.get_one::<String>("jwt-secret") {
        config.auth.jwt_secret = secret.clone();
    }

    if let Some(ttl) = matches.get_one::<String>("token-ttl") {
        config.auth.token_ttl = ttl.clone();
    }

    if let Some(cost) = matches.get_one::<String>("bcrypt-cost") {
        config.auth.bcrypt_cost = cost
            .parse()
            .map_err(|e| agnosis::Error::config(format!("Invalid bcrypt cost: {}", e)))?;
    }

    if let Some(enabled) = matches.get_one::<String>("enable-prometheus") {
        config.metrics.enable_prometheus = enabled
            .parse()
            .map_err(|_| agnosis::Error::config("Invalid --enable-prometheus (expected true or false)"))?;
    }

    if let Some(level) = matches.get_one::<String>("log-level") {
        config.logging.level = level.clone();
    }

    Ok(())
}
