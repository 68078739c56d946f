use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use api_ingress::{ApiIngress, ApiIngressConfig};
use listings::{Listings, ListingsConfig};
use runtime::{AppConfig, CliArgs};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Roost Server - listings marketplace backend
#[derive(Parser)]
#[command(name = "roost-server")]
#[command(about = "Roost Server - listings marketplace backend")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        port: cli.port,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let logging_config = config
        .logging
        .clone()
        .unwrap_or_else(runtime::config::default_logging_config);
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Roost Server starting");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(config),
    }
}

/// Module sections are parsed up front so a typo fails before anything binds.
fn module_configs(config: &AppConfig) -> Result<(ApiIngressConfig, ListingsConfig)> {
    let ingress = config
        .module_config::<ApiIngressConfig>("api_ingress")?
        .with_default_bind(&config.server.host, config.server.port);
    let listings = config.module_config::<ListingsConfig>("listings")?;
    Ok((ingress, listings))
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Initializing modules...");
    let (ingress_cfg, listings_cfg) = module_configs(&config)?;

    let db_config = config.database.clone().unwrap_or_default();
    let base_dir = PathBuf::from(&config.server.home_dir);
    let dsn = runtime::db::resolve_dsn(&db_config, &base_dir, args.mock)?;
    let db = runtime::db::connect(&dsn, &db_config).await?;

    Listings::migrate(&db).await?;
    let listings = Listings::init(&listings_cfg, db).context("initializing listings module")?;

    let ingress = Arc::new(ApiIngress::new(ingress_cfg));
    ingress.register_routes("listings", listings.router());

    let cancel = CancellationToken::new();
    let signals = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = runtime::shutdown::wait_for_shutdown().await {
                tracing::error!(error = %e, "Signal handling failed, shutting down");
            }
            tracing::info!("Shutdown signal received");
            cancel.cancel();
        })
    };

    let served = ingress.serve(cancel, None).await;
    signals.abort();
    served?;

    tracing::info!("Roost Server stopped");
    Ok(())
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    let (ingress_cfg, listings_cfg) = module_configs(&config)?;
    if let Some(db) = &config.database {
        runtime::db::detect_backend(&db.url)?;
    }
    if listings_cfg.jwt_secret.trim().is_empty() {
        anyhow::bail!("modules.listings.jwt_secret must be set");
    }

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("Listening address: {}", ingress_cfg.bind_addr);
    println!("{}", config.to_yaml()?);
    Ok(())
}
