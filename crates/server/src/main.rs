use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use medverify_pipeline::{AnalysisPipeline, PipelineMetrics};
use medverify_server::api::AppState;
use medverify_server::auth::JwtVerifier;
use medverify_server::config::MedverifyConfig;
use medverify_server::error::ServerError;
use medverify_server::{engine_factory, images_factory, records_factory};

/// Medicine packaging verification HTTP server.
#[derive(Parser, Debug)]
#[command(name = "medverify-server", about = "HTTP server for medicine packaging verification")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "medverify.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run record store migrations for the configured backend, then exit.
    Migrate,
    /// Print a development bearer token signed with the configured secret.
    Token {
        /// User id to put in the `sub` claim.
        #[arg(long)]
        user: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config: MedverifyConfig = if Path::new(&cli.config).exists() {
        let contents = std::fs::read_to_string(&cli.config)?;
        toml::from_str(&contents)?
    } else {
        toml::from_str("")?
    };

    match cli.command {
        Some(Commands::Migrate) => {
            init_basic_tracing();
            return run_migrate(&config).await;
        }
        Some(Commands::Token { user }) => return run_token(&config, &user),
        None => {}
    }

    let telemetry_guard = medverify_server::telemetry::init(&config.telemetry);

    if !Path::new(&cli.config).exists() {
        info!(path = %cli.config, "config file not found, using defaults");
    }

    let mut server_config = config.server;
    if let Some(host) = cli.host {
        server_config.host = host;
    }
    if let Some(port) = cli.port {
        server_config.port = port;
    }

    let images = images_factory::create_image_store(&config.images, &server_config).await?;
    info!(backend = %config.images.backend, "image store initialized");

    let records = records_factory::create_record_store(&config.records).await?;
    info!(backend = %config.records.backend, "record store initialized");

    let engine = engine_factory::create_engine(&config.engine, &server_config, &images)?;
    info!(strategy = engine.name(), "verdict engine initialized");

    let auth = if config.auth.enabled {
        let verifier = JwtVerifier::from_config(&config.auth).map_err(ServerError::Config)?;
        info!(?verifier, "bearer token auth enabled");
        Some(Arc::new(verifier))
    } else {
        warn!("auth disabled, callers are identified by userId / x-user-id");
        None
    };

    let metrics = Arc::new(PipelineMetrics::default());
    let pipeline = AnalysisPipeline::builder()
        .images(images)
        .records(records)
        .engine(engine)
        .metrics(Arc::clone(&metrics))
        .build()?;

    let state = AppState::new(Arc::new(pipeline), auth, server_config.max_upload_bytes);
    let app = medverify_server::api::router(state);

    let addr = format!("{}:{}", server_config.host, server_config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, external_url = %server_config.external_url(), "medverify-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let shutdown_timeout = Duration::from_secs(server_config.shutdown_timeout_seconds);
    if tokio::time::timeout(shutdown_timeout, drain(&metrics))
        .await
        .is_err()
    {
        warn!(
            timeout_secs = server_config.shutdown_timeout_seconds,
            in_flight = metrics.snapshot().in_flight(),
            "shutdown timeout exceeded, abandoning in-flight analyses"
        );
    }

    info!("server stopped");
    telemetry_guard.shutdown();
    Ok(())
}

/// Wait until every started instance has reached a terminal state.
async fn drain(metrics: &PipelineMetrics) {
    let pending = metrics.snapshot().in_flight();
    if pending > 0 {
        info!(in_flight = pending, "waiting for in-flight analyses...");
    }
    while metrics.snapshot().in_flight() > 0 {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

fn init_basic_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Run the `migrate` subcommand. Store construction applies migrations.
async fn run_migrate(config: &MedverifyConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(backend = %config.records.backend, "running record store migrations...");
    let _records = records_factory::create_record_store(&config.records).await?;
    info!(backend = %config.records.backend, "record store migrations complete");
    Ok(())
}

/// Run the `token` subcommand: print a signed token to stdout.
fn run_token(config: &MedverifyConfig, user: &str) -> Result<(), Box<dyn std::error::Error>> {
    let verifier = JwtVerifier::from_config(&config.auth).map_err(ServerError::Config)?;
    let token = verifier
        .issue(user, config.auth.token_ttl_seconds)
        .map_err(ServerError::Config)?;
    println!("{token}");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
