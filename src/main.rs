use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fieldops::config::{AppConfig, StoreBackend};
use fieldops::numbering::NumberGenerator;
use fieldops::store::{DocumentStore, MemoryStore, PgStore};
use fieldops::{AppState, FieldService, build_router, seed};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "fieldops")]
#[command(about = "Field-service management backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve {
        /// Bind address, overrides APP_HOST
        #[arg(long)]
        host: Option<String>,

        /// Bind port, overrides APP_PORT
        #[arg(short, long)]
        port: Option<u16>,

        /// Storage backend, overrides STORE_BACKEND
        #[arg(long, value_enum)]
        backend: Option<StoreBackend>,
    },
    /// Apply PostgreSQL migrations and exit
    Migrate,
    /// Insert demo records
    Seed,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env().context("failed to load application configuration")?;

    match cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
        backend: None,
    }) {
        Command::Serve {
            host,
            port,
            backend,
        } => {
            if let Some(host) = host {
                config = config.with_host(host);
            }
            if let Some(port) = port {
                config = config.with_port(port);
            }
            if let Some(backend) = backend {
                config = config.with_store_backend(backend);
            }
            serve(config).await
        }
        Command::Migrate => {
            let store = PgStore::connect(&config.database_url, config.db_max_connections)
                .await
                .context("failed to connect to PostgreSQL")?;
            store.init().await.context("failed to run migrations")?;
            info!("migrations applied");
            Ok(())
        }
        Command::Seed => {
            if config.store_backend == StoreBackend::Memory {
                warn!("seeding the memory store; data is discarded on exit");
            }
            let service = build_service(&config).await?;
            let summary = seed::seed(&service)
                .await
                .context("failed to seed demo data")?;
            info!(?summary, "seed complete");
            Ok(())
        }
    }
}

async fn build_service(config: &AppConfig) -> Result<FieldService> {
    match config.store_backend {
        StoreBackend::Postgres => {
            info!("store backend: postgres");
            let store = PgStore::connect(&config.database_url, config.db_max_connections)
                .await
                .context("failed to connect to PostgreSQL")?;
            assemble(Arc::new(store), config).await
        }
        StoreBackend::Memory => {
            info!("store backend: memory");
            assemble(Arc::new(MemoryStore::new()), config).await
        }
    }
}

async fn assemble<S>(store: Arc<S>, config: &AppConfig) -> Result<FieldService>
where
    S: DocumentStore + 'static,
{
    store
        .init()
        .await
        .context("failed to initialize document store")?;

    let numbers = NumberGenerator::new(store.clone(), config.numbering);
    Ok(FieldService::new(store, numbers).with_reference_attempts(config.reference_attempts))
}

async fn serve(config: AppConfig) -> Result<()> {
    let service = build_service(&config).await?;
    let app = build_router(AppState::new(service));

    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(address = %addr, "fieldops started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fieldops=debug,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "unable to install Ctrl+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "unable to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
