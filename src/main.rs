//! Session Booking service
//!
//! REST API over the booking core. Reads configuration from a TOML file
//! (`BOOKING_CONFIG`, else ~/.config/session-booking/config.toml).

use std::sync::Arc;
use std::time::Duration;

use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use session_booking::config::AppConfig;
use session_booking::domain::{ProfileDirectory, RepositoryProvider};
use session_booking::infrastructure::database::migrator::Migrator;
use session_booking::infrastructure::OpenProfileDirectory;
use session_booking::interfaces::http::modules::health::HealthState;
use session_booking::interfaces::http::modules::metrics::describe_metrics;
use session_booking::interfaces::http::{AppState, AuthState};
use session_booking::shared::shutdown::ShutdownSignal;
use session_booking::{create_api_router, default_config_path, init_database, SeaOrmRepositoryProvider};

fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Load configuration ─────────────────────────────────────
    let config_path = std::env::var("BOOKING_CONFIG")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| default_config_path());
    let (app_cfg, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    init_tracing(&app_cfg);
    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => error!("Failed to load config: {}. Using defaults.", e),
    }

    info!("Starting session booking service...");

    // ── Prometheus metrics recorder (before any metrics calls) ──
    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    describe_metrics();

    // ── Database ───────────────────────────────────────────────
    info!("Database: {}", app_cfg.database.url);
    let db = match init_database(&app_cfg.database).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(e.into());
        }
    };

    if app_cfg.database.run_migrations {
        info!("Running database migrations...");
        if let Err(e) = Migrator::up(&db, None).await {
            error!("Failed to run migrations: {}", e);
            return Err(e.into());
        }
        info!("Migrations completed");
    }

    let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
    let profiles: Arc<dyn ProfileDirectory> = Arc::new(OpenProfileDirectory::new());
    let state = AppState::new(repos, profiles, &app_cfg.policy);

    let jwt_config = app_cfg.jwt();
    info!(
        "JWT configured with {}h token expiration",
        jwt_config.expiration_hours
    );

    let router = create_api_router(
        state,
        AuthState { jwt_config },
        HealthState::new(Some(db.clone())),
        Some(prometheus_handle),
    );

    // ── Shutdown ───────────────────────────────────────────────
    let shutdown = ShutdownSignal::new();
    shutdown.listen_for_os_signals();

    let addr = app_cfg.server.address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("REST API listening on http://{}", addr);
    info!("Swagger UI available at http://{}/docs/", addr);

    let server_shutdown = shutdown.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { server_shutdown.wait().await })
            .await
    });

    tokio::select! {
        result = &mut server => report_server_exit(result),
        _ = shutdown.wait() => {
            let grace = Duration::from_secs(app_cfg.server.shutdown_timeout);
            info!(grace_secs = grace.as_secs(), "Draining in-flight requests");
            match tokio::time::timeout(grace, &mut server).await {
                Ok(result) => report_server_exit(result),
                Err(_) => {
                    warn!("Shutdown timeout elapsed, aborting open connections");
                    server.abort();
                }
            }
        }
    }

    if let Err(e) = db.close().await {
        warn!("Error closing database connection: {}", e);
    } else {
        info!("Database connection closed");
    }

    info!("Session booking service shutdown complete");
    Ok(())
}

fn report_server_exit(result: Result<std::io::Result<()>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => info!("REST API server stopped"),
        Ok(Err(e)) => error!("REST API server error: {}", e),
        Err(e) => error!("REST API server task panicked: {}", e),
    }
}
