//! College attendance server.
//!
//! Serves registration, approval, OTP issuance, and attendance marking
//! over HTTP, backed by PostgreSQL.

mod api;
mod config;
mod logging;

use std::sync::Arc;

use anyhow::Error;
use config::ServerConfig;
use ctrlc::set_handler;
use log::info;
use pico_args::Arguments;
use rollcall::{
    AttendanceValidator, OtpIssuer, RegistryManager, Reporter, SubjectCatalog,
    db::{Database, PgAttendanceRepository, PgOtpRepository, PgPeopleRepository},
    marking::MarkingPolicy,
    notify::LogNotifier,
};

const HELP: &str = "\
Run a college attendance server

USAGE:
  rollcall_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8000]
  --db-url     URL         Database connection string  [default: env DATABASE_URL or postgres://postgres@localhost/rollcall_db]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8000)
  DATABASE_URL             PostgreSQL connection string
  ADMIN_ID                 Administrator login ID (required)
  ADMIN_PASSWORD           Administrator password (required)
  (See .env.example for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind_override = pargs.opt_value_from_str("--bind")?;
    let db_url_override = pargs.opt_value_from_str("--db-url")?;

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    logging::init();

    let config = ServerConfig::from_env(bind_override, db_url_override)?;
    config.validate()?;

    info!("Starting attendance server at {}", config.bind);

    let db = Database::new(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;

    info!("Database connected successfully");

    let pool = db.pool().clone();

    let people = Arc::new(PgPeopleRepository::new(pool.clone()));
    let otps = Arc::new(PgOtpRepository::new(pool.clone()));
    let attendance = Arc::new(PgAttendanceRepository::new(pool.clone()));
    let catalog = SubjectCatalog::default_catalog();

    let policy = MarkingPolicy {
        require_location: config.policy.require_location,
        geofence_radius_m: config.policy.geofence_radius_m,
        device_cooldown_minutes: config.policy.device_cooldown_minutes,
    };

    let registry = Arc::new(RegistryManager::new(people.clone(), Arc::new(LogNotifier)));
    let issuer = Arc::new(
        OtpIssuer::new(people.clone(), otps.clone(), catalog.clone())
            .with_code_length(config.policy.otp_code_length),
    );
    let validator = Arc::new(AttendanceValidator::new(
        people.clone(),
        otps.clone(),
        attendance.clone(),
        catalog.clone(),
        policy,
    ));
    let reporter = Arc::new(Reporter::new(people, otps, attendance, catalog.clone()));

    let api_state = api::AppState {
        registry,
        issuer,
        validator,
        reporter,
        admin: Arc::new(config.admin.clone()),
        catalog,
        pool: Arc::new(pool),
    };

    let app = api::create_router(api_state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
}
