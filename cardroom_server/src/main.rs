//! Multi-table no-limit hold'em server.
//!
//! Tables run as actor tasks inside the `cardroom` library; this binary
//! wires them to PostgreSQL, JWT authentication, and the HTTP/WebSocket
//! gateways.

mod api;
mod config;
mod logging;
mod metrics;

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use cardroom::auth::AuthManager;
use cardroom::clock::SystemClock;
use cardroom::db::{Database, PgStore};
use cardroom::table::config::TableConfig;
use cardroom::table::manager::TableManager;
use pico_args::Arguments;
use tracing::{error, info};

const HELP: &str = "\
Run a multi-table no-limit hold'em server

USAGE:
  cardroom_server [OPTIONS]

OPTIONS:
  --bind     IP:PORT   Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:7080]
  --db-url   URL       Database connection string  [default: env DATABASE_URL]
  --tables   N         Number of tables to create  [default: env NUM_TABLES or 1]

FLAGS:
  -h, --help           Print help information

ENVIRONMENT:
  SERVER_BIND          Server bind address (e.g. 0.0.0.0:7080)
  METRICS_BIND         Optional Prometheus exporter address
  DATABASE_URL         PostgreSQL connection string
  JWT_SECRET           JWT signing secret (required)
  PASSWORD_PEPPER      Password hashing pepper (required)
  TABLE_*              Default table stakes and limits
";

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return ExitCode::SUCCESS;
    }

    let bind_override: Option<SocketAddr> = pargs.opt_value_from_str("--bind").unwrap_or(None);
    let db_url_override: Option<String> = pargs.opt_value_from_str("--db-url").unwrap_or(None);
    let tables_override: Option<usize> = pargs.opt_value_from_str("--tables").unwrap_or(None);

    logging::init();

    // Configuration problems are fatal and use exit code 1.
    let config = match config::ServerConfig::from_env(bind_override, db_url_override, tables_override)
    {
        Ok(config) => config,
        Err(err) => {
            error!("fatal configuration error: {err}");
            return ExitCode::FAILURE;
        }
    };

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("server error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn run(config: config::ServerConfig) -> anyhow::Result<()> {
    ctrlc::set_handler(|| std::process::exit(0)).context("installing signal handler")?;

    if let Some(metrics_bind) = config.metrics_bind {
        metrics::init(metrics_bind).map_err(anyhow::Error::msg)?;
        info!("metrics exporter on {metrics_bind}");
    }

    info!("connecting to database");
    let db = Database::connect(&config.database)
        .await
        .context("connecting to database")?;
    db.health_check().await.context("database health check")?;
    let store = Arc::new(PgStore::new(db.pool().clone()));

    let clock = Arc::new(SystemClock);
    let auth = Arc::new(AuthManager::new(
        config.security.jwt_secret.clone(),
        config.security.password_pepper.clone(),
    ));
    let manager = Arc::new(TableManager::new(store.clone(), clock.clone()));

    let defaults = &config.table_defaults;
    for i in 0..config.num_tables {
        let table_config = TableConfig {
            name: format!("Table {}", i + 1),
            max_seats: defaults.max_seats,
            small_blind: defaults.small_blind,
            big_blind: defaults.big_blind,
            min_buy_in: defaults.min_buy_in,
            max_buy_in: defaults.max_buy_in,
        };
        match manager.create_table(table_config).await {
            Ok(table_id) => info!("created table {table_id}"),
            Err(err) => error!("failed to create table {}: {err}", i + 1),
        }
    }
    info!("{} table(s) running", manager.active_count().await);

    let state = api::AppState {
        auth,
        manager,
        store,
        clock,
        starting_bankroll: defaults.starting_bankroll,
    };
    let app = api::create_router(state);

    info!("listening on http://{}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;

    info!("shutting down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C handler");
}
