use pulse_common::model::stats::StatsAccumulation;
use pulse_db::client::DbClient;
use serde::Deserialize;
use server::{ServerState, StatsSettings};
use sqlx::{migrate::MigrateError, postgres::PgPoolOptions};
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod server;

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error("Error connecting to the database: {0}")]
    DatabaseConnect(sqlx::Error),
    #[error("Error migrating the database: {0}")]
    Migrate(#[from] MigrateError),
    #[error("Error binding tcp listener: {0}")]
    TcpBind(std::io::Error),
    #[error("Error serving server: {0}")]
    TcpServe(std::io::Error),
}

fn default_database_max_connections() -> u32 {
    10
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct Env {
    server_address: IpAddr,
    server_port: u16,
    database_url: String,
    #[serde(default = "default_database_max_connections")]
    database_max_connections: u32,
    #[serde(default)]
    stats_accumulation: StatsAccumulation,
    /// Answer the stats endpoint with `201 Created` like earlier deployments.
    #[serde(default)]
    stats_legacy_status: bool,
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "pulse_api=debug,pulse_db=debug,\
                tower_http=debug,axum::rejection=trace,sqlx=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn get_env() -> Result<Env, InitError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .dotenv file found");
        } else {
            return Err(e.into());
        }
    }

    envy::from_env().map_err(InitError::from)
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(%err, "Could not listen for shutdown signal");
            return;
        }
        info!("Shutdown signal received");
        cancel.cancel();
    });

    token
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let env = get_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(env.database_max_connections)
        .connect(&env.database_url)
        .await
        .map_err(InitError::DatabaseConnect)?;
    pulse_db::MIGRATOR.run(&pool).await?;

    let state = ServerState {
        db_client: Arc::new(DbClient::new(pool)),
        stats: StatsSettings {
            accumulation: env.stats_accumulation,
            legacy_status: env.stats_legacy_status,
        },
    };
    let app = server::routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let server_address = SocketAddr::new(env.server_address, env.server_port);
    let listener = tokio::net::TcpListener::bind(server_address)
        .await
        .map_err(InitError::TcpBind)?;
    info!(%server_address, accumulation = ?env.stats_accumulation, "Listening");

    let shutdown = cancel_on_ctrl_c();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(InitError::TcpServe)?;

    Ok(())
}
