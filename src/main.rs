#![warn(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::single_match_else)]

use crate::{
    config::RuntimeConfiguration,
    routes::{index::get_index, lookup::post_lookup, register::post_register},
    state::GradRegState,
    store::{RecordStore, postgres::PostgresRecordStore},
};
use axum::{
    Router,
    routing::{get, post},
};
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tokio::{net::TcpListener, signal};
use tower_http::{
    compression::CompressionLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[macro_use]
extern crate tracing;

mod config;
mod data;
mod error;
mod maud_conveniences;
mod registration;
mod routes;
mod state;
mod store;

//the forms are two short text fields
const MAX_BODY_BYTES: usize = 16 * 1024;

pub fn app<S: RecordStore + 'static>(state: GradRegState<S>) -> Router {
    Router::new()
        .route("/", get(get_index::<S>))
        .route("/lookup", post(post_lookup::<S>))
        .route("/register", post(post_register::<S>))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal(store: PostgresRecordStore) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    warn!("signal received, starting graceful shutdown");
    store.close().await;
}

#[tokio::main]
async fn main() {
    let dotenv_result = dotenvy::dotenv();

    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish(),
    )
    .expect("unable to set tracing subscriber");

    info!("`tracing` online");
    if let Err(e) = dotenv_result {
        //fine when the env vars are set directly
        warn!(?e, "unable to load .env file");
    }

    let config = RuntimeConfiguration::new().expect("unable to create config");
    let app_config = config.app_config();

    let options = PgPoolOptions::new()
        .max_connections(app_config.max_db_connections)
        .acquire_timeout(Duration::from_secs(5));
    let store = PostgresRecordStore::new(
        options,
        &config.db_config().get_db_path(),
        app_config.transaction_attempts,
    )
    .await
    .expect("unable to open record store");

    info!(
        channel_tag = %app_config.channel_tag,
        transaction_attempts = app_config.transaction_attempts,
        "Record store online"
    );

    let state = GradRegState::new(store.clone(), app_config.clone());

    let listener = TcpListener::bind(&app_config.server_ip)
        .await
        .expect("unable to listen on server ip");

    info!(server_ip = ?app_config.server_ip, "Listening");
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal(store))
        .await
        .expect("unable to serve app");
}
