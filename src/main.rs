//! GamePulse - gaming community platform backend
//!
//! Architecture:
//! - Axum for the HTTP API with rate limiting
//! - SeaORM over SQLite for the local persisted fallback store
//! - Reqwest for the remote document store and the AI gateway
//! - Tokio for async runtime

mod ai;
mod catalog;
mod chat;
mod config;
mod entities;
mod error;
mod model;
mod plugins;
mod prelude;
mod roles;
mod session;
mod state;
mod storage;
mod sv;

use std::sync::Arc;

use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{config::Config, prelude::*, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "gamepulse=debug,tower_http=debug,axum=trace,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = Config::from_env();
  info!("Starting GamePulse server v{}", env!("CARGO_PKG_VERSION"));

  let storage = storage::connect(&config).await?;
  let state = Arc::new(AppState::new(storage, config)?);

  plugins::App::new()
    .register(plugins::server::Plugin)
    .register(plugins::sync::Plugin)
    .run(state)
    .await;

  tokio::signal::ctrl_c().await?;
  info!("Shutting down");

  Ok(())
}
