mod handlers;

use std::{net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use axum::{
  Router,
  routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

use crate::{prelude::*, state::AppState};

pub struct Plugin;

#[async_trait]
impl super::Plugin for Plugin {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let governor_conf = Arc::new(
      GovernorConfigBuilder::default()
        .per_second(2)
        .burst_size(100)
        .finish()
        .context("Failed to build rate limiter config")?,
    );

    let limiter = governor_conf.limiter().clone();

    let router = Router::new()
      .route("/health", get(handlers::health))
      .route("/api/roles", get(handlers::list_roles))
      .route("/api/users", get(handlers::list_users))
      .route("/api/users", post(handlers::register))
      .route("/api/users/login", post(handlers::login))
      .route("/api/users/logout", post(handlers::logout))
      .route("/api/users/{id}/role", put(handlers::update_role))
      .route("/api/games", get(handlers::list_games))
      .route("/api/games", post(handlers::add_game))
      .route("/api/games/search", get(handlers::search_games))
      .route("/api/games/suggestions", get(handlers::game_suggestions))
      .route("/api/games/random", get(handlers::random_backlog))
      .route("/api/games/{id}", delete(handlers::remove_game))
      .route("/api/games/{id}/sessions", post(handlers::log_session))
      .route("/api/games/{id}/status", put(handlers::update_status))
      .route("/api/catalog", get(handlers::list_catalog))
      .route("/api/catalog", post(handlers::add_catalog_game))
      .route("/api/catalog/featured", get(handlers::featured_games))
      .route("/api/posts", get(handlers::list_posts))
      .route("/api/posts", post(handlers::create_post))
      .route("/api/posts/{id}", delete(handlers::delete_post))
      .route("/api/stats/platform", get(handlers::platform_stats))
      .route("/api/stats/community", get(handlers::community_stats))
      .route("/api/stats/gaming", get(handlers::gaming_stats))
      .route("/api/chat", get(handlers::chat_history))
      .route("/api/chat", post(handlers::chat))
      .route("/api/chat/actions", get(handlers::chat_actions))
      .route("/api/chat/tools", post(handlers::chat_tool))
      .layer(
        ServiceBuilder::new()
          .layer(TraceLayer::new_for_http())
          .layer(GovernorLayer::new(governor_conf))
          .layer(
            CorsLayer::new()
              .allow_origin(Any)
              .allow_methods(Any)
              .allow_headers(Any),
          ),
      )
      .with_state(app.clone())
      .into_make_service_with_connect_info::<SocketAddr>();

    let addr = SocketAddr::from(([0, 0, 0, 0], app.config.port));

    let listener = tokio::net::TcpListener::bind(addr)
      .await
      .context("Failed to bind server port")?;
    info!("HTTP Server listening on {addr}");

    let janitor = async {
      loop {
        tokio::time::sleep(Duration::from_secs(60)).await;
        limiter.retain_recent();
        app.sessions.gc();
      }
    };

    let server = async {
      axum::serve(listener, router).await.context("Axum server error")
    };

    tokio::select! {
      result = server => {
        match &result {
            Ok(_) => info!("Server stopped gracefully"),
            Err(err) => error!("Server stopped with error: {err}"),
        }
        result
      }
      _ = janitor => {
        error!("Session janitor stopped unexpectedly!");
        Ok(())
      }
    }
  }
}
