//! Runtime configuration, loaded once from the environment at startup.

use std::env;

use crate::prelude::*;

#[derive(Debug, Clone)]
pub struct Config {
  /// SQLite url for the local key-value backend.
  pub db_url: String,
  /// Base url of the remote document store. Unset means local-only mode.
  pub remote_url: Option<String>,
  pub remote_api_key: Option<String>,
  /// Generative-text service key. Unset disables AI features.
  pub gemini_api_key: Option<String>,
  pub gemini_model: String,
  pub owner_email: String,
  pub owner_password: String,
  pub owner_display_name: String,
  pub port: u16,
  /// Seconds of inactivity before a session is collected.
  pub session_lifetime: i64,
  pub ai_timeout: Duration,
  pub probe_timeout: Duration,
  pub limits: Limits,
}

#[derive(Debug, Clone)]
pub struct Limits {
  pub max_games_per_user: usize,
  pub max_content_per_creator: usize,
}

impl Default for Limits {
  fn default() -> Self {
    Self { max_games_per_user: 1000, max_content_per_creator: 500 }
  }
}

impl Config {
  /// Required variables panic at startup; everything else has a default.
  /// The owner credential pair is never compiled into the binary.
  pub fn from_env() -> Self {
    let db_url = env::var("DATABASE_URL")
      .unwrap_or_else(|_| "sqlite:gamepulse.db?mode=rwc".into());

    let port =
      env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(3000);

    Self {
      db_url,
      remote_url: env::var("REMOTE_STORE_URL").ok().filter(|s| !s.is_empty()),
      remote_api_key: env::var("REMOTE_STORE_KEY").ok(),
      gemini_api_key: env::var("GEMINI_API_KEY")
        .ok()
        .filter(|s| !s.is_empty()),
      gemini_model: env::var("GEMINI_MODEL")
        .unwrap_or_else(|_| "gemini-pro".into()),
      owner_email: env::var("OWNER_EMAIL").expect("OWNER_EMAIL not set"),
      owner_password: env::var("OWNER_PASSWORD")
        .expect("OWNER_PASSWORD not set"),
      owner_display_name: env::var("OWNER_DISPLAY_NAME")
        .unwrap_or_else(|_| "GamePulse Owner".into()),
      port,
      session_lifetime: 1800,
      ai_timeout: Duration::from_secs(30),
      probe_timeout: Duration::from_secs(5),
      limits: Limits::default(),
    }
  }

  #[cfg(test)]
  pub fn for_tests() -> Self {
    Self {
      db_url: "sqlite::memory:".into(),
      remote_url: None,
      remote_api_key: None,
      gemini_api_key: None,
      gemini_model: "gemini-pro".into(),
      owner_email: "owner@example.com".into(),
      owner_password: "owner-pass".into(),
      owner_display_name: "GamePulse Owner".into(),
      port: 0,
      session_lifetime: 1800,
      ai_timeout: Duration::from_secs(5),
      probe_timeout: Duration::from_secs(1),
      limits: Limits::default(),
    }
  }
}
