//! Storage abstraction over the two physical backends.
//!
//! One backend is selected at startup and injected as `Arc<dyn Storage>`;
//! the choice is never revisited per call, and nothing migrates between
//! backends besides the explicit best-effort sync pass.

pub mod local;
pub mod remote;

use async_trait::async_trait;

use crate::{
  config::Config,
  model::{
    Activity, BlogPost, CommunityStats, Game, PlatformStats, StatField, User,
    UserGame,
  },
  prelude::*,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
  Remote,
  Local,
}

/// In-place edit of a single library entry, applied atomically by the
/// backend so concurrent edits of one library cannot lose each other.
pub type GameMutation = Box<dyn FnOnce(&mut UserGame) + Send>;

#[async_trait]
pub trait Storage: Send + Sync {
  fn backend(&self) -> Backend;

  // Game libraries
  async fn user_games(&self, user_id: &str) -> Result<Vec<UserGame>>;
  async fn insert_user_game(
    &self,
    user_id: &str,
    game: UserGame,
  ) -> Result<String>;
  async fn update_user_game(
    &self,
    user_id: &str,
    game: &UserGame,
  ) -> Result<()>;
  /// Read-modify-write of one entry, returning the updated record.
  async fn mutate_user_game(
    &self,
    user_id: &str,
    game_id: &str,
    op: GameMutation,
  ) -> Result<UserGame>;
  /// Ok(false) when no such entry existed.
  async fn delete_user_game(
    &self,
    user_id: &str,
    game_id: &str,
  ) -> Result<bool>;

  // Users
  async fn users(&self) -> Result<Vec<User>>;
  async fn find_user(&self, email: &str) -> Result<Option<User>>;
  async fn upsert_user(&self, user: &User) -> Result<()>;

  // Content
  async fn posts(&self) -> Result<Vec<BlogPost>>;
  async fn insert_post(&self, post: &BlogPost) -> Result<()>;
  async fn delete_post(&self, post_id: &str) -> Result<bool>;

  // Gaming activity log, newest first, capped at write time
  async fn push_activity(&self, activity: Activity) -> Result<()>;
  async fn activities(&self) -> Result<Vec<Activity>>;

  // Admin catalog additions
  async fn catalog_extras(&self) -> Result<Vec<Game>>;
  async fn add_catalog_game(&self, game: Game) -> Result<i64>;

  // Aggregates. The local backend answers `Error::Unsupported` here;
  // callers decide whether to degrade to demo figures or no-op.
  async fn increment_stat(
    &self,
    user_id: &str,
    field: StatField,
    delta: i64,
  ) -> Result<()>;
  async fn platform_stats(&self) -> Result<PlatformStats>;
  async fn community_stats(&self) -> Result<CommunityStats>;
}

/// Pick the backend once: remote if configured and reachable, local
/// otherwise. Data written while the remote store was down is not
/// retroactively synced here.
pub async fn connect(config: &Config) -> anyhow::Result<Arc<dyn Storage>> {
  if let Some(url) = &config.remote_url {
    let store =
      remote::Remote::new(url, config.remote_api_key.clone(), config)?;

    match store.probe().await {
      Ok(()) => {
        info!("Using remote document store at {url}");
        return Ok(Arc::new(store));
      }
      Err(err) => {
        warn!("Remote store unreachable ({err}), falling back to local");
      }
    }
  } else {
    info!("No remote store configured, using local storage");
  }

  let local = local::Local::connect(&config.db_url).await?;
  Ok(Arc::new(local))
}
