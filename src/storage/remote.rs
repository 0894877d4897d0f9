//! Remote document-store backend.
//!
//! Plain REST dialect over the store's collections: `users/{uid}` documents
//! with a `stats` map, a `users/{uid}/games/{id}` sub-collection, a flat
//! `content/{id}` collection, and a cross-user `group/games` query used for
//! aggregate game counts. Inserts get server-assigned timestamps; stat
//! updates are atomic increments applied server-side.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::{Backend, GameMutation, Storage};
use crate::{
  config::Config,
  model::{
    Activity, BlogPost, CommunityStats, Game, PlatformStats, StatField, User,
    UserGame,
  },
  prelude::*,
  roles::Role,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct CreatedDoc {
  id: String,
}

#[derive(Debug, Deserialize)]
struct CreatedCatalogEntry {
  id: i64,
}

pub struct Remote {
  client: Client,
  base: String,
  api_key: Option<String>,
  probe_timeout: Duration,
}

impl Remote {
  pub fn new(
    base: &str,
    api_key: Option<String>,
    config: &Config,
  ) -> anyhow::Result<Self> {
    let client = Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .build()
      .context("Failed to build remote store client")?;

    Ok(Self {
      client,
      base: base.trim_end_matches('/').to_string(),
      api_key,
      probe_timeout: config.probe_timeout,
    })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/{path}", self.base)
  }

  fn get(&self, path: &str) -> reqwest::RequestBuilder {
    self.with_key(self.client.get(self.url(path)))
  }

  fn post(&self, path: &str) -> reqwest::RequestBuilder {
    self.with_key(self.client.post(self.url(path)))
  }

  fn put(&self, path: &str) -> reqwest::RequestBuilder {
    self.with_key(self.client.put(self.url(path)))
  }

  fn delete_req(&self, path: &str) -> reqwest::RequestBuilder {
    self.with_key(self.client.delete(self.url(path)))
  }

  fn with_key(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    match &self.api_key {
      Some(key) => req.header("x-api-key", key),
      None => req,
    }
  }

  /// Liveness probe used once at startup for backend selection.
  pub async fn probe(&self) -> Result<()> {
    self
      .get("users")
      .timeout(self.probe_timeout)
      .send()
      .await?
      .error_for_status()?;
    Ok(())
  }

  /// Cross-user collection-group query over every games sub-collection.
  async fn all_games(&self) -> Result<Vec<UserGame>> {
    let games =
      self.get("group/games").send().await?.error_for_status()?.json().await?;
    Ok(games)
  }
}

#[async_trait]
impl Storage for Remote {
  fn backend(&self) -> Backend {
    Backend::Remote
  }

  async fn user_games(&self, user_id: &str) -> Result<Vec<UserGame>> {
    let games = self
      .get(&format!("users/{user_id}/games"))
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;
    Ok(games)
  }

  async fn insert_user_game(
    &self,
    user_id: &str,
    game: UserGame,
  ) -> Result<String> {
    // the store stamps addedAt server-side
    let created: CreatedDoc = self
      .post(&format!("users/{user_id}/games"))
      .json(&game)
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;
    Ok(created.id)
  }

  async fn update_user_game(
    &self,
    user_id: &str,
    game: &UserGame,
  ) -> Result<()> {
    let response = self
      .put(&format!("users/{user_id}/games/{}", game.id))
      .json(game)
      .send()
      .await?;

    if response.status() == StatusCode::NOT_FOUND {
      return Err(Error::GameNotFound);
    }
    response.error_for_status()?;
    Ok(())
  }

  async fn mutate_user_game(
    &self,
    user_id: &str,
    game_id: &str,
    op: GameMutation,
  ) -> Result<UserGame> {
    let games = self.user_games(user_id).await?;
    let Some(mut game) = games.into_iter().find(|g| g.id == game_id) else {
      return Err(Error::GameNotFound);
    };

    op(&mut game);
    self.update_user_game(user_id, &game).await?;
    Ok(game)
  }

  async fn delete_user_game(
    &self,
    user_id: &str,
    game_id: &str,
  ) -> Result<bool> {
    let response = self
      .delete_req(&format!("users/{user_id}/games/{game_id}"))
      .send()
      .await?;

    if response.status() == StatusCode::NOT_FOUND {
      return Ok(false);
    }
    response.error_for_status()?;
    Ok(true)
  }

  async fn users(&self) -> Result<Vec<User>> {
    let users =
      self.get("users").send().await?.error_for_status()?.json().await?;
    Ok(users)
  }

  async fn find_user(&self, email: &str) -> Result<Option<User>> {
    let users = self.users().await?;
    Ok(users.into_iter().find(|u| u.email == email))
  }

  async fn upsert_user(&self, user: &User) -> Result<()> {
    self
      .put(&format!("users/{}", user.id))
      .json(user)
      .send()
      .await?
      .error_for_status()?;
    Ok(())
  }

  async fn posts(&self) -> Result<Vec<BlogPost>> {
    let posts =
      self.get("content").send().await?.error_for_status()?.json().await?;
    Ok(posts)
  }

  async fn insert_post(&self, post: &BlogPost) -> Result<()> {
    self.post("content").json(post).send().await?.error_for_status()?;
    Ok(())
  }

  async fn delete_post(&self, post_id: &str) -> Result<bool> {
    let response =
      self.delete_req(&format!("content/{post_id}")).send().await?;

    if response.status() == StatusCode::NOT_FOUND {
      return Ok(false);
    }
    response.error_for_status()?;
    Ok(true)
  }

  async fn push_activity(&self, _activity: Activity) -> Result<()> {
    // the activity feed is a local-mode feature
    debug!("activity log is not kept in the remote store");
    Ok(())
  }

  async fn activities(&self) -> Result<Vec<Activity>> {
    Ok(Vec::new())
  }

  async fn catalog_extras(&self) -> Result<Vec<Game>> {
    let games =
      self.get("catalog").send().await?.error_for_status()?.json().await?;
    Ok(games)
  }

  async fn add_catalog_game(&self, game: Game) -> Result<i64> {
    let created: CreatedCatalogEntry = self
      .post("catalog")
      .json(&game)
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;
    Ok(created.id)
  }

  async fn increment_stat(
    &self,
    user_id: &str,
    field: StatField,
    delta: i64,
  ) -> Result<()> {
    // atomic increment applied by the store, which also bumps lastActivity
    self
      .post(&format!("users/{user_id}/stats/{}", field.as_str()))
      .json(&json::json!({ "delta": delta }))
      .send()
      .await?
      .error_for_status()?;
    Ok(())
  }

  async fn platform_stats(&self) -> Result<PlatformStats> {
    let users = self.users().await?;
    let games = self.all_games().await?;
    let ai_usage = users.iter().map(|u| u.stats.ai_usage).sum();

    Ok(PlatformStats {
      total_users: users.len() as i64,
      total_games: games.len() as i64,
      ai_usage,
      platform_health: 100,
    })
  }

  async fn community_stats(&self) -> Result<CommunityStats> {
    let users = self.users().await?;

    let count =
      |f: &dyn Fn(&User) -> bool| users.iter().filter(|u| f(u)).count() as i64;

    Ok(CommunityStats {
      gamers: count(&|u| u.role == Role::Gamer),
      creators: count(&|u| u.role == Role::ContentCreator),
      teachers: count(&|u| u.role == Role::Teacher),
      admins: count(&|u| matches!(u.role, Role::Admin | Role::Owner)),
    })
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
  };
  use tokio::{net::TcpListener, sync::Mutex};
  use uuid::Uuid;

  use super::*;
  use crate::catalog;

  /// In-process document store speaking the same REST dialect.
  type Shelf = Arc<Mutex<HashMap<String, Vec<UserGame>>>>;

  async fn list_users() -> Json<Vec<User>> {
    Json(Vec::new())
  }

  async fn list_games(
    State(shelf): State<Shelf>,
    Path(uid): Path<String>,
  ) -> Json<Vec<UserGame>> {
    Json(shelf.lock().await.get(&uid).cloned().unwrap_or_default())
  }

  async fn create_game(
    State(shelf): State<Shelf>,
    Path(uid): Path<String>,
    Json(mut game): Json<UserGame>,
  ) -> Json<json::Value> {
    game.id = Uuid::new_v4().to_string();
    let id = game.id.clone();
    shelf.lock().await.entry(uid).or_default().push(game);
    Json(json::json!({ "id": id }))
  }

  async fn replace_game(
    State(shelf): State<Shelf>,
    Path((uid, id)): Path<(String, String)>,
    Json(game): Json<UserGame>,
  ) -> StatusCode {
    let mut shelf = shelf.lock().await;
    let slot = shelf
      .get_mut(&uid)
      .and_then(|games| games.iter_mut().find(|g| g.id == id));

    match slot {
      Some(slot) => {
        *slot = game;
        StatusCode::OK
      }
      None => StatusCode::NOT_FOUND,
    }
  }

  async fn remove_game(
    State(shelf): State<Shelf>,
    Path((uid, id)): Path<(String, String)>,
  ) -> StatusCode {
    let mut shelf = shelf.lock().await;
    let Some(games) = shelf.get_mut(&uid) else {
      return StatusCode::NOT_FOUND;
    };

    let before = games.len();
    games.retain(|g| g.id != id);
    if games.len() == before { StatusCode::NOT_FOUND } else { StatusCode::OK }
  }

  async fn stub_store() -> Remote {
    let app = Router::new()
      .route("/users", get(list_users))
      .route("/users/{uid}/games", get(list_games).post(create_game))
      .route("/users/{uid}/games/{id}", put(replace_game).delete(remove_game))
      .with_state(Shelf::default());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    Remote::new(&format!("http://{addr}"), None, &Config::for_tests()).unwrap()
  }

  #[tokio::test]
  async fn game_round_trip() {
    let store = stub_store().await;
    store.probe().await.unwrap();

    let game = catalog::by_id(1).unwrap();
    let entry = UserGame::from_catalog("u1", &game);
    let id = store.insert_user_game("u1", entry).await.unwrap();

    let games = store.user_games("u1").await.unwrap();
    assert_eq!(games.len(), 1);
    assert_eq!(games[0].id, id);
    assert_eq!(games[0].name, game.name);

    assert!(store.user_games("u2").await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn delete_is_idempotent() {
    let store = stub_store().await;
    let game = catalog::by_id(2).unwrap();
    let entry = UserGame::from_catalog("u1", &game);
    let id = store.insert_user_game("u1", entry).await.unwrap();

    assert!(store.delete_user_game("u1", &id).await.unwrap());
    assert!(!store.delete_user_game("u1", &id).await.unwrap());
    assert!(store.user_games("u1").await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn mutation_persists_in_store() {
    let store = stub_store().await;
    let game = catalog::by_id(3).unwrap();
    let entry = UserGame::from_catalog("u1", &game);
    let id = store.insert_user_game("u1", entry).await.unwrap();

    let now = Utc::now().naive_utc();
    let updated = store
      .mutate_user_game("u1", &id, Box::new(move |g| g.log_session(2.5, now)))
      .await
      .unwrap();
    assert_eq!(updated.playtime, 2.5);

    let games = store.user_games("u1").await.unwrap();
    assert_eq!(games[0].sessions.len(), 1);
    assert_eq!(games[0].playtime, 2.5);
  }

  #[tokio::test]
  async fn missing_entries_surface_as_not_found() {
    let store = stub_store().await;
    let game = catalog::by_id(1).unwrap();
    let entry = UserGame::from_catalog("u1", &game);

    let result = store.update_user_game("u1", &entry).await;
    assert!(matches!(result, Err(Error::GameNotFound)));

    let result =
      store.mutate_user_game("u1", "nope", Box::new(|_| {})).await;
    assert!(matches!(result, Err(Error::GameNotFound)));
  }
}
