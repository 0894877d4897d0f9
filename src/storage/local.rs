//! Local persisted key-value backend over SQLite.
//!
//! Collections are JSON-encoded under namespaced keys: one `games_<uid>`
//! entry per user plus process-wide entries for users, blog posts, the
//! gaming activity log and catalog additions. A missing key reads as an
//! empty collection, never an error.

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{Backend, GameMutation, Storage};
use crate::{
  entities::kv,
  model::{
    Activity, BlogPost, CommunityStats, Game, PlatformStats, StatField, User,
    UserGame,
  },
  prelude::*,
};

const KEY_PREFIX: &str = "gamepulse";
/// Retained activity log entries, newest first.
const ACTIVITY_LIMIT: usize = 50;

fn games_key(user_id: &str) -> String {
  format!("{KEY_PREFIX}_games_{user_id}")
}

fn users_key() -> String {
  format!("{KEY_PREFIX}_users")
}

fn posts_key() -> String {
  format!("{KEY_PREFIX}_blog_posts")
}

fn activity_key() -> String {
  format!("{KEY_PREFIX}_gaming_activity")
}

fn catalog_key() -> String {
  format!("{KEY_PREFIX}_game_catalog")
}

pub struct Local {
  db: DatabaseConnection,
  /// Serializes read-modify-write cycles per collection key; without it,
  /// two writers interleaving at an await point lose one update.
  locks: DashMap<String, Arc<Mutex<()>>>,
}

impl Local {
  pub async fn connect(db_url: &str) -> anyhow::Result<Self> {
    let db = Database::connect(db_url)
      .await
      .context("Failed to connect to local database")?;
    migration::Migrator::up(&db, None)
      .await
      .context("Failed to run migrations")?;
    Ok(Self { db, locks: DashMap::new() })
  }

  async fn guard(&self, key: &str) -> OwnedMutexGuard<()> {
    let lock = self.locks.entry(key.to_string()).or_default().clone();
    lock.lock_owned().await
  }

  #[cfg(test)]
  pub async fn in_memory() -> Self {
    Self::connect("sqlite::memory:").await.unwrap()
  }

  async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
    let Some(row) = kv::Entity::find_by_id(key).one(&self.db).await? else {
      return Ok(None);
    };
    Ok(Some(json::from_str(&row.value)?))
  }

  async fn read_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
    Ok(self.read(key).await?.unwrap_or_default())
  }

  async fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
    let row = kv::ActiveModel {
      key: Set(key.to_string()),
      value: Set(json::to_string(value)?),
      updated_at: Set(Utc::now().naive_utc()),
    };

    kv::Entity::insert(row)
      .on_conflict(
        OnConflict::column(kv::Column::Key)
          .update_columns([kv::Column::Value, kv::Column::UpdatedAt])
          .to_owned(),
      )
      .exec(&self.db)
      .await?;

    Ok(())
  }
}

#[async_trait]
impl Storage for Local {
  fn backend(&self) -> Backend {
    Backend::Local
  }

  async fn user_games(&self, user_id: &str) -> Result<Vec<UserGame>> {
    self.read_list(&games_key(user_id)).await
  }

  async fn insert_user_game(
    &self,
    user_id: &str,
    game: UserGame,
  ) -> Result<String> {
    let key = games_key(user_id);
    let _guard = self.guard(&key).await;
    let id = game.id.clone();

    let mut games: Vec<UserGame> = self.read_list(&key).await?;
    games.push(game);
    self.write(&key, &games).await?;

    Ok(id)
  }

  async fn update_user_game(
    &self,
    user_id: &str,
    game: &UserGame,
  ) -> Result<()> {
    let key = games_key(user_id);
    let _guard = self.guard(&key).await;
    let mut games: Vec<UserGame> = self.read_list(&key).await?;

    let Some(slot) = games.iter_mut().find(|g| g.id == game.id) else {
      return Err(Error::GameNotFound);
    };
    *slot = game.clone();

    self.write(&key, &games).await
  }

  async fn mutate_user_game(
    &self,
    user_id: &str,
    game_id: &str,
    op: GameMutation,
  ) -> Result<UserGame> {
    let key = games_key(user_id);
    let _guard = self.guard(&key).await;
    let mut games: Vec<UserGame> = self.read_list(&key).await?;

    let Some(slot) = games.iter_mut().find(|g| g.id == game_id) else {
      return Err(Error::GameNotFound);
    };
    op(slot);
    let updated = slot.clone();

    self.write(&key, &games).await?;
    Ok(updated)
  }

  async fn delete_user_game(
    &self,
    user_id: &str,
    game_id: &str,
  ) -> Result<bool> {
    let key = games_key(user_id);
    let _guard = self.guard(&key).await;
    let mut games: Vec<UserGame> = self.read_list(&key).await?;

    let before = games.len();
    games.retain(|g| g.id != game_id);
    if games.len() == before {
      return Ok(false);
    }

    self.write(&key, &games).await?;
    Ok(true)
  }

  async fn users(&self) -> Result<Vec<User>> {
    self.read_list(&users_key()).await
  }

  async fn find_user(&self, email: &str) -> Result<Option<User>> {
    let users: Vec<User> = self.read_list(&users_key()).await?;
    Ok(users.into_iter().find(|u| u.email == email))
  }

  async fn upsert_user(&self, user: &User) -> Result<()> {
    let key = users_key();
    let _guard = self.guard(&key).await;
    let mut users: Vec<User> = self.read_list(&key).await?;

    match users.iter_mut().find(|u| u.id == user.id) {
      Some(slot) => *slot = user.clone(),
      None => users.push(user.clone()),
    }

    self.write(&key, &users).await
  }

  async fn posts(&self) -> Result<Vec<BlogPost>> {
    self.read_list(&posts_key()).await
  }

  async fn insert_post(&self, post: &BlogPost) -> Result<()> {
    let key = posts_key();
    let _guard = self.guard(&key).await;
    let mut posts: Vec<BlogPost> = self.read_list(&key).await?;
    posts.push(post.clone());
    self.write(&key, &posts).await
  }

  async fn delete_post(&self, post_id: &str) -> Result<bool> {
    let key = posts_key();
    let _guard = self.guard(&key).await;
    let mut posts: Vec<BlogPost> = self.read_list(&key).await?;

    let before = posts.len();
    posts.retain(|p| p.id != post_id);
    if posts.len() == before {
      return Ok(false);
    }

    self.write(&key, &posts).await?;
    Ok(true)
  }

  async fn push_activity(&self, activity: Activity) -> Result<()> {
    let key = activity_key();
    let _guard = self.guard(&key).await;
    let mut log: Vec<Activity> = self.read_list(&key).await?;

    log.insert(0, activity);
    log.truncate(ACTIVITY_LIMIT);

    self.write(&key, &log).await
  }

  async fn activities(&self) -> Result<Vec<Activity>> {
    self.read_list(&activity_key()).await
  }

  async fn catalog_extras(&self) -> Result<Vec<Game>> {
    self.read_list(&catalog_key()).await
  }

  async fn add_catalog_game(&self, mut game: Game) -> Result<i64> {
    let key = catalog_key();
    let _guard = self.guard(&key).await;
    let mut extras: Vec<Game> = self.read_list(&key).await?;

    game.id = crate::catalog::next_id(&extras);
    let id = game.id;
    extras.push(game);

    self.write(&key, &extras).await?;
    Ok(id)
  }

  async fn increment_stat(
    &self,
    _user_id: &str,
    _field: StatField,
    _delta: i64,
  ) -> Result<()> {
    Err(Error::Unsupported("stat increments"))
  }

  async fn platform_stats(&self) -> Result<PlatformStats> {
    Err(Error::Unsupported("platform stats"))
  }

  async fn community_stats(&self) -> Result<CommunityStats> {
    Err(Error::Unsupported("community stats"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{catalog, roles::Role};

  #[tokio::test]
  async fn missing_keys_read_as_empty() {
    let store = Local::in_memory().await;

    assert!(store.user_games("nobody").await.unwrap().is_empty());
    assert!(store.users().await.unwrap().is_empty());
    assert!(store.activities().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn game_round_trip() {
    let store = Local::in_memory().await;
    let game = catalog::by_id(1).unwrap();
    let entry = UserGame::from_catalog("u1", &game);

    let id = store.insert_user_game("u1", entry).await.unwrap();
    let games = store.user_games("u1").await.unwrap();

    assert_eq!(games.len(), 1);
    assert_eq!(games[0].id, id);
    assert_eq!(games[0].name, game.name);
    assert_eq!(games[0].genre, game.genre);

    // other users see nothing
    assert!(store.user_games("u2").await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn delete_is_idempotent() {
    let store = Local::in_memory().await;
    let game = catalog::by_id(2).unwrap();
    let entry = UserGame::from_catalog("u1", &game);
    let id = store.insert_user_game("u1", entry).await.unwrap();

    assert!(store.delete_user_game("u1", &id).await.unwrap());
    assert!(store.user_games("u1").await.unwrap().is_empty());

    // second delete reports no-op and leaves the library unchanged
    assert!(!store.delete_user_game("u1", &id).await.unwrap());
    assert!(store.user_games("u1").await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn user_upsert_replaces_by_id() {
    let store = Local::in_memory().await;
    let mut user = User::sample("u1", "a@example.com", "A", Role::Gamer);

    store.upsert_user(&user).await.unwrap();
    user.role = Role::Admin;
    store.upsert_user(&user).await.unwrap();

    let users = store.users().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].role, Role::Admin);

    assert!(store.find_user("a@example.com").await.unwrap().is_some());
    assert!(store.find_user("b@example.com").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn activity_log_is_bounded() {
    let store = Local::in_memory().await;

    for i in 0..60 {
      store
        .push_activity(Activity::new("test", format!("event {i}")))
        .await
        .unwrap();
    }

    let log = store.activities().await.unwrap();
    assert_eq!(log.len(), ACTIVITY_LIMIT);
    // newest first
    assert_eq!(log[0].message, "event 59");
    assert_eq!(log.last().unwrap().message, "event 10");
  }

  #[tokio::test]
  async fn aggregates_are_unsupported() {
    let store = Local::in_memory().await;

    assert!(matches!(
      store.platform_stats().await,
      Err(Error::Unsupported(_))
    ));
    assert!(matches!(
      store.increment_stat("u1", StatField::GamesCount, 1).await,
      Err(Error::Unsupported(_))
    ));
  }

  #[tokio::test]
  async fn concurrent_inserts_keep_both_entries() {
    let store = Arc::new(Local::in_memory().await);
    let game = catalog::by_id(1).unwrap();

    let (a, b) = tokio::join!(
      store.insert_user_game("u1", UserGame::from_catalog("u1", &game)),
      store.insert_user_game("u1", UserGame::from_catalog("u1", &game)),
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(store.user_games("u1").await.unwrap().len(), 2);
  }

  #[tokio::test]
  async fn concurrent_mutations_apply_both() {
    let store = Arc::new(Local::in_memory().await);
    let game = catalog::by_id(1).unwrap();
    let id = store
      .insert_user_game("u1", UserGame::from_catalog("u1", &game))
      .await
      .unwrap();

    let now = Utc::now().naive_utc();
    let (a, b) = tokio::join!(
      store.mutate_user_game("u1", &id, Box::new(move |g| {
        g.log_session(1.0, now)
      })),
      store.mutate_user_game("u1", &id, Box::new(move |g| {
        g.log_session(2.0, now)
      })),
    );
    a.unwrap();
    b.unwrap();

    let games = store.user_games("u1").await.unwrap();
    assert_eq!(games[0].sessions.len(), 2);
    assert_eq!(games[0].playtime, 3.0);
  }

  #[tokio::test]
  async fn catalog_extras_get_fresh_ids() {
    let store = Local::in_memory().await;
    let game = Game {
      id: 0,
      name: "Hades II".into(),
      genre: vec!["Roguelike".into()],
      rating: 4.9,
      description: "Rogue-like dungeon crawler.".into(),
      image: "🔥".into(),
    };

    let id = store.add_catalog_game(game.clone()).await.unwrap();
    assert_eq!(id, 6);

    let id = store.add_catalog_game(game).await.unwrap();
    assert_eq!(id, 7);
  }
}
