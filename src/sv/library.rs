//! Game library gateway.
//!
//! The listed operations never propagate storage failures past this
//! boundary: reads degrade to empty, writes report `None`/`false` and the
//! caller surfaces a notification.

use rand::seq::SliceRandom;
use serde::Deserialize;

use crate::{
  catalog,
  config::Limits,
  model::{
    Activity, Game, GameStatus, GamingStats, StatField, UserGame,
  },
  prelude::*,
  storage::Storage,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortBy {
  /// Most recently added first.
  #[default]
  Recent,
  Title,
  Playtime,
  RecentlyPlayed,
}

pub struct Library<'a> {
  store: &'a dyn Storage,
  limits: &'a Limits,
}

impl<'a> Library<'a> {
  pub fn new(store: &'a dyn Storage, limits: &'a Limits) -> Self {
    Self { store, limits }
  }

  /// Missing library reads as empty, never an error.
  pub async fn games(&self, user_id: &str) -> Vec<UserGame> {
    match self.store.user_games(user_id).await {
      Ok(games) => games,
      Err(err) => {
        error!("failed to load games for {user_id}: {err}");
        Vec::new()
      }
    }
  }

  pub async fn games_filtered(
    &self,
    user_id: &str,
    filter: Option<GameStatus>,
    sort: SortBy,
  ) -> Vec<UserGame> {
    let mut games = self.games(user_id).await;

    if let Some(status) = filter {
      games.retain(|g| g.status == status);
    }

    match sort {
      SortBy::Recent => games.sort_by(|a, b| b.added_at.cmp(&a.added_at)),
      SortBy::Title => games.sort_by(|a, b| a.name.cmp(&b.name)),
      SortBy::Playtime => {
        games.sort_by(|a, b| b.playtime.total_cmp(&a.playtime))
      }
      SortBy::RecentlyPlayed => {
        games.sort_by(|a, b| b.last_played.cmp(&a.last_played))
      }
    }

    games
  }

  /// Add a catalog game to the user's collection. `None` on failure; the
  /// caller turns that into a notification.
  pub async fn add(&self, user_id: &str, game: &Game) -> Option<String> {
    self.add_entry(user_id, UserGame::from_catalog(user_id, game)).await
  }

  pub async fn add_entry(
    &self,
    user_id: &str,
    entry: UserGame,
  ) -> Option<String> {
    let owned = self.games(user_id).await;
    if owned.len() >= self.limits.max_games_per_user {
      warn!(
        "{user_id} hit the library limit ({})",
        self.limits.max_games_per_user
      );
      return None;
    }

    let name = entry.name.clone();
    match self.store.insert_user_game(user_id, entry).await {
      Ok(id) => {
        self.bump_stat(user_id, StatField::GamesCount, 1).await;
        self
          .record_activity("game_added", format!("Added {name} to library"))
          .await;
        Some(id)
      }
      Err(err) => {
        error!("failed to add game for {user_id}: {err}");
        None
      }
    }
  }

  /// Remove a game. A second call for the same id reports `false` and
  /// leaves the library unchanged.
  pub async fn remove(&self, user_id: &str, game_id: &str) -> bool {
    let name = self
      .games(user_id)
      .await
      .iter()
      .find(|g| g.id == game_id)
      .map(|g| g.name.clone());

    match self.store.delete_user_game(user_id, game_id).await {
      Ok(true) => {
        self.bump_stat(user_id, StatField::GamesCount, -1).await;
        if let Some(name) = name {
          self
            .record_activity(
              "game_removed",
              format!("Removed {name} from library"),
            )
            .await;
        }
        true
      }
      Ok(false) => false,
      Err(err) => {
        error!("failed to remove game {game_id} for {user_id}: {err}");
        false
      }
    }
  }

  pub async fn update_status(
    &self,
    user_id: &str,
    game_id: &str,
    status: GameStatus,
  ) -> Result<UserGame> {
    let game = self
      .store
      .mutate_user_game(user_id, game_id, Box::new(move |g| {
        g.set_status(status)
      }))
      .await?;

    self
      .record_activity(
        "game_updated",
        format!("Updated {} status to {}", game.name, status.as_str()),
      )
      .await;

    Ok(game)
  }

  /// Append a play session. The entry's playtime stays equal to the sum
  /// of its session hours.
  pub async fn log_playtime(
    &self,
    user_id: &str,
    game_id: &str,
    hours: f64,
    date: Option<DateTime>,
  ) -> Result<UserGame> {
    if !hours.is_finite() || hours <= 0.0 {
      return Err(Error::InvalidInput("playtime must be positive".into()));
    }

    let date = date.unwrap_or_else(|| Utc::now().naive_utc());
    let game = self
      .store
      .mutate_user_game(user_id, game_id, Box::new(move |g| {
        g.log_session(hours, date)
      }))
      .await?;

    self
      .record_activity(
        "playtime_logged",
        format!("Logged {hours}h of {}", game.name),
      )
      .await;

    Ok(game)
  }

  pub async fn random_backlog(&self, user_id: &str) -> Option<UserGame> {
    let games = self.games(user_id).await;
    let backlog: Vec<_> =
      games.into_iter().filter(|g| g.status == GameStatus::Backlog).collect();
    backlog.choose(&mut rand::thread_rng()).cloned()
  }

  /// Catalog entries not yet in the user's library, filtered by name.
  pub async fn suggestions(&self, user_id: &str, term: &str) -> Vec<Game> {
    let owned: Vec<i64> = self
      .games(user_id)
      .await
      .iter()
      .filter_map(|g| g.library_id)
      .collect();

    let extras = self.store.catalog_extras().await.unwrap_or_default();
    let needle = term.to_lowercase();

    catalog::sample_games()
      .iter()
      .chain(extras.iter())
      .filter(|game| {
        !owned.contains(&game.id)
          && game.name.to_lowercase().contains(&needle)
      })
      .cloned()
      .collect()
  }

  pub async fn gaming_stats(&self, user_id: &str) -> GamingStats {
    let games = self.games(user_id).await;
    let activity = self.activities().await;

    let mut genres: HashMap<&str, usize> = HashMap::new();
    for game in &games {
      for genre in &game.genre {
        *genres.entry(genre.as_str()).or_default() += 1;
      }
    }
    let favorite_genre = genres
      .into_iter()
      .max_by_key(|(_, count)| *count)
      .map(|(genre, _)| genre.to_string())
      .unwrap_or_else(|| "None".into());

    let by_status = |status: GameStatus| {
      games.iter().filter(|g| g.status == status).count()
    };

    GamingStats {
      total_playtime: games.iter().map(|g| g.playtime).sum(),
      total_games: games.len(),
      completed_games: by_status(GameStatus::Completed),
      playing_games: by_status(GameStatus::Playing),
      backlog_games: by_status(GameStatus::Backlog),
      favorite_genre,
      total_sessions: games.iter().map(|g| g.sessions.len()).sum(),
      recent_activity: activity.into_iter().take(10).collect(),
    }
  }

  pub async fn activities(&self) -> Vec<Activity> {
    match self.store.activities().await {
      Ok(log) => log,
      Err(err) => {
        error!("failed to load activity log: {err}");
        Vec::new()
      }
    }
  }

  // Best-effort: unsupported or failing counters never fail the caller.
  async fn bump_stat(&self, user_id: &str, field: StatField, delta: i64) {
    match self.store.increment_stat(user_id, field, delta).await {
      Ok(()) => {}
      Err(Error::Unsupported(_)) => {
        debug!("stat increments unsupported by backend");
      }
      Err(err) => {
        warn!("failed to update {} for {user_id}: {err}", field.as_str())
      }
    }
  }

  async fn record_activity(&self, kind: &str, message: String) {
    if let Err(err) =
      self.store.push_activity(Activity::new(kind, message)).await
    {
      warn!("failed to record activity: {err}");
    }
  }
}
