//! Domain types shared across storage backends and the HTTP API.
//!
//! Field names serialize in camelCase to match the remote document-store
//! schema (`users/{uid}` docs, `users/{uid}/games` sub-collection).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{prelude::*, roles::Role};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: String,
  pub email: String,
  // Stored in the clear. Known defect, kept for store compatibility.
  pub password: String,
  pub display_name: String,
  #[serde(default)]
  pub role: Role,
  #[serde(default)]
  pub stats: UserStats,
  pub created_at: DateTime,
  pub last_activity: DateTime,
}

impl User {
  pub fn new(
    email: impl Into<String>,
    password: impl Into<String>,
    display_name: impl Into<String>,
    role: Role,
  ) -> Self {
    let now = Utc::now().naive_utc();
    Self {
      id: Uuid::new_v4().to_string(),
      email: email.into(),
      password: password.into(),
      display_name: display_name.into(),
      role,
      stats: UserStats::default(),
      created_at: now,
      last_activity: now,
    }
  }

  /// Admin-level access: admins and the owner.
  pub fn is_admin(&self) -> bool {
    matches!(self.role, Role::Admin | Role::Owner)
  }

  pub fn is_owner(&self) -> bool {
    self.role == Role::Owner
  }

  #[cfg(test)]
  pub fn sample(id: &str, email: &str, display_name: &str, role: Role) -> Self {
    let mut user = Self::new(email, "secret", display_name, role);
    user.id = id.to_string();
    user
  }
}

/// Per-user counters. Which fields are meaningful depends on the role;
/// the rest stay at zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserStats {
  pub games_count: i64,
  pub total_playtime: i64,
  pub achievements: i64,
  pub content_count: i64,
  pub total_views: i64,
  pub engagement: i64,
  pub students_count: i64,
  pub resources_count: i64,
  pub managed_users: i64,
  pub platform_revenue: i64,
  pub ai_usage: i64,
}

/// Addressable stat counter, used for increment operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatField {
  GamesCount,
  TotalPlaytime,
  Achievements,
  ContentCount,
  TotalViews,
  Engagement,
  StudentsCount,
  ResourcesCount,
  ManagedUsers,
  PlatformRevenue,
  AiUsage,
}

impl StatField {
  /// Field name inside the remote document's `stats` map.
  pub fn as_str(self) -> &'static str {
    match self {
      StatField::GamesCount => "gamesCount",
      StatField::TotalPlaytime => "totalPlaytime",
      StatField::Achievements => "achievements",
      StatField::ContentCount => "contentCount",
      StatField::TotalViews => "totalViews",
      StatField::Engagement => "engagement",
      StatField::StudentsCount => "studentsCount",
      StatField::ResourcesCount => "resourcesCount",
      StatField::ManagedUsers => "managedUsers",
      StatField::PlatformRevenue => "platformRevenue",
      StatField::AiUsage => "aiUsage",
    }
  }
}

/// Catalog entry. Immutable sample data, or added by admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
  pub id: i64,
  pub name: String,
  pub genre: Vec<String>,
  pub rating: f64,
  pub description: String,
  /// Icon glyph shown on game cards.
  pub image: String,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
  #[default]
  Backlog,
  Playing,
  Completed,
}

impl GameStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      GameStatus::Backlog => "backlog",
      GameStatus::Playing => "playing",
      GameStatus::Completed => "completed",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaySession {
  pub hours: f64,
  pub date: DateTime,
}

/// A game in a user's library, with tracking state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGame {
  pub id: String,
  pub user_id: String,
  /// Catalog id this entry was added from, if any.
  pub library_id: Option<i64>,
  pub name: String,
  #[serde(default)]
  pub genre: Vec<String>,
  pub rating: f64,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub image: String,
  #[serde(default)]
  pub status: GameStatus,
  #[serde(default)]
  pub playtime: f64,
  /// Play sessions, newest first.
  #[serde(default)]
  pub sessions: Vec<PlaySession>,
  pub added_at: DateTime,
  pub last_played: Option<DateTime>,
  pub completed_at: Option<DateTime>,
  #[serde(default)]
  pub notes: String,
}

impl UserGame {
  pub fn from_catalog(user_id: &str, game: &Game) -> Self {
    Self {
      id: Uuid::new_v4().to_string(),
      user_id: user_id.to_string(),
      library_id: Some(game.id),
      name: game.name.clone(),
      genre: game.genre.clone(),
      rating: game.rating,
      description: game.description.clone(),
      image: game.image.clone(),
      status: GameStatus::Backlog,
      playtime: 0.0,
      sessions: Vec::new(),
      added_at: Utc::now().naive_utc(),
      last_played: None,
      completed_at: None,
      notes: String::new(),
    }
  }

  /// Record a play session. Keeps `playtime` equal to the sum of session
  /// hours and promotes backlog entries to "playing".
  pub fn log_session(&mut self, hours: f64, date: DateTime) {
    self.sessions.insert(0, PlaySession { hours, date });
    self.playtime += hours;
    self.last_played = Some(Utc::now().naive_utc());

    if self.status == GameStatus::Backlog {
      self.status = GameStatus::Playing;
    }
  }

  pub fn set_status(&mut self, status: GameStatus) {
    self.status = status;
    if status == GameStatus::Completed && self.completed_at.is_none() {
      self.completed_at = Some(Utc::now().naive_utc());
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
  Approved,
  Pending,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
  pub author_id: String,
  pub author_name: String,
  pub text: String,
  pub created_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
  pub id: String,
  pub title: String,
  pub category: String,
  pub content: String,
  #[serde(default)]
  pub tags: Vec<String>,
  pub author_id: String,
  pub author_name: String,
  pub author_role: Role,
  pub status: PostStatus,
  pub created_at: DateTime,
  #[serde(default)]
  pub views: i64,
  #[serde(default)]
  pub likes: i64,
  #[serde(default)]
  pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
  User,
  Ai,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
  pub sender: Sender,
  pub text: String,
  pub timestamp: DateTime,
}

impl ChatMessage {
  pub fn new(sender: Sender, text: impl Into<String>) -> Self {
    Self { sender, text: text.into(), timestamp: Utc::now().naive_utc() }
  }
}

/// Gaming activity log entry (game added, playtime logged, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
  #[serde(rename = "type")]
  pub kind: String,
  pub message: String,
  pub timestamp: DateTime,
}

impl Activity {
  pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      kind: kind.into(),
      message: message.into(),
      timestamp: Utc::now().naive_utc(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
  pub total_users: i64,
  pub total_games: i64,
  pub ai_usage: i64,
  pub platform_health: i64,
}

impl PlatformStats {
  /// Fixed demo figures served when no remote backend is configured.
  /// Placeholders, not a real aggregation.
  pub fn demo() -> Self {
    Self { total_users: 2, total_games: 5, ai_usage: 12, platform_health: 100 }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityStats {
  pub gamers: i64,
  pub creators: i64,
  pub teachers: i64,
  pub admins: i64,
}

impl CommunityStats {
  pub fn demo() -> Self {
    Self { gamers: 1, creators: 0, teachers: 0, admins: 1 }
  }
}

/// Aggregate over one user's library and activity log.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GamingStats {
  pub total_playtime: f64,
  pub total_games: usize,
  pub completed_games: usize,
  pub playing_games: usize,
  pub backlog_games: usize,
  pub favorite_genre: String,
  pub total_sessions: usize,
  pub recent_activity: Vec<Activity>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn playtime_tracks_session_sum() {
    let game = Game {
      id: 1,
      name: "Test".into(),
      genre: vec!["RPG".into()],
      rating: 4.0,
      description: String::new(),
      image: "🎮".into(),
    };
    let mut entry = UserGame::from_catalog("u1", &game);
    let now = Utc::now().naive_utc();

    for hours in [1.5, 2.0, 0.5, 3.0] {
      entry.log_session(hours, now);
    }

    let sum: f64 = entry.sessions.iter().map(|s| s.hours).sum();
    assert_eq!(entry.playtime, sum);
    assert_eq!(entry.sessions.len(), 4);
    // newest first
    assert_eq!(entry.sessions[0].hours, 3.0);
  }

  #[test]
  fn logging_promotes_backlog_to_playing() {
    let game = Game {
      id: 2,
      name: "Other".into(),
      genre: vec![],
      rating: 4.0,
      description: String::new(),
      image: String::new(),
    };
    let mut entry = UserGame::from_catalog("u1", &game);
    assert_eq!(entry.status, GameStatus::Backlog);

    entry.log_session(1.0, Utc::now().naive_utc());
    assert_eq!(entry.status, GameStatus::Playing);

    entry.set_status(GameStatus::Completed);
    assert!(entry.completed_at.is_some());
    let first = entry.completed_at;
    entry.set_status(GameStatus::Completed);
    assert_eq!(entry.completed_at, first);
  }

  #[test]
  fn stat_fields_use_wire_names() {
    assert_eq!(StatField::GamesCount.as_str(), "gamesCount");
    assert_eq!(StatField::AiUsage.as_str(), "aiUsage");
    assert_eq!(StatField::TotalPlaytime.as_str(), "totalPlaytime");
  }
}
