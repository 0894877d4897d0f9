use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode, header},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  ai::prompts,
  catalog,
  model::{
    BlogPost, ChatMessage, CommunityStats, Game, GameStatus, GamingStats,
    PlatformStats, Sender, StatField, User, UserGame, UserStats,
  },
  prelude::*,
  roles::{self, Permission, QuickAction, Role},
  state::AppState,
  sv::{PostDraft, SortBy},
};

fn bearer(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
}

fn session_user(app: &AppState, headers: &HeaderMap) -> Option<User> {
  app.sessions.current(bearer(headers)?)
}

/// Resolve the caller and check the permission. `Ok(None)` means a guest
/// exercising public read-only access.
fn authorize(
  app: &AppState,
  headers: &HeaderMap,
  permission: Permission,
) -> Result<Option<User>> {
  let user = session_user(app, headers);
  if roles::allowed(user.as_ref(), permission) {
    Ok(user)
  } else if user.is_some() {
    Err(Error::PermissionDenied)
  } else {
    Err(Error::Unauthorized)
  }
}

fn require(
  app: &AppState,
  headers: &HeaderMap,
  permission: Permission,
) -> Result<User> {
  authorize(app, headers, permission)?.ok_or(Error::Unauthorized)
}

/// Profile shape handed to clients. Never carries the password.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
  pub id: String,
  pub email: String,
  pub display_name: String,
  pub role: Role,
  pub role_display: &'static str,
  pub role_color: &'static str,
  pub stats: UserStats,
  pub created_at: DateTime,
  pub last_activity: DateTime,
}

impl From<User> for UserView {
  fn from(user: User) -> Self {
    Self {
      id: user.id,
      email: user.email,
      display_name: user.display_name,
      role: user.role,
      role_display: user.role.display_name(),
      role_color: user.role.color(),
      stats: user.stats,
      created_at: user.created_at,
      last_activity: user.last_activity,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct Ack {
  pub success: bool,
}

pub async fn health() -> &'static str {
  "OK"
}

/// Static role table for the frontend: ids, badges and permission sets.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleInfo {
  pub id: &'static str,
  pub display_name: &'static str,
  pub color: &'static str,
  pub permissions: &'static [Permission],
}

pub async fn list_roles() -> Json<Vec<RoleInfo>> {
  Json(
    Role::ALL
      .iter()
      .map(|&role| RoleInfo {
        id: role.as_str(),
        display_name: role.display_name(),
        color: role.color(),
        permissions: role.permissions(),
      })
      .collect(),
  )
}

pub async fn list_users(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<Vec<UserView>>> {
  require(&app, &headers, Permission::ManageUsers)?;

  let users = app.sv().users.all().await;
  Ok(Json(users.into_iter().map(UserView::from).collect()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterReq {
  pub email: String,
  pub password: String,
  #[serde(default)]
  pub display_name: String,
  #[serde(default)]
  pub role: Role,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRes {
  pub success: bool,
  pub token: String,
  pub user: UserView,
}

pub async fn register(
  State(app): State<Arc<AppState>>,
  Json(req): Json<RegisterReq>,
) -> Result<(StatusCode, Json<AuthRes>)> {
  let user = app
    .sv()
    .users
    .register(&req.email, &req.password, &req.display_name, req.role)
    .await?;

  let token = app.sessions.insert(user.clone());
  Ok((
    StatusCode::CREATED,
    Json(AuthRes { success: true, token, user: user.into() }),
  ))
}

#[derive(Debug, Deserialize)]
pub struct LoginReq {
  pub email: String,
  pub password: String,
}

pub async fn login(
  State(app): State<Arc<AppState>>,
  Json(req): Json<LoginReq>,
) -> Result<Json<AuthRes>> {
  let Some(user) = app.auth().login(&req.email, &req.password).await? else {
    return Err(Error::Unauthorized);
  };

  let token = app.sessions.insert(user.clone());
  Ok(Json(AuthRes { success: true, token, user: user.into() }))
}

pub async fn logout(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Json<Ack> {
  if let Some(token) = bearer(&headers) {
    app.sessions.logout(token);
  }
  Json(Ack { success: true })
}

#[derive(Debug, Deserialize)]
pub struct RoleReq {
  pub role: String,
}

pub async fn update_role(
  State(app): State<Arc<AppState>>,
  Path(id): Path<String>,
  headers: HeaderMap,
  Json(req): Json<RoleReq>,
) -> Result<Json<UserView>> {
  let actor = require(&app, &headers, Permission::ManageUsers)?;
  let role: Role = req.role.parse()?;

  let updated = app.sv().users.update_role(&actor, &id, role).await?;
  Ok(Json(updated.into()))
}

#[derive(Debug, Deserialize)]
pub struct GamesQuery {
  pub status: Option<GameStatus>,
  #[serde(default)]
  pub sort: SortBy,
}

pub async fn list_games(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
  Query(query): Query<GamesQuery>,
) -> Result<Json<Vec<UserGame>>> {
  let user = require(&app, &headers, Permission::TrackGames)?;

  let games =
    app.sv().library.games_filtered(&user.id, query.status, query.sort).await;
  Ok(Json(games))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddGameReq {
  /// Catalog entry to add; mutually exclusive with the custom fields.
  pub catalog_id: Option<i64>,
  pub name: Option<String>,
  #[serde(default)]
  pub genre: Vec<String>,
  pub rating: Option<f64>,
  #[serde(default)]
  pub description: String,
  pub image: Option<String>,
}

pub async fn add_game(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(req): Json<AddGameReq>,
) -> Result<(StatusCode, Json<UserGame>)> {
  let user = require(&app, &headers, Permission::TrackGames)?;

  let mut entry = match req.catalog_id {
    Some(id) => {
      let extras = app.storage.catalog_extras().await.unwrap_or_default();
      let game = catalog::by_id(id)
        .or_else(|| extras.into_iter().find(|g| g.id == id))
        .ok_or(Error::GameNotFound)?;
      UserGame::from_catalog(&user.id, &game)
    }
    None => {
      let name = req
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| Error::InvalidInput("game name required".into()))?;

      UserGame {
        id: Uuid::new_v4().to_string(),
        user_id: user.id.clone(),
        library_id: None,
        name,
        genre: req.genre,
        rating: req.rating.unwrap_or(0.0),
        description: req.description,
        image: req.image.unwrap_or_else(|| "🎮".into()),
        status: GameStatus::Backlog,
        playtime: 0.0,
        sessions: Vec::new(),
        added_at: Utc::now().naive_utc(),
        last_played: None,
        completed_at: None,
        notes: String::new(),
      }
    }
  };

  match app.sv().library.add_entry(&user.id, entry.clone()).await {
    Some(id) => {
      entry.id = id;
      Ok((StatusCode::CREATED, Json(entry)))
    }
    None => Err(Error::InvalidInput("could not add game".into())),
  }
}

pub async fn remove_game(
  State(app): State<Arc<AppState>>,
  Path(id): Path<String>,
  headers: HeaderMap,
) -> Result<Json<Ack>> {
  let user = require(&app, &headers, Permission::TrackGames)?;

  let removed = app.sv().library.remove(&user.id, &id).await;
  Ok(Json(Ack { success: removed }))
}

#[derive(Debug, Deserialize)]
pub struct SessionReq {
  pub hours: f64,
  pub date: Option<DateTime>,
}

pub async fn log_session(
  State(app): State<Arc<AppState>>,
  Path(id): Path<String>,
  headers: HeaderMap,
  Json(req): Json<SessionReq>,
) -> Result<Json<UserGame>> {
  let user = require(&app, &headers, Permission::TrackGames)?;

  let game = app
    .sv()
    .library
    .log_playtime(&user.id, &id, req.hours, req.date)
    .await?;
  Ok(Json(game))
}

#[derive(Debug, Deserialize)]
pub struct StatusReq {
  pub status: GameStatus,
}

pub async fn update_status(
  State(app): State<Arc<AppState>>,
  Path(id): Path<String>,
  headers: HeaderMap,
  Json(req): Json<StatusReq>,
) -> Result<Json<UserGame>> {
  let user = require(&app, &headers, Permission::TrackGames)?;

  let game = app.sv().library.update_status(&user.id, &id, req.status).await?;
  Ok(Json(game))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
  #[serde(default)]
  pub q: String,
}

pub async fn game_suggestions(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
  Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Game>>> {
  let user = require(&app, &headers, Permission::TrackGames)?;

  Ok(Json(app.sv().library.suggestions(&user.id, &query.q).await))
}

pub async fn random_backlog(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<Option<UserGame>>> {
  let user = require(&app, &headers, Permission::TrackGames)?;

  Ok(Json(app.sv().library.random_backlog(&user.id).await))
}

pub async fn search_games(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
  Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Game>>> {
  authorize(&app, &headers, Permission::ViewGames)?;

  Ok(Json(catalog::search(&query.q).await))
}

pub async fn list_catalog(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<Vec<Game>>> {
  authorize(&app, &headers, Permission::ViewGames)?;

  let mut games = catalog::sample_games().to_vec();
  games.extend(app.storage.catalog_extras().await.unwrap_or_default());
  Ok(Json(games))
}

pub async fn featured_games(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<Vec<Game>>> {
  authorize(&app, &headers, Permission::ViewGames)?;

  Ok(Json(catalog::featured()))
}

#[derive(Debug, Deserialize)]
pub struct CatalogReq {
  pub name: String,
  #[serde(default)]
  pub genre: Vec<String>,
  pub rating: Option<f64>,
  #[serde(default)]
  pub description: String,
  pub image: Option<String>,
}

pub async fn add_catalog_game(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(req): Json<CatalogReq>,
) -> Result<(StatusCode, Json<Game>)> {
  require(&app, &headers, Permission::PlatformSettings)?;

  if req.name.trim().is_empty() {
    return Err(Error::InvalidInput("game name required".into()));
  }

  let mut game = Game {
    id: 0, // assigned by storage
    name: req.name,
    genre: req.genre,
    rating: req.rating.unwrap_or(0.0),
    description: req.description,
    image: req.image.unwrap_or_else(|| "🎮".into()),
  };
  game.id = app.storage.add_catalog_game(game.clone()).await?;

  Ok((StatusCode::CREATED, Json(game)))
}

pub async fn list_posts(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<Vec<BlogPost>>> {
  authorize(&app, &headers, Permission::ViewCommunity)?;

  Ok(Json(app.sv().content.approved().await?))
}

pub async fn create_post(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(draft): Json<PostDraft>,
) -> Result<(StatusCode, Json<BlogPost>)> {
  let user =
    session_user(&app, &headers).ok_or(Error::Unauthorized)?;

  let post = app.sv().content.create(&user, draft).await?;
  Ok((StatusCode::CREATED, Json(post)))
}

pub async fn delete_post(
  State(app): State<Arc<AppState>>,
  Path(id): Path<String>,
  headers: HeaderMap,
) -> Result<Json<Ack>> {
  let user =
    session_user(&app, &headers).ok_or(Error::Unauthorized)?;

  let deleted = app.sv().content.delete(&user, &id).await?;
  Ok(Json(Ack { success: deleted }))
}

pub async fn platform_stats(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<PlatformStats>> {
  authorize(&app, &headers, Permission::ViewCommunity)?;

  Ok(Json(app.sv().stats.platform().await))
}

pub async fn community_stats(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<CommunityStats>> {
  authorize(&app, &headers, Permission::ViewCommunity)?;

  Ok(Json(app.sv().stats.community().await))
}

pub async fn gaming_stats(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<GamingStats>> {
  let user = require(&app, &headers, Permission::TrackGames)?;

  Ok(Json(app.sv().library.gaming_stats(&user.id).await))
}

#[derive(Debug, Deserialize)]
pub struct ChatReq {
  pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRes {
  pub reply: ChatMessage,
  pub history_len: usize,
}

pub async fn chat(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(req): Json<ChatReq>,
) -> Result<Json<ChatRes>> {
  let user = require(&app, &headers, Permission::UseAi)?;

  if req.message.trim().is_empty() {
    return Err(Error::InvalidInput("message required".into()));
  }

  if app.assistant.enabled() {
    app.sv().users.bump_stat(&user.id, StatField::AiUsage, 1).await;
  }

  let reply_text = app.assistant.chat(&req.message, user.role).await;
  let reply = ChatMessage::new(Sender::Ai, reply_text);

  let mut log = app.chats.entry(user.id.clone()).or_default();
  log.push(Sender::User, req.message);
  log.push(Sender::Ai, reply.text.clone());
  let history_len = log.len();

  Ok(Json(ChatRes { reply, history_len }))
}

pub async fn chat_history(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<Vec<ChatMessage>>> {
  let user = require(&app, &headers, Permission::UseAi)?;

  let history =
    app.chats.get(&user.id).map(|log| log.to_vec()).unwrap_or_default();
  Ok(Json(history))
}

/// Role-specific assistant tools behind a single endpoint.
#[derive(Debug, Deserialize)]
#[serde(tag = "tool", rename_all = "kebab-case")]
#[serde(rename_all_fields = "camelCase")]
pub enum ToolReq {
  GameTips {
    game: String,
    #[serde(default)]
    focus: Option<String>,
  },
  ReviewSummary {
    game: String,
  },
  Recommendations {
    #[serde(default)]
    preferences: String,
  },
  ContentIdeas {
    #[serde(default)]
    trending: Vec<String>,
    #[serde(default)]
    style: String,
  },
  EducationalGames {
    #[serde(default)]
    age_group: String,
    #[serde(default)]
    goals: String,
  },
  PlatformInsights,
  BusinessInsights,
}

pub async fn chat_tool(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(req): Json<ToolReq>,
) -> Result<Json<ChatRes>> {
  let user = require(&app, &headers, Permission::UseAi)?;

  let prompt = match req {
    ToolReq::GameTips { game, focus } => {
      prompts::game_tips(&game, focus.as_deref())
    }
    ToolReq::ReviewSummary { game } => prompts::review_summary(&game),
    ToolReq::Recommendations { preferences } => {
      let owned: Vec<String> = app
        .sv()
        .library
        .games(&user.id)
        .await
        .into_iter()
        .map(|g| g.name)
        .collect();
      prompts::recommendations(&preferences, &owned)
    }
    ToolReq::ContentIdeas { trending, style } => {
      if !user.role.has(Permission::CreateContent) {
        return Err(Error::PermissionDenied);
      }
      prompts::content_ideas(&trending, &style)
    }
    ToolReq::EducationalGames { age_group, goals } => {
      if !user.role.has(Permission::CreateLessons) {
        return Err(Error::PermissionDenied);
      }
      prompts::educational_games(&age_group, &goals)
    }
    ToolReq::PlatformInsights => {
      if !user.role.has(Permission::ViewAnalytics) {
        return Err(Error::PermissionDenied);
      }
      prompts::platform_insights(&json::to_value(
        app.sv().stats.platform().await,
      )?)
    }
    ToolReq::BusinessInsights => {
      if !user.is_owner() {
        return Err(Error::PermissionDenied);
      }
      let platform = app.sv().stats.platform().await;
      let community = app.sv().stats.community().await;
      prompts::business_insights(&json::json!({
        "platform": platform,
        "community": community,
      }))
    }
  };

  if app.assistant.enabled() {
    app.sv().users.bump_stat(&user.id, StatField::AiUsage, 1).await;
  }

  let reply =
    ChatMessage::new(Sender::Ai, app.assistant.respond(&prompt).await);

  let mut log = app.chats.entry(user.id.clone()).or_default();
  log.push(Sender::Ai, reply.text.clone());
  let history_len = log.len();

  Ok(Json(ChatRes { reply, history_len }))
}

pub async fn chat_actions(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<Vec<QuickAction>>> {
  let user = require(&app, &headers, Permission::UseAi)?;

  Ok(Json(roles::quick_actions(user.role)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    config::Config,
    storage::{Storage, local::Local},
  };

  async fn test_state() -> Arc<AppState> {
    let storage: Arc<dyn Storage> = Arc::new(Local::in_memory().await);
    Arc::new(AppState::new(storage, Config::for_tests()).unwrap())
  }

  fn auth_headers(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
      header::AUTHORIZATION,
      format!("Bearer {token}").parse().unwrap(),
    );
    headers
  }

  #[tokio::test]
  async fn add_game_returns_the_created_entry() {
    let app = test_state().await;
    let user = User::sample("u1", "u1@example.com", "U1", Role::Gamer);
    let token = app.sessions.insert(user);
    let headers = auth_headers(&token);

    let req = AddGameReq {
      catalog_id: Some(1),
      name: None,
      genre: Vec::new(),
      rating: None,
      description: String::new(),
      image: None,
    };
    let (status, Json(game)) =
      add_game(State(app.clone()), headers.clone(), Json(req)).await.unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(game.name, "The Witcher 3: Wild Hunt");
    assert_eq!(game.user_id, "u1");
    assert_eq!(game.status, GameStatus::Backlog);

    let query = GamesQuery { status: None, sort: SortBy::default() };
    let Json(games) =
      list_games(State(app.clone()), headers, Query(query)).await.unwrap();
    assert_eq!(games.len(), 1);
    assert_eq!(games[0].id, game.id);
  }

  #[tokio::test]
  async fn add_game_rejects_unknown_catalog_ids() {
    let app = test_state().await;
    let user = User::sample("u1", "u1@example.com", "U1", Role::Gamer);
    let token = app.sessions.insert(user);

    let req = AddGameReq {
      catalog_id: Some(999),
      name: None,
      genre: Vec::new(),
      rating: None,
      description: String::new(),
      image: None,
    };
    let result =
      add_game(State(app), auth_headers(&token), Json(req)).await;
    assert!(matches!(result, Err(Error::GameNotFound)));
  }
}
