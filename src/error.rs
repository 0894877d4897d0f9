//! Error types for the platform service

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] sea_orm::DbErr),

  #[error("remote store error: {0}")]
  Remote(#[from] reqwest::Error),

  #[error("serialization error: {0}")]
  Serde(#[from] json::Error),

  #[error("operation not supported by this backend: {0}")]
  Unsupported(&'static str),

  #[error("user not found")]
  UserNotFound,

  #[error("game not found")]
  GameNotFound,

  #[error("permission denied")]
  PermissionDenied,

  #[error("unauthorized")]
  Unauthorized,

  #[error("invalid input: {0}")]
  InvalidInput(String),

  #[error("internal error: {0}")]
  Internal(String),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      Error::Database(_) => {
        (StatusCode::INTERNAL_SERVER_ERROR, "Database error".into())
      }
      Error::Remote(_) => (StatusCode::BAD_GATEWAY, "Remote store error".into()),
      Error::Serde(_) => {
        (StatusCode::INTERNAL_SERVER_ERROR, "Serialization error".into())
      }
      Error::Unsupported(what) => (
        StatusCode::NOT_IMPLEMENTED,
        format!("Not supported by this backend: {what}"),
      ),
      Error::UserNotFound => (StatusCode::NOT_FOUND, "User not found".into()),
      Error::GameNotFound => (StatusCode::NOT_FOUND, "Game not found".into()),
      Error::PermissionDenied => {
        (StatusCode::FORBIDDEN, "Permission denied".into())
      }
      Error::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".into()),
      Error::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
      Error::Internal(_) => {
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into())
      }
    };

    let body = json::json!({
      "success": false,
      "error": message,
    });

    (status, axum::Json(body)).into_response()
  }
}

pub type Result<T> = std::result::Result<T, Error>;
