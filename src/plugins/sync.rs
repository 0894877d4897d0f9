//! One-shot upload of locally tracked libraries to the remote store.
//!
//! Runs only when the remote backend won the startup probe. Anything
//! written to the local database during an earlier offline run is pushed
//! up once; failures are logged and skipped, never fatal.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
  prelude::*,
  state::AppState,
  storage::{Backend, Storage, local::Local},
};

pub struct Plugin;

#[async_trait]
impl super::Plugin for Plugin {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    if app.storage.backend() != Backend::Local {
      sync_local_games(&*app.storage, &app.config.db_url).await;
    }

    Ok(())
  }
}

async fn sync_local_games(remote: &dyn Storage, db_url: &str) {
  let local = match Local::connect(db_url).await {
    Ok(local) => local,
    Err(err) => {
      debug!("no local database to sync from: {err}");
      return;
    }
  };

  let users = match local.users().await {
    Ok(users) => users,
    Err(err) => {
      warn!("failed to read local users for sync: {err}");
      return;
    }
  };

  let mut pushed = 0usize;
  for user in users {
    let games = match local.user_games(&user.id).await {
      Ok(games) => games,
      Err(err) => {
        warn!("failed to read local games for {}: {err}", user.id);
        continue;
      }
    };
    if games.is_empty() {
      continue;
    }

    let known: Vec<String> = remote
      .user_games(&user.id)
      .await
      .map(|remote_games| {
        remote_games.into_iter().map(|g| g.name).collect()
      })
      .unwrap_or_default();

    for game in games {
      if known.contains(&game.name) {
        continue;
      }
      match remote.insert_user_game(&user.id, game).await {
        Ok(_) => pushed += 1,
        Err(err) => warn!("failed to push game for {}: {err}", user.id),
      }
    }
  }

  if pushed > 0 {
    info!("synced {pushed} locally tracked games to the remote store");
  }
}
