//! Session and credential handling.
//!
//! Sessions are an explicit table handed around via `AppState`, not
//! process-wide globals. Tokens are opaque and expire after a period of
//! inactivity.

use uuid::Uuid;

use crate::{
  config::Config, model::User, prelude::*, roles::Role, storage::Storage,
};

#[derive(Debug, Clone)]
pub struct Session {
  pub user: User,
  pub last_seen: DateTime,
}

pub struct Sessions {
  inner: DashMap<String, Session>,
  lifetime: i64,
}

impl Sessions {
  pub fn new(lifetime: i64) -> Self {
    Self { inner: DashMap::new(), lifetime }
  }

  pub fn insert(&self, user: User) -> String {
    let token = Uuid::new_v4().to_string();
    self
      .inner
      .insert(token.clone(), Session { user, last_seen: Utc::now().naive_utc() });
    token
  }

  /// Resolve the current user for a token, refreshing its activity stamp.
  pub fn current(&self, token: &str) -> Option<User> {
    let mut session = self.inner.get_mut(token)?;
    session.last_seen = Utc::now().naive_utc();
    Some(session.user.clone())
  }

  pub fn is_logged_in(&self, token: &str) -> bool {
    self.inner.contains_key(token)
  }

  pub fn logout(&self, token: &str) {
    self.inner.remove(token);
  }

  pub fn gc(&self) {
    let now = Utc::now().naive_utc();
    self
      .inner
      .retain(|_, session| (now - session.last_seen).num_seconds() < self.lifetime);
  }

  pub fn is_empty(&self) -> bool {
    self.inner.is_empty()
  }
}

pub struct Auth<'a> {
  store: &'a dyn Storage,
  config: &'a Config,
}

impl<'a> Auth<'a> {
  pub fn new(store: &'a dyn Storage, config: &'a Config) -> Self {
    Self { store, config }
  }

  /// Validate credentials. `None` means no match, which is a normal
  /// outcome rather than an error.
  ///
  /// The owner pair is checked first and works against an empty user
  /// store. Comparison is plain equality, not constant-time.
  pub async fn login(
    &self,
    email: &str,
    password: &str,
  ) -> Result<Option<User>> {
    if email == self.config.owner_email
      && password == self.config.owner_password
    {
      let user = match self.store.find_user(email).await? {
        Some(user) => user,
        None => {
          let owner = User::new(
            email,
            password,
            &self.config.owner_display_name,
            Role::Owner,
          );
          self.store.upsert_user(&owner).await?;
          owner
        }
      };
      return Ok(Some(user));
    }

    let Some(mut user) = self.store.find_user(email).await? else {
      return Ok(None);
    };
    if user.password != password {
      return Ok(None);
    }

    user.last_activity = Utc::now().naive_utc();
    self.store.upsert_user(&user).await?;

    Ok(Some(user))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::storage::local::Local;

  #[tokio::test]
  async fn owner_login_works_on_an_empty_store() {
    let store = Local::in_memory().await;
    let config = Config::for_tests();
    let auth = Auth::new(&store, &config);

    let user = auth
      .login("owner@example.com", "owner-pass")
      .await
      .unwrap()
      .expect("owner login rejected");

    assert_eq!(user.role, Role::Owner);
    assert_eq!(user.display_name, "GamePulse Owner");
    // the owner record got persisted
    assert!(store.find_user("owner@example.com").await.unwrap().is_some());

    let sessions = Sessions::new(config.session_lifetime);
    let token = sessions.insert(user);
    assert!(sessions.is_logged_in(&token));
    assert_eq!(sessions.current(&token).unwrap().role, Role::Owner);
  }

  #[tokio::test]
  async fn wrong_credentials_are_none_not_an_error() {
    let store = Local::in_memory().await;
    let config = Config::for_tests();
    let auth = Auth::new(&store, &config);

    assert!(auth.login("owner@example.com", "wrong").await.unwrap().is_none());
    assert!(auth.login("ghost@example.com", "x").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn stored_users_can_log_in() {
    let store = Local::in_memory().await;
    let config = Config::for_tests();
    let auth = Auth::new(&store, &config);

    let user = User::new("kid@example.com", "hunter2", "Kid", Role::Gamer);
    store.upsert_user(&user).await.unwrap();

    let logged = auth
      .login("kid@example.com", "hunter2")
      .await
      .unwrap()
      .expect("login rejected");
    assert_eq!(logged.id, user.id);

    assert!(auth.login("kid@example.com", "nope").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn logout_clears_the_session() {
    let sessions = Sessions::new(1800);
    let user = User::sample("u", "u@example.com", "U", Role::Gamer);

    let token = sessions.insert(user);
    assert!(sessions.is_logged_in(&token));

    sessions.logout(&token);
    assert!(!sessions.is_logged_in(&token));
    assert!(sessions.current(&token).is_none());
  }

  #[tokio::test]
  async fn gc_drops_stale_sessions() {
    let sessions = Sessions::new(0);
    let user = User::sample("u", "u@example.com", "U", Role::Gamer);
    let token = sessions.insert(user);

    sessions.gc();
    assert!(!sessions.is_logged_in(&token));
    assert!(sessions.is_empty());
  }
}
