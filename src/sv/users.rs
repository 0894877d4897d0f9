//! User accounts and per-user stat counters.

use crate::{
  config::Config,
  model::{StatField, User},
  prelude::*,
  roles::Role,
  storage::{Backend, Storage},
};

pub struct Users<'a> {
  store: &'a dyn Storage,
  config: &'a Config,
}

impl<'a> Users<'a> {
  pub fn new(store: &'a dyn Storage, config: &'a Config) -> Self {
    Self { store, config }
  }

  pub async fn register(
    &self,
    email: &str,
    password: &str,
    display_name: &str,
    role: Role,
  ) -> Result<User> {
    if email.trim().is_empty() || password.is_empty() {
      return Err(Error::InvalidInput("email and password required".into()));
    }
    if matches!(role, Role::Admin | Role::Owner) {
      return Err(Error::InvalidInput(
        "admin accounts cannot self-register".into(),
      ));
    }
    // the owner account only ever comes from the configured credentials
    if email == self.config.owner_email {
      return Err(Error::InvalidInput("email already registered".into()));
    }
    if self.store.find_user(email).await?.is_some() {
      return Err(Error::InvalidInput("email already registered".into()));
    }

    let display_name =
      if display_name.trim().is_empty() { email } else { display_name };
    let user = User::new(email, password, display_name, role);
    self.store.upsert_user(&user).await?;

    info!("registered {} as {}", user.email, user.role);
    Ok(user)
  }

  pub async fn by_id(&self, user_id: &str) -> Result<Option<User>> {
    let users = self.store.users().await?;
    Ok(users.into_iter().find(|u| u.id == user_id))
  }

  /// Admin listing. An empty local store shows the demo pair so the admin
  /// panel has something to render offline.
  pub async fn all(&self) -> Vec<User> {
    match self.store.users().await {
      Ok(users) if users.is_empty() && self.store.backend() == Backend::Local => {
        demo_users()
      }
      Ok(users) => users,
      Err(err) => {
        error!("failed to list users: {err}");
        Vec::new()
      }
    }
  }

  /// Change a user's role. Only admins may edit roles at all, and only
  /// the owner may hand out admin or owner.
  pub async fn update_role(
    &self,
    actor: &User,
    target_id: &str,
    role: Role,
  ) -> Result<User> {
    if !actor.is_admin() {
      return Err(Error::PermissionDenied);
    }
    if matches!(role, Role::Admin | Role::Owner) && !actor.is_owner() {
      return Err(Error::PermissionDenied);
    }

    let mut target =
      self.by_id(target_id).await?.ok_or(Error::UserNotFound)?;
    target.role = role;
    target.last_activity = Utc::now().naive_utc();
    self.store.upsert_user(&target).await?;

    info!("{} set role of {} to {role}", actor.email, target.email);
    Ok(target)
  }

  /// Best-effort counter bump; unsupported backends no-op.
  pub async fn bump_stat(&self, user_id: &str, field: StatField, delta: i64) {
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
}

fn demo_users() -> Vec<User> {
  let mut owner =
    User::new("aterrealms@gmail.com", "", "GamePulse Owner", Role::Owner);
  owner.id = "demo-owner".into();
  let mut gamer =
    User::new("gamer@example.com", "", "Demo Gamer", Role::Gamer);
  gamer.id = "demo-user1".into();
  vec![owner, gamer]
}
