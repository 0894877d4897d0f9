use crate::{
  ai::Assistant,
  chat::ChatLog,
  config::Config,
  prelude::*,
  session::{Auth, Sessions},
  storage::Storage,
  sv,
};

/// Shared application state, cloned into every handler and plugin.
#[derive(Clone)]
pub struct AppState {
  pub storage: Arc<dyn Storage>,
  pub sessions: Arc<Sessions>,
  /// Per-user bounded chat history, keyed by user id.
  pub chats: Arc<DashMap<String, ChatLog>>,
  pub assistant: Arc<Assistant>,
  pub config: Arc<Config>,
}

impl AppState {
  pub fn new(storage: Arc<dyn Storage>, config: Config) -> Result<Self> {
    let assistant = Assistant::new(&config)?;

    Ok(Self {
      storage,
      sessions: Arc::new(Sessions::new(config.session_lifetime)),
      chats: Arc::new(DashMap::new()),
      assistant: Arc::new(assistant),
      config: Arc::new(config),
    })
  }

  pub fn sv(&self) -> Services<'_> {
    Services {
      library: sv::Library::new(&*self.storage, &self.config.limits),
      content: sv::Content::new(&*self.storage, &self.config.limits),
      users: sv::Users::new(&*self.storage, &self.config),
      stats: sv::Stats::new(&*self.storage),
    }
  }

  pub fn auth(&self) -> Auth<'_> {
    Auth::new(&*self.storage, &self.config)
  }
}

pub struct Services<'a> {
  pub library: sv::Library<'a>,
  pub content: sv::Content<'a>,
  pub users: sv::Users<'a>,
  pub stats: sv::Stats<'a>,
}
