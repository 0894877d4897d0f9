//! Bounded per-user chat history. Ephemeral, never persisted.

use std::collections::VecDeque;

use crate::model::{ChatMessage, Sender};

/// Retained history size; the oldest entries are dropped beyond this.
pub const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Default)]
pub struct ChatLog {
  messages: VecDeque<ChatMessage>,
}

impl ChatLog {
  pub fn new() -> Self {
    Self::default()
  }

  /// The cap is enforced synchronously on every append.
  pub fn push(&mut self, sender: Sender, text: impl Into<String>) {
    self.messages.push_back(ChatMessage::new(sender, text));
    while self.messages.len() > HISTORY_LIMIT {
      self.messages.pop_front();
    }
  }

  pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
    self.messages.iter()
  }

  pub fn to_vec(&self) -> Vec<ChatMessage> {
    self.messages().cloned().collect()
  }

  pub fn len(&self) -> usize {
    self.messages.len()
  }

  pub fn is_empty(&self) -> bool {
    self.messages.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn history_is_bounded_at_fifty() {
    let mut log = ChatLog::new();
    for i in 0..60 {
      log.push(Sender::User, format!("message {i}"));
    }

    assert_eq!(log.len(), HISTORY_LIMIT);

    // the 10 oldest dropped, ordering preserved
    let texts: Vec<_> = log.messages().map(|m| m.text.clone()).collect();
    assert_eq!(texts.first().unwrap(), "message 10");
    assert_eq!(texts.last().unwrap(), "message 59");
    for pair in texts.windows(2) {
      let a: u32 = pair[0].trim_start_matches("message ").parse().unwrap();
      let b: u32 = pair[1].trim_start_matches("message ").parse().unwrap();
      assert_eq!(b, a + 1);
    }
  }

  #[test]
  fn short_history_keeps_everything() {
    let mut log = ChatLog::new();
    log.push(Sender::User, "hi");
    log.push(Sender::Ai, "hello");

    assert_eq!(log.len(), 2);
    assert_eq!(log.messages().next().unwrap().sender, Sender::User);
  }
}
