//! Static sample game catalog.
//!
//! Search always runs against this catalog, whichever storage backend was
//! selected. Admin additions live in storage and are merged by callers.

use std::sync::LazyLock;

use crate::{model::Game, prelude::*};

static SAMPLE_GAMES: LazyLock<Vec<Game>> = LazyLock::new(|| {
  vec![
    Game {
      id: 1,
      name: "The Witcher 3: Wild Hunt".into(),
      genre: vec!["RPG".into(), "Action".into(), "Adventure".into()],
      rating: 4.9,
      description: "An open-world RPG set in a fantasy universe with \
                    incredible storytelling and gameplay."
        .into(),
      image: "🎮".into(),
    },
    Game {
      id: 2,
      name: "Counter-Strike 2".into(),
      genre: vec!["FPS".into(), "Action".into(), "Multiplayer".into()],
      rating: 4.7,
      description: "Tactical team-based first-person shooter with \
                    competitive gameplay."
        .into(),
      image: "🔫".into(),
    },
    Game {
      id: 3,
      name: "Stardew Valley".into(),
      genre: vec!["Simulation".into(), "RPG".into(), "Indie".into()],
      rating: 4.8,
      description: "Relaxing farm simulation role-playing game with endless \
                    possibilities."
        .into(),
      image: "🌱".into(),
    },
    Game {
      id: 4,
      name: "Minecraft".into(),
      genre: vec!["Sandbox".into(), "Adventure".into(), "Indie".into()],
      rating: 4.8,
      description: "Creative sandbox game where you build and explore \
                    infinite worlds."
        .into(),
      image: "🧱".into(),
    },
    Game {
      id: 5,
      name: "Cyberpunk 2077".into(),
      genre: vec!["RPG".into(), "Action".into(), "Sci-fi".into()],
      rating: 4.6,
      description: "Open-world RPG set in a dystopian future with deep \
                    character customization."
        .into(),
      image: "🔮".into(),
    },
  ]
});

/// Simulated lookup latency so the search UX stays consistent offline.
const SEARCH_DELAY: Duration = Duration::from_millis(300);

pub fn sample_games() -> &'static [Game] {
  &SAMPLE_GAMES
}

pub fn by_id(id: i64) -> Option<Game> {
  SAMPLE_GAMES.iter().find(|game| game.id == id).cloned()
}

pub fn featured() -> Vec<Game> {
  SAMPLE_GAMES.iter().take(3).cloned().collect()
}

/// Case-insensitive substring match on name or any genre tag.
pub async fn search(query: &str) -> Vec<Game> {
  time::sleep(SEARCH_DELAY).await;

  let needle = query.to_lowercase();
  SAMPLE_GAMES
    .iter()
    .filter(|game| {
      game.name.to_lowercase().contains(&needle)
        || game.genre.iter().any(|g| g.to_lowercase().contains(&needle))
    })
    .cloned()
    .collect()
}

/// Next id for an admin-added catalog entry.
pub fn next_id(extras: &[Game]) -> i64 {
  SAMPLE_GAMES
    .iter()
    .chain(extras)
    .map(|game| game.id)
    .max()
    .unwrap_or(0)
    + 1
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn search_matches_genre_case_insensitively() {
    let results = search("rpg").await;
    let names: Vec<_> = results.iter().map(|g| g.name.as_str()).collect();

    assert_eq!(results.len(), 3);
    assert!(names.contains(&"The Witcher 3: Wild Hunt"));
    assert!(names.contains(&"Stardew Valley"));
    assert!(names.contains(&"Cyberpunk 2077"));
  }

  #[tokio::test]
  async fn search_matches_name_substring() {
    let results = search("mine").await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name, "Minecraft");

    assert!(search("does-not-exist").await.is_empty());
  }

  #[test]
  fn featured_is_first_three() {
    let featured = featured();
    assert_eq!(featured.len(), 3);
    assert_eq!(featured[0].id, 1);
    assert_eq!(featured[2].id, 3);
  }

  #[test]
  fn next_id_skips_extras() {
    assert_eq!(next_id(&[]), 6);

    let extra = Game {
      id: 9,
      name: "Extra".into(),
      genre: vec![],
      rating: 4.0,
      description: String::new(),
      image: "🎮".into(),
    };
    assert_eq!(next_id(&[extra]), 10);
  }
}
