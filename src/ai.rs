//! Generative-text gateway.
//!
//! The assistant degrades instead of failing: a missing key or an upstream
//! error turns into a fixed fallback string, never an HTTP error, so the
//! chat surface stays usable offline.

use serde::Deserialize;

use crate::{config::Config, prelude::*, roles::Role};

const GENERATION_BASE: &str =
  "https://generativelanguage.googleapis.com/v1beta";

pub const UNAVAILABLE: &str = "🤖 AI features are currently unavailable. \
                               Please check your API configuration.";
pub const CONNECT_FAILED: &str = "❌ I'm having trouble connecting right \
                                  now. Please try again later.";

const MAX_OUTPUT_TOKENS: u32 = 1000;
const TEMPERATURE: f64 = 0.7;

#[derive(Debug, Deserialize)]
struct Generated {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
  content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
  #[serde(default)]
  parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
  text: String,
}

pub struct Assistant {
  client: reqwest::Client,
  api_key: Option<String>,
  model: String,
  base: String,
}

impl Assistant {
  pub fn new(config: &Config) -> Result<Self> {
    let client =
      reqwest::Client::builder().timeout(config.ai_timeout).build()?;

    if config.gemini_api_key.is_none() {
      warn!("no generative api key configured, ai features disabled");
    }

    Ok(Self {
      client,
      api_key: config.gemini_api_key.clone(),
      model: config.gemini_model.clone(),
      base: GENERATION_BASE.into(),
    })
  }

  pub fn enabled(&self) -> bool {
    self.api_key.is_some()
  }

  async fn generate(&self, key: &str, prompt: &str) -> Result<String> {
    let url = format!(
      "{}/models/{}:generateContent?key={key}",
      self.base, self.model
    );

    let body = json::json!({
      "contents": [{ "parts": [{ "text": prompt }] }],
      "generationConfig": {
        "maxOutputTokens": MAX_OUTPUT_TOKENS,
        "temperature": TEMPERATURE,
      },
    });

    let generated: Generated = self
      .client
      .post(url)
      .json(&body)
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;

    let text = generated
      .candidates
      .into_iter()
      .next()
      .and_then(|c| c.content.parts.into_iter().next())
      .map(|p| p.text)
      .ok_or_else(|| Error::Internal("empty generation response".into()))?;

    Ok(text)
  }

  /// Run a prompt, mapping every failure mode to a canned reply.
  pub async fn respond(&self, prompt: &str) -> String {
    let Some(key) = &self.api_key else {
      return UNAVAILABLE.into();
    };

    match self.generate(key, prompt).await {
      Ok(text) => text,
      Err(err) => {
        warn!("generation failed: {err}");
        CONNECT_FAILED.into()
      }
    }
  }

  /// Free-form chat message wrapped in the caller's role context.
  pub async fn chat(&self, message: &str, role: Role) -> String {
    self.respond(&prompts::role_chat(message, role)).await
  }
}

/// Prompt builders. Kept as plain functions so handlers and tests can
/// inspect the text without a live client.
pub mod prompts {
  use crate::roles::Role;

  fn role_context(role: Role) -> &'static str {
    match role {
      Role::Gamer => {
        "You're helping a gamer with game recommendations, tips, and \
         gaming advice."
      }
      Role::ContentCreator => {
        "You're helping a content creator with content ideas, audience \
         engagement, and gaming trends."
      }
      Role::Teacher => {
        "You're helping a teacher with educational games, learning \
         strategies, and student engagement."
      }
      Role::Admin => {
        "You're helping an admin with platform management, user \
         analytics, and community growth."
      }
      Role::Owner => {
        "You're helping the platform owner with business insights, \
         platform strategy, and growth opportunities."
      }
    }
  }

  pub fn role_chat(message: &str, role: Role) -> String {
    format!(
      "{context}\nUser role: {name}\nUser message: \"{message}\"\n\n\
       Respond in a friendly, helpful tone. Be specific to their role \
       when relevant. Use appropriate emojis. Keep responses concise but \
       informative.",
      context = role_context(role),
      name = role.display_name(),
    )
  }

  pub fn recommendations(preferences: &str, owned: &[String]) -> String {
    let owned =
      if owned.is_empty() { "none".to_string() } else { owned.join(", ") };
    format!(
      "As a gaming expert, recommend 3 games for a gamer based on:\n\
       - Preferences: {preferences}\n\
       - Current games: {owned}\n\n\
       For each game, provide:\n\
       - Title and genre\n\
       - Why it matches their taste\n\
       - Key features they'll enjoy\n\
       - Any important considerations\n\n\
       Make it personalized and engaging! Use gaming emojis."
    )
  }

  pub fn game_tips(game: &str, area: Option<&str>) -> String {
    match area {
      Some(area) => format!(
        "Provide 3 advanced tips for {game} focusing on: {area}. Make \
         tips actionable and role-appropriate."
      ),
      None => format!(
        "Provide 5 essential tips for {game}. Include beginner to \
         advanced advice."
      ),
    }
  }

  pub fn review_summary(game: &str) -> String {
    format!(
      "Provide a balanced 150-word overview of {game} covering:\n\
       - What type of game it is 🎮\n\
       - Key strengths 🌟\n\
       - Potential drawbacks ⚠️\n\
       - Who would enjoy it most 🎯\n\
       - Overall impression 💫\n\n\
       Be honest and informative. Use some emojis to make it engaging."
    )
  }

  pub fn content_ideas(trending: &[String], style: &str) -> String {
    let style =
      if style.is_empty() { "general gaming content" } else { style };
    format!(
      "Generate 5 content ideas for a gaming content creator:\n\
       - Trending games: {}\n\
       - Creator style: {style}\n\n\
       Include:\n\
       - Video/article topics\n\
       - Engaging titles\n\
       - Key talking points\n\
       - Target audience appeal\n\n\
       Make it creative and platform-optimized! 🎥",
      trending.join(", "),
    )
  }

  pub fn educational_games(age_group: &str, goals: &str) -> String {
    let age_group =
      if age_group.is_empty() { "not specified" } else { age_group };
    let goals = if goals.is_empty() { "general education" } else { goals };
    format!(
      "Recommend educational games and strategies for a teacher:\n\
       - Age group: {age_group}\n\
       - Learning goals: {goals}\n\n\
       Include:\n\
       - Game recommendations with educational value\n\
       - Learning activities using games\n\
       - Engagement strategies\n\
       - Assessment ideas\n\n\
       Focus on educational benefits! 👨\u{200d}🏫"
    )
  }

  pub fn platform_insights(metrics: &json::Value) -> String {
    format!(
      "Provide platform management insights for an admin:\n\
       - Current metrics: {metrics}\n\n\
       Analyze:\n\
       - User engagement trends\n\
       - Potential issues\n\
       - Growth opportunities\n\
       - Community management tips\n\n\
       Be strategic and data-informed! ⚙️"
    )
  }

  pub fn business_insights(data: &json::Value) -> String {
    format!(
      "Provide business insights for a platform owner:\n\
       - Platform data: {data}\n\n\
       Analyze:\n\
       - Revenue opportunities\n\
       - Market positioning\n\
       - Competitive advantages\n\
       - Growth strategies\n\
       - Risk assessment\n\n\
       Be strategic and business-focused! 👑"
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn missing_key_yields_the_unavailable_reply() {
    let assistant = Assistant::new(&Config::for_tests()).unwrap();
    assert!(!assistant.enabled());

    let reply = assistant.chat("hello", Role::Gamer).await;
    assert_eq!(reply, UNAVAILABLE);
  }

  #[tokio::test]
  async fn unreachable_service_yields_the_connect_reply() {
    let mut config = Config::for_tests();
    config.gemini_api_key = Some("test-key".into());
    config.ai_timeout = Duration::from_millis(200);

    let mut assistant = Assistant::new(&config).unwrap();
    // nothing listens here
    assistant.base = "http://127.0.0.1:9".into();

    let reply = assistant.respond("hello").await;
    assert_eq!(reply, CONNECT_FAILED);
  }

  #[test]
  fn chat_prompt_carries_role_context() {
    let prompt = prompts::role_chat("best rpg?", Role::Teacher);
    assert!(prompt.contains("educational games"));
    assert!(prompt.contains("User role: Teacher"));
    assert!(prompt.contains("\"best rpg?\""));
  }

  #[test]
  fn recommendation_prompt_lists_owned_games() {
    let prompt =
      prompts::recommendations("RPG", &["Minecraft".into(), "Hades".into()]);
    assert!(prompt.contains("Minecraft, Hades"));

    let prompt = prompts::recommendations("RPG", &[]);
    assert!(prompt.contains("Current games: none"));
  }

  #[test]
  fn tips_prompt_switches_on_focus_area() {
    assert!(prompts::game_tips("Hades", None).contains("5 essential tips"));
    assert!(
      prompts::game_tips("Hades", Some("bosses")).contains("3 advanced tips")
    );
  }
}
