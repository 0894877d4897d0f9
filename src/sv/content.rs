//! Blog content gateway.

use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  config::Limits,
  model::{BlogPost, PostStatus, StatField, User},
  prelude::*,
  roles::{Permission, Role},
  storage::{Backend, Storage},
};

#[derive(Debug, Deserialize)]
pub struct PostDraft {
  pub title: String,
  pub category: String,
  pub content: String,
  #[serde(default)]
  pub tags: Vec<String>,
}

pub struct Content<'a> {
  store: &'a dyn Storage,
  limits: &'a Limits,
}

impl<'a> Content<'a> {
  pub fn new(store: &'a dyn Storage, limits: &'a Limits) -> Self {
    Self { store, limits }
  }

  /// Published posts. An empty local store is seeded with the sample
  /// articles first.
  pub async fn approved(&self) -> Result<Vec<BlogPost>> {
    let mut posts = self.store.posts().await?;

    if posts.is_empty() && self.store.backend() == Backend::Local {
      posts = sample_posts();
      for post in &posts {
        self.store.insert_post(post).await?;
      }
    }

    posts.retain(|p| p.status == PostStatus::Approved);
    Ok(posts)
  }

  pub async fn by_user(&self, user_id: &str) -> Result<Vec<BlogPost>> {
    let posts = self.store.posts().await?;
    Ok(posts.into_iter().filter(|p| p.author_id == user_id).collect())
  }

  pub async fn create(
    &self,
    author: &User,
    draft: PostDraft,
  ) -> Result<BlogPost> {
    let can_publish = author.role.has(Permission::CreateContent)
      || author.role.has(Permission::CreateLessons)
      || author.role.has(Permission::ManageContent);
    if !can_publish {
      return Err(Error::PermissionDenied);
    }

    if draft.title.trim().is_empty() || draft.category.trim().is_empty() {
      return Err(Error::InvalidInput("title and category required".into()));
    }

    let existing = self.by_user(&author.id).await?;
    if existing.len() >= self.limits.max_content_per_creator {
      return Err(Error::InvalidInput("content limit reached".into()));
    }

    let status = if author.role.auto_approves_content() {
      PostStatus::Approved
    } else {
      PostStatus::Pending
    };

    let post = BlogPost {
      id: Uuid::new_v4().to_string(),
      title: draft.title,
      category: draft.category,
      content: draft.content,
      tags: draft.tags,
      author_id: author.id.clone(),
      author_name: author.display_name.clone(),
      author_role: author.role,
      status,
      created_at: Utc::now().naive_utc(),
      views: 0,
      likes: 0,
      comments: Vec::new(),
    };

    self.store.insert_post(&post).await?;

    // best-effort counter
    if let Err(err) = self
      .store
      .increment_stat(&author.id, StatField::ContentCount, 1)
      .await
      && !matches!(err, Error::Unsupported(_))
    {
      warn!("failed to bump contentCount for {}: {err}", author.id);
    }

    Ok(post)
  }

  /// The author may delete their own posts; admins and the owner may
  /// delete anything. `Ok(false)` when the post no longer exists.
  pub async fn delete(&self, actor: &User, post_id: &str) -> Result<bool> {
    let posts = self.store.posts().await?;
    let Some(post) = posts.iter().find(|p| p.id == post_id) else {
      return Ok(false);
    };

    if !(actor.is_admin() || post.author_id == actor.id) {
      return Err(Error::PermissionDenied);
    }

    self.store.delete_post(post_id).await
  }
}

fn date(year: i32, month: u32, day: u32) -> DateTime {
  NaiveDate::from_ymd_opt(year, month, day)
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .unwrap_or_default()
}

fn sample_posts() -> Vec<BlogPost> {
  let sample = |id: &str,
                title: &str,
                category: &str,
                content: &str,
                tags: &[&str],
                author: &str,
                role: Role,
                created: DateTime,
                views: i64,
                likes: i64| {
    BlogPost {
      id: id.into(),
      title: title.into(),
      category: category.into(),
      content: content.into(),
      tags: tags.iter().map(|t| t.to_string()).collect(),
      author_id: "system".into(),
      author_name: author.into(),
      author_role: role,
      status: PostStatus::Approved,
      created_at: created,
      views,
      likes,
      comments: Vec::new(),
    }
  };

  vec![
    sample(
      "sample-1",
      "The Bright Side: How Roblox Empowers Young Minds",
      "education",
      "Roblox isn't just a game - it's a creation platform. With Roblox \
       Studio, kids learn 3D modeling, basic coding with Lua scripting, and \
       game design principles...",
      &["education", "creativity", "coding"],
      "Alex Chen",
      Role::ContentCreator,
      date(2024, 1, 15),
      1250,
      89,
    ),
    sample(
      "sample-2",
      "Understanding the Concerns: Roblox Safety Guide",
      "safety",
      "While Roblox has many benefits, parents should be aware of privacy \
       concerns, screen time management, and the importance of parental \
       controls...",
      &["safety", "parenting", "online-safety"],
      "Maria Gonzalez",
      Role::ContentCreator,
      date(2024, 1, 12),
      980,
      67,
    ),
    sample(
      "sample-3",
      "The Ultimate Parent's Guide to Roblox",
      "parenting",
      "The best approach? Play together! Ask your child to teach you their \
       favorite game, discuss the games they play, and set clear rules \
       together...",
      &["parenting", "guide", "family-gaming"],
      "Dr. Sarah Johnson",
      Role::Teacher,
      date(2024, 1, 10),
      1560,
      112,
    ),
  ]
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::storage::local::Local;

  fn draft(title: &str) -> PostDraft {
    PostDraft {
      title: title.into(),
      category: "general".into(),
      content: "body".into(),
      tags: vec!["test".into()],
    }
  }

  #[tokio::test]
  async fn empty_local_store_seeds_samples() {
    let store = Local::in_memory().await;
    let limits = Limits::default();
    let content = Content::new(&store, &limits);

    let posts = content.approved().await.unwrap();
    assert_eq!(posts.len(), 3);
    assert!(posts.iter().all(|p| p.status == PostStatus::Approved));

    // seeding happened once, not per call
    let again = content.approved().await.unwrap();
    assert_eq!(again.len(), 3);
    assert_eq!(store.posts().await.unwrap().len(), 3);
  }

  #[tokio::test]
  async fn creators_post_pending_admins_post_approved() {
    let store = Local::in_memory().await;
    let limits = Limits::default();
    let content = Content::new(&store, &limits);

    let creator =
      User::sample("c", "c@example.com", "Creator", Role::ContentCreator);
    let teacher = User::sample("t", "t@example.com", "Teach", Role::Teacher);
    let admin = User::sample("a", "a@example.com", "Admin", Role::Admin);
    let gamer = User::sample("g", "g@example.com", "Gamer", Role::Gamer);

    let post = content.create(&creator, draft("One")).await.unwrap();
    assert_eq!(post.status, PostStatus::Pending);

    let post = content.create(&teacher, draft("Two")).await.unwrap();
    assert_eq!(post.status, PostStatus::Pending);

    let post = content.create(&admin, draft("Three")).await.unwrap();
    assert_eq!(post.status, PostStatus::Approved);

    assert!(matches!(
      content.create(&gamer, draft("Nope")).await,
      Err(Error::PermissionDenied)
    ));

    assert!(matches!(
      content.create(&admin, draft("")).await,
      Err(Error::InvalidInput(_))
    ));
  }

  #[tokio::test]
  async fn delete_respects_ownership() {
    let store = Local::in_memory().await;
    let limits = Limits::default();
    let content = Content::new(&store, &limits);

    let creator =
      User::sample("c", "c@example.com", "Creator", Role::ContentCreator);
    let other =
      User::sample("o", "o@example.com", "Other", Role::ContentCreator);
    let admin = User::sample("a", "a@example.com", "Admin", Role::Admin);

    let post = content.create(&creator, draft("Mine")).await.unwrap();

    assert!(matches!(
      content.delete(&other, &post.id).await,
      Err(Error::PermissionDenied)
    ));
    assert!(content.delete(&creator, &post.id).await.unwrap());
    // already gone
    assert!(!content.delete(&admin, &post.id).await.unwrap());

    let post = content.create(&creator, draft("Again")).await.unwrap();
    assert!(content.delete(&admin, &post.id).await.unwrap());
  }

  #[tokio::test]
  async fn by_user_filters_on_author() {
    let store = Local::in_memory().await;
    let limits = Limits::default();
    let content = Content::new(&store, &limits);

    let creator =
      User::sample("c", "c@example.com", "Creator", Role::ContentCreator);
    content.create(&creator, draft("One")).await.unwrap();
    content.create(&creator, draft("Two")).await.unwrap();

    assert_eq!(content.by_user("c").await.unwrap().len(), 2);
    assert!(content.by_user("other").await.unwrap().is_empty());
  }
}
