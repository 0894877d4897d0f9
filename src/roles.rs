//! Role registry and access control.
//!
//! Roles are a closed enum so permission and UI decisions are matched
//! exhaustively instead of dispatched through string-keyed tables.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::model::User;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
  #[default]
  Gamer,
  ContentCreator,
  Teacher,
  Admin,
  Owner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
  ViewGames,
  TrackGames,
  ViewCommunity,
  UseAi,
  CreateContent,
  ViewAnalytics,
  CreateLessons,
  ManageStudents,
  ManageUsers,
  ManageContent,
  PlatformSettings,
  /// Wildcard granting every capability.
  All,
}

impl Permission {
  /// Read-only permissions that a guest (no session) may still use.
  pub fn is_public(self) -> bool {
    matches!(self, Permission::ViewGames | Permission::ViewCommunity)
  }
}

use Permission::*;

impl Role {
  pub const ALL: [Role; 5] =
    [Role::Gamer, Role::ContentCreator, Role::Teacher, Role::Admin, Role::Owner];

  pub fn permissions(self) -> &'static [Permission] {
    match self {
      Role::Gamer => &[ViewGames, TrackGames, ViewCommunity, UseAi],
      Role::ContentCreator => {
        &[ViewGames, TrackGames, CreateContent, ViewAnalytics, UseAi]
      }
      Role::Teacher => {
        &[ViewGames, TrackGames, CreateLessons, ManageStudents, UseAi]
      }
      Role::Admin => &[
        ViewGames,
        TrackGames,
        ManageUsers,
        ManageContent,
        ViewAnalytics,
        PlatformSettings,
        UseAi,
      ],
      Role::Owner => &[All],
    }
  }

  pub fn has(self, permission: Permission) -> bool {
    let set = self.permissions();
    set.contains(&permission) || set.contains(&All)
  }

  pub fn display_name(self) -> &'static str {
    match self {
      Role::Gamer => "Gamer",
      Role::ContentCreator => "Content Creator",
      Role::Teacher => "Teacher",
      Role::Admin => "Administrator",
      Role::Owner => "Owner",
    }
  }

  /// Accent color used by the frontend for role badges.
  pub fn color(self) -> &'static str {
    match self {
      Role::Gamer => "#667eea",
      Role::ContentCreator => "#ed64a6",
      Role::Teacher => "#48bb78",
      Role::Admin => "#f56565",
      Role::Owner => "#9f7aea",
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Role::Gamer => "gamer",
      Role::ContentCreator => "content-creator",
      Role::Teacher => "teacher",
      Role::Admin => "admin",
      Role::Owner => "owner",
    }
  }

  /// Roles whose content is published without review.
  pub fn auto_approves_content(self) -> bool {
    matches!(self, Role::Admin | Role::Owner)
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = crate::error::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "gamer" => Ok(Role::Gamer),
      "content-creator" => Ok(Role::ContentCreator),
      "teacher" => Ok(Role::Teacher),
      "admin" => Ok(Role::Admin),
      "owner" => Ok(Role::Owner),
      other => {
        Err(crate::error::Error::InvalidInput(format!("unknown role: {other}")))
      }
    }
  }
}

/// True if `user` may perform `permission`.
///
/// `None` means guest: denied everything except public read-only access.
pub fn allowed(user: Option<&User>, permission: Permission) -> bool {
  match user {
    Some(user) => user.role.has(permission),
    None => permission.is_public(),
  }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct QuickAction {
  pub label: &'static str,
  pub prompt: &'static str,
}

const GENERAL_HELP: QuickAction = QuickAction {
  label: "🤖 General Help",
  prompt: "What can you help me with based on my role?",
};

/// Static per-role chat menu, always prefixed by the role-agnostic entry.
pub fn quick_actions(role: Role) -> Vec<QuickAction> {
  let specific: &[QuickAction] = match role {
    Role::Gamer => &[
      QuickAction {
        label: "🎮 Game Recommendations",
        prompt: "Recommend some games I might like",
      },
      QuickAction {
        label: "💡 Gaming Tips",
        prompt: "Share some general gaming tips and strategies",
      },
      QuickAction {
        label: "📊 Game Reviews",
        prompt: "What makes a game highly rated and popular?",
      },
    ],
    Role::ContentCreator => &[
      QuickAction {
        label: "🎥 Content Ideas",
        prompt: "Give me content ideas for my gaming channel",
      },
      QuickAction {
        label: "📈 Growth Tips",
        prompt: "How can I grow my gaming content audience?",
      },
      QuickAction {
        label: "🎯 Trend Analysis",
        prompt: "What gaming trends should I focus on?",
      },
    ],
    Role::Teacher => &[
      QuickAction {
        label: "👨\u{200d}🏫 Educational Games",
        prompt: "Recommend educational games for students",
      },
      QuickAction {
        label: "📚 Learning Strategies",
        prompt: "How to use games for effective learning?",
      },
      QuickAction {
        label: "🎮 Classroom Gaming",
        prompt: "Tips for integrating games in classroom",
      },
    ],
    Role::Admin => &[
      QuickAction {
        label: "⚙️ Platform Management",
        prompt: "Best practices for platform management",
      },
      QuickAction {
        label: "📊 User Analytics",
        prompt: "How to analyze user engagement and growth?",
      },
      QuickAction {
        label: "👥 Community Building",
        prompt: "Strategies for building gaming community",
      },
    ],
    Role::Owner => &[
      QuickAction {
        label: "🚀 Business Growth",
        prompt: "Strategies for platform growth and monetization",
      },
      QuickAction {
        label: "📈 Market Analysis",
        prompt: "Gaming platform market trends and opportunities",
      },
      QuickAction {
        label: "💡 Innovation Ideas",
        prompt: "Innovative features for gaming platforms",
      },
    ],
  };

  std::iter::once(GENERAL_HELP).chain(specific.iter().copied()).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::User;

  #[test]
  fn every_role_has_permissions() {
    for role in Role::ALL {
      assert!(!role.permissions().is_empty(), "{role} has no permissions");
    }
  }

  #[test]
  fn permission_membership() {
    for role in Role::ALL {
      for &perm in role.permissions() {
        assert!(role.has(perm), "{role} should hold {perm:?}");
      }
    }

    assert!(!Role::Gamer.has(ManageUsers));
    assert!(!Role::Teacher.has(CreateContent));
    assert!(!Role::ContentCreator.has(PlatformSettings));
  }

  #[test]
  fn owner_wildcard_grants_everything() {
    for perm in [
      ViewGames,
      TrackGames,
      ViewCommunity,
      UseAi,
      CreateContent,
      ViewAnalytics,
      CreateLessons,
      ManageStudents,
      ManageUsers,
      ManageContent,
      PlatformSettings,
    ] {
      assert!(Role::Owner.has(perm));
    }
  }

  #[test]
  fn guest_gets_only_public_access() {
    assert!(allowed(None, ViewGames));
    assert!(allowed(None, ViewCommunity));
    assert!(!allowed(None, TrackGames));
    assert!(!allowed(None, UseAi));
    assert!(!allowed(None, ManageUsers));

    let gamer = User::sample("u1", "g@example.com", "Demo", Role::Gamer);
    assert!(allowed(Some(&gamer), TrackGames));
    assert!(!allowed(Some(&gamer), ManageUsers));
  }

  #[test]
  fn quick_actions_start_with_general_help() {
    for role in Role::ALL {
      let actions = quick_actions(role);
      assert_eq!(actions.len(), 4);
      assert_eq!(actions[0].label, GENERAL_HELP.label);
    }
  }

  #[test]
  fn role_round_trips_through_wire_form() {
    for role in Role::ALL {
      assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
    }
    assert!("youth-mentor".parse::<Role>().is_err());
  }
}
