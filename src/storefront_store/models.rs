use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A visitor review as stored by the backing store.
///
/// `rating` is optional because stored data is edited out-of-band and may
/// carry a missing or non-numeric value; aggregation treats those as unrated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub username: String,
    pub rating: Option<i64>,
    pub text: String,
    pub service: Option<String>,
    pub approved: bool,
    pub likes_count: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Older documents store the picture here instead of `avatar_url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// A submission that already passed intake validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReview {
    pub username: String,
    pub rating: u8,
    pub text: String,
    pub service: String,
}

/// Result of applying a like or unlike to a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeMutation {
    /// Whether the visitor likes the review after the mutation.
    pub liked: bool,
    /// False when the mutation was a no-op (already in the requested state).
    pub changed: bool,
    pub likes_count: u64,
}

/// How likes are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LikeMode {
    /// Only the counter is stored; a like can never be taken back.
    CounterOnly,
    /// One like record per (review, visitor); unlike supported.
    #[default]
    Recorded,
}

impl LikeMode {
    pub fn supports_unlike(&self) -> bool {
        matches!(self, LikeMode::Recorded)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LikeMode::CounterOnly => "counter_only",
            LikeMode::Recorded => "recorded",
        }
    }
}

impl FromStr for LikeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counter_only" => Ok(LikeMode::CounterOnly),
            "recorded" => Ok(LikeMode::Recorded),
            _ => Err(format!("Unknown like mode: {}", s)),
        }
    }
}

impl fmt::Display for LikeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single public settings document. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    pub title: Option<String>,
    pub hero_image_url: Option<String>,
    pub platforms_title: Option<String>,
    pub screens_title: Option<String>,
    pub rating_display: Option<f64>,
    pub whatsapp_default_url: Option<String>,
    pub whatsapp_url: Option<String>,
    pub default_avatar_url: Option<String>,
    pub share_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub id: String,
    pub name: String,
    pub logo_url: String,
    pub whatsapp_url: Option<String>,
    pub order: i64,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screen {
    pub id: String,
    pub image_url: String,
    pub order: i64,
    pub active: bool,
}

/// Kinds of read-only display configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigKind {
    Settings,
    Platforms,
    Screens,
}

impl ConfigKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKind::Settings => "settings",
            ConfigKind::Platforms => "platforms",
            ConfigKind::Screens => "screens",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "settings" => Some(ConfigKind::Settings),
            "platforms" => Some(ConfigKind::Platforms),
            "screens" => Some(ConfigKind::Screens),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ConfigPayload {
    /// `None` when the settings document was never created.
    Settings(Option<SiteSettings>),
    Platforms(Vec<Platform>),
    Screens(Vec<Screen>),
}
