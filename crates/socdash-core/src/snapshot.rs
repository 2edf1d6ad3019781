//! Shape of the collector's cached snapshot.
//!
//! The collector writes whatever the platform APIs returned, so decoding is
//! deliberately lenient: a malformed platform block or follower count becomes
//! zero instead of poisoning the whole snapshot.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::engagement::{count_from_value, monthly_engagement, EngagementFields};
use crate::engagement::{FACEBOOK, INSTAGRAM, LINKEDIN};
use crate::month::{MonthKey, MonthlyMetrics};

/// The cached blob: `{ "stats": { ... }, ... }`. Other keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CachedSnapshot {
    pub stats: CurrentStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentStats {
    #[serde(default)]
    pub instagram: PlatformSnapshot,
    #[serde(default)]
    pub facebook: PlatformSnapshot,
    #[serde(default)]
    pub linkedin: PlatformSnapshot,
}

/// Keys that may carry the follower count, highest priority first.
///
/// Graph API pages often report both `fan_count` and `followers_count`.
const FOLLOWER_KEYS: [&str; 3] = ["followers", "followers_count", "fan_count"];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlatformSnapshot {
    pub followers: i64,
    /// Raw posts; field names differ per platform, see [`EngagementFields`].
    pub posts: Vec<Value>,
}

impl PlatformSnapshot {
    /// Decode one platform block. Anything unreadable becomes zero or empty.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let followers = FOLLOWER_KEYS
            .iter()
            .find_map(|key| value.get(*key))
            .map_or(0, count_from_value);
        let posts = match value.get("posts") {
            Some(Value::Array(posts)) => posts.clone(),
            _ => Vec::new(),
        };
        Self { followers, posts }
    }

    #[must_use]
    pub fn likes_in(&self, fields: &EngagementFields, month: MonthKey) -> i64 {
        monthly_engagement(&self.posts, fields, month)
    }
}

impl<'de> Deserialize<'de> for PlatformSnapshot {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

impl CurrentStats {
    /// Follower counts as of now and like totals for posts dated in `month`.
    #[must_use]
    pub fn metrics_for(&self, month: MonthKey) -> MonthlyMetrics {
        MonthlyMetrics {
            instagram_followers: self.instagram.followers,
            instagram_likes: self.instagram.likes_in(&INSTAGRAM, month),
            facebook_followers: self.facebook.followers,
            facebook_likes: self.facebook.likes_in(&FACEBOOK, month),
            linkedin_followers: self.linkedin.followers,
            linkedin_likes: self.linkedin.likes_in(&LINKEDIN, month),
        }
    }
}
