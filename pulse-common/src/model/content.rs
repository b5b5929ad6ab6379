use crate::model::{
    Id,
    author::{Author, CreateAuthor},
    tag::Tag,
    text::{LinkUrl, TagName},
};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use time::OffsetDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct ContentMarker;

/// Engagement counters of a content record. Missing counters deserialize as 0.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct EngagementCounters {
    pub like_count: u64,
    pub comment_count: u64,
    pub view_count: u64,
    pub share_count: u64,
}

impl EngagementCounters {
    /// Likes, comments and shares combined. Views are not engagement.
    #[must_use]
    pub fn total_engagement(self) -> u64 {
        self.like_count
            .saturating_add(self.comment_count)
            .saturating_add(self.share_count)
    }

    /// Engagement per view, or 0 for content nobody has viewed.
    #[must_use]
    pub fn engagement_rate(self) -> f64 {
        ratio(self.total_engagement(), self.view_count)
    }
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Content {
    pub id: Id<ContentMarker>,
    pub author: Author,
    pub url: LinkUrl,
    pub title: String,
    #[serde(flatten)]
    pub counters: EngagementCounters,
    pub thumbnail_url: Option<LinkUrl>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub timestamp: Option<OffsetDateTime>,
    pub metadata: Option<Value>,
    #[serde(skip_serializing)]
    pub secret_value: Option<Value>,
    pub tags: Vec<Tag>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Body of a content creation request.
#[derive(Clone, PartialEq, Debug, Default, Deserialize)]
pub struct CreateContent {
    #[serde(default)]
    pub author: Option<CreateAuthor>,
    #[serde(default)]
    pub url: LinkUrl,
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub counters: EngagementCounters,
    #[serde(default)]
    pub thumbnail_url: Option<LinkUrl>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub timestamp: Option<OffsetDateTime>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub secret_value: Option<Value>,
    /// Names of existing tags. Unknown names are skipped, never created.
    #[serde(default)]
    pub tags: Vec<TagName>,
}

/// A content record as presented by the list endpoint, carrying its derived
/// engagement metrics.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct ContentWithEngagement {
    #[serde(flatten)]
    pub content: Content,
    pub total_engagement: u64,
    #[serde(serialize_with = "serialize_rate")]
    pub engagement_rate: f64,
}

impl From<Content> for ContentWithEngagement {
    fn from(content: Content) -> Self {
        Self {
            total_engagement: content.counters.total_engagement(),
            engagement_rate: content.counters.engagement_rate(),
            content,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Rates are presented with two decimal places.
#[allow(clippy::trivially_copy_pass_by_ref)]
pub(crate) fn serialize_rate<S>(rate: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64((rate * 100.0).round() / 100.0)
}
