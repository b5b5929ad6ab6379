use crate::model::{
    Id,
    text::{AuthorName, AuthorUsername, Headline, LinkUrl},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct AuthorMarker;

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Author {
    pub id: Id<AuthorMarker>,
    pub name: AuthorName,
    pub username: AuthorUsername,
    pub url: LinkUrl,
    pub title: Headline,
    pub metadata: Option<Value>,
    #[serde(skip_serializing)]
    pub secret_value: Option<Value>,
    pub followers: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Author block nested in a content creation request. Only `username` is
/// consulted when an author with that username already exists.
#[derive(Clone, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct CreateAuthor {
    pub username: AuthorUsername,
    #[serde(default)]
    pub name: AuthorName,
    #[serde(default)]
    pub url: LinkUrl,
    #[serde(default)]
    pub title: Headline,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub secret_value: Option<Value>,
    #[serde(default)]
    pub followers: u64,
}

#[cfg(test)]
mod tests {
    use crate::model::author::CreateAuthor;

    #[test]
    fn create_author_defaults() {
        let author: CreateAuthor = serde_json::from_str(r#"{"username": "ferris"}"#).unwrap();

        assert_eq!(author.username.get(), "ferris");
        assert_eq!(author.name.get(), "");
        assert_eq!(author.followers, 0);
        assert!(author.metadata.is_none());
    }

    #[test]
    fn create_author_requires_username() {
        assert!(serde_json::from_str::<CreateAuthor>(r#"{"name": "Ferris"}"#).is_err());
        assert!(serde_json::from_str::<CreateAuthor>(r#"{"username": ""}"#).is_err());
        assert!(
            serde_json::from_str::<CreateAuthor>(r#"{"username": "a", "followers": -1}"#)
                .is_err()
        );
    }
}
