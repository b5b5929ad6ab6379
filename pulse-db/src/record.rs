use crate::client::DbError;
use pulse_common::model::{
    ModelValidationError,
    author::Author,
    content::{Content, EngagementCounters},
    tag::Tag,
    text::{AuthorName, AuthorUsername, Headline, LinkUrl, TagName},
};
use serde_json::Value;
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Clone, PartialEq, Debug, FromRow)]
pub(crate) struct AuthorRecord {
    pub author_id: i64,
    pub name: String,
    pub username: String,
    pub url: String,
    pub title: String,
    pub metadata: Option<Value>,
    pub secret_value: Option<Value>,
    pub followers: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct TagRecord {
    pub tag_id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct ContentTagRecord {
    pub content_id: i64,
    #[sqlx(flatten)]
    pub tag: TagRecord,
}

/// A content row joined with its author. Author columns carry an `author_`
/// prefix, see [`crate::query::CONTENT_COLUMNS`].
#[derive(Clone, PartialEq, Debug, FromRow)]
pub(crate) struct FullContentRecord {
    pub content_id: i64,
    pub url: String,
    pub title: String,
    pub like_count: i64,
    pub comment_count: i64,
    pub view_count: i64,
    pub share_count: i64,
    pub thumbnail_url: Option<String>,
    pub timestamp: Option<OffsetDateTime>,
    pub metadata: Option<Value>,
    pub secret_value: Option<Value>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub author_id: i64,
    pub author_name: String,
    pub author_username: String,
    pub author_url: String,
    pub author_title: String,
    pub author_metadata: Option<Value>,
    pub author_secret_value: Option<Value>,
    pub author_followers: i64,
    pub author_created_at: OffsetDateTime,
    pub author_updated_at: OffsetDateTime,
}

impl TryFrom<AuthorRecord> for Author {
    type Error = ModelValidationError;

    fn try_from(value: AuthorRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.author_id.cast_unsigned().into(),
            name: AuthorName::new(value.name)?,
            username: AuthorUsername::new(value.username)?,
            url: LinkUrl::new(value.url)?,
            title: Headline::new(value.title)?,
            metadata: value.metadata,
            secret_value: value.secret_value,
            followers: value.followers.try_into()?,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

impl TryFrom<TagRecord> for Tag {
    type Error = ModelValidationError;

    fn try_from(value: TagRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.tag_id.cast_unsigned().into(),
            name: TagName::new(value.name)?,
            description: value.description,
        })
    }
}

impl FullContentRecord {
    pub(crate) fn into_content(self, tags: Vec<Tag>) -> Result<Content, ModelValidationError> {
        let author = AuthorRecord {
            author_id: self.author_id,
            name: self.author_name,
            username: self.author_username,
            url: self.author_url,
            title: self.author_title,
            metadata: self.author_metadata,
            secret_value: self.author_secret_value,
            followers: self.author_followers,
            created_at: self.author_created_at,
            updated_at: self.author_updated_at,
        };

        Ok(Content {
            id: self.content_id.cast_unsigned().into(),
            author: author.try_into()?,
            url: LinkUrl::new(self.url)?,
            title: self.title,
            counters: EngagementCounters {
                like_count: self.like_count.try_into()?,
                comment_count: self.comment_count.try_into()?,
                view_count: self.view_count.try_into()?,
                share_count: self.share_count.try_into()?,
            },
            thumbnail_url: self.thumbnail_url.map(LinkUrl::new).transpose()?,
            timestamp: self.timestamp,
            metadata: self.metadata,
            secret_value: self.secret_value,
            tags,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Converts a counter for storage. Counters above `i64::MAX` cannot be stored.
pub(crate) fn counter_to_db(counter: u64) -> Result<i64, DbError> {
    i64::try_from(counter).map_err(|_| DbError::CounterOutOfRange(counter))
}

#[cfg(test)]
mod tests {
    use crate::{
        client::DbError,
        record::{AuthorRecord, FullContentRecord, TagRecord, counter_to_db},
    };
    use pulse_common::model::{ModelValidationError, author::Author, tag::Tag};
    use time::macros::datetime;

    fn content_record() -> FullContentRecord {
        FullContentRecord {
            content_id: 12,
            url: "https://example.com/post".to_owned(),
            title: "Launch".to_owned(),
            like_count: 10,
            comment_count: 2,
            view_count: 100,
            share_count: 3,
            thumbnail_url: None,
            timestamp: Some(datetime!(2026-04-01 08:00 UTC)),
            metadata: None,
            secret_value: None,
            created_at: datetime!(2026-04-01 08:00 UTC),
            updated_at: datetime!(2026-04-02 08:00 UTC),
            author_id: 3,
            author_name: "Ferris".to_owned(),
            author_username: "ferris".to_owned(),
            author_url: String::new(),
            author_title: String::new(),
            author_metadata: None,
            author_secret_value: None,
            author_followers: 40,
            author_created_at: datetime!(2026-01-01 00:00 UTC),
            author_updated_at: datetime!(2026-01-01 00:00 UTC),
        }
    }

    #[test]
    fn content_record_conversion() {
        let tag = Tag::try_from(TagRecord {
            tag_id: 5,
            name: "rust".to_owned(),
            description: None,
        })
        .unwrap();
        let content = content_record().into_content(vec![tag.clone()]).unwrap();

        assert_eq!(content.id.get(), 12);
        assert_eq!(content.author.id.get(), 3);
        assert_eq!(content.author.username.get(), "ferris");
        assert_eq!(content.author.followers, 40);
        assert_eq!(content.counters.total_engagement(), 15);
        assert_eq!(content.tags, vec![tag]);
    }

    #[test]
    fn negative_counters_are_rejected() {
        let record = FullContentRecord {
            like_count: -1,
            ..content_record()
        };

        assert!(matches!(
            record.into_content(Vec::new()),
            Err(ModelValidationError::Counter(_))
        ));
    }

    #[test]
    fn invalid_author_is_rejected() {
        let record = AuthorRecord {
            author_id: 1,
            name: String::new(),
            username: String::new(),
            url: String::new(),
            title: String::new(),
            metadata: None,
            secret_value: None,
            followers: 0,
            created_at: datetime!(2026-01-01 00:00 UTC),
            updated_at: datetime!(2026-01-01 00:00 UTC),
        };

        assert!(matches!(
            Author::try_from(record),
            Err(ModelValidationError::Text(_))
        ));
    }

    #[test]
    fn counters_beyond_storage_range() {
        assert_eq!(counter_to_db(7).ok(), Some(7));
        assert!(matches!(
            counter_to_db(u64::MAX),
            Err(DbError::CounterOutOfRange(u64::MAX))
        ));
    }
}
