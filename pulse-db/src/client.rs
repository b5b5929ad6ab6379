use crate::{
    query::{CONTENT_TAGS, content_by_id_query, contents_query},
    record::{AuthorRecord, ContentTagRecord, FullContentRecord, TagRecord, counter_to_db},
};
use pulse_common::model::{
    Id, ModelValidationError,
    author::{Author, AuthorMarker, CreateAuthor},
    content::{Content, ContentMarker, CreateContent, EngagementCounters},
    filter::ContentFilter,
    tag::{CreateTag, Tag},
    text::{AuthorUsername, TagName},
};
use sqlx::{PgConnection, PgPool, query_as, query_scalar};
use std::collections::HashMap;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error("A tag named {0} already exists")]
    TagNameTaken(TagName),
    #[error("Counter value {0} is too large to store")]
    CounterOutOfRange(u64),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Clone, Debug)]
pub struct DbClient {
    pool: PgPool,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Contents matching every restriction of `filter`, newest first.
    pub async fn fetch_contents(&self, filter: &ContentFilter) -> Result<Vec<Content>> {
        let records = contents_query(filter, OffsetDateTime::now_utc())
            .build_query_as::<FullContentRecord>()
            .fetch_all(&self.pool)
            .await?;

        self.attach_tags(records).await
    }

    pub async fn fetch_content(&self, content_id: Id<ContentMarker>) -> Result<Option<Content>> {
        let record = content_by_id_query(content_id)
            .build_query_as::<FullContentRecord>()
            .fetch_optional(&self.pool)
            .await?;

        let contents = self.attach_tags(record.into_iter().collect()).await?;
        Ok(contents.into_iter().next())
    }

    /// Loads the tags of all `records` with one statement.
    async fn attach_tags(&self, records: Vec<FullContentRecord>) -> Result<Vec<Content>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let content_ids: Vec<i64> = records.iter().map(|record| record.content_id).collect();
        let tag_records = query_as::<_, ContentTagRecord>(CONTENT_TAGS)
            .bind(&content_ids)
            .fetch_all(&self.pool)
            .await?;

        let mut tags_by_content: HashMap<i64, Vec<Tag>> = HashMap::new();
        for record in tag_records {
            tags_by_content
                .entry(record.content_id)
                .or_default()
                .push(record.tag.try_into()?);
        }

        let contents = records
            .into_iter()
            .map(|record| {
                let tags = tags_by_content
                    .remove(&record.content_id)
                    .unwrap_or_default();
                record.into_content(tags)
            })
            .collect::<Result<_, _>>()?;
        Ok(contents)
    }

    /// Inserts a content record owned by `author`, reusing the author with the
    /// same username when one exists. Tag names without a matching tag are
    /// skipped.
    pub async fn create_content(
        &self,
        content: &CreateContent,
        author: &CreateAuthor,
    ) -> Result<Id<ContentMarker>> {
        let like_count = counter_to_db(content.counters.like_count)?;
        let comment_count = counter_to_db(content.counters.comment_count)?;
        let view_count = counter_to_db(content.counters.view_count)?;
        let share_count = counter_to_db(content.counters.share_count)?;

        let mut transaction = self.pool.begin().await?;

        let author_id = resolve_author(&mut transaction, author).await?;

        let content_id = query_scalar::<_, i64>(
            "
            INSERT INTO contents.contents (
                author_id, url, title, like_count, comment_count, view_count,
                share_count, thumbnail_url, timestamp, metadata, secret_value
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING content_id
            ",
        )
        .bind(author_id.get().cast_signed())
        .bind(content.url.get())
        .bind(&content.title)
        .bind(like_count)
        .bind(comment_count)
        .bind(view_count)
        .bind(share_count)
        .bind(content.thumbnail_url.as_ref().map(|url| url.get()))
        .bind(content.timestamp)
        .bind(&content.metadata)
        .bind(&content.secret_value)
        .fetch_one(&mut *transaction)
        .await?;

        if !content.tags.is_empty() {
            let tag_names: Vec<String> = content
                .tags
                .iter()
                .map(|name| name.get().to_owned())
                .collect();
            let linked = sqlx::query(
                "
                INSERT INTO contents.content_tags (content_id, tag_id)
                SELECT $1, tags.tag_id
                FROM tags.tags
                WHERE tags.name = ANY($2)
                ON CONFLICT DO NOTHING
                ",
            )
            .bind(content_id)
            .bind(&tag_names)
            .execute(&mut *transaction)
            .await?
            .rows_affected();

            debug!(
                content_id,
                requested = tag_names.len(),
                linked,
                "Linked content to existing tags"
            );
        }

        transaction.commit().await?;

        Ok(content_id.cast_unsigned().into())
    }

    /// Overwrites the counters of a content record. Returns whether the record
    /// exists.
    pub async fn update_engagement(
        &self,
        content_id: Id<ContentMarker>,
        counters: EngagementCounters,
    ) -> Result<bool> {
        let updated = sqlx::query(
            "
            UPDATE contents.contents
            SET like_count = $2, comment_count = $3, view_count = $4, share_count = $5
            WHERE content_id = $1
            ",
        )
        .bind(content_id.get().cast_signed())
        .bind(counter_to_db(counters.like_count)?)
        .bind(counter_to_db(counters.comment_count)?)
        .bind(counter_to_db(counters.view_count)?)
        .bind(counter_to_db(counters.share_count)?)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated > 0)
    }

    /// Deletes a content record and its tag associations. Returns whether the
    /// record existed.
    pub async fn delete_content(&self, content_id: Id<ContentMarker>) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM contents.contents WHERE content_id = $1")
            .bind(content_id.get().cast_signed())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    pub async fn fetch_author(&self, author_id: Id<AuthorMarker>) -> Result<Option<Author>> {
        let record = query_as::<_, AuthorRecord>(
            "
            SELECT
                author_id, name, username, url, title, metadata, secret_value,
                followers, created_at, updated_at
            FROM
                authors.authors
            WHERE
                author_id = $1
            ",
        )
        .bind(author_id.get().cast_signed())
        .fetch_optional(&self.pool)
        .await?;

        let author = record.map(Author::try_from).transpose()?;
        Ok(author)
    }

    pub async fn fetch_tags(&self) -> Result<Vec<Tag>> {
        let records = query_as::<_, TagRecord>(
            "
            SELECT tag_id, name, description
            FROM tags.tags
            ORDER BY name
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        let tags = records
            .into_iter()
            .map(Tag::try_from)
            .collect::<Result<_, _>>()?;
        Ok(tags)
    }

    pub async fn create_tag(&self, tag: &CreateTag) -> Result<Tag> {
        let record = query_as::<_, TagRecord>(
            "
            INSERT INTO tags.tags (name, description)
            VALUES ($1, $2)
            ON CONFLICT (name) DO NOTHING
            RETURNING tag_id, name, description
            ",
        )
        .bind(tag.name.get())
        .bind(&tag.description)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::TagNameTaken(tag.name.clone()))?;

        Ok(record.try_into()?)
    }
}

async fn fetch_author_id(
    connection: &mut PgConnection,
    username: &AuthorUsername,
) -> Result<Option<Id<AuthorMarker>>> {
    let author_id =
        query_scalar::<_, i64>("SELECT author_id FROM authors.authors WHERE username = $1")
            .bind(username.get())
            .fetch_optional(connection)
            .await?;

    Ok(author_id.map(|id| id.cast_unsigned().into()))
}

/// Finds the author with `author.username`, creating it from `author` when
/// there is none.
async fn resolve_author(
    connection: &mut PgConnection,
    author: &CreateAuthor,
) -> Result<Id<AuthorMarker>> {
    if let Some(author_id) = fetch_author_id(connection, &author.username).await? {
        debug!(%author_id, username = %author.username, "Reusing existing author");
        return Ok(author_id);
    }

    let inserted = query_scalar::<_, i64>(
        "
        INSERT INTO authors.authors (name, username, url, title, metadata, secret_value, followers)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (username) DO NOTHING
        RETURNING author_id
        ",
    )
    .bind(author.name.get())
    .bind(author.username.get())
    .bind(author.url.get())
    .bind(author.title.get())
    .bind(&author.metadata)
    .bind(&author.secret_value)
    .bind(counter_to_db(author.followers)?)
    .fetch_optional(&mut *connection)
    .await?;

    match inserted {
        Some(author_id) => {
            debug!(author_id, username = %author.username, "Created author");
            Ok(author_id.cast_unsigned().into())
        }
        // A concurrent request created the author after our lookup.
        None => fetch_author_id(connection, &author.username)
            .await?
            .ok_or(DbError::Sqlx(sqlx::Error::RowNotFound)),
    }
}
