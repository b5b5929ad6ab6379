//! SQL construction for content listings.
//!
//! Every filter becomes a predicate of a single statement, so tag and author
//! lookups that match nothing simply make the result empty.

use pulse_common::model::{Id, content::ContentMarker, filter::ContentFilter};
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

pub(crate) const CONTENT_COLUMNS: &str = "
    SELECT
        c.content_id,
        c.url,
        c.title,
        c.like_count,
        c.comment_count,
        c.view_count,
        c.share_count,
        c.thumbnail_url,
        c.timestamp,
        c.metadata,
        c.secret_value,
        c.created_at,
        c.updated_at,
        a.author_id,
        a.name AS author_name,
        a.username AS author_username,
        a.url AS author_url,
        a.title AS author_title,
        a.metadata AS author_metadata,
        a.secret_value AS author_secret_value,
        a.followers AS author_followers,
        a.created_at AS author_created_at,
        a.updated_at AS author_updated_at
    FROM
        contents.contents AS c
        JOIN authors.authors AS a ON a.author_id = c.author_id
    WHERE
        TRUE";

pub(crate) const CONTENT_TAGS: &str = "
    SELECT
        ct.content_id,
        t.tag_id,
        t.name,
        t.description
    FROM
        contents.content_tags AS ct
        JOIN tags.tags AS t ON t.tag_id = ct.tag_id
    WHERE
        ct.content_id = ANY($1)
    ORDER BY
        t.name";

/// Builds the listing statement for `filter`, with `now` closing the timeframe
/// window.
pub(crate) fn contents_query(
    filter: &ContentFilter,
    now: OffsetDateTime,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(CONTENT_COLUMNS);

    if let Some(timeframe) = filter.timeframe {
        match timeframe.window_ending_at(now) {
            (Some(start), end) => {
                builder
                    .push(" AND c.timestamp BETWEEN ")
                    .push_bind(start)
                    .push(" AND ")
                    .push_bind(end);
            }
            (None, end) => {
                builder.push(" AND c.timestamp <= ").push_bind(end);
            }
        }
    }
    if let Some(tag_id) = filter.tag_id {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM contents.content_tags AS ct \
                WHERE ct.content_id = c.content_id AND ct.tag_id = ",
            )
            .push_bind(tag_id.get().cast_signed())
            .push(")");
    }
    if let Some(tag) = &filter.tag {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM contents.content_tags AS ct \
                JOIN tags.tags AS t ON t.tag_id = ct.tag_id \
                WHERE ct.content_id = c.content_id AND t.name = ",
            )
            .push_bind(tag.clone())
            .push(")");
    }
    if let Some(author_id) = filter.author_id {
        builder
            .push(" AND c.author_id = ")
            .push_bind(author_id.get().cast_signed());
    }
    if let Some(username) = &filter.author_username {
        builder
            .push(" AND a.username = ")
            .push_bind(username.clone());
    }
    if let Some(title) = &filter.title {
        builder
            .push(" AND c.title ILIKE ")
            .push_bind(contains_pattern(title))
            .push(" ESCAPE '\\'");
    }

    builder.push(" ORDER BY c.content_id DESC");
    builder
}

pub(crate) fn content_by_id_query(id: Id<ContentMarker>) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(CONTENT_COLUMNS);
    builder
        .push(" AND c.content_id = ")
        .push_bind(id.get().cast_signed());
    builder
}

/// `LIKE` pattern matching any text that contains `needle` literally.
pub(crate) fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
