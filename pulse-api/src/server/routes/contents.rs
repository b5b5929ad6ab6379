use crate::server::{
    Result, ServerError, ServerRouter, StatsSettings,
    extract::{Json, Query},
};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use pulse_common::model::{
    Id,
    content::{ContentMarker, ContentWithEngagement, CreateContent, EngagementCounters},
    filter::{ContentFilter, Timeframe},
    stats::ContentStats,
};
use pulse_db::client::DbClient;
use serde::Deserialize;
use std::{fmt::Display, sync::Arc};
use tracing::debug;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_contents)
        .typed_post(create_content)
        .typed_get(content_stats)
        .typed_get(get_content)
        .typed_delete(delete_content)
        .typed_put(update_engagement)
}

/// Raw listing parameters. Repeated keys keep their last value, and anything
/// that fails to parse is dropped instead of rejecting the request.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
struct ContentFilterParams {
    tag: Option<String>,
    tag_id: Option<String>,
    author_id: Option<String>,
    author_username: Option<String>,
    timeframe: Option<String>,
    title: Option<String>,
}

impl FromIterator<(String, String)> for ContentFilterParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "tag" => &mut params.tag,
                "tag_id" => &mut params.tag_id,
                "author_id" => &mut params.author_id,
                "author_username" => &mut params.author_username,
                "timeframe" => &mut params.timeframe,
                "title" => &mut params.title,
                _ => continue,
            };
            *slot = Some(value);
        }
        params
    }
}

fn parse_param<T, E: Display>(
    name: &'static str,
    value: Option<String>,
    parse: impl FnOnce(String) -> Result<T, E>,
) -> Option<T> {
    let value = value.filter(|value| !value.is_empty())?;
    match parse(value) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            debug!(param = name, %err, "Ignoring malformed filter parameter");
            None
        }
    }
}

impl From<ContentFilterParams> for ContentFilter {
    fn from(params: ContentFilterParams) -> Self {
        let non_empty = |value: Option<String>| value.filter(|value| !value.is_empty());

        Self {
            tag: non_empty(params.tag),
            tag_id: parse_param("tag_id", params.tag_id, |value| value.parse::<Id<_>>()),
            author_id: parse_param("author_id", params.author_id, |value| {
                value.parse::<Id<_>>()
            }),
            author_username: non_empty(params.author_username),
            timeframe: parse_param("timeframe", params.timeframe, |value| {
                value.parse::<Timeframe>()
            }),
            title: non_empty(params.title),
        }
    }
}

/// Query pairs are collected as-is, so the query string never rejects a listing.
type FilterQuery = Query<Vec<(String, String)>>;

fn stats_status(settings: StatsSettings) -> StatusCode {
    if settings.legacy_status {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    }
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/contents", rejection(ServerError))]
struct ContentsPath();

async fn list_contents(
    ContentsPath(): ContentsPath,
    State(db): State<Arc<DbClient>>,
    Query(pairs): FilterQuery,
) -> Result<Json<Vec<ContentWithEngagement>>> {
    let filter = ContentFilter::from(pairs.into_iter().collect::<ContentFilterParams>());
    let contents = db.fetch_contents(&filter).await?;

    Ok(Json(
        contents
            .into_iter()
            .map(ContentWithEngagement::from)
            .collect(),
    ))
}

async fn create_content(
    ContentsPath(): ContentsPath,
    State(db): State<Arc<DbClient>>,
    Json(content): Json<CreateContent>,
) -> Result<Json<ContentWithEngagement>> {
    let author = content.author.as_ref().ok_or(ServerError::MissingAuthor)?;
    let id = db.create_content(&content, author).await?;

    let created = db
        .fetch_content(id)
        .await?
        .ok_or(ServerError::ContentByIdNotFound(id))?;

    Ok(Json(created.into()))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/contents/stats", rejection(ServerError))]
struct ContentStatsPath();

async fn content_stats(
    ContentStatsPath(): ContentStatsPath,
    State(db): State<Arc<DbClient>>,
    State(settings): State<StatsSettings>,
    Query(pairs): FilterQuery,
) -> Result<(StatusCode, Json<ContentStats>)> {
    let filter = ContentFilter::from(pairs.into_iter().collect::<ContentFilterParams>());
    let contents = db.fetch_contents(&filter).await?;
    let stats = ContentStats::accumulate(&contents, settings.accumulation);

    Ok((stats_status(settings), Json(stats)))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/contents/{id}", rejection(ServerError))]
struct ContentPath {
    id: Id<ContentMarker>,
}

async fn get_content(
    ContentPath { id }: ContentPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<ContentWithEngagement>> {
    let content = db
        .fetch_content(id)
        .await?
        .ok_or(ServerError::ContentByIdNotFound(id))?;

    Ok(Json(content.into()))
}

async fn delete_content(
    ContentPath { id }: ContentPath,
    State(db): State<Arc<DbClient>>,
) -> Result<StatusCode> {
    if !db.delete_content(id).await? {
        return Err(ServerError::ContentByIdNotFound(id));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/contents/{id}/engagement", rejection(ServerError))]
struct ContentEngagementPath {
    id: Id<ContentMarker>,
}

async fn update_engagement(
    ContentEngagementPath { id }: ContentEngagementPath,
    State(db): State<Arc<DbClient>>,
    Json(counters): Json<EngagementCounters>,
) -> Result<Json<ContentWithEngagement>> {
    if !db.update_engagement(id, counters).await? {
        return Err(ServerError::ContentByIdNotFound(id));
    }

    let content = db
        .fetch_content(id)
        .await?
        .ok_or(ServerError::ContentByIdNotFound(id))?;

    Ok(Json(content.into()))
}

#[cfg(test)]
mod tests {
    use crate::server::{
        StatsSettings,
        routes::contents::{ContentFilterParams, stats_status},
    };
    use axum::{
        extract::Query,
        http::{StatusCode, Uri},
    };
    use pulse_common::model::{
        Id,
        filter::{ContentFilter, Timeframe},
    };

    fn filter(query: &str) -> ContentFilter {
        let uri: Uri = format!("/contents?{query}").parse().unwrap();
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&uri).unwrap();
        ContentFilter::from(pairs.into_iter().collect::<ContentFilterParams>())
    }

    #[test]
    fn well_formed_params() {
        let filter = filter(
            "tag=rust&tag_id=4&author_id=9&author_username=ferris&timeframe=7&title=Launch",
        );

        assert_eq!(filter.tag.as_deref(), Some("rust"));
        assert_eq!(filter.tag_id, Some(Id::new(4)));
        assert_eq!(filter.author_id, Some(Id::new(9)));
        assert_eq!(filter.author_username.as_deref(), Some("ferris"));
        assert_eq!(filter.timeframe, Some("7".parse::<Timeframe>().unwrap()));
        assert_eq!(filter.title.as_deref(), Some("Launch"));
    }

    #[test]
    fn malformed_params_are_absent() {
        let filter = filter("tag=&tag_id=four&author_id=-1&author_username=&timeframe=0&title=");

        assert_eq!(filter, ContentFilter::default());
    }

    #[test]
    fn missing_params_are_absent() {
        assert_eq!(filter(""), ContentFilter::default());
        assert_eq!(filter("unrelated=1"), ContentFilter::default());
    }

    #[test]
    fn overlong_names_still_restrict() {
        let name = "x".repeat(101);
        let filter = filter(&format!("tag={name}&author_username={name}"));

        assert_eq!(filter.tag.as_deref(), Some(name.as_str()));
        assert_eq!(filter.author_username.as_deref(), Some(name.as_str()));
    }

    #[test]
    fn repeated_params_keep_the_last_value() {
        let filter = filter("tag=a&tag=b&timeframe=3&timeframe=week&title=x&title=");

        assert_eq!(filter.tag.as_deref(), Some("b"));
        assert_eq!(filter.timeframe, None);
        assert_eq!(filter.title, None);
    }

    #[test]
    fn stats_status_follows_settings() {
        assert_eq!(stats_status(StatsSettings::default()), StatusCode::OK);
        assert_eq!(
            stats_status(StatsSettings {
                legacy_status: true,
                ..StatsSettings::default()
            }),
            StatusCode::CREATED
        );
    }
}
