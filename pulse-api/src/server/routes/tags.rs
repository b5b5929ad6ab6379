use crate::server::{Result, ServerError, ServerRouter, extract::Json};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use pulse_common::model::tag::{CreateTag, Tag};
use pulse_db::client::DbClient;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_tags)
        .typed_post(create_tag)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/tags", rejection(ServerError))]
struct TagsPath();

async fn list_tags(
    TagsPath(): TagsPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Vec<Tag>>> {
    let tags = db.fetch_tags().await?;

    Ok(Json(tags))
}

async fn create_tag(
    TagsPath(): TagsPath,
    State(db): State<Arc<DbClient>>,
    Json(tag): Json<CreateTag>,
) -> Result<Json<Tag>> {
    let tag = db.create_tag(&tag).await?;

    Ok(Json(tag))
}
