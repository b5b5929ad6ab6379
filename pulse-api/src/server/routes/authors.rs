use crate::server::{Result, ServerError, ServerRouter, extract::Json};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use pulse_common::model::{
    Id,
    author::{Author, AuthorMarker},
};
use pulse_db::client::DbClient;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_get(get_author)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/authors/{id}", rejection(ServerError))]
struct GetAuthorPath {
    id: Id<AuthorMarker>,
}

async fn get_author(
    GetAuthorPath { id }: GetAuthorPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Author>> {
    let author = db
        .fetch_author(id)
        .await?
        .ok_or(ServerError::AuthorByIdNotFound(id))?;

    Ok(Json(author))
}
