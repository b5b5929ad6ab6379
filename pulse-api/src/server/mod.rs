use axum::{
    Router,
    extract::{
        FromRef, Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use extract::Json;
use pulse_common::model::{
    Id,
    author::AuthorMarker,
    content::ContentMarker,
    stats::StatsAccumulation,
};
use pulse_db::client::{DbClient, DbError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

mod extract;
mod routes;

pub type ServerRouter = Router<ServerState>;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct StatsSettings {
    pub accumulation: StatsAccumulation,
    pub legacy_status: bool,
}

#[derive(Clone, Debug, FromRef)]
pub struct ServerState {
    pub db_client: Arc<DbClient>,
    pub stats: StatsSettings,
}

pub fn routes() -> ServerRouter {
    routes::routes()
        .fallback(fallback)
        .method_not_allowed_fallback(method_not_allowed)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub async fn method_not_allowed(request: Request) -> ServerError {
    let parts = request.into_parts().0;
    ServerError::MethodNotAllowed(parts.method, parts.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Method {0} is not allowed on {1}")]
    MethodNotAllowed(Method, Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Query string rejected: {0}")]
    QueryRejection(#[from] QueryRejection),
    #[error("Incoming JSON rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error("Content must have an author")]
    MissingAuthor,
    #[error(transparent)]
    Database(#[from] DbError),
    #[error("Content with id {0} was not found.")]
    ContentByIdNotFound(Id<ContentMarker>),
    #[error("Author with id {0} was not found.")]
    AuthorByIdNotFound(Id<AuthorMarker>),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_)
            | ServerError::PathRejection(_)
            | ServerError::ContentByIdNotFound(_)
            | ServerError::AuthorByIdNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::MethodNotAllowed(..) => StatusCode::METHOD_NOT_ALLOWED,
            ServerError::QueryRejection(_)
            | ServerError::JsonRejection(_)
            | ServerError::MissingAuthor
            | ServerError::Database(DbError::CounterOutOfRange(_)) => StatusCode::BAD_REQUEST,
            ServerError::Database(DbError::TagNameTaken(_)) => StatusCode::CONFLICT,
            ServerError::JsonResponse(_)
            | ServerError::Database(DbError::Data(_) | DbError::Sqlx(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize, Deserialize)]
struct ErrorResponse {
    status: u16,
    error: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        error!(error = %self, %status, "Replying with error");

        let error = if status.is_server_error() {
            status
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_owned()
        } else {
            self.to_string()
        };
        let error_response = ErrorResponse {
            status: status.as_u16(),
            error,
        };
        (status, Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use crate::server::{ErrorResponse, ServerError};
    use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};
    use pulse_common::model::{
        Id,
        text::{InvalidTextError, TagName},
    };
    use pulse_db::client::DbError;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ServerError::ContentByIdNotFound(Id::new(1)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ServerError::MissingAuthor.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ServerError::Database(DbError::CounterOutOfRange(u64::MAX)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::Database(DbError::Data(
                InvalidTextError::Empty { kind: "TagName" }.into()
            ))
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServerError::Database(DbError::TagNameTaken(
                TagName::new("rust".to_owned()).unwrap()
            ))
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServerError::Database(DbError::Sqlx(sqlx::Error::PoolTimedOut)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn server_errors_hide_details() {
        let response =
            ServerError::Database(DbError::Sqlx(sqlx::Error::PoolTimedOut)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            error,
            ErrorResponse {
                status: 500,
                error: "Internal Server Error".to_owned(),
            }
        );
    }

    #[tokio::test]
    async fn client_errors_explain_themselves() {
        let response = ServerError::MissingAuthor.into_response();

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.status, 400);
        assert_eq!(error.error, "Content must have an author");
    }
}
