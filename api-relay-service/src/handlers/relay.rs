use crate::AppState;
use axum::{
    extract::{Query, State},
    http::{header::CONTENT_TYPE, HeaderMap},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use service_core::error::AppError;

#[derive(Debug, Deserialize)]
pub struct RelayQuery {
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// `GET /relay?endpoint=<logical path>` with the token in the configured header.
pub async fn relay(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RelayQuery>,
) -> Result<Response, AppError> {
    let access_token = headers
        .get(&state.token_header)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::MissingParameters("Access token is missing.".to_string()))?;

    let endpoint = query
        .endpoint
        .as_deref()
        .map(str::trim)
        .filter(|endpoint| !endpoint.is_empty())
        .ok_or_else(|| AppError::MissingParameters("Endpoint is missing.".to_string()))?;

    let target = state.routes.resolve(endpoint)?;
    tracing::info!(route = %target.route, path = %target.url.path(), "Relaying API request");

    let upstream = state.upstream.forward(&target, access_token).await?;

    let mut response = (upstream.status, upstream.body).into_response();
    match upstream.content_type {
        Some(content_type) => {
            response.headers_mut().insert(CONTENT_TYPE, content_type);
        }
        None => {
            response.headers_mut().remove(CONTENT_TYPE);
        }
    }

    Ok(response)
}
