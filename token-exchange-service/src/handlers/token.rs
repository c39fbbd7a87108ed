use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use service_core::error::AppError;

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub code: Option<String>,
}

/// `POST /token` with `{ "code": "..." }`.
///
/// The body is parsed by hand so an absent or malformed body reports the
/// missing code instead of an extractor rejection.
pub async fn exchange_token(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, AppError> {
    let request: TokenRequest =
        serde_json::from_slice(&body).map_err(|_| AppError::MissingCode)?;

    let code = request
        .code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .ok_or(AppError::MissingCode)?;

    let exchange = state.provider.exchange_code(code).await?;

    Ok((exchange.status, Json(exchange.body)).into_response())
}
