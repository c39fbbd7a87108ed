use crate::errors::ErrorPage;
use crate::session::{AuthState, RedirectOutcome, RedirectParams};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
    Json,
};
use serde::Serialize;
use tower_sessions::Session;

/// `GET /login`: store a fresh state and send the browser to the provider.
pub async fn login(State(state): State<AppState>, session: Session) -> Result<Redirect, ErrorPage> {
    let url = state
        .controller(session)
        .initiate_login()
        .await
        .map_err(|e| state.error_page(e, None))?;

    Ok(Redirect::to(url.as_str()))
}

/// `GET /auth/callback`: the provider's redirect back.
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<RedirectParams>,
) -> Result<Redirect, ErrorPage> {
    let outcome = state
        .controller(session)
        .handle_redirect(&params)
        .await
        .map_err(|e| state.error_page(e, None))?;

    match outcome {
        RedirectOutcome::Authenticated => Ok(Redirect::to(&state.services.oauth.post_login_path)),
        RedirectOutcome::NotStarted => Ok(Redirect::to("/login")),
    }
}

/// `POST /logout`
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<StatusCode, ErrorPage> {
    state
        .controller(session)
        .logout()
        .await
        .map_err(|e| state.error_page(e, None))?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct SessionStatus {
    pub state: AuthState,
    pub authenticated: bool,
}

/// `GET /api/session`. Never exposes the token or the state value.
pub async fn session_status(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<SessionStatus>, ErrorPage> {
    let auth_state = state
        .controller(session)
        .state()
        .await
        .map_err(|e| state.error_page(e, None))?;

    Ok(Json(SessionStatus {
        state: auth_state,
        authenticated: auth_state == AuthState::Authenticated,
    }))
}
