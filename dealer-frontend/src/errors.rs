use axum::{
    http::{header::HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use service_core::error::INTERNAL_ERROR_MESSAGE;
use std::time::Duration;
use thiserror::Error;

/// How long the browser shows a state mismatch before restarting login.
pub const RESTART_LOGIN_DELAY: Duration = Duration::from_secs(3);

/// Default text when the provider redirects back with `error` but no description.
pub const DEFAULT_AUTHORIZATION_ERROR: &str = "An error occurred during authorization.";

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Security error: the \"state\" parameter does not match. Please sign in again.")]
    StateMismatch,

    #[error("No access token available. Please sign in.")]
    NoToken,

    #[error("Authentication error: {0}")]
    TokenExchange(String),

    #[error("John Deere error: {0}")]
    AuthorizationDenied(String),

    /// Non-success reply relayed from the upstream API.
    #[error("API error ({status})")]
    Api {
        status: StatusCode,
        body: serde_json::Value,
    },

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl DashboardError {
    pub fn status(&self) -> StatusCode {
        match self {
            DashboardError::StateMismatch => StatusCode::BAD_REQUEST,
            DashboardError::NoToken
            | DashboardError::TokenExchange(_)
            | DashboardError::AuthorizationDenied(_) => StatusCode::UNAUTHORIZED,
            DashboardError::Api { status, .. } => *status,
            DashboardError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text shown to the dealer. Internal details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            DashboardError::Api { status, body } => body
                .get("message")
                .and_then(|message| message.as_str())
                .filter(|message| !message.trim().is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("API error ({})", status.as_u16())),
            DashboardError::InternalError(_) => INTERNAL_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<tower_sessions::session::Error> for DashboardError {
    fn from(err: tower_sessions::session::Error) -> Self {
        DashboardError::InternalError(anyhow::Error::new(err))
    }
}

/// Builds the connection management link for the registered client.
#[derive(Debug, Clone)]
pub struct ConnectionsLink {
    base_url: String,
    client_id: String,
}

impl ConnectionsLink {
    pub fn new(base_url: &str, client_id: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
        }
    }

    pub fn url(&self, org_id: Option<&str>) -> String {
        let dialog = format!("{}/{}/connections-dialog", self.base_url, self.client_id);
        match org_id {
            Some(org_id) => format!("{}?orgId={}", dialog, org_id),
            None => dialog,
        }
    }
}

/// How a failure should be presented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorView {
    /// The connection lacks permissions for the organization; the dealer
    /// fixes it on Deere's connections page.
    PermissionRemediation { message: String, manage_url: String },
    /// The login attempt is void; start over after a short pause.
    RestartLogin { message: String, after_seconds: u64 },
    Inline { message: String },
}

impl ErrorView {
    pub fn for_error(error: &DashboardError, links: &ConnectionsLink, org_id: Option<&str>) -> Self {
        match error {
            DashboardError::Api { status, .. } if *status == StatusCode::FORBIDDEN => {
                ErrorView::PermissionRemediation {
                    message: "Access denied (403). Permissions for this organization are not \
                              configured. Grant access on the connections page, then try again."
                        .to_string(),
                    manage_url: links.url(org_id),
                }
            }
            DashboardError::StateMismatch => ErrorView::RestartLogin {
                message: error.user_message(),
                after_seconds: RESTART_LOGIN_DELAY.as_secs(),
            },
            other => ErrorView::Inline {
                message: other.user_message(),
            },
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ErrorView::PermissionRemediation { message, .. }
            | ErrorView::RestartLogin { message, .. }
            | ErrorView::Inline { message } => message,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorPageBody<'a> {
    error: &'a str,
    view: &'a ErrorView,
}

/// A failed dashboard request: status plus presentation.
#[derive(Debug)]
pub struct ErrorPage {
    pub status: StatusCode,
    pub view: ErrorView,
}

impl ErrorPage {
    pub fn new(error: DashboardError, links: &ConnectionsLink, org_id: Option<&str>) -> Self {
        match &error {
            DashboardError::InternalError(err) => {
                tracing::error!(error = ?err, "Dashboard request failed with internal error");
            }
            DashboardError::Api { status, .. } => {
                tracing::warn!(status = %status, org_id = ?org_id, "Upstream API call failed");
            }
            other => {
                tracing::info!(error = %other, "Dashboard request rejected");
            }
        }

        Self {
            status: error.status(),
            view: ErrorView::for_error(&error, links, org_id),
        }
    }
}

impl IntoResponse for ErrorPage {
    fn into_response(self) -> Response {
        let body = ErrorPageBody {
            error: self.view.message(),
            view: &self.view,
        };
        let mut response = (self.status, Json(body)).into_response();

        if let ErrorView::RestartLogin { after_seconds, .. } = &self.view {
            if let Ok(value) = HeaderValue::from_str(&format!("{}; url=/login", after_seconds)) {
                response
                    .headers_mut()
                    .insert(HeaderName::from_static("refresh"), value);
            }
        }

        response
    }
}
