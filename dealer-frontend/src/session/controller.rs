use super::{
    AuthState, AuthorizationRequest, SessionSnapshot, SessionStore, ACCESS_TOKEN_KEY,
    OAUTH_STATE_KEY,
};
use crate::errors::{DashboardError, DEFAULT_AUTHORIZATION_ERROR};
use crate::resources::{
    equipment_endpoint, field_operations_endpoint, fields_endpoint, organizations_endpoint,
    parse_list, Equipment, Field, FieldOperation, Organization, OrganizationView,
};
use crate::services::DashboardServices;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Query parameters the provider appends to the redirect URI.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RedirectParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectOutcome {
    Authenticated,
    /// A plain visit without provider parameters.
    NotStarted,
}

/// Drives the authorization-code flow and authorized API calls for one
/// browser session.
pub struct SessionController<S> {
    store: S,
    services: Arc<DashboardServices>,
}

impl<S: SessionStore> SessionController<S> {
    pub fn new(store: S, services: Arc<DashboardServices>) -> Self {
        Self { store, services }
    }

    /// Start a login attempt and return the provider URL to navigate to.
    pub async fn initiate_login(&self) -> Result<Url, DashboardError> {
        let request = AuthorizationRequest::new(&self.services.oauth);
        let url = request.to_url(&self.services.oauth.authorize_url)?;

        self.store.insert(OAUTH_STATE_KEY, request.state).await?;
        tracing::info!("Login initiated");

        Ok(url)
    }

    /// Verify the returned state and trade the code for an access token.
    ///
    /// The stored state is consumed whatever the outcome. Any failure leaves
    /// the session anonymous.
    pub async fn complete_login(
        &self,
        code: &str,
        returned_state: Option<&str>,
    ) -> Result<(), DashboardError> {
        let stored_state = self.store.remove(OAUTH_STATE_KEY).await?;

        let state_matches = match (stored_state.as_deref(), returned_state) {
            (Some(stored), Some(returned)) => {
                bool::from(stored.as_bytes().ct_eq(returned.as_bytes()))
            }
            _ => false,
        };

        if !state_matches {
            tracing::warn!(
                had_stored_state = stored_state.is_some(),
                had_returned_state = returned_state.is_some(),
                "OAuth state mismatch, login rejected"
            );
            self.store.remove(ACCESS_TOKEN_KEY).await?;
            return Err(DashboardError::StateMismatch);
        }

        match self.services.token_service.exchange(code).await {
            Ok(token) => {
                self.store
                    .insert(ACCESS_TOKEN_KEY, token.access_token)
                    .await?;
                tracing::info!(expires_in = ?token.expires_in, "Login completed");
                Ok(())
            }
            Err(err) => {
                self.store.remove(ACCESS_TOKEN_KEY).await?;
                Err(err)
            }
        }
    }

    /// Interpret the provider's redirect back to the dashboard.
    pub async fn handle_redirect(
        &self,
        params: &RedirectParams,
    ) -> Result<RedirectOutcome, DashboardError> {
        if params.error.is_some() {
            self.store.remove(OAUTH_STATE_KEY).await?;
            self.store.remove(ACCESS_TOKEN_KEY).await?;

            let description = params
                .error_description
                .as_deref()
                .filter(|description| !description.trim().is_empty())
                .unwrap_or(DEFAULT_AUTHORIZATION_ERROR);
            tracing::warn!(error = ?params.error, description = %description, "Authorization denied by provider");
            return Err(DashboardError::AuthorizationDenied(description.to_string()));
        }

        match params.code.as_deref() {
            Some(code) => {
                self.complete_login(code, params.state.as_deref()).await?;
                Ok(RedirectOutcome::Authenticated)
            }
            None => Ok(RedirectOutcome::NotStarted),
        }
    }

    /// GET a logical endpoint through the relay with the session's token.
    pub async fn authorized_fetch(&self, endpoint: &str) -> Result<serde_json::Value, DashboardError> {
        let access_token = self
            .store
            .get(ACCESS_TOKEN_KEY)
            .await?
            .ok_or(DashboardError::NoToken)?;

        match self.services.relay.fetch(endpoint, &access_token).await {
            Err(DashboardError::Api { status, body }) if status == StatusCode::UNAUTHORIZED => {
                tracing::info!("Access token rejected upstream, clearing session token");
                self.store.remove(ACCESS_TOKEN_KEY).await?;
                Err(DashboardError::Api { status, body })
            }
            other => other,
        }
    }

    pub async fn organizations(&self) -> Result<Vec<Organization>, DashboardError> {
        let endpoint = organizations_endpoint();
        let body = self.authorized_fetch(&endpoint).await?;
        parse_list(&endpoint, body)
    }

    /// Every machine the token can see. Not filtered by organization.
    pub async fn equipment(&self) -> Result<Vec<Equipment>, DashboardError> {
        let endpoint = equipment_endpoint();
        let body = self.authorized_fetch(&endpoint).await?;
        parse_list(&endpoint, body)
    }

    pub async fn fields(&self, org_id: &str) -> Result<Vec<Field>, DashboardError> {
        let endpoint = fields_endpoint(org_id);
        let body = self.authorized_fetch(&endpoint).await?;
        parse_list(&endpoint, body)
    }

    pub async fn field_operations(
        &self,
        org_id: &str,
        field_id: &str,
    ) -> Result<Vec<FieldOperation>, DashboardError> {
        let endpoint = field_operations_endpoint(org_id, field_id);
        let body = self.authorized_fetch(&endpoint).await?;
        parse_list(&endpoint, body)
    }

    /// Equipment and fields for an organization, fetched concurrently.
    pub async fn organization_view(&self, org_id: &str) -> OrganizationView {
        let (equipment, fields) = tokio::join!(self.equipment(), self.fields(org_id));

        OrganizationView {
            org_id: org_id.to_string(),
            equipment,
            fields,
        }
    }

    pub async fn logout(&self) -> Result<(), DashboardError> {
        self.store.remove(ACCESS_TOKEN_KEY).await?;
        self.store.remove(OAUTH_STATE_KEY).await?;
        tracing::info!("Session logged out");
        Ok(())
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, DashboardError> {
        Ok(SessionSnapshot {
            access_token: self.store.get(ACCESS_TOKEN_KEY).await?,
            oauth_state: self.store.get(OAUTH_STATE_KEY).await?,
        })
    }

    pub async fn state(&self) -> Result<AuthState, DashboardError> {
        Ok(self.snapshot().await?.auth_state())
    }
}
