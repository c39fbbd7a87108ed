use crate::errors::{DashboardError, ErrorPage, ErrorView};
use crate::resources::{Equipment, Field, FieldOperation, Organization};
use crate::session::AuthState;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tower_sessions::Session;

/// Rejects ids that would change the shape of the upstream path.
fn check_id(id: &str) -> Result<(), ErrorPage> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(ErrorPage {
            status: StatusCode::BAD_REQUEST,
            view: ErrorView::Inline {
                message: "Invalid identifier.".to_string(),
            },
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub values: Vec<T>,
}

/// One independently loaded part of a composite view.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Section<T> {
    Loaded { values: Vec<T> },
    Failed { error: ErrorView },
}

#[derive(Debug, Serialize)]
pub struct OrganizationViewResponse {
    pub org_id: String,
    pub equipment: Section<Equipment>,
    pub fields: Section<Field>,
}

fn section<T>(
    state: &AppState,
    result: Result<Vec<T>, DashboardError>,
    org_id: &str,
) -> Section<T> {
    match result {
        Ok(values) => Section::Loaded { values },
        Err(error) => Section::Failed {
            error: state.error_page(error, Some(org_id)).view,
        },
    }
}

/// `GET /api/organizations`
pub async fn organizations(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<ListResponse<Organization>>, ErrorPage> {
    let values = state
        .controller(session)
        .organizations()
        .await
        .map_err(|e| state.error_page(e, None))?;

    Ok(Json(ListResponse { values }))
}

/// `GET /api/equipment`
pub async fn equipment(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<ListResponse<Equipment>>, ErrorPage> {
    let values = state
        .controller(session)
        .equipment()
        .await
        .map_err(|e| state.error_page(e, None))?;

    Ok(Json(ListResponse { values }))
}

/// `GET /api/organizations/:org_id`: equipment and fields side by side.
pub async fn organization_view(
    State(state): State<AppState>,
    session: Session,
    Path(org_id): Path<String>,
) -> Result<Json<OrganizationViewResponse>, ErrorPage> {
    check_id(&org_id)?;

    let controller = state.controller(session);
    let auth_state = controller
        .state()
        .await
        .map_err(|e| state.error_page(e, Some(&org_id)))?;
    // Without a token neither half can load.
    if auth_state != AuthState::Authenticated {
        return Err(state.error_page(DashboardError::NoToken, Some(&org_id)));
    }

    let view = controller.organization_view(&org_id).await;

    Ok(Json(OrganizationViewResponse {
        equipment: section(&state, view.equipment, &org_id),
        fields: section(&state, view.fields, &org_id),
        org_id: view.org_id,
    }))
}

/// `GET /api/organizations/:org_id/fields/:field_id/operations`
pub async fn field_operations(
    State(state): State<AppState>,
    session: Session,
    Path((org_id, field_id)): Path<(String, String)>,
) -> Result<Json<ListResponse<FieldOperation>>, ErrorPage> {
    check_id(&org_id)?;
    check_id(&field_id)?;

    let values = state
        .controller(session)
        .field_operations(&org_id, &field_id)
        .await
        .map_err(|e| state.error_page(e, Some(&org_id)))?;

    Ok(Json(ListResponse { values }))
}
