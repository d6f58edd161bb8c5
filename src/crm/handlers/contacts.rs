use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::from_json;
use crate::core::shared::state::AppState;
use crate::crm::error::CrmError;
use crate::crm::types::{Contact, ContactPatch, NewContact};

pub async fn handle_list_contacts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Contact>>, CrmError> {
    Ok(Json(state.contacts.list_contacts().await?))
}

pub async fn handle_create_contact(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<Contact>), CrmError> {
    let new: NewContact = from_json(body)?;
    Ok((StatusCode::CREATED, Json(state.contacts.create_contact(new).await?)))
}

pub async fn handle_get_contact(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Contact>, CrmError> {
    Ok(Json(state.contacts.get_contact(id).await?))
}

pub async fn handle_update_contact(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<Contact>, CrmError> {
    let patch: ContactPatch = from_json(body)?;
    Ok(Json(state.contacts.update_contact(id, patch).await?))
}

pub async fn handle_delete_contact(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, CrmError> {
    state.contacts.delete_contact(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
