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
use crate::crm::types::{InviteMember, TeamMember, TeamMemberPatch};

pub async fn handle_list_team(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TeamMember>>, CrmError> {
    Ok(Json(state.team.list_members().await?))
}

pub async fn handle_invite_member(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<TeamMember>), CrmError> {
    let invite: InviteMember = from_json(body)?;
    Ok((StatusCode::CREATED, Json(state.team.invite(invite).await?)))
}

pub async fn handle_get_member(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TeamMember>, CrmError> {
    Ok(Json(state.team.get_member(id).await?))
}

pub async fn handle_update_member(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<TeamMember>, CrmError> {
    let patch: TeamMemberPatch = from_json(body)?;
    Ok(Json(state.team.update_member(id, patch).await?))
}

pub async fn handle_remove_member(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, CrmError> {
    state.team.remove_member(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn handle_activate_member(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TeamMember>, CrmError> {
    Ok(Json(state.team.activate(id).await?))
}

pub async fn handle_deactivate_member(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TeamMember>, CrmError> {
    Ok(Json(state.team.deactivate(id).await?))
}
