use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::from_json;
use crate::core::shared::state::AppState;
use crate::crm::error::CrmError;
use crate::crm::types::{Deal, DealPatch, NewDeal};

#[derive(Debug, Default, Deserialize)]
pub struct ListDealsQuery {
    pub year: Option<i32>,
}

pub async fn handle_list_deals(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListDealsQuery>,
) -> Result<Json<Vec<Deal>>, CrmError> {
    Ok(Json(state.deals.list_deals(query.year).await?))
}

pub async fn handle_create_deal(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<Deal>), CrmError> {
    let new: NewDeal = from_json(body)?;
    Ok((StatusCode::CREATED, Json(state.deals.create_deal(new).await?)))
}

pub async fn handle_get_deal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Deal>, CrmError> {
    Ok(Json(state.deals.get_deal(id).await?))
}

pub async fn handle_update_deal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<Deal>, CrmError> {
    let patch: DealPatch = from_json(body)?;
    Ok(Json(state.deals.update_deal(id, patch).await?))
}

pub async fn handle_delete_deal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, CrmError> {
    state.deals.delete_deal(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
