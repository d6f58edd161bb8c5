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
use crate::crm::types::{NewSalesRep, SalesRep, SalesRepPatch};

pub async fn handle_list_sales_reps(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SalesRep>>, CrmError> {
    Ok(Json(state.sales_reps.list_sales_reps().await?))
}

pub async fn handle_create_sales_rep(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<SalesRep>), CrmError> {
    let new: NewSalesRep = from_json(body)?;
    Ok((
        StatusCode::CREATED,
        Json(state.sales_reps.create_sales_rep(new).await?),
    ))
}

pub async fn handle_get_sales_rep(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SalesRep>, CrmError> {
    Ok(Json(state.sales_reps.get_sales_rep(id).await?))
}

pub async fn handle_update_sales_rep(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<SalesRep>, CrmError> {
    let patch: SalesRepPatch = from_json(body)?;
    Ok(Json(state.sales_reps.update_sales_rep(id, patch).await?))
}

pub async fn handle_delete_sales_rep(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, CrmError> {
    state.sales_reps.delete_sales_rep(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
