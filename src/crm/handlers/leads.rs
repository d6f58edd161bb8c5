use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::from_json;
use crate::core::shared::state::AppState;
use crate::crm::error::CrmError;
use crate::crm::field_edit::LeadField;
use crate::crm::leads::{BulkOutcome, DailyReport, ImportOutcome, LeadUpdate};
use crate::crm::list_view::{LeadFilter, LeadSort, Page, SortField, SortOrder};
use crate::crm::types::{Lead, LeadPatch, LeadStatus, NewLead};

#[derive(Debug, Default, Deserialize)]
pub struct ListLeadsQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub funding_type: Option<String>,
    pub category: Option<String>,
    pub team_size: Option<String>,
    pub sort_by: Option<SortField>,
    pub sort_order: Option<SortOrder>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl ListLeadsQuery {
    fn filter(&self) -> LeadFilter {
        LeadFilter {
            search: self.search.clone(),
            status: self.status.clone(),
            funding_type: self.funding_type.clone(),
            category: self.category.clone(),
            team_size: self.team_size.clone(),
        }
    }

    fn sort(&self) -> LeadSort {
        LeadSort::new(
            self.sort_by.unwrap_or_default(),
            self.sort_order.unwrap_or_default(),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: LeadStatus,
}

#[derive(Debug, Deserialize)]
pub struct FieldEditRequest {
    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ImportUrlsRequest {
    pub input: String,
    #[serde(default)]
    pub template: NewLead,
}

#[derive(Debug, Default, Deserialize)]
pub struct FollowUpQuery {
    pub date: Option<NaiveDate>,
}

pub async fn handle_list_leads(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListLeadsQuery>,
) -> Result<Json<Page<Lead>>, CrmError> {
    let page = state
        .leads
        .list_view(&query.filter(), query.sort(), query.page.unwrap_or(1), query.page_size)
        .await?;
    Ok(Json(page))
}

pub async fn handle_hotlist(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListLeadsQuery>,
) -> Result<Json<Page<Lead>>, CrmError> {
    let page = state
        .leads
        .hotlist(&query.filter(), query.sort(), query.page.unwrap_or(1), query.page_size)
        .await?;
    Ok(Json(page))
}

pub async fn handle_create_lead(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<Lead>), CrmError> {
    let new: NewLead = from_json(body)?;
    let lead = state.leads.create_lead(new).await?;
    Ok((StatusCode::CREATED, Json(lead)))
}

pub async fn handle_get_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Lead>, CrmError> {
    Ok(Json(state.leads.get_lead(id).await?))
}

pub async fn handle_update_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<LeadUpdate>, CrmError> {
    let patch: LeadPatch = from_json(body)?;
    Ok(Json(state.leads.update_lead(id, patch).await?))
}

pub async fn handle_change_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<LeadUpdate>, CrmError> {
    let req: StatusRequest = from_json(body)?;
    Ok(Json(state.leads.change_status(id, req.status).await?))
}

pub async fn handle_delete_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, CrmError> {
    state.leads.delete_lead(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn handle_field_edit(
    State(state): State<Arc<AppState>>,
    Path((id, field)): Path<(Uuid, String)>,
    Json(req): Json<FieldEditRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), CrmError> {
    let field: LeadField = field.parse()?;
    let raw = match req.value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    };
    state.field_edits.schedule(id, field, &raw).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "status": "scheduled",
            "lead_id": id,
            "field": field,
            "delay_ms": state.config.crm.field_edit_delay_ms,
        })),
    ))
}

pub async fn handle_bulk_delete(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<BulkOutcome>, CrmError> {
    let req: BulkDeleteRequest = from_json(body)?;
    Ok(Json(state.leads.bulk_delete(&req.ids).await))
}

pub async fn handle_import_urls(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<ImportOutcome>, CrmError> {
    let req: ImportUrlsRequest = from_json(body)?;
    Ok(Json(state.leads.import_urls(&req.input, req.template).await?))
}

pub async fn handle_follow_ups(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FollowUpQuery>,
) -> Result<Json<Vec<Lead>>, CrmError> {
    let today = query.date.unwrap_or_else(|| Utc::now().date_naive());
    Ok(Json(state.leads.pending_follow_ups(today).await?))
}

pub async fn handle_daily_report(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DailyReport>, CrmError> {
    Ok(Json(state.leads.daily_report(Utc::now()).await?))
}
