use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use std::sync::Arc;

use super::parse_user_filter;
use crate::core::shared::state::AppState;
use crate::crm::analytics::{
    ActivityItem, ChartPoint, LeadsAnalytics, LeadsMetrics, Period, RevenueTrends, SalesFunnel,
    UserPerformance,
};
use crate::crm::error::CrmError;

#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub period: Option<String>,
    pub user_id: Option<String>,
    pub days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RevenueQuery {
    pub year: Option<i32>,
}

impl AnalyticsQuery {
    fn period(&self) -> Result<Period, CrmError> {
        match self.period.as_deref() {
            None | Some("") => Ok(Period::All),
            Some(p) => p.parse(),
        }
    }
}

pub async fn handle_leads_analytics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<LeadsAnalytics>, CrmError> {
    let user = parse_user_filter(query.user_id.as_deref())?;
    let result = state
        .analytics
        .leads_analytics(query.period()?, user, Utc::now())
        .await?;
    Ok(Json(result))
}

pub async fn handle_leads_metrics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<LeadsMetrics>, CrmError> {
    let user = parse_user_filter(query.user_id.as_deref())?;
    Ok(Json(state.analytics.leads_metrics(user, Utc::now()).await?))
}

pub async fn handle_daily_chart(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<Vec<ChartPoint>>, CrmError> {
    let user = parse_user_filter(query.user_id.as_deref())?;
    let days = query.days.unwrap_or(state.config.crm.chart_days).clamp(1, 366);
    Ok(Json(
        state
            .analytics
            .daily_leads_chart(user, days, Utc::now())
            .await?,
    ))
}

pub async fn handle_user_performance(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserPerformance>>, CrmError> {
    Ok(Json(state.analytics.user_performance(Utc::now()).await?))
}

pub async fn handle_sales_funnel(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SalesFunnel>, CrmError> {
    Ok(Json(state.analytics.sales_funnel().await?))
}

pub async fn handle_revenue_trends(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RevenueQuery>,
) -> Result<Json<RevenueTrends>, CrmError> {
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    Ok(Json(state.analytics.revenue_trends(year).await?))
}

pub async fn handle_recent_activity(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ActivityItem>>, CrmError> {
    Ok(Json(state.analytics.recent_activity().await?))
}
