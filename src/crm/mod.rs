pub mod analytics;
pub mod contacts;
pub mod deal_sync;
pub mod deals;
pub mod error;
pub mod field_edit;
pub mod handlers;
pub mod leads;
pub mod list_view;
pub mod sales_reps;
pub mod store;
pub mod team;
pub mod types;
pub mod url_parse;

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::core::shared::state::AppState;

pub use error::CrmError;
pub use handlers::*;
pub use store::{CrmStore, MemoryCrmStore, PgCrmStore};

pub fn configure_crm_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/leads", get(handle_list_leads).post(handle_create_lead))
        .route("/api/leads/hotlist", get(handle_hotlist))
        .route("/api/leads/bulk-delete", post(handle_bulk_delete))
        .route("/api/leads/import-urls", post(handle_import_urls))
        .route("/api/leads/follow-ups", get(handle_follow_ups))
        .route("/api/leads/daily-report", get(handle_daily_report))
        .route(
            "/api/leads/:id",
            get(handle_get_lead)
                .put(handle_update_lead)
                .delete(handle_delete_lead),
        )
        .route("/api/leads/:id/status", put(handle_change_status))
        .route("/api/leads/:id/fields/:field", put(handle_field_edit))
        .route("/api/deals", get(handle_list_deals).post(handle_create_deal))
        .route(
            "/api/deals/:id",
            get(handle_get_deal)
                .put(handle_update_deal)
                .delete(handle_delete_deal),
        )
        .route(
            "/api/sales-reps",
            get(handle_list_sales_reps).post(handle_create_sales_rep),
        )
        .route(
            "/api/sales-reps/:id",
            get(handle_get_sales_rep)
                .put(handle_update_sales_rep)
                .delete(handle_delete_sales_rep),
        )
        .route("/api/team", get(handle_list_team).post(handle_invite_member))
        .route(
            "/api/team/:id",
            get(handle_get_member)
                .put(handle_update_member)
                .delete(handle_remove_member),
        )
        .route("/api/team/:id/activate", post(handle_activate_member))
        .route("/api/team/:id/deactivate", post(handle_deactivate_member))
        .route(
            "/api/contacts",
            get(handle_list_contacts).post(handle_create_contact),
        )
        .route(
            "/api/contacts/:id",
            get(handle_get_contact)
                .put(handle_update_contact)
                .delete(handle_delete_contact),
        )
        .route("/api/analytics/leads", get(handle_leads_analytics))
        .route("/api/analytics/metrics", get(handle_leads_metrics))
        .route("/api/analytics/daily-chart", get(handle_daily_chart))
        .route(
            "/api/analytics/user-performance",
            get(handle_user_performance),
        )
        .route("/api/analytics/funnel", get(handle_sales_funnel))
        .route("/api/analytics/revenue-trends", get(handle_revenue_trends))
        .route("/api/analytics/recent-activity", get(handle_recent_activity))
}
