use crate::core::config::AppConfig;
use crate::crm::analytics::AnalyticsService;
use crate::crm::contacts::ContactService;
use crate::crm::deals::DealService;
use crate::crm::field_edit::FieldEditQueue;
use crate::crm::leads::LeadService;
use crate::crm::sales_reps::SalesRepService;
use crate::crm::store::CrmStore;
use crate::crm::team::TeamService;
use std::sync::Arc;
use std::time::Duration;

/// Shared by every handler behind `State<Arc<AppState>>`.
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn CrmStore>,
    pub leads: LeadService,
    pub deals: DealService,
    pub sales_reps: SalesRepService,
    pub team: TeamService,
    pub contacts: ContactService,
    pub analytics: AnalyticsService,
    pub field_edits: FieldEditQueue,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn CrmStore>) -> Self {
        let leads = LeadService::new(store.clone(), config.crm.clone());
        let field_edits = FieldEditQueue::new(
            leads.clone(),
            Duration::from_millis(config.crm.field_edit_delay_ms),
        );
        Self {
            deals: DealService::new(store.clone()),
            sales_reps: SalesRepService::new(store.clone()),
            team: TeamService::new(store.clone()),
            contacts: ContactService::new(store.clone()),
            analytics: AnalyticsService::new(store.clone()),
            leads,
            field_edits,
            store,
            config,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("store", &self.store.backend())
            .finish_non_exhaustive()
    }
}
