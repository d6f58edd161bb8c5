use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::error::CrmError;
use super::store::CrmStore;
use super::types::{Deal, DealPatch, NewDeal, DEFAULT_EDITION, UNASSIGNED_REP};

fn validate_month(label: &str, month: i32) -> Result<(), CrmError> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(CrmError::Validation(format!(
            "{label} must be between 1 and 12, got {month}"
        )))
    }
}

fn validate_value(value: f64) -> Result<(), CrmError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CrmError::Validation("Deal value must be a non-negative number".into()))
    }
}

#[derive(Clone)]
pub struct DealService {
    store: Arc<dyn CrmStore>,
}

impl DealService {
    pub fn new(store: Arc<dyn CrmStore>) -> Self {
        Self { store }
    }

    pub async fn create_deal(&self, new: NewDeal) -> Result<Deal, CrmError> {
        if new.name.trim().is_empty() {
            return Err(CrmError::Validation("Deal name is required".into()));
        }
        validate_month("start_month", new.start_month)?;
        validate_month("end_month", new.end_month)?;
        let value = new.value.unwrap_or(0.0);
        validate_value(value)?;

        let now = Utc::now();
        let deal = Deal {
            id: Uuid::new_v4(),
            name: new.name.trim().to_string(),
            lead_name: new.lead_name.unwrap_or_default(),
            lead_id: new.lead_id,
            value,
            stage: new.stage,
            assigned_rep: new
                .assigned_rep
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| UNASSIGNED_REP.to_string()),
            edition: new
                .edition
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_EDITION.to_string()),
            start_month: new.start_month,
            end_month: new.end_month,
            created_at: now,
            updated_at: now,
        };
        let deal = self.store.insert_deal(deal).await.map_err(|e| {
            log::error!("create_deal failed: {}", e);
            e
        })?;
        log::info!("Created deal {} ({})", deal.id, deal.name);
        Ok(deal)
    }

    pub async fn get_deal(&self, id: Uuid) -> Result<Deal, CrmError> {
        self.store.get_deal(id).await.map_err(|e| {
            log::error!("get_deal {} failed: {}", id, e);
            e
        })
    }

    pub async fn list_deals(&self, year: Option<i32>) -> Result<Vec<Deal>, CrmError> {
        self.store.list_deals(year).await.map_err(|e| {
            log::error!("list_deals failed: {}", e);
            e
        })
    }

    pub async fn update_deal(&self, id: Uuid, patch: DealPatch) -> Result<Deal, CrmError> {
        if let Some(month) = patch.start_month {
            validate_month("start_month", month)?;
        }
        if let Some(month) = patch.end_month {
            validate_month("end_month", month)?;
        }
        if let Some(value) = patch.value {
            validate_value(value)?;
        }
        let mut deal = self.get_deal(id).await?;
        patch.apply(&mut deal);
        deal.updated_at = Utc::now();
        self.store.update_deal(deal).await.map_err(|e| {
            log::error!("update_deal {} failed: {}", id, e);
            e
        })
    }

    pub async fn delete_deal(&self, id: Uuid) -> Result<(), CrmError> {
        self.store.delete_deal(id).await.map_err(|e| {
            log::error!("delete_deal {} failed: {}", id, e);
            e
        })
    }
}
