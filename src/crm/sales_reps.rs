use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::error::CrmError;
use super::store::CrmStore;
use super::types::{NewSalesRep, SalesRep, SalesRepPatch};

fn check_counters(rep: &SalesRep) -> Result<(), CrmError> {
    if rep.leads_contacted < 0 || rep.meetings_booked < 0 || rep.deals_closed < 0 {
        return Err(CrmError::Validation("Counters must not be negative".into()));
    }
    if !rep.total_revenue.is_finite() || rep.total_revenue < 0.0 {
        return Err(CrmError::Validation("Total revenue must not be negative".into()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct SalesRepService {
    store: Arc<dyn CrmStore>,
}

impl SalesRepService {
    pub fn new(store: Arc<dyn CrmStore>) -> Self {
        Self { store }
    }

    pub async fn create_sales_rep(&self, new: NewSalesRep) -> Result<SalesRep, CrmError> {
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(CrmError::Validation("Sales rep name is required".into()));
        }
        let now = Utc::now();
        let rep = SalesRep {
            id: Uuid::new_v4(),
            name,
            leads_contacted: new.leads_contacted.unwrap_or(0),
            meetings_booked: new.meetings_booked.unwrap_or(0),
            deals_closed: new.deals_closed.unwrap_or(0),
            total_revenue: new.total_revenue.unwrap_or(0.0),
            created_at: now,
            updated_at: now,
        };
        check_counters(&rep)?;
        self.store.insert_sales_rep(rep).await.map_err(|e| {
            log::error!("create_sales_rep failed: {}", e);
            e
        })
    }

    pub async fn get_sales_rep(&self, id: Uuid) -> Result<SalesRep, CrmError> {
        self.store.get_sales_rep(id).await.map_err(|e| {
            log::error!("get_sales_rep {} failed: {}", id, e);
            e
        })
    }

    pub async fn list_sales_reps(&self) -> Result<Vec<SalesRep>, CrmError> {
        self.store.list_sales_reps().await.map_err(|e| {
            log::error!("list_sales_reps failed: {}", e);
            e
        })
    }

    pub async fn update_sales_rep(&self, id: Uuid, patch: SalesRepPatch) -> Result<SalesRep, CrmError> {
        let mut rep = self.get_sales_rep(id).await?;
        patch.apply(&mut rep);
        check_counters(&rep)?;
        rep.updated_at = Utc::now();
        self.store.update_sales_rep(rep).await.map_err(|e| {
            log::error!("update_sales_rep {} failed: {}", id, e);
            e
        })
    }

    pub async fn delete_sales_rep(&self, id: Uuid) -> Result<(), CrmError> {
        self.store.delete_sales_rep(id).await.map_err(|e| {
            log::error!("delete_sales_rep {} failed: {}", id, e);
            e
        })
    }
}
