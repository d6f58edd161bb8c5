use crate::core::config::CrmConfig;
use crate::crm::error::CrmError;
use crate::crm::leads::LeadService;
use crate::crm::store::{CrmStore, MemoryCrmStore, Upserted};
use crate::crm::types::{
    Contact, Deal, DealStage, Lead, LeadPatch, SalesRep, TeamMember, DEFAULT_EDITION,
    UNASSIGNED_REP,
};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

pub fn sample_lead(domain: &str) -> Lead {
    let now = Utc::now();
    Lead {
        id: Uuid::new_v4(),
        name: String::new(),
        email: String::new(),
        website_url: format!("https://{domain}"),
        team_size: Default::default(),
        arr: 0.0,
        category: String::new(),
        linkedin_url: format!("https://linkedin.com/company/{domain}"),
        status: Default::default(),
        funding_type: Default::default(),
        follow_up_date: None,
        edition: DEFAULT_EDITION.to_string(),
        product_name: String::new(),
        added_by: None,
        added_by_name: String::new(),
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_deal(name: &str) -> Deal {
    let now = Utc::now();
    Deal {
        id: Uuid::new_v4(),
        name: name.to_string(),
        lead_name: String::new(),
        lead_id: None,
        value: 0.0,
        stage: DealStage::Connected,
        assigned_rep: UNASSIGNED_REP.to_string(),
        edition: DEFAULT_EDITION.to_string(),
        start_month: now.month() as i32,
        end_month: now.month() as i32,
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_rep(name: &str) -> SalesRep {
    let now = Utc::now();
    SalesRep {
        id: Uuid::new_v4(),
        name: name.to_string(),
        leads_contacted: 0,
        meetings_booked: 0,
        deals_closed: 0,
        total_revenue: 0.0,
        created_at: now,
        updated_at: now,
    }
}

pub fn lead_service() -> (LeadService, Arc<MemoryCrmStore>) {
    let store = Arc::new(MemoryCrmStore::new());
    let service = LeadService::new(store.clone(), CrmConfig::default());
    (service, store)
}

/// Memory store whose deal table is unreachable. Records each refused call.
pub struct FaultyStore {
    pub inner: MemoryCrmStore,
    pub fail_deals: bool,
    pub refused: Arc<Mutex<Vec<String>>>,
}

impl FaultyStore {
    pub fn failing_deals() -> Self {
        Self {
            inner: MemoryCrmStore::new(),
            fail_deals: true,
            refused: Arc::new(Mutex::new(Vec::new())),
        }
    }

    async fn deals_gate(&self, op: &str) -> Result<(), CrmError> {
        if self.fail_deals {
            self.refused.lock().await.push(op.to_string());
            return Err(CrmError::Connection("deals unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CrmStore for FaultyStore {
    fn backend(&self) -> &'static str {
        "faulty"
    }

    async fn insert_lead(&self, lead: Lead) -> Result<Lead, CrmError> {
        self.inner.insert_lead(lead).await
    }

    async fn get_lead(&self, id: Uuid) -> Result<Lead, CrmError> {
        self.inner.get_lead(id).await
    }

    async fn list_leads(&self) -> Result<Vec<Lead>, CrmError> {
        self.inner.list_leads().await
    }

    async fn patch_lead(
        &self,
        id: Uuid,
        patch: &LeadPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<Lead, CrmError> {
        self.inner.patch_lead(id, patch, updated_at).await
    }

    async fn delete_lead(&self, id: Uuid) -> Result<(), CrmError> {
        self.inner.delete_lead(id).await
    }

    async fn insert_deal(&self, deal: Deal) -> Result<Deal, CrmError> {
        self.deals_gate("insert_deal").await?;
        self.inner.insert_deal(deal).await
    }

    async fn get_deal(&self, id: Uuid) -> Result<Deal, CrmError> {
        self.deals_gate("get_deal").await?;
        self.inner.get_deal(id).await
    }

    async fn list_deals(&self, year: Option<i32>) -> Result<Vec<Deal>, CrmError> {
        self.deals_gate("list_deals").await?;
        self.inner.list_deals(year).await
    }

    async fn upsert_lead_deal(
        &self,
        fresh: Deal,
        stage: DealStage,
    ) -> Result<Upserted<Deal>, CrmError> {
        self.deals_gate("upsert_lead_deal").await?;
        self.inner.upsert_lead_deal(fresh, stage).await
    }

    async fn update_deal(&self, deal: Deal) -> Result<Deal, CrmError> {
        self.deals_gate("update_deal").await?;
        self.inner.update_deal(deal).await
    }

    async fn delete_deal(&self, id: Uuid) -> Result<(), CrmError> {
        self.deals_gate("delete_deal").await?;
        self.inner.delete_deal(id).await
    }

    async fn insert_sales_rep(&self, rep: SalesRep) -> Result<SalesRep, CrmError> {
        self.inner.insert_sales_rep(rep).await
    }

    async fn get_sales_rep(&self, id: Uuid) -> Result<SalesRep, CrmError> {
        self.inner.get_sales_rep(id).await
    }

    async fn list_sales_reps(&self) -> Result<Vec<SalesRep>, CrmError> {
        self.inner.list_sales_reps().await
    }

    async fn update_sales_rep(&self, rep: SalesRep) -> Result<SalesRep, CrmError> {
        self.inner.update_sales_rep(rep).await
    }

    async fn delete_sales_rep(&self, id: Uuid) -> Result<(), CrmError> {
        self.inner.delete_sales_rep(id).await
    }

    async fn insert_team_member(&self, member: TeamMember) -> Result<TeamMember, CrmError> {
        self.inner.insert_team_member(member).await
    }

    async fn get_team_member(&self, id: Uuid) -> Result<TeamMember, CrmError> {
        self.inner.get_team_member(id).await
    }

    async fn list_team_members(&self) -> Result<Vec<TeamMember>, CrmError> {
        self.inner.list_team_members().await
    }

    async fn update_team_member(&self, member: TeamMember) -> Result<TeamMember, CrmError> {
        self.inner.update_team_member(member).await
    }

    async fn delete_team_member(&self, id: Uuid) -> Result<(), CrmError> {
        self.inner.delete_team_member(id).await
    }

    async fn insert_contact(&self, contact: Contact) -> Result<Contact, CrmError> {
        self.inner.insert_contact(contact).await
    }

    async fn get_contact(&self, id: Uuid) -> Result<Contact, CrmError> {
        self.inner.get_contact(id).await
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>, CrmError> {
        self.inner.list_contacts().await
    }

    async fn update_contact(&self, contact: Contact) -> Result<Contact, CrmError> {
        self.inner.update_contact(contact).await
    }

    async fn delete_contact(&self, id: Uuid) -> Result<(), CrmError> {
        self.inner.delete_contact(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_faulty_store_records_refusals() {
        let store = FaultyStore::failing_deals();
        assert!(store.list_deals(None).await.is_err());
        assert!(store.insert_lead(sample_lead("acme.com")).await.is_ok());
        assert_eq!(*store.refused.lock().await, vec!["list_deals".to_string()]);
    }
}
