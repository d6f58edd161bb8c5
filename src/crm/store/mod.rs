//! Record CRUD per table.
//!
//! Services read, modify and write whole rows through [`CrmStore`]; no query
//! language leaks past this boundary. Filtering beyond the deal year happens
//! in the service layer so both backends share one semantics.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::CrmError;
use super::types::{Contact, Deal, DealStage, Lead, LeadPatch, SalesRep, TeamMember};

pub mod memory;
pub mod pg;

pub use memory::MemoryCrmStore;
pub use pg::PgCrmStore;

/// Result of a find-or-create.
#[derive(Debug, Clone, PartialEq)]
pub enum Upserted<T> {
    Created(T),
    Updated(T),
}

#[async_trait]
pub trait CrmStore: Send + Sync {
    /// Short backend name reported by the health endpoint.
    fn backend(&self) -> &'static str;

    async fn insert_lead(&self, lead: Lead) -> Result<Lead, CrmError>;
    async fn get_lead(&self, id: Uuid) -> Result<Lead, CrmError>;
    /// Newest first.
    async fn list_leads(&self) -> Result<Vec<Lead>, CrmError>;
    /// Writes only the fields set in `patch`, plus `updated_at`.
    async fn patch_lead(
        &self,
        id: Uuid,
        patch: &LeadPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<Lead, CrmError>;
    /// Also detaches the lead's deals.
    async fn delete_lead(&self, id: Uuid) -> Result<(), CrmError>;

    async fn insert_deal(&self, deal: Deal) -> Result<Deal, CrmError>;
    async fn get_deal(&self, id: Uuid) -> Result<Deal, CrmError>;
    /// Newest first, optionally restricted to deals created in `year`.
    async fn list_deals(&self, year: Option<i32>) -> Result<Vec<Deal>, CrmError>;
    /// Moves the oldest deal of `fresh.lead_id` to `stage`, or inserts `fresh`
    /// when the lead has none. Atomic per lead.
    async fn upsert_lead_deal(
        &self,
        fresh: Deal,
        stage: DealStage,
    ) -> Result<Upserted<Deal>, CrmError>;
    async fn update_deal(&self, deal: Deal) -> Result<Deal, CrmError>;
    async fn delete_deal(&self, id: Uuid) -> Result<(), CrmError>;

    async fn insert_sales_rep(&self, rep: SalesRep) -> Result<SalesRep, CrmError>;
    async fn get_sales_rep(&self, id: Uuid) -> Result<SalesRep, CrmError>;
    /// Ordered by name.
    async fn list_sales_reps(&self) -> Result<Vec<SalesRep>, CrmError>;
    async fn update_sales_rep(&self, rep: SalesRep) -> Result<SalesRep, CrmError>;
    async fn delete_sales_rep(&self, id: Uuid) -> Result<(), CrmError>;

    async fn insert_team_member(&self, member: TeamMember) -> Result<TeamMember, CrmError>;
    async fn get_team_member(&self, id: Uuid) -> Result<TeamMember, CrmError>;
    /// Ordered by name.
    async fn list_team_members(&self) -> Result<Vec<TeamMember>, CrmError>;
    async fn update_team_member(&self, member: TeamMember) -> Result<TeamMember, CrmError>;
    async fn delete_team_member(&self, id: Uuid) -> Result<(), CrmError>;

    async fn insert_contact(&self, contact: Contact) -> Result<Contact, CrmError>;
    async fn get_contact(&self, id: Uuid) -> Result<Contact, CrmError>;
    /// Newest first.
    async fn list_contacts(&self) -> Result<Vec<Contact>, CrmError>;
    async fn update_contact(&self, contact: Contact) -> Result<Contact, CrmError>;
    async fn delete_contact(&self, id: Uuid) -> Result<(), CrmError>;
}
