use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CrmStore, Upserted};
use crate::crm::error::CrmError;
use crate::crm::types::{Contact, Deal, DealStage, Lead, LeadPatch, SalesRep, TeamMember};

trait Record: Clone + Send + Sync {
    fn id(&self) -> Uuid;
    fn created_at(&self) -> DateTime<Utc>;
}

macro_rules! impl_record {
    ($($ty:ty),+) => {
        $(impl Record for $ty {
            fn id(&self) -> Uuid {
                self.id
            }

            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }
        })+
    };
}

impl_record!(Lead, Deal, SalesRep, TeamMember, Contact);

/// One table. The sequence number breaks `created_at` ties by insertion order.
struct Table<T> {
    entity: &'static str,
    rows: RwLock<HashMap<Uuid, (u64, T)>>,
    seq: AtomicU64,
}

impl<T: Record> Table<T> {
    fn new(entity: &'static str) -> Self {
        Self {
            entity,
            rows: RwLock::new(HashMap::new()),
            seq: AtomicU64::new(0),
        }
    }

    async fn insert(&self, row: T) -> Result<T, CrmError> {
        let mut rows = self.rows.write().await;
        self.insert_locked(&mut rows, row)
    }

    fn insert_locked(&self, rows: &mut HashMap<Uuid, (u64, T)>, row: T) -> Result<T, CrmError> {
        if rows.contains_key(&row.id()) {
            return Err(CrmError::Validation(format!(
                "{} {} already exists",
                self.entity,
                row.id()
            )));
        }
        let seq = self.seq.fetch_add(1, AtomicOrdering::SeqCst);
        rows.insert(row.id(), (seq, row.clone()));
        Ok(row)
    }

    /// Applies `change` to one row in place, under the write lock.
    async fn modify<F>(&self, id: Uuid, change: F) -> Result<T, CrmError>
    where
        F: FnOnce(&mut T),
    {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&id) {
            Some(slot) => {
                change(&mut slot.1);
                Ok(slot.1.clone())
            }
            None => Err(CrmError::not_found(self.entity, id)),
        }
    }

    async fn modify_all<F>(&self, mut change: F)
    where
        F: FnMut(&mut T),
    {
        for slot in self.rows.write().await.values_mut() {
            change(&mut slot.1);
        }
    }

    /// Updates the oldest row matching `matches`, or inserts `fresh`. One
    /// write lock covers both the lookup and the write.
    async fn upsert<P, F>(&self, fresh: T, matches: P, change: F) -> Result<Upserted<T>, CrmError>
    where
        P: Fn(&T) -> bool,
        F: FnOnce(&mut T),
    {
        let mut rows = self.rows.write().await;
        let oldest = rows
            .values()
            .filter(|(_, row)| matches(row))
            .min_by_key(|(seq, row)| (row.created_at(), *seq))
            .map(|(_, row)| row.id());

        if let Some(slot) = oldest.and_then(|id| rows.get_mut(&id)) {
            change(&mut slot.1);
            return Ok(Upserted::Updated(slot.1.clone()));
        }
        self.insert_locked(&mut rows, fresh).map(Upserted::Created)
    }

    async fn get(&self, id: Uuid) -> Result<T, CrmError> {
        self.rows
            .read()
            .await
            .get(&id)
            .map(|(_, row)| row.clone())
            .ok_or_else(|| CrmError::not_found(self.entity, id))
    }

    async fn replace(&self, row: T) -> Result<T, CrmError> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&row.id()) {
            Some(slot) => {
                slot.1 = row.clone();
                Ok(row)
            }
            None => Err(CrmError::not_found(self.entity, row.id())),
        }
    }

    async fn remove(&self, id: Uuid) -> Result<(), CrmError> {
        self.rows
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| CrmError::not_found(self.entity, id))
    }

    async fn sorted_by<F>(&self, mut cmp: F) -> Vec<T>
    where
        F: FnMut(&(u64, T), &(u64, T)) -> Ordering,
    {
        let mut rows: Vec<(u64, T)> = self.rows.read().await.values().cloned().collect();
        rows.sort_by(|a, b| cmp(a, b));
        rows.into_iter().map(|(_, row)| row).collect()
    }
}

fn newest_first(a: (DateTime<Utc>, u64), b: (DateTime<Utc>, u64)) -> Ordering {
    b.cmp(&a)
}

/// In-process store used when no database is configured, and by tests.
pub struct MemoryCrmStore {
    leads: Table<Lead>,
    deals: Table<Deal>,
    sales_reps: Table<SalesRep>,
    team_members: Table<TeamMember>,
    contacts: Table<Contact>,
}

impl MemoryCrmStore {
    pub fn new() -> Self {
        Self {
            leads: Table::new("lead"),
            deals: Table::new("deal"),
            sales_reps: Table::new("sales rep"),
            team_members: Table::new("team member"),
            contacts: Table::new("contact"),
        }
    }
}

impl Default for MemoryCrmStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CrmStore for MemoryCrmStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert_lead(&self, lead: Lead) -> Result<Lead, CrmError> {
        self.leads.insert(lead).await
    }

    async fn get_lead(&self, id: Uuid) -> Result<Lead, CrmError> {
        self.leads.get(id).await
    }

    async fn list_leads(&self) -> Result<Vec<Lead>, CrmError> {
        Ok(self
            .leads
            .sorted_by(|a, b| newest_first((a.1.created_at, a.0), (b.1.created_at, b.0)))
            .await)
    }

    async fn patch_lead(
        &self,
        id: Uuid,
        patch: &LeadPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<Lead, CrmError> {
        self.leads
            .modify(id, |lead| {
                patch.apply(lead);
                lead.updated_at = updated_at;
            })
            .await
    }

    async fn delete_lead(&self, id: Uuid) -> Result<(), CrmError> {
        self.leads.remove(id).await?;
        self.deals
            .modify_all(|deal| {
                if deal.lead_id == Some(id) {
                    deal.lead_id = None;
                }
            })
            .await;
        Ok(())
    }

    async fn insert_deal(&self, deal: Deal) -> Result<Deal, CrmError> {
        self.deals.insert(deal).await
    }

    async fn get_deal(&self, id: Uuid) -> Result<Deal, CrmError> {
        self.deals.get(id).await
    }

    async fn list_deals(&self, year: Option<i32>) -> Result<Vec<Deal>, CrmError> {
        let deals = self
            .deals
            .sorted_by(|a, b| newest_first((a.1.created_at, a.0), (b.1.created_at, b.0)))
            .await;
        Ok(match year {
            Some(year) => deals
                .into_iter()
                .filter(|d| d.created_at.year() == year)
                .collect(),
            None => deals,
        })
    }

    async fn upsert_lead_deal(
        &self,
        fresh: Deal,
        stage: DealStage,
    ) -> Result<Upserted<Deal>, CrmError> {
        let Some(lead_id) = fresh.lead_id else {
            return Err(CrmError::Validation("deal is not linked to a lead".into()));
        };
        let now = fresh.updated_at;
        self.deals
            .upsert(
                fresh,
                |deal| deal.lead_id == Some(lead_id),
                |deal| {
                    deal.stage = stage;
                    deal.updated_at = now;
                },
            )
            .await
    }

    async fn update_deal(&self, deal: Deal) -> Result<Deal, CrmError> {
        self.deals.replace(deal).await
    }

    async fn delete_deal(&self, id: Uuid) -> Result<(), CrmError> {
        self.deals.remove(id).await
    }

    async fn insert_sales_rep(&self, rep: SalesRep) -> Result<SalesRep, CrmError> {
        self.sales_reps.insert(rep).await
    }

    async fn get_sales_rep(&self, id: Uuid) -> Result<SalesRep, CrmError> {
        self.sales_reps.get(id).await
    }

    async fn list_sales_reps(&self) -> Result<Vec<SalesRep>, CrmError> {
        Ok(self
            .sales_reps
            .sorted_by(|a, b| a.1.name.cmp(&b.1.name).then(a.0.cmp(&b.0)))
            .await)
    }

    async fn update_sales_rep(&self, rep: SalesRep) -> Result<SalesRep, CrmError> {
        self.sales_reps.replace(rep).await
    }

    async fn delete_sales_rep(&self, id: Uuid) -> Result<(), CrmError> {
        self.sales_reps.remove(id).await
    }

    async fn insert_team_member(&self, member: TeamMember) -> Result<TeamMember, CrmError> {
        self.team_members.insert(member).await
    }

    async fn get_team_member(&self, id: Uuid) -> Result<TeamMember, CrmError> {
        self.team_members.get(id).await
    }

    async fn list_team_members(&self) -> Result<Vec<TeamMember>, CrmError> {
        Ok(self
            .team_members
            .sorted_by(|a, b| a.1.name.cmp(&b.1.name).then(a.0.cmp(&b.0)))
            .await)
    }

    async fn update_team_member(&self, member: TeamMember) -> Result<TeamMember, CrmError> {
        self.team_members.replace(member).await
    }

    async fn delete_team_member(&self, id: Uuid) -> Result<(), CrmError> {
        self.team_members.remove(id).await
    }

    async fn insert_contact(&self, contact: Contact) -> Result<Contact, CrmError> {
        self.contacts.insert(contact).await
    }

    async fn get_contact(&self, id: Uuid) -> Result<Contact, CrmError> {
        self.contacts.get(id).await
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>, CrmError> {
        Ok(self
            .contacts
            .sorted_by(|a, b| newest_first((a.1.created_at, a.0), (b.1.created_at, b.0)))
            .await)
    }

    async fn update_contact(&self, contact: Contact) -> Result<Contact, CrmError> {
        self.contacts.replace(contact).await
    }

    async fn delete_contact(&self, id: Uuid) -> Result<(), CrmError> {
        self.contacts.remove(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shared::test_utils::{sample_deal, sample_lead};
    use chrono::{Duration, TimeZone};

    #[tokio::test]
    async fn test_lead_crud() {
        let store = MemoryCrmStore::new();
        let lead = store.insert_lead(sample_lead("acme.com")).await.unwrap();

        let fetched = store.get_lead(lead.id).await.unwrap();
        assert_eq!(fetched, lead);

        let patch = LeadPatch {
            name: Some("Acme".to_string()),
            ..LeadPatch::default()
        };
        let later = lead.updated_at + Duration::seconds(5);
        let patched = store.patch_lead(lead.id, &patch, later).await.unwrap();
        assert_eq!(patched.name, "Acme");
        assert_eq!(patched.updated_at, later);
        assert_eq!(patched.website_url, lead.website_url);
        assert_eq!(store.get_lead(lead.id).await.unwrap().name, "Acme");

        store.delete_lead(lead.id).await.unwrap();
        assert!(matches!(
            store.get_lead(lead.id).await,
            Err(CrmError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_lead(lead.id).await,
            Err(CrmError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = MemoryCrmStore::new();
        let lead = sample_lead("acme.com");
        store.insert_lead(lead.clone()).await.unwrap();
        assert!(matches!(
            store.insert_lead(lead).await,
            Err(CrmError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_leads_listed_newest_first_with_stable_ties() {
        let store = MemoryCrmStore::new();
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();

        let mut old = sample_lead("old.com");
        old.created_at = base - Duration::days(1);
        let mut first = sample_lead("first.com");
        first.created_at = base;
        let mut second = sample_lead("second.com");
        second.created_at = base;

        store.insert_lead(old).await.unwrap();
        store.insert_lead(first).await.unwrap();
        store.insert_lead(second).await.unwrap();

        let names: Vec<String> = store
            .list_leads()
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.website_url)
            .collect();
        assert_eq!(
            names,
            vec![
                "https://second.com".to_string(),
                "https://first.com".to_string(),
                "https://old.com".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_deals_filtered_by_year() {
        let store = MemoryCrmStore::new();

        let mut old = sample_deal("Old");
        old.created_at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut current = sample_deal("Current");
        current.created_at = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();

        store.insert_deal(old).await.unwrap();
        store.insert_deal(current).await.unwrap();

        assert_eq!(store.list_deals(None).await.unwrap().len(), 2);
        let in_2026 = store.list_deals(Some(2026)).await.unwrap();
        assert_eq!(in_2026.len(), 1);
        assert_eq!(in_2026[0].name, "Current");
    }

    #[tokio::test]
    async fn test_upsert_lead_deal_moves_oldest() {
        let store = MemoryCrmStore::new();
        let lead_id = Uuid::new_v4();

        let mut second = sample_deal("Second");
        second.lead_id = Some(lead_id);
        let mut first = sample_deal("First");
        first.lead_id = Some(lead_id);
        first.created_at = second.created_at - Duration::days(1);
        store.insert_deal(second).await.unwrap();
        store.insert_deal(first.clone()).await.unwrap();

        let mut fresh = sample_deal("Fresh");
        fresh.lead_id = Some(lead_id);
        let outcome = store
            .upsert_lead_deal(fresh, DealStage::Negotiation)
            .await
            .unwrap();
        match outcome {
            Upserted::Updated(deal) => {
                assert_eq!(deal.id, first.id);
                assert_eq!(deal.stage, DealStage::Negotiation);
            }
            other => panic!("expected update, got {other:?}"),
        }
        assert_eq!(store.list_deals(None).await.unwrap().len(), 2);

        let mut other = sample_deal("Other");
        other.lead_id = Some(Uuid::new_v4());
        let created = store
            .upsert_lead_deal(other.clone(), DealStage::Connected)
            .await
            .unwrap();
        assert_eq!(created, Upserted::Created(other));

        assert!(matches!(
            store
                .upsert_lead_deal(sample_deal("Loose"), DealStage::Connected)
                .await,
            Err(CrmError::Validation(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_upserts_create_one_deal() {
        let store = std::sync::Arc::new(MemoryCrmStore::new());
        let lead_id = Uuid::new_v4();

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let mut fresh = sample_deal(&format!("deal {i}"));
                    fresh.lead_id = Some(lead_id);
                    store.upsert_lead_deal(fresh, DealStage::Connected).await.unwrap()
                })
            })
            .collect();

        let mut created = 0;
        for task in tasks {
            if matches!(task.await.unwrap(), Upserted::Created(_)) {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.list_deals(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_deleting_lead_detaches_deals() {
        let store = MemoryCrmStore::new();
        let lead = store.insert_lead(sample_lead("acme.com")).await.unwrap();
        let mut deal = sample_deal("Acme");
        deal.lead_id = Some(lead.id);
        let deal = store.insert_deal(deal).await.unwrap();

        store.delete_lead(lead.id).await.unwrap();
        let kept = store.get_deal(deal.id).await.unwrap();
        assert_eq!(kept.lead_id, None);
    }
}
