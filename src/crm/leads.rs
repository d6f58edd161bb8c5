use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::deal_sync::{sync_lead_deal, DealSync};
use super::error::CrmError;
use super::list_view::{filter_and_sort, hotlist_view, paginate, LeadFilter, LeadSort, Page};
use super::store::CrmStore;
use super::types::{Lead, LeadPatch, LeadStatus, NewLead, DEFAULT_EDITION};
use super::url_parse::{normalize_website, parse_multiple_urls, website_slug};
use crate::core::config::CrmConfig;

pub const DAILY_REPORT_LABEL: &str = "Daily Leads";

#[derive(Debug, Clone, Serialize)]
pub struct LeadUpdate {
    pub lead: Lead,
    pub deal_sync: DealSync,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkFailure {
    pub id: Uuid,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkOutcome {
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<BulkFailure>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportFailure {
    pub url: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    pub created: Vec<Lead>,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<ImportFailure>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyReport {
    pub sales_rep: String,
    pub leads: Vec<Lead>,
    pub lead_count: usize,
    pub low_performance: bool,
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

fn bulk_delete_message(succeeded: usize, failed: usize) -> String {
    match (succeeded, failed) {
        (0, 0) => "No leads selected".to_string(),
        (0, _) => "Failed to delete selected leads".to_string(),
        (n, 0) => format!("Successfully deleted {}", plural(n, "lead")),
        (n, m) => format!("Deleted {}, failed to delete {m}", plural(n, "lead")),
    }
}

fn import_message(succeeded: usize, failed: usize, total: usize) -> String {
    match (succeeded, failed) {
        (0, _) => "Failed to create any leads".to_string(),
        (n, 0) => format!(
            "Successfully created {} from {}",
            plural(n, "lead"),
            plural(total, "URL")
        ),
        (n, m) => format!("Created {}, failed to create {m}", plural(n, "lead")),
    }
}

fn default_linkedin(website_url: &str) -> String {
    format!("https://linkedin.com/company/{}", website_slug(website_url))
}

/// Lead operations. Cheap to clone; all state lives in the store.
#[derive(Clone)]
pub struct LeadService {
    store: Arc<dyn CrmStore>,
    config: CrmConfig,
}

impl LeadService {
    pub fn new(store: Arc<dyn CrmStore>, config: CrmConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &CrmConfig {
        &self.config
    }

    fn build_lead(&self, new: NewLead, now: DateTime<Utc>) -> Result<Lead, CrmError> {
        let arr = new.arr.unwrap_or(0.0);
        if !arr.is_finite() || arr < 0.0 {
            return Err(CrmError::Validation("ARR must be a non-negative number".into()));
        }
        let website_url = new
            .website_url
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(normalize_website)
            .unwrap_or_default();
        let linkedin_url = match new.linkedin_url.map(|l| l.trim().to_string()) {
            Some(l) if !l.is_empty() => l,
            _ if !website_url.is_empty() => default_linkedin(&website_url),
            _ => String::new(),
        };

        Ok(Lead {
            id: Uuid::new_v4(),
            name: new.name.unwrap_or_default(),
            email: new.email.unwrap_or_default(),
            website_url,
            team_size: new.team_size.unwrap_or_default(),
            arr,
            category: new.category.unwrap_or_default(),
            linkedin_url,
            status: new.status.unwrap_or_default(),
            funding_type: new.funding_type.unwrap_or_default(),
            follow_up_date: new.follow_up_date,
            edition: new
                .edition
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_EDITION.to_string()),
            product_name: new.product_name.unwrap_or_default(),
            added_by: new.added_by,
            added_by_name: new.added_by_name.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn create_lead(&self, new: NewLead) -> Result<Lead, CrmError> {
        let lead = self.build_lead(new, Utc::now())?;
        let lead = self.store.insert_lead(lead).await.map_err(|e| {
            log::error!("create_lead failed: {}", e);
            e
        })?;
        log::info!("Created lead {} ({})", lead.id, lead.website_url);
        Ok(lead)
    }

    pub async fn get_lead(&self, id: Uuid) -> Result<Lead, CrmError> {
        self.store.get_lead(id).await.map_err(|e| {
            log::error!("get_lead {} failed: {}", id, e);
            e
        })
    }

    pub async fn list_leads(&self) -> Result<Vec<Lead>, CrmError> {
        self.store.list_leads().await.map_err(|e| {
            log::error!("list_leads failed: {}", e);
            e
        })
    }

    pub async fn list_view(
        &self,
        filter: &LeadFilter,
        sort: LeadSort,
        page: usize,
        page_size: Option<usize>,
    ) -> Result<Page<Lead>, CrmError> {
        let leads = self.list_leads().await?;
        let rows = filter_and_sort(&leads, filter, sort);
        Ok(paginate(
            rows,
            page,
            page_size.unwrap_or(self.config.default_page_size),
            self.config.max_page_size,
        ))
    }

    pub async fn hotlist(
        &self,
        filter: &LeadFilter,
        sort: LeadSort,
        page: usize,
        page_size: Option<usize>,
    ) -> Result<Page<Lead>, CrmError> {
        let leads = self.list_leads().await?;
        let rows = hotlist_view(&leads, filter, sort);
        Ok(paginate(
            rows,
            page,
            page_size.unwrap_or(self.config.default_page_size),
            self.config.max_page_size,
        ))
    }

    /// Partial update. Only the fields set in the patch are written, so
    /// concurrent patches of different fields never undo each other. A status
    /// in the patch runs the deal sync, whose failure never fails the update
    /// itself.
    pub async fn update_lead(&self, id: Uuid, mut patch: LeadPatch) -> Result<LeadUpdate, CrmError> {
        if let Some(arr) = patch.arr {
            if !arr.is_finite() || arr < 0.0 {
                return Err(CrmError::Validation("ARR must be a non-negative number".into()));
            }
        }
        if let Some(website) = patch.website_url.as_mut() {
            if !website.trim().is_empty() {
                *website = normalize_website(website);
            }
        }
        let now = Utc::now();

        let lead = self.store.patch_lead(id, &patch, now).await.map_err(|e| {
            log::error!("update_lead {} failed: {}", id, e);
            e
        })?;

        let deal_sync = if patch.status.is_some() {
            sync_lead_deal(self.store.as_ref(), &lead, now).await
        } else {
            DealSync::NotApplicable
        };

        Ok(LeadUpdate { lead, deal_sync })
    }

    pub async fn change_status(&self, id: Uuid, status: LeadStatus) -> Result<LeadUpdate, CrmError> {
        self.update_lead(id, LeadPatch::status(status)).await
    }

    pub async fn delete_lead(&self, id: Uuid) -> Result<(), CrmError> {
        self.store.delete_lead(id).await.map_err(|e| {
            log::error!("delete_lead {} failed: {}", id, e);
            e
        })?;
        log::info!("Deleted lead {}", id);
        Ok(())
    }

    /// Deletes one at a time and keeps going past failures.
    pub async fn bulk_delete(&self, ids: &[Uuid]) -> BulkOutcome {
        let mut succeeded = 0;
        let mut failures = Vec::new();

        for id in ids {
            match self.delete_lead(*id).await {
                Ok(()) => succeeded += 1,
                Err(e) => failures.push(BulkFailure {
                    id: *id,
                    error: e.to_string(),
                }),
            }
        }

        let failed = failures.len();
        if failed > 0 {
            log::warn!("Bulk delete: {} deleted, {} failed", succeeded, failed);
        }
        BulkOutcome {
            succeeded,
            failed,
            failures,
            message: bulk_delete_message(succeeded, failed),
        }
    }

    /// One lead per pasted URL, each built from `template`.
    pub async fn import_urls(&self, input: &str, template: NewLead) -> Result<ImportOutcome, CrmError> {
        let urls = parse_multiple_urls(input);
        if urls.is_empty() {
            return Err(CrmError::Validation("No valid URLs found in the input".into()));
        }

        let mut created = Vec::new();
        let mut failures = Vec::new();
        for url in &urls {
            let new = NewLead {
                website_url: Some(url.clone()),
                linkedin_url: template
                    .linkedin_url
                    .clone()
                    .filter(|l| !l.trim().is_empty())
                    .or_else(|| Some(default_linkedin(url))),
                ..template.clone()
            };
            match self.create_lead(new).await {
                Ok(lead) => created.push(lead),
                Err(e) => failures.push(ImportFailure {
                    url: url.clone(),
                    error: e.to_string(),
                }),
            }
        }

        let succeeded = created.len();
        let failed = failures.len();
        Ok(ImportOutcome {
            created,
            succeeded,
            failed,
            failures,
            message: import_message(succeeded, failed, urls.len()),
        })
    }

    pub async fn daily_report(&self, now: DateTime<Utc>) -> Result<DailyReport, CrmError> {
        let today = now.date_naive();
        let leads: Vec<Lead> = self
            .list_leads()
            .await?
            .into_iter()
            .filter(|l| l.created_at.date_naive() == today)
            .collect();
        let lead_count = leads.len();
        Ok(DailyReport {
            sales_rep: DAILY_REPORT_LABEL.to_string(),
            leads,
            lead_count,
            low_performance: lead_count < self.config.low_performance_threshold,
        })
    }

    pub async fn pending_follow_ups(&self, today: NaiveDate) -> Result<Vec<Lead>, CrmError> {
        let until = today + Duration::days(self.config.follow_up_window_days);
        let mut leads: Vec<Lead> = self
            .list_leads()
            .await?
            .into_iter()
            .filter(|l| matches!(l.follow_up_date, Some(d) if d >= today && d <= until))
            .collect();
        leads.sort_by_key(|l| l.follow_up_date);
        Ok(leads)
    }
}
