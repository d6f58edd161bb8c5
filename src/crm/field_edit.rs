//! Debounced inline cell edits.
//!
//! Every keystroke in a grid cell may arrive as a separate request. Edits are
//! parked per `(lead, field)` and only the latest value is committed once the
//! key has been quiet for the configured delay.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::error::CrmError;
use super::leads::LeadService;
use super::types::LeadPatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadField {
    Name,
    Email,
    WebsiteUrl,
    TeamSize,
    Arr,
    Category,
    LinkedinUrl,
    Status,
    FundingType,
    FollowUpDate,
    Edition,
    ProductName,
}

impl LeadField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::WebsiteUrl => "website_url",
            Self::TeamSize => "team_size",
            Self::Arr => "arr",
            Self::Category => "category",
            Self::LinkedinUrl => "linkedin_url",
            Self::Status => "status",
            Self::FundingType => "funding_type",
            Self::FollowUpDate => "follow_up_date",
            Self::Edition => "edition",
            Self::ProductName => "product_name",
        }
    }
}

impl fmt::Display for LeadField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadField {
    type Err = CrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "website_url" => Ok(Self::WebsiteUrl),
            "team_size" => Ok(Self::TeamSize),
            "arr" => Ok(Self::Arr),
            "category" => Ok(Self::Category),
            "linkedin_url" => Ok(Self::LinkedinUrl),
            "status" => Ok(Self::Status),
            "funding_type" => Ok(Self::FundingType),
            "follow_up_date" => Ok(Self::FollowUpDate),
            "edition" => Ok(Self::Edition),
            "product_name" => Ok(Self::ProductName),
            other => Err(CrmError::Validation(format!("unknown lead field '{other}'"))),
        }
    }
}

fn parse_follow_up(raw: &str) -> Result<Option<NaiveDate>, CrmError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(dt.date_naive()));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|dt| Some(dt.date()))
        .map_err(|_| CrmError::Validation(format!("invalid follow-up date '{raw}'")))
}

pub struct FieldEdit;

impl FieldEdit {
    /// Converts raw cell text into a single-field patch.
    pub fn parse(field: LeadField, raw: &str) -> Result<LeadPatch, CrmError> {
        let mut patch = LeadPatch::default();
        let text = raw.trim().to_string();
        match field {
            LeadField::Name => patch.name = Some(text),
            LeadField::Email => patch.email = Some(text),
            LeadField::WebsiteUrl => patch.website_url = Some(text),
            LeadField::TeamSize => patch.team_size = Some(text.parse()?),
            LeadField::Arr => {
                let value = text.parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0);
                patch.arr = Some(value);
            }
            LeadField::Category => patch.category = Some(text),
            LeadField::LinkedinUrl => patch.linkedin_url = Some(text),
            LeadField::Status => patch.status = Some(text.parse()?),
            LeadField::FundingType => patch.funding_type = Some(text.parse()?),
            LeadField::FollowUpDate => patch.follow_up_date = Some(parse_follow_up(&text)?),
            LeadField::Edition => patch.edition = Some(text),
            LeadField::ProductName => patch.product_name = Some(text),
        }
        Ok(patch)
    }
}

type EditKey = (Uuid, LeadField);

struct PendingEdit {
    generation: u64,
    patch: LeadPatch,
    handle: JoinHandle<()>,
}

/// Per-key debouncer in front of [`LeadService::update_lead`].
#[derive(Clone)]
pub struct FieldEditQueue {
    leads: LeadService,
    delay: Duration,
    pending: Arc<Mutex<HashMap<EditKey, PendingEdit>>>,
    generation: Arc<AtomicU64>,
}

impl FieldEditQueue {
    pub fn new(leads: LeadService, delay: Duration) -> Self {
        Self {
            leads,
            delay,
            pending: Arc::new(Mutex::new(HashMap::new())),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Parks an edit, replacing any pending edit for the same lead and field.
    /// Parse errors are returned at once.
    pub async fn schedule(&self, lead_id: Uuid, field: LeadField, raw: &str) -> Result<(), CrmError> {
        let patch = FieldEdit::parse(field, raw)?;
        let key = (lead_id, field);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst);

        // Held across the spawn so the timer cannot fire before its entry exists.
        let mut pending = self.pending.lock().await;
        let queue = self.clone();
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.fire(key, generation).await;
        });

        let previous = pending.insert(
            key,
            PendingEdit {
                generation,
                patch,
                handle,
            },
        );
        if let Some(previous) = previous {
            previous.handle.abort();
            log::debug!("Superseded pending edit of {} on lead {}", field, lead_id);
        }
        Ok(())
    }

    async fn fire(&self, key: EditKey, generation: u64) {
        let patch = {
            let mut pending = self.pending.lock().await;
            match pending.get(&key) {
                Some(edit) if edit.generation == generation => {
                    pending.remove(&key).map(|edit| edit.patch)
                }
                _ => None,
            }
        };
        if let Some(patch) = patch {
            self.commit(key, patch).await;
        }
    }

    async fn commit(&self, (lead_id, field): EditKey, patch: LeadPatch) {
        match self.leads.update_lead(lead_id, patch).await {
            Ok(_) => log::debug!("Committed {} on lead {}", field, lead_id),
            Err(e) => log::error!("Field edit {} on lead {} failed: {}", field, lead_id, e),
        }
    }

    /// Commits every pending edit now. Returns how many were committed.
    pub async fn flush(&self) -> usize {
        let drained: Vec<(EditKey, PendingEdit)> = self.pending.lock().await.drain().collect();
        let count = drained.len();
        for (key, edit) in drained {
            edit.handle.abort();
            self.commit(key, edit.patch).await;
        }
        if count > 0 {
            log::info!("Flushed {} pending field edit(s)", count);
        }
        count
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}
