//! Keeps the pipeline in step with lead status changes.
//!
//! Pipeline statuses map onto a deal stage. When a lead enters one, its deal
//! is moved to that stage, or created if the lead has none yet. Every other
//! status leaves deals alone.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::store::{CrmStore, Upserted};
use super::types::{Deal, DealStage, Lead, LeadStatus, UNASSIGNED_REP};
use super::url_parse::domain_of;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", content = "detail", rename_all = "snake_case")]
pub enum DealSync {
    NotApplicable,
    Created(Deal),
    Updated(Deal),
    Failed(String),
}

impl DealSync {
    pub fn deal(&self) -> Option<&Deal> {
        match self {
            Self::Created(deal) | Self::Updated(deal) => Some(deal),
            _ => None,
        }
    }
}

pub fn stage_for_status(status: LeadStatus) -> Option<DealStage> {
    match status {
        LeadStatus::Connected => Some(DealStage::Connected),
        LeadStatus::Locked => Some(DealStage::Locked),
        LeadStatus::MeetingBooked => Some(DealStage::MeetingBooked),
        LeadStatus::MeetingDone => Some(DealStage::MeetingDone),
        LeadStatus::Negotiation => Some(DealStage::Negotiation),
        LeadStatus::ClosedLost => Some(DealStage::Lost),
        _ => None,
    }
}

/// Builds the deal a lead gets when it first enters the pipeline.
pub fn deal_for_lead(lead: &Lead, stage: DealStage, now: DateTime<Utc>) -> Deal {
    let domain = domain_of(&lead.website_url);
    let name = if lead.product_name.trim().is_empty() {
        format!("{domain} - {}", lead.category)
    } else {
        lead.product_name.clone()
    };
    let lead_name = if lead.name.trim().is_empty() {
        domain
    } else {
        lead.name.clone()
    };
    let assigned_rep = if lead.added_by_name.trim().is_empty() {
        UNASSIGNED_REP.to_string()
    } else {
        lead.added_by_name.clone()
    };
    // Twelve-month term: ends in the same calendar month a year later.
    let month = now.month() as i32;

    Deal {
        id: Uuid::new_v4(),
        name,
        lead_name,
        lead_id: Some(lead.id),
        value: lead.arr,
        stage,
        assigned_rep,
        edition: lead.edition.clone(),
        start_month: month,
        end_month: month,
        created_at: now,
        updated_at: now,
    }
}

/// Applies the status rule for `lead`. Errors are logged and reported in the
/// outcome instead of being returned.
pub async fn sync_lead_deal(store: &dyn CrmStore, lead: &Lead, now: DateTime<Utc>) -> DealSync {
    let Some(stage) = stage_for_status(lead.status) else {
        return DealSync::NotApplicable;
    };

    let result = store
        .upsert_lead_deal(deal_for_lead(lead, stage, now), stage)
        .await
        .map(|outcome| match outcome {
            Upserted::Created(deal) => DealSync::Created(deal),
            Upserted::Updated(deal) => DealSync::Updated(deal),
        });

    match result {
        Ok(outcome) => {
            log::info!(
                "Deal sync for lead {} ({}): {}",
                lead.id,
                lead.status,
                match &outcome {
                    DealSync::Created(_) => "created",
                    _ => "updated",
                }
            );
            outcome
        }
        Err(e) => {
            log::error!("Deal sync failed for lead {}: {}", lead.id, e);
            DealSync::Failed(e.to_string())
        }
    }
}
