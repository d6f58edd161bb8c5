//! Filtering, sorting and pagination over lead lists.
//!
//! Pure functions: given the same leads, filter and sort, the displayed rows
//! are always the same.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::types::{Lead, LeadStatus};

pub const ALL: &str = "all";
const PAGE_WINDOW: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadFilter {
    pub search: Option<String>,
    pub status: Option<String>,
    pub funding_type: Option<String>,
    pub category: Option<String>,
    pub team_size: Option<String>,
}

fn constraint(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != ALL)
}

impl LeadFilter {
    pub fn matches(&self, lead: &Lead) -> bool {
        if let Some(term) = constraint(&self.search) {
            let term = term.to_lowercase();
            let haystacks = [
                lead.name.as_str(),
                lead.email.as_str(),
                lead.website_url.as_str(),
                lead.category.as_str(),
                lead.team_size.as_str(),
                lead.product_name.as_str(),
            ];
            if !haystacks.iter().any(|h| h.to_lowercase().contains(&term)) {
                return false;
            }
        }
        if let Some(status) = constraint(&self.status) {
            if lead.status.as_str() != status {
                return false;
            }
        }
        if let Some(funding) = constraint(&self.funding_type) {
            if lead.funding_type.as_str() != funding {
                return false;
            }
        }
        if let Some(category) = constraint(&self.category) {
            if lead.category != category {
                return false;
            }
        }
        if let Some(size) = constraint(&self.team_size) {
            if lead.team_size.as_str() != size {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Name,
    Email,
    WebsiteUrl,
    TeamSize,
    Arr,
    Category,
    Status,
    FundingType,
    FollowUpDate,
    #[default]
    CreatedAt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadSort {
    pub field: SortField,
    pub order: SortOrder,
}

impl LeadSort {
    pub fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }

    fn compare(&self, a: &Lead, b: &Lead) -> Ordering {
        let ordering = match self.field {
            SortField::Name => a.name.cmp(&b.name),
            SortField::Email => a.email.cmp(&b.email),
            // Website column orders by when the row was added.
            SortField::WebsiteUrl | SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::TeamSize => a.team_size.as_str().cmp(b.team_size.as_str()),
            SortField::Arr => a.arr.total_cmp(&b.arr),
            SortField::Category => a.category.cmp(&b.category),
            SortField::Status => a.status.as_str().cmp(b.status.as_str()),
            SortField::FundingType => a.funding_type.as_str().cmp(b.funding_type.as_str()),
            SortField::FollowUpDate => a.follow_up_date.cmp(&b.follow_up_date),
        };
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Clicking the active column flips its order; a new column starts ascending.
pub fn toggle_sort(current: LeadSort, field: SortField) -> LeadSort {
    if current.field == field {
        LeadSort::new(field, current.order.flipped())
    } else {
        LeadSort::new(field, SortOrder::Asc)
    }
}

pub fn filter_and_sort(leads: &[Lead], filter: &LeadFilter, sort: LeadSort) -> Vec<Lead> {
    let mut rows: Vec<Lead> = leads.iter().filter(|l| filter.matches(l)).cloned().collect();
    rows.sort_by(|a, b| sort.compare(a, b));
    rows
}

/// Same pipeline restricted to leads on the hotlist.
pub fn hotlist_view(leads: &[Lead], filter: &LeadFilter, sort: LeadSort) -> Vec<Lead> {
    let filter = LeadFilter {
        status: Some(LeadStatus::Hotlist.as_str().to_string()),
        ..filter.clone()
    };
    filter_and_sort(leads, &filter, sort)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: usize,
    pub total_pages: usize,
    pub page: usize,
    pub page_size: usize,
    pub page_numbers: Vec<usize>,
}

/// Pager buttons: at most five, centred on the current page where possible.
/// A page past the end shows the last window.
pub fn page_numbers(page: usize, total_pages: usize) -> Vec<usize> {
    if total_pages <= PAGE_WINDOW {
        return (1..=total_pages).collect();
    }
    let page = page.clamp(1, total_pages);
    let first = if page <= 3 {
        1
    } else if page + 2 >= total_pages {
        total_pages - (PAGE_WINDOW - 1)
    } else {
        page - 2
    };
    (first..first + PAGE_WINDOW).collect()
}

pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize, max_page_size: usize) -> Page<T> {
    let page = page.max(1);
    let page_size = page_size.clamp(1, max_page_size.max(1));
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size);
    let start = (page - 1).saturating_mul(page_size);

    let items: Vec<T> = items.into_iter().skip(start).take(page_size).collect();

    Page {
        items,
        total_items,
        total_pages,
        page,
        page_size,
        page_numbers: page_numbers(page, total_pages),
    }
}
