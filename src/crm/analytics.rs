//! Lead analytics: period counts, distributions, daily chart, per-rep
//! performance, the sales funnel, monthly revenue and the activity feed.
//! Every period query takes `now` explicitly.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use super::error::CrmError;
use super::store::CrmStore;
use super::types::{Lead, LeadStatus};
use super::url_parse::website_slug;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const RECENT_ACTIVITY_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Today,
    Yesterday,
    Week,
    Month,
    #[default]
    All,
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::Week => "week",
            Self::Month => "month",
            Self::All => "all",
        };
        f.write_str(s)
    }
}

impl FromStr for Period {
    type Err = CrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(Self::Today),
            "yesterday" => Ok(Self::Yesterday),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "all" => Ok(Self::All),
            other => Err(CrmError::Validation(format!("unknown period '{other}'"))),
        }
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

impl Period {
    /// Half-open `[start, end)` window, or `None` for all time. Week and month
    /// reach back 7 and 30 days from midnight and run through the end of today.
    pub fn range(&self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let today = start_of_day(now.date_naive());
        let tomorrow = today + Duration::days(1);
        match self {
            Self::Today => Some((today, tomorrow)),
            Self::Yesterday => Some((today - Duration::days(1), today)),
            Self::Week => Some((today - Duration::days(7), tomorrow)),
            Self::Month => Some((today - Duration::days(30), tomorrow)),
            Self::All => None,
        }
    }

    pub fn contains(&self, now: DateTime<Utc>, at: DateTime<Utc>) -> bool {
        match self.range(now) {
            Some((start, end)) => at >= start && at < end,
            None => true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadsAnalytics {
    pub leads: Vec<Lead>,
    pub total_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodCount {
    pub count: usize,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct TodayCount {
    pub count: usize,
    pub trend: i64,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodMetrics {
    pub today: TodayCount,
    pub yesterday: PeriodCount,
    pub week: PeriodCount,
    pub month: PeriodCount,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadsMetrics {
    pub metrics: PeriodMetrics,
    pub status_distribution: BTreeMap<String, usize>,
    pub category_distribution: BTreeMap<String, usize>,
    pub total_leads: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: String,
    pub count: usize,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserPerformance {
    pub id: Uuid,
    pub name: String,
    pub leads_contacted: i32,
    pub meetings_booked: i32,
    pub deals_closed: i32,
    pub total_revenue: f64,
    pub total_leads: usize,
    pub today_leads: usize,
    pub week_leads: usize,
    pub month_leads: usize,
    pub conversion_rate: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesFunnel {
    pub total_leads: usize,
    pub connected: usize,
    pub meeting_booked: usize,
    pub meeting_done: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueSeries {
    pub name: String,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueTrends {
    pub year: i32,
    pub categories: Vec<String>,
    pub series: Vec<RevenueSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityItem {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub time: String,
    pub date: String,
    pub created_at: DateTime<Utc>,
}

impl ActivityItem {
    fn new_lead(lead: &Lead) -> Self {
        let domain = website_slug(&lead.website_url);
        let domain = if domain.is_empty() { "Unknown URL".to_string() } else { domain };
        Self {
            id: lead.id,
            title: format!("New lead added: {domain}"),
            kind: "contact".to_string(),
            time: lead.created_at.format("%I:%M %p").to_string(),
            date: lead.created_at.format("%Y-%m-%d").to_string(),
            created_at: lead.created_at,
        }
    }
}

/// Percent change from yesterday; a day with no prior leads counts as +100.
pub fn today_trend(today: usize, yesterday: usize) -> i64 {
    if yesterday == 0 {
        return 100;
    }
    ((today as f64 - yesterday as f64) / yesterday as f64 * 100.0).round() as i64
}

pub fn conversion_rate(deals_closed: i32, meetings_booked: i32) -> i64 {
    if meetings_booked <= 0 {
        return 0;
    }
    (deals_closed as f64 / meetings_booked as f64 * 100.0).round() as i64
}

fn count_in(leads: &[Lead], period: Period, now: DateTime<Utc>) -> usize {
    leads
        .iter()
        .filter(|l| period.contains(now, l.created_at))
        .count()
}

fn distribution<'a>(values: impl Iterator<Item = &'a str>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for value in values {
        let key = if value.trim().is_empty() { "Unknown" } else { value };
        *counts.entry(key.to_string()).or_insert(0) += 1;
    }
    counts
}

#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<dyn CrmStore>,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn CrmStore>) -> Self {
        Self { store }
    }

    async fn leads_for(&self, user: Option<Uuid>) -> Result<Vec<Lead>, CrmError> {
        let leads = self.store.list_leads().await.map_err(|e| {
            log::error!("analytics list_leads failed: {}", e);
            e
        })?;
        Ok(match user {
            Some(user) => leads
                .into_iter()
                .filter(|l| l.added_by == Some(user))
                .collect(),
            None => leads,
        })
    }

    pub async fn leads_analytics(
        &self,
        period: Period,
        user: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<LeadsAnalytics, CrmError> {
        let leads: Vec<Lead> = self
            .leads_for(user)
            .await?
            .into_iter()
            .filter(|l| period.contains(now, l.created_at))
            .collect();
        let total_count = leads.len();
        Ok(LeadsAnalytics { leads, total_count })
    }

    pub async fn leads_metrics(
        &self,
        user: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<LeadsMetrics, CrmError> {
        let leads = self.leads_for(user).await?;
        let today = count_in(&leads, Period::Today, now);
        let yesterday = count_in(&leads, Period::Yesterday, now);

        Ok(LeadsMetrics {
            metrics: PeriodMetrics {
                today: TodayCount {
                    count: today,
                    trend: today_trend(today, yesterday),
                    label: "Today",
                },
                yesterday: PeriodCount {
                    count: yesterday,
                    label: "Yesterday",
                },
                week: PeriodCount {
                    count: count_in(&leads, Period::Week, now),
                    label: "This Week",
                },
                month: PeriodCount {
                    count: count_in(&leads, Period::Month, now),
                    label: "This Month",
                },
            },
            status_distribution: distribution(leads.iter().map(|l| l.status.as_str())),
            category_distribution: distribution(leads.iter().map(|l| l.category.as_str())),
            total_leads: leads.len(),
        })
    }

    /// One point per day, oldest first, ending today.
    pub async fn daily_leads_chart(
        &self,
        user: Option<Uuid>,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<ChartPoint>, CrmError> {
        let leads = self.leads_for(user).await?;
        let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        for lead in &leads {
            *per_day.entry(lead.created_at.date_naive()).or_insert(0) += 1;
        }

        let today = now.date_naive();
        Ok((0..days as i64)
            .rev()
            .map(|back| {
                let day = today - Duration::days(back);
                ChartPoint {
                    date: day.format("%Y-%m-%d").to_string(),
                    count: per_day.get(&day).copied().unwrap_or(0),
                    label: day.format("%b %-d").to_string(),
                }
            })
            .collect())
    }

    pub async fn user_performance(&self, now: DateTime<Utc>) -> Result<Vec<UserPerformance>, CrmError> {
        let reps = self.store.list_sales_reps().await.map_err(|e| {
            log::error!("analytics list_sales_reps failed: {}", e);
            e
        })?;
        let leads = self.leads_for(None).await?;

        let mut stats: Vec<UserPerformance> = reps
            .into_iter()
            .map(|rep| {
                let mine: Vec<Lead> = leads
                    .iter()
                    .filter(|l| l.added_by == Some(rep.id))
                    .cloned()
                    .collect();
                UserPerformance {
                    id: rep.id,
                    total_leads: mine.len(),
                    today_leads: count_in(&mine, Period::Today, now),
                    week_leads: count_in(&mine, Period::Week, now),
                    month_leads: count_in(&mine, Period::Month, now),
                    conversion_rate: conversion_rate(rep.deals_closed, rep.meetings_booked),
                    name: rep.name,
                    leads_contacted: rep.leads_contacted,
                    meetings_booked: rep.meetings_booked,
                    deals_closed: rep.deals_closed,
                    total_revenue: rep.total_revenue,
                }
            })
            .collect();
        stats.sort_by(|a, b| b.total_leads.cmp(&a.total_leads));
        Ok(stats)
    }

    pub async fn sales_funnel(&self) -> Result<SalesFunnel, CrmError> {
        let leads = self.leads_for(None).await?;
        let with = |status: LeadStatus| leads.iter().filter(|l| l.status == status).count();
        Ok(SalesFunnel {
            total_leads: leads.len(),
            connected: with(LeadStatus::Connected),
            meeting_booked: with(LeadStatus::MeetingBooked),
            meeting_done: with(LeadStatus::MeetingDone),
        })
    }

    /// Lead ARR summed per creation month of `year`.
    pub async fn revenue_trends(&self, year: i32) -> Result<RevenueTrends, CrmError> {
        let leads = self.leads_for(None).await?;
        let mut monthly = [0.0_f64; 12];
        for lead in leads.iter().filter(|l| l.created_at.year() == year) {
            monthly[lead.created_at.month0() as usize] += lead.arr;
        }
        Ok(RevenueTrends {
            year,
            categories: MONTH_LABELS.iter().map(|m| m.to_string()).collect(),
            series: vec![RevenueSeries {
                name: "Monthly Revenue".to_string(),
                data: monthly.to_vec(),
            }],
        })
    }

    /// Newest leads first, one entry per lead.
    pub async fn recent_activity(&self) -> Result<Vec<ActivityItem>, CrmError> {
        let mut leads = self.leads_for(None).await?;
        leads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(leads
            .iter()
            .take(RECENT_ACTIVITY_LIMIT)
            .map(ActivityItem::new_lead)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shared::test_utils::{sample_lead, sample_rep};
    use crate::crm::store::MemoryCrmStore;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 20, 12, 0, 0).unwrap()
    }

    async fn seeded(rep: Uuid) -> AnalyticsService {
        let store = Arc::new(MemoryCrmStore::new());
        let now = noon();
        let offsets = [
            (0, LeadStatus::Connected, "CRM", true),
            (0, LeadStatus::Hotlist, "", false),
            (1, LeadStatus::MeetingBooked, "CRM", true),
            (5, LeadStatus::MeetingDone, "Fintech", true),
            (20, LeadStatus::Connected, "Fintech", false),
            (90, LeadStatus::KeepAnEye, "CRM", false),
        ];
        for (i, (days_ago, status, category, mine)) in offsets.into_iter().enumerate() {
            let mut lead = sample_lead(&format!("lead{i}.com"));
            lead.created_at = now - Duration::days(days_ago);
            lead.status = status;
            lead.category = category.to_string();
            if mine {
                lead.added_by = Some(rep);
            }
            store.insert_lead(lead).await.unwrap();
        }
        AnalyticsService::new(store)
    }

    #[test]
    fn test_period_ranges() {
        let now = noon();
        let (start, end) = Period::Today.range(now).unwrap();
        assert_eq!(start.to_rfc3339(), "2026-01-20T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2026-01-21T00:00:00+00:00");
        let (start, _) = Period::Week.range(now).unwrap();
        assert_eq!(start.to_rfc3339(), "2026-01-13T00:00:00+00:00");
        assert!(Period::All.range(now).is_none());
        assert!("fortnight".parse::<Period>().is_err());
    }

    #[test]
    fn test_trend_and_conversion() {
        assert_eq!(today_trend(3, 0), 100);
        assert_eq!(today_trend(3, 2), 50);
        assert_eq!(today_trend(1, 3), -67);
        assert_eq!(conversion_rate(1, 3), 33);
        assert_eq!(conversion_rate(5, 0), 0);
    }

    #[tokio::test]
    async fn test_metrics() {
        let rep = Uuid::new_v4();
        let svc = seeded(rep).await;
        let m = svc.leads_metrics(None, noon()).await.unwrap();
        assert_eq!(m.metrics.today.count, 2);
        assert_eq!(m.metrics.yesterday.count, 1);
        assert_eq!(m.metrics.today.trend, 100);
        assert_eq!(m.metrics.week.count, 4);
        assert_eq!(m.metrics.month.count, 5);
        assert_eq!(m.total_leads, 6);
        assert_eq!(m.status_distribution.get("Connected"), Some(&2));
        assert_eq!(m.category_distribution.get("Unknown"), Some(&1));
        assert_eq!(m.category_distribution.get("CRM"), Some(&3));

        let mine = svc.leads_metrics(Some(rep), noon()).await.unwrap();
        assert_eq!(mine.total_leads, 3);
        assert_eq!(mine.metrics.today.trend, 0);
    }

    #[tokio::test]
    async fn test_leads_analytics_period() {
        let svc = seeded(Uuid::new_v4()).await;
        let week = svc.leads_analytics(Period::Week, None, noon()).await.unwrap();
        assert_eq!(week.total_count, 4);
        let all = svc.leads_analytics(Period::All, None, noon()).await.unwrap();
        assert_eq!(all.total_count, 6);
    }

    #[tokio::test]
    async fn test_daily_chart() {
        let svc = seeded(Uuid::new_v4()).await;
        let chart = svc.daily_leads_chart(None, 7, noon()).await.unwrap();
        assert_eq!(chart.len(), 7);
        assert_eq!(chart[0].date, "2026-01-14");
        assert_eq!(chart[6].date, "2026-01-20");
        assert_eq!(chart[6].count, 2);
        assert_eq!(chart[6].label, "Jan 20");
        assert_eq!(chart[5].count, 1);
        assert_eq!(chart[1].count, 1);
    }

    #[tokio::test]
    async fn test_user_performance_and_funnel() {
        let store = Arc::new(MemoryCrmStore::new());
        let mut busy = sample_rep("Busy");
        busy.meetings_booked = 4;
        busy.deals_closed = 1;
        let idle = sample_rep("Idle");
        store.insert_sales_rep(idle.clone()).await.unwrap();
        store.insert_sales_rep(busy.clone()).await.unwrap();
        for i in 0..2 {
            let mut lead = sample_lead(&format!("b{i}.com"));
            lead.added_by = Some(busy.id);
            lead.created_at = noon();
            lead.status = LeadStatus::Connected;
            store.insert_lead(lead).await.unwrap();
        }

        let svc = AnalyticsService::new(store);
        let perf = svc.user_performance(noon()).await.unwrap();
        assert_eq!(perf[0].name, "Busy");
        assert_eq!(perf[0].total_leads, 2);
        assert_eq!(perf[0].today_leads, 2);
        assert_eq!(perf[0].conversion_rate, 25);
        assert_eq!(perf[1].total_leads, 0);
        assert_eq!(perf[1].conversion_rate, 0);

        let funnel = svc.sales_funnel().await.unwrap();
        assert_eq!(
            funnel,
            SalesFunnel {
                total_leads: 2,
                connected: 2,
                meeting_booked: 0,
                meeting_done: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_revenue_trends_sum_per_month() {
        let store = Arc::new(MemoryCrmStore::new());
        let dated = [
            ((2026, 1, 3), 100.0),
            ((2026, 1, 28), 50.0),
            ((2026, 12, 31), 25.0),
            ((2025, 1, 15), 999.0),
        ];
        for (i, ((y, m, d), arr)) in dated.into_iter().enumerate() {
            let mut lead = sample_lead(&format!("rev{i}.com"));
            lead.created_at = Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap();
            lead.arr = arr;
            store.insert_lead(lead).await.unwrap();
        }

        let trends = AnalyticsService::new(store).revenue_trends(2026).await.unwrap();
        assert_eq!(trends.year, 2026);
        assert_eq!(trends.categories.len(), 12);
        assert_eq!(trends.categories[0], "Jan");
        assert_eq!(trends.categories[11], "Dec");
        assert_eq!(trends.series.len(), 1);
        assert_eq!(trends.series[0].name, "Monthly Revenue");
        let data = &trends.series[0].data;
        assert_eq!(data.len(), 12);
        assert_eq!(data[0], 150.0);
        assert_eq!(data[11], 25.0);
        assert_eq!(data.iter().sum::<f64>(), 175.0);
    }

    #[tokio::test]
    async fn test_recent_activity_newest_first() {
        let store = Arc::new(MemoryCrmStore::new());
        let now = noon();
        for i in 0..12 {
            let mut lead = sample_lead(&format!("act{i}.com"));
            lead.created_at = now - Duration::hours(i);
            store.insert_lead(lead).await.unwrap();
        }
        let mut blank = sample_lead("blank.com");
        blank.website_url = String::new();
        blank.created_at = now + Duration::minutes(5);
        store.insert_lead(blank).await.unwrap();

        let feed = AnalyticsService::new(store).recent_activity().await.unwrap();
        assert_eq!(feed.len(), 10);
        assert_eq!(feed[0].title, "New lead added: Unknown URL");
        assert_eq!(feed[1].title, "New lead added: act0.com");
        assert_eq!(feed[1].kind, "contact");
        assert_eq!(feed[1].time, "12:00 PM");
        assert_eq!(feed[1].date, "2026-01-20");
        assert_eq!(feed[9].title, "New lead added: act8.com");

        let json = serde_json::to_value(&feed[1]).unwrap();
        assert_eq!(json["type"], "contact");
    }
}
