use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::error::CrmError;

/// Enum stored and serialized as its human-readable label.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = CrmError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(CrmError::Validation(format!(
                        "unknown {} '{other}'",
                        stringify!($name)
                    ))),
                }
            }
        }
    };
}

text_enum! {
    LeadStatus {
        LaunchedOnAppSumo => "Launched on AppSumo",
        LaunchedOnPrimeClub => "Launched on Prime Club",
        KeepAnEye => "Keep an Eye",
        Rejected => "Rejected",
        Unsubscribed => "Unsubscribed",
        Outdated => "Outdated",
        Hotlist => "Hotlist",
        OutOfLeague => "Out of League",
        Connected => "Connected",
        Locked => "Locked",
        MeetingBooked => "Meeting Booked",
        MeetingDone => "Meeting Done",
        Negotiation => "Negotiation",
        ClosedLost => "Closed Lost",
    }
}

impl Default for LeadStatus {
    fn default() -> Self {
        Self::KeepAnEye
    }
}

text_enum! {
    DealStage {
        Connected => "Connected",
        Locked => "Locked",
        MeetingBooked => "Meeting Booked",
        MeetingDone => "Meeting Done",
        Negotiation => "Negotiation",
        Closed => "Closed",
        Lost => "Lost",
    }
}

text_enum! {
    TeamSize {
        OneToThree => "1-3",
        FourToTen => "4-10",
        ElevenToFifty => "11-50",
        FiftyOneToHundred => "51-100",
        HundredOneToFiveHundred => "101-500",
        FiveHundredOneToThousand => "501-1000",
        OverThousand => "1001+",
    }
}

impl Default for TeamSize {
    fn default() -> Self {
        Self::OneToThree
    }
}

text_enum! {
    FundingType {
        Bootstrapped => "Bootstrapped",
        PreSeed => "Pre-seed",
        YCombinator => "Y Combinator",
        Angel => "Angel",
        Seed => "Seed",
        SeriesA => "Series A",
        SeriesB => "Series B",
        SeriesC => "Series C",
    }
}

impl Default for FundingType {
    fn default() -> Self {
        Self::Bootstrapped
    }
}

text_enum! {
    Role {
        Admin => "admin",
        Manager => "manager",
        Sales => "sales",
        Viewer => "viewer",
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Viewer
    }
}

text_enum! {
    MemberStatus {
        Pending => "pending",
        Active => "active",
        Inactive => "inactive",
    }
}

pub const DEFAULT_EDITION: &str = "Select Edition";
pub const UNASSIGNED_REP: &str = "Unassigned";

// Distinguishes an absent field from an explicit null.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub website_url: String,
    pub team_size: TeamSize,
    pub arr: f64,
    pub category: String,
    pub linkedin_url: String,
    pub status: LeadStatus,
    pub funding_type: FundingType,
    pub follow_up_date: Option<NaiveDate>,
    pub edition: String,
    pub product_name: String,
    pub added_by: Option<Uuid>,
    pub added_by_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewLead {
    pub name: Option<String>,
    pub email: Option<String>,
    pub website_url: Option<String>,
    pub team_size: Option<TeamSize>,
    pub arr: Option<f64>,
    pub category: Option<String>,
    pub linkedin_url: Option<String>,
    pub status: Option<LeadStatus>,
    pub funding_type: Option<FundingType>,
    pub follow_up_date: Option<NaiveDate>,
    pub edition: Option<String>,
    pub product_name: Option<String>,
    pub added_by: Option<Uuid>,
    pub added_by_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub team_size: Option<TeamSize>,
    #[serde(default)]
    pub arr: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub status: Option<LeadStatus>,
    #[serde(default)]
    pub funding_type: Option<FundingType>,
    #[serde(default, deserialize_with = "double_option")]
    pub follow_up_date: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub edition: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub added_by: Option<Option<Uuid>>,
    #[serde(default)]
    pub added_by_name: Option<String>,
}

impl LeadPatch {
    pub fn status(status: LeadStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, lead: &mut Lead) {
        if let Some(ref v) = self.name {
            lead.name = v.clone();
        }
        if let Some(ref v) = self.email {
            lead.email = v.clone();
        }
        if let Some(ref v) = self.website_url {
            lead.website_url = v.clone();
        }
        if let Some(v) = self.team_size {
            lead.team_size = v;
        }
        if let Some(v) = self.arr {
            lead.arr = v;
        }
        if let Some(ref v) = self.category {
            lead.category = v.clone();
        }
        if let Some(ref v) = self.linkedin_url {
            lead.linkedin_url = v.clone();
        }
        if let Some(v) = self.status {
            lead.status = v;
        }
        if let Some(v) = self.funding_type {
            lead.funding_type = v;
        }
        if let Some(v) = self.follow_up_date {
            lead.follow_up_date = v;
        }
        if let Some(ref v) = self.edition {
            lead.edition = v.clone();
        }
        if let Some(ref v) = self.product_name {
            lead.product_name = v.clone();
        }
        if let Some(v) = self.added_by {
            lead.added_by = v;
        }
        if let Some(ref v) = self.added_by_name {
            lead.added_by_name = v.clone();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: Uuid,
    pub name: String,
    pub lead_name: String,
    pub lead_id: Option<Uuid>,
    pub value: f64,
    pub stage: DealStage,
    pub assigned_rep: String,
    pub edition: String,
    pub start_month: i32,
    pub end_month: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDeal {
    pub name: String,
    #[serde(default)]
    pub lead_name: Option<String>,
    #[serde(default)]
    pub lead_id: Option<Uuid>,
    #[serde(default)]
    pub value: Option<f64>,
    pub stage: DealStage,
    #[serde(default)]
    pub assigned_rep: Option<String>,
    #[serde(default)]
    pub edition: Option<String>,
    pub start_month: i32,
    pub end_month: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DealPatch {
    pub name: Option<String>,
    pub lead_name: Option<String>,
    pub lead_id: Option<Uuid>,
    pub value: Option<f64>,
    pub stage: Option<DealStage>,
    pub assigned_rep: Option<String>,
    pub edition: Option<String>,
    pub start_month: Option<i32>,
    pub end_month: Option<i32>,
}

impl DealPatch {
    pub fn stage(stage: DealStage) -> Self {
        Self {
            stage: Some(stage),
            ..Self::default()
        }
    }

    pub fn apply(&self, deal: &mut Deal) {
        if let Some(ref v) = self.name {
            deal.name = v.clone();
        }
        if let Some(ref v) = self.lead_name {
            deal.lead_name = v.clone();
        }
        if let Some(v) = self.lead_id {
            deal.lead_id = Some(v);
        }
        if let Some(v) = self.value {
            deal.value = v;
        }
        if let Some(v) = self.stage {
            deal.stage = v;
        }
        if let Some(ref v) = self.assigned_rep {
            deal.assigned_rep = v.clone();
        }
        if let Some(ref v) = self.edition {
            deal.edition = v.clone();
        }
        if let Some(v) = self.start_month {
            deal.start_month = v;
        }
        if let Some(v) = self.end_month {
            deal.end_month = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRep {
    pub id: Uuid,
    pub name: String,
    pub leads_contacted: i32,
    pub meetings_booked: i32,
    pub deals_closed: i32,
    pub total_revenue: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSalesRep {
    pub name: String,
    #[serde(default)]
    pub leads_contacted: Option<i32>,
    #[serde(default)]
    pub meetings_booked: Option<i32>,
    #[serde(default)]
    pub deals_closed: Option<i32>,
    #[serde(default)]
    pub total_revenue: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SalesRepPatch {
    pub name: Option<String>,
    pub leads_contacted: Option<i32>,
    pub meetings_booked: Option<i32>,
    pub deals_closed: Option<i32>,
    pub total_revenue: Option<f64>,
}

impl SalesRepPatch {
    pub fn apply(&self, rep: &mut SalesRep) {
        if let Some(ref v) = self.name {
            rep.name = v.clone();
        }
        if let Some(v) = self.leads_contacted {
            rep.leads_contacted = v;
        }
        if let Some(v) = self.meetings_booked {
            rep.meetings_booked = v;
        }
        if let Some(v) = self.deals_closed {
            rep.deals_closed = v;
        }
        if let Some(v) = self.total_revenue {
            rep.total_revenue = v;
        }
    }
}

/// Page-level access flags. Stored and returned, not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Permissions {
    pub dashboard: bool,
    pub leads: bool,
    pub hotlist: bool,
    pub pipeline: bool,
    pub calendar: bool,
    pub analytics: bool,
    pub leaderboard: bool,
    pub contacts: bool,
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            dashboard: true,
            leads: false,
            hotlist: false,
            pipeline: false,
            calendar: false,
            analytics: false,
            leaderboard: false,
            contacts: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub permissions: Permissions,
    pub status: MemberStatus,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InviteMember {
    pub name: String,
    pub email: String,
    pub role: Option<Role>,
    pub permissions: Option<Permissions>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamMemberPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub permissions: Option<Permissions>,
    pub status: Option<MemberStatus>,
    pub last_login: Option<DateTime<Utc>>,
}

impl TeamMemberPatch {
    pub fn apply(&self, member: &mut TeamMember) {
        if let Some(ref v) = self.name {
            member.name = v.trim().to_string();
        }
        if let Some(ref v) = self.email {
            member.email = v.trim().to_lowercase();
        }
        if let Some(v) = self.role {
            member.role = v;
        }
        if let Some(v) = self.permissions {
            member.permissions = v;
        }
        if let Some(v) = self.status {
            member.status = v;
        }
        if let Some(v) = self.last_login {
            member.last_login = Some(v);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub company: String,
    pub status: String,
    pub assigned_rep: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewContact {
    pub name: String,
    pub email: Option<String>,
    pub company: Option<String>,
    pub status: Option<String>,
    pub assigned_rep: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub status: Option<String>,
    pub assigned_rep: Option<String>,
    pub notes: Option<String>,
}

impl ContactPatch {
    pub fn apply(&self, contact: &mut Contact) {
        if let Some(ref v) = self.name {
            contact.name = v.clone();
        }
        if let Some(ref v) = self.email {
            contact.email = v.clone();
        }
        if let Some(ref v) = self.company {
            contact.company = v.clone();
        }
        if let Some(ref v) = self.status {
            contact.status = v.clone();
        }
        if let Some(ref v) = self.assigned_rep {
            contact.assigned_rep = v.clone();
        }
        if let Some(ref v) = self.notes {
            contact.notes = v.clone();
        }
    }
}
