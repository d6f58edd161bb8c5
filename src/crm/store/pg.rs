use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::{CrmStore, Upserted};
use crate::core::shared::schema::{contacts, deals, leads, sales_reps, team_members};
use crate::core::shared::utils::DbPool;
use crate::crm::error::CrmError;
use crate::crm::types::{
    Contact, Deal, DealStage, Lead, LeadPatch, Permissions, SalesRep, TeamMember,
};

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = leads)]
struct DbLead {
    id: Uuid,
    name: String,
    email: String,
    website_url: String,
    team_size: String,
    arr: f64,
    category: String,
    linkedin_url: String,
    status: String,
    funding_type: String,
    follow_up_date: Option<NaiveDate>,
    edition: String,
    product_name: String,
    added_by: Option<Uuid>,
    added_by_name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Column-level lead update. `None` leaves a column untouched; the nested
/// options set nullable columns to NULL.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = leads)]
struct DbLeadChanges {
    name: Option<String>,
    email: Option<String>,
    website_url: Option<String>,
    team_size: Option<String>,
    arr: Option<f64>,
    category: Option<String>,
    linkedin_url: Option<String>,
    status: Option<String>,
    funding_type: Option<String>,
    follow_up_date: Option<Option<NaiveDate>>,
    edition: Option<String>,
    product_name: Option<String>,
    added_by: Option<Option<Uuid>>,
    added_by_name: Option<String>,
    updated_at: DateTime<Utc>,
}

impl DbLeadChanges {
    fn new(patch: &LeadPatch, updated_at: DateTime<Utc>) -> Self {
        Self {
            name: patch.name.clone(),
            email: patch.email.clone(),
            website_url: patch.website_url.clone(),
            team_size: patch.team_size.map(|v| v.to_string()),
            arr: patch.arr,
            category: patch.category.clone(),
            linkedin_url: patch.linkedin_url.clone(),
            status: patch.status.map(|v| v.to_string()),
            funding_type: patch.funding_type.map(|v| v.to_string()),
            follow_up_date: patch.follow_up_date,
            edition: patch.edition.clone(),
            product_name: patch.product_name.clone(),
            added_by: patch.added_by,
            added_by_name: patch.added_by_name.clone(),
            updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = deals)]
#[diesel(treat_none_as_null = true)]
struct DbDeal {
    id: Uuid,
    name: String,
    lead_name: String,
    lead_id: Option<Uuid>,
    value: f64,
    stage: String,
    assigned_rep: String,
    edition: String,
    start_month: i32,
    end_month: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = sales_reps)]
struct DbSalesRep {
    id: Uuid,
    name: String,
    leads_contacted: i32,
    meetings_booked: i32,
    deals_closed: i32,
    total_revenue: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = team_members)]
#[diesel(treat_none_as_null = true)]
struct DbTeamMember {
    id: Uuid,
    name: String,
    email: String,
    role: String,
    permissions: serde_json::Value,
    status: String,
    last_login: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = contacts)]
struct DbContact {
    id: Uuid,
    name: String,
    email: String,
    company: String,
    status: String,
    assigned_rep: String,
    notes: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn stored<T: std::str::FromStr<Err = CrmError>>(value: &str) -> Result<T, CrmError> {
    value
        .parse()
        .map_err(|e: CrmError| CrmError::Database(format!("corrupt row: {e}")))
}

impl From<Lead> for DbLead {
    fn from(l: Lead) -> Self {
        Self {
            id: l.id,
            name: l.name,
            email: l.email,
            website_url: l.website_url,
            team_size: l.team_size.to_string(),
            arr: l.arr,
            category: l.category,
            linkedin_url: l.linkedin_url,
            status: l.status.to_string(),
            funding_type: l.funding_type.to_string(),
            follow_up_date: l.follow_up_date,
            edition: l.edition,
            product_name: l.product_name,
            added_by: l.added_by,
            added_by_name: l.added_by_name,
            created_at: l.created_at,
            updated_at: l.updated_at,
        }
    }
}

impl TryFrom<DbLead> for Lead {
    type Error = CrmError;

    fn try_from(db: DbLead) -> Result<Self, Self::Error> {
        Ok(Self {
            id: db.id,
            name: db.name,
            email: db.email,
            website_url: db.website_url,
            team_size: stored(&db.team_size)?,
            arr: db.arr,
            category: db.category,
            linkedin_url: db.linkedin_url,
            status: stored(&db.status)?,
            funding_type: stored(&db.funding_type)?,
            follow_up_date: db.follow_up_date,
            edition: db.edition,
            product_name: db.product_name,
            added_by: db.added_by,
            added_by_name: db.added_by_name,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}

impl From<Deal> for DbDeal {
    fn from(d: Deal) -> Self {
        Self {
            id: d.id,
            name: d.name,
            lead_name: d.lead_name,
            lead_id: d.lead_id,
            value: d.value,
            stage: d.stage.to_string(),
            assigned_rep: d.assigned_rep,
            edition: d.edition,
            start_month: d.start_month,
            end_month: d.end_month,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

impl TryFrom<DbDeal> for Deal {
    type Error = CrmError;

    fn try_from(db: DbDeal) -> Result<Self, Self::Error> {
        Ok(Self {
            id: db.id,
            name: db.name,
            lead_name: db.lead_name,
            lead_id: db.lead_id,
            value: db.value,
            stage: stored(&db.stage)?,
            assigned_rep: db.assigned_rep,
            edition: db.edition,
            start_month: db.start_month,
            end_month: db.end_month,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}

impl From<SalesRep> for DbSalesRep {
    fn from(r: SalesRep) -> Self {
        Self {
            id: r.id,
            name: r.name,
            leads_contacted: r.leads_contacted,
            meetings_booked: r.meetings_booked,
            deals_closed: r.deals_closed,
            total_revenue: r.total_revenue,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl From<DbSalesRep> for SalesRep {
    fn from(db: DbSalesRep) -> Self {
        Self {
            id: db.id,
            name: db.name,
            leads_contacted: db.leads_contacted,
            meetings_booked: db.meetings_booked,
            deals_closed: db.deals_closed,
            total_revenue: db.total_revenue,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<TeamMember> for DbTeamMember {
    fn from(m: TeamMember) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            role: m.role.to_string(),
            permissions: serde_json::to_value(m.permissions).unwrap_or_default(),
            status: m.status.to_string(),
            last_login: m.last_login,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl TryFrom<DbTeamMember> for TeamMember {
    type Error = CrmError;

    fn try_from(db: DbTeamMember) -> Result<Self, Self::Error> {
        let permissions: Permissions = serde_json::from_value(db.permissions).unwrap_or_default();
        Ok(Self {
            id: db.id,
            name: db.name,
            email: db.email,
            role: stored(&db.role)?,
            permissions,
            status: stored(&db.status)?,
            last_login: db.last_login,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}

impl From<Contact> for DbContact {
    fn from(c: Contact) -> Self {
        Self {
            id: c.id,
            name: c.name,
            email: c.email,
            company: c.company,
            status: c.status,
            assigned_rep: c.assigned_rep,
            notes: c.notes,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

impl From<DbContact> for Contact {
    fn from(db: DbContact) -> Self {
        Self {
            id: db.id,
            name: db.name,
            email: db.email,
            company: db.company,
            status: db.status,
            assigned_rep: db.assigned_rep,
            notes: db.notes,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// PostgreSQL store over an r2d2 pool. Each call runs on the blocking pool.
pub struct PgCrmStore {
    pool: DbPool,
}

impl PgCrmStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T, CrmError>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> Result<T, CrmError> + Send + 'static,
    {
        let pool = self.pool.clone();
        let result = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await?;
        if let Err(ref e) = result {
            log::debug!("store {op} failed: {e}");
        }
        result
    }
}

fn year_bounds(year: i32) -> Result<(DateTime<Utc>, DateTime<Utc>), CrmError> {
    let start = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single();
    let end = year
        .checked_add(1)
        .and_then(|next| Utc.with_ymd_and_hms(next, 1, 1, 0, 0, 0).single());
    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(CrmError::Validation(format!("invalid year {year}"))),
    }
}

#[async_trait]
impl CrmStore for PgCrmStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn insert_lead(&self, lead: Lead) -> Result<Lead, CrmError> {
        self.run("insert_lead", move |conn| {
            let row: DbLead = diesel::insert_into(leads::table)
                .values(DbLead::from(lead))
                .get_result(conn)?;
            Lead::try_from(row)
        })
        .await
    }

    async fn get_lead(&self, id: Uuid) -> Result<Lead, CrmError> {
        self.run("get_lead", move |conn| {
            let row: Option<DbLead> = leads::table.find(id).first(conn).optional()?;
            row.ok_or_else(|| CrmError::not_found("lead", id))
                .and_then(Lead::try_from)
        })
        .await
    }

    async fn list_leads(&self) -> Result<Vec<Lead>, CrmError> {
        self.run("list_leads", |conn| {
            let rows: Vec<DbLead> = leads::table
                .order((leads::created_at.desc(), leads::id))
                .load(conn)?;
            rows.into_iter().map(Lead::try_from).collect()
        })
        .await
    }

    async fn patch_lead(
        &self,
        id: Uuid,
        patch: &LeadPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<Lead, CrmError> {
        let changes = DbLeadChanges::new(patch, updated_at);
        self.run("patch_lead", move |conn| {
            let row: Option<DbLead> = diesel::update(leads::table.find(id))
                .set(changes)
                .get_result(conn)
                .optional()?;
            row.ok_or_else(|| CrmError::not_found("lead", id))
                .and_then(Lead::try_from)
        })
        .await
    }

    async fn delete_lead(&self, id: Uuid) -> Result<(), CrmError> {
        self.run("delete_lead", move |conn| {
            let deleted = diesel::delete(leads::table.find(id)).execute(conn)?;
            if deleted == 0 {
                return Err(CrmError::not_found("lead", id));
            }
            Ok(())
        })
        .await
    }

    async fn insert_deal(&self, deal: Deal) -> Result<Deal, CrmError> {
        self.run("insert_deal", move |conn| {
            let row: DbDeal = diesel::insert_into(deals::table)
                .values(DbDeal::from(deal))
                .get_result(conn)?;
            Deal::try_from(row)
        })
        .await
    }

    async fn get_deal(&self, id: Uuid) -> Result<Deal, CrmError> {
        self.run("get_deal", move |conn| {
            let row: Option<DbDeal> = deals::table.find(id).first(conn).optional()?;
            row.ok_or_else(|| CrmError::not_found("deal", id))
                .and_then(Deal::try_from)
        })
        .await
    }

    async fn list_deals(&self, year: Option<i32>) -> Result<Vec<Deal>, CrmError> {
        self.run("list_deals", move |conn| {
            let mut query = deals::table.into_boxed();
            if let Some(year) = year {
                let (start, end) = year_bounds(year)?;
                query = query.filter(deals::created_at.ge(start).and(deals::created_at.lt(end)));
            }
            let rows: Vec<DbDeal> = query
                .order((deals::created_at.desc(), deals::id))
                .load(conn)?;
            rows.into_iter().map(Deal::try_from).collect()
        })
        .await
    }

    async fn upsert_lead_deal(
        &self,
        fresh: Deal,
        stage: DealStage,
    ) -> Result<Upserted<Deal>, CrmError> {
        let Some(lead_id) = fresh.lead_id else {
            return Err(CrmError::Validation("deal is not linked to a lead".into()));
        };
        self.run("upsert_lead_deal", move |conn| {
            conn.transaction::<_, CrmError, _>(|conn| {
                // Held until commit; concurrent syncs for this lead queue here.
                diesel::sql_query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
                    .bind::<diesel::sql_types::Text, _>(lead_id.to_string())
                    .execute(conn)?;

                let existing: Option<DbDeal> = deals::table
                    .filter(deals::lead_id.eq(lead_id))
                    .order((deals::created_at.asc(), deals::id))
                    .first(conn)
                    .optional()?;

                match existing {
                    Some(row) => {
                        let row: DbDeal = diesel::update(deals::table.find(row.id))
                            .set((
                                deals::stage.eq(stage.as_str()),
                                deals::updated_at.eq(fresh.updated_at),
                            ))
                            .get_result(conn)?;
                        Deal::try_from(row).map(Upserted::Updated)
                    }
                    None => {
                        let row: DbDeal = diesel::insert_into(deals::table)
                            .values(DbDeal::from(fresh))
                            .get_result(conn)?;
                        Deal::try_from(row).map(Upserted::Created)
                    }
                }
            })
        })
        .await
    }

    async fn update_deal(&self, deal: Deal) -> Result<Deal, CrmError> {
        self.run("update_deal", move |conn| {
            let id = deal.id;
            let row: Option<DbDeal> = diesel::update(deals::table.find(id))
                .set(DbDeal::from(deal))
                .get_result(conn)
                .optional()?;
            row.ok_or_else(|| CrmError::not_found("deal", id))
                .and_then(Deal::try_from)
        })
        .await
    }

    async fn delete_deal(&self, id: Uuid) -> Result<(), CrmError> {
        self.run("delete_deal", move |conn| {
            let deleted = diesel::delete(deals::table.find(id)).execute(conn)?;
            if deleted == 0 {
                return Err(CrmError::not_found("deal", id));
            }
            Ok(())
        })
        .await
    }

    async fn insert_sales_rep(&self, rep: SalesRep) -> Result<SalesRep, CrmError> {
        self.run("insert_sales_rep", move |conn| {
            let row: DbSalesRep = diesel::insert_into(sales_reps::table)
                .values(DbSalesRep::from(rep))
                .get_result(conn)?;
            Ok(row.into())
        })
        .await
    }

    async fn get_sales_rep(&self, id: Uuid) -> Result<SalesRep, CrmError> {
        self.run("get_sales_rep", move |conn| {
            let row: Option<DbSalesRep> = sales_reps::table.find(id).first(conn).optional()?;
            row.map(SalesRep::from)
                .ok_or_else(|| CrmError::not_found("sales rep", id))
        })
        .await
    }

    async fn list_sales_reps(&self) -> Result<Vec<SalesRep>, CrmError> {
        self.run("list_sales_reps", |conn| {
            let rows: Vec<DbSalesRep> = sales_reps::table
                .order((sales_reps::name.asc(), sales_reps::created_at.asc()))
                .load(conn)?;
            Ok(rows.into_iter().map(SalesRep::from).collect())
        })
        .await
    }

    async fn update_sales_rep(&self, rep: SalesRep) -> Result<SalesRep, CrmError> {
        self.run("update_sales_rep", move |conn| {
            let id = rep.id;
            let row: Option<DbSalesRep> = diesel::update(sales_reps::table.find(id))
                .set(DbSalesRep::from(rep))
                .get_result(conn)
                .optional()?;
            row.map(SalesRep::from)
                .ok_or_else(|| CrmError::not_found("sales rep", id))
        })
        .await
    }

    async fn delete_sales_rep(&self, id: Uuid) -> Result<(), CrmError> {
        self.run("delete_sales_rep", move |conn| {
            let deleted = diesel::delete(sales_reps::table.find(id)).execute(conn)?;
            if deleted == 0 {
                return Err(CrmError::not_found("sales rep", id));
            }
            Ok(())
        })
        .await
    }

    async fn insert_team_member(&self, member: TeamMember) -> Result<TeamMember, CrmError> {
        self.run("insert_team_member", move |conn| {
            let row: DbTeamMember = diesel::insert_into(team_members::table)
                .values(DbTeamMember::from(member))
                .get_result(conn)?;
            TeamMember::try_from(row)
        })
        .await
    }

    async fn get_team_member(&self, id: Uuid) -> Result<TeamMember, CrmError> {
        self.run("get_team_member", move |conn| {
            let row: Option<DbTeamMember> =
                team_members::table.find(id).first(conn).optional()?;
            row.ok_or_else(|| CrmError::not_found("team member", id))
                .and_then(TeamMember::try_from)
        })
        .await
    }

    async fn list_team_members(&self) -> Result<Vec<TeamMember>, CrmError> {
        self.run("list_team_members", |conn| {
            let rows: Vec<DbTeamMember> = team_members::table
                .order((team_members::name.asc(), team_members::created_at.asc()))
                .load(conn)?;
            rows.into_iter().map(TeamMember::try_from).collect()
        })
        .await
    }

    async fn update_team_member(&self, member: TeamMember) -> Result<TeamMember, CrmError> {
        self.run("update_team_member", move |conn| {
            let id = member.id;
            let row: Option<DbTeamMember> = diesel::update(team_members::table.find(id))
                .set(DbTeamMember::from(member))
                .get_result(conn)
                .optional()?;
            row.ok_or_else(|| CrmError::not_found("team member", id))
                .and_then(TeamMember::try_from)
        })
        .await
    }

    async fn delete_team_member(&self, id: Uuid) -> Result<(), CrmError> {
        self.run("delete_team_member", move |conn| {
            let deleted = diesel::delete(team_members::table.find(id)).execute(conn)?;
            if deleted == 0 {
                return Err(CrmError::not_found("team member", id));
            }
            Ok(())
        })
        .await
    }

    async fn insert_contact(&self, contact: Contact) -> Result<Contact, CrmError> {
        self.run("insert_contact", move |conn| {
            let row: DbContact = diesel::insert_into(contacts::table)
                .values(DbContact::from(contact))
                .get_result(conn)?;
            Ok(row.into())
        })
        .await
    }

    async fn get_contact(&self, id: Uuid) -> Result<Contact, CrmError> {
        self.run("get_contact", move |conn| {
            let row: Option<DbContact> = contacts::table.find(id).first(conn).optional()?;
            row.map(Contact::from)
                .ok_or_else(|| CrmError::not_found("contact", id))
        })
        .await
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>, CrmError> {
        self.run("list_contacts", |conn| {
            let rows: Vec<DbContact> = contacts::table
                .order((contacts::created_at.desc(), contacts::id))
                .load(conn)?;
            Ok(rows.into_iter().map(Contact::from).collect())
        })
        .await
    }

    async fn update_contact(&self, contact: Contact) -> Result<Contact, CrmError> {
        self.run("update_contact", move |conn| {
            let id = contact.id;
            let row: Option<DbContact> = diesel::update(contacts::table.find(id))
                .set(DbContact::from(contact))
                .get_result(conn)
                .optional()?;
            row.map(Contact::from)
                .ok_or_else(|| CrmError::not_found("contact", id))
        })
        .await
    }

    async fn delete_contact(&self, id: Uuid) -> Result<(), CrmError> {
        self.run("delete_contact", move |conn| {
            let deleted = diesel::delete(contacts::table.find(id)).execute(conn)?;
            if deleted == 0 {
                return Err(CrmError::not_found("contact", id));
            }
            Ok(())
        })
        .await
    }
}
