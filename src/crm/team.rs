use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::error::CrmError;
use super::store::CrmStore;
use super::types::{InviteMember, MemberStatus, TeamMember, TeamMemberPatch};

#[derive(Clone)]
pub struct TeamService {
    store: Arc<dyn CrmStore>,
}

impl TeamService {
    pub fn new(store: Arc<dyn CrmStore>) -> Self {
        Self { store }
    }

    /// New members start out pending until activated.
    pub async fn invite(&self, invite: InviteMember) -> Result<TeamMember, CrmError> {
        let name = invite.name.trim().to_string();
        if name.is_empty() {
            return Err(CrmError::Validation("Member name is required".into()));
        }
        let email = invite.email.trim().to_lowercase();
        if email.is_empty() {
            return Err(CrmError::Validation("Member email is required".into()));
        }

        let now = Utc::now();
        let member = TeamMember {
            id: Uuid::new_v4(),
            name,
            email,
            role: invite.role.unwrap_or_default(),
            permissions: invite.permissions.unwrap_or_default(),
            status: MemberStatus::Pending,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        let member = self.store.insert_team_member(member).await.map_err(|e| {
            log::error!("invite_member failed: {}", e);
            e
        })?;
        log::info!("Invited {} as {}", member.email, member.role);
        Ok(member)
    }

    pub async fn get_member(&self, id: Uuid) -> Result<TeamMember, CrmError> {
        self.store.get_team_member(id).await.map_err(|e| {
            log::error!("get_team_member {} failed: {}", id, e);
            e
        })
    }

    pub async fn list_members(&self) -> Result<Vec<TeamMember>, CrmError> {
        self.store.list_team_members().await.map_err(|e| {
            log::error!("list_team_members failed: {}", e);
            e
        })
    }

    pub async fn update_member(&self, id: Uuid, patch: TeamMemberPatch) -> Result<TeamMember, CrmError> {
        let mut member = self.get_member(id).await?;
        patch.apply(&mut member);
        if member.name.is_empty() {
            return Err(CrmError::Validation("Member name is required".into()));
        }
        if member.email.is_empty() {
            return Err(CrmError::Validation("Member email is required".into()));
        }
        member.updated_at = Utc::now();
        self.store.update_team_member(member).await.map_err(|e| {
            log::error!("update_team_member {} failed: {}", id, e);
            e
        })
    }

    pub async fn remove_member(&self, id: Uuid) -> Result<(), CrmError> {
        self.store.delete_team_member(id).await.map_err(|e| {
            log::error!("remove_team_member {} failed: {}", id, e);
            e
        })
    }

    pub async fn activate(&self, id: Uuid) -> Result<TeamMember, CrmError> {
        self.set_status(id, MemberStatus::Active).await
    }

    pub async fn deactivate(&self, id: Uuid) -> Result<TeamMember, CrmError> {
        self.set_status(id, MemberStatus::Inactive).await
    }

    async fn set_status(&self, id: Uuid, status: MemberStatus) -> Result<TeamMember, CrmError> {
        let patch = TeamMemberPatch {
            status: Some(status),
            ..TeamMemberPatch::default()
        };
        self.update_member(id, patch).await
    }
}
