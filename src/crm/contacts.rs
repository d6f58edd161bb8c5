use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::error::CrmError;
use super::store::CrmStore;
use super::types::{Contact, ContactPatch, NewContact};

pub const DEFAULT_CONTACT_STATUS: &str = "New";

#[derive(Clone)]
pub struct ContactService {
    store: Arc<dyn CrmStore>,
}

impl ContactService {
    pub fn new(store: Arc<dyn CrmStore>) -> Self {
        Self { store }
    }

    pub async fn create_contact(&self, new: NewContact) -> Result<Contact, CrmError> {
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(CrmError::Validation("Contact name is required".into()));
        }
        let now = Utc::now();
        let contact = Contact {
            id: Uuid::new_v4(),
            name,
            email: new.email.unwrap_or_default(),
            company: new.company.unwrap_or_default(),
            status: new
                .status
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CONTACT_STATUS.to_string()),
            assigned_rep: new.assigned_rep.unwrap_or_default(),
            notes: new.notes.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };
        self.store.insert_contact(contact).await.map_err(|e| {
            log::error!("create_contact failed: {}", e);
            e
        })
    }

    pub async fn get_contact(&self, id: Uuid) -> Result<Contact, CrmError> {
        self.store.get_contact(id).await.map_err(|e| {
            log::error!("get_contact {} failed: {}", id, e);
            e
        })
    }

    pub async fn list_contacts(&self) -> Result<Vec<Contact>, CrmError> {
        self.store.list_contacts().await.map_err(|e| {
            log::error!("list_contacts failed: {}", e);
            e
        })
    }

    pub async fn update_contact(&self, id: Uuid, patch: ContactPatch) -> Result<Contact, CrmError> {
        let mut contact = self.get_contact(id).await?;
        patch.apply(&mut contact);
        contact.updated_at = Utc::now();
        self.store.update_contact(contact).await.map_err(|e| {
            log::error!("update_contact {} failed: {}", id, e);
            e
        })
    }

    pub async fn delete_contact(&self, id: Uuid) -> Result<(), CrmError> {
        self.store.delete_contact(id).await.map_err(|e| {
            log::error!("delete_contact {} failed: {}", id, e);
            e
        })
    }
}
