//! Create and update paths for contacts.
//!
//! The two paths are intentionally asymmetric:
//! - `create` builds the record locally and never talks to the remote store.
//!   There is nothing to roll back because nothing was sent.
//! - `update` goes to the remote store and returns its row. The local
//!   directory is not reconciled; callers refetch when they need that.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error};

use crm_core::defaults::NEW_CONTACT_LEAD_SCORE;
use crm_core::{
    new_contact_id, non_empty, ContactPatch, ContactRecord, ContactStore, CreateContactRequest,
    DirectoryEvent, Error, EventBus, LeadStatus, OrganizationId, Result,
};

/// Forwards mutations to the remote store, or builds them locally.
pub struct MutationGateway {
    store: Arc<dyn ContactStore>,
    events: EventBus,
}

impl MutationGateway {
    pub fn new(store: Arc<dyn ContactStore>, events: EventBus) -> Self {
        Self { store, events }
    }

    /// Build a new contact owned by `tenant`.
    ///
    /// Fails with [`Error::NoActiveTenant`] when no organization is
    /// selected. Optional fields left empty are stored as absent.
    pub fn create(
        &self,
        tenant: Option<&OrganizationId>,
        input: CreateContactRequest,
    ) -> Result<ContactRecord> {
        let organization_id = tenant.ok_or(Error::NoActiveTenant)?;
        if input.first_name.trim().is_empty() {
            return Err(Error::InvalidInput("first_name is required".to_string()));
        }

        let now = Utc::now();
        let record = ContactRecord {
            id: new_contact_id(),
            organization_id: organization_id.clone(),
            first_name: input.first_name,
            last_name: non_empty(input.last_name),
            email: non_empty(input.email),
            phone: non_empty(input.phone),
            title: non_empty(input.title),
            company_id: None,
            company_name: non_empty(input.company_name),
            date_of_birth: non_empty(input.date_of_birth),
            notes: non_empty(input.notes),
            lead_status: LeadStatus::New,
            lead_score: NEW_CONTACT_LEAD_SCORE,
            tags: None,
            created_at: now,
            updated_at: now,
        };

        debug!(
            subsystem = "contacts",
            component = "gateway",
            op = "create",
            organization_id = %organization_id,
            contact_id = %record.id,
            "Contact created locally"
        );
        Ok(record)
    }

    /// Send `patch` for contact `id` to the remote store and return the
    /// updated row.
    ///
    /// Store errors are logged once here and returned unchanged.
    pub async fn update(&self, id: &str, patch: &ContactPatch) -> Result<ContactRecord> {
        if patch.is_empty() {
            return Err(Error::InvalidInput(format!(
                "update for contact {id} has no fields"
            )));
        }

        let fields: Vec<&str> = patch.assignments().into_iter().map(|(c, _)| c).collect();
        debug!(
            subsystem = "contacts",
            component = "gateway",
            op = "update",
            contact_id = %id,
            ?fields,
            "Sending contact update"
        );

        match self.store.update_contact(id, patch).await {
            Ok(row) => {
                self.events.emit(DirectoryEvent::ContactUpdated {
                    contact_id: row.id.clone(),
                });
                Ok(row)
            }
            Err(e) => {
                error!(
                    subsystem = "contacts",
                    component = "gateway",
                    op = "update",
                    contact_id = %id,
                    error = %e,
                    "Error updating contact"
                );
                Err(e)
            }
        }
    }
}
