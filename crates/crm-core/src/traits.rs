//! Core traits for the contact directory's collaborators.
//!
//! These traits define the seams to the remote store, enabling pluggable
//! backends (fixtures, PostgreSQL, test mocks).

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ContactPatch, ContactRecord};
use crate::tenant::OrganizationId;

/// Remote store holding the authoritative `contacts` rows.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Update exactly one contact matched by primary key and return the
    /// updated row.
    async fn update_contact(&self, id: &str, patch: &ContactPatch) -> Result<ContactRecord>;
}

/// Source of an organization's contact set, consulted on every load.
#[async_trait]
pub trait ContactSource: Send + Sync {
    /// Fetch every contact owned by `organization_id`.
    async fn fetch_contacts(&self, organization_id: &OrganizationId) -> Result<Vec<ContactRecord>>;
}
