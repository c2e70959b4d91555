//! Tenant identity and the active-organization context.
//!
//! Every contact is owned by exactly one organization. The organization the
//! user is currently working in is published through a [`TenantContext`];
//! consumers hold a [`TenantSubscription`] and react to changes of the
//! organization **id** only.
//!
//! # Example
//!
//! ```rust
//! use crm_core::tenant::{Organization, TenantContext};
//!
//! let ctx = TenantContext::new();
//! let sub = ctx.subscribe();
//! assert!(sub.current_id().is_none());
//!
//! ctx.select(Organization::new("acme"));
//! assert_eq!(sub.current_id().unwrap().as_str(), "acme");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Identifier of an organization (tenant).
///
/// Opaque: any string is accepted, including the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationId(String);

impl OrganizationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrganizationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for OrganizationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The organization value supplied by the organization-selection provider.
///
/// Only `id` is observed by the directory; `name` is carried for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Organization {
    pub fn new(id: impl Into<OrganizationId>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Publisher side of the active organization.
///
/// Cloning shares the same underlying channel. Subscribers see the channel
/// close once every clone has been dropped.
#[derive(Debug, Clone)]
pub struct TenantContext {
    tx: Arc<watch::Sender<Option<Organization>>>,
}

impl Default for TenantContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TenantContext {
    /// Context with no organization selected.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Context with `organization` already selected.
    pub fn with_organization(organization: Organization) -> Self {
        let (tx, _) = watch::channel(Some(organization));
        Self { tx: Arc::new(tx) }
    }

    /// Make `organization` the active tenant.
    pub fn select(&self, organization: Organization) {
        tracing::debug!(
            organization_id = %organization.id,
            subscriber_count = self.tx.receiver_count(),
            "Active organization selected"
        );
        self.tx.send_replace(Some(organization));
    }

    /// Deselect the active tenant.
    pub fn clear(&self) {
        tracing::debug!("Active organization cleared");
        self.tx.send_replace(None);
    }

    pub fn current(&self) -> Option<Organization> {
        self.tx.borrow().clone()
    }

    pub fn current_id(&self) -> Option<OrganizationId> {
        self.tx.borrow().as_ref().map(|o| o.id.clone())
    }

    pub fn subscribe(&self) -> TenantSubscription {
        let mut rx = self.tx.subscribe();
        let last = rx.borrow_and_update().as_ref().map(|o| o.id.clone());
        TenantSubscription { rx, last }
    }
}

/// Receiver side of a [`TenantContext`].
#[derive(Debug, Clone)]
pub struct TenantSubscription {
    rx: watch::Receiver<Option<Organization>>,
    last: Option<OrganizationId>,
}

impl TenantSubscription {
    pub fn current(&self) -> Option<Organization> {
        self.rx.borrow().clone()
    }

    pub fn current_id(&self) -> Option<OrganizationId> {
        self.rx.borrow().as_ref().map(|o| o.id.clone())
    }

    /// Read the current id and mark it as seen, so [`changed`](Self::changed)
    /// only reports ids that differ from it.
    pub fn observe(&mut self) -> Option<OrganizationId> {
        let id = self.rx.borrow_and_update().as_ref().map(|o| o.id.clone());
        self.last = id.clone();
        id
    }

    /// Wait for the organization id to change.
    ///
    /// Updates that keep the same id (e.g. a renamed organization) are
    /// skipped. Returns `None` once the context has been dropped.
    pub async fn changed(&mut self) -> Option<Option<OrganizationId>> {
        loop {
            if self.rx.changed().await.is_err() {
                return None;
            }
            let id = self.rx.borrow_and_update().as_ref().map(|o| o.id.clone());
            if id != self.last {
                self.last = id.clone();
                return Some(id);
            }
        }
    }
}
