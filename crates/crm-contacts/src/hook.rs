//! Public surface consumed by rendering code.
//!
//! [`ContactsHook`] ties the tenant context, the directory and the mutation
//! gateway together:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use crm_contacts::{
//!     ContactsHook, CreateContactRequest, DirectoryConfig, MockContactStore, Organization,
//!     TenantContext,
//! };
//!
//! # async fn demo() -> crm_contacts::Result<()> {
//! let tenants = TenantContext::with_organization(Organization::new("acme"));
//! let hook = ContactsHook::with_fixtures(
//!     &tenants,
//!     Arc::new(MockContactStore::new()),
//!     &DirectoryConfig::default(),
//! );
//! let _listener = hook.attach();
//!
//! let created = hook.create_contact(CreateContactRequest::new("Ada"))?;
//! assert_eq!(hook.contacts()[0].id, created.id);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crm_core::{
    ContactPatch, ContactRecord, ContactSource, ContactStore, CreateContactRequest, EventBus,
    EventEnvelope, OrganizationId, Result, TenantContext, TenantSubscription,
};

use crate::config::DirectoryConfig;
use crate::directory::{ContactDirectory, LoadOutcome};
use crate::fixtures::FixtureSource;
use crate::gateway::MutationGateway;

/// Contacts of the active organization plus create/update/refetch.
pub struct ContactsHook {
    tenant: TenantSubscription,
    directory: ContactDirectory,
    gateway: MutationGateway,
    events: EventBus,
}

impl ContactsHook {
    /// Wire a hook to explicit collaborators.
    pub fn new(
        tenant: &TenantContext,
        source: Arc<dyn ContactSource>,
        store: Arc<dyn ContactStore>,
        config: &DirectoryConfig,
    ) -> Arc<Self> {
        let events = EventBus::new(config.event_capacity);
        Arc::new(Self {
            tenant: tenant.subscribe(),
            directory: ContactDirectory::new(source, events.clone()),
            gateway: MutationGateway::new(store, events.clone()),
            events,
        })
    }

    /// Hook whose loads come from the fixture generator, delayed by
    /// `config.load_delay()`.
    pub fn with_fixtures(
        tenant: &TenantContext,
        store: Arc<dyn ContactStore>,
        config: &DirectoryConfig,
    ) -> Arc<Self> {
        let source = Arc::new(FixtureSource::new(config.load_delay()));
        Self::new(tenant, source, store, config)
    }

    /// Start following the tenant context.
    ///
    /// Loads the current tenant once, then reloads on every change of the
    /// organization id. Tickets are taken by the listener in change order;
    /// each fetch runs as its own task so a switch never waits for the
    /// previous load. The listener stops when the
    /// [`TenantContext`] is dropped or the handle is aborted.
    pub fn attach(self: &Arc<Self>) -> JoinHandle<()> {
        let hook = Arc::clone(self);
        let mut subscription = self.tenant.clone();
        tokio::spawn(async move {
            let initial = subscription.observe();
            hook.spawn_load(initial);
            while let Some(organization_id) = subscription.changed().await {
                debug!(
                    subsystem = "contacts",
                    component = "hook",
                    organization_id = ?organization_id,
                    "Active organization changed"
                );
                hook.spawn_load(organization_id);
            }
            debug!(
                subsystem = "contacts",
                component = "hook",
                "Tenant context closed, listener stopped"
            );
        })
    }

    /// Take the load ticket here, in change order, and fetch in a task.
    fn spawn_load(self: &Arc<Self>, organization_id: Option<OrganizationId>) {
        let pending = match self.directory.begin_load(organization_id.as_ref()) {
            Ok(pending) => pending,
            Err(e) => {
                warn!(
                    subsystem = "contacts",
                    component = "hook",
                    error = %e,
                    "Could not start contact load"
                );
                return;
            }
        };
        if pending.organization_id().is_none() {
            return;
        }

        let hook = Arc::clone(self);
        tokio::spawn(async move {
            // Failures are already recorded in the directory's error flag.
            if let Err(e) = hook.directory.finish_load(pending).await {
                warn!(
                    subsystem = "contacts",
                    component = "hook",
                    error = %e,
                    "Background contact load failed"
                );
            }
        });
    }

    /// Snapshot of the active tenant's contacts.
    pub fn contacts(&self) -> Vec<ContactRecord> {
        self.directory.records()
    }

    pub fn loading(&self) -> bool {
        self.directory.is_loading()
    }

    /// Message of the last failed load, if the latest load failed.
    pub fn error(&self) -> Option<String> {
        self.directory.error()
    }

    pub fn directory(&self) -> &ContactDirectory {
        &self.directory
    }

    /// Create a contact for the active organization and show it first.
    ///
    /// Never suspends and never contacts the remote store. A later reload
    /// replaces the directory contents and drops this record.
    pub fn create_contact(&self, input: CreateContactRequest) -> Result<ContactRecord> {
        let tenant = self.tenant.current_id();
        let record = self.gateway.create(tenant.as_ref(), input)?;
        self.directory.insert_local(record.clone())?;
        Ok(record)
    }

    /// Update a contact in the remote store and return the updated row.
    ///
    /// The directory is left as-is; call [`refetch`](Self::refetch) to
    /// reflect the change locally.
    pub async fn update_contact(&self, id: &str, patch: ContactPatch) -> Result<ContactRecord> {
        self.gateway.update(id, &patch).await
    }

    /// Reload the active organization's contacts.
    pub async fn refetch(&self) -> Result<LoadOutcome> {
        let tenant = self.tenant.current_id();
        self.directory.load(tenant.as_ref()).await
    }

    /// Subscribe to directory change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.events.subscribe()
    }
}
