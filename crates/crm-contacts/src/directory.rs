//! In-memory contact directory for the active organization.
//!
//! Holds the records and the loading flag for exactly one tenant at a time.
//! Loads replace the records wholesale; local inserts prepend.
//!
//! Every load takes a ticket. A load whose ticket is no longer the newest
//! when its source returns is discarded, so the last requested tenant always
//! wins regardless of completion order. Loads are never cancelled.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use tracing::{debug, info, warn};

use crm_core::{ContactRecord, ContactSource, DirectoryEvent, Error, EventBus, OrganizationId, Result};

/// How a call to [`ContactDirectory::load`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No tenant was active; records were cleared.
    Cleared,
    /// Records were replaced with this many contacts.
    Loaded(usize),
    /// A newer load was requested meanwhile; this result was dropped.
    Superseded,
}

/// A load holding its ticket, waiting for [`ContactDirectory::finish_load`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a pending load does nothing until finished"]
pub struct PendingLoad {
    ticket: u64,
    organization_id: Option<OrganizationId>,
}

impl PendingLoad {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// `None` when the load cleared the directory and has nothing to fetch.
    pub fn organization_id(&self) -> Option<&OrganizationId> {
        self.organization_id.as_ref()
    }
}

#[derive(Debug)]
struct DirectoryState {
    /// Tenant that owns `records`.
    tenant: Option<OrganizationId>,
    records: Vec<ContactRecord>,
    loading: bool,
    error: Option<String>,
    ticket: u64,
}

/// Contact records of the active tenant plus load state.
pub struct ContactDirectory {
    state: RwLock<DirectoryState>,
    source: Arc<dyn ContactSource>,
    events: EventBus,
}

impl ContactDirectory {
    /// Empty directory. Starts in the loading state until the first load
    /// resolves.
    pub fn new(source: Arc<dyn ContactSource>, events: EventBus) -> Self {
        Self {
            state: RwLock::new(DirectoryState {
                tenant: None,
                records: Vec::new(),
                loading: true,
                error: None,
                ticket: 0,
            }),
            source,
            events,
        }
    }

    // Every write leaves the state whole, so a poisoned lock still holds
    // the last committed snapshot.
    fn read(&self) -> RwLockReadGuard<'_, DirectoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the records, newest local inserts first.
    pub fn records(&self) -> Vec<ContactRecord> {
        self.read().records.clone()
    }

    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_loading(&self) -> bool {
        self.read().loading
    }

    /// Message of the last failed load, cleared by the next successful one.
    pub fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    /// Tenant the current records belong to.
    pub fn tenant(&self) -> Option<OrganizationId> {
        self.read().tenant.clone()
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, DirectoryState>> {
        self.state
            .write()
            .map_err(|_| Error::Internal("contact directory state lock poisoned".to_string()))
    }

    /// Prepend `record`. Never suspends and never contacts the remote store.
    ///
    /// A record for a tenant other than the one currently held evicts the
    /// old tenant's records first and invalidates its pending loads, which
    /// also ends the loading state. Otherwise the loading flag is untouched.
    pub fn insert_local(&self, record: ContactRecord) -> Result<()> {
        let organization_id = record.organization_id.clone();
        let contact_id = record.id.clone();
        {
            let mut state = self.write()?;
            if state.tenant.as_ref() != Some(&organization_id) {
                debug!(
                    subsystem = "contacts",
                    component = "directory",
                    previous = ?state.tenant,
                    organization_id = %organization_id,
                    "Insert for a different tenant, discarding held records"
                );
                // Loads still pending belong to the old tenant.
                state.ticket += 1;
                state.records.clear();
                state.loading = false;
                state.error = None;
                state.tenant = Some(organization_id.clone());
            }
            state.records.insert(0, record);
        }
        debug!(
            subsystem = "contacts",
            component = "directory",
            op = "insert_local",
            organization_id = %organization_id,
            contact_id = %contact_id,
            "Contact inserted locally"
        );
        self.events.emit(DirectoryEvent::ContactInserted {
            organization_id,
            contact_id,
        });
        Ok(())
    }

    /// Load the records of `organization_id`, or clear the directory when no
    /// tenant is active.
    ///
    /// Shorthand for [`begin_load`](Self::begin_load) followed by
    /// [`finish_load`](Self::finish_load).
    pub async fn load(&self, organization_id: Option<&OrganizationId>) -> Result<LoadOutcome> {
        let pending = self.begin_load(organization_id)?;
        self.finish_load(pending).await
    }

    /// Take a ticket for a load of `organization_id` without suspending.
    ///
    /// The ticket order is the order of `begin_load` calls, whatever order
    /// the matching [`finish_load`](Self::finish_load) calls run in. With no
    /// tenant the directory is cleared here and nothing remains to fetch.
    pub fn begin_load(&self, organization_id: Option<&OrganizationId>) -> Result<PendingLoad> {
        let Some(organization_id) = organization_id else {
            let ticket = {
                let mut state = self.write()?;
                state.ticket += 1;
                state.tenant = None;
                state.records.clear();
                state.loading = false;
                state.error = None;
                state.ticket
            };
            debug!(
                subsystem = "contacts",
                component = "directory",
                op = "load",
                load_ticket = ticket,
                "No active organization, directory cleared"
            );
            self.events.emit(DirectoryEvent::Cleared);
            return Ok(PendingLoad {
                ticket,
                organization_id: None,
            });
        };

        let ticket = {
            let mut state = self.write()?;
            state.ticket += 1;
            state.loading = true;
            if state.tenant.as_ref() != Some(organization_id) {
                state.records.clear();
                state.error = None;
                state.tenant = Some(organization_id.clone());
            }
            state.ticket
        };
        debug!(
            subsystem = "contacts",
            component = "directory",
            op = "load",
            organization_id = %organization_id,
            load_ticket = ticket,
            "Loading contacts"
        );
        self.events.emit(DirectoryEvent::LoadStarted {
            organization_id: organization_id.clone(),
        });
        Ok(PendingLoad {
            ticket,
            organization_id: Some(organization_id.clone()),
        })
    }

    /// Fetch and commit a load started by [`begin_load`](Self::begin_load).
    ///
    /// The result is dropped when a newer ticket was issued meanwhile or the
    /// directory moved to another tenant.
    pub async fn finish_load(&self, pending: PendingLoad) -> Result<LoadOutcome> {
        let PendingLoad {
            ticket,
            organization_id,
        } = pending;
        let Some(organization_id) = organization_id else {
            return Ok(LoadOutcome::Cleared);
        };

        let start = Instant::now();
        let fetched = self.source.fetch_contacts(&organization_id).await;

        let mut state = self.write()?;
        if state.ticket != ticket || state.tenant.as_ref() != Some(&organization_id) {
            let latest = state.ticket;
            drop(state);
            debug!(
                subsystem = "contacts",
                component = "directory",
                op = "load",
                organization_id = %organization_id,
                load_ticket = ticket,
                latest_ticket = latest,
                "Load superseded, result discarded"
            );
            self.events.emit(DirectoryEvent::LoadSuperseded { organization_id });
            return Ok(LoadOutcome::Superseded);
        }

        match fetched {
            Ok(records) => {
                let fetched_count = records.len();
                let records: Vec<ContactRecord> = records
                    .into_iter()
                    .filter(|r| r.belongs_to(&organization_id))
                    .collect();
                let count = records.len();
                state.records = records;
                state.loading = false;
                state.error = None;
                drop(state);

                if count != fetched_count {
                    warn!(
                        subsystem = "contacts",
                        component = "directory",
                        organization_id = %organization_id,
                        dropped = fetched_count - count,
                        "Source returned contacts of another organization, dropped"
                    );
                }
                info!(
                    subsystem = "contacts",
                    component = "directory",
                    op = "load",
                    organization_id = %organization_id,
                    record_count = count,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Contacts loaded"
                );
                self.events.emit(DirectoryEvent::Loaded {
                    organization_id,
                    count,
                });
                Ok(LoadOutcome::Loaded(count))
            }
            Err(e) => {
                let message = match e {
                    Error::LoadFailure(msg) => msg,
                    other => other.to_string(),
                };
                state.loading = false;
                state.error = Some(message.clone());
                drop(state);

                warn!(
                    subsystem = "contacts",
                    component = "directory",
                    op = "load",
                    organization_id = %organization_id,
                    error = %message,
                    "Failed to load contacts"
                );
                self.events.emit(DirectoryEvent::LoadFailed {
                    organization_id,
                    error: message.clone(),
                });
                Err(Error::LoadFailure(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::FixtureSource;
    use crate::mock::MockContactStore;
    use std::time::Duration;

    fn org(id: &str) -> OrganizationId {
        OrganizationId::new(id)
    }

    fn directory(delay_ms: u64) -> ContactDirectory {
        ContactDirectory::new(
            Arc::new(FixtureSource::new(Duration::from_millis(delay_ms))),
            EventBus::new(32),
        )
    }

    #[test]
    fn test_new_directory_is_loading_and_empty() {
        let dir = directory(0);
        assert!(dir.is_loading());
        assert!(dir.is_empty());
        assert!(dir.tenant().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_without_tenant_clears_immediately() {
        let dir = directory(500);
        dir.load(Some(&org("gas-company-id"))).await.unwrap();
        assert_eq!(dir.len(), 2);

        let start = tokio::time::Instant::now();
        assert_eq!(dir.load(None).await.unwrap(), LoadOutcome::Cleared);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(dir.is_empty());
        assert!(!dir.is_loading());
        assert!(dir.tenant().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_flag_spans_the_fetch() {
        let dir = Arc::new(directory(500));
        let task = {
            let dir = Arc::clone(&dir);
            tokio::spawn(async move { dir.load(Some(&org("acme"))).await })
        };
        tokio::task::yield_now().await;
        assert!(dir.is_loading());

        assert_eq!(task.await.unwrap().unwrap(), LoadOutcome::Loaded(1));
        assert!(!dir.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_switching_tenant_discards_previous_records_at_load_start() {
        let dir = Arc::new(directory(500));
        dir.load(Some(&org("gas-company-id"))).await.unwrap();

        let task = {
            let dir = Arc::clone(&dir);
            tokio::spawn(async move { dir.load(Some(&org("test-company-id"))).await })
        };
        tokio::task::yield_now().await;
        assert!(dir.is_empty());
        assert_eq!(dir.tenant(), Some(org("test-company-id")));

        task.await.unwrap().unwrap();
        assert!(dir
            .records()
            .iter()
            .all(|r| r.belongs_to(&org("test-company-id"))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_local_prepends_without_touching_loading() {
        let dir = directory(0);
        dir.load(Some(&org("gas-company-id"))).await.unwrap();
        let mut record = dir.records()[1].clone();
        record.id = "contact-new".to_string();

        dir.insert_local(record).unwrap();
        assert_eq!(dir.len(), 3);
        assert_eq!(dir.records()[0].id, "contact-new");
        assert!(!dir.is_loading());
    }

    #[tokio::test]
    async fn test_insert_for_other_tenant_evicts_held_records() {
        let dir = directory(0);
        dir.load(Some(&org("gas-company-id"))).await.unwrap();
        let mut foreign = dir.records()[0].clone();
        foreign.organization_id = org("other");
        foreign.id = "contact-other".to_string();

        dir.insert_local(foreign).unwrap();
        assert_eq!(dir.len(), 1);
        assert_eq!(dir.tenant(), Some(org("other")));
    }

    #[tokio::test]
    async fn test_load_failure_sets_error_flag() {
        let store = MockContactStore::new().with_load_failure("connection refused");
        let dir = ContactDirectory::new(Arc::new(store.clone()), EventBus::new(8));

        let err = dir.load(Some(&org("acme"))).await.unwrap_err();
        assert!(matches!(err, Error::LoadFailure(ref m) if m == "connection refused"));
        assert_eq!(dir.error().as_deref(), Some("connection refused"));
        assert!(!dir.is_loading());

        store.clear_load_failure();
        dir.load(Some(&org("acme"))).await.unwrap();
        assert!(dir.error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_for_new_tenant_discards_pending_load_of_old_tenant() {
        let dir = Arc::new(directory(500));
        dir.load(Some(&org("gas-company-id"))).await.unwrap();
        let mut acme = dir.records()[0].clone();
        acme.organization_id = org("acme");
        acme.id = "contact-acme-local".to_string();

        let pending = {
            let dir = Arc::clone(&dir);
            tokio::spawn(async move { dir.load(Some(&org("gas-company-id"))).await })
        };
        tokio::task::yield_now().await;
        assert!(dir.is_loading());

        dir.insert_local(acme.clone()).unwrap();
        assert!(!dir.is_loading());

        assert_eq!(pending.await.unwrap().unwrap(), LoadOutcome::Superseded);
        assert_eq!(dir.tenant(), Some(org("acme")));
        assert_eq!(dir.records(), vec![acme]);
        assert!(!dir.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_loads_of_same_tenant_commit_once() {
        let dir = Arc::new(directory(500));
        let first = {
            let dir = Arc::clone(&dir);
            tokio::spawn(async move { dir.load(Some(&org("gas-company-id"))).await })
        };
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = {
            let dir = Arc::clone(&dir);
            tokio::spawn(async move { dir.load(Some(&org("gas-company-id"))).await })
        };

        assert_eq!(first.await.unwrap().unwrap(), LoadOutcome::Superseded);
        assert_eq!(second.await.unwrap().unwrap(), LoadOutcome::Loaded(2));

        let records = dir.records();
        assert_eq!(records.len(), 2);
        assert!(records[0].id.starts_with("contact-gas-1-"));
        assert!(records[1].id.starts_with("contact-gas-2-"));
        assert!(!dir.is_loading());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_ticket_order_follows_begin_order_not_completion_order() {
        let dir = Arc::new(ContactDirectory::new(
            Arc::new(FixtureSource::new(Duration::from_millis(5))),
            EventBus::new(32),
        ));

        for _ in 0..50 {
            let older = dir.begin_load(Some(&org("gas-company-id"))).unwrap();
            let newer = dir.begin_load(Some(&org("test-company-id"))).unwrap();
            assert!(newer.ticket() > older.ticket());

            // Spawn the newer load first so it is likely to finish first.
            let newer_task = {
                let dir = Arc::clone(&dir);
                tokio::spawn(async move { dir.finish_load(newer).await })
            };
            let older_task = {
                let dir = Arc::clone(&dir);
                tokio::spawn(async move { dir.finish_load(older).await })
            };

            assert_eq!(older_task.await.unwrap().unwrap(), LoadOutcome::Superseded);
            assert_eq!(newer_task.await.unwrap().unwrap(), LoadOutcome::Loaded(1));
            assert_eq!(dir.tenant(), Some(org("test-company-id")));
            assert!(dir
                .records()
                .iter()
                .all(|r| r.belongs_to(&org("test-company-id"))));

            dir.load(None).await.unwrap();
        }
    }

    #[test]
    fn test_begin_load_without_tenant_has_nothing_to_fetch() {
        let dir = directory(500);
        let pending = dir.begin_load(None).unwrap();
        assert!(pending.organization_id().is_none());
        assert!(!dir.is_loading());
    }

    #[tokio::test]
    async fn test_snapshots_survive_poisoned_lock() {
        let dir = directory(0);
        dir.load(Some(&org("gas-company-id"))).await.unwrap();

        let poisoned = std::thread::scope(|scope| {
            scope
                .spawn(|| {
                    let _guard = dir.state.write().unwrap();
                    panic!("writer panicked while holding the lock");
                })
                .join()
        });
        assert!(poisoned.is_err());
        assert!(dir.state.is_poisoned());

        assert_eq!(dir.len(), 2);
        assert_eq!(dir.tenant(), Some(org("gas-company-id")));
        assert!(!dir.is_loading());
        assert!(matches!(
            dir.insert_local(dir.records()[0].clone()),
            Err(Error::Internal(_))
        ));
    }

    struct LeakySource;

    #[async_trait::async_trait]
    impl ContactSource for LeakySource {
        async fn fetch_contacts(&self, organization_id: &OrganizationId) -> Result<Vec<ContactRecord>> {
            let mut records = crate::fixtures::generate(organization_id);
            records.extend(crate::fixtures::generate(&org("globex")));
            Ok(records)
        }
    }

    #[tokio::test]
    async fn test_foreign_records_from_source_are_dropped() {
        let dir = ContactDirectory::new(Arc::new(LeakySource), EventBus::new(8));
        assert_eq!(
            dir.load(Some(&org("acme"))).await.unwrap(),
            LoadOutcome::Loaded(1)
        );
        assert!(dir.records().iter().all(|r| r.belongs_to(&org("acme"))));
    }

    #[tokio::test]
    async fn test_load_emits_events() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let dir = ContactDirectory::new(Arc::new(FixtureSource::immediate()), bus);

        dir.load(Some(&org("acme"))).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().event_type, "directory.load_started");
        assert_eq!(rx.recv().await.unwrap().event_type, "directory.loaded");
    }
}
