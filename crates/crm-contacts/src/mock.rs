//! In-memory remote store for deterministic testing.
//!
//! Implements both [`ContactStore`] and [`ContactSource`] over a shared row
//! list, records every call, and can be told to fail.
//!
//! ## Usage
//!
//! ```rust
//! use crm_contacts::mock::MockContactStore;
//!
//! let store = MockContactStore::new().with_update_failure("network down");
//! assert_eq!(store.update_call_count(), 0);
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crm_core::{
    ContactPatch, ContactRecord, ContactSource, ContactStore, Error, OrganizationId, Result,
};

/// Mock remote store.
#[derive(Clone, Default)]
pub struct MockContactStore {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    rows: Vec<ContactRecord>,
    update_failure: Option<String>,
    load_failure: Option<String>,
    latency: Duration,
    calls: Vec<MockCall>,
}

/// One recorded call against the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub operation: &'static str,
    /// Contact id for updates, organization id for fetches.
    pub target: String,
}

impl MockContactStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail every update with [`Error::RemoteUpdate`].
    pub fn with_update_failure(self, message: impl Into<String>) -> Self {
        self.lock().update_failure = Some(message.into());
        self
    }

    /// Fail every fetch with [`Error::LoadFailure`].
    pub fn with_load_failure(self, message: impl Into<String>) -> Self {
        self.lock().load_failure = Some(message.into());
        self
    }

    /// Simulated latency for all operations.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.lock().latency = latency;
        self
    }

    /// Seed rows returned by fetches and targeted by updates.
    pub fn with_rows(self, rows: Vec<ContactRecord>) -> Self {
        self.lock().rows.extend(rows);
        self
    }

    pub fn insert_row(&self, row: ContactRecord) {
        self.lock().rows.push(row);
    }

    pub fn clear_update_failure(&self) {
        self.lock().update_failure = None;
    }

    pub fn clear_load_failure(&self) {
        self.lock().load_failure = None;
    }

    /// Current rows, in insertion order.
    pub fn rows(&self) -> Vec<ContactRecord> {
        self.lock().rows.clone()
    }

    /// All logged calls, oldest first.
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    pub fn update_call_count(&self) -> usize {
        self.count("update")
    }

    pub fn fetch_call_count(&self) -> usize {
        self.count("fetch")
    }

    fn count(&self, operation: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    /// Log the call and return the configured latency.
    fn record(&self, operation: &'static str, target: &str) -> Duration {
        let mut state = self.lock();
        state.calls.push(MockCall {
            operation,
            target: target.to_string(),
        });
        state.latency
    }
}

#[async_trait]
impl ContactStore for MockContactStore {
    async fn update_contact(&self, id: &str, patch: &ContactPatch) -> Result<ContactRecord> {
        let latency = self.record("update", id);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.lock();
        if let Some(message) = &state.update_failure {
            return Err(Error::RemoteUpdate(message.clone()));
        }
        let row = state
            .rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::NotFound(format!("contact {id}")))?;
        patch.apply_to(row);
        row.updated_at = Utc::now();
        Ok(row.clone())
    }
}

#[async_trait]
impl ContactSource for MockContactStore {
    async fn fetch_contacts(&self, organization_id: &OrganizationId) -> Result<Vec<ContactRecord>> {
        let latency = self.record("fetch", organization_id.as_str());
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let state = self.lock();
        if let Some(message) = &state.load_failure {
            return Err(Error::LoadFailure(message.clone()));
        }
        Ok(state
            .rows
            .iter()
            .filter(|r| r.belongs_to(organization_id))
            .cloned()
            .collect())
    }
}
