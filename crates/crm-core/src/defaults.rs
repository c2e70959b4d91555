//! Centralized default constants for the contact directory.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates should reference these constants instead of defining their own
//! magic numbers.

// =============================================================================
// LOADING
// =============================================================================

/// Artificial latency of the fixture-backed load source, in milliseconds.
pub const FIXTURE_LOAD_DELAY_MS: u64 = 500;

// =============================================================================
// EVENTS
// =============================================================================

/// Broadcast buffer for directory change events.
pub const EVENT_BUS_CAPACITY: usize = 256;

// =============================================================================
// CONTACTS
// =============================================================================

/// Prefix of every contact id.
pub const CONTACT_ID_PREFIX: &str = "contact";

/// Lead score of a newly created contact.
pub const NEW_CONTACT_LEAD_SCORE: u8 = 0;

// =============================================================================
// DATABASE
// =============================================================================

/// Pool size for the Postgres contacts store.
pub const DB_MAX_CONNECTIONS: u32 = 4;

/// Seconds to wait for a free connection before a query fails.
pub const DB_ACQUIRE_TIMEOUT_SECS: u64 = 5;

// =============================================================================
// CURATED ORGANIZATIONS
// =============================================================================

/// Demo tenant with two curated contacts.
pub const GAS_COMPANY_ORG_ID: &str = "gas-company-id";

/// Demo tenant with one curated contact.
pub const TEST_COMPANY_ORG_ID: &str = "test-company-id";
