//! # crm-db
//!
//! PostgreSQL layer for the CRM contact directory.
//!
//! This crate provides:
//! - Connection pool management
//! - The `contacts` table schema
//! - [`PgContactRepository`], usable both as the remote store for updates
//!   and as a real load source in place of the fixture generator
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use crm_db::{connect_store, PoolConfig};
//!
//! let repo = Arc::new(connect_store("postgres://localhost/crm", &PoolConfig::from_env()).await?);
//! let hook = crm_contacts::ContactsHook::new(&tenants, repo.clone(), repo, &config);
//! ```

pub mod contacts;
pub mod pool;
pub mod schema;

// Test fixtures for integration tests
pub mod test_fixtures;

pub use contacts::{build_update, PgContactRepository};
pub use pool::{connect_store, create_pool, PoolConfig};
pub use schema::{ensure_schema, CONTACTS_DDL, CONTACT_COLUMNS};

// Re-export core types
pub use crm_core::*;
