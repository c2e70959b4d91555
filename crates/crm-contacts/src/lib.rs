//! # crm-contacts
//!
//! Organization-scoped contact directory for the CRM front-end.
//!
//! This crate provides:
//! - A deterministic fixture generator standing in for the remote fetch
//! - The in-memory contact directory of the active tenant
//! - The mutation gateway (local create, remote update)
//! - [`ContactsHook`], the surface rendering code consumes
//! - An in-memory mock store for tests

pub mod config;
pub mod directory;
pub mod fixtures;
pub mod gateway;
pub mod hook;
pub mod mock;

pub use config::{ConfigError, DirectoryConfig};
pub use directory::{ContactDirectory, LoadOutcome, PendingLoad};
pub use fixtures::{generate, generate_at, organization_digest, FixtureSource, FixtureVariety};
pub use gateway::MutationGateway;
pub use hook::ContactsHook;
pub use mock::MockContactStore;

// Re-export core types
pub use crm_core::*;
