//! # crm-core
//!
//! Core types, traits, and abstractions for the CRM contact directory.
//!
//! This crate provides the contact data model, the tenant context, the
//! error taxonomy, and the trait seams to the remote store that the other
//! crates depend on.

pub mod defaults;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod tenant;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use events::{DirectoryEvent, EventBus, EventEnvelope};
pub use models::*;
pub use tenant::{Organization, OrganizationId, TenantContext, TenantSubscription};
pub use traits::*;
pub use uuid_utils::{is_v7, labeled_contact_id, new_contact_id, new_v7};
