//! UUID v7 utilities for time-ordered identifiers.
//!
//! Contact ids embed a UUIDv7 so that ids minted later sort after ids minted
//! earlier and never repeat within a process.

use uuid::Uuid;

use crate::defaults::CONTACT_ID_PREFIX;

/// Generate a new UUIDv7 identifier.
#[inline]
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}

/// Mint a fresh contact id: `contact-<uuidv7>`.
///
/// # Example
///
/// ```
/// use crm_core::uuid_utils::new_contact_id;
///
/// let id = new_contact_id();
/// assert!(id.starts_with("contact-"));
/// ```
pub fn new_contact_id() -> String {
    format!("{}-{}", CONTACT_ID_PREFIX, new_v7().simple())
}

/// Mint a contact id under a fixed label: `contact-<label>-<uuidv7>`.
pub fn labeled_contact_id(label: &str) -> String {
    format!("{}-{}-{}", CONTACT_ID_PREFIX, label, new_v7().simple())
}

/// Check if a UUID is version 7.
#[inline]
pub fn is_v7(uuid: &Uuid) -> bool {
    uuid.get_version_num() == 7
}
