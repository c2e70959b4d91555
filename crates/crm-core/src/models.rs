//! Core data models for the contact directory.
//!
//! These types are shared across all crates and mirror the rows of the
//! `contacts` table (snake_case wire names).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::tenant::OrganizationId;

// =============================================================================
// LEAD STATUS
// =============================================================================

/// Sales pipeline stage of a contact.
///
/// Serialized as its lowercase tag. Tags this crate does not know about are
/// preserved in [`LeadStatus::Other`] so rows written by newer clients survive
/// a round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    Proposal,
    Won,
    Lost,
    Other(String),
}

impl LeadStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Qualified => "qualified",
            Self::Proposal => "proposal",
            Self::Won => "won",
            Self::Lost => "lost",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "new" => Self::New,
            "contacted" => Self::Contacted,
            "qualified" => Self::Qualified,
            "proposal" => Self::Proposal,
            "won" => Self::Won,
            "lost" => Self::Lost,
            other => Self::Other(other.to_string()),
        })
    }
}

impl From<String> for LeadStatus {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(status) => status,
            Err(never) => match never {},
        }
    }
}

impl From<LeadStatus> for String {
    fn from(status: LeadStatus) -> Self {
        status.as_str().to_string()
    }
}

// =============================================================================
// CONTACT TYPES
// =============================================================================

/// Maximum value of [`ContactRecord::lead_score`].
pub const MAX_LEAD_SCORE: u8 = 100;

/// A person tracked by an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub id: String,
    pub organization_id: OrganizationId,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub title: Option<String>,
    pub company_id: Option<String>,
    pub company_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub lead_status: LeadStatus,
    /// 0..=100
    #[serde(default)]
    pub lead_score: u8,
    pub tags: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContactRecord {
    /// Whether this record is owned by `organization_id`.
    pub fn belongs_to(&self, organization_id: &OrganizationId) -> bool {
        &self.organization_id == organization_id
    }

    /// Display name, `first last` when a last name is present.
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }

    /// Whether the record carries `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags
            .as_ref()
            .is_some_and(|tags| tags.iter().any(|t| t == tag))
    }
}

/// Input for creating a new contact.
///
/// Only `first_name` is required. Empty strings in optional fields are
/// treated as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateContactRequest {
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateContactRequest {
    pub fn new(first_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            ..Default::default()
        }
    }

    pub fn last_name(mut self, value: impl Into<String>) -> Self {
        self.last_name = Some(value.into());
        self
    }

    pub fn email(mut self, value: impl Into<String>) -> Self {
        self.email = Some(value.into());
        self
    }

    pub fn phone(mut self, value: impl Into<String>) -> Self {
        self.phone = Some(value.into());
        self
    }

    pub fn title(mut self, value: impl Into<String>) -> Self {
        self.title = Some(value.into());
        self
    }

    pub fn company_name(mut self, value: impl Into<String>) -> Self {
        self.company_name = Some(value.into());
        self
    }

    pub fn date_of_birth(mut self, value: impl Into<String>) -> Self {
        self.date_of_birth = Some(value.into());
        self
    }

    pub fn notes(mut self, value: impl Into<String>) -> Self {
        self.notes = Some(value.into());
        self
    }
}

/// Collapse `Some("")` to `None`.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// =============================================================================
// PARTIAL UPDATES
// =============================================================================

/// Partial update sent to the remote store.
///
/// Nullable columns use `Option<Option<_>>`: the outer `None` leaves the
/// column untouched, `Some(None)` sets it to null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub last_name: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub email: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub phone: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub title: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub company_name: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub date_of_birth: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub notes: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_status: Option<LeadStatus>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub tags: Option<Option<Vec<String>>>,
}

/// Value of a single column assignment in a [`ContactPatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum PatchValue {
    Text(Option<String>),
    Status(LeadStatus),
    Tags(Option<Vec<String>>),
}

impl ContactPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn first_name(mut self, value: impl Into<String>) -> Self {
        self.first_name = Some(value.into());
        self
    }

    pub fn last_name(mut self, value: Option<String>) -> Self {
        self.last_name = Some(value);
        self
    }

    pub fn email(mut self, value: Option<String>) -> Self {
        self.email = Some(value);
        self
    }

    pub fn phone(mut self, value: Option<String>) -> Self {
        self.phone = Some(value);
        self
    }

    pub fn title(mut self, value: Option<String>) -> Self {
        self.title = Some(value);
        self
    }

    pub fn company_name(mut self, value: Option<String>) -> Self {
        self.company_name = Some(value);
        self
    }

    pub fn date_of_birth(mut self, value: Option<String>) -> Self {
        self.date_of_birth = Some(value);
        self
    }

    pub fn notes(mut self, value: Option<String>) -> Self {
        self.notes = Some(value);
        self
    }

    pub fn lead_status(mut self, value: LeadStatus) -> Self {
        self.lead_status = Some(value);
        self
    }

    pub fn tags(mut self, value: Option<Vec<String>>) -> Self {
        self.tags = Some(value);
        self
    }

    /// Column assignments in table column order, set fields only.
    pub fn assignments(&self) -> Vec<(&'static str, PatchValue)> {
        let mut out = Vec::new();
        if let Some(v) = &self.first_name {
            out.push(("first_name", PatchValue::Text(Some(v.clone()))));
        }
        let nullable = [
            ("last_name", &self.last_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("title", &self.title),
            ("company_name", &self.company_name),
            ("date_of_birth", &self.date_of_birth),
            ("notes", &self.notes),
        ];
        for (column, value) in nullable {
            if let Some(v) = value {
                out.push((column, PatchValue::Text(v.clone())));
            }
        }
        if let Some(v) = &self.lead_status {
            out.push(("lead_status", PatchValue::Status(v.clone())));
        }
        if let Some(v) = &self.tags {
            out.push(("tags", PatchValue::Tags(v.clone())));
        }
        out
    }

    /// True when no column would be touched.
    pub fn is_empty(&self) -> bool {
        self.assignments().is_empty()
    }

    /// Apply this patch to a record in place. Does not touch `updated_at`.
    pub fn apply_to(&self, record: &mut ContactRecord) {
        for (column, value) in self.assignments() {
            match (column, value) {
                ("first_name", PatchValue::Text(Some(v))) => record.first_name = v,
                ("last_name", PatchValue::Text(v)) => record.last_name = v,
                ("email", PatchValue::Text(v)) => record.email = v,
                ("phone", PatchValue::Text(v)) => record.phone = v,
                ("title", PatchValue::Text(v)) => record.title = v,
                ("company_name", PatchValue::Text(v)) => record.company_name = v,
                ("date_of_birth", PatchValue::Text(v)) => record.date_of_birth = v,
                ("notes", PatchValue::Text(v)) => record.notes = v,
                (_, PatchValue::Status(v)) => record.lead_status = v,
                (_, PatchValue::Tags(v)) => record.tags = v,
                _ => {}
            }
        }
    }
}

/// Distinguish an explicit `null` (`Some(None)`) from a missing field (`None`).
fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> ContactRecord {
        let now = Utc::now();
        ContactRecord {
            id: "contact-1".to_string(),
            organization_id: OrganizationId::new("org-a"),
            first_name: "Ada".to_string(),
            last_name: Some("Lovelace".to_string()),
            email: None,
            phone: None,
            title: None,
            company_id: None,
            company_name: None,
            date_of_birth: None,
            notes: None,
            lead_status: LeadStatus::New,
            lead_score: 0,
            tags: Some(vec!["vip".to_string()]),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_lead_status_round_trips_known_and_unknown_tags() {
        assert_eq!("qualified".parse::<LeadStatus>().unwrap(), LeadStatus::Qualified);
        assert_eq!(
            LeadStatus::from("nurturing".to_string()),
            LeadStatus::Other("nurturing".to_string())
        );
        assert_eq!(serde_json::to_value(LeadStatus::Contacted).unwrap(), json!("contacted"));
        let status: LeadStatus = serde_json::from_value(json!("nurturing")).unwrap();
        assert_eq!(status.as_str(), "nurturing");
    }

    #[test]
    fn test_lead_status_default_is_new() {
        assert_eq!(LeadStatus::default(), LeadStatus::New);
    }

    #[test]
    fn test_contact_record_uses_snake_case_wire_names() {
        let value = serde_json::to_value(record()).unwrap();
        assert_eq!(value["organization_id"], "org-a");
        assert_eq!(value["first_name"], "Ada");
        assert_eq!(value["lead_status"], "new");
        assert_eq!(value["lead_score"], 0);
        assert!(value["company_id"].is_null());
    }

    #[test]
    fn test_full_name_and_tags() {
        let mut r = record();
        assert_eq!(r.full_name(), "Ada Lovelace");
        assert!(r.has_tag("vip"));
        assert!(!r.has_tag("cold"));
        r.last_name = None;
        r.tags = None;
        assert_eq!(r.full_name(), "Ada");
        assert!(!r.has_tag("vip"));
    }

    #[test]
    fn test_non_empty_collapses_blank_strings() {
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(Some("x".to_string())), Some("x".to_string()));
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn test_patch_distinguishes_null_from_missing() {
        let patch: ContactPatch =
            serde_json::from_value(json!({ "email": null, "title": "CEO" })).unwrap();
        assert_eq!(patch.email, Some(None));
        assert_eq!(patch.title, Some(Some("CEO".to_string())));
        assert_eq!(patch.phone, None);

        let back = serde_json::to_value(&patch).unwrap();
        assert!(back.get("email").unwrap().is_null());
        assert!(back.get("phone").is_none());
    }

    #[test]
    fn test_patch_assignments_only_lists_set_fields() {
        let patch = ContactPatch::new()
            .email(None)
            .lead_status(LeadStatus::Won)
            .tags(Some(vec!["closed".to_string()]));
        let columns: Vec<_> = patch.assignments().into_iter().map(|(c, _)| c).collect();
        assert_eq!(columns, vec!["email", "lead_status", "tags"]);
        assert!(ContactPatch::new().is_empty());
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_patch_apply_leaves_updated_at_alone() {
        let mut r = record();
        let before = r.updated_at;
        ContactPatch::new()
            .first_name("Augusta")
            .last_name(None)
            .lead_status(LeadStatus::Qualified)
            .apply_to(&mut r);
        assert_eq!(r.first_name, "Augusta");
        assert_eq!(r.last_name, None);
        assert_eq!(r.lead_status, LeadStatus::Qualified);
        assert_eq!(r.updated_at, before);
    }

    #[test]
    fn test_create_request_builder() {
        let req = CreateContactRequest::new("Grace").email("grace@example.com");
        assert_eq!(req.first_name, "Grace");
        assert_eq!(req.email.as_deref(), Some("grace@example.com"));
        assert!(req.phone.is_none());
    }
}
