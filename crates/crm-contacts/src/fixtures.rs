//! Deterministic synthetic contacts per organization.
//!
//! Stands in for the remote fetch until a real store is wired in. The output
//! is a pure function of the organization id (ids and timestamps aside), so
//! reloading a tenant never silently changes its data.
//!
//! Routing:
//! - `gas-company-id` and `test-company-id` get curated demo records.
//! - Every other id is reduced to a digest (sum of its UTF-16 code units) and
//!   `digest % 3` picks one of three templates. Score, phone and, for the
//!   last template, status are derived from the same digest.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crm_core::defaults::{GAS_COMPANY_ORG_ID, TEST_COMPANY_ORG_ID};
use crm_core::{
    labeled_contact_id, ContactRecord, ContactSource, LeadStatus, OrganizationId, Result,
};

/// Which record set an organization receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureVariety {
    GasCompany,
    TestCompany,
    /// `digest % 3 == 0`
    Technology,
    /// `digest % 3 == 1`
    SalesAutomation,
    /// `digest % 3 == 2`
    BusinessConsulting,
}

impl FixtureVariety {
    pub fn for_organization(organization_id: &OrganizationId) -> Self {
        match organization_id.as_str() {
            GAS_COMPANY_ORG_ID => Self::GasCompany,
            TEST_COMPANY_ORG_ID => Self::TestCompany,
            _ => match organization_digest(organization_id) % 3 {
                0 => Self::Technology,
                1 => Self::SalesAutomation,
                _ => Self::BusinessConsulting,
            },
        }
    }
}

/// Sum of the UTF-16 code units of the organization id. Empty id → 0.
pub fn organization_digest(organization_id: &OrganizationId) -> u64 {
    organization_id.as_str().encode_utf16().map(u64::from).sum()
}

/// Generate the organization's contacts, stamped with the current time.
pub fn generate(organization_id: &OrganizationId) -> Vec<ContactRecord> {
    generate_at(organization_id, Utc::now())
}

/// Generate the organization's contacts with `now` as both timestamps.
pub fn generate_at(organization_id: &OrganizationId, now: DateTime<Utc>) -> Vec<ContactRecord> {
    let variety = FixtureVariety::for_organization(organization_id);
    let digest = organization_digest(organization_id);
    debug!(
        subsystem = "contacts",
        component = "fixtures",
        organization_id = %organization_id,
        digest,
        ?variety,
        "Generating fixture contacts"
    );

    let records = match variety {
        FixtureVariety::GasCompany => gas_company(organization_id, now),
        FixtureVariety::TestCompany => test_company(organization_id, now),
        FixtureVariety::Technology => vec![technology(organization_id, digest, now)],
        FixtureVariety::SalesAutomation => vec![sales_automation(organization_id, digest, now)],
        FixtureVariety::BusinessConsulting => {
            vec![business_consulting(organization_id, digest, now)]
        }
    };

    for r in &records {
        trace!(contact_id = %r.id, lead_score = r.lead_score, "Fixture contact");
    }
    records
}

fn base(
    organization_id: &OrganizationId,
    label: &str,
    first_name: &str,
    now: DateTime<Utc>,
) -> ContactRecord {
    ContactRecord {
        id: labeled_contact_id(label),
        organization_id: organization_id.clone(),
        first_name: first_name.to_string(),
        last_name: None,
        email: None,
        phone: None,
        title: None,
        company_id: None,
        company_name: None,
        date_of_birth: None,
        notes: None,
        lead_status: LeadStatus::New,
        lead_score: 0,
        tags: None,
        created_at: now,
        updated_at: now,
    }
}

fn some(s: &str) -> Option<String> {
    Some(s.to_string())
}

fn tags(list: &[&str]) -> Option<Vec<String>> {
    Some(list.iter().map(|t| t.to_string()).collect())
}

/// `+1 (55X) 555-NNNN` with `X = digest % 10`.
fn digest_phone(digest: u64) -> String {
    format!("+1 ({}) 555-{:04}", 550 + digest % 10, 1000 + digest % 9000)
}

fn gas_company(org: &OrganizationId, now: DateTime<Utc>) -> Vec<ContactRecord> {
    let mut torres = base(org, "gas-1", "Michael", now);
    torres.last_name = some("Torres");
    torres.email = some("m.torres@metrogas.com");
    torres.phone = some("+1 (555) 234-5678");
    torres.title = some("Operations Manager");
    torres.company_name = some("Metro Gas Distribution");
    torres.date_of_birth = some("1978-09-12");
    torres.notes = some("Evaluating field service scheduling for meter crews");
    torres.lead_status = LeadStatus::Qualified;
    torres.lead_score = 78;
    torres.tags = tags(&["utilities", "field-service"]);

    let mut chen = base(org, "gas-2", "Sarah", now);
    chen.last_name = some("Chen");
    chen.email = some("s.chen@metrogas.com");
    chen.phone = some("+1 (555) 876-5432");
    chen.title = some("Customer Service Director");
    chen.company_name = some("Metro Gas Distribution");
    chen.date_of_birth = some("1983-04-27");
    chen.notes = some("Wants outage notifications routed through the CRM");
    chen.lead_status = LeadStatus::Contacted;
    chen.lead_score = 62;
    chen.tags = tags(&["utilities", "customer-support"]);

    vec![torres, chen]
}

fn test_company(org: &OrganizationId, now: DateTime<Utc>) -> Vec<ContactRecord> {
    let mut user = base(org, "test-1", "Test", now);
    user.last_name = some("User");
    user.email = some("test.user@testcompany.com");
    user.phone = some("+1 (555) 000-0001");
    user.title = some("QA Lead");
    user.company_name = some("Test Company");
    user.notes = some("Sandbox contact for end-to-end checks");
    user.lead_status = LeadStatus::New;
    user.lead_score = 40;
    user.tags = tags(&["test"]);
    vec![user]
}

fn technology(org: &OrganizationId, digest: u64, now: DateTime<Utc>) -> ContactRecord {
    let mut r = base(org, "tech-1", "Alex", now);
    r.last_name = some("Rivera");
    r.email = some("alex.rivera@nimbuslabs.io");
    r.phone = Some(digest_phone(digest));
    r.title = some("VP of Engineering");
    r.company_name = some("Nimbus Labs");
    r.date_of_birth = some("1984-02-11");
    r.notes = some("Exploring AI integration for support workflows");
    r.lead_status = LeadStatus::Qualified;
    r.lead_score = (70 + digest % 30) as u8;
    r.tags = tags(&["technology", "ai-integration"]);
    r
}

fn sales_automation(org: &OrganizationId, digest: u64, now: DateTime<Utc>) -> ContactRecord {
    let mut r = base(org, "sales-1", "Morgan", now);
    r.last_name = some("Patel");
    r.email = some("morgan.patel@summitrevenue.com");
    r.phone = Some(digest_phone(digest));
    r.title = some("Head of Sales");
    r.company_name = some("Summit Revenue Group");
    r.date_of_birth = some("1988-07-30");
    r.notes = some("Wants pipeline automation before next quarter");
    r.lead_status = LeadStatus::Contacted;
    r.lead_score = (50 + digest % 40) as u8;
    r.tags = tags(&["sales-automation", "crm"]);
    r
}

fn business_consulting(org: &OrganizationId, digest: u64, now: DateTime<Utc>) -> ContactRecord {
    let mut r = base(org, "consult-1", "Jordan", now);
    r.last_name = some("Kim");
    r.email = some("jordan.kim@keystoneadvisory.com");
    r.phone = Some(digest_phone(digest));
    r.title = some("Managing Partner");
    r.company_name = some("Keystone Advisory");
    r.date_of_birth = some("1975-11-03");
    r.notes = some("Referral from partner network");
    r.lead_status = if digest % 2 == 0 {
        LeadStatus::Qualified
    } else {
        LeadStatus::New
    };
    r.lead_score = (30 + digest % 50) as u8;
    r.tags = tags(&["business-consulting", "referral"]);
    r
}

/// [`ContactSource`] backed by the fixture generator.
///
/// Sleeps for `delay` before generating, which keeps the load's suspension
/// point where a real fetch would be.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    delay: Duration,
}

impl FixtureSource {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// No artificial latency.
    pub fn immediate() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for FixtureSource {
    fn default() -> Self {
        Self::new(Duration::from_millis(
            crm_core::defaults::FIXTURE_LOAD_DELAY_MS,
        ))
    }
}

#[async_trait]
impl ContactSource for FixtureSource {
    async fn fetch_contacts(&self, organization_id: &OrganizationId) -> Result<Vec<ContactRecord>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(generate(organization_id))
    }
}
