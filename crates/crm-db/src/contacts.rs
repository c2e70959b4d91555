//! Contact repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, QueryBuilder, Row};
use tracing::{debug, error, warn};

use crm_core::{
    ContactPatch, ContactRecord, ContactSource, ContactStore, Error, LeadStatus,
    OrganizationId, PatchValue, Result,
};

use crate::schema::CONTACT_COLUMNS;

/// PostgreSQL implementation of [`ContactStore`] and [`ContactSource`].
#[derive(Clone)]
pub struct PgContactRepository {
    pool: Pool<Postgres>,
}

impl PgContactRepository {
    /// Create a new PgContactRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }

    /// Persist a contact row as-is.
    pub async fn insert(&self, record: &ContactRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO contacts (id, organization_id, first_name, last_name, email, phone,
                                   title, company_id, company_name, date_of_birth, notes,
                                   lead_status, lead_score, tags, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(&record.id)
        .bind(record.organization_id.as_str())
        .bind(&record.first_name)
        .bind(&record.last_name)
        .bind(&record.email)
        .bind(&record.phone)
        .bind(&record.title)
        .bind(&record.company_id)
        .bind(&record.company_name)
        .bind(&record.date_of_birth)
        .bind(&record.notes)
        .bind(record.lead_status.as_str())
        .bind(i32::from(record.lead_score))
        .bind(&record.tags)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    /// Delete every contact of an organization. Returns the number of rows removed.
    pub async fn delete_for_organization(&self, organization_id: &OrganizationId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM contacts WHERE organization_id = $1")
            .bind(organization_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }
}

/// Build `UPDATE contacts SET … WHERE id = $n RETURNING …` for the set fields
/// of `patch`. `updated_at` is always advanced.
pub fn build_update(id: &str, patch: &ContactPatch) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("UPDATE contacts SET ");
    {
        let mut set = qb.separated(", ");
        for (column, value) in patch.assignments() {
            set.push(column);
            set.push_unseparated(" = ");
            match value {
                PatchValue::Text(v) => set.push_bind_unseparated(v),
                PatchValue::Status(s) => set.push_bind_unseparated(String::from(s)),
                PatchValue::Tags(t) => set.push_bind_unseparated(t),
            };
        }
        set.push("updated_at = now()");
    }
    qb.push(" WHERE id = ");
    qb.push_bind(id.to_string());
    qb.push(" RETURNING ");
    qb.push(CONTACT_COLUMNS);
    qb
}

fn map_row(row: &PgRow) -> std::result::Result<ContactRecord, sqlx::Error> {
    let organization_id: String = row.try_get("organization_id")?;
    let lead_status: String = row.try_get("lead_status")?;
    let lead_score: i32 = row.try_get("lead_score")?;
    Ok(ContactRecord {
        id: row.try_get("id")?,
        organization_id: OrganizationId::new(organization_id),
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        title: row.try_get("title")?,
        company_id: row.try_get("company_id")?,
        company_name: row.try_get("company_name")?,
        date_of_birth: row.try_get("date_of_birth")?,
        notes: row.try_get("notes")?,
        lead_status: LeadStatus::from(lead_status),
        lead_score: lead_score.clamp(0, i32::from(crm_core::MAX_LEAD_SCORE)) as u8,
        tags: row.try_get("tags")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl ContactStore for PgContactRepository {
    async fn update_contact(&self, id: &str, patch: &ContactPatch) -> Result<ContactRecord> {
        if patch.is_empty() {
            return Err(Error::InvalidInput(format!(
                "update for contact {id} has no fields"
            )));
        }

        let mut qb = build_update(id, patch);
        let row = qb
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!(
                    subsystem = "db",
                    component = "contacts",
                    op = "update",
                    contact_id = %id,
                    error = %e,
                    "Contact update query failed"
                );
                Error::RemoteUpdate(e.to_string())
            })?;

        let Some(row) = row else {
            return Err(Error::NotFound(format!("contact {id}")));
        };
        let record = map_row(&row).map_err(|e| Error::RemoteUpdate(e.to_string()))?;
        debug!(
            subsystem = "db",
            component = "contacts",
            op = "update",
            contact_id = %id,
            "Contact updated"
        );
        Ok(record)
    }
}

#[async_trait]
impl ContactSource for PgContactRepository {
    async fn fetch_contacts(&self, organization_id: &OrganizationId) -> Result<Vec<ContactRecord>> {
        let sql = format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE organization_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(organization_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                warn!(
                    subsystem = "db",
                    component = "contacts",
                    op = "fetch",
                    organization_id = %organization_id,
                    error = %e,
                    "Contact fetch query failed"
                );
                Error::LoadFailure(e.to_string())
            })?;

        rows.iter()
            .map(|r| map_row(r).map_err(|e| Error::LoadFailure(e.to_string())))
            .collect()
    }
}
