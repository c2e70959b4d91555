//! Schema of the `contacts` table.

use sqlx::PgPool;

use crm_core::{Error, Result};

/// Column list shared by every SELECT and RETURNING clause.
pub const CONTACT_COLUMNS: &str = "id, organization_id, first_name, last_name, email, phone, \
     title, company_id, company_name, date_of_birth, notes, lead_status, lead_score, tags, \
     created_at, updated_at";

/// Idempotent DDL for the `contacts` table.
pub const CONTACTS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS contacts (
    id              TEXT PRIMARY KEY,
    organization_id TEXT NOT NULL,
    first_name      TEXT NOT NULL,
    last_name       TEXT,
    email           TEXT,
    phone           TEXT,
    title           TEXT,
    company_id      TEXT,
    company_name    TEXT,
    date_of_birth   TEXT,
    notes           TEXT,
    lead_status     TEXT NOT NULL DEFAULT 'new',
    lead_score      INTEGER NOT NULL DEFAULT 0 CHECK (lead_score BETWEEN 0 AND 100),
    tags            TEXT[],
    created_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS contacts_organization_id_idx ON contacts (organization_id);
"#;

/// Create the `contacts` table if it does not exist.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::raw_sql(CONTACTS_DDL)
        .execute(pool)
        .await
        .map_err(Error::Database)?;
    Ok(())
}
