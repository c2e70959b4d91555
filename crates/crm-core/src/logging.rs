//! Structured logging schema, field name constants, and subscriber setup.
//!
//! All crates use these constants for consistent structured logging fields.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Remote store failures surfaced to the caller |
//! | WARN  | Load failures, superseded results worth noticing |
//! | INFO  | Completed loads, pool lifecycle |
//! | DEBUG | Decision points (fixture routing, load tickets, tenant switches) |
//! | TRACE | Per-record detail |

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "contacts", "db"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "directory", "gateway", "fixtures", "hook", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "load", "create", "update", "fetch"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Organization (tenant) the operation is scoped to.
pub const ORGANIZATION_ID: &str = "organization_id";

/// Contact id being operated on.
pub const CONTACT_ID: &str = "contact_id";

/// Monotonic ticket of a directory load.
pub const LOAD_TICKET: &str = "load_ticket";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of records loaded or returned.
pub const RECORD_COUNT: &str = "record_count";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "crm_contacts=debug,crm_db=info,crm_core=info";

/// Install the global tracing subscriber.
///
/// Environment:
///   LOG_FORMAT - "json" or "text" (default "text")
///   LOG_ANSI   - "true"/"false" override ANSI colors
///   RUST_LOG   - standard env filter (default [`DEFAULT_FILTER`])
///
/// Calling this twice is harmless; the second install is ignored.
pub fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_FILTER.into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        let mut layer = tracing_subscriber::fmt::layer();
        if let Some(ansi) = log_ansi {
            layer = layer.with_ansi(ansi);
        }
        registry.with(layer).try_init()
    };

    if installed.is_ok() {
        tracing::info!(log_format = %log_format, "Logging initialized");
    }
}
