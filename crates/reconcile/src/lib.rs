//! Change detection and reconciliation for analyst grid edits
//!
//! Compares a client-submitted row snapshot against a freshly loaded baseline
//! and writes only the rows whose editable fields differ, as one transaction.

mod value;
mod schema;
mod submission;
mod diff;
mod payload;
mod store;
mod save;

pub use value::{Cell, Normalized, normalize, normalize_for, clean_for_storage, is_missing, NULL_TOKENS};
pub use schema::{ColumnKind, EditableField, TableSchema, RecordId};
pub use submission::{ClientRow, parse_submission};
pub use diff::{Baseline, BaselineRow, changed_ids};
pub use payload::{UpdatePayload, build_payloads, coerce_for_column};
pub use store::{NewsStore, ApplyReport, InMemoryStore};
pub use save::{SaveOutcome, save_snapshot};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Malformed submission: {0}")]
    MalformedSubmission(String),

    #[error("Baseline load failed: {0}")]
    Baseline(String),

    #[error("Write failed, batch rolled back: {0}")]
    Write(String),

    #[error("Schema error: {0}")]
    Schema(String),
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
