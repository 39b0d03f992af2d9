use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use crate::{NewsStore, RecordId, Result, TableSchema, build_payloads, changed_ids, parse_submission};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveOutcome {
    NoChanges,
    Saved { records: usize, matched: u64 },
}

impl SaveOutcome {
    pub fn message(&self) -> String {
        match self {
            SaveOutcome::NoChanges => "No changes to save".to_string(),
            SaveOutcome::Saved { records, .. } => format!("Saved {records} records"),
        }
    }

    pub fn records(&self) -> usize {
        match self {
            SaveOutcome::NoChanges => 0,
            SaveOutcome::Saved { records, .. } => *records,
        }
    }
}

/// Save a full grid snapshot: fresh baseline, diff, one transaction for the changed rows.
pub async fn save_snapshot<S>(store: &S, schema: &TableSchema, rows: &[JsonValue]) -> Result<SaveOutcome>
where
    S: NewsStore + ?Sized,
{
    let rows = parse_submission(rows, schema)?;

    let ids: Vec<RecordId> = rows.iter().map(|r| r.id.clone()).collect();
    let baseline = store.load_baseline(schema, Some(ids.as_slice())).await?;
    debug!(submitted = rows.len(), baseline = baseline.len(), "baseline loaded");

    let changed = changed_ids(&rows, &baseline, &schema.fields);
    if changed.is_empty() {
        info!(submitted = rows.len(), "save: no changes");
        return Ok(SaveOutcome::NoChanges);
    }

    let unknown = changed.iter().filter(|id| !baseline.contains(id)).count();
    let payloads = build_payloads(&changed, &rows, schema);
    let report = store.apply_updates(schema, &payloads).await?;

    info!(
        submitted = rows.len(),
        changed = report.attempted,
        matched = report.matched,
        unknown,
        "save: committed"
    );

    Ok(SaveOutcome::Saved { records: report.attempted, matched: report.matched })
}
