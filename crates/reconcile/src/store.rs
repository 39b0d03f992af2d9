//! Store trait and an in-memory implementation

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::Serialize;

use crate::{
    Baseline, BaselineRow, Cell, ColumnKind, RecordId, ReconcileError, Result, TableSchema, UpdatePayload,
};

/// Result of a committed batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    /// Identifiers an update was issued for.
    pub attempted: usize,
    /// Rows the store actually matched. Lower than `attempted` when ids are unknown.
    pub matched: u64,
}

#[async_trait]
pub trait NewsStore: Send + Sync {
    /// Current editable-field values, optionally only for `ids`.
    async fn load_baseline(&self, schema: &TableSchema, ids: Option<&[RecordId]>) -> Result<Baseline>;

    /// Run every payload in one transaction. Any failure leaves the store untouched.
    async fn apply_updates(&self, schema: &TableSchema, batch: &[UpdatePayload]) -> Result<ApplyReport>;
}

/// Keyed by the identifier as it was inserted; matched per the schema's key kind.
type Table = HashMap<String, HashMap<String, Cell>>;

/// In-memory store (for tests and demos).
///
/// Enforces column kinds the way a typed store would, and can be told to fail
/// a given statement of the next batches.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    rows: Arc<Mutex<Table>>,
    fail_on_statement: Arc<Mutex<Option<usize>>>,
    baseline_loads: Arc<AtomicUsize>,
    write_batches: Arc<AtomicUsize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: impl ToString, fields: Vec<(&str, Cell)>) {
        let row = fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        self.lock_rows().insert(id.to_string(), row);
    }

    /// Looks `id` up by its stored spelling.
    pub fn get(&self, id: &RecordId, field: &str) -> Option<Cell> {
        self.lock_rows().get(id.as_str()).and_then(|r| r.get(field).cloned())
    }

    pub fn len(&self) -> usize {
        self.lock_rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_rows().is_empty()
    }

    /// Make the statement at `index` (0-based, within a batch) fail. `None` clears it.
    pub fn fail_on_statement(&self, index: Option<usize>) {
        *self.fail_on_statement.lock().unwrap_or_else(|e| e.into_inner()) = index;
    }

    pub fn baseline_loads(&self) -> usize {
        self.baseline_loads.load(Ordering::SeqCst)
    }

    /// Number of write transactions opened.
    pub fn write_batches(&self) -> usize {
        self.write_batches.load(Ordering::SeqCst)
    }

    fn lock_rows(&self) -> MutexGuard<'_, Table> {
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn key(raw: &str, kind: ColumnKind) -> Option<RecordId> {
    RecordId::parse(&Cell::from(raw), kind)
}

fn fits(kind: ColumnKind, cell: &Cell) -> bool {
    matches!(
        (kind, cell),
        (_, Cell::Null)
            | (ColumnKind::Bool, Cell::Bool(_))
            | (ColumnKind::Int, Cell::Int(_))
            | (ColumnKind::Text, Cell::Text(_))
            | (ColumnKind::Uuid, Cell::Uuid(_))
    )
}

#[async_trait]
impl NewsStore for InMemoryStore {
    async fn load_baseline(&self, schema: &TableSchema, ids: Option<&[RecordId]>) -> Result<Baseline> {
        self.baseline_loads.fetch_add(1, Ordering::SeqCst);
        let rows = self.lock_rows();

        let wanted = |id: &RecordId| ids.map_or(true, |ids| ids.contains(id));

        Ok(rows
            .iter()
            .filter_map(|(raw, stored)| key(raw, schema.id_kind).map(|id| (id, stored)))
            .filter(|(id, _)| wanted(id))
            .map(|(id, stored)| {
                let subset: BaselineRow = schema
                    .fields
                    .iter()
                    .map(|f| {
                        let v = match stored.get(&f.name) {
                            Some(Cell::Uuid(u)) => Cell::Text(u.to_string()),
                            Some(c) => c.clone(),
                            None => Cell::Null,
                        };
                        (f.name.clone(), v)
                    })
                    .collect();
                (id, subset)
            })
            .collect())
    }

    async fn apply_updates(&self, schema: &TableSchema, batch: &[UpdatePayload]) -> Result<ApplyReport> {
        self.write_batches.fetch_add(1, Ordering::SeqCst);
        let fail_at = *self.fail_on_statement.lock().unwrap_or_else(|e| e.into_inner());

        let mut rows = self.lock_rows();
        // staged copy, swapped in only on success
        let mut staged = rows.clone();
        let mut matched = 0u64;
        let null = Cell::Null;

        for (i, p) in batch.iter().enumerate() {
            if fail_at == Some(i) {
                return Err(ReconcileError::Write(format!("record {}: injected failure", p.id)));
            }
            for f in &schema.fields {
                let v = p.get(&f.name).unwrap_or(&null);
                if !fits(f.kind, v) {
                    return Err(ReconcileError::Write(format!(
                        "record {}: column '{}' is {:?}, got {:?}",
                        p.id, f.name, f.kind, v
                    )));
                }
            }
            for (_, row) in staged
                .iter_mut()
                .filter(|(raw, _)| key(raw, schema.id_kind).as_ref() == Some(&p.id))
            {
                for (k, v) in &p.values {
                    row.insert(k.clone(), v.clone());
                }
                matched += 1;
            }
        }

        *rows = staged;
        Ok(ApplyReport { attempted: batch.len(), matched })
    }
}
