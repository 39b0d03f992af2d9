use std::collections::HashMap;

use serde_json::Value as JsonValue;

use crate::{Cell, RecordId, ReconcileError, Result, TableSchema};

static NULL_CELL: Cell = Cell::Null;

/// One row of the grid snapshot, keyed by its canonical identifier.
#[derive(Clone, Debug)]
pub struct ClientRow {
    pub id: RecordId,
    pub cells: HashMap<String, Cell>,
}

impl ClientRow {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self { id: id.into(), cells: HashMap::new() }
    }

    pub fn with(mut self, field: &str, value: impl Into<Cell>) -> Self {
        self.cells.insert(field.to_string(), value.into());
        self
    }

    /// Absent fields read as null.
    pub fn cell(&self, field: &str) -> &Cell {
        self.cells.get(field).unwrap_or(&NULL_CELL)
    }
}

/// Turn the raw JSON snapshot into rows. Fails before any store access when a
/// row is not an object or has no usable identifier.
pub fn parse_submission(rows: &[JsonValue], schema: &TableSchema) -> Result<Vec<ClientRow>> {
    let mut out = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let obj = row.as_object().ok_or_else(|| {
            ReconcileError::MalformedSubmission(format!("row {i} is not an object"))
        })?;

        let raw_id = obj.get(&schema.id_column).ok_or_else(|| {
            ReconcileError::MalformedSubmission(format!(
                "row {i} has no '{}' field",
                schema.id_column
            ))
        })?;

        let id = RecordId::parse(&Cell::from(raw_id.clone()), schema.id_kind).ok_or_else(|| {
            ReconcileError::MalformedSubmission(format!(
                "row {i} has an empty or invalid '{}': {raw_id}",
                schema.id_column
            ))
        })?;

        let cells = obj
            .iter()
            .filter(|(k, _)| **k != schema.id_column)
            .map(|(k, v)| (k.clone(), Cell::from(v.clone())))
            .collect();

        out.push(ClientRow { id, cells });
    }

    Ok(out)
}
