use std::collections::HashMap;

use uuid::Uuid;

use crate::{Cell, ClientRow, ColumnKind, EditableField, RecordId, TableSchema, clean_for_storage};

/// Values for one `UPDATE`, in schema field order.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdatePayload {
    pub id: RecordId,
    pub values: Vec<(String, Cell)>,
}

impl UpdatePayload {
    pub fn get(&self, field: &str) -> Option<&Cell> {
        self.values.iter().find(|(f, _)| f == field).map(|(_, v)| v)
    }
}

/// Build write payloads for `changed`, taking each id's first row in `rows`.
///
/// Every editable field is written; absent ones as null.
pub fn build_payloads(changed: &[RecordId], rows: &[ClientRow], schema: &TableSchema) -> Vec<UpdatePayload> {
    let mut by_id: HashMap<&RecordId, &ClientRow> = HashMap::with_capacity(rows.len());
    for row in rows {
        by_id.entry(&row.id).or_insert(row);
    }

    changed
        .iter()
        .map(|id| {
            let values = schema
                .fields
                .iter()
                .map(|f| {
                    let raw = by_id.get(id).map(|r| r.cell(&f.name).clone()).unwrap_or(Cell::Null);
                    (f.name.clone(), coerce_for_column(f, clean_for_storage(raw)))
                })
                .collect();
            UpdatePayload { id: id.clone(), values }
        })
        .collect()
}

/// Bring a cleaned cell to the column's native type where that is unambiguous.
/// Anything that doesn't convert is returned as-is; the store has the last word.
pub fn coerce_for_column(field: &EditableField, cell: Cell) -> Cell {
    match (field.kind, cell) {
        (_, Cell::Null) => Cell::Null,
        (ColumnKind::Int, cell) => to_int(cell),
        (ColumnKind::Uuid, Cell::Text(s)) => match Uuid::parse_str(s.trim()) {
            Ok(u) => Cell::Uuid(u),
            Err(_) => Cell::Text(s),
        },
        (ColumnKind::Bool, Cell::Text(s)) => {
            let t = s.trim();
            if t.eq_ignore_ascii_case("true") {
                Cell::Bool(true)
            } else if t.eq_ignore_ascii_case("false") {
                Cell::Bool(false)
            } else {
                Cell::Text(s)
            }
        }
        (_, cell) => cell,
    }
}

fn to_int(cell: Cell) -> Cell {
    match cell {
        Cell::Float(f) => truncate(f).unwrap_or(Cell::Float(f)),
        Cell::Text(s) => {
            let t = s.trim();
            if let Ok(i) = t.parse::<i64>() {
                Cell::Int(i)
            } else if let Some(c) = t.parse::<f64>().ok().and_then(truncate) {
                c
            } else {
                Cell::Text(s)
            }
        }
        other => other,
    }
}

fn truncate(f: f64) -> Option<Cell> {
    // i64::MAX as f64 rounds up, so the upper bound is exclusive
    if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(Cell::Int(f.trunc() as i64))
    } else {
        None
    }
}
