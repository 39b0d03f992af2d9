//! Cell values and the two normalization stages

use serde::Serialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::ColumnKind;

/// Strings treated as "not available", compared case-insensitively after trim.
pub const NULL_TOKENS: [&str; 3] = ["", "nan", "<na>"];

/// A single scalar as it arrives from the grid (JSON) or from a typed store column.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Uuid(Uuid),
    /// Arrays, objects and anything else we don't classify.
    Other(JsonValue),
}

/// Comparison-stable form of a [`Cell`].
///
/// Kinds never compare equal across each other: `Int(5) != Float(5.0)`.
#[derive(Clone, Debug, PartialEq)]
pub enum Normalized {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Other(JsonValue),
}

impl From<JsonValue> for Cell {
    fn from(v: JsonValue) -> Self {
        match v {
            JsonValue::Null => Cell::Null,
            JsonValue::Bool(b) => Cell::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Cell::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Cell::Float(f)
                } else {
                    Cell::Other(JsonValue::Number(n))
                }
            }
            JsonValue::String(s) => Cell::Text(s),
            other => Cell::Other(other),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<bool> for Cell {
    fn from(b: bool) -> Self {
        Cell::Bool(b)
    }
}

impl From<i64> for Cell {
    fn from(i: i64) -> Self {
        Cell::Int(i)
    }
}

impl From<Uuid> for Cell {
    fn from(u: Uuid) -> Self {
        Cell::Uuid(u)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Cell::Null)
    }
}

/// True for null, float NaN and the [`NULL_TOKENS`] sentinels.
pub fn is_missing(cell: &Cell) -> bool {
    match cell {
        Cell::Null => true,
        Cell::Float(f) => f.is_nan(),
        Cell::Text(s) => {
            let t = s.trim();
            NULL_TOKENS.iter().any(|tok| t.eq_ignore_ascii_case(tok))
        }
        _ => false,
    }
}

/// Reduce a cell to its comparison form. Total: unrecognized input passes through.
pub fn normalize(cell: &Cell) -> Normalized {
    if is_missing(cell) {
        return Normalized::Null;
    }
    match cell {
        Cell::Null => Normalized::Null,
        Cell::Bool(b) => Normalized::Bool(*b),
        Cell::Int(i) => Normalized::Int(*i),
        Cell::Float(f) => Normalized::Float(*f),
        Cell::Uuid(u) => Normalized::Text(u.to_string()),
        Cell::Text(s) => normalize_text(s),
        Cell::Other(v) => Normalized::Other(v.clone()),
    }
}

/// [`normalize`] for a value of a typed column. Text in a uuid column compares
/// by the UUID it spells, whatever its case or hyphenation.
pub fn normalize_for(kind: ColumnKind, cell: &Cell) -> Normalized {
    if let (ColumnKind::Uuid, Cell::Text(s)) = (kind, cell) {
        if let Ok(u) = Uuid::parse_str(s.trim()) {
            return Normalized::Text(u.to_string());
        }
    }
    normalize(cell)
}

fn normalize_text(s: &str) -> Normalized {
    let t = s.trim();

    if t.eq_ignore_ascii_case("true") {
        return Normalized::Bool(true);
    }
    if t.eq_ignore_ascii_case("false") {
        return Normalized::Bool(false);
    }
    if t.contains('.') {
        if let Ok(f) = t.parse::<f64>() {
            return Normalized::Float(f);
        }
    }
    if let Ok(i) = t.parse::<i64>() {
        return Normalized::Int(i);
    }
    Normalized::Text(t.to_string())
}

/// Write-side cleaning: sentinels become null, nothing else is touched.
///
/// A remark like `"42"` stays text here.
pub fn clean_for_storage(cell: Cell) -> Cell {
    if is_missing(&cell) {
        Cell::Null
    } else {
        cell
    }
}
