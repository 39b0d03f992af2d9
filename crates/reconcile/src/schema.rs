//! Table layout: identifier column, editable fields, SQL text

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Cell, ReconcileError, Result, is_missing};

/// Native column type of an editable field or the identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Bool,
    Int,
    Text,
    Uuid,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditableField {
    pub name: String,
    pub kind: ColumnKind,
}

impl EditableField {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self { name: name.into(), kind }
    }
}

/// Canonical string form of a record identifier.
///
/// The form depends on the identifier column's kind: UUIDs are lowercased and
/// hyphenated, integers use their decimal form, text is only trimmed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    /// Canonicalize `cell` for an identifier column of `kind`.
    ///
    /// `None` for null-like values and for values the column could never hold
    /// as a key. Text that is not a UUID is kept for a uuid column so the store
    /// can reject it on write.
    pub fn parse(cell: &Cell, kind: ColumnKind) -> Option<Self> {
        if is_missing(cell) {
            return None;
        }
        let raw = match cell {
            Cell::Uuid(u) => return Some(Self(u.to_string())),
            Cell::Int(i) => i.to_string(),
            Cell::Text(s) => s.trim().to_string(),
            _ => return None,
        };
        match kind {
            ColumnKind::Uuid => Some(match Uuid::parse_str(&raw) {
                Ok(u) => Self(u.to_string()),
                Err(_) => Self(raw),
            }),
            ColumnKind::Int => raw.parse::<i64>().ok().map(|i| Self(i.to_string())),
            ColumnKind::Text | ColumnKind::Bool => Some(Self(raw)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.0).ok()
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

/// Trimmed; UUID-shaped text is canonicalized.
impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self::parse(&Cell::from(s), ColumnKind::Uuid).unwrap_or_else(|| Self(s.trim().to_string()))
    }
}

impl From<Uuid> for RecordId {
    fn from(u: Uuid) -> Self {
        Self(u.to_string())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which table we write to and which of its columns analysts own.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TableSchema {
    pub table: String,
    pub id_column: String,
    pub id_kind: ColumnKind,
    pub fields: Vec<EditableField>,
}

impl TableSchema {
    pub fn new(
        table: impl Into<String>,
        id_column: impl Into<String>,
        id_kind: ColumnKind,
        fields: Vec<EditableField>,
    ) -> Result<Self> {
        let schema = Self {
            table: table.into(),
            id_column: id_column.into(),
            id_kind,
            fields,
        };
        schema.validate()?;
        Ok(schema)
    }

    /// The `news` table edited from the QC grid.
    pub fn news() -> Self {
        Self {
            table: "news".to_string(),
            id_column: "news_id".to_string(),
            id_kind: ColumnKind::Uuid,
            fields: vec![
                EditableField::new("analyst_dup", ColumnKind::Bool),
                EditableField::new("analyst_cat", ColumnKind::Text),
                EditableField::new("analyst_cat_id", ColumnKind::Uuid),
                EditableField::new("analyst_risk_level", ColumnKind::Int),
                EditableField::new("analyst_tag", ColumnKind::Text),
                EditableField::new("analyst_approval", ColumnKind::Bool),
                EditableField::new("analyst_remark", ColumnKind::Text),
            ],
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_ident(&self.table)?;
        check_ident(&self.id_column)?;
        if self.id_kind == ColumnKind::Bool {
            return Err(ReconcileError::Schema("identifier column cannot be boolean".into()));
        }
        if self.fields.is_empty() {
            return Err(ReconcileError::Schema("no editable fields".into()));
        }
        for f in &self.fields {
            check_ident(&f.name)?;
            if f.name == self.id_column {
                return Err(ReconcileError::Schema(format!(
                    "identifier column '{}' cannot be editable",
                    f.name
                )));
            }
        }
        Ok(())
    }

    pub fn field(&self, name: &str) -> Option<&EditableField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Identifier plus editable fields only. UUID columns come back as text,
    /// integers as bigint. With `restricted`, `$1` is an array of ids typed
    /// like the identifier column, so the key index stays usable.
    pub fn baseline_sql(&self, restricted: bool) -> String {
        let id = quote(&self.id_column);
        let mut cols = vec![format!("{id}::text AS {id}")];
        for f in &self.fields {
            let c = quote(&f.name);
            cols.push(match f.kind {
                ColumnKind::Uuid | ColumnKind::Text => format!("{c}::text AS {c}"),
                ColumnKind::Int => format!("{c}::bigint AS {c}"),
                ColumnKind::Bool => c,
            });
        }

        let mut sql = format!("SELECT {} FROM {}", cols.join(", "), quote(&self.table));
        if restricted {
            sql.push_str(&format!(" WHERE {id} = ANY($1)"));
        }
        sql
    }

    /// `UPDATE .. SET f1 = $1, .., fn = $n WHERE id = $n+1`
    pub fn update_sql(&self) -> String {
        let sets: Vec<String> = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| format!("{} = ${}", quote(&f.name), i + 1))
            .collect();

        format!(
            "UPDATE {} SET {} WHERE {} = ${}",
            quote(&self.table),
            sets.join(", "),
            quote(&self.id_column),
            self.fields.len() + 1
        )
    }
}

fn check_ident(name: &str) -> Result<()> {
    let ok = !name.is_empty()
        && name.len() <= 63
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if ok {
        Ok(())
    } else {
        Err(ReconcileError::Schema(format!("invalid SQL identifier: {name:?}")))
    }
}

fn quote(ident: &str) -> String {
    format!("\"{ident}\"")
}
