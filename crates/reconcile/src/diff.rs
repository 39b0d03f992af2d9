use std::collections::{HashMap, HashSet};

use crate::{Cell, ClientRow, EditableField, Normalized, RecordId, normalize_for};

pub type BaselineRow = HashMap<String, Cell>;

/// Editable-field values as currently stored, keyed by identifier.
#[derive(Clone, Debug, Default)]
pub struct Baseline {
    rows: HashMap<RecordId, BaselineRow>,
}

impl Baseline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: RecordId, row: BaselineRow) {
        self.rows.insert(id, row);
    }

    pub fn get(&self, id: &RecordId) -> Option<&BaselineRow> {
        self.rows.get(id)
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.rows.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<(RecordId, BaselineRow)> for Baseline {
    fn from_iter<T: IntoIterator<Item = (RecordId, BaselineRow)>>(iter: T) -> Self {
        Self { rows: iter.into_iter().collect() }
    }
}

/// Identifiers whose editable fields differ from the baseline, in submission order.
///
/// Unknown identifiers always count as changed. Each identifier appears once.
/// Values are compared by the kind of their column.
pub fn changed_ids(rows: &[ClientRow], baseline: &Baseline, fields: &[EditableField]) -> Vec<RecordId> {
    let mut seen: HashSet<&RecordId> = HashSet::new();
    let mut out = Vec::new();

    for row in rows {
        if seen.contains(&row.id) {
            continue;
        }
        let changed = match baseline.get(&row.id) {
            None => true,
            Some(stored) => fields.iter().any(|f| {
                let client = normalize_for(f.kind, row.cell(&f.name));
                let current = stored
                    .get(&f.name)
                    .map(|c| normalize_for(f.kind, c))
                    .unwrap_or(Normalized::Null);
                client != current
            }),
        };
        seen.insert(&row.id);
        if changed {
            out.push(row.id.clone());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ColumnKind;

    fn text(name: &str) -> Vec<EditableField> {
        vec![EditableField::new(name, ColumnKind::Text)]
    }

    fn stored(pairs: &[(&str, Cell)]) -> BaselineRow {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_ignores_fields_outside_the_editable_set() {
        let mut base = Baseline::new();
        base.insert("1".into(), stored(&[("analyst_tag", Cell::from("a")), ("headline", Cell::from("old"))]));

        let rows = vec![ClientRow::new("1").with("analyst_tag", "a").with("headline", "new")];
        assert!(changed_ids(&rows, &base, &text("analyst_tag")).is_empty());
    }

    #[test]
    fn test_duplicate_rows_reported_once_in_first_order() {
        let base = Baseline::new();
        let rows = vec![ClientRow::new("2"), ClientRow::new("1"), ClientRow::new("2")];
        let ids = changed_ids(&rows, &base, &text("analyst_tag"));
        assert_eq!(ids, vec![RecordId::from("2"), RecordId::from("1")]);
    }

    #[test]
    fn test_absent_client_field_equals_stored_null() {
        let mut base = Baseline::new();
        base.insert("1".into(), stored(&[("analyst_remark", Cell::Null)]));
        let rows = vec![ClientRow::new("1")];
        assert!(changed_ids(&rows, &base, &text("analyst_remark")).is_empty());
    }

    #[test]
    fn test_absent_client_field_against_stored_value_is_a_change() {
        let mut base = Baseline::new();
        base.insert("1".into(), stored(&[("analyst_remark", Cell::from("keep me"))]));
        let rows = vec![ClientRow::new("1")];
        assert_eq!(changed_ids(&rows, &base, &text("analyst_remark")).len(), 1);
    }

    #[test]
    fn test_uuid_field_spelling_is_not_a_change() {
        let cat = uuid::Uuid::new_v4();
        let mut base = Baseline::new();
        base.insert("1".into(), stored(&[("analyst_cat_id", Cell::Text(cat.to_string()))]));
        let fields = vec![EditableField::new("analyst_cat_id", ColumnKind::Uuid)];

        let upper = vec![ClientRow::new("1").with("analyst_cat_id", cat.to_string().to_uppercase())];
        assert!(changed_ids(&upper, &base, &fields).is_empty());

        let other = vec![ClientRow::new("1").with("analyst_cat_id", uuid::Uuid::new_v4())];
        assert_eq!(changed_ids(&other, &base, &fields).len(), 1);
    }
}
