use reconcile::{
    Baseline, Cell, ClientRow, ColumnKind, EditableField, InMemoryStore, NewsStore, RecordId, ReconcileError,
    SaveOutcome, TableSchema, changed_ids, normalize, save_snapshot,
};
use serde_json::json;
use uuid::Uuid;

fn seeded_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    store.insert("1", vec![("analyst_dup", Cell::Null), ("analyst_tag", Cell::Null)]);
    store.insert("2", vec![("analyst_risk_level", Cell::Int(3))]);
    store
}

#[test]
fn test_type_insensitive_equality() {
    assert_eq!(normalize(&Cell::from("5")), normalize(&Cell::Int(5)));
    assert_eq!(normalize(&Cell::from("true")), normalize(&Cell::Bool(true)));
    assert_eq!(normalize(&Cell::from("")), normalize(&Cell::Null));
    assert_eq!(normalize(&Cell::from("NaN")), normalize(&Cell::Null));
}

#[test]
fn test_minimality() {
    let cat = Uuid::new_v4();
    let mut baseline = Baseline::new();
    baseline.insert(
        RecordId::from("7"),
        [
            ("analyst_dup".to_string(), Cell::Bool(false)),
            ("analyst_cat_id".to_string(), Cell::Text(cat.to_string())),
            ("analyst_risk_level".to_string(), Cell::Int(2)),
            ("analyst_remark".to_string(), Cell::from("ok")),
        ]
        .into_iter()
        .collect(),
    );

    let rows = vec![ClientRow::new("7")
        .with("analyst_dup", "False")
        .with("analyst_cat_id", cat.to_string().as_str())
        .with("analyst_risk_level", "2")
        .with("analyst_remark", " ok ")
        .with("analyst_tag", "nan")];

    let schema = TableSchema::news();
    assert!(changed_ids(&rows, &baseline, &schema.fields).is_empty());
}

#[test]
fn test_unknown_ids_always_changed() {
    let baseline = Baseline::new();
    let rows = vec![ClientRow::new("42")];
    assert_eq!(changed_ids(&rows, &baseline, &[EditableField::new("analyst_tag", ColumnKind::Text)]), vec![RecordId::from("42")]);
}

#[tokio::test]
async fn test_scenario_a_new_values_are_written_natively() {
    let store = seeded_store();
    let schema = TableSchema::news();

    let rows = vec![json!({"news_id": "1", "analyst_dup": "true", "analyst_tag": "urgent"})];
    let outcome = save_snapshot(&store, &schema, &rows).await.unwrap();

    assert_eq!(outcome, SaveOutcome::Saved { records: 1, matched: 1 });
    assert_eq!(outcome.message(), "Saved 1 records");
    let id = RecordId::from("1");
    assert_eq!(store.get(&id, "analyst_dup"), Some(Cell::Bool(true)));
    assert_eq!(store.get(&id, "analyst_tag"), Some(Cell::from("urgent")));
}

#[tokio::test]
async fn test_scenario_b_numeric_text_is_not_a_change() {
    let store = seeded_store();
    let schema = TableSchema::news();

    let rows = vec![json!({"news_id": "2", "analyst_risk_level": "3"})];
    let outcome = save_snapshot(&store, &schema, &rows).await.unwrap();

    assert_eq!(outcome, SaveOutcome::NoChanges);
}

#[tokio::test]
async fn test_scenario_c_unknown_record_is_written() {
    let store = seeded_store();
    let schema = TableSchema::news();

    let rows = vec![json!({"news_id": "3", "analyst_tag": "fresh"})];
    let outcome = save_snapshot(&store, &schema, &rows).await.unwrap();

    // the update was issued, the store had nothing to match
    assert_eq!(outcome, SaveOutcome::Saved { records: 1, matched: 0 });
    assert_eq!(store.write_batches(), 1);
}

#[tokio::test]
async fn test_scenario_d_no_changes_opens_no_transaction() {
    let store = seeded_store();
    let schema = TableSchema::news();

    let rows = vec![
        json!({"news_id": "1", "analyst_dup": null, "analyst_tag": ""}),
        json!({"news_id": "2", "analyst_risk_level": 3, "headline": "ignored"}),
    ];
    let outcome = save_snapshot(&store, &schema, &rows).await.unwrap();

    assert_eq!(outcome, SaveOutcome::NoChanges);
    assert_eq!(outcome.message(), "No changes to save");
    assert_eq!(store.write_batches(), 0);
}

#[tokio::test]
async fn test_idempotent_second_save() {
    let store = seeded_store();
    let schema = TableSchema::news();
    let cat = Uuid::new_v4();

    let rows = vec![
        json!({"news_id": "1", "analyst_dup": true, "analyst_cat_id": cat.to_string(), "analyst_risk_level": "4"}),
        json!({"news_id": "2", "analyst_risk_level": "5", "analyst_remark": "  checked  "}),
    ];

    let first = save_snapshot(&store, &schema, &rows).await.unwrap();
    assert_eq!(first.records(), 2);
    assert_eq!(store.get(&RecordId::from("1"), "analyst_cat_id"), Some(Cell::Uuid(cat)));

    let second = save_snapshot(&store, &schema, &rows).await.unwrap();
    assert_eq!(second, SaveOutcome::NoChanges);
    assert_eq!(store.write_batches(), 1);
}

#[tokio::test]
async fn test_atomic_batch_on_final_statement_failure() {
    let store = seeded_store();
    let schema = TableSchema::news();

    let rows = vec![
        json!({"news_id": "1", "analyst_tag": "first"}),
        json!({"news_id": "2", "analyst_tag": "second"}),
    ];
    store.fail_on_statement(Some(1));

    let err = save_snapshot(&store, &schema, &rows).await.unwrap_err();
    assert!(matches!(err, ReconcileError::Write(_)));

    assert_eq!(store.get(&RecordId::from("1"), "analyst_tag"), Some(Cell::Null));
    assert_eq!(store.get(&RecordId::from("2"), "analyst_tag"), None);
}

#[tokio::test]
async fn test_store_rejects_uncoercible_value_and_rolls_back() {
    let store = seeded_store();
    let schema = TableSchema::news();

    let rows = vec![
        json!({"news_id": "1", "analyst_tag": "kept?"}),
        json!({"news_id": "2", "analyst_risk_level": "high"}),
    ];

    let err = save_snapshot(&store, &schema, &rows).await.unwrap_err();
    assert!(matches!(err, ReconcileError::Write(ref m) if m.contains("analyst_risk_level")));
    assert_eq!(store.get(&RecordId::from("1"), "analyst_tag"), Some(Cell::Null));
}

#[tokio::test]
async fn test_malformed_submission_never_touches_store() {
    let store = seeded_store();
    let schema = TableSchema::news();

    let rows = vec![json!({"analyst_tag": "no id"})];
    let err = save_snapshot(&store, &schema, &rows).await.unwrap_err();

    assert!(matches!(err, ReconcileError::MalformedSubmission(_)));
    assert_eq!(store.baseline_loads(), 0);
    assert_eq!(store.write_batches(), 0);
}

#[tokio::test]
async fn test_baseline_is_reloaded_for_every_save() {
    let store = seeded_store();
    let schema = TableSchema::news();

    // the analyst loaded the page while record 1 was untagged
    let rows = vec![json!({"news_id": "1", "analyst_tag": "urgent"})];

    // another process sets the same tag before the save
    store.insert("1", vec![("analyst_tag", Cell::from("urgent"))]);

    let outcome = save_snapshot(&store, &schema, &rows).await.unwrap();
    assert_eq!(outcome, SaveOutcome::NoChanges);

    save_snapshot(&store, &schema, &rows).await.unwrap();
    assert_eq!(store.baseline_loads(), 2);
}

#[tokio::test]
async fn test_baseline_casts_uuid_columns_to_text() {
    let store = InMemoryStore::new();
    let cat = Uuid::new_v4();
    store.insert("1", vec![("analyst_cat_id", Cell::Uuid(cat))]);

    let baseline = store.load_baseline(&TableSchema::news(), None).await.unwrap();
    let row = baseline.get(&RecordId::from("1")).unwrap();

    assert_eq!(row.get("analyst_cat_id"), Some(&Cell::Text(cat.to_string())));
    assert_eq!(row.get("analyst_remark"), Some(&Cell::Null));
    assert_eq!(row.len(), 7);
}

#[tokio::test]
async fn test_uppercase_category_id_is_saved_once() {
    let store = seeded_store();
    let schema = TableSchema::news();
    let cat = Uuid::new_v4();

    let rows = vec![json!({"news_id": "1", "analyst_cat_id": cat.to_string().to_uppercase()})];

    let first = save_snapshot(&store, &schema, &rows).await.unwrap();
    assert_eq!(first, SaveOutcome::Saved { records: 1, matched: 1 });
    assert_eq!(store.get(&RecordId::from("1"), "analyst_cat_id"), Some(Cell::Uuid(cat)));

    let second = save_snapshot(&store, &schema, &rows).await.unwrap();
    assert_eq!(second, SaveOutcome::NoChanges);
    assert_eq!(store.write_batches(), 1);
}

#[tokio::test]
async fn test_text_keyed_table_keeps_identifiers_verbatim() {
    let schema = TableSchema::new(
        "tickets",
        "ticket_ref",
        ColumnKind::Text,
        vec![EditableField::new("analyst_tag", ColumnKind::Text)],
    )
    .unwrap();
    let store = InMemoryStore::new();
    for id in ["007", "1.0", "true"] {
        store.insert(id, vec![("analyst_tag", Cell::Null)]);
    }

    let rows = vec![
        json!({"ticket_ref": "007", "analyst_tag": "agent"}),
        json!({"ticket_ref": "1.0", "analyst_tag": "release"}),
        json!({"ticket_ref": "true", "analyst_tag": "flag"}),
    ];
    let outcome = save_snapshot(&store, &schema, &rows).await.unwrap();
    assert_eq!(outcome, SaveOutcome::Saved { records: 3, matched: 3 });
    assert_eq!(store.get(&RecordId::from("007"), "analyst_tag"), Some(Cell::from("agent")));
    assert_eq!(store.get(&RecordId::from("1.0"), "analyst_tag"), Some(Cell::from("release")));

    // "7" is a different ticket
    let baseline = store.load_baseline(&schema, Some([RecordId::from("7")].as_slice())).await.unwrap();
    assert!(baseline.is_empty());

    assert_eq!(save_snapshot(&store, &schema, &rows).await.unwrap(), SaveOutcome::NoChanges);
}
