use catalog::{CategoryEntry, CategoryLookup};
use reconcile::{Cell, InMemoryStore, RecordId, TableSchema, save_snapshot};
use serde_json::json;
use uuid::Uuid;

#[tokio::main]
async fn main() {
    println!("=== Save Demo: grid snapshot -> minimal transactional update ===\n");

    let schema = TableSchema::news();
    let store = InMemoryStore::new();

    let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
    for id in &ids {
        store.insert(*id, vec![("analyst_risk_level", Cell::Int(2)), ("analyst_dup", Cell::Null)]);
    }

    let fraud_id = Uuid::new_v4();
    let categories = CategoryLookup::from_entries(vec![
        CategoryEntry {
            category_id: fraud_id,
            category_name: Some("Fraud".into()),
            risk_level: Some(4),
            risk_rating: Some("High".into()),
        },
        CategoryEntry {
            category_id: Uuid::new_v4(),
            category_name: Some("Litigation".into()),
            risk_level: Some(2),
            risk_rating: Some("Medium".into()),
        },
    ]);
    println!("Categories: {:?}", categories.options());

    // 1. What the grid holds after page load (loosely typed)
    let mut rows: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| json!({"news_id": id.to_string(), "analyst_risk_level": "2", "analyst_dup": "", "headline": "..."}))
        .collect();

    println!("\n--- Save without edits ---");
    let outcome = save_snapshot(&store, &schema, &rows).await.unwrap();
    println!("{}", outcome.message());

    // 2. Analyst flags a duplicate and picks a category on another row
    println!("\n--- Edit two rows ---");
    rows[0]["analyst_dup"] = json!("true");
    if let Some(row) = rows[2].as_object_mut() {
        categories.apply_to_row(row, "Fraud");
    }
    let outcome = save_snapshot(&store, &schema, &rows).await.unwrap();
    println!("{}", outcome.message());

    let third = RecordId::from(ids[2]);
    println!("  row 3 category id: {:?}", store.get(&third, "analyst_cat_id"));
    println!("  row 3 risk level:  {:?}", store.get(&third, "analyst_risk_level"));

    // 3. Same snapshot again
    println!("\n--- Save again ---");
    let outcome = save_snapshot(&store, &schema, &rows).await.unwrap();
    println!("{}", outcome.message());

    // 4. A bad value in the last changed row aborts the whole batch
    println!("\n--- Atomicity ---");
    rows[0]["analyst_tag"] = json!("watch");
    rows[1]["analyst_risk_level"] = json!("severe");
    match save_snapshot(&store, &schema, &rows).await {
        Ok(o) => println!("unexpected: {}", o.message()),
        Err(e) => println!("rejected: {e}"),
    }
    let first = RecordId::from(ids[0]);
    println!("  row 1 tag after failed save: {:?}", store.get(&first, "analyst_tag"));
    println!("  write transactions opened: {}", store.write_batches());
}
