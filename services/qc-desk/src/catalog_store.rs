use anyhow::{Context, Result};
use catalog::{CategoryEntry, CategoryLookup};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct CategoryRow {
    category_id: Uuid,
    category_name: Option<String>,
    risk_level: Option<i32>,
    risk_rating: Option<String>,
}

pub async fn load_categories(pool: &PgPool) -> Result<CategoryLookup> {
    let rows: Vec<CategoryRow> = sqlx::query_as(
        r#"
        SELECT category_id, category_name, risk_level, risk_rating
        FROM categories
        "#
    )
    .fetch_all(pool)
    .await
    .context("Failed to load categories")?;

    Ok(CategoryLookup::from_entries(rows.into_iter().map(|r| CategoryEntry {
        category_id: r.category_id,
        category_name: r.category_name,
        risk_level: r.risk_level,
        risk_rating: r.risk_rating,
    })))
}
