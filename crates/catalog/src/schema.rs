use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row of the `categories` reference table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub category_id: Uuid,
    pub category_name: Option<String>,
    pub risk_level: Option<i32>,
    pub risk_rating: Option<String>,
}

/// What a category selection fills in on a news row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub risk_level: Option<i32>,
    pub risk_rating: Option<String>,
    pub category_id: String, // uuid as sent to the grid
}
