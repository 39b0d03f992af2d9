use std::collections::BTreeMap;

use axum::{extract::State, Json};
use catalog::CategoryInfo;
use serde::Serialize;

use crate::state::SharedState;

#[derive(Serialize)]
pub struct CategoriesResponse {
    pub options: Vec<String>,
    pub lookup: BTreeMap<String, CategoryInfo>,
}

pub async fn get_categories(State(state): State<SharedState>) -> Json<CategoriesResponse> {
    let cats = &state.categories;
    let options: Vec<String> = cats.options().into_iter().map(str::to_string).collect();
    let lookup = options
        .iter()
        .filter_map(|name| cats.get(name).map(|info| (name.clone(), info.clone())))
        .collect();
    Json(CategoriesResponse { options, lookup })
}
