use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::state::SharedState;

pub async fn list_rules(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let rules: Vec<serde_json::Value> = state
        .engine
        .rules()
        .list()
        .iter()
        .map(|r| {
            json!({
                "name": r.name(),
                "active": r.is_active(),
            })
        })
        .collect();

    Json(json!({ "rules": rules }))
}
