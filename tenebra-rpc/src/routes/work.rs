use axum::extract::State;
use axum::Json;
use serde_json::json;
use tenebra_consensus::work::base_block_value;
use tenebra_storage::{addresses, blocks, names};

use crate::error::ApiResult;
use crate::ApiState;

pub async fn current(State(state): State<ApiState>) -> ApiResult {
    Ok(Json(json!({ "ok": true, "work": state.state.work() })))
}

pub async fn day(State(state): State<ApiState>) -> ApiResult {
    Ok(Json(json!({ "ok": true, "work": state.state.work_over_time() })))
}

pub async fn detailed(State(state): State<ApiState>) -> ApiResult {
    let unpaid_names = names::count_unpaid(state.store.pool()).await?;
    let unpaid_penalties = addresses::count_unpaid_penalties(state.store.pool()).await?;
    let last_height = blocks::last(state.store.pool())
        .await?
        .map(|block| block.id)
        .unwrap_or(0);
    let base = base_block_value(last_height);
    Ok(Json(json!({
        "ok": true,
        "work": state.state.work(),
        "unpaid_names": unpaid_names,
        "unpaid_penalties": unpaid_penalties,
        "base_value": base,
        "block_value": base + unpaid_names + unpaid_penalties,
    })))
}
