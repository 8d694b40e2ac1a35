use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tenebra_core::TenebraError;
use tenebra_storage::addresses;

use crate::error::ApiResult;
use crate::extract::{Meta, Pagination};
use crate::ApiState;

pub async fn list(State(state): State<ApiState>, Query(page): Query<Pagination>) -> ApiResult {
    let rows = addresses::list_stakes(state.store.pool(), page.limit(), page.offset()).await?;
    let total = addresses::count_stakes(state.store.pool()).await?;
    let stakes: Vec<_> = rows.iter().map(|row| row.stake_info()).collect();
    Ok(Json(json!({
        "ok": true,
        "count": stakes.len(),
        "total": total,
        "stakes": stakes,
    })))
}

pub async fn show(State(state): State<ApiState>, Path(address): Path<String>) -> ApiResult {
    let row = addresses::get(state.store.pool(), &address)
        .await?
        .ok_or(TenebraError::AddressNotFound)?;
    Ok(Json(json!({ "ok": true, "stake": row.stake_info() })))
}

pub async fn validator(State(state): State<ApiState>) -> ApiResult {
    Ok(Json(json!({ "ok": true, "validator": state.state.validator() })))
}

pub async fn penalties(State(state): State<ApiState>, Query(page): Query<Pagination>) -> ApiResult {
    let rows = addresses::list_penalties(state.store.pool(), page.limit(), page.offset()).await?;
    let penalties: Vec<_> = rows
        .iter()
        .map(|row| json!({ "address": row.address, "amount": row.penalty }))
        .collect();
    Ok(Json(json!({
        "ok": true,
        "count": penalties.len(),
        "penalties": penalties,
    })))
}

#[derive(Deserialize, Default)]
pub struct StakeBody {
    privatekey: Option<String>,
    amount: Option<i64>,
}

pub async fn deposit(
    State(state): State<ApiState>,
    meta: Meta,
    body: Option<Json<StakeBody>>,
) -> ApiResult {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    let privatekey = body
        .privatekey
        .ok_or_else(|| TenebraError::MissingParameter("privatekey".into()))?;
    let amount = body
        .amount
        .ok_or_else(|| TenebraError::MissingParameter("amount".into()))?;
    let stake = state.staking.deposit(&meta.0, &privatekey, amount).await?;
    Ok(Json(json!({ "ok": true, "stake": stake })))
}

pub async fn withdraw(
    State(state): State<ApiState>,
    meta: Meta,
    body: Option<Json<StakeBody>>,
) -> ApiResult {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    let privatekey = body
        .privatekey
        .ok_or_else(|| TenebraError::MissingParameter("privatekey".into()))?;
    let amount = body
        .amount
        .ok_or_else(|| TenebraError::MissingParameter("amount".into()))?;
    let stake = state.staking.withdraw(&meta.0, &privatekey, amount).await?;
    Ok(Json(json!({ "ok": true, "stake": stake })))
}
