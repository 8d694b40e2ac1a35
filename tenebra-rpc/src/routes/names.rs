use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tenebra_core::{validation, TenebraError};
use tenebra_storage::names;

use crate::error::ApiResult;
use crate::extract::{Meta, Pagination};
use crate::ApiState;

fn clean_name(state: &ApiState, raw: &str) -> String {
    validation::strip_name_suffix(raw, &state.constants.name_suffix).to_string()
}

pub async fn list(State(state): State<ApiState>, Query(page): Query<Pagination>) -> ApiResult {
    let rows = names::list(state.store.pool(), page.limit(), page.offset()).await?;
    let total = names::count(state.store.pool()).await?;
    Ok(Json(json!({
        "ok": true,
        "count": rows.len(),
        "total": total,
        "names": rows,
    })))
}

pub async fn newest(State(state): State<ApiState>, Query(page): Query<Pagination>) -> ApiResult {
    let rows = names::newest(state.store.pool(), page.limit(), page.offset()).await?;
    let total = names::count(state.store.pool()).await?;
    Ok(Json(json!({
        "ok": true,
        "count": rows.len(),
        "total": total,
        "names": rows,
    })))
}

pub async fn cost(State(state): State<ApiState>) -> ApiResult {
    Ok(Json(json!({ "ok": true, "name_cost": state.names.cost() })))
}

pub async fn bonus(State(state): State<ApiState>) -> ApiResult {
    Ok(Json(json!({ "ok": true, "name_bonus": state.names.bonus().await? })))
}

pub async fn check(State(state): State<ApiState>, Path(name): Path<String>) -> ApiResult {
    let name = clean_name(&state, &name);
    if !validation::is_valid_name(&name) {
        return Err(TenebraError::InvalidParameter("name".into()).into());
    }
    let available = names::get(state.store.pool(), &name).await?.is_none();
    Ok(Json(json!({ "ok": true, "available": available })))
}

pub async fn show(State(state): State<ApiState>, Path(name): Path<String>) -> ApiResult {
    let name = clean_name(&state, &name);
    if !validation::is_valid_name_fetch(&name) {
        return Err(TenebraError::InvalidParameter("name".into()).into());
    }
    let row = names::get(state.store.pool(), &name)
        .await?
        .ok_or(TenebraError::NameNotFound)?;
    Ok(Json(json!({ "ok": true, "name": row })))
}

#[derive(Deserialize, Default)]
pub struct PurchaseBody {
    privatekey: Option<String>,
}

pub async fn purchase(
    State(state): State<ApiState>,
    meta: Meta,
    Path(name): Path<String>,
    body: Option<Json<PurchaseBody>>,
) -> ApiResult {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    let privatekey = body
        .privatekey
        .ok_or_else(|| TenebraError::MissingParameter("privatekey".into()))?;
    let name = clean_name(&state, &name);
    let row = state.names.purchase(&meta.0, &privatekey, &name).await?;
    Ok(Json(json!({ "ok": true, "name": row })))
}

#[derive(Deserialize, Default)]
pub struct TransferBody {
    privatekey: Option<String>,
    address: Option<String>,
}

pub async fn transfer(
    State(state): State<ApiState>,
    meta: Meta,
    Path(name): Path<String>,
    body: Option<Json<TransferBody>>,
) -> ApiResult {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    let privatekey = body
        .privatekey
        .ok_or_else(|| TenebraError::MissingParameter("privatekey".into()))?;
    let address = body
        .address
        .ok_or_else(|| TenebraError::MissingParameter("address".into()))?;
    let name = clean_name(&state, &name);
    let row = state.names.transfer(&meta.0, &privatekey, &name, &address).await?;
    Ok(Json(json!({ "ok": true, "name": row })))
}

#[derive(Deserialize, Default)]
pub struct UpdateBody {
    privatekey: Option<String>,
    a: Option<String>,
}

pub async fn update(
    State(state): State<ApiState>,
    meta: Meta,
    Path(name): Path<String>,
    body: Option<Json<UpdateBody>>,
) -> ApiResult {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    let privatekey = body
        .privatekey
        .ok_or_else(|| TenebraError::MissingParameter("privatekey".into()))?;
    let name = clean_name(&state, &name);
    let row = state
        .names
        .update_a(&meta.0, &privatekey, &name, body.a.as_deref())
        .await?;
    Ok(Json(json!({ "ok": true, "name": row })))
}
