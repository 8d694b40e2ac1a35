use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tenebra_core::{validation, TenebraError};
use tenebra_storage::{addresses, names, transactions};

use crate::error::ApiResult;
use crate::extract::Pagination;
use crate::ApiState;

pub async fn list(State(state): State<ApiState>, Query(page): Query<Pagination>) -> ApiResult {
    let rows = addresses::list(state.store.pool(), page.limit(), page.offset()).await?;
    let total = addresses::count(state.store.pool()).await?;
    Ok(Json(json!({
        "ok": true,
        "count": rows.len(),
        "total": total,
        "addresses": rows,
    })))
}

pub async fn rich(State(state): State<ApiState>, Query(page): Query<Pagination>) -> ApiResult {
    let rows = addresses::rich(state.store.pool(), page.limit(), page.offset()).await?;
    let total = addresses::count(state.store.pool()).await?;
    Ok(Json(json!({
        "ok": true,
        "count": rows.len(),
        "total": total,
        "addresses": rows,
    })))
}

#[derive(Deserialize)]
pub struct ShowQuery {
    #[serde(rename = "fetchNames")]
    fetch_names: Option<bool>,
}

pub async fn show(
    State(state): State<ApiState>,
    Path(address): Path<String>,
    Query(query): Query<ShowQuery>,
) -> ApiResult {
    if !validation::is_valid_address(&address) {
        return Err(TenebraError::InvalidParameter("address".into()).into());
    }
    let row = addresses::get(state.store.pool(), &address)
        .await?
        .ok_or(TenebraError::AddressNotFound)?;
    let mut body = serde_json::to_value(&row).unwrap_or_default();
    if query.fetch_names.unwrap_or(false) {
        let count = names::count_by_owner(state.store.pool(), &address).await?;
        body["names"] = json!(count);
    }
    Ok(Json(json!({ "ok": true, "address": body })))
}

pub async fn transactions(
    State(state): State<ApiState>,
    Path(address): Path<String>,
    Query(page): Query<Pagination>,
) -> ApiResult {
    if addresses::get(state.store.pool(), &address).await?.is_none() {
        return Err(TenebraError::AddressNotFound.into());
    }
    let rows = transactions::list_by_address(
        state.store.pool(),
        &address,
        page.limit(),
        page.offset(),
        false,
    )
    .await?;
    let total = transactions::count_by_address(state.store.pool(), &address).await?;
    Ok(Json(json!({
        "ok": true,
        "count": rows.len(),
        "total": total,
        "transactions": rows,
    })))
}

pub async fn names(
    State(state): State<ApiState>,
    Path(address): Path<String>,
    Query(page): Query<Pagination>,
) -> ApiResult {
    if addresses::get(state.store.pool(), &address).await?.is_none() {
        return Err(TenebraError::AddressNotFound.into());
    }
    let rows =
        names::list_by_owner(state.store.pool(), &address, page.limit(), page.offset()).await?;
    let total = names::count_by_owner(state.store.pool(), &address).await?;
    Ok(Json(json!({
        "ok": true,
        "count": rows.len(),
        "total": total,
        "names": rows,
    })))
}
