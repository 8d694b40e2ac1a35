use axum::extract::{Path, Query, State};
use axum::Json;
use serde_json::json;
use tenebra_core::{validation, TenebraError};
use tenebra_storage::{addresses, blocks, names, transactions};

use crate::error::ApiResult;
use crate::extract::SortedQuery;
use crate::ApiState;

/// Bulk address fetch: comma-separated, at most 128 per request.
pub async fn addresses(
    State(state): State<ApiState>,
    Path(raw): Path<String>,
) -> ApiResult {
    let wanted: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    if wanted.is_empty() || wanted.len() > 128 {
        return Err(TenebraError::InvalidParameter("addresses".into()).into());
    }
    if wanted.iter().any(|a| !validation::is_valid_address(a)) {
        return Err(TenebraError::InvalidParameter("addresses".into()).into());
    }

    let rows = addresses::get_many(state.store.pool(), &wanted).await?;
    let mut found = serde_json::Map::new();
    for row in &rows {
        found.insert(row.address.clone(), serde_json::to_value(row).unwrap_or_default());
    }
    // Requested-but-unknown addresses come back as explicit nulls.
    for address in &wanted {
        found.entry(address.clone()).or_insert(serde_json::Value::Null);
    }
    Ok(Json(json!({
        "ok": true,
        "found": rows.len(),
        "notFound": wanted.len() - rows.len(),
        "addresses": found,
    })))
}

pub async fn blocks(State(state): State<ApiState>, Query(query): Query<SortedQuery>) -> ApiResult {
    let page = query.pagination();
    let order_by = query.order_by.as_deref().unwrap_or("id");
    let rows = blocks::list_sorted(
        state.store.pool(),
        order_by,
        query.ascending(),
        page.limit(),
        page.offset(),
    )
    .await?;
    let total = blocks::count(state.store.pool()).await?;
    Ok(Json(json!({
        "ok": true,
        "count": rows.len(),
        "total": total,
        "blocks": rows,
    })))
}

pub async fn transactions(
    State(state): State<ApiState>,
    Query(query): Query<SortedQuery>,
) -> ApiResult {
    let page = query.pagination();
    let order_by = query.order_by.as_deref().unwrap_or("id");
    let rows = transactions::list_sorted(
        state.store.pool(),
        order_by,
        query.ascending(),
        page.limit(),
        page.offset(),
    )
    .await?;
    let total = transactions::count(state.store.pool()).await?;
    Ok(Json(json!({
        "ok": true,
        "count": rows.len(),
        "total": total,
        "transactions": rows,
    })))
}

pub async fn names(State(state): State<ApiState>, Query(query): Query<SortedQuery>) -> ApiResult {
    let page = query.pagination();
    let order_by = query.order_by.as_deref().unwrap_or("name");
    let rows = names::list_sorted(
        state.store.pool(),
        order_by,
        query.ascending(),
        page.limit(),
        page.offset(),
    )
    .await?;
    let total = names::count(state.store.pool()).await?;
    Ok(Json(json!({
        "ok": true,
        "count": rows.len(),
        "total": total,
        "names": rows,
    })))
}
