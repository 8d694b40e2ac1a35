use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tenebra_core::TenebraError;
use tenebra_storage::transactions;

use crate::error::ApiResult;
use crate::extract::{Meta, Pagination};
use crate::ApiState;

pub async fn list(State(state): State<ApiState>, Query(page): Query<Pagination>) -> ApiResult {
    let rows = transactions::list(state.store.pool(), page.limit(), page.offset(), true).await?;
    let total = transactions::count(state.store.pool()).await?;
    Ok(Json(json!({
        "ok": true,
        "count": rows.len(),
        "total": total,
        "transactions": rows,
    })))
}

pub async fn latest(State(state): State<ApiState>, Query(page): Query<Pagination>) -> ApiResult {
    let rows = transactions::list(state.store.pool(), page.limit(), page.offset(), false).await?;
    let total = transactions::count(state.store.pool()).await?;
    Ok(Json(json!({
        "ok": true,
        "count": rows.len(),
        "total": total,
        "transactions": rows,
    })))
}

pub async fn show(State(state): State<ApiState>, Path(id): Path<String>) -> ApiResult {
    let id: i64 = id
        .parse()
        .map_err(|_| TenebraError::InvalidParameter("id".into()))?;
    let transaction = transactions::get(state.store.pool(), id)
        .await?
        .ok_or(TenebraError::TransactionNotFound)?;
    Ok(Json(json!({ "ok": true, "transaction": transaction })))
}

#[derive(Deserialize, Default)]
pub struct CreateBody {
    privatekey: Option<String>,
    to: Option<String>,
    amount: Option<i64>,
    metadata: Option<String>,
}

pub async fn create(
    State(state): State<ApiState>,
    meta: Meta,
    body: Option<Json<CreateBody>>,
) -> ApiResult {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    let privatekey = body
        .privatekey
        .ok_or_else(|| TenebraError::MissingParameter("privatekey".into()))?;
    let to = body
        .to
        .ok_or_else(|| TenebraError::MissingParameter("to".into()))?;
    let amount = body
        .amount
        .ok_or_else(|| TenebraError::MissingParameter("amount".into()))?;

    let transaction = state
        .transactions
        .send(&meta.0, &privatekey, &to, amount, body.metadata.as_deref())
        .await?;
    Ok(Json(json!({ "ok": true, "transaction": transaction })))
}
