use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tenebra_core::TenebraError;
use tenebra_storage::blocks;

use crate::error::ApiResult;
use crate::extract::{Meta, Pagination};
use crate::ApiState;

pub async fn list(State(state): State<ApiState>, Query(page): Query<Pagination>) -> ApiResult {
    let rows = blocks::list(state.store.pool(), page.limit(), page.offset(), true).await?;
    let total = blocks::count(state.store.pool()).await?;
    Ok(Json(json!({
        "ok": true,
        "count": rows.len(),
        "total": total,
        "blocks": rows,
    })))
}

pub async fn last(State(state): State<ApiState>) -> ApiResult {
    let block = blocks::last(state.store.pool())
        .await?
        .ok_or(TenebraError::BlockNotFound)?;
    Ok(Json(json!({ "ok": true, "block": block })))
}

pub async fn show(State(state): State<ApiState>, Path(height): Path<String>) -> ApiResult {
    let height: i64 = height
        .parse()
        .map_err(|_| TenebraError::InvalidParameter("height".into()))?;
    let block = blocks::get(state.store.pool(), height)
        .await?
        .ok_or(TenebraError::BlockNotFound)?;
    Ok(Json(json!({ "ok": true, "block": block })))
}

#[derive(Deserialize, Default)]
pub struct SubmitBody {
    address: Option<String>,
    nonce: Option<serde_json::Value>,
}

/// The nonce arrives either as a string (taken as raw bytes) or as an array
/// of byte values.
pub(crate) fn parse_nonce(raw: &serde_json::Value) -> Option<Vec<u8>> {
    match raw {
        serde_json::Value::String(s) => Some(s.as_bytes().to_vec()),
        serde_json::Value::Array(items) => items
            .iter()
            .map(|v| v.as_u64().and_then(|n| u8::try_from(n).ok()))
            .collect(),
        _ => None,
    }
}

pub async fn submit(
    State(state): State<ApiState>,
    meta: Meta,
    body: Option<Json<SubmitBody>>,
) -> ApiResult {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    let address = body
        .address
        .ok_or_else(|| TenebraError::MissingParameter("address".into()))?;
    let nonce = body
        .nonce
        .as_ref()
        .ok_or_else(|| TenebraError::MissingParameter("nonce".into()))?;
    let nonce = parse_nonce(nonce).ok_or_else(|| TenebraError::InvalidParameter("nonce".into()))?;

    let (block, new_work) = state.blocks.submit(&meta.0, &address, &nonce).await?;
    Ok(Json(json!({
        "ok": true,
        "success": true,
        "work": new_work,
        "address": block.address,
        "block": block,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonce_accepts_strings_and_byte_arrays() {
        assert_eq!(parse_nonce(&json!("abc")), Some(b"abc".to_vec()));
        assert_eq!(parse_nonce(&json!([0, 1, 255])), Some(vec![0, 1, 255]));
        assert_eq!(parse_nonce(&json!([0, 256])), None);
        assert_eq!(parse_nonce(&json!(12)), None);
    }
}
