use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tenebra_core::{validation, TenebraError};
use tenebra_storage::transactions::SearchKind;
use tenebra_storage::{addresses, blocks, names, transactions};

use crate::error::ApiResult;
use crate::extract::Pagination;
use crate::ApiState;

pub async fn supply(State(state): State<ApiState>) -> ApiResult {
    let supply = addresses::supply(state.store.pool()).await?;
    Ok(Json(json!({ "ok": true, "supply": supply })))
}

/// Aggregated node status: message of the day, feature flags, the last
/// block, and every protocol constant a wallet needs.
pub async fn motd(State(state): State<ApiState>) -> ApiResult {
    let (motd, motd_set) = state.state.motd();
    let last_block = blocks::last(state.store.pool()).await?;
    let constants = &state.constants;
    Ok(Json(json!({
        "ok": true,
        "motd": motd,
        "motd_set": motd_set,
        "public_url": state.config.public_url,
        "mining_enabled": state.state.mining_enabled(),
        "staking_enabled": state.state.staking_enabled(),
        "debug_mode": !state.config.is_production(),
        "work": state.state.work(),
        "last_block": last_block,
        "package": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "licence": "Apache-2.0",
        },
        "constants": {
            "wallet_version": constants.wallet_version,
            "nonce_max_size": constants.nonce_max_size,
            "name_cost": constants.name_cost,
            "min_work": constants.min_work,
            "max_work": constants.max_work,
            "work_factor": constants.work_factor,
            "seconds_per_block": constants.seconds_per_block,
            "validator_penalty": constants.validator_penalty,
        },
        "currency": {
            "address_prefix": constants.address_prefix,
            "name_suffix": constants.name_suffix,
            "currency_name": "Tenebra",
            "currency_symbol": "TST",
        },
    })))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    q: Option<String>,
}

/// Exact-match search across the four entity kinds.
pub async fn search(State(state): State<ApiState>, Query(query): Query<SearchQuery>) -> ApiResult {
    let raw = query
        .q
        .ok_or_else(|| TenebraError::MissingParameter("q".into()))?;
    let raw = raw.trim();
    let name_query = validation::strip_name_suffix(raw, &state.constants.name_suffix);

    let address = if validation::is_valid_address(raw) {
        addresses::get(state.store.pool(), raw).await?
    } else {
        None
    };
    let name = if validation::is_valid_name_fetch(name_query) {
        names::get(state.store.pool(), name_query).await?
    } else {
        None
    };
    let (block, transaction) = match raw.parse::<i64>() {
        Ok(id) if id > 0 => (
            blocks::get(state.store.pool(), id).await?,
            transactions::get(state.store.pool(), id).await?,
        ),
        _ => (None, None),
    };

    Ok(Json(json!({
        "ok": true,
        "query": {
            "originalQuery": raw,
            "matchAddress": address.is_some(),
            "matchName": name.is_some(),
            "matchBlock": block.is_some(),
            "matchTransaction": transaction.is_some(),
        },
        "matches": {
            "exactAddress": address,
            "exactName": name,
            "exactBlock": block,
            "exactTransaction": transaction,
        },
    })))
}

/// Counts of transactions matching the query per facet; the result lists
/// live under `/search/extended/results/transactions/:kind`.
pub async fn search_extended(
    State(state): State<ApiState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult {
    let raw = query
        .q
        .ok_or_else(|| TenebraError::MissingParameter("q".into()))?;
    let raw = raw.trim();
    let name_query = validation::strip_name_suffix(raw, &state.constants.name_suffix);

    let by_address = if validation::is_valid_address(raw) {
        transactions::search_count(state.store.pool(), SearchKind::Address, raw).await?
    } else {
        0
    };
    let by_name = if validation::is_valid_name(name_query) {
        transactions::search_count(state.store.pool(), SearchKind::Name, name_query).await?
    } else {
        0
    };
    let by_metadata = if raw.len() >= 3 {
        transactions::search_count(state.store.pool(), SearchKind::Metadata, raw).await?
    } else {
        0
    };

    Ok(Json(json!({
        "ok": true,
        "query": { "originalQuery": raw },
        "matches": {
            "transactions": {
                "addressInvolved": by_address,
                "nameInvolved": by_name,
                "metadata": by_metadata,
            },
        },
    })))
}

pub async fn search_transactions(
    State(state): State<ApiState>,
    Path(kind): Path<String>,
    Query(page): Query<Pagination>,
    Query(query): Query<SearchQuery>,
) -> ApiResult {
    let kind = SearchKind::parse(&kind)
        .ok_or_else(|| TenebraError::InvalidParameter("type".into()))?;
    let raw = query
        .q
        .ok_or_else(|| TenebraError::MissingParameter("q".into()))?;
    let raw = raw.trim();
    let query_value = match kind {
        SearchKind::Name => validation::strip_name_suffix(raw, &state.constants.name_suffix),
        _ => raw,
    };

    let rows = transactions::search(
        state.store.pool(),
        kind,
        query_value,
        page.limit(),
        page.offset(),
    )
    .await?;
    let total = transactions::search_count(state.store.pool(), kind, query_value).await?;
    Ok(Json(json!({
        "ok": true,
        "count": rows.len(),
        "total": total,
        "transactions": rows,
    })))
}
