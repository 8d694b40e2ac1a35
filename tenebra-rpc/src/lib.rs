pub mod error;
pub mod extract;
pub mod routes;
pub mod ws;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tenebra_config::{Constants, NodeConfig};
use tenebra_consensus::{BlockEngine, StakingEngine};
use tenebra_ledger::{NameEngine, TransactionEngine};
use tenebra_storage::{FastState, PgStore};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use ws::WsHub;

/// Everything the handlers need, cloned per request.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<PgStore>,
    pub state: Arc<FastState>,
    pub constants: Arc<Constants>,
    pub config: Arc<NodeConfig>,
    pub hub: Arc<WsHub>,
    pub transactions: Arc<TransactionEngine>,
    pub names: Arc<NameEngine>,
    pub blocks: Arc<BlockEngine>,
    pub staking: Arc<StakingEngine>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/addresses", get(routes::addresses::list))
        .route("/addresses/rich", get(routes::addresses::rich))
        .route("/addresses/:address", get(routes::addresses::show))
        .route("/addresses/:address/transactions", get(routes::addresses::transactions))
        .route("/addresses/:address/names", get(routes::addresses::names))
        .route("/blocks", get(routes::blocks::list))
        .route("/blocks/last", get(routes::blocks::last))
        .route("/blocks/:height", get(routes::blocks::show))
        .route("/submit_block", post(routes::blocks::submit))
        .route("/transactions", get(routes::transactions::list).post(routes::transactions::create))
        .route("/transactions/latest", get(routes::transactions::latest))
        .route("/transactions/:id", get(routes::transactions::show))
        .route("/names", get(routes::names::list))
        .route("/names/new", get(routes::names::newest))
        .route("/names/cost", get(routes::names::cost))
        .route("/names/bonus", get(routes::names::bonus))
        .route("/names/check/:name", get(routes::names::check))
        .route("/names/:name", get(routes::names::show).post(routes::names::purchase))
        .route("/names/:name/transfer", post(routes::names::transfer))
        .route("/names/:name/update", post(routes::names::update).put(routes::names::update))
        .route("/staking", get(routes::staking::list).post(routes::staking::deposit))
        .route("/staking/validator", get(routes::staking::validator))
        .route("/staking/penalties", get(routes::staking::penalties))
        .route("/staking/withdraw", post(routes::staking::withdraw))
        .route("/staking/:address", get(routes::staking::show))
        .route("/work", get(routes::work::current))
        .route("/work/day", get(routes::work::day))
        .route("/work/detailed", get(routes::work::detailed))
        .route("/supply", get(routes::misc::supply))
        .route("/motd", get(routes::misc::motd))
        .route("/search", get(routes::misc::search))
        .route("/search/extended", get(routes::misc::search_extended))
        .route(
            "/search/extended/results/transactions/:kind",
            get(routes::misc::search_transactions),
        )
        .route("/lookup/addresses/:addresses", get(routes::lookup::addresses))
        .route("/lookup/blocks", get(routes::lookup::blocks))
        .route("/lookup/transactions", get(routes::lookup::transactions))
        .route("/lookup/names", get(routes::lookup::names))
        .route("/ws/start", post(ws::start))
        .route("/ws/gateway/:token", get(ws::gateway))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: ApiState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("http listening on {addr}");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}
