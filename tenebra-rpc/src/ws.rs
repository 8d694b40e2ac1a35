use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use tenebra_core::{validation, Event, EventSink, SubscriptionLevel, TenebraError};
use tenebra_ledger::{auth, RequestMeta};
use tenebra_storage::{addresses, names};
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::Meta;
use crate::ApiState;

/// Tokens are single-use and short-lived; a client is expected to connect
/// immediately after `/ws/start`.
const TOKEN_TTL: Duration = Duration::from_secs(30);
const KEEPALIVE_SECS: u64 = 10;
/// Per-hub event buffer. A consumer that falls this far behind starts losing
/// events (logged) rather than blocking the broadcaster.
const EVENT_BUFFER: usize = 512;

struct PendingSession {
    address: Option<String>,
    issued: Instant,
}

/// Fan-out hub. Engines emit committed events here; each live session holds
/// a broadcast receiver and applies its own subscription filter.
pub struct WsHub {
    events: broadcast::Sender<Event>,
    tokens: Mutex<HashMap<String, PendingSession>>,
}

impl WsHub {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self { events, tokens: Mutex::new(HashMap::new()) }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub fn issue_token(&self, address: Option<String>) -> String {
        let token = Uuid::new_v4().to_string();
        let mut tokens = self.tokens.lock();
        tokens.retain(|_, pending| pending.issued.elapsed() < TOKEN_TTL);
        tokens.insert(token.clone(), PendingSession { address, issued: Instant::now() });
        token
    }

    fn claim_token(&self, token: &str) -> Result<Option<String>, TenebraError> {
        let mut tokens = self.tokens.lock();
        match tokens.remove(token) {
            Some(pending) if pending.issued.elapsed() < TOKEN_TTL => Ok(pending.address),
            _ => Err(TenebraError::InvalidToken),
        }
    }
}

impl Default for WsHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for WsHub {
    fn emit(&self, event: Event) {
        // A send error only means nobody is connected.
        let _ = self.events.send(event);
    }
}

#[derive(Deserialize, Default)]
pub struct StartBody {
    privatekey: Option<String>,
}

/// Hands out a single-use gateway URL, optionally pre-authenticated.
pub async fn start(
    State(state): State<ApiState>,
    meta: Meta,
    body: Option<Json<StartBody>>,
) -> ApiResult {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    let address = match body.privatekey.as_deref() {
        Some(privatekey) => Some(
            auth::authenticate(&state.store, &meta.0, privatekey, &state.constants)
                .await?
                .address,
        ),
        None => None,
    };
    let token = state.hub.issue_token(address);
    let scheme = if state.config.is_production() { "wss" } else { "ws" };
    Ok(Json(json!({
        "ok": true,
        "url": format!("{scheme}://{}/ws/gateway/{token}", state.config.public_url),
        "expires": TOKEN_TTL.as_secs(),
    })))
}

pub async fn gateway(
    State(state): State<ApiState>,
    Path(token): Path<String>,
    meta: Meta,
    ws: WebSocketUpgrade,
) -> Response {
    match state.hub.claim_token(&token) {
        Ok(address) => ws.on_upgrade(move |socket| run_session(state, socket, address, meta.0)),
        Err(err) => ApiError(err).into_response(),
    }
}

struct Session {
    address: Option<String>,
    subscriptions: HashSet<SubscriptionLevel>,
}

impl Session {
    fn new(address: Option<String>) -> Self {
        Self {
            address,
            subscriptions: [SubscriptionLevel::Blocks, SubscriptionLevel::OwnTransactions]
                .into_iter()
                .collect(),
        }
    }

    fn levels(&self) -> Vec<&'static str> {
        self.subscriptions.iter().map(|l| l.as_str()).collect()
    }
}

async fn run_session(
    state: ApiState,
    socket: WebSocket,
    address: Option<String>,
    meta: RequestMeta,
) {
    let (mut tx, mut rx) = socket.split();
    let mut events = state.hub.subscribe();
    let mut session = Session::new(address);
    let mut keepalive = tokio::time::interval(Duration::from_secs(KEEPALIVE_SECS));

    let (motd, motd_set) = state.state.motd();
    let hello = json!({
        "ok": true,
        "type": "hello",
        "server_time": Utc::now(),
        "motd": motd,
        "motd_set": motd_set,
        "work": state.state.work(),
    });
    if tx.send(Message::Text(hello.to_string())).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            incoming = rx.next() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(_)) => break,
                };
                let response = handle_message(&state, &mut session, &meta, &text).await;
                if tx.send(Message::Text(response.to_string())).await.is_err() {
                    break;
                }
            }
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        if event.delivered_to(&session.subscriptions, session.address.as_deref()) {
                            let message = event.to_message();
                            if tx.send(Message::Text(message.to_string())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "slow websocket consumer dropped events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = keepalive.tick() => {
                let message = json!({ "type": "keepalive", "server_time": Utc::now() });
                if tx.send(Message::Text(message.to_string())).await.is_err() {
                    break;
                }
            }
        }
    }
    debug!("websocket session closed");
}

fn ok_response(id: Option<i64>, responding_to: &str, mut extra: Value) -> Value {
    let mut response = json!({
        "ok": true,
        "id": id,
        "type": "response",
        "responding_to": responding_to,
    });
    if let (Some(target), Some(fields)) = (response.as_object_mut(), extra.as_object_mut()) {
        for (key, value) in fields {
            target.insert(key.clone(), value.take());
        }
    }
    response
}

fn error_response(id: Option<i64>, responding_to: &str, err: &TenebraError) -> Value {
    let mut response = json!({
        "ok": false,
        "id": id,
        "type": "response",
        "responding_to": responding_to,
        "error": err.error_string(),
        "message": err.to_string(),
    });
    if let Some(parameter) = err.parameter() {
        response["parameter"] = json!(parameter);
    }
    response
}

fn str_param(message: &Value, key: &str) -> Option<String> {
    message.get(key).and_then(Value::as_str).map(String::from)
}

async fn handle_message(
    state: &ApiState,
    session: &mut Session,
    meta: &RequestMeta,
    text: &str,
) -> Value {
    let Ok(message) = serde_json::from_str::<Value>(text) else {
        return error_response(None, "unknown", &TenebraError::InvalidParameter("message".into()));
    };
    let id = message.get("id").and_then(Value::as_i64);
    let Some(message_type) = message.get("type").and_then(Value::as_str).map(String::from) else {
        return error_response(id, "unknown", &TenebraError::MissingParameter("type".into()));
    };

    match dispatch(state, session, meta, &message_type, &message).await {
        Ok(extra) => ok_response(id, &message_type, extra),
        Err(err) => error_response(id, &message_type, &err),
    }
}

async fn dispatch(
    state: &ApiState,
    session: &mut Session,
    meta: &RequestMeta,
    message_type: &str,
    message: &Value,
) -> Result<Value, TenebraError> {
    match message_type {
        "subscribe" => {
            let event = str_param(message, "event")
                .ok_or_else(|| TenebraError::MissingParameter("event".into()))?;
            let level = SubscriptionLevel::parse(&event)
                .ok_or_else(|| TenebraError::InvalidParameter("event".into()))?;
            session.subscriptions.insert(level);
            Ok(json!({ "subscription_level": session.levels() }))
        }
        "unsubscribe" => {
            let event = str_param(message, "event")
                .ok_or_else(|| TenebraError::MissingParameter("event".into()))?;
            let level = SubscriptionLevel::parse(&event)
                .ok_or_else(|| TenebraError::InvalidParameter("event".into()))?;
            session.subscriptions.remove(&level);
            Ok(json!({ "subscription_level": session.levels() }))
        }
        "get_subscription_level" => Ok(json!({ "subscription_level": session.levels() })),
        "address" => {
            let address = str_param(message, "address")
                .ok_or_else(|| TenebraError::MissingParameter("address".into()))?;
            if !validation::is_valid_address(&address) {
                return Err(TenebraError::InvalidParameter("address".into()));
            }
            let row = addresses::get(state.store.pool(), &address)
                .await?
                .ok_or(TenebraError::AddressNotFound)?;
            let mut body = serde_json::to_value(&row).unwrap_or_default();
            if message.get("fetchNames").and_then(Value::as_bool).unwrap_or(false) {
                body["names"] = json!(names::count_by_owner(state.store.pool(), &address).await?);
            }
            Ok(json!({ "address": body }))
        }
        "login" => {
            let privatekey = str_param(message, "privatekey")
                .ok_or_else(|| TenebraError::MissingParameter("privatekey".into()))?;
            let row = auth::authenticate(&state.store, meta, &privatekey, &state.constants).await?;
            session.address = Some(row.address.clone());
            Ok(json!({ "isGuest": false, "address": row }))
        }
        "logout" => {
            session.address = None;
            Ok(json!({ "isGuest": true }))
        }
        "me" => match session.address.as_deref() {
            None => Ok(json!({ "isGuest": true })),
            Some(address) => {
                let row = addresses::get(state.store.pool(), address)
                    .await?
                    .ok_or(TenebraError::AddressNotFound)?;
                Ok(json!({ "isGuest": false, "address": row }))
            }
        },
        "work" => Ok(json!({ "work": state.state.work() })),
        "stake" => {
            let address = session.address.as_deref().ok_or(TenebraError::AuthFailed)?;
            let row = addresses::get(state.store.pool(), address)
                .await?
                .ok_or(TenebraError::AddressNotFound)?;
            Ok(json!({ "stake": row.stake_info() }))
        }
        "submit_block" => {
            let address = str_param(message, "address")
                .or_else(|| session.address.clone())
                .ok_or_else(|| TenebraError::MissingParameter("address".into()))?;
            let nonce = message
                .get("nonce")
                .and_then(crate::routes::blocks::parse_nonce)
                .ok_or_else(|| TenebraError::MissingParameter("nonce".into()))?;
            let (block, new_work) = state.blocks.submit(meta, &address, &nonce).await?;
            Ok(json!({ "success": true, "work": new_work, "address": block.address, "block": block }))
        }
        "make_transaction" => {
            let privatekey = str_param(message, "privatekey")
                .ok_or_else(|| TenebraError::MissingParameter("privatekey".into()))?;
            let to = str_param(message, "to")
                .ok_or_else(|| TenebraError::MissingParameter("to".into()))?;
            let amount = message
                .get("amount")
                .and_then(Value::as_i64)
                .ok_or_else(|| TenebraError::MissingParameter("amount".into()))?;
            let metadata = str_param(message, "metadata");
            let transaction = state
                .transactions
                .send(meta, &privatekey, &to, amount, metadata.as_deref())
                .await?;
            Ok(json!({ "transaction": transaction }))
        }
        _ => Err(TenebraError::InvalidParameter("type".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_single_use() {
        let hub = WsHub::new();
        let token = hub.issue_token(Some("t74tq2hsh6".into()));
        assert_eq!(hub.claim_token(&token).unwrap(), Some("t74tq2hsh6".into()));
        assert!(hub.claim_token(&token).is_err());
        assert!(hub.claim_token("not-a-token").is_err());
    }

    #[test]
    fn default_subscriptions() {
        let session = Session::new(None);
        assert!(session.subscriptions.contains(&SubscriptionLevel::Blocks));
        assert!(session.subscriptions.contains(&SubscriptionLevel::OwnTransactions));
        assert!(!session.subscriptions.contains(&SubscriptionLevel::Names));
    }
}
