//! LNURL-pay endpoint and agent directory on an ephemeral local port.
//!
//! Lightning addresses under [`MOCK_DOMAIN`] are discovered over plain http, so tests
//! reach this server by configuring its address as the http proxy of the client.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::{net::TcpListener, task::JoinHandle};

pub const MOCK_DOMAIN: &str = "zapdesk.onion";
pub const KNOWN_AGENT_EMAIL: &str = "agent@support.test";
pub const FALLBACK_ADDRESS: &str = "covertbrian73@walletofsatoshi.com";
pub const MIN_SENDABLE: u64 = 1_000;
pub const MAX_SENDABLE: u64 = 100_000_000;

/// Delay of the `slow` user's discovery response.
pub const SLOW_DISCOVERY: Duration = Duration::from_secs(3);

#[derive(Clone, Default)]
struct MockState {
    discovery_hits: Arc<AtomicUsize>,
    requested_amounts: Arc<Mutex<Vec<u64>>>,
}

pub struct LnurlMock {
    addr: SocketAddr,
    state: MockState,
    server: JoinHandle<()>,
}

impl LnurlMock {
    pub async fn start() -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = MockState::default();

        let app = Router::new()
            .route("/.well-known/lnurlp/:user", get(get_pay_request))
            .route("/lnurlp/:user/callback", get(get_invoice))
            .route("/api/get-agent", get(get_agent))
            .with_state(state.clone());

        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("lnurl mock stopped: {e}");
            }
        });

        Ok(Self {
            addr,
            state,
            server,
        })
    }

    /// `http://127.0.0.1:<port>`, usable as proxy or as directory base url.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn address(user: &str) -> String {
        format!("{user}@{MOCK_DOMAIN}")
    }

    pub fn discovery_hits(&self) -> usize {
        self.state.discovery_hits.load(Ordering::SeqCst)
    }

    /// Amounts in millisats of all invoice requests so far.
    pub fn requested_amounts(&self) -> Vec<u64> {
        self.state
            .requested_amounts
            .lock()
            .map(|amounts| amounts.clone())
            .unwrap_or_default()
    }
}

impl Drop for LnurlMock {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn lnurl_error(status: StatusCode, reason: &str) -> axum::response::Response {
    (status, Json(json!({"status": "ERROR", "reason": reason}))).into_response()
}

async fn get_pay_request(
    State(state): State<MockState>,
    Path(user): Path<String>,
) -> axum::response::Response {
    state.discovery_hits.fetch_add(1, Ordering::SeqCst);

    let pay_request = |user: &str| {
        json!({
            "callback": format!("http://{MOCK_DOMAIN}/lnurlp/{user}/callback"),
            "minSendable": MIN_SENDABLE,
            "maxSendable": MAX_SENDABLE,
            "metadata": format!(
                "[[\"text/plain\",\"Tip {user}@{MOCK_DOMAIN}\"],[\"text/identifier\",\"{user}@{MOCK_DOMAIN}\"]]"
            ),
            "commentAllowed": 255,
            "tag": "payRequest"
        })
    };

    match user.as_str() {
        "agent" | "declining" => Json(pay_request(&user)).into_response(),
        "slow" => {
            tokio::time::sleep(SLOW_DISCOVERY).await;
            Json(pay_request(&user)).into_response()
        }
        "broken" => Json(json!({"minSendable": MIN_SENDABLE, "tag": "payRequest"})).into_response(),
        "withdraw" => Json(json!({
            "callback": format!("http://{MOCK_DOMAIN}/lnurlw/callback"),
            "minSendable": MIN_SENDABLE,
            "maxSendable": MAX_SENDABLE,
            "metadata": "[]",
            "tag": "withdrawRequest"
        }))
        .into_response(),
        _ => lnurl_error(StatusCode::NOT_FOUND, "User not found"),
    }
}

#[derive(Deserialize)]
struct InvoiceParams {
    amount: Option<u64>,
}

async fn get_invoice(
    State(state): State<MockState>,
    Path(user): Path<String>,
    Query(params): Query<InvoiceParams>,
) -> axum::response::Response {
    let Some(amount) = params.amount else {
        return lnurl_error(StatusCode::BAD_REQUEST, "Missing amount");
    };
    if let Ok(mut amounts) = state.requested_amounts.lock() {
        amounts.push(amount);
    }

    if user == "declining" {
        return Json(json!({"status": "ERROR", "reason": "Unable to create invoice"}))
            .into_response();
    }
    if !(MIN_SENDABLE..=MAX_SENDABLE).contains(&amount) {
        return lnurl_error(StatusCode::BAD_REQUEST, "Amount out of range");
    }

    Json(json!({
        "pr": format!("lnbcrt{amount}p1pjg6mqhpp5pza5wzh0csjjuvfpjpv4zdjmg30vedj9ycv5tyfes9x7dp8axy0s"),
        "routes": null,
        "successAction": {"tag": "message", "message": "Thanks!"}
    }))
    .into_response()
}

async fn get_agent(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    match params.get("agent_email").map(String::as_str) {
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "agent_email parameter required"})),
        ),
        Some(KNOWN_AGENT_EMAIL) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "agent_name": "Support Agent",
                "agent_email": KNOWN_AGENT_EMAIL,
                "lightning_address": LnurlMock::address("agent"),
                "avatar_url": null
            })),
        ),
        Some(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "Agent not found",
                "lightning_address": FALLBACK_ADDRESS
            })),
        ),
    }
}
