#![allow(dead_code)]
//! Shared test helpers: a scripted transport and a signed-in context

use async_trait::async_trait;
use parking_lot::Mutex;
use portal_console::{
    error::{ConsoleError, ConsoleResult},
    http::{ApiRequest, RawResponse, Transport},
    session::{Session, SessionData},
    admin::AdminRole,
    ConsoleConfig, ConsoleContext,
};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

enum Reply {
    Respond(RawResponse),
    Unreachable,
}

struct Route {
    method: Method,
    path: String,
    query: Option<(String, String)>,
    reply: Reply,
    gate: Option<Arc<Notify>>,
}

impl Route {
    fn matches(&self, request: &ApiRequest) -> bool {
        self.method == request.method
            && self.path == request.path
            && match &self.query {
                Some((key, value)) => request.query_value(key) == Some(value.as_str()),
                None => true,
            }
    }
}

/// Transport answering from a route table and recording every request
///
/// Routes are matched newest first, so a later route overrides an earlier
/// one for the same request.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, route: Route) {
        self.routes.lock().push(route);
    }

    pub fn on(&self, method: Method, path: &str, response: RawResponse) {
        self.push(Route {
            method,
            path: path.to_string(),
            query: None,
            reply: Reply::Respond(response),
            gate: None,
        });
    }

    pub fn on_query(&self, method: Method, path: &str, key: &str, value: &str, response: RawResponse) {
        self.push(Route {
            method,
            path: path.to_string(),
            query: Some((key.to_string(), value.to_string())),
            reply: Reply::Respond(response),
            gate: None,
        });
    }

    /// Like `on_query` but the reply is held until the returned gate is notified
    pub fn gated(&self, method: Method, path: &str, query: Option<(&str, &str)>, response: RawResponse) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.push(Route {
            method,
            path: path.to_string(),
            query: query.map(|(k, v)| (k.to_string(), v.to_string())),
            reply: Reply::Respond(response),
            gate: Some(Arc::clone(&gate)),
        });
        gate
    }

    pub fn unreachable(&self, method: Method, path: &str) {
        self.push(Route {
            method,
            path: path.to_string(),
            query: None,
            reply: Reply::Unreachable,
            gate: None,
        });
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> ConsoleResult<RawResponse> {
        self.requests.lock().push(request.clone());

        let (reply, gate) = {
            let routes = self.routes.lock();
            match routes.iter().rev().find(|r| r.matches(&request)) {
                Some(route) => {
                    let reply = match &route.reply {
                        Reply::Respond(response) => Ok(response.clone()),
                        Reply::Unreachable => Err(ConsoleError::Connectivity("connection refused".to_string())),
                    };
                    (reply, route.gate.clone())
                }
                None => (Ok(RawResponse::new(404, "")), None),
            }
        };

        if let Some(gate) = gate {
            gate.notified().await;
        }
        reply
    }
}

/// Successful envelope around `data`
pub fn ok(data: Value) -> RawResponse {
    RawResponse::new(200, json!({"code": 0, "message": "success", "data": data}).to_string())
}

/// Failing envelope with a domain code
pub fn fail(code: i64, message: &str) -> RawResponse {
    RawResponse::new(200, json!({"code": code, "message": message, "data": null}).to_string())
}

pub fn page(items: Value, total: u64) -> RawResponse {
    ok(json!({"items": items, "total": total}))
}

pub fn test_config() -> ConsoleConfig {
    let mut config = ConsoleConfig::default();
    config.lists.keyword_debounce_ms = 300;
    config.session.login_redirect_delay_ms = 50;
    config
}

pub fn signed_in_session(config: &ConsoleConfig) -> Arc<Session> {
    let session = Session::in_memory(config.login_redirect_delay());
    session
        .sign_in(SessionData {
            token: "test-token".to_string(),
            username: "root".to_string(),
            role: Some(AdminRole::SuperAdmin),
        })
        .expect("in-memory sign in");
    Arc::new(session)
}

pub fn context_with(transport: &Arc<ScriptedTransport>, config: ConsoleConfig) -> ConsoleContext {
    let session = signed_in_session(&config);
    ConsoleContext::with_transport(config, Arc::clone(transport) as Arc<dyn Transport>, session)
}

pub fn context(transport: &Arc<ScriptedTransport>) -> ConsoleContext {
    context_with(transport, test_config())
}

/// Let spawned tasks make progress without advancing paused time much
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(1)).await;
}

pub fn admin_row(id: i64, username: &str, role: &str) -> Value {
    json!({
        "id": id,
        "username": username,
        "email": format!("{}@portal.test", username),
        "role": role,
        "isActive": true,
        "tags": "[]",
        "adminNumber": 1000 + id,
        "createdAt": "2024-03-01T08:00:00Z"
    })
}

pub fn subscription_row(id: i64, sync_enabled: bool) -> Value {
    json!({
        "id": id,
        "userId": 7,
        "contentType": "paper",
        "keywords": "[\"llm\"]",
        "tags": [],
        "isPublic": false,
        "isActive": true,
        "notifyEnabled": true,
        "syncEnabled": sync_enabled,
        "totalMatched": 10 * id,
        "newCount": id,
        "lastSyncAt": null
    })
}
