//! In-process mock of the ProfMed backend.
//!
//! Every request is recorded; responses come from a per-route table and
//! default to `404 {"detail": "Not found."}`.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use profmed_client::config::ClientConfig;
use profmed_client::{ApiClient, AuthSession, MemoryNavigator, MemoryStorage};
use serde_json::{Value, json};
use tokio::net::TcpListener;

#[derive(Clone, Debug)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl Recorded {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

#[derive(Default)]
struct Inner {
    routes: Mutex<HashMap<(Method, String), (StatusCode, Value)>>,
    log: Mutex<Vec<Recorded>>,
}

pub struct MockBackend {
    pub api_url: String,
    inner: Arc<Inner>,
    handle: tokio::task::JoinHandle<()>,
}

impl MockBackend {
    pub async fn spawn() -> Self {
        let inner = Arc::new(Inner::default());
        let app = Router::new().fallback(respond).with_state(inner.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { api_url: format!("http://{addr}/api"), inner, handle }
    }

    /// Answer `method path` (path relative to `/api`) with `status` and `body`.
    pub fn route(&self, method: Method, path: &str, status: StatusCode, body: Value) {
        self.inner.routes.lock().unwrap().insert((method, path.to_owned()), (status, body));
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.inner.log.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Recorded {
        self.requests().pop().expect("no request recorded")
    }

    /// Client plus the navigator it reports to, starting at `path`.
    pub fn client_at(&self, path: &str) -> (ApiClient, Arc<MemoryNavigator>) {
        let auth = AuthSession::new(Arc::new(MemoryStorage::new()));
        self.client_with(auth, path)
    }

    pub fn client_with(&self, auth: AuthSession, path: &str) -> (ApiClient, Arc<MemoryNavigator>) {
        let navigator = Arc::new(MemoryNavigator::new(path));
        let config = ClientConfig { api_url: self.api_url.clone(), ..ClientConfig::default() };
        let client = ApiClient::new(&config, auth, navigator.clone()).unwrap();
        (client, navigator)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn respond(State(inner): State<Arc<Inner>>, method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let path = uri.path().strip_prefix("/api").unwrap_or(uri.path()).to_owned();
    let header_str = |name: header::HeaderName| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned);
    inner.log.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(str::to_owned),
        authorization: header_str(header::AUTHORIZATION),
        content_type: header_str(header::CONTENT_TYPE),
        body,
    });

    let answer = inner.routes.lock().unwrap().get(&(method, path)).cloned();
    match answer {
        Some((status, _)) if status == StatusCode::NO_CONTENT => status.into_response(),
        Some((status, body)) => (status, axum::Json(body)).into_response(),
        None => (StatusCode::NOT_FOUND, axum::Json(json!({ "detail": "Not found." }))).into_response(),
    }
}

pub fn login_body(access: &str) -> Value {
    json!({
        "user": { "id": 7, "phone_number": "77001234567", "phone_verified": true, "date_joined": "2024-01-10T09:00:00Z" },
        "tokens": { "access": access, "refresh": "refresh-token" }
    })
}

pub fn profile_body() -> Value {
    json!({
        "user": {
            "id": 7,
            "phone_number": "77001234567",
            "phone_verified": true,
            "first_name": "Айгерим",
            "last_name": "Ахметова",
            "has_password": true
        },
        "roles": ["clinic_owner"],
        "primary_role": "clinic",
        "organizations": [
            { "id": 3, "name": "Клиника Здоровье", "type": "clinic", "role": "owner" }
        ]
    })
}
