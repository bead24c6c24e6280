//! In-process mock of the remote Wardrobe API, for pipeline and session
//! tests. Binds an ephemeral port; counters record how often each
//! auth-sensitive endpoint was hit.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

pub struct ApiState {
    /// Access token currently accepted by bearer-protected endpoints.
    pub valid_access: Mutex<String>,
    /// Whether the refresh endpoint mints tokens or rejects the call.
    pub refresh_ok: AtomicBool,
    /// Whether the logout endpoint fails with a 500.
    pub logout_fails: AtomicBool,
    pub refresh_calls: AtomicUsize,
    pub me_calls: AtomicUsize,
}

impl Default for ApiState {
    fn default() -> Self {
        Self {
            valid_access: Mutex::new("access-1".to_string()),
            refresh_ok: AtomicBool::new(true),
            logout_fails: AtomicBool::new(false),
            refresh_calls: AtomicUsize::new(0),
            me_calls: AtomicUsize::new(0),
        }
    }
}

pub struct MockApi {
    pub addr: SocketAddr,
    pub state: Arc<ApiState>,
}

impl MockApi {
    pub async fn spawn() -> Self {
        let state = Arc::new(ApiState::default());
        let app = Router::new()
            .route("/auth/login/", post(login))
            .route("/auth/logout/", post(logout))
            .route("/auth/me/", get(me))
            .route("/auth/register/", post(register))
            .route("/auth/token/refresh/", post(refresh))
            .route("/items/", get(list_items))
            .route("/itembookings/", post(create_booking))
            .route("/events/current-future/", get(current_future))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock api");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve mock api");
        });

        MockApi { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn refresh_calls(&self) -> usize {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn me_calls(&self) -> usize {
        self.state.me_calls.load(Ordering::SeqCst)
    }
}

fn user_json() -> Value {
    json!({
        "id": 1,
        "username": "testuser",
        "email": "testuser@example.com",
        "first_name": "Test",
        "last_name": "User",
        "groups": ["staff"]
    })
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

fn authorized(state: &ApiState, headers: &HeaderMap) -> bool {
    let valid = state.valid_access.lock().expect("lock").clone();
    bearer_token(headers) == Some(valid.as_str())
}

async fn login(
    State(_state): State<Arc<ApiState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let username = body.get("username").and_then(|v| v.as_str());
    let password = body.get("password").and_then(|v| v.as_str());
    if username == Some("testuser") && password == Some("password123") {
        (
            StatusCode::OK,
            Json(json!({
                "access": "access-1",
                "refresh": "refresh-1",
                "user": user_json()
            })),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "No active account found with the given credentials"})),
        )
    }
}

async fn logout(
    State(state): State<Arc<ApiState>>,
    _headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if state.logout_fails.load(Ordering::SeqCst) {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "logout failed"})),
        )
    } else {
        (
            StatusCode::OK,
            Json(json!({"detail": "Successfully logged out."})),
        )
    }
}

async fn me(State(state): State<Arc<ApiState>>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    state.me_calls.fetch_add(1, Ordering::SeqCst);
    if authorized(&state, &headers) {
        (StatusCode::OK, Json(user_json()))
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Given token not valid for any token type"})),
        )
    }
}

async fn register(
    State(_state): State<Arc<ApiState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if body.get("username").and_then(|v| v.as_str()) == Some("testuser") {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"username": ["A user with that username already exists."]})),
        )
    } else {
        (
            StatusCode::CREATED,
            Json(json!({
                "detail": "User registered successfully.",
                "user": {
                    "id": 2,
                    "username": body.get("username").cloned().unwrap_or(json!("newuser")),
                    "email": body.get("email").cloned().unwrap_or(json!("")),
                }
            })),
        )
    }
}

async fn refresh(
    State(state): State<Arc<ApiState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    let token = body.get("refresh").and_then(|v| v.as_str());
    if state.refresh_ok.load(Ordering::SeqCst) && token == Some("refresh-1") {
        let access = state.valid_access.lock().expect("lock").clone();
        (StatusCode::OK, Json(json!({ "access": access })))
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Token is invalid or expired"})),
        )
    }
}

async fn list_items(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if !authorized(&state, &headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Given token not valid for any token type"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "count": 20,
            "results": [
                {"id": 1, "name": "Feather Boa", "quantity": 5, "category": "ACC"},
                {"id": 2, "name": "Top Hat", "quantity": 3, "category": "HAT"}
            ]
        })),
    )
}

async fn create_booking(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&state, &headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Given token not valid for any token type"})),
        );
    }
    let quantity = body.get("quantity").and_then(|v| v.as_u64()).unwrap_or(1);
    if quantity > 5 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "quantity": [format!(
                    "Cannot book {} items. Only 5 available for this time period.",
                    quantity
                )]
            })),
        );
    }
    (
        StatusCode::CREATED,
        Json(json!({
            "id": 42,
            "item": body.get("item").cloned().unwrap_or(json!(1)),
            "event": body.get("event").cloned().unwrap_or(json!(1)),
            "quantity": quantity,
            "item_name": "Feather Boa",
            "event_name": "Spring Gala"
        })),
    )
}

async fn current_future(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if !authorized(&state, &headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Given token not valid for any token type"})),
        );
    }
    // Bare array, not the paginated envelope.
    (
        StatusCode::OK,
        Json(json!([
            {
                "id": 5,
                "name": "Spring Gala",
                "start_datetime": "2026-06-01T18:00:00Z",
                "end_datetime": "2026-06-01T23:00:00Z",
                "location": "Main Hall"
            }
        ])),
    )
}
