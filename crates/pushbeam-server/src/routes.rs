//! HTTP routes
//!
//! Request DTOs use optional fields so missing-field validation happens here
//! and produces the documented 400s instead of the framework's generic
//! rejection. Send calls always answer 200 with a per-endpoint report unless
//! no recipient exists at all.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use pushbeam_core::{
    Dispatcher, Identity, NotificationPayload, PushError, PushSubscription, Storage,
    SubscriptionKeys, SubscriptionRegistry, UserRecord,
};

/// Shared state behind every handler
#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
    pub registry: Arc<SubscriptionRegistry>,
    pub dispatcher: Arc<Dispatcher>,
}

/// Build the router over the given state
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/register", post(register_user))
        .route("/login", post(login))
        .route("/subscribe", post(subscribe))
        .route("/sendNotification", post(send_notification))
        .route("/sendToUser", post(send_to_user))
        .with_state(state)
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct UserResponse {
    username: String,
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Map a core error onto the documented status codes
fn error_response(err: PushError) -> Response {
    let status = match &err {
        PushError::UserNotFound(_) | PushError::NoSubscriptions(_) => StatusCode::NOT_FOUND,
        PushError::NoRecipients => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(%err, "Request failed");
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

async fn healthz() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================================
// Account routes (identity resolution boundary)
// ============================================================================

#[derive(Deserialize)]
struct CredentialsRequest {
    username: Option<String>,
    password: Option<String>,
}

async fn register_user(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Response {
    let (Some(username), Some(password)) = (req.username, req.password) else {
        return bad_request("username and password are required");
    };

    match state.storage.has_user(&username) {
        Ok(true) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "username already exists".to_string(),
            }),
        )
            .into_response(),
        Ok(false) => {
            let user = UserRecord::new(username.clone(), &password);
            match state.storage.save_user(&user) {
                Ok(()) => (StatusCode::CREATED, Json(UserResponse { username })).into_response(),
                Err(err) => error_response(err),
            }
        }
        Err(err) => error_response(err),
    }
}

async fn login(State(state): State<AppState>, Json(req): Json<CredentialsRequest>) -> Response {
    let (Some(username), Some(password)) = (req.username, req.password) else {
        return bad_request("username and password are required");
    };

    match state.storage.load_user(&username) {
        Ok(Some(user)) if user.verify_password(&password) => {
            (StatusCode::OK, Json(UserResponse { username })).into_response()
        }
        Ok(_) => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "invalid username or password".to_string(),
            }),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

// ============================================================================
// Subscription and delivery routes
// ============================================================================

#[derive(Deserialize)]
struct SubscribeRequest {
    identity: Option<String>,
    endpoint: Option<String>,
    #[serde(default)]
    keys: Option<SubscriptionKeys>,
}

async fn subscribe(State(state): State<AppState>, Json(req): Json<SubscribeRequest>) -> Response {
    let (Some(identity), Some(endpoint)) = (req.identity, req.endpoint) else {
        return bad_request("identity and endpoint are required");
    };
    let keys = req.keys.unwrap_or_default();

    let subscription = PushSubscription::new(endpoint, keys);
    match state
        .registry
        .register(&Identity::new(identity), subscription)
        .await
    {
        // The caller cannot tell Added from AlreadyPresent: dedup is silent
        Ok(_) => (
            StatusCode::CREATED,
            Json(MessageResponse {
                message: "subscription saved".to_string(),
            }),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Deserialize)]
struct BroadcastRequest {
    title: Option<String>,
    body: Option<String>,
}

async fn send_notification(
    State(state): State<AppState>,
    Json(req): Json<BroadcastRequest>,
) -> Response {
    let payload = NotificationPayload::new(
        req.title.unwrap_or_else(|| "Notification".to_string()),
        req.body.unwrap_or_default(),
    );

    match state.dispatcher.notify_all(&payload).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Deserialize)]
struct SendToUserRequest {
    identity: Option<String>,
    title: Option<String>,
    body: Option<String>,
}

async fn send_to_user(
    State(state): State<AppState>,
    Json(req): Json<SendToUserRequest>,
) -> Response {
    let (Some(identity), Some(title), Some(body)) = (req.identity, req.title, req.body) else {
        return bad_request("identity, title and body are required");
    };

    let payload = NotificationPayload::new(title, body);
    match state
        .dispatcher
        .notify_user(&Identity::new(identity), &payload)
        .await
    {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => error_response(err),
    }
}
