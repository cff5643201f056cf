//! In-memory stand-in for the taskboard REST service.
//!
//! Implements the auth, task, user and stats endpoints with cookie sessions
//! and `{ "error": "..." }` failure bodies, enough for the client crate's
//! integration tests and for local development.

use std::sync::Arc;

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};

mod auth;
pub mod model;
mod stats;
mod tasks;
mod users;

pub use model::{Db, Role, User};

pub type Shared = Arc<RwLock<Db>>;

pub const SESSION_COOKIE: &str = "session";

pub fn app() -> Router {
    let db: Shared = Arc::new(RwLock::new(Db::default()));
    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/api/tasks/{id}",
            get(tasks::get_task).put(tasks::update_task).delete(tasks::delete_task),
        )
        .route("/api/users", get(users::list_users))
        .route("/api/users/{id}/role", patch(users::update_role))
        .route("/api/stats/overview", get(stats::overview))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// A failure rendered as `{ "error": message }`.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// Resolve the signed-in user from the session cookie.
pub(crate) fn current_user(db: &Db, headers: &HeaderMap) -> Result<User, AppError> {
    session_token(headers)
        .and_then(|token| db.sessions.get(&token))
        .and_then(|id| db.user(id))
        .cloned()
        .ok_or_else(|| AppError::new(StatusCode::UNAUTHORIZED, "Not authenticated"))
}

pub(crate) fn require_admin(db: &Db, headers: &HeaderMap) -> Result<User, AppError> {
    let user = current_user(db, headers)?;
    if user.role != Role::Admin {
        return Err(AppError::new(StatusCode::FORBIDDEN, "Access denied. Admin only."));
    }
    Ok(user)
}
