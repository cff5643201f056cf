use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::model::{Role, User, UserRecord};
use crate::{current_user, session_token, AppError, Shared, SESSION_COOKIE};

#[derive(Deserialize)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax")
}

/// Issue a session for `user` and answer with the `{ user }` envelope.
fn signed_in(
    db: &mut crate::Db,
    user: User,
    status: StatusCode,
) -> (StatusCode, [(header::HeaderName, String); 1], Json<serde_json::Value>) {
    let token = Uuid::new_v4().simple().to_string();
    db.sessions.insert(token.clone(), user.id.clone());
    (
        status,
        [(header::SET_COOKIE, session_cookie(&token))],
        Json(json!({ "user": user })),
    )
}

pub async fn register(
    State(db): State<Shared>,
    Json(input): Json<RegisterInput>,
) -> Result<impl IntoResponse, AppError> {
    let name = input.name.trim();
    let email = input.email.trim().to_lowercase();
    if name.is_empty() || email.is_empty() {
        return Err(AppError::bad_request("Name and email are required"));
    }
    if input.password.len() < 6 {
        return Err(AppError::bad_request("Password must be at least 6 characters"));
    }

    let mut db = db.write().await;
    if db.users.iter().any(|r| r.user.email == email) {
        return Err(AppError::bad_request("User already exists"));
    }

    let role = if db.users.is_empty() {
        Role::Admin
    } else {
        Role::Member
    };
    let user = User {
        id: Uuid::new_v4().simple().to_string(),
        name: name.to_string(),
        email,
        role,
        created_at: Utc::now(),
    };
    db.users.push(UserRecord {
        user: user.clone(),
        password: input.password,
    });
    tracing::info!(user = %user.id, ?role, "registered");
    Ok(signed_in(&mut db, user, StatusCode::CREATED))
}

pub async fn login(
    State(db): State<Shared>,
    Json(input): Json<LoginInput>,
) -> Result<impl IntoResponse, AppError> {
    let email = input.email.trim().to_lowercase();
    let mut db = db.write().await;
    let user = db
        .users
        .iter()
        .find(|r| r.user.email == email && r.password == input.password)
        .map(|r| r.user.clone())
        .ok_or_else(|| AppError::new(StatusCode::UNAUTHORIZED, "Invalid credentials"))?;
    Ok(signed_in(&mut db, user, StatusCode::OK))
}

pub async fn logout(State(db): State<Shared>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = session_token(&headers) {
        db.write().await.sessions.remove(&token);
    }
    (
        [(header::SET_COOKIE, format!("{SESSION_COOKIE}=; Max-Age=0; Path=/"))],
        Json(json!({ "message": "Logged out successfully" })),
    )
}

pub async fn me(State(db): State<Shared>, headers: HeaderMap) -> Result<impl IntoResponse, AppError> {
    let db = db.read().await;
    let user = current_user(&db, &headers)?;
    Ok(Json(json!({ "user": user })))
}
