use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::model::{PageWindow, Role, User};
use crate::{require_admin, AppError, Shared};

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RoleInput {
    pub role: Role,
}

pub async fn list_users(
    State(db): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<UserQuery>,
) -> Result<Json<Value>, AppError> {
    let db = db.read().await;
    require_admin(&db, &headers)?;

    let mut users: Vec<&User> = db.users.iter().map(|r| &r.user).collect();
    users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let (page, pagination) = PageWindow::new(query.page, query.limit).apply(users);
    Ok(Json(json!({ "users": page, "pagination": pagination })))
}

pub async fn update_role(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<RoleInput>,
) -> Result<Json<Value>, AppError> {
    let mut db = db.write().await;
    let admin = require_admin(&db, &headers)?;

    let record = db
        .users
        .iter_mut()
        .find(|r| r.user.id == id)
        .ok_or_else(|| AppError::not_found("User not found"))?;
    record.user.role = input.role;
    tracing::info!(by = %admin.id, user = %id, role = ?input.role, "role changed");
    Ok(Json(json!({ "user": record.user })))
}
