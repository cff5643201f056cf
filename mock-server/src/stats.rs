use axum::{extract::State, http::HeaderMap, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::model::{Priority, Role, Status};
use crate::{current_user, AppError, Shared};

const RECENT_ACTIVITY: usize = 10;

pub async fn overview(State(db): State<Shared>, headers: HeaderMap) -> Result<Json<Value>, AppError> {
    let db = db.read().await;
    let user = current_user(&db, &headers)?;
    let now = Utc::now();

    let count_status = |s: Status| db.tasks.iter().filter(|t| t.status == s).count();
    let count_priority = |p: Priority| db.tasks.iter().filter(|t| t.priority == p).count();
    let overdue = db.tasks.iter().filter(|t| t.is_overdue(now)).count();
    let user_count = (user.role == Role::Admin).then_some(db.users.len());
    let recent: Vec<Value> = db
        .activity
        .iter()
        .rev()
        .take(RECENT_ACTIVITY)
        .map(|entry| db.activity_json(entry))
        .collect();

    Ok(Json(json!({
        "tasksByStatus": {
            "todo": count_status(Status::Todo),
            "in-progress": count_status(Status::InProgress),
            "done": count_status(Status::Done),
        },
        "tasksByPriority": {
            "low": count_priority(Priority::Low),
            "medium": count_priority(Priority::Medium),
            "high": count_priority(Priority::High),
        },
        "overdueTasks": overdue,
        "totalTasks": db.tasks.len(),
        "userCount": user_count,
        "recentActivity": recent,
    })))
}
