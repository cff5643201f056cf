use std::cmp::Ordering;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::model::{Action, Db, PageWindow, Priority, Status, TaskRecord};
use crate::{current_user, AppError, Shared};

#[derive(Debug, Default, Deserialize)]
pub struct TaskQuery {
    pub search: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub assignee: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub assignee: Option<String>,
}

impl TaskInput {
    fn validate(&self, db: &Db) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::bad_request("Title is required"));
        }
        if let Some(id) = &self.assignee {
            if db.user(id).is_none() {
                return Err(AppError::bad_request("Assignee not found"));
            }
        }
        Ok(())
    }

    fn apply(self, task: &mut TaskRecord) {
        task.title = self.title.trim().to_string();
        task.description = self.description.filter(|d| !d.trim().is_empty());
        task.status = self.status.unwrap_or(Status::Todo);
        task.priority = self.priority.unwrap_or(Priority::Medium);
        task.due_date = self
            .due_date
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|d| d.and_utc());
        task.tags = self.tags;
        task.assignee = self.assignee;
    }
}

fn matches(task: &TaskRecord, query: &TaskQuery) -> bool {
    if let Some(search) = query.search.as_deref().map(str::to_lowercase) {
        let in_title = task.title.to_lowercase().contains(&search);
        let in_description = task
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(&search));
        if !in_title && !in_description {
            return false;
        }
    }
    query.status.is_none_or(|s| task.status == s)
        && query.priority.is_none_or(|p| task.priority == p)
        && query
            .assignee
            .as_deref()
            .is_none_or(|a| task.assignee.as_deref() == Some(a))
}

/// Comparator for `sort=<field>:<asc|desc>`; newest first by default.
fn comparator(sort: Option<&str>) -> impl Fn(&TaskRecord, &TaskRecord) -> Ordering {
    let (field, direction) = sort
        .and_then(|s| s.split_once(':'))
        .unwrap_or(("createdAt", "desc"));
    let field = field.to_string();
    let descending = direction != "asc";
    move |a: &TaskRecord, b: &TaskRecord| {
        let ordering = match field.as_str() {
            "title" => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            "priority" => a.priority.cmp(&b.priority),
            "dueDate" => a.due_date.cmp(&b.due_date),
            _ => a.created_at.cmp(&b.created_at),
        }
        .then(a.seq.cmp(&b.seq));
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

pub async fn list_tasks(
    State(db): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<TaskQuery>,
) -> Result<Json<Value>, AppError> {
    let db = db.read().await;
    current_user(&db, &headers)?;

    let mut selected: Vec<&TaskRecord> = db.tasks.iter().filter(|t| matches(t, &query)).collect();
    let compare = comparator(query.sort.as_deref());
    selected.sort_by(|a, b| compare(*a, *b));

    let (page, pagination) = PageWindow::new(query.page, query.limit).apply(selected);
    let tasks: Vec<Value> = page.into_iter().map(|t| db.task_json(t)).collect();
    Ok(Json(json!({ "tasks": tasks, "pagination": pagination })))
}

pub async fn get_task(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let db = db.read().await;
    current_user(&db, &headers)?;
    let task = db.task(&id).ok_or_else(|| AppError::not_found("Task not found"))?;
    Ok(Json(json!({ "task": db.task_json(task) })))
}

pub async fn create_task(
    State(db): State<Shared>,
    headers: HeaderMap,
    Json(input): Json<TaskInput>,
) -> Result<impl IntoResponse, AppError> {
    let mut db = db.write().await;
    let user = current_user(&db, &headers)?;
    input.validate(&db)?;

    db.next_seq += 1;
    let mut task = TaskRecord {
        seq: db.next_seq,
        id: Uuid::new_v4().simple().to_string(),
        title: String::new(),
        description: None,
        status: Status::Todo,
        priority: Priority::Medium,
        due_date: None,
        tags: Vec::new(),
        assignee: None,
        created_by: user.id.clone(),
        created_at: Utc::now(),
    };
    input.apply(&mut task);
    let body = json!({ "task": db.task_json(&task) });
    db.record(&user.id, &task.id, Action::Create);
    db.tasks.push(task);
    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn update_task(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<TaskInput>,
) -> Result<Json<Value>, AppError> {
    let mut db = db.write().await;
    let user = current_user(&db, &headers)?;
    input.validate(&db)?;

    let index = db
        .tasks
        .iter()
        .position(|t| t.id == id)
        .ok_or_else(|| AppError::not_found("Task not found"))?;
    input.apply(&mut db.tasks[index]);
    db.record(&user.id, &id, Action::Update);
    Ok(Json(json!({ "task": db.task_json(&db.tasks[index]) })))
}

pub async fn delete_task(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let mut db = db.write().await;
    let user = current_user(&db, &headers)?;

    let index = db
        .tasks
        .iter()
        .position(|t| t.id == id)
        .ok_or_else(|| AppError::not_found("Task not found"))?;
    let task = &db.tasks[index];
    if task.created_by != user.id && user.role != crate::Role::Admin {
        return Err(AppError::new(
            StatusCode::FORBIDDEN,
            "Not authorized to delete this task",
        ));
    }
    db.tasks.remove(index);
    db.record(&user.id, &id, Action::Delete);
    Ok(Json(json!({ "message": "Task deleted" })))
}
