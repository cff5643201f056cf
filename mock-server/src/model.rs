use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Admin,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Todo,
    InProgress,
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Delete,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct UserRecord {
    pub user: User,
    pub password: String,
}

#[derive(Clone, Debug)]
pub struct TaskRecord {
    pub seq: u64,
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub assignee: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl TaskRecord {
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status != Status::Done && self.due_date.is_some_and(|due| due < now)
    }
}

#[derive(Clone, Debug)]
pub struct ActivityRecord {
    pub user_id: String,
    pub task_id: String,
    pub action: Action,
    pub timestamp: DateTime<Utc>,
}

/// Everything the mock service knows. Sessions map cookie token to user id.
#[derive(Debug, Default)]
pub struct Db {
    pub users: Vec<UserRecord>,
    pub tasks: Vec<TaskRecord>,
    pub sessions: HashMap<String, String>,
    pub activity: Vec<ActivityRecord>,
    pub next_seq: u64,
}

impl Db {
    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().map(|r| &r.user).find(|u| u.id == id)
    }

    pub fn task(&self, id: &str) -> Option<&TaskRecord> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn user_ref(&self, id: &str) -> Value {
        match self.user(id) {
            Some(user) => json!({ "_id": user.id, "name": user.name, "email": user.email }),
            None => Value::Null,
        }
    }

    /// Task as sent on the wire, with user references populated.
    pub fn task_json(&self, task: &TaskRecord) -> Value {
        json!({
            "_id": task.id,
            "title": task.title,
            "description": task.description,
            "status": task.status,
            "priority": task.priority,
            "dueDate": task.due_date,
            "tags": task.tags,
            "assignee": task.assignee.as_deref().map_or(Value::Null, |id| self.user_ref(id)),
            "createdBy": self.user_ref(&task.created_by),
            "createdAt": task.created_at,
        })
    }

    pub fn activity_json(&self, entry: &ActivityRecord) -> Value {
        let task = self
            .task(&entry.task_id)
            .map_or(Value::Null, |t| json!({ "_id": t.id, "title": t.title }));
        json!({
            "userId": self.user_ref(&entry.user_id),
            "taskId": task,
            "action": entry.action,
            "timestamp": entry.timestamp,
        })
    }

    pub fn record(&mut self, user_id: &str, task_id: &str, action: Action) {
        self.activity.push(ActivityRecord {
            user_id: user_id.to_string(),
            task_id: task_id.to_string(),
            action,
            timestamp: Utc::now(),
        });
    }
}

/// Page/limit arithmetic shared by both list endpoints.
#[derive(Clone, Copy, Debug)]
pub struct PageWindow {
    pub page: u32,
    pub limit: u32,
}

impl PageWindow {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(10).clamp(1, 100),
        }
    }

    pub fn apply<T>(self, items: Vec<T>) -> (Vec<T>, Value) {
        let total = items.len();
        let limit = self.limit as usize;
        let total_pages = total.div_ceil(limit).max(1);
        let start = (self.page as usize - 1).saturating_mul(limit);
        let page: Vec<T> = items.into_iter().skip(start).take(limit).collect();
        let pagination = json!({
            "currentPage": self.page,
            "totalPages": total_pages,
            "totalItems": total,
            "itemsPerPage": self.limit,
        });
        (page, pagination)
    }
}
