//! Stateless HTTP request builder and response parser for the taskboard API.
//!
//! # Design
//! `TaskboardClient` holds only a `base_url` and carries no mutable state
//! between calls. Each endpoint is split into a `build_*` method that produces
//! an `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! A [`Transport`](crate::http::Transport) executes the round-trip in between.
//!
//! Every parser funnels through `check_status`, which is where a non-2xx
//! response becomes a normalized [`ApiError::Server`] carrying the server's
//! `error` string or the generic fallback.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, FALLBACK_MESSAGE};
use crate::filters::Filters;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    Credentials, Registration, Role, StatsSnapshot, Task, TaskInput, TaskPage, UserPage,
    UserSummary,
};

#[derive(Deserialize)]
struct UserEnvelope {
    user: UserSummary,
}

#[derive(Deserialize)]
struct TaskEnvelope {
    task: Task,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Serialize)]
struct RoleChange {
    role: Role,
}

/// Synchronous, stateless client for the taskboard API.
#[derive(Debug, Clone)]
pub struct TaskboardClient {
    base_url: String,
}

impl TaskboardClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_register(&self, input: &Registration) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/api/auth/register", input)
    }

    pub fn build_login(&self, input: &Credentials) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/api/auth/login", input)
    }

    pub fn build_logout(&self) -> HttpRequest {
        self.request(HttpMethod::Post, "/api/auth/logout")
    }

    pub fn build_me(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/api/auth/me")
    }

    pub fn parse_register(&self, response: HttpResponse) -> Result<UserSummary, ApiError> {
        check_status(&response)?;
        decode::<UserEnvelope>(&response).map(|e| e.user)
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<UserSummary, ApiError> {
        check_status(&response)?;
        decode::<UserEnvelope>(&response).map(|e| e.user)
    }

    pub fn parse_logout(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    pub fn parse_me(&self, response: HttpResponse) -> Result<UserSummary, ApiError> {
        check_status(&response)?;
        decode::<UserEnvelope>(&response).map(|e| e.user)
    }

    pub fn build_list_tasks(&self, filters: &Filters) -> HttpRequest {
        HttpRequest {
            query: filters.to_query(),
            ..self.request(HttpMethod::Get, "/api/tasks")
        }
    }

    pub fn build_get_task(&self, id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/api/tasks/{id}"))
    }

    pub fn build_create_task(&self, input: &TaskInput) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/api/tasks", input)
    }

    pub fn build_update_task(&self, id: &str, input: &TaskInput) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, &format!("/api/tasks/{id}"), input)
    }

    pub fn build_delete_task(&self, id: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/api/tasks/{id}"))
    }

    pub fn parse_list_tasks(&self, response: HttpResponse) -> Result<TaskPage, ApiError> {
        check_status(&response)?;
        decode(&response)
    }

    pub fn parse_get_task(&self, response: HttpResponse) -> Result<Task, ApiError> {
        check_status(&response)?;
        decode::<TaskEnvelope>(&response).map(|e| e.task)
    }

    pub fn parse_create_task(&self, response: HttpResponse) -> Result<Task, ApiError> {
        check_status(&response)?;
        decode::<TaskEnvelope>(&response).map(|e| e.task)
    }

    pub fn parse_update_task(&self, response: HttpResponse) -> Result<Task, ApiError> {
        check_status(&response)?;
        decode::<TaskEnvelope>(&response).map(|e| e.task)
    }

    pub fn parse_delete_task(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    pub fn build_list_users(&self, filters: &Filters) -> HttpRequest {
        HttpRequest {
            query: filters.to_query(),
            ..self.request(HttpMethod::Get, "/api/users")
        }
    }

    pub fn build_update_user_role(&self, id: &str, role: Role) -> Result<HttpRequest, ApiError> {
        self.json_request(
            HttpMethod::Patch,
            &format!("/api/users/{id}/role"),
            &RoleChange { role },
        )
    }

    pub fn parse_list_users(&self, response: HttpResponse) -> Result<UserPage, ApiError> {
        check_status(&response)?;
        decode(&response)
    }

    pub fn parse_update_user_role(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    pub fn build_stats_overview(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/api/stats/overview")
    }

    pub fn parse_stats_overview(&self, response: HttpResponse) -> Result<StatsSnapshot, ApiError> {
        check_status(&response)?;
        decode(&response)
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    fn json_request<B: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Encode(e.to_string()))?;
        Ok(HttpRequest {
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
            ..self.request(method, path)
        })
    }
}

/// Map a non-2xx response to `ApiError::Server` with the server's message,
/// or the fallback when the body carries none.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let message = serde_json::from_str::<ErrorBody>(&response.body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
    Err(ApiError::Server {
        status: response.status,
        message,
    })
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
}
