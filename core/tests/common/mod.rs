//! Scripted in-memory transport for coordinator tests.
//!
//! Tests queue one reply per expected request. A reply is either immediate,
//! a transport failure, or gated behind a `oneshot` so the test decides when
//! (and in which order) responses resolve. Every executed request is logged.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;

use async_trait::async_trait;
use serde_json::{json, Value};
use taskboard_core::{ApiError, HttpMethod, HttpRequest, HttpResponse, Transport};
use tokio::sync::oneshot;

pub const BASE_URL: &str = "http://api.test";

enum Reply {
    Now(HttpResponse),
    Gated(oneshot::Receiver<HttpResponse>),
    Unreachable(String),
}

struct Expectation {
    method: HttpMethod,
    path: String,
    reply: Reply,
}

#[derive(Default)]
pub struct ScriptedTransport {
    script: RefCell<VecDeque<Expectation>>,
    log: RefCell<Vec<HttpRequest>>,
}

pub fn response(status: u16, body: Value) -> HttpResponse {
    HttpResponse {
        status,
        headers: Vec::new(),
        body: body.to_string(),
    }
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: HttpMethod, path: &str, reply: Reply) {
        self.script.borrow_mut().push_back(Expectation {
            method,
            path: format!("{BASE_URL}{path}"),
            reply,
        });
    }

    pub fn respond(&self, method: HttpMethod, path: &str, status: u16, body: Value) {
        self.push(method, path, Reply::Now(response(status, body)));
    }

    /// Queue a reply that resolves only when the returned sender fires.
    pub fn gate(&self, method: HttpMethod, path: &str) -> oneshot::Sender<HttpResponse> {
        let (tx, rx) = oneshot::channel();
        self.push(method, path, Reply::Gated(rx));
        tx
    }

    pub fn unreachable(&self, method: HttpMethod, path: &str) {
        self.push(method, path, Reply::Unreachable("connection refused".to_string()));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.log.borrow().clone()
    }

    /// `"METHOD /path"` for every executed request, in order.
    pub fn calls(&self) -> Vec<String> {
        self.log
            .borrow()
            .iter()
            .map(|r| {
                let path = r.path.strip_prefix(BASE_URL).unwrap_or(&r.path);
                format!("{} {path}", r.method.as_str())
            })
            .collect()
    }

    pub fn pending(&self) -> usize {
        self.script.borrow().len()
    }
}

#[async_trait(?Send)]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.log.borrow_mut().push(request.clone());
        let reply = {
            let mut script = self.script.borrow_mut();
            let index = script
                .iter()
                .position(|e| e.method == request.method && e.path == request.path)
                .unwrap_or_else(|| {
                    panic!("unexpected request {} {}", request.method.as_str(), request.path)
                });
            script.remove(index).unwrap().reply
        };
        match reply {
            Reply::Now(response) => Ok(response),
            Reply::Gated(rx) => Ok(rx.await.expect("gate sender dropped")),
            Reply::Unreachable(detail) => Err(ApiError::Transport(detail)),
        }
    }
}

// --- fixtures ---

pub fn user_json(id: &str, name: &str, role: &str) -> Value {
    json!({
        "_id": id,
        "name": name,
        "email": format!("{}@example.com", name.to_lowercase()),
        "role": role,
        "createdAt": "2024-05-01T12:00:00Z",
    })
}

pub fn task_json(id: &str, title: &str, status: &str) -> Value {
    json!({
        "_id": id,
        "title": title,
        "status": status,
        "priority": "medium",
        "tags": [],
        "createdBy": { "_id": "u1", "name": "Ada" },
        "createdAt": "2024-05-01T12:00:00Z",
    })
}

pub fn pagination(current: u32, total_pages: u32, total_items: u64, per_page: u32) -> Value {
    json!({
        "currentPage": current,
        "totalPages": total_pages,
        "totalItems": total_items,
        "itemsPerPage": per_page,
    })
}

pub fn task_page(tasks: &[Value], pages: Value) -> Value {
    json!({ "tasks": tasks, "pagination": pages })
}

pub fn user_page(users: &[Value], pages: Value) -> Value {
    json!({ "users": users, "pagination": pages })
}

pub fn error_body(message: &str) -> Value {
    json!({ "error": message })
}
