//! Coordinator behavior against a scripted transport.
//!
//! Covers the session lifecycle, write-through reloading in both stores,
//! stale-on-failure caching, stats replacement and the logout reset.

mod common;

use common::*;
use serde_json::json;
use taskboard_core::{
    AuthCheck, Coordinator, Credentials, Filters, HttpMethod, Pagination, Registration, Role,
    StatsSnapshot, TaskFilters, TaskInput, TaskStatus, FALLBACK_MESSAGE,
};

use HttpMethod::{Delete, Get, Patch, Post, Put};

fn coordinator() -> Coordinator<ScriptedTransport> {
    Coordinator::new(ScriptedTransport::new(), BASE_URL)
}

fn bad_login() -> Credentials {
    Credentials {
        email: "a@b.com".to_string(),
        password: "bad".to_string(),
    }
}

// --- session ---

#[tokio::test]
async fn starts_anonymous() {
    let c = coordinator();
    let session = c.session();
    assert!(session.user.is_none());
    assert!(!session.loading);
    assert!(!c.is_authenticated());
    assert_eq!(c.error(), None);
}

#[tokio::test]
async fn check_auth_with_session_authenticates() {
    let c = coordinator();
    c.transport()
        .respond(Get, "/api/auth/me", 200, json!({ "user": user_json("u1", "Ada", "admin") }));

    let AuthCheck::Authenticated(user) = c.check_auth().await else {
        panic!("expected an authenticated session");
    };
    assert_eq!(user.name, "Ada");
    assert!(c.is_authenticated());
    assert!(c.session().is_admin());
    assert!(!c.session().loading);
}

#[tokio::test]
async fn check_auth_without_session_is_silent() {
    let c = coordinator();
    c.transport()
        .respond(Get, "/api/auth/me", 401, error_body("Not authenticated"));

    assert_eq!(c.check_auth().await, AuthCheck::Unauthenticated);
    assert!(!c.is_authenticated());
    assert_eq!(c.error(), None);
}

#[tokio::test]
async fn check_auth_failure_is_reported_but_not_surfaced() {
    let c = coordinator();
    c.transport().unreachable(Get, "/api/auth/me");

    assert_eq!(
        c.check_auth().await,
        AuthCheck::Failed(FALLBACK_MESSAGE.to_string())
    );
    assert!(!c.is_authenticated());
    assert_eq!(c.error(), None);
}

#[tokio::test]
async fn login_with_bad_credentials_surfaces_server_message() {
    let c = coordinator();
    c.transport()
        .respond(Post, "/api/auth/login", 401, error_body("Invalid credentials"));

    let err = c.login(&bad_login()).await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid credentials");
    assert_eq!(c.error().as_deref(), Some("Invalid credentials"));
    assert!(!c.is_authenticated());
    assert!(!c.session().loading);
}

#[tokio::test]
async fn login_success_clears_prior_error_and_authenticates() {
    let c = coordinator();
    c.transport()
        .respond(Post, "/api/auth/login", 401, error_body("Invalid credentials"));
    c.transport()
        .respond(Post, "/api/auth/login", 200, json!({ "user": user_json("u1", "Ada", "member") }));

    c.login(&bad_login()).await.unwrap_err();
    let user = c
        .login(&Credentials {
            email: "ada@example.com".to_string(),
            password: "secret1".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(user.id, "u1");
    assert_eq!(c.current_user(), Some(user));
    assert_eq!(c.error(), None);

    let body: serde_json::Value =
        serde_json::from_str(c.transport().requests()[1].body.as_deref().unwrap()).unwrap();
    assert_eq!(body["email"], "ada@example.com");
}

#[tokio::test]
async fn register_failure_uses_fallback_when_body_has_no_error() {
    let c = coordinator();
    c.transport()
        .respond(Post, "/api/auth/register", 500, json!({}));

    let registration = Registration {
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        password: "secret1".to_string(),
    };
    let err = c.register(&registration).await.unwrap_err();
    assert_eq!(err.to_string(), FALLBACK_MESSAGE);
    assert_eq!(c.error().as_deref(), Some(FALLBACK_MESSAGE));
}

#[tokio::test]
async fn register_success_authenticates() {
    let c = coordinator();
    c.transport().respond(
        Post,
        "/api/auth/register",
        201,
        json!({ "user": user_json("u2", "Grace", "member") }),
    );

    let registration = Registration {
        name: "Grace".to_string(),
        email: "grace@example.com".to_string(),
        password: "secret1".to_string(),
    };
    c.register(&registration).await.unwrap();
    assert_eq!(c.current_user().unwrap().name, "Grace");
    assert!(!c.session().is_admin());
}

// --- tasks ---

#[tokio::test]
async fn fetch_replaces_items_and_pagination() {
    let c = coordinator();
    c.transport().respond(
        Get,
        "/api/tasks",
        200,
        task_page(
            &[task_json("t1", "T1", "done"), task_json("t2", "T2", "done")],
            pagination(1, 1, 2, 10),
        ),
    );

    c.fetch_tasks(Filters::new().with("status", "done")).await.unwrap();

    let tasks = c.tasks();
    let ids: Vec<&str> = tasks.items.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["t1", "t2"]);
    assert_eq!(
        tasks.pagination,
        Pagination {
            current_page: 1,
            total_pages: 1,
            total_items: 2,
            items_per_page: 10
        }
    );
    assert!(!tasks.loading);
    assert_eq!(
        c.transport().requests()[0].query,
        vec![("status".to_string(), "done".to_string())]
    );
}

#[tokio::test]
async fn fetching_twice_with_same_filters_is_idempotent() {
    let c = coordinator();
    let body = task_page(&[task_json("t1", "T1", "todo")], pagination(1, 1, 1, 10));
    c.transport().respond(Get, "/api/tasks", 200, body.clone());
    c.transport().respond(Get, "/api/tasks", 200, body);

    let filters = Filters::from(TaskFilters {
        status: Some(TaskStatus::Todo),
        ..TaskFilters::default()
    });
    c.fetch_tasks(filters.clone()).await.unwrap();
    let first = c.tasks();
    c.fetch_tasks(filters).await.unwrap();
    assert_eq!(c.tasks(), first);
}

#[tokio::test]
async fn failed_fetch_keeps_previous_snapshot() {
    let c = coordinator();
    c.transport().respond(
        Get,
        "/api/tasks",
        200,
        task_page(&[task_json("t1", "T1", "todo")], pagination(1, 3, 21, 10)),
    );
    c.transport()
        .respond(Get, "/api/tasks", 500, error_body("Database unavailable"));

    c.fetch_tasks(Filters::new()).await.unwrap();
    let before = c.tasks();

    let err = c
        .fetch_tasks(Filters::new().with("page", 2))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Database unavailable");
    assert_eq!(c.tasks(), before);
    assert_eq!(c.error().as_deref(), Some("Database unavailable"));
}

#[tokio::test]
async fn fetch_clears_previous_error() {
    let c = coordinator();
    c.transport().unreachable(Get, "/api/tasks");
    c.transport()
        .respond(Get, "/api/tasks", 200, task_page(&[], pagination(1, 1, 0, 10)));

    c.fetch_tasks(Filters::new()).await.unwrap_err();
    assert_eq!(c.error().as_deref(), Some(FALLBACK_MESSAGE));
    c.fetch_tasks(Filters::new()).await.unwrap();
    assert_eq!(c.error(), None);
}

#[tokio::test]
async fn create_reloads_with_last_filters() {
    let c = coordinator();
    let filters = Filters::new().with("status", "todo").with("page", 2);
    c.transport()
        .respond(Get, "/api/tasks", 200, task_page(&[], pagination(2, 2, 10, 5)));
    c.transport()
        .respond(Post, "/api/tasks", 201, json!({ "task": task_json("t9", "New", "todo") }));
    c.transport().respond(
        Get,
        "/api/tasks",
        200,
        task_page(&[task_json("t9", "New", "todo")], pagination(2, 3, 11, 5)),
    );

    c.fetch_tasks(filters.clone()).await.unwrap();
    let created = c.create_task(&TaskInput::new("New")).await.unwrap();

    assert_eq!(created.id, "t9");
    assert_eq!(
        c.transport().calls(),
        ["GET /api/tasks", "POST /api/tasks", "GET /api/tasks"]
    );
    assert_eq!(c.transport().requests()[2].query, filters.to_query());
    assert_eq!(c.tasks().items.len(), 1);
    assert_eq!(c.tasks().pagination.total_items, 11);
}

#[tokio::test]
async fn update_and_delete_each_trigger_a_reload() {
    let c = coordinator();
    c.transport().respond(
        Put,
        "/api/tasks/t1",
        200,
        json!({ "task": task_json("t1", "Renamed", "done") }),
    );
    c.transport().respond(
        Get,
        "/api/tasks",
        200,
        task_page(&[task_json("t1", "Renamed", "done")], pagination(1, 1, 1, 10)),
    );
    c.transport()
        .respond(Delete, "/api/tasks/t1", 200, json!({ "message": "Task deleted" }));
    c.transport()
        .respond(Get, "/api/tasks", 200, task_page(&[], pagination(1, 1, 0, 10)));

    let input = TaskInput {
        status: TaskStatus::Done,
        ..TaskInput::new("Renamed")
    };
    let updated = c.update_task("t1", &input).await.unwrap();
    assert_eq!(updated.title, "Renamed");
    assert_eq!(c.tasks().items[0].title, "Renamed");

    c.delete_task("t1").await.unwrap();
    assert!(c.tasks().items.is_empty());

    assert_eq!(
        c.transport().calls(),
        [
            "PUT /api/tasks/t1",
            "GET /api/tasks",
            "DELETE /api/tasks/t1",
            "GET /api/tasks"
        ]
    );
}

#[tokio::test]
async fn failed_mutation_does_not_reload() {
    let c = coordinator();
    c.transport()
        .respond(Post, "/api/tasks", 400, error_body("Title is required"));

    let err = c.create_task(&TaskInput::new("")).await.unwrap_err();
    assert_eq!(err.to_string(), "Title is required");
    assert_eq!(c.error().as_deref(), Some("Title is required"));
    assert_eq!(c.transport().calls(), ["POST /api/tasks"]);
    assert_eq!(c.transport().pending(), 0);
}

#[tokio::test]
async fn write_succeeds_even_when_reload_fails() {
    let c = coordinator();
    c.transport()
        .respond(Delete, "/api/tasks/t1", 200, json!({ "message": "Task deleted" }));
    c.transport()
        .respond(Get, "/api/tasks", 503, error_body("Service unavailable"));

    c.delete_task("t1").await.unwrap();
    assert_eq!(c.error().as_deref(), Some("Service unavailable"));
}

#[tokio::test]
async fn get_task_does_not_touch_cached_list() {
    let c = coordinator();
    c.transport().respond(
        Get,
        "/api/tasks",
        200,
        task_page(&[task_json("t1", "T1", "todo")], pagination(1, 1, 1, 10)),
    );
    c.transport()
        .respond(Get, "/api/tasks/t2", 200, json!({ "task": task_json("t2", "T2", "done") }));
    c.transport()
        .respond(Get, "/api/tasks/t3", 404, error_body("Task not found"));

    c.fetch_tasks(Filters::new()).await.unwrap();
    let before = c.tasks();

    let task = c.get_task("t2").await.unwrap();
    assert_eq!(task.title, "T2");
    assert_eq!(c.tasks(), before);

    let err = c.get_task("t3").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(c.error().as_deref(), Some("Task not found"));
    assert_eq!(c.tasks(), before);
}

#[tokio::test]
async fn deleting_last_item_on_last_page_leaves_page_past_end() {
    let c = coordinator();
    let filters = Filters::new().with("page", 3).with("limit", 10);
    c.transport().respond(
        Get,
        "/api/tasks",
        200,
        task_page(&[task_json("t21", "Last", "todo")], pagination(3, 3, 21, 10)),
    );
    c.transport()
        .respond(Delete, "/api/tasks/t21", 200, json!({ "message": "Task deleted" }));
    c.transport()
        .respond(Get, "/api/tasks", 200, task_page(&[], pagination(3, 2, 20, 10)));

    c.fetch_tasks(filters.clone()).await.unwrap();
    c.delete_task("t21").await.unwrap();

    // The reload reuses page=3 untouched; correcting it is the caller's job.
    assert_eq!(c.transport().requests()[2].query, filters.to_query());
    assert_eq!(c.task_filters(), filters);
    let tasks = c.tasks();
    assert!(tasks.items.is_empty());
    assert!(tasks.pagination.is_past_end());
}

// --- users ---

#[tokio::test]
async fn update_role_reloads_users() {
    let c = coordinator();
    c.transport().respond(
        Get,
        "/api/users",
        200,
        user_page(&[user_json("u2", "Grace", "member")], pagination(1, 1, 1, 10)),
    );
    c.transport().respond(
        Patch,
        "/api/users/u2/role",
        200,
        json!({ "user": user_json("u2", "Grace", "admin") }),
    );
    c.transport().respond(
        Get,
        "/api/users",
        200,
        user_page(&[user_json("u2", "Grace", "admin")], pagination(1, 1, 1, 10)),
    );

    c.fetch_users(Filters::new().with("page", 1)).await.unwrap();
    c.update_user_role("u2", Role::Admin).await.unwrap();

    assert_eq!(
        c.transport().calls(),
        ["GET /api/users", "PATCH /api/users/u2/role", "GET /api/users"]
    );
    assert_eq!(c.users().items[0].role, Role::Admin);
    assert_eq!(
        c.transport().requests()[1].body.as_deref(),
        Some(r#"{"role":"admin"}"#)
    );
}

#[tokio::test]
async fn forbidden_role_change_surfaces_error() {
    let c = coordinator();
    c.transport()
        .respond(Patch, "/api/users/u2/role", 403, error_body("Access denied. Admin only."));

    c.update_user_role("u2", Role::Admin).await.unwrap_err();
    assert_eq!(c.error().as_deref(), Some("Access denied. Admin only."));
    assert!(c.users().items.is_empty());
}

// --- stats ---

#[tokio::test]
async fn stats_are_replaced_wholesale_and_kept_on_failure() {
    let c = coordinator();
    c.transport().respond(
        Get,
        "/api/stats/overview",
        200,
        json!({
            "tasksByStatus": { "todo": 3, "in-progress": 1, "done": 2 },
            "tasksByPriority": { "low": 1, "medium": 4, "high": 1 },
            "overdueTasks": 1,
            "totalTasks": 6,
            "userCount": 2,
            "recentActivity": [{
                "userId": { "_id": "u1", "name": "Ada" },
                "taskId": { "_id": "t1", "title": "T1" },
                "action": "create",
                "timestamp": "2024-05-01T12:00:00Z"
            }]
        }),
    );
    c.transport()
        .respond(Get, "/api/stats/overview", 200, json!({ "totalTasks": 0 }));
    c.transport()
        .respond(Get, "/api/stats/overview", 500, error_body("Stats unavailable"));

    c.fetch_stats().await.unwrap();
    let stats = c.stats();
    assert_eq!(stats.tasks_by_status.todo, 3);
    assert_eq!(stats.user_count, Some(2));
    assert_eq!(stats.recent_activity.len(), 1);
    assert!(!c.stats_loading());

    // A sparse response replaces everything rather than merging into it.
    c.fetch_stats().await.unwrap();
    assert_eq!(c.stats(), StatsSnapshot::default());

    let before = c.stats();
    c.fetch_stats().await.unwrap_err();
    assert_eq!(c.stats(), before);
    assert_eq!(c.error().as_deref(), Some("Stats unavailable"));
}

// --- errors and logout ---

#[tokio::test]
async fn clear_error_resets_slot() {
    let c = coordinator();
    c.transport().unreachable(Get, "/api/stats/overview");

    c.fetch_stats().await.unwrap_err();
    assert!(c.error().is_some());
    c.clear_error();
    assert_eq!(c.error(), None);
}

#[tokio::test]
async fn logout_resets_every_store_even_if_server_call_fails() {
    let c = coordinator();
    let t = c.transport();
    t.respond(Post, "/api/auth/login", 200, json!({ "user": user_json("u1", "Ada", "admin") }));
    t.respond(
        Get,
        "/api/tasks",
        200,
        task_page(&[task_json("t1", "T1", "todo")], pagination(2, 4, 31, 10)),
    );
    t.respond(
        Get,
        "/api/users",
        200,
        user_page(&[user_json("u1", "Ada", "admin")], pagination(1, 1, 1, 10)),
    );
    t.respond(Get, "/api/stats/overview", 200, json!({ "totalTasks": 31, "userCount": 1 }));
    t.unreachable(Post, "/api/auth/logout");

    c.login(&bad_login()).await.unwrap();
    c.fetch_tasks(Filters::new().with("page", 2)).await.unwrap();
    c.fetch_users(Filters::new()).await.unwrap();
    c.fetch_stats().await.unwrap();

    c.logout().await;

    assert!(!c.is_authenticated());
    assert!(c.tasks().items.is_empty());
    assert_eq!(c.tasks().pagination, Pagination::default());
    assert!(c.users().items.is_empty());
    assert_eq!(c.users().pagination, Pagination::default());
    assert_eq!(c.stats(), StatsSnapshot::default());
    assert!(c.task_filters().is_empty());
    assert_eq!(c.error(), None);
    assert_eq!(c.transport().calls().last().unwrap(), "POST /api/auth/logout");
}
