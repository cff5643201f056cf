//! Client-side application state for the taskboard service.
//!
//! # Overview
//! [`Coordinator`] is the single state object a dashboard UI talks to. It
//! owns the authentication session, paginated caches of tasks and users, the
//! overview statistics, and one shared error slot. Pages call its async
//! operations and read owned snapshots back.
//!
//! # Design
//! - `TaskboardClient` is stateless: `build_*` produces an `HttpRequest`,
//!   `parse_*` consumes an `HttpResponse` and normalizes failures.
//! - A [`Transport`] executes requests; [`HttpTransport`] is the reqwest
//!   implementation, tests substitute scripted ones.
//! - Stores never patch their cache locally. Every successful write is
//!   followed by a re-fetch with the last-used filters.
//! - Everything runs on one thread; interleaved operations resolve in
//!   last-resolved-wins order.

pub mod client;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod filters;
pub mod http;
pub mod session;
pub mod stats;
pub mod store;
pub mod types;

pub use client::TaskboardClient;
pub use config::ClientConfig;
pub use context::ErrorState;
pub use coordinator::Coordinator;
pub use error::{ApiError, ConfigError, FALLBACK_MESSAGE};
pub use filters::{Filters, TaskFilters, UserFilters};
pub use http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, Transport};
pub use session::{AuthCheck, Session};
pub use store::Collection;
pub use types::{
    parse_tags, ActivityAction, ActivityEntry, Credentials, Pagination, Priority, PriorityCounts,
    Registration, Role, StatsSnapshot, StatusCounts, Task, TaskInput, TaskPage, TaskRef,
    TaskStatus, UserPage, UserRef, UserSummary,
};
