//! The application state coordinator.
//!
//! # Design
//! [`Coordinator`] is the one state object the UI layer holds (by reference,
//! typically behind an `Rc`). It owns the transport, the endpoint client and
//! the shared ErrorState, and lends them to the session manager, the two
//! resource stores and the stats aggregator for each operation.
//!
//! Readers get owned snapshots; writers go through the named async
//! operations below. Nothing here enforces authorization: admin-only
//! operations are rejected by the server, and the rejection surfaces through
//! ErrorState like any other failure.

use crate::client::TaskboardClient;
use crate::config::ClientConfig;
use crate::context::{Context, ErrorState};
use crate::error::ApiError;
use crate::filters::Filters;
use crate::http::{HttpTransport, Transport};
use crate::session::{AuthCheck, Session, SessionManager};
use crate::stats::StatsAggregator;
use crate::store::{Collection, ResourceStore, Tasks, Users};
use crate::types::{
    Credentials, Registration, Role, StatsSnapshot, Task, TaskInput, UserSummary,
};

pub struct Coordinator<T: Transport> {
    transport: T,
    client: TaskboardClient,
    errors: ErrorState,
    session: SessionManager,
    tasks: ResourceStore<Tasks>,
    users: ResourceStore<Users>,
    stats: StatsAggregator,
}

impl Coordinator<HttpTransport> {
    /// Build a coordinator over HTTP and run the startup session check.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be constructed. A failed
    /// session check is not an error; it leaves the session anonymous.
    pub async fn connect(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let coordinator = Self::new(HttpTransport::from_config(config)?, &config.base_url);
        coordinator.check_auth().await;
        Ok(coordinator)
    }
}

impl<T: Transport> Coordinator<T> {
    pub fn new(transport: T, base_url: &str) -> Self {
        Self {
            transport,
            client: TaskboardClient::new(base_url),
            errors: ErrorState::default(),
            session: SessionManager::default(),
            tasks: ResourceStore::default(),
            users: ResourceStore::default(),
            stats: StatsAggregator::default(),
        }
    }

    fn ctx(&self) -> Context<'_> {
        Context {
            transport: &self.transport,
            client: &self.client,
            errors: &self.errors,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn session(&self) -> Session {
        self.session.snapshot()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.snapshot().is_authenticated()
    }

    pub fn current_user(&self) -> Option<UserSummary> {
        self.session.snapshot().user
    }

    pub async fn check_auth(&self) -> AuthCheck {
        self.session.check_auth(&self.ctx()).await
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<UserSummary, ApiError> {
        self.session.login(&self.ctx(), credentials).await
    }

    pub async fn register(&self, registration: &Registration) -> Result<UserSummary, ApiError> {
        self.session.register(&self.ctx(), registration).await
    }

    /// End the session. Always succeeds locally: once the server call has
    /// settled, the session, both stores and the stats snapshot are reset
    /// together with no await in between.
    pub async fn logout(&self) {
        self.session.end_remote_session(&self.ctx()).await;
        self.session.reset();
        self.tasks.reset();
        self.users.reset();
        self.stats.reset();
        tracing::info!("signed out");
    }

    pub fn tasks(&self) -> Collection<Task> {
        self.tasks.snapshot()
    }

    pub fn task_filters(&self) -> Filters {
        self.tasks.last_filters()
    }

    pub async fn fetch_tasks(&self, filters: impl Into<Filters>) -> Result<(), ApiError> {
        self.tasks.fetch(&self.ctx(), filters.into()).await
    }

    pub async fn get_task(&self, id: &str) -> Result<Task, ApiError> {
        self.tasks.get_one(&self.ctx(), id).await
    }

    pub async fn create_task(&self, input: &TaskInput) -> Result<Task, ApiError> {
        self.tasks.create(&self.ctx(), input).await
    }

    pub async fn update_task(&self, id: &str, input: &TaskInput) -> Result<Task, ApiError> {
        self.tasks.update(&self.ctx(), id, input).await
    }

    pub async fn delete_task(&self, id: &str) -> Result<(), ApiError> {
        self.tasks.delete(&self.ctx(), id).await
    }

    pub fn users(&self) -> Collection<UserSummary> {
        self.users.snapshot()
    }

    pub fn user_filters(&self) -> Filters {
        self.users.last_filters()
    }

    pub async fn fetch_users(&self, filters: impl Into<Filters>) -> Result<(), ApiError> {
        self.users.fetch(&self.ctx(), filters.into()).await
    }

    pub async fn update_user_role(&self, id: &str, role: Role) -> Result<(), ApiError> {
        self.users.update_role(&self.ctx(), id, role).await
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn stats_loading(&self) -> bool {
        self.stats.is_loading()
    }

    pub async fn fetch_stats(&self) -> Result<(), ApiError> {
        self.stats.fetch(&self.ctx()).await
    }

    pub fn error(&self) -> Option<String> {
        self.errors.get()
    }

    pub fn clear_error(&self) {
        self.errors.clear();
    }
}
