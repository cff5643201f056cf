//! Paginated, filterable resource cache.
//!
//! # Design
//! One generic [`ResourceStore`] serves both tasks and users; the
//! [`Resource`] impls only say which list endpoint to call and how to unpack
//! it.
//!
//! Consistency policy: the cache is never patched locally. A successful list
//! call replaces `items` and `pagination` wholesale, a failed one leaves them
//! untouched, and every successful mutation is followed by a re-fetch with
//! the filters most recently passed to `fetch`. The re-fetch is awaited
//! after the mutation's response, never issued alongside it.
//!
//! Concurrent fetches are not sequenced: whichever response resolves last
//! determines the cached state. The store also does not correct a page that
//! falls past the end after a delete; see [`Pagination::is_past_end`].

use std::cell::{Cell, RefCell};
use std::marker::PhantomData;

use crate::client::TaskboardClient;
use crate::context::{Context, Epoch};
use crate::error::ApiError;
use crate::filters::Filters;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{Pagination, Role, Task, TaskInput, UserSummary};

/// A collection the server exposes through a paginated list endpoint.
pub trait Resource {
    type Item: Clone;

    /// Used in log fields.
    const NAME: &'static str;

    fn build_list(client: &TaskboardClient, filters: &Filters) -> HttpRequest;

    fn parse_list(
        client: &TaskboardClient,
        response: HttpResponse,
    ) -> Result<(Vec<Self::Item>, Pagination), ApiError>;
}

#[derive(Debug)]
pub struct Tasks;

impl Resource for Tasks {
    type Item = Task;
    const NAME: &'static str = "tasks";

    fn build_list(client: &TaskboardClient, filters: &Filters) -> HttpRequest {
        client.build_list_tasks(filters)
    }

    fn parse_list(
        client: &TaskboardClient,
        response: HttpResponse,
    ) -> Result<(Vec<Task>, Pagination), ApiError> {
        client
            .parse_list_tasks(response)
            .map(|page| (page.tasks, page.pagination))
    }
}

#[derive(Debug)]
pub struct Users;

impl Resource for Users {
    type Item = UserSummary;
    const NAME: &'static str = "users";

    fn build_list(client: &TaskboardClient, filters: &Filters) -> HttpRequest {
        client.build_list_users(filters)
    }

    fn parse_list(
        client: &TaskboardClient,
        response: HttpResponse,
    ) -> Result<(Vec<UserSummary>, Pagination), ApiError> {
        client
            .parse_list_users(response)
            .map(|page| (page.users, page.pagination))
    }
}

/// Owned snapshot of a store, as handed to readers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
    pub loading: bool,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pagination: Pagination::default(),
            loading: false,
        }
    }
}

pub struct ResourceStore<R: Resource> {
    items: RefCell<Vec<R::Item>>,
    pagination: Cell<Pagination>,
    loading: Cell<bool>,
    last_filters: RefCell<Filters>,
    epoch: Epoch,
    _resource: PhantomData<R>,
}

impl<R: Resource> Default for ResourceStore<R> {
    fn default() -> Self {
        Self {
            items: RefCell::new(Vec::new()),
            pagination: Cell::new(Pagination::default()),
            loading: Cell::new(false),
            last_filters: RefCell::new(Filters::default()),
            epoch: Epoch::default(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> ResourceStore<R> {
    pub fn snapshot(&self) -> Collection<R::Item> {
        Collection {
            items: self.items.borrow().clone(),
            pagination: self.pagination.get(),
            loading: self.loading.get(),
        }
    }

    /// Filters the next post-mutation re-fetch will use.
    pub fn last_filters(&self) -> Filters {
        self.last_filters.borrow().clone()
    }

    pub(crate) async fn fetch(&self, ctx: &Context<'_>, filters: Filters) -> Result<(), ApiError> {
        let token = self.epoch.token();
        self.loading.set(true);
        ctx.errors.clear();

        let request = R::build_list(ctx.client, &filters);
        *self.last_filters.borrow_mut() = filters;
        let result = ctx.send(request, R::parse_list).await;
        if !self.epoch.is_current(token) {
            tracing::debug!(resource = R::NAME, "dropping list response after reset");
            return result.map(drop);
        }

        self.loading.set(false);
        match result {
            Ok((items, pagination)) => {
                tracing::debug!(resource = R::NAME, count = items.len(), "list refreshed");
                *self.items.borrow_mut() = items;
                self.pagination.set(pagination);
                Ok(())
            }
            Err(err) => {
                ctx.errors.record(&err);
                Err(err)
            }
        }
    }

    /// Re-fetch with the last-used filters.
    pub(crate) async fn refresh(&self, ctx: &Context<'_>) -> Result<(), ApiError> {
        let filters = self.last_filters();
        self.fetch(ctx, filters).await
    }

    /// Run a write and, once it has succeeded, reload the collection.
    ///
    /// A failed reload does not fail the write: the write did happen, and the
    /// reload's error is already in ErrorState. A write that settles after a
    /// reset neither reloads nor records its error.
    async fn write_through<V>(
        &self,
        ctx: &Context<'_>,
        request: Result<HttpRequest, ApiError>,
        parse: impl FnOnce(&TaskboardClient, HttpResponse) -> Result<V, ApiError>,
    ) -> Result<V, ApiError> {
        let token = self.epoch.token();
        let result = ctx.send_built(request, parse).await;
        if !self.epoch.is_current(token) {
            tracing::debug!(resource = R::NAME, "skipping reload after reset");
            return result;
        }

        match result {
            Ok(value) => {
                if let Err(err) = self.refresh(ctx).await {
                    tracing::warn!(resource = R::NAME, detail = err.detail(), "reload after write failed");
                }
                Ok(value)
            }
            Err(err) => {
                ctx.errors.record(&err);
                Err(err)
            }
        }
    }

    pub(crate) fn reset(&self) {
        self.epoch.advance();
        self.items.borrow_mut().clear();
        self.pagination.set(Pagination::default());
        self.loading.set(false);
        *self.last_filters.borrow_mut() = Filters::default();
    }
}

impl ResourceStore<Tasks> {
    /// Fetch one task without touching the cached list.
    pub(crate) async fn get_one(&self, ctx: &Context<'_>, id: &str) -> Result<Task, ApiError> {
        let result = ctx
            .send(ctx.client.build_get_task(id), |c, r| c.parse_get_task(r))
            .await;
        if let Err(err) = &result {
            ctx.errors.record(err);
        }
        result
    }

    pub(crate) async fn create(&self, ctx: &Context<'_>, input: &TaskInput) -> Result<Task, ApiError> {
        let request = ctx.client.build_create_task(input);
        self.write_through(ctx, request, |c, r| c.parse_create_task(r))
            .await
    }

    pub(crate) async fn update(
        &self,
        ctx: &Context<'_>,
        id: &str,
        input: &TaskInput,
    ) -> Result<Task, ApiError> {
        let request = ctx.client.build_update_task(id, input);
        self.write_through(ctx, request, |c, r| c.parse_update_task(r))
            .await
    }

    pub(crate) async fn delete(&self, ctx: &Context<'_>, id: &str) -> Result<(), ApiError> {
        let request = Ok(ctx.client.build_delete_task(id));
        self.write_through(ctx, request, |c, r| c.parse_delete_task(r))
            .await
    }
}

impl ResourceStore<Users> {
    pub(crate) async fn update_role(
        &self,
        ctx: &Context<'_>,
        id: &str,
        role: Role,
    ) -> Result<(), ApiError> {
        let request = ctx.client.build_update_user_role(id, role);
        self.write_through(ctx, request, |c, r| c.parse_update_user_role(r))
            .await
    }
}
