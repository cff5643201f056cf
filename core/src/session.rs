//! Authentication session lifecycle.
//!
//! # Design
//! `Session` stores only the optional user, so "authenticated" and "has a
//! user" cannot drift apart. The startup check reports its outcome as an
//! [`AuthCheck`] instead of swallowing errors: a 401 is the expected "no
//! session" answer, anything else is a failure worth logging. Neither is
//! written to ErrorState.

use std::cell::RefCell;

use crate::context::{Context, Epoch};
use crate::error::ApiError;
use crate::types::{Credentials, Registration, UserSummary};

/// Current identity and whether an auth call is in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user: Option<UserSummary>,
    pub loading: bool,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(UserSummary::is_admin)
    }
}

/// Outcome of the startup session check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthCheck {
    Authenticated(UserSummary),
    /// No session cookie, or the session expired.
    Unauthenticated,
    /// The check itself failed (network, server error, bad payload).
    Failed(String),
}

#[derive(Debug, Default)]
pub struct SessionManager {
    state: RefCell<Session>,
    epoch: Epoch,
}

impl SessionManager {
    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub(crate) async fn check_auth(&self, ctx: &Context<'_>) -> AuthCheck {
        let token = self.epoch.token();
        self.set_loading(true);
        let result = ctx.send(ctx.client.build_me(), |c, r| c.parse_me(r)).await;
        if !self.epoch.is_current(token) {
            return AuthCheck::Unauthenticated;
        }

        let mut state = self.state.borrow_mut();
        state.loading = false;
        match result {
            Ok(user) => {
                state.user = Some(user.clone());
                AuthCheck::Authenticated(user)
            }
            Err(err) if err.is_unauthorized() => {
                state.user = None;
                AuthCheck::Unauthenticated
            }
            Err(err) => {
                tracing::warn!(detail = err.detail(), "session check failed");
                state.user = None;
                AuthCheck::Failed(err.to_string())
            }
        }
    }

    pub(crate) async fn login(
        &self,
        ctx: &Context<'_>,
        credentials: &Credentials,
    ) -> Result<UserSummary, ApiError> {
        let request = ctx.client.build_login(credentials);
        self.authenticate(ctx, ctx.send_built(request, |c, r| c.parse_login(r)))
            .await
    }

    pub(crate) async fn register(
        &self,
        ctx: &Context<'_>,
        registration: &Registration,
    ) -> Result<UserSummary, ApiError> {
        let request = ctx.client.build_register(registration);
        self.authenticate(ctx, ctx.send_built(request, |c, r| c.parse_register(r)))
            .await
    }

    async fn authenticate(
        &self,
        ctx: &Context<'_>,
        call: impl std::future::Future<Output = Result<UserSummary, ApiError>>,
    ) -> Result<UserSummary, ApiError> {
        let token = self.epoch.token();
        self.set_loading(true);
        ctx.errors.clear();
        let result = call.await;
        if !self.epoch.is_current(token) {
            return result;
        }

        self.set_loading(false);
        match result {
            Ok(user) => {
                self.state.borrow_mut().user = Some(user.clone());
                tracing::info!(user = %user.id, "signed in");
                Ok(user)
            }
            Err(err) => {
                ctx.errors.record(&err);
                Err(err)
            }
        }
    }

    /// Tell the server to end the session. Failure is logged and otherwise
    /// ignored; the local reset happens regardless.
    pub(crate) async fn end_remote_session(&self, ctx: &Context<'_>) {
        if let Err(err) = ctx
            .send(ctx.client.build_logout(), |c, r| c.parse_logout(r))
            .await
        {
            tracing::warn!(detail = err.detail(), "logout request failed");
        }
    }

    pub(crate) fn reset(&self) {
        self.epoch.advance();
        *self.state.borrow_mut() = Session::default();
    }

    fn set_loading(&self, loading: bool) {
        self.state.borrow_mut().loading = loading;
    }
}
