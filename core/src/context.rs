//! Shared plumbing handed to every stateful component.
//!
//! # Design
//! Components never own the transport or the error slot. The coordinator
//! lends them a [`Context`] for the duration of one operation, which keeps
//! "only the transport does I/O" and "one shared ErrorState" true by
//! construction.
//!
//! State lives in `Cell`/`RefCell` because the coordinator is driven from a
//! single thread and operations may interleave at `.await` points. No borrow
//! is ever held across an `.await`.

use std::cell::{Cell, RefCell};

use crate::client::TaskboardClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};

/// The single last-error slot shared by every operation. Last write wins.
#[derive(Debug, Default)]
pub struct ErrorState {
    slot: RefCell<Option<String>>,
}

impl ErrorState {
    pub fn get(&self) -> Option<String> {
        self.slot.borrow().clone()
    }

    pub fn record(&self, err: &ApiError) {
        *self.slot.borrow_mut() = Some(err.to_string());
    }

    pub fn clear(&self) {
        *self.slot.borrow_mut() = None;
    }
}

/// Reset counter used to drop responses that land after a logout.
///
/// An operation takes a token when it starts; if the owner was reset before
/// the response arrived, the token no longer matches and the result is
/// discarded instead of repopulating cleared state.
#[derive(Debug, Default)]
pub(crate) struct Epoch(Cell<u64>);

impl Epoch {
    pub(crate) fn token(&self) -> u64 {
        self.0.get()
    }

    pub(crate) fn is_current(&self, token: u64) -> bool {
        self.0.get() == token
    }

    pub(crate) fn advance(&self) {
        self.0.set(self.0.get().wrapping_add(1));
    }
}

/// Borrowed view of the transport, client and error slot for one operation.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub transport: &'a dyn Transport,
    pub client: &'a TaskboardClient,
    pub errors: &'a ErrorState,
}

impl<'a> Context<'a> {
    /// Execute `request` and hand the response to `parse`.
    ///
    /// Failures come back already normalized; this does not touch
    /// [`ErrorState`], callers decide whether a failure is surfaced.
    pub async fn send<V>(
        &self,
        request: HttpRequest,
        parse: impl FnOnce(&TaskboardClient, HttpResponse) -> Result<V, ApiError>,
    ) -> Result<V, ApiError> {
        let method = request.method;
        let path = request.path.clone();
        let result = match self.transport.execute(request).await {
            Ok(response) => parse(self.client, response),
            Err(err) => Err(err),
        };
        if let Err(err) = &result {
            tracing::debug!(
                method = method.as_str(),
                path = %path,
                status = ?err.status(),
                detail = err.detail(),
                "request failed"
            );
        }
        result
    }

    /// Like [`Context::send`] for requests whose construction can fail.
    pub async fn send_built<V>(
        &self,
        request: Result<HttpRequest, ApiError>,
        parse: impl FnOnce(&TaskboardClient, HttpResponse) -> Result<V, ApiError>,
    ) -> Result<V, ApiError> {
        match request {
            Ok(request) => self.send(request, parse).await,
            Err(err) => {
                tracing::warn!(detail = err.detail(), "could not encode request");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_state_is_last_write_wins() {
        let errors = ErrorState::default();
        assert_eq!(errors.get(), None);

        errors.record(&ApiError::Server {
            status: 400,
            message: "Title is required".to_string(),
        });
        errors.record(&ApiError::Server {
            status: 403,
            message: "Forbidden".to_string(),
        });
        assert_eq!(errors.get().as_deref(), Some("Forbidden"));

        errors.clear();
        assert_eq!(errors.get(), None);
    }

    #[test]
    fn epoch_invalidates_old_tokens() {
        let epoch = Epoch::default();
        let token = epoch.token();
        assert!(epoch.is_current(token));
        epoch.advance();
        assert!(!epoch.is_current(token));
        assert!(epoch.is_current(epoch.token()));
    }
}
