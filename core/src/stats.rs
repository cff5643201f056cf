//! Overview statistics cache.
//!
//! The snapshot is replaced as a whole on every successful fetch. A failed
//! fetch keeps the previous snapshot.

use std::cell::{Cell, RefCell};

use crate::context::{Context, Epoch};
use crate::error::ApiError;
use crate::types::StatsSnapshot;

#[derive(Debug, Default)]
pub struct StatsAggregator {
    snapshot: RefCell<StatsSnapshot>,
    loading: Cell<bool>,
    epoch: Epoch,
}

impl StatsAggregator {
    pub fn snapshot(&self) -> StatsSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    pub(crate) async fn fetch(&self, ctx: &Context<'_>) -> Result<(), ApiError> {
        let token = self.epoch.token();
        self.loading.set(true);
        ctx.errors.clear();

        let result = ctx
            .send(ctx.client.build_stats_overview(), |c, r| c.parse_stats_overview(r))
            .await;
        if !self.epoch.is_current(token) {
            return result.map(drop);
        }

        self.loading.set(false);
        match result {
            Ok(snapshot) => {
                *self.snapshot.borrow_mut() = snapshot;
                Ok(())
            }
            Err(err) => {
                ctx.errors.record(&err);
                Err(err)
            }
        }
    }

    pub(crate) fn reset(&self) {
        self.epoch.advance();
        *self.snapshot.borrow_mut() = StatsSnapshot::default();
        self.loading.set(false);
    }
}
