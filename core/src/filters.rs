//! Filter parameter bags for list calls.
//!
//! The stores treat [`Filters`] as opaque: whatever the caller passes is sent
//! as query parameters and remembered for the post-mutation re-fetch.
//! [`TaskFilters`] and [`UserFilters`] are typed conveniences that convert
//! into it.

use crate::types::{Priority, TaskStatus};

/// Ordered key/value query parameters. Setting an existing key replaces its
/// value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    params: Vec<(String, String)>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let value = value.to_string();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.params.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameters to put on the wire. Blank values mean "no filter" and are
    /// left out.
    pub fn to_query(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .cloned()
            .collect()
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Filters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut filters = Filters::new();
        for (k, v) in iter {
            filters.set(k, v);
        }
        filters
    }
}

/// Typed filters for the task list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilters {
    pub search: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    /// Id of the assigned user.
    pub assignee: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// `field:asc` or `field:desc`, e.g. `createdAt:desc`.
    pub sort: Option<String>,
}

impl From<TaskFilters> for Filters {
    fn from(f: TaskFilters) -> Self {
        let mut filters = Filters::new();
        if let Some(search) = f.search {
            filters.set("search", search);
        }
        if let Some(status) = f.status {
            filters.set("status", status.as_str());
        }
        if let Some(priority) = f.priority {
            filters.set("priority", priority.as_str());
        }
        if let Some(assignee) = f.assignee {
            filters.set("assignee", assignee);
        }
        if let Some(page) = f.page {
            filters.set("page", page);
        }
        if let Some(limit) = f.limit {
            filters.set("limit", limit);
        }
        if let Some(sort) = f.sort {
            filters.set("sort", sort);
        }
        filters
    }
}

/// Typed filters for the user list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserFilters {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl From<UserFilters> for Filters {
    fn from(f: UserFilters) -> Self {
        let mut filters = Filters::new();
        if let Some(page) = f.page {
            filters.set("page", page);
        }
        if let Some(limit) = f.limit {
            filters.set("limit", limit);
        }
        filters
    }
}
