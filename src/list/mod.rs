/// Paginated lists
///
/// [`PaginatedList`] is one normalized page; [`ListController`] owns the
/// filter and cursor state of a screen and keeps its page fresh.

pub mod controller;

pub use controller::{FetchOutcome, ListController, ListState};

use crate::http::PageData;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// One page of a server-ordered collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedList<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
}

impl<T> PaginatedList<T> {
    pub fn empty(page: u32, size: u32) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page,
            size,
        }
    }

    /// Normalize a server page so that `items.len() <= size` and
    /// `total >= items.len()` hold
    pub fn from_page(data: PageData<T>, page: u32, size: u32) -> Self {
        let mut items = data.items;
        if items.len() > size as usize {
            warn!(
                "Server returned {} items for page size {}, truncating",
                items.len(),
                size
            );
            items.truncate(size as usize);
        }
        let total = data.total.max(items.len() as u64);
        Self {
            items,
            total,
            page,
            size,
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.size))
    }
}

/// Changes to apply to a controller's filters
///
/// `None` or an empty string removes the key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPatch {
    changes: BTreeMap<String, Option<String>>,
}

impl FilterPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        let value = if value.trim().is_empty() { None } else { Some(value) };
        self.changes.insert(key.into(), value);
        self
    }

    pub fn clear(mut self, key: impl Into<String>) -> Self {
        self.changes.insert(key.into(), None);
        self
    }

    pub fn maybe(self, key: impl Into<String>, value: Option<String>) -> Self {
        match value {
            Some(value) => self.set(key, value),
            None => self.clear(key),
        }
    }

    pub fn apply_to(self, filters: &mut BTreeMap<String, String>) {
        for (key, value) in self.changes {
            match value {
                Some(value) => {
                    filters.insert(key, value);
                }
                None => {
                    filters.remove(&key);
                }
            }
        }
    }
}
