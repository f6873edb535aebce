/// Generic paginated list controller
use crate::{
    error::Notice,
    http::{ApiClient, PageData},
    list::{FilterPatch, PaginatedList},
};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

const LOAD_FAILED: &str = "Failed to load list";

/// Observable state of a list screen
#[derive(Debug, Clone)]
pub struct ListState<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
    pub filters: BTreeMap<String, String>,
    pub loading: bool,
    pub error: Option<Notice>,
}

impl<T: Clone> ListState<T> {
    pub fn to_page(&self) -> PaginatedList<T> {
        PaginatedList {
            items: self.items.clone(),
            total: self.total,
            page: self.page,
            size: self.size,
        }
    }
}

/// What happened to a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Result applied to the state
    Applied,
    /// Request failed; state cleared and error recorded
    Failed,
    /// A newer request was issued meanwhile; result dropped
    Discarded,
    /// Debounced keyword replaced by a later keystroke before firing
    Superseded,
}

/// Fetch-on-change list state for one collection endpoint
///
/// Each fetch takes a generation token; only the response holding the
/// latest token is applied (last request wins).
pub struct ListController<T> {
    client: ApiClient,
    endpoint: String,
    state: Mutex<ListState<T>>,
    generation: AtomicU64,
    keyword_generation: AtomicU64,
    debounce: Duration,
}

impl<T> ListController<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(client: ApiClient, endpoint: impl Into<String>, size: u32, debounce: Duration) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            state: Mutex::new(ListState {
                items: Vec::new(),
                total: 0,
                page: 1,
                size: size.max(1),
                filters: BTreeMap::new(),
                loading: false,
                error: None,
            }),
            generation: AtomicU64::new(0),
            keyword_generation: AtomicU64::new(0),
            debounce,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn snapshot(&self) -> ListState<T> {
        self.state.lock().clone()
    }

    pub fn items(&self) -> Vec<T> {
        self.state.lock().items.clone()
    }

    pub fn total(&self) -> u64 {
        self.state.lock().total
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    pub fn error(&self) -> Option<Notice> {
        self.state.lock().error.clone()
    }

    /// Merge `patch` into the filters, go back to page 1 and refetch
    pub async fn set_filter(&self, patch: FilterPatch) -> FetchOutcome {
        {
            let mut state = self.state.lock();
            patch.apply_to(&mut state.filters);
            state.page = 1;
        }
        self.refetch().await
    }

    /// Debounced free-text filter
    ///
    /// Returns `Superseded` without fetching when another keystroke
    /// arrives within the debounce window.
    pub async fn set_keyword(&self, keyword: &str) -> FetchOutcome {
        let ticket = self.keyword_generation.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.debounce.is_zero() {
            tokio::time::sleep(self.debounce).await;
        }
        if self.keyword_generation.load(Ordering::SeqCst) != ticket {
            return FetchOutcome::Superseded;
        }
        self.set_filter(FilterPatch::new().set("keyword", keyword.trim())).await
    }

    /// Move to page `page` (1-based), keeping filters
    pub async fn set_page(&self, page: u32) -> FetchOutcome {
        self.state.lock().page = page.max(1);
        self.refetch().await
    }

    pub async fn set_page_size(&self, size: u32) -> FetchOutcome {
        {
            let mut state = self.state.lock();
            state.size = size.max(1);
            state.page = 1;
        }
        self.refetch().await
    }

    /// Re-issue the current query
    pub async fn refetch(&self) -> FetchOutcome {
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let (query, page, size) = {
            let mut state = self.state.lock();
            state.loading = true;
            let mut query: Vec<(String, String)> = vec![
                ("page".to_string(), state.page.to_string()),
                ("size".to_string(), state.size.to_string()),
            ];
            query.extend(state.filters.iter().map(|(k, v)| (k.clone(), v.clone())));
            (query, state.page, state.size)
        };
        let query: Vec<(&str, String)> = query.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();

        let result = self.client.get::<PageData<T>>(&self.endpoint, &query).await;

        let mut state = self.state.lock();
        if self.generation.load(Ordering::SeqCst) != token {
            debug!("Discarding stale response for {} (token {})", self.endpoint, token);
            return FetchOutcome::Discarded;
        }
        state.loading = false;

        match result {
            Ok(data) => {
                let page = PaginatedList::from_page(data, page, size);
                state.items = page.items;
                state.total = page.total;
                state.error = None;
                FetchOutcome::Applied
            }
            Err(e) => {
                warn!("Failed to load {}: {}", self.endpoint, e);
                state.items.clear();
                state.total = 0;
                state.error = Some(Notice::from_error(&e, LOAD_FAILED));
                FetchOutcome::Failed
            }
        }
    }
}
