/// Subscription sync state tracker
///
/// Read-mostly view over the subscription list with per-row and batch
/// sync toggles and a guarded manual sync trigger. Every mutation is
/// followed by a full list refetch; nothing is updated optimistically.
use crate::{
    config::BatchMode,
    error::{ActionOutcome, ConsoleError, FieldError, Notice, NoticeLevel},
    list::{FetchOutcome, FilterPatch, ListController},
    subscriptions::{
        service::SUBSCRIPTIONS_ENDPOINT, ContentSubscription, ContentType, SubscriptionPatch,
        SubscriptionService, SyncReport, TrendView,
    },
};
use futures::future::join_all;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const TOGGLE_FAILED: &str = "Failed to update sync setting";
const ACTIVE_FAILED: &str = "Failed to update subscription";
const DELETE_FAILED: &str = "Failed to delete subscription";
const BATCH_FAILED: &str = "Batch update failed";
const SYNC_FAILED: &str = "Sync failed";
const TREND_FAILED: &str = "Failed to load sync trends";

/// History rows fetched alongside a trend series
const HISTORY_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    /// No ids given; nothing was sent
    Rejected,
    /// Another batch from this tracker is still running
    InProgress,
    Applied { count: usize },
    /// Some ids were updated and some were not
    Partial {
        succeeded: Vec<i64>,
        failed: Vec<(i64, String)>,
    },
    Failed(Notice),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncTriggerOutcome {
    Completed(SyncReport),
    /// A sync for this id is already in flight; no request was sent
    AlreadyRunning,
    Failed(Notice),
}

/// Removes the id from the in-flight set when dropped
struct InFlight<'a> {
    set: &'a Mutex<HashSet<i64>>,
    id: i64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set.lock().remove(&self.id);
    }
}

/// Clears the batch flag when dropped
struct BatchRunning<'a>(&'a AtomicBool);

impl Drop for BatchRunning<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct SyncTracker {
    service: SubscriptionService,
    list: Arc<ListController<ContentSubscription>>,
    batch_mode: BatchMode,
    trend_days: u32,
    in_flight: Mutex<HashSet<i64>>,
    batch_running: AtomicBool,
    selection: Mutex<BTreeSet<i64>>,
    notice: Mutex<Option<Notice>>,
}

impl SyncTracker {
    pub fn new(
        service: SubscriptionService,
        page_size: u32,
        debounce: Duration,
        batch_mode: BatchMode,
        trend_days: u32,
    ) -> Self {
        let list = Arc::new(ListController::new(
            service.client().clone(),
            SUBSCRIPTIONS_ENDPOINT,
            page_size,
            debounce,
        ));
        Self {
            service,
            list,
            batch_mode,
            trend_days: trend_days.max(1),
            in_flight: Mutex::new(HashSet::new()),
            batch_running: AtomicBool::new(false),
            selection: Mutex::new(BTreeSet::new()),
            notice: Mutex::new(None),
        }
    }

    pub fn list(&self) -> &Arc<ListController<ContentSubscription>> {
        &self.list
    }

    pub fn notice(&self) -> Option<Notice> {
        self.notice.lock().clone()
    }

    pub fn is_syncing(&self, id: i64) -> bool {
        self.in_flight.lock().contains(&id)
    }

    pub fn is_batch_running(&self) -> bool {
        self.batch_running.load(Ordering::SeqCst)
    }

    pub async fn filter_by_content_type(&self, content_type: Option<ContentType>) -> FetchOutcome {
        self.list
            .set_filter(FilterPatch::new().maybe("contentType", content_type.map(|c| c.as_str().to_string())))
            .await
    }

    // Selection

    pub fn select(&self, id: i64) {
        self.selection.lock().insert(id);
    }

    pub fn deselect(&self, id: i64) {
        self.selection.lock().remove(&id);
    }

    /// Select every row of the current page
    pub fn select_visible(&self) {
        let ids: Vec<i64> = self.list.items().iter().map(|s| s.id).collect();
        self.selection.lock().extend(ids);
    }

    pub fn clear_selection(&self) {
        self.selection.lock().clear();
    }

    pub fn selected(&self) -> Vec<i64> {
        self.selection.lock().iter().copied().collect()
    }

    // Mutations

    pub async fn toggle_sync(&self, id: i64, enabled: bool) -> ActionOutcome {
        self.update_and_refetch(id, SubscriptionPatch::sync(enabled), TOGGLE_FAILED)
            .await
    }

    /// Admin edit of `isActive`
    pub async fn set_active(&self, id: i64, active: bool) -> ActionOutcome {
        self.update_and_refetch(id, SubscriptionPatch::active(active), ACTIVE_FAILED)
            .await
    }

    async fn update_and_refetch(&self, id: i64, patch: SubscriptionPatch, fallback: &str) -> ActionOutcome {
        match self.service.update(id, patch).await {
            Ok(()) => {
                *self.notice.lock() = Some(Notice::success("Subscription updated"));
                self.list.refetch().await;
                ActionOutcome::Done
            }
            Err(e) => self.fail(&e, fallback),
        }
    }

    pub async fn delete_subscription(&self, id: i64) -> ActionOutcome {
        match self.service.delete(id).await {
            Ok(()) => {
                self.selection.lock().remove(&id);
                *self.notice.lock() = Some(Notice::success("Subscription deleted"));
                self.list.refetch().await;
                ActionOutcome::Done
            }
            Err(e) => self.fail(&e, DELETE_FAILED),
        }
    }

    /// Apply the same sync flag to every id
    ///
    /// Duplicate ids are collapsed. Partial failures name the ids that did
    /// not change.
    pub async fn batch_toggle_sync(&self, ids: &[i64], enabled: bool) -> BatchOutcome {
        let mut seen = HashSet::new();
        let ids: Vec<i64> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
        if ids.is_empty() {
            let notice = Notice::from_error(
                &ConsoleError::Validation(vec![FieldError {
                    field: "ids".to_string(),
                    message: "select at least one subscription".to_string(),
                }]),
                BATCH_FAILED,
            );
            *self.notice.lock() = Some(notice);
            return BatchOutcome::Rejected;
        }

        if self.batch_running.swap(true, Ordering::SeqCst) {
            return BatchOutcome::InProgress;
        }
        let _running = BatchRunning(&self.batch_running);

        let outcome = match self.batch_mode {
            BatchMode::Endpoint => self.batch_via_endpoint(&ids, enabled).await,
            BatchMode::PerItem => self.batch_per_item(&ids, enabled).await,
        };

        match &outcome {
            BatchOutcome::Applied { count } => {
                info!("Sync {} for {} subscriptions", if enabled { "enabled" } else { "disabled" }, count);
                *self.notice.lock() = Some(Notice::success(format!("Updated {} subscriptions", count)));
                self.list.refetch().await;
            }
            BatchOutcome::Partial { succeeded, failed } => {
                let failed_ids: Vec<String> = failed.iter().map(|(id, _)| id.to_string()).collect();
                warn!(
                    "Batch sync toggle partially failed: {} ok, failed ids {}",
                    succeeded.len(),
                    failed_ids.join(",")
                );
                *self.notice.lock() = Some(Notice {
                    level: NoticeLevel::Error,
                    kind: None,
                    text: format!(
                        "Updated {} of {} subscriptions; failed: {}",
                        succeeded.len(),
                        succeeded.len() + failed.len(),
                        failed_ids.join(", ")
                    ),
                });
                self.list.refetch().await;
            }
            BatchOutcome::Failed(notice) => {
                *self.notice.lock() = Some(notice.clone());
            }
            BatchOutcome::Rejected | BatchOutcome::InProgress => {}
        }

        outcome
    }

    async fn batch_via_endpoint(&self, ids: &[i64], enabled: bool) -> BatchOutcome {
        match self.service.batch_toggle_sync(ids, enabled).await {
            Ok(response) if response.failed_ids.is_empty() => BatchOutcome::Applied { count: ids.len() },
            Ok(response) => {
                let failed_set: HashSet<i64> = response.failed_ids.iter().copied().collect();
                let succeeded: Vec<i64> = ids.iter().copied().filter(|id| !failed_set.contains(id)).collect();
                let failed = ids
                    .iter()
                    .copied()
                    .filter(|id| failed_set.contains(id))
                    .map(|id| (id, "rejected by server".to_string()))
                    .collect();
                if succeeded.is_empty() {
                    BatchOutcome::Failed(Notice::from_error(
                        &ConsoleError::Server {
                            code: -1,
                            message: String::new(),
                        },
                        BATCH_FAILED,
                    ))
                } else {
                    BatchOutcome::Partial { succeeded, failed }
                }
            }
            Err(e) => {
                warn!("Batch sync toggle failed: {}", e);
                BatchOutcome::Failed(Notice::from_error(&e, BATCH_FAILED))
            }
        }
    }

    async fn batch_per_item(&self, ids: &[i64], enabled: bool) -> BatchOutcome {
        let results = join_all(
            ids.iter()
                .map(|id| async move { (*id, self.service.update(*id, SubscriptionPatch::sync(enabled)).await) }),
        )
        .await;

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        let mut last_error = None;
        for (id, result) in results {
            match result {
                Ok(()) => succeeded.push(id),
                Err(e) => {
                    failed.push((id, e.user_message(TOGGLE_FAILED)));
                    last_error = Some(e);
                }
            }
        }

        match (succeeded.is_empty(), last_error) {
            (_, None) => BatchOutcome::Applied { count: succeeded.len() },
            (true, Some(e)) => BatchOutcome::Failed(Notice::from_error(&e, BATCH_FAILED)),
            (false, Some(_)) => BatchOutcome::Partial { succeeded, failed },
        }
    }

    /// Toggle sync for the current selection, clearing it on success
    pub async fn batch_toggle_selected(&self, enabled: bool) -> BatchOutcome {
        let ids = self.selected();
        let outcome = self.batch_toggle_sync(&ids, enabled).await;
        if matches!(outcome, BatchOutcome::Applied { .. }) {
            self.clear_selection();
        }
        outcome
    }

    /// Run a sync now and wait for it
    ///
    /// At most one request per id is in flight; a second trigger while the
    /// first is running returns `AlreadyRunning` without contacting the
    /// backend.
    pub async fn trigger_manual_sync(&self, id: i64) -> SyncTriggerOutcome {
        if !self.in_flight.lock().insert(id) {
            return SyncTriggerOutcome::AlreadyRunning;
        }
        let _guard = InFlight {
            set: &self.in_flight,
            id,
        };

        match self.service.trigger_sync(id).await {
            Ok(report) => {
                info!(
                    "Manual sync of subscription {} done: {} matched, {} new",
                    id, report.total_matched, report.new_count
                );
                *self.notice.lock() = Some(Notice::success(format!(
                    "Sync finished: {} new items",
                    report.new_count
                )));
                self.list.refetch().await;
                SyncTriggerOutcome::Completed(report)
            }
            Err(e) => {
                warn!("Manual sync of subscription {} failed: {}", id, e);
                let notice = Notice::from_error(&e, SYNC_FAILED);
                *self.notice.lock() = Some(notice.clone());
                SyncTriggerOutcome::Failed(notice)
            }
        }
    }

    /// Trend series over the configured window plus recent history
    pub async fn view_trend(&self, id: i64) -> Option<TrendView> {
        self.view_trend_days(id, self.trend_days).await
    }

    pub async fn view_trend_days(&self, id: i64, days: u32) -> Option<TrendView> {
        let days = days.max(1);
        let (trends, history) = futures::join!(
            self.service.trends(id, days),
            self.service.history(id, 1, HISTORY_PAGE_SIZE)
        );

        match (trends, history) {
            (Ok(trends), Ok(history)) => Some(TrendView {
                subscription_id: id,
                days,
                trends,
                history,
            }),
            (Err(e), _) | (_, Err(e)) => {
                self.fail(&e, TREND_FAILED);
                None
            }
        }
    }

    fn fail(&self, error: &ConsoleError, fallback: &str) -> ActionOutcome {
        warn!("{}: {}", fallback, error);
        let notice = Notice::from_error(error, fallback);
        *self.notice.lock() = Some(notice.clone());
        ActionOutcome::Failed(notice)
    }
}
