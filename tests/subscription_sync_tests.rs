/// Subscription sync toggles, batch updates and manual sync triggers

mod common;

use common::{context, context_with, fail, ok, page, settle, subscription_row, test_config, ScriptedTransport};
use portal_console::config::BatchMode;
use portal_console::error::{ActionOutcome, ErrorKind};
use portal_console::subscriptions::{BatchOutcome, ContentType, SyncStatus, SyncTriggerOutcome};
use reqwest::Method;
use serde_json::{json, Value};

const SUBSCRIPTIONS: &str = "/admin/subscriptions";
const BATCH: &str = "/admin/subscriptions/batch-toggle";

#[tokio::test]
async fn test_toggle_refetches_instead_of_patching_locally() {
    let transport = ScriptedTransport::new();
    transport.on(Method::GET, SUBSCRIPTIONS, page(json!([subscription_row(4, false)]), 1));
    transport.on(Method::PUT, "/admin/subscriptions/4", ok(Value::Null));

    let ctx = context(&transport);
    let tracker = &ctx.subscriptions;
    tracker.list().refetch().await;
    assert_eq!(tracker.list().items()[0].status(), SyncStatus::ActiveNoSync);

    // backend now reports the new flag
    transport.on(Method::GET, SUBSCRIPTIONS, page(json!([subscription_row(4, true)]), 1));
    assert_eq!(tracker.toggle_sync(4, true).await, ActionOutcome::Done);

    let puts = transport.requests_to(Method::PUT, "/admin/subscriptions/4");
    assert_eq!(puts[0].body, Some(json!({"syncEnabled": true})));
    assert_eq!(transport.requests_to(Method::GET, SUBSCRIPTIONS).len(), 2);
    assert_eq!(tracker.list().items()[0].status(), SyncStatus::ActiveSyncing);
}

#[tokio::test]
async fn test_failed_toggle_shows_server_message() {
    let transport = ScriptedTransport::new();
    transport.on(Method::GET, SUBSCRIPTIONS, page(json!([subscription_row(4, false)]), 1));
    transport.on(Method::PUT, "/admin/subscriptions/4", fail(4100, "Subscription is locked"));

    let ctx = context(&transport);
    let tracker = &ctx.subscriptions;
    tracker.list().refetch().await;

    match tracker.toggle_sync(4, true).await {
        ActionOutcome::Failed(notice) => {
            assert_eq!(notice.kind, Some(ErrorKind::Server));
            assert_eq!(notice.text, "Subscription is locked");
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(transport.requests_to(Method::GET, SUBSCRIPTIONS).len(), 1);
    assert_eq!(tracker.list().items()[0].status(), SyncStatus::ActiveNoSync);
}

#[tokio::test]
async fn test_empty_batch_is_rejected_locally() {
    let transport = ScriptedTransport::new();
    let ctx = context(&transport);

    assert_eq!(ctx.subscriptions.batch_toggle_sync(&[], true).await, BatchOutcome::Rejected);
    assert!(transport.requests().is_empty());
    assert_eq!(ctx.subscriptions.notice().unwrap().kind, Some(ErrorKind::Validation));
}

#[tokio::test]
async fn test_batch_dedupes_and_is_repeatable() {
    let transport = ScriptedTransport::new();
    transport.on(Method::GET, SUBSCRIPTIONS, page(json!([]), 0));
    transport.on(Method::POST, BATCH, ok(json!({"updated": 3})));

    let ctx = context(&transport);
    let tracker = &ctx.subscriptions;

    for _ in 0..2 {
        assert_eq!(
            tracker.batch_toggle_sync(&[3, 1, 3, 2], false).await,
            BatchOutcome::Applied { count: 3 }
        );
    }

    let posts = transport.requests_to(Method::POST, BATCH);
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].body, Some(json!({"ids": [3, 1, 2], "syncEnabled": false})));
    assert_eq!(posts[0].body, posts[1].body);
    assert_eq!(transport.requests_to(Method::GET, SUBSCRIPTIONS).len(), 2);
    assert!(!tracker.is_batch_running());
}

#[tokio::test]
async fn test_batch_reports_failed_ids() {
    let transport = ScriptedTransport::new();
    transport.on(Method::GET, SUBSCRIPTIONS, page(json!([]), 0));
    transport.on(Method::POST, BATCH, ok(json!({"updated": 2, "failedIds": [9]})));

    let ctx = context(&transport);
    let outcome = ctx.subscriptions.batch_toggle_sync(&[7, 8, 9], true).await;

    match outcome {
        BatchOutcome::Partial { succeeded, failed } => {
            assert_eq!(succeeded, vec![7, 8]);
            assert_eq!(failed.len(), 1);
            assert_eq!(failed[0].0, 9);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    let notice = ctx.subscriptions.notice().unwrap();
    assert!(notice.is_error());
    assert!(notice.text.contains('9'));
}

#[tokio::test]
async fn test_per_item_batch_collects_failures() {
    let transport = ScriptedTransport::new();
    transport.on(Method::GET, SUBSCRIPTIONS, page(json!([]), 0));
    transport.on(Method::PUT, "/admin/subscriptions/1", ok(Value::Null));
    transport.on(Method::PUT, "/admin/subscriptions/2", fail(4040, "Subscription not found"));

    let mut config = test_config();
    config.subscriptions.batch_mode = BatchMode::PerItem;
    let ctx = context_with(&transport, config);

    match ctx.subscriptions.batch_toggle_sync(&[1, 2], true).await {
        BatchOutcome::Partial { succeeded, failed } => {
            assert_eq!(succeeded, vec![1]);
            assert_eq!(failed, vec![(2, "Subscription not found".to_string())]);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(transport.requests_to(Method::POST, BATCH).is_empty());
}

#[tokio::test]
async fn test_selection_batch_clears_on_success() {
    let transport = ScriptedTransport::new();
    transport.on(
        Method::GET,
        SUBSCRIPTIONS,
        page(json!([subscription_row(1, false), subscription_row(2, false)]), 2),
    );
    transport.on(Method::POST, BATCH, ok(Value::Null));

    let ctx = context(&transport);
    let tracker = &ctx.subscriptions;
    tracker.list().refetch().await;
    tracker.select_visible();
    assert_eq!(tracker.selected(), vec![1, 2]);

    assert_eq!(tracker.batch_toggle_selected(true).await, BatchOutcome::Applied { count: 2 });
    assert!(tracker.selected().is_empty());
}

#[tokio::test]
async fn test_manual_sync_double_trigger() {
    let transport = ScriptedTransport::new();
    transport.on(Method::GET, SUBSCRIPTIONS, page(json!([subscription_row(6, true)]), 1));
    let gate = transport.gated(
        Method::POST,
        "/subscriptions/6/sync",
        None,
        ok(json!({"totalMatched": 140, "newCount": 12, "lastSyncAt": "2024-05-03T09:00:00Z"})),
    );

    let ctx = context(&transport);
    let tracker = &ctx.subscriptions;

    let (first, second) = tokio::join!(tracker.trigger_manual_sync(6), async {
        settle().await;
        assert!(tracker.is_syncing(6));
        let outcome = tracker.trigger_manual_sync(6).await;
        gate.notify_one();
        outcome
    });

    match first {
        SyncTriggerOutcome::Completed(report) => {
            assert_eq!(report.total_matched, 140);
            assert_eq!(report.new_count, 12);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(second, SyncTriggerOutcome::AlreadyRunning);
    assert_eq!(transport.requests_to(Method::POST, "/subscriptions/6/sync").len(), 1);
    assert!(!tracker.is_syncing(6));
    // list reloaded so counters come from the backend
    assert_eq!(transport.requests_to(Method::GET, SUBSCRIPTIONS).len(), 1);
}

#[tokio::test]
async fn test_failed_sync_releases_guard() {
    let transport = ScriptedTransport::new();
    transport.unreachable(Method::POST, "/subscriptions/6/sync");

    let ctx = context(&transport);
    let tracker = &ctx.subscriptions;

    assert!(matches!(tracker.trigger_manual_sync(6).await, SyncTriggerOutcome::Failed(_)));
    assert!(!tracker.is_syncing(6));
    assert!(matches!(tracker.trigger_manual_sync(6).await, SyncTriggerOutcome::Failed(_)));
    assert_eq!(transport.requests_to(Method::POST, "/subscriptions/6/sync").len(), 2);
}

#[tokio::test]
async fn test_trend_view() {
    let transport = ScriptedTransport::new();
    transport.on(
        Method::GET,
        "/admin/subscriptions/6/trends",
        ok(json!([
            {"date": "2024-05-01", "totalMatched": 120, "newCount": 4},
            {"date": "2024-05-02", "totalMatched": 128, "newCount": 8}
        ])),
    );
    transport.on(
        Method::GET,
        "/admin/subscriptions/6/history",
        ok(json!({"list": [{"id": 1, "status": "success", "matchedCount": 128, "newCount": 8}], "total": 1})),
    );

    let ctx = context(&transport);
    let view = ctx.subscriptions.view_trend_days(6, 14).await.unwrap();

    assert_eq!(view.days, 14);
    assert_eq!(view.trends.len(), 2);
    assert_eq!(view.trends[1].new_count, 8);
    assert_eq!(view.history.total, 1);

    let trend_requests = transport.requests_to(Method::GET, "/admin/subscriptions/6/trends");
    assert_eq!(trend_requests[0].query_value("days"), Some("14"));
}

#[tokio::test]
async fn test_trend_failure_leaves_notice() {
    let transport = ScriptedTransport::new();
    transport.on(Method::GET, "/admin/subscriptions/6/trends", fail(5000, ""));
    transport.on(Method::GET, "/admin/subscriptions/6/history", ok(json!({"items": [], "total": 0})));

    let ctx = context(&transport);
    assert!(ctx.subscriptions.view_trend(6).await.is_none());
    assert_eq!(ctx.subscriptions.notice().unwrap().text, "Failed to load sync trends");
}

#[tokio::test]
async fn test_content_type_filter() {
    let transport = ScriptedTransport::new();
    transport.on(Method::GET, SUBSCRIPTIONS, page(json!([]), 0));

    let ctx = context(&transport);
    ctx.subscriptions.filter_by_content_type(Some(ContentType::Huggingface)).await;
    ctx.subscriptions.filter_by_content_type(None).await;

    let requests = transport.requests_to(Method::GET, SUBSCRIPTIONS);
    assert_eq!(requests[0].query_value("contentType"), Some("huggingface"));
    assert_eq!(requests[1].query_value("contentType"), None);
}
