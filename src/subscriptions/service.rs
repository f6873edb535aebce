/// Subscription API endpoints
use crate::{
    error::ConsoleResult,
    http::{ApiClient, PageData},
    list::PaginatedList,
    subscriptions::{SyncHistoryEntry, SyncReport, TrendPoint},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SUBSCRIPTIONS_ENDPOINT: &str = "/admin/subscriptions";

/// Partial update of the operator-controlled flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_enabled: Option<bool>,
}

impl SubscriptionPatch {
    pub fn sync(enabled: bool) -> Self {
        Self {
            sync_enabled: Some(enabled),
            ..Self::default()
        }
    }

    pub fn active(active: bool) -> Self {
        Self {
            is_active: Some(active),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchToggleRequest<'a> {
    ids: &'a [i64],
    sync_enabled: bool,
}

/// Batch endpoint reply; `failed_ids` is empty when the batch was atomic
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchToggleResponse {
    #[serde(default)]
    pub updated: u64,
    #[serde(default)]
    pub failed_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TrendPayload {
    Points(Vec<TrendPoint>),
    Wrapped {
        #[serde(default, alias = "items", alias = "points")]
        trends: Vec<TrendPoint>,
    },
}

#[derive(Clone)]
pub struct SubscriptionService {
    client: ApiClient,
}

impl SubscriptionService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub async fn update(&self, id: i64, patch: SubscriptionPatch) -> ConsoleResult<()> {
        let _: Value = self
            .client
            .put(&format!("{}/{}", SUBSCRIPTIONS_ENDPOINT, id), &patch)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> ConsoleResult<()> {
        let _: Value = self
            .client
            .delete(&format!("{}/{}", SUBSCRIPTIONS_ENDPOINT, id))
            .await?;
        Ok(())
    }

    pub async fn batch_toggle_sync(&self, ids: &[i64], enabled: bool) -> ConsoleResult<BatchToggleResponse> {
        let response: Option<BatchToggleResponse> = self
            .client
            .post(
                &format!("{}/batch-toggle", SUBSCRIPTIONS_ENDPOINT),
                &BatchToggleRequest {
                    ids,
                    sync_enabled: enabled,
                },
            )
            .await?;
        Ok(response.unwrap_or(BatchToggleResponse {
            updated: ids.len() as u64,
            failed_ids: Vec::new(),
        }))
    }

    /// Run a sync now and wait for the backend to finish it
    pub async fn trigger_sync(&self, id: i64) -> ConsoleResult<SyncReport> {
        let report: Option<SyncReport> = self
            .client
            .post(&format!("/subscriptions/{}/sync", id), &serde_json::json!({}))
            .await?;
        Ok(report.unwrap_or_default())
    }

    pub async fn trends(&self, id: i64, days: u32) -> ConsoleResult<Vec<TrendPoint>> {
        let payload: Option<TrendPayload> = self
            .client
            .get(
                &format!("{}/{}/trends", SUBSCRIPTIONS_ENDPOINT, id),
                &[("days", days.to_string())],
            )
            .await?;
        Ok(match payload {
            Some(TrendPayload::Points(points)) => points,
            Some(TrendPayload::Wrapped { trends }) => trends,
            None => Vec::new(),
        })
    }

    pub async fn history(&self, id: i64, page: u32, size: u32) -> ConsoleResult<PaginatedList<SyncHistoryEntry>> {
        let page = page.max(1);
        let size = size.max(1);
        let data: PageData<SyncHistoryEntry> = self
            .client
            .get(
                &format!("{}/{}/history", SUBSCRIPTIONS_ENDPOINT, id),
                &[("page", page.to_string()), ("size", size.to_string())],
            )
            .await?;
        Ok(PaginatedList::from_page(data, page, size))
    }
}
