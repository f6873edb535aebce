/// Content subscriptions and their sync state
///
/// Counters (`total_matched`, `new_count`, `last_sync_at`) belong to the
/// backend; this side only displays them and refreshes after a sync.

pub mod service;
pub mod tracker;

pub use service::{SubscriptionPatch, SubscriptionService};
pub use tracker::{BatchOutcome, SyncTracker, SyncTriggerOutcome};

use crate::dto::{default_true, string_list};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of content a subscription matches against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Paper,
    Video,
    Repo,
    Huggingface,
    Job,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Paper => "paper",
            ContentType::Video => "video",
            ContentType::Repo => "repo",
            ContentType::Huggingface => "huggingface",
            ContentType::Job => "job",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "paper" => Some(ContentType::Paper),
            "video" => Some(ContentType::Video),
            "repo" => Some(ContentType::Repo),
            "huggingface" | "hf" => Some(ContentType::Huggingface),
            "job" => Some(ContentType::Job),
            _ => None,
        }
    }
}

/// Matching criteria, decoded once from JSON-string or array form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionCriteria {
    #[serde(default, deserialize_with = "string_list")]
    pub keywords: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub authors: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub uploaders: Vec<String>,
}

impl SubscriptionCriteria {
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty() && self.tags.is_empty() && self.authors.is_empty() && self.uploaders.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSubscription {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub content_type: ContentType,
    #[serde(flatten)]
    pub criteria: SubscriptionCriteria,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub notify_enabled: bool,
    #[serde(default)]
    pub sync_enabled: bool,
    #[serde(default)]
    pub total_matched: u64,
    #[serde(default)]
    pub new_count: u64,
    #[serde(default)]
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl ContentSubscription {
    pub fn flags(&self) -> SubscriptionFlags {
        SubscriptionFlags {
            is_active: self.is_active,
            sync_enabled: self.sync_enabled,
        }
    }

    pub fn status(&self) -> SyncStatus {
        self.flags().status()
    }
}

/// Visible status, derived from the two flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Disabled,
    ActiveNoSync,
    ActiveSyncing,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Disabled => "disabled",
            SyncStatus::ActiveNoSync => "active",
            SyncStatus::ActiveSyncing => "syncing",
        }
    }
}

/// The operator-controlled flags behind [`SyncStatus`]
///
/// Transitions only happen through these setters; nothing changes on its
/// own and no state is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionFlags {
    pub is_active: bool,
    pub sync_enabled: bool,
}

impl SubscriptionFlags {
    pub fn status(&self) -> SyncStatus {
        match (self.is_active, self.sync_enabled) {
            (false, _) => SyncStatus::Disabled,
            (true, false) => SyncStatus::ActiveNoSync,
            (true, true) => SyncStatus::ActiveSyncing,
        }
    }

    pub fn with_sync(self, enabled: bool) -> Self {
        Self {
            sync_enabled: enabled,
            ..self
        }
    }

    pub fn with_active(self, active: bool) -> Self {
        Self {
            is_active: active,
            ..self
        }
    }
}

/// One bucket of the trend chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: String,
    #[serde(default, alias = "matched")]
    pub total_matched: u64,
    #[serde(default, alias = "new")]
    pub new_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncRunStatus {
    Success,
    Failed,
    Running,
    #[serde(other)]
    Unknown,
}

/// One row of a subscription's sync history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncHistoryEntry {
    pub id: i64,
    pub status: SyncRunStatus,
    #[serde(default)]
    pub matched_count: u64,
    #[serde(default)]
    pub new_count: u64,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Counters reported by a manual sync
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    #[serde(default)]
    pub total_matched: u64,
    #[serde(default)]
    pub new_count: u64,
    #[serde(default)]
    pub last_sync_at: Option<DateTime<Utc>>,
}

/// Trend series plus the first page of sync history
#[derive(Debug, Clone, PartialEq)]
pub struct TrendView {
    pub subscription_id: i64,
    pub days: u32,
    pub trends: Vec<TrendPoint>,
    pub history: crate::list::PaginatedList<SyncHistoryEntry>,
}
