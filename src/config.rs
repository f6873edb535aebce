/// Configuration management for Portal Console
use crate::error::{ConsoleError, ConsoleResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Largest page size the backend accepts
pub const MAX_PAGE_SIZE: u32 = 100;

/// Main console configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub lists: ListConfig,
    pub subscriptions: SubscriptionConfig,
    pub logging: LoggingConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL including any path prefix, e.g. http://localhost:8080/api
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Session persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub session_file: PathBuf,
    /// Delay between an auth failure notice and the login-required signal
    pub login_redirect_delay_ms: u64,
}

/// List controller defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConfig {
    pub page_size: u32,
    pub keyword_debounce_ms: u64,
}

/// How the backend applies batch sync toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchMode {
    /// One call to the batch endpoint
    Endpoint,
    /// One update call per subscription
    PerItem,
}

impl BatchMode {
    pub fn from_str(s: &str) -> ConsoleResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "endpoint" | "batch" => Ok(BatchMode::Endpoint),
            "per-item" | "per_item" | "item" => Ok(BatchMode::PerItem),
            _ => Err(ConsoleError::Config(format!("Invalid batch mode: {}", s))),
        }
    }
}

/// Subscription tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    pub batch_mode: BatchMode,
    pub trend_days: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:8080/api".to_string(),
                request_timeout_secs: 15,
                user_agent: format!("portal-console/{}", env!("CARGO_PKG_VERSION")),
            },
            session: SessionConfig {
                session_file: PathBuf::from("./data/session.json"),
                login_redirect_delay_ms: 1500,
            },
            lists: ListConfig {
                page_size: 20,
                keyword_debounce_ms: 300,
            },
            subscriptions: SubscriptionConfig {
                batch_mode: BatchMode::Endpoint,
                trend_days: 7,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ConsoleResult<Self> {
        dotenv::dotenv().ok();
        let defaults = Self::default();

        let base_url = env::var("PORTAL_API_BASE_URL")
            .unwrap_or(defaults.api.base_url)
            .trim_end_matches('/')
            .to_string();
        let request_timeout_secs = env::var("PORTAL_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "15".to_string())
            .parse()
            .map_err(|_| ConsoleError::Config("Invalid request timeout".to_string()))?;
        let user_agent = env::var("PORTAL_USER_AGENT").unwrap_or(defaults.api.user_agent);

        let session_file = env::var("PORTAL_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.session.session_file);
        let login_redirect_delay_ms = env::var("PORTAL_LOGIN_REDIRECT_DELAY_MS")
            .unwrap_or_else(|_| "1500".to_string())
            .parse()
            .unwrap_or(1500);

        let page_size = env::var("PORTAL_PAGE_SIZE")
            .unwrap_or_else(|_| "20".to_string())
            .parse()
            .map_err(|_| ConsoleError::Config("Invalid page size".to_string()))?;
        let keyword_debounce_ms = env::var("PORTAL_KEYWORD_DEBOUNCE_MS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .unwrap_or(300);

        let batch_mode = match env::var("PORTAL_BATCH_MODE") {
            Ok(value) => BatchMode::from_str(&value)?,
            Err(_) => BatchMode::Endpoint,
        };
        let trend_days = env::var("PORTAL_TREND_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse()
            .unwrap_or(7);

        let level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let config = ConsoleConfig {
            api: ApiConfig {
                base_url,
                request_timeout_secs,
                user_agent,
            },
            session: SessionConfig {
                session_file,
                login_redirect_delay_ms,
            },
            lists: ListConfig {
                page_size,
                keyword_debounce_ms,
            },
            subscriptions: SubscriptionConfig {
                batch_mode,
                trend_days,
            },
            logging: LoggingConfig { level },
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> ConsoleResult<()> {
        if !(self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://")) {
            return Err(ConsoleError::Config(format!(
                "API base URL must be http(s): {}",
                self.api.base_url
            )));
        }

        if self.api.request_timeout_secs == 0 {
            return Err(ConsoleError::Config(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }

        if self.lists.page_size == 0 || self.lists.page_size > MAX_PAGE_SIZE {
            return Err(ConsoleError::Config(format!(
                "Page size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        if self.subscriptions.trend_days == 0 {
            return Err(ConsoleError::Config("Trend window must be at least 1 day".to_string()));
        }

        Ok(())
    }

    pub fn keyword_debounce(&self) -> Duration {
        Duration::from_millis(self.lists.keyword_debounce_ms)
    }

    pub fn login_redirect_delay(&self) -> Duration {
        Duration::from_millis(self.session.login_redirect_delay_ms)
    }
}
