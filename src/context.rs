/// Application context and dependency injection
use crate::{
    admin::{AdminDirectory, AdminService},
    config::ConsoleConfig,
    error::ConsoleResult,
    http::{ApiClient, ReqwestTransport, Transport},
    session::Session,
    subscriptions::{SubscriptionService, SyncTracker},
};
use std::sync::Arc;

/// Context holding all shared console services
#[derive(Clone)]
pub struct ConsoleContext {
    pub config: Arc<ConsoleConfig>,
    pub session: Arc<Session>,
    pub client: ApiClient,
    // Admin management
    pub admins: Arc<AdminDirectory>,
    // Subscription sync tracking
    pub subscriptions: Arc<SyncTracker>,
}

impl ConsoleContext {
    /// Create a context talking to the configured backend over HTTP
    pub fn new(config: ConsoleConfig) -> ConsoleResult<Self> {
        config.validate()?;

        let session = Arc::new(Session::restore(
            config.session.session_file.clone(),
            config.login_redirect_delay(),
        )?);
        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new(&config.api)?);

        Ok(Self::with_transport(config, transport, session))
    }

    /// Create a context over an arbitrary transport and session
    pub fn with_transport(config: ConsoleConfig, transport: Arc<dyn Transport>, session: Arc<Session>) -> Self {
        let client = ApiClient::new(transport, Arc::clone(&session));
        let debounce = config.keyword_debounce();
        let page_size = config.lists.page_size;

        let admins = Arc::new(AdminDirectory::new(
            AdminService::new(client.clone()),
            page_size,
            debounce,
        ));
        let subscriptions = Arc::new(SyncTracker::new(
            SubscriptionService::new(client.clone()),
            page_size,
            debounce,
            config.subscriptions.batch_mode,
            config.subscriptions.trend_days,
        ));

        tracing::debug!("Console context ready for {}", config.api.base_url);

        Self {
            config: Arc::new(config),
            session,
            client,
            admins,
            subscriptions,
        }
    }
}
