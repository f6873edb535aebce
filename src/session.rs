/// Session context: the one place that knows the bearer token
///
/// Restored from disk exactly once at startup and shared by reference with
/// the HTTP client and anything that needs to know who is signed in.
use crate::{
    admin::AdminRole,
    error::{ConsoleError, ConsoleResult},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Persisted session payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub token: String,
    pub username: String,
    pub role: Option<AdminRole>,
}

/// Events emitted to whatever drives the login screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Session was cleared; carries the message to show the operator
    Expired { message: String },
    /// Time to show the login screen
    LoginRequired,
}

pub struct Session {
    store_path: Option<PathBuf>,
    current: RwLock<Option<SessionData>>,
    events: broadcast::Sender<SessionEvent>,
    redirect_delay: Duration,
    redirect_pending: Arc<AtomicBool>,
}

impl Session {
    /// Session that is never written to disk
    pub fn in_memory(redirect_delay: Duration) -> Self {
        Self::build(None, None, redirect_delay)
    }

    /// Restore the persisted session, if any
    ///
    /// Unreadable files and tokens whose `exp` claim has passed are
    /// discarded rather than treated as signed in.
    pub fn restore(path: impl Into<PathBuf>, redirect_delay: Duration) -> ConsoleResult<Self> {
        let path = path.into();
        let restored = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<SessionData>(&content) {
                Ok(data) if token_expired(&data.token) => {
                    info!("Stored session for {} has expired, discarding", data.username);
                    remove_file(&path)?;
                    None
                }
                Ok(data) => {
                    debug!("Restored session for {}", data.username);
                    Some(data)
                }
                Err(e) => {
                    warn!("Ignoring unreadable session file {:?}: {}", path, e);
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        Ok(Self::build(Some(path), restored, redirect_delay))
    }

    fn build(store_path: Option<PathBuf>, current: Option<SessionData>, redirect_delay: Duration) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            store_path,
            current: RwLock::new(current),
            events,
            redirect_delay,
            redirect_pending: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.current.read().as_ref().map(|data| data.token.clone())
    }

    pub fn current(&self) -> Option<SessionData> {
        self.current.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.read().is_some()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Store a fresh session and persist it
    pub fn sign_in(&self, data: SessionData) -> ConsoleResult<()> {
        if let Some(path) = &self.store_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let json = serde_json::to_string_pretty(&data)?;
            std::fs::write(path, json)?;
        }
        info!("Signed in as {}", data.username);
        *self.current.write() = Some(data);
        Ok(())
    }

    /// Forget the session locally
    pub fn sign_out(&self) -> ConsoleResult<()> {
        *self.current.write() = None;
        if let Some(path) = &self.store_path {
            remove_file(path)?;
        }
        Ok(())
    }

    /// Clear the session after the backend rejected it
    ///
    /// Emits `Expired` immediately and `LoginRequired` once after the
    /// redirect delay. Repeated calls while a redirect is pending only
    /// re-emit `Expired`.
    pub fn expire(&self, reason: &str) {
        warn!("Session rejected by backend: {}", reason);
        if let Err(e) = self.sign_out() {
            warn!("Failed to clear stored session: {}", e);
        }

        let _ = self.events.send(SessionEvent::Expired {
            message: crate::error::SESSION_EXPIRED_MESSAGE.to_string(),
        });

        if self.redirect_pending.swap(true, Ordering::SeqCst) {
            return;
        }

        let events = self.events.clone();
        let pending = Arc::clone(&self.redirect_pending);
        let delay = self.redirect_delay;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    pending.store(false, Ordering::SeqCst);
                    let _ = events.send(SessionEvent::LoginRequired);
                });
            }
            Err(_) => {
                pending.store(false, Ordering::SeqCst);
                let _ = events.send(SessionEvent::LoginRequired);
            }
        }
    }
}

fn remove_file(path: &Path) -> ConsoleResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ConsoleError::Io(format!("Failed to remove {:?}: {}", path, e))),
    }
}

/// Opaque tokens never expire client-side; JWTs expire on their `exp` claim
fn token_expired(token: &str) -> bool {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_sig)) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };

    let Ok(bytes) = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')) else {
        return false;
    };

    serde_json::from_slice::<serde_json::Value>(&bytes)
        .ok()
        .and_then(|claims| claims.get("exp").and_then(|v| v.as_i64()))
        .map(|exp| exp <= Utc::now().timestamp())
        .unwrap_or(false)
}
