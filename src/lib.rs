/// Portal Console - admin client for the content portal
///
/// Drives the portal's admin API: paginated lists with filters, the
/// per-module permission matrix of each administrator, and the sync state
/// of content subscriptions.

pub mod admin;
pub mod config;
pub mod context;
pub mod dto;
pub mod error;
pub mod http;
pub mod list;
pub mod session;
pub mod subscriptions;
pub mod validation;

pub use config::ConsoleConfig;
pub use context::ConsoleContext;
pub use error::{ConsoleError, ConsoleResult};
