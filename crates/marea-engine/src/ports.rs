//! # Ports
//!
//! Trait seams between the engine and the outside world. The engine never
//! opens a socket or touches a disk: callers inject implementations of
//! these traits (HTTP client, key-value storage, toast notifications,
//! connectivity watcher, session, event bus) and the engine drives them.
//!
//! ## Port Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  ApiClient             HTTP requests (async, idempotency keys)      │
//! │  KeyValueStore         draft + backup persistence                   │
//! │  NotificationSink      operator-facing toasts                       │
//! │  ConnectivityProvider  offline detection + pending-action queue     │
//! │  SessionProvider       operator role, forced logout                 │
//! │  EventBus              domain events for cross-module reactions     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ApiFailure;
use crate::queue::PendingAction;

// =============================================================================
// API Client
// =============================================================================

/// Per-request knobs for the API port.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Skip the implementation's global error handling (toasts, redirects)
    /// so the caller can run its own recovery.
    pub suppress_error_handler: bool,

    /// Bypass any response cache the implementation keeps.
    pub no_cache: bool,

    /// Idempotency key forwarded as a request header, letting the backend
    /// deduplicate replays of the same logical operation.
    pub idempotency_key: Option<String>,
}

/// A successful API response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub data: Value,
}

/// HTTP transport port.
///
/// Implementations own base URLs, auth headers and serialization of the
/// transport itself; the engine only sees JSON in and out.
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn get(&self, path: &str, options: RequestOptions) -> Result<ApiResponse, ApiFailure>;

    async fn post(
        &self,
        path: &str,
        body: Value,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiFailure>;
}

// =============================================================================
// Key-Value Store
// =============================================================================

/// Durable string storage for drafts and backups.
///
/// Synchronous on purpose: implementations are expected to be local
/// (embedded store, app-data file), and draft autosave runs on every cart
/// mutation.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);

    /// All stored keys starting with `prefix`, in unspecified order.
    fn keys_with_prefix(&self, prefix: &str) -> Vec<String>;
}

// =============================================================================
// Notifications
// =============================================================================

/// Operator-facing notification port (toasts, status line).
pub trait NotificationSink: Send + Sync {
    fn success(&self, message: &str, detail: Option<&str>);
    fn warning(&self, message: &str, detail: Option<&str>);
    fn error(&self, message: &str, detail: Option<&str>);
}

// =============================================================================
// Connectivity
// =============================================================================

/// Offline detection and the pending-action queue.
///
/// The queue itself (storage, drain loop, retry bookkeeping) lives behind
/// this port; the engine only decides *when* to enqueue and with what
/// payload.
pub trait ConnectivityProvider: Send + Sync {
    fn is_offline(&self) -> bool;
    fn enqueue(&self, action: PendingAction);
}

// =============================================================================
// Session
// =============================================================================

/// Current operator session.
pub trait SessionProvider: Send + Sync {
    /// Role name of the signed-in operator, used to resolve discount
    /// ceilings.
    fn role(&self) -> String;

    /// Terminates the session. Called on a 401 from the backend; the
    /// host application handles the redirect to sign-in.
    fn logout(&self);
}

// =============================================================================
// Event Bus
// =============================================================================

/// Domain events published by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    /// A sale was accepted - either confirmed by the backend or queued
    /// for later sync. Subscribers refresh sale lists, dashboards and
    /// printable tickets.
    SaleCreated {
        /// Backend id when confirmed live; `None` when queued offline.
        sale_id: Option<String>,
        total_cents: i64,
        queued: bool,
    },
}

/// Publish-only event port.
pub trait EventBus: Send + Sync {
    fn publish(&self, event: DomainEvent);
}
