//! # Pending Actions
//!
//! When a sale is submitted with no connectivity, the full payload is
//! wrapped in a [`PendingAction`] and handed to the
//! [`ConnectivityProvider`](crate::ports::ConnectivityProvider) queue,
//! which replays it once the link returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Action type for a queued sale creation.
pub const ACTION_CREATE_SALE: &str = "CREATE_SALE";

/// Replay attempts before the queue parks a sale action for manual
/// review. Sales are money: they get more patience than routine actions.
pub const CREATE_SALE_MAX_RETRIES: u32 = 5;

// =============================================================================
// Priority
// =============================================================================

/// Drain order hint for the pending-action queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionPriority {
    Low,
    Medium,
    High,
}

// =============================================================================
// Pending Action
// =============================================================================

/// A queued operation awaiting connectivity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAction {
    /// Queue-local id, not the backend's.
    pub id: String,

    /// Discriminator the drain loop dispatches on.
    pub action_type: String,

    /// Complete request payload, replayable as-is.
    pub payload: Value,

    pub priority: ActionPriority,

    pub max_retries: u32,

    pub created_at: DateTime<Utc>,
}

impl PendingAction {
    /// Wraps a sale payload for offline replay: high priority, generous
    /// retry budget.
    pub fn create_sale(payload: Value) -> Self {
        PendingAction {
            id: Uuid::new_v4().to_string(),
            action_type: ACTION_CREATE_SALE.to_string(),
            payload,
            priority: ActionPriority::High,
            max_retries: CREATE_SALE_MAX_RETRIES,
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
