//! # Draft Persistence
//!
//! Offline-first durability for the in-progress sale. Every cart or
//! payment mutation is snapshotted to the key-value port so a crash or
//! reload loses nothing; risky submission paths additionally write
//! timestamped backups that survive a failed attempt.
//!
//! ## Key Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  marea:sale:draft                     ← the single live draft       │
//! │  marea:sale:draft:backup:<timestamp>  ← pre-submission backups      │
//! │                                                                     │
//! │  Timestamps are fixed-width UTC (`20260824T101530123`), so plain    │
//! │  lexicographic ordering of keys is chronological ordering.          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Hydration
//! A restored draft is reconciled against the *current* catalog: items
//! whose product no longer exists are dropped silently, everything else
//! is rebuilt against fresh product snapshots with the stored quantity,
//! price and discount. Stale stock or ceilings surface later at the
//! submit gate, not here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use marea_core::cart::{Cart, SaleItem};
use marea_core::types::{ClientRef, DiscountReason, Payment, Product, SaleType};

use crate::ports::KeyValueStore;

/// Storage key of the live draft.
pub const DRAFT_KEY: &str = "marea:sale:draft";

/// Prefix of timestamped backup keys.
pub const BACKUP_KEY_PREFIX: &str = "marea:sale:draft:backup:";

/// Fixed-width UTC timestamp for backup keys (millisecond precision).
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%3f";

// =============================================================================
// Snapshot
// =============================================================================

/// One persisted cart line: product by id, plus everything the cashier
/// may have edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftItem {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_bps: u32,
}

/// Minimal durable projection of the in-progress sale.
///
/// Stores product ids rather than full snapshots: hydration re-resolves
/// them against the current catalog, so a restored draft never shows
/// stale product data. The client reference is kept whole (it is tiny
/// and has no rates that could go stale); commission parties are not
/// persisted, as re-picking them is quick and their rates must be
/// current anyway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSnapshot {
    pub items: Vec<DraftItem>,
    pub payment: Payment,
    pub sale_type: SaleType,
    pub discount_reason: Option<DiscountReason>,
    pub client: Option<ClientRef>,
    pub saved_at: DateTime<Utc>,
}

impl DraftSnapshot {
    /// Captures the current sale state.
    pub fn capture(
        cart: &Cart,
        payment: &Payment,
        sale_type: SaleType,
        discount_reason: Option<DiscountReason>,
        client: Option<&ClientRef>,
    ) -> Self {
        DraftSnapshot {
            items: cart
                .items
                .iter()
                .map(|item| DraftItem {
                    product_id: item.product.id.clone(),
                    quantity: item.quantity,
                    unit_price_cents: item.unit_price_cents,
                    discount_bps: item.discount_bps,
                })
                .collect(),
            payment: payment.clone(),
            sale_type,
            discount_reason,
            client: client.cloned(),
            saved_at: Utc::now(),
        }
    }

    /// Rebuilds a cart against the current catalog. Items whose product
    /// disappeared are dropped (logged, not surfaced); stored quantities,
    /// prices and discounts are kept verbatim for the submit gate to
    /// re-judge.
    pub fn hydrate(&self, catalog: &[Product]) -> Cart {
        let mut cart = Cart::new();

        for draft_item in &self.items {
            let Some(product) = catalog.iter().find(|p| p.id == draft_item.product_id) else {
                debug!(
                    product_id = %draft_item.product_id,
                    "Dropping draft item: product no longer in catalog"
                );
                continue;
            };

            let mut item = SaleItem::from_product(product);
            item.quantity = draft_item.quantity;
            item.unit_price_cents = draft_item.unit_price_cents;
            item.discount_bps = draft_item.discount_bps;
            cart.items.push(item);
        }

        cart
    }
}

// =============================================================================
// Draft Store
// =============================================================================

/// Draft and backup persistence over the key-value port.
#[derive(Clone)]
pub struct DraftStore {
    store: Arc<dyn KeyValueStore>,
}

impl DraftStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        DraftStore { store }
    }

    /// Persists the live draft. Serialization failures are logged and
    /// swallowed: autosave must never interrupt a sale in progress.
    pub fn save(&self, snapshot: &DraftSnapshot) {
        match serde_json::to_string(snapshot) {
            Ok(json) => self.store.set(DRAFT_KEY, &json),
            Err(e) => warn!(error = %e, "Failed to serialize sale draft"),
        }
    }

    /// Loads the live draft. Corrupt payloads are treated as absent.
    pub fn load(&self) -> Option<DraftSnapshot> {
        let json = self.store.get(DRAFT_KEY)?;
        match serde_json::from_str(&json) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(error = %e, "Discarding corrupt sale draft");
                self.store.remove(DRAFT_KEY);
                None
            }
        }
    }

    /// Writes a timestamped backup of the given snapshot and returns its
    /// key. Written before risky submission paths so a failed attempt can
    /// always be restored.
    pub fn backup(&self, snapshot: &DraftSnapshot) -> Option<String> {
        let key = format!(
            "{}{}",
            BACKUP_KEY_PREFIX,
            Utc::now().format(BACKUP_TIMESTAMP_FORMAT)
        );
        match serde_json::to_string(snapshot) {
            Ok(json) => {
                self.store.set(&key, &json);
                debug!(key = %key, "Wrote sale draft backup");
                Some(key)
            }
            Err(e) => {
                warn!(error = %e, "Failed to serialize sale draft backup");
                None
            }
        }
    }

    /// Most recent backup, by key order.
    pub fn latest_backup(&self) -> Option<DraftSnapshot> {
        let mut keys = self.store.keys_with_prefix(BACKUP_KEY_PREFIX);
        keys.sort();

        // Walk newest-first past any corrupt entries.
        for key in keys.iter().rev() {
            let Some(json) = self.store.get(key) else {
                continue;
            };
            match serde_json::from_str(&json) {
                Ok(snapshot) => return Some(snapshot),
                Err(e) => warn!(key = %key, error = %e, "Skipping corrupt draft backup"),
            }
        }
        None
    }

    /// Promotes the most recent backup back to the live draft slot.
    pub fn restore_latest_backup(&self) -> Option<DraftSnapshot> {
        let snapshot = self.latest_backup()?;
        self.save(&snapshot);
        Some(snapshot)
    }

    /// Removes the live draft only; backups stay.
    pub fn clear_draft(&self) {
        self.store.remove(DRAFT_KEY);
    }

    /// Removes the live draft and every backup. Called once a sale has
    /// been durably handed off (confirmed live or queued offline).
    pub fn purge(&self) {
        self.store.remove(DRAFT_KEY);
        for key in self.store.keys_with_prefix(BACKUP_KEY_PREFIX) {
            self.store.remove(&key);
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
