//! # Sale Submission Protocol
//!
//! Drives a finished sale from "cashier pressed Charge" to a durable
//! outcome. Every path through here ends in exactly one of four states,
//! and none of them loses the sale.
//!
//! ## Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  1. GATE        in-flight guard, item revalidation, payment checks  │
//! │  2. ROUTE       offline? → wrap payload in a PendingAction, queue,  │
//! │                 purge drafts, done (QueuedOffline)                  │
//! │  3. PROTECT     write a timestamped draft backup before the POST    │
//! │  4. POST        single attempt, per-attempt idempotency key on      │
//! │                 guide sales, NO silent retry of the write           │
//! │  5. SETTLE      200 → purge drafts, publish, notify (Submitted)     │
//! │                 401 → logout, keep backup (SessionExpired)          │
//! │                 else → keep backup, notify (FailedRecoverable)      │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The POST is never retried automatically: a replayed sale write is a
//! potential double charge. Recovery is explicit — the operator retries
//! from the kept backup, and guide sales carry an idempotency key so the
//! backend can deduplicate even a manual replay race.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use marea_core::{
    validate_items_for_submit, validate_payment, Agency, Cart, ClientRef, CommissionBreakdown,
    CompletedSale, DiscountPolicy, DiscountReason, Employee, Guide, Payment, Product, SaleTotals,
    SaleType, TaxConfig,
};

use crate::draft::{DraftSnapshot, DraftStore};
use crate::error::{EngineError, EngineResult};
use crate::ports::{
    ApiClient, ConnectivityProvider, DomainEvent, EventBus, NotificationSink, RequestOptions,
    SessionProvider,
};
use crate::queue::PendingAction;
use crate::retry::get_with_retry;

const SALES_ENDPOINT: &str = "/sales";
const PRODUCTS_ENDPOINT: &str = "/products";

// =============================================================================
// Payload
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct PayloadItem {
    product_id: String,
    sku: String,
    quantity: i64,
    unit_price_cents: i64,
    discount_bps: u32,
    subtotal_cents: i64,
    discount_cents: i64,
    total_cents: i64,
}

/// The complete sale request body. Self-contained on purpose: the same
/// payload goes to a live POST or into a [`PendingAction`] for offline
/// replay, byte for byte.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct SalePayload {
    items: Vec<PayloadItem>,
    sale_type: SaleType,
    payment: Payment,
    discount_reason: Option<DiscountReason>,
    client_id: Option<String>,
    agency_id: Option<String>,
    guide_id: Option<String>,
    employee_id: Option<String>,
    subtotal_cents: i64,
    discount_cents: i64,
    tax_cents: i64,
    total_cents: i64,
    commissions: CommissionBreakdown,
}

// =============================================================================
// Context and Outcome
// =============================================================================

/// Borrowed view of the sale state at the moment of submission.
pub struct SubmitContext<'a> {
    pub cart: &'a Cart,
    pub payment: &'a Payment,
    pub sale_type: SaleType,
    pub discount_reason: Option<DiscountReason>,
    pub client: Option<&'a ClientRef>,
    pub agency: Option<&'a Agency>,
    pub guide: Option<&'a Guide>,
    pub employee: Option<&'a Employee>,
    pub catalog: &'a [Product],
    pub tax: &'a TaxConfig,
    pub policy: &'a DiscountPolicy,
}

/// Terminal state of one submission attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// The backend confirmed the sale.
    Submitted(CompletedSale),

    /// No connectivity: the sale is queued for replay. The caller must
    /// clear the live cart, the engine already purged the drafts.
    QueuedOffline { action_id: String },

    /// The POST failed; a draft backup is kept and the operator may
    /// retry.
    FailedRecoverable { message: String },

    /// The backend rejected the credentials (401). The session has been
    /// terminated and a draft backup is kept for after sign-in.
    SessionExpired,
}

// =============================================================================
// Submission Service
// =============================================================================

/// Owns the submission protocol and the ports it needs.
pub struct SaleSubmission {
    api: Arc<dyn ApiClient>,
    drafts: DraftStore,
    notifier: Arc<dyn NotificationSink>,
    connectivity: Arc<dyn ConnectivityProvider>,
    session: Arc<dyn SessionProvider>,
    events: Arc<dyn EventBus>,
    in_flight: AtomicBool,
}

impl SaleSubmission {
    pub fn new(
        api: Arc<dyn ApiClient>,
        drafts: DraftStore,
        notifier: Arc<dyn NotificationSink>,
        connectivity: Arc<dyn ConnectivityProvider>,
        session: Arc<dyn SessionProvider>,
        events: Arc<dyn EventBus>,
    ) -> Self {
        SaleSubmission {
            api,
            drafts,
            notifier,
            connectivity,
            session,
            events,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Runs the full protocol for one attempt.
    ///
    /// Returns `Err` only for local rejections (validation, double
    /// submit, serialization); every remote result comes back as a
    /// [`SubmissionOutcome`].
    pub async fn submit(&self, ctx: SubmitContext<'_>) -> EngineResult<SubmissionOutcome> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            warn!("Rejected sale submission: another attempt is in flight");
            return Err(EngineError::SubmissionInFlight);
        }

        let result = self.run(ctx).await;
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn run(&self, ctx: SubmitContext<'_>) -> EngineResult<SubmissionOutcome> {
        // --- 1. Gate -------------------------------------------------------
        let role = self.session.role();
        let blocks = validate_items_for_submit(ctx.cart, ctx.catalog, ctx.policy, &role);
        if !blocks.is_empty() {
            return Err(EngineError::Blocked(blocks));
        }

        // Totals and commissions are recomputed here, against the final
        // cart state, never carried over from earlier UI reads.
        let totals = SaleTotals::compute(ctx.cart, ctx.tax);
        let commissions = CommissionBreakdown::compute(
            totals.total(),
            ctx.sale_type,
            ctx.payment,
            ctx.agency,
            ctx.guide,
            ctx.employee,
        );

        let issues = validate_payment(
            ctx.payment,
            totals.total(),
            ctx.cart.has_discount(),
            ctx.discount_reason,
        );
        if !issues.is_empty() {
            return Err(EngineError::Payment(issues));
        }

        let payload = serde_json::to_value(SalePayload {
            items: ctx
                .cart
                .items
                .iter()
                .map(|item| PayloadItem {
                    product_id: item.product.id.clone(),
                    sku: item.product.sku.clone(),
                    quantity: item.quantity,
                    unit_price_cents: item.unit_price_cents,
                    discount_bps: item.discount_bps,
                    subtotal_cents: item.subtotal().cents(),
                    discount_cents: item.discount_amount().cents(),
                    total_cents: item.total().cents(),
                })
                .collect(),
            sale_type: ctx.sale_type,
            payment: ctx.payment.clone(),
            discount_reason: ctx.discount_reason,
            client_id: ctx.client.map(|c| c.id.clone()),
            agency_id: ctx.agency.map(|a| a.id.clone()),
            guide_id: ctx.guide.map(|g| g.id.clone()),
            employee_id: ctx.employee.map(|e| e.id.clone()),
            subtotal_cents: totals.subtotal_cents,
            discount_cents: totals.discount_cents,
            tax_cents: totals.tax_cents,
            total_cents: totals.total_cents,
            commissions,
        })?;

        // --- 2. Route offline ----------------------------------------------
        if self.connectivity.is_offline() {
            let action = PendingAction::create_sale(payload);
            let action_id = action.id.clone();
            self.connectivity.enqueue(action);

            // The queue is now the durable copy; drafts would only risk
            // a second submission of the same sale.
            self.drafts.purge();

            self.events.publish(DomainEvent::SaleCreated {
                sale_id: None,
                total_cents: totals.total_cents,
                queued: true,
            });
            self.notifier.warning(
                "Sale saved offline",
                Some("It will be submitted automatically when the connection returns"),
            );
            info!(
                action_id = %action_id,
                total_cents = totals.total_cents,
                "Sale queued for offline sync"
            );
            return Ok(SubmissionOutcome::QueuedOffline { action_id });
        }

        // --- 3. Protect ----------------------------------------------------
        let snapshot = DraftSnapshot::capture(
            ctx.cart,
            ctx.payment,
            ctx.sale_type,
            ctx.discount_reason,
            ctx.client,
        );
        self.drafts.backup(&snapshot);

        // --- 4. POST -------------------------------------------------------
        // Guide sales span agency/guide/employee commission records
        // server-side, so a duplicate is costly to unwind. A key minted
        // fresh per attempt lets the backend deduplicate exactly this
        // attempt without ever suppressing an intentional retry.
        let idempotency_key =
            (ctx.sale_type == SaleType::Guide).then(|| Uuid::new_v4().to_string());

        let options = RequestOptions {
            suppress_error_handler: true,
            no_cache: false,
            idempotency_key,
        };

        // --- 5. Settle -----------------------------------------------------
        match self.api.post(SALES_ENDPOINT, payload, options).await {
            Ok(response) => {
                let sale: CompletedSale = serde_json::from_value(response.data)?;

                self.drafts.purge();
                self.events.publish(DomainEvent::SaleCreated {
                    sale_id: Some(sale.id.clone()),
                    total_cents: sale.total_cents,
                    queued: false,
                });
                self.notifier.success(
                    "Sale completed",
                    sale.receipt_number.as_deref(),
                );
                info!(
                    sale_id = %sale.id,
                    total_cents = sale.total_cents,
                    "Sale submitted"
                );
                Ok(SubmissionOutcome::Submitted(sale))
            }

            Err(failure) if failure.is_session_expired() => {
                error!("Sale submission rejected: session expired");
                self.notifier.error(
                    "Session expired",
                    Some("The sale was saved as a draft; sign in again to finish it"),
                );
                self.session.logout();
                Ok(SubmissionOutcome::SessionExpired)
            }

            Err(failure) => {
                // Deliberately no retry here; the backup from step 3 is
                // the recovery path.
                let message = failure.to_string();
                error!(error = %message, "Sale submission failed");
                self.notifier.error(
                    "Sale could not be submitted",
                    Some("The sale was saved as a draft; review it and try again"),
                );
                Ok(SubmissionOutcome::FailedRecoverable { message })
            }
        }
    }

    /// Refreshes the product catalog after a confirmed sale, with bounded
    /// retry. Callers keep their current catalog on error.
    pub async fn refresh_products(&self) -> EngineResult<Vec<Product>> {
        let options = RequestOptions {
            no_cache: true,
            ..RequestOptions::default()
        };
        let data = get_with_retry(self.api.as_ref(), PRODUCTS_ENDPOINT, options).await?;
        Ok(serde_json::from_value(data)?)
    }

    /// Fetches the current sale list, with bounded retry. Callers fall
    /// back to their cached list on error.
    pub async fn refresh_sales(&self) -> EngineResult<Vec<CompletedSale>> {
        let options = RequestOptions {
            no_cache: true,
            ..RequestOptions::default()
        };
        let data = get_with_retry(self.api.as_ref(), SALES_ENDPOINT, options).await?;
        Ok(serde_json::from_value(data)?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
