//! # Sale Workflow
//!
//! Stateful orchestrator of one in-progress sale: it owns the cart, the
//! payment state and the attached parties, funnels every edit through the
//! core invariants, and autosaves a draft after each mutation so a crash
//! or reload never loses work.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  startup ──► restore_draft() ──► edits* ──► submit() ──► reset      │
//! │                                    │                                │
//! │                                    └─► autosave after EVERY edit    │
//! │                                                                     │
//! │  clear() is destructive and requires caller confirmation; it wipes  │
//! │  cart, payment state and the stored draft in one step.              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use tracing::{debug, info};

use marea_core::cart::{Cart, DiscountPolicy, PriceEdit};
use marea_core::money::{Money, Rate};
use marea_core::payment::cash_change;
use marea_core::pricing::{SaleTotals, TaxConfig};
use marea_core::types::{
    Agency, ClientRef, DiscountReason, Employee, Guide, Payment, Product, SaleType,
};

use crate::draft::{DraftSnapshot, DraftStore};
use crate::error::{EngineError, EngineResult};
use crate::ports::SessionProvider;
use crate::submit::{SaleSubmission, SubmitContext, SubmissionOutcome};

// =============================================================================
// Workflow
// =============================================================================

/// One terminal's in-progress sale.
pub struct SaleWorkflow {
    cart: Cart,
    payment: Payment,
    sale_type: SaleType,
    discount_reason: Option<DiscountReason>,
    client: Option<ClientRef>,
    agency: Option<Agency>,
    guide: Option<Guide>,
    employee: Option<Employee>,
    catalog: Vec<Product>,
    tax: TaxConfig,
    policy: DiscountPolicy,
    drafts: DraftStore,
    session: Arc<dyn SessionProvider>,
}

impl SaleWorkflow {
    pub fn new(
        catalog: Vec<Product>,
        tax: TaxConfig,
        policy: DiscountPolicy,
        drafts: DraftStore,
        session: Arc<dyn SessionProvider>,
    ) -> Self {
        SaleWorkflow {
            cart: Cart::new(),
            payment: Payment::default(),
            sale_type: SaleType::default(),
            discount_reason: None,
            client: None,
            agency: None,
            guide: None,
            employee: None,
            catalog,
            tax,
            policy,
            drafts,
            session,
        }
    }

    // --- Read access --------------------------------------------------------

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn payment(&self) -> &Payment {
        &self.payment
    }

    pub fn sale_type(&self) -> SaleType {
        self.sale_type
    }

    /// Totals recomputed from scratch on every call; there is no cached
    /// figure that could drift from the cart.
    pub fn totals(&self) -> SaleTotals {
        SaleTotals::compute(&self.cart, &self.tax)
    }

    /// Change due on a cash tender: `received - total` once the tender
    /// covers the total, zero otherwise (and for non-cash methods).
    pub fn change_due(&self) -> Money {
        match &self.payment {
            Payment::Cash {
                received_cents: Some(received),
            } => cash_change(Money::from_cents(*received), self.totals().total()),
            _ => Money::zero(),
        }
    }

    // --- Cart edits ---------------------------------------------------------

    /// Adds a catalog product to the cart (or increments its line).
    pub fn add_product(&mut self, product_id: &str) -> EngineResult<()> {
        let product = self
            .catalog
            .iter()
            .find(|p| p.id == product_id)
            .ok_or_else(|| EngineError::UnknownProduct(product_id.to_string()))?
            .clone();

        self.cart.add_item(&product)?;
        self.autosave();
        Ok(())
    }

    pub fn set_quantity(&mut self, product_id: &str, quantity: i64) -> EngineResult<()> {
        self.cart.update_quantity(product_id, quantity)?;
        self.autosave();
        Ok(())
    }

    /// Edits a line's unit price. The caller should warn the operator
    /// when the outcome is [`PriceEdit::AppliedBelowReference`].
    pub fn set_unit_price(&mut self, product_id: &str, cents: i64) -> EngineResult<PriceEdit> {
        let edit = self.cart.update_unit_price(product_id, cents)?;
        self.autosave();
        Ok(edit)
    }

    /// Applies a line discount, clamped to the ceiling of the signed-in
    /// operator's role. Returns the rate actually applied.
    pub fn set_discount(&mut self, product_id: &str, requested: Rate) -> EngineResult<Rate> {
        let role = self.session.role();
        let applied = self
            .cart
            .update_discount(product_id, requested, &self.policy, &role)?;
        self.autosave();
        Ok(applied)
    }

    pub fn remove_product(&mut self, product_id: &str) -> EngineResult<()> {
        self.cart.remove_item(product_id)?;
        self.autosave();
        Ok(())
    }

    // --- Payment and attribution --------------------------------------------

    pub fn set_payment(&mut self, payment: Payment) {
        self.payment = payment;
        self.autosave();
    }

    /// Switches the sale type. Going back to a street sale drops the
    /// agency and guide: they only exist on guide sales.
    pub fn set_sale_type(&mut self, sale_type: SaleType) {
        self.sale_type = sale_type;
        if sale_type == SaleType::Street {
            self.agency = None;
            self.guide = None;
        }
        self.autosave();
    }

    pub fn set_discount_reason(&mut self, reason: Option<DiscountReason>) {
        self.discount_reason = reason;
        self.autosave();
    }

    pub fn set_client(&mut self, client: Option<ClientRef>) {
        self.client = client;
        self.autosave();
    }

    pub fn set_agency(&mut self, agency: Option<Agency>) {
        self.agency = agency;
        self.autosave();
    }

    pub fn set_guide(&mut self, guide: Option<Guide>) {
        self.guide = guide;
        self.autosave();
    }

    pub fn set_employee(&mut self, employee: Option<Employee>) {
        self.employee = employee;
        self.autosave();
    }

    // --- Catalog ------------------------------------------------------------

    /// Replaces the injected catalog (after a refresh). Existing cart
    /// lines keep their snapshots; the submit gate re-judges them.
    pub fn update_catalog(&mut self, catalog: Vec<Product>) {
        self.catalog = catalog;
    }

    // --- Draft lifecycle ----------------------------------------------------

    /// Restores a previously autosaved draft, reconciled against the
    /// current catalog. Returns whether anything was restored.
    pub fn restore_draft(&mut self) -> bool {
        let Some(snapshot) = self.drafts.load() else {
            return false;
        };

        self.cart = snapshot.hydrate(&self.catalog);
        self.payment = snapshot.payment.clone();
        self.sale_type = snapshot.sale_type;
        self.discount_reason = snapshot.discount_reason;
        self.client = snapshot.client.clone();

        info!(
            lines = self.cart.line_count(),
            "Restored sale draft from storage"
        );
        true
    }

    /// Restores the most recent pre-submission backup into the live
    /// draft slot and rebuilds the sale from it. Called after the
    /// operator explicitly chooses to recover a failed submission.
    pub fn recover_backup(&mut self) -> bool {
        if self.drafts.restore_latest_backup().is_none() {
            return false;
        }
        self.restore_draft()
    }

    /// Cancels the sale: cart, payment state and stored draft all go.
    /// Refuses to act without explicit confirmation from the operator.
    pub fn clear(&mut self, confirmed: bool) -> bool {
        if !confirmed {
            return false;
        }
        self.reset_state();
        self.drafts.clear_draft();
        info!("Sale cancelled and draft cleared");
        true
    }

    fn reset_state(&mut self) {
        self.cart.clear();
        self.payment = Payment::default();
        self.discount_reason = None;
        self.client = None;
        // Sale type and parties are kept: a guide group buying in
        // several rounds should not force re-picking the guide.
    }

    fn snapshot(&self) -> DraftSnapshot {
        DraftSnapshot::capture(
            &self.cart,
            &self.payment,
            self.sale_type,
            self.discount_reason,
            self.client.as_ref(),
        )
    }

    fn autosave(&self) {
        self.drafts.save(&self.snapshot());
        debug!(lines = self.cart.line_count(), "Autosaved sale draft");
    }

    // --- Submission ---------------------------------------------------------

    /// Submits the sale through the full protocol. On a durable hand-off
    /// (confirmed or queued) the workflow resets for the next sale; on a
    /// recoverable failure everything stays put for a retry.
    pub async fn submit(
        &mut self,
        submission: &SaleSubmission,
    ) -> EngineResult<SubmissionOutcome> {
        let outcome = submission
            .submit(SubmitContext {
                cart: &self.cart,
                payment: &self.payment,
                sale_type: self.sale_type,
                discount_reason: self.discount_reason,
                client: self.client.as_ref(),
                agency: self.agency.as_ref(),
                guide: self.guide.as_ref(),
                employee: self.employee.as_ref(),
                catalog: &self.catalog,
                tax: &self.tax,
                policy: &self.policy,
            })
            .await?;

        if matches!(
            outcome,
            SubmissionOutcome::Submitted(_) | SubmissionOutcome::QueuedOffline { .. }
        ) {
            self.reset_state();
        }

        Ok(outcome)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::DRAFT_KEY;
    use crate::ports::KeyValueStore;
    use crate::testing::{
        FakeConnectivity, FakeSession, MemoryStore, RecordingBus, RecordingNotifier, ScriptedApi,
    };
    use serde_json::json;
    use std::collections::HashMap;

    fn test_product(id: &str, price_cents: i64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            sku: format!("SKU-{}", id),
            name: format!("Product {}", id),
            price_cents,
            stock,
            max_discount_bps: None,
            discountable: true,
        }
    }

    fn policy() -> DiscountPolicy {
        let mut ceilings = HashMap::new();
        ceilings.insert("cashier".to_string(), 1000);
        DiscountPolicy::new(ceilings, 0)
    }

    fn workflow_on(store: Arc<MemoryStore>) -> SaleWorkflow {
        SaleWorkflow::new(
            vec![test_product("p1", 10000, 5), test_product("p2", 4500, 3)],
            TaxConfig::disabled(),
            policy(),
            DraftStore::new(store),
            Arc::new(FakeSession::with_role("cashier")),
        )
    }

    #[test]
    fn test_add_unknown_product_rejected() {
        let mut wf = workflow_on(Arc::new(MemoryStore::default()));
        let err = wf.add_product("nope").unwrap_err();
        assert!(matches!(err, EngineError::UnknownProduct(_)));
    }

    #[test]
    fn test_every_edit_autosaves() {
        let store = Arc::new(MemoryStore::default());
        let mut wf = workflow_on(store.clone());

        assert!(store.get(DRAFT_KEY).is_none());

        wf.add_product("p1").unwrap();
        let after_add = store.get(DRAFT_KEY).unwrap();
        assert!(after_add.contains("\"productId\":\"p1\""));

        wf.set_quantity("p1", 3).unwrap();
        let after_qty = store.get(DRAFT_KEY).unwrap();
        assert_ne!(after_add, after_qty);

        wf.set_payment(Payment::Card {
            reference: "AUTH-7".into(),
        });
        assert!(store.get(DRAFT_KEY).unwrap().contains("\"method\":\"card\""));
    }

    #[test]
    fn test_discount_uses_session_role_ceiling() {
        let mut wf = workflow_on(Arc::new(MemoryStore::default()));
        wf.add_product("p1").unwrap();

        // Cashier ceiling is 10%: a 50% request is clamped
        let applied = wf.set_discount("p1", Rate::from_bps(5000)).unwrap();
        assert_eq!(applied, Rate::from_bps(1000));
    }

    #[test]
    fn test_price_edit_below_reference_reported() {
        let mut wf = workflow_on(Arc::new(MemoryStore::default()));
        wf.add_product("p1").unwrap();

        assert_eq!(
            wf.set_unit_price("p1", 8000).unwrap(),
            PriceEdit::AppliedBelowReference
        );
        assert_eq!(wf.totals().total_cents, 8000);
    }

    #[test]
    fn test_restore_draft_survives_restart() {
        let store = Arc::new(MemoryStore::default());

        let mut first = workflow_on(store.clone());
        first.add_product("p1").unwrap();
        first.set_quantity("p1", 2).unwrap();
        first.set_payment(Payment::Cash {
            received_cents: Some(20000),
        });

        // "Restart": a fresh workflow over the same storage
        let mut second = workflow_on(store);
        assert!(second.restore_draft());
        assert_eq!(second.cart().line_count(), 1);
        assert_eq!(second.cart().items[0].quantity, 2);
        assert_eq!(second.totals().total_cents, 20000);
        assert_eq!(
            second.payment(),
            &Payment::Cash {
                received_cents: Some(20000),
            }
        );
    }

    #[tokio::test]
    async fn test_restore_reapplies_client_through_to_submission() {
        let store = Arc::new(MemoryStore::default());

        let mut first = workflow_on(store.clone());
        first.add_product("p1").unwrap();
        first.set_payment(Payment::Cash {
            received_cents: Some(10000),
        });
        first.set_client(Some(ClientRef {
            id: "c-9".into(),
            name: "Ana".into(),
        }));

        // Reload: the restored sale must still be attributed to the client
        let mut second = workflow_on(store.clone());
        assert!(second.restore_draft());
        assert_eq!(second.client.as_ref().unwrap().id, "c-9");

        let api = Arc::new(ScriptedApi::default());
        api.respond_ok(json!({
            "id": "s1",
            "receipt_number": null,
            "sale_type": "STREET",
            "subtotal_cents": 10000,
            "discount_cents": 0,
            "tax_cents": 0,
            "total_cents": 10000,
            "created_at": "2026-08-24T12:00:00Z",
        }));
        let submission = SaleSubmission::new(
            api.clone(),
            DraftStore::new(store),
            Arc::new(RecordingNotifier::default()),
            Arc::new(FakeConnectivity::default()),
            Arc::new(FakeSession::with_role("cashier")),
            Arc::new(RecordingBus::default()),
        );

        second.submit(&submission).await.unwrap();

        let calls = api.calls.lock().unwrap();
        assert_eq!(calls[0].body.as_ref().unwrap()["clientId"], "c-9");
    }

    #[test]
    fn test_change_due_on_cash_tender() {
        let mut wf = workflow_on(Arc::new(MemoryStore::default()));
        wf.add_product("p1").unwrap(); // $100.00 total

        // Non-cash and missing tender yield zero
        assert_eq!(wf.change_due(), Money::zero());
        wf.set_payment(Payment::Card {
            reference: "AUTH-1".into(),
        });
        assert_eq!(wf.change_due(), Money::zero());

        wf.set_payment(Payment::Cash {
            received_cents: Some(10000),
        });
        assert_eq!(wf.change_due(), Money::zero());

        wf.set_payment(Payment::Cash {
            received_cents: Some(15000),
        });
        assert_eq!(wf.change_due().cents(), 5000);
    }

    #[test]
    fn test_restore_drops_delisted_products() {
        let store = Arc::new(MemoryStore::default());

        let mut first = workflow_on(store.clone());
        first.add_product("p1").unwrap();
        first.add_product("p2").unwrap();

        // Catalog shrank while the terminal was off
        let mut second = SaleWorkflow::new(
            vec![test_product("p1", 10000, 5)],
            TaxConfig::disabled(),
            policy(),
            DraftStore::new(store),
            Arc::new(FakeSession::with_role("cashier")),
        );
        assert!(second.restore_draft());
        assert_eq!(second.cart().line_count(), 1);
        assert_eq!(second.cart().items[0].product.id, "p1");
    }

    #[test]
    fn test_clear_requires_confirmation() {
        let store = Arc::new(MemoryStore::default());
        let mut wf = workflow_on(store.clone());
        wf.add_product("p1").unwrap();

        assert!(!wf.clear(false));
        assert_eq!(wf.cart().line_count(), 1);
        assert!(store.get(DRAFT_KEY).is_some());

        assert!(wf.clear(true));
        assert!(wf.cart().is_empty());
        assert!(store.get(DRAFT_KEY).is_none());
    }

    #[test]
    fn test_street_sale_type_drops_agency_and_guide() {
        let mut wf = workflow_on(Arc::new(MemoryStore::default()));
        wf.set_sale_type(SaleType::Guide);
        wf.set_agency(Some(Agency {
            id: "a1".into(),
            name: "Playa Tours".into(),
            commission_rate_bps: 500,
        }));

        wf.set_sale_type(SaleType::Street);
        assert!(wf.agency.is_none());
        assert!(wf.guide.is_none());
    }

    #[tokio::test]
    async fn test_successful_submit_resets_for_next_sale() {
        let store = Arc::new(MemoryStore::default());
        let api = Arc::new(ScriptedApi::default());
        api.respond_ok(json!({
            "id": "s1",
            "receipt_number": null,
            "sale_type": "STREET",
            "subtotal_cents": 10000,
            "discount_cents": 0,
            "tax_cents": 0,
            "total_cents": 10000,
            "created_at": "2026-08-24T12:00:00Z",
        }));

        let submission = SaleSubmission::new(
            api,
            DraftStore::new(store.clone()),
            Arc::new(RecordingNotifier::default()),
            Arc::new(FakeConnectivity::default()),
            Arc::new(FakeSession::with_role("cashier")),
            Arc::new(RecordingBus::default()),
        );

        let mut wf = workflow_on(store.clone());
        wf.add_product("p1").unwrap();
        wf.set_payment(Payment::Cash {
            received_cents: Some(10000),
        });

        let outcome = wf.submit(&submission).await.unwrap();
        assert!(matches!(outcome, SubmissionOutcome::Submitted(_)));

        // Ready for the next customer
        assert!(wf.cart().is_empty());
        assert_eq!(wf.payment(), &Payment::default());
        assert!(store.get(DRAFT_KEY).is_none());
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_sale_intact() {
        let store = Arc::new(MemoryStore::default());
        let api = Arc::new(ScriptedApi::default());
        api.respond_err(crate::error::ApiFailure::Status {
            status: 500,
            message: "boom".into(),
        });

        let submission = SaleSubmission::new(
            api,
            DraftStore::new(store.clone()),
            Arc::new(RecordingNotifier::default()),
            Arc::new(FakeConnectivity::default()),
            Arc::new(FakeSession::with_role("cashier")),
            Arc::new(RecordingBus::default()),
        );

        let mut wf = workflow_on(store);
        wf.add_product("p1").unwrap();
        wf.set_payment(Payment::Cash {
            received_cents: Some(10000),
        });

        let outcome = wf.submit(&submission).await.unwrap();
        assert!(matches!(
            outcome,
            SubmissionOutcome::FailedRecoverable { .. }
        ));

        // Everything stays put for a retry
        assert_eq!(wf.cart().line_count(), 1);
        assert_eq!(
            wf.payment(),
            &Payment::Cash {
                received_cents: Some(10000),
            }
        );
    }

    #[tokio::test]
    async fn test_recover_backup_after_failed_submit() {
        let store = Arc::new(MemoryStore::default());
        let api = Arc::new(ScriptedApi::default());
        api.respond_err(crate::error::ApiFailure::Network("down".into()));

        let submission = SaleSubmission::new(
            api,
            DraftStore::new(store.clone()),
            Arc::new(RecordingNotifier::default()),
            Arc::new(FakeConnectivity::default()),
            Arc::new(FakeSession::with_role("cashier")),
            Arc::new(RecordingBus::default()),
        );

        let mut wf = workflow_on(store);
        wf.add_product("p1").unwrap();
        wf.set_quantity("p1", 2).unwrap();
        wf.set_payment(Payment::Cash {
            received_cents: Some(20000),
        });
        wf.submit(&submission).await.unwrap();

        // Operator cancels the on-screen sale, then chooses to recover
        assert!(wf.clear(true));
        assert!(wf.cart().is_empty());

        assert!(wf.recover_backup());
        assert_eq!(wf.cart().line_count(), 1);
        assert_eq!(wf.cart().items[0].quantity, 2);
        assert_eq!(
            wf.payment(),
            &Payment::Cash {
                received_cents: Some(20000),
            }
        );
    }
}
