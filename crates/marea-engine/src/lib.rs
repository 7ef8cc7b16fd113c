//! # marea-engine: Durability & Submission Engine for Marea POS
//!
//! Everything around the pure core that needs the outside world:
//! offline-first draft persistence, the pending-action queue, and the
//! sale submission protocol. All I/O goes through injected ports.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Marea POS Architecture                         │
//! │                                                                     │
//! │  ┌─────────────────────────────────────────────────────────────┐   │
//! │  │                  UI shell (out of scope)                    │   │
//! │  └───────────────────────────┬─────────────────────────────────┘   │
//! │                              │                                      │
//! │  ┌───────────────────────────▼─────────────────────────────────┐   │
//! │  │               ★ marea-engine (THIS CRATE) ★                 │   │
//! │  │                                                             │   │
//! │  │   ┌──────────┐ ┌─────────┐ ┌─────────┐ ┌────────────────┐  │   │
//! │  │   │ workflow │ │  draft  │ │ submit  │ │ queue / retry  │  │   │
//! │  │   │ SaleWork-│ │ Draft-  │ │ Sale-   │ │ PendingAction  │  │   │
//! │  │   │ flow     │ │ Store   │ │ Submis- │ │ bounded reads  │  │   │
//! │  │   │          │ │         │ │ sion    │ │                │  │   │
//! │  │   └──────────┘ └─────────┘ └─────────┘ └────────────────┘  │   │
//! │  │   ┌─────────────────────────────────────────────────────┐  │   │
//! │  │   │ ports: ApiClient · KeyValueStore · NotificationSink │  │   │
//! │  │   │        ConnectivityProvider · Session · EventBus    │  │   │
//! │  │   └─────────────────────────────────────────────────────┘  │   │
//! │  └───────────────────────────┬─────────────────────────────────┘   │
//! │                              │                                      │
//! │  ┌───────────────────────────▼─────────────────────────────────┐   │
//! │  │            marea-core (pure business logic)                 │   │
//! │  └─────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! 1. **Nothing is lost**: every cart mutation is autosaved; risky
//!    submission paths write timestamped backups first
//! 2. **Nothing is charged twice**: one submission in flight per
//!    terminal, sale POSTs are never silently replayed, guide sales
//!    carry per-attempt idempotency keys
//! 3. **Offline is a first-class path**: no connectivity means the sale
//!    is queued and the operator moves on to the next customer

// =============================================================================
// Module Declarations
// =============================================================================

pub mod draft;
pub mod error;
pub mod ports;
pub mod queue;
pub mod retry;
pub mod submit;
pub mod workflow;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use draft::{DraftItem, DraftSnapshot, DraftStore};
pub use error::{ApiFailure, EngineError, EngineResult};
pub use ports::{
    ApiClient, ApiResponse, ConnectivityProvider, DomainEvent, EventBus, KeyValueStore,
    NotificationSink, RequestOptions, SessionProvider,
};
pub use queue::{ActionPriority, PendingAction};
pub use submit::{SaleSubmission, SubmissionOutcome, SubmitContext};
pub use workflow::SaleWorkflow;
