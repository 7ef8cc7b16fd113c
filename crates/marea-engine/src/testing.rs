//! In-memory port implementations shared by the unit tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error::ApiFailure;
use crate::ports::{
    ApiClient, ApiResponse, ConnectivityProvider, DomainEvent, EventBus, KeyValueStore,
    NotificationSink, RequestOptions, SessionProvider,
};
use crate::queue::PendingAction;

// =============================================================================
// Key-Value Store
// =============================================================================

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect()
    }
}

// =============================================================================
// API Client
// =============================================================================

pub struct RecordedCall {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
    pub options: RequestOptions,
}

/// Replays a scripted queue of responses and records every call.
#[derive(Default)]
pub struct ScriptedApi {
    responses: Mutex<VecDeque<Result<ApiResponse, ApiFailure>>>,
    pub calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedApi {
    pub fn respond_ok(&self, data: Value) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(ApiResponse { status: 200, data }));
    }

    pub fn respond_err(&self, failure: ApiFailure) {
        self.responses.lock().unwrap().push_back(Err(failure));
    }

    fn next(&self) -> Result<ApiResponse, ApiFailure> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiFailure::Network("script exhausted".into())))
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ApiClient for ScriptedApi {
    async fn get(&self, path: &str, options: RequestOptions) -> Result<ApiResponse, ApiFailure> {
        self.calls.lock().unwrap().push(RecordedCall {
            method: "GET",
            path: path.to_string(),
            body: None,
            options,
        });
        self.next()
    }

    async fn post(
        &self,
        path: &str,
        body: Value,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiFailure> {
        self.calls.lock().unwrap().push(RecordedCall {
            method: "POST",
            path: path.to_string(),
            body: Some(body),
            options,
        });
        self.next()
    }
}

// =============================================================================
// Notifications
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    fn record(&self, kind: NoticeKind, message: &str) {
        self.notices.lock().unwrap().push(Notice {
            kind,
            message: message.to_string(),
        });
    }

    pub fn kinds(&self) -> Vec<NoticeKind> {
        self.notices.lock().unwrap().iter().map(|n| n.kind.clone()).collect()
    }
}

impl NotificationSink for RecordingNotifier {
    fn success(&self, message: &str, _detail: Option<&str>) {
        self.record(NoticeKind::Success, message);
    }

    fn warning(&self, message: &str, _detail: Option<&str>) {
        self.record(NoticeKind::Warning, message);
    }

    fn error(&self, message: &str, _detail: Option<&str>) {
        self.record(NoticeKind::Error, message);
    }
}

// =============================================================================
// Connectivity
// =============================================================================

#[derive(Default)]
pub struct FakeConnectivity {
    pub offline: AtomicBool,
    pub queued: Mutex<Vec<PendingAction>>,
}

impl FakeConnectivity {
    pub fn offline() -> Self {
        let fake = FakeConnectivity::default();
        fake.offline.store(true, Ordering::SeqCst);
        fake
    }
}

impl ConnectivityProvider for FakeConnectivity {
    fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    fn enqueue(&self, action: PendingAction) {
        self.queued.lock().unwrap().push(action);
    }
}

// =============================================================================
// Session
// =============================================================================

pub struct FakeSession {
    pub role: String,
    pub logged_out: AtomicBool,
}

impl FakeSession {
    pub fn with_role(role: &str) -> Self {
        FakeSession {
            role: role.to_string(),
            logged_out: AtomicBool::new(false),
        }
    }
}

impl SessionProvider for FakeSession {
    fn role(&self) -> String {
        self.role.clone()
    }

    fn logout(&self) {
        self.logged_out.store(true, Ordering::SeqCst);
    }
}

// =============================================================================
// Event Bus
// =============================================================================

#[derive(Default)]
pub struct RecordingBus {
    pub events: Mutex<Vec<DomainEvent>>,
}

impl EventBus for RecordingBus {
    fn publish(&self, event: DomainEvent) {
        self.events.lock().unwrap().push(event);
    }
}
