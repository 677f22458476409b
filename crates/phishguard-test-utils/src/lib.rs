//! Testing utilities for the PhishGuard workspace
//!
//! Shared document fixtures, canned classification payloads, and scripted
//! backends.

#![allow(missing_docs)]

use async_trait::async_trait;
use indexmap::IndexMap;
use phishguard_dom::{Document, NodeId};
use phishguard_relay::{
    Backend, BackendError, BreakdownEntry, ClassificationResponse, ClassifyRequest,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Gmail message view with subject, sender, and body populated.
///
/// Returns the document and the subject header element, which doubles as the
/// injection anchor.
pub fn gmail_message_doc() -> (Document, NodeId) {
    let mut doc = Document::new();
    let header = doc.create_element("div");
    doc.add_class(header, "ha");
    let h2 = doc.create_element("h2");
    doc.add_class(h2, "hP");
    doc.set_text(h2, "Verify your account now");
    doc.append_child(doc.root(), header);
    doc.append_child(header, h2);

    let sender = doc.create_element("span");
    doc.add_class(sender, "gD");
    doc.set_attr(sender, "email", "security@paypa1.com");
    doc.set_text(sender, "PayPal Security");
    doc.append_child(doc.root(), sender);

    let body = doc.create_element("div");
    doc.add_class(body, "a3s");
    doc.add_class(body, "aiL");
    doc.set_text(body, "Click here immediately...");
    doc.append_child(doc.root(), body);

    (doc, header)
}

/// Gmail inbox view: list chrome present, no message open.
pub fn gmail_inbox_doc() -> Document {
    let mut doc = Document::new();
    let list = doc.create_element("div");
    doc.set_attr(list, "role", "main");
    doc.append_child(doc.root(), list);
    for subject in ["Weekly digest", "Your order shipped"] {
        let row = doc.create_element("tr");
        doc.add_class(row, "zA");
        doc.set_text(row, subject);
        doc.append_child(list, row);
    }
    doc
}

/// Outlook message view with subject, sender, and body populated.
///
/// Returns the document and the heading's parent pane, which is the
/// injection anchor.
pub fn outlook_message_doc() -> (Document, NodeId) {
    let mut doc = Document::new();
    let pane = doc.create_element("div");
    doc.append_child(doc.root(), pane);
    let heading = doc.create_element("div");
    doc.set_attr(heading, "role", "heading");
    doc.set_attr(heading, "aria-level", "2");
    doc.set_text(heading, "Your mailbox is full");
    doc.append_child(pane, heading);

    let main = doc.create_element("div");
    doc.set_attr(main, "role", "main");
    let sender = doc.create_element("button");
    doc.set_attr(sender, "aria-label", "Contoso Billing <billing@contoso.com>");
    doc.set_text(sender, "Contoso Billing");
    doc.append_child(doc.root(), main);
    doc.append_child(main, sender);

    let body = doc.create_element("div");
    doc.set_attr(body, "role", "document");
    doc.set_text(body, "Upgrade storage now");
    doc.append_child(doc.root(), body);

    (doc, pane)
}

/// High-risk payload with breakdown and features populated.
pub fn phishing_response() -> ClassificationResponse {
    let mut breakdown = IndexMap::new();
    breakdown.insert("Urgency".to_string(), BreakdownEntry::new(30.0));
    breakdown.insert(
        "URL Risk".to_string(),
        BreakdownEntry::new(140.0).with_reason("2 suspicious TLDs"),
    );
    breakdown.insert("Safe Indicators".to_string(), BreakdownEntry::new(10.0));

    let mut features = IndexMap::new();
    features.insert("url_count".to_string(), serde_json::json!(3));
    features.insert("has_url".to_string(), serde_json::json!(true));
    features.insert("caps_ratio".to_string(), serde_json::json!(0.42));
    features.insert("urgency_count".to_string(), serde_json::json!(4));
    features.insert("has_greeting".to_string(), serde_json::json!(false));

    ClassificationResponse {
        risk_score: 87.4,
        classification: "🔴 Phishing".to_string(),
        explanation: vec![
            "Urgent language".to_string(),
            "Suspicious sender domain".to_string(),
        ],
        safe_signals: vec![],
        risk_breakdown: breakdown,
        ml_raw: Some(91.2),
        safe_adjustment: Some(3.8),
        adjusted_probability: Some(0.874),
        features,
    }
}

/// Mid-tier payload.
pub fn suspicious_response() -> ClassificationResponse {
    ClassificationResponse {
        risk_score: 55.0,
        classification: "🟡 Suspicious".to_string(),
        explanation: vec!["Generic personalization".to_string()],
        safe_signals: vec!["Has unsubscribe link".to_string()],
        ..ClassificationResponse::default()
    }
}

/// Low-risk payload.
pub fn safe_response() -> ClassificationResponse {
    ClassificationResponse {
        risk_score: 4.2,
        classification: "🟢 Looks Safe".to_string(),
        safe_signals: vec![
            "Personal greeting".to_string(),
            "Company footer".to_string(),
        ],
        ml_raw: Some(6.0),
        ..ClassificationResponse::default()
    }
}

/// Backend returning a fixed payload, counting calls and recording the last
/// request.
#[derive(Debug)]
pub struct StaticBackend {
    response: ClassificationResponse,
    calls: AtomicUsize,
    last_request: parking_lot::Mutex<Option<ClassifyRequest>>,
}

impl StaticBackend {
    pub fn new(response: ClassificationResponse) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
            last_request: parking_lot::Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ClassifyRequest> {
        self.last_request.lock().clone()
    }
}

#[async_trait]
impl Backend for StaticBackend {
    async fn classify(
        &self,
        request: ClassifyRequest,
    ) -> Result<ClassificationResponse, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock() = Some(request);
        Ok(self.response.clone())
    }
}

/// Backend refusing every request with a fixed HTTP status.
#[derive(Debug)]
pub struct FailingBackend {
    status: u16,
    calls: AtomicUsize,
}

impl FailingBackend {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for FailingBackend {
    async fn classify(
        &self,
        _request: ClassifyRequest,
    ) -> Result<ClassificationResponse, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(BackendError::Status(self.status))
    }
}

/// Backend that blocks each call until [`GatedBackend::release`] is invoked,
/// so tests can hold an analysis in flight.
#[derive(Debug)]
pub struct GatedBackend {
    response: ClassificationResponse,
    gate: Arc<Semaphore>,
    calls: AtomicUsize,
}

impl GatedBackend {
    pub fn new(response: ClassificationResponse) -> Self {
        Self {
            response,
            gate: Arc::new(Semaphore::new(0)),
            calls: AtomicUsize::new(0),
        }
    }

    /// Let one pending (or future) call through.
    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    /// Calls that have reached the backend, including ones still gated.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for GatedBackend {
    async fn classify(
        &self,
        _request: ClassifyRequest,
    ) -> Result<ClassificationResponse, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| BackendError::Scripted("gate closed".to_string()))?;
        permit.forget();
        Ok(self.response.clone())
    }
}
