//! Injection controller
//!
//! Owns the engine's view of one page: the shared document handle, the
//! selected platform profile, and the UI state. Every tick re-evaluates the
//! tree idempotently; activation runs the extract-classify-render sequence
//! with busy exclusivity.

use crate::state::{decide, EngineUiState, TickAction};
use parking_lot::Mutex;
use phishguard_dom::Document;
use phishguard_platform::{assemble, ExtractionError, PlatformProfile};
use phishguard_relay::{AnalysisFailure, ClassificationResponse, RelayError, RelayHandle};
use phishguard_render::{dismiss_panel, render_result, PANEL_ID};
use std::sync::Arc;

/// Element id of the injected action control
pub const CONTROL_ID: &str = "phishguard-detect-btn";

/// Control label while idle, before any analysis
pub const LABEL_IDLE: &str = "Detect Phishing";
/// Control label while an analysis is in flight
pub const LABEL_BUSY: &str = "Analyzing...";
/// Control label after an analysis has completed
pub const LABEL_RESCAN: &str = "Re-scan";

#[derive(Debug, Default)]
struct Shared {
    state: EngineUiState,
    last_response: Option<ClassificationResponse>,
}

/// The tick- and click-driven engine for one page view
///
/// Cheap to clone; clones share the document, relay, and state. All methods
/// take `&self` so an in-flight activation never blocks tick handling.
#[derive(Debug, Clone)]
pub struct InjectionEngine {
    profile: &'static PlatformProfile,
    doc: Arc<Mutex<Document>>,
    relay: RelayHandle,
    shared: Arc<Mutex<Shared>>,
}

impl InjectionEngine {
    /// Engine for a known platform
    #[must_use]
    pub fn new(
        profile: &'static PlatformProfile,
        doc: Arc<Mutex<Document>>,
        relay: RelayHandle,
    ) -> Self {
        Self {
            profile,
            doc,
            relay,
            shared: Arc::new(Mutex::new(Shared::default())),
        }
    }

    /// Engine for a page host string, or `None` on unsupported hosts
    ///
    /// No profile means the engine never activates on this page; callers
    /// simply do not construct one.
    #[must_use]
    pub fn for_host(host: &str, doc: Arc<Mutex<Document>>, relay: RelayHandle) -> Option<Self> {
        let profile = PlatformProfile::detect(host)?;
        tracing::info!(platform = %profile.platform(), host, "platform profile selected");
        Some(Self::new(profile, doc, relay))
    }

    /// Active platform profile
    #[inline]
    #[must_use]
    pub fn profile(&self) -> &'static PlatformProfile {
        self.profile
    }

    /// Current UI state snapshot
    #[must_use]
    pub fn state(&self) -> EngineUiState {
        self.shared.lock().state
    }

    /// Last successful classification, if any
    #[must_use]
    pub fn last_response(&self) -> Option<ClassificationResponse> {
        self.shared.lock().last_response.clone()
    }

    /// Re-evaluate the tree once
    ///
    /// Safe to call from overlapping trigger sources: presence is re-derived
    /// from the tree, so repeated ticks converge instead of duplicating.
    pub fn tick(&self) -> TickAction {
        let mut doc = self.doc.lock();
        let mut shared = self.shared.lock();

        let view_open = self.profile.is_content_open(&doc);
        let control = doc.element_by_id(CONTROL_ID);
        let anchor = self.profile.anchor(&doc);
        let action = decide(view_open, control.is_some(), anchor.is_some());

        match action {
            TickAction::Teardown => {
                if let Some(control) = control {
                    doc.detach(control);
                }
                if let Some(panel) = doc.element_by_id(PANEL_ID) {
                    doc.detach(panel);
                }
                if shared.state != EngineUiState::default() {
                    tracing::info!("message view closed; surfaces removed and state reset");
                }
                shared.state = EngineUiState::default();
            }
            TickAction::Inject => {
                if let Some(anchor) = anchor {
                    let control = doc.create_element("button");
                    doc.set_attr(control, "id", CONTROL_ID);
                    doc.set_attr(control, "type", "button");
                    doc.set_attr(control, "class", "phishguard-btn");
                    doc.set_attr(control, "data-action", "activate");
                    doc.set_text(control, LABEL_IDLE);
                    doc.append_child(anchor, control);
                    shared.state.control_present = true;
                    tracing::info!(platform = %self.profile.platform(), "action control injected");
                }
            }
            TickAction::Retry => {
                tracing::debug!("no injection anchor resolvable; retrying next tick");
            }
            TickAction::Noop => {
                shared.state.control_present = true;
            }
        }
        action
    }

    /// Run one activation: extract, classify, render
    ///
    /// Returns whether the activation ran to a rendered outcome. A second
    /// call while `busy` is a no-op and issues no backend request. No timeout
    /// is enforced on the backend call; a stalled call keeps the control
    /// disabled until it completes.
    pub async fn activate(&self) -> bool {
        let record = {
            let mut doc = self.doc.lock();
            let mut shared = self.shared.lock();
            if shared.state.busy {
                tracing::debug!("activation ignored; analysis already in flight");
                return false;
            }
            if doc.element_by_id(CONTROL_ID).is_none() {
                tracing::debug!("activation without an attached control ignored");
                return false;
            }

            let record = assemble(self.profile, &doc);
            if !record.is_usable() {
                tracing::warn!("extraction yielded an empty record");
                let failure = AnalysisFailure::new(ExtractionError::EmptyRecord.to_string());
                render_result(&mut doc, self.profile, &Err(failure));
                shared.state.panel_present = true;
                return true;
            }

            shared.state.busy = true;
            if let Some(control) = doc.element_by_id(CONTROL_ID) {
                doc.set_text(control, LABEL_BUSY);
                doc.set_attr(control, "disabled", "");
                doc.add_class(control, "phishguard-loading");
            }
            record
        };

        tracing::info!(
            subject_len = record.subject.len(),
            body_len = record.body.len(),
            "dispatching analysis"
        );
        let outcome = self.relay.analyze(record).await;

        let mut doc = self.doc.lock();
        let mut shared = self.shared.lock();
        shared.state.busy = false;
        if let Some(control) = doc.element_by_id(CONTROL_ID) {
            doc.set_text(control, LABEL_RESCAN);
            doc.remove_attr(control, "disabled");
            doc.remove_class(control, "phishguard-loading");
        }
        if let Ok(ref response) = outcome {
            shared.last_response = Some(response.clone());
        }
        render_result(&mut doc, self.profile, &outcome);
        shared.state.panel_present = true;
        true
    }

    /// Remove the result panel, leaving control and busy state untouched
    pub fn dismiss(&self) -> bool {
        let mut doc = self.doc.lock();
        let mut shared = self.shared.lock();
        let removed = dismiss_panel(&mut doc);
        if removed {
            shared.state.panel_present = false;
        }
        removed
    }

    /// Persist the last successful classification for the report surface
    ///
    /// Returns `Ok(false)` when no analysis has completed yet.
    ///
    /// # Errors
    /// `RelayError` when the relay is gone or persistence fails.
    pub async fn open_report(&self) -> Result<bool, RelayError> {
        let Some(response) = self.last_response() else {
            tracing::debug!("no completed analysis to report");
            return Ok(false);
        };
        let payload = serde_json::to_value(&response)
            .map_err(phishguard_relay::StoreError::from)
            .map_err(RelayError::from)?;
        self.relay.open_report(payload).await?;
        Ok(true)
    }

    /// Dispatch a click on a rendered affordance by its `data-action` tag
    pub async fn handle_click(&self, action: &str) {
        match action {
            "activate" => {
                self.activate().await;
            }
            "dismiss-panel" => {
                self.dismiss();
            }
            "open-report" => {
                if let Err(e) = self.open_report().await {
                    tracing::warn!(error = %e, "open-report failed");
                }
            }
            other => tracing::debug!(action = other, "unrecognized control action"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use phishguard_platform::Platform;
    use phishguard_relay::{
        spawn_relay, Backend, BackendError, ClassifyRequest, MemoryStore,
    };

    #[derive(Debug)]
    struct CannedBackend;

    #[async_trait]
    impl Backend for CannedBackend {
        async fn classify(
            &self,
            _request: ClassifyRequest,
        ) -> Result<ClassificationResponse, BackendError> {
            Ok(ClassificationResponse {
                risk_score: 12.0,
                classification: "🟢 Looks Safe".to_string(),
                ..ClassificationResponse::default()
            })
        }
    }

    fn gmail_doc() -> Arc<Mutex<Document>> {
        let mut doc = Document::new();
        let header = doc.create_element("div");
        doc.add_class(header, "ha");
        let h2 = doc.create_element("h2");
        doc.add_class(h2, "hP");
        doc.set_text(h2, "Team lunch Friday");
        doc.append_child(doc.root(), header);
        doc.append_child(header, h2);
        Arc::new(Mutex::new(doc))
    }

    fn engine(doc: Arc<Mutex<Document>>) -> InjectionEngine {
        let relay = spawn_relay(Arc::new(CannedBackend), Arc::new(MemoryStore::new()));
        InjectionEngine::new(PlatformProfile::for_platform(Platform::Gmail), doc, relay)
    }

    #[tokio::test]
    async fn tick_injects_then_noops() {
        let doc = gmail_doc();
        let engine = engine(doc.clone());

        assert_eq!(engine.tick(), TickAction::Inject);
        assert_eq!(engine.tick(), TickAction::Noop);
        assert!(engine.state().control_present);

        let control = doc.lock().element_by_id(CONTROL_ID).unwrap();
        assert_eq!(doc.lock().element(control).text(), LABEL_IDLE);
    }

    #[tokio::test]
    async fn activation_relabels_control() {
        let doc = gmail_doc();
        let engine = engine(doc.clone());
        engine.tick();

        assert!(engine.activate().await);
        assert!(!engine.state().busy);
        assert!(engine.state().panel_present);

        let doc = doc.lock();
        let control = doc.element_by_id(CONTROL_ID).unwrap();
        assert_eq!(doc.element(control).text(), LABEL_RESCAN);
        assert_eq!(doc.element(control).attr("disabled"), None);
    }

    #[tokio::test]
    async fn activation_without_control_is_ignored() {
        let doc = gmail_doc();
        let engine = engine(doc);
        // No tick yet, so no control.
        assert!(!engine.activate().await);
        assert!(!engine.state().panel_present);
    }

    #[tokio::test]
    async fn for_host_rejects_unknown_hosts() {
        let doc = gmail_doc();
        let relay = spawn_relay(Arc::new(CannedBackend), Arc::new(MemoryStore::new()));
        assert!(InjectionEngine::for_host("intranet.local", doc.clone(), relay.clone()).is_none());
        assert!(InjectionEngine::for_host("mail.google.com", doc, relay).is_some());
    }

    #[tokio::test]
    async fn open_report_without_analysis_is_false() {
        let doc = gmail_doc();
        let engine = engine(doc);
        assert!(!engine.open_report().await.unwrap());
    }
}
