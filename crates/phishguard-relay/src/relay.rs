//! Inter-context relay
//!
//! The injected engine and the backend caller live in different contexts and
//! communicate via asynchronous request/response messages. Two action tags
//! are recognized: `analyzeEmail` and `openReport`. Exactly one reply is sent
//! per request; the reply channel is held open until it is produced.

use crate::backend::{Backend, BackendError, ClassifyRequest};
use crate::response::ClassificationResponse;
use crate::store::{ReportStore, REPORT_KEY};
use phishguard_platform::MessageRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Terminal failure of one analysis activation, as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct AnalysisFailure {
    /// User-facing failure message
    pub message: String,
}

impl AnalysisFailure {
    /// Failure with the given message
    #[inline]
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<BackendError> for AnalysisFailure {
    fn from(error: BackendError) -> Self {
        Self::new(error.to_string())
    }
}

/// Outcome of one `analyzeEmail` request
pub type AnalysisOutcome = Result<ClassificationResponse, AnalysisFailure>;

/// Relay plumbing failures (not user-facing analysis failures)
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Relay task is gone; no reply will arrive
    #[error("relay channel closed")]
    ChannelClosed,

    /// Persisting the report payload failed
    #[error("report persistence failed: {0}")]
    Store(#[from] crate::store::StoreError),
}

/// Requests accepted by the relay task
#[derive(Debug)]
enum RelayRequest {
    /// `analyzeEmail`: classify an extracted record
    AnalyzeEmail {
        record: MessageRecord,
        reply: oneshot::Sender<AnalysisOutcome>,
    },
    /// `openReport`: persist the payload for the report surface
    OpenReport {
        payload: serde_json::Value,
        reply: oneshot::Sender<Result<(), RelayError>>,
    },
}

/// Caller-side handle to the relay task
#[derive(Debug, Clone)]
pub struct RelayHandle {
    tx: mpsc::Sender<RelayRequest>,
}

impl RelayHandle {
    /// Submit an extracted record for classification
    ///
    /// Resolves with exactly one outcome, success or failure. A dead relay
    /// surfaces as a failure outcome so callers have a single error path.
    pub async fn analyze(&self, record: MessageRecord) -> AnalysisOutcome {
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = RelayRequest::AnalyzeEmail {
            record,
            reply: reply_tx,
        };
        if self.tx.send(request).await.is_err() {
            return Err(AnalysisFailure::new("relay unavailable"));
        }
        reply_rx
            .await
            .unwrap_or_else(|_| Err(AnalysisFailure::new("relay dropped the request")))
    }

    /// Persist a classification payload for the report surface
    ///
    /// # Errors
    /// `RelayError` when the relay is gone or persistence fails.
    pub async fn open_report(&self, payload: serde_json::Value) -> Result<(), RelayError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = RelayRequest::OpenReport {
            payload,
            reply: reply_tx,
        };
        self.tx
            .send(request)
            .await
            .map_err(|_| RelayError::ChannelClosed)?;
        reply_rx.await.map_err(|_| RelayError::ChannelClosed)?
    }
}

/// Spawn the relay task and return its handle
///
/// The task runs until every handle is dropped. Requests are served in
/// arrival order; each receives exactly one reply.
pub fn spawn_relay(backend: Arc<dyn Backend>, store: Arc<dyn ReportStore>) -> RelayHandle {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(relay_task(backend, store, rx));
    RelayHandle { tx }
}

async fn relay_task(
    backend: Arc<dyn Backend>,
    store: Arc<dyn ReportStore>,
    mut rx: mpsc::Receiver<RelayRequest>,
) {
    while let Some(request) = rx.recv().await {
        match request {
            RelayRequest::AnalyzeEmail { record, reply } => {
                tracing::info!(
                    subject_len = record.subject.len(),
                    body_len = record.body.len(),
                    "relaying analyzeEmail"
                );
                let outcome = backend
                    .classify(ClassifyRequest::from(record))
                    .await
                    .map_err(AnalysisFailure::from);
                if let Err(ref failure) = outcome {
                    tracing::warn!(error = %failure, "analysis failed");
                }
                // Receiver may have given up; nothing to do then.
                let _ = reply.send(outcome);
            }
            RelayRequest::OpenReport { payload, reply } => {
                let result = store
                    .put(REPORT_KEY, payload)
                    .await
                    .map_err(RelayError::from);
                match &result {
                    Ok(()) => tracing::info!("report payload persisted; report surface may load"),
                    Err(e) => tracing::warn!(error = %e, "openReport failed"),
                }
                let _ = reply.send(result);
            }
        }
    }
    tracing::debug!("relay task shutting down");
}
