//! PhishGuard relay - backend collaborator and report hand-off
//!
//! Connects the injected engine to its external collaborators:
//! - [`Backend`]: the classification service (HTTP POST of extracted text)
//! - [`RelayHandle`]: the asynchronous request/response channel between the
//!   engine and the backend caller (`analyzeEmail` / `openReport`), with
//!   exactly one reply per request
//! - [`ReportStore`]: the durable key-value hand-off read once by the report
//!   surface on its own load

pub mod backend;
pub mod relay;
pub mod response;
pub mod store;

pub use backend::{Backend, BackendError, ClassifyRequest, HttpBackend};
pub use relay::{spawn_relay, AnalysisFailure, AnalysisOutcome, RelayError, RelayHandle};
pub use response::{BreakdownEntry, ClassificationResponse};
pub use store::{JsonFileStore, MemoryStore, ReportStore, StoreError, REPORT_KEY};
