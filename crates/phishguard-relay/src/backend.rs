//! Classification backend collaborator
//!
//! The engine never talks HTTP itself; it hands a [`ClassifyRequest`] to a
//! [`Backend`] implementation. [`HttpBackend`] is the production one, POSTing
//! to the classification service. Tests substitute scripted backends.

use crate::response::ClassificationResponse;
use async_trait::async_trait;
use phishguard_platform::MessageRecord;
use serde::{Deserialize, Serialize};

/// Request body sent to the classification service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifyRequest {
    /// Message body text
    pub email_text: String,
    /// Sender display text
    pub sender: String,
    /// Subject line
    pub subject: String,
}

impl From<MessageRecord> for ClassifyRequest {
    fn from(record: MessageRecord) -> Self {
        Self {
            email_text: record.body,
            sender: record.sender,
            subject: record.subject,
        }
    }
}

/// Backend call failures
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Non-success HTTP status
    #[error("backend returned status {0}")]
    Status(u16),

    /// Transport-level failure (connect, timeout, malformed body)
    #[error("backend unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// Scripted failure from a test backend
    #[error("{0}")]
    Scripted(String),
}

/// Classification service seam
#[async_trait]
pub trait Backend: Send + Sync + std::fmt::Debug {
    /// Classify one extracted message
    ///
    /// # Errors
    /// `BackendError` on non-success status or transport failure.
    async fn classify(
        &self,
        request: ClassifyRequest,
    ) -> Result<ClassificationResponse, BackendError>;
}

/// HTTP classification backend
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Backend rooted at a base URL, e.g. `http://localhost:5001`
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Base URL this backend targets
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn classify(
        &self,
        request: ClassifyRequest,
    ) -> Result<ClassificationResponse, BackendError> {
        let url = format!("{}/predict", self.base_url.trim_end_matches('/'));
        tracing::debug!(%url, "dispatching classification request");

        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "classification request rejected");
            return Err(BackendError::Status(status.as_u16()));
        }
        Ok(response.json::<ClassificationResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_request_from_record() {
        let record = MessageRecord {
            subject: "Verify your account now".to_string(),
            sender: "security@paypa1.com".to_string(),
            body: "Click here immediately...".to_string(),
        };
        let request = ClassifyRequest::from(record);
        assert_eq!(request.email_text, "Click here immediately...");
        assert_eq!(request.subject, "Verify your account now");
        assert_eq!(request.sender, "security@paypa1.com");
    }

    #[test]
    fn classify_request_wire_field_names() {
        let request = ClassifyRequest {
            email_text: "body".to_string(),
            sender: "s".to_string(),
            subject: "x".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["email_text"], "body");
        assert_eq!(json["sender"], "s");
        assert_eq!(json["subject"], "x");
    }

    #[test]
    fn status_error_message_names_status() {
        let err = BackendError::Status(503);
        assert_eq!(err.to_string(), "backend returned status 503");
    }

    #[test]
    fn http_backend_normalizes_base_url() {
        let backend = HttpBackend::new("http://localhost:5001/");
        assert_eq!(backend.base_url(), "http://localhost:5001/");
    }
}
