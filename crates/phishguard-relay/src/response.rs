//! Classification response wire model
//!
//! Opaque payload from the classification service. Rendered, never mutated;
//! every collection field tolerates absence so partial backends still render.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One risk-breakdown category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    /// Category score; may exceed 100, renderers clamp bar widths only
    pub score: f64,
    /// Optional human-readable reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl BreakdownEntry {
    /// Entry with a score only
    #[inline]
    #[must_use]
    pub fn new(score: f64) -> Self {
        Self { score, reason: None }
    }

    /// Attach a reason
    #[inline]
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Verdict payload returned by the classification service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResponse {
    /// Final risk score, nominally 0-100
    #[serde(default)]
    pub risk_score: f64,
    /// Verdict label, e.g. `🔴 Phishing Detected`
    #[serde(default)]
    pub classification: String,
    /// Ordered warning signals
    #[serde(default)]
    pub explanation: Vec<String>,
    /// Ordered safe signals
    #[serde(default)]
    pub safe_signals: Vec<String>,
    /// Category name to score/reason, in service order
    #[serde(default)]
    pub risk_breakdown: IndexMap<String, BreakdownEntry>,
    /// Raw model probability, percent
    #[serde(default)]
    pub ml_raw: Option<f64>,
    /// Downward adjustment applied for safe signals, percent
    #[serde(default)]
    pub safe_adjustment: Option<f64>,
    /// Adjusted probability, 0-1
    #[serde(default)]
    pub adjusted_probability: Option<f64>,
    /// Structural feature values keyed by feature name
    #[serde(default)]
    pub features: IndexMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_minimal_payload() {
        let response: ClassificationResponse = serde_json::from_str(
            r#"{ "risk_score": 87.4, "classification": "🔴 Phishing" }"#,
        )
        .unwrap();
        assert_eq!(response.risk_score, 87.4);
        assert_eq!(response.classification, "🔴 Phishing");
        assert!(response.explanation.is_empty());
        assert!(response.risk_breakdown.is_empty());
        assert!(response.ml_raw.is_none());
    }

    #[test]
    fn deserialize_full_payload_preserves_order() {
        let response: ClassificationResponse = serde_json::from_str(
            r#"{
                "risk_score": 62.0,
                "classification": "🟡 Suspicious",
                "explanation": ["Urgent language", "Suspicious TLD"],
                "safe_signals": ["Has unsubscribe link"],
                "risk_breakdown": {
                    "URL Risk": { "score": 140.0, "reason": "2 suspicious TLDs" },
                    "Urgency": { "score": 30.0 }
                },
                "ml_raw": 71.5,
                "safe_adjustment": 9.5,
                "adjusted_probability": 0.62,
                "features": { "url_count": 3, "has_greeting": true }
            }"#,
        )
        .unwrap();

        let keys: Vec<&str> = response.risk_breakdown.keys().map(String::as_str).collect();
        assert_eq!(keys, ["URL Risk", "Urgency"]);
        assert_eq!(response.risk_breakdown["URL Risk"].score, 140.0);
        assert_eq!(
            response.risk_breakdown["URL Risk"].reason.as_deref(),
            Some("2 suspicious TLDs")
        );
        assert_eq!(response.risk_breakdown["Urgency"].reason, None);
        assert_eq!(response.adjusted_probability, Some(0.62));
    }

    #[test]
    fn round_trips_through_json() {
        let mut breakdown = IndexMap::new();
        breakdown.insert(
            "Impersonation".to_string(),
            BreakdownEntry::new(45.0).with_reason("authority references"),
        );
        let response = ClassificationResponse {
            risk_score: 45.0,
            classification: "🟡 Suspicious — verify sender".to_string(),
            risk_breakdown: breakdown,
            ..ClassificationResponse::default()
        };

        let json = serde_json::to_value(&response).unwrap();
        let back: ClassificationResponse = serde_json::from_value(json).unwrap();
        assert_eq!(back, response);
    }
}
