//! Expanded report surface
//!
//! Runs as an independent page load, outside the tick-driven engine. Reads
//! the persisted payload exactly once and populates a fixed scaffold of
//! elements by id. With no payload it renders the empty state and touches
//! none of the gauge/breakdown elements.

use crate::severity::Severity;
use phishguard_dom::Document;
use phishguard_relay::{ClassificationResponse, ReportStore, StoreError, REPORT_KEY};
use serde_json::Value;

/// How a structural feature value is formatted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    /// Plain number
    Number,
    /// Yes / No
    Bool,
    /// Present / Absent (presence is good)
    BoolSafe,
    /// Detected / Clear (presence is bad)
    BoolAlert,
    /// Ratio 0-1 shown as a percentage
    Percent,
    /// Small-integer risk count
    RiskCount,
    /// 0-10 score
    Score10,
}

/// One feature row in the structural grid
#[derive(Debug, Clone, Copy)]
struct FeatureSpec {
    key: &'static str,
    label: &'static str,
    kind: FeatureKind,
}

const fn feat(key: &'static str, label: &'static str, kind: FeatureKind) -> FeatureSpec {
    FeatureSpec { key, label, kind }
}

/// The six fixed topical feature groups
const FEATURE_GROUPS: &[(&str, &[FeatureSpec])] = &[
    (
        "URL Analysis",
        &[
            feat("url_count", "URLs Found", FeatureKind::Number),
            feat("has_url", "Contains URL", FeatureKind::Bool),
            feat("avg_url_length", "Avg URL Length", FeatureKind::Number),
            feat("suspicious_tld_count", "Suspicious TLDs", FeatureKind::RiskCount),
            feat("domain_mismatch_count", "Domain Mismatches", FeatureKind::RiskCount),
        ],
    ),
    (
        "Text Structure",
        &[
            feat("email_length", "Email Length (chars)", FeatureKind::Number),
            feat("caps_ratio", "CAPS Ratio", FeatureKind::Percent),
            feat("special_char_density", "Special Char Density", FeatureKind::Percent),
            feat("exclamation_count", "Exclamation Marks", FeatureKind::Number),
        ],
    ),
    (
        "Urgency & Pressure",
        &[
            feat("urgency_count", "Urgency Keywords", FeatureKind::RiskCount),
            feat("deadline_pressure", "Deadline Pressure", FeatureKind::Score10),
        ],
    ),
    (
        "Impersonation & Spoofing",
        &[
            feat("impersonation_count", "Authority References", FeatureKind::RiskCount),
            feat("financial_count", "Financial Keywords", FeatureKind::RiskCount),
            feat("sender_domain_mismatch", "Sender Mismatch", FeatureKind::BoolAlert),
        ],
    ),
    (
        "Social Engineering",
        &[
            feat("unsolicited_good_news", "Unsolicited Good News", FeatureKind::RiskCount),
            feat("external_confirm_link", "External Confirm Link", FeatureKind::BoolAlert),
            feat("generic_personalization", "Generic Personalization", FeatureKind::BoolAlert),
            feat("sensitive_no_phone", "Sensitive w/o Phone", FeatureKind::BoolAlert),
        ],
    ),
    (
        "Safety Indicators",
        &[
            feat("has_greeting", "Personal Greeting", FeatureKind::BoolSafe),
            feat("has_unsubscribe", "Unsubscribe Link", FeatureKind::BoolSafe),
            feat("has_signature", "Email Signature", FeatureKind::BoolSafe),
            feat("has_company_footer", "Company Footer", FeatureKind::BoolSafe),
            feat("has_phone_verification", "Phone Verification", FeatureKind::BoolSafe),
            feat("newsletter_score", "Newsletter Score", FeatureKind::Number),
        ],
    ),
];

/// Build the empty report page scaffold with its fixed element ids
#[must_use]
pub fn report_scaffold() -> Document {
    let mut doc = Document::new();

    let header = doc.create_element("header");
    let badge = doc.create_element("span");
    doc.set_attr(badge, "id", "header-badge");
    doc.append_child(doc.root(), header);
    doc.append_child(header, badge);

    let gauge = doc.create_element("div");
    let ring = doc.create_element("div");
    doc.set_attr(ring, "id", "gauge-ring");
    let value = doc.create_element("div");
    doc.set_attr(value, "id", "gauge-value");
    doc.append_child(doc.root(), gauge);
    doc.append_child(gauge, ring);
    doc.append_child(ring, value);

    let meta = doc.create_element("div");
    doc.append_child(doc.root(), meta);
    for id in ["ml-raw", "safe-adj", "adjusted-prob"] {
        let field = doc.create_element("span");
        doc.set_attr(field, "id", id);
        doc.append_child(meta, field);
    }

    let card = doc.create_element("div");
    doc.set_attr(card, "id", "verdict-card");
    doc.append_child(doc.root(), card);
    for id in ["verdict-icon", "verdict-text", "verdict-desc"] {
        let part = doc.create_element("div");
        doc.set_attr(part, "id", id);
        doc.append_child(card, part);
    }

    for id in ["warn-list", "safe-list"] {
        let list = doc.create_element("ul");
        doc.set_attr(list, "id", id);
        doc.append_child(doc.root(), list);
    }

    for id in ["breakdown-grid", "features-grid"] {
        let grid = doc.create_element("div");
        doc.set_attr(grid, "id", id);
        doc.append_child(doc.root(), grid);
    }

    let timestamp = doc.create_element("footer");
    doc.set_attr(timestamp, "id", "report-timestamp");
    doc.append_child(doc.root(), timestamp);

    doc
}

/// Read the persisted payload once and render it into the scaffold
///
/// Returns whether a payload was present. A corrupt payload is treated as
/// absent.
///
/// # Errors
/// `StoreError` when the store itself cannot be read.
pub async fn render_from_store(
    store: &dyn ReportStore,
    doc: &mut Document,
) -> Result<bool, StoreError> {
    let payload = store.get(REPORT_KEY).await?;
    let response = payload.and_then(|value| {
        serde_json::from_value::<ClassificationResponse>(value)
            .map_err(|e| tracing::warn!(error = %e, "discarding corrupt report payload"))
            .ok()
    });
    render_report(doc, response.as_ref());
    Ok(response.is_some())
}

/// Render a classification payload (or the empty state) into the scaffold
pub fn render_report(doc: &mut Document, payload: Option<&ClassificationResponse>) {
    let Some(response) = payload else {
        set_text_by_id(doc, "verdict-text", "No Data Available");
        set_text_by_id(
            doc,
            "verdict-desc",
            "Open an email in Gmail or Outlook and click \"Detect Phishing\" first.",
        );
        return;
    };

    let severity = Severity::from_label(&response.classification);
    let score = response.risk_score;

    // Header badge: label with the indicator glyphs stripped
    let badge_text: String = response
        .classification
        .chars()
        .filter(|c| !matches!(c, '🔴' | '🟡' | '🟢'))
        .collect();
    let badge_text = badge_text.trim();
    set_text_by_id(
        doc,
        "header-badge",
        if badge_text.is_empty() { "Unknown" } else { badge_text },
    );
    set_attr_by_id(
        doc,
        "header-badge",
        "class",
        format!("header-badge badge-{severity}"),
    );

    // Radial gauge
    let pct = score.clamp(0.0, 100.0);
    let color = severity.accent_color();
    set_attr_by_id(
        doc,
        "gauge-ring",
        "style",
        format!("background: conic-gradient({color} {pct}%, rgba(255,255,255,0.05) {pct}%)"),
    );
    set_text_by_id(doc, "gauge-value", format!("{score:.1}%"));
    set_attr_by_id(doc, "gauge-value", "style", format!("color: {color}"));

    // Meta fields
    set_text_by_id(
        doc,
        "ml-raw",
        response
            .ml_raw
            .map_or_else(|| "—".to_string(), |v| format!("{v:.1}%")),
    );
    set_text_by_id(
        doc,
        "safe-adj",
        response
            .safe_adjustment
            .map_or_else(|| "—".to_string(), |v| format!("-{v:.1}%")),
    );
    set_text_by_id(
        doc,
        "adjusted-prob",
        response
            .adjusted_probability
            .map_or_else(|| format!("{score:.1}%"), |v| format!("{:.1}%", v * 100.0)),
    );

    // Verdict card
    set_attr_by_id(doc, "verdict-card", "class", format!("verdict-card severity-{severity}"));
    set_text_by_id(doc, "verdict-icon", severity.verdict_icon());
    set_text_by_id(
        doc,
        "verdict-text",
        if response.classification.is_empty() {
            "Unknown"
        } else {
            &response.classification
        },
    );
    set_text_by_id(doc, "verdict-desc", severity.verdict_description());

    fill_signal_list(doc, "warn-list", &response.explanation);
    fill_signal_list(doc, "safe-list", &response.safe_signals);
    fill_breakdown_grid(doc, response);
    fill_features_grid(doc, response);

    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    set_text_by_id(doc, "report-timestamp", format!("Report generated: {now}"));
}

fn fill_signal_list(doc: &mut Document, id: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let Some(list) = doc.element_by_id(id) else {
        return;
    };
    for item in items {
        let li = doc.create_element("li");
        doc.set_text(li, item);
        doc.append_child(list, li);
    }
}

fn fill_breakdown_grid(doc: &mut Document, response: &ClassificationResponse) {
    let Some(grid) = doc.element_by_id("breakdown-grid") else {
        return;
    };
    if response.risk_breakdown.is_empty() {
        return;
    }

    let mut entries: Vec<(&String, f64, Option<&String>)> = response
        .risk_breakdown
        .iter()
        .map(|(name, entry)| (name, entry.score, entry.reason.as_ref()))
        .collect();
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    for (name, score, reason) in entries {
        let row = doc.create_element("div");
        doc.add_class(row, "breakdown-row");

        let label = doc.create_element("div");
        doc.add_class(label, "breakdown-name");
        doc.set_text(label, name);

        let wrap = doc.create_element("div");
        doc.add_class(wrap, "breakdown-bar-wrap");
        let fill = doc.create_element("div");
        let bar_tone = if name == "Safe Indicators" {
            "bar-safe"
        } else {
            breakdown_bar_class(score)
        };
        doc.set_attr(fill, "class", format!("breakdown-bar-fill {bar_tone}"));
        doc.set_attr(fill, "style", format!("width: {}%", score.clamp(0.0, 100.0)));

        let pct = doc.create_element("div");
        doc.add_class(pct, "breakdown-pct");
        doc.set_text(pct, format!("{score:.0}%"));

        doc.append_child(grid, row);
        doc.append_child(row, label);
        doc.append_child(row, wrap);
        doc.append_child(wrap, fill);
        doc.append_child(row, pct);

        if let Some(reason) = reason {
            let reason_el = doc.create_element("div");
            doc.add_class(reason_el, "breakdown-reason");
            doc.set_text(reason_el, reason);
            doc.append_child(row, reason_el);
        }
    }
}

fn fill_features_grid(doc: &mut Document, response: &ClassificationResponse) {
    let Some(grid) = doc.element_by_id("features-grid") else {
        return;
    };
    if response.features.is_empty() {
        return;
    }

    for (group_name, specs) in FEATURE_GROUPS {
        let group = doc.create_element("div");
        doc.add_class(group, "feature-group");
        let title = doc.create_element("div");
        doc.add_class(title, "feature-group-title");
        doc.set_text(title, *group_name);
        doc.append_child(grid, group);
        doc.append_child(group, title);

        for spec in *specs {
            let row = doc.create_element("div");
            doc.add_class(row, "feature-row");
            let name = doc.create_element("span");
            doc.add_class(name, "feature-name");
            doc.set_text(name, spec.label);

            let (text, tone) = format_feature(spec.kind, response.features.get(spec.key));
            let value = doc.create_element("span");
            doc.set_attr(value, "class", format!("feature-value {tone}"));
            doc.set_text(value, text);

            doc.append_child(group, row);
            doc.append_child(row, name);
            doc.append_child(row, value);
        }
    }
}

/// Bar tone for a breakdown score
fn breakdown_bar_class(score: f64) -> &'static str {
    if score == 0.0 {
        "bar-neutral"
    } else if score >= 50.0 {
        "bar-danger"
    } else if score >= 20.0 {
        "bar-warning"
    } else {
        "bar-safe"
    }
}

/// Format one feature value per its declared kind
///
/// Missing or null values render as a neutral placeholder rather than being
/// omitted.
fn format_feature(kind: FeatureKind, value: Option<&Value>) -> (String, &'static str) {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return ("—".to_string(), "val-neutral");
    };

    let truthy = value.as_bool().unwrap_or_else(|| number_of(value) != 0.0);
    match kind {
        FeatureKind::Bool => {
            if truthy {
                ("Yes".to_string(), "chip-yes")
            } else {
                ("No".to_string(), "chip-no")
            }
        }
        FeatureKind::BoolSafe => {
            if truthy {
                ("✓ Present".to_string(), "chip-yes")
            } else {
                ("Absent".to_string(), "chip-no")
            }
        }
        FeatureKind::BoolAlert => {
            if truthy {
                ("⚠ Detected".to_string(), "chip-alert")
            } else {
                ("Clear".to_string(), "chip-no")
            }
        }
        FeatureKind::Percent => {
            let v = number_of(value);
            let tone = if v > 0.5 {
                "val-danger"
            } else if v > 0.3 {
                "val-warn"
            } else {
                "val-neutral"
            };
            (format!("{:.1}%", v * 100.0), tone)
        }
        FeatureKind::RiskCount => {
            let v = number_of(value);
            let tone = if v >= 3.0 {
                "val-danger"
            } else if v >= 1.0 {
                "val-warn"
            } else {
                "val-ok"
            };
            (display_number(v), tone)
        }
        FeatureKind::Score10 => {
            let v = number_of(value);
            let tone = if v >= 7.0 {
                "val-danger"
            } else if v >= 4.0 {
                "val-warn"
            } else if v > 0.0 {
                "val-neutral"
            } else {
                "val-ok"
            };
            (format!("{}/10", display_number(v)), tone)
        }
        FeatureKind::Number => (display_number(number_of(value)), "val-neutral"),
    }
}

fn number_of(value: &Value) -> f64 {
    value
        .as_f64()
        .or_else(|| value.as_bool().map(|b| if b { 1.0 } else { 0.0 }))
        .unwrap_or(0.0)
}

fn display_number(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

fn set_text_by_id(doc: &mut Document, id: &str, text: impl Into<String>) {
    if let Some(node) = doc.element_by_id(id) {
        doc.set_text(node, text);
    } else {
        tracing::warn!(id, "report scaffold element missing");
    }
}

fn set_attr_by_id(doc: &mut Document, id: &str, name: &str, value: impl Into<String>) {
    if let Some(node) = doc.element_by_id(id) {
        doc.set_attr(node, name, value);
    }
}
