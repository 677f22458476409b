//! Inline verdict panel
//!
//! Deterministic mapping from an analysis outcome to a panel adjacent to the
//! injection anchor. Panel identity is unique: any existing panel is removed
//! before a new one is inserted, so at most one exists at a time.

use crate::severity::Severity;
use phishguard_dom::{Document, NodeId};
use phishguard_platform::PlatformProfile;
use phishguard_relay::{AnalysisOutcome, ClassificationResponse};

/// Element id of the verdict panel
pub const PANEL_ID: &str = "phishguard-result-panel";

/// Hint shown alongside every failure message
const REACHABILITY_HINT: &str =
    "Could not reach the PhishGuard server. Check that the API is running.";

/// Render an analysis outcome into the document
///
/// Replaces any existing panel. The panel is inserted as the next sibling of
/// the injection anchor; when the anchor is gone by render time it is
/// prepended to the platform fallback container, and as a last resort to the
/// document root.
pub fn render_result(
    doc: &mut Document,
    profile: &PlatformProfile,
    outcome: &AnalysisOutcome,
) -> NodeId {
    if let Some(existing) = doc.element_by_id(PANEL_ID) {
        doc.detach(existing);
    }

    let panel = doc.create_element("div");
    doc.set_attr(panel, "id", PANEL_ID);

    match outcome {
        Ok(response) => render_success(doc, panel, response),
        Err(failure) => render_failure(doc, panel, &failure.message),
    }

    insert_panel(doc, profile, panel);
    panel
}

/// Remove the panel if present
///
/// The close affordance path: removes the panel only, leaving the control
/// and any in-flight activation untouched.
pub fn dismiss_panel(doc: &mut Document) -> bool {
    match doc.element_by_id(PANEL_ID) {
        Some(panel) => {
            doc.detach(panel);
            true
        }
        None => false,
    }
}

fn render_failure(doc: &mut Document, panel: NodeId, message: &str) {
    doc.set_attr(panel, "class", "phishguard-panel phishguard-error");

    let header = doc.create_element("div");
    doc.add_class(header, "phishguard-panel-header");
    let title = doc.create_element("span");
    doc.set_text(title, "⚠️ Analysis Failed");
    doc.append_child(panel, header);
    doc.append_child(header, title);
    append_close_button(doc, header);

    let body = doc.create_element("div");
    doc.add_class(body, "phishguard-panel-body");
    let message_p = doc.create_element("p");
    doc.set_text(message_p, message);
    let hint = doc.create_element("p");
    doc.add_class(hint, "phishguard-hint");
    doc.set_text(hint, REACHABILITY_HINT);
    doc.append_child(panel, body);
    doc.append_child(body, message_p);
    doc.append_child(body, hint);
}

fn render_success(doc: &mut Document, panel: NodeId, response: &ClassificationResponse) {
    let severity = Severity::from_label(&response.classification);
    doc.set_attr(
        panel,
        "class",
        format!("phishguard-panel phishguard-{severity}"),
    );

    // Header: verdict, score, close affordance
    let header = doc.create_element("div");
    doc.add_class(header, "phishguard-panel-header");
    let verdict = doc.create_element("span");
    doc.add_class(verdict, "phishguard-verdict");
    doc.set_text(verdict, &response.classification);
    let score = doc.create_element("span");
    doc.add_class(score, "phishguard-score");
    doc.set_text(score, format!("Risk: {:.1}%", response.risk_score));
    doc.append_child(panel, header);
    doc.append_child(header, verdict);
    doc.append_child(header, score);
    append_close_button(doc, header);

    let body = doc.create_element("div");
    doc.add_class(body, "phishguard-panel-body");
    doc.append_child(panel, body);

    if !response.explanation.is_empty() {
        append_signal_section(doc, body, "⚠️ Warning Signals", &response.explanation);
    }
    if !response.safe_signals.is_empty() {
        append_signal_section(doc, body, "✅ Safe Signals", &response.safe_signals);
    }

    if !response.risk_breakdown.is_empty() {
        let breakdown = doc.create_element("div");
        doc.add_class(breakdown, "phishguard-breakdown");
        doc.append_child(body, breakdown);

        for (category, entry) in &response.risk_breakdown {
            let row = doc.create_element("div");
            doc.add_class(row, "phishguard-breakdown-row");
            let label = doc.create_element("div");
            doc.add_class(label, "phishguard-breakdown-label");
            doc.set_text(label, category);

            let bar = doc.create_element("div");
            doc.add_class(bar, "phishguard-breakdown-bar");
            let fill = doc.create_element("div");
            doc.set_attr(
                fill,
                "class",
                format!("phishguard-breakdown-fill phishguard-{severity}"),
            );
            // Bar width clamps; the displayed percentage does not.
            doc.set_attr(
                fill,
                "style",
                format!("width: {}%", entry.score.clamp(0.0, 100.0)),
            );

            let pct = doc.create_element("span");
            doc.add_class(pct, "phishguard-breakdown-pct");
            doc.set_text(pct, format!("{}%", entry.score));

            doc.append_child(breakdown, row);
            doc.append_child(row, label);
            doc.append_child(row, bar);
            doc.append_child(bar, fill);
            doc.append_child(row, pct);
        }
    }

    // Footer: raw model score, report affordance, build tag
    let footer = doc.create_element("div");
    doc.add_class(footer, "phishguard-footer");
    let ml_raw = doc.create_element("span");
    let ml_text = response
        .ml_raw
        .map_or_else(|| "ML Raw: –".to_string(), |v| format!("ML Raw: {v:.1}%"));
    doc.set_text(ml_raw, ml_text);
    let report_link = doc.create_element("button");
    doc.add_class(report_link, "phishguard-report-link");
    doc.set_attr(report_link, "data-action", "open-report");
    doc.set_text(report_link, "Full report");
    let build = doc.create_element("span");
    doc.set_text(build, concat!("PhishGuard v", env!("CARGO_PKG_VERSION")));
    doc.append_child(body, footer);
    doc.append_child(footer, ml_raw);
    doc.append_child(footer, report_link);
    doc.append_child(footer, build);
}

fn append_close_button(doc: &mut Document, header: NodeId) {
    let close = doc.create_element("button");
    doc.add_class(close, "phishguard-close");
    doc.set_attr(close, "data-action", "dismiss-panel");
    doc.set_attr(close, "aria-label", "Close");
    doc.set_text(close, "×");
    doc.append_child(header, close);
}

fn append_signal_section(doc: &mut Document, body: NodeId, title: &str, items: &[String]) {
    let section = doc.create_element("div");
    doc.add_class(section, "phishguard-section");
    let heading = doc.create_element("strong");
    doc.set_text(heading, title);
    let list = doc.create_element("ul");
    doc.append_child(body, section);
    doc.append_child(section, heading);
    doc.append_child(section, list);
    for item in items {
        let li = doc.create_element("li");
        doc.set_text(li, item);
        doc.append_child(list, li);
    }
}

fn insert_panel(doc: &mut Document, profile: &PlatformProfile, panel: NodeId) {
    if let Some(anchor) = profile.anchor(doc) {
        if doc.insert_after(anchor, panel) {
            return;
        }
    }
    if let Some(container) = profile.fallback_container(doc) {
        doc.prepend_child(container, panel);
        return;
    }
    tracing::warn!("no anchor or fallback container; prepending panel to root");
    doc.prepend_child(doc.root(), panel);
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use phishguard_dom::Selector;
    use phishguard_platform::Platform;
    use phishguard_relay::{AnalysisFailure, BreakdownEntry};

    fn gmail_doc() -> Document {
        let mut doc = Document::new();
        let header = doc.create_element("div");
        doc.add_class(header, "ha");
        let h2 = doc.create_element("h2");
        doc.add_class(h2, "hP");
        doc.set_text(h2, "Subject");
        doc.append_child(doc.root(), header);
        doc.append_child(header, h2);
        doc
    }

    fn profile() -> &'static PlatformProfile {
        PlatformProfile::for_platform(Platform::Gmail)
    }

    fn danger_response() -> ClassificationResponse {
        let mut breakdown = IndexMap::new();
        breakdown.insert("URL Risk".to_string(), BreakdownEntry::new(140.0));
        ClassificationResponse {
            risk_score: 87.4,
            classification: "🔴 Phishing".to_string(),
            explanation: vec!["Urgent language".to_string()],
            ml_raw: Some(91.2),
            risk_breakdown: breakdown,
            ..ClassificationResponse::default()
        }
    }

    #[test]
    fn success_panel_header_and_tier() {
        let mut doc = gmail_doc();
        let panel = render_result(&mut doc, profile(), &Ok(danger_response()));

        assert!(doc.element(panel).has_class("phishguard-danger"));
        let score = doc
            .query(&Selector::parse(".phishguard-score").unwrap())
            .unwrap();
        assert_eq!(doc.element(score).text(), "Risk: 87.4%");
    }

    #[test]
    fn breakdown_bar_clamps_width_but_not_percentage() {
        let mut doc = gmail_doc();
        render_result(&mut doc, profile(), &Ok(danger_response()));

        let fill = doc
            .query(&Selector::parse(".phishguard-breakdown-fill").unwrap())
            .unwrap();
        assert_eq!(doc.element(fill).attr("style"), Some("width: 100%"));

        let pct = doc
            .query(&Selector::parse(".phishguard-breakdown-pct").unwrap())
            .unwrap();
        assert_eq!(doc.element(pct).text(), "140%");
    }

    #[test]
    fn panel_is_next_sibling_of_anchor() {
        let mut doc = gmail_doc();
        let anchor = profile().anchor(&doc).unwrap();
        let panel = render_result(&mut doc, profile(), &Ok(danger_response()));

        let parent = doc.element(anchor).parent().unwrap();
        let children = doc.element(parent).children();
        let anchor_pos = children.iter().position(|&c| c == anchor).unwrap();
        assert_eq!(children.get(anchor_pos + 1), Some(&panel));
    }

    #[test]
    fn replaces_existing_panel() {
        let mut doc = gmail_doc();
        render_result(&mut doc, profile(), &Ok(danger_response()));
        render_result(
            &mut doc,
            profile(),
            &Err(AnalysisFailure::new("backend returned status 500")),
        );

        let panels = doc.query_all(&Selector::parse("#phishguard-result-panel").unwrap());
        assert_eq!(panels.len(), 1);
        assert!(doc.element(panels[0]).has_class("phishguard-error"));
    }

    #[test]
    fn error_panel_carries_message_and_hint() {
        let mut doc = gmail_doc();
        render_result(
            &mut doc,
            profile(),
            &Err(AnalysisFailure::new("backend returned status 503")),
        );

        let panel = doc.element_by_id(PANEL_ID).unwrap();
        let text = doc.text_content(panel);
        assert!(text.contains("backend returned status 503"));
        assert!(text.contains("Check that the API is running"));
    }

    #[test]
    fn safe_signal_section_omitted_when_empty() {
        let mut doc = gmail_doc();
        render_result(&mut doc, profile(), &Ok(danger_response()));

        let panel = doc.element_by_id(PANEL_ID).unwrap();
        let text = doc.text_content(panel);
        assert!(text.contains("Warning Signals"));
        assert!(!text.contains("Safe Signals"));
    }

    #[test]
    fn falls_back_to_container_without_anchor() {
        // Body container exists, but no subject header -> no anchor.
        let mut doc = Document::new();
        let wrapper = doc.create_element("div");
        let body = doc.create_element("div");
        doc.add_class(body, "a3s");
        doc.append_child(doc.root(), wrapper);
        doc.append_child(wrapper, body);

        let panel = render_result(&mut doc, profile(), &Ok(danger_response()));
        assert_eq!(doc.element(wrapper).children().first(), Some(&panel));
    }

    #[test]
    fn dismiss_removes_panel_only() {
        let mut doc = gmail_doc();
        render_result(&mut doc, profile(), &Ok(danger_response()));

        assert!(dismiss_panel(&mut doc));
        assert!(doc.element_by_id(PANEL_ID).is_none());
        assert!(!dismiss_panel(&mut doc));
    }
}
