//! Platform profiles: probe chains over host markup
//!
//! Each capability is an ordered list of independent probes evaluated until
//! one yields a non-empty result. Chains are data, so a new heuristic for a
//! degraded host build is appended to a table without touching the others.
//!
//! The selectors here track observed host markup and are expected to decay
//! as the hosts ship new builds; that is why every field carries several of
//! them. A chain where every probe misses returns an empty value, never an
//! error.

use crate::platform::Platform;
use once_cell::sync::Lazy;
use phishguard_dom::{Document, NodeId, Selector};

/// How a probe turns its matched element into a value
#[derive(Debug, Clone)]
pub enum Capture {
    /// Concatenated text of the matched subtree
    Text,
    /// Subtree text plus an address pulled from the first present attribute,
    /// formatted `Name <address>`
    TextWithAddress(&'static [&'static str]),
    /// Attribute value, falling back to subtree text when absent or empty
    AttrOrText(&'static str),
    /// The matched node itself
    Node,
    /// The parent of the matched node
    Parent,
}

/// One selection strategy for a profile field
#[derive(Debug, Clone)]
pub struct Probe {
    selector: Selector,
    capture: Capture,
}

impl Probe {
    /// Build a probe from a literal selector
    #[must_use]
    pub fn new(selector: &str, capture: Capture) -> Self {
        Self {
            selector: Selector::parse_static(selector),
            capture,
        }
    }

    fn resolve_text(&self, doc: &Document) -> String {
        let Some(node) = doc.query(&self.selector) else {
            return String::new();
        };
        match &self.capture {
            Capture::Text => doc.text_content(node),
            Capture::TextWithAddress(attr_names) => {
                let name = doc.text_content(node).trim().to_string();
                let address = attr_names
                    .iter()
                    .find_map(|a| doc.element(node).attr(a))
                    .unwrap_or_default();
                match (name.is_empty(), address.is_empty()) {
                    (_, true) => name,
                    (true, false) => address.to_string(),
                    (false, false) => format!("{name} <{address}>"),
                }
            }
            Capture::AttrOrText(attr) => {
                let value = doc.element(node).attr(attr).unwrap_or_default();
                if value.is_empty() {
                    doc.text_content(node)
                } else {
                    value.to_string()
                }
            }
            Capture::Node | Capture::Parent => String::new(),
        }
    }

    fn resolve_node(&self, doc: &Document) -> Option<NodeId> {
        let node = doc.query(&self.selector)?;
        match &self.capture {
            Capture::Parent => doc.element(node).parent(),
            _ => Some(node),
        }
    }
}

/// Ordered fallback chain of probes for one profile field
#[derive(Debug, Clone, Default)]
pub struct ProbeChain {
    probes: Vec<Probe>,
}

impl ProbeChain {
    /// Build a chain from probes in priority order
    #[must_use]
    pub fn new(probes: Vec<Probe>) -> Self {
        Self { probes }
    }

    /// First non-empty text yielded by the chain, or empty
    #[must_use]
    pub fn text(&self, doc: &Document) -> String {
        for (idx, probe) in self.probes.iter().enumerate() {
            let value = probe.resolve_text(doc);
            if !value.trim().is_empty() {
                if idx > 0 {
                    tracing::debug!(probe = idx, "field resolved via fallback probe");
                }
                return value;
            }
        }
        String::new()
    }

    /// First node yielded by the chain, or `None`
    #[must_use]
    pub fn node(&self, doc: &Document) -> Option<NodeId> {
        self.probes.iter().find_map(|p| p.resolve_node(doc))
    }

    /// Whether any probe in the chain matches at all
    #[must_use]
    pub fn any_match(&self, doc: &Document) -> bool {
        self.probes.iter().any(|p| p.resolve_node(doc).is_some())
    }
}

/// Capability bundle for one host application
///
/// Immutable once selected at startup. Capabilities never raise: text fields
/// degrade to empty strings, node fields to `None`.
#[derive(Debug)]
pub struct PlatformProfile {
    platform: Platform,
    subject: ProbeChain,
    sender: ProbeChain,
    body: ProbeChain,
    anchor: ProbeChain,
    fallback_container: ProbeChain,
    open_markers: ProbeChain,
}

impl PlatformProfile {
    /// Profile for a page host string, if the host is supported
    #[must_use]
    pub fn detect(host: &str) -> Option<&'static Self> {
        Platform::from_host(host).map(Self::for_platform)
    }

    /// Profile for a known platform
    #[must_use]
    pub fn for_platform(platform: Platform) -> &'static Self {
        match platform {
            Platform::Gmail => &GMAIL,
            Platform::Outlook => &OUTLOOK,
        }
    }

    /// Platform identity
    #[inline]
    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Best-effort subject text
    #[must_use]
    pub fn subject(&self, doc: &Document) -> String {
        self.subject.text(doc)
    }

    /// Best-effort sender text
    #[must_use]
    pub fn sender(&self, doc: &Document) -> String {
        self.sender.text(doc)
    }

    /// Best-effort body text
    #[must_use]
    pub fn body(&self, doc: &Document) -> String {
        self.body.text(doc)
    }

    /// Injection anchor for the action control, when resolvable
    #[must_use]
    pub fn anchor(&self, doc: &Document) -> Option<NodeId> {
        self.anchor.node(doc)
    }

    /// Container to prepend the result panel into when the anchor is gone
    #[must_use]
    pub fn fallback_container(&self, doc: &Document) -> Option<NodeId> {
        self.fallback_container.node(doc)
    }

    /// Whether a message view is currently open
    #[must_use]
    pub fn is_content_open(&self, doc: &Document) -> bool {
        self.open_markers.any_match(doc)
    }
}

static GMAIL: Lazy<PlatformProfile> = Lazy::new(|| PlatformProfile {
    platform: Platform::Gmail,
    subject: ProbeChain::new(vec![
        Probe::new("h2.hP", Capture::Text),
        Probe::new("[data-thread-perm-id] h2", Capture::Text),
        Probe::new(".ha h2", Capture::Text),
    ]),
    sender: ProbeChain::new(vec![
        Probe::new(
            "span.gD[email]",
            Capture::TextWithAddress(&["email", "data-hovercard-id"]),
        ),
        Probe::new(
            "span.gD[data-hovercard-id]",
            Capture::TextWithAddress(&["email", "data-hovercard-id"]),
        ),
        Probe::new(
            "[data-hovercard-id]",
            Capture::TextWithAddress(&["email", "data-hovercard-id"]),
        ),
    ]),
    body: ProbeChain::new(vec![
        Probe::new("div.a3s.aiL", Capture::Text),
        Probe::new("div.a3s", Capture::Text),
        Probe::new("[data-message-id] .ii.gt div", Capture::Text),
    ]),
    anchor: ProbeChain::new(vec![
        Probe::new("h2.hP", Capture::Parent),
        Probe::new(".ha", Capture::Node),
        Probe::new("[data-thread-perm-id]", Capture::Node),
    ]),
    fallback_container: ProbeChain::new(vec![Probe::new("div.a3s", Capture::Parent)]),
    open_markers: ProbeChain::new(vec![Probe::new("h2.hP", Capture::Node)]),
});

static OUTLOOK: Lazy<PlatformProfile> = Lazy::new(|| PlatformProfile {
    platform: Platform::Outlook,
    subject: ProbeChain::new(vec![
        Probe::new(r#"[role="heading"][aria-level="2"]"#, Capture::Text),
        Probe::new(".allowTextSelection.GEMJb", Capture::Text),
        Probe::new(
            r#"[data-app-section="ConversationContainer"] span[title]"#,
            Capture::Text,
        ),
    ]),
    sender: ProbeChain::new(vec![
        Probe::new(
            r#"[data-app-section="ConversationContainer"] .OZZZK"#,
            Capture::AttrOrText("aria-label"),
        ),
        Probe::new(".lDdSm", Capture::AttrOrText("aria-label")),
        Probe::new(
            r#"[role="main"] button[aria-label*="@"]"#,
            Capture::AttrOrText("aria-label"),
        ),
    ]),
    body: ProbeChain::new(vec![
        Probe::new(r#"[role="document"]"#, Capture::Text),
        Probe::new(".wide-content-host", Capture::Text),
        Probe::new(r#"[aria-label="Message body"]"#, Capture::Text),
    ]),
    anchor: ProbeChain::new(vec![
        Probe::new(r#"[role="heading"][aria-level="2"]"#, Capture::Parent),
        Probe::new(".allowTextSelection", Capture::Parent),
    ]),
    fallback_container: ProbeChain::new(vec![Probe::new(
        r#"[role="document"]"#,
        Capture::Parent,
    )]),
    open_markers: ProbeChain::new(vec![
        Probe::new(r#"[role="heading"][aria-level="2"]"#, Capture::Node),
        Probe::new(".allowTextSelection", Capture::Node),
    ]),
});
