//! Arena document tree with structural mutation notification
//!
//! Nodes live in a grow-only arena owned by [`Document`]; [`NodeId`] handles
//! index into it. Detached subtrees stay in the arena but are unreachable
//! from the root, which is all the query layer ever traverses. The arena is
//! sized for a page-view lifetime, so unreachable nodes are not reclaimed.
//!
//! Structural mutations (attach/detach) notify subscribers with unit signals,
//! mirroring a childList+subtree observer: attribute and text edits bump the
//! revision but do not signal.

use crate::selector::Selector;
use indexmap::IndexMap;
use tokio::sync::mpsc;

/// Handle to an element in a [`Document`] arena
///
/// Only valid for the document that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// A single element node
#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    attrs: IndexMap<String, String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: IndexMap::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Tag name
    #[inline]
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Attribute value by name
    #[inline]
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Own text (excluding descendants)
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parent node, if attached
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes in order
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether the `class` attribute contains the given class
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_whitespace().any(|part| part == class))
            .unwrap_or(false)
    }
}

/// Mutable element tree
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Element>,
    root: NodeId,
    revision: u64,
    watchers: Vec<mpsc::UnboundedSender<()>>,
}

impl Document {
    /// Create a document with an empty `body` root
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Element::new("body")],
            root: NodeId(0),
            revision: 0,
            watchers: Vec::new(),
        }
    }

    /// Root node
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Current revision; bumped on every mutation
    #[inline]
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Element data for a node id
    #[inline]
    #[must_use]
    pub fn element(&self, id: NodeId) -> &Element {
        &self.nodes[id.0]
    }

    /// Subscribe to structural mutation signals
    ///
    /// Each attach/detach sends one unit signal. Signals carry no payload;
    /// subscribers re-read the tree, they do not replay mutations.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<()> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.watchers.push(tx);
        rx
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Element::new(tag));
        id
    }

    /// Set own text
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.nodes[id.0].text = text.into();
        self.revision += 1;
    }

    /// Set an attribute
    pub fn set_attr(&mut self, id: NodeId, name: impl Into<String>, value: impl Into<String>) {
        self.nodes[id.0].attrs.insert(name.into(), value.into());
        self.revision += 1;
    }

    /// Remove an attribute
    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        self.nodes[id.0].attrs.shift_remove(name);
        self.revision += 1;
    }

    /// Append a class to the element's class list
    pub fn add_class(&mut self, id: NodeId, class: &str) {
        let current = self.nodes[id.0].attrs.get("class").cloned();
        let next = match current {
            Some(existing) if !existing.is_empty() => format!("{existing} {class}"),
            _ => class.to_string(),
        };
        self.set_attr(id, "class", next);
    }

    /// Remove a class from the element's class list
    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if let Some(existing) = self.nodes[id.0].attrs.get("class").cloned() {
            let next: Vec<&str> = existing
                .split_whitespace()
                .filter(|part| *part != class)
                .collect();
            self.set_attr(id, "class", next.join(" "));
        }
    }

    /// Append a child as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.can_attach(parent, child) {
            return;
        }
        self.unlink(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        self.structural_mutation();
    }

    /// Insert a child as the first child of `parent`
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.can_attach(parent, child) {
            return;
        }
        self.unlink(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(0, child);
        self.structural_mutation();
    }

    /// Insert `node` as the next sibling of `reference`
    ///
    /// Returns `false` when `reference` has no parent to insert under.
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) -> bool {
        let Some(parent) = self.nodes[reference.0].parent else {
            return false;
        };
        if !self.can_attach(parent, node) {
            return false;
        }
        self.unlink(node);
        self.nodes[node.0].parent = Some(parent);
        let siblings = &mut self.nodes[parent.0].children;
        let pos = siblings
            .iter()
            .position(|&c| c == reference)
            .map_or(siblings.len(), |p| p + 1);
        siblings.insert(pos, node);
        self.structural_mutation();
        true
    }

    /// Detach a subtree from its parent
    pub fn detach(&mut self, id: NodeId) {
        if id == self.root {
            tracing::warn!("refusing to detach document root");
            return;
        }
        if self.nodes[id.0].parent.is_none() {
            return;
        }
        self.unlink(id);
        self.structural_mutation();
    }

    /// Whether a node is reachable from the root
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.nodes[current.0].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// First attached element with the given `id` attribute
    #[must_use]
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&n| self.nodes[n.0].attr("id") == Some(id))
    }

    /// First attached element matching the selector, in document order
    #[must_use]
    pub fn query(&self, selector: &Selector) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&n| self.matches(n, selector))
    }

    /// All attached elements matching the selector, in document order
    #[must_use]
    pub fn query_all(&self, selector: &Selector) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&n| self.matches(n, selector))
            .collect()
    }

    /// Test a node against a selector, including descendant combinators
    #[must_use]
    pub fn matches(&self, id: NodeId, selector: &Selector) -> bool {
        let Some((last, ancestors_spec)) = selector.parts.split_last() else {
            return false;
        };
        if !last.matches(&self.nodes[id.0]) {
            return false;
        }
        // Earlier compounds must match ancestors, right-to-left.
        let mut current = self.nodes[id.0].parent;
        for part in ancestors_spec.iter().rev() {
            loop {
                let Some(ancestor) = current else {
                    return false;
                };
                current = self.nodes[ancestor.0].parent;
                if part.matches(&self.nodes[ancestor.0]) {
                    break;
                }
            }
        }
        true
    }

    /// Concatenated text of a node and its descendants
    ///
    /// Non-empty text chunks are joined with newlines, approximating the
    /// rendered-text extraction the probes rely on.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut chunks = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            let element = &self.nodes[n.0];
            let text = element.text.trim();
            if !text.is_empty() {
                chunks.push(text.to_string());
            }
            for &child in element.children.iter().rev() {
                stack.push(child);
            }
        }
        chunks.join("\n")
    }

    /// Attached descendants of a node (inclusive), preorder
    fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            for &child in self.nodes[n.0].children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    fn can_attach(&self, parent: NodeId, child: NodeId) -> bool {
        if parent == child {
            tracing::warn!(%child, "refusing to attach node to itself");
            return false;
        }
        // Attaching an ancestor under its own descendant would cycle.
        let mut current = Some(parent);
        while let Some(n) = current {
            if n == child {
                tracing::warn!(%child, "refusing to create attachment cycle");
                return false;
            }
            current = self.nodes[n.0].parent;
        }
        true
    }

    fn unlink(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    fn structural_mutation(&mut self) {
        self.revision += 1;
        self.watchers.retain(|tx| tx.send(()).is_ok());
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(s: &str) -> Selector {
        Selector::parse(s).unwrap()
    }

    #[test]
    fn append_and_query_by_class() {
        let mut doc = Document::new();
        let h2 = doc.create_element("h2");
        doc.add_class(h2, "hP");
        doc.set_text(h2, "Subject line");
        doc.append_child(doc.root(), h2);

        assert_eq!(doc.query(&sel("h2.hP")), Some(h2));
        assert_eq!(doc.query(&sel("h2.other")), None);
    }

    #[test]
    fn query_respects_document_order() {
        let mut doc = Document::new();
        let first = doc.create_element("div");
        doc.add_class(first, "row");
        let second = doc.create_element("div");
        doc.add_class(second, "row");
        doc.append_child(doc.root(), first);
        doc.append_child(doc.root(), second);

        assert_eq!(doc.query(&sel("div.row")), Some(first));
        assert_eq!(doc.query_all(&sel("div.row")), vec![first, second]);
    }

    #[test]
    fn descendant_combinator() {
        let mut doc = Document::new();
        let wrapper = doc.create_element("div");
        doc.set_attr(wrapper, "data-thread-perm-id", "t1");
        let h2 = doc.create_element("h2");
        doc.append_child(doc.root(), wrapper);
        doc.append_child(wrapper, h2);

        assert_eq!(doc.query(&sel("[data-thread-perm-id] h2")), Some(h2));

        // Same h2 outside the wrapper does not match.
        let stray = doc.create_element("h2");
        doc.append_child(doc.root(), stray);
        assert!(!doc.matches(stray, &sel("[data-thread-perm-id] h2")));
    }

    #[test]
    fn detach_removes_from_queries() {
        let mut doc = Document::new();
        let h2 = doc.create_element("h2");
        doc.add_class(h2, "hP");
        doc.append_child(doc.root(), h2);
        assert!(doc.query(&sel("h2.hP")).is_some());

        doc.detach(h2);
        assert!(doc.query(&sel("h2.hP")).is_none());
        assert!(!doc.is_attached(h2));
    }

    #[test]
    fn insert_after_orders_siblings() {
        let mut doc = Document::new();
        let a = doc.create_element("div");
        let c = doc.create_element("div");
        doc.append_child(doc.root(), a);
        doc.append_child(doc.root(), c);

        let b = doc.create_element("div");
        assert!(doc.insert_after(a, b));
        assert_eq!(doc.element(doc.root()).children(), &[a, b, c]);
    }

    #[test]
    fn insert_after_detached_reference_fails() {
        let mut doc = Document::new();
        let orphan = doc.create_element("div");
        let node = doc.create_element("div");
        assert!(!doc.insert_after(orphan, node));
    }

    #[test]
    fn structural_mutations_signal_subscribers() {
        let mut doc = Document::new();
        let mut rx = doc.subscribe();

        let div = doc.create_element("div");
        doc.append_child(doc.root(), div);
        assert!(rx.try_recv().is_ok());

        // Attribute edits bump revision but do not signal.
        let before = doc.revision();
        doc.set_attr(div, "id", "x");
        assert!(doc.revision() > before);
        assert!(rx.try_recv().is_err());

        doc.detach(div);
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn text_content_joins_descendants() {
        let mut doc = Document::new();
        let body = doc.create_element("div");
        let p1 = doc.create_element("p");
        let p2 = doc.create_element("p");
        doc.set_text(p1, "Dear customer,");
        doc.set_text(p2, "Click here immediately.");
        doc.append_child(doc.root(), body);
        doc.append_child(body, p1);
        doc.append_child(body, p2);

        assert_eq!(doc.text_content(body), "Dear customer,\nClick here immediately.");
    }

    #[test]
    fn attach_cycle_is_refused() {
        let mut doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        doc.append_child(doc.root(), outer);
        doc.append_child(outer, inner);

        doc.append_child(inner, outer);
        assert_eq!(doc.element(inner).children(), &[] as &[NodeId]);
        assert!(doc.is_attached(outer));
    }

    #[test]
    fn class_list_round_trip() {
        let mut doc = Document::new();
        let el = doc.create_element("button");
        doc.add_class(el, "phishguard-btn");
        doc.add_class(el, "phishguard-loading");
        assert!(doc.element(el).has_class("phishguard-loading"));

        doc.remove_class(el, "phishguard-loading");
        assert!(!doc.element(el).has_class("phishguard-loading"));
        assert!(doc.element(el).has_class("phishguard-btn"));
    }
}
