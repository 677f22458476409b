//! PhishGuard DOM - element-tree substrate
//!
//! The injection engine augments a host document tree it does not own. This
//! crate supplies the tree the rest of the workspace operates against:
//! - Arena-backed element nodes with attributes, classes, and text
//! - Structural mutation operations (append, insert, detach)
//! - A CSS-subset selector language for the platform probes
//! - Mutation notification to subscribers (the observer analogue)
//!
//! # Example
//!
//! ```rust
//! use phishguard_dom::{Document, Selector};
//!
//! let mut doc = Document::new();
//! let h2 = doc.create_element("h2");
//! doc.add_class(h2, "hP");
//! doc.set_text(h2, "Quarterly invoice");
//! doc.append_child(doc.root(), h2);
//!
//! let sel = Selector::parse("h2.hP").unwrap();
//! assert_eq!(doc.query(&sel), Some(h2));
//! ```

pub mod document;
pub mod selector;

pub use document::{Document, Element, NodeId};
pub use selector::{Selector, SelectorError};
