//! PhishGuard renderers
//!
//! Deterministic mappings from classification outcomes to rendered surfaces:
//! - [`panel`]: the inline verdict overlay next to the injection anchor
//! - [`report`]: the independently-loaded expanded report page
//! - [`Severity`]: the shared three-tier mapping from verdict labels
//!
//! Renderers emit structure, classes, and inline width/color values; visual
//! styling lives with the host stylesheet and is out of scope here.

pub mod panel;
pub mod report;
pub mod severity;

pub use panel::{dismiss_panel, render_result, PANEL_ID};
pub use report::{render_from_store, render_report, report_scaffold, FeatureKind};
pub use severity::Severity;
