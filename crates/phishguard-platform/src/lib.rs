//! PhishGuard platform profiles and extraction pipeline
//!
//! Host webmail applications expose no stable contract: their markup is
//! build-specific and recycled aggressively. This crate encodes what the
//! engine knows about each supported host:
//! - [`Platform`] identity, selected once from the page host string
//! - [`PlatformProfile`] capabilities (subject, sender, body, injection
//!   anchor, open-view check), each an ordered chain of independent probes
//!   that degrades field-by-field instead of failing atomically
//! - [`MessageRecord`] assembly and usability validation

pub mod extract;
pub mod platform;
pub mod profile;

pub use extract::{assemble, ExtractionError, MessageRecord};
pub use platform::Platform;
pub use profile::{Capture, PlatformProfile, Probe, ProbeChain};
