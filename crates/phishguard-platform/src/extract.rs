//! Message extraction pipeline
//!
//! Assembles a [`MessageRecord`] from a profile's capability chains. Records
//! are created fresh on every activation and owned by the caller; nothing is
//! cached here.

use crate::profile::PlatformProfile;
use phishguard_dom::Document;
use serde::{Deserialize, Serialize};

/// Plain-text snapshot of the currently open message
///
/// Every field is independently optional; the record as a whole is usable
/// iff subject or body carries text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Subject line
    pub subject: String,
    /// Sender display text, `Name <address>` when both are known
    pub sender: String,
    /// Message body text
    pub body: String,
}

impl MessageRecord {
    /// Whether the record carries enough text to classify
    ///
    /// An all-empty record is a reportable extraction failure, not a value
    /// to silently skip.
    #[inline]
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !self.subject.is_empty() || !self.body.is_empty()
    }
}

/// Extraction failures surfaced to the user
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExtractionError {
    /// Neither subject nor body text could be extracted
    #[error("could not extract email content; try scrolling through the email first")]
    EmptyRecord,
}

/// Assemble a message record from the profile's capabilities
///
/// Pure over the current document state: calls the subject/sender/body
/// chains, trims and normalizes each to plain text. Field failures degrade
/// independently; validation of the whole record is [`MessageRecord::is_usable`].
#[must_use]
pub fn assemble(profile: &PlatformProfile, doc: &Document) -> MessageRecord {
    MessageRecord {
        subject: normalize_line(&profile.subject(doc)),
        sender: normalize_line(&profile.sender(doc)),
        body: normalize_block(&profile.body(doc)),
    }
}

/// Collapse all whitespace runs to single spaces and trim
fn normalize_line(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trim each line, collapse runs of blank lines, trim the block
fn normalize_block(raw: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut previous_blank = false;
    for line in raw.lines().map(str::trim) {
        if line.is_empty() {
            if !previous_blank && !lines.is_empty() {
                lines.push("");
            }
            previous_blank = true;
        } else {
            lines.push(line);
            previous_blank = false;
        }
    }
    while lines.last() == Some(&"") {
        lines.pop();
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;
    use phishguard_dom::Document;

    #[test]
    fn usable_with_subject_only() {
        let record = MessageRecord {
            subject: "Invoice Due".to_string(),
            sender: String::new(),
            body: String::new(),
        };
        assert!(record.is_usable());
    }

    #[test]
    fn unusable_when_subject_and_body_empty() {
        let record = MessageRecord {
            subject: String::new(),
            sender: "someone@example.com".to_string(),
            body: String::new(),
        };
        assert!(!record.is_usable());
    }

    #[test]
    fn assemble_from_empty_document_is_unusable() {
        let doc = Document::new();
        let profile = PlatformProfile::for_platform(Platform::Gmail);
        let record = assemble(profile, &doc);
        assert_eq!(record, MessageRecord::default());
        assert!(!record.is_usable());
    }

    #[test]
    fn assemble_normalizes_fields() {
        let mut doc = Document::new();
        let h2 = doc.create_element("h2");
        doc.add_class(h2, "hP");
        doc.set_text(h2, "  Verify   your\taccount  ");
        doc.append_child(doc.root(), h2);

        let body = doc.create_element("div");
        doc.add_class(body, "a3s");
        let p1 = doc.create_element("p");
        doc.set_text(p1, "  Dear customer,  ");
        let p2 = doc.create_element("p");
        doc.set_text(p2, "Click here immediately...");
        doc.append_child(doc.root(), body);
        doc.append_child(body, p1);
        doc.append_child(body, p2);

        let profile = PlatformProfile::for_platform(Platform::Gmail);
        let record = assemble(profile, &doc);
        assert_eq!(record.subject, "Verify your account");
        assert_eq!(record.body, "Dear customer,\nClick here immediately...");
        assert!(record.is_usable());
    }

    #[test]
    fn normalize_block_collapses_blank_runs() {
        assert_eq!(
            normalize_block("a\n\n\n\nb\n\n"),
            "a\n\nb"
        );
    }
}
