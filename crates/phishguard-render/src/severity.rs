//! Three-tier severity derived from verdict labels

/// Severity tier of a classification verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Strong phishing indicators
    Danger,
    /// Suspicious characteristics
    Warning,
    /// No significant indicators
    Safe,
}

impl Severity {
    /// Derive the tier from a verdict label
    ///
    /// Indicator glyphs and the substrings "phishing"/"suspicious" both
    /// qualify; substring matching is case-insensitive.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let lower = label.to_lowercase();
        if label.contains('🔴') || lower.contains("phishing") {
            Self::Danger
        } else if label.contains('🟡') || lower.contains("suspicious") {
            Self::Warning
        } else {
            Self::Safe
        }
    }

    /// Tier name used in class names
    #[inline]
    #[must_use]
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Danger => "danger",
            Self::Warning => "warning",
            Self::Safe => "safe",
        }
    }

    /// Gauge/accent color token for this tier
    #[inline]
    #[must_use]
    pub fn accent_color(&self) -> &'static str {
        match self {
            Self::Danger => "var(--accent-danger)",
            Self::Warning => "var(--accent-warn)",
            Self::Safe => "var(--accent-safe)",
        }
    }

    /// Verdict card icon
    #[inline]
    #[must_use]
    pub fn verdict_icon(&self) -> &'static str {
        match self {
            Self::Danger => "🚨",
            Self::Warning => "⚠️",
            Self::Safe => "🛡️",
        }
    }

    /// Fixed descriptive text for the verdict card
    #[must_use]
    pub fn verdict_description(&self) -> &'static str {
        match self {
            Self::Danger => {
                "This email exhibits strong phishing indicators. Do not click any links \
                 or provide personal information."
            }
            Self::Warning => {
                "This email shows some suspicious characteristics. Proceed with caution \
                 and verify the sender independently."
            }
            Self::Safe => {
                "This email appears legitimate based on structural analysis and ML \
                 classification. No significant phishing indicators were detected."
            }
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.css_class())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_maps_to_danger() {
        assert_eq!(Severity::from_label("🔴 Phishing Detected"), Severity::Danger);
    }

    #[test]
    fn substring_maps_to_danger_case_insensitive() {
        assert_eq!(Severity::from_label("Likely PHISHING"), Severity::Danger);
    }

    #[test]
    fn warning_label() {
        assert_eq!(
            Severity::from_label("🟡 Suspicious — verify sender"),
            Severity::Warning
        );
        assert_eq!(Severity::from_label("somewhat suspicious"), Severity::Warning);
    }

    #[test]
    fn safe_label() {
        assert_eq!(Severity::from_label("Looks Legitimate"), Severity::Safe);
        assert_eq!(Severity::from_label(""), Severity::Safe);
    }

    #[test]
    fn phishing_wins_over_suspicious() {
        // Both substrings present: danger takes precedence.
        assert_eq!(
            Severity::from_label("suspicious, possibly phishing"),
            Severity::Danger
        );
    }
}
