//! Supported host applications

use serde::{Deserialize, Serialize};

/// Identity of a supported host webmail application
///
/// New hosts are added by adding a variant and its probe tables in
/// [`crate::profile`], never by subclassing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Gmail (mail.google.com)
    Gmail,
    /// Outlook Web (outlook.live.com / outlook.office*.com)
    Outlook,
}

impl Platform {
    /// Match a page host string against the known hosts
    ///
    /// Selection is total: exactly one platform or none. `None` means the
    /// engine stays inert on this page.
    #[must_use]
    pub fn from_host(host: &str) -> Option<Self> {
        if host.contains("mail.google.com") {
            return Some(Self::Gmail);
        }
        if host.contains("outlook.live.com")
            || host.contains("outlook.office.com")
            || host.contains("outlook.office365.com")
        {
            return Some(Self::Outlook);
        }
        None
    }

    /// Short name for logging
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gmail => "gmail",
            Self::Outlook => "outlook",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gmail_host_detected() {
        assert_eq!(Platform::from_host("mail.google.com"), Some(Platform::Gmail));
    }

    #[test]
    fn outlook_hosts_detected() {
        assert_eq!(Platform::from_host("outlook.live.com"), Some(Platform::Outlook));
        assert_eq!(Platform::from_host("outlook.office.com"), Some(Platform::Outlook));
        assert_eq!(
            Platform::from_host("outlook.office365.com"),
            Some(Platform::Outlook)
        );
    }

    #[test]
    fn unknown_host_yields_none() {
        assert_eq!(Platform::from_host("example.com"), None);
        assert_eq!(Platform::from_host("mail.yahoo.com"), None);
    }
}
