//! Engine configuration

use std::path::PathBuf;
use std::time::Duration;

/// Tunable engine settings
///
/// Defaults match the deployed extension: a 1.5s safety-net tick and a
/// local classification service.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Safety-net tick period
    pub check_interval: Duration,
    /// Classification service base URL
    pub api_base_url: String,
    /// Backing file for the report hand-off store
    pub store_path: PathBuf,
}

impl EngineConfig {
    /// Configuration with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the safety-net tick period
    #[must_use]
    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    /// Override the classification service base URL
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Override the report store path
    #[must_use]
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_millis(1500),
            api_base_url: "http://localhost:5001".to_string(),
            store_path: PathBuf::from("phishguard_report.json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_override_defaults() {
        let config = EngineConfig::new()
            .with_check_interval(Duration::from_millis(250))
            .with_api_base_url("http://10.0.0.2:5001")
            .with_store_path("/tmp/report.json");

        assert_eq!(config.check_interval, Duration::from_millis(250));
        assert_eq!(config.api_base_url, "http://10.0.0.2:5001");
        assert_eq!(config.store_path, PathBuf::from("/tmp/report.json"));
    }
}
