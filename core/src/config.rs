use crate::types::Timestamp;
use serde::{Deserialize, Serialize};

/// Default bucket count of the customer directory.
pub const DEFAULT_BUCKET_COUNT: usize = 100;

/// Lookback of the velocity check, in seconds.
pub const VELOCITY_WINDOW_SECS: Timestamp = 3_600;

/// Transactions inside the window at which velocity becomes a warning.
pub const VELOCITY_WARNING_THRESHOLD: usize = 15;

/// Transactions inside the window at which velocity becomes critical.
pub const VELOCITY_CRITICAL_THRESHOLD: usize = 25;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub velocity_window_secs: Timestamp,
    pub velocity_warning:     usize,
    pub velocity_critical:    usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            velocity_window_secs: VELOCITY_WINDOW_SECS,
            velocity_warning:     VELOCITY_WARNING_THRESHOLD,
            velocity_critical:    VELOCITY_CRITICAL_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LedgerConfig {
    pub bucket_count: usize,
    pub analyzer:     AnalyzerConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            bucket_count: DEFAULT_BUCKET_COUNT,
            analyzer:     AnalyzerConfig::default(),
        }
    }
}

impl LedgerConfig {
    /// Load from a JSON file. Missing fields fall back to defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: LedgerConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Config for unit tests: a small directory so chains actually form.
    pub fn default_test() -> Self {
        Self {
            bucket_count: 10,
            analyzer:     AnalyzerConfig::default(),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bucket_count == 0 {
            anyhow::bail!("bucket_count must be at least 1");
        }
        if self.analyzer.velocity_window_secs <= 0 {
            anyhow::bail!(
                "velocity_window_secs must be positive, got {}",
                self.analyzer.velocity_window_secs
            );
        }
        if self.analyzer.velocity_warning > self.analyzer.velocity_critical {
            anyhow::bail!(
                "velocity_warning ({}) exceeds velocity_critical ({})",
                self.analyzer.velocity_warning,
                self.analyzer.velocity_critical
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let config: LedgerConfig = serde_json::from_str(r#"{ "bucket_count": 16 }"#).unwrap();
        assert_eq!(config.bucket_count, 16);
        assert_eq!(config.analyzer, AnalyzerConfig::default());
    }

    #[test]
    fn zero_buckets_rejected() {
        let config = LedgerConfig { bucket_count: 0, ..LedgerConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_velocity_thresholds_rejected() {
        let mut config = LedgerConfig::default();
        config.analyzer.velocity_warning = 30;
        assert!(config.validate().is_err());
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/ledger.json");
        let config = LedgerConfig::load(path).unwrap();
        assert_eq!(config, LedgerConfig::default());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = LedgerConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("Cannot read"), "unexpected error: {err}");
    }
}
