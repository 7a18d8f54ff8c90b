//! Runtime settings.
//!
//! Settings come from a YAML file and may be overridden by `POMKIT_*`
//! environment variables. Every field has a default, so an empty document
//! is a valid configuration.
//!
//! ```yaml
//! base_url: https://app.example.com
//! explicit_wait_ms: 10000
//! poll_interval_ms: 150
//! click_timeout_secs: 10
//! toggle_attempts: 3
//! load_thresholds:
//!   navigation: { warn_ms: 12000, fail_ms: 20000 }
//! ```

use crate::interaction::DEFAULT_CLICK_TIMEOUT_SECS;
use crate::result::{PomError, PomResult};
use crate::timing::{LoadKind, LoadThresholds};
use crate::wait::{WaitOptions, DEFAULT_EXPLICIT_WAIT_MS, DEFAULT_POLL_INTERVAL_MS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Environment variable overriding [`Settings::base_url`]
pub const ENV_BASE_URL: &str = "POMKIT_BASE_URL";
/// Environment variable overriding [`Settings::explicit_wait_ms`]
pub const ENV_EXPLICIT_WAIT_MS: &str = "POMKIT_EXPLICIT_WAIT_MS";
/// Environment variable overriding [`Settings::poll_interval_ms`]
pub const ENV_POLL_INTERVAL_MS: &str = "POMKIT_POLL_INTERVAL_MS";

/// Page-object runtime settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Application root URL
    pub base_url: String,
    /// Default explicit wait in milliseconds
    pub explicit_wait_ms: u64,
    /// Poll interval in milliseconds
    pub poll_interval_ms: u64,
    /// Safe-click clickability timeout in seconds
    pub click_timeout_secs: u64,
    /// Attempts per accordion item
    pub toggle_attempts: u32,
    /// Load-time thresholds overriding the per-kind defaults
    pub load_thresholds: HashMap<LoadKind, LoadThresholds>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            explicit_wait_ms: DEFAULT_EXPLICIT_WAIT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            click_timeout_secs: DEFAULT_CLICK_TIMEOUT_SECS,
            toggle_attempts: 3,
            load_thresholds: HashMap::new(),
        }
    }
}

impl Settings {
    /// Parse settings from YAML
    pub fn from_yaml_str(yaml: &str) -> PomResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Self = serde_yaml_ng::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a YAML file
    pub fn load(path: impl AsRef<Path>) -> PomResult<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "loaded settings");
        Self::from_yaml_str(&yaml)
    }

    /// Apply `POMKIT_*` environment overrides
    pub fn apply_env_overrides(self) -> PomResult<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> PomResult<Self> {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(raw) = lookup(ENV_EXPLICIT_WAIT_MS) {
            self.explicit_wait_ms = parse_ms(ENV_EXPLICIT_WAIT_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_POLL_INTERVAL_MS) {
            self.poll_interval_ms = parse_ms(ENV_POLL_INTERVAL_MS, &raw)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject settings that would make polling or retries meaningless
    pub fn validate(&self) -> PomResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(PomError::config("poll_interval_ms must be greater than zero"));
        }
        if self.toggle_attempts == 0 {
            return Err(PomError::config("toggle_attempts must be at least 1"));
        }
        for (kind, t) in &self.load_thresholds {
            if t.warn_ms > t.fail_ms {
                return Err(PomError::config(format!(
                    "{kind:?} warn threshold {} ms exceeds fail threshold {} ms",
                    t.warn_ms, t.fail_ms
                )));
            }
        }
        Ok(())
    }

    /// Wait options derived from these settings
    #[must_use]
    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(self.explicit_wait_ms)
            .with_poll_interval(self.poll_interval_ms)
    }

    /// Explicit wait as a duration
    #[must_use]
    pub const fn explicit_wait(&self) -> Duration {
        Duration::from_millis(self.explicit_wait_ms)
    }

    /// Thresholds for a load kind, configured or default
    #[must_use]
    pub fn thresholds(&self, kind: LoadKind) -> LoadThresholds {
        self.load_thresholds
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.default_thresholds())
    }

    /// Join a path onto the base URL
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Parse a millisecond count, tolerating `_` separators and trailing `# comments`
fn parse_ms(key: &str, raw: &str) -> PomResult<u64> {
    let cleaned: String = raw
        .split('#')
        .next()
        .unwrap_or_default()
        .trim()
        .chars()
        .filter(|c| *c != '_')
        .collect();
    cleaned
        .parse()
        .map_err(|_| PomError::config(format!("{key}: '{raw}' is not a number of milliseconds")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.explicit_wait_ms, 10_000);
        assert_eq!(s.poll_interval_ms, 150);
        assert_eq!(s.toggle_attempts, 3);
        assert_eq!(s.wait_options().timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Settings::from_yaml_str("").unwrap(), Settings::default());
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = "base_url: https://app.example.com/\n\
                    poll_interval_ms: 300\n\
                    load_thresholds:\n  navigation: { warn_ms: 12000, fail_ms: 20000 }\n";
        let s = Settings::from_yaml_str(yaml).unwrap();
        assert_eq!(s.poll_interval_ms, 300);
        assert_eq!(s.explicit_wait_ms, 10_000);
        assert_eq!(s.url("/grc/faqs"), "https://app.example.com/grc/faqs");
        assert_eq!(s.thresholds(LoadKind::Navigation).fail_ms, 20_000);
        assert_eq!(s.thresholds(LoadKind::Login).fail_ms, 60_000);
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            Settings::from_yaml_str("poll_interval_ms: [1"),
            Err(PomError::Yaml(_))
        ));
    }

    #[test]
    fn test_validation() {
        assert!(Settings::from_yaml_str("poll_interval_ms: 0").is_err());
        assert!(Settings::from_yaml_str("toggle_attempts: 0").is_err());
        assert!(Settings::from_yaml_str(
            "load_thresholds:\n  login: { warn_ms: 5, fail_ms: 1 }"
        )
        .is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_BASE_URL, "https://staging.example.com"),
            (ENV_EXPLICIT_WAIT_MS, "30_000   # 30s"),
        ]
        .into_iter()
        .collect();
        let s = Settings::default()
            .apply_overrides(|k| vars.get(k).map(|v| (*v).to_string()))
            .unwrap();
        assert_eq!(s.base_url, "https://staging.example.com");
        assert_eq!(s.explicit_wait_ms, 30_000);
        assert_eq!(s.poll_interval_ms, 150);
    }

    #[test]
    fn test_bad_override() {
        let err = Settings::default()
            .apply_overrides(|k| (k == ENV_POLL_INTERVAL_MS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, PomError::Config { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "explicit_wait_ms: 8000").unwrap();
        let s = Settings::load(file.path()).unwrap();
        assert_eq!(s.explicit_wait(), Duration::from_secs(8));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, PomError::Io(_)));
    }
}
