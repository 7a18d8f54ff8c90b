//! Page load timing against warn/fail thresholds.

use crate::result::{PomError, PomResult};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Kind of load being timed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadKind {
    /// Login to first dashboard render
    Login,
    /// Ordinary in-app navigation
    Navigation,
    /// Get Started / onboarding widgets, which load several panels
    GetStarted,
}

impl LoadKind {
    /// Thresholds applied when none are configured
    #[must_use]
    pub const fn default_thresholds(self) -> LoadThresholds {
        match self {
            Self::Login => LoadThresholds::new(30_000, None, 60_000),
            Self::Navigation => LoadThresholds::new(10_000, None, 60_000),
            Self::GetStarted => LoadThresholds::new(60_000, Some(90_000), 150_000),
        }
    }
}

/// Warn/fail limits in milliseconds, inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadThresholds {
    /// First warning level
    pub warn_ms: u64,
    /// Optional second warning level
    #[serde(default)]
    pub second_warn_ms: Option<u64>,
    /// Failure level
    pub fail_ms: u64,
}

impl LoadThresholds {
    /// Create thresholds
    #[must_use]
    pub const fn new(warn_ms: u64, second_warn_ms: Option<u64>, fail_ms: u64) -> Self {
        Self {
            warn_ms,
            second_warn_ms,
            fail_ms,
        }
    }

    /// Classify an elapsed time
    #[must_use]
    pub fn classify(&self, elapsed_ms: u64) -> Verdict {
        if elapsed_ms >= self.fail_ms {
            Verdict::TooSlow
        } else if self.second_warn_ms.is_some_and(|w| elapsed_ms >= w) {
            Verdict::VerySlow
        } else if elapsed_ms >= self.warn_ms {
            Verdict::Slow
        } else {
            Verdict::Within
        }
    }
}

/// Outcome of a timed load
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Under the warning level
    Within,
    /// Past the first warning level
    Slow,
    /// Past the second warning level
    VerySlow,
    /// Past the failure level
    TooSlow,
}

/// Running stopwatch for one load
#[derive(Debug, Clone)]
pub struct LoadTimer {
    label: String,
    kind: LoadKind,
    thresholds: LoadThresholds,
    started: Instant,
}

impl LoadTimer {
    /// Start timing with the kind's default thresholds
    pub fn start(kind: LoadKind, label: impl Into<String>) -> Self {
        Self::with_thresholds(kind, label, kind.default_thresholds())
    }

    /// Start timing with explicit thresholds
    pub fn with_thresholds(
        kind: LoadKind,
        label: impl Into<String>,
        thresholds: LoadThresholds,
    ) -> Self {
        Self {
            label: label.into(),
            kind,
            thresholds,
            started: Instant::now(),
        }
    }

    /// Stop and log the result
    pub fn finish(&self) -> LoadReport {
        self.report(self.started.elapsed())
    }

    /// Log and classify an externally measured duration
    pub fn report(&self, elapsed: Duration) -> LoadReport {
        let elapsed_ms = elapsed.as_millis() as u64;
        let verdict = self.thresholds.classify(elapsed_ms);
        let secs = elapsed_ms as f64 / 1000.0;
        match verdict {
            Verdict::Within => info!(
                label = %self.label,
                elapsed_ms,
                "{} completed in {secs:.2} s",
                self.label
            ),
            Verdict::Slow | Verdict::VerySlow => warn!(
                label = %self.label,
                elapsed_ms,
                ?verdict,
                "{} took {secs:.2} s, more than {} s",
                self.label,
                self.thresholds.warn_ms / 1000
            ),
            Verdict::TooSlow => error!(
                label = %self.label,
                elapsed_ms,
                "{} took {secs:.2} s, more than {} s",
                self.label,
                self.thresholds.fail_ms / 1000
            ),
        }
        LoadReport {
            label: self.label.clone(),
            kind: self.kind,
            elapsed_ms,
            verdict,
            fail_ms: self.thresholds.fail_ms,
        }
    }
}

/// Result of a timed load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    /// What was loaded
    pub label: String,
    /// Kind of load
    pub kind: LoadKind,
    /// Elapsed milliseconds
    pub elapsed_ms: u64,
    /// Classification
    pub verdict: Verdict,
    /// Failure threshold that applied
    pub fail_ms: u64,
}

impl LoadReport {
    /// Raise [`PomError::Validation`] when the failure level was reached
    pub fn into_result(self) -> PomResult<Self> {
        if self.verdict == Verdict::TooSlow {
            return Err(PomError::validation(
                format!("{} load time", self.label),
                format!(
                    "took {} ms, limit {} ms",
                    self.elapsed_ms, self.fail_ms
                ),
            ));
        }
        Ok(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        assert_eq!(LoadKind::Login.default_thresholds().warn_ms, 30_000);
        assert_eq!(LoadKind::Navigation.default_thresholds().fail_ms, 60_000);
        assert_eq!(
            LoadKind::GetStarted.default_thresholds().second_warn_ms,
            Some(90_000)
        );
    }

    #[test]
    fn test_classify_is_inclusive() {
        let t = LoadKind::GetStarted.default_thresholds();
        assert_eq!(t.classify(59_999), Verdict::Within);
        assert_eq!(t.classify(60_000), Verdict::Slow);
        assert_eq!(t.classify(90_000), Verdict::VerySlow);
        assert_eq!(t.classify(150_000), Verdict::TooSlow);
    }

    #[test]
    fn test_classify_without_second_warning() {
        let t = LoadKind::Navigation.default_thresholds();
        assert_eq!(t.classify(45_000), Verdict::Slow);
    }

    #[test]
    fn test_report_and_into_result() {
        let timer = LoadTimer::start(LoadKind::Navigation, "FAQs");
        let ok = timer.report(Duration::from_millis(1_500));
        assert_eq!(ok.verdict, Verdict::Within);
        assert!(ok.into_result().is_ok());

        let slow = timer.report(Duration::from_secs(61));
        let err = slow.into_result().unwrap_err();
        assert!(err.to_string().contains("FAQs load time"));
    }

    #[test]
    fn test_finish_measures_real_time() {
        let timer = LoadTimer::with_thresholds(
            LoadKind::Login,
            "login",
            LoadThresholds::new(0, None, u64::MAX),
        );
        assert_eq!(timer.finish().verdict, Verdict::Slow);
    }

    #[test]
    fn test_verdict_ordering() {
        assert!(Verdict::TooSlow > Verdict::VerySlow);
        assert!(Verdict::Slow > Verdict::Within);
    }
}
