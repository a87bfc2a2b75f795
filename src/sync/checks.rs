//! Pull request check rollup classification.

use serde::Deserialize;

/// One entry of a PR's `statusCheckRollup`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckRun {
    /// Run status (QUEUED, IN_PROGRESS, COMPLETED)
    #[serde(default)]
    pub status: Option<String>,
    /// Run conclusion once completed
    #[serde(default)]
    pub conclusion: Option<String>,
}

/// Outcome bucket for a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    /// Completed successfully
    Passed,
    /// Completed with failure or error
    Failed,
    /// Still running, or finished without a clear verdict
    Pending,
    /// Conclusion not recognised
    Other,
}

impl CheckRun {
    /// Classify this check
    pub fn state(&self) -> CheckState {
        let status = self.status.as_deref().unwrap_or_default().to_uppercase();
        let conclusion = self
            .conclusion
            .as_deref()
            .filter(|c| !c.is_empty())
            .map(str::to_uppercase);

        if matches!(status.as_str(), "QUEUED" | "IN_PROGRESS") {
            return CheckState::Pending;
        }

        match conclusion.as_deref() {
            None => CheckState::Pending,
            Some("SUCCESS") => CheckState::Passed,
            Some("FAILURE" | "ERROR") => CheckState::Failed,
            Some("CANCELLED" | "SKIPPED" | "TIMED_OUT" | "NEUTRAL") => CheckState::Pending,
            Some(_) => CheckState::Other,
        }
    }
}

/// Counts of check outcomes for one PR
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckSummary {
    /// Checks that passed
    pub passed: usize,
    /// Checks that failed
    pub failed: usize,
    /// Checks still pending (or cancelled/skipped)
    pub pending: usize,
    /// Total checks reported
    pub total: usize,
}

impl CheckSummary {
    /// Tally a rollup
    pub fn from_checks(checks: &[CheckRun]) -> Self {
        let mut summary = Self {
            total: checks.len(),
            ..Self::default()
        };
        for check in checks {
            match check.state() {
                CheckState::Passed => summary.passed += 1,
                CheckState::Failed => summary.failed += 1,
                CheckState::Pending => summary.pending += 1,
                CheckState::Other => {}
            }
        }
        summary
    }

    /// Safe to auto-merge: at least one pass, nothing failed or pending
    pub fn all_passed(&self) -> bool {
        self.passed > 0 && self.failed == 0 && self.pending == 0
    }

    /// One-line description, e.g. `1 failed, 3 passed`
    pub fn describe(&self) -> String {
        if self.total == 0 {
            return "No checks".to_string();
        }

        let mut parts = Vec::new();
        if self.failed > 0 {
            parts.push(format!("{} failed", self.failed));
        }
        if self.passed > 0 {
            parts.push(format!("{} passed", self.passed));
        }
        if self.pending > 0 {
            parts.push(format!("{} pending", self.pending));
        }

        if parts.is_empty() {
            "Unknown".to_string()
        } else {
            parts.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(status: &str, conclusion: Option<&str>) -> CheckRun {
        CheckRun {
            status: Some(status.to_string()),
            conclusion: conclusion.map(str::to_string),
        }
    }

    #[test]
    fn classifies_checks() {
        assert_eq!(check("COMPLETED", Some("success")).state(), CheckState::Passed);
        assert_eq!(check("COMPLETED", Some("FAILURE")).state(), CheckState::Failed);
        assert_eq!(check("COMPLETED", Some("ERROR")).state(), CheckState::Failed);
        assert_eq!(check("IN_PROGRESS", Some("SUCCESS")).state(), CheckState::Pending);
        assert_eq!(check("COMPLETED", None).state(), CheckState::Pending);
        assert_eq!(check("COMPLETED", Some("")).state(), CheckState::Pending);
        assert_eq!(check("COMPLETED", Some("SKIPPED")).state(), CheckState::Pending);
        assert_eq!(check("COMPLETED", Some("STALE")).state(), CheckState::Other);
    }

    #[test]
    fn summary_describes_and_gates_merging() {
        let summary = CheckSummary::from_checks(&[
            check("COMPLETED", Some("SUCCESS")),
            check("COMPLETED", Some("SUCCESS")),
            check("QUEUED", None),
        ]);
        assert_eq!(summary.describe(), "2 passed, 1 pending");
        assert!(!summary.all_passed());

        let summary = CheckSummary::from_checks(&[
            check("COMPLETED", Some("FAILURE")),
            check("COMPLETED", Some("SUCCESS")),
        ]);
        assert_eq!(summary.describe(), "1 failed, 1 passed");
        assert!(!summary.all_passed());

        let summary = CheckSummary::from_checks(&[check("COMPLETED", Some("SUCCESS"))]);
        assert!(summary.all_passed());

        let summary = CheckSummary::from_checks(&[]);
        assert_eq!(summary.describe(), "No checks");
        assert!(!summary.all_passed());

        let summary = CheckSummary::from_checks(&[check("COMPLETED", Some("STALE"))]);
        assert_eq!(summary.describe(), "Unknown");
    }
}
