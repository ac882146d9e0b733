//! Verdict policy.

use super::{ModerationResult, Severity, Violation};
use crate::db::now_timestamp;

/// Pass/fail policy applied to aggregated violations.
///
/// The threshold comes from configuration (`[moderation] fail_threshold`),
/// never from a constant: an ebook fails when its maximum violation severity
/// is at or above the threshold.
#[derive(Debug, Clone, Copy)]
pub struct DecisionPolicy {
    fail_threshold: Severity,
}

impl DecisionPolicy {
    /// Create a policy failing ebooks at `fail_threshold` or above.
    pub fn new(fail_threshold: Severity) -> Self {
        Self { fail_threshold }
    }

    /// The configured failure threshold.
    pub fn fail_threshold(&self) -> Severity {
        self.fail_threshold
    }

    /// Aggregate violations into an immutable result for one ebook.
    ///
    /// `severity` is the maximum among violations (`None` when clean), and
    /// `is_valid` is a pure function of the violations and the threshold.
    pub fn decide(
        &self,
        ebook_id: &str,
        language: &str,
        violations: Vec<Violation>,
        total_pages_scanned: u32,
    ) -> ModerationResult {
        let severity = violations.iter().map(|v| v.severity).max();
        let is_valid = severity.is_none_or(|s| s < self.fail_threshold);

        ModerationResult {
            id: uuid::Uuid::new_v4().to_string(),
            ebook_id: ebook_id.to_string(),
            language: language.to_string(),
            is_valid,
            severity,
            violations,
            total_pages_scanned,
            created_at: now_timestamp(),
        }
    }
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            fail_threshold: Severity::High,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moderation::Category;

    fn violation(severity: Severity) -> Violation {
        Violation {
            word: "w".to_string(),
            severity,
            category: Category::Other,
            page_number: 1,
            occurrence_count: 1,
        }
    }

    #[test]
    fn clean_scan_is_valid_with_no_severity() {
        let result = DecisionPolicy::default().decide("ebook-1", "en", Vec::new(), 3);

        assert!(result.is_valid);
        assert_eq!(result.severity, None);
        assert_eq!(result.total_pages_scanned, 3);
    }

    #[test]
    fn medium_passes_default_threshold() {
        let result = DecisionPolicy::default().decide(
            "ebook-1",
            "en",
            vec![violation(Severity::Low), violation(Severity::Medium)],
            1,
        );

        assert!(result.is_valid);
        assert_eq!(result.severity, Some(Severity::Medium));
    }

    #[test]
    fn high_fails_default_threshold() {
        let result =
            DecisionPolicy::default().decide("ebook-1", "en", vec![violation(Severity::High)], 1);

        assert!(!result.is_valid);
        assert_eq!(result.severity, Some(Severity::High));
    }

    #[test]
    fn threshold_is_configurable() {
        let lenient = DecisionPolicy::new(Severity::Critical);
        let strict = DecisionPolicy::new(Severity::Medium);

        let high = vec![violation(Severity::High)];
        assert!(lenient.decide("e", "en", high.clone(), 1).is_valid);
        assert!(!strict.decide("e", "en", high, 1).is_valid);

        let medium = vec![violation(Severity::Medium)];
        assert!(!strict.decide("e", "en", medium, 1).is_valid);
    }

    #[test]
    fn severity_is_the_maximum() {
        let result = DecisionPolicy::default().decide(
            "ebook-1",
            "en",
            vec![
                violation(Severity::Medium),
                violation(Severity::Critical),
                violation(Severity::Low),
            ],
            2,
        );

        assert_eq!(result.severity, Some(Severity::Critical));
        assert!(!result.is_valid);
    }
}
