//! Scan orchestration.

use super::{DecisionPolicy, ModerationResult, WordListStore, scan_pages};
use crate::db::Database;
use crate::error::Result;
use crate::provider::TextProvider;
use std::sync::Arc;

/// Runs scans end to end: pages from the provider, active words from the
/// store, verdict from the policy, persisted as a new immutable result.
///
/// Scanning never mutates the word list or the ebook; concurrent scans of
/// the same ebook at most duplicate work. The caller owns any ebook status
/// transition that follows an invalid verdict.
pub struct ModerationService {
    db: Database,
    words: WordListStore,
    provider: Arc<dyn TextProvider>,
    policy: DecisionPolicy,
}

impl ModerationService {
    /// Create a service over the database, a text provider and a policy.
    pub fn new(db: Database, provider: Arc<dyn TextProvider>, policy: DecisionPolicy) -> Self {
        let words = WordListStore::new(db.clone());
        Self {
            db,
            words,
            provider,
            policy,
        }
    }

    /// Scan an ebook's pages against the active word list for `language`.
    ///
    /// Provider failures propagate unchanged; retry policy belongs to the
    /// provider or the caller. The verdict is persisted before returning.
    pub fn scan_ebook(&self, ebook_id: &str, language: &str) -> Result<ModerationResult> {
        let pages = self.provider.get_pages(ebook_id)?;
        let words = self.words.list_active(language)?;

        let violations = scan_pages(&pages, &words);
        let result = self
            .policy
            .decide(ebook_id, language, violations, pages.len() as u32);

        tracing::info!(
            ebook_id = %ebook_id,
            language = %language,
            pages = result.total_pages_scanned,
            violations = result.violations.len(),
            is_valid = result.is_valid,
            "Scan complete"
        );

        self.db.save_result(&result)?;
        Ok(result)
    }

    /// Persisted verdicts for an ebook, newest first.
    pub fn results(&self, ebook_id: &str) -> Result<Vec<ModerationResult>> {
        self.db.get_results(ebook_id)
    }

    /// The decision policy in effect.
    pub fn policy(&self) -> &DecisionPolicy {
        &self.policy
    }
}
