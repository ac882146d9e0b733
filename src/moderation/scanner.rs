//! Page scanner.

use super::{ModerationWord, PageText, Violation};

/// Scan a single page against a word list.
///
/// Matching is plain substring containment on lowercased text; word
/// boundaries are deliberately not enforced, so "spam" also matches
/// "spammer". Occurrences are counted non-overlapping.
pub fn scan_page(page: &PageText, words: &[ModerationWord]) -> Vec<Violation> {
    if page.content.is_empty() {
        return Vec::new();
    }

    let haystack = page.content.to_lowercase();
    let mut violations = Vec::new();

    for word in words {
        let needle = word.word.to_lowercase();
        if needle.is_empty() {
            continue;
        }

        let count = haystack.matches(needle.as_str()).count();
        if count > 0 {
            violations.push(Violation {
                word: word.word.clone(),
                severity: word.severity,
                category: word.category,
                page_number: page.page_number,
                occurrence_count: count as u32,
            });
        }
    }

    violations
}

/// Scan a sequence of pages, in the order supplied, against a word list.
///
/// Never short-circuits: every page is scanned even after a critical match,
/// since review UIs need the full report. An empty word list yields no
/// violations.
pub fn scan_pages(pages: &[PageText], words: &[ModerationWord]) -> Vec<Violation> {
    let mut violations = Vec::new();
    for page in pages {
        violations.extend(scan_page(page, words));
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moderation::{Category, Severity};

    fn word(text: &str, severity: Severity) -> ModerationWord {
        ModerationWord {
            id: format!("word-{}", text),
            word: text.to_string(),
            severity,
            category: Category::Other,
            language: "en".to_string(),
            description: None,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn page(number: u32, content: &str) -> PageText {
        PageText {
            page_number: number,
            content: content.to_string(),
        }
    }

    #[test]
    fn counts_non_overlapping_occurrences() {
        let words = vec![word("spam", Severity::Medium)];
        let violations = scan_page(&page(1, "buy spam now, spam spam"), &words);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].word, "spam");
        assert_eq!(violations[0].page_number, 1);
        assert_eq!(violations[0].occurrence_count, 3);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let words = vec![word("hate", Severity::Critical)];
        let violations = scan_page(&page(1, "I HATE Mondays"), &words);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].occurrence_count, 1);
    }

    #[test]
    fn matches_inside_longer_words() {
        // Substring containment: "spam" inside "spammer" counts.
        let words = vec![word("spam", Severity::Medium)];
        let violations = scan_page(&page(1, "a spammer wrote this"), &words);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].occurrence_count, 1);
    }

    #[test]
    fn empty_content_yields_nothing() {
        let words = vec![word("spam", Severity::Medium)];
        assert!(scan_page(&page(1, ""), &words).is_empty());
    }

    #[test]
    fn empty_word_list_yields_nothing() {
        assert!(scan_pages(&[page(1, "anything")], &[]).is_empty());
    }

    #[test]
    fn pages_scanned_in_order_without_short_circuit() {
        let words = vec![
            word("hate", Severity::Critical),
            word("spam", Severity::Medium),
        ];
        let pages = vec![
            page(1, "hate speech here"),
            page(2, "clean page"),
            page(3, "spam offer"),
        ];

        let violations = scan_pages(&pages, &words);

        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].page_number, 1);
        assert_eq!(violations[0].word, "hate");
        assert_eq!(violations[1].page_number, 3);
        assert_eq!(violations[1].word, "spam");
    }

    #[test]
    fn word_list_order_preserved_within_page() {
        let words = vec![
            word("alpha", Severity::Low),
            word("beta", Severity::Low),
        ];
        let violations = scan_page(&page(1, "beta then alpha"), &words);

        assert_eq!(violations[0].word, "alpha");
        assert_eq!(violations[1].word, "beta");
    }
}
