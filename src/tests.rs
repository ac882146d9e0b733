use crate::config::Config;
use crate::db::{Database, now_timestamp};
use crate::error::AppError;
use crate::moderation::{
    Category, DecisionPolicy, ModerationResult, ModerationService, NewWord, PageText, Severity,
    Violation, WordFilter, WordListStore, WordUpdate,
};
use crate::provider::TextProvider;
use std::sync::Arc;

fn test_db() -> Database {
    Database::open_memory().unwrap()
}

fn test_store() -> WordListStore {
    WordListStore::new(test_db())
}

fn new_word(word: &str, severity: Severity, language: &str) -> NewWord {
    NewWord {
        word: word.to_string(),
        severity,
        category: Category::Other,
        language: language.to_string(),
        description: None,
    }
}

fn page(number: u32, content: &str) -> PageText {
    PageText {
        page_number: number,
        content: content.to_string(),
    }
}

/// Provider serving a fixed page set for any ebook id.
struct StubProvider {
    pages: Vec<PageText>,
}

impl TextProvider for StubProvider {
    fn get_pages(&self, _ebook_id: &str) -> crate::error::Result<Vec<PageText>> {
        Ok(self.pages.clone())
    }

    fn list_ebooks(&self) -> crate::error::Result<Vec<String>> {
        Ok(vec!["ebook-1".to_string()])
    }
}

/// Provider that always fails, for propagation tests.
struct FailingProvider;

impl TextProvider for FailingProvider {
    fn get_pages(&self, _ebook_id: &str) -> crate::error::Result<Vec<PageText>> {
        Err(AppError::Provider("extraction backlog".to_string()))
    }

    fn list_ebooks(&self) -> crate::error::Result<Vec<String>> {
        Ok(Vec::new())
    }
}

fn service_with(db: Database, pages: Vec<PageText>) -> ModerationService {
    ModerationService::new(
        db,
        Arc::new(StubProvider { pages }),
        DecisionPolicy::default(),
    )
}

// ========== WORD STORE ==========

#[test]
fn store_create_and_get_word() {
    let store = test_store();

    let created = store
        .create(new_word("spam", Severity::Medium, "en"))
        .unwrap();
    let found = store.get(&created.id).unwrap();

    assert_eq!(found.word, "spam");
    assert_eq!(found.severity, Severity::Medium);
    assert_eq!(found.language, "en");
    assert!(found.is_active);
}

#[test]
fn store_empty_word_rejected() {
    let store = test_store();

    let result = store.create(new_word("", Severity::Low, "en"));
    assert!(matches!(result, Err(AppError::Validation(_))));

    let result = store.create(new_word("   ", Severity::Low, "en"));
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[test]
fn store_oversize_word_rejected() {
    let store = test_store();

    let long = "x".repeat(256);
    let result = store.create(new_word(&long, Severity::Low, "en"));
    assert!(matches!(result, Err(AppError::Validation(_))));

    let max = "x".repeat(255);
    assert!(store.create(new_word(&max, Severity::Low, "en")).is_ok());
}

#[test]
fn store_word_normalized_lowercase() {
    let store = test_store();

    let created = store
        .create(new_word("  SpAm  ", Severity::Medium, "EN"))
        .unwrap();

    assert_eq!(created.word, "spam");
    assert_eq!(created.language, "en");
}

#[test]
fn store_duplicate_active_pair_rejected() {
    let store = test_store();

    store
        .create(new_word("spam", Severity::Medium, "en"))
        .unwrap();

    // Same pair, case variants included
    let result = store.create(new_word("SPAM", Severity::High, "en"));
    assert!(matches!(result, Err(AppError::Validation(_))));

    // Same word, different language is fine
    assert!(store.create(new_word("spam", Severity::Medium, "vi")).is_ok());
}

#[test]
fn store_deactivated_word_frees_the_pair() {
    let store = test_store();

    let first = store
        .create(new_word("spam", Severity::Medium, "en"))
        .unwrap();
    store.set_active(&first.id, false).unwrap();

    let second = store
        .create(new_word("spam", Severity::High, "en"))
        .unwrap();

    // Reactivating the old row would recreate the duplicate
    let result = store.set_active(&first.id, true);
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(store.get(&second.id).unwrap().is_active);
}

#[test]
fn store_update_fields() {
    let store = test_store();

    let created = store
        .create(new_word("spam", Severity::Medium, "en"))
        .unwrap();
    let updated = store
        .update(
            &created.id,
            WordUpdate {
                severity: Some(Severity::Critical),
                description: Some("advertising".to_string()),
                ..WordUpdate::default()
            },
        )
        .unwrap();

    assert_eq!(updated.severity, Severity::Critical);
    assert_eq!(updated.description, Some("advertising".to_string()));
    assert_eq!(updated.word, "spam");
}

#[test]
fn store_update_unknown_id_not_found() {
    let store = test_store();

    let result = store.update("missing", WordUpdate::default());
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[test]
fn store_delete_word() {
    let store = test_store();

    let created = store
        .create(new_word("spam", Severity::Medium, "en"))
        .unwrap();

    store.delete(&created.id).unwrap();
    assert!(matches!(
        store.get(&created.id),
        Err(AppError::NotFound(_))
    ));

    // Second delete of the same id reports not found
    assert!(matches!(
        store.delete(&created.id),
        Err(AppError::NotFound(_))
    ));
}

#[test]
fn store_bulk_delete_skips_missing() {
    let store = test_store();

    let a = store.create(new_word("aaa", Severity::Low, "en")).unwrap();
    let b = store.create(new_word("bbb", Severity::Low, "en")).unwrap();

    let deleted = store
        .bulk_delete(&[a.id.clone(), "missing".to_string(), b.id.clone()])
        .unwrap();
    assert_eq!(deleted, 2);

    // Idempotent: nothing left to delete
    let deleted = store.bulk_delete(&[a.id, b.id]).unwrap();
    assert_eq!(deleted, 0);
}

#[test]
fn store_list_filters_combine_with_and() {
    let store = test_store();

    store
        .create(new_word("alpha", Severity::High, "en"))
        .unwrap();
    store
        .create(new_word("beta", Severity::High, "vi"))
        .unwrap();
    store
        .create(new_word("gamma", Severity::Low, "en"))
        .unwrap();

    let filter = WordFilter {
        severity: Some(Severity::High),
        language: Some("en".to_string()),
        ..WordFilter::default()
    };
    let (items, total) = store.list(&filter, 50, 0).unwrap();

    assert_eq!(total, 1);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].word, "alpha");
}

#[test]
fn store_list_search_matches_word_and_description() {
    let store = test_store();

    store
        .create(NewWord {
            word: "casino".to_string(),
            severity: Severity::Medium,
            category: Category::Spam,
            language: "en".to_string(),
            description: Some("Gambling promotions".to_string()),
        })
        .unwrap();
    store
        .create(new_word("unrelated", Severity::Medium, "en"))
        .unwrap();

    let by_word = WordFilter {
        search: Some("CASI".to_string()),
        ..WordFilter::default()
    };
    let (items, _) = store.list(&by_word, 50, 0).unwrap();
    assert_eq!(items.len(), 1);

    let by_description = WordFilter {
        search: Some("gambling".to_string()),
        ..WordFilter::default()
    };
    let (items, _) = store.list(&by_description, 50, 0).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].word, "casino");
}

#[test]
fn store_list_pagination() {
    let store = test_store();

    for word in ["aaa", "bbb", "ccc", "ddd", "eee"] {
        store.create(new_word(word, Severity::Low, "en")).unwrap();
    }

    let (first, total) = store.list(&WordFilter::default(), 2, 0).unwrap();
    assert_eq!(total, 5);
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].word, "aaa");

    let (last, total) = store.list(&WordFilter::default(), 2, 4).unwrap();
    assert_eq!(total, 5);
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].word, "eee");
}

#[test]
fn store_list_active_excludes_inactive_and_other_languages() {
    let store = test_store();

    store
        .create(new_word("keep", Severity::Low, "en"))
        .unwrap();
    let off = store
        .create(new_word("gone", Severity::Low, "en"))
        .unwrap();
    store
        .create(new_word("other", Severity::Low, "vi"))
        .unwrap();
    store.set_active(&off.id, false).unwrap();

    let active = store.list_active("en").unwrap();

    assert_eq!(active.len(), 1);
    assert_eq!(active[0].word, "keep");
}

#[test]
fn store_import_skips_comments_and_duplicates() {
    let store = test_store();

    store
        .create(new_word("existing", Severity::Low, "en"))
        .unwrap();

    let content = "# banned words\n\nfresh\nexisting\n  another  \n";
    let created = store
        .import(content, Severity::Medium, Category::Profanity, "en")
        .unwrap();

    assert_eq!(created, 2);
    let (_, total) = store.list(&WordFilter::default(), 50, 0).unwrap();
    assert_eq!(total, 3);
}

// ========== SCAN SERVICE ==========

#[test]
fn scan_counts_occurrences_on_a_page() {
    // W = [spam/medium], P = ["buy spam now, spam spam"]
    let db = test_db();
    let store = WordListStore::new(db.clone());
    store
        .create(new_word("spam", Severity::Medium, "en"))
        .unwrap();

    let service = service_with(db, vec![page(1, "buy spam now, spam spam")]);
    let result = service.scan_ebook("ebook-1", "en").unwrap();

    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].word, "spam");
    assert_eq!(result.violations[0].page_number, 1);
    assert_eq!(result.violations[0].occurrence_count, 3);
    assert!(result.is_valid);
    assert_eq!(result.severity, Some(Severity::Medium));
}

#[test]
fn scan_critical_word_fails_the_ebook() {
    // W = [hate/critical], P = [clean page, "I hate this"]
    let db = test_db();
    let store = WordListStore::new(db.clone());
    store
        .create(new_word("hate", Severity::Critical, "en"))
        .unwrap();

    let service = service_with(
        db,
        vec![page(1, "no issue here"), page(2, "I hate this")],
    );
    let result = service.scan_ebook("ebook-1", "en").unwrap();

    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].page_number, 2);
    assert!(!result.is_valid);
    assert_eq!(result.severity, Some(Severity::Critical));
    assert_eq!(result.total_pages_scanned, 2);
}

#[test]
fn scan_with_empty_word_list_is_valid() {
    let db = test_db();
    let service = service_with(db, vec![page(1, "anything")]);

    let result = service.scan_ebook("ebook-1", "en").unwrap();

    assert!(result.violations.is_empty());
    assert!(result.is_valid);
    assert_eq!(result.severity, None);
    assert_eq!(result.total_pages_scanned, 1);
}

#[test]
fn scan_is_idempotent() {
    let db = test_db();
    let store = WordListStore::new(db.clone());
    store
        .create(new_word("spam", Severity::Medium, "en"))
        .unwrap();
    store
        .create(new_word("hate", Severity::High, "en"))
        .unwrap();

    let service = service_with(
        db,
        vec![page(1, "spam and hate"), page(2, "more spam")],
    );

    let first = service.scan_ebook("ebook-1", "en").unwrap();
    let second = service.scan_ebook("ebook-1", "en").unwrap();

    assert_eq!(first.violations, second.violations);
    assert_eq!(first.is_valid, second.is_valid);
    assert_eq!(first.severity, second.severity);
    assert_ne!(first.id, second.id);
}

#[test]
fn scan_skips_deactivated_words() {
    let db = test_db();
    let store = WordListStore::new(db.clone());
    let word = store
        .create(new_word("hate", Severity::Critical, "en"))
        .unwrap();

    let service = service_with(db, vec![page(1, "I hate this")]);

    let before = service.scan_ebook("ebook-1", "en").unwrap();
    assert!(!before.is_valid);

    store.set_active(&word.id, false).unwrap();

    let after = service.scan_ebook("ebook-1", "en").unwrap();
    assert!(after.violations.is_empty());
    assert!(after.is_valid);
}

#[test]
fn scan_only_uses_requested_language() {
    let db = test_db();
    let store = WordListStore::new(db.clone());
    store
        .create(new_word("hate", Severity::Critical, "vi"))
        .unwrap();

    let service = service_with(db, vec![page(1, "I hate this")]);
    let result = service.scan_ebook("ebook-1", "en").unwrap();

    assert!(result.violations.is_empty());
    assert!(result.is_valid);
}

#[test]
fn scan_counts_pages_regardless_of_violations() {
    let db = test_db();
    let service = service_with(
        db,
        vec![page(1, "clean"), page(2, "clean"), page(3, "clean")],
    );

    let result = service.scan_ebook("ebook-1", "en").unwrap();
    assert_eq!(result.total_pages_scanned, 3);
}

#[test]
fn scan_propagates_provider_errors() {
    let service = ModerationService::new(
        test_db(),
        Arc::new(FailingProvider),
        DecisionPolicy::default(),
    );

    let result = service.scan_ebook("ebook-1", "en");
    assert!(matches!(result, Err(AppError::Provider(_))));
}

#[test]
fn scan_results_are_persisted_per_run() {
    let db = test_db();
    let store = WordListStore::new(db.clone());
    store
        .create(new_word("spam", Severity::Medium, "en"))
        .unwrap();

    let service = service_with(db, vec![page(1, "spam here")]);

    service.scan_ebook("ebook-1", "en").unwrap();
    service.scan_ebook("ebook-1", "en").unwrap();
    service.scan_ebook("ebook-2", "en").unwrap();

    let history = service.results("ebook-1").unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].violations.len(), 1);
    assert_eq!(history[0].violations[0].occurrence_count, 1);

    assert_eq!(service.results("ebook-2").unwrap().len(), 1);
    assert!(service.results("ebook-3").unwrap().is_empty());
}

// ========== RESULT PERSISTENCE ==========

#[test]
fn db_results_ordered_newest_first() {
    let db = test_db();

    let older = ModerationResult {
        id: "result-old".to_string(),
        ebook_id: "ebook-1".to_string(),
        language: "en".to_string(),
        is_valid: true,
        severity: None,
        violations: Vec::new(),
        total_pages_scanned: 1,
        created_at: 100,
    };
    let newer = ModerationResult {
        id: "result-new".to_string(),
        ebook_id: "ebook-1".to_string(),
        language: "en".to_string(),
        is_valid: false,
        severity: Some(Severity::High),
        violations: vec![Violation {
            word: "hate".to_string(),
            severity: Severity::High,
            category: Category::HateSpeech,
            page_number: 4,
            occurrence_count: 2,
        }],
        total_pages_scanned: 9,
        created_at: 200,
    };

    db.save_result(&older).unwrap();
    db.save_result(&newer).unwrap();

    let results = db.get_results("ebook-1").unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "result-new");
    assert_eq!(results[0].severity, Some(Severity::High));
    assert_eq!(results[0].violations.len(), 1);
    assert_eq!(results[0].violations[0].page_number, 4);
    assert_eq!(results[1].id, "result-old");
    assert_eq!(results[1].severity, None);
}

#[test]
fn db_count_helpers() {
    let db = test_db();
    let store = WordListStore::new(db.clone());

    let word = store
        .create(new_word("spam", Severity::Medium, "en"))
        .unwrap();
    store
        .create(new_word("hate", Severity::High, "en"))
        .unwrap();
    store.set_active(&word.id, false).unwrap();

    assert_eq!(db.count_words(false).unwrap(), 2);
    assert_eq!(db.count_words(true).unwrap(), 1);

    let service = service_with(db.clone(), vec![page(1, "hate speech")]);
    service.scan_ebook("ebook-1", "en").unwrap();

    assert_eq!(db.count_results(false).unwrap(), 1);
    assert_eq!(db.count_results(true).unwrap(), 1);
}

// ========== SERIALIZATION ==========

#[test]
fn result_severity_serializes_as_none_or_name() {
    let clean = DecisionPolicy::default().decide("ebook-1", "en", Vec::new(), 1);
    let json = serde_json::to_value(&clean).unwrap();
    assert_eq!(json["severity"], "none");
    assert_eq!(json["is_valid"], true);

    let dirty = DecisionPolicy::default().decide(
        "ebook-1",
        "en",
        vec![Violation {
            word: "hate".to_string(),
            severity: Severity::Critical,
            category: Category::HateSpeech,
            page_number: 1,
            occurrence_count: 1,
        }],
        1,
    );
    let json = serde_json::to_value(&dirty).unwrap();
    assert_eq!(json["severity"], "critical");
    assert_eq!(json["violations"][0]["category"], "hate_speech");
}

#[test]
fn severity_and_category_parse() {
    assert_eq!("low".parse::<Severity>().unwrap(), Severity::Low);
    assert_eq!("critical".parse::<Severity>().unwrap(), Severity::Critical);
    assert!("extreme".parse::<Severity>().is_err());

    assert_eq!(
        "hate_speech".parse::<Category>().unwrap(),
        Category::HateSpeech
    );
    assert!("unknown".parse::<Category>().is_err());

    assert!(Severity::Low < Severity::Medium);
    assert!(Severity::Medium < Severity::High);
    assert!(Severity::High < Severity::Critical);
}

// ========== CONFIG ==========

#[test]
fn config_parse_toml() {
    let toml = r#"
[server]
bind = "127.0.0.1:9090"
title = "Review Queue"

[database]
path = "/tmp/test.db"

[moderation]
fail_threshold = "critical"
default_language = "vi"

[pages]
dir = "/srv/pages"

[scan]
workers = 4
"#;
    let config: Config = toml::from_str(toml).unwrap();
    assert_eq!(config.server.bind.port(), 9090);
    assert_eq!(config.server.title, "Review Queue");
    assert_eq!(config.moderation.fail_threshold, "critical");
    assert_eq!(config.moderation.default_language, "vi");
    assert_eq!(config.pages.dir.to_str(), Some("/srv/pages"));
    assert_eq!(config.scan.workers, 4);
}

#[test]
fn config_default_values() {
    let config = Config::default();
    assert_eq!(config.server.bind.port(), 8080);
    assert_eq!(config.moderation.fail_threshold, "high");
    assert_eq!(config.moderation.default_language, "en");
    assert_eq!(config.scan.workers, 1);
}

#[test]
fn config_threshold_feeds_the_policy() {
    let threshold: Severity = Config::default().moderation.fail_threshold.parse().unwrap();
    let policy = DecisionPolicy::new(threshold);
    assert_eq!(policy.fail_threshold(), Severity::High);
}

#[test]
fn word_timestamps_are_set() {
    let store = test_store();
    let before = now_timestamp();

    let created = store
        .create(new_word("spam", Severity::Medium, "en"))
        .unwrap();

    assert!(created.created_at >= before);
    assert_eq!(created.created_at, created.updated_at);
}
