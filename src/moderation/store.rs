//! Banned-word registry.

use super::{Category, ModerationWord, Severity};
use crate::db::{Database, now_timestamp};
use crate::error::{AppError, Result};

/// Maximum length of a banned word, in characters.
const MAX_WORD_LEN: usize = 255;

/// Input for creating a word.
#[derive(Debug, Clone)]
pub struct NewWord {
    /// The word to ban (normalized to lowercase on creation).
    pub word: String,
    /// Severity assigned to matches.
    pub severity: Severity,
    /// Category of the word.
    pub category: Category,
    /// Language code.
    pub language: String,
    /// Optional note shown to moderators.
    pub description: Option<String>,
}

/// Partial update of a word; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct WordUpdate {
    /// Replacement word text.
    pub word: Option<String>,
    /// Replacement severity.
    pub severity: Option<Severity>,
    /// Replacement category.
    pub category: Option<Category>,
    /// Replacement language code.
    pub language: Option<String>,
    /// Replacement description.
    pub description: Option<String>,
    /// Activate or deactivate the word.
    pub is_active: Option<bool>,
}

/// Filters for listing words; combined with logical AND.
#[derive(Debug, Clone, Default)]
pub struct WordFilter {
    /// Match this severity only.
    pub severity: Option<Severity>,
    /// Match this category only.
    pub category: Option<Category>,
    /// Match this language only.
    pub language: Option<String>,
    /// Match this active state only.
    pub is_active: Option<bool>,
    /// Case-insensitive substring of word or description.
    pub search: Option<String>,
}

/// Persistence-backed registry of banned words.
///
/// All mutations validate before touching the database and leave no partial
/// state on failure.
#[derive(Clone)]
pub struct WordListStore {
    db: Database,
}

impl WordListStore {
    /// Create a store over the given database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a new banned word.
    ///
    /// Fails with a validation error if the word is empty after trimming,
    /// exceeds 255 characters, or duplicates an active (word, language) pair.
    pub fn create(&self, new: NewWord) -> Result<ModerationWord> {
        let word = normalize_word(&new.word)?;
        let language = normalize_language(&new.language)?;

        if self.db.active_word_exists(&word, &language, None)? {
            return Err(AppError::Validation(format!(
                "Word '{}' already exists for language '{}'",
                word, language
            )));
        }

        let now = now_timestamp();
        let entry = ModerationWord {
            id: uuid::Uuid::new_v4().to_string(),
            word,
            severity: new.severity,
            category: new.category,
            language,
            description: new.description,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.db.insert_word(&entry)?;
        Ok(entry)
    }

    /// Get a word by id.
    pub fn get(&self, id: &str) -> Result<ModerationWord> {
        self.db
            .get_word(id)?
            .ok_or_else(|| AppError::NotFound(format!("Word not found: {}", id)))
    }

    /// Apply a partial update to a word.
    ///
    /// Unknown ids fail with a not-found error; the updated row is validated
    /// like a fresh create, including reactivation collisions.
    pub fn update(&self, id: &str, update: WordUpdate) -> Result<ModerationWord> {
        let mut entry = self.get(id)?;

        if let Some(word) = update.word {
            entry.word = normalize_word(&word)?;
        }
        if let Some(language) = update.language {
            entry.language = normalize_language(&language)?;
        }
        if let Some(severity) = update.severity {
            entry.severity = severity;
        }
        if let Some(category) = update.category {
            entry.category = category;
        }
        if let Some(description) = update.description {
            entry.description = Some(description);
        }
        if let Some(is_active) = update.is_active {
            entry.is_active = is_active;
        }

        if entry.is_active
            && self
                .db
                .active_word_exists(&entry.word, &entry.language, Some(id))?
        {
            return Err(AppError::Validation(format!(
                "Word '{}' already exists for language '{}'",
                entry.word, entry.language
            )));
        }

        entry.updated_at = now_timestamp();
        self.db.update_word(&entry)?;
        Ok(entry)
    }

    /// Activate or deactivate a word.
    pub fn set_active(&self, id: &str, active: bool) -> Result<ModerationWord> {
        self.update(
            id,
            WordUpdate {
                is_active: Some(active),
                ..WordUpdate::default()
            },
        )
    }

    /// Delete a word.
    ///
    /// Deleting an unknown id is a not-found error. Past violation records
    /// are untouched; only future scans are affected.
    pub fn delete(&self, id: &str) -> Result<()> {
        if !self.db.delete_word(id)? {
            return Err(AppError::NotFound(format!("Word not found: {}", id)));
        }
        Ok(())
    }

    /// Delete several words at once.
    ///
    /// Idempotent: ids that no longer exist are skipped and the count of
    /// rows actually removed is returned.
    pub fn bulk_delete(&self, ids: &[String]) -> Result<usize> {
        self.db.delete_words(ids)
    }

    /// List words matching the filter, with total count before pagination.
    pub fn list(
        &self,
        filter: &WordFilter,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<ModerationWord>, u64)> {
        self.db.list_words(filter, limit, offset)
    }

    /// Active words for one language, in listing order (word, then id).
    ///
    /// This is the only read path the scanner uses.
    pub fn list_active(&self, language: &str) -> Result<Vec<ModerationWord>> {
        self.db.list_active_words(&language.trim().to_lowercase())
    }

    /// Import words from plain text content: one word per line, blank lines
    /// and lines starting with '#' ignored.
    ///
    /// Returns the number of words created; duplicates of active entries are
    /// skipped.
    pub fn import(
        &self,
        content: &str,
        severity: Severity,
        category: Category,
        language: &str,
    ) -> Result<usize> {
        let mut created = 0;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match self.create(NewWord {
                word: line.to_string(),
                severity,
                category,
                language: language.to_string(),
                description: None,
            }) {
                Ok(_) => created += 1,
                Err(AppError::Validation(reason)) => {
                    tracing::debug!(word = line, reason = %reason, "Skipped import line");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(created)
    }
}

/// Normalize and validate a word: trimmed, lowercased, 1..=255 chars.
fn normalize_word(raw: &str) -> Result<String> {
    let word = raw.trim().to_lowercase();

    if word.is_empty() {
        return Err(AppError::Validation("Word must not be empty".to_string()));
    }
    if word.chars().count() > MAX_WORD_LEN {
        return Err(AppError::Validation(format!(
            "Word exceeds {} characters",
            MAX_WORD_LEN
        )));
    }

    Ok(word)
}

/// Normalize and validate a language code.
fn normalize_language(raw: &str) -> Result<String> {
    let language = raw.trim().to_lowercase();

    if language.is_empty() || language.len() > 16 {
        return Err(AppError::Validation(
            "Language must be a short language code".to_string(),
        ));
    }

    Ok(language)
}
