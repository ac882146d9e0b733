use crate::error::{AppError, Result};
use crate::moderation::{ModerationResult, ModerationWord, Violation, WordFilter};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Arc;

/// Database wrapper for thread-safe access.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| AppError::Internal(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.initialize_schema()?;
        Ok(db)
    }

    /// Open in-memory database (for testing).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Internal(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.initialize_schema()?;
        Ok(db)
    }

    /// Initialize database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            -- Banned words table
            CREATE TABLE IF NOT EXISTS moderation_words (
                id TEXT PRIMARY KEY,
                word TEXT NOT NULL,
                severity TEXT NOT NULL,
                category TEXT NOT NULL,
                language TEXT NOT NULL,
                description TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            -- Scan verdicts table (append-only)
            CREATE TABLE IF NOT EXISTS moderation_results (
                id TEXT PRIMARY KEY,
                ebook_id TEXT NOT NULL,
                language TEXT NOT NULL,
                is_valid INTEGER NOT NULL,
                severity TEXT,
                total_pages_scanned INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            );

            -- Per-page violation records
            CREATE TABLE IF NOT EXISTS violations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                result_id TEXT NOT NULL,
                word TEXT NOT NULL,
                severity TEXT NOT NULL,
                category TEXT NOT NULL,
                page_number INTEGER NOT NULL,
                occurrence_count INTEGER NOT NULL,
                FOREIGN KEY (result_id) REFERENCES moderation_results(id) ON DELETE CASCADE
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_words_lang_active ON moderation_words(language, is_active);
            CREATE INDEX IF NOT EXISTS idx_words_word ON moderation_words(word);
            CREATE INDEX IF NOT EXISTS idx_results_ebook ON moderation_results(ebook_id);
            CREATE INDEX IF NOT EXISTS idx_violations_result ON violations(result_id);
            "#,
        )
        .map_err(|e| AppError::Internal(format!("Failed to initialize schema: {}", e)))?;

        Ok(())
    }

    // ========== WORD OPERATIONS ==========

    /// Insert a new word.
    pub fn insert_word(&self, word: &ModerationWord) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO moderation_words
             (id, word, severity, category, language, description, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                word.id,
                word.word,
                word.severity,
                word.category,
                word.language,
                word.description,
                word.is_active,
                word.created_at,
                word.updated_at,
            ],
        )
        .map_err(|e| AppError::Internal(format!("Failed to insert word: {}", e)))?;
        Ok(())
    }

    /// Get word by ID.
    pub fn get_word(&self, id: &str) -> Result<Option<ModerationWord>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, word, severity, category, language, description, is_active, created_at, updated_at
             FROM moderation_words WHERE id = ?1",
            params![id],
            Self::row_to_word,
        )
        .optional()
        .map_err(|e| AppError::Internal(format!("Failed to get word: {}", e)))
    }

    /// Overwrite a word row.
    pub fn update_word(&self, word: &ModerationWord) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute(
                "UPDATE moderation_words SET
                    word = ?1, severity = ?2, category = ?3, language = ?4,
                    description = ?5, is_active = ?6, updated_at = ?7
                 WHERE id = ?8",
                params![
                    word.word,
                    word.severity,
                    word.category,
                    word.language,
                    word.description,
                    word.is_active,
                    word.updated_at,
                    word.id,
                ],
            )
            .map_err(|e| AppError::Internal(format!("Failed to update word: {}", e)))?;
        Ok(rows > 0)
    }

    /// Delete a word.
    pub fn delete_word(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute("DELETE FROM moderation_words WHERE id = ?1", params![id])
            .map_err(|e| AppError::Internal(format!("Failed to delete word: {}", e)))?;
        Ok(rows > 0)
    }

    /// Delete several words, returning the count actually removed.
    pub fn delete_words(&self, ids: &[String]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let conn = self.conn.lock();
        let placeholders: Vec<String> = ids.iter().map(|_| "?".to_string()).collect();
        let sql = format!(
            "DELETE FROM moderation_words WHERE id IN ({})",
            placeholders.join(",")
        );

        let deleted = conn
            .execute(&sql, rusqlite::params_from_iter(ids))
            .map_err(|e| AppError::Internal(format!("Failed to delete words: {}", e)))?;

        Ok(deleted)
    }

    /// Check whether an active (word, language) pair exists, optionally
    /// excluding one id (for updates).
    pub fn active_word_exists(
        &self,
        word: &str,
        language: &str,
        exclude_id: Option<&str>,
    ) -> Result<bool> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM moderation_words
                 WHERE word = ?1 AND language = ?2 AND is_active = 1
                   AND (?3 IS NULL OR id != ?3)",
                params![word, language, exclude_id],
                |row| row.get(0),
            )
            .map_err(|e| AppError::Internal(format!("Failed to check duplicate word: {}", e)))?;
        Ok(count > 0)
    }

    /// List words matching the filter, with total count before pagination.
    pub fn list_words(
        &self,
        filter: &WordFilter,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<ModerationWord>, u64)> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut owned: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(severity) = filter.severity {
            clauses.push("severity = ?");
            owned.push(Box::new(severity));
        }
        if let Some(category) = filter.category {
            clauses.push("category = ?");
            owned.push(Box::new(category));
        }
        if let Some(language) = &filter.language {
            clauses.push("language = ?");
            owned.push(Box::new(language.trim().to_lowercase()));
        }
        if let Some(is_active) = filter.is_active {
            clauses.push("is_active = ?");
            owned.push(Box::new(is_active));
        }
        if let Some(search) = &filter.search {
            clauses.push("(word LIKE ? OR lower(description) LIKE ?)");
            let pattern = format!("%{}%", search.trim().to_lowercase());
            owned.push(Box::new(pattern.clone()));
            owned.push(Box::new(pattern));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        let conn = self.conn.lock();

        let count_sql = format!("SELECT COUNT(*) FROM moderation_words{}", where_sql);
        let args: Vec<&dyn rusqlite::ToSql> = owned.iter().map(|v| v.as_ref()).collect();
        let total: u64 = conn
            .query_row(&count_sql, rusqlite::params_from_iter(args), |row| {
                row.get::<_, i64>(0).map(|n| n as u64)
            })
            .map_err(|e| AppError::Internal(format!("Failed to count words: {}", e)))?;

        let list_sql = format!(
            "SELECT id, word, severity, category, language, description, is_active, created_at, updated_at
             FROM moderation_words{} ORDER BY word, id LIMIT ? OFFSET ?",
            where_sql
        );

        let limit = limit as i64;
        let offset = offset as i64;
        let mut args: Vec<&dyn rusqlite::ToSql> = owned.iter().map(|v| v.as_ref()).collect();
        args.push(&limit);
        args.push(&offset);

        let mut stmt = conn
            .prepare(&list_sql)
            .map_err(|e| AppError::Internal(format!("Failed to prepare query: {}", e)))?;

        let words = stmt
            .query_map(rusqlite::params_from_iter(args), Self::row_to_word)
            .map_err(|e| AppError::Internal(format!("Failed to list words: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Internal(format!("Failed to collect words: {}", e)))?;

        Ok((words, total))
    }

    /// Active words for one language, in listing order.
    ///
    /// The scanner reads the word list through this path only.
    pub fn list_active_words(&self, language: &str) -> Result<Vec<ModerationWord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, word, severity, category, language, description, is_active, created_at, updated_at
                 FROM moderation_words
                 WHERE language = ?1 AND is_active = 1
                 ORDER BY word, id",
            )
            .map_err(|e| AppError::Internal(format!("Failed to prepare query: {}", e)))?;

        let words = stmt
            .query_map(params![language], Self::row_to_word)
            .map_err(|e| AppError::Internal(format!("Failed to list active words: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Internal(format!("Failed to collect words: {}", e)))?;

        Ok(words)
    }

    /// Count words, optionally only active ones.
    pub fn count_words(&self, active_only: bool) -> Result<u64> {
        let conn = self.conn.lock();
        let sql = if active_only {
            "SELECT COUNT(*) FROM moderation_words WHERE is_active = 1"
        } else {
            "SELECT COUNT(*) FROM moderation_words"
        };
        conn.query_row(sql, [], |row| row.get::<_, i64>(0).map(|n| n as u64))
            .map_err(|e| AppError::Internal(format!("Failed to count words: {}", e)))
    }

    /// Helper to convert a row to ModerationWord.
    fn row_to_word(row: &rusqlite::Row<'_>) -> rusqlite::Result<ModerationWord> {
        Ok(ModerationWord {
            id: row.get(0)?,
            word: row.get(1)?,
            severity: row.get(2)?,
            category: row.get(3)?,
            language: row.get(4)?,
            description: row.get(5)?,
            is_active: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    // ========== RESULT OPERATIONS ==========

    /// Persist a scan result and its violations atomically.
    pub fn save_result(&self, result: &ModerationResult) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Internal(format!("Failed to start transaction: {}", e)))?;

        tx.execute(
            "INSERT INTO moderation_results
             (id, ebook_id, language, is_valid, severity, total_pages_scanned, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                result.id,
                result.ebook_id,
                result.language,
                result.is_valid,
                result.severity,
                result.total_pages_scanned,
                result.created_at,
            ],
        )
        .map_err(|e| AppError::Internal(format!("Failed to save result: {}", e)))?;

        for violation in &result.violations {
            tx.execute(
                "INSERT INTO violations
                 (result_id, word, severity, category, page_number, occurrence_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    result.id,
                    violation.word,
                    violation.severity,
                    violation.category,
                    violation.page_number,
                    violation.occurrence_count,
                ],
            )
            .map_err(|e| AppError::Internal(format!("Failed to save violation: {}", e)))?;
        }

        tx.commit()
            .map_err(|e| AppError::Internal(format!("Failed to commit result: {}", e)))
    }

    /// Get all results for an ebook, newest first, violations included.
    pub fn get_results(&self, ebook_id: &str) -> Result<Vec<ModerationResult>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, ebook_id, language, is_valid, severity, total_pages_scanned, created_at
                 FROM moderation_results
                 WHERE ebook_id = ?1
                 ORDER BY created_at DESC, id",
            )
            .map_err(|e| AppError::Internal(format!("Failed to prepare query: {}", e)))?;

        let mut results = stmt
            .query_map(params![ebook_id], |row| {
                Ok(ModerationResult {
                    id: row.get(0)?,
                    ebook_id: row.get(1)?,
                    language: row.get(2)?,
                    is_valid: row.get(3)?,
                    severity: row.get(4)?,
                    violations: Vec::new(),
                    total_pages_scanned: row.get(5)?,
                    created_at: row.get(6)?,
                })
            })
            .map_err(|e| AppError::Internal(format!("Failed to get results: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Internal(format!("Failed to collect results: {}", e)))?;

        let mut violation_stmt = conn
            .prepare(
                "SELECT word, severity, category, page_number, occurrence_count
                 FROM violations WHERE result_id = ?1 ORDER BY id",
            )
            .map_err(|e| AppError::Internal(format!("Failed to prepare query: {}", e)))?;

        for result in &mut results {
            result.violations = violation_stmt
                .query_map(params![result.id], |row| {
                    Ok(Violation {
                        word: row.get(0)?,
                        severity: row.get(1)?,
                        category: row.get(2)?,
                        page_number: row.get(3)?,
                        occurrence_count: row.get(4)?,
                    })
                })
                .map_err(|e| AppError::Internal(format!("Failed to get violations: {}", e)))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| AppError::Internal(format!("Failed to collect violations: {}", e)))?;
        }

        Ok(results)
    }

    /// Count persisted results, optionally only invalid ones.
    pub fn count_results(&self, invalid_only: bool) -> Result<u64> {
        let conn = self.conn.lock();
        let sql = if invalid_only {
            "SELECT COUNT(*) FROM moderation_results WHERE is_valid = 0"
        } else {
            "SELECT COUNT(*) FROM moderation_results"
        };
        conn.query_row(sql, [], |row| row.get::<_, i64>(0).map(|n| n as u64))
            .map_err(|e| AppError::Internal(format!("Failed to count results: {}", e)))
    }
}
