//! Moderation core: banned-word registry, page scanner and verdict policy.

mod decision;
mod scanner;
mod service;
mod store;

pub use decision::DecisionPolicy;
pub use scanner::{scan_page, scan_pages};
pub use service::ModerationService;
pub use store::{NewWord, WordFilter, WordListStore, WordUpdate};

use crate::error::AppError;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a banned word, ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Mild content, logged but acceptable.
    Low,
    /// Questionable content, acceptable by default policy.
    Medium,
    /// Serious content, fails the default policy.
    High,
    /// Content that always warrants blocking.
    Critical,
}

impl Severity {
    /// String form used in the database and the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(AppError::Validation(format!(
                "Unknown severity '{}' (expected low, medium, high or critical)",
                other
            ))),
        }
    }
}

impl ToSql for Severity {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Severity {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|_| FromSqlError::InvalidType)
    }
}

/// Category of a banned word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Profane language.
    Profanity,
    /// Violent content.
    Violence,
    /// Hate speech.
    HateSpeech,
    /// Sexual content.
    Sexual,
    /// Spam or advertising.
    Spam,
    /// Political content.
    Political,
    /// Religious content.
    Religious,
    /// Anything else.
    Other,
}

impl Category {
    /// String form used in the database and the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Profanity => "profanity",
            Category::Violence => "violence",
            Category::HateSpeech => "hate_speech",
            Category::Sexual => "sexual",
            Category::Spam => "spam",
            Category::Political => "political",
            Category::Religious => "religious",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "profanity" => Ok(Category::Profanity),
            "violence" => Ok(Category::Violence),
            "hate_speech" => Ok(Category::HateSpeech),
            "sexual" => Ok(Category::Sexual),
            "spam" => Ok(Category::Spam),
            "political" => Ok(Category::Political),
            "religious" => Ok(Category::Religious),
            "other" => Ok(Category::Other),
            other => Err(AppError::Validation(format!(
                "Unknown category '{}'",
                other
            ))),
        }
    }
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|_| FromSqlError::InvalidType)
    }
}

/// A banned word with moderation metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationWord {
    /// Unique word ID.
    pub id: String,
    /// The banned word, stored lowercased (case-insensitive match key).
    pub word: String,
    /// Severity assigned to matches of this word.
    pub severity: Severity,
    /// Category of the word.
    pub category: Category,
    /// Language code (e.g. "en", "vi").
    pub language: String,
    /// Optional note shown to moderators.
    pub description: Option<String>,
    /// Whether the word participates in scans.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: i64,
    /// Last update timestamp.
    pub updated_at: i64,
}

/// One page of extracted plain text, supplied by a text provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    /// Page number, positive and unique within an ebook.
    pub page_number: u32,
    /// Plain text content of the page.
    pub content: String,
}

/// A single (word, page) match record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// The matched banned word.
    pub word: String,
    /// Severity copied from the matched word.
    pub severity: Severity,
    /// Category copied from the matched word.
    pub category: Category,
    /// Page the match occurred on.
    pub page_number: u32,
    /// Non-overlapping occurrences of the word on that page.
    pub occurrence_count: u32,
}

/// Aggregated verdict for one scan of one ebook.
///
/// Results are immutable; re-scanning an ebook produces a brand-new result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationResult {
    /// Unique result ID.
    pub id: String,
    /// The scanned ebook (reference, not owned).
    pub ebook_id: String,
    /// Language the scan ran with.
    pub language: String,
    /// False iff the maximum severity reached the configured threshold.
    pub is_valid: bool,
    /// Maximum severity among violations, `None` ("none") when clean.
    #[serde(with = "severity_or_none")]
    pub severity: Option<Severity>,
    /// Violations in scan order: page ascending, then word-list order.
    pub violations: Vec<Violation>,
    /// Count of pages processed, violations or not.
    pub total_pages_scanned: u32,
    /// When the scan ran.
    pub created_at: i64,
}

/// Serializes `Option<Severity>` as the severity string or `"none"`.
mod severity_or_none {
    use super::Severity;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Severity>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(severity) => serializer.serialize_str(severity.as_str()),
            None => serializer.serialize_str("none"),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Severity>, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == "none" {
            return Ok(None);
        }
        s.parse().map(Some).map_err(serde::de::Error::custom)
    }
}
