//! Application state shared across handlers.

use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::moderation::{DecisionPolicy, ModerationService, Severity, WordListStore};
use crate::provider::TextProvider;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,
    /// Database connection.
    pub db: Database,
    /// Banned-word registry.
    pub words: Arc<WordListStore>,
    /// Scan service.
    pub moderation: Arc<ModerationService>,
}

impl AppState {
    /// Create application state from config, database and text provider.
    pub fn new(config: Config, db: Database, provider: Arc<dyn TextProvider>) -> Result<Self> {
        let threshold: Severity = config.moderation.fail_threshold.parse().map_err(|_| {
            AppError::Config(format!(
                "Invalid fail_threshold '{}' (expected low, medium, high or critical)",
                config.moderation.fail_threshold
            ))
        })?;

        let words = Arc::new(WordListStore::new(db.clone()));
        let moderation = Arc::new(ModerationService::new(
            db.clone(),
            provider,
            DecisionPolicy::new(threshold),
        ));

        Ok(Self {
            config: Arc::new(config),
            db,
            words,
            moderation,
        })
    }

    /// Language scanned when a request does not specify one.
    pub fn default_language(&self) -> &str {
        &self.config.moderation.default_language
    }
}
