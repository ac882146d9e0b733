//! bookguard: A content moderation server for ebook publishing platforms.
//!
//! This crate scans the extracted page text of ebooks against a configurable
//! banned-word list and produces a pass/fail verdict per ebook, with
//! per-page violation details for review UIs.
//!
//! # Features
//!
//! - Banned-word registry with severity, category and language metadata
//! - Substring scanning of paginated ebook text
//! - Severity aggregation with a configurable pass/fail threshold
//! - Persisted, append-only verdict history per ebook
//! - REST API for word-list administration and scan triggers
//! - CLI for word management, one-shot scans and batch scans
//! - Word-list import from plain text files
//!
//! Page text is expected to already be extracted (e.g. by an upload
//! pipeline); bookguard reads it through a [`provider::TextProvider`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Configuration and CLI.
pub mod config;
/// Database operations.
pub mod db;
/// Error types.
pub mod error;
/// Moderation core: word list, scanner, decision, service.
pub mod moderation;
/// Page text providers.
pub mod provider;
/// HTTP server.
pub mod server;

#[cfg(test)]
mod tests;

pub use config::{Cli, Command, Config};
pub use db::Database;
pub use error::{AppError, Result};
pub use moderation::{ModerationResult, ModerationService, Severity, WordListStore};
pub use server::AppState;
