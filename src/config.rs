use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Content moderation server for ebook publishing platforms.
#[derive(Parser, Debug, Clone)]
#[command(name = "bookguard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file.
    #[arg(short, long, env = "BOOKGUARD_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the server (default if no command given).
    Serve {
        /// Address to bind the server to.
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },

    /// Banned-word management commands.
    Word {
        /// Word subcommand action.
        #[command(subcommand)]
        action: WordCommand,
    },

    /// Scan an ebook's pages and print the verdict.
    Scan {
        /// Ebook identifier (directory name under the pages root).
        ebook_id: Option<String>,

        /// Language of the word list to scan against.
        #[arg(short, long)]
        language: Option<String>,

        /// Scan every ebook found under the pages root.
        #[arg(long)]
        all: bool,
    },

    /// Initialize database and create default config.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
}

/// Banned-word management subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum WordCommand {
    /// Add a banned word.
    Add {
        /// The word to ban.
        word: String,
        /// Severity: low, medium, high or critical.
        #[arg(short, long, default_value = "medium")]
        severity: String,
        /// Category (profanity, violence, hate_speech, sexual, spam,
        /// political, religious, other).
        #[arg(short = 'k', long, default_value = "other")]
        category: String,
        /// Language code.
        #[arg(short, long)]
        language: Option<String>,
        /// Optional description shown to moderators.
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Delete a banned word by id.
    Del {
        /// Word id to delete.
        id: String,
    },

    /// List banned words.
    List {
        /// Only list words for this language.
        #[arg(short, long)]
        language: Option<String>,
        /// Only list active words.
        #[arg(long)]
        active: bool,
    },

    /// Import words from a plain text file (one word per line, '#' comments).
    Import {
        /// Path to the word file.
        file: PathBuf,
        /// Severity applied to every imported word.
        #[arg(short, long, default_value = "medium")]
        severity: String,
        /// Category applied to every imported word.
        #[arg(short = 'k', long, default_value = "other")]
        category: String,
        /// Language code.
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Re-activate a deactivated word.
    Enable {
        /// Word id to enable.
        id: String,
    },

    /// Deactivate a word without deleting it.
    Disable {
        /// Word id to disable.
        id: String,
    },
}

/// Main configuration from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Moderation policy configuration.
    #[serde(default)]
    pub moderation: ModerationConfig,

    /// Extracted page text location.
    #[serde(default)]
    pub pages: PagesConfig,

    /// Batch scan configuration.
    #[serde(default)]
    pub scan: ScanConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    /// Service title shown on the index page.
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            title: default_title(),
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::new(
        std::net::IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0)),
        8080,
    )
}

fn default_title() -> String {
    "Moderation".to_string()
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/moderation.db")
}

/// Moderation policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationConfig {
    /// Lowest severity that fails an ebook: "low", "medium", "high"
    /// or "critical".
    #[serde(default = "default_fail_threshold")]
    pub fail_threshold: String,

    /// Language scanned when a request does not specify one.
    #[serde(default = "default_language")]
    pub default_language: String,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            fail_threshold: default_fail_threshold(),
            default_language: default_language(),
        }
    }
}

fn default_fail_threshold() -> String {
    "high".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

/// Extracted page text location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagesConfig {
    /// Root directory holding one subdirectory of page text per ebook.
    #[serde(default = "default_pages_dir")]
    pub dir: PathBuf,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            dir: default_pages_dir(),
        }
    }
}

fn default_pages_dir() -> PathBuf {
    PathBuf::from("data/pages")
}

/// Batch scan configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Number of parallel workers for `scan --all` (1 = sequential).
    /// Keep low for NAS/network storage to avoid saturation.
    #[serde(default = "default_scan_workers")]
    pub workers: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workers: default_scan_workers(),
        }
    }
}

fn default_scan_workers() -> usize {
    1 // Sequential by default
}

impl Config {
    /// Load configuration from file.
    pub fn load(path: &PathBuf) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::AppError::Config(format!("Failed to read config file: {}", e))
        })?;

        toml::from_str(&content).map_err(|e| {
            crate::error::AppError::Config(format!("Failed to parse config file: {}", e))
        })
    }

    /// Find config file in default locations.
    pub fn find_config_file() -> Option<PathBuf> {
        let candidates = [
            PathBuf::from("config.toml"),
            PathBuf::from("bookguard.toml"),
            dirs::config_dir()
                .map(|p| p.join("bookguard").join("config.toml"))
                .unwrap_or_default(),
            PathBuf::from("/etc/bookguard/config.toml"),
        ];

        candidates.into_iter().find(|p| p.exists())
    }

    /// Generate default config file content.
    pub fn generate_default() -> String {
        r#"# bookguard configuration

[server]
bind = "0.0.0.0:8080"
title = "Moderation"

[database]
# path = "/var/lib/bookguard/moderation.db"

[moderation]
# Lowest severity that fails an ebook: "low", "medium", "high", "critical"
fail_threshold = "high"
# Language scanned when a request does not specify one
default_language = "en"

[pages]
# Root directory with one subdirectory of extracted page text per ebook,
# one <page_number>.txt file per page
dir = "data/pages"

[scan]
# Parallel workers for `bookguard scan --all`
workers = 1
"#
        .to_string()
    }
}
