//! bookguard server entry point.

use bookguard::{
    config::{Cli, Command, Config, WordCommand},
    db::Database,
    error::AppError,
    moderation::{
        Category, DecisionPolicy, ModerationResult, ModerationService, NewWord, Severity,
        WordFilter, WordListStore,
    },
    provider::{DirectoryProvider, TextProvider},
    server,
};
use clap::Parser;
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Find or load config
    let config_path = cli.config.clone().or_else(Config::find_config_file);

    let config = if let Some(ref path) = config_path {
        Config::load(path)?
    } else {
        Config::default()
    };

    // Handle command
    match cli.command {
        Some(Command::Init { force }) => cmd_init(force).await,
        Some(Command::Word { action }) => cmd_word(action, &config).await,
        Some(Command::Scan {
            ebook_id,
            language,
            all,
        }) => cmd_scan(&config, ebook_id, language, all).await,
        Some(Command::Serve { bind }) => cmd_serve(config, bind).await,
        None => {
            // Default: start server
            cmd_serve(config, None).await
        }
    }
}

/// Initialize config and database.
async fn cmd_init(force: bool) -> anyhow::Result<()> {
    let config_path = PathBuf::from("config.toml");

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    // Write default config
    std::fs::write(&config_path, Config::generate_default())?;
    println!("Created config file: {}", config_path.display());

    // Initialize database
    let config = Config::default();
    if let Some(parent) = config.database.path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let _db = Database::open(&config.database.path)?;
    println!("Initialized database: {}", config.database.path.display());

    println!("\nEdit config.toml to configure your server.");
    println!("Then run: bookguard word add <word> --severity high --language en");
    println!("And: bookguard scan <ebook_id>");

    Ok(())
}

/// Banned-word management commands.
async fn cmd_word(action: WordCommand, config: &Config) -> anyhow::Result<()> {
    let db = Database::open(&config.database.path)?;
    let store = WordListStore::new(db);

    match action {
        WordCommand::Add {
            word,
            severity,
            category,
            language,
            description,
        } => {
            let severity: Severity = severity.parse()?;
            let category: Category = category.parse()?;
            let language =
                language.unwrap_or_else(|| config.moderation.default_language.clone());

            let entry = store.create(NewWord {
                word,
                severity,
                category,
                language,
                description,
            })?;
            println!(
                "Added word: {} (severity: {}, category: {}, language: {}, id: {})",
                entry.word, entry.severity, entry.category, entry.language, entry.id
            );
        }

        WordCommand::Del { id } => match store.delete(&id) {
            Ok(()) => println!("Deleted word: {}", id),
            Err(AppError::NotFound(_)) => println!("Word not found: {}", id),
            Err(e) => return Err(e.into()),
        },

        WordCommand::List { language, active } => {
            let filter = WordFilter {
                language,
                is_active: if active { Some(true) } else { None },
                ..WordFilter::default()
            };

            let (words, total) = store.list(&filter, 10_000, 0)?;
            if words.is_empty() {
                println!("No words found.");
            } else {
                println!(
                    "{:<36} {:<24} {:<10} {:<12} {:<6} {:<8} UPDATED",
                    "ID", "WORD", "SEVERITY", "CATEGORY", "LANG", "ACTIVE"
                );
                println!("{}", "-".repeat(110));
                for word in &words {
                    let updated = bookguard::db::timestamp_to_datetime(word.updated_at)
                        .format("%Y-%m-%d %H:%M")
                        .to_string();
                    println!(
                        "{:<36} {:<24} {:<10} {:<12} {:<6} {:<8} {}",
                        word.id,
                        word.word,
                        word.severity,
                        word.category,
                        word.language,
                        if word.is_active { "yes" } else { "no" },
                        updated
                    );
                }
                println!("\n{} of {} words shown", words.len(), total);
            }
        }

        WordCommand::Import {
            file,
            severity,
            category,
            language,
        } => {
            let severity: Severity = severity.parse()?;
            let category: Category = category.parse()?;
            let language =
                language.unwrap_or_else(|| config.moderation.default_language.clone());

            let content = std::fs::read_to_string(&file)?;
            let created = store.import(&content, severity, category, &language)?;
            println!("Imported {} words from {}", created, file.display());
        }

        WordCommand::Enable { id } => {
            let word = store.set_active(&id, true)?;
            println!("Enabled word: {} ({})", word.word, word.id);
        }

        WordCommand::Disable { id } => {
            let word = store.set_active(&id, false)?;
            println!("Disabled word: {} ({})", word.word, word.id);
        }
    }

    Ok(())
}

/// One-shot or batch scan from the CLI.
async fn cmd_scan(
    config: &Config,
    ebook_id: Option<String>,
    language: Option<String>,
    all: bool,
) -> anyhow::Result<()> {
    let db = Database::open(&config.database.path)?;
    let provider = Arc::new(DirectoryProvider::new(config.pages.dir.clone()));
    let threshold: Severity = config.moderation.fail_threshold.parse()?;
    let service = ModerationService::new(db, provider.clone(), DecisionPolicy::new(threshold));

    let language = language.unwrap_or_else(|| config.moderation.default_language.clone());

    if all {
        let ids = provider.list_ebooks()?;
        if ids.is_empty() {
            println!("No ebooks found under {}", config.pages.dir.display());
            return Ok(());
        }

        // Bounded pool so batch scans don't saturate NAS-backed page storage
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.scan.workers)
            .build()
            .unwrap_or_else(|_| rayon::ThreadPoolBuilder::new().build().unwrap());

        pool.install(|| {
            ids.par_iter().for_each(|id| match service.scan_ebook(id, &language) {
                Ok(result) => print_verdict_line(&result),
                Err(e) => println!("{:<40} ERROR: {}", id, e),
            });
        });

        return Ok(());
    }

    let Some(ebook_id) = ebook_id else {
        anyhow::bail!("Provide an ebook id or use --all");
    };

    let result = service.scan_ebook(&ebook_id, &language)?;
    print_verdict_line(&result);

    if !result.violations.is_empty() {
        println!("\n{:<6} {:<24} {:<10} COUNT", "PAGE", "WORD", "SEVERITY");
        println!("{}", "-".repeat(50));
        for violation in &result.violations {
            println!(
                "{:<6} {:<24} {:<10} {}",
                violation.page_number,
                violation.word,
                violation.severity,
                violation.occurrence_count
            );
        }
    }

    Ok(())
}

/// Print a one-line verdict summary.
fn print_verdict_line(result: &ModerationResult) {
    let severity = result
        .severity
        .map(|s| s.to_string())
        .unwrap_or_else(|| "none".to_string());

    println!(
        "{:<40} {} (severity: {}, {} violations, {} pages)",
        result.ebook_id,
        if result.is_valid { "PASS" } else { "FAIL" },
        severity,
        result.violations.len(),
        result.total_pages_scanned
    );
}

/// Start the server.
async fn cmd_serve(mut config: Config, bind: Option<std::net::SocketAddr>) -> anyhow::Result<()> {
    // Override bind address if specified
    if let Some(addr) = bind {
        config.server.bind = addr;
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookguard=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Open database
    let db = Database::open(&config.database.path)?;

    tracing::info!(
        bind = %config.server.bind,
        database = %config.database.path.display(),
        pages = %config.pages.dir.display(),
        fail_threshold = %config.moderation.fail_threshold,
        "Starting bookguard server"
    );

    if !config.pages.dir.exists() {
        tracing::warn!(
            dir = %config.pages.dir.display(),
            "Pages directory does not exist yet; scans will find no ebooks"
        );
    }

    // Create application state
    let provider = Arc::new(DirectoryProvider::new(config.pages.dir.clone()));
    let state = server::AppState::new(config.clone(), db, provider)?;

    // Create router
    let app = server::create_router(state);

    let listener = TcpListener::bind(config.server.bind).await?;
    tracing::info!(address = %config.server.bind, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
