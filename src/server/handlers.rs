//! HTTP request handlers.

use crate::error::Result;
use crate::moderation::{
    Category, ModerationResult, ModerationWord, NewWord, Severity, WordFilter, WordUpdate,
};
use crate::server::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
};
use serde::{Deserialize, Serialize};

/// Default page size for word listings.
const DEFAULT_LIMIT: u32 = 50;
/// Upper bound on requested page size.
const MAX_LIMIT: u32 = 500;

// ============================================================================
// WEB PAGES
// ============================================================================

/// Index page (simple HTML).
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let active_words = state.db.count_words(true).unwrap_or(0);
    let total_scans = state.db.count_results(false).unwrap_or(0);
    let blocked = state.db.count_results(true).unwrap_or(0);

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <style>
        body {{ font-family: system-ui, sans-serif; max-width: 600px; margin: 2rem auto; padding: 0 1rem; }}
        h1 {{ color: #333; }}
        a {{ color: #0066cc; }}
        .stats {{ background: #f5f5f5; padding: 1rem; border-radius: 8px; margin: 1rem 0; }}
        code {{ background: #e8e8e8; padding: 0.2rem 0.4rem; border-radius: 4px; }}
    </style>
</head>
<body>
    <h1>{title}</h1>
    <div class="stats">
        <p><strong>{active_words}</strong> active banned words</p>
        <p><strong>{total_scans}</strong> scans run, <strong>{blocked}</strong> failed</p>
    </div>
    <h2>API</h2>
    <ul>
        <li><code>GET /api/words</code> — list banned words</li>
        <li><code>POST /api/scan/&lt;ebook_id&gt;</code> — scan an ebook</li>
        <li><a href="/api/stats">Stats (JSON)</a></li>
    </ul>
</body>
</html>"#,
        title = state.config.server.title,
        active_words = active_words,
        total_scans = total_scans,
        blocked = blocked,
    );

    Html(html)
}

// ============================================================================
// WORD LIST API
// ============================================================================

/// Word listing query parameters.
#[derive(Debug, Deserialize)]
pub struct WordListParams {
    /// Filter by severity.
    severity: Option<Severity>,
    /// Filter by category.
    category: Option<Category>,
    /// Filter by language code.
    language: Option<String>,
    /// Filter by active state.
    active: Option<bool>,
    /// Case-insensitive substring of word or description.
    search: Option<String>,
    /// Page size (default 50, max 500).
    limit: Option<u32>,
    /// Offset into the filtered listing.
    offset: Option<u32>,
}

/// Word listing response.
#[derive(Debug, Serialize)]
pub struct WordListResponse {
    items: Vec<ModerationWord>,
    total: u64,
}

/// List banned words with filters and pagination.
pub async fn word_list(
    State(state): State<AppState>,
    Query(params): Query<WordListParams>,
) -> Result<Json<WordListResponse>> {
    let filter = WordFilter {
        severity: params.severity,
        category: params.category,
        language: params.language,
        is_active: params.active,
        search: params.search,
    };

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let offset = params.offset.unwrap_or(0);

    let (items, total) = state.words.list(&filter, limit, offset)?;
    Ok(Json(WordListResponse { items, total }))
}

/// Word creation request.
#[derive(Debug, Deserialize)]
pub struct CreateWordRequest {
    word: String,
    severity: Severity,
    category: Category,
    language: Option<String>,
    description: Option<String>,
}

/// Create a banned word.
pub async fn word_create(
    State(state): State<AppState>,
    Json(req): Json<CreateWordRequest>,
) -> Result<(StatusCode, Json<ModerationWord>)> {
    let language = req
        .language
        .unwrap_or_else(|| state.default_language().to_string());

    let word = state.words.create(NewWord {
        word: req.word,
        severity: req.severity,
        category: req.category,
        language,
        description: req.description,
    })?;

    Ok((StatusCode::CREATED, Json(word)))
}

/// Get a banned word by id.
pub async fn word_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ModerationWord>> {
    Ok(Json(state.words.get(&id)?))
}

/// Word update request; omitted fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateWordRequest {
    word: Option<String>,
    severity: Option<Severity>,
    category: Option<Category>,
    language: Option<String>,
    description: Option<String>,
    is_active: Option<bool>,
}

/// Update a banned word.
pub async fn word_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateWordRequest>,
) -> Result<Json<ModerationWord>> {
    let word = state.words.update(
        &id,
        WordUpdate {
            word: req.word,
            severity: req.severity,
            category: req.category,
            language: req.language,
            description: req.description,
            is_active: req.is_active,
        },
    )?;

    Ok(Json(word))
}

/// Delete a banned word. Unknown ids are a 404.
pub async fn word_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.words.delete(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Bulk delete request.
#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    ids: Vec<String>,
}

/// Bulk delete response.
#[derive(Debug, Serialize)]
pub struct BulkDeleteResponse {
    deleted: usize,
}

/// Delete several words at once; missing ids are skipped.
pub async fn word_bulk_delete(
    State(state): State<AppState>,
    Json(req): Json<BulkDeleteRequest>,
) -> Result<Json<BulkDeleteResponse>> {
    let deleted = state.words.bulk_delete(&req.ids)?;
    Ok(Json(BulkDeleteResponse { deleted }))
}

// ============================================================================
// SCAN API
// ============================================================================

/// Scan query parameters.
#[derive(Debug, Deserialize)]
pub struct ScanParams {
    /// Language of the word list to scan against.
    language: Option<String>,
}

/// Scan an ebook and return the persisted verdict.
pub async fn api_scan(
    State(state): State<AppState>,
    Path(ebook_id): Path<String>,
    Query(params): Query<ScanParams>,
) -> Result<Json<ModerationResult>> {
    let language = params
        .language
        .unwrap_or_else(|| state.default_language().to_string());

    let result = state.moderation.scan_ebook(&ebook_id, &language)?;
    Ok(Json(result))
}

/// Verdict history for an ebook, newest first.
pub async fn api_results(
    State(state): State<AppState>,
    Path(ebook_id): Path<String>,
) -> Result<Json<Vec<ModerationResult>>> {
    Ok(Json(state.moderation.results(&ebook_id)?))
}

// ============================================================================
// STATS API
// ============================================================================

/// Service statistics.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    total_words: u64,
    active_words: u64,
    total_scans: u64,
    failed_scans: u64,
    fail_threshold: Severity,
}

/// Get service statistics.
pub async fn api_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    Ok(Json(StatsResponse {
        total_words: state.db.count_words(false)?,
        active_words: state.db.count_words(true)?,
        total_scans: state.db.count_results(false)?,
        failed_scans: state.db.count_results(true)?,
        fail_threshold: state.moderation.policy().fail_threshold(),
    }))
}
