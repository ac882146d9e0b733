//! Page text providers.
//!
//! bookguard does not extract text itself; the upload pipeline is expected
//! to have written plain text per page before a scan runs. A provider turns
//! an ebook id into that ordered page sequence.

use crate::error::{AppError, Result};
use crate::moderation::PageText;
use std::path::{Path, PathBuf};

/// Source of extracted page text.
pub trait TextProvider: Send + Sync {
    /// Ordered page texts for an ebook.
    fn get_pages(&self, ebook_id: &str) -> Result<Vec<PageText>>;

    /// Every ebook id this provider knows about (for batch scans).
    fn list_ebooks(&self) -> Result<Vec<String>>;
}

/// Provider reading `<root>/<ebook_id>/<page_number>.txt` files.
///
/// Ebook directories may be nested under the root (e.g. grouped per
/// library); the ebook id is then the relative path of the directory.
pub struct DirectoryProvider {
    root: PathBuf,
}

impl DirectoryProvider {
    /// Create a provider over the given pages root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Parse `<n>.txt` into a page number.
    fn page_number(path: &Path) -> Option<u32> {
        if path.extension()?.to_str()? != "txt" {
            return None;
        }
        path.file_stem()?.to_str()?.parse().ok().filter(|n| *n > 0)
    }

    /// Resolve an ebook id to its page directory. Ids are relative paths;
    /// anything that could escape the root is rejected.
    fn ebook_dir(&self, ebook_id: &str) -> Result<PathBuf> {
        if ebook_id.is_empty()
            || ebook_id.starts_with('/')
            || ebook_id.split('/').any(|part| part.is_empty() || part == "." || part == "..")
        {
            return Err(AppError::Validation(format!(
                "Invalid ebook id: {}",
                ebook_id
            )));
        }

        Ok(self.root.join(ebook_id))
    }
}

impl TextProvider for DirectoryProvider {
    fn get_pages(&self, ebook_id: &str) -> Result<Vec<PageText>> {
        let dir = self.ebook_dir(ebook_id)?;
        if !dir.is_dir() {
            return Err(AppError::NotFound(format!("Ebook not found: {}", ebook_id)));
        }

        let entries = std::fs::read_dir(&dir)
            .map_err(|e| AppError::Provider(format!("Failed to read {}: {}", dir.display(), e)))?;

        let mut pages = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                AppError::Provider(format!("Failed to read {}: {}", dir.display(), e))
            })?;
            let path = entry.path();

            let Some(page_number) = Self::page_number(&path) else {
                continue;
            };

            // Extraction output is not always clean UTF-8
            let bytes = std::fs::read(&path).map_err(|e| {
                AppError::Provider(format!("Failed to read page {}: {}", path.display(), e))
            })?;
            let content = String::from_utf8_lossy(&bytes).into_owned();

            pages.push(PageText {
                page_number,
                content,
            });
        }

        pages.sort_by_key(|p| p.page_number);
        Ok(pages)
    }

    fn list_ebooks(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();

        for entry in walkdir::WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_dir() {
                continue;
            }

            let has_pages = std::fs::read_dir(entry.path())
                .map(|mut entries| {
                    entries.any(|e| {
                        e.map(|e| Self::page_number(&e.path()).is_some())
                            .unwrap_or(false)
                    })
                })
                .unwrap_or(false);

            if !has_pages {
                continue;
            }

            if let Ok(relative) = entry.path().strip_prefix(&self.root)
                && !relative.as_os_str().is_empty()
            {
                let id = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                ids.push(id);
            }
        }

        ids.sort();
        Ok(ids)
    }
}
